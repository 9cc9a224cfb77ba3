mod client;
mod credentials;
mod signature;
mod upload;

pub use client::*;
pub use credentials::*;
pub use signature::*;
pub use upload::*;
