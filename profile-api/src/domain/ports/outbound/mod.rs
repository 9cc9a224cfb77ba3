mod media;
mod profile_store;

pub use media::*;
pub use profile_store::*;
