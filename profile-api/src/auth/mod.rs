mod backend;
mod extractor;
mod router;

pub use backend::AuthBackend;
pub use backend::AuthSession;
pub use extractor::{AuthUser, CallerIdentity};
pub use router::router;
