pub(crate) mod error;
pub(crate) mod profile;

pub(crate) use error::ApiError;
