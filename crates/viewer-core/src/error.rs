use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] subterm_subtitle_api::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Transport-level failures worth another attempt. Malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Api(subterm_subtitle_api::Error::Http(_)) | Error::Timeout(_) => true,
            Error::Api(subterm_subtitle_api::Error::Json(_)) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
