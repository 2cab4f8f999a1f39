#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("document does not start with a WEBVTT header")]
    MissingHeader,
}
