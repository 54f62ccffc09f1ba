use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid connection id {input:?}")]
pub struct ParseIdError {
    pub input: String,
    #[source]
    pub source: uuid::Error,
}
