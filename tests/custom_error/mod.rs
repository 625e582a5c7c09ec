use thiserror::Error;

#[derive(Debug, Error)]
#[error("sensor disconnected")]
pub struct CustomError;
