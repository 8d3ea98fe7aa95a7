use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Frame name '{0}' is too long (max 64 chars)")]
    FrameNameTooLong(String),

    #[error("Transform from '{from}' to '{to}' contains non-finite values")]
    NonFiniteTransform { from: String, to: String },
}

pub type TransformResult<T> = Result<T, TransformError>;
