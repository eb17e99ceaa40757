use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Error reading or decoding the captcha image
    #[error("captcha image could not be decoded")]
    Image(#[from] image::error::ImageError),
    /// A training data source is not a valid JSON list of keys
    #[error("malformed training data")]
    TrainingData(#[from] serde_json::Error),
}
