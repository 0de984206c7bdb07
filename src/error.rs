use std::path::PathBuf;

use thiserror::Error;

use crate::predictor::FrameSize;

pub type DepthResult<T> = Result<T, DepthError>;

#[derive(Debug, Error)]
pub enum DepthError {
	#[error("I/O error: {0}")]
	IoError(String),

	#[error("Image error: {0}")]
	ImageError(String),

	#[error("Model error: {0}")]
	ModelError(String),

	#[error("Tensor error: {0}")]
	TensorError(String),

	#[error("Configuration error: {0}")]
	ConfigError(String),

	#[error("Download error: {0}")]
	DownloadError(String),

	#[error("Frame {path:?} is {found}, but the scene resolution is {expected}")]
	FrameSizeMismatch {
		path: PathBuf,
		expected: FrameSize,
		found: FrameSize,
	},

	#[error("Refusing to write an empty image batch")]
	EmptyBatch,

	#[error("Got {images} images but {filenames} filenames")]
	BatchLengthMismatch { images: usize, filenames: usize },
}

impl From<std::io::Error> for DepthError {
	fn from(e: std::io::Error) -> Self {
		DepthError::IoError(e.to_string())
	}
}

impl From<image::ImageError> for DepthError {
	fn from(e: image::ImageError) -> Self {
		DepthError::ImageError(e.to_string())
	}
}

impl From<reqwest::Error> for DepthError {
	fn from(e: reqwest::Error) -> Self {
		DepthError::DownloadError(e.to_string())
	}
}

impl From<serde_json::Error> for DepthError {
	fn from(e: serde_json::Error) -> Self {
		DepthError::ConfigError(e.to_string())
	}
}

