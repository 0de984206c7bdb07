//! Hosted depth estimators fetched from the Hugging Face hub.
//!
//! A hub model is an ONNX export plus the `preprocessor_config.json` that
//! describes how frames must be resized and normalized for it. Both files are
//! cached on disk and reused on later runs.

use crate::error::{DepthError, DepthResult};
use crate::transform::{PixelNormalization, ResizeMethod, TransformConfig};
use futures_util::StreamExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_REPO: &str = "Xenova/dpt-large";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubModel {
	pub endpoint: String,
	pub repo: String,
	pub revision: String,
	pub model_file: String,
	pub config_file: String,
}

impl Default for HubModel {
	fn default() -> Self {
		Self {
			endpoint: DEFAULT_ENDPOINT.to_string(),
			repo: DEFAULT_REPO.to_string(),
			revision: "main".to_string(),
			model_file: "onnx/model.onnx".to_string(),
			config_file: "preprocessor_config.json".to_string(),
		}
	}
}

impl HubModel {
	pub fn new(repo: impl Into<String>) -> Self {
		Self {
			repo: repo.into(),
			..Self::default()
		}
	}

	pub fn url(&self, file: &str) -> String {
		format!(
			"{}/{}/resolve/{}/{}",
			self.endpoint.trim_end_matches('/'),
			self.repo,
			self.revision,
			file
		)
	}

	/// `<cache_dir>/<owner>--<name>/<revision>`
	pub fn cache_path(&self, cache_dir: &Path) -> PathBuf {
		cache_dir
			.join(self.repo.replace('/', "--"))
			.join(&self.revision)
	}
}

/// Local copies of a hub model's files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubFiles {
	pub model: PathBuf,
	pub config: PathBuf,
}

pub fn default_cache_dir() -> DepthResult<PathBuf> {
	dirs::cache_dir()
		.map(|d| d.join("video-depth"))
		.ok_or_else(|| DepthError::ConfigError("No cache directory on this platform; pass --cache-dir".to_string()))
}

/// Download any missing files of `model` into `cache_dir`.
///
/// `progress` receives `(downloaded_bytes, total_bytes)`; `total_bytes` is 0
/// when the server does not report a length.
pub async fn ensure_model<F>(model: &HubModel, cache_dir: &Path, progress: Option<F>) -> DepthResult<HubFiles>
where
	F: Fn(u64, u64),
{
	let dir = model.cache_path(cache_dir);
	let files = HubFiles {
		model: dir.join(&model.model_file),
		config: dir.join(&model.config_file),
	};

	for (remote, local) in [(&model.config_file, &files.config), (&model.model_file, &files.model)] {
		if local.is_file() {
			tracing::debug!("Using cached {:?}", local);
			continue;
		}
		let url = model.url(remote);
		tracing::info!("Downloading {}", url);
		download_file(&url, local, progress.as_ref()).await?;
	}

	Ok(files)
}

async fn download_file<F>(url: &str, dest: &Path, progress: Option<&F>) -> DepthResult<()>
where
	F: Fn(u64, u64),
{
	if let Some(parent) = dest.parent() {
		tokio::fs::create_dir_all(parent).await?;
	}

	let response = reqwest::get(url)
		.await?
		.error_for_status()
		.map_err(|e| DepthError::DownloadError(format!("{}: {}", url, e)))?;
	let total = response.content_length().unwrap_or(0);

	// Written under a temporary name so an interrupted download is never reused.
	let mut part = dest.as_os_str().to_owned();
	part.push(".part");
	let part = PathBuf::from(part);

	let mut file = tokio::fs::File::create(&part).await?;
	let mut stream = response.bytes_stream();
	let mut downloaded = 0u64;

	while let Some(chunk) = stream.next().await {
		let chunk = chunk?;
		file.write_all(&chunk).await?;
		downloaded += chunk.len() as u64;
		if let Some(cb) = progress {
			cb(downloaded, total);
		}
	}

	file.flush().await?;
	drop(file);
	tokio::fs::rename(&part, dest).await?;
	Ok(())
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SizeSpec {
	Square(u32),
	Dims { height: u32, width: u32 },
	ShortestEdge { shortest_edge: u32 },
}

impl Default for SizeSpec {
	fn default() -> Self {
		SizeSpec::Dims {
			height: 384,
			width: 384,
		}
	}
}

/// The subset of a Hugging Face image-processor config that drives preprocessing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessorConfig {
	pub do_resize: bool,
	pub size: SizeSpec,
	pub keep_aspect_ratio: bool,
	pub ensure_multiple_of: u32,
	pub do_rescale: bool,
	pub rescale_factor: f32,
	pub do_normalize: bool,
	pub image_mean: [f32; 3],
	pub image_std: [f32; 3],
}

impl Default for PreprocessorConfig {
	fn default() -> Self {
		Self {
			do_resize: true,
			size: SizeSpec::default(),
			keep_aspect_ratio: false,
			ensure_multiple_of: 1,
			do_rescale: true,
			rescale_factor: 1.0 / 255.0,
			do_normalize: true,
			image_mean: [0.5; 3],
			image_std: [0.5; 3],
		}
	}
}

impl PreprocessorConfig {
	pub fn from_file(path: impl AsRef<Path>) -> DepthResult<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path)
			.map_err(|e| DepthError::IoError(format!("Failed to read {:?}: {}", path, e)))?;
		Ok(serde_json::from_str(&text)?)
	}

	pub fn to_transform_config(&self) -> TransformConfig {
		let (width, height, keep_aspect_ratio) = match self.size {
			SizeSpec::Square(s) => (s, s, self.keep_aspect_ratio),
			SizeSpec::Dims { height, width } => (width, height, self.keep_aspect_ratio),
			SizeSpec::ShortestEdge { shortest_edge } => (shortest_edge, shortest_edge, true),
		};

		let factor = if self.do_rescale { self.rescale_factor } else { 1.0 };
		let normalization = if self.do_normalize {
			PixelNormalization::MeanStd {
				factor,
				mean: self.image_mean,
				std: self.image_std,
			}
		} else if self.do_rescale {
			PixelNormalization::Rescale { factor }
		} else {
			PixelNormalization::Raw
		};

		TransformConfig {
			resize: self.do_resize,
			width,
			height,
			keep_aspect_ratio,
			multiple_of: self.ensure_multiple_of.max(1),
			resize_method: ResizeMethod::Minimal,
			normalization,
		}
	}
}

#[cfg(feature = "onnx")]
pub use onnx::load_predictor;

#[cfg(feature = "onnx")]
mod onnx {
	use super::{HubFiles, PreprocessorConfig};
	use crate::error::DepthResult;
	use crate::model::{Device, OnnxDepthModel};
	use crate::predictor::FramePredictor;
	use crate::transform::Transform;

	/// Build a predictor from downloaded hub files.
	pub fn load_predictor(files: &HubFiles, device: &Device) -> DepthResult<FramePredictor<OnnxDepthModel>> {
		let config = PreprocessorConfig::from_file(&files.config)?;
		let transform = Transform::new(config.to_transform_config())?;
		tracing::info!("Hub preprocessing: {:?}", transform.config());
		let model = OnnxDepthModel::load(&files.model, device)?;
		Ok(FramePredictor::new(transform, model))
	}
}
