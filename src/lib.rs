pub mod colorize;
pub mod error;
pub mod hub;
pub mod image_loader;
pub mod interpolate;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod predictor;
pub mod scene;
pub mod transform;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{DepthError, DepthResult};
pub use hub::{HubModel, PreprocessorConfig};
pub use model::{DepthModel, Device, ModelVariant};
pub use normalize::DepthScaling;
pub use output::OutputKind;
pub use pipeline::{run, PipelineConfig, ProgressCallback, RunSummary, SceneProgress};
pub use predictor::{DepthPredictor, FramePredictor, FrameSize};
pub use scene::{load_scenes, Scene};
pub use transform::{PixelNormalization, Transform, TransformConfig};

#[cfg(feature = "onnx")]
pub use model::OnnxDepthModel;

/// Load a checkpoint-backed predictor for one of the built-in variants.
#[cfg(feature = "onnx")]
pub fn load_checkpoint_predictor(
	variant: ModelVariant,
	checkpoint: impl AsRef<std::path::Path>,
	transform: TransformConfig,
	device: &Device,
) -> DepthResult<FramePredictor<OnnxDepthModel>> {
	let path = model::resolve_checkpoint(checkpoint)?;
	tracing::info!("Creating {} model...", variant);
	let transform = Transform::new(transform)?;
	let model = OnnxDepthModel::load(&path, device)?;
	tracing::info!("Loading model from {}", path.display());
	Ok(FramePredictor::new(transform, model))
}
