use crate::colorize::colorize_batch;
use crate::error::{DepthError, DepthResult};
use crate::image_loader::load_frame;
use crate::normalize::{finite_range, normalize_depth, DepthScaling};
use crate::output::{write_images, OutputKind};
use crate::predictor::{DepthPredictor, FrameSize};
use crate::scene::{load_scenes, Scene};
use image::DynamicImage;
use std::fmt;
use std::path::PathBuf;

/// Immutable run configuration shared by every stage.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
	pub input: PathBuf,
	pub output: PathBuf,
	/// Tag embedded in output directory names.
	pub model_name: String,
	pub scaling: DepthScaling,
	pub jpeg_quality: u8,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			input: PathBuf::from("./input"),
			output: PathBuf::from("./output"),
			model_name: "TCMD".to_string(),
			scaling: DepthScaling::MinMax,
			jpeg_quality: 95,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenePhase {
	Predicting,
	Writing,
	Done,
}

impl fmt::Display for ScenePhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ScenePhase::Predicting => "predicting",
			ScenePhase::Writing => "writing",
			ScenePhase::Done => "done",
		})
	}
}

#[derive(Clone, Debug)]
pub struct SceneProgress {
	pub scene: String,
	pub phase: ScenePhase,
	pub current_frame: u32,
	pub total_frames: u32,
	pub percent: f64,
}

impl SceneProgress {
	pub fn new(scene: &str, phase: ScenePhase, current_frame: u32, total_frames: u32) -> Self {
		let percent = if total_frames > 0 {
			(current_frame as f64 / total_frames as f64 * 100.0).min(100.0)
		} else {
			0.0
		};
		Self {
			scene: scene.to_string(),
			phase,
			current_frame,
			total_frames,
			percent,
		}
	}
}

pub type ProgressCallback = Box<dyn Fn(SceneProgress)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneSummary {
	pub name: String,
	pub frames: usize,
	pub grayscale_dir: PathBuf,
	pub colored_dir: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
	pub scenes: Vec<SceneSummary>,
	/// Scenes with no frames, which produce no output.
	pub skipped: Vec<String>,
}

impl RunSummary {
	pub fn total_frames(&self) -> usize {
		self.scenes.iter().map(|s| s.frames).sum()
	}
}

/// Run depth estimation over every scene under `config.input`.
///
/// Scenes are processed one after another. An error aborts the run; scenes
/// written before the failure stay on disk.
pub fn run<P>(config: &PipelineConfig, predictor: &mut P, progress: Option<ProgressCallback>) -> DepthResult<RunSummary>
where
	P: DepthPredictor + ?Sized,
{
	let scenes = load_scenes(&config.input)?;
	tracing::info!("Found {} scenes in {:?}", scenes.len(), config.input);

	std::fs::create_dir_all(&config.output).map_err(|e| {
		DepthError::IoError(format!("Failed to create output directory {:?}: {}", config.output, e))
	})?;

	let mut summary = RunSummary::default();
	for scene in &scenes {
		if scene.is_empty() {
			tracing::warn!("Scene {} has no frames, skipping", scene.name);
			summary.skipped.push(scene.name.clone());
			continue;
		}
		summary
			.scenes
			.push(process_scene(config, predictor, scene, progress.as_ref())?);
	}

	tracing::info!("{} Done.", config.output.display());
	Ok(summary)
}

/// Predict, normalize, colorize and write one non-empty scene.
pub fn process_scene<P>(
	config: &PipelineConfig,
	predictor: &mut P,
	scene: &Scene,
	progress: Option<&ProgressCallback>,
) -> DepthResult<SceneSummary>
where
	P: DepthPredictor + ?Sized,
{
	tracing::info!("Processing: {}", scene.name);
	let total = scene.len() as u32;
	let report = |phase, current| {
		if let Some(cb) = progress {
			cb(SceneProgress::new(&scene.name, phase, current, total));
		}
	};

	report(ScenePhase::Predicting, 0);

	// The first frame fixes the resolution every prediction is upsampled to.
	let mut scene_size = None;
	let mut raw_depths = Vec::with_capacity(scene.len());

	for (i, path) in scene.frames.iter().enumerate() {
		let frame = load_frame(path)?;
		let size = FrameSize::of(&frame);
		let expected = *scene_size.get_or_insert(size);
		if size != expected {
			return Err(DepthError::FrameSizeMismatch {
				path: path.clone(),
				expected,
				found: size,
			});
		}

		let depth = predictor.predict(&frame, expected)?;
		if let Some((min, max)) = finite_range(&depth) {
			tracing::debug!("{:?}: depth range [{}, {}]", path, min, max);
		}
		raw_depths.push(depth);

		report(ScenePhase::Predicting, i as u32 + 1);
	}

	report(ScenePhase::Writing, total);

	let stem = config.output.join(&scene.name);
	let grayscale: Vec<_> = raw_depths
		.iter()
		.map(|d| normalize_depth(d, config.scaling))
		.collect();
	drop(raw_depths);

	let colored = colorize_batch(&grayscale);

	let grayscale: Vec<DynamicImage> = grayscale.into_iter().map(DynamicImage::ImageLuma8).collect();
	let grayscale_dir = write_images(
		&config.model_name,
		&stem,
		OutputKind::Grayscale,
		&grayscale,
		&scene.filenames,
		config.jpeg_quality,
	)?;

	let colored: Vec<DynamicImage> = colored.into_iter().map(DynamicImage::ImageRgb8).collect();
	let colored_dir = write_images(
		&config.model_name,
		&stem,
		OutputKind::Colored,
		&colored,
		&scene.filenames,
		config.jpeg_quality,
	)?;

	report(ScenePhase::Done, total);

	Ok(SceneSummary {
		name: scene.name.clone(),
		frames: scene.len(),
		grayscale_dir,
		colored_dir,
	})
}
