use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use video_depth::cli::{download_printer, init_tracing, progress_printer};
use video_depth::hub::{default_cache_dir, ensure_model, load_predictor, HubModel, DEFAULT_REPO};
use video_depth::{DepthScaling, Device, PipelineConfig};

#[derive(Parser)]
#[command(name = "video-depth-hub")]
#[command(about = "Depth estimation with a hosted Hugging Face model")]
#[command(version)]
struct Cli {
	/// Video root path, one subdirectory of frames per scene
	#[arg(long, default_value = "./input")]
	input: PathBuf,

	/// Path to save output
	#[arg(long, default_value = "./output")]
	output: PathBuf,

	/// Tag used in output directory names
	#[arg(long = "model_name", visible_alias = "model-name", default_value = "transformers")]
	model_name: String,

	/// Hub repository holding `onnx/model.onnx` and `preprocessor_config.json`
	#[arg(long, default_value = DEFAULT_REPO)]
	repo: String,

	/// Hub revision (branch, tag or commit)
	#[arg(long, default_value = "main")]
	revision: String,

	/// Where downloaded models are cached
	#[arg(long)]
	cache_dir: Option<PathBuf>,

	/// Inference device: cpu, cuda or cuda:<id>
	#[arg(long)]
	device: Option<Device>,

	/// JPEG quality for .jpg outputs (1-100)
	#[arg(long, default_value = "95")]
	quality: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_tracing();

	let model = HubModel {
		repo: cli.repo.clone(),
		revision: cli.revision.clone(),
		..HubModel::default()
	};
	let cache_dir = match cli.cache_dir {
		Some(dir) => dir,
		None => default_cache_dir()?,
	};

	let files = ensure_model(&model, &cache_dir, Some(download_printer(model.repo.clone())))
		.await
		.with_context(|| format!("Failed to fetch {}", model.repo))?;
	eprintln!();

	let device = cli.device.clone().unwrap_or_default();
	tracing::info!("Device: {}", device);
	let mut predictor = load_predictor(&files, &device).context("Failed to initialise the depth model")?;

	let config = PipelineConfig {
		input: cli.input,
		output: cli.output,
		model_name: cli.model_name,
		scaling: DepthScaling::MaxScaled,
		jpeg_quality: cli.quality,
	};

	tracing::info!("Run");
	let summary = tokio::task::block_in_place(|| video_depth::run(&config, &mut predictor, Some(progress_printer())))?;

	eprintln!(
		"✓ {} frames in {} scenes written to {:?}",
		summary.total_frames(),
		summary.scenes.len(),
		config.output
	);
	tracing::info!("Finished");
	Ok(())
}
