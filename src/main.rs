use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use video_depth::cli::{init_tracing, progress_printer};
use video_depth::{
	load_checkpoint_predictor, DepthScaling, Device, ModelVariant, PipelineConfig, PixelNormalization,
	TransformConfig,
};

#[derive(Parser)]
#[command(name = "video-depth")]
#[command(about = "Video depth estimation over directories of frames")]
#[command(version)]
#[command(after_help = "Example:\n  video-depth --model large --resume ./weights/tcmd_large.onnx --input ./videos --output ./output --resize_size 384")]
struct Cli {
	/// Size of the model
	#[arg(long, value_enum, default_value_t = ModelVariant::Large)]
	model: ModelVariant,

	/// Path to checkpoint file (ONNX export)
	#[arg(long)]
	resume: PathBuf,

	/// Video root path, one subdirectory of frames per scene
	#[arg(long, default_value = "./input")]
	input: PathBuf,

	/// Path to save output
	#[arg(long, default_value = "./output")]
	output: PathBuf,

	/// Tag used in output directory names
	#[arg(long = "model_name", visible_alias = "model-name", default_value = "TCMD")]
	model_name: String,

	/// Spatial dimension to resize input (small model: 256, large model: 384)
	#[arg(long = "resize_size", visible_alias = "resize-size", default_value_t = 384)]
	resize_size: u32,

	/// Inference device: cpu, cuda or cuda:<id>
	#[arg(long)]
	device: Option<Device>,

	/// Input pixel normalization the checkpoint expects
	#[arg(long, value_enum, default_value_t = Normalization::Raw)]
	normalization: Normalization,

	/// JPEG quality for .jpg outputs (1-100)
	#[arg(long, default_value = "95")]
	quality: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Normalization {
	Raw,
	Unit,
	Imagenet,
}

impl From<Normalization> for PixelNormalization {
	fn from(n: Normalization) -> Self {
		match n {
			Normalization::Raw => PixelNormalization::Raw,
			Normalization::Unit => PixelNormalization::unit(),
			Normalization::Imagenet => PixelNormalization::imagenet(),
		}
	}
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_tracing();

	tracing::info!("Initialize");
	let device = cli.device.clone().unwrap_or_default();
	tracing::info!("Device: {}", device);

	if cli.resize_size != cli.model.default_resize_size() {
		tracing::info!(
			"Resize size {} differs from the {} model's usual {}",
			cli.resize_size,
			cli.model,
			cli.model.default_resize_size()
		);
	}

	let transform = TransformConfig::square(cli.resize_size).with_normalization(cli.normalization.into());
	let mut predictor = load_checkpoint_predictor(cli.model, &cli.resume, transform, &device)
		.context("Failed to initialise the depth model")?;
	tracing::info!("Loading model done...");

	let config = PipelineConfig {
		input: cli.input,
		output: cli.output,
		model_name: cli.model_name,
		scaling: DepthScaling::MinMax,
		jpeg_quality: cli.quality,
	};

	let start = std::time::Instant::now();
	let summary = video_depth::run(&config, &mut predictor, Some(progress_printer()))?;

	eprintln!(
		"✓ {} frames in {} scenes written to {:?}",
		summary.total_frames(),
		summary.scenes.len(),
		config.output
	);
	eprintln!("Total time: {:.1}s", start.elapsed().as_secs_f64());

	Ok(())
}
