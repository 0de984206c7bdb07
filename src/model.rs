use crate::error::{DepthError, DepthResult};
use crate::transform::NetworkInput;
use ndarray::Array2;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Checkpoint-backed network sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ModelVariant {
	Small,
	Large,
}

impl ModelVariant {
	pub fn name(&self) -> &'static str {
		match self {
			ModelVariant::Small => "small",
			ModelVariant::Large => "large",
		}
	}

	/// Input size each variant was trained at.
	pub fn default_resize_size(&self) -> u32 {
		match self {
			ModelVariant::Small => 256,
			ModelVariant::Large => 384,
		}
	}
}

impl fmt::Display for ModelVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
	Cpu,
	Cuda { device_id: i32 },
}

impl fmt::Display for Device {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Device::Cpu => write!(f, "CPU"),
			Device::Cuda { device_id } => write!(f, "CUDA(device_id={device_id})"),
		}
	}
}

impl FromStr for Device {
	type Err = DepthError;

	/// Accepts `cpu`, `cuda` and `cuda:<id>`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let lower = s.trim().to_lowercase();
		match lower.split_once(':') {
			None if lower == "cpu" => Ok(Device::Cpu),
			None if lower == "cuda" => Ok(Device::Cuda { device_id: 0 }),
			Some(("cuda", id)) => id
				.parse()
				.map(|device_id| Device::Cuda { device_id })
				.map_err(|_| DepthError::ConfigError(format!("Invalid CUDA device id '{}'", id))),
			_ => Err(DepthError::ConfigError(format!(
				"Unknown device '{}'. Use: cpu, cuda or cuda:<id>",
				s
			))),
		}
	}
}

impl Default for Device {
	#[cfg(feature = "cuda")]
	fn default() -> Self {
		Device::Cuda { device_id: 0 }
	}

	#[cfg(not(feature = "cuda"))]
	fn default() -> Self {
		Device::Cpu
	}
}

/// One forward pass of a depth network, batch of one.
pub trait DepthModel {
	/// Returns the raw depth map at the network's output resolution.
	fn forward(&mut self, input: &NetworkInput) -> DepthResult<Array2<f32>>;
}

impl<M: DepthModel + ?Sized> DepthModel for Box<M> {
	fn forward(&mut self, input: &NetworkInput) -> DepthResult<Array2<f32>> {
		(**self).forward(input)
	}
}

/// Collapse a `[H, W]`, `[1, H, W]` or `[1, 1, H, W]` output shape to `(H, W)`.
pub fn depth_dims(dims: &[usize]) -> DepthResult<(usize, usize)> {
	if dims.len() < 2 {
		return Err(DepthError::TensorError(format!(
			"Depth output must have at least two dimensions, got {:?}",
			dims
		)));
	}
	let (lead, hw) = dims.split_at(dims.len() - 2);
	if lead.iter().any(|&d| d != 1) {
		return Err(DepthError::TensorError(format!(
			"Expected a single-channel depth output of batch one, got {:?}",
			dims
		)));
	}
	Ok((hw[0], hw[1]))
}

/// The checkpoint must be an existing file.
pub fn resolve_checkpoint(path: impl AsRef<Path>) -> DepthResult<PathBuf> {
	let path = path.as_ref();
	if path.is_file() {
		return Ok(path.to_path_buf());
	}
	Err(DepthError::ConfigError(format!(
		"Loading model path fail, model path does not exist: {}",
		path.display()
	)))
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxDepthModel;

#[cfg(feature = "onnx")]
mod onnx {
	use super::{depth_dims, Device, DepthModel};
	use crate::error::{DepthError, DepthResult};
	use crate::transform::NetworkInput;
	use ndarray::Array2;
	use ort::session::{builder::GraphOptimizationLevel, Session};
	use std::path::Path;

	/// A depth network exported to ONNX.
	pub struct OnnxDepthModel {
		session: Session,
	}

	impl OnnxDepthModel {
		pub fn load(model_path: impl AsRef<Path>, device: &Device) -> DepthResult<Self> {
			let model_path = model_path.as_ref();

			let builder = Session::builder()
				.map_err(|e| DepthError::ModelError(format!("Failed to create session: {}", e)))?
				.with_optimization_level(GraphOptimizationLevel::Level3)
				.map_err(|e| DepthError::ModelError(format!("Failed to set opt level: {}", e)))?;

			let builder = match device {
				Device::Cpu => builder,
				#[cfg(feature = "cuda")]
				Device::Cuda { device_id } => {
					use ort::execution_providers::CUDAExecutionProvider;
					builder
						.with_execution_providers([CUDAExecutionProvider::default()
							.with_device_id(*device_id)
							.build()
							.error_on_failure()])
						.map_err(|e| {
							DepthError::ModelError(format!("Failed to initialise {}: {}", device, e))
						})?
				}
				#[cfg(not(feature = "cuda"))]
				Device::Cuda { .. } => {
					return Err(DepthError::ConfigError(format!(
						"{} requested, but this build has no CUDA support (enable the `cuda` feature)",
						device
					)));
				}
			};

			let session = builder.commit_from_file(model_path).map_err(|e| {
				DepthError::ModelError(format!("Failed to load ONNX model {:?}: {}", model_path, e))
			})?;

			tracing::info!("Loaded ONNX model {:?} on {}", model_path, device);
			Ok(Self { session })
		}
	}

	impl DepthModel for OnnxDepthModel {
		fn forward(&mut self, input: &NetworkInput) -> DepthResult<Array2<f32>> {
			let (n, c, h, w) = input.tensor.dim();
			let input_data: Vec<f32> = input.tensor.iter().copied().collect();

			let input_value = ort::value::Tensor::from_array(([n, c, h, w], input_data))
				.map_err(|e| DepthError::TensorError(format!("Failed to create input: {}", e)))?;

			let outputs = self
				.session
				.run(ort::inputs![input_value])
				.map_err(|e| DepthError::ModelError(format!("Inference failed: {}", e)))?;

			let (shape, data) = outputs[0]
				.try_extract_tensor::<f32>()
				.map_err(|e| DepthError::TensorError(format!("Failed to extract output: {}", e)))?;

			let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
			let (out_h, out_w) = depth_dims(&dims)?;

			Array2::from_shape_vec((out_h, out_w), data.to_vec())
				.map_err(|e| DepthError::TensorError(format!("Failed to reshape depth: {}", e)))
		}
	}
}
