use crate::error::{DepthError, DepthResult};
use crate::interpolate::resize_rgb;
use image::RgbImage;
use ndarray::Array4;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// How the target size bounds the resized frame when aspect ratio is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeMethod {
	/// Both sides end up at least as large as the target.
	LowerBound,
	/// Both sides end up at most as large as the target.
	UpperBound,
	/// Scale as little as possible.
	Minimal,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelNormalization {
	/// Intensities stay in `[0, 255]`.
	Raw,
	/// Intensities are multiplied by `factor`.
	Rescale { factor: f32 },
	/// Intensities are multiplied by `factor`, then standardized per channel.
	MeanStd { factor: f32, mean: [f32; 3], std: [f32; 3] },
}

impl PixelNormalization {
	/// Scale to `[0, 1]`.
	pub fn unit() -> Self {
		PixelNormalization::Rescale { factor: 1.0 / 255.0 }
	}

	pub fn imagenet() -> Self {
		PixelNormalization::MeanStd {
			factor: 1.0 / 255.0,
			mean: IMAGENET_MEAN,
			std: IMAGENET_STD,
		}
	}

	fn apply(&self, value: u8, channel: usize) -> f32 {
		match *self {
			PixelNormalization::Raw => value as f32,
			PixelNormalization::Rescale { factor } => value as f32 * factor,
			PixelNormalization::MeanStd { factor, mean, std } => {
				(value as f32 * factor - mean[channel]) / std[channel]
			}
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransformConfig {
	/// When false, frames reach the network at their own size.
	pub resize: bool,
	pub width: u32,
	pub height: u32,
	pub keep_aspect_ratio: bool,
	pub multiple_of: u32,
	pub resize_method: ResizeMethod,
	pub normalization: PixelNormalization,
}

impl TransformConfig {
	/// Square target, aspect kept, multiple of 32, lower bound, raw intensities.
	pub fn square(size: u32) -> Self {
		Self {
			resize: true,
			width: size,
			height: size,
			keep_aspect_ratio: true,
			multiple_of: 32,
			resize_method: ResizeMethod::LowerBound,
			normalization: PixelNormalization::Raw,
		}
	}

	pub fn with_normalization(mut self, normalization: PixelNormalization) -> Self {
		self.normalization = normalization;
		self
	}
}

impl Default for TransformConfig {
	fn default() -> Self {
		Self::square(384)
	}
}

/// A preprocessed frame in NCHW layout, batch of one.
#[derive(Clone, Debug)]
pub struct NetworkInput {
	pub tensor: Array4<f32>,
}

impl NetworkInput {
	pub fn width(&self) -> usize {
		self.tensor.dim().3
	}

	pub fn height(&self) -> usize {
		self.tensor.dim().2
	}
}

/// Resize-then-prepare pipeline applied identically to every frame.
#[derive(Clone, Debug)]
pub struct Transform {
	config: TransformConfig,
}

impl Transform {
	pub fn new(config: TransformConfig) -> DepthResult<Self> {
		if config.width == 0 || config.height == 0 {
			return Err(DepthError::ConfigError(format!(
				"Resize target must be positive, got {}x{}",
				config.width, config.height
			)));
		}
		if config.multiple_of == 0 {
			return Err(DepthError::ConfigError(
				"multiple_of must be at least 1".to_string(),
			));
		}
		Ok(Self { config })
	}

	pub fn config(&self) -> &TransformConfig {
		&self.config
	}

	/// Network input size `(width, height)` for a frame of the given size.
	pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
		let cfg = &self.config;
		if !cfg.resize {
			return (width, height);
		}
		let mut scale_w = cfg.width as f64 / width as f64;
		let mut scale_h = cfg.height as f64 / height as f64;

		if cfg.keep_aspect_ratio {
			let use_width = match cfg.resize_method {
				ResizeMethod::LowerBound => scale_w > scale_h,
				ResizeMethod::UpperBound => scale_w < scale_h,
				ResizeMethod::Minimal => (1.0 - scale_w).abs() < (1.0 - scale_h).abs(),
			};
			if use_width {
				scale_h = scale_w;
			} else {
				scale_w = scale_h;
			}
		}

		let m = cfg.multiple_of;
		let (new_w, new_h) = match cfg.resize_method {
			ResizeMethod::LowerBound => (
				constrain_to_multiple_of(scale_w * width as f64, m, cfg.width, None),
				constrain_to_multiple_of(scale_h * height as f64, m, cfg.height, None),
			),
			ResizeMethod::UpperBound => (
				constrain_to_multiple_of(scale_w * width as f64, m, 0, Some(cfg.width)),
				constrain_to_multiple_of(scale_h * height as f64, m, 0, Some(cfg.height)),
			),
			ResizeMethod::Minimal => (
				constrain_to_multiple_of(scale_w * width as f64, m, 0, None),
				constrain_to_multiple_of(scale_h * height as f64, m, 0, None),
			),
		};

		(new_w.max(m), new_h.max(m))
	}

	pub fn apply(&self, frame: &RgbImage) -> NetworkInput {
		let (width, height) = self.target_size(frame.width(), frame.height());
		let resized;
		let source = if (width, height) == frame.dimensions() {
			frame
		} else {
			resized = resize_rgb(frame, width, height);
			&resized
		};
		let (w, h) = (width as usize, height as usize);

		let norm = self.config.normalization;
		let tensor = Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
			norm.apply(source.get_pixel(x as u32, y as u32)[c], c)
		});

		NetworkInput { tensor }
	}
}

/// Round `x` to the nearest multiple, falling back to floor above `max` and
/// ceil below `min`. Ties round to even.
pub fn constrain_to_multiple_of(x: f64, multiple: u32, min: u32, max: Option<u32>) -> u32 {
	let m = multiple as f64;
	let mut y = (x / m).round_ties_even() * m;

	if let Some(max) = max {
		if y > max as f64 {
			y = (x / m).floor() * m;
		}
	}
	if y < min as f64 {
		y = (x / m).ceil() * m;
	}

	y.max(0.0) as u32
}
