use crate::error::DepthResult;
use crate::interpolate::resize_plane;
use crate::model::DepthModel;
use crate::transform::Transform;
use image::RgbImage;
use ndarray::Array2;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
	pub width: u32,
	pub height: u32,
}

impl FrameSize {
	pub fn of(frame: &RgbImage) -> Self {
		Self {
			width: frame.width(),
			height: frame.height(),
		}
	}
}

impl fmt::Display for FrameSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

/// Maps a decoded frame to a raw depth map of the requested size.
pub trait DepthPredictor {
	/// The returned array has shape `[size.height, size.width]`.
	fn predict(&mut self, frame: &RgbImage, size: FrameSize) -> DepthResult<Array2<f32>>;
}

impl<P: DepthPredictor + ?Sized> DepthPredictor for Box<P> {
	fn predict(&mut self, frame: &RgbImage, size: FrameSize) -> DepthResult<Array2<f32>> {
		(**self).predict(frame, size)
	}
}

/// Preprocess, run the network, then upsample bicubically to `size`.
pub struct FramePredictor<M> {
	transform: Transform,
	model: M,
}

impl<M: DepthModel> FramePredictor<M> {
	pub fn new(transform: Transform, model: M) -> Self {
		Self { transform, model }
	}

	pub fn transform(&self) -> &Transform {
		&self.transform
	}

	pub fn model(&self) -> &M {
		&self.model
	}
}

impl<M: DepthModel> DepthPredictor for FramePredictor<M> {
	fn predict(&mut self, frame: &RgbImage, size: FrameSize) -> DepthResult<Array2<f32>> {
		let input = self.transform.apply(frame);
		let raw = self.model.forward(&input)?;
		Ok(resize_plane(&raw, size.height as usize, size.width as usize))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transform::{NetworkInput, TransformConfig};

	/// Returns the red channel of the network input as depth.
	struct RedChannel {
		seen: Vec<(usize, usize)>,
	}

	impl DepthModel for RedChannel {
		fn forward(&mut self, input: &NetworkInput) -> DepthResult<Array2<f32>> {
			self.seen.push((input.width(), input.height()));
			let (_, _, h, w) = input.tensor.dim();
			Ok(Array2::from_shape_fn((h, w), |(y, x)| input.tensor[[0, 0, y, x]]))
		}
	}

	#[test]
	fn predicts_at_network_size_and_upsamples_to_frame() {
		let transform = Transform::new(TransformConfig::square(384)).unwrap();
		let mut predictor = FramePredictor::new(transform, RedChannel { seen: Vec::new() });
		let frame = RgbImage::from_pixel(640, 480, image::Rgb([128, 0, 0]));

		let depth = predictor.predict(&frame, FrameSize::of(&frame)).unwrap();

		assert_eq!(predictor.model.seen, vec![(512, 384)]);
		assert_eq!(depth.dim(), (480, 640));
	}

	#[test]
	fn boxed_predictors_dispatch() {
		let transform = Transform::new(TransformConfig::square(32)).unwrap();
		let mut predictor: Box<dyn DepthPredictor> =
			Box::new(FramePredictor::new(transform, RedChannel { seen: Vec::new() }));
		let frame = RgbImage::new(40, 30);
		let size = FrameSize { width: 20, height: 10 };

		assert_eq!(predictor.predict(&frame, size).unwrap().dim(), (10, 20));
	}
}
