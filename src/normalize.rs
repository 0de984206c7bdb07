use image::{GrayImage, Luma};
use ndarray::Array2;

/// How a raw depth map is quantized to 8 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthScaling {
	/// `(v - min) / (max - min) * 255`, per frame.
	#[default]
	MinMax,
	/// `v * 255 / max`, per frame.
	MaxScaled,
}

/// Finite minimum and maximum, or `None` when no sample is finite.
pub fn finite_range(depth: &Array2<f32>) -> Option<(f32, f32)> {
	depth
		.iter()
		.copied()
		.filter(|v| v.is_finite())
		.fold(None, |acc, v| match acc {
			None => Some((v, v)),
			Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
		})
}

/// Quantize a raw depth map to a grayscale image.
///
/// A constant map (and, for `MaxScaled`, a map whose maximum is not positive)
/// becomes all zeros. Non-finite samples are written as 0.
pub fn normalize_depth(depth: &Array2<f32>, scaling: DepthScaling) -> GrayImage {
	let (h, w) = depth.dim();
	let mut out = GrayImage::new(w as u32, h as u32);

	let Some((min, max)) = finite_range(depth) else {
		return out;
	};

	let (offset, range) = match scaling {
		DepthScaling::MinMax if max > min => (min as f64, (max - min) as f64),
		DepthScaling::MaxScaled if max > 0.0 => (0.0, max as f64),
		_ => return out,
	};

	for ((y, x), &v) in depth.indexed_iter() {
		if v.is_finite() {
			let q = if v == max {
				255
			} else {
				// Divide first, then truncate like an `astype(uint8)` cast.
				((v as f64 - offset) / range * 255.0).clamp(0.0, 255.0) as u8
			};
			out.put_pixel(x as u32, y as u32, Luma([q]));
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn min_maps_to_zero_and_max_to_255() {
		let depth = Array2::from_shape_vec((2, 3), vec![-4.0, 0.0, 2.5, 7.0, 11.0, 1.0]).unwrap();
		let gray = normalize_depth(&depth, DepthScaling::MinMax);

		assert_eq!(gray.dimensions(), (3, 2));
		assert_eq!(gray.get_pixel(0, 0)[0], 0);
		assert_eq!(gray.get_pixel(1, 1)[0], 255);
		let (lo, hi) = gray.pixels().fold((255u8, 0u8), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
		assert_eq!((lo, hi), (0, 255));
	}

	#[test]
	fn maximum_always_maps_to_255() {
		for i in 1..5000 {
			let hi = i as f32 / 7.0;
			for lo in [0.0f32, -1.5, hi / 3.0] {
				let depth = Array2::from_shape_vec((1, 2), vec![lo, hi]).unwrap();
				let gray = normalize_depth(&depth, DepthScaling::MinMax);
				assert_eq!(gray.get_pixel(0, 0)[0], 0, "range [{lo}, {hi}]");
				assert_eq!(gray.get_pixel(1, 0)[0], 255, "range [{lo}, {hi}]");
			}
			let depth = Array2::from_shape_vec((1, 2), vec![hi / 2.0, hi]).unwrap();
			let gray = normalize_depth(&depth, DepthScaling::MaxScaled);
			assert_eq!(gray.get_pixel(1, 0)[0], 255, "max {hi}");
		}
	}

	#[test]
	fn values_are_truncated() {
		let depth = Array2::from_shape_vec((1, 3), vec![0.0, 0.5, 1.0]).unwrap();
		let gray = normalize_depth(&depth, DepthScaling::MinMax);
		assert_eq!(gray.get_pixel(1, 0)[0], 127);
	}

	#[test]
	fn constant_map_is_all_zero() {
		let depth = Array2::from_elem((4, 5), 3.25f32);
		let gray = normalize_depth(&depth, DepthScaling::MinMax);
		assert!(gray.pixels().all(|p| p[0] == 0));
	}

	#[test]
	fn non_finite_samples_are_ignored() {
		let depth = Array2::from_shape_vec((1, 4), vec![f32::NAN, 1.0, f32::INFINITY, 3.0]).unwrap();
		let gray = normalize_depth(&depth, DepthScaling::MinMax);
		let row: Vec<u8> = gray.pixels().map(|p| p[0]).collect();
		assert_eq!(row, vec![0, 0, 0, 255]);
	}

	#[test]
	fn max_scaled_keeps_zero_anchor() {
		let depth = Array2::from_shape_vec((1, 3), vec![10.0, 20.0, 40.0]).unwrap();
		let gray = normalize_depth(&depth, DepthScaling::MaxScaled);
		let row: Vec<u8> = gray.pixels().map(|p| p[0]).collect();
		assert_eq!(row, vec![63, 127, 255]);
	}

	#[test]
	fn max_scaled_without_positive_max_is_all_zero() {
		let depth = Array2::from_elem((2, 2), -1.0f32);
		let gray = normalize_depth(&depth, DepthScaling::MaxScaled);
		assert!(gray.pixels().all(|p| p[0] == 0));
	}
}
