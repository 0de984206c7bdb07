//! Bicubic resampling with `align_corners = false` and replicated borders.
//!
//! The kernel uses `A = -0.75`, the coefficient shared by OpenCV's
//! `INTER_CUBIC` and PyTorch's `bicubic` mode, so frames and depth maps are
//! resampled the same way the networks were trained and evaluated.

use image::{Rgb, RgbImage};
use ndarray::Array2;
use rayon::prelude::*;

const A: f32 = -0.75;

fn cubic_weight(x: f32) -> f32 {
	let abs = x.abs();
	let abs2 = abs * abs;
	let abs3 = abs2 * abs;
	if abs <= 1.0 {
		(A + 2.0) * abs3 - (A + 3.0) * abs2 + 1.0
	} else if abs < 2.0 {
		A * abs3 - 5.0 * A * abs2 + 8.0 * A * abs - 4.0 * A
	} else {
		0.0
	}
}

/// Source indices and weights contributing to one output coordinate.
#[derive(Clone, Copy)]
struct Taps {
	index: [usize; 4],
	weight: [f32; 4],
}

fn taps(src_len: usize, dst_len: usize) -> Vec<Taps> {
	let scale = src_len as f32 / dst_len as f32;
	let max = src_len as isize - 1;

	(0..dst_len)
		.map(|dst| {
			let src = (dst as f32 + 0.5) * scale - 0.5;
			let base = src.floor() as isize;
			let mut index = [0usize; 4];
			let mut weight = [0f32; 4];
			for (k, offset) in (-1..=2).enumerate() {
				let tap = base + offset;
				index[k] = tap.clamp(0, max) as usize;
				weight[k] = cubic_weight(src - tap as f32);
			}
			Taps { index, weight }
		})
		.collect()
}

/// Resample a single-channel plane to `height x width`.
///
/// Values are not clamped, so overshoot around sharp edges is preserved the way
/// PyTorch's interpolation preserves it.
pub fn resize_plane(plane: &Array2<f32>, height: usize, width: usize) -> Array2<f32> {
	let (src_h, src_w) = plane.dim();
	if (src_h, src_w) == (height, width) {
		return plane.clone();
	}
	if height == 0 || width == 0 || src_h == 0 || src_w == 0 {
		return Array2::zeros((height, width));
	}

	let rows = taps(src_h, height);
	let cols = taps(src_w, width);
	let mut out = vec![0f32; height * width];

	out.par_chunks_mut(width)
		.zip(rows.par_iter())
		.for_each(|(row, ty)| {
			for (value, tx) in row.iter_mut().zip(cols.iter()) {
				let mut acc = 0f32;
				for (&sy, &wy) in ty.index.iter().zip(ty.weight.iter()) {
					for (&sx, &wx) in tx.index.iter().zip(tx.weight.iter()) {
						acc += wy * wx * plane[[sy, sx]];
					}
				}
				*value = acc;
			}
		});

	Array2::from_shape_vec((height, width), out)
		.unwrap_or_else(|_| Array2::zeros((height, width)))
}

/// Resample an RGB frame to `width x height`, rounding and clamping to 8 bits.
pub fn resize_rgb(image: &RgbImage, width: u32, height: u32) -> RgbImage {
	if image.dimensions() == (width, height) {
		return image.clone();
	}
	if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
		return RgbImage::new(width, height);
	}

	let rows = taps(image.height() as usize, height as usize);
	let cols = taps(image.width() as usize, width as usize);
	let row_len = width as usize * 3;
	let mut out = vec![0u8; row_len * height as usize];

	out.par_chunks_mut(row_len)
		.zip(rows.par_iter())
		.for_each(|(row, ty)| {
			for (pixel, tx) in row.chunks_exact_mut(3).zip(cols.iter()) {
				let mut acc = [0f32; 3];
				for (&sy, &wy) in ty.index.iter().zip(ty.weight.iter()) {
					for (&sx, &wx) in tx.index.iter().zip(tx.weight.iter()) {
						let Rgb(src) = image.get_pixel(sx as u32, sy as u32);
						let w = wy * wx;
						for c in 0..3 {
							acc[c] += w * src[c] as f32;
						}
					}
				}
				for c in 0..3 {
					pixel[c] = acc[c].round().clamp(0.0, 255.0) as u8;
				}
			}
		});

	RgbImage::from_raw(width, height, out).unwrap_or_else(|| RgbImage::new(width, height))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kernel_weights_sum_to_one() {
		for &frac in &[0.0f32, 0.25, 0.5, 0.9] {
			let sum: f32 = (-1..=2).map(|k| cubic_weight(frac - k as f32)).sum();
			assert!((sum - 1.0).abs() < 1e-5, "frac {frac}: {sum}");
		}
	}

	#[test]
	fn constant_plane_stays_constant() {
		let plane = Array2::from_elem((6, 8), 3.5f32);
		let up = resize_plane(&plane, 15, 20);
		assert_eq!(up.dim(), (15, 20));
		assert!(up.iter().all(|&v| (v - 3.5).abs() < 1e-4));
	}

	#[test]
	fn identity_size_is_a_copy() {
		let plane = Array2::from_shape_fn((3, 4), |(y, x)| (y * 4 + x) as f32);
		assert_eq!(resize_plane(&plane, 3, 4), plane);
	}

	#[test]
	fn plane_shape_is_height_by_width() {
		let plane = Array2::from_shape_fn((12, 16), |(y, x)| (y + x) as f32);
		let up = resize_plane(&plane, 480, 640);
		assert_eq!(up.dim(), (480, 640));
	}

	#[test]
	fn horizontal_ramp_stays_monotonic() {
		let plane = Array2::from_shape_fn((4, 8), |(_, x)| x as f32);
		let up = resize_plane(&plane, 4, 32);
		let row = up.row(2);
		for pair in row.as_slice().unwrap().windows(2) {
			assert!(pair[1] >= pair[0] - 1e-4);
		}
	}

	#[test]
	fn rgb_resize_keeps_flat_colors() {
		let img = RgbImage::from_pixel(10, 7, Rgb([12, 200, 99]));
		let out = resize_rgb(&img, 23, 5);
		assert_eq!(out.dimensions(), (23, 5));
		assert!(out.pixels().all(|p| *p == Rgb([12, 200, 99])));
	}
}
