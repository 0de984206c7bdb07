//! Inferno colormap for 8-bit depth maps.
//!
//! Entries come from matplotlib's 256-color inferno table, the same one
//! OpenCV ships as `COLORMAP_INFERNO`.

use image::{GrayImage, Rgb, RgbImage};
use std::sync::OnceLock;

fn table() -> &'static [[u8; 3]; 256] {
	static TABLE: OnceLock<[[u8; 3]; 256]> = OnceLock::new();
	TABLE.get_or_init(|| {
		let mut lut = [[0u8; 3]; 256];
		for (i, entry) in lut.iter_mut().enumerate() {
			let c = colorous::INFERNO.eval_rational(i, 256);
			*entry = [c.r, c.g, c.b];
		}
		lut
	})
}

/// RGB color for a depth intensity.
pub fn inferno(index: u8) -> [u8; 3] {
	table()[index as usize]
}

pub fn colorize(depth: &GrayImage) -> RgbImage {
	let lut = table();
	let (w, h) = depth.dimensions();
	RgbImage::from_fn(w, h, |x, y| Rgb(lut[depth.get_pixel(x, y)[0] as usize]))
}

/// Colorize every map, preserving count and order.
pub fn colorize_batch(depths: &[GrayImage]) -> Vec<RgbImage> {
	depths.iter().map(colorize).collect()
}
