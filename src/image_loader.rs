use crate::error::{DepthError, DepthResult};
use image::RgbImage;
use std::path::Path;

/// Decode a frame into 8-bit RGB.
pub fn load_frame(path: impl AsRef<Path>) -> DepthResult<RgbImage> {
	let path = path.as_ref();

	if !path.exists() {
		return Err(DepthError::ImageError(format!(
			"Image file not found: {:?}",
			path
		)));
	}

	let extension = path
		.extension()
		.and_then(|ext| ext.to_str())
		.map(|s| s.to_lowercase())
		.unwrap_or_default();

	match extension.as_str() {
		"jxl" => load_jxl(path),
		_ => load_standard(path),
	}
}

fn load_standard(path: &Path) -> DepthResult<RgbImage> {
	let img = image::ImageReader::open(path)
		.and_then(|reader| reader.with_guessed_format())
		.map_err(|e| DepthError::IoError(format!("Failed to open image {:?}: {}", path, e)))?
		.decode()
		.map_err(|e| DepthError::ImageError(format!("Failed to load image {:?}: {}", path, e)))?;
	Ok(img.to_rgb8())
}

#[cfg(feature = "jxl")]
fn load_jxl(path: &Path) -> DepthResult<RgbImage> {
	let file = std::fs::File::open(path)
		.map_err(|e| DepthError::IoError(format!("Failed to open frame {:?}: {}", path, e)))?;
	let frame = jxl_oxide::JxlImage::builder()
		.read(std::io::BufReader::new(file))
		.map_err(|e| DepthError::ImageError(format!("Failed to decode JPEG XL frame {:?}: {}", path, e)))?;

	let render = frame
		.render_frame(0)
		.map_err(|e| DepthError::ImageError(format!("Failed to render JPEG XL frame {:?}: {}", path, e)))?;
	let planes = render.image_planar();
	let planes: Vec<&[f32]> = planes.iter().map(|plane| plane.buf()).collect();

	interleave_planes(frame.width(), frame.height(), &planes)
		.map_err(|e| DepthError::ImageError(format!("{:?}: {}", path, e)))
}

/// Pack planar `[0, 1]` samples into RGB8.
///
/// One plane (or gray plus alpha) is gray; otherwise the first three planes
/// are color. Extra planes are ignored.
#[cfg_attr(not(feature = "jxl"), allow(dead_code))]
fn interleave_planes(width: u32, height: u32, planes: &[&[f32]]) -> Result<RgbImage, String> {
	let pixels = width as usize * height as usize;
	let color: [&[f32]; 3] = match planes {
		[] => return Err("frame has no color channels".to_string()),
		[gray] | [gray, _] => [*gray, *gray, *gray],
		[r, g, b, ..] => [*r, *g, *b],
	};
	if let Some(short) = color.iter().find(|plane| plane.len() < pixels) {
		return Err(format!(
			"plane holds {} samples, expected {} for {}x{}",
			short.len(),
			pixels,
			width,
			height
		));
	}

	let quantize = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
	Ok(RgbImage::from_fn(width, height, |x, y| {
		let i = y as usize * width as usize + x as usize;
		image::Rgb([quantize(color[0][i]), quantize(color[1][i]), quantize(color[2][i])])
	}))
}

#[cfg(not(feature = "jxl"))]
fn load_jxl(path: &Path) -> DepthResult<RgbImage> {
	Err(DepthError::ImageError(format!(
		"{:?}: JPEG XL frames require the `jxl` feature",
		path
	)))
}
