use crate::error::{DepthError, DepthResult};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
	Grayscale,
	Colored,
}

impl OutputKind {
	pub fn name(&self) -> &'static str {
		match self {
			OutputKind::Grayscale => "grayscale",
			OutputKind::Colored => "colored",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageEncoding {
	Jpeg { quality: u8 },
	/// Also used when the extension names no format we can encode, such as
	/// `.jxl` or a bare frame number. The file keeps its original name.
	Png,
	Native(ImageFormat),
}

impl ImageEncoding {
	pub fn from_path<P: AsRef<Path>>(path: P, jpeg_quality: u8) -> Self {
		match ImageFormat::from_path(path) {
			Ok(ImageFormat::Jpeg) => ImageEncoding::Jpeg {
				quality: jpeg_quality,
			},
			Ok(format @ (ImageFormat::Bmp | ImageFormat::Tiff | ImageFormat::WebP)) => {
				ImageEncoding::Native(format)
			}
			_ => ImageEncoding::Png,
		}
	}
}

/// `<stem>_<model_name>_result`, with `_colored` appended for colored output.
pub fn output_dir(stem: impl AsRef<Path>, model_name: &str, kind: OutputKind) -> PathBuf {
	let mut name = stem.as_ref().as_os_str().to_owned();
	name.push("_");
	name.push(model_name);
	name.push("_result");
	if kind == OutputKind::Colored {
		name.push("_colored");
	}
	PathBuf::from(name)
}

/// Write `images[i]` to `<output_dir>/<filenames[i]>` and return the directory.
pub fn write_images(
	model_name: &str,
	stem: impl AsRef<Path>,
	kind: OutputKind,
	images: &[DynamicImage],
	filenames: &[String],
	jpeg_quality: u8,
) -> DepthResult<PathBuf> {
	if images.is_empty() {
		return Err(DepthError::EmptyBatch);
	}
	if images.len() != filenames.len() {
		return Err(DepthError::BatchLengthMismatch {
			images: images.len(),
			filenames: filenames.len(),
		});
	}

	let dir = output_dir(stem, model_name, kind);
	std::fs::create_dir_all(&dir).map_err(|e| {
		DepthError::IoError(format!("Failed to create output directory {:?}: {}", dir, e))
	})?;

	for (image, filename) in images.iter().zip(filenames) {
		let path = dir.join(filename);
		save_image(image, &path, ImageEncoding::from_path(&path, jpeg_quality))?;
	}

	tracing::debug!("Wrote {} {} images to {:?}", images.len(), kind.name(), dir);
	Ok(dir)
}

fn save_image(image: &DynamicImage, path: &Path, encoding: ImageEncoding) -> DepthResult<()> {
	match encoding {
		ImageEncoding::Jpeg { quality } => {
			let file = std::fs::File::create(path).map_err(|e| {
				DepthError::IoError(format!("Failed to create output file {:?}: {}", path, e))
			})?;

			let writer = std::io::BufWriter::new(file);
			let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality);
			image
				.write_with_encoder(encoder)
				.map_err(|e| DepthError::ImageError(format!("Failed to encode JPEG {:?}: {}", path, e)))?;
		}
		ImageEncoding::Png => write_as(image, path, ImageFormat::Png)?,
		ImageEncoding::Native(format) => write_as(image, path, format)?,
	}

	Ok(())
}

fn write_as(image: &DynamicImage, path: &Path, format: ImageFormat) -> DepthResult<()> {
	image
		.save_with_format(path, format)
		.map_err(|e| DepthError::ImageError(format!("Failed to save {:?} as {:?}: {}", path, format, e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{GrayImage, Luma, RgbImage};

	#[test]
	fn directory_names_follow_model_tag() {
		assert_eq!(
			output_dir("out/s1", "X", OutputKind::Grayscale),
			PathBuf::from("out/s1_X_result")
		);
		assert_eq!(
			output_dir("out/s1", "X", OutputKind::Colored),
			PathBuf::from("out/s1_X_result_colored")
		);
	}

	#[test]
	fn writes_each_image_under_its_original_name() {
		let dir = tempfile::tempdir().unwrap();
		let stem = dir.path().join("s1");
		let gray = vec![
			DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 2, Luma([9]))),
			DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 2, Luma([200]))),
		];
		let names = vec!["a.png".to_string(), "b.png".to_string()];

		let out = write_images("X", &stem, OutputKind::Grayscale, &gray, &names, 95).unwrap();

		assert_eq!(out, dir.path().join("s1_X_result"));
		let b = image::open(out.join("b.png")).unwrap().to_luma8();
		assert_eq!(b.get_pixel(3, 1)[0], 200);
		assert!(out.join("a.png").is_file());
	}

	#[test]
	fn rewriting_into_existing_directory_succeeds() {
		let dir = tempfile::tempdir().unwrap();
		let stem = dir.path().join("s1");
		let colored = vec![DynamicImage::ImageRgb8(RgbImage::new(3, 3))];
		let names = vec!["f.jpg".to_string()];

		write_images("X", &stem, OutputKind::Colored, &colored, &names, 90).unwrap();
		let out = write_images("X", &stem, OutputKind::Colored, &colored, &names, 90).unwrap();

		assert!(out.join("f.jpg").is_file());
		assert_eq!(out.file_name().unwrap(), "s1_X_result_colored");
	}

	#[test]
	fn empty_batch_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let err = write_images("X", dir.path().join("s"), OutputKind::Grayscale, &[], &[], 95).unwrap_err();
		assert!(matches!(err, DepthError::EmptyBatch));
		assert!(!dir.path().join("s_X_result").exists());
	}

	#[test]
	fn mismatched_lengths_are_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let images = vec![DynamicImage::ImageLuma8(GrayImage::new(1, 1))];
		let err = write_images("X", dir.path().join("s"), OutputKind::Grayscale, &images, &[], 95).unwrap_err();
		assert!(matches!(err, DepthError::BatchLengthMismatch { images: 1, filenames: 0 }));
	}

	#[test]
	fn encoding_follows_extension() {
		assert_eq!(ImageEncoding::from_path("a.JPG", 80), ImageEncoding::Jpeg { quality: 80 });
		assert_eq!(ImageEncoding::from_path("a.png", 80), ImageEncoding::Png);
		assert_eq!(ImageEncoding::from_path("a.bmp", 80), ImageEncoding::Native(ImageFormat::Bmp));
		assert_eq!(ImageEncoding::from_path("a.jxl", 80), ImageEncoding::Png);
		assert_eq!(ImageEncoding::from_path("frame0001", 80), ImageEncoding::Png);
	}

	#[test]
	fn unwritable_extensions_keep_their_name_with_png_content() {
		let dir = tempfile::tempdir().unwrap();
		let stem = dir.path().join("s1");
		let gray = vec![
			DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([42]))),
			DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([7]))),
		];
		let names = vec!["frame0001".to_string(), "frame0002.jxl".to_string()];

		let out = write_images("X", &stem, OutputKind::Grayscale, &gray, &names, 95).unwrap();

		for (name, value) in [("frame0001", 42), ("frame0002.jxl", 7)] {
			let decoded = image::ImageReader::open(out.join(name))
				.unwrap()
				.with_guessed_format()
				.unwrap();
			assert_eq!(decoded.format(), Some(ImageFormat::Png));
			assert_eq!(decoded.decode().unwrap().to_luma8().get_pixel(2, 1)[0], value);
		}
	}
}
