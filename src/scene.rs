use crate::error::{DepthError, DepthResult};
use std::path::{Path, PathBuf};

/// Auxiliary files that live next to the frames but are not frames.
pub const EXCLUDED_FILENAMES: [&str; 3] = ["all_file.txt", "bg_img.txt", ".directory"];

/// One directory of ordered video frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scene {
	pub name: String,
	/// Full frame paths, `frames[i] == <root>/<name>/<filenames[i]>`.
	pub frames: Vec<PathBuf>,
	/// Original filenames, reused verbatim when writing results.
	pub filenames: Vec<String>,
}

impl Scene {
	pub fn len(&self) -> usize {
		self.frames.len()
	}

	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}
}

/// List every scene under `root`, sorted by name, with its frames sorted by filename.
pub fn load_scenes(root: impl AsRef<Path>) -> DepthResult<Vec<Scene>> {
	let root = root.as_ref();

	if !root.is_dir() {
		return Err(DepthError::IoError(format!(
			"Input root is not a directory: {:?}",
			root
		)));
	}

	let mut scene_names = Vec::new();
	for entry in std::fs::read_dir(root)? {
		let entry = entry?;
		if !entry.file_type()?.is_dir() {
			tracing::debug!("Skipping non-directory entry in input root: {:?}", entry.file_name());
			continue;
		}
		scene_names.push(utf8_name(&entry.path())?);
	}
	scene_names.sort();

	scene_names
		.into_iter()
		.map(|name| {
			let scene_dir = root.join(&name);
			let filenames = list_frames(&scene_dir)?;
			let frames = filenames.iter().map(|f| scene_dir.join(f)).collect();
			Ok(Scene {
				name,
				frames,
				filenames,
			})
		})
		.collect()
}

fn list_frames(scene_dir: &Path) -> DepthResult<Vec<String>> {
	let mut filenames = Vec::new();

	for entry in std::fs::read_dir(scene_dir)? {
		let entry = entry?;
		if entry.file_type()?.is_dir() {
			tracing::debug!("Skipping nested directory {:?}", entry.path());
			continue;
		}
		let name = utf8_name(&entry.path())?;
		if EXCLUDED_FILENAMES.contains(&name.as_str()) {
			continue;
		}
		filenames.push(name);
	}

	filenames.sort();
	Ok(filenames)
}

fn utf8_name(path: &Path) -> DepthResult<String> {
	path.file_name()
		.and_then(|n| n.to_str())
		.map(str::to_owned)
		.ok_or_else(|| DepthError::ConfigError(format!("Filename is not valid UTF-8: {:?}", path)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	fn touch(path: &Path) {
		fs::write(path, b"").unwrap();
	}

	#[test]
	fn scenes_and_frames_are_sorted_and_filtered() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path();
		for scene in ["s2", "s1"] {
			fs::create_dir(root.join(scene)).unwrap();
		}
		for name in ["0002.png", "0010.png", "0001.png", "all_file.txt", "bg_img.txt", ".directory"] {
			touch(&root.join("s1").join(name));
		}
		touch(&root.join("s2").join("b.jpg"));
		touch(&root.join("s2").join("a.jpg"));

		let scenes = load_scenes(root).unwrap();

		assert_eq!(scenes.len(), 2);
		assert_eq!(scenes[0].name, "s1");
		assert_eq!(scenes[0].filenames, vec!["0001.png", "0002.png", "0010.png"]);
		assert_eq!(scenes[0].frames[2], root.join("s1").join("0010.png"));
		assert_eq!(scenes[1].name, "s2");
		assert_eq!(scenes[1].filenames, vec!["a.jpg", "b.jpg"]);
	}

	#[test]
	fn empty_scene_yields_empty_lists() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join("empty")).unwrap();
		touch(&dir.path().join("empty").join("all_file.txt"));

		let scenes = load_scenes(dir.path()).unwrap();

		assert_eq!(scenes.len(), 1);
		assert!(scenes[0].is_empty());
		assert!(scenes[0].filenames.is_empty());
	}

	#[test]
	fn stray_files_at_root_are_not_scenes() {
		let dir = tempfile::tempdir().unwrap();
		touch(&dir.path().join("notes.txt"));
		fs::create_dir(dir.path().join("scene")).unwrap();
		fs::create_dir(dir.path().join("scene").join("nested")).unwrap();
		touch(&dir.path().join("scene").join("f.png"));

		let scenes = load_scenes(dir.path()).unwrap();

		assert_eq!(scenes.len(), 1);
		assert_eq!(scenes[0].filenames, vec!["f.png"]);
	}

	#[cfg(target_os = "linux")]
	#[test]
	fn non_utf8_entries_outside_scenes_are_skipped() {
		use std::ffi::OsStr;
		use std::os::unix::ffi::OsStrExt;

		let dir = tempfile::tempdir().unwrap();
		touch(&dir.path().join(OsStr::from_bytes(b"stray\xff.txt")));
		fs::create_dir(dir.path().join("scene")).unwrap();
		fs::create_dir(dir.path().join("scene").join(OsStr::from_bytes(b"old\xfe"))).unwrap();
		touch(&dir.path().join("scene").join("f.png"));

		let scenes = load_scenes(dir.path()).unwrap();

		assert_eq!(scenes.len(), 1);
		assert_eq!(scenes[0].filenames, vec!["f.png"]);
	}

	#[cfg(target_os = "linux")]
	#[test]
	fn non_utf8_frame_names_are_rejected() {
		use std::ffi::OsStr;
		use std::os::unix::ffi::OsStrExt;

		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join("scene")).unwrap();
		touch(&dir.path().join("scene").join(OsStr::from_bytes(b"frame\xff.png")));

		let result = load_scenes(dir.path());
		assert!(matches!(result, Err(DepthError::ConfigError(_))));
	}

	#[test]
	fn missing_root_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let result = load_scenes(dir.path().join("does-not-exist"));
		assert!(matches!(result, Err(DepthError::IoError(_))));
	}
}
