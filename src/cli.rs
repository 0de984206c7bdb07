//! Shared plumbing for the command-line entry points.

use crate::pipeline::{ProgressCallback, SceneProgress};
use std::io::Write;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();
}

/// Render per-frame progress as a single updating stderr line.
pub fn progress_printer() -> ProgressCallback {
	Box::new(|progress: SceneProgress| {
		let mut stderr = std::io::stderr();
		let _ = write!(
			stderr,
			"\r[{}] {} {}/{} ({:.1}%)",
			progress.scene, progress.phase, progress.current_frame, progress.total_frames, progress.percent
		);
		if progress.phase == crate::pipeline::ScenePhase::Done {
			let _ = writeln!(stderr);
		}
		let _ = stderr.flush();
	})
}

/// Render download progress in the same style.
pub fn download_printer(label: String) -> impl Fn(u64, u64) {
	move |downloaded, total| {
		let mb = downloaded as f64 / 1_048_576.0;
		if total > 0 {
			eprint!(
				"\r[{}] {:.1}/{:.1} MB ({:.1}%)",
				label,
				mb,
				total as f64 / 1_048_576.0,
				downloaded as f64 / total as f64 * 100.0
			);
		} else {
			eprint!("\r[{}] {:.1} MB", label, mb);
		}
	}
}
