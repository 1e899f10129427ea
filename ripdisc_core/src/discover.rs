/*!
# Ripdisc: Rip Discovery

Finished rips leave a recognizable trio behind — snapshot, whole-disc
FLAC, cue sheet — so previously ripped directories can be found and
re-converted without a disc in the drive.
*/

use crate::{
	DISC_CUE,
	DISC_FLAC,
	SNAPSHOT_FILE,
};
use fyi_msg::Msg;
use std::path::{
	Path,
	PathBuf,
};



/// # Find Convertible Rip Directories.
///
/// Recursively search `root` for directories holding all three marker
/// files. Directories with only some of them are probably botched rips;
/// they get flagged and skipped.
#[must_use]
pub fn find_flac_dirs(root: &Path) -> Vec<PathBuf> {
	let mut found = Vec::new();
	search(root, &mut found);
	found
}

/// # Recursive Worker.
fn search(dir: &Path, found: &mut Vec<PathBuf>) {
	let Ok(entries) = std::fs::read_dir(dir) else { return; };

	let mut markers = 0_u8;
	for e in entries.flatten() {
		let path = e.path();
		if path.is_dir() { search(&path, found); }
		else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
			if name == SNAPSHOT_FILE || name == DISC_FLAC || name == DISC_CUE {
				markers += 1;
			}
		}
	}

	if markers == 3 { found.push(dir.to_path_buf()); }
	else if markers > 0 {
		Msg::warning(format!("Incomplete rip directory {}.", dir.display())).eprint();
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_find_flac_dirs() {
		let root = tempfile::tempdir().expect("Tempdir failed.");

		// One complete rip, one partial, one unrelated.
		let good = root.path().join("good");
		std::fs::create_dir(&good).expect("Mkdir failed.");
		for f in [SNAPSHOT_FILE, DISC_FLAC, DISC_CUE] {
			std::fs::write(good.join(f), b"x").expect("Write failed.");
		}

		let bad = root.path().join("bad");
		std::fs::create_dir(&bad).expect("Mkdir failed.");
		std::fs::write(bad.join(DISC_FLAC), b"x").expect("Write failed.");

		std::fs::create_dir(root.path().join("other")).expect("Mkdir failed.");

		let found = find_flac_dirs(root.path());
		assert_eq!(found, vec![good], "Only the complete rip should be found.");
	}
}
