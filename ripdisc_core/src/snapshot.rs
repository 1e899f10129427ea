/*!
# Ripdisc: Disc Snapshot

The disc model is persisted to the working directory after each probe so a
run can resume — retagging, reconverting — without the physical disc in
the drive. The format is versioned JSON rather than an opaque object dump,
so the fallback path survives the program changing underneath it.
*/

use crate::{
	Disc,
	RipError,
	SNAPSHOT_FILE,
};
use serde::{
	Deserialize,
	Serialize,
};
use std::path::Path;



/// # Current Schema Version.
const VERSION: u8 = 1;



#[derive(Debug, Serialize, Deserialize)]
/// # Versioned Envelope.
struct Snapshot {
	/// # Schema Version.
	version: u8,

	/// # The Disc.
	disc: Disc,
}



/// # Save the Disc Snapshot.
///
/// Written atomically; a crash mid-save leaves the old snapshot intact.
///
/// ## Errors
///
/// Returns [`RipError::Write`] if the file cannot be written.
pub fn save_snapshot(dir: &Path, disc: &Disc) -> Result<(), RipError> {
	let dst = dir.join(SNAPSHOT_FILE);
	let raw = serde_json::to_vec_pretty(&Snapshot { version: VERSION, disc: disc.clone() })
		.map_err(|_| RipError::Write(dst.to_string_lossy().into_owned()))?;
	write_atomic::write_file(&dst, &raw)
		.map_err(|_| RipError::Write(dst.to_string_lossy().into_owned()))
}

/// # Load the Disc Snapshot.
///
/// ## Errors
///
/// Returns [`RipError::Snapshot`] if the file is missing, malformed, or
/// from an unknown schema version.
pub fn load_snapshot(dir: &Path) -> Result<Disc, RipError> {
	let src = dir.join(SNAPSHOT_FILE);
	let raw = std::fs::read(&src)
		.map_err(|_| RipError::Snapshot(format!("{} is missing", src.display())))?;
	let snap: Snapshot = serde_json::from_slice(&raw)
		.map_err(|e| RipError::Snapshot(e.to_string()))?;
	if snap.version == VERSION { Ok(snap.disc) }
	else {
		Err(RipError::Snapshot(format!("unknown version {}", snap.version)))
	}
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::Track;

	#[test]
	fn t_round_trip() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");

		let mut disc = Disc::new();
		disc.set_artist(Some("Some Band"));
		disc.mbid.replace("some-mbid".to_owned());
		disc.tracks.push(Track::new(1, 150, 15_000));

		save_snapshot(dir.path(), &disc).expect("Save failed.");
		let back = load_snapshot(dir.path()).expect("Load failed.");
		assert_eq!(disc, back, "The snapshot should survive a round trip.");
	}

	#[test]
	fn t_bad_snapshots() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		assert!(
			matches!(load_snapshot(dir.path()), Err(RipError::Snapshot(_))),
			"A missing snapshot is a typed error.",
		);

		std::fs::write(dir.path().join(SNAPSHOT_FILE), b"{\"version\":9,\"disc\":null}")
			.expect("Write failed.");
		assert!(
			matches!(load_snapshot(dir.path()), Err(RipError::Snapshot(_))),
			"An unknown version is a typed error.",
		);
	}
}
