/*!
# Ripdisc: Library
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod cddb;
mod disc;
mod discid;
mod discover;
mod error;
mod http;
mod mb;
mod pick;
mod rip;
mod snapshot;
mod toc;

pub use cddb::{
	Cddb,
	CddbConfig,
	CddbEntry,
	Hello,
};
pub use disc::{
	Disc,
	Track,
};
pub use discid::{
	freedb_id,
	musicbrainz_id,
};
pub use discover::find_flac_dirs;
pub use error::RipError;
pub use mb::{
	CoverSide,
	MbConfig,
	MusicBrainz,
};
pub use pick::{
	FirstPicker,
	Picker,
};
pub(crate) use pick::select;
pub use rip::{
	RipOptions,
	Ripper,
	sanitize_dir_name,
};
pub use snapshot::{
	load_snapshot,
	save_snapshot,
};
pub use toc::read_disc;



/// # Disc Frames Per Second.
///
/// One frame (sector) is 1/75th of a second of audio; this is the
/// addressing granularity for all disc offsets and lengths.
pub const FPS: u32 = 75;

/// # Number of Lead-in Frames.
///
/// All discs reserve a 2-second region at the start before any audio data.
/// The `cd-discid` offsets include this amount; `cdparanoia` begin sectors
/// do not.
pub const CD_LEADIN: u32 = 150;

/// # Placeholder Artist/Title.
///
/// Metadata fields hold this until a lookup actually resolves them.
pub const UNKNOWN: &str = "unknown";

/// # Default Optical Device.
pub const DEVICE: &str = "/dev/sr0";

/// # Disc Snapshot File.
///
/// A versioned JSON dump of the disc model, written to the working
/// directory after each probe, and read back when no physical disc is
/// present.
pub const SNAPSHOT_FILE: &str = "disc.json";

/// # Whole-Disc FLAC File.
pub const DISC_FLAC: &str = "disc.flac";

/// # Cue Sheet File.
pub const DISC_CUE: &str = "disc.cue";

/// # Downloaded Cover Art File.
pub const COVER_FILE: &str = "cover.jpg";

/// # Default CDDB Server.
///
/// The original freedb went dark in 2020; the MusicBrainz mirror speaks
/// the same protocol.
pub const CDDB_SERVER: &str = "http://freedb.musicbrainz.org/~cddb/cddb.cgi";

/// # CDDB Protocol Level.
pub const CDDB_PROTO: u8 = 5;

/// # Default MusicBrainz Server.
pub const MB_SERVER: &str = "http://musicbrainz.org/ws/2";

/// # Default Cover Art Archive Server.
pub const COVER_SERVER: &str = "http://coverartarchive.org";
