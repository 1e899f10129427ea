/*!
# Ripdisc: CLI
*/

use argyle::Argument;
use ripdisc_core::{
	CddbConfig,
	CoverSide,
	MbConfig,
	RipError,
	RipOptions,
};
use std::path::PathBuf;



/// # Parsed Settings.
pub(super) struct Settings {
	/// # Pipeline Options.
	pub(super) rip: RipOptions,

	/// # CDDB Client Configuration.
	pub(super) cddb: CddbConfig,

	/// # MusicBrainz Client Configuration.
	pub(super) mb: MbConfig,

	/// # Hunt for Previous Rips Instead?
	pub(super) discover: bool,

	/// # Skip the Prompts?
	pub(super) yes: bool,

	/// # Starting Directory.
	pub(super) dir: PathBuf,
}



/// # Parse Options.
pub(super) fn parse() -> Result<Settings, RipError> {
	let args = argyle::args()
		.with_keywords(include!(concat!(env!("OUT_DIR"), "/argyle.rs")));

	let mut cddb = CddbConfig::default();
	let mut mb = MbConfig::default();
	let mut dev = None;
	let mut dir = None;
	let mut discover = false;
	let mut only_convert = false;
	let mut only_rip = false;
	let mut yes = false;
	for arg in args {
		match arg {
			Argument::Key("--discover-flacs") => { discover = true; },
			Argument::Key("-h" | "--help") => return Err(RipError::PrintHelp),
			Argument::Key("--only-convert") => { only_convert = true; },
			Argument::Key("--only-rip") => { only_rip = true; },
			Argument::Key("-V" | "--version") => return Err(RipError::PrintVersion),
			Argument::Key("--yes") => { yes = true; },

			Argument::KeyWithValue("--cddb-server", s) => { cddb.server = s; },
			Argument::KeyWithValue("--cover", s) => {
				mb.cover = CoverSide::try_from(s.as_str())?;
			},
			Argument::KeyWithValue("-d" | "--dev", s) => { dev.replace(s); },
			Argument::KeyWithValue("--mb-server", s) => { mb.server = s; },

			Argument::Other(s) => { dir.replace(PathBuf::from(s)); },

			_ => {},
		}
	}

	check_modes(only_rip, only_convert, discover)?;

	let mut rip = RipOptions::default()
		.with_capture(! only_convert)
		.with_convert(! only_rip);
	if let Some(dev) = dev { rip = rip.with_dev(&dev); }

	Ok(Settings {
		rip,
		cddb,
		mb,
		discover,
		yes,
		dir: dir.unwrap_or_else(|| PathBuf::from(".")),
	})
}

/// # Validate the Mode Flags.
///
/// Ripping and converting are mutually exclusive, and discovery only
/// makes sense for a convert-only run; bad combinations are rejected
/// before any work happens.
const fn check_modes(only_rip: bool, only_convert: bool, discover: bool)
-> Result<(), RipError> {
	if only_rip && only_convert {
		return Err(RipError::CliConflict("--only-rip", "--only-convert"));
	}
	if discover && only_rip {
		return Err(RipError::CliConflict("--discover-flacs", "--only-rip"));
	}
	if discover && ! only_convert {
		return Err(RipError::CliConflict("--discover-flacs", "capturing (pass --only-convert)"));
	}
	Ok(())
}
