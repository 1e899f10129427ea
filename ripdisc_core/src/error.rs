/*!
# Ripdisc: Errors
*/

use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r"
   ______
  /o  OO \    Ripdisc v", env!("CARGO_PKG_VERSION"), r"
 | O  oO  |   Rip an audio CD: geometry, metadata,
  \_OO___/    capture, transcode, tag.

USAGE:
    ripdisc [OPTIONS] [DIR]

MODES:
        --only-rip       Capture and FLAC-encode only; skip the lossy
                         conversions.
        --only-convert   Convert existing FLAC/WAV captures to OGG and MP3;
                         skip the drive entirely.
        --discover-flacs Search DIR recursively for previously ripped
                         directories to convert. Requires --only-convert.

SETTINGS:
    -d, --dev <PATH>     The optical drive device path. [default: /dev/sr0]
        --cddb-server <URL>
                         CDDB-protocol server.
                         [default: http://freedb.musicbrainz.org/~cddb/cddb.cgi]
        --mb-server <URL>
                         MusicBrainz web-service root.
                         [default: http://musicbrainz.org/ws/2]
        --cover <front|back>
                         Which sleeve image to fetch from the Cover Art
                         Archive. [default: back]
        --yes            Assume yes for the confirmation prompts.

MISCELLANEOUS:
    -h, --help           Print help information to STDOUT and exit.
    -V, --version        Print version information to STDOUT and exit.

DIR defaults to the current working directory. Captured and converted
files are staged there until the final rename.
");



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum RipError {
	/// # Out-of-range candidate selection.
	Candidate(usize),

	/// # Conflicting disc length measurements.
	LengthMismatch(u32, u32),

	/// # Server echoed the wrong disc ID.
	DiscIdMismatch(String, String),

	/// # No release media matched the local track lengths.
	AmbiguousRelease,

	/// # A required external tool is not installed.
	MissingTool(&'static str),

	/// # Drive is reachable but holds no disc.
	NoDisc,

	/// # Nothing to do.
	Noop,

	/// # Unusable snapshot.
	Snapshot(String),

	/// # Unparseable tool output.
	ToolOutput(&'static str),

	/// # Writing to disk.
	Write(String),

	/// # CLI/Option Parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Conflicting CLI modes.
	CliConflict(&'static str, &'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for RipError {}

impl From<RipError> for Msg {
	#[inline]
	fn from(src: RipError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for RipError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Candidate(n) => write!(f, "No candidate #{n} to select."),
			Self::LengthMismatch(a, b) => write!(
				f,
				"Disc length disagreement: table of contents says {a} frames, tooling says {b}.",
			),
			Self::DiscIdMismatch(local, remote) => write!(
				f,
				"Server answered for disc {remote}, but this disc is {local}.",
			),
			Self::AmbiguousRelease => f.write_str("No single release media matches the measured track lengths."),
			Self::MissingTool(s) => write!(f, "Check that {s} is installed."),
			Self::NoDisc => f.write_str("No CD found."),
			Self::Noop => f.write_str("There's nothing to do!"),
			Self::Snapshot(s) => write!(f, "Unusable disc snapshot: {s}."),
			Self::ToolOutput(s) => write!(f, "Unable to parse the output of {s}."),
			Self::Write(s) => write!(f, "Unable to write to {s}."),
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::CliConflict(a, b) => write!(f, "Cannot combine {a} and {b}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("Ripdisc v", env!("CARGO_PKG_VERSION"))),
		}
	}
}
