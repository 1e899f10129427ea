/*!
# Ripdisc: Disc
*/

use crate::{
	CD_LEADIN,
	DISC_FLAC,
	FPS,
	UNKNOWN,
};
use dactyl::NiceU32;
use serde::{
	Deserialize,
	Serialize,
};
use std::{
	collections::BTreeMap,
	fmt,
};



#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
/// # Track.
///
/// One audio track, owned by its parent [`Disc`]. Offsets and lengths are
/// in disc frames.
pub struct Track {
	/// # Track Number (one-based).
	pub num: u8,

	/// # Start Offset (frames, lead-in included).
	pub offset: u32,

	/// # Length (frames).
	pub length: u32,

	/// # Track Artist.
	pub artist: String,

	/// # Track Title.
	pub title: String,

	#[serde(default)]
	/// # Pre-emphasis Flag.
	pub pre_emphasis: bool,
}

impl Track {
	#[must_use]
	/// # New.
	///
	/// Metadata starts out as "unknown" until a lookup resolves it.
	pub fn new(num: u8, offset: u32, length: u32) -> Self {
		Self {
			num,
			offset,
			length,
			artist: UNKNOWN.to_owned(),
			title: UNKNOWN.to_owned(),
			pre_emphasis: false,
		}
	}

	/// # Set Artist.
	///
	/// Empty and missing values leave the current one alone.
	pub fn set_artist(&mut self, artist: Option<&str>) {
		if let Some(artist) = artist {
			let artist = artist.trim();
			if ! artist.is_empty() { artist.clone_into(&mut self.artist); }
		}
	}

	/// # Set Title.
	pub fn set_title(&mut self, title: Option<&str>) {
		if let Some(title) = title {
			let title = title.trim();
			if ! title.is_empty() { title.clone_into(&mut self.title); }
		}
	}
}



#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
/// # Disc.
///
/// The in-memory disc model, merged from the drive geometry and whichever
/// metadata source won. Tracks are stored in track order, with unique
/// one-based numbers.
pub struct Disc {
	/// # Lead-in Frames.
	pub lead_in: u32,

	/// # Frames Per Second.
	pub fps: u32,

	/// # Disc Artist.
	pub artist: String,

	/// # Disc Title.
	pub title: String,

	#[serde(default)]
	/// # MusicBrainz Release ID.
	///
	/// Only present after a successful MusicBrainz resolution; consumers
	/// must handle the unresolved state explicitly.
	pub mbid: Option<String>,

	/// # Tracks.
	pub tracks: Vec<Track>,
}

impl Default for Disc {
	#[inline]
	fn default() -> Self { Self::new() }
}

impl Disc {
	#[must_use]
	/// # New (Empty).
	pub fn new() -> Self {
		Self {
			lead_in: CD_LEADIN,
			fps: FPS,
			artist: UNKNOWN.to_owned(),
			title: UNKNOWN.to_owned(),
			mbid: None,
			tracks: Vec::new(),
		}
	}

	#[must_use]
	/// # Track Count.
	pub const fn num_tracks(&self) -> usize { self.tracks.len() }

	#[must_use]
	/// # Total Disc Length (frames).
	///
	/// Lead-in plus the sum of the track lengths. This must agree with the
	/// independent figure reported by the capture tool; see
	/// [`crate::read_disc`].
	pub fn disc_len(&self) -> u32 {
		self.lead_in + self.tracks.iter().map(|t| t.length).sum::<u32>()
	}

	#[must_use]
	/// # Playtime (seconds).
	///
	/// The audio portion only, i.e. lead-in excluded.
	pub fn playtime_secs(&self) -> u32 {
		(self.disc_len() - self.lead_in).wrapping_div(self.fps)
	}

	#[must_use]
	/// # Total Length (seconds).
	pub fn total_secs(&self) -> u32 { self.disc_len().wrapping_div(self.fps) }

	#[must_use]
	/// # Track By Number.
	pub fn track(&self, num: u8) -> Option<&Track> {
		self.tracks.iter().find(|t| t.num == num)
	}

	/// # Mutable Track By Number.
	pub fn track_mut(&mut self, num: u8) -> Option<&mut Track> {
		self.tracks.iter_mut().find(|t| t.num == num)
	}

	/// # Set Artist.
	///
	/// Empty and missing values leave the current one alone.
	pub fn set_artist(&mut self, artist: Option<&str>) {
		if let Some(artist) = artist {
			let artist = artist.trim();
			if ! artist.is_empty() { artist.clone_into(&mut self.artist); }
		}
	}

	/// # Set Title.
	pub fn set_title(&mut self, title: Option<&str>) {
		if let Some(title) = title {
			let title = title.trim();
			if ! title.is_empty() { title.clone_into(&mut self.title); }
		}
	}
}

impl Disc {
	#[must_use]
	/// # Frames to Cue Time.
	///
	/// Format a frame count as `mm:ss:ff`. The inverse of
	/// [`Disc::msf_to_frames`]; the round trip is exact.
	pub fn msf(&self, frames: u32) -> String {
		let secs = frames.wrapping_div(self.fps);
		format!(
			"{:02}:{:02}:{:02}",
			secs.wrapping_div(60),
			secs % 60,
			frames % self.fps,
		)
	}

	#[must_use]
	/// # Cue Time to Frames.
	///
	/// Parse an `mm:ss:ff` string back into frames, or `None` if the
	/// pieces don't look right.
	pub fn msf_to_frames(&self, src: &str) -> Option<u32> {
		let mut split = src.splitn(3, ':');
		let mm: u32 = split.next()?.parse().ok()?;
		let ss: u32 = split.next()?.parse().ok()?;
		let ff: u32 = split.next()?.parse().ok()?;
		if ss < 60 && ff < self.fps {
			Some((mm * 60 + ss) * self.fps + ff)
		}
		else { None }
	}

	#[must_use]
	/// # Cue Sheet.
	///
	/// Serialize the disc as a cue sheet describing `disc.flac`. Track
	/// index times are relative to the start of the audio data, so the
	/// lead-in is subtracted from each offset.
	pub fn cue_sheet(&self) -> String {
		use std::fmt::Write;

		let mut cue = String::new();
		let _res = writeln!(&mut cue, "PERFORMER \"{}\"", self.artist);
		let _res = writeln!(&mut cue, "TITLE \"{}\"", self.title);
		let _res = writeln!(&mut cue, "FILE \"{DISC_FLAC}\" WAVE");
		for t in &self.tracks {
			let start = t.offset.saturating_sub(self.lead_in);
			let _res = writeln!(&mut cue, "  TRACK {:02} AUDIO", t.num);
			let _res = writeln!(&mut cue, "    TITLE \"{}\"", t.title);
			let _res = writeln!(&mut cue, "    PERFORMER \"{}\"", t.artist);
			let _res = writeln!(&mut cue, "    INDEX 01 {}", self.msf(start));
		}
		cue
	}

	/// # Merge CDDB Metadata.
	///
	/// Apply the `name=value` mapping from a `cddb read` response. The
	/// disc's own line is `DTITLE`; tracks use `TTITLEn` or `TTITLE0n`
	/// with zero-based numbering, each optionally "artist / title".
	pub fn apply_cddb(&mut self, metadata: &BTreeMap<String, String>) {
		if let Some(dtitle) = metadata.get("DTITLE") {
			let (artist, title) = split_on_slash(dtitle);
			self.set_artist(artist);
			self.set_title(Some(title));
			// A disc-level artist seeds every track too.
			if let Some(artist) = artist {
				for t in &mut self.tracks { t.set_artist(Some(artist)); }
			}
		}

		for t in &mut self.tracks {
			let i = u32::from(t.num) - 1; // CDDB numbering is zero-based.
			let Some(ttitle) = metadata.get(&format!("TTITLE{i}"))
				.or_else(|| metadata.get(&format!("TTITLE{i:02}")))
				else { continue; };
			let (artist, title) = split_on_slash(ttitle);
			t.set_artist(artist);
			t.set_title(Some(title));
		}
	}
}

impl fmt::Display for Disc {
	/// # Summarize the Disc.
	///
	/// Print the identifiers and a small table of contents, similar to
	/// what `cdparanoia -Q` shows.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "CDDB:        {}", crate::freedb_id(self))?;
		writeln!(f, "MusicBrainz: {}", self.mbid.as_deref().unwrap_or("(unresolved)"))?;
		writeln!(f, "Artist:      {}", self.artist)?;
		writeln!(f, "Title:       {}", self.title)?;
		writeln!(f, "\n##   BEGIN  LENGTH  TIME      TITLE")?;
		writeln!(f, "-----------------------------------")?;
		for t in &self.tracks {
			writeln!(
				f,
				"{:02}  {:>6}  {:>6}  {}  {}",
				t.num,
				t.offset,
				t.length,
				self.msf(t.length),
				t.title,
			)?;
		}
		writeln!(f, "-----------------------------------")?;
		writeln!(
			f,
			"{} tracks, {} frames, {} seconds",
			self.num_tracks(),
			NiceU32::from(self.disc_len()),
			self.total_secs(),
		)
	}
}



#[must_use]
/// # Split "Artist / Title".
///
/// Both metadata services pack the two fields into a single value joined
/// by a literal " / ". Absent the separator, the whole value is the title
/// and the artist is unknown.
pub(crate) fn split_on_slash(value: &str) -> (Option<&str>, &str) {
	value.split_once(" / ").map_or(
		(None, value.trim()),
		|(a, b)| (Some(a.trim()), b.trim()),
	)
}



#[cfg(test)]
mod tests {
	use super::*;

	/// # Five-Track Test Disc.
	fn test_disc() -> Disc {
		let mut disc = Disc::new();
		for (i, offset) in [150_u32, 10_150, 20_150, 30_150, 40_150].into_iter().enumerate() {
			disc.tracks.push(Track::new(i as u8 + 1, offset, 10_000));
		}
		disc
	}

	#[test]
	fn t_disc_len() {
		let disc = test_disc();
		assert_eq!(disc.disc_len(), 50_150, "Disc length should be lead-in plus lengths.");
		assert_eq!(disc.playtime_secs(), 666, "50_000 frames is 666 whole seconds.");
	}

	#[test]
	fn t_msf_round_trip() {
		let disc = Disc::new();
		for frames in (0..500_000_u32).step_by(7) {
			let msf = disc.msf(frames);
			assert_eq!(
				disc.msf_to_frames(&msf),
				Some(frames),
				"Round trip failed for {frames} ({msf}).",
			);
		}
		assert_eq!(disc.msf(0), "00:00:00");
		assert_eq!(disc.msf(75), "00:01:00");
		assert_eq!(disc.msf(75 * 60 + 74), "01:00:74");
	}

	#[test]
	fn t_msf_reject() {
		let disc = Disc::new();
		assert_eq!(disc.msf_to_frames("00:00:75"), None, "75 frames is not a valid remainder.");
		assert_eq!(disc.msf_to_frames("00:60:00"), None, "60 seconds is not a valid remainder.");
		assert_eq!(disc.msf_to_frames("1:2"), None, "Two pieces are not enough.");
	}

	#[test]
	fn t_split_on_slash() {
		assert_eq!(split_on_slash("asasas / fdfdf"), (Some("asasas"), "fdfdf"));
		assert_eq!(split_on_slash("asasas /"), (None, "asasas /"));
		assert_eq!(split_on_slash("solo"), (None, "solo"));
	}

	#[test]
	fn t_apply_cddb() {
		let mut disc = test_disc();
		let mut meta = BTreeMap::new();
		meta.insert("DTITLE".to_owned(), "Some Band / Some Album".to_owned());
		meta.insert("TTITLE0".to_owned(), "Opener".to_owned());
		meta.insert("TTITLE01".to_owned(), "Guest / Duet".to_owned());
		disc.apply_cddb(&meta);

		assert_eq!(disc.artist, "Some Band");
		assert_eq!(disc.title, "Some Album");
		assert_eq!(disc.tracks[0].title, "Opener");
		assert_eq!(disc.tracks[0].artist, "Some Band", "Disc artist should seed the tracks.");
		assert_eq!(disc.tracks[1].title, "Duet");
		assert_eq!(disc.tracks[1].artist, "Guest");
		assert_eq!(disc.tracks[2].title, UNKNOWN, "Unmapped tracks stay unknown.");
	}

	#[test]
	fn t_cue_sheet() {
		let mut disc = Disc::new();
		disc.set_artist(Some("Some Band"));
		disc.set_title(Some("Some Album"));
		let mut t1 = Track::new(1, 150, 7_500);
		t1.set_title(Some("Opener"));
		t1.set_artist(Some("Some Band"));
		let mut t2 = Track::new(2, 7_650, 1_000);
		t2.set_title(Some("Closer"));
		t2.set_artist(Some("Some Band"));
		disc.tracks.push(t1);
		disc.tracks.push(t2);

		assert_eq!(
			disc.cue_sheet(),
			"PERFORMER \"Some Band\"
TITLE \"Some Album\"
FILE \"disc.flac\" WAVE
  TRACK 01 AUDIO
    TITLE \"Opener\"
    PERFORMER \"Some Band\"
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE \"Closer\"
    PERFORMER \"Some Band\"
    INDEX 01 01:40:00
",
		);
	}
}
