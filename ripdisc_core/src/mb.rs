/*!
# Ripdisc: MusicBrainz Client

The preferred metadata source. A disc-ID lookup lists candidate releases;
the chosen release is fetched with artist credits and recordings inlined,
and its media are matched against the locally measured track lengths
before anything is trusted. Cover art comes from the (separate) Cover Art
Archive, keyed by the same release ID.
*/

use crate::{
	Disc,
	http,
	Picker,
	RipError,
	select,
};
use fyi_msg::Msg;
use serde::Deserialize;
use std::path::{
	Path,
	PathBuf,
};



/// # Allowed Per-Track Length Drift (seconds).
const TRACK_DRIFT: u64 = 1;



#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// # Which Sleeve Image to Fetch.
pub enum CoverSide {
	/// # Front of the Sleeve.
	Front,

	#[default]
	/// # Back of the Sleeve.
	Back,
}

impl TryFrom<&str> for CoverSide {
	type Error = RipError;
	fn try_from(src: &str) -> Result<Self, Self::Error> {
		match src.trim().to_ascii_lowercase().as_str() {
			"front" => Ok(Self::Front),
			"back" => Ok(Self::Back),
			_ => Err(RipError::CliParse("--cover")),
		}
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Client Configuration.
pub struct MbConfig {
	/// # Web Service Root.
	pub server: String,

	/// # Cover Art Archive Root.
	pub cover_server: String,

	/// # Preferred Sleeve Side.
	pub cover: CoverSide,
}

impl Default for MbConfig {
	fn default() -> Self {
		Self {
			server: crate::MB_SERVER.to_owned(),
			cover_server: crate::COVER_SERVER.to_owned(),
			cover: CoverSide::default(),
		}
	}
}



#[derive(Debug, Deserialize)]
/// # `discid` Endpoint Response.
struct DiscIdResponse {
	/// # Echoed Disc ID.
	id: String,

	#[serde(default)]
	/// # Candidate Releases.
	releases: Vec<ReleaseStub>,
}

#[derive(Debug, Deserialize)]
/// # Candidate Release.
struct ReleaseStub {
	/// # Release MBID.
	id: String,

	/// # Release Title.
	title: String,
}

#[derive(Debug, Deserialize)]
/// # `release` Endpoint Response.
pub(crate) struct Release {
	/// # Release Title.
	title: String,

	#[serde(rename = "artist-credit", default)]
	/// # Credited Artists.
	artist_credit: Vec<Credit>,

	#[serde(default)]
	/// # Media (discs within the release).
	media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
/// # One Artist Credit.
struct Credit {
	/// # The Artist.
	artist: Artist,
}

#[derive(Debug, Deserialize)]
/// # Artist.
struct Artist {
	/// # Artist Name.
	name: String,
}

#[derive(Debug, Deserialize)]
/// # One Medium.
struct Media {
	#[serde(default)]
	/// # Its Tracks.
	tracks: Vec<MbTrack>,
}

#[derive(Debug, Deserialize)]
/// # One Track.
struct MbTrack {
	/// # Track Position (one-based).
	position: u8,

	/// # Track Title.
	title: String,

	#[serde(default)]
	/// # Length in Milliseconds.
	length: Option<u64>,

	#[serde(rename = "artist-credit", default)]
	/// # Track-level Artist Credits.
	artist_credit: Vec<Credit>,
}

#[derive(Debug, Deserialize)]
/// # Cover Art Archive Response.
struct CoverResponse {
	#[serde(default)]
	/// # Available Images.
	images: Vec<CoverImage>,
}

#[derive(Debug, Deserialize)]
/// # One Cover Image.
struct CoverImage {
	#[serde(default)]
	/// # Front-of-sleeve Flag.
	front: bool,

	#[serde(default)]
	/// # Back-of-sleeve Flag.
	back: bool,

	/// # Download URL.
	image: String,
}



#[derive(Debug, Clone, Default)]
/// # MusicBrainz Client.
pub struct MusicBrainz(MbConfig);

impl From<MbConfig> for MusicBrainz {
	#[inline]
	fn from(cfg: MbConfig) -> Self { Self(cfg) }
}

impl MusicBrainz {
	/// # Look Up and Merge Metadata.
	///
	/// `Ok(false)` means the lookup simply came up empty — nothing
	/// listed, an unmatchable release — and the caller falls back to
	/// CDDB.
	///
	/// ## Errors
	///
	/// Returns an error if the server echoes the wrong disc ID or if the
	/// candidate selection goes out of range.
	pub fn lookup(&self, disc: &mut Disc, picker: &dyn Picker) -> Result<bool, RipError> {
		let disc_id = crate::musicbrainz_id(disc);
		let url = format!("{}/discid/{disc_id}/?fmt=json", self.0.server);
		let Some(raw) = http::fetch(&url) else { return Ok(false); };

		let Ok(res) = serde_json::from_slice::<DiscIdResponse>(&raw) else {
			Msg::warning(format!("Unparseable discid response from {url}.")).eprint();
			return Ok(false);
		};
		// The echo is our only proof the server answered the right
		// question.
		if res.id != disc_id {
			return Err(RipError::DiscIdMismatch(disc_id, res.id));
		}

		let Some(stub) = select(
			res.releases,
			|r| r.title.clone(),
			picker,
		)? else {
			Msg::info(format!("MusicBrainz has nothing for {disc_id}.")).eprint();
			return Ok(false);
		};

		let url = format!(
			"{}/release/{}/?inc=artist-credits+recordings&fmt=json",
			self.0.server,
			stub.id,
		);
		let Some(raw) = http::fetch(&url) else { return Ok(false); };
		let Ok(release) = serde_json::from_slice::<Release>(&raw) else {
			Msg::warning(format!("Unparseable release response from {url}.")).eprint();
			return Ok(false);
		};

		fold_release(disc, &release, stub.id)
	}

	/// # Fetch Cover Art.
	///
	/// Download the configured sleeve image for the disc's resolved
	/// release into `dir`. Failure of any kind is logged and swallowed;
	/// art is a nicety, not a requirement.
	pub fn cover(&self, disc: &Disc, dir: &Path) -> Option<PathBuf> {
		let mbid = disc.mbid.as_deref()?;
		let url = format!("{}/release/{mbid}", self.0.cover_server);
		let raw = http::fetch(&url)?;
		let res: CoverResponse = serde_json::from_slice(&raw)
			.map_err(|_| Msg::warning(format!("Unparseable cover listing from {url}.")).eprint())
			.ok()?;

		let want_front = matches!(self.0.cover, CoverSide::Front);
		let img = res.images.iter().find(|i|
			if want_front { i.front } else { i.back }
		)?;

		let raw = http::fetch(&img.image)?;
		let dst = dir.join(crate::COVER_FILE);
		match write_atomic::write_file(&dst, &raw) {
			Ok(()) => Some(dst),
			Err(_) => {
				Msg::warning(format!("Unable to save {}.", dst.display())).eprint();
				None
			},
		}
	}
}



/// # Fold a Release Into the Disc, Softly.
///
/// An unmatchable release means this particular lookup missed, not that
/// the run should die: log it and report `Ok(false)` so the caller moves
/// on to the next metadata source. Anything else stays loud.
///
/// ## Errors
///
/// Passes through every [`apply_release`] error except
/// [`RipError::AmbiguousRelease`].
pub(crate) fn fold_release(disc: &mut Disc, release: &Release, mbid: String)
-> Result<bool, RipError> {
	match apply_release(disc, release, mbid) {
		Ok(()) => Ok(true),
		Err(RipError::AmbiguousRelease) => {
			Msg::warning("No release media matches the measured track lengths; ignoring it.").eprint();
			Ok(false)
		},
		Err(e) => Err(e),
	}
}

/// # Fold a Release Into the Disc.
///
/// Exactly one media group must both have the right track count and agree
/// with every measured track length to within a second.
///
/// ## Errors
///
/// Returns [`RipError::AmbiguousRelease`] when zero or several media
/// groups survive the length check.
pub(crate) fn apply_release(disc: &mut Disc, release: &Release, mbid: String)
-> Result<(), RipError> {
	let matches: Vec<&Media> = release.media.iter()
		.filter(|m| media_matches(m, disc))
		.collect();
	let [media] = matches.as_slice() else { return Err(RipError::AmbiguousRelease); };

	if release.artist_credit.len() > 1 {
		Msg::warning(format!(
			"Multiple credited artists; using {}.",
			release.artist_credit[0].artist.name,
		)).eprint();
	}
	let release_artist = release.artist_credit.first().map(|c| c.artist.name.as_str());

	disc.set_title(Some(&release.title));
	disc.set_artist(release_artist);
	for mt in &media.tracks {
		let Some(track) = disc.track_mut(mt.position) else { continue; };
		track.set_title(Some(&mt.title));
		let artist = mt.artist_credit.first()
			.map(|c| c.artist.name.as_str())
			.or(release_artist);
		track.set_artist(artist);
	}

	disc.mbid = Some(mbid);
	Ok(())
}

/// # Does This Medium Match the Disc?
///
/// Track counts must be equal and every track length — theirs in
/// milliseconds, ours in frames, both rounded to the nearest second —
/// must agree within one second.
fn media_matches(media: &Media, disc: &Disc) -> bool {
	if media.tracks.len() != disc.num_tracks() { return false; }

	media.tracks.iter().all(|mt| {
		let Some(track) = disc.track(mt.position) else { return false; };
		let Some(length) = mt.length else { return false; };
		let theirs = (length + 500).wrapping_div(1000);
		let ours = u64::from(track.length + disc.fps.wrapping_div(2))
			.wrapping_div(u64::from(disc.fps));
		theirs.abs_diff(ours) <= TRACK_DRIFT
	})
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::Track;

	/// # Two-Track Local Disc.
	///
	/// Track lengths of 15_000 and 7_500 frames: 200 and 100 seconds.
	fn test_disc() -> Disc {
		let mut disc = Disc::new();
		disc.tracks.push(Track::new(1, 150, 15_000));
		disc.tracks.push(Track::new(2, 15_150, 7_500));
		disc
	}

	/// # Release Fixture.
	fn test_release(len1_ms: u64, len2_ms: u64) -> Release {
		serde_json::from_value(serde_json::json!({
			"title": "Some Album",
			"artist-credit": [ { "artist": { "name": "Some Band" } } ],
			"media": [
				{
					"tracks": [
						{ "position": 1, "title": "Opener", "length": len1_ms },
						{ "position": 2, "title": "Closer", "length": len2_ms },
					],
				},
				{
					"tracks": [
						{ "position": 1, "title": "Bonus", "length": 1_000 },
					],
				},
			],
		})).expect("Fixture JSON failed to parse.")
	}

	#[test]
	fn t_apply_release() {
		let mut disc = test_disc();
		let release = test_release(200_400, 99_600);
		apply_release(&mut disc, &release, "some-mbid".to_owned())
			.expect("A single near-exact media should match.");

		assert_eq!(disc.title, "Some Album");
		assert_eq!(disc.artist, "Some Band");
		assert_eq!(disc.mbid.as_deref(), Some("some-mbid"));
		assert_eq!(disc.tracks[0].title, "Opener");
		assert_eq!(disc.tracks[0].artist, "Some Band");
		assert_eq!(disc.tracks[1].title, "Closer");
	}

	#[test]
	fn t_apply_release_drift() {
		// Two seconds off on track two: nothing matches.
		let mut disc = test_disc();
		let release = test_release(200_000, 102_000);
		assert_eq!(
			apply_release(&mut disc, &release, "some-mbid".to_owned()),
			Err(RipError::AmbiguousRelease),
		);
		assert_eq!(disc.mbid, None, "A failed match must not resolve the disc.");
	}

	#[test]
	fn t_drift_contained() {
		// The ambiguous case stays inside this client: the lookup reports
		// a plain miss, the disc is untouched, and the next metadata
		// source still gets its turn.
		let mut disc = test_disc();
		let release = test_release(200_000, 102_000);
		assert_eq!(
			fold_release(&mut disc, &release, "some-mbid".to_owned()),
			Ok(false),
		);
		assert_eq!(disc.mbid, None);
		assert_eq!(disc.title, crate::UNKNOWN, "A missed lookup must leave the disc untouched.");
		assert_eq!(disc.tracks[0].title, crate::UNKNOWN);
	}

	#[test]
	fn t_discid_parse() {
		let raw = br#"{
			"id": "AzDOLlCcF6n_xb9u_4JflT7xDK0-",
			"releases": [
				{ "id": "r1", "title": "First Pressing" },
				{ "id": "r2", "title": "Remaster" }
			]
		}"#;
		let res: DiscIdResponse = serde_json::from_slice(raw).expect("Parse failed.");
		assert_eq!(res.id, "AzDOLlCcF6n_xb9u_4JflT7xDK0-");
		assert_eq!(res.releases.len(), 2);
		assert_eq!(res.releases[1].title, "Remaster");
	}

	#[test]
	fn t_cover_side() {
		assert_eq!(CoverSide::try_from("front"), Ok(CoverSide::Front));
		assert_eq!(CoverSide::try_from(" Back "), Ok(CoverSide::Back));
		assert!(CoverSide::try_from("sideways").is_err());
	}
}
