/*!
# Ripdisc: Disc Fingerprints

Two independent fingerprints are derived from the disc geometry, one per
metadata service. Both are pure functions of the resolved [`Disc`] and must
match the values the services themselves compute, byte for byte.
*/

use base64::{
	Engine,
	engine::general_purpose::STANDARD,
};
use crate::Disc;
use sha1::{
	Digest,
	Sha1,
};



/// # Freedb-style Disc ID.
///
/// Eight lowercase hex characters: a digit-sum checksum of the track start
/// seconds (mod 255), four digits of playtime in seconds, two digits of
/// track count. This is the key used to disambiguate multi-match CDDB
/// responses, so it has to agree with what the server computed.
#[must_use]
pub fn freedb_id(disc: &Disc) -> String {
	let mut chksum: u32 = 0;
	for track in &disc.tracks {
		let mut start = track.offset.wrapping_div(crate::FPS);
		while start > 0 {
			chksum += start % 10;
			start = start.wrapping_div(10);
		}
	}
	chksum %= 255;

	format!(
		"{:02x}{:04x}{:02x}",
		chksum,
		disc.playtime_secs(),
		disc.tracks.len(),
	)
}

/// # MusicBrainz Disc ID.
///
/// SHA-1 over a fixed-width ASCII table — format version `01`, track
/// count, disc length in frames, then ninety-nine offset slots — encoded
/// as base64 with `/`, `+`, and `=` swapped for `_`, `.`, and `-`.
#[must_use]
pub fn musicbrainz_id(disc: &Disc) -> String {
	use std::fmt::Write;

	let mut raw = String::with_capacity(4 + 8 + 99 * 8);
	let _res = write!(&mut raw, "{:02X}", 1);
	let _res = write!(&mut raw, "{:02X}", disc.tracks.len());
	let _res = write!(&mut raw, "{:08X}", disc.disc_len());
	for track in &disc.tracks {
		let _res = write!(&mut raw, "{:08X}", track.offset);
	}
	for _ in disc.tracks.len()..99 {
		raw.push_str("00000000");
	}

	let mut chksum = Sha1::new();
	chksum.update(raw.as_bytes());
	let digest = chksum.finalize();

	mb_base64(&digest)
}

/// # MusicBrainz Base64 Variant.
///
/// Standard base64, except `/+=` become `_.-` so the result is safe in
/// URLs and file names.
fn mb_base64(data: &[u8]) -> String {
	STANDARD.encode(data)
		.chars()
		.map(|c| match c {
			'/' => '_',
			'+' => '.',
			'=' => '-',
			other => other,
		})
		.collect()
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::Track;

	/// # Disc From Raw Parts.
	///
	/// Build a disc whose offsets and total length are pinned exactly,
	/// track lengths being back-filled to make `disc_len()` come out
	/// right.
	fn disc_from_parts(offsets: &[u32], disc_len: u32) -> Disc {
		let mut disc = Disc::new();
		for (i, offset) in offsets.iter().copied().enumerate() {
			disc.tracks.push(Track::new(i as u8 + 1, offset, 0));
		}
		if let Some(last) = disc.tracks.last_mut() {
			last.length = disc_len - disc.lead_in;
		}
		assert_eq!(disc.disc_len(), disc_len, "Test fixture is broken.");
		disc
	}

	#[test]
	fn t_freedb_id() {
		// Playtime of 1000 seconds and no tracks at all.
		let disc = disc_from_parts(&[], 75_150);
		assert_eq!(freedb_id(&disc), "0003e800");

		// Same playtime, five tracks with digit-summable starts.
		let disc = disc_from_parts(&[801, 1802, 2803, 3804, 4805], 75_150);
		assert_eq!(freedb_id(&disc), "2003e805");

		// Offsets under a second contribute nothing to the checksum.
		let disc = disc_from_parts(&[6, 16, 26, 36, 46], 75_150);
		assert_eq!(freedb_id(&disc), "0003e805");
	}

	#[test]
	fn t_musicbrainz_id() {
		// The published reference value for this fourteen-track disc.
		let disc = disc_from_parts(
			&[
				0x96, 0xD33, 0x5423, 0xA578, 0xF903, 0x13F42, 0x14D7D,
				0x19409, 0x1D1A0, 0x1F9FF, 0x24014, 0x278B1, 0x28265, 0x2C6F2,
			],
			0x0003_09B1,
		);
		assert_eq!(musicbrainz_id(&disc), "AzDOLlCcF6n_xb9u_4JflT7xDK0-");
	}
}
