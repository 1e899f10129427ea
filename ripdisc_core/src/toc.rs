/*!
# Ripdisc: Disc Geometry

Two external tools describe the disc: `cd-discid` gives the track offsets
and total length in one terse line, and `cdparanoia -Q` prints a fuller
table of contents with per-track lengths and the pre-emphasis/copy flags.
The two are reconciled by track number, and their independent length
figures must agree — a disagreement means the drive and tooling are not
telling the same story, and nothing downstream can be trusted.
*/

use crate::{
	CD_LEADIN,
	Disc,
	RipError,
	Track,
};
use std::process::Command;



/// # Discovery Tool.
const CD_DISCID: &str = "cd-discid";

/// # TOC/Capture Tool.
const CDPARANOIA: &str = "cdparanoia";



/// # Probe the Disc.
///
/// Read the geometry from the device and return the assembled model,
/// metadata still unresolved.
///
/// ## Errors
///
/// [`RipError::MissingTool`] if a tool isn't installed (fatal),
/// [`RipError::NoDisc`] if the drive is empty (the caller may fall back to
/// a snapshot), and [`RipError::LengthMismatch`] if the two sources
/// disagree about the disc length.
pub fn read_disc(dev: &str) -> Result<Disc, RipError> {
	let raw = run_tool(CD_DISCID, &[dev])?;
	let (mut disc, secs) = parse_discid(&raw)?;

	let raw = run_tool(CDPARANOIA, &["-Q", "-d", dev])?;
	merge_toc(&mut disc, &raw)?;

	// The discovery tool's total is in whole seconds; it has to agree with
	// the frame-exact figure.
	if disc.total_secs() != secs {
		return Err(RipError::LengthMismatch(disc.disc_len(), secs * disc.fps));
	}

	Ok(disc)
}

/// # Run an External Tool.
///
/// Capture stdout and stderr together; `cdparanoia` prints its table of
/// contents to the latter.
fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, RipError> {
	let out = Command::new(tool)
		.args(args)
		.output()
		.map_err(|e|
			if e.kind() == std::io::ErrorKind::NotFound { RipError::MissingTool(tool) }
			else { RipError::NoDisc }
		)?;
	if ! out.status.success() { return Err(RipError::NoDisc); }

	let mut raw = String::from_utf8_lossy(&out.stdout).into_owned();
	raw.push('\n');
	raw.push_str(&String::from_utf8_lossy(&out.stderr));
	Ok(raw)
}

/// # Parse `cd-discid` Output.
///
/// One line of whitespace-separated tokens: disc ID, track count, one
/// offset per track (lead-in included), and the total length in seconds.
/// Track lengths are provisionally derived from consecutive offsets; the
/// last one is refined by the fuller table of contents.
fn parse_discid(raw: &str) -> Result<(Disc, u32), RipError> {
	let tokens: Vec<&str> = raw.split_whitespace().collect();
	let [_disc_id, count, rest @ ..] = tokens.as_slice() else {
		return Err(RipError::ToolOutput(CD_DISCID));
	};
	let count: usize = count.parse().map_err(|_| RipError::ToolOutput(CD_DISCID))?;
	// One offset per track plus the trailing seconds.
	if rest.len() != count + 1 {
		return Err(RipError::ToolOutput(CD_DISCID));
	}

	let mut offsets = Vec::with_capacity(count);
	for v in &rest[..count] {
		offsets.push(v.parse::<u32>().map_err(|_| RipError::ToolOutput(CD_DISCID))?);
	}
	let secs: u32 = rest[count].parse().map_err(|_| RipError::ToolOutput(CD_DISCID))?;

	let mut disc = Disc::new();
	for (i, offset) in offsets.iter().copied().enumerate() {
		let num = u8::try_from(i + 1).map_err(|_| RipError::ToolOutput(CD_DISCID))?;
		let end = offsets.get(i + 1).copied().unwrap_or(secs * disc.fps);
		disc.tracks.push(Track::new(num, offset, end.saturating_sub(offset)));
	}

	Ok((disc, secs))
}

/// # Merge the `cdparanoia -Q` Table of Contents.
///
/// Rows look like:
///
/// ```text
///   1.    21917 [04:52.17]        0 [00:00.00]    no   no  2
/// ```
///
/// i.e. track number, length, begin (both as sectors and `[mm:ss.ff]`
/// time), then the copy-permitted and pre-emphasis flags. Begin sectors
/// exclude the lead-in. Tracks only present in one source fill the gaps
/// in the other; the `TOTAL` row must corroborate the summed lengths.
fn merge_toc(disc: &mut Disc, raw: &str) -> Result<(), RipError> {
	let mut total = None;

	for line in raw.lines() {
		let fields: Vec<&str> = line.split_whitespace().collect();

		if let Some(num) = fields.first().and_then(|f| f.strip_suffix('.')) {
			let Ok(num) = num.parse::<u8>() else { continue; };
			let [_, length, length_msf, begin, begin_msf, _copy, pre, _ch] =
				fields.as_slice() else { return Err(RipError::ToolOutput(CDPARANOIA)); };

			// The sector and time columns say the same thing twice; make
			// sure they actually do.
			let length: u32 = length.parse().map_err(|_| RipError::ToolOutput(CDPARANOIA))?;
			let begin: u32 = begin.parse().map_err(|_| RipError::ToolOutput(CDPARANOIA))?;
			if parse_time(length_msf, disc.fps) != Some(length) ||
				parse_time(begin_msf, disc.fps) != Some(begin) {
				return Err(RipError::ToolOutput(CDPARANOIA));
			}

			let offset = begin + disc.lead_in;
			let pre = *pre == "yes";
			if let Some(track) = disc.track_mut(num) {
				track.length = length;
				track.offset = offset;
				track.pre_emphasis = pre;
			}
			else {
				// Present here but missed by the discovery tool.
				let mut track = Track::new(num, offset, length);
				track.pre_emphasis = pre;
				disc.tracks.push(track);
				disc.tracks.sort_by_key(|t| t.num);
			}
		}
		else if fields.first() == Some(&"TOTAL") {
			let length: u32 = fields.get(1)
				.and_then(|v| v.parse().ok())
				.ok_or(RipError::ToolOutput(CDPARANOIA))?;
			total.replace(length);
		}
	}

	// The table's own total is the second independent length source.
	let total = total.ok_or(RipError::ToolOutput(CDPARANOIA))?;
	if disc.disc_len() != total + CD_LEADIN {
		return Err(RipError::LengthMismatch(disc.disc_len(), total + CD_LEADIN));
	}

	Ok(())
}

/// # Parse a `[mm:ss.ff]` Time.
///
/// The fractional part is in frames, so the conversion to integer frames
/// is exact; no floats involved.
fn parse_time(src: &str, fps: u32) -> Option<u32> {
	let src = src.strip_prefix('[').unwrap_or(src);
	let src = src.strip_suffix(']').unwrap_or(src);
	let (mm, rest) = src.split_once(':')?;
	let (ss, ff) = rest.split_once('.')?;

	let mm: u32 = mm.parse().ok()?;
	let ss: u32 = ss.parse().ok()?;
	let ff: u32 = ff.parse().ok()?;
	if ss < 60 && ff < fps { Some((mm * 60 + ss) * fps + ff) }
	else { None }
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::FPS;

	/// # A Small but Plausible `-Q` Printout.
	const TOC: &str = "\
cdparanoia III release 10.2 (September 11, 2008)

Table of contents (audio tracks only):
track        length               begin        copy pre ch
===========================================================
  1.    15000 [03:20.00]        0 [00:00.00]    no   no  2
  2.     7500 [01:40.00]    15000 [03:20.00]    no  yes  2
TOTAL   22500 [05:00.00]    (audio only)
";

	#[test]
	fn t_parse_time() {
		assert_eq!(parse_time("[04:52.17]", FPS), Some(21_917));
		assert_eq!(parse_time("00:00.00", FPS), Some(0));
		assert_eq!(parse_time("[00:00.75]", FPS), None, "75 frames is not a valid remainder.");
		assert_eq!(parse_time("[00:61.00]", FPS), None);
		assert_eq!(parse_time("nonsense", FPS), None);
	}

	#[test]
	fn t_parse_discid() {
		let (disc, secs) = parse_discid("940a040b 2 150 15150 302\n")
			.expect("Discid parse failed.");
		assert_eq!(secs, 302);
		assert_eq!(disc.num_tracks(), 2);
		assert_eq!(disc.tracks[0].offset, 150);
		assert_eq!(disc.tracks[0].length, 15_000);
		assert_eq!(disc.tracks[1].offset, 15_150);

		assert!(
			parse_discid("940a040b 3 150 15150 302").is_err(),
			"A missing offset must fail.",
		);
	}

	#[test]
	fn t_merge_toc() {
		let (mut disc, _) = parse_discid("940a040b 2 150 15150 302")
			.expect("Discid parse failed.");
		merge_toc(&mut disc, TOC).expect("Merge failed.");

		assert_eq!(disc.tracks[0].length, 15_000);
		assert_eq!(disc.tracks[1].length, 7_500);
		assert!(! disc.tracks[0].pre_emphasis);
		assert!(disc.tracks[1].pre_emphasis, "Track two is flagged pre-emphasized.");
		assert_eq!(disc.disc_len(), 22_650);
		assert_eq!(disc.total_secs(), 302);
	}

	#[test]
	fn t_merge_toc_fills_missing() {
		// The discovery tool only saw track one.
		let (mut disc, _) = parse_discid("940a040b 1 150 302")
			.expect("Discid parse failed.");
		merge_toc(&mut disc, TOC).expect("Merge failed.");
		assert_eq!(disc.num_tracks(), 2, "The TOC row should backfill track two.");
		assert_eq!(disc.tracks[1].offset, 15_150);
	}

	#[test]
	fn t_merge_toc_mismatch() {
		let (mut disc, _) = parse_discid("940a040b 2 150 15150 302")
			.expect("Discid parse failed.");
		let bad = TOC.replace("TOTAL   22500", "TOTAL   21000");
		assert_eq!(
			merge_toc(&mut disc, &bad),
			Err(RipError::LengthMismatch(22_650, 21_150)),
			"Independent totals must agree.",
		);
	}
}
