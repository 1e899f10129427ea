/*!
# Ripdisc: Pipeline

The capture → encode → tag → rename sequence, glued together from the
external tools. Everything is sequential and blocking. Each stage is
idempotent: outputs that already exist are skipped, and every encoder
writes to a temporary name that is only renamed into place on success, so
a half-written file is never observed under its final name.

A missing tool binary is fatal; a tool that runs but exits non-zero is
logged and the pipeline carries on best-effort.
*/

use crate::{
	COVER_FILE,
	DISC_CUE,
	DISC_FLAC,
	Disc,
	RipError,
};
use fyi_msg::Msg;
use std::{
	path::{
		Path,
		PathBuf,
	},
	process::Command,
};



/// # Capture Tool.
const CDPARANOIA: &str = "cdparanoia";

/// # FLAC Encoder/Decoder.
const FLAC: &str = "flac";

/// # FLAC Tagger.
const METAFLAC: &str = "metaflac";

/// # Resampler/Concatenator.
const SOX: &str = "sox";

/// # OGG Encoder.
const OGGENC: &str = "oggenc";

/// # MP3 Encoder.
const LAME: &str = "lame";

/// # MP3 Tagger.
const ID3TAG: &str = "id3tag";



#[derive(Debug, Clone)]
/// # Rip Options.
pub struct RipOptions {
	/// # Device Path.
	dev: String,

	/// # Working Directory.
	work_dir: PathBuf,

	/// # Run the Capture/FLAC Stages?
	capture: bool,

	/// # Run the Lossy Conversion Stages?
	convert: bool,
}

impl Default for RipOptions {
	fn default() -> Self {
		Self {
			dev: crate::DEVICE.to_owned(),
			work_dir: PathBuf::from("."),
			capture: true,
			convert: true,
		}
	}
}

impl RipOptions {
	#[must_use]
	/// # With Device Path.
	pub fn with_dev(mut self, dev: &str) -> Self {
		dev.clone_into(&mut self.dev);
		self
	}

	#[must_use]
	/// # With Working Directory.
	pub fn with_work_dir(mut self, dir: PathBuf) -> Self {
		self.work_dir = dir;
		self
	}

	#[must_use]
	/// # With/Without Capture.
	pub const fn with_capture(mut self, yes: bool) -> Self {
		self.capture = yes;
		self
	}

	#[must_use]
	/// # With/Without Conversion.
	pub const fn with_convert(mut self, yes: bool) -> Self {
		self.convert = yes;
		self
	}

	#[must_use]
	/// # Device Path.
	pub fn dev(&self) -> &str { &self.dev }

	#[must_use]
	/// # Working Directory.
	pub fn work_dir(&self) -> &Path { &self.work_dir }

	#[must_use]
	/// # Capture Stage Enabled?
	pub const fn capture(&self) -> bool { self.capture }

	#[must_use]
	/// # Conversion Stage Enabled?
	pub const fn convert(&self) -> bool { self.convert }
}



#[derive(Debug)]
/// # Pipeline Driver.
pub struct Ripper<'a> {
	/// # The Disc.
	disc: &'a Disc,

	/// # Options.
	opts: &'a RipOptions,
}

impl<'a> Ripper<'a> {
	#[must_use]
	/// # New.
	pub const fn new(disc: &'a Disc, opts: &'a RipOptions) -> Self {
		Self { disc, opts }
	}

	/// # Run the Whole Pipeline.
	///
	/// ## Errors
	///
	/// Bubbles up missing tools and unwritable outputs; per-file encoder
	/// hiccups are only logged.
	pub fn rip(&self) -> Result<(), RipError> {
		if self.opts.capture() {
			self.stage_capture()?;
			self.stage_flac()?;
			self.stage_image()?;
		}
		if self.opts.convert() {
			self.stage_ogg()?;
			self.stage_mp3()?;
		}
		Ok(())
	}

	/// # Write the Cue Sheet.
	///
	/// ## Errors
	///
	/// Returns [`RipError::Write`] if the sheet cannot be saved.
	pub fn write_cue(&self) -> Result<PathBuf, RipError> {
		let dst = self.opts.work_dir().join(DISC_CUE);
		write_atomic::write_file(&dst, self.disc.cue_sheet().as_bytes())
			.map_err(|_| RipError::Write(dst.to_string_lossy().into_owned()))?;
		Ok(dst)
	}

	/// # Stage One: Capture.
	///
	/// `cdparanoia -B` drops one `trackNN.cdda.wav` per track into the
	/// working directory. Skipped entirely if they're all already there.
	fn stage_capture(&self) -> Result<(), RipError> {
		let have = self.disc.tracks.iter()
			.filter(|t| self.opts.work_dir().join(wav_name(t.num)).is_file())
			.count();
		if have == self.disc.num_tracks() { return Ok(()); }

		Msg::info(format!("Capturing {} tracks from {}.", self.disc.num_tracks(), self.opts.dev())).eprint();
		let ok = run(
			CDPARANOIA,
			&["-B", "-d", self.opts.dev()],
			self.opts.work_dir(),
		)?;
		if ok { Ok(()) }
		// Unlike the encoders, a failed capture leaves nothing worth
		// continuing with.
		else { Err(RipError::NoDisc) }
	}

	/// # Stage Two: FLAC Per Track.
	///
	/// Fresh encodes get their tags on the way out; pre-existing files
	/// are retagged in place so a metadata lookup after the fact still
	/// lands.
	fn stage_flac(&self) -> Result<(), RipError> {
		for t in &self.disc.tracks {
			let src = self.opts.work_dir().join(wav_name(t.num));
			let dst = self.opts.work_dir().join(track_name(t.num, "flac"));

			if ! dst.is_file() {
				if ! src.is_file() {
					Msg::warning(format!("No capture for track #{}; skipping.", t.num)).eprint();
					continue;
				}
				let tmp = tmp_name(&dst);
				let ok = run(FLAC, &[
					"--best",
					"--totally-silent",
					"-f",
					"-o", &tmp.to_string_lossy(),
					&src.to_string_lossy(),
				], self.opts.work_dir())?;
				if ! commit(&tmp, &dst, ok)? { continue; }
			}

			// Tag it (and slip the cover art in, if we fetched any).
			let dst = dst.to_string_lossy().into_owned();
			let mut args: Vec<String> = vec![
				"--remove-all-tags".to_owned(),
				format!("--set-tag=ALBUM={}", self.disc.title),
				format!("--set-tag=ARTIST={}", t.artist),
				format!("--set-tag=TITLE={}", t.title),
				format!("--set-tag=TRACKNUMBER={}", t.num),
			];
			if self.opts.work_dir().join(COVER_FILE).is_file() {
				args.push(format!("--import-picture-from={COVER_FILE}"));
			}
			args.push(dst);
			let args: Vec<&str> = args.iter().map(String::as_str).collect();
			run(METAFLAC, &args, self.opts.work_dir())?;
		}
		Ok(())
	}

	/// # Stage Three: Whole-Disc Image.
	///
	/// `sox` concatenates the track captures into one stream, which gets
	/// FLAC-encoded as `disc.flac` — the file the cue sheet describes.
	fn stage_image(&self) -> Result<(), RipError> {
		let dst = self.opts.work_dir().join(DISC_FLAC);
		if dst.is_file() || self.disc.tracks.is_empty() { return Ok(()); }

		let wavs: Vec<PathBuf> = self.disc.tracks.iter()
			.map(|t| self.opts.work_dir().join(wav_name(t.num)))
			.collect();
		if wavs.iter().any(|w| ! w.is_file()) {
			Msg::warning("Captures are incomplete; skipping the disc image.").eprint();
			return Ok(());
		}

		let joined = self.opts.work_dir().join("disc.tmp.wav");
		let mut args: Vec<String> = wavs.iter()
			.map(|w| w.to_string_lossy().into_owned())
			.collect();
		args.push(joined.to_string_lossy().into_owned());
		let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
		let ok = run(SOX, &arg_refs, self.opts.work_dir())?;
		if ok {
			let tmp = tmp_name(&dst);
			let ok = run(FLAC, &[
				"--best",
				"--totally-silent",
				"-f",
				"-o", &tmp.to_string_lossy(),
				&joined.to_string_lossy(),
			], self.opts.work_dir())?;
			commit(&tmp, &dst, ok)?;
		}
		let _res = std::fs::remove_file(joined);
		Ok(())
	}

	/// # Stage Four: OGG Per Track.
	fn stage_ogg(&self) -> Result<(), RipError> {
		for t in &self.disc.tracks {
			let dst = self.opts.work_dir().join(track_name(t.num, "ogg"));
			if dst.is_file() { continue; }
			let Some(src) = self.ensure_wav(t.num)? else { continue; };

			let tmp = tmp_name(&dst);
			let num = t.num.to_string();
			let ok = run(OGGENC, &[
				"-q", "7",
				"--utf8",
				"-a", &t.artist,
				"-l", &self.disc.title,
				"-t", &t.title,
				"-N", &num,
				"-o", &tmp.to_string_lossy(),
				&src.to_string_lossy(),
			], self.opts.work_dir())?;
			commit(&tmp, &dst, ok)?;
		}
		Ok(())
	}

	/// # Stage Five: MP3 Per Track.
	///
	/// Fresh encodes carry their tags; pre-existing files are refreshed
	/// with `id3tag` instead.
	fn stage_mp3(&self) -> Result<(), RipError> {
		for t in &self.disc.tracks {
			let dst = self.opts.work_dir().join(track_name(t.num, "mp3"));
			let num = t.num.to_string();

			if dst.is_file() {
				run(ID3TAG, &[
					&format!("-s{}", t.title),
					&format!("-a{}", t.artist),
					&format!("-A{}", self.disc.title),
					&format!("-t{num}"),
					&dst.to_string_lossy(),
				], self.opts.work_dir())?;
				continue;
			}
			let Some(src) = self.ensure_wav(t.num)? else { continue; };

			let tmp = tmp_name(&dst);
			let ok = run(LAME, &[
				"-V", "5",
				"--tt", &t.title,
				"--ta", &t.artist,
				"--tl", &self.disc.title,
				"--tn", &num,
				&src.to_string_lossy(),
				&tmp.to_string_lossy(),
			], self.opts.work_dir())?;
			commit(&tmp, &dst, ok)?;
		}
		Ok(())
	}

	/// # Find (or Recreate) a Track's WAV.
	///
	/// Convert-only runs won't have the captures anymore; decode the FLAC
	/// back to WAV when that's all we have.
	fn ensure_wav(&self, num: u8) -> Result<Option<PathBuf>, RipError> {
		let wav = self.opts.work_dir().join(wav_name(num));
		if wav.is_file() { return Ok(Some(wav)); }

		let flac = self.opts.work_dir().join(track_name(num, "flac"));
		if ! flac.is_file() {
			Msg::warning(format!("Nothing to convert for track #{num}; skipping.")).eprint();
			return Ok(None);
		}

		let ok = run(FLAC, &[
			"-d",
			"--totally-silent",
			"-f",
			"-o", &wav.to_string_lossy(),
			&flac.to_string_lossy(),
		], self.opts.work_dir())?;
		Ok(if ok { Some(wav) } else { None })
	}
}



/// # Track File Name.
fn track_name(num: u8, ext: &str) -> String {
	format!("track{num:02}.{ext}")
}

/// # Capture File Name.
///
/// The naming `cdparanoia -B` uses for its per-track output.
fn wav_name(num: u8) -> String {
	format!("track{num:02}.cdda.wav")
}

/// # Temporary Sibling Name.
///
/// Same directory as the destination so the final rename is atomic.
fn tmp_name(dst: &Path) -> PathBuf {
	let mut os = dst.as_os_str().to_owned();
	os.push(".tmp");
	PathBuf::from(os)
}

/// # Rename Into Place.
///
/// Promote the temporary file if the encoder succeeded, clean it up
/// otherwise, and say whether the destination now exists.
fn commit(tmp: &Path, dst: &Path, ok: bool) -> Result<bool, RipError> {
	if ok {
		std::fs::rename(tmp, dst)
			.map_err(|_| RipError::Write(dst.to_string_lossy().into_owned()))?;
		Ok(true)
	}
	else {
		let _res = std::fs::remove_file(tmp);
		Ok(false)
	}
}

/// # Run a Tool.
///
/// Block until it exits. A missing binary is fatal; a non-zero exit is
/// logged and reported as `false` so callers can make their own call.
fn run(tool: &'static str, args: &[&str], cwd: &Path) -> Result<bool, RipError> {
	let status = Command::new(tool)
		.args(args)
		.current_dir(cwd)
		.status()
		.map_err(|e|
			if e.kind() == std::io::ErrorKind::NotFound { RipError::MissingTool(tool) }
			else { RipError::Write(cwd.to_string_lossy().into_owned()) }
		)?;
	if ! status.success() {
		Msg::warning(format!("{tool} exited with {status}.")).eprint();
	}
	Ok(status.success())
}



/// # Sanitize a Directory Name.
///
/// The disc title becomes the final directory name: shell- and
/// filesystem-hostile characters collapse to underscores, punctuation is
/// dropped, and runs of underscores fold together.
#[must_use]
pub fn sanitize_dir_name(title: &str) -> String {
	let mut out = String::with_capacity(title.len());
	for c in title.trim().chars() {
		if matches!(c, '!' | '?' | ';' | ',' | '.') { continue; }
		let c =
			if matches!(c, '\\' | '\'' | '"' | ' ' | '(' | ')' | '{' | '}' | '[' | ']' | '<' | '>' | '/') { '_' }
			else { c };
		if c != '_' || ! out.ends_with('_') { out.push(c); }
	}
	let out = out.trim_matches('_');
	if out.is_empty() { "-".to_owned() }
	else { out.to_owned() }
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_sanitize_dir_name() {
		assert_eq!(sanitize_dir_name("Some Album"), "Some_Album");
		assert_eq!(sanitize_dir_name("Who's Next?"), "Who_s_Next");
		assert_eq!(sanitize_dir_name("  (Untitled)  "), "Untitled");
		assert_eq!(sanitize_dir_name("a / b / c"), "a_b_c");
		assert_eq!(sanitize_dir_name("!!!"), "-");
	}

	#[test]
	fn t_names() {
		assert_eq!(wav_name(3), "track03.cdda.wav");
		assert_eq!(track_name(12, "ogg"), "track12.ogg");
		assert_eq!(tmp_name(Path::new("/x/track01.flac")), Path::new("/x/track01.flac.tmp"));
	}

	#[test]
	fn t_commit() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		let dst = dir.path().join("out.flac");
		let tmp = tmp_name(&dst);
		std::fs::write(&tmp, b"data").expect("Write failed.");

		assert_eq!(commit(&tmp, &dst, true), Ok(true));
		assert!(dst.is_file(), "The commit should have promoted the temp file.");
		assert!(! tmp.exists());

		// And the failure path tidies up after itself.
		std::fs::write(&tmp, b"junk").expect("Write failed.");
		assert_eq!(commit(&tmp, &dst, false), Ok(false));
		assert!(! tmp.exists(), "A failed commit should remove the temp file.");
	}
}
