/*!
# Ripdisc
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![expect(clippy::redundant_pub_crate, reason = "Unresolvable.")]



mod cli;

use dactyl::NiceElapsed;
use fyi_msg::Msg;
use ripdisc_core::{
	Cddb,
	Disc,
	FirstPicker,
	MusicBrainz,
	Picker,
	RipError,
	Ripper,
	find_flac_dirs,
	load_snapshot,
	read_disc,
	sanitize_dir_name,
	save_snapshot,
};
use std::{
	path::{
		Path,
		PathBuf,
	},
	process::ExitCode,
};
use utc2k::FmtUtc2k;



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() -> ExitCode {
	match main__() {
		Ok(()) => ExitCode::SUCCESS,
		Err(e @ (RipError::PrintHelp | RipError::PrintVersion)) => {
			println!("{e}");
			ExitCode::SUCCESS
		},
		Err(e) => {
			Msg::from(e).eprint();
			ExitCode::FAILURE
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn main__() -> Result<(), RipError> {
	let set = cli::parse()?;

	if set.discover {
		let dirs = find_flac_dirs(&set.dir);
		if dirs.is_empty() { return Err(RipError::Noop); }
		for dir in dirs {
			Msg::info(format!("Converting {}.", dir.display())).eprint();
			// One bad directory shouldn't sink the rest.
			if let Err(e) = rip_one(&set, dir) { Msg::from(e).eprint(); }
		}
		Ok(())
	}
	else { rip_one(&set, set.dir.clone()) }
}

/// # Process One Directory.
///
/// The full treatment: geometry, metadata, snapshot, cue sheet, cover art,
/// capture/conversion, and the final rename.
fn rip_one(set: &cli::Settings, dir: PathBuf) -> Result<(), RipError> {
	let opts = set.rip.clone().with_work_dir(dir.clone());

	// The geometry comes from the drive when we're capturing, from the
	// snapshot otherwise. An empty drive also falls back to the snapshot so
	// a finished rip can still be retagged.
	let mut disc =
		if opts.capture() {
			match read_disc(opts.dev()) {
				Ok(d) => d,
				Err(RipError::NoDisc) => {
					Msg::warning("No disc in the drive; trying the snapshot.").eprint();
					load_snapshot(&dir)?
				},
				Err(e) => return Err(e),
			}
		}
		else { load_snapshot(&dir)? };

	lookup(set, &mut disc)?;
	save_snapshot(&dir, &disc)?;

	// Summarize and offer a last chance to bail.
	eprintln!("{disc}");
	Msg::info(format!(
		"Playtime {}; probed {} UTC.",
		NiceElapsed::from(disc.playtime_secs()),
		FmtUtc2k::now(),
	)).eprint();
	if ! set.yes && ! Msg::plain("Continue with this disc?").eprompt_with_default(true) {
		return Ok(());
	}

	let ripper = Ripper::new(&disc, &opts);
	ripper.write_cue()?;
	if opts.capture() {
		let _res = MusicBrainz::from(set.mb.clone()).cover(&disc, &dir);
	}
	ripper.rip()?;

	if set.discover { Ok(()) }
	else { finish_rename(&dir, &disc, set.yes) }
}

/// # Resolve Metadata.
///
/// MusicBrainz first, CDDB as the fallback. Coming up empty everywhere is
/// only worth a warning; the rip proceeds with placeholder tags.
fn lookup(set: &cli::Settings, disc: &mut Disc) -> Result<(), RipError> {
	// A snapshot that already resolved against MusicBrainz needs no second
	// pass.
	if disc.mbid.is_some() { return Ok(()); }

	let picker: &dyn Picker = if set.yes { &FirstPicker } else { &StdinPicker };
	if MusicBrainz::from(set.mb.clone()).lookup(disc, picker)? { return Ok(()); }
	if Cddb::from(set.cddb.clone()).lookup(disc, picker)? { return Ok(()); }

	Msg::warning("No metadata found; the files will be tagged \"unknown\".").eprint();
	Ok(())
}

/// # Rename the Working Directory.
///
/// A finished rip takes the album title as its directory name. Skipped when
/// the title never resolved, the name is already right, or the target is
/// taken.
fn finish_rename(dir: &Path, disc: &Disc, yes: bool) -> Result<(), RipError> {
	if disc.title == ripdisc_core::UNKNOWN { return Ok(()); }
	let name = sanitize_dir_name(&disc.title);
	if dir.file_name().is_some_and(|n| n == name.as_str()) { return Ok(()); }

	let Ok(abs) = dir.canonicalize() else { return Ok(()); };
	let Some(parent) = abs.parent() else { return Ok(()); };
	let dst = parent.join(&name);
	if dst.exists() {
		Msg::warning(format!("{} already exists; leaving the directory alone.", dst.display())).eprint();
		return Ok(());
	}

	if yes || Msg::plain(format!("Rename the directory to {name}?")).eprompt_with_default(true) {
		std::fs::rename(&abs, &dst)
			.map_err(|_| RipError::Write(dst.to_string_lossy().into_owned()))?;
		Msg::success(format!("Saved to {}.", dst.display())).eprint();
	}

	Ok(())
}



#[derive(Debug, Clone, Copy)]
/// # Interactive Candidate Selection.
///
/// Numbered menu on STDERR, choice from STDIN. An empty line takes the
/// first candidate.
struct StdinPicker;

impl Picker for StdinPicker {
	fn pick(&self, labels: &[String]) -> Result<usize, RipError> {
		use std::io::BufRead;

		eprintln!("Multiple candidates:");
		for (i, label) in labels.iter().enumerate() {
			eprintln!("  {:>2}  {label}", i + 1);
		}

		let stdin = std::io::stdin();
		loop {
			Msg::plain("Which one? [1]").eprint();
			let mut buf = String::new();
			let read = stdin.lock().read_line(&mut buf)
				.map_err(|_| RipError::CliParse("selection"))?;
			if read == 0 { return Err(RipError::CliParse("selection")); }

			let buf = buf.trim();
			if buf.is_empty() { return Ok(0); }
			if let Ok(n) = buf.parse::<usize>() {
				if (1..=labels.len()).contains(&n) { return Ok(n - 1); }
			}
			Msg::warning("Pick a number from the list.").eprint();
		}
	}
}
