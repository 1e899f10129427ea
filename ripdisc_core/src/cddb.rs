/*!
# Ripdisc: CDDB Client

A client for the line-oriented freedb/CDDB protocol, tunneled over HTTP
GET. The dance is QUERY → SELECT → READ: a query keyed by the freedb disc
ID returns zero or more candidate discs, one gets chosen, and a follow-up
read returns the actual `name=value` metadata.
*/

use crate::{
	Disc,
	disc::split_on_slash,
	http,
	Picker,
	RipError,
	select,
};
use fyi_msg::Msg;
use std::{
	collections::BTreeMap,
	fmt,
};



#[derive(Debug, Clone, Eq, PartialEq)]
/// # CDDB Hello Identification.
///
/// Every request carries a `hello` parameter identifying the caller. This
/// is computed once at startup from the environment and passed down —
/// never memoized globally — so tests don't have to reset shared state.
pub struct Hello {
	/// # User Name.
	user: String,

	/// # Host Name.
	host: String,

	/// # Client Name.
	client: String,

	/// # Client Version.
	version: String,
}

impl Hello {
	#[must_use]
	/// # From the Environment.
	///
	/// `EMAIL` (split on `@`) wins, then `USER`/`HOSTNAME`, then
	/// placeholders.
	pub fn from_env() -> Self {
		let email = std::env::var("EMAIL").ok();
		let (user, host) = email.as_deref()
			.and_then(|e| e.split_once('@'))
			.map_or((None, None), |(u, h)| (Some(u.to_owned()), Some(h.to_owned())));

		Self {
			user: user
				.or_else(|| std::env::var("USER").ok())
				.unwrap_or_else(|| "user".to_owned()),
			host: host
				.or_else(|| std::env::var("HOSTNAME").ok())
				.unwrap_or_else(|| "host".to_owned()),
			client: env!("CARGO_PKG_NAME").to_owned(),
			version: env!("CARGO_PKG_VERSION").to_owned(),
		}
	}

	#[cfg(test)]
	/// # Fixed Value (Tests).
	fn fixed(user: &str, host: &str) -> Self {
		Self {
			user: user.to_owned(),
			host: host.to_owned(),
			client: "client".to_owned(),
			version: "1.0".to_owned(),
		}
	}
}

impl fmt::Display for Hello {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"hello={}+{}+{}+{}",
			self.user, self.host, self.client, self.version,
		)
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Client Configuration.
pub struct CddbConfig {
	/// # Server URL.
	pub server: String,

	/// # Hello Identification.
	pub hello: Hello,

	/// # Protocol Level.
	pub proto: u8,
}

impl Default for CddbConfig {
	fn default() -> Self {
		Self {
			server: crate::CDDB_SERVER.to_owned(),
			hello: Hello::from_env(),
			proto: crate::CDDB_PROTO,
		}
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Candidate Disc.
///
/// One entry from a query response.
pub struct CddbEntry {
	/// # Genre Category.
	pub category: String,

	/// # Server Disc ID.
	pub disc_id: String,

	/// # Artist (if the title line carried one).
	pub artist: Option<String>,

	/// # Title.
	pub title: String,
}

impl CddbEntry {
	/// # From a "category disc-id artist / title" Line.
	fn from_line(category: &str, disc_id: &str, name: &str) -> Self {
		let (artist, title) = split_on_slash(name);
		Self {
			category: category.to_owned(),
			disc_id: disc_id.to_owned(),
			artist: artist.map(str::to_owned),
			title: title.to_owned(),
		}
	}

	#[must_use]
	/// # Display Label.
	pub fn name(&self) -> String {
		self.artist.as_deref().map_or_else(
			|| self.title.clone(),
			|artist| format!("{artist} / {}", self.title),
		)
	}
}



#[derive(Debug, Clone, Default)]
/// # CDDB Client.
pub struct Cddb(CddbConfig);

impl From<CddbConfig> for Cddb {
	#[inline]
	fn from(cfg: CddbConfig) -> Self { Self(cfg) }
}

impl Cddb {
	/// # Look Up and Merge Metadata.
	///
	/// Query the server for the disc, pick a candidate, read its entry,
	/// and fold the result into `disc`. `Ok(false)` means the metadata is
	/// simply unavailable — network trouble, no match — and the caller
	/// should carry on with defaults.
	///
	/// ## Errors
	///
	/// Returns an error for data-integrity contradictions (the server
	/// answering for a different disc) or a bad candidate selection;
	/// neither should be papered over.
	pub fn lookup(&self, disc: &mut Disc, picker: &dyn Picker) -> Result<bool, RipError> {
		let disc_id = crate::freedb_id(disc);
		let offsets: Vec<u32> = disc.tracks.iter().map(|t| t.offset).collect();
		let cmd = query_cmd(&disc_id, &offsets, disc.total_secs());

		let Some(lines) = self.fetch(&cmd) else { return Ok(false); };
		let candidates = parse_query(&lines, &disc_id)?;
		let Some(entry) = select(candidates, CddbEntry::name, picker)? else {
			Msg::info(format!("CDDB has nothing for {disc_id}.")).eprint();
			return Ok(false);
		};

		let Some(lines) = self.fetch(&read_cmd(&entry.category, &entry.disc_id)) else {
			return Ok(false);
		};
		let Some(metadata) = parse_read(&lines) else { return Ok(false); };

		disc.set_artist(entry.artist.as_deref());
		disc.set_title(Some(&entry.title));
		disc.apply_cddb(&metadata);
		Ok(true)
	}

	/// # Perform One Protocol Command.
	///
	/// Build the full GET URL — command, hello, proto — and return the
	/// decoded response lines, or `None` if the server is unreachable.
	fn fetch(&self, cmd: &str) -> Option<Vec<String>> {
		let url = format!(
			"{}?{cmd}&{}&proto={}",
			self.0.server,
			self.0.hello,
			self.0.proto,
		);
		http::fetch(&url).map(|raw| http::decode_lines(&raw))
	}
}



/// # Query Command String.
///
/// `cmd=cddb+query+<id>+<count>+<offsets…>+<seconds>`, with the fields
/// percent-encoded the way `quote_plus` would (spaces become `+`).
pub(crate) fn query_cmd(disc_id: &str, offsets: &[u32], total_secs: u32) -> String {
	let mut parts: Vec<String> = Vec::with_capacity(offsets.len() + 2);
	parts.push(disc_id.to_owned());
	parts.push(offsets.len().to_string());
	for offset in offsets { parts.push(offset.to_string()); }
	parts.push(total_secs.to_string());

	let encoded: Vec<String> = parts.iter()
		.map(|p| urlencoding::encode(p).into_owned())
		.collect();
	format!("cmd=cddb+query+{}", encoded.join("+"))
}

/// # Read Command String.
pub(crate) fn read_cmd(category: &str, disc_id: &str) -> String {
	format!("cmd=cddb+read+{category}+{disc_id}")
}

/// # Parse a Query Response.
///
/// Status 200 is a single exact match; 210/211 list candidates down to a
/// lone `.`, which get filtered against the locally computed disc ID.
/// Anything else is a protocol error: logged, no candidates.
///
/// ## Errors
///
/// A 200 match for a *different* disc ID contradicts the fingerprint and
/// earns a typed error.
pub(crate) fn parse_query(lines: &[String], local_id: &str)
-> Result<Vec<CddbEntry>, RipError> {
	let Some((header, rest)) = lines.split_first() else { return Ok(Vec::new()); };
	let mut fields = header.splitn(4, ' ');
	let status = fields.next().unwrap_or("");

	match status {
		"200" => {
			let category = fields.next().unwrap_or("");
			let disc_id = fields.next().unwrap_or("");
			let name = fields.next().unwrap_or("");
			if disc_id == local_id {
				Ok(vec![CddbEntry::from_line(category, disc_id, name)])
			}
			else {
				Err(RipError::DiscIdMismatch(local_id.to_owned(), disc_id.to_owned()))
			}
		},
		"210" | "211" => {
			let mut out = Vec::new();
			for line in rest {
				if line == "." { break; }
				let mut fields = line.splitn(3, ' ');
				let category = fields.next().unwrap_or("");
				let disc_id = fields.next().unwrap_or("");
				let name = fields.next().unwrap_or("").trim();
				if disc_id == local_id {
					out.push(CddbEntry::from_line(category, disc_id, name));
				}
			}
			Ok(out)
		},
		other => {
			Msg::warning(format!("CDDB query answered {other}; expected 200/210/211.")).eprint();
			Ok(Vec::new())
		},
	}
}

/// # Parse a Read Response.
///
/// Status 210 (or 417: access denied, but the body still parses) followed
/// by `name=value` lines. Comments and the terminal `.` are skipped,
/// escapes are decoded, and empty values are dropped.
pub(crate) fn parse_read(lines: &[String]) -> Option<BTreeMap<String, String>> {
	let (header, rest) = lines.split_first()?;
	let status = header.split(' ').next().unwrap_or("");
	if status != "210" && status != "417" {
		Msg::warning(format!("CDDB read answered {status}; expected 210/417.")).eprint();
		return None;
	}
	if status == "417" {
		// The mirrors send this for rate-limited callers; the payload is
		// usually intact anyway.
		Msg::warning("CDDB read answered 417 (access denied).").eprint();
	}

	let mut out = BTreeMap::new();
	for line in rest {
		if line == "." { break; }
		if line.starts_with('#') { continue; }
		let Some((name, value)) = line.split_once('=') else { continue; };
		let name = name.trim();
		let value = unescape(value.trim());
		if ! name.is_empty() && ! value.is_empty() {
			out.insert(name.to_owned(), value);
		}
	}
	Some(out)
}

/// # Decode Protocol Escapes.
///
/// The protocol escapes tabs, newlines, and backslashes as `\t`, `\n`,
/// and `\\`.
fn unescape(src: &str) -> String {
	let mut out = String::with_capacity(src.len());
	let mut chars = src.chars();
	while let Some(c) = chars.next() {
		if c == '\\' {
			match chars.next() {
				Some('t') => out.push('\t'),
				Some('n') => out.push('\n'),
				Some('\\') => out.push('\\'),
				Some(other) => { out.push('\\'); out.push(other); },
				None => out.push('\\'),
			}
		}
		else { out.push(c); }
	}
	out
}



#[cfg(test)]
mod tests {
	use super::*;

	/// # Owned Lines.
	fn lines(src: &[&str]) -> Vec<String> {
		src.iter().map(|&s| s.to_owned()).collect()
	}

	#[test]
	fn t_hello() {
		let hello = Hello::fixed("bob", "localhost");
		assert_eq!(hello.to_string(), "hello=bob+localhost+client+1.0");
	}

	#[test]
	fn t_query_cmd() {
		assert_eq!(
			query_cmd("id", &[6, 16, 26, 36, 46], 9999),
			"cmd=cddb+query+id+5+6+16+26+36+46+9999",
		);
	}

	#[test]
	fn t_read_cmd() {
		assert_eq!(read_cmd("pop", "0xde4"), "cmd=cddb+read+pop+0xde4");
	}

	#[test]
	fn t_parse_query_exact() {
		let res = parse_query(
			&lines(&["200 category disc-id artist / title"]),
			"disc-id",
		).expect("Exact match failed.");
		assert_eq!(res.len(), 1);
		assert_eq!(res[0].category, "category");
		assert_eq!(res[0].disc_id, "disc-id");
		assert_eq!(res[0].artist.as_deref(), Some("artist"));
		assert_eq!(res[0].title, "title");
		assert_eq!(res[0].name(), "artist / title");
	}

	#[test]
	fn t_parse_query_mismatch() {
		assert_eq!(
			parse_query(&lines(&["200 category other-id artist / title"]), "disc-id"),
			Err(RipError::DiscIdMismatch("disc-id".to_owned(), "other-id".to_owned())),
			"A 200 for a different disc must be loud.",
		);
	}

	#[test]
	fn t_parse_query_multi() {
		let res = parse_query(
			&lines(&[
				"210",
				"category1 disc-id1  artist1 / title1",
				"category2 disc-id  title2",
				"category3 disc-id3 title3",
				".",
				"category4 disc-id trailing-garbage",
			]),
			"disc-id",
		).expect("Multi match failed.");
		// Only the matching entry survives, and the dot ends the list.
		assert_eq!(res.len(), 1);
		assert_eq!(res[0].category, "category2");
		assert_eq!(res[0].artist, None);
		assert_eq!(res[0].title, "title2");
		assert_eq!(res[0].name(), "title2");
	}

	#[test]
	fn t_parse_query_error_status() {
		let res = parse_query(&lines(&["500 whoops"]), "disc-id")
			.expect("Protocol errors should not panic.");
		assert!(res.is_empty(), "An error status yields no candidates.");
	}

	#[test]
	fn t_parse_read() {
		let res = parse_read(&lines(&[
			"210",
			"# Comment 1",
			"",
			"DTITLE=Some Band / Some Album",
			"TTITLE0=One\\tTwo\\nThree\\\\Four",
			"EXTD=",
			".",
			"ignored=after-dot",
		])).expect("Read parse failed.");

		assert_eq!(res.len(), 2, "Empty values and post-dot lines are dropped.");
		assert_eq!(res["DTITLE"], "Some Band / Some Album");
		assert_eq!(res["TTITLE0"], "One\tTwo\nThree\\Four");
	}

	#[test]
	fn t_parse_read_denied() {
		let res = parse_read(&lines(&["417 access denied", "name=value", "."]))
			.expect("A 417 body should still parse.");
		assert_eq!(res["name"], "value");

		assert!(parse_read(&lines(&["402 huh"])).is_none());
	}
}
