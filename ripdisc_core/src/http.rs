/*!
# Ripdisc: HTTP Plumbing

Both metadata clients go through here: a single shared agent, a retry
policy for MusicBrainz's habit of answering 503 while under load, and the
Latin-1 fallback the CDDB protocol requires.

Failures are never fatal at this layer. A request that cannot be completed
within the retry budget is logged and reported as `None`; the pipeline
carries on with "unknown" metadata.
*/

use fyi_msg::Msg;
use std::{
	io::Read,
	sync::OnceLock,
	time::Duration,
};
use ureq::{
	Agent,
	AgentBuilder,
};



/// # Connection Agent.
static AGENT: OnceLock<Agent> = OnceLock::new();

/// # Retry Budget.
const MAX_TRIES: u32 = 5;

/// # Base Retry Delay.
pub(crate) const RETRY_DELAY: Duration = Duration::from_secs(3);

/// # Per-Attempt Retry Delay Increment.
const RETRY_STEP: Duration = Duration::from_millis(500);

/// # Response Size Cap (bytes).
///
/// Cover art images run a few MiB; everything else is tiny.
const MAX_BODY: u64 = 33_554_432;



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Fetch Failure.
pub(crate) enum FetchError {
	/// # Non-success HTTP status.
	Status(u16),

	/// # Connection/URL-level failure.
	Transport(String),
}

/// # Connection Agent.
///
/// Storing the agent statically saves a little bit of overhead on reuse.
fn agent() -> &'static Agent {
	AGENT.get_or_init(||
		AgentBuilder::new()
			.timeout(Duration::from_secs(15))
			.user_agent(concat!(
				"ripdisc/",
				env!("CARGO_PKG_VERSION"),
				" (https://github.com/hs9906/ripdisc)",
			))
			.max_idle_connections(0)
			.build()
	)
}

/// # One GET Attempt.
fn fetch_once(url: &str) -> Result<Vec<u8>, FetchError> {
	match agent().get(url).call() {
		Ok(res) => {
			let mut out = Vec::new();
			res.into_reader()
				.take(MAX_BODY)
				.read_to_end(&mut out)
				.map_err(|e| FetchError::Transport(e.to_string()))?;
			Ok(out)
		},
		Err(ureq::Error::Status(code, _)) => Err(FetchError::Status(code)),
		Err(e) => Err(FetchError::Transport(e.to_string())),
	}
}

/// # GET With 503 Retries.
///
/// Fetch `url`, retrying up to five times on HTTP 503 with an increasing
/// delay. Anything else — other statuses, connection errors, a malformed
/// URL — fails straight away. All failure paths log the URL and reason and
/// return `None`.
pub(crate) fn fetch(url: &str) -> Option<Vec<u8>> {
	with_backoff(RETRY_DELAY, || fetch_once(url))
		.map_err(|e| {
			let reason = match e {
				FetchError::Status(code) => format!("status {code}"),
				FetchError::Transport(s) => s,
			};
			Msg::warning(format!("GET {url} failed ({reason}).")).eprint();
		})
		.ok()
}

/// # Retry Loop.
///
/// Run `call` until it succeeds, fails with something other than a 503, or
/// the budget runs out. The delay before attempt `n` (zero-based) is
/// `base + n * 500ms`; tests pass a zero base to stay fast.
pub(crate) fn with_backoff<T>(
	base: Duration,
	mut call: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
	let mut last = FetchError::Status(503);
	for attempt in 0..MAX_TRIES {
		match call() {
			Ok(out) => return Ok(out),
			Err(e @ FetchError::Status(503)) => {
				last = e;
				if attempt + 1 < MAX_TRIES {
					std::thread::sleep(base + RETRY_STEP * attempt);
				}
			},
			Err(e) => return Err(e),
		}
	}
	Err(last)
}

/// # Decode Response Lines.
///
/// CDDB responses are nominally UTF-8, but old entries are littered with
/// Latin-1. Decode line by line, falling back per line, and trim the
/// protocol's trailing whitespace.
pub(crate) fn decode_lines(raw: &[u8]) -> Vec<String> {
	raw.split(|&b| b == b'\n')
		.map(|line| {
			let line = std::str::from_utf8(line).map_or_else(
				|_| line.iter().map(|&b| char::from(b)).collect(),
				str::to_owned,
			);
			line.trim().to_owned()
		})
		.collect()
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_backoff_recovers() {
		// Three 503s, then an answer.
		let mut calls = 0_u32;
		let res = with_backoff(Duration::ZERO, || {
			calls += 1;
			if calls <= 3 { Err(FetchError::Status(503)) }
			else { Ok("parsed") }
		});
		assert_eq!(res, Ok("parsed"));
		assert_eq!(calls, 4, "Success should stop the retries.");
	}

	#[test]
	fn t_backoff_exhausts() {
		// Permanently overloaded: the budget runs out, no panic.
		let mut calls = 0_u32;
		let res: Result<(), FetchError> = with_backoff(Duration::ZERO, || {
			calls += 1;
			Err(FetchError::Status(503))
		});
		assert_eq!(res, Err(FetchError::Status(503)));
		assert_eq!(calls, 5, "Exactly five attempts are allowed.");
	}

	#[test]
	fn t_backoff_hard_failure() {
		// A 404 is not worth retrying.
		let mut calls = 0_u32;
		let res: Result<(), FetchError> = with_backoff(Duration::ZERO, || {
			calls += 1;
			Err(FetchError::Status(404))
		});
		assert_eq!(res, Err(FetchError::Status(404)));
		assert_eq!(calls, 1);
	}

	#[test]
	fn t_decode_lines() {
		// Note the non-UTF-8 byte in the first comment.
		let raw = b"210\r\n# Comment 1 \xc3\r\nname=value\r\n.";
		assert_eq!(
			decode_lines(raw),
			vec![
				"210".to_owned(),
				"# Comment 1 \u{c3}".to_owned(),
				"name=value".to_owned(),
				".".to_owned(),
			],
		);
	}
}
