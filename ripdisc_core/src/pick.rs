/*!
# Ripdisc: Candidate Selection

Both metadata services can answer with several plausible discs. The
zero/one/many policy is shared — nothing to pick, auto-pick, ask — and the
asking itself is a boundary concern, pushed behind the [`Picker`] trait so
the library never blocks on stdin.
*/

use crate::RipError;



/// # Candidate Picker.
///
/// Given display labels for every candidate, return the index of the one
/// to use. The binary implements this with an interactive numeric prompt;
/// tests and non-interactive callers use [`FirstPicker`].
pub trait Picker {
	/// # Pick a Candidate.
	///
	/// ## Errors
	///
	/// Implementations should return [`RipError::Candidate`] for an
	/// out-of-range selection rather than silently clamping it.
	fn pick(&self, labels: &[String]) -> Result<usize, RipError>;
}

#[derive(Debug, Clone, Copy, Default)]
/// # First-Entry Picker.
///
/// Always chooses index zero, matching the interactive prompt's default.
pub struct FirstPicker;

impl Picker for FirstPicker {
	#[inline]
	fn pick(&self, _labels: &[String]) -> Result<usize, RipError> { Ok(0) }
}

/// # Apply the Selection Policy.
///
/// No candidates means no result; a single candidate selects itself; more
/// than one goes to the picker.
///
/// ## Errors
///
/// Returns [`RipError::Candidate`] if the picker's index doesn't exist.
pub(crate) fn select<T>(
	mut candidates: Vec<T>,
	label: impl Fn(&T) -> String,
	picker: &dyn Picker,
) -> Result<Option<T>, RipError> {
	match candidates.len() {
		0 => Ok(None),
		1 => Ok(candidates.pop()),
		len => {
			let labels: Vec<String> = candidates.iter().map(label).collect();
			let idx = picker.pick(&labels)?;
			if idx < len { Ok(Some(candidates.swap_remove(idx))) }
			else { Err(RipError::Candidate(idx)) }
		},
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	/// # Fixed-Index Picker.
	struct Nth(usize);

	impl Picker for Nth {
		fn pick(&self, _labels: &[String]) -> Result<usize, RipError> { Ok(self.0) }
	}

	#[test]
	fn t_select() {
		let cands = vec!["d1", "d2", "d3"];
		assert_eq!(
			select(cands.clone(), ToString::to_string, &Nth(1)),
			Ok(Some("d2")),
			"Index one should yield the second candidate.",
		);
		assert_eq!(
			select(cands, ToString::to_string, &Nth(3)),
			Err(RipError::Candidate(3)),
			"Out-of-range selections must be loud.",
		);
	}

	#[test]
	fn t_select_trivial() {
		assert_eq!(select(Vec::<&str>::new(), ToString::to_string, &FirstPicker), Ok(None));
		assert_eq!(select(vec!["only"], ToString::to_string, &Nth(9)), Ok(Some("only")), "A single candidate skips the picker.");
	}
}
