//! Deterministic rendering of signed parameters.

// self
use crate::params::Params;

/// Renders `params` as sorted `key=value` lines joined by `\n`.
///
/// Null-valued keys are dropped, keys are sorted byte-wise and each key's values are sorted
/// byte-wise, so the output depends only on the multiset of pairs. Nothing is URL-encoded; the
/// result is signing input only.
pub fn canonicalize(params: &Params) -> String {
	let mut entries = params
		.without_nulls()
		.map(|(key, values)| {
			let mut values = values.iter().map(String::as_str).collect::<Vec<_>>();

			values.sort_unstable();

			(key, values)
		})
		.collect::<Vec<_>>();

	entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

	let mut buf = String::new();

	for (key, values) in entries {
		for value in values {
			if !buf.is_empty() {
				buf.push('\n');
			}

			buf.push_str(key);
			buf.push('=');
			buf.push_str(value);
		}
	}

	buf
}
