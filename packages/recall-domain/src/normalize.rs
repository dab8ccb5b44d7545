/// Collapse every run of embedded newlines to a single space.
///
/// Embedding endpoints score single-line input more reliably, so message
/// content is flattened before it is sent for embedding. Other whitespace
/// is left untouched; leading and trailing newline runs are dropped
/// instead of becoming stray spaces.
pub fn collapse_newlines(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut pending_break = false;

	for ch in text.chars() {
		if ch == '\n' || ch == '\r' {
			pending_break = true;

			continue;
		}
		if pending_break && !out.is_empty() {
			out.push(' ');
		}

		pending_break = false;

		out.push(ch);
	}

	out
}
