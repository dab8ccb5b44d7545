const AVG_CHARS_PER_TOKEN: usize = 4;

/// Informational token estimate; not a tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
	let chars = text.chars().count().max(1);

	(chars / AVG_CHARS_PER_TOKEN).max(1)
}
