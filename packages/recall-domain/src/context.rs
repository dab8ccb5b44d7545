/// Cut the context window around one matched message.
///
/// `messages` must already be in conversation order (ascending). The
/// window is the inclusive range `[i - radius, i + radius]` clamped to the
/// slice bounds, so windows near either end are simply shorter — no
/// padding, no wraparound. An unmatched id yields an empty window; callers
/// proceed without context rather than failing the request.
pub fn context_window<M>(messages: &[M], radius: usize, is_match: impl Fn(&M) -> bool) -> &[M] {
	let Some(position) = messages.iter().position(is_match) else {
		return &messages[..0];
	};
	let start = position.saturating_sub(radius);
	let end = (position + radius).min(messages.len() - 1);

	&messages[start..=end]
}
