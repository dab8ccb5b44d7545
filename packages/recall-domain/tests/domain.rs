use recall_domain::{
	context::context_window,
	normalize::collapse_newlines,
	role::Role,
	similarity::cosine_similarity,
	tokens::estimate_tokens,
};

fn numbered(n: usize) -> Vec<usize> {
	(0..n).collect()
}

#[test]
fn window_is_centered_on_interior_matches() {
	let messages = numbered(10);
	let window = context_window(&messages, 2, |m| *m == 5);

	assert_eq!(window, &[3, 4, 5, 6, 7]);
}

#[test]
fn window_is_clamped_at_the_start() {
	let messages = numbered(10);
	let window = context_window(&messages, 2, |m| *m == 0);

	assert_eq!(window, &[0, 1, 2]);
}

#[test]
fn window_is_clamped_at_the_end() {
	let messages = numbered(10);
	let window = context_window(&messages, 2, |m| *m == 9);

	assert_eq!(window, &[7, 8, 9]);
}

#[test]
fn window_for_unknown_match_is_empty() {
	let messages = numbered(10);
	let window = context_window(&messages, 2, |m| *m == 42);

	assert!(window.is_empty());
}

#[test]
fn window_over_empty_sequence_is_empty() {
	let messages: Vec<usize> = Vec::new();
	let window = context_window(&messages, 2, |_| true);

	assert!(window.is_empty());
}

#[test]
fn window_with_zero_radius_is_the_match_alone() {
	let messages = numbered(4);
	let window = context_window(&messages, 0, |m| *m == 2);

	assert_eq!(window, &[2]);
}

#[test]
fn window_wider_than_the_conversation_is_the_whole_conversation() {
	let messages = numbered(3);
	let window = context_window(&messages, 10, |m| *m == 1);

	assert_eq!(window, &[0, 1, 2]);
}

#[test]
fn newline_runs_collapse_to_single_spaces() {
	assert_eq!(collapse_newlines("login\nfailed"), "login failed");
	assert_eq!(collapse_newlines("a\r\n\r\nb"), "a b");
	assert_eq!(collapse_newlines("a\rb\nc"), "a b c");
}

#[test]
fn edge_newlines_leave_no_stray_spaces() {
	assert_eq!(collapse_newlines("\n\nhello\n"), "hello");
	assert_eq!(collapse_newlines("\r\n"), "");
}

#[test]
fn interior_spacing_is_preserved() {
	assert_eq!(collapse_newlines("a  b"), "a  b");
	assert_eq!(collapse_newlines("single line"), "single line");
}

#[test]
fn roles_parse_case_insensitively() {
	assert_eq!(Role::parse("user"), Some(Role::User));
	assert_eq!(Role::parse(" Assistant "), Some(Role::Assistant));
	assert_eq!(Role::parse("SYSTEM"), Some(Role::System));
	assert_eq!(Role::parse("tool"), None);
	assert_eq!(Role::parse(""), None);
}

#[test]
fn roles_serialize_lowercase() {
	assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");

	let parsed: Role = serde_json::from_str("\"system\"").unwrap();

	assert_eq!(parsed, Role::System);
}

#[test]
fn identical_vectors_score_one() {
	assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
}

#[test]
fn orthogonal_vectors_score_zero() {
	assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
}

#[test]
fn opposite_vectors_score_negative_one() {
	assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
}

#[test]
fn degenerate_vectors_score_zero() {
	assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
	assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
	assert_eq!(cosine_similarity(&[], &[]), 0.0);
}

#[test]
fn magnitude_does_not_change_similarity() {
	let sim = cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]);

	assert!((sim - 1.0).abs() < 1e-6);
}

#[test]
fn token_estimate_scales_with_length_and_never_hits_zero() {
	assert_eq!(estimate_tokens("ab"), 1);
	assert_eq!(estimate_tokens("abcdefgh"), 2);
	assert_eq!(estimate_tokens(""), 1);
}
