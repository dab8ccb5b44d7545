use serde_json::{Map, Value, json};

use recall_providers::{Error, auth_headers};

#[test]
fn bearer_token_is_always_present() {
	let headers = auth_headers("secret", &Map::new()).expect("header build failed");

	assert_eq!(headers.get("authorization").unwrap(), "Bearer secret");
}

#[test]
fn default_headers_are_appended() {
	let mut defaults = Map::new();

	defaults.insert("x-api-version".to_string(), Value::String("2".to_string()));

	let headers = auth_headers("secret", &defaults).expect("header build failed");

	assert_eq!(headers.get("x-api-version").unwrap(), "2");
	assert_eq!(headers.len(), 2);
}

#[test]
fn non_string_default_headers_are_rejected() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), json!(3));

	let err = auth_headers("secret", &defaults).expect_err("expected config error");

	assert!(matches!(err, Error::InvalidConfig { .. }));
}
