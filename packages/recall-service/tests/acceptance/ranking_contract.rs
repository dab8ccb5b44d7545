use std::sync::Arc;

use recall_service::{IngestMessage, IngestRequest, SearchMatches, SearchRequest, ServiceError};
use recall_testkit::MappedEmbedding;

const DIM: u32 = 4;

fn ingest_request(messages: Vec<IngestMessage>) -> IngestRequest {
	IngestRequest {
		conversation_ref: "conv-ranking".to_string(),
		title: Some("Ranking fixture".to_string()),
		summary: None,
		messages,
		metadata: None,
	}
}

fn message(role: &str, content: &str) -> IngestMessage {
	IngestMessage { role: role.to_string(), content: content.to_string(), metadata: None }
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set RECALL_PG_DSN to run."]
async fn ranking_scan_applies_strict_threshold_order_and_limit() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping; set RECALL_PG_DSN to run this test.");

		return;
	};
	let embedding = Arc::new(MappedEmbedding::new(DIM));

	// Exact-valued vectors keep the pgvector arithmetic exact: identical
	// vectors score 1, orthogonal ones score 0.
	embedding.map("query text", vec![1.0, 0.0, 0.0, 0.0]);
	embedding.map("identical", vec![1.0, 0.0, 0.0, 0.0]);
	embedding.map("nearby", vec![1.0, 1.0, 0.0, 0.0]);
	embedding.map("orthogonal", vec![0.0, 0.0, 1.0, 0.0]);

	let cfg = super::test_config(test_db.dsn().to_string(), DIM);
	let service = super::build_service(cfg, embedding).await;

	service
		.ingest(ingest_request(vec![
			message("user", "identical"),
			message("assistant", "nearby"),
			message("user", "orthogonal"),
		]))
		.await
		.expect("ingest failed");

	let response = service
		.search(SearchRequest {
			query: "query text".to_string(),
			conversation_ref: None,
			match_count: Some(5),
			match_threshold: Some(0.0),
			include_context: None,
		})
		.await
		.expect("search failed");
	let SearchMatches::Plain(matches) = response.matches else {
		panic!("expected plain matches");
	};

	// The orthogonal message sits exactly on the threshold and must be
	// excluded; the remaining two come back similarity-descending.
	assert_eq!(matches.len(), 2);
	assert_eq!(matches[0].content, "identical");
	assert_eq!(matches[0].similarity, 1.0);
	assert_eq!(matches[1].content, "nearby");
	assert!(matches[1].similarity < 1.0);

	let limited = service
		.search(SearchRequest {
			query: "query text".to_string(),
			conversation_ref: None,
			match_count: Some(1),
			match_threshold: Some(0.0),
			include_context: None,
		})
		.await
		.expect("search failed");

	assert_eq!(limited.matches.len(), 1);

	let scoped_miss = service
		.search(SearchRequest {
			query: "query text".to_string(),
			conversation_ref: Some("no-such-conversation".to_string()),
			match_count: None,
			match_threshold: None,
			include_context: None,
		})
		.await;

	assert!(matches!(scoped_miss, Err(ServiceError::InvalidScope { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
