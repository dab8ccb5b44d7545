use std::sync::Arc;

use recall_service::{
	DeleteRequest, IngestMessage, IngestRequest, SearchMatches, SearchRequest,
};
use recall_testkit::MappedEmbedding;

const DIM: u32 = 4;

fn message(role: &str, content: &str) -> IngestMessage {
	IngestMessage { role: role.to_string(), content: content.to_string(), metadata: None }
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set RECALL_PG_DSN to run."]
async fn reingest_is_idempotent_and_context_windows_come_back() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping; set RECALL_PG_DSN to run this test.");

		return;
	};
	let embedding = Arc::new(MappedEmbedding::new(DIM));

	embedding.map("the query", vec![1.0, 0.0, 0.0, 0.0]);
	embedding.map("the hit", vec![1.0, 0.0, 0.0, 0.0]);

	let cfg = super::test_config(test_db.dsn().to_string(), DIM);
	let service = super::build_service(cfg, embedding).await;
	let first = IngestRequest {
		conversation_ref: "conv-upsert".to_string(),
		title: Some("First title".to_string()),
		summary: None,
		messages: vec![
			message("system", "before before"),
			message("user", "before"),
			message("assistant", "the hit"),
			message("user", "after"),
			message("assistant", "after after"),
		],
		metadata: None,
	};

	service.ingest(first).await.expect("first ingest failed");
	service
		.ingest(IngestRequest {
			conversation_ref: "conv-upsert".to_string(),
			title: Some("Second title".to_string()),
			summary: Some("A summary".to_string()),
			messages: vec![message("user", "an extra message")],
			metadata: None,
		})
		.await
		.expect("second ingest failed");

	let listed = service.list().await.expect("list failed");

	assert_eq!(listed.conversations.len(), 1);
	assert_eq!(listed.conversations[0].title.as_deref(), Some("Second title"));
	assert_eq!(listed.conversations[0].message_count, 6);

	let response = service
		.search(SearchRequest {
			query: "the query".to_string(),
			conversation_ref: Some("conv-upsert".to_string()),
			match_count: None,
			match_threshold: Some(0.5),
			include_context: Some(true),
		})
		.await
		.expect("search failed");
	let SearchMatches::Enriched(matches) = response.matches else {
		panic!("expected enriched matches");
	};

	assert_eq!(matches.len(), 1);
	assert_eq!(matches[0].matched.content, "the hit");
	assert_eq!(matches[0].conversation.conversation_ref, "conv-upsert");
	// The hit sits at position 2 of 6; radius 2 gives positions 0..=4.
	assert_eq!(matches[0].context.len(), 5);
	assert_eq!(matches[0].context[2].content, "the hit");

	let deleted = service
		.delete(DeleteRequest { conversation_ref: "conv-upsert".to_string() })
		.await
		.expect("delete failed");

	assert_eq!(deleted.deleted_messages, 6);

	let listed_after = service.list().await.expect("list failed");

	assert!(listed_after.conversations.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
