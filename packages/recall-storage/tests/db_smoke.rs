use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use recall_config::Postgres;
use recall_storage::{
	db::Db,
	models::{ConversationUpsert, NewMessage, RankQuery},
	queries,
};
use recall_testkit::TestDatabase;

const DIM: u32 = 4;

fn new_message(role: &str, content: &str, vec: Vec<f32>, created_at: OffsetDateTime) -> NewMessage {
	NewMessage {
		message_id: Uuid::new_v4(),
		role: role.to_string(),
		content: content.to_string(),
		token_count: 1,
		metadata: json!({}),
		vec,
		created_at,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set RECALL_PG_DSN to run."]
async fn schema_and_queries_roundtrip() {
	let Some(base_dsn) = recall_testkit::env_dsn() else {
		eprintln!("Skipping; set RECALL_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = Db::connect(&Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 })
		.await
		.expect("Failed to connect.");

	// ensure_schema is idempotent; a second run must be a no-op.
	db.ensure_schema(DIM).await.expect("First ensure_schema failed.");
	db.ensure_schema(DIM).await.expect("Second ensure_schema failed.");

	let now = OffsetDateTime::now_utc();
	let conversation = ConversationUpsert {
		external_ref: "conv-smoke".to_string(),
		title: Some("Smoke".to_string()),
		summary: None,
		metadata: Some(json!({"source": "test"})),
		created_at: now,
	};
	// Identical timestamps force the seq tie-break in the conversation
	// order.
	let receipt = queries::commit_ingest(&db, &conversation, &[
		new_message("user", "first", vec![1.0, 0.0, 0.0, 0.0], now),
		new_message("assistant", "second", vec![0.0, 1.0, 0.0, 0.0], now),
		new_message("user", "third", vec![1.0, 1.0, 0.0, 0.0], now),
	])
	.await
	.expect("commit_ingest failed");

	assert_eq!(receipt.stored_count, 3);

	let found = queries::find_conversation(&db, "conv-smoke")
		.await
		.expect("find_conversation failed")
		.expect("conversation missing");

	assert_eq!(found.conversation_id, receipt.conversation_id);
	assert_eq!(found.title.as_deref(), Some("Smoke"));

	let messages = queries::conversation_messages(&db, receipt.conversation_id)
		.await
		.expect("conversation_messages failed");
	let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();

	assert_eq!(contents, vec!["first", "second", "third"]);

	let ranked = queries::rank_messages(&db, &RankQuery {
		vector: vec![1.0, 0.0, 0.0, 0.0],
		threshold: 0.0,
		limit: 10,
		scope: Some(receipt.conversation_id),
	})
	.await
	.expect("rank_messages failed");

	// "second" is orthogonal to the query: similarity 0.0, strictly
	// filtered out.
	assert_eq!(ranked.len(), 2);
	assert_eq!(ranked[0].content, "first");
	assert_eq!(ranked[0].similarity, 1.0);
	assert_eq!(ranked[1].content, "third");

	let deleted = queries::delete_conversation(&db, receipt.conversation_id)
		.await
		.expect("delete_conversation failed");

	assert_eq!(deleted, 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set RECALL_PG_DSN to run."]
async fn rank_rejects_a_non_positive_limit() {
	let Some(base_dsn) = recall_testkit::env_dsn() else {
		eprintln!("Skipping; set RECALL_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = Db::connect(&Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 })
		.await
		.expect("Failed to connect.");

	db.ensure_schema(DIM).await.expect("ensure_schema failed.");

	let result = queries::rank_messages(&db, &RankQuery {
		vector: vec![1.0, 0.0, 0.0, 0.0],
		threshold: 0.5,
		limit: 0,
		scope: None,
	})
	.await;

	assert!(matches!(result, Err(recall_storage::Error::InvalidArgument(_))));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
