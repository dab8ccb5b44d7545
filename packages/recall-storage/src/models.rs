use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationRecord {
	pub conversation_id: Uuid,
	pub external_ref: String,
	pub title: Option<String>,
	pub summary: Option<String>,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRecord {
	pub message_id: Uuid,
	pub conversation_id: Uuid,
	pub seq: i64,
	pub role: String,
	pub content: String,
	pub token_count: i32,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
}

/// One row of the ranking scan: a message plus its computed similarity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankedMessage {
	pub message_id: Uuid,
	pub conversation_id: Uuid,
	pub role: String,
	pub content: String,
	pub created_at: OffsetDateTime,
	pub similarity: f32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationSummary {
	pub conversation_id: Uuid,
	pub external_ref: String,
	pub title: Option<String>,
	pub summary: Option<String>,
	pub created_at: OffsetDateTime,
	pub message_count: i64,
}

/// Upsert payload for a conversation row, keyed by `external_ref`.
///
/// `None` fields leave the stored value untouched on conflict; `Some`
/// fields replace it.
#[derive(Debug, Clone)]
pub struct ConversationUpsert {
	pub external_ref: String,
	pub title: Option<String>,
	pub summary: Option<String>,
	pub metadata: Option<Value>,
	pub created_at: OffsetDateTime,
}

/// A fully prepared message ready to commit: content as the caller sent
/// it, embedding computed from the newline-collapsed form.
#[derive(Debug, Clone)]
pub struct NewMessage {
	pub message_id: Uuid,
	pub role: String,
	pub content: String,
	pub token_count: i32,
	pub metadata: Value,
	pub vec: Vec<f32>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestReceipt {
	pub conversation_id: Uuid,
	pub stored_count: u32,
}

#[derive(Debug, Clone)]
pub struct RankQuery {
	pub vector: Vec<f32>,
	pub threshold: f32,
	pub limit: i64,
	pub scope: Option<Uuid>,
}
