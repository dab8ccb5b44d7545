use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{
		ConversationRecord, ConversationSummary, ConversationUpsert, IngestReceipt, MessageRecord,
		NewMessage, RankQuery, RankedMessage,
	},
};

pub async fn find_conversation(
	db: &Db,
	external_ref: &str,
) -> Result<Option<ConversationRecord>> {
	let row = sqlx::query_as::<_, ConversationRecord>(
		"\
SELECT conversation_id, external_ref, title, summary, metadata, created_at
FROM conversations
WHERE external_ref = $1",
	)
	.bind(external_ref)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

pub async fn conversation_by_id(
	db: &Db,
	conversation_id: Uuid,
) -> Result<Option<ConversationRecord>> {
	let row = sqlx::query_as::<_, ConversationRecord>(
		"\
SELECT conversation_id, external_ref, title, summary, metadata, created_at
FROM conversations
WHERE conversation_id = $1",
	)
	.bind(conversation_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// The ranking scan the search core depends on, bit-exactly: cosine
/// similarity as `1 - (vec <=> query)`, NULL embeddings excluded, strictly
/// greater-than threshold filter, similarity-descending order with
/// ascending creation time (then storage sequence) as tie-break, limit
/// applied after filtering.
pub async fn rank_messages(db: &Db, query: &RankQuery) -> Result<Vec<RankedMessage>> {
	if query.limit <= 0 {
		return Err(Error::InvalidArgument("rank limit must be positive".to_string()));
	}

	let vec_text = vector_literal(&query.vector);
	let rows = sqlx::query_as::<_, RankedMessage>(
		"\
SELECT
	message_id,
	conversation_id,
	role,
	content,
	created_at,
	(1 - (vec <=> $1::text::vector))::real AS similarity
FROM messages
WHERE vec IS NOT NULL
	AND ($2::uuid IS NULL OR conversation_id = $2)
	AND (1 - (vec <=> $1::text::vector))::real > $3
ORDER BY similarity DESC, created_at ASC, seq ASC
LIMIT $4",
	)
	.bind(vec_text)
	.bind(query.scope)
	.bind(query.threshold)
	.bind(query.limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn conversation_messages(
	db: &Db,
	conversation_id: Uuid,
) -> Result<Vec<MessageRecord>> {
	let rows = sqlx::query_as::<_, MessageRecord>(
		"\
SELECT message_id, conversation_id, seq, role, content, token_count, metadata, created_at
FROM messages
WHERE conversation_id = $1
ORDER BY created_at ASC, seq ASC",
	)
	.bind(conversation_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Upsert the conversation and insert every prepared message in a single
/// transaction. A failure anywhere rolls the whole call back; no message
/// from a failed ingest is ever visible.
pub async fn commit_ingest(
	db: &Db,
	conversation: &ConversationUpsert,
	messages: &[NewMessage],
) -> Result<IngestReceipt> {
	let mut tx = db.pool.begin().await?;
	let conversation_id = upsert_conversation_tx(&mut tx, conversation).await?;

	for message in messages {
		insert_message_tx(&mut tx, conversation_id, message).await?;
	}

	tx.commit().await?;

	Ok(IngestReceipt { conversation_id, stored_count: messages.len() as u32 })
}

pub async fn list_conversations(db: &Db) -> Result<Vec<ConversationSummary>> {
	let rows = sqlx::query_as::<_, ConversationSummary>(
		"\
SELECT
	c.conversation_id,
	c.external_ref,
	c.title,
	c.summary,
	c.created_at,
	COUNT(m.message_id) AS message_count
FROM conversations c
LEFT JOIN messages m ON m.conversation_id = c.conversation_id
GROUP BY c.conversation_id
ORDER BY c.created_at DESC, c.conversation_id ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn delete_conversation(db: &Db, conversation_id: Uuid) -> Result<u64> {
	let mut tx = db.pool.begin().await?;
	let deleted_messages = sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
		.bind(conversation_id)
		.execute(&mut *tx)
		.await?
		.rows_affected();

	sqlx::query("DELETE FROM conversations WHERE conversation_id = $1")
		.bind(conversation_id)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(deleted_messages)
}

async fn upsert_conversation_tx(
	tx: &mut Transaction<'_, Postgres>,
	conversation: &ConversationUpsert,
) -> Result<Uuid> {
	let conversation_id: Uuid = sqlx::query_scalar(
		"\
INSERT INTO conversations (conversation_id, external_ref, title, summary, metadata, created_at)
VALUES ($1, $2, $3, $4, COALESCE($5, '{}'::jsonb), $6)
ON CONFLICT (external_ref) DO UPDATE
SET
	title = COALESCE(EXCLUDED.title, conversations.title),
	summary = COALESCE(EXCLUDED.summary, conversations.summary),
	metadata = COALESCE($5, conversations.metadata)
RETURNING conversation_id",
	)
	.bind(Uuid::new_v4())
	.bind(conversation.external_ref.as_str())
	.bind(conversation.title.as_deref())
	.bind(conversation.summary.as_deref())
	.bind(conversation.metadata.as_ref())
	.bind(conversation.created_at)
	.fetch_one(&mut **tx)
	.await?;

	Ok(conversation_id)
}

async fn insert_message_tx(
	tx: &mut Transaction<'_, Postgres>,
	conversation_id: Uuid,
	message: &NewMessage,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO messages (message_id, conversation_id, role, content, token_count, metadata, vec, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7::text::vector, $8)",
	)
	.bind(message.message_id)
	.bind(conversation_id)
	.bind(message.role.as_str())
	.bind(message.content.as_str())
	.bind(message.token_count)
	.bind(&message.metadata)
	.bind(vector_literal(&message.vec))
	.bind(message.created_at)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

fn vector_literal(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}
