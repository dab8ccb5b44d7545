use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use recall_domain::{role::Role, tokens};
use recall_storage::models::{ConversationUpsert, NewMessage};

use crate::{RecallService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestMessage {
	pub role: String,
	pub content: String,
	#[serde(default)]
	pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
	pub conversation_ref: String,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub summary: Option<String>,
	pub messages: Vec<IngestMessage>,
	#[serde(default)]
	pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
	pub success: bool,
	pub conversation_ref: String,
	pub stored_count: u32,
}

impl RecallService {
	/// Ingest one conversation: upsert the conversation row by its external
	/// ref and store every usable message with its embedding.
	///
	/// Write-path failure policy is all-or-nothing, deliberately stricter
	/// than search enrichment: the embedding stage short-circuits on the
	/// first provider error before anything is written, and the commit
	/// stage is a single storage transaction.
	pub async fn ingest(&self, req: IngestRequest) -> ServiceResult<IngestResponse> {
		let conversation_ref = req.conversation_ref.trim();

		if conversation_ref.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "conversationRef is required.".to_string(),
			});
		}
		if req.messages.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "messages must be non-empty.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();
		let prepared = self.prepare_messages(&req.messages, now).await?;
		let conversation = ConversationUpsert {
			external_ref: conversation_ref.to_string(),
			title: req.title,
			summary: req.summary,
			metadata: req.metadata,
			created_at: now,
		};
		let receipt = self.store.commit_ingest(&conversation, &prepared).await?;

		Ok(IngestResponse {
			success: true,
			conversation_ref: conversation_ref.to_string(),
			stored_count: receipt.stored_count,
		})
	}

	/// Stage phase of the ingest pipeline.
	///
	/// Entries with empty content or a role outside the closed set are
	/// skipped and never counted. Each surviving message is embedded one at
	/// a time in input order; the first provider error aborts the whole
	/// call with nothing staged for commit.
	async fn prepare_messages(
		&self,
		messages: &[IngestMessage],
		now: OffsetDateTime,
	) -> ServiceResult<Vec<NewMessage>> {
		let mut prepared = Vec::with_capacity(messages.len());

		for message in messages {
			let Some(role) = Role::parse(&message.role) else {
				continue;
			};

			if message.content.trim().is_empty() {
				continue;
			}

			let vec = self.embed_text(&message.content).await?;

			prepared.push(NewMessage {
				message_id: Uuid::new_v4(),
				role: role.as_str().to_string(),
				content: message.content.clone(),
				token_count: tokens::estimate_tokens(&message.content) as i32,
				metadata: message.metadata.clone().unwrap_or_else(|| Value::Object(Default::default())),
				vec,
				created_at: now,
			});
		}

		Ok(prepared)
	}
}
