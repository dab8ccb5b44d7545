use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use recall_domain::context::context_window;
use recall_storage::models::{MessageRecord, RankQuery, RankedMessage};

use crate::{RecallService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub conversation_ref: Option<String>,
	#[serde(default)]
	pub match_count: Option<u32>,
	#[serde(default)]
	pub match_threshold: Option<f32>,
	#[serde(default)]
	pub include_context: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
	pub id: Uuid,
	pub conversation_internal_id: Uuid,
	pub role: String,
	pub content: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	pub similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHeader {
	pub conversation_ref: String,
	pub title: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMessage {
	pub id: Uuid,
	pub role: String,
	pub content: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMatch {
	#[serde(flatten)]
	pub matched: Match,
	pub conversation: ConversationHeader,
	pub context: Vec<ContextMessage>,
}

/// The two response shapes as a sum type: `includeContext` selects the
/// variant, and the enriched shape cannot leak out of a plain search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchMatches {
	Plain(Vec<Match>),
	Enriched(Vec<EnrichedMatch>),
}
impl SearchMatches {
	pub fn len(&self) -> usize {
		match self {
			Self::Plain(matches) => matches.len(),
			Self::Enriched(matches) => matches.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub success: bool,
	pub matches: SearchMatches,
}

impl RecallService {
	pub async fn search(&self, req: SearchRequest) -> ServiceResult<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(ServiceError::InvalidRequest { message: "query is required.".to_string() });
		}

		let threshold = req.match_threshold.unwrap_or(self.cfg.search.default_match_threshold);

		if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
			return Err(ServiceError::InvalidRequest {
				message: "matchThreshold must be in the range 0.0-1.0.".to_string(),
			});
		}

		let limit = req.match_count.unwrap_or(self.cfg.search.default_match_count);

		if limit == 0 {
			return Err(ServiceError::InvalidRequest {
				message: "matchCount must be greater than zero.".to_string(),
			});
		}

		// An unresolvable scope is a hard error so callers can tell "no such
		// conversation" apart from "no matches above the threshold".
		let scope = match req.conversation_ref.as_deref().map(str::trim).filter(|r| !r.is_empty())
		{
			Some(reference) => {
				let Some(conversation) = self.store.find_conversation(reference).await? else {
					return Err(ServiceError::InvalidScope {
						conversation_ref: reference.to_string(),
					});
				};

				Some(conversation.conversation_id)
			},
			None => None,
		};
		let vector = self.embed_text(query).await?;
		let ranked = self
			.store
			.rank_messages(&RankQuery { vector, threshold, limit: i64::from(limit), scope })
			.await?;
		let matches = if req.include_context.unwrap_or(false) {
			SearchMatches::Enriched(self.enrich(ranked).await)
		} else {
			SearchMatches::Plain(ranked.into_iter().map(plain_match).collect())
		};

		Ok(SearchResponse { success: true, matches })
	}

	/// Attach conversation headers and context windows to ranked matches.
	///
	/// Ranker order is preserved as-is. A match whose conversation or
	/// message sequence cannot be fetched is dropped from the output with a
	/// diagnostic; one broken match must not fail the whole response.
	async fn enrich(&self, ranked: Vec<RankedMessage>) -> Vec<EnrichedMatch> {
		let radius = self.cfg.search.context_radius as usize;
		let mut enriched = Vec::with_capacity(ranked.len());

		for matched in ranked {
			let conversation = match self.store.conversation_by_id(matched.conversation_id).await {
				Ok(Some(conversation)) => conversation,
				Ok(None) => {
					warn!(
						message_id = %matched.message_id,
						conversation_id = %matched.conversation_id,
						"Dropping match; parent conversation is gone.",
					);

					continue;
				},
				Err(err) => {
					warn!(
						message_id = %matched.message_id,
						error = %err,
						"Dropping match; conversation fetch failed.",
					);

					continue;
				},
			};
			let messages = match self.store.conversation_messages(matched.conversation_id).await {
				Ok(messages) => messages,
				Err(err) => {
					warn!(
						message_id = %matched.message_id,
						error = %err,
						"Dropping match; context fetch failed.",
					);

					continue;
				},
			};
			let window =
				context_window(&messages, radius, |m: &MessageRecord| {
					m.message_id == matched.message_id
				});
			let context = window
				.iter()
				.map(|m| ContextMessage {
					id: m.message_id,
					role: m.role.clone(),
					content: m.content.clone(),
					created_at: m.created_at,
				})
				.collect();

			enriched.push(EnrichedMatch {
				matched: plain_match(matched),
				conversation: ConversationHeader {
					conversation_ref: conversation.external_ref,
					title: conversation.title,
					created_at: conversation.created_at,
				},
				context,
			});
		}

		enriched
	}
}

fn plain_match(row: RankedMessage) -> Match {
	Match {
		id: row.message_id,
		conversation_internal_id: row.conversation_id,
		role: row.role,
		content: row.content,
		created_at: row.created_at,
		similarity: row.similarity,
	}
}
