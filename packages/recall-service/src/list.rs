use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{RecallService, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationListItem {
	pub conversation_ref: String,
	pub title: Option<String>,
	pub summary: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	pub message_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
	pub success: bool,
	pub conversations: Vec<ConversationListItem>,
}

impl RecallService {
	pub async fn list(&self) -> ServiceResult<ListResponse> {
		let summaries = self.store.list_conversations().await?;
		let conversations = summaries
			.into_iter()
			.map(|summary| ConversationListItem {
				conversation_ref: summary.external_ref,
				title: summary.title,
				summary: summary.summary,
				created_at: summary.created_at,
				message_count: summary.message_count,
			})
			.collect();

		Ok(ListResponse { success: true, conversations })
	}
}
