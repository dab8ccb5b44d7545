use serde::{Deserialize, Serialize};

use crate::{RecallService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
	pub conversation_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
	pub success: bool,
	pub conversation_ref: String,
	pub deleted_messages: u64,
}

impl RecallService {
	pub async fn delete(&self, req: DeleteRequest) -> ServiceResult<DeleteResponse> {
		let reference = req.conversation_ref.trim();

		if reference.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "conversationRef is required.".to_string(),
			});
		}

		let Some(conversation) = self.store.find_conversation(reference).await? else {
			return Err(ServiceError::NotFound {
				message: format!("No conversation with ref {reference:?}."),
			});
		};
		let deleted_messages =
			self.store.delete_conversation(conversation.conversation_id).await?;

		Ok(DeleteResponse {
			success: true,
			conversation_ref: reference.to_string(),
			deleted_messages,
		})
	}
}
