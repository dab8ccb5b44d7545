use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use recall_service::{
	DeleteRequest, DeleteResponse, IngestRequest, IngestResponse, ListResponse, SearchRequest,
	SearchResponse, ServiceError,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/ingest", post(ingest))
		.route("/v1/search", post(search))
		.route("/v1/conversations", get(list))
		.route("/v1/conversations/delete", post(delete))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn ingest(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
	let response = state.service.ingest(payload).await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn list(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
	let response = state.service.list().await?;

	Ok(Json(response))
}

async fn delete(
	State(state): State<AppState>,
	Json(payload): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, ApiError> {
	let response = state.service.delete(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	success: bool,
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => {
				Self { status: StatusCode::BAD_REQUEST, error_code: "invalid_request", message }
			},
			ServiceError::InvalidScope { conversation_ref } => Self {
				status: StatusCode::NOT_FOUND,
				error_code: "invalid_scope",
				message: format!("Unknown conversation: {conversation_ref}"),
			},
			ServiceError::NotFound { message } => {
				Self { status: StatusCode::NOT_FOUND, error_code: "not_found", message }
			},
			// Collaborator failures are logged with detail server-side and
			// surfaced without internals.
			ServiceError::Provider { message } | ServiceError::Storage { message } => {
				tracing::error!(%message, "Request failed on a collaborator error.");

				Self {
					status: StatusCode::INTERNAL_SERVER_ERROR,
					error_code: "internal",
					message: "Internal error.".to_string(),
				}
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			success: false,
			error_code: self.error_code.to_string(),
			message: self.message,
		};

		(self.status, Json(body)).into_response()
	}
}
