pub mod delete;
pub mod ingest;
pub mod list;
pub mod search;

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

pub use delete::{DeleteRequest, DeleteResponse};
pub use ingest::{IngestMessage, IngestRequest, IngestResponse};
pub use list::{ConversationListItem, ListResponse};
pub use search::{
	ContextMessage, ConversationHeader, EnrichedMatch, Match, SearchMatches, SearchRequest,
	SearchResponse,
};

use recall_config::{Config, EmbeddingProviderConfig};
use recall_domain::normalize;
use recall_storage::{
	db::Db,
	models::{
		ConversationRecord, ConversationSummary, ConversationUpsert, IngestReceipt, MessageRecord,
		NewMessage, RankQuery, RankedMessage,
	},
	queries,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type StoreResult<T> = recall_storage::Result<T>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Seam to the embedding model service: text in, fixed-dimension vectors
/// out. The default implementation forwards to `recall-providers`.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, recall_providers::Result<Vec<Vec<f32>>>>;
}

/// Seam to the storage collaborator. The ranking contract behind
/// `rank_messages` is the one piece of external behavior the search core
/// depends on bit-exactly; see `recall_storage::queries::rank_messages`.
pub trait ConversationStore
where
	Self: Send + Sync,
{
	fn find_conversation<'a>(
		&'a self,
		external_ref: &'a str,
	) -> BoxFuture<'a, StoreResult<Option<ConversationRecord>>>;

	fn conversation_by_id<'a>(
		&'a self,
		conversation_id: Uuid,
	) -> BoxFuture<'a, StoreResult<Option<ConversationRecord>>>;

	fn rank_messages<'a>(
		&'a self,
		query: &'a RankQuery,
	) -> BoxFuture<'a, StoreResult<Vec<RankedMessage>>>;

	fn conversation_messages<'a>(
		&'a self,
		conversation_id: Uuid,
	) -> BoxFuture<'a, StoreResult<Vec<MessageRecord>>>;

	fn commit_ingest<'a>(
		&'a self,
		conversation: &'a ConversationUpsert,
		messages: &'a [NewMessage],
	) -> BoxFuture<'a, StoreResult<IngestReceipt>>;

	fn list_conversations<'a>(&'a self) -> BoxFuture<'a, StoreResult<Vec<ConversationSummary>>>;

	fn delete_conversation<'a>(&'a self, conversation_id: Uuid) -> BoxFuture<'a, StoreResult<u64>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	InvalidScope { conversation_ref: String },
	NotFound { message: String },
	Provider { message: String },
	Storage { message: String },
}
impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::InvalidScope { conversation_ref } => {
				write!(f, "Unknown conversation: {conversation_ref}")
			},
			Self::NotFound { message } => write!(f, "Not found: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}
impl std::error::Error for ServiceError {}
impl From<recall_storage::Error> for ServiceError {
	fn from(err: recall_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<recall_providers::Error> for ServiceError {
	fn from(err: recall_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

pub struct RecallService {
	pub cfg: Config,
	pub store: Arc<dyn ConversationStore>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl RecallService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self {
			cfg,
			store: Arc::new(PgConversationStore::new(db)),
			embedding: Arc::new(DefaultEmbedding),
		}
	}

	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn ConversationStore>,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { cfg, store, embedding }
	}

	/// Collapse newlines, request a single embedding, and verify its
	/// dimensionality against the configured vector size.
	pub(crate) async fn embed_text(&self, text: &str) -> ServiceResult<Vec<f32>> {
		let normalized = normalize::collapse_newlines(text);
		let vectors = self.embedding.embed(&self.cfg.providers.embedding, &[normalized]).await?;
		let Some(vec) = vectors.into_iter().next() else {
			return Err(ServiceError::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vec.len() != self.cfg.providers.embedding.dimensions as usize {
			return Err(ServiceError::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vec)
	}
}

struct DefaultEmbedding;
impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, recall_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(recall_providers::embedding::embed(cfg, texts))
	}
}

/// Postgres-backed [`ConversationStore`] forwarding to
/// `recall_storage::queries`.
pub struct PgConversationStore {
	db: Db,
}
impl PgConversationStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	pub fn db(&self) -> &Db {
		&self.db
	}
}
impl ConversationStore for PgConversationStore {
	fn find_conversation<'a>(
		&'a self,
		external_ref: &'a str,
	) -> BoxFuture<'a, StoreResult<Option<ConversationRecord>>> {
		Box::pin(queries::find_conversation(&self.db, external_ref))
	}

	fn conversation_by_id<'a>(
		&'a self,
		conversation_id: Uuid,
	) -> BoxFuture<'a, StoreResult<Option<ConversationRecord>>> {
		Box::pin(queries::conversation_by_id(&self.db, conversation_id))
	}

	fn rank_messages<'a>(
		&'a self,
		query: &'a RankQuery,
	) -> BoxFuture<'a, StoreResult<Vec<RankedMessage>>> {
		Box::pin(queries::rank_messages(&self.db, query))
	}

	fn conversation_messages<'a>(
		&'a self,
		conversation_id: Uuid,
	) -> BoxFuture<'a, StoreResult<Vec<MessageRecord>>> {
		Box::pin(queries::conversation_messages(&self.db, conversation_id))
	}

	fn commit_ingest<'a>(
		&'a self,
		conversation: &'a ConversationUpsert,
		messages: &'a [NewMessage],
	) -> BoxFuture<'a, StoreResult<IngestReceipt>> {
		Box::pin(queries::commit_ingest(&self.db, conversation, messages))
	}

	fn list_conversations<'a>(&'a self) -> BoxFuture<'a, StoreResult<Vec<ConversationSummary>>> {
		Box::pin(queries::list_conversations(&self.db))
	}

	fn delete_conversation<'a>(&'a self, conversation_id: Uuid) -> BoxFuture<'a, StoreResult<u64>> {
		Box::pin(queries::delete_conversation(&self.db, conversation_id))
	}
}
