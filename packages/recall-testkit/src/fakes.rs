use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering as AtomicOrdering},
	},
};

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use recall_config::EmbeddingProviderConfig;
use recall_domain::similarity::cosine_similarity;
use recall_service::{BoxFuture, ConversationStore, EmbeddingProvider, StoreResult};
use recall_storage::{
	Error as StorageError,
	models::{
		ConversationRecord, ConversationSummary, ConversationUpsert, IngestReceipt, MessageRecord,
		NewMessage, RankQuery, RankedMessage,
	},
};

/// In-memory [`ConversationStore`] implementing the same ranking contract
/// as the Postgres scan: cosine similarity, NULL embeddings skipped,
/// strict threshold, similarity-descending order with created_at then seq
/// as tie-break, limit after filtering.
#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<State>,
	poisoned: Mutex<HashSet<Uuid>>,
	commits: AtomicUsize,
	sequence_fetches: AtomicUsize,
}

#[derive(Default)]
struct State {
	conversations: Vec<ConversationRecord>,
	messages: Vec<StoredMessage>,
	next_seq: i64,
}

struct StoredMessage {
	record: MessageRecord,
	vec: Option<Vec<f32>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn seed_conversation(&self, external_ref: &str, title: Option<&str>) -> Uuid {
		let conversation_id = Uuid::new_v4();
		let mut state = self.state.lock().unwrap();

		state.conversations.push(ConversationRecord {
			conversation_id,
			external_ref: external_ref.to_string(),
			title: title.map(str::to_string),
			summary: None,
			metadata: empty_object(),
			created_at: OffsetDateTime::now_utc(),
		});

		conversation_id
	}

	pub fn seed_message(
		&self,
		conversation_id: Uuid,
		role: &str,
		content: &str,
		created_at: OffsetDateTime,
		vec: Option<Vec<f32>>,
	) -> Uuid {
		let message_id = Uuid::new_v4();
		let mut state = self.state.lock().unwrap();
		let seq = state.next_seq;

		state.next_seq += 1;

		state.messages.push(StoredMessage {
			record: MessageRecord {
				message_id,
				conversation_id,
				seq,
				role: role.to_string(),
				content: content.to_string(),
				token_count: 1,
				metadata: empty_object(),
				created_at,
			},
			vec,
		});

		message_id
	}

	/// Make every later lookup of this conversation fail, for exercising
	/// the enricher's drop-one-match policy.
	pub fn poison_conversation(&self, conversation_id: Uuid) {
		self.poisoned.lock().unwrap().insert(conversation_id);
	}

	pub fn commit_count(&self) -> usize {
		self.commits.load(AtomicOrdering::SeqCst)
	}

	pub fn sequence_fetch_count(&self) -> usize {
		self.sequence_fetches.load(AtomicOrdering::SeqCst)
	}

	pub fn conversation_count(&self) -> usize {
		self.state.lock().unwrap().conversations.len()
	}

	pub fn message_count(&self) -> usize {
		self.state.lock().unwrap().messages.len()
	}

	pub fn stored_title(&self, external_ref: &str) -> Option<Option<String>> {
		let state = self.state.lock().unwrap();

		state
			.conversations
			.iter()
			.find(|c| c.external_ref == external_ref)
			.map(|c| c.title.clone())
	}

	fn is_poisoned(&self, conversation_id: Uuid) -> bool {
		self.poisoned.lock().unwrap().contains(&conversation_id)
	}

	fn rank(&self, query: &RankQuery) -> StoreResult<Vec<RankedMessage>> {
		if query.limit <= 0 {
			return Err(StorageError::InvalidArgument("rank limit must be positive".to_string()));
		}

		let state = self.state.lock().unwrap();
		let mut scored: Vec<(&StoredMessage, f32)> = state
			.messages
			.iter()
			.filter(|m| query.scope.is_none_or(|scope| m.record.conversation_id == scope))
			.filter_map(|m| {
				let vec = m.vec.as_ref()?;
				let similarity = cosine_similarity(&query.vector, vec);

				(similarity > query.threshold).then_some((m, similarity))
			})
			.collect();

		scored.sort_by(|(a, sim_a), (b, sim_b)| {
			sim_b
				.partial_cmp(sim_a)
				.unwrap_or(Ordering::Equal)
				.then_with(|| a.record.created_at.cmp(&b.record.created_at))
				.then_with(|| a.record.seq.cmp(&b.record.seq))
		});
		scored.truncate(query.limit as usize);

		Ok(scored
			.into_iter()
			.map(|(m, similarity)| RankedMessage {
				message_id: m.record.message_id,
				conversation_id: m.record.conversation_id,
				role: m.record.role.clone(),
				content: m.record.content.clone(),
				created_at: m.record.created_at,
				similarity,
			})
			.collect())
	}

	fn commit(
		&self,
		conversation: &ConversationUpsert,
		messages: &[NewMessage],
	) -> StoreResult<IngestReceipt> {
		let mut state = self.state.lock().unwrap();
		let conversation_id = match state
			.conversations
			.iter_mut()
			.find(|c| c.external_ref == conversation.external_ref)
		{
			Some(existing) => {
				if let Some(title) = &conversation.title {
					existing.title = Some(title.clone());
				}
				if let Some(summary) = &conversation.summary {
					existing.summary = Some(summary.clone());
				}
				if let Some(metadata) = &conversation.metadata {
					existing.metadata = metadata.clone();
				}

				existing.conversation_id
			},
			None => {
				let conversation_id = Uuid::new_v4();

				state.conversations.push(ConversationRecord {
					conversation_id,
					external_ref: conversation.external_ref.clone(),
					title: conversation.title.clone(),
					summary: conversation.summary.clone(),
					metadata: conversation.metadata.clone().unwrap_or_else(empty_object),
					created_at: conversation.created_at,
				});

				conversation_id
			},
		};

		for message in messages {
			let seq = state.next_seq;

			state.next_seq += 1;

			state.messages.push(StoredMessage {
				record: MessageRecord {
					message_id: message.message_id,
					conversation_id,
					seq,
					role: message.role.clone(),
					content: message.content.clone(),
					token_count: message.token_count,
					metadata: message.metadata.clone(),
					created_at: message.created_at,
				},
				vec: Some(message.vec.clone()),
			});
		}

		self.commits.fetch_add(1, AtomicOrdering::SeqCst);

		Ok(IngestReceipt { conversation_id, stored_count: messages.len() as u32 })
	}
}

impl ConversationStore for MemoryStore {
	fn find_conversation<'a>(
		&'a self,
		external_ref: &'a str,
	) -> BoxFuture<'a, StoreResult<Option<ConversationRecord>>> {
		let found = self
			.state
			.lock()
			.unwrap()
			.conversations
			.iter()
			.find(|c| c.external_ref == external_ref)
			.cloned();

		Box::pin(async move { Ok(found) })
	}

	fn conversation_by_id<'a>(
		&'a self,
		conversation_id: Uuid,
	) -> BoxFuture<'a, StoreResult<Option<ConversationRecord>>> {
		if self.is_poisoned(conversation_id) {
			return Box::pin(async move {
				Err(StorageError::InvalidArgument("poisoned conversation".to_string()))
			});
		}

		let found = self
			.state
			.lock()
			.unwrap()
			.conversations
			.iter()
			.find(|c| c.conversation_id == conversation_id)
			.cloned();

		Box::pin(async move { Ok(found) })
	}

	fn rank_messages<'a>(
		&'a self,
		query: &'a RankQuery,
	) -> BoxFuture<'a, StoreResult<Vec<RankedMessage>>> {
		let result = self.rank(query);

		Box::pin(async move { result })
	}

	fn conversation_messages<'a>(
		&'a self,
		conversation_id: Uuid,
	) -> BoxFuture<'a, StoreResult<Vec<MessageRecord>>> {
		self.sequence_fetches.fetch_add(1, AtomicOrdering::SeqCst);

		let state = self.state.lock().unwrap();
		let mut records: Vec<MessageRecord> = state
			.messages
			.iter()
			.filter(|m| m.record.conversation_id == conversation_id)
			.map(|m| m.record.clone())
			.collect();

		records.sort_by(|a, b| {
			a.created_at.cmp(&b.created_at).then_with(|| a.seq.cmp(&b.seq))
		});

		Box::pin(async move { Ok(records) })
	}

	fn commit_ingest<'a>(
		&'a self,
		conversation: &'a ConversationUpsert,
		messages: &'a [NewMessage],
	) -> BoxFuture<'a, StoreResult<IngestReceipt>> {
		let result = self.commit(conversation, messages);

		Box::pin(async move { result })
	}

	fn list_conversations<'a>(&'a self) -> BoxFuture<'a, StoreResult<Vec<ConversationSummary>>> {
		let state = self.state.lock().unwrap();
		let summaries: Vec<ConversationSummary> = state
			.conversations
			.iter()
			.map(|c| ConversationSummary {
				conversation_id: c.conversation_id,
				external_ref: c.external_ref.clone(),
				title: c.title.clone(),
				summary: c.summary.clone(),
				created_at: c.created_at,
				message_count: state
					.messages
					.iter()
					.filter(|m| m.record.conversation_id == c.conversation_id)
					.count() as i64,
			})
			.collect();

		Box::pin(async move { Ok(summaries) })
	}

	fn delete_conversation<'a>(&'a self, conversation_id: Uuid) -> BoxFuture<'a, StoreResult<u64>> {
		let mut state = self.state.lock().unwrap();
		let before = state.messages.len();

		state.messages.retain(|m| m.record.conversation_id != conversation_id);
		state.conversations.retain(|c| c.conversation_id != conversation_id);

		let deleted = (before - state.messages.len()) as u64;

		Box::pin(async move { Ok(deleted) })
	}
}

/// Embedding stub: a zero vector of the configured dimension for any text.
pub struct StubEmbedding {
	pub dimensions: u32,
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, recall_providers::Result<Vec<Vec<f32>>>> {
		let dim = self.dimensions as usize;
		let vectors = texts.iter().map(|_| vec![0.0; dim]).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Embedding stub that counts calls.
pub struct SpyEmbedding {
	pub dimensions: u32,
	pub calls: AtomicUsize,
}
impl SpyEmbedding {
	pub fn new(dimensions: u32) -> Self {
		Self { dimensions, calls: AtomicUsize::new(0) }
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(AtomicOrdering::SeqCst)
	}
}
impl EmbeddingProvider for SpyEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, recall_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, AtomicOrdering::SeqCst);

		let dim = self.dimensions as usize;
		let vectors = texts.iter().map(|_| vec![0.0; dim]).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Embedding stub with canned vectors per (normalized) input text.
/// Unmapped texts fall back to a zero vector of the configured dimension.
pub struct MappedEmbedding {
	pub dimensions: u32,
	vectors: Mutex<HashMap<String, Vec<f32>>>,
}
impl MappedEmbedding {
	pub fn new(dimensions: u32) -> Self {
		Self { dimensions, vectors: Mutex::new(HashMap::new()) }
	}

	pub fn map(&self, text: &str, vector: Vec<f32>) {
		self.vectors.lock().unwrap().insert(text.to_string(), vector);
	}
}
impl EmbeddingProvider for MappedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, recall_providers::Result<Vec<Vec<f32>>>> {
		let mapped = self.vectors.lock().unwrap();
		let dim = self.dimensions as usize;
		let vectors = texts
			.iter()
			.map(|text| mapped.get(text).cloned().unwrap_or_else(|| vec![0.0; dim]))
			.collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Embedding stub that fails on the n-th call (1-based), for exercising
/// the ingest pipeline's abort-on-first-error contract.
pub struct FlakyEmbedding {
	pub dimensions: u32,
	pub fail_on_call: usize,
	calls: AtomicUsize,
}
impl FlakyEmbedding {
	pub fn new(dimensions: u32, fail_on_call: usize) -> Self {
		Self { dimensions, fail_on_call, calls: AtomicUsize::new(0) }
	}
}
impl EmbeddingProvider for FlakyEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, recall_providers::Result<Vec<Vec<f32>>>> {
		let call = self.calls.fetch_add(1, AtomicOrdering::SeqCst) + 1;
		let dim = self.dimensions as usize;
		let result = if call == self.fail_on_call {
			Err(recall_providers::Error::InvalidResponse {
				message: "embedding backend unavailable".to_string(),
			})
		} else {
			Ok(texts.iter().map(|_| vec![0.0; dim]).collect())
		};

		Box::pin(async move { result })
	}
}

fn empty_object() -> Value {
	Value::Object(serde_json::Map::new())
}
