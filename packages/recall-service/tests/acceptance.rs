mod acceptance {
	mod ingest_roundtrip;
	mod ranking_contract;

	use std::sync::Arc;

	use serde_json::Map;

	use recall_config::{
		Config, EmbeddingProviderConfig, Postgres, Providers, Search, Security, Service, Storage,
	};
	use recall_service::{EmbeddingProvider, PgConversationStore, RecallService};
	use recall_storage::db::Db;
	use recall_testkit::TestDatabase;

	pub async fn test_db() -> Option<TestDatabase> {
		let base_dsn = recall_testkit::env_dsn()?;
		let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");

		Some(db)
	}

	pub fn test_config(dsn: String, dimensions: u32) -> Config {
		Config {
			service: Service {
				http_bind: "127.0.0.1:0".to_string(),
				log_level: "info".to_string(),
			},
			storage: Storage { postgres: Postgres { dsn, pool_max_conns: 2 } },
			providers: Providers {
				embedding: EmbeddingProviderConfig {
					provider_id: "test".to_string(),
					api_base: "http://127.0.0.1:1".to_string(),
					api_key: "test-key".to_string(),
					path: "/embeddings".to_string(),
					model: "test".to_string(),
					dimensions,
					timeout_ms: 1_000,
					default_headers: Map::new(),
				},
			},
			search: Search {
				default_match_count: 5,
				default_match_threshold: 0.7,
				context_radius: 2,
			},
			security: Security { bind_localhost_only: true },
		}
	}

	pub async fn build_service(
		cfg: Config,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> RecallService {
		let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect.");

		db.ensure_schema(cfg.providers.embedding.dimensions)
			.await
			.expect("Failed to ensure schema.");

		RecallService::with_parts(cfg, Arc::new(PgConversationStore::new(db)), embedding)
	}
}
