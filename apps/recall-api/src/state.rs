use std::sync::Arc;

use recall_service::RecallService;
use recall_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RecallService>,
}
impl AppState {
	pub async fn new(config: recall_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.providers.embedding.dimensions).await?;

		let service = RecallService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: RecallService) -> Self {
		Self { service: Arc::new(service) }
	}
}
