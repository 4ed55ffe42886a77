use std::sync::Arc;

use scry_pipeline::Recommender;

#[derive(Clone)]
pub struct AppState {
	pub recommender: Arc<Recommender>,
}
impl AppState {
	pub fn new(config: scry_config::Config) -> color_eyre::Result<Self> {
		let store = scry_catalogue::load_store(
			&config.catalogue.data_dir,
			&config.providers.embedding.models,
		)?;

		Ok(Self { recommender: Arc::new(Recommender::new(config, store)) })
	}
}
