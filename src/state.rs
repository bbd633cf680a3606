use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::embedding;
use crate::ingest::IngestionPipeline;
use crate::search::engine::RetrievalEngine;
use crate::session::SessionManager;
use crate::store::ChunkStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<ChunkStore>,
    pub engine: Arc<RetrievalEngine>,
    pub pipeline: Arc<IngestionPipeline>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Arc::new(ChunkStore::open_or_create(&config.data_dir)?);

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        let embedder = embedding::from_config(&config.embedding, http_client)?;

        // A persisted corpus embedded with a different model cannot be
        // searched; refuse to start rather than serve garbage rankings.
        if let Some(dim) = store.dimension() {
            if dim != embedder.dimension() {
                anyhow::bail!(
                    "chunk store has {dim}-dimensional embeddings but the configured \
                     model produces {}; re-ingest the corpus or fix EMBED_DIM",
                    embedder.dimension()
                );
            }
        }

        let engine = Arc::new(RetrievalEngine::new(
            store.clone(),
            embedder.clone(),
            config.retrieval.clone(),
        ));
        let pipeline = Arc::new(IngestionPipeline::new(
            store.clone(),
            embedder,
            engine.clone(),
            config.chunking.clone(),
            Duration::from_millis(config.retrieval.embed_timeout_ms),
        ));

        Ok(Self {
            config,
            store,
            engine,
            pipeline,
            sessions: Arc::new(SessionManager::new()),
        })
    }
}
