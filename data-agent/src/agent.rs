//! Composition root wiring every orchestrator to one API client, store and bus

use std::sync::Arc;
use tracing::info;

use crate::api::types::HealthStatus;
use crate::api::ApiClient;
use crate::chat::{ChatLimits, ChatOrchestrator, IntentClassifier, RemoteIntentClassifier};
use crate::config::AgentConfig;
use crate::data::DataManager;
use crate::error::Result;
use crate::events::EventBus;
use crate::insights::InsightsDashboard;
use crate::push::PushClient;
use crate::results::ResultsRenderer;
use crate::search::{SearchHistory, SearchOrchestrator};
use crate::storage::{JsonFileStore, MemoryStore, Preferences, SharedStore};
use crate::suggest::{Debouncer, SuggestionEngine};

pub struct Agent {
    pub config: AgentConfig,
    pub api: ApiClient,
    pub store: SharedStore,
    pub bus: EventBus,
    pub search: SearchOrchestrator,
    pub suggestions: SuggestionEngine,
    pub chat: ChatOrchestrator,
    pub insights: InsightsDashboard,
}

impl Agent {
    /// Local store from `storage.path` (in-memory when unset), model-backed intent classification
    pub fn from_config(config: AgentConfig) -> Result<Self> {
        let store = Self::local_store(&config)?;
        let api = ApiClient::from_config(&config.api)?;
        let classifier = Arc::new(RemoteIntentClassifier::new(api.clone()));
        Self::assemble(config, api, store, classifier)
    }

    /// File-backed store at `storage.path`, or in-memory when unset
    pub fn local_store(config: &AgentConfig) -> Result<SharedStore> {
        Ok(match &config.storage.path {
            Some(path) => Arc::new(JsonFileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        })
    }

    /// Same wiring with an explicit store and classifier
    pub fn with_parts(
        config: AgentConfig,
        store: SharedStore,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Result<Self> {
        let api = ApiClient::from_config(&config.api)?;
        Self::assemble(config, api, store, classifier)
    }

    fn assemble(
        config: AgentConfig,
        api: ApiClient,
        store: SharedStore,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Result<Self> {
        config.validate()?;
        let bus = EventBus::new();

        let history = SearchHistory::new(store.clone(), config.search.history_limit);
        let search = SearchOrchestrator::new(
            api.clone(),
            history,
            bus.clone(),
            Debouncer::new(config.debounce()),
            config.search.result_limit,
        );

        let suggestions = SuggestionEngine::new(
            api.clone(),
            search.clone(),
            Debouncer::new(config.debounce()),
            bus.clone(),
            config.search.suggestion_limit,
        );

        let chat = ChatOrchestrator::new(
            api.clone(),
            classifier,
            search.clone(),
            bus.clone(),
            ChatLimits {
                context_limit: config.insights.chat_context_limit,
                scope_limit: config.insights.scope_limit,
            },
        );

        let insights = InsightsDashboard::new(api.clone(), bus.clone(), config.insights.scope_limit)
            .with_search(search.clone());

        info!("Agent ready against {}", api.base_url());

        Ok(Self {
            config,
            api,
            store,
            bus,
            search,
            suggestions,
            chat,
            insights,
        })
    }

    /// A data manager with the configured page size
    pub fn data_manager(&self) -> DataManager {
        DataManager::new(self.api.clone(), self.bus.clone(), self.config.data.page_size)
    }

    pub fn results_renderer(&self) -> ResultsRenderer {
        ResultsRenderer::new(self.config.features.export_enabled)
    }

    pub fn preferences(&self) -> Result<Preferences> {
        Preferences::load(self.store.as_ref())
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        preferences.save(self.store.as_ref())
    }

    pub async fn connect_push(&self) -> Result<PushClient> {
        PushClient::connect(&self.config.api.ws_url, self.bus.clone()).await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.api.health().await
    }
}
