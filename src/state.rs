use std::sync::Arc;

use crate::{
    auth::SessionResolver,
    configuration::Config,
    db::{PgStore, get_connection_pool},
    events::EventBus,
    providers::{
        FavoritesProvider, HistoryRecorder, OshiListProvider, ProfileProvider, ProviderContext,
    },
    search::TitleSearchController,
    store::Store,
};

/// Everything a host needs to build providers. Each provider call below
/// returns a fresh instance with its own caches.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub sessions: Arc<dyn SessionResolver>,
    pub events: EventBus,
}

impl AppState {
    /// Wires a lazily connecting PostgreSQL store.
    pub fn init(config: Config, sessions: Arc<dyn SessionResolver>) -> Self {
        let pool = get_connection_pool(&config.database);
        let store = Arc::new(PgStore::new(pool));

        Self::with_store(config, store, sessions)
    }

    pub fn with_store(
        config: Config,
        store: Arc<dyn Store>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            config,
            store,
            sessions,
            events: EventBus::new(),
        }
    }

    pub fn context(&self) -> ProviderContext {
        ProviderContext::new(
            Some(self.store.clone()),
            Some(self.sessions.clone()),
            self.events.clone(),
        )
    }

    pub fn oshi_lists(&self) -> OshiListProvider {
        OshiListProvider::new(self.context(), self.config.catalog.preview_size)
    }

    pub fn favorites(&self) -> FavoritesProvider {
        FavoritesProvider::new(self.context(), self.config.catalog.preview_size)
    }

    pub fn profiles(&self) -> ProfileProvider {
        ProfileProvider::new(self.context())
    }

    pub fn history(&self) -> HistoryRecorder {
        HistoryRecorder::new(
            self.context(),
            self.config.history.play_suppression_window(),
        )
    }

    pub fn title_search(&self) -> TitleSearchController {
        TitleSearchController::new(Some(self.store.clone()))
    }
}
