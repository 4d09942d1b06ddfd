use crate::{
    config::RuntimeConfiguration,
    dashboard::Dashboard,
    error::RosterResult,
    seed::SeedLoader,
    storage::{KeyValueStorage, open_storage},
    store::RecordStore,
};
use maud::{DOCTYPE, Markup, html};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug)]
pub struct RosterState {
    dashboard: Arc<Mutex<Dashboard>>,
}

impl RosterState {
    pub async fn new(config: &RuntimeConfiguration) -> RosterResult<Self> {
        let storage = open_storage(&config.storage_config()).await?;
        Ok(Self::with_storage(storage, config).await)
    }

    /// Seeds `storage`, then loads the roster from it.
    ///
    /// A corrupt roster starts the page empty. The failure is kept on the
    /// dashboard so the first page render can tell the user.
    pub async fn with_storage(storage: Arc<dyn KeyValueStorage>, config: &RuntimeConfiguration) -> Self {
        let key = config.storage_config().key.clone();

        SeedLoader::new(&config.seed_config(), key.clone())
            .run(storage.as_ref())
            .await;

        let mut dashboard = Dashboard::new(RecordStore::new(storage, key));
        if let Err(e) = dashboard.load().await {
            error!(?e, "Unable to load roster on startup");
            if e.is_recoverable() {
                dashboard.report(e);
            }
        }

        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
        }
    }

    #[allow(clippy::unused_self)]
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Roster" }
                }
                body class="bg-gray-900 min-h-screen flex flex-col items-center justify-center text-white" {
                    (markup)
                }
            }
        }
    }

    ///user actions take this lock for their whole duration, so they never interleave
    pub async fn dashboard(&self) -> MutexGuard<'_, Dashboard> {
        self.dashboard.lock().await
    }
}
