use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::identity::NameStore;
use crate::store::{LocalSpotStore, PgSpotStore, SpotStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SpotStore>,
    pub identity: Arc<NameStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let identity = Arc::new(NameStore::open(&config.identity_path)?);

        let store: Arc<dyn SpotStore> = match &config.database_url {
            Some(url) => {
                let store = PgSpotStore::connect(url).await?;
                info!("remote sync active");
                Arc::new(store)
            }
            None => {
                warn!("DATABASE_URL not set; realtime sync disabled, running on the local board");
                Arc::new(LocalSpotStore::new())
            }
        };

        Ok(Self {
            config,
            store,
            identity,
        })
    }

    pub fn fake() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(0);

        let identity_path = std::env::temp_dir().join(format!(
            "parkboard_fake_{}_{}.json",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_file(&identity_path);

        let config = Arc::new(AppConfig {
            database_url: None,
            identity_path: identity_path.clone(),
        });
        let identity = Arc::new(NameStore::open(&identity_path).expect("fake identity store"));

        Self {
            config,
            store: Arc::new(LocalSpotStore::new()),
            identity,
        }
    }
}
