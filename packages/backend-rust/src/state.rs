use std::sync::Arc;
use std::time::{Instant, SystemTime};

use danci_review_algo::EngineConfig;

use crate::config::Config;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    db: Database,
    engine: Arc<EngineConfig>,
    config: Arc<Config>,
    started_at: Instant,
    started_at_system: SystemTime,
}

impl AppState {
    pub fn new(db: Database, engine: EngineConfig, config: Config) -> Self {
        Self {
            db,
            engine: Arc::new(engine),
            config: Arc::new(config),
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }
}
