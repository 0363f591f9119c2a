use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::credential::MAX_EXPIRE_SECONDS;
use crate::services::credential_service::{CredentialConfig, CredentialManager};
use crate::services::scoring_service::{ScoringConfig, ScoringService};
use crate::services::task_service::TaskService;
use crate::utils::logger::init_logging;

const DB_FILE_NAME: &str = "effort-tracker.sqlite";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub app_key: Option<String>,
    pub app_secret: Option<String>,
    pub token_expire_seconds: u32,
    pub credential: CredentialConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("EFFORT_TRACKER_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let token_expire_seconds = match std::env::var("EFFORT_TRACKER_TOKEN_EXPIRE_SECONDS") {
            Ok(raw) => raw.trim().parse::<u32>().unwrap_or_else(|err| {
                warn!(
                    target: "app::config",
                    value = %raw,
                    error = %err,
                    "invalid token lifetime, using default"
                );
                MAX_EXPIRE_SECONDS
            }),
            Err(_) => MAX_EXPIRE_SECONDS,
        };

        Self {
            data_dir,
            app_key: std::env::var("EFFORT_TRACKER_QIANFAN_AK").ok(),
            app_secret: std::env::var("EFFORT_TRACKER_QIANFAN_SK").ok(),
            token_expire_seconds,
            credential: CredentialConfig::from_env(),
            scoring: ScoringConfig::from_env(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    credential: CredentialManager,
    scoring_service: Arc<ScoringService>,
    task_service: Arc<TaskService>,
}

impl AppState {
    pub fn new(
        db_pool: DbPool,
        credential: CredentialManager,
        scoring: &ScoringConfig,
    ) -> AppResult<Self> {
        let scoring_service = Arc::new(ScoringService::new(scoring, credential.clone())?);
        let task_service = Arc::new(TaskService::new(
            db_pool.clone(),
            Arc::clone(&scoring_service),
        ));

        Ok(Self {
            db_pool,
            credential,
            scoring_service,
            task_service,
        })
    }

    pub fn db_pool(&self) -> &DbPool {
        &self.db_pool
    }

    pub fn credential(&self) -> &CredentialManager {
        &self.credential
    }

    pub fn scoring_service(&self) -> Arc<ScoringService> {
        Arc::clone(&self.scoring_service)
    }

    pub fn task_service(&self) -> Arc<TaskService> {
        Arc::clone(&self.task_service)
    }
}

/// Process startup: logging, database, one credential exchange, services.
pub async fn bootstrap(config: AppConfig) -> AppResult<AppState> {
    init_logging(&config.log_dir())?;

    let db_pool = DbPool::new(config.db_path())?;

    let credential = match (config.app_key.as_deref(), config.app_secret.as_deref()) {
        (Some(app_key), Some(app_secret)) => {
            CredentialManager::acquire(
                &config.credential,
                app_key,
                app_secret,
                config.token_expire_seconds,
            )
            .await
        }
        _ => {
            warn!(target: "app::credential", "AK/SK not configured, scoring will use the fallback pair");
            CredentialManager::absent()
        }
    };

    info!(
        target: "app::state",
        scoring_available = credential.is_valid(),
        "application state ready"
    );

    AppState::new(db_pool, credential, &config.scoring)
}
