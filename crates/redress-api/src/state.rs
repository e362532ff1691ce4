//! # Application State
//!
//! Shared state handed to every route handler: the grievance store, the
//! lifecycle policy and query engine built over it, the optional database
//! pool for write-through persistence, and the optional Prometheus handle.
//!
//! The store is the single source of truth while the process runs. When a
//! database is configured it is hydrated once at startup and every
//! successful mutation is written through afterwards.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use redress_lifecycle::{LifecyclePolicy, QueryEngine, TransitionPolicy};
use redress_store::{GrievanceStore, MemoryStore};
use sqlx::PgPool;

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` and `database_url` to prevent
/// credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Postgres connection string. If `None`, state lives in memory only.
    pub database_url: Option<String>,
    /// Rules for admin status changes.
    pub transition_policy: TransitionPolicy,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("transition_policy", &self.transition_policy)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            database_url: None,
            transition_policy: TransitionPolicy::default(),
            log_json: false,
        }
    }
}

/// Shared application state accessible to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GrievanceStore>,
    pub policy: LifecyclePolicy,
    pub queries: QueryEngine,

    // -- Database persistence (optional) --
    /// When `Some`, every accepted mutation is persisted to Postgres after
    /// the in-memory store has been updated.
    pub db_pool: Option<PgPool>,

    /// Renders `/metrics` when a Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,

    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("grievances", &self.store.len())
            .field("transition_policy", &self.policy.transition_policy())
            .field("db_pool", &self.db_pool.as_ref().map(|_| "[connected]"))
            .field("metrics", &self.metrics.as_ref().map(|_| "[installed]"))
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// In-memory state with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), config)
    }

    /// State over an existing store.
    pub fn with_store(store: Arc<dyn GrievanceStore>, config: AppConfig) -> Self {
        let policy =
            LifecyclePolicy::new(store.clone()).with_transition_policy(config.transition_policy);
        let queries = QueryEngine::new(store.clone());
        Self {
            store,
            policy,
            queries,
            db_pool: None,
            metrics: None,
            config,
        }
    }

    /// Attach a database pool for write-through persistence.
    pub fn with_db_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Hydrate the in-memory store from the database.
    ///
    /// Called once on startup when a database pool is available. Returns the
    /// number of grievances restored.
    pub async fn hydrate_from_db(&self) -> Result<usize, String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(0),
        };

        let hydration = crate::db::grievances::load_all(pool)
            .await
            .map_err(|e| format!("failed to load grievances: {e}"))?;
        let count = hydration.grievances.len();
        let comments: usize = hydration.grievances.iter().map(|g| g.comments.len()).sum();
        for grievance in hydration.grievances {
            self.store
                .restore(grievance)
                .map_err(|e| format!("failed to restore grievance: {e}"))?;
        }
        // Rows skipped during load still own their ids.
        self.store.advance_ids(hydration.last_grievance, hydration.last_comment);

        tracing::info!(
            grievances = count,
            comments,
            "Hydrated in-memory store from database"
        );
        Ok(count)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
