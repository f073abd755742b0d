//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the file allow-list when file control is on
//! - Run the initial registration pass
//! - Build the hook dispatcher and HTTP server
//! - Start background tasks (allow-list refresh, config reload, signals)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, after routes are registered
//! - Background tasks are joined after the server drains

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{CoexistConfig, ConfigWatcher};
use crate::hooks::{HookDispatcher, HookRegistry};
use crate::http::{EndpointDefinition, HttpServer, RouterError, VersionedRouter};
use crate::lifecycle::{signals, Shutdown};
use crate::resilience::AsyncRetryExecutor;
use crate::versioning::{AllowListError, FileAllowList};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error(transparent)]
    AllowList(#[from] AllowListError),

    #[error("initial route registration failed: {0}")]
    Router(#[from] RouterError),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A fully wired, not yet listening application.
pub struct Application {
    config: CoexistConfig,
    server: HttpServer,
    router: Arc<VersionedRouter>,
    shutdown: Shutdown,
    config_path: Option<PathBuf>,
}

impl Application {
    /// Register `definitions` under `config` and wire the server.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(
        config: CoexistConfig,
        definitions: Vec<EndpointDefinition>,
        hooks: HookRegistry,
    ) -> Result<Self, StartupError> {
        let allow_list = if config.file_control.enabled {
            let list = FileAllowList::open(&config.file_control.path)?;
            tracing::info!(
                path = ?list.path(),
                versions = ?list.currently_allowed(),
                "File allow-list loaded"
            );
            Some(Arc::new(list))
        } else {
            None
        };

        let router = Arc::new(VersionedRouter::new(definitions, &config, allow_list)?);
        let executor = AsyncRetryExecutor::from_config(&config.hooks);
        let dispatcher = HookDispatcher::new(Arc::new(hooks), executor);
        let server = HttpServer::new(config.clone(), Arc::clone(&router), dispatcher);

        Ok(Self {
            config,
            server,
            router,
            shutdown: Shutdown::new(),
            config_path: None,
        })
    }

    /// Watch `path` and apply valid changes while running.
    pub fn watch_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn router(&self) -> &Arc<VersionedRouter> {
        &self.router
    }

    pub fn server(&self) -> &HttpServer {
        &self.server
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(self) -> Result<(), StartupError> {
        let address = &self.config.listener.bind_address;
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| StartupError::InvalidAddress(address.clone()))?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(self, listener: TcpListener) -> Result<(), StartupError> {
        let Self {
            config,
            server,
            router,
            shutdown,
            config_path,
        } = self;

        let mut tasks = Vec::new();

        if let Some(list) = router.allow_list() {
            if config.file_control.refresh_ms > 0 {
                let interval = Duration::from_millis(config.file_control.refresh_ms);
                tasks.push(Arc::clone(list).spawn_refresh(interval, shutdown.subscribe()));
            }
        }

        // Dropping the watcher stops notifications, so it lives until serve returns.
        let _watcher = match config_path {
            Some(path) => {
                let (watcher, updates) = ConfigWatcher::new(&path);
                let handle = watcher.run()?;
                tasks.push(server.spawn_reload_task(updates, shutdown.subscribe()));
                Some(handle)
            }
            None => None,
        };

        tasks.push(signals::spawn_signal_listener(shutdown.clone()));

        let result = server.run(listener, shutdown.subscribe()).await;

        shutdown.trigger();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }

        result.map_err(StartupError::from)
    }
}
