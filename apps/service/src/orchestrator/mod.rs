/// Orchestrator module - wires components together and owns the loops
///
/// The orchestrator is constructed once at startup and:
/// - Builds the store, prober, audit log and alert sender from config
/// - Starts the probe loop (every minute by default)
/// - Starts the log rotation loop (daily by default)
///
/// Both loops run until the process is asked to stop.

pub mod rotation;


pub use rotation::LogRotator;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::alerts::{AlertSender, DisabledSender, SmsSender};
use crate::audit::AuditLog;
use crate::config::Config;
use crate::monitoring::checker::{Checker, HttpChecker};
use crate::monitoring::{MonitoringExecutor, MonitoringScheduler};
use crate::store::{FileStore, Store};

/// Main orchestrator for the uptime service
pub struct Orchestrator {
    config: Arc<Config>,
    scheduler: Arc<MonitoringScheduler>,
    audit: Arc<AuditLog>,
    task_handles: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    /// Create and run an orchestrator until Ctrl-C
    pub async fn start(config: Config) -> Result<()> {
        let mut orchestrator = Self::new(config)?;
        orchestrator.run().await
    }

    /// Create an orchestrator from config
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn Store> = Arc::new(FileStore::new(&config.storage.data_dir));
        let checker: Arc<dyn Checker> = Arc::new(HttpChecker::new()?);
        let alerts: Arc<dyn AlertSender> = if config.alerts.enabled {
            Arc::new(SmsSender::new(&config.alerts))
        } else {
            info!("Alerts are disabled - state changes will only be logged");
            Arc::new(DisabledSender)
        };

        Ok(Self::with_components(config, store, checker, alerts))
    }

    /// Create an orchestrator around explicit components
    pub fn with_components(
        config: Config,
        store: Arc<dyn Store>,
        checker: Arc<dyn Checker>,
        alerts: Arc<dyn AlertSender>,
    ) -> Self {
        let audit = Arc::new(AuditLog::new(&config.storage.logs_dir));
        let executor = Arc::new(MonitoringExecutor::new(store, checker, audit.clone(), alerts));
        let scheduler = Arc::new(MonitoringScheduler::new(
            executor,
            Duration::from_secs(config.scheduler.probe_interval_seconds.max(1)),
            config.scheduler.max_concurrent_probes,
        ));

        Self { config: Arc::new(config), scheduler, audit, task_handles: Vec::new() }
    }

    /// Start the probe and rotation loops
    pub fn spawn_loops(&mut self) {
        info!(
            "Starting probe loop (every {}s) and log rotation (every {}s)",
            self.config.scheduler.probe_interval_seconds,
            self.config.scheduler.rotation_interval_seconds
        );

        let probe_handle = self.scheduler.clone().start();

        let rotator = LogRotator::new(
            self.audit.clone(),
            Duration::from_secs(self.config.scheduler.rotation_interval_seconds.max(1)),
        );
        let rotation_handle = rotator.start_periodic_rotation();

        self.task_handles = vec![probe_handle, rotation_handle];
    }

    /// Stop both loops; in-flight pipelines are left to the runtime
    pub fn shutdown(&mut self) {
        for handle in self.task_handles.drain(..) {
            handle.abort();
        }
    }

    async fn run(&mut self) -> Result<()> {
        info!("Starting uptime orchestrator...");
        self.spawn_loops();

        tokio::signal::ctrl_c().await?;
        info!("Shutdown requested, stopping loops");
        self.shutdown();
        Ok(())
    }
}
