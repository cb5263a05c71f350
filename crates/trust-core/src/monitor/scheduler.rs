//! Monitor registry and polling loop
//!
//! Each monitor gets its own ticker at its configured poll interval. Explicit
//! requests (table pushed, threshold changed, operator re-run) go through
//! [`MonitorRegistry::trigger`] and share the monitor's coalescing gate with
//! the ticker.

use super::{MetricMonitor, TriggerOutcome};
use crate::audit::AuditEntry;
use crate::dashboard::{aggregate, DashboardStatus, MetricSummary};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Shared map of monitors by metric name
#[derive(Default, Clone)]
pub struct MonitorRegistry {
    monitors: Arc<DashMap<String, Arc<MetricMonitor>>>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, monitor: MetricMonitor) -> Arc<MetricMonitor> {
        let monitor = Arc::new(monitor);
        self.monitors
            .insert(monitor.name().to_string(), monitor.clone());
        monitor
    }

    pub fn get(&self, name: &str) -> Option<Arc<MetricMonitor>> {
        self.monitors.get(name).map(|entry| entry.value().clone())
    }

    /// Sorted metric names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.monitors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    fn all(&self) -> Vec<Arc<MetricMonitor>> {
        self.monitors.iter().map(|e| e.value().clone()).collect()
    }

    /// Queue an evaluation without waiting for it
    ///
    /// Returns `false` when no monitor has that name.
    pub fn trigger(&self, name: &str) -> bool {
        let Some(monitor) = self.get(name) else {
            return false;
        };
        tokio::spawn(async move {
            if monitor.trigger().await == TriggerOutcome::Queued {
                debug!(metric = %monitor.name(), "Evaluation already in flight, re-run queued");
            }
        });
        true
    }

    /// Aggregate status across every monitor
    pub async fn dashboard(&self) -> DashboardStatus {
        let mut details = Vec::with_capacity(self.len());
        let mut last_audit: Option<AuditEntry> = None;

        for monitor in self.all() {
            let state = monitor.state().await;
            details.push(MetricSummary::from_state(monitor.name(), &state));

            if let Some(entry) = monitor.audit().recent(1).into_iter().next() {
                let newer = last_audit
                    .as_ref()
                    .map(|current| entry.checked_at > current.checked_at)
                    .unwrap_or(true);
                if newer {
                    last_audit = Some(entry);
                }
            }
        }

        aggregate(details, last_audit)
    }
}

/// Periodic evaluation of every registered monitor
pub struct MonitorScheduler {
    registry: MonitorRegistry,
}

impl MonitorScheduler {
    pub fn new(registry: MonitorRegistry) -> Self {
        Self { registry }
    }

    /// Run until the shutdown signal fires
    ///
    /// The first tick of each monitor fires immediately.
    pub async fn run(self, shutdown: broadcast::Sender<()>) {
        let monitors = self.registry.all();
        info!(monitors = monitors.len(), "Starting monitor scheduler");

        let handles: Vec<JoinHandle<()>> = monitors
            .into_iter()
            .map(|monitor| tokio::spawn(poll_monitor(monitor, shutdown.subscribe())))
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Monitor polling task failed");
            }
        }
        info!("Monitor scheduler stopped");
    }
}

async fn poll_monitor(monitor: Arc<MetricMonitor>, mut shutdown: broadcast::Receiver<()>) {
    let period = monitor.poll_interval().await;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(
        metric = %monitor.name(),
        interval_secs = period.as_secs(),
        "Polling monitor"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                monitor.trigger().await;
            }
            _ = shutdown.recv() => {
                debug!(metric = %monitor.name(), "Stopping monitor polling");
                break;
            }
        }
    }
}
