use std::sync::Arc;

use tokio::{sync::Notify, task::JoinHandle};
use tracing::info;

use crate::{
    audit::{AuditSink, NullAuditSink, spawn_audit_writer},
    config::AppConfig,
    service::ExerciseTracker,
    storage::FileStore,
};

#[derive(Clone)]
pub struct AppContext {
    config: Arc<AppConfig>,
    shutdown: Arc<Notify>,
    tracker: ExerciseTracker,
}

impl AppContext {
    pub fn new(config: AppConfig, tracker: ExerciseTracker) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(Notify::new()),
            tracker,
        }
    }

    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub fn tracker(&self) -> &ExerciseTracker {
        &self.tracker
    }

    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

/// Wire the file store and audit channel described by `config`.
///
/// Must run inside a Tokio runtime. The returned join handle, when present,
/// completes once every clone of the context has been dropped and the audit
/// queue is flushed.
pub fn build_context(config: AppConfig) -> anyhow::Result<(AppContext, Option<JoinHandle<()>>)> {
    let store = Arc::new(FileStore::open(&config.data_dir)?);

    let (audit, writer): (Arc<dyn AuditSink>, Option<JoinHandle<()>>) = if config.audit.enabled {
        let (handle, join) =
            spawn_audit_writer(config.data_dir.clone(), config.audit.channel_capacity);
        let sink: Arc<dyn AuditSink> = Arc::new(handle);
        (sink, Some(join))
    } else {
        info!("audit trail disabled");
        let sink: Arc<dyn AuditSink> = Arc::new(NullAuditSink);
        (sink, None)
    };

    let tracker = ExerciseTracker::new(store, audit);
    Ok((AppContext::new(config, tracker), writer))
}
