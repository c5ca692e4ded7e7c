use std::path::PathBuf;

use tokio::{
    sync::mpsc::{self, Sender, error::TrySendError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::{AuditEvent, AuditSink, append_audit_event};

/// Cloneable sending side of the audit channel.
#[derive(Clone)]
pub struct AuditHandle {
    tx: Sender<AuditEvent>,
}

impl AuditSink for AuditHandle {
    fn record(&self, event: AuditEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    operation = %event.operation,
                    event_id = %event.id,
                    "audit channel full; dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    operation = %event.operation,
                    event_id = %event.id,
                    "audit writer stopped; dropping event"
                );
            }
        }
    }
}

struct AuditWriter {
    data_dir: PathBuf,
    rx: mpsc::Receiver<AuditEvent>,
}

impl AuditWriter {
    async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            match append_audit_event(&self.data_dir, &event).await {
                Ok(()) => debug!(
                    operation = %event.operation,
                    event_id = %event.id,
                    "audit event written"
                ),
                Err(err) => warn!(
                    error = ?err,
                    operation = %event.operation,
                    event_id = %event.id,
                    "failed to persist audit event"
                ),
            }
        }
        info!("audit writer drained; shutting down");
    }
}

/// Start the background writer. It exits once every [`AuditHandle`] clone has
/// been dropped and the queued events are flushed.
pub fn spawn_audit_writer(data_dir: PathBuf, capacity: usize) -> (AuditHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let writer = AuditWriter { data_dir, rx };
    let join = tokio::spawn(writer.run());
    (AuditHandle { tx }, join)
}
