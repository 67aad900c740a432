use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use toon_application::ports::outgoing::worker_launcher::{WorkerEvent, WorkerHandle};

/// Receiving end of a worker unit's event stream.
pub struct ChannelWorkerHandle {
    events: UnboundedReceiver<WorkerEvent>,
}

impl ChannelWorkerHandle {
    pub fn new(events: UnboundedReceiver<WorkerEvent>) -> Self {
        Self { events }
    }
}

#[async_trait::async_trait]
impl WorkerHandle for ChannelWorkerHandle {
    async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }
}

/// Sending end held by the worker unit. Events sent after the dispatcher has
/// stopped listening are dropped.
#[derive(Clone)]
pub struct WorkerEventSender {
    events: UnboundedSender<WorkerEvent>,
}

impl WorkerEventSender {
    pub fn send(&self, event: WorkerEvent) {
        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            trace!("Dispatcher gone, dropping {:?}", event);
        }
    }
}

pub fn worker_channel() -> (WorkerEventSender, ChannelWorkerHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        WorkerEventSender { events: tx },
        ChannelWorkerHandle::new(rx),
    )
}
