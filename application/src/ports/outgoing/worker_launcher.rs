use std::sync::Arc;

use domain::conversion::{ConversionRequest, WorkerExit, WorkerMessage};

/// Everything a launched worker unit can report back to the dispatcher.
#[derive(Debug)]
pub enum WorkerEvent {
    Online,
    Message(WorkerMessage),
    TransportError(String),
    Exit(WorkerExit),
}

#[derive(Debug)]
pub struct LaunchError {
    pub message: String,
}

#[async_trait::async_trait]
pub trait WorkerHandle: Send {
    /// Next lifecycle event, or `None` once the unit's channel has closed.
    async fn next_event(&mut self) -> Option<WorkerEvent>;
}

pub type BoxedWorkerHandle = Box<dyn WorkerHandle>;

/// Starts a fresh, isolated worker unit for exactly one request.
pub trait WorkerLauncherPort: Send + Sync {
    fn launch(&self, request: ConversionRequest) -> Result<BoxedWorkerHandle, LaunchError>;
}

pub type DynWorkerLauncherPort = Arc<dyn WorkerLauncherPort>;
