use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use tracing::{debug, error, trace};

use domain::conversion::{ConversionRequest, WorkerExit};
use toon_application::conversion::worker::WorkerUnit;
use toon_application::ports::outgoing::{
    image_codec::DynImageCodecPort,
    worker_launcher::{BoxedWorkerHandle, LaunchError, WorkerEvent, WorkerLauncherPort},
};

use crate::outgoing::tokio_spawn::worker_channel::{WorkerEventSender, worker_channel};

const FAULT_EXIT_CODE: i32 = 1;

/// Runs every request on its own OS thread. A panic inside the codec is
/// caught at the thread boundary and reported as a non-zero exit.
pub struct ThreadWorkerLauncher {
    codec: DynImageCodecPort,
    launched: AtomicU64,
}

impl ThreadWorkerLauncher {
    pub fn new(codec: DynImageCodecPort) -> Self {
        Self {
            codec,
            launched: AtomicU64::new(0),
        }
    }
}

impl WorkerLauncherPort for ThreadWorkerLauncher {
    fn launch(&self, request: ConversionRequest) -> Result<BoxedWorkerHandle, LaunchError> {
        let sequence = self.launched.fetch_add(1, Ordering::Relaxed);
        let codec = Arc::clone(&self.codec);
        let (events, handle) = worker_channel();

        thread::Builder::new()
            .name(format!("codec-worker-{sequence}"))
            .spawn(move || run_unit(codec, request, &events))
            .map_err(|e| LaunchError {
                message: format!("Failed to spawn worker thread: {}", e),
            })?;

        trace!("Launched codec-worker-{}", sequence);
        Ok(Box::new(handle))
    }
}

fn run_unit(codec: DynImageCodecPort, request: ConversionRequest, events: &WorkerEventSender) {
    events.send(WorkerEvent::Online);

    let mut unit = WorkerUnit::new(codec);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit.execute(request)));

    let exit = match outcome {
        Ok(Ok(message)) => {
            events.send(WorkerEvent::Message(message));
            WorkerExit::success()
        }
        Ok(Err(e)) => WorkerExit::with_code(Some(FAULT_EXIT_CODE)).with_detail(e.to_string()),
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            error!("Worker panicked: {}", detail);
            if let Err(e) = unit.record_fault() {
                debug!("Could not record fault: {}", e);
            }
            WorkerExit::with_code(Some(FAULT_EXIT_CODE)).with_detail(detail)
        }
    };

    if let Err(e) = unit.terminate() {
        debug!("Worker terminated from an unexpected state: {}", e);
    }
    events.send(WorkerEvent::Exit(exit));
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
