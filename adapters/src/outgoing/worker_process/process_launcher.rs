use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, trace, warn};

use domain::conversion::{ConversionRequest, WorkerExit};
use toon_application::ports::outgoing::worker_launcher::{
    BoxedWorkerHandle, LaunchError, WorkerEvent, WorkerLauncherPort,
};

use super::wire;
use crate::outgoing::tokio_spawn::worker_channel::{WorkerEventSender, worker_channel};

#[derive(Debug, Clone)]
pub struct ProcessWorkerConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Runs every request in a fresh child process speaking the frame protocol
/// in `wire` over stdin/stdout. Must be called from within a Tokio runtime.
pub struct ProcessWorkerLauncher {
    config: Arc<ProcessWorkerConfig>,
}

impl ProcessWorkerLauncher {
    pub fn new(config: ProcessWorkerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl WorkerLauncherPort for ProcessWorkerLauncher {
    fn launch(&self, request: ConversionRequest) -> Result<BoxedWorkerHandle, LaunchError> {
        let frame = wire::encode_request(&request).map_err(|e| LaunchError {
            message: format!("Failed to encode worker request: {}", e),
        })?;

        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| LaunchError {
                message: format!(
                    "Failed to spawn worker process {}: {}",
                    self.config.program.display(),
                    e
                ),
            })?;

        trace!("Spawned worker process {:?}", child.id());

        let (events, handle) = worker_channel();
        tokio::spawn(supervise(child, frame, events));

        Ok(Box::new(handle))
    }
}

/// Feeds the request, collects stdout until EOF and reports the outcome.
/// A frame that decodes is always delivered before the exit status.
async fn supervise(mut child: Child, frame: Vec<u8>, events: WorkerEventSender) {
    events.send(WorkerEvent::Online);

    let write_error = write_request(&mut child, &frame).await.err();

    let mut output = Vec::new();
    let read_error = match child.stdout.take() {
        Some(mut stdout) => stdout.read_to_end(&mut output).await.err(),
        None => Some(io::Error::other("worker stdout is not piped")),
    };

    let status = match child.wait().await {
        Ok(status) => status,
        Err(e) => {
            events.send(WorkerEvent::TransportError(format!(
                "Failed to wait for worker process: {}",
                e
            )));
            return;
        }
    };
    let exit = exit_from_status(status);
    debug!("Worker process finished: {}", exit);

    if let Some(problem) = transport_problem(write_error, read_error, &output) {
        if exit.is_success() {
            events.send(WorkerEvent::TransportError(problem));
        } else {
            warn!("Worker process failed after: {}", problem);
        }
    } else {
        match wire::decode_message(&output) {
            Ok(message) => events.send(WorkerEvent::Message(message)),
            Err(e) if exit.is_success() => events.send(WorkerEvent::TransportError(format!(
                "Malformed worker message: {}",
                e
            ))),
            Err(e) => trace!("Ignoring partial output from failed worker: {}", e),
        }
    }

    events.send(WorkerEvent::Exit(exit));
}

async fn write_request(child: &mut Child, frame: &[u8]) -> io::Result<()> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("worker stdin is not piped"))?;
    stdin.write_all(frame).await?;
    stdin.shutdown().await
}

/// A child that exits without writing anything is left to the exit status.
fn transport_problem(
    write_error: Option<io::Error>,
    read_error: Option<io::Error>,
    output: &[u8],
) -> Option<String> {
    if let Some(e) = read_error {
        return Some(format!("Failed to read worker output: {}", e));
    }
    if let Some(e) = write_error {
        return Some(format!("Failed to send request to worker: {}", e));
    }
    if output.is_empty() {
        return Some("Worker closed its output without a message".to_string());
    }
    None
}

fn exit_from_status(status: ExitStatus) -> WorkerExit {
    if let Some(code) = status.code() {
        return WorkerExit::with_code(Some(code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return WorkerExit::with_code(None).with_detail(format!("killed by signal {signal}"));
        }
    }

    WorkerExit::with_code(None)
}
