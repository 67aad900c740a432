use tracing::{debug, instrument};

use domain::conversion::{
    ConversionOutput, ConversionPayload, ConversionRequest, WorkerLifecycle, WorkerMessage,
    WorkerState,
};
use domain::error::DomainResult;

use crate::ports::outgoing::image_codec::{DynImageCodecPort, ImageCodecPort};

pub const EMPTY_INPUT_MESSAGE: &str = "Input buffer is empty";

/// Runs one conversion against the codec and folds the outcome into the
/// message a worker emits. Codec errors become `Failure`, never a fault.
#[instrument(skip(codec, request), fields(operation = %request.operation()))]
pub fn execute_task(codec: &dyn ImageCodecPort, request: ConversionRequest) -> WorkerMessage {
    match request.into_payload() {
        ConversionPayload::Encoded(bytes) => {
            if bytes.is_empty() {
                return WorkerMessage::Failure {
                    message: EMPTY_INPUT_MESSAGE.to_string(),
                };
            }
            match codec.decode(&bytes) {
                Ok(pixels) => {
                    debug!(
                        "Decoded {} bytes -> {}x{}",
                        bytes.len(),
                        pixels.width(),
                        pixels.height()
                    );
                    WorkerMessage::Success(ConversionOutput::Pixels(pixels))
                }
                Err(e) => WorkerMessage::Failure { message: e.message },
            }
        }
        ConversionPayload::Pixels { pixels, options } => match codec.encode(&pixels, options) {
            Ok(encoded) => {
                debug!(
                    "Encoded {}x{} -> {} bytes of {}",
                    pixels.width(),
                    pixels.height(),
                    encoded.bytes.len(),
                    encoded.format
                );
                WorkerMessage::Success(ConversionOutput::Encoded(encoded))
            }
            Err(e) => WorkerMessage::Failure { message: e.message },
        },
    }
}

/// The body of a single-use worker: owns the codec for one task and tracks
/// `Idle -> Running -> (Emitted | Faulted) -> Terminated`.
pub struct WorkerUnit {
    codec: DynImageCodecPort,
    lifecycle: WorkerLifecycle,
}

impl WorkerUnit {
    #[must_use]
    pub fn new(codec: DynImageCodecPort) -> Self {
        Self {
            codec,
            lifecycle: WorkerLifecycle::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    /// Fails only if the unit has already run a task.
    pub fn execute(&mut self, request: ConversionRequest) -> DomainResult<WorkerMessage> {
        self.lifecycle.start()?;
        let message = execute_task(self.codec.as_ref(), request);
        self.lifecycle.emit()?;
        Ok(message)
    }

    /// Marks a task that unwound before it could emit.
    pub fn record_fault(&mut self) -> DomainResult<()> {
        self.lifecycle.fault()
    }

    pub fn terminate(mut self) -> DomainResult<WorkerState> {
        self.lifecycle.terminate()?;
        Ok(self.lifecycle.state())
    }
}
