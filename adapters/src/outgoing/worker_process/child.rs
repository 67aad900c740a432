use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::{debug, instrument};

use domain::conversion::WorkerState;
use domain::error::DomainError;
use toon_application::conversion::worker::WorkerUnit;
use toon_application::ports::outgoing::image_codec::DynImageCodecPort;

use super::wire::{self, WireError};

#[derive(Debug, Error)]
pub enum ChildWorkerError {
    #[error("Worker pipe failed: {0}")]
    Io(#[from] io::Error),
    #[error("Worker frame error: {0}")]
    Wire(#[from] WireError),
    #[error(transparent)]
    Lifecycle(#[from] DomainError),
}

/// Body of the `codec-worker` process: reads one request frame until EOF,
/// runs it on a fresh unit and writes the single message frame.
#[instrument(skip_all)]
pub fn run_codec_worker(
    codec: DynImageCodecPort,
    input: &mut impl Read,
    output: &mut impl Write,
) -> Result<WorkerState, ChildWorkerError> {
    let mut frame = Vec::new();
    input.read_to_end(&mut frame)?;
    debug!("Read {} byte request frame", frame.len());

    let request = wire::decode_request(&frame)?;

    let mut unit = WorkerUnit::new(codec);
    let message = unit.execute(request)?;

    output.write_all(&wire::encode_message(&message)?)?;
    output.flush()?;

    Ok(unit.terminate()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::outgoing::image_rs::codec_image::{ImageCodecAdapter, ImageCodecConfig};
    use domain::conversion::{ConversionRequest, WorkerMessage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn codec() -> DynImageCodecPort {
        Arc::new(ImageCodecAdapter::new(ImageCodecConfig::default()))
    }

    #[test]
    fn empty_input_yields_failure_frame() {
        let request = wire::encode_request(&ConversionRequest::decode(Vec::new())).unwrap();
        let mut output = Vec::new();

        let state = run_codec_worker(codec(), &mut Cursor::new(request), &mut output).unwrap();

        assert_eq!(state, WorkerState::Terminated);
        assert_eq!(
            wire::decode_message(&output).unwrap(),
            WorkerMessage::Failure {
                message: "Input buffer is empty".to_string()
            }
        );
    }

    #[test]
    fn garbage_request_writes_nothing() {
        let mut output = Vec::new();

        let result = run_codec_worker(codec(), &mut Cursor::new(b"junk".to_vec()), &mut output);

        assert!(matches!(result, Err(ChildWorkerError::Wire(_))));
        assert!(output.is_empty());
    }
}
