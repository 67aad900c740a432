use tracing::{debug, instrument, trace, warn};

use domain::conversion::{
    ConversionOperation, ConversionOutput, ConversionRequest, EncodeOptions, WorkerMessage,
};
use domain::image::{EncodedImage, PixelBuffer};

use crate::{
    error::AppResult,
    ports::{
        incoming::conversion::{ConversionStatsQueryUseCase, ConvertImageUseCase},
        outgoing::worker_launcher::{BoxedWorkerHandle, DynWorkerLauncherPort, WorkerEvent},
    },
};

use super::{
    error::ConversionError,
    stats::{ConversionStats, ConversionStatsSnapshot},
};

const NO_RESULT_DETAIL: &str = "worker exited without emitting a result";
const CHANNEL_CLOSED_MESSAGE: &str = "worker channel closed before a result was produced";

/// Brokers each conversion to its own freshly launched worker unit and turns
/// the unit's first terminal event into the call's single outcome.
pub struct ConversionService {
    launcher: DynWorkerLauncherPort,
    stats: ConversionStats,
}

impl ConversionService {
    #[must_use]
    pub fn new(launcher: DynWorkerLauncherPort) -> Self {
        Self {
            launcher,
            stats: ConversionStats::new(),
        }
    }

    #[instrument(skip(self, request), fields(operation = %request.operation(), payload_len = request.payload_len()))]
    pub async fn convert(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionOutput, ConversionError> {
        let _in_flight = self.stats.begin();
        let expected = request.operation();

        let result = self.dispatch(request).await.and_then(|output| {
            if output.operation() == expected {
                Ok(output)
            } else {
                Err(ConversionError::transport(format!(
                    "worker answered a {expected} request with {} output",
                    output.operation()
                )))
            }
        });

        self.stats.record(&result);
        match &result {
            Ok(_) => debug!("Conversion completed"),
            Err(e) => warn!(kind = e.kind().as_str(), "Conversion failed: {}", e),
        }
        result
    }

    pub async fn decode(&self, bytes: Vec<u8>) -> AppResult<PixelBuffer> {
        let output = self.convert(ConversionRequest::decode(bytes)).await?;
        expect_pixels(output).map_err(Into::into)
    }

    pub async fn encode(
        &self,
        pixels: PixelBuffer,
        options: EncodeOptions,
    ) -> AppResult<EncodedImage> {
        let request = ConversionRequest::encode(pixels, options)?;
        let output = self.convert(request).await?;
        expect_encoded(output).map_err(Into::into)
    }

    #[must_use]
    pub fn stats(&self) -> ConversionStatsSnapshot {
        self.stats.snapshot()
    }

    async fn dispatch(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionOutput, ConversionError> {
        let mut unit = self
            .launcher
            .launch(request)
            .map_err(|e| ConversionError::transport(e.message))?;

        await_outcome(&mut unit).await
    }
}

/// Reads events until the first terminal one. Whatever the unit reports
/// afterwards is never observed.
async fn await_outcome(
    unit: &mut BoxedWorkerHandle,
) -> Result<ConversionOutput, ConversionError> {
    loop {
        let Some(event) = unit.next_event().await else {
            return Err(ConversionError::transport(CHANNEL_CLOSED_MESSAGE));
        };

        match event {
            WorkerEvent::Online => trace!("Worker unit online"),
            WorkerEvent::Message(WorkerMessage::Success(output)) => return Ok(output),
            WorkerEvent::Message(WorkerMessage::Failure { message }) => {
                return Err(ConversionError::Codec { message });
            }
            WorkerEvent::TransportError(message) => {
                return Err(ConversionError::Transport { message });
            }
            WorkerEvent::Exit(exit) if exit.is_success() => {
                return Err(ConversionError::lifecycle(exit.with_detail(NO_RESULT_DETAIL)));
            }
            WorkerEvent::Exit(exit) => return Err(ConversionError::lifecycle(exit)),
        }
    }
}

pub fn expect_pixels(output: ConversionOutput) -> Result<PixelBuffer, ConversionError> {
    let operation = output.operation();
    output
        .into_pixels()
        .ok_or_else(|| unexpected_output(ConversionOperation::Decode, operation))
}

pub fn expect_encoded(output: ConversionOutput) -> Result<EncodedImage, ConversionError> {
    let operation = output.operation();
    output
        .into_encoded()
        .ok_or_else(|| unexpected_output(ConversionOperation::Encode, operation))
}

fn unexpected_output(expected: ConversionOperation, got: ConversionOperation) -> ConversionError {
    ConversionError::transport(format!(
        "worker answered a {expected} request with {got} output"
    ))
}

#[async_trait::async_trait]
impl ConvertImageUseCase for ConversionService {
    async fn convert(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionOutput, ConversionError> {
        self.convert(request).await
    }
}

impl ConversionStatsQueryUseCase for ConversionService {
    fn stats(&self) -> ConversionStatsSnapshot {
        self.stats()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::ports::outgoing::worker_launcher::{LaunchError, WorkerHandle, WorkerLauncherPort};
    use domain::conversion::WorkerExit;
    use domain::image::ImageFormat;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Script = Box<dyn Fn(ConversionRequest) -> Result<Vec<WorkerEvent>, String> + Send + Sync>;

    struct ScriptedHandle {
        events: VecDeque<WorkerEvent>,
        reads: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl WorkerHandle for ScriptedHandle {
        async fn next_event(&mut self) -> Option<WorkerEvent> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.events.pop_front()
        }
    }

    struct ScriptedLauncher {
        script: Script,
        launches: AtomicUsize,
        reads: Arc<AtomicUsize>,
    }

    impl ScriptedLauncher {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                launches: AtomicUsize::new(0),
                reads: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    impl WorkerLauncherPort for ScriptedLauncher {
        fn launch(&self, request: ConversionRequest) -> Result<BoxedWorkerHandle, LaunchError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            let events = (self.script)(request).map_err(|message| LaunchError { message })?;
            Ok(Box::new(ScriptedHandle {
                events: events.into(),
                reads: Arc::clone(&self.reads),
            }))
        }
    }

    fn service_with<F>(script: F) -> (ConversionService, Arc<ScriptedLauncher>)
    where
        F: Fn(ConversionRequest) -> Result<Vec<WorkerEvent>, String> + Send + Sync + 'static,
    {
        let launcher = ScriptedLauncher::new(Box::new(script));
        let service = ConversionService::new(Arc::clone(&launcher) as DynWorkerLauncherPort);
        (service, launcher)
    }

    fn pixels(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::filled(width, height, [10, 20, 30, 255]).unwrap()
    }

    #[tokio::test]
    async fn success_message_resolves_the_call() {
        let (service, launcher) = service_with(|_| {
            Ok(vec![
                WorkerEvent::Online,
                WorkerEvent::Message(WorkerMessage::Success(ConversionOutput::Pixels(pixels(
                    4, 3,
                )))),
                WorkerEvent::Exit(WorkerExit::success()),
            ])
        });

        let decoded = service.decode(vec![1, 2, 3]).await.unwrap();

        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        assert_eq!(launcher.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn codec_failure_carries_message_verbatim() {
        let (service, _) = service_with(|_| {
            Ok(vec![
                WorkerEvent::Message(WorkerMessage::Failure {
                    message: "Input buffer is empty".to_string(),
                }),
                WorkerEvent::Exit(WorkerExit::success()),
            ])
        });

        let error = service
            .convert(ConversionRequest::decode(Vec::new()))
            .await
            .unwrap_err();

        assert_eq!(error, ConversionError::codec("Input buffer is empty"));
        assert_eq!(error.to_string(), "Input buffer is empty");
    }

    #[tokio::test]
    async fn transport_error_is_distinct_kind() {
        let (service, _) = service_with(|_| {
            Ok(vec![WorkerEvent::TransportError("broken pipe".to_string())])
        });

        let error = service
            .convert(ConversionRequest::decode(vec![1]))
            .await
            .unwrap_err();

        assert_eq!(error, ConversionError::transport("broken pipe"));
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn abnormal_exit_is_lifecycle_failure() {
        let (service, _) = service_with(|_| {
            Ok(vec![WorkerEvent::Exit(WorkerExit::with_code(Some(1)))])
        });

        let error = service
            .convert(ConversionRequest::decode(vec![1]))
            .await
            .unwrap_err();

        assert_eq!(
            error,
            ConversionError::lifecycle(WorkerExit::with_code(Some(1)))
        );
        assert_eq!(error.to_string(), "Worker stopped with exit code 1");
    }

    #[tokio::test]
    async fn clean_exit_without_message_is_not_dropped() {
        let (service, _) = service_with(|_| {
            Ok(vec![WorkerEvent::Exit(WorkerExit::success())])
        });

        let error = service
            .convert(ConversionRequest::decode(vec![1]))
            .await
            .unwrap_err();

        match error {
            ConversionError::Lifecycle { exit } => {
                assert_eq!(exit.code, Some(0));
                assert_eq!(exit.detail.as_deref(), Some(NO_RESULT_DETAIL));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_channel_is_transport_failure() {
        let (service, _) = service_with(|_| Ok(vec![WorkerEvent::Online]));

        let error = service
            .convert(ConversionRequest::decode(vec![1]))
            .await
            .unwrap_err();

        assert_eq!(error, ConversionError::transport(CHANNEL_CLOSED_MESSAGE));
    }

    #[tokio::test]
    async fn launch_failure_is_transport_failure() {
        let (service, _) = service_with(|_| Err("spawn refused".to_string()));

        let error = service
            .convert(ConversionRequest::decode(vec![1]))
            .await
            .unwrap_err();

        assert_eq!(error, ConversionError::transport("spawn refused"));
    }

    #[tokio::test]
    async fn events_after_first_terminal_are_ignored() {
        let (service, launcher) = service_with(|_| {
            Ok(vec![
                WorkerEvent::Message(WorkerMessage::Failure {
                    message: "bad data".to_string(),
                }),
                WorkerEvent::Exit(WorkerExit::with_code(Some(9))),
                WorkerEvent::TransportError("late".to_string()),
            ])
        });

        let error = service
            .convert(ConversionRequest::decode(vec![1]))
            .await
            .unwrap_err();

        assert_eq!(error, ConversionError::codec("bad data"));
        assert_eq!(launcher.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatched_output_is_rejected() {
        let (service, _) = service_with(|_| {
            Ok(vec![WorkerEvent::Message(WorkerMessage::Success(
                ConversionOutput::Pixels(pixels(1, 1)),
            ))])
        });

        let result = service
            .encode(pixels(1, 1), EncodeOptions::new(ImageFormat::Png))
            .await;

        match result {
            Err(AppError::Conversion(error)) => assert!(error.is_retryable()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn each_call_launches_its_own_unit() {
        let (service, launcher) = service_with(|request| {
            let len = request.payload_len() as u32;
            Ok(vec![WorkerEvent::Message(WorkerMessage::Success(
                ConversionOutput::Pixels(pixels(len, 1)),
            ))])
        });

        let (a, b) = tokio::join!(service.decode(vec![0; 2]), service.decode(vec![0; 5]));

        assert_eq!(a.unwrap().width(), 2);
        assert_eq!(b.unwrap().width(), 5);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stats_track_every_outcome_once() {
        let (service, _) = service_with(|request| {
            let event = match request.payload_len() {
                1 => WorkerEvent::Message(WorkerMessage::Success(ConversionOutput::Pixels(
                    pixels(1, 1),
                ))),
                2 => WorkerEvent::Message(WorkerMessage::Failure {
                    message: "bad".to_string(),
                }),
                3 => WorkerEvent::TransportError("gone".to_string()),
                _ => WorkerEvent::Exit(WorkerExit::with_code(Some(2))),
            };
            Ok(vec![event])
        });

        for len in 1..=4 {
            service
                .convert(ConversionRequest::decode(vec![0; len]))
                .await
                .ok();
        }

        let stats = service.stats();
        assert_eq!(stats.started, 4);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.codec_failures, 1);
        assert_eq!(stats.transport_failures, 1);
        assert_eq!(stats.lifecycle_failures, 1);
    }
}
