use std::env::{self, consts::EXE_SUFFIX};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use toon_adapters::outgoing::{
    filesystem::image_source_fs::{FsImageSourceAdapter, FsImageSourceConfig},
    image_rs::codec_image::{ImageCodecAdapter, ImageCodecConfig},
    tokio_spawn::conversion_timeout_tokio::TokioConversionTimeoutAdapter,
    worker_process::process_launcher::{ProcessWorkerConfig, ProcessWorkerLauncher},
    worker_thread::thread_launcher::ThreadWorkerLauncher,
};
use toon_adapters::shared::app_state::AppState as AdaptersAppState;
use toon_application::conversion::service::ConversionService;
use toon_application::delivery::service::ImageDeliveryService;
use toon_application::error::AppError;
use toon_application::infrastructure_config::{Config, WorkerIsolation};
use toon_application::ports::incoming::conversion::DynConvertImageUseCase;
use toon_application::ports::outgoing::{
    image_codec::DynImageCodecPort, image_source::DynImageSourcePort,
    worker_launcher::DynWorkerLauncherPort,
};

const WORKER_BINARY: &str = "codec-worker";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub conversion_service: Arc<ConversionService>,
    pub delivery_service: Arc<ImageDeliveryService>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let launcher = Self::create_worker_launcher(&config)?;
        let conversion_service = Arc::new(ConversionService::new(launcher));
        let converter = Self::create_converter(&config, &conversion_service);
        let delivery_service = Self::create_delivery_service(&config, converter);

        Ok(Self {
            config,
            conversion_service,
            delivery_service,
        })
    }

    fn create_worker_launcher(config: &Config) -> Result<DynWorkerLauncherPort, AppError> {
        match config.workers.isolation {
            WorkerIsolation::Thread => {
                let codec: DynImageCodecPort =
                    Arc::new(ImageCodecAdapter::new(codec_config(config)));
                Ok(Arc::new(ThreadWorkerLauncher::new(codec)))
            }
            WorkerIsolation::Process => {
                let program = resolve_worker_program(config)?;
                Ok(Arc::new(ProcessWorkerLauncher::new(ProcessWorkerConfig {
                    program,
                    args: config.workers.args.clone(),
                })))
            }
        }
    }

    fn create_converter(
        config: &Config,
        conversion_service: &Arc<ConversionService>,
    ) -> DynConvertImageUseCase {
        let converter: DynConvertImageUseCase = Arc::<ConversionService>::clone(conversion_service);

        match config.workers.conversion_timeout_ms {
            Some(ms) => Arc::new(TokioConversionTimeoutAdapter::new(
                converter,
                Duration::from_millis(ms),
            )),
            None => converter,
        }
    }

    fn create_delivery_service(
        config: &Config,
        converter: DynConvertImageUseCase,
    ) -> Arc<ImageDeliveryService> {
        let source: DynImageSourcePort = Arc::new(FsImageSourceAdapter::new(FsImageSourceConfig {
            root: PathBuf::from(&config.images.source_dir),
            max_bytes: config.images.max_source_bytes,
        }));
        Arc::new(ImageDeliveryService::new(source, converter))
    }

    pub fn to_adapters_state(self) -> AdaptersAppState {
        AdaptersAppState::new(self.config, self.delivery_service, self.conversion_service)
    }
}

/// Codec settings shared by the server and `codec-worker` processes.
pub fn codec_config(config: &Config) -> ImageCodecConfig {
    ImageCodecConfig {
        max_dimension: config.images.max_dimension,
        quality: config.images.encode_quality,
        avif_speed: config.images.avif_speed,
    }
}

/// Configured worker program, or `codec-worker` next to the running binary.
fn resolve_worker_program(config: &Config) -> Result<PathBuf, AppError> {
    if let Some(program) = &config.workers.program {
        return Ok(PathBuf::from(program));
    }

    let current = env::current_exe()?;
    let dir = current.parent().ok_or_else(|| AppError::ConfigError {
        message: format!("Cannot locate {WORKER_BINARY} next to {}", current.display()),
    })?;

    Ok(dir.join(format!("{WORKER_BINARY}{EXE_SUFFIX}")))
}
