use std::error::Error;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, error};

use toon_adapters::outgoing::image_rs::codec_image::ImageCodecAdapter;
use toon_adapters::outgoing::worker_process::child::{ChildWorkerError, run_codec_worker};
use toon_server::bootstrap::state::codec_config;
use toon_server::config_loader;
use toon_server::observability;

const PROTOCOL_FAILURE: u8 = 2;
const LIFECYCLE_FAILURE: u8 = 3;

fn main() -> Result<ExitCode, Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let config = config_loader::read_config()?;
    observability::tracing::setup_worker_logging(&config)?;

    let codec = Arc::new(ImageCodecAdapter::new(codec_config(&config)));

    let result = run_codec_worker(codec, &mut io::stdin().lock(), &mut io::stdout().lock());

    Ok(match result {
        Ok(state) => {
            debug!("Worker finished in state {:?}", state);
            ExitCode::SUCCESS
        }
        Err(e @ (ChildWorkerError::Io(_) | ChildWorkerError::Wire(_))) => {
            error!("{}", e);
            ExitCode::from(PROTOCOL_FAILURE)
        }
        Err(e @ ChildWorkerError::Lifecycle(_)) => {
            error!("{}", e);
            ExitCode::from(LIFECYCLE_FAILURE)
        }
    })
}
