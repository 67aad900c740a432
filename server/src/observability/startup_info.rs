use toon_application::infrastructure_config::{Config, WorkerIsolation};
use tracing::info;

pub fn print_api_info(config: &Config) {
    print_endpoint_info(config);
    print_configuration_info(config);
}

fn print_endpoint_info(config: &Config) {
    let base_url = format!("http://{}", config.server_address());
    info!("📋 Endpoints:");
    info!("  🖼️  Images: {}/images/{{image_id}}?format=&width=&height=", base_url);
    info!("  ❤️  Health: {}/health", base_url);
}

fn print_configuration_info(config: &Config) {
    info!("⚙️  Configuration:");
    info!(
        "  📁 Image sources: {} (max {} bytes)",
        config.images.source_dir, config.images.max_source_bytes
    );
    info!(
        "  🎨 Default format: {}, max dimension {}px",
        config.images.default_format, config.images.max_dimension
    );
    print_worker_configuration(config);
    info!(
        "  👀 Lazy loading: {} as {} at {:.0}% visibility",
        config.client.public_base_url,
        config.client.image_format,
        config.client.visibility_threshold * 100.0
    );
}

fn print_worker_configuration(config: &Config) {
    match config.workers.isolation {
        WorkerIsolation::Thread => info!("  🧵 Workers: one thread per conversion"),
        WorkerIsolation::Process => info!(
            "  🧩 Workers: one process per conversion ({})",
            config.workers.program.as_deref().unwrap_or("codec-worker")
        ),
    }

    match config.workers.conversion_timeout_ms {
        Some(ms) => info!("  ⏱️  Conversion timeout: {}ms", ms),
        None => info!("  ⏱️  Conversion timeout: DISABLED"),
    }
}
