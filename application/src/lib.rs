#[cfg(any(
    feature = "adapters",
    feature = "axum",
    feature = "image",
    feature = "tokio"
))]
compile_error!("application must not depend on adapters/framework crates");

pub mod conversion;
pub mod delivery;
pub mod error;
pub mod image_url;
pub mod infrastructure_config;
pub mod lazy_load;
pub mod ports;
