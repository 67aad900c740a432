pub mod conversion_timeout_tokio;
pub mod worker_channel;
