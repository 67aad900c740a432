pub mod image_codec;
pub mod image_fetch;
pub mod image_source;
pub mod worker_launcher;
