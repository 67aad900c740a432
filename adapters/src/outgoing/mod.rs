pub mod filesystem;
pub mod http_reqwest;
pub mod image_rs;
pub mod tokio_spawn;
pub mod worker_process;
pub mod worker_thread;
