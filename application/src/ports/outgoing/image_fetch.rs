use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::AppResult;

pub type FetchFuture = Pin<Box<dyn Future<Output = AppResult<Vec<u8>>> + Send + 'static>>;

pub trait ImageFetchPort: Send + Sync {
    fn fetch(&self, url: &str) -> FetchFuture;
}

pub type DynImageFetchPort = Arc<dyn ImageFetchPort>;
