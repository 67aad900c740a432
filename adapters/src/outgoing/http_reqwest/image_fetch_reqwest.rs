use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};

use toon_application::error::AppError;
use toon_application::ports::outgoing::image_fetch::{FetchFuture, ImageFetchPort};

/// Fetches rendered images over HTTP for the lazy loader.
#[derive(Clone, Default)]
pub struct ReqwestImageFetchAdapter {
    client: Client,
}

impl ReqwestImageFetchAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ImageFetchPort for ReqwestImageFetchAdapter {
    fn fetch(&self, url: &str) -> FetchFuture {
        let request = self.client.get(url);
        let url = url.to_string();

        Box::pin(fetch_bytes(request, url))
    }
}

#[instrument(skip(request))]
async fn fetch_bytes(
    request: RequestBuilder,
    url: String,
) -> Result<Vec<u8>, AppError> {
    let response = request.send().await.map_err(|e| AppError::FetchError {
        message: format!("Request to {} failed: {}", url, e),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::FetchError {
            message: format!("{} returned {}", url, status),
        });
    }

    let bytes = response.bytes().await.map_err(|e| AppError::FetchError {
        message: format!("Failed to read body from {}: {}", url, e),
    })?;

    debug!("Fetched {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
