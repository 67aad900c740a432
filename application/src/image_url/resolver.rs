use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::trace;
use url::Url;

use crate::error::{AppError, AppResult};
use domain::image_url::ImageUrlKey;

const IMAGES_PATH: &str = "/images/";

/// Memoizing `ImageUrlKey -> URL` table. Entries are never evicted or
/// replaced, so a key resolves to the same string for the resolver's lifetime.
#[derive(Debug)]
pub struct ImageUrlResolver {
    base: Url,
    cache: HashMap<ImageUrlKey, String>,
    computations: u64,
}

impl ImageUrlResolver {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base = Url::parse(base_url).map_err(|e| AppError::ConfigError {
            message: format!("Invalid image base URL '{base_url}': {e}"),
        })?;

        if base.cannot_be_a_base() {
            return Err(AppError::ConfigError {
                message: format!("Image base URL '{base_url}' cannot be a base"),
            });
        }

        Ok(Self {
            base,
            cache: HashMap::new(),
            computations: 0,
        })
    }

    pub fn resolve(&mut self, key: &ImageUrlKey) -> AppResult<&str> {
        match self.cache.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_str()),
            Entry::Vacant(entry) => {
                let url = build_image_url(&self.base, key)?;
                self.computations += 1;
                trace!("Resolved {} -> {}", key, url);
                Ok(entry.insert(url).as_str())
            }
        }
    }

    /// Number of URLs actually built, as opposed to served from the table.
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn build_image_url(base: &Url, key: &ImageUrlKey) -> AppResult<String> {
    let mut url = base.join(IMAGES_PATH).map_err(|e| AppError::ValidationError {
        message: format!("Failed to build image URL: {e}"),
    })?;

    url.path_segments_mut()
        .map_err(|()| AppError::ValidationError {
            message: "Image base URL has no path segments".to_string(),
        })?
        .pop_if_empty()
        .push(key.image_id.as_str());

    url.set_fragment(None);
    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("format", key.format.as_str());
        if let Some(width) = key.width {
            query.append_pair("width", &width.to_string());
        }
        if let Some(height) = key.height {
            query.append_pair("height", &height.to_string());
        }
    }

    Ok(url.into())
}
