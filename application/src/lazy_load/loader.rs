use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument, warn};

use domain::image::{ImageFormat, ImageId, PixelBuffer};
use domain::image_url::ImageUrlKey;
use domain::paint::PaintSurface;
use domain::viewport::{IntersectionEntry, PlaceholderId, ViewportWatch, VisibilityThreshold};

use crate::{
    conversion::service::expect_pixels,
    error::{AppError, AppResult},
    image_url::resolver::ImageUrlResolver,
    infrastructure_config::Config,
    ports::{
        incoming::conversion::ConvertImageUseCase,
        outgoing::{
            image_codec::DECODABLE_FORMATS,
            image_fetch::{DynImageFetchPort, FetchFuture},
        },
    },
};
use domain::conversion::ConversionRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Waiting,
    Fetching,
    Loaded,
    Failed,
}

/// The single fetch issued for a placeholder. The owner drives `response`
/// and reports back through `on_loaded` or `on_failed`.
pub struct PendingFetch {
    pub placeholder: PlaceholderId,
    pub url: String,
    pub response: FetchFuture,
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("placeholder", &self.placeholder)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

struct Placeholder {
    image_id: ImageId,
    watch: Option<ViewportWatch>,
    phase: LoadPhase,
    surface: PaintSurface,
}

/// Viewport-driven page image loader. Owned by one client context and
/// mutated through `&mut self` only.
pub struct LazyImageLoader {
    resolver: ImageUrlResolver,
    fetcher: DynImageFetchPort,
    threshold: VisibilityThreshold,
    format: ImageFormat,
    placeholders: HashMap<PlaceholderId, Placeholder>,
    next_id: u64,
    fetches_issued: u64,
}

impl LazyImageLoader {
    #[must_use]
    pub fn new(
        resolver: ImageUrlResolver,
        fetcher: DynImageFetchPort,
        threshold: VisibilityThreshold,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            threshold,
            format: ImageFormat::Webp,
            placeholders: HashMap::new(),
            next_id: 0,
            fetches_issued: 0,
        }
    }

    /// Loader for the `client` section of the configuration.
    pub fn from_config(config: &Config, fetcher: DynImageFetchPort) -> AppResult<Self> {
        let resolver = ImageUrlResolver::new(&config.client.public_base_url)?;
        let threshold = config.visibility_threshold()?;
        Self::new(resolver, fetcher, threshold).with_format(config.client.image_format)
    }

    /// Fetched bodies are decoded locally, so only decodable formats are accepted.
    pub fn with_format(mut self, format: ImageFormat) -> AppResult<Self> {
        if !DECODABLE_FORMATS.contains(&format) {
            return Err(AppError::ValidationError {
                message: format!("Lazy loading cannot decode {format} images"),
            });
        }
        self.format = format;
        Ok(self)
    }

    /// Registers one watch for a newly rendered placeholder.
    pub fn observe(&mut self, image_id: ImageId) -> PlaceholderId {
        let id = PlaceholderId::new(self.next_id);
        self.next_id += 1;
        self.placeholders.insert(
            id,
            Placeholder {
                image_id,
                watch: Some(ViewportWatch::new(self.threshold)),
                phase: LoadPhase::Waiting,
                surface: PaintSurface::new(),
            },
        );
        id
    }

    /// Feeds one intersection observation. Returns the fetch the first time the
    /// placeholder meets the threshold; the watch is dropped at that point, so
    /// every later observation returns `None`.
    #[instrument(skip(self))]
    pub fn on_intersection(
        &mut self,
        id: PlaceholderId,
        entry: IntersectionEntry,
    ) -> AppResult<Option<PendingFetch>> {
        let Some(placeholder) = self.placeholders.get_mut(&id) else {
            debug!("Intersection for unobserved {}", id);
            return Ok(None);
        };

        let Some(watch) = placeholder.watch.as_mut() else {
            return Ok(None);
        };

        if !watch.observe(entry) {
            return Ok(None);
        }
        placeholder.watch = None;

        let key = ImageUrlKey::new(placeholder.image_id.clone()).with_format(self.format);
        let url = match self.resolver.resolve(&key) {
            Ok(url) => url.to_string(),
            Err(e) => {
                placeholder.phase = LoadPhase::Failed;
                return Err(e);
            }
        };

        placeholder.phase = LoadPhase::Fetching;
        self.fetches_issued += 1;
        debug!("Fetching {} for {}", url, id);

        Ok(Some(PendingFetch {
            placeholder: id,
            response: self.fetcher.fetch(&url),
            url,
        }))
    }

    /// Draws the loaded image onto the placeholder's surface at its natural size.
    pub fn on_loaded(&mut self, id: PlaceholderId, image: &PixelBuffer) -> AppResult<&PaintSurface> {
        let placeholder = self.placeholder_mut(id)?;
        placeholder.surface.draw(image);
        placeholder.phase = LoadPhase::Loaded;
        Ok(&placeholder.surface)
    }

    /// Awaits the fetch, decodes the body on a worker and paints the result.
    /// Failures are recorded on the placeholder and returned.
    pub async fn finish_fetch(
        &mut self,
        pending: PendingFetch,
        converter: &dyn ConvertImageUseCase,
    ) -> AppResult<(u32, u32)> {
        let id = pending.placeholder;

        let outcome = match pending.response.await {
            Ok(bytes) => converter
                .convert(ConversionRequest::decode(bytes))
                .await
                .and_then(expect_pixels)
                .map_err(AppError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(pixels) => Ok(self.on_loaded(id, &pixels)?.dimensions()),
            Err(e) => {
                self.on_failed(id, &e)?;
                Err(e)
            }
        }
    }

    pub fn on_failed(&mut self, id: PlaceholderId, error: &AppError) -> AppResult<()> {
        let placeholder = self.placeholder_mut(id)?;
        warn!("Image load failed for {}: {}", id, error);
        placeholder.phase = LoadPhase::Failed;
        Ok(())
    }

    /// Current surface for a redraw; never triggers a fetch.
    #[must_use]
    pub fn surface(&self, id: PlaceholderId) -> Option<&PaintSurface> {
        self.placeholders.get(&id).map(|p| &p.surface)
    }

    #[must_use]
    pub fn phase(&self, id: PlaceholderId) -> Option<LoadPhase> {
        self.placeholders.get(&id).map(|p| p.phase)
    }

    #[must_use]
    pub fn is_watching(&self, id: PlaceholderId) -> bool {
        self.placeholders
            .get(&id)
            .is_some_and(|p| p.watch.is_some())
    }

    /// Tears the placeholder down, watch included.
    pub fn disconnect(&mut self, id: PlaceholderId) -> bool {
        self.placeholders.remove(&id).is_some()
    }

    #[must_use]
    pub fn fetches_issued(&self) -> u64 {
        self.fetches_issued
    }

    #[must_use]
    pub fn resolver(&self) -> &ImageUrlResolver {
        &self.resolver
    }

    fn placeholder_mut(&mut self, id: PlaceholderId) -> AppResult<&mut Placeholder> {
        self.placeholders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound {
                message: format!("{id} is not observed"),
            })
    }
}
