use std::sync::Arc;

use toon_adapters::outgoing::http_reqwest::image_fetch_reqwest::ReqwestImageFetchAdapter;
use toon_application::error::AppResult;
use toon_application::infrastructure_config::Config;
use toon_application::lazy_load::loader::LazyImageLoader;
use toon_application::ports::outgoing::image_fetch::DynImageFetchPort;

/// Lazy loader for a page reader talking to `client.public_base_url`.
pub fn create_lazy_loader(config: &Config) -> AppResult<LazyImageLoader> {
    let fetcher: DynImageFetchPort = Arc::new(ReqwestImageFetchAdapter::default());
    LazyImageLoader::from_config(config, fetcher)
}
