pub mod conversion;
pub mod error;
pub mod image;
pub mod image_url;
pub mod paint;
pub mod viewport;
