use serde::{Deserialize, Serialize};

/// Query of `GET /images/{image_id}`. `format` is parsed by the handler so an
/// unknown name maps to the domain error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageQuery {
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}
