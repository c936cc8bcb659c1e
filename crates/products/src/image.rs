use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use showcase_core::{ImageId, ProductId};

/// An uploaded gallery image. Ownership follows the parent product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

const DEFAULT_EXTENSION: &str = "png";

/// Storage filename for one image record:
/// `{product_id}_{YYYYmmddHHMMSS}_{image_id}.{ext}`.
///
/// The image id makes the name unique per record, so uploads landing in the
/// same second never share a file.
///
/// The extension is taken from the client filename when it is short and
/// alphanumeric; anything else falls back to `png`. No client-supplied path
/// component ever reaches the result.
pub fn image_filename(
    product_id: ProductId,
    at: DateTime<Utc>,
    image_id: ImageId,
    client_filename: Option<&str>,
) -> String {
    let ext = client_filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    format!("{}_{}_{}.{}", product_id, at.format("%Y%m%d%H%M%S"), image_id, ext)
}
