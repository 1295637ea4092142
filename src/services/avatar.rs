use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};
use thiserror::Error;

use crate::config::AvatarConfig;

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("no image data")]
    Empty,

    #[error("unreadable image: {0}")]
    Decode(image::ImageError),

    #[error("could not encode avatar: {0}")]
    Encode(image::ImageError),

    #[error("encoded avatar is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("avatar worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Square-crop, re-encode as JPEG and wrap as a data URI.
///
/// The size cap applies to the final data URI, prefix included.
pub fn compress_avatar(bytes: &[u8], config: &AvatarConfig) -> Result<String, AvatarError> {
    if bytes.is_empty() {
        return Err(AvatarError::Empty);
    }

    let image = image::load_from_memory(bytes).map_err(AvatarError::Decode)?;
    let square = image
        .resize_to_fill(config.dimension, config.dimension, FilterType::Triangle)
        .to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, config.jpeg_quality)
        .encode_image(&square)
        .map_err(AvatarError::Encode)?;

    let data_uri = format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(&jpeg));
    if data_uri.len() > config.max_data_uri_bytes {
        return Err(AvatarError::TooLarge {
            size: data_uri.len(),
            limit: config.max_data_uri_bytes,
        });
    }

    Ok(data_uri)
}

/// `compress_avatar` on the blocking pool.
pub async fn ingest_avatar(bytes: Vec<u8>, config: AvatarConfig) -> Result<String, AvatarError> {
    tokio::task::spawn_blocking(move || compress_avatar(&bytes, &config)).await?
}
