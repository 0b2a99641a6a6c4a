/*
    spotify-rainbow-rs | Rust CLI tool to sort playlists into rainbow order.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use async_trait::async_trait;
use image::RgbaImage;
use log::debug;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageSourceError {
    #[error("Image request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Image request returned HTTP {0}")]
    Status(u16),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Anything that can turn an artwork URL into decoded RGBA pixels.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RgbaImage, ImageSourceError>;
}

/// Downloads artwork over HTTP and decodes it with the `image` crate.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self, ImageSourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<RgbaImage, ImageSourceError> {
        debug!("Fetching artwork {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ImageSourceError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        let image = image::load_from_memory(&bytes)?;
        Ok(image.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ImageSourceError::Status(404).to_string(),
            "Image request returned HTTP 404"
        );

        let decode = image::load_from_memory(b"definitely not an image").unwrap_err();
        let err = ImageSourceError::from(decode);
        assert!(err.to_string().starts_with("Failed to decode image"));
    }

    #[test]
    fn test_http_source_builds() {
        assert!(HttpImageSource::new().is_ok());
    }
}
