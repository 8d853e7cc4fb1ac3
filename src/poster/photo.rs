//! Resolving and loading the photo of a roster entry.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use image::DynamicImage;
use log::debug;
use wreq::Client;

use crate::poster::error::PosterError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoLocation {
    Remote(String),
    Local(PathBuf),
}

/// Rewrites a Google Drive share link into its direct download form.
///
/// `https://drive.google.com/file/d/<id>/view` becomes
/// `https://drive.google.com/uc?export=download&id=<id>`. Other URLs are
/// returned unchanged.
pub fn convert_drive_url(url: &str) -> String {
    if url.contains("drive.google.com")
        && let Some((_, rest)) = url.split_once("/d/")
    {
        let id = rest.split(['/', '?']).next().unwrap_or_default();
        return format!("https://drive.google.com/uc?export=download&id={id}");
    }
    url.to_string()
}

pub fn resolve(photo_ref: &str, photo_dir: Option<&Path>) -> PhotoLocation {
    let photo_ref = photo_ref.trim();
    if photo_ref.starts_with("http://") || photo_ref.starts_with("https://") {
        return PhotoLocation::Remote(convert_drive_url(photo_ref));
    }

    let path = Path::new(photo_ref);
    match photo_dir {
        Some(dir) if path.is_relative() => PhotoLocation::Local(dir.join(path)),
        _ => PhotoLocation::Local(path.to_path_buf()),
    }
}

#[derive(Clone)]
pub struct PhotoFetcher {
    client: Client,
    photo_dir: Option<PathBuf>,
}

impl PhotoFetcher {
    pub fn new(photo_dir: Option<PathBuf>) -> Result<Self, PosterError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, photo_dir })
    }

    pub async fn fetch(&self, photo_ref: &str) -> Result<DynamicImage, PosterError> {
        let bytes = match resolve(photo_ref, self.photo_dir.as_deref()) {
            PhotoLocation::Remote(url) => self.download(&url).await?,
            PhotoLocation::Local(path) => {
                tokio::fs::read(&path)
                    .await
                    .map_err(|source| PosterError::ReadFailed {
                        path: path.display().to_string(),
                        source,
                    })?
            }
        };
        Ok(image::load_from_memory(&bytes)?)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PosterError> {
        debug!("Downloading photo from {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PosterError::DownloadFailed {
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
