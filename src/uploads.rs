use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use image::ImageFormat;
use rand::Rng;
use tracing::{debug, warn};

use crate::appresult::FieldError;

/// Multipart field name carrying the photo.
pub const PHOTO_FIELD: &str = "profilePhoto";
/// Where stored photos are served from.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Default)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl PhotoKind {
    /// Looks at the magic bytes only; the declared content type and file
    /// name are not trusted.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: Arc<PathBuf>,
    max_bytes: usize,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: Arc::new(dir.into()),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.dir.as_path()).await
    }

    pub fn check(&self, upload: &PhotoUpload) -> Result<PhotoKind, FieldError> {
        if upload.bytes.len() > self.max_bytes {
            return Err(FieldError::new(
                PHOTO_FIELD,
                format!("must be at most {} bytes", self.max_bytes),
            ));
        }

        PhotoKind::sniff(&upload.bytes).ok_or_else(|| {
            debug!(
                "rejected upload {:?} declared as {:?}",
                upload.file_name, upload.content_type
            );
            FieldError::new(PHOTO_FIELD, "must be a PNG, JPEG, GIF or WebP image")
        })
    }

    /// Writes the photo and returns the public path recorded on the profile.
    pub async fn save(&self, bytes: &[u8], kind: PhotoKind) -> std::io::Result<String> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let file_name = format!("{PHOTO_FIELD}-{millis}-{suffix}.{}", kind.extension());

        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        debug!("stored photo {file_name} ({} bytes)", bytes.len());

        Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
    }

    /// Best effort; a photo left behind is only wasted disk.
    pub async fn discard(&self, public_path: &str) {
        let Some(file_name) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .map(|p| p.trim_start_matches('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
        else {
            return;
        };

        if let Err(e) = tokio::fs::remove_file(self.dir.join(file_name)).await {
            warn!("could not remove photo {file_name}: {e}");
        }
    }
}
