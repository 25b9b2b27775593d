//! Exporting images for external viewing.
//!
//! The terminal does not render pixels; instead the full image is exported
//! to a temp file and handed to the system viewer.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tracing::debug;

use crate::domain::entities::ImageMeta;
use crate::domain::ports::CatalogPort;

/// Fetches full images and opens them with the system viewer.
pub struct ImageViewer {
    catalog: Arc<dyn CatalogPort>,
}

impl ImageViewer {
    /// Creates a viewer over the catalog port.
    #[must_use]
    pub const fn new(catalog: Arc<dyn CatalogPort>) -> Self {
        Self { catalog }
    }

    /// Downloads `image` into the export directory and opens it.
    ///
    /// The extension is taken from the server-side storage path so the
    /// viewer recognizes the format.
    ///
    /// # Errors
    /// Returns an error when the download, the write, or the viewer launch
    /// fails.
    pub async fn open(&self, image: &ImageMeta) -> Result<PathBuf> {
        let bytes = self
            .catalog
            .full_image(&image.id)
            .await
            .wrap_err("failed to download image")?;
        let ext = image.extension().unwrap_or("png").to_owned();
        self.export_and_launch(&format!("{}.{ext}", image.id), &bytes).await
    }

    /// Like [`Self::open`], but with the server-generated thumbnail, which
    /// keeps the source format at a fraction of the transfer.
    ///
    /// # Errors
    /// Returns an error when the download, the write, or the viewer launch
    /// fails.
    pub async fn open_thumbnail(&self, image: &ImageMeta) -> Result<PathBuf> {
        let bytes = self
            .catalog
            .thumbnail(&image.id)
            .await
            .wrap_err("failed to download thumbnail")?;
        let ext = image.extension().unwrap_or("png").to_owned();
        self.export_and_launch(&format!("{}-thumb.{ext}", image.id), &bytes).await
    }

    async fn export_and_launch(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let export_dir = std::env::temp_dir().join("pictor").join("view");
        tokio::fs::create_dir_all(&export_dir)
            .await
            .wrap_err("failed to create export directory")?;

        let path = export_dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .wrap_err("failed to write export file")?;

        debug!(path = %path.display(), "opening image in external viewer");
        opener::open(&path).wrap_err("failed to launch image viewer")?;

        Ok(path)
    }
}
