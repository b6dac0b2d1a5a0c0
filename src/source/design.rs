/// Design image loading
///
/// Decodes the file the user picked or dropped into an RGBA bitmap
/// for the stage.
use std::fs;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, info};

use crate::error::{OverlayError, Result};
use crate::state::ImageRef;

/// Decoded RGBA pixels plus their dimensions
pub(crate) struct Decoded {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode an encoded image buffer to RGBA8
pub(crate) fn decode_rgba(bytes: &[u8]) -> Result<Decoded> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Decoded {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Open the native file chooser for a single file of any type.
///
/// Resolves to `None` when the user cancels. The future stays pending
/// for as long as the dialog is open.
pub async fn pick_design_file() -> Option<PathBuf> {
    let handle = rfd::AsyncFileDialog::new()
        .set_title("Choose a design image")
        .pick_file()
        .await?;
    let path = handle.path().to_path_buf();
    debug!(path = %path.display(), "file chosen");
    Some(path)
}

/// Load a design image from disk
///
/// Decoding is CPU-bound, so it runs on a blocking worker.
pub async fn load_design(path: PathBuf) -> Result<ImageRef> {
    task::spawn_blocking(move || load_design_blocking(&path)).await?
}

/// Blocking version of design loading
fn load_design_blocking(path: &Path) -> Result<ImageRef> {
    let bytes = fs::read(path).map_err(|e| OverlayError::io(path, e))?;
    let decoded = decode_rgba(&bytes)?;

    info!(
        path = %path.display(),
        width = decoded.width,
        height = decoded.height,
        "decoded design image"
    );

    Ok(ImageRef::from_rgba(
        path.to_path_buf(),
        decoded.width,
        decoded.height,
        decoded.pixels,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_design_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mock.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let image = load_design(path.clone()).await.unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.path, path);
    }

    #[tokio::test]
    async fn test_load_design_missing_file() {
        let result = load_design("/nonexistent/path.png".into()).await;
        assert!(matches!(result, Err(OverlayError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_design_not_an_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.png");
        fs::write(&path, b"plain text").unwrap();

        let result = load_design(path).await;
        assert!(matches!(result, Err(OverlayError::Decode(_))));
    }
}
