//! Temporary PNG copies of the icon image.
//!
//! Some native services only accept an image by path. [`FsIcon`] keeps at
//! most one such file alive: the previous file is removed before a new one
//! is written, and the last one is removed on drop. Removal failures are
//! logged and otherwise ignored.

use crate::error::Result;
use image::{ImageFormat, RgbaImage};
use log::debug;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};

pub struct FsIcon {
    dir: Option<PathBuf>,
    current: Option<TempPath>,
}

impl FsIcon {
    /// Creates files in `dir`, or the system temporary directory if `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir, current: None }
    }

    /// Path of the current file, if one has been written.
    pub fn path(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Removes the current file and writes `image` to a fresh one.
    pub fn update(&mut self, image: &RgbaImage) -> Result<&Path> {
        self.remove();

        let mut builder = Builder::new();
        builder.prefix("systray-").suffix(".png");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        image.write_to(&mut file, ImageFormat::Png)?;

        let path: &Path = self.current.insert(file.into_temp_path());
        debug!("Wrote icon file {}", path.display());
        Ok(path)
    }

    /// Removes the current file, if any.
    pub fn remove(&mut self) {
        if let Some(path) = self.current.take() {
            let display = path.display().to_string();
            if let Err(e) = path.close() {
                debug!("Failed to remove icon file {display}: {e}");
            }
        }
    }
}

impl Drop for FsIcon {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::fs;

    fn png_count(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "png"))
            .count()
    }

    #[test]
    fn keeps_at_most_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut icon = FsIcon::new(Some(dir.path().to_path_buf()));
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        let first = icon.update(&red).unwrap().to_path_buf();
        assert_eq!(png_count(dir.path()), 1);

        let second = icon.update(&blue).unwrap().to_path_buf();
        assert_eq!(png_count(dir.path()), 1);
        assert_ne!(first, second);
        assert!(!first.exists());
        assert!(second.exists());
    }

    #[test]
    fn written_file_is_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut icon = FsIcon::new(Some(dir.path().to_path_buf()));
        let image = RgbaImage::from_pixel(2, 3, Rgba([1, 2, 3, 4]));

        let path = icon.update(&image).unwrap().to_path_buf();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut icon = FsIcon::new(Some(dir.path().to_path_buf()));
            let image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
            icon.update(&image).unwrap().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(png_count(dir.path()), 0);
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut icon = FsIcon::new(Some(dir.path().to_path_buf()));
        let image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let path = icon.update(&image).unwrap().to_path_buf();

        fs::remove_file(&path).unwrap();
        icon.remove();
        assert!(icon.path().is_none());
    }
}
