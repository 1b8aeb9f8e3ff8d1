use crate::types::Mask;
use anyhow::Result;
use image::{GrayImage, ImageBuffer, Rgb};
use std::fs;
use std::path::{Path, PathBuf};

/// Path-addressable content store for diagnostic rasters. Writes are keyed
/// by a caller-supplied or timestamp-derived string; keys have second
/// resolution, so collisions inside the same second are an accepted
/// limitation of the store, not something this layer papers over.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: &str) -> Result<Self> {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            dir: PathBuf::from(dir),
        })
    }

    /// A fresh wall-clock key, e.g. `20260806_142233`.
    pub fn timestamp_key() -> String {
        chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
    }

    pub fn write_mask(&self, key: &str, mask: &Mask) -> Result<PathBuf> {
        let pixels: Vec<u8> = mask.data().iter().map(|&v| if v != 0 { 255 } else { 0 }).collect();
        let img = GrayImage::from_raw(mask.width, mask.height, pixels)
            .ok_or_else(|| anyhow::anyhow!("mask dimensions do not match its buffer"))?;
        let path = self.dir.join(format!("{}_food_mask.png", key));
        img.save(&path)?;
        Ok(path)
    }

    pub fn write_overlay(
        &self,
        key: &str,
        overlay: &ImageBuffer<Rgb<u8>, Vec<u8>>,
    ) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}_overlay.jpg", key));
        overlay.save(&path)?;
        Ok(path)
    }

    pub fn write_annotation(
        &self,
        key: &str,
        annotated: &ImageBuffer<Rgb<u8>, Vec<u8>>,
    ) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}_annotated.jpg", key));
        annotated.save(&path)?;
        Ok(path)
    }
}
