// SPDX-License-Identifier: MPL-2.0

//! Orientation normalization of assets before they count as ready.
//!
//! Cameras store rotation as EXIF metadata instead of rotating the pixels.
//! Render surfaces usually ignore that tag, so an image whose orientation is
//! not the identity is decoded, rotated, and written to a temporary copy:
//!
//! | Orientation tag | Action                                   |
//! |-----------------|------------------------------------------|
//! | missing / 1     | render the original file                 |
//! | unreadable      | render the original file                 |
//! | 2–8             | render a rotated PNG copy in the cache dir |
//!
//! Remote assets (URLs) are never touched.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageDecoder, ImageReader, metadata::Orientation};

use crate::asset::{AssetRef, ReadyAsset};

/// Cache sub directory for rotated copies.
const COPY_DIR: &str = "slideshow-saver/normalized";

/// The asset could not be turned into something renderable.
#[derive(Debug, thiserror::Error)]
pub enum NormalizationError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot create {path}: {source}")]
    CopyDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Turns an [`AssetRef`] into a [`ReadyAsset`].
pub trait Preprocess: Send {
    /// # Errors
    ///
    /// Fails if the asset can't be read; the caller skips it.
    fn normalize(&mut self, asset: &AssetRef) -> Result<ReadyAsset, NormalizationError>;
}

impl<F> Preprocess for F
where
    F: FnMut(&AssetRef) -> Result<ReadyAsset, NormalizationError> + Send,
{
    fn normalize(&mut self, asset: &AssetRef) -> Result<ReadyAsset, NormalizationError> {
        self(asset)
    }
}

/// Applies EXIF orientation to local images.
#[derive(Debug)]
pub struct OrientationNormalizer {
    copy_dir: PathBuf,
    copies: u64,
}

impl Default for OrientationNormalizer {
    fn default() -> Self {
        let cache = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(cache.join(COPY_DIR))
    }
}

impl OrientationNormalizer {
    /// Write rotated copies into `copy_dir`.
    pub fn new(copy_dir: impl Into<PathBuf>) -> Self {
        Self {
            copy_dir: copy_dir.into(),
            copies: 0,
        }
    }

    pub fn copy_dir(&self) -> &Path {
        &self.copy_dir
    }

    /// Unique file name per copy, so a copy being deleted by the consumer
    /// never collides with a fresh copy of the same asset.
    fn next_copy_path(&mut self, asset: &AssetRef) -> PathBuf {
        self.copies += 1;
        let stem: String = asset
            .file_stem()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.copy_dir
            .join(format!("{stem}-{}-{}.png", std::process::id(), self.copies))
    }

    /// Persist an already oriented image as the asset's temporary copy.
    fn write_copy(
        &mut self,
        asset: &AssetRef,
        image: &DynamicImage,
    ) -> Result<ReadyAsset, NormalizationError> {
        std::fs::create_dir_all(&self.copy_dir).map_err(|source| NormalizationError::CopyDir {
            path: self.copy_dir.clone(),
            source,
        })?;

        let copy = self.next_copy_path(asset);
        image
            .save_with_format(&copy, image::ImageFormat::Png)
            .map_err(|source| NormalizationError::Write {
                path: copy.clone(),
                source,
            })?;

        Ok(ReadyAsset::temporary(asset.clone(), copy))
    }
}

impl Preprocess for OrientationNormalizer {
    fn normalize(&mut self, asset: &AssetRef) -> Result<ReadyAsset, NormalizationError> {
        let Some(path) = asset.local_path() else {
            return Ok(ReadyAsset::unchanged(asset.clone()));
        };

        let open_error = |source| NormalizationError::Open {
            path: path.to_path_buf(),
            source,
        };
        let decode_error = |source| NormalizationError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let reader = ImageReader::open(path)
            .map_err(open_error)?
            .with_guessed_format()
            .map_err(open_error)?;
        let mut decoder = reader.into_decoder().map_err(decode_error)?;

        let orientation = decoder.orientation().unwrap_or_else(|why| {
            tracing::debug!(?why, path = %path.display(), "unreadable orientation, assuming none");
            Orientation::NoTransforms
        });

        if orientation == Orientation::NoTransforms {
            return Ok(ReadyAsset::unchanged(asset.clone()));
        }

        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
        image.apply_orientation(orientation);

        let ready = self.write_copy(asset, &image)?;
        tracing::debug!(
            ?orientation,
            path = %path.display(),
            copy = ready.content(),
            "normalized orientation"
        );
        Ok(ready)
    }
}
