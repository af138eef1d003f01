// SPDX-License-Identifier: MPL-2.0

//! Asset identities and the fixed replay order they are shown in.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// An image to show, identified by a path or URL.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AssetRef {
    id: Arc<str>,
    captured: Option<Arc<str>>,
}

impl AssetRef {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            captured: None,
        }
    }

    /// Attach the date the image was taken.
    #[must_use]
    pub fn with_captured(mut self, captured: impl Into<Arc<str>>) -> Self {
        self.captured = Some(captured.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn captured(&self) -> Option<&str> {
        self.captured.as_deref()
    }

    /// The local file behind this asset, if it is not a remote URL.
    pub fn local_path(&self) -> Option<&Path> {
        if let Some(path) = self.id.strip_prefix("file://") {
            return Some(Path::new(path));
        }
        if self.id.contains("://") {
            return None;
        }
        Some(Path::new(&*self.id))
    }

    /// File name without directories, used for labels.
    pub fn file_stem(&self) -> &str {
        let trimmed = self.id.trim_end_matches('/');
        let name = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }
}

impl fmt::Debug for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.captured {
            Some(captured) => write!(f, "AssetRef({:?} @ {captured})", self.id),
            None => write!(f, "AssetRef({:?})", self.id),
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// An asset that can be handed to the renderer right away.
///
/// If normalization produced a temporary copy, the copy belongs to the cache
/// entry holding this value until the scheduler calls [`ReadyAsset::discard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyAsset {
    asset: AssetRef,
    content: String,
    temporary: Option<PathBuf>,
}

impl ReadyAsset {
    /// The asset needs no preparation, render its own identifier.
    pub fn unchanged(asset: AssetRef) -> Self {
        Self {
            content: asset.id().to_owned(),
            asset,
            temporary: None,
        }
    }

    /// The asset is rendered from a temporary copy owned by this value.
    pub fn temporary(asset: AssetRef, copy: PathBuf) -> Self {
        Self {
            content: copy.to_string_lossy().into_owned(),
            asset,
            temporary: Some(copy),
        }
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// What the render surface is asked to display.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn temporary_path(&self) -> Option<&Path> {
        self.temporary.as_deref()
    }

    /// Whether the temporary copy disappeared since it was prepared.
    pub fn is_stale(&self) -> bool {
        self.temporary.as_deref().is_some_and(|copy| !copy.exists())
    }

    /// Delete the temporary copy, if any. Failures are only logged.
    pub fn discard(self) {
        let Some(copy) = self.temporary else {
            return;
        };

        match std::fs::remove_file(&copy) {
            Ok(()) => tracing::trace!(path = %copy.display(), "removed temporary copy"),
            Err(why) if why.kind() == std::io::ErrorKind::NotFound => {}
            Err(why) => {
                tracing::warn!(?why, path = %copy.display(), "could not remove temporary copy");
            }
        }
    }
}

/// Endless replay of a fixed asset order.
///
/// The order is established once; every pass repeats it exactly.
#[derive(Debug, Clone)]
pub struct AssetCycle {
    assets: Arc<[AssetRef]>,
    position: usize,
}

impl AssetCycle {
    pub fn new(assets: impl Into<Arc<[AssetRef]>>) -> Self {
        Self {
            assets: assets.into(),
            position: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Iterator for AssetCycle {
    type Item = AssetRef;

    fn next(&mut self) -> Option<AssetRef> {
        if self.assets.is_empty() {
            return None;
        }

        let asset = self.assets[self.position].clone();
        self.position = (self.position + 1) % self.assets.len();
        Some(asset)
    }
}
