// SPDX-License-Identifier: MPL-2.0

//! Asset sources: folders on disk, fixed lists, and fallbacks between them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::asset::AssetRef;

/// Extensions of images the render surface can display.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Produces the assets of one slideshow session.
pub trait AssetSource: Send {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// All assets in their natural order. An empty result is valid.
    fn enumerate(&self) -> Vec<AssetRef>;
}

/// Images found in a directory, or a single image file.
#[derive(Debug, Clone)]
pub struct FolderSource {
    root: PathBuf,
    recursive: bool,
}

impl FolderSource {
    pub fn new(root: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            root: root.into(),
            recursive,
        }
    }
}

impl AssetSource for FolderSource {
    fn describe(&self) -> String {
        format!("folder {}", self.root.display())
    }

    fn enumerate(&self) -> Vec<AssetRef> {
        let Ok(root) = self.root.canonicalize() else {
            tracing::warn!(path = %self.root.display(), "asset folder does not exist");
            return Vec::new();
        };

        let mut paths = Vec::new();
        if root.is_dir() {
            let walker = WalkDir::new(&root).follow_links(true);
            let walker = if self.recursive {
                walker
            } else {
                walker.max_depth(1)
            };

            for entry in walker.into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file() && is_image(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
        } else if root.is_file() && is_image(&root) {
            paths.push(root);
        }

        paths.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));

        let assets: Vec<_> = paths.iter().filter_map(|path| folder_asset(path)).collect();
        tracing::debug!(count = assets.len(), root = %self.root.display(), "enumerated folder");
        assets
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn folder_asset(path: &Path) -> Option<AssetRef> {
    let Some(id) = path.to_str() else {
        tracing::debug!(path = %path.display(), "skipping non UTF-8 path");
        return None;
    };

    let asset = AssetRef::new(id);
    let modified = path.metadata().and_then(|m| m.modified()).ok();
    Some(match modified {
        Some(time) => {
            let date: DateTime<Local> = time.into();
            asset.with_captured(date.format("%Y-%m-%d").to_string())
        }
        None => asset,
    })
}

/// A fixed list of assets, e.g. artwork URLs of a media library.
#[derive(Debug, Clone, Default)]
pub struct ListSource {
    assets: Vec<AssetRef>,
}

impl ListSource {
    pub fn new(assets: Vec<AssetRef>) -> Self {
        Self { assets }
    }
}

impl<S: Into<String>> FromIterator<S> for ListSource {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|id| AssetRef::new(Into::<String>::into(id)))
                .collect(),
        )
    }
}

impl AssetSource for ListSource {
    fn describe(&self) -> String {
        format!("list of {} assets", self.assets.len())
    }

    fn enumerate(&self) -> Vec<AssetRef> {
        self.assets.clone()
    }
}

/// Uses `secondary` when `primary` yields nothing.
pub struct FallbackSource {
    primary: Box<dyn AssetSource>,
    secondary: Box<dyn AssetSource>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn AssetSource>, secondary: Box<dyn AssetSource>) -> Self {
        Self { primary, secondary }
    }
}

impl AssetSource for FallbackSource {
    fn describe(&self) -> String {
        format!(
            "{} (falling back to {})",
            self.primary.describe(),
            self.secondary.describe()
        )
    }

    fn enumerate(&self) -> Vec<AssetRef> {
        let assets = self.primary.enumerate();
        if !assets.is_empty() {
            return assets;
        }

        tracing::warn!(
            primary = self.primary.describe(),
            fallback = self.secondary.describe(),
            "primary source is empty, using fallback"
        );
        self.secondary.enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "slideshow-source-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        dir
    }

    #[test]
    fn folder_filters_and_sorts() {
        let dir = scratch_dir("filter");
        for name in ["b.JPG", "a.png", "notes.txt", "nested/c.jpeg"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let flat = FolderSource::new(&dir, false).enumerate();
        let names: Vec<_> = flat.iter().map(AssetRef::file_stem).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(flat.iter().all(|a| a.captured().is_some()));

        let deep = FolderSource::new(&dir, true).enumerate();
        assert_eq!(deep.len(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_folder_is_empty() {
        let source = FolderSource::new("/definitely/not/here", true);
        assert!(source.enumerate().is_empty());
    }

    #[test]
    fn single_file_source() {
        let dir = scratch_dir("single");
        let file = dir.join("only.webp");
        std::fs::write(&file, b"").unwrap();

        assert_eq!(FolderSource::new(&file, false).enumerate().len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fallback_only_when_empty() {
        let primary: ListSource = ["a", "b"].into_iter().collect();
        let secondary: ListSource = ["z"].into_iter().collect();
        let source = FallbackSource::new(Box::new(primary), Box::new(secondary.clone()));
        assert_eq!(source.enumerate().len(), 2);

        let source = FallbackSource::new(Box::new(ListSource::default()), Box::new(secondary));
        assert_eq!(source.enumerate(), vec![AssetRef::new("z")]);
    }
}
