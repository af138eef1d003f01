// SPDX-License-Identifier: MPL-2.0

//! Photo slideshow screensaver: a prefetch cache fed by a background worker,
//! a paced scheduler and a set of transition effects drawing onto a
//! [`RenderSurface`].

pub mod animation;
pub mod asset;
pub mod cache;
pub mod effect;
pub mod exit;
pub mod preprocess;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod surface;

pub use asset::{AssetRef, ReadyAsset};
pub use cache::{CacheStats, PrefetchCache};
pub use exit::ExitSignal;
pub use preprocess::{NormalizationError, OrientationNormalizer, Preprocess};
pub use scheduler::Scheduler;
pub use session::{Session, SessionError};
pub use source::{AssetSource, FallbackSource, FolderSource, ListSource};
pub use surface::{RenderSurface, SlotId, TraceSurface};
