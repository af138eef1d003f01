// SPDX-License-Identifier: MPL-2.0

//! One slideshow from first frame to teardown.

use rand::seq::SliceRandom;
use slideshow_saver_config::{Config, ConfigError};

use crate::animation::Descriptor;
use crate::cache::PrefetchCache;
use crate::effect::{self, Effect, EffectContext};
use crate::exit::ExitSignal;
use crate::preprocess::Preprocess;
use crate::scheduler::Scheduler;
use crate::source::AssetSource;
use crate::surface::{RenderSurface, SlotId};

/// Spinner shown until the first image is on its way.
pub const LOADING_IMAGE: &str = "loading.gif";
pub const LOADING_SIZE: i32 = 128;

const LOADING_FADE_MS: u64 = 500;
const BACKGROUND_FADE_MS: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no assets found in {0}")]
    NoAssets(String),
    #[error("failed to spawn the prefetch worker")]
    Worker(#[source] std::io::Error),
    #[error("session was not started")]
    NotStarted,
}

/// Slots that live for the whole session, behind every effect slot.
#[derive(Debug, Clone, Copy)]
struct GlobalSlots {
    background: SlotId,
    loading: SlotId,
}

impl GlobalSlots {
    fn create(surface: &mut dyn RenderSurface, context: &EffectContext) -> Self {
        let slots = surface.add_slots(2);
        let (background, loading) = (slots[0], slots[1]);
        let screen = context.screen();

        surface.set_position(background, screen.x, screen.y);
        surface.set_size(background, screen.width, screen.height);
        surface.set_visible(background, true);

        surface.set_position(
            loading,
            screen.x + (screen.width - LOADING_SIZE) / 2,
            screen.y + (screen.height - LOADING_SIZE) / 2,
        );
        surface.set_size(loading, LOADING_SIZE, LOADING_SIZE);
        surface.set_image(loading, LOADING_IMAGE);
        surface.set_visible(loading, true);

        Self {
            background,
            loading,
        }
    }

    fn hide_loading(&self, surface: &mut dyn RenderSurface, background: &str) {
        surface.set_animation(
            self.loading,
            &[Descriptor::fade(100.0, 0.0, LOADING_FADE_MS).now()],
        );
        surface.set_animation(
            self.background,
            &[Descriptor::fade(0.0, 100.0, BACKGROUND_FADE_MS)
                .delay(LOADING_FADE_MS)
                .now()],
        );
        surface.set_image(self.background, background);
    }

    fn remove(self, surface: &mut dyn RenderSurface) {
        surface.remove_slots(&[self.background, self.loading]);
    }
}

/// Owns the effect, the cache and the surface of one slideshow.
///
/// `start`, `run` and `close` are called in that order. `close` may follow a
/// failed `start`.
pub struct Session<S: RenderSurface> {
    config: Config,
    surface: S,
    exit: ExitSignal,
    context: EffectContext,
    globals: Option<GlobalSlots>,
    effect: Option<Box<dyn Effect>>,
    cache: Option<PrefetchCache>,
}

impl<S: RenderSurface> Session<S> {
    pub fn new(config: Config, surface: S, exit: ExitSignal) -> Self {
        let context = EffectContext::new(config.canvas, config.recycle);
        Self {
            config,
            surface,
            exit,
            context,
            globals: None,
            effect: None,
            cache: None,
        }
    }

    /// Enumerate the source, pick the effect, create every slot and start
    /// prefetching.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, an empty source or when the worker
    /// thread can't be spawned.
    pub fn start(
        &mut self,
        source: &dyn AssetSource,
        preprocessor: impl Preprocess + 'static,
    ) -> Result<(), SessionError> {
        self.config.validate()?;

        let mut rng = rand::rng();
        let mut assets = source.enumerate();
        if assets.is_empty() {
            return Err(SessionError::NoAssets(source.describe()));
        }
        if self.config.source.random_order {
            assets.shuffle(&mut rng);
        }
        tracing::info!(count = assets.len(), source = source.describe(), "assets ready");

        self.globals = Some(GlobalSlots::create(&mut self.surface, &self.context));

        let mut effect = effect::build(self.config.mode, &self.config, &mut rng);
        effect.setup(&mut self.surface, &self.context);
        self.effect = Some(effect);

        let cache = self
            .cache
            .insert(PrefetchCache::new(&self.config.cache, assets, preprocessor));
        cache.start().map_err(SessionError::Worker)
    }

    /// Play until the exit signal is raised. Returns the number of renders.
    ///
    /// # Errors
    ///
    /// Fails if [`Session::start`] didn't succeed.
    pub fn run(&mut self) -> Result<u64, SessionError> {
        let (Some(globals), Some(effect), Some(cache)) =
            (self.globals, self.effect.as_deref_mut(), self.cache.as_ref())
        else {
            return Err(SessionError::NotStarted);
        };

        globals.hide_loading(&mut self.surface, effect.background());

        let mut scheduler = Scheduler::new(
            cache,
            effect,
            &mut self.surface,
            &self.context,
            self.exit.clone(),
            self.config.cache.low_water_mark,
        );
        Ok(scheduler.run())
    }

    /// Stop the worker, delete leftover copies and remove every slot.
    pub fn close(mut self) -> S {
        if let Some(cache) = self.cache.take() {
            cache.join();
            let discarded = cache.drain();
            tracing::debug!(discarded, "prefetch cache drained");
        }
        if let Some(mut effect) = self.effect.take() {
            effect.teardown(&mut self.surface);
        }
        if let Some(globals) = self.globals.take() {
            globals.remove(&mut self.surface);
        }
        self.surface
    }
}
