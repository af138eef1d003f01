// SPDX-License-Identifier: MPL-2.0-only

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const NAME: &str = "slideshow-saver";
pub const CONFIG_FILE: &str = "config.ron";
/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "SLIDESHOW_SAVER_CONFIG";

/// Errors raised while reading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Which effect drives the slideshow.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Photos dropped onto a table, slightly rotated.
    #[default]
    TableDrop,
    /// Full-screen photos crawling away on a tilted plane.
    StarWars,
    /// Full-screen photos zooming in from a random point.
    RandomZoomIn,
    /// Photos of varying depth floating upwards with parallax.
    AppleTvLike,
    /// A square grid whose cells cross-fade one at a time.
    GridSwitch,
    /// Panels sliding their content in and out.
    PanelSlide,
    /// Pick one of the other modes once per session.
    Random,
}

impl Mode {
    /// All concrete modes, excluding [`Mode::Random`].
    pub const CONCRETE: [Mode; 6] = [
        Mode::TableDrop,
        Mode::StarWars,
        Mode::RandomZoomIn,
        Mode::AppleTvLike,
        Mode::GridSwitch,
        Mode::PanelSlide,
    ];
}

/// Where the assets come from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct SourceConfig {
    /// file or directory with images
    #[setters(into)]
    pub path: PathBuf,
    /// descend into sub directories
    pub recursive: bool,
    /// shuffle the asset list once before cycling
    pub random_order: bool,
    /// used when `path` yields no assets
    #[setters(strip_option, into)]
    pub fallback: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: dirs::picture_dir().unwrap_or_else(|| PathBuf::from("/usr/share/backgrounds/")),
            recursive: true,
            random_order: true,
            fallback: Some(PathBuf::from("/usr/share/backgrounds/")),
        }
    }
}

/// Prefetch cache tuning.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct CacheConfig {
    /// number of ready assets kept around
    pub size: usize,
    /// background worker tick
    pub poll_interval_ms: u64,
    /// ready assets required before one is consumed
    pub low_water_mark: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: 3,
            poll_interval_ms: 20,
            low_water_mark: 2,
        }
    }
}

/// Virtual canvas all effect geometry is computed in.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct Canvas {
    pub width: i32,
    pub height: i32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Canvas {
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Fast pacing used while priming and during redraw bursts.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct RecycleConfig {
    /// delay between two burst renders
    pub wait_ms: u64,
    /// divisor applied to effect durations
    pub speedup: u32,
}

impl Default for RecycleConfig {
    fn default() -> Self {
        Self {
            wait_ms: 0,
            speedup: 4,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct TableDropConfig {
    pub wait_ms: u64,
    pub min_width: i32,
    pub max_width: i32,
}

impl Default for TableDropConfig {
    fn default() -> Self {
        Self {
            wait_ms: 1500,
            min_width: 500,
            max_width: 700,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct StarWarsConfig {
    pub wait_ms: u64,
    pub slide_ms: u64,
}

impl Default for StarWarsConfig {
    fn default() -> Self {
        Self {
            wait_ms: 2800,
            slide_ms: 10_400,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct RandomZoomConfig {
    pub wait_ms: u64,
    pub effect_ms: u64,
}

impl Default for RandomZoomConfig {
    fn default() -> Self {
        Self {
            wait_ms: 2000,
            effect_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct AppleTvConfig {
    pub speed: f64,
    pub concurrency: f64,
}

impl Default for AppleTvConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            concurrency: 1.0,
        }
    }
}

impl AppleTvConfig {
    /// Time a full size image needs to cross the screen.
    #[must_use]
    pub fn max_time_ms(&self) -> f64 {
        15_000.0 / self.speed
    }

    #[must_use]
    pub fn wait_ms(&self) -> u64 {
        (4500.0 / self.concurrency / self.speed) as u64
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct GridSwitchConfig {
    pub wait_ms: u64,
    pub rows_columns: u32,
    pub effect_ms: u64,
    /// full redraw after this many complete grid rotations, 0 disables it
    pub redraw_every: u32,
}

impl Default for GridSwitchConfig {
    fn default() -> Self {
        Self {
            wait_ms: 1000,
            rows_columns: 4,
            effect_ms: 500,
            redraw_every: 3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct PanelSlideConfig {
    pub wait_ms: u64,
    pub effect_ms: u64,
    pub rows: u32,
    pub columns: u32,
    /// split the canvas recursively instead of using a grid
    pub random_layout: bool,
    /// number of panels for the random layout
    pub panel_count: u32,
    pub border: bool,
    pub labels: bool,
    /// append the capture date to labels
    pub show_date: bool,
    /// full redraw after this many complete panel rotations, 0 disables it
    pub redraw_every: u32,
}

impl Default for PanelSlideConfig {
    fn default() -> Self {
        Self {
            wait_ms: 3000,
            effect_ms: 800,
            rows: 2,
            columns: 3,
            random_layout: false,
            panel_count: 5,
            border: true,
            labels: false,
            show_date: false,
            redraw_every: 5,
        }
    }
}

impl PanelSlideConfig {
    #[must_use]
    pub fn panels(&self) -> u32 {
        if self.random_layout {
            self.panel_count
        } else {
            self.rows * self.columns
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Setters)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct Config {
    pub mode: Mode,
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub canvas: Canvas,
    pub recycle: RecycleConfig,
    pub table_drop: TableDropConfig,
    pub star_wars: StarWarsConfig,
    pub random_zoom: RandomZoomConfig,
    pub apple_tv: AppleTvConfig,
    pub grid_switch: GridSwitchConfig,
    pub panel_slide: PanelSlideConfig,
}

impl Config {
    /// Fallback in case the config file can't be loaded.
    pub fn fallback() -> Self {
        Self {
            source: SourceConfig {
                path: PathBuf::from("/usr/share/backgrounds/"),
                fallback: None,
                ..SourceConfig::default()
            },
            ..Self::default()
        }
    }

    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Fails if no configuration directory can be determined.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        dirs::config_dir()
            .map(|dir| dir.join(NAME).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the config from its default location.
    ///
    /// A missing file is not an error and yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but can't be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load the config from a RON file.
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the effects can't work with.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.size == 0 {
            return Err(ConfigError::invalid("cache.size", "must be at least 1"));
        }
        if self.cache.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "cache.poll_interval_ms",
                "must be positive",
            ));
        }
        if self.canvas.width <= 0 || self.canvas.height <= 0 {
            return Err(ConfigError::invalid(
                "canvas",
                format!("{}x{} is not a drawable area", self.canvas.width, self.canvas.height),
            ));
        }
        if self.recycle.speedup == 0 {
            return Err(ConfigError::invalid("recycle.speedup", "must be at least 1"));
        }

        let table = &self.table_drop;
        if table.min_width <= 0 || table.min_width > table.max_width {
            return Err(ConfigError::invalid(
                "table_drop.min_width",
                format!("{}..{} is not a valid width range", table.min_width, table.max_width),
            ));
        }
        if table.max_width > self.canvas.width {
            return Err(ConfigError::invalid(
                "table_drop.max_width",
                "wider than the canvas",
            ));
        }

        if !(self.apple_tv.speed > 0.0) {
            return Err(ConfigError::invalid("apple_tv.speed", "must be positive"));
        }
        if !(self.apple_tv.concurrency > 0.0) {
            return Err(ConfigError::invalid(
                "apple_tv.concurrency",
                "must be positive",
            ));
        }

        if self.grid_switch.rows_columns == 0 {
            return Err(ConfigError::invalid(
                "grid_switch.rows_columns",
                "must be at least 1",
            ));
        }

        let panel = &self.panel_slide;
        if panel.random_layout {
            if panel.panel_count == 0 {
                return Err(ConfigError::invalid(
                    "panel_slide.panel_count",
                    "must be at least 1",
                ));
            }
        } else if panel.rows == 0 || panel.columns == 0 {
            return Err(ConfigError::invalid(
                "panel_slide.rows",
                format!("{}x{} grid has no panels", panel.rows, panel.columns),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::fallback().validate().is_ok());
    }

    #[test]
    fn zero_grid_is_rejected() {
        let config = Config::default().grid_switch(GridSwitchConfig::default().rows_columns(0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "grid_switch.rows_columns",
                ..
            })
        ));
    }

    #[test]
    fn empty_panel_grid_is_rejected() {
        let config = Config::default().panel_slide(PanelSlideConfig::default().columns(0));
        assert!(config.validate().is_err());

        let random = Config::default().panel_slide(
            PanelSlideConfig::default()
                .columns(0)
                .random_layout(true)
                .panel_count(4),
        );
        assert!(random.validate().is_ok());
    }

    #[test]
    fn inverted_width_range_is_rejected() {
        let config = Config::default().table_drop(
            TableDropConfig::default()
                .min_width(800)
                .max_width(600),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_cache_is_rejected() {
        let config = Config::default().cache(CacheConfig::default().size(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let config: Config = ron::from_str(
            "(mode: GridSwitch, grid_switch: (rows_columns: 3), cache: (size: 5))",
        )
        .unwrap();

        assert_eq!(config.mode, Mode::GridSwitch);
        assert_eq!(config.grid_switch.rows_columns, 3);
        assert_eq!(config.grid_switch.wait_ms, 1000);
        assert_eq!(config.cache.size, 5);
        assert_eq!(config.cache.low_water_mark, 2);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ron::from_str::<Config>("(colour: 3)").is_err());
    }

    #[test]
    fn apple_tv_pacing() {
        let config = AppleTvConfig::default().speed(2.0).concurrency(0.5);
        assert_eq!(config.wait_ms(), 4500);
        assert!((config.max_time_ms() - 7500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn panel_count_follows_layout() {
        let grid = PanelSlideConfig::default().rows(2).columns(4);
        assert_eq!(grid.panels(), 8);
        assert_eq!(grid.random_layout(true).panel_count(7).panels(), 7);
    }
}
