//! Tunables for the range. Defaults reproduce the classic 800x400 layout.

use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;
use std::ops::RangeInclusive;

/// Everything the engine treats as a constant. Bounds that depend on the
/// canvas (target x/y limits, player anchor) are derived, not stored.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RangeConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Added to an arrow's vy after each position update (px / frame²).
    pub gravity: f64,
    /// Launch speed along the aim direction (px / frame).
    pub arrow_speed: f64,
    pub min_target_size: f64,
    pub max_target_size: f64,
    pub min_target_x: f64,
    /// Gap kept between the right edge and the furthest target x.
    pub target_right_margin: f64,
    pub min_target_y: f64,
    /// Gap kept between the bottom edge and the lowest target y.
    pub target_bottom_margin: f64,
    /// Radians per aim keypress.
    pub aim_step: f64,
    /// Aim is clamped to [-aim_limit, aim_limit].
    pub aim_limit: f64,
    pub player_x: f64,
    /// Player y measured up from the canvas bottom.
    pub player_bottom_offset: f64,
    /// x offset of the nocked arrow from the player anchor.
    pub nock_offset: f64,
    pub initial_target_size: f64,
    /// Every n-th hit snapshots and resets the timer.
    pub checkpoint_every: u32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 400.0,
            gravity: 0.3,
            arrow_speed: 20.0,
            min_target_size: 15.0,
            max_target_size: 30.0,
            min_target_x: 300.0,
            target_right_margin: 60.0,
            min_target_y: 100.0,
            target_bottom_margin: 50.0,
            aim_step: PI / 180.0 * 2.0,
            aim_limit: FRAC_PI_4,
            player_x: 50.0,
            player_bottom_offset: 50.0,
            nock_offset: 30.0,
            initial_target_size: 20.0,
            checkpoint_every: 5,
        }
    }
}

impl RangeConfig {
    pub fn target_x_range(&self) -> RangeInclusive<f64> {
        self.min_target_x..=self.canvas_width - self.target_right_margin
    }

    pub fn target_y_range(&self) -> RangeInclusive<f64> {
        self.min_target_y..=self.canvas_height - self.target_bottom_margin
    }

    pub fn target_size_range(&self) -> RangeInclusive<f64> {
        self.min_target_size..=self.max_target_size
    }

    pub fn player_origin(&self) -> (f64, f64) {
        (self.player_x, self.canvas_height - self.player_bottom_offset)
    }

    /// Target placement before the first hit: right edge, vertically centred.
    pub fn initial_target_origin(&self) -> (f64, f64) {
        (
            self.canvas_width - self.target_right_margin,
            self.canvas_height / 2.0,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(ConfigError::Canvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if self.target_x_range().is_empty() {
            return Err(ConfigError::EmptyRange("target x"));
        }
        if self.target_y_range().is_empty() {
            return Err(ConfigError::EmptyRange("target y"));
        }
        if self.min_target_size <= 0.0 || self.target_size_range().is_empty() {
            return Err(ConfigError::EmptyRange("target size"));
        }
        if !(self.arrow_speed > 0.0) {
            return Err(ConfigError::Negative("arrow_speed"));
        }
        if !(self.gravity >= 0.0) {
            return Err(ConfigError::Negative("gravity"));
        }
        if !(self.aim_step > 0.0 && self.aim_limit >= 0.0) {
            return Err(ConfigError::Negative("aim"));
        }
        if self.checkpoint_every == 0 {
            return Err(ConfigError::ZeroCheckpoint);
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON override and validate it.
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    Canvas { width: f64, height: f64 },
    EmptyRange(&'static str),
    Negative(&'static str),
    ZeroCheckpoint,
    #[cfg(feature = "serde_json")]
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Canvas { width, height } => {
                write!(f, "canvas must be non-empty, got {width}x{height}")
            }
            ConfigError::EmptyRange(what) => write!(f, "{what} range is empty"),
            ConfigError::Negative(what) => write!(f, "{what} must be positive"),
            ConfigError::ZeroCheckpoint => write!(f, "checkpoint_every must be at least 1"),
            #[cfg(feature = "serde_json")]
            ConfigError::Parse(msg) => write!(f, "invalid config json: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
