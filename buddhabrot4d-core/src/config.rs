use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, Blend, VolumeSelection, VolumeTriple};
use crate::error::CoreError;
use crate::rotation::{wrap_angle, RotationMatrix};
use crate::view::{ViewRect, INITIAL_SIDE};

/// Escape-count thresholds for the three colour channels.
///
/// A trajectory that escaped after `n` steps feeds a channel iff
/// `n < threshold` for that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelThresholds {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ChannelThresholds {
    /// Iteration cap for the sampling pass: the largest threshold.
    pub fn global_cap(&self) -> u32 {
        self.red.max(self.green).max(self.blue)
    }
}

impl Default for ChannelThresholds {
    fn default() -> Self {
        Self {
            red: 5000,
            green: 500,
            blue: 50,
        }
    }
}

/// Named oversampling presets relative to the canvas-derived default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Low,
    #[default]
    Standard,
    High,
}

impl Density {
    pub fn oversampling(self, width: u32, height: u32) -> u32 {
        let full = BuddhabrotConfig::default_oversampling(width, height);
        let divisor = match self {
            Density::Low => 4,
            Density::Standard => 2,
            Density::High => 1,
        };
        (full / divisor).max(1)
    }
}

/// Every knob of the engine.
///
/// Deserialization fills missing fields from [`Default`], so partial JSON
/// settings files stay valid as fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuddhabrotConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,

    /// Each boundary pixel is sampled on an `oversampling²` grid. `None`
    /// derives it from the canvas size.
    pub oversampling: Option<u32>,

    pub thresholds: ChannelThresholds,

    /// Iteration cap of the boundary pre-pass (`histMaxN`).
    pub boundary_cap: u32,

    /// Smallest escape count that still contributes (`minN`).
    pub min_escape: u32,

    /// Multiplier applied after histogram equalization.
    pub brightness: f64,

    /// Per-channel count saturation ceiling.
    pub color_cap: u32,

    /// Longest stretch of work between two cooperative yields.
    pub yield_interval_ms: u64,

    /// Radians, wrapped to `[0, 2π)`.
    pub latitude: f64,
    /// Radians, wrapped to `[0, 2π)`.
    pub longitude: f64,

    pub blend: Blend,
    pub volume_a: VolumeTriple,
    pub volume_b: VolumeTriple,
}

impl BuddhabrotConfig {
    pub const DEFAULT_WIDTH: u32 = 800;
    pub const DEFAULT_HEIGHT: u32 = 800;
    pub const DEFAULT_YIELD_INTERVAL_MS: u64 = 100;

    /// Defaults for a given canvas size.
    pub fn for_canvas(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// `min(width, height) / (INITIAL_SIDE · 10)`, at least 1.
    pub fn default_oversampling(width: u32, height: u32) -> u32 {
        let min_dim = width.min(height) as f64;
        ((min_dim / (INITIAL_SIDE * 10.0)) as u32).max(1)
    }

    pub fn effective_oversampling(&self) -> u32 {
        self.oversampling
            .unwrap_or_else(|| Self::default_oversampling(self.width, self.height))
    }

    pub fn yield_interval(&self) -> Duration {
        Duration::from_millis(self.yield_interval_ms)
    }

    pub fn view(&self) -> crate::Result<ViewRect> {
        ViewRect::fit(self.width, self.height)
    }

    pub fn selection(&self) -> VolumeSelection {
        VolumeSelection {
            a: self.volume_a,
            b: self.volume_b,
            blend: self.blend,
        }
    }

    pub fn rotation(&self) -> RotationMatrix {
        RotationMatrix::from_angles(self.latitude, self.longitude)
    }

    /// Set both angles, wrapping them into `[0, 2π)`.
    pub fn set_angles(&mut self, latitude: f64, longitude: f64) {
        self.latitude = wrap_angle(latitude);
        self.longitude = wrap_angle(longitude);
    }

    /// Reject values that would break the engine. Repeated axes within a
    /// volume and blend factors outside `[0, 1]` are accepted.
    pub fn validate(&self) -> crate::Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        for (channel, value) in [
            ("red", self.thresholds.red),
            ("green", self.thresholds.green),
            ("blue", self.thresholds.blue),
        ] {
            if value == 0 {
                return Err(CoreError::InvalidThreshold { channel, value });
            }
        }
        if self.boundary_cap == 0 {
            return Err(CoreError::InvalidBoundaryCap(self.boundary_cap));
        }
        if let Some(0) = self.oversampling {
            return Err(CoreError::InvalidOversampling(0));
        }
        if self.color_cap == 0 {
            return Err(CoreError::InvalidColorCap(self.color_cap));
        }
        if !self.brightness.is_finite() || self.brightness < 0.0 {
            return Err(CoreError::InvalidBrightness(self.brightness));
        }
        Ok(())
    }
}

impl Default for BuddhabrotConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            oversampling: None,
            thresholds: ChannelThresholds::default(),
            boundary_cap: 5000,
            min_escape: 1,
            brightness: 3.0,
            color_cap: 15000,
            yield_interval_ms: Self::DEFAULT_YIELD_INTERVAL_MS,
            latitude: 0.0,
            longitude: 0.0,
            blend: Blend::ZERO,
            volume_a: VolumeTriple::new(Axis::Zr, Axis::Zi, Axis::Cr),
            volume_b: VolumeTriple::new(Axis::Cr, Axis::Ci, Axis::Zi),
        }
    }
}
