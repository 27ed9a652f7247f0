// =============================================================================
// Engine Configuration — one explicit value object per analysis pass
// =============================================================================
//
// Every tunable the pipeline reads lives here; nothing is taken from ambient
// state. All fields carry `#[serde(default)]` so that a partial JSON file (or
// request body) fills the rest from defaults. Keys are camelCase on the wire
// (`bandMult2`, `signals.enableLrcCross`).
//
// Persistence uses the atomic tmp + rename pattern.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ValidationError;
use crate::indicators::lrc::CrossMode;
use crate::indicators::rvwap::VwapParams;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_length() -> usize {
    100
}

fn default_band_mult() -> f64 {
    2.0
}

fn default_band_mult2() -> f64 {
    2.0
}

fn default_band_mult3() -> f64 {
    3.0
}

fn default_vwap_window() -> usize {
    100
}

fn default_sma_length() -> usize {
    21
}

fn default_ema_length() -> usize {
    45
}

// =============================================================================
// SignalToggles
// =============================================================================

/// Independent on/off switch per detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalToggles {
    #[serde(default = "default_true")]
    pub enable_lrc_cross: bool,

    #[serde(default = "default_true")]
    pub enable_early: bool,

    #[serde(default = "default_true")]
    pub enable_strong: bool,

    #[serde(default = "default_true")]
    pub enable_super: bool,
}

impl Default for SignalToggles {
    fn default() -> Self {
        Self {
            enable_lrc_cross: true,
            enable_early: true,
            enable_strong: true,
            enable_super: true,
        }
    }
}

impl SignalToggles {
    pub fn none() -> Self {
        Self {
            enable_lrc_cross: false,
            enable_early: false,
            enable_strong: false,
            enable_super: false,
        }
    }

    pub fn any(&self) -> bool {
        self.enable_lrc_cross || self.enable_early || self.enable_strong || self.enable_super
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Full configuration of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    // --- Regression channel -------------------------------------------------

    /// Regression window (bars). Must be >= 2.
    #[serde(default = "default_length")]
    pub length: usize,

    /// LRC tier 1 multiplier.
    #[serde(default = "default_band_mult")]
    pub band_mult: f64,

    /// LRC tier 2 multiplier (EARLY / STRONG threshold).
    #[serde(default = "default_band_mult2")]
    pub band_mult2: f64,

    /// LRC tier 3 multiplier (SUPER threshold).
    #[serde(default = "default_band_mult3")]
    pub band_mult3: f64,

    // --- VWAP engine ---------------------------------------------------------

    /// RVWAP and hlc3 σ window. Must be >= 1.
    #[serde(default = "default_vwap_window")]
    pub vwap_window: usize,

    /// SMA of close drawn alongside the VWAP.
    #[serde(default = "default_sma_length")]
    pub sma_length: usize,

    /// EMA of close drawn alongside the VWAP.
    #[serde(default = "default_ema_length")]
    pub ema_length: usize,

    // --- Crossing rules ------------------------------------------------------

    /// Bypass the slope gate on midline crosses entirely.
    #[serde(default)]
    pub simple_mode: bool,

    /// Gate midline crosses on the regression slope (ignored in simple mode).
    #[serde(default)]
    pub use_slope_filter: bool,

    /// Report the midline shifted back by one bar of slope (display only).
    #[serde(default)]
    pub legacy_mid_offset: bool,

    // --- Detectors -----------------------------------------------------------

    #[serde(default)]
    pub signals: SignalToggles,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            band_mult: default_band_mult(),
            band_mult2: default_band_mult2(),
            band_mult3: default_band_mult3(),
            vwap_window: default_vwap_window(),
            sma_length: default_sma_length(),
            ema_length: default_ema_length(),
            simple_mode: false,
            use_slope_filter: false,
            legacy_mid_offset: false,
            signals: SignalToggles::default(),
        }
    }
}

impl EngineConfig {
    /// Boundary check, run before any computation.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.length < 2 {
            return Err(ValidationError::InvalidLength {
                length: self.length,
            });
        }
        if self.vwap_window < 1 {
            return Err(ValidationError::InvalidVwapWindow {
                window: self.vwap_window,
            });
        }
        for (name, value) in [("sma_length", self.sma_length), ("ema_length", self.ema_length)] {
            if value < 1 {
                return Err(ValidationError::InvalidAverageLength { name, value });
            }
        }
        for (name, value) in [
            ("band_mult", self.band_mult),
            ("band_mult2", self.band_mult2),
            ("band_mult3", self.band_mult3),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidMultiplier { name, value });
            }
        }
        Ok(())
    }

    /// LRC tier multipliers, tier 1 first.
    pub fn band_mults(&self) -> [f64; 3] {
        [self.band_mult, self.band_mult2, self.band_mult3]
    }

    /// Crossing rule implied by `simple_mode` / `use_slope_filter`.
    pub fn cross_mode(&self) -> CrossMode {
        if !self.simple_mode && self.use_slope_filter {
            CrossMode::SlopeFiltered
        } else {
            CrossMode::Simple
        }
    }

    pub fn vwap_params(&self) -> VwapParams {
        VwapParams {
            window: self.vwap_window,
            sma_length: self.sma_length,
            ema_length: self.ema_length,
        }
    }

    /// The single-rule legacy detector: plain midline crosses, nothing else.
    pub fn legacy_cross_only(length: usize) -> Self {
        Self {
            length,
            simple_mode: true,
            signals: SignalToggles {
                enable_lrc_cross: true,
                ..SignalToggles::none()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            length = config.length,
            vwap_window = config.vwap_window,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist to `path` using an atomic write (write `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise engine config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }
}
