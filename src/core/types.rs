use serde::{Deserialize, Serialize};

use crate::core::window::{gamma, WindowType};
use crate::error::PhaseError;

/// Per-bin status during one heap integration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinState {
    /// Below tolerance (or not reached); excluded from propagation.
    #[default]
    Unknown,
    /// Eligible for propagation, phase not yet assigned.
    AboveTol,
    /// Phase finalized for this pass.
    Done,
}

/// Parameters of a phase reconstruction stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtPghiParams {
    /// Window spread constant `γ` (see [`crate::core::window::gamma`]).
    pub gamma: f64,
    /// Number of independent channels (default: 1).
    #[serde(default = "RtPghiParams::default_channels")]
    pub channels: usize,
    /// Hop size `a` in samples.
    pub hop_size: usize,
    /// Transform size `M`; frames carry `M / 2 + 1` bins.
    pub transform_size: usize,
    /// Bins with magnitude at or below this value get no propagated phase
    /// (default: 1e-10).
    #[serde(default = "RtPghiParams::default_tolerance")]
    pub tolerance: f64,
    /// Causal (zero look-ahead) mode (default: true).
    #[serde(default = "RtPghiParams::default_causal")]
    pub causal: bool,
    /// Seed for the random-phase pool. `None` draws from OS entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Random-phase pool length in units of `channels * (M / 2 + 1)`
    /// (default: 10).
    #[serde(default = "RtPghiParams::default_random_pool_factor")]
    pub random_pool_factor: usize,
}

impl RtPghiParams {
    fn default_channels() -> usize {
        1
    }
    fn default_tolerance() -> f64 {
        1e-10
    }
    fn default_causal() -> bool {
        true
    }
    fn default_random_pool_factor() -> usize {
        10
    }

    /// Creates parameters with the given `γ`, hop size and transform size.
    pub fn new(gamma: f64, hop_size: usize, transform_size: usize) -> Self {
        Self {
            gamma,
            channels: Self::default_channels(),
            hop_size,
            transform_size,
            tolerance: Self::default_tolerance(),
            causal: Self::default_causal(),
            random_seed: None,
            random_pool_factor: Self::default_random_pool_factor(),
        }
    }

    /// Creates parameters whose `γ` is looked up for `window` of `window_len`
    /// samples.
    ///
    /// # Errors
    /// Returns `NotPositiveArgument` when `window_len` is zero.
    pub fn from_window(
        window: WindowType,
        window_len: usize,
        hop_size: usize,
        transform_size: usize,
    ) -> Result<Self, PhaseError> {
        let g = gamma(window, window_len).ok_or_else(|| {
            PhaseError::NotPositiveArgument(format!("{} window length is 0", window))
        })?;
        Ok(Self::new(g, hop_size, transform_size))
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_causal(mut self, causal: bool) -> Self {
        self.causal = causal;
        self
    }

    /// Makes the random-phase pool reproducible.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_random_pool_factor(mut self, factor: usize) -> Self {
        self.random_pool_factor = factor;
        self
    }

    /// Number of non-redundant frequency bins, `M / 2 + 1`.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.transform_size / 2 + 1
    }

    /// Length of one multi-channel frame, `channels * num_bins()`.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.channels.saturating_mul(self.num_bins())
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), PhaseError> {
        if self.hop_size == 0 {
            return Err(PhaseError::NotPositiveArgument("hop size is 0".into()));
        }
        if self.transform_size == 0 {
            return Err(PhaseError::NotPositiveArgument(
                "transform size is 0".into(),
            ));
        }
        if self.channels == 0 {
            return Err(PhaseError::NotPositiveArgument(
                "channel count is 0".into(),
            ));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(PhaseError::NotPositiveArgument(format!(
                "gamma must be positive and finite, got {}",
                self.gamma
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(PhaseError::NotPositiveArgument(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.random_pool_factor == 0 {
            return Err(PhaseError::NotPositiveArgument(
                "random pool factor is 0".into(),
            ));
        }
        Ok(())
    }
}
