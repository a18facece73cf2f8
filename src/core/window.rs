//! Window kinds and their phase-gradient spread constants.
//!
//! The gradient estimator relates the log-magnitude slope of a coefficient to
//! its phase derivative through a constant `γ` that depends on the analysis
//! window. For the windows below `γ` has been measured empirically per unit
//! length; [`gamma`] scales it by the squared window length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Analysis window kinds with a known `γ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Also known as Hanning and Nuttall10.
    Hann,
    /// Also known as Cosine and Sine.
    SqrtHann,
    Hamming,
    Nuttall01,
    /// Also known as Square.
    Rect,
    /// Also known as Tria and Bartlett.
    Triangular,
    SqrtTria,
    Blackman,
    Blackman2,
    /// Also known as Nuttall12.
    Nuttall,
    /// Also known as Ogg.
    Itersine,
    Nuttall20,
    Nuttall11,
    Nuttall02,
    Nuttall30,
    Nuttall21,
    Nuttall03,
}

impl WindowType {
    /// `γ` for a window of unit length.
    pub const fn unit_gamma(self) -> f64 {
        match self {
            WindowType::Hann => 0.25645,
            WindowType::SqrtHann => 0.41532,
            WindowType::Hamming => 0.29794,
            WindowType::Nuttall01 => 0.29610,
            WindowType::Rect => 0.85732,
            WindowType::Triangular => 0.27561,
            WindowType::SqrtTria => 0.48068,
            WindowType::Blackman => 0.17954,
            WindowType::Blackman2 => 0.18465,
            WindowType::Nuttall => 0.12807,
            WindowType::Itersine => 0.35744,
            WindowType::Nuttall20 => 0.14315,
            WindowType::Nuttall11 => 0.17001,
            WindowType::Nuttall02 => 0.18284,
            WindowType::Nuttall30 => 0.09895,
            WindowType::Nuttall21 => 0.11636,
            WindowType::Nuttall03 => 0.13369,
        }
    }

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::SqrtHann => "sqrthann",
            WindowType::Hamming => "hamming",
            WindowType::Nuttall01 => "nuttall01",
            WindowType::Rect => "rect",
            WindowType::Triangular => "triangular",
            WindowType::SqrtTria => "sqrttria",
            WindowType::Blackman => "blackman",
            WindowType::Blackman2 => "blackman2",
            WindowType::Nuttall => "nuttall",
            WindowType::Itersine => "itersine",
            WindowType::Nuttall20 => "nuttall20",
            WindowType::Nuttall11 => "nuttall11",
            WindowType::Nuttall02 => "nuttall02",
            WindowType::Nuttall30 => "nuttall30",
            WindowType::Nuttall21 => "nuttall21",
            WindowType::Nuttall03 => "nuttall03",
        }
    }
}

/// Spread constant `γ` for a window of `len` samples, or `None` for an empty
/// window.
pub fn gamma(window: WindowType, len: usize) -> Option<f64> {
    if len == 0 {
        return None;
    }
    let len = len as f64;
    Some(window.unit_gamma() * len * len)
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a window name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWindow(pub String);

impl fmt::Display for UnknownWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown window type: {}", self.0)
    }
}

impl std::error::Error for UnknownWindow {}

impl FromStr for WindowType {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "hann" | "hanning" | "nuttall10" => WindowType::Hann,
            "sqrthann" | "cosine" | "sine" => WindowType::SqrtHann,
            "hamming" => WindowType::Hamming,
            "nuttall01" => WindowType::Nuttall01,
            "rect" | "square" => WindowType::Rect,
            "triangular" | "tria" | "bartlett" => WindowType::Triangular,
            "sqrttria" => WindowType::SqrtTria,
            "blackman" => WindowType::Blackman,
            "blackman2" => WindowType::Blackman2,
            "nuttall" | "nuttall12" => WindowType::Nuttall,
            "itersine" | "ogg" => WindowType::Itersine,
            "nuttall20" => WindowType::Nuttall20,
            "nuttall11" => WindowType::Nuttall11,
            "nuttall02" => WindowType::Nuttall02,
            "nuttall30" => WindowType::Nuttall30,
            "nuttall21" => WindowType::Nuttall21,
            "nuttall03" => WindowType::Nuttall03,
            _ => return Err(UnknownWindow(s.to_string())),
        };
        Ok(kind)
    }
}
