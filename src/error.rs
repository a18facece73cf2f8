//! Error types for the rtpghi crate.

use std::fmt;

/// Errors reported by the phase reconstruction engine.
///
/// Every variant carries a stable status code (see [`PhaseError::code`]) and a
/// human readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    /// A required input or piece of state is missing (e.g. the stream was
    /// already released).
    NullPointer(String),
    /// A buffer does not have the length the stream was configured for.
    BadSize { expected: usize, provided: usize },
    /// A size, count or scalar parameter that must be positive was not.
    NotPositiveArgument(String),
    /// A buffer of `requested` elements could not be reserved.
    AllocationFailure { requested: usize },
    /// An internal invariant was violated.
    CannotHappen(String),
    /// Reading or writing a parameter file failed.
    Io(String),
    /// A parameter file could not be parsed or serialized.
    InvalidConfig(String),
}

impl PhaseError {
    /// Stable integer status code, negative for every error.
    pub fn code(&self) -> i32 {
        match self {
            PhaseError::NullPointer(_) => -1,
            PhaseError::BadSize { .. } => -2,
            PhaseError::NotPositiveArgument(_) => -3,
            PhaseError::AllocationFailure { .. } => -4,
            PhaseError::CannotHappen(_) => -5,
            PhaseError::Io(_) => -6,
            PhaseError::InvalidConfig(_) => -7,
        }
    }
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseError::NullPointer(msg) => write!(f, "missing input: {}", msg),
            PhaseError::BadSize { expected, provided } => {
                write!(
                    f,
                    "bad buffer size: {} elements provided, {} expected",
                    provided, expected
                )
            }
            PhaseError::NotPositiveArgument(msg) => {
                write!(f, "argument must be positive: {}", msg)
            }
            PhaseError::AllocationFailure { requested } => {
                write!(f, "failed to allocate a buffer of {} elements", requested)
            }
            PhaseError::CannotHappen(msg) => write!(f, "internal invariant violated: {}", msg),
            PhaseError::Io(msg) => write!(f, "I/O error: {}", msg),
            PhaseError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for PhaseError {}

impl From<std::io::Error> for PhaseError {
    fn from(err: std::io::Error) -> Self {
        PhaseError::Io(err.to_string())
    }
}

/// Reserves a buffer of `len` default values, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, PhaseError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| PhaseError::AllocationFailure { requested: len })?;
    buf.resize(len, T::default());
    Ok(buf)
}

/// Logs an error on its way out of a public entry point.
pub(crate) fn report(err: PhaseError) -> PhaseError {
    log::warn!("rtpghi: {}", err);
    err
}

/// `a * b`, or `AllocationFailure` when the product overflows.
pub(crate) fn checked_len(a: usize, b: usize) -> Result<usize, PhaseError> {
    a.checked_mul(b)
        .ok_or(PhaseError::AllocationFailure { requested: usize::MAX })
}
