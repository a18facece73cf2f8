#![forbid(unsafe_code)]
//! Real-time phase gradient heap integration (RTPGHI).
//!
//! `rtpghi` reconstructs phase for magnitude-only short-time Fourier frames.
//! Phase derivatives are estimated from the log-magnitude under a Gaussian
//! window model and integrated outward from the strongest coefficients with a
//! max-heap, so a frame can be reconstructed with zero look-ahead (causal) or
//! one frame of look-ahead (non-causal).
//!
//! # Quick Start
//!
//! ```
//! use rtpghi::{RtPghiParams, WindowType};
//!
//! // A steady tone in bin 2 of a 16-point transform, hop 4, 8 frames.
//! let params = RtPghiParams::from_window(WindowType::Hann, 16, 4, 16)
//!     .unwrap()
//!     .with_tolerance(1e-6);
//! let m2 = params.num_bins();
//! let mut spectrogram = vec![0.0; 8 * m2];
//! for frame in spectrogram.chunks_exact_mut(m2) {
//!     frame[2] = 1.0;
//! }
//!
//! let coefs = rtpghi::offline(&spectrogram, &params, 8 * 4).unwrap();
//! assert_eq!(coefs.len(), spectrogram.len());
//! assert!((coefs[m2 + 2].norm() - 1.0).abs() < 1e-12);
//! ```
//!
//! # Streaming
//!
//! For real-time use, feed one magnitude frame at a time through [`RtPghi`]:
//!
//! ```
//! use num_complex::Complex;
//! use rtpghi::{RtPghi, RtPghiParams};
//!
//! let params = RtPghiParams::new(0.25645 * 1024.0 * 1024.0, 256, 1024).with_channels(2);
//! let mut rt = RtPghi::new(params).unwrap();
//! let frame = vec![0.5; rt.frame_len()];
//! let mut out = vec![Complex::new(0.0, 0.0); rt.frame_len()];
//! assert!(rt.execute(&frame, &mut out).unwrap());
//! rt.done().unwrap();
//! ```

pub mod core;
pub mod error;
pub mod pghi;
pub mod stream;

pub use crate::core::heap::PriorityHeap;
pub use crate::core::types::{BinState, RtPghiParams};
pub use crate::core::window::{gamma, WindowType};
pub use error::PhaseError;
pub use num_complex::Complex;
pub use pghi::heapint::HeapIntTask;
pub use stream::RtPghi;

use error::{checked_len, report, try_zeroed};

/// Reconstructs phase for a whole magnitude spectrogram.
///
/// `spectrogram` holds `length / hop_size` frames one after the other, each
/// frame carrying `channels` blocks of `M / 2 + 1` magnitudes. The result has
/// the same layout. Frames are processed in order through an [`RtPghi`]
/// stream; in non-causal mode the one-frame delay is absorbed and the last
/// frame is flushed, so output frame `n` always belongs to input frame `n`.
///
/// # Errors
///
/// Returns [`PhaseError::NullPointer`] for an empty spectrogram,
/// [`PhaseError::NotPositiveArgument`] when `length` is shorter than
/// one hop or the parameters are invalid, [`PhaseError::BadSize`] when
/// `spectrogram` holds fewer values than the frame count requires, and
/// [`PhaseError::AllocationFailure`] when the output cannot be reserved.
pub fn offline(
    spectrogram: &[f64],
    params: &RtPghiParams,
    length: usize,
) -> Result<Vec<Complex<f64>>, PhaseError> {
    params.validate().map_err(report)?;
    if spectrogram.is_empty() {
        return Err(report(PhaseError::NullPointer(
            "magnitude spectrogram is empty".into(),
        )));
    }
    if length == 0 {
        return Err(report(PhaseError::NotPositiveArgument(
            "signal length is 0".into(),
        )));
    }
    let num_frames = length / params.hop_size;
    if num_frames == 0 {
        return Err(report(PhaseError::NotPositiveArgument(format!(
            "signal length {} is shorter than one hop of {}",
            length, params.hop_size
        ))));
    }
    let frame_len = params.frame_len();
    let total = checked_len(num_frames, frame_len).map_err(report)?;
    if spectrogram.len() < total {
        return Err(report(PhaseError::BadSize {
            expected: total,
            provided: spectrogram.len(),
        }));
    }

    log::debug!(
        "rtpghi offline: {} frame(s) of {} value(s), causal={}",
        num_frames,
        frame_len,
        params.causal
    );

    let mut out: Vec<Complex<f64>> = try_zeroed(total).map_err(report)?;
    let mut rt = RtPghi::new(params.clone())?;
    let frames = spectrogram[..total].chunks_exact(frame_len);

    if params.causal {
        for (frame, dst) in frames.zip(out.chunks_exact_mut(frame_len)) {
            rt.execute(frame, dst)?;
        }
    } else {
        // Frame n comes out of the call that submits frame n + 1.
        let mut frames = frames;
        if let Some(first) = frames.next() {
            rt.execute(first, &mut out[..frame_len])?;
        }
        for (frame, dst) in frames.zip(out.chunks_exact_mut(frame_len)) {
            rt.execute(frame, dst)?;
        }
        rt.flush(&mut out[total - frame_len..])?;
    }

    rt.done()?;
    Ok(out)
}
