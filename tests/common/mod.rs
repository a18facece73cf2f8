#![allow(dead_code)]

use std::f64::consts::PI;

use rtpghi::{Complex, RtPghi, RtPghiParams};

/// Spectrogram with one active bin at magnitude `amp` in every frame.
pub fn single_bin_spectrogram(num_frames: usize, m2: usize, bin: usize, amp: f64) -> Vec<f64> {
    let mut spectrogram = vec![0.0; num_frames * m2];
    for frame in spectrogram.chunks_exact_mut(m2) {
        frame[bin] = amp;
    }
    spectrogram
}

/// Wraps a phase difference into `[-π, π)`.
pub fn wrap_phase(p: f64) -> f64 {
    (p + PI).rem_euclid(2.0 * PI) - PI
}

/// Periodic Hann window of length `n`.
pub fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Runs every frame of `spectrogram` through a stream, collecting only emitted frames.
pub fn run_stream(params: &RtPghiParams, spectrogram: &[f64]) -> Vec<Vec<Complex<f64>>> {
    let mut rt = RtPghi::new(params.clone()).expect("stream should initialise");
    let mut frames = Vec::new();
    let mut out = vec![Complex::new(0.0, 0.0); rt.frame_len()];
    for frame in spectrogram.chunks_exact(rt.frame_len()) {
        if rt.execute(frame, &mut out).expect("execute should succeed") {
            frames.push(out.clone());
        }
    }
    if rt.flush(&mut out).expect("flush should succeed") {
        frames.push(out.clone());
    }
    rt.done().expect("first done should succeed");
    frames
}
