use std::f64::consts::TAU;

use num_complex::Complex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::columns::ColumnWindow;
use crate::core::types::{BinState, RtPghiParams};
use crate::error::{checked_len, report, try_zeroed, PhaseError};
use crate::pghi::gradient::{
    combine_magnitude_phase, frequency_gradient, log_magnitude, time_gradient, LOG_FLOOR,
};
use crate::pghi::heapint::{HeapIntTask, PassStats};

/// Frame-by-frame phase reconstruction for a multi-channel magnitude stream.
///
/// Each call to [`execute`](Self::execute) takes one magnitude frame per
/// channel and emits one frame of complex coefficients. Causal mode emits the
/// frame just received; non-causal mode waits one frame for look-ahead and
/// emits the previous frame, so the caller must [`flush`](Self::flush) once at
/// the end of the stream to get the last column.
///
/// The processor owns every buffer it uses; steady-state processing does not
/// allocate. Frames must be submitted in temporal order, and the processor is
/// not meant to be shared between threads without external locking.
#[derive(Debug)]
pub struct RtPghi {
    params: RtPghiParams,
    state: Option<StreamState>,
}

#[derive(Debug)]
struct StreamState {
    num_bins: usize,
    logtol: f64,
    channels: Vec<ChannelState>,
    task: HeapIntTask,
    /// Known-phase mask of the 2-column plane: the previous column is known,
    /// though only its bins above tolerance seed the pass.
    known: Vec<bool>,
    random_phase: Vec<f64>,
    random_cursor: usize,
    frames_seen: usize,
}

/// Sliding buffers of one channel.
#[derive(Debug)]
struct ChannelState {
    /// Magnitudes of frames n-1, n.
    mags: ColumnWindow,
    /// Log-magnitudes of frames n-2, n-1, n.
    logs: ColumnWindow,
    /// Time-direction gradients matching `logs`.
    tgrad: ColumnWindow,
    /// Frequency-direction gradient; only column 1 is ever written.
    fgrad: ColumnWindow,
    /// Phase of the previous solved column and the column being solved.
    phase: ColumnWindow,
    /// Mask of the most recently solved column.
    solved: Vec<BinState>,
}

impl ChannelState {
    fn new(params: &RtPghiParams) -> Result<Self, PhaseError> {
        let m2 = params.num_bins();
        let mut state = Self {
            mags: ColumnWindow::new(m2, 2, 0.0)?,
            logs: ColumnWindow::new(m2, 3, 0.0)?,
            tgrad: ColumnWindow::new(m2, 3, 0.0)?,
            fgrad: ColumnWindow::new(m2, 2, 0.0)?,
            phase: ColumnWindow::new(m2, 2, 0.0)?,
            solved: try_zeroed(m2)?,
        };
        state.silence(params);
        Ok(state)
    }

    /// Fills the window with silent frames: zero magnitude, `log(ε)`, the
    /// gradient of a flat spectrum and zero phase.
    fn silence(&mut self, params: &RtPghiParams) {
        self.mags.fill(0.0);
        self.logs.fill(LOG_FLOOR.ln());
        self.fgrad.fill(0.0);
        self.phase.fill(0.0);
        self.solved.fill(BinState::Unknown);
        for col in 0..self.tgrad.depth() {
            time_gradient(
                self.logs.column(col),
                params.hop_size,
                params.transform_size,
                params.gamma,
                self.tgrad.column_mut(col),
            );
        }
    }
}

impl RtPghi {
    /// Creates a processor with every buffer it will need.
    ///
    /// # Errors
    /// Returns `NotPositiveArgument` for invalid parameters and
    /// `AllocationFailure` when a buffer cannot be reserved; nothing is
    /// retained on failure.
    pub fn new(params: RtPghiParams) -> Result<Self, PhaseError> {
        params.validate().map_err(report)?;
        let state = StreamState::new(&params).map_err(report)?;
        log::debug!(
            "rtpghi stream: {} channel(s), M={}, a={}, gamma={:.3}, tol={:e}, causal={}, pool={}",
            params.channels,
            params.transform_size,
            params.hop_size,
            params.gamma,
            params.tolerance,
            params.causal,
            state.random_phase.len()
        );
        Ok(Self {
            params,
            state: Some(state),
        })
    }

    /// Parameters the processor was created with, including the current
    /// causality setting.
    pub fn params(&self) -> &RtPghiParams {
        &self.params
    }

    /// Switches between causal and non-causal processing for subsequent
    /// frames.
    pub fn set_causal(&mut self, causal: bool) {
        self.params.causal = causal;
    }

    pub fn is_causal(&self) -> bool {
        self.params.causal
    }

    /// Frames of delay between input and output: 0 causal, 1 non-causal.
    pub fn latency_frames(&self) -> usize {
        if self.params.causal {
            0
        } else {
            1
        }
    }

    /// Delay between input and output in samples.
    pub fn latency_samples(&self) -> usize {
        self.latency_frames() * self.params.hop_size
    }

    /// Number of values in one input or output frame.
    pub fn frame_len(&self) -> usize {
        self.params.frame_len()
    }

    /// Whether [`done`](Self::done) has released the processor.
    pub fn is_released(&self) -> bool {
        self.state.is_none()
    }

    /// Processes one magnitude frame (`channels * (M/2 + 1)` values, channel
    /// after channel) into `out`.
    ///
    /// Returns `true` when `out` holds a reconstructed frame and `false` while
    /// a non-causal stream still waits for its first look-ahead frame (`out`
    /// is then zeroed).
    pub fn execute(
        &mut self,
        frame: &[f64],
        out: &mut [Complex<f64>],
    ) -> Result<bool, PhaseError> {
        let frame_len = self.params.frame_len();
        let state = self.state.as_mut().ok_or_else(released).map_err(report)?;
        if frame.is_empty() {
            return Err(report(PhaseError::NullPointer(
                "magnitude frame is empty".into(),
            )));
        }
        check_frame(frame.len(), frame_len).map_err(report)?;
        check_frame(out.len(), frame_len).map_err(report)?;

        state
            .process(&self.params, Some(frame), out)
            .map_err(report)?;
        let emitted = self.params.causal || state.frames_seen >= 2;
        if !emitted {
            out.fill(Complex::new(0.0, 0.0));
        }
        Ok(emitted)
    }

    /// Emits the column still held back by non-causal look-ahead, reusing the
    /// last buffered frame as look-ahead.
    ///
    /// Returns `false` (with `out` zeroed) when nothing is pending: in causal
    /// mode, or before any frame was processed.
    pub fn flush(&mut self, out: &mut [Complex<f64>]) -> Result<bool, PhaseError> {
        let frame_len = self.params.frame_len();
        let state = self.state.as_mut().ok_or_else(released).map_err(report)?;
        check_frame(out.len(), frame_len).map_err(report)?;

        if self.params.causal || state.frames_seen == 0 {
            out.fill(Complex::new(0.0, 0.0));
            return Ok(false);
        }
        state.process(&self.params, None, out).map_err(report)?;
        Ok(true)
    }

    /// Returns the processor to its freshly created state. The random-phase
    /// pool and its cursor are kept.
    pub fn reset(&mut self) -> Result<(), PhaseError> {
        let state = self.state.as_mut().ok_or_else(released).map_err(report)?;
        for ch in &mut state.channels {
            ch.silence(&self.params);
        }
        state.frames_seen = 0;
        Ok(())
    }

    /// Mask of the most recently solved column of `channel`: `Done` bins got
    /// an integrated phase, `Unknown` bins a random one.
    pub fn solved_mask(&self, channel: usize) -> Option<&[BinState]> {
        let state = self.state.as_ref()?;
        state.channels.get(channel).map(|ch| ch.solved.as_slice())
    }

    /// Releases every buffer. Any later call other than the accessors fails
    /// with `NullPointer`, including a second `done`.
    pub fn done(&mut self) -> Result<(), PhaseError> {
        match self.state.take() {
            Some(state) => {
                log::debug!(
                    "rtpghi stream released after {} frame(s)",
                    state.frames_seen
                );
                Ok(())
            }
            None => Err(report(released())),
        }
    }
}

impl StreamState {
    fn new(params: &RtPghiParams) -> Result<Self, PhaseError> {
        let m2 = params.num_bins();
        let frame_len = checked_len(m2, params.channels)?;
        let pool_len = checked_len(frame_len, params.random_pool_factor)?;

        let mut channels = Vec::new();
        channels
            .try_reserve_exact(params.channels)
            .map_err(|_| PhaseError::AllocationFailure {
                requested: params.channels,
            })?;
        for _ in 0..params.channels {
            channels.push(ChannelState::new(params)?);
        }
        let task = HeapIntTask::new(m2, 2)?;
        let mut known: Vec<bool> = try_zeroed(checked_len(m2, 2)?)?;
        known[..m2].fill(true);

        let mut random_phase: Vec<f64> = try_zeroed(pool_len)?;
        let mut rng = match params.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        for p in random_phase.iter_mut() {
            *p = rng.random_range(0.0..TAU);
        }

        Ok(Self {
            num_bins: m2,
            logtol: (params.tolerance + LOG_FLOOR).ln(),
            channels,
            task,
            known,
            random_phase,
            random_cursor: 0,
            frames_seen: 0,
        })
    }

    /// Shifts every channel window by one frame and solves the new column.
    /// `None` repeats the newest buffered frame.
    fn process(
        &mut self,
        params: &RtPghiParams,
        frame: Option<&[f64]>,
        out: &mut [Complex<f64>],
    ) -> Result<(), PhaseError> {
        let m2 = self.num_bins;
        for w in 0..self.channels.len() {
            let input = frame.map(|f| &f[w * m2..(w + 1) * m2]);
            let dst = &mut out[w * m2..(w + 1) * m2];
            let stats = self.solve_channel(params, w, input, dst)?;
            log::trace!(
                "frame {} channel {}: {} seed(s), {} integrated, {} random",
                self.frames_seen,
                w,
                stats.seeded,
                stats.propagated,
                stats.unknown
            );
        }
        self.frames_seen += 1;
        Ok(())
    }

    fn solve_channel(
        &mut self,
        params: &RtPghiParams,
        w: usize,
        frame: Option<&[f64]>,
        out: &mut [Complex<f64>],
    ) -> Result<PassStats, PhaseError> {
        let a = params.hop_size;
        let m = params.transform_size;
        let causal = params.causal;
        let ch = &mut self.channels[w];

        match frame {
            Some(s) => ch.mags.shift_in(Some(s), 0.0),
            None => ch.mags.repeat_newest(),
        }
        ch.logs.shift_in(None, 0.0);
        log_magnitude(ch.mags.newest(), ch.logs.newest_mut());

        ch.tgrad.shift_in(None, 0.0);
        time_gradient(ch.logs.newest(), a, m, params.gamma, ch.tgrad.newest_mut());
        frequency_gradient(
            ch.logs.column(0),
            ch.logs.column(1),
            ch.logs.column(2),
            a,
            m,
            params.gamma,
            causal,
            ch.fgrad.column_mut(1),
        );

        // Causal mode solves frame n from n-1; non-causal solves n-1 from n-2.
        let first = if causal { 1 } else { 0 };
        let logs = ch.logs.columns(first, 2);
        ch.phase.shift_in(None, 0.0);
        self.task.reset_mask(&self.known, logs, self.logtol)?;
        let stats = self.task.execute(
            logs,
            ch.tgrad.columns(first, 2),
            ch.fgrad.as_slice(),
            ch.phase.as_mut_slice(),
        )?;

        let solved = self.task.column_mask(1);
        ch.solved.copy_from_slice(solved);
        for (p, state) in ch.phase.column_mut(1).iter_mut().zip(solved) {
            if *state != BinState::Done {
                *p = self.random_phase[self.random_cursor];
                self.random_cursor = (self.random_cursor + 1) % self.random_phase.len();
            }
        }

        let mags = if causal { ch.mags.column(1) } else { ch.mags.column(0) };
        combine_magnitude_phase(mags, ch.phase.column(1), out);
        Ok(stats)
    }
}

fn released() -> PhaseError {
    PhaseError::NullPointer("stream state already released".into())
}

fn check_frame(provided: usize, expected: usize) -> Result<(), PhaseError> {
    if provided != expected {
        return Err(PhaseError::BadSize { expected, provided });
    }
    Ok(())
}
