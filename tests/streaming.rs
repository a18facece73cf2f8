mod common;

use common::{run_stream, wrap_phase};
use rtpghi::core::config::{read_params_json, write_params_json};
use rtpghi::{BinState, Complex, HeapIntTask, PhaseError, RtPghi, RtPghiParams, WindowType};

const M: usize = 32;
const A: usize = 8;

fn params() -> RtPghiParams {
    RtPghiParams::from_window(WindowType::Hann, M, A, M)
        .unwrap()
        .with_tolerance(1e-6)
        .with_random_seed(21)
}

#[test]
fn offline_matches_manual_streaming() {
    let p = params().with_causal(false);
    let m2 = p.num_bins();
    let spectrogram: Vec<f64> = (0..10 * m2)
        .map(|i| 1.0 + 0.5 * ((i % m2) as f64 * 0.4).cos())
        .collect();

    let streamed: Vec<Complex<f64>> = run_stream(&p, &spectrogram).into_iter().flatten().collect();
    let batch = rtpghi::offline(&spectrogram, &p, 10 * A).unwrap();
    assert_eq!(streamed, batch);
}

#[test]
fn reset_replays_identically_after_pool_is_rewound() {
    // With a pool of exactly one frame the cursor is back at the start after
    // every all-random frame, so a reset stream reproduces its first run.
    let p = params().with_random_pool_factor(1);
    let m2 = p.num_bins();
    let frames: Vec<Vec<f64>> = (0..6)
        .map(|n| (0..m2).map(|b| if n == 0 { 0.0 } else { 1.0 + b as f64 * 0.1 }).collect())
        .collect();

    let mut rt = RtPghi::new(p).unwrap();
    let mut out = vec![Complex::new(0.0, 0.0); m2];
    let mut first = Vec::new();
    for f in &frames {
        rt.execute(f, &mut out).unwrap();
        first.push(out.clone());
    }
    rt.reset().unwrap();
    for (n, f) in frames.iter().enumerate() {
        rt.execute(f, &mut out).unwrap();
        assert_eq!(out, first[n], "frame {} differs after reset", n);
    }
}

#[test]
fn switching_to_causal_mid_stream_keeps_running() {
    let p = params().with_causal(false);
    let m2 = p.num_bins();
    let frame = vec![0.7; m2];
    let mut rt = RtPghi::new(p).unwrap();
    let mut out = vec![Complex::new(0.0, 0.0); m2];

    assert!(!rt.execute(&frame, &mut out).unwrap());
    rt.set_causal(true);
    assert_eq!(rt.latency_samples(), 0);
    for _ in 0..6 {
        assert!(rt.execute(&frame, &mut out).unwrap());
        assert!(out.iter().all(|c| (c.norm() - 0.7).abs() < 1e-12));
    }
    assert!(!rt.flush(&mut out).unwrap());
}

#[test]
fn error_codes_reach_the_caller() {
    let p = params();
    let m2 = p.num_bins();
    let mut rt = RtPghi::new(p).unwrap();
    let mut out = vec![Complex::new(0.0, 0.0); m2];

    let err = rt.execute(&vec![1.0; m2 + 1], &mut out).unwrap_err();
    assert_eq!(err.code(), -2);
    let mut short = vec![Complex::new(0.0, 0.0); m2 - 1];
    assert!(matches!(
        rt.execute(&vec![1.0; m2], &mut short),
        Err(PhaseError::BadSize { .. })
    ));

    let err = RtPghi::new(RtPghiParams::new(10.0, 4, 16).with_tolerance(0.0)).unwrap_err();
    assert_eq!(err.code(), -3);
    assert!(err.to_string().contains("tolerance"));
}

#[test]
fn params_survive_a_config_file() {
    let path = std::env::temp_dir().join(format!("rtpghi-stream-{}.json", std::process::id()));
    let window: WindowType = "hanning".parse().unwrap();
    let p = RtPghiParams::from_window(window, 1024, 256, 2048)
        .unwrap()
        .with_channels(2)
        .with_causal(false);
    write_params_json(&path, &p).unwrap();
    let loaded = read_params_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, p);
    let rt = RtPghi::new(loaded).unwrap();
    assert_eq!(rt.frame_len(), 2 * 1025);
    assert_eq!(rt.latency_samples(), 256);
}

#[test]
fn batch_plane_integrates_reachable_bins_only() {
    // A 5x4 plane: column 0 known, a ridge of strong bins through the middle
    // and an island at the bottom-right corner cut off by silence.
    let (h, w) = (5, 4);
    let silent = -50.0;
    let mut logs = vec![silent; h * w];
    for col in 0..w {
        logs[col * h + 2] = 0.0;
        logs[col * h + 1] = -1.0;
    }
    logs[3 * h + 4] = 0.0;

    let mut known = vec![false; h * w];
    known[..h].fill(true);

    let mut task = HeapIntTask::new(h, w).unwrap();
    task.reset_mask(&known, &logs, -20.0).unwrap();

    let step = 0.25;
    let tgrad = vec![step; h * w];
    let fgrad = vec![0.0; h * w];
    let mut phase = vec![0.0; h * w];
    let stats = task.execute(&logs, &tgrad, &fgrad, &mut phase).unwrap();

    for col in 1..w {
        for bin in [1, 2] {
            assert_eq!(task.mask()[col * h + bin], BinState::Done);
            let expected = step * col as f64;
            assert!(wrap_phase(phase[col * h + bin] - expected).abs() < 1e-12);
        }
    }
    assert_eq!(task.mask()[3 * h + 4], BinState::Unknown);
    assert_eq!(stats.propagated, 2 * (w - 1));
}
