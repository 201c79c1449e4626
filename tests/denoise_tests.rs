use anyhow::Result;
use core::f64::consts::PI;
use ecg_denoise::analysis::metrics::{calc_mse, calc_snr, evaluate};
use ecg_denoise::analysis::scenario::{run_scenarios, standard_scenarios, Scenario};
use ecg_denoise::filtering::{apply_filter, FilterSpec, Wavelet};
use ecg_denoise::preprocessing::noise::{
    add_baseline_wander, add_emg_noise, add_powerline_noise, NoiseSpec,
};
use ecg_denoise::{DenoiseError, Signal};
use rand::rngs::StdRng;
use rand::SeedableRng;

const FS: f64 = 360.0;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Crude ECG stand-in: a 1.2 Hz carrier with a narrow Gaussian spike per beat.
fn synthetic_ecg(size: usize) -> Result<Signal> {
    let beat_period = FS / 1.2;
    let samples = (0..size)
        .map(|i| {
            let t = i as f64 / FS;
            let phase = (i as f64 % beat_period) - beat_period / 2.0;
            0.1 * (2.0 * PI * 1.2 * t).sin() + (-phase * phase / 20.0).exp()
        })
        .collect();
    Ok(Signal::new(samples, FS)?)
}

fn all_specs() -> Vec<FilterSpec> {
    vec![
        FilterSpec::notch(),
        FilterSpec::high_pass(),
        FilterSpec::low_pass(),
        FilterSpec::wavelet(),
        FilterSpec::savitzky_golay(),
        FilterSpec::Wavelet {
            wavelet: Wavelet::Daubechies(4),
            level: 3,
        },
    ]
}

#[test]
fn test_constant_signal_metrics() -> Result<()> {
    init_logger();
    let signal = Signal::new(vec![1.0; 1000], FS)?;
    let noisy = add_powerline_noise(&signal, 50.0, 0.0)?;
    assert_eq!(noisy, signal);
    assert_eq!(calc_snr(&signal, &signal)?, f64::INFINITY);
    assert_eq!(calc_mse(&signal, &signal)?, 0.0);
    Ok(())
}

#[test]
fn test_savgol_removes_constant() -> Result<()> {
    init_logger();
    let signal = Signal::new(vec![5.0; 1000], FS)?;
    let filtered = apply_filter(&signal, &FilterSpec::savitzky_golay())?;
    assert_eq!(filtered.len(), 1000);
    for &value in filtered.samples() {
        assert!(value.abs() < 1e-8, "residual should vanish, got {value}");
    }
    Ok(())
}

#[test]
fn test_zero_amplitude_noise_is_identity() -> Result<()> {
    init_logger();
    let signal = synthetic_ecg(1000)?;
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(add_powerline_noise(&signal, 60.0, 0.0)?, signal);
    assert_eq!(add_baseline_wander(&signal, 0.3, 0.0)?, signal);
    assert_eq!(add_emg_noise(&signal, 0.0, &mut rng)?, signal);
    Ok(())
}

#[test]
fn test_filters_preserve_length() -> Result<()> {
    init_logger();
    let signal = synthetic_ecg(1800)?;
    for spec in all_specs() {
        let filtered = apply_filter(&signal, &spec)?;
        assert_eq!(
            filtered.len(),
            signal.len(),
            "{} changed the length",
            spec.name()
        );
        assert!(filtered.samples().iter().all(|v| v.is_finite()));
    }
    Ok(())
}

#[test]
fn test_notch_reduces_powerline_error() -> Result<()> {
    init_logger();
    let samples = (0..1000)
        .map(|i| (2.0 * PI * 1.2 * i as f64 / FS).sin())
        .collect();
    let reference = Signal::new(samples, FS)?;
    let noisy = add_powerline_noise(&reference, 50.0, 0.2)?;
    let filtered = apply_filter(&noisy, &FilterSpec::notch())?;
    let record = evaluate(&reference, &noisy, &filtered, "Notch Filter")?;
    assert!(calc_mse(&reference, &filtered)? < calc_mse(&reference, &noisy)?);
    assert!(record.snr_improvement() > 0.0);
    Ok(())
}

#[test]
fn test_high_pass_removes_wander() -> Result<()> {
    init_logger();
    let reference = synthetic_ecg(3600)?;
    let noisy = add_baseline_wander(&reference, 0.1, 0.5)?;
    let filtered = apply_filter(&noisy, &FilterSpec::high_pass())?;
    // high-pass output has zero mean
    let wander_before = calc_mse(&reference, &noisy)?;
    let mean: f64 = reference.samples().iter().sum::<f64>() / reference.len() as f64;
    let centered = Signal::new(reference.samples().iter().map(|v| v - mean).collect(), FS)?;
    assert!(calc_mse(&centered, &filtered)? < wander_before);
    Ok(())
}

#[test]
fn test_high_pass_cutoff_at_sampling_rate() -> Result<()> {
    let signal = synthetic_ecg(1000)?;
    let spec = FilterSpec::HighPass {
        cutoff: FS,
        order: 4,
    };
    assert!(matches!(
        apply_filter(&signal, &spec),
        Err(DenoiseError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn test_short_signal_errors() -> Result<()> {
    let signal = synthetic_ecg(10)?;
    assert!(matches!(
        apply_filter(&signal, &FilterSpec::low_pass()),
        Err(DenoiseError::Numeric(_))
    ));
    assert!(matches!(
        apply_filter(&signal, &FilterSpec::savitzky_golay()),
        Err(DenoiseError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn test_emg_noise_reproducible() -> Result<()> {
    let signal = synthetic_ecg(500)?;
    let spec = NoiseSpec::emg();
    let a = spec.apply(&signal, &mut StdRng::seed_from_u64(99))?;
    let b = spec.apply(&signal, &mut StdRng::seed_from_u64(99))?;
    assert_eq!(a, b);
    assert_ne!(a, signal);
    Ok(())
}

#[test]
fn test_run_standard_scenarios() -> Result<()> {
    init_logger();
    let reference = synthetic_ecg(3600)?;
    let scenarios = standard_scenarios();
    let records = run_scenarios(&reference, &scenarios, 42)?;
    assert_eq!(records.len(), 5);
    for (record, scenario) in records.iter().zip(&scenarios) {
        assert_eq!(record.label, scenario.label);
        assert!(record.mse.is_finite());
        assert!(record.to_string().starts_with("Performance of "));
    }
    // powerline and EMG scenarios must improve on the noisy input
    assert!(records[0].snr_improvement() > 0.0);
    assert!(records[2].snr_improvement() > 0.0);
    Ok(())
}

#[test]
fn test_custom_scenario_error() -> Result<()> {
    let reference = synthetic_ecg(500)?;
    let scenarios = vec![
        Scenario::new("Notch", NoiseSpec::powerline(), FilterSpec::notch()),
        Scenario::new(
            "Notch above Nyquist",
            NoiseSpec::powerline(),
            FilterSpec::Notch {
                freq: 200.0,
                quality_factor: 30.0,
            },
        ),
    ];
    assert!(matches!(
        run_scenarios(&reference, &scenarios, 0),
        Err(DenoiseError::Configuration(_))
    ));
    Ok(())
}
