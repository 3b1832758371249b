use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};

use soundsense::audio::{AudioDetector, CycleSink, SoundTarget, SpectralFrame};
use soundsense::config::{DetectorConfig, MatchMode, TargetConfig};

/// Watch the default microphone for configured target sounds and report
/// loudness statistics.
#[derive(Parser)]
#[command(name = "soundsense", version, about)]
struct Args {
    /// Path to a JSON detector configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra target as label=frequency[,narrow]; repeatable
    #[arg(short, long = "target", value_parser = parse_target)]
    targets: Vec<TargetConfig>,

    /// Input device name (default: the system default input)
    #[arg(short, long)]
    device: Option<String>,

    /// Seconds between loudness reports; metrics reset after each report
    #[arg(short, long, default_value_t = 10)]
    interval: u64,

    /// List available input devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn parse_target(s: &str) -> Result<TargetConfig, String> {
    let (label, rest) = s
        .split_once('=')
        .ok_or_else(|| format!("expected label=frequency[,narrow], got '{}'", s))?;
    let (freq, mode) = match rest.split_once(',') {
        Some((freq, "narrow")) => (freq, MatchMode::Narrow),
        Some((freq, "wide")) => (freq, MatchMode::Wide),
        Some((_, other)) => return Err(format!("unknown match mode '{}'", other)),
        None => (rest, MatchMode::Wide),
    };
    let frequency_hz: f32 = freq
        .parse()
        .map_err(|_| format!("'{}' is not a frequency in Hz", freq))?;
    Ok(TargetConfig {
        label: label.to_string(),
        frequency_hz,
        mode,
    })
}

/// Sink that logs detection edges and the per-cycle peak.
struct LogSink {
    bin_width_hz: f32,
    active: HashSet<String>,
}

impl CycleSink for LogSink {
    fn cycle_complete(&mut self, frame: &SpectralFrame, targets: &[SoundTarget]) {
        for target in targets {
            let was_active = self.active.contains(target.label());
            if target.is_detected() && !was_active {
                info!(
                    "DETECTED '{}' (peak {:.0} Hz, {:.1} dB)",
                    target.label(),
                    frame.peak_bin as f32 * self.bin_width_hz,
                    frame.loudness_db
                );
                self.active.insert(target.label().to_string());
            } else if !target.is_detected() && was_active {
                info!("'{}' stopped", target.label());
                self.active.remove(target.label());
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let host = cpal::default_host();
    if args.list_devices {
        for device in host.input_devices()? {
            println!("{}", device.name().unwrap_or_else(|_| "Unknown".to_string()));
        }
        return Ok(());
    }

    let device = select_device(&host, args.device.as_deref())?;
    info!(
        "Using audio device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let input_config = device
        .default_input_config()
        .context("Failed to get default input config")?;
    let sample_format = input_config.sample_format();
    let stream_config: StreamConfig = input_config.into();

    let mut config = load_config(args.config.as_deref())?;
    config.sample_rate_hz = stream_config.sample_rate.0;
    config.targets.extend(args.targets);

    let sink = LogSink {
        bin_width_hz: config.bin_width_hz(),
        active: HashSet::new(),
    };
    let mut detector =
        AudioDetector::new(&config, sink).context("Invalid detector configuration")?;

    let (sample_sender, sample_receiver): (Sender<Vec<i16>>, Receiver<Vec<i16>>) =
        crossbeam_channel::unbounded();
    let stream = create_input_stream(&device, &stream_config, sample_format, sample_sender)?;
    stream.play()?;

    let report_interval = Duration::from_secs(args.interval.max(1));
    let ticker = crossbeam_channel::tick(report_interval);

    loop {
        crossbeam_channel::select! {
            recv(sample_receiver) -> block => {
                let block = block.context("Audio stream closed")?;
                detector.push_samples(&block);
            }
            recv(ticker) -> _ => {
                report(&detector);
                detector.reset_metrics();
            }
        }
    }
}

fn select_device(host: &cpal::Host, name: Option<&str>) -> Result<Device> {
    match name {
        Some(name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .with_context(|| format!("No input device named '{}'", name)),
        None => host
            .default_input_device()
            .context("No input device available"),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<DetectorConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
        None => Ok(DetectorConfig::default()),
    }
}

/// Downmix one interleaved block to mono i16 and ship it over the channel.
fn downmix_and_send<T: Copy>(
    data: &[T],
    channels: usize,
    to_f32: impl Fn(T) -> f32,
    sender: &Sender<Vec<i16>>,
) {
    let mono: Vec<i16> = data
        .chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| to_f32(s)).sum();
            (sum / channels as f32) as i16
        })
        .collect();

    if sender.send(mono).is_err() {
        warn!("Failed to send audio data");
    }
}

fn create_input_stream(
    device: &Device,
    config: &StreamConfig,
    format: SampleFormat,
    sender: Sender<Vec<i16>>,
) -> Result<Stream> {
    let channels = config.channels as usize;
    info!(
        "Creating {:?} input stream with {} channels at {} Hz",
        format, channels, config.sample_rate.0
    );

    let err_fn = |err| {
        warn!("Audio stream error: {}", err);
    };

    let stream = match format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                downmix_and_send(data, channels, |s| s as f32, &sender);
            },
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                downmix_and_send(data, channels, |s| s as f32 - 32_768.0, &sender);
            },
            err_fn,
            None,
        )?,
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                downmix_and_send(
                    data,
                    channels,
                    |s| s.clamp(-1.0, 1.0) * i16::MAX as f32,
                    &sender,
                );
            },
            err_fn,
            None,
        )?,
        other => anyhow::bail!("Unsupported sample format {:?}", other),
    };

    Ok(stream)
}

fn report<S: CycleSink>(detector: &AudioDetector<S>) {
    let metrics = detector.metrics();
    if metrics.count() == 0 {
        info!("no complete frames this interval");
        return;
    }
    info!(
        "loudness over {} frames: avg {:.1} dB, min {:.1} dB, max {:.1} dB, now {:.1} dB",
        metrics.count(),
        metrics.average().unwrap_or(0.0),
        metrics.min().unwrap_or(0.0),
        metrics.max(),
        metrics.current()
    );
}
