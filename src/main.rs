use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use bytes::Bytes;

use miniplay::alsa_sink::AlsaSink;
use miniplay::config::PlayerConfig;
use miniplay::pipeline::{self, PlaybackOutcome, PlaybackSession};
use miniplay::transport::Transport;
use miniplay::{codec, input};

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "miniplay".into());
    let (Some(path), None) = (args.next(), args.next()) else {
        eprintln!("usage: {} <audio-file>", program);
        return Ok(ExitCode::FAILURE);
    };

    let data = fs::read(&path).with_context(|| format!("failed to read '{}'", path))?;
    println!("--- miniplay ---");
    println!("  [file] {} ({} bytes)", path, data.len());

    let Some(format) = codec::detect_format(&data) else {
        bail!("'{}' is not a recognized FLAC or MP3 file", path);
    };
    log::info!("detected format: {:?}", format);

    let config = PlayerConfig::default();
    // Fatal if the device cannot be opened; configuration with the actual
    // stream parameters happens later and is allowed to fail softly.
    let mut sink = AlsaSink::open(&config)?;

    let transport = Transport::new();
    let mut session = PlaybackSession::new(Bytes::from(data), transport.clone());
    let mut binding = codec::binding_for(format);

    let monitor = input::spawn_monitor(transport.clone())?;
    let outcome = pipeline::run(&mut session, binding.as_mut(), &mut sink, &config);

    // Let the monitor observe a terminal state and exit; a user stop/quit
    // already did this.
    transport.request_stop();
    if monitor.join().is_err() {
        log::error!("input monitor thread panicked");
    }

    match outcome {
        PlaybackOutcome::Completed => println!("--- played to completion ---"),
        PlaybackOutcome::Aborted => println!("--- session ended ---"),
        PlaybackOutcome::FatalDecodeError => println!("--- session ended (decode failure) ---"),
    }
    Ok(ExitCode::SUCCESS)
}
