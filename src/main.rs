//! Musee terminal metronome
//!
//! Command-line front-end featuring:
//! - Four-dot beat indicator in the terminal
//! - Tempo entry on stdin while running
//! - Default cue rendering for setups without recorded clicks

mod args;

use anyhow::{Context, Result};
use args::{CliArgs, TempoArg};
use musee::audio::synth;
use musee::{BpmInput, MetronomeConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = CliArgs::parse();
    if args.show_help {
        CliArgs::print_help();
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => MetronomeConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MetronomeConfig::default(),
    };
    if let Some(assets) = &args.assets {
        config.assets_dir = assets.clone();
    }

    if let Some(dir) = &args.write_cues {
        let written = synth::write_cue_set(dir, synth::DEFAULT_SAMPLE_RATE)
            .with_context(|| format!("rendering cues into {}", dir.display()))?;
        for path in written {
            println!("wrote {}", path.display());
        }
        return Ok(());
    }

    run(&config, &args)
}

/// Apply a command-line tempo to the digit input.
fn apply_tempo(input: &BpmInput, tempo: TempoArg) -> Result<()> {
    match tempo {
        TempoArg::Bpm(bpm) => input.set_bpm(musee::Bpm::new(bpm))?,
        TempoArg::Digits(h, t, u) => input.set_digits(h, t, u)?,
    }
    Ok(())
}

#[cfg(not(feature = "streaming"))]
fn run(_config: &MetronomeConfig, args: &CliArgs) -> Result<()> {
    if let Some(tempo) = args.tempo {
        apply_tempo(&BpmInput::new(), tempo)?;
    }
    eprintln!(
        "Playback requires the \"streaming\" feature. Rebuild with `--features streaming` to enable it.\n\
         Cue rendering (--write-cues) works without it."
    );
    Ok(())
}

#[cfg(feature = "streaming")]
fn run(config: &MetronomeConfig, args: &CliArgs) -> Result<()> {
    use musee::audio::RodioRoute;
    use musee::metronome::indicator;
    use musee::{Bpm, ClockState, Metronome};
    use std::io::{self, BufRead, Write};
    use std::sync::mpsc::{self, TryRecvError};
    use std::time::{Duration, Instant};

    let route = RodioRoute::open_default().context("opening audio output")?;
    let metronome = Metronome::from_config(config, route)?;
    for cue in musee::AudioCue::ALL {
        if !metronome.dispatcher().is_loaded(cue) {
            eprintln!(
                "No {cue} cue under {} (try `musee --write-cues {}`)",
                config.assets_dir.display(),
                config.assets_dir.display()
            );
        }
    }

    if let Some(tempo) = args.tempo {
        apply_tempo(metronome.input(), tempo)?;
    }

    let (lines_tx, lines) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("musee-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("spawning stdin reader")?;

    let beats = metronome.subscribe();
    let deadline = args.duration.map(|d| Instant::now() + d);

    match metronome.start() {
        Ok(bpm) => eprintln!("{bpm} bpm. Type a tempo and Enter to change it, s to stop, q to quit."),
        Err(err) => eprintln!("{err}. Type a tempo (1-299) and Enter to start."),
    }

    let mut stdout = io::stdout();
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        match lines.try_recv() {
            Ok(line) => match line.trim() {
                "" | "q" | "quit" => break,
                "s" | "stop" => {
                    metronome.stop();
                    println!("\rstopped      ");
                }
                text => match text.parse::<u16>() {
                    Ok(value) => {
                        if let Err(err) = metronome.start_at(Bpm::new(value)) {
                            eprintln!("{err}");
                        }
                    }
                    Err(_) => eprintln!("Not a tempo: {text}"),
                },
            },
            Err(TryRecvError::Disconnected) => {
                if deadline.is_none() {
                    break;
                }
            }
            Err(TryRecvError::Empty) => {}
        }

        if let Ok(event) = beats.recv_timeout(Duration::from_millis(20)) {
            print!("\r{}  {} bpm ", indicator(Some(event.position)), event.bpm);
            stdout.flush().ok();
        }
    }

    if metronome.state() == ClockState::Running {
        metronome.stop();
    }
    println!();
    Ok(())
}
