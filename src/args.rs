//! Command-line argument parsing for the musee CLI.
//!
//! This module handles parsing of:
//! - Config file and asset directory overrides
//! - Initial tempo, as a number or as three digits
//! - Run duration and cue rendering
//! - Help text generation

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Tempo requested on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TempoArg {
    /// `--bpm N`
    Bpm(u16),
    /// `H T U`
    Digits(u8, u8, u8),
}

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// JSON config file
    pub config: Option<PathBuf>,
    /// Asset directory, overriding the config
    pub assets: Option<PathBuf>,
    /// Stop automatically after this long
    pub duration: Option<Duration>,
    /// Render the default cues into this directory and exit
    pub write_cues: Option<PathBuf>,
    /// Initial tempo, overriding the config digits
    pub tempo: Option<TempoArg>,
    /// Whether help was requested
    pub show_help: bool,
}

impl CliArgs {
    /// Parse arguments from command line.
    pub fn parse() -> Self {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse an argument list without the program name.
    pub fn parse_from<I>(items: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = Self::default();
        let mut positional = Vec::new();
        let mut iter = items.into_iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg.clone(), None),
            };

            match flag.as_str() {
                "--help" | "-h" => {
                    args.show_help = true;
                }
                "--config" | "--assets" | "--duration" | "--write-cues" | "--bpm" => {
                    let Some(value) = inline.or_else(|| iter.next()) else {
                        eprintln!("{flag} requires an argument");
                        args.show_help = true;
                        continue;
                    };
                    args.apply(&flag, value);
                }
                _ if flag.starts_with('-') => {
                    eprintln!("Unknown flag: {}", arg);
                    args.show_help = true;
                }
                _ => positional.push(arg),
            }
        }

        if !positional.is_empty() {
            match (args.tempo, parse_digits(&positional)) {
                (None, Some(digits)) => args.tempo = Some(digits),
                (Some(_), _) => {
                    eprintln!("Give the tempo either with --bpm or as three digits, not both");
                    args.show_help = true;
                }
                (None, None) => {
                    eprintln!("Expected three digits (H T U), got: {}", positional.join(" "));
                    args.show_help = true;
                }
            }
        }

        args
    }

    fn apply(&mut self, flag: &str, value: String) {
        match flag {
            "--config" => self.config = Some(PathBuf::from(value)),
            "--assets" => self.assets = Some(PathBuf::from(value)),
            "--write-cues" => self.write_cues = Some(PathBuf::from(value)),
            "--duration" => match value.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs > 0.0 => {
                    self.duration = Some(Duration::from_secs_f64(secs));
                }
                _ => {
                    eprintln!("Invalid duration: {}", value);
                    self.show_help = true;
                }
            },
            "--bpm" => match value.parse::<u16>() {
                Ok(bpm) => self.tempo = Some(TempoArg::Bpm(bpm)),
                Err(_) => {
                    eprintln!("Invalid tempo: {}", value);
                    self.show_help = true;
                }
            },
            _ => {}
        }
    }

    /// Print help text to stderr.
    pub fn print_help() {
        eprintln!(
            "Usage:\n  musee [--config FILE] [--assets DIR] [--duration SECS] [--write-cues DIR] [--bpm N | H T U]\n\n\
             Flags:\n\
             \x20 --config FILE        JSON settings (assets, cue gains, initial digits)\n\
             \x20 --assets DIR         Directory holding first_beat.wav and second_beat.wav\n\
             \x20 --duration SECS      Stop after SECS seconds\n\
             \x20 --write-cues DIR     Render the default click pair into DIR and exit\n\
             \x20 --bpm N              Initial tempo (1-299)\n\
             \x20 H T U                Initial tempo as hundreds, tens and units digits\n\
             \x20 -h, --help           Show this help\n\n\
             While running:\n\
             \x20 <number>  Enter      Restart at that tempo\n\
             \x20 s         Enter      Stop (digits reset to 0)\n\
             \x20 q / Enter            Quit\n\n\
             Examples:\n\
             \x20 musee --write-cues assets         # Generate default cues\n\
             \x20 musee --assets assets 1 2 0       # Play at 120 bpm\n\
             \x20 musee --bpm 90 --duration 10      # Ten seconds at 90 bpm\n"
        );
    }
}

fn parse_digits(items: &[String]) -> Option<TempoArg> {
    let [h, t, u] = items else {
        return None;
    };
    let digit = |s: &String| s.parse::<u8>().ok().filter(|d| *d <= 9);
    Some(TempoArg::Digits(digit(h)?, digit(t)?, digit(u)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(items: &[&str]) -> CliArgs {
        CliArgs::parse_from(items.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_flags() {
        let args = parse(&["--config", "m.json", "--assets=cues", "--duration", "2.5"]);
        assert_eq!(args.config, Some(PathBuf::from("m.json")));
        assert_eq!(args.assets, Some(PathBuf::from("cues")));
        assert_eq!(args.duration, Some(Duration::from_millis(2500)));
        assert!(!args.show_help);
    }

    #[test]
    fn test_tempo_forms() {
        assert_eq!(parse(&["--bpm", "140"]).tempo, Some(TempoArg::Bpm(140)));
        assert_eq!(parse(&["1", "2", "0"]).tempo, Some(TempoArg::Digits(1, 2, 0)));
    }

    #[test]
    fn test_bad_input_shows_help() {
        assert!(parse(&["--bpm"]).show_help);
        assert!(parse(&["--bpm", "fast"]).show_help);
        assert!(parse(&["1", "2"]).show_help);
        assert!(parse(&["1", "12", "0"]).show_help);
        assert!(parse(&["--bpm", "90", "1", "2", "0"]).show_help);
        assert!(parse(&["--duration", "-1"]).show_help);
        assert!(parse(&["--loud"]).show_help);
    }
}
