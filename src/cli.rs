//! Command-line interface for stillpoint
//!
//! Provides argument parsing using clap derive macros.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Turn text into meditation audio
#[derive(Parser, Debug)]
#[command(
    name = "stillpoint",
    version,
    about = "Turn text into meditation audio: translate, narrate, mix over a background"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration such as `90`, `90s`, `2m` or `1m30s`.
///
/// Bare numbers are seconds.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Arguments of `stillpoint generate`
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Meditation text
    #[arg(long, value_name = "TEXT", conflicts_with = "file", required_unless_present = "file")]
    pub text: Option<String>,

    /// Read the meditation text from a file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Speech provider voice identifier
    #[arg(long, value_name = "VOICE")]
    pub voice: String,

    /// Background track name (a file <name>.mp3 in the backgrounds directory)
    #[arg(long, value_name = "NAME")]
    pub background: String,

    /// Language the text is written in
    #[arg(long, value_name = "LANG", default_value = "en")]
    pub source_language: String,

    /// Language to narrate in; translated when it differs from the source
    #[arg(long, short = 'l', value_name = "LANG", default_value = "en")]
    pub language: String,

    /// User to charge when the credit gate is enabled
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Where to write the finished track
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    /// Speech synthesis timeout override. Examples: 90s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub synthesis_timeout: Option<Duration>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a meditation track
    Generate(GenerateArgs),

    /// Probe stored tracks and record missing durations
    BackfillDurations,

    /// List catalogued meditations
    Records,

    /// Check system dependencies
    Check,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (file + environment)
    Show,
    /// Print the default configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_inline_text() {
        let cli = Cli::try_parse_from([
            "stillpoint",
            "generate",
            "--text",
            "Breathe in... hold... breathe out.",
            "--voice",
            "V1",
            "--background",
            "ocean",
            "-o",
            "out.mp3",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.text.as_deref(), Some("Breathe in... hold... breathe out."));
                assert!(args.file.is_none());
                assert_eq!(args.voice, "V1");
                assert_eq!(args.background, "ocean");
                assert_eq!(args.source_language, "en");
                assert_eq!(args.language, "en");
                assert!(args.user.is_none());
                assert_eq!(args.output, PathBuf::from("out.mp3"));
                assert!(args.synthesis_timeout.is_none());
            }
            other => panic!("Expected Generate, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_generate_requires_text_or_file() {
        let result = Cli::try_parse_from([
            "stillpoint",
            "generate",
            "--voice",
            "V1",
            "--background",
            "ocean",
            "-o",
            "out.mp3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_generate_text_and_file_conflict() {
        let result = Cli::try_parse_from([
            "stillpoint",
            "generate",
            "--text",
            "a",
            "--file",
            "a.txt",
            "--voice",
            "V1",
            "--background",
            "ocean",
            "-o",
            "out.mp3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_generate_translation_and_timeout() {
        let cli = Cli::try_parse_from([
            "stillpoint",
            "generate",
            "--file",
            "script.txt",
            "--voice",
            "V1",
            "--background",
            "rain",
            "-l",
            "nl",
            "--user",
            "alice",
            "--synthesis-timeout",
            "2m",
            "-o",
            "out.mp3",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.file, Some(PathBuf::from("script.txt")));
                assert_eq!(args.language, "nl");
                assert_eq!(args.user.as_deref(), Some("alice"));
                assert_eq!(args.synthesis_timeout, Some(Duration::from_secs(120)));
            }
            other => panic!("Expected Generate, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["stillpoint", "-vv", "records"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Records));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stillpoint",
            "backfill-durations",
            "--config",
            "/etc/stillpoint.toml",
            "-q",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::BackfillDurations));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/stillpoint.toml")));
        assert!(cli.quiet);
    }

    #[test]
    fn test_parse_config_actions() {
        let cli = Cli::try_parse_from(["stillpoint", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));

        let cli = Cli::try_parse_from(["stillpoint", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["stillpoint", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn test_parse_duration_formats() {
        assert_eq!(parse_duration("90"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert!(parse_duration("soon").is_err());
    }
}
