use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use stillpoint::app::{GenerateOptions, TextSource, run_backfill, run_check, run_generate, run_records};
use stillpoint::cli::{Cli, Commands, ConfigAction, GenerateArgs};
use stillpoint::config::Config;
use stillpoint::logging::{LogConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogConfig {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        ..LogConfig::default()
    });
    tracing::debug!(version = %stillpoint::version_string(), "starting");

    match cli.command {
        Commands::Generate(args) => {
            let config = load_config(cli.config.as_deref())?;
            if let Err(e) = run_generate(config, generate_options(args), cli.quiet).await {
                eprintln!("{}", format!("Error: {e}").red());
                std::process::exit(1);
            }
        }
        Commands::BackfillDurations => {
            let config = load_config(cli.config.as_deref())?;
            let report = run_backfill(&config, cli.quiet).await?;
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Commands::Records => {
            let config = load_config(cli.config.as_deref())?;
            run_records(&config).await?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            if !run_check(&config).await {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "stillpoint",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn generate_options(args: GenerateArgs) -> GenerateOptions {
    let text = match (args.text, args.file) {
        (Some(text), _) => TextSource::Inline(text),
        (None, Some(path)) => TextSource::File(path),
        // clap enforces one of the two
        (None, None) => TextSource::Inline(String::new()),
    };

    GenerateOptions {
        text,
        voice: args.voice,
        background: args.background,
        source_language: args.source_language,
        language: args.language,
        user: args.user,
        output: args.output,
        synthesis_timeout: args.synthesis_timeout,
    }
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/stillpoint/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Handle configuration commands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut config = load_config(custom_path)?;
            for key in [
                &mut config.translation.api_key,
                &mut config.synthesis.api_key,
            ] {
                if !key.is_empty() {
                    *key = "********".to_string();
                }
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(std::path::PathBuf::from)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
