//! System diagnostics and dependency checking.
//!
//! Verifies that the audio tools run, that background tracks are in place,
//! and that provider credentials are configured.

use crate::compose::{CommandExecutor, ExecError};
use crate::config::Config;
use crate::defaults;
use std::path::Path;
use std::time::Duration;

/// Result of a dependency check.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok,
    /// Tool is not found
    NotFound,
    /// Present but not usable as configured
    Warning(String),
}

/// One named line of the diagnostics report.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: String,
    pub result: CheckResult,
    /// Install or fix hint shown when the check does not pass.
    pub hint: Option<String>,
}

impl Check {
    fn new(name: impl Into<String>, result: CheckResult) -> Self {
        Self {
            name: name.into(),
            result,
            hint: None,
        }
    }

    fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }
}

const FFMPEG_HINT: &str = "Install: sudo apt install ffmpeg  (Debian/Ubuntu)\n\
                                    sudo pacman -S ffmpeg    (Arch)";

/// Check that `binary -version` runs.
async fn check_binary(executor: &dyn CommandExecutor, binary: &str) -> CheckResult {
    match executor
        .execute(binary, &["-version".to_string()], Duration::from_secs(10))
        .await
    {
        Ok(output) if output.success => CheckResult::Ok,
        Ok(output) => CheckResult::Warning(format!(
            "'{binary}' found but -version failed: {}",
            output.stderr.trim()
        )),
        Err(ExecError::NotFound { .. }) => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(e.to_string()),
    }
}

/// Check that `dir` holds at least one background track.
fn check_backgrounds(dir: &Path) -> CheckResult {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CheckResult::NotFound,
        Err(e) => return CheckResult::Warning(format!("cannot read {}: {e}", dir.display())),
    };

    let tracks = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == defaults::AUDIO_EXTENSION)
        })
        .count();

    if tracks == 0 {
        CheckResult::Warning(format!("no .{} tracks in {}", defaults::AUDIO_EXTENSION, dir.display()))
    } else {
        CheckResult::Ok
    }
}

fn check_key(key: &str) -> CheckResult {
    if key.trim().is_empty() {
        CheckResult::NotFound
    } else {
        CheckResult::Ok
    }
}

/// Run all dependency checks.
pub async fn run_checks(config: &Config, executor: &dyn CommandExecutor) -> Vec<Check> {
    vec![
        Check::new(
            format!("{} (composition)", config.composition.binary),
            check_binary(executor, &config.composition.binary).await,
        )
        .with_hint(FFMPEG_HINT),
        Check::new(
            format!("{} (duration probe)", config.composition.probe_binary),
            check_binary(executor, &config.composition.probe_binary).await,
        )
        .with_hint(FFMPEG_HINT),
        Check::new(
            "background tracks",
            check_backgrounds(&config.storage.backgrounds_dir),
        )
        .with_hint(&format!(
            "Place <name>.{} files in {}",
            defaults::AUDIO_EXTENSION,
            config.storage.backgrounds_dir.display()
        )),
        Check::new("translation api key", check_key(&config.translation.api_key))
            .with_hint("Set STILLPOINT_TRANSLATE_API_KEY or [translation] api_key"),
        Check::new("speech api key", check_key(&config.synthesis.api_key))
            .with_hint("Set STILLPOINT_ELEVENLABS_API_KEY or [synthesis] api_key"),
    ]
}

/// Print a report and return whether every check passed.
pub fn print_report(checks: &[Check]) -> bool {
    println!("Checking system dependencies...\n");

    let mut all_ok = true;
    for check in checks {
        print!("{}: ", check.name);
        match &check.result {
            CheckResult::Ok => {
                println!("✓ OK");
                continue;
            }
            CheckResult::NotFound => println!("✗ NOT FOUND"),
            CheckResult::Warning(msg) => {
                println!("⚠ WARNING");
                for line in msg.lines() {
                    println!("  {}", line);
                }
            }
        }
        all_ok = false;
        if let Some(hint) = &check.hint {
            for line in hint.lines() {
                println!("  {}", line.trim_start());
            }
        }
    }

    println!();
    if all_ok {
        println!("✓ Ready to generate meditations.");
    } else {
        println!("⚠ Some checks failed; generation may not work.");
    }
    all_ok
}
