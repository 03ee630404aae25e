mod segment;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use markweave_config::{Config, SettingsRegistry};
use markweave_engine::{Composer, Fragment, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Strategy {
    /// Grow from the configured initial length
    Auto,
    /// Start from --hint, or the exact length when no hint is given
    #[default]
    Hybrid,
    /// Allocate the exact length once
    Precomputed,
}

#[derive(Debug, Parser)]
#[command(name = "markweave")]
#[command(version, about = "Compose markdown from typed segments", long_about = None)]
#[command(after_help = "SEGMENTS:
    text:VALUE      escaped text (the default for bare words)
    raw:VALUE       text without escaping
    bold:VALUE  italic:VALUE  underline:VALUE  strike:VALUE  spoiler:VALUE
    code:VALUE      inline code
    quote:VALUE     block quote, lines separated by \\n
    int:N  float:X  uuid:ID|new  date:YYYY-MM-DD|today

EXAMPLES:
    markweave bold:Total int:1234 text:items
    markweave --strategy auto --separator ' | ' date:today uuid:new")]
struct Cli {
    /// Settings file (defaults to ~/.config/markweave/settings.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How the output buffer is sized
    #[arg(long, value_enum, default_value_t)]
    strategy: Strategy,

    /// Starting capacity for the hybrid strategy
    #[arg(long, value_name = "N")]
    hint: Option<usize>,

    /// Text placed between segments
    #[arg(long, default_value = " ")]
    separator: String,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    show_settings: bool,

    #[arg(value_name = "SEGMENT")]
    segments: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let composer = Composer::new(load_registry(cli.config.as_deref())?);

    if cli.show_settings {
        return Config::from_registry(composer.registry()).to_toml();
    }

    let parts = segment::parse_all(&cli.segments, &composer)?;
    let document = Fragment::join_with(parts, Fragment::text(cli.separator.clone()));
    render(&composer, &document, cli.strategy, cli.hint)
}

fn load_registry(path: Option<&std::path::Path>) -> Result<SettingsRegistry> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("Config file '{}' does not exist", path.display()))?,
        None => Config::load()?.unwrap_or_default(),
    };
    Ok(config.to_registry()?)
}

fn render(
    composer: &Composer,
    document: &Fragment,
    strategy: Strategy,
    hint: Option<usize>,
) -> Result<String> {
    let builder = composer.builder();
    let length = document.total_length();
    log::debug!("Rendering {length} chars with the {strategy:?} strategy");

    let output = match strategy {
        Strategy::Auto => builder.auto_growing(|w| w.push_node(document)),
        Strategy::Hybrid => builder.hybrid(hint.unwrap_or(length), |w| w.push_node(document)),
        Strategy::Precomputed => builder.precomputed(length, |w| w.push_node(document)),
    };
    Ok(output?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_config::Family;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("markweave").chain(args.iter().copied()))
    }

    fn write_config(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, body).unwrap();
        path.display().to_string()
    }

    #[rstest]
    #[case("auto")]
    #[case("hybrid")]
    #[case("precomputed")]
    fn every_strategy_renders_the_same(#[case] strategy: &str) {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, "");
        let args = [
            "--config", config.as_str(), "--strategy", strategy, "bold:Total", "int:1234", "items",
        ];
        assert_eq!(run(&cli(&args)).unwrap(), "**Total** 1234 items");
    }

    #[test]
    fn separator_and_small_hint() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, "");
        let args = [
            "--config", config.as_str(), "--hint", "1", "--separator", " | ", "a", "b", "c",
        ];
        assert_eq!(run(&cli(&args)).unwrap(), "a | b | c");
    }

    #[test]
    fn config_limits_apply() {
        let dir = TempDir::new().unwrap();
        let config = write_config(
            &dir,
            "[builder]\ninitial_buffer_length = 4\nmax_buffer_length = 8\n",
        );
        let args = ["--config", config.as_str(), "--strategy", "auto", "raw:way too long"];
        let err = run(&cli(&args)).unwrap_err();
        assert!(err.to_string().contains("Capacity exceeded"), "{err}");
    }

    #[test]
    fn show_settings_prints_effective_values() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, "[float]\ngrowth_factor = 1.5\n");
        let output = run(&cli(&["--config", config.as_str(), "--show-settings"])).unwrap();

        let shown: Config = toml::from_str(&output).unwrap();
        let registry = shown.to_registry().unwrap();
        assert_eq!(registry.get(Family::Float).growth_factor, 1.5);
        assert_eq!(registry.get(Family::Integer).initial_buffer_length, 8);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml").display().to_string();
        assert!(run(&cli(&["--config", missing.as_str(), "x"])).is_err());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, "[integer]\ngrowth_factor = 1.0\n");
        let err = run(&cli(&["--config", config.as_str(), "x"])).unwrap_err();
        assert!(err.to_string().contains("integer"), "{err}");
    }
}
