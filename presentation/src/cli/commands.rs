//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tutor_domain::{DomainError, Scenario, ScenarioType};

/// Scenario type of the starting scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioTypeArg {
    /// Free-form chat with the character
    General,
    /// A topic or lesson menu
    Menu,
    /// A concrete task or module
    Task,
}

impl From<ScenarioTypeArg> for ScenarioType {
    fn from(arg: ScenarioTypeArg) -> Self {
        match arg {
            ScenarioTypeArg::General => ScenarioType::General,
            ScenarioTypeArg::Menu => ScenarioType::MenuContext,
            ScenarioTypeArg::Task => ScenarioType::TaskContext,
        }
    }
}

/// CLI arguments for scenario-tutor
#[derive(Parser, Debug)]
#[command(name = "scenario-tutor")]
#[command(author, version, about = "Scenario-aware tutoring chat with per-context histories")]
#[command(long_about = r#"
Scenario Tutor keeps a separate conversation for every place in a learning
app: a general chat with a character, a topic menu, or a concrete task.
Switching scenarios never mixes histories, and replies that arrive after a
switch are discarded.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./tutor.toml        Project-level config
3. ~/.config/scenario-tutor/config.toml   Global config

Example:
  scenario-tutor
  scenario-tutor -c dr-cell -t menu -k topic=biology
  scenario-tutor -c ms-ohm "What is resistance?"
"#)]
pub struct Cli {
    /// Send one message, print the reply and exit
    pub message: Option<String>,

    /// Character to talk to (overrides [repl].character)
    #[arg(short, long, value_name = "ID")]
    pub character: Option<String>,

    /// Type of the starting scenario
    #[arg(short = 't', long = "type", value_enum, default_value = "general")]
    pub scenario_type: ScenarioTypeArg,

    /// Context of the starting scenario (can be specified multiple times)
    #[arg(short = 'k', long = "context", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub context: Vec<(String, String)>,

    /// Print narration without pacing delays
    #[arg(long)]
    pub no_pacing: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Scenario the session starts in.
    pub fn starting_scenario(&self, character: &str) -> Result<Scenario, DomainError> {
        Scenario::new(character, self.scenario_type.into(), self.context.clone())
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["scenario-tutor"]).unwrap();
        assert!(cli.message.is_none());
        assert_eq!(cli.scenario_type, ScenarioTypeArg::General);
        assert!(cli.context.is_empty());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_starting_scenario() {
        let cli = Cli::try_parse_from([
            "scenario-tutor",
            "-c",
            "dr-cell",
            "-t",
            "menu",
            "-k",
            "topic=biology",
            "-vv",
            "What is a cell?",
        ])
        .unwrap();

        assert_eq!(cli.character.as_deref(), Some("dr-cell"));
        assert_eq!(cli.message.as_deref(), Some("What is a cell?"));
        assert_eq!(cli.verbose, 2);

        let scenario = cli.starting_scenario("dr-cell").unwrap();
        assert_eq!(scenario.scenario_type(), ScenarioType::MenuContext);
        assert_eq!(scenario.context("topic"), Some("biology"));
    }

    #[test]
    fn test_context_requires_key_value() {
        assert!(Cli::try_parse_from(["scenario-tutor", "-k", "topic"]).is_err());
        assert!(Cli::try_parse_from(["scenario-tutor", "-k", "=x"]).is_err());
    }
}
