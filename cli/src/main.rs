//! CLI entrypoint for Scenario Tutor
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tutor_application::{AiResponder, ChatSessionEngine, GreetingProvider};
use tutor_infrastructure::{
    ConfigLoader, FileConfig, JsonFileSnapshotStore, JsonlConversationLogger, ResponderKind,
    ScriptedResponder, Severity, TableGreetingProvider,
};
use tutor_presentation::{ChatRepl, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let _log_guard = init_tracing(&cli)?;
    info!("Starting Scenario Tutor");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!("{}", e))?
    };

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => eprintln!("config error: {}", issue),
            Severity::Warning => warn!("config: {}", issue),
        }
    }
    if issues.iter().any(|i| i.severity == Severity::Error) {
        bail!("invalid configuration");
    }

    // === Dependency Injection ===
    let engine = build_engine(&config)?;

    let character = cli
        .character
        .clone()
        .unwrap_or_else(|| config.repl.character.clone());
    let scenario = cli.starting_scenario(&character)?;

    let repl = ChatRepl::new(engine, character)
        .with_pacing(config.repl.honor_pacing && !cli.no_pacing)
        .with_history_file(config.repl.history_file.as_ref().map(Into::into));

    match cli.message.as_deref() {
        Some(message) => repl.run_once(scenario, message).await,
        None => repl.run(scenario).await?,
    }

    Ok(())
}

/// Log level for a `-v` count.
fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    }
}

/// Stderr logging by default; `--log-file` routes it through a background writer.
/// A valid `RUST_LOG` takes precedence over `-v`.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(cli.verbose)));

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file {} has no file name", path.display()))?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("creating log directory {}", directory.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn build_engine(config: &FileConfig) -> Result<ChatSessionEngine> {
    let responder = build_responder(config)?;
    let greeter: Arc<dyn GreetingProvider> = Arc::new(
        TableGreetingProvider::new(config.greetings.characters.clone())
            .with_fallback(config.greetings.fallback.clone()),
    );

    let mut engine =
        ChatSessionEngine::new(responder, greeter).with_params(config.to_engine_params());

    if let Some(directory) = config.persistence.resolved_directory() {
        info!("History snapshots in {}", directory.display());
        engine = engine.with_snapshot_store(Arc::new(JsonFileSnapshotStore::new(directory)));
    }

    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::new(path) {
            Some(logger) => engine = engine.with_conversation_logger(Arc::new(logger)),
            None => warn!("Conversation log disabled"),
        }
    }

    Ok(engine)
}

fn build_responder(config: &FileConfig) -> Result<Arc<dyn AiResponder>> {
    match config.responder.kind {
        ResponderKind::Scripted => Ok(Arc::new(
            ScriptedResponder::new()
                .with_replies(config.responder.scripted_replies.clone())
                .with_chunk_delay(Duration::from_millis(40)),
        )),
        ResponderKind::Http => http_responder(config),
    }
}

#[cfg(feature = "http-responder")]
fn http_responder(config: &FileConfig) -> Result<Arc<dyn AiResponder>> {
    let settings = &config.responder;
    let mut responder = tutor_infrastructure::OpenAiCompatibleResponder::new(&settings.model)
        .with_base_url(&settings.base_url);
    match std::env::var(&settings.api_key_env) {
        Ok(key) => responder = responder.with_api_key(key),
        Err(_) => warn!("{} is not set; sending requests without a key", settings.api_key_env),
    }
    if let Some(prompt) = &settings.system_prompt {
        responder = responder.with_system_prompt(prompt);
    }
    Ok(Arc::new(responder))
}

#[cfg(not(feature = "http-responder"))]
fn http_responder(_config: &FileConfig) -> Result<Arc<dyn AiResponder>> {
    bail!("responder.kind = \"http\" requires building with --features http-responder")
}
