//! REPL (Read-Eval-Print Loop) for interactive scenario chat

use crate::ConsoleFormatter;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tutor_application::ChatSessionEngine;
use tutor_domain::{Channel, DomainError, Message, Scenario, ScenarioId, ScenarioType};

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `/scenario <type> [key=value ...]`
    Scenario(ScenarioSpec),
    /// `/detour <type> [key=value ...]`
    Detour(ScenarioSpec),
    /// `/character <id>`
    Character(String),
    Pause,
    /// `/resume [<type> key=value ...]`; without arguments, the most
    /// recently paused scenario
    Resume(Option<ScenarioSpec>),
    Clear,
    Terminate,
    /// `/history [narration|interaction|json]`
    History(HistoryView),
    Narrate(String),
    Status,
    Help,
    Quit,
}

/// Scenario requested from the REPL, for the current character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpec {
    pub scenario_type: ScenarioType,
    pub context: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryView {
    All,
    Only(Channel),
    Json,
}

impl ReplCommand {
    /// Parse a line starting with `/`.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "/quit" | "/exit" | "/q" => Ok(ReplCommand::Quit),
            "/help" | "/h" | "/?" => Ok(ReplCommand::Help),
            "/scenario" | "/s" => parse_spec(rest).map(ReplCommand::Scenario),
            "/detour" => parse_spec(rest).map(ReplCommand::Detour),
            "/character" | "/c" => {
                if rest.is_empty() {
                    return Err("usage: /character <id>".to_string());
                }
                Ok(ReplCommand::Character(rest.to_string()))
            }
            "/pause" => Ok(ReplCommand::Pause),
            "/resume" if rest.is_empty() => Ok(ReplCommand::Resume(None)),
            "/resume" => parse_spec(rest).map(|spec| ReplCommand::Resume(Some(spec))),
            "/clear" => Ok(ReplCommand::Clear),
            "/terminate" => Ok(ReplCommand::Terminate),
            "/history" => match rest {
                "" => Ok(ReplCommand::History(HistoryView::All)),
                "narration" => Ok(ReplCommand::History(HistoryView::Only(Channel::Narration))),
                "interaction" => Ok(ReplCommand::History(HistoryView::Only(Channel::Interaction))),
                "json" => Ok(ReplCommand::History(HistoryView::Json)),
                other => Err(format!("unknown history view: {}", other)),
            },
            "/narrate" => {
                if rest.is_empty() {
                    return Err("usage: /narrate <text>".to_string());
                }
                Ok(ReplCommand::Narrate(rest.replace("\\n", "\n")))
            }
            "/status" => Ok(ReplCommand::Status),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

fn parse_spec(rest: &str) -> Result<ScenarioSpec, String> {
    let mut parts = rest.split_whitespace();
    let scenario_type = match parts.next() {
        Some(t) => ScenarioType::from_str(t).map_err(|e| e.to_string())?,
        None => return Err("usage: /scenario <general|menu|task> [key=value ...]".to_string()),
    };
    let context = parts
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| format!("expected key=value, got '{}'", pair))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ScenarioSpec {
        scenario_type,
        context,
    })
}

/// Interactive chat REPL
pub struct ChatRepl {
    engine: ChatSessionEngine,
    character: String,
    honor_pacing: bool,
    history_file: Option<PathBuf>,
    paused: Vec<ScenarioId>,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(engine: ChatSessionEngine, character: impl Into<String>) -> Self {
        Self {
            engine,
            character: character.into(),
            honor_pacing: true,
            history_file: dirs::data_dir().map(|p| p.join("scenario-tutor").join("history.txt")),
            paused: Vec::new(),
        }
    }

    /// Set whether narration waits out its pacing hints
    pub fn with_pacing(mut self, honor: bool) -> Self {
        self.honor_pacing = honor;
        self
    }

    /// Override the readline history file
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_file = path;
        }
        self
    }

    /// Run the interactive REPL, starting in `scenario`.
    pub async fn run(mut self, scenario: Scenario) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();
        self.enter(scenario).await;

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    // Handle commands
                    if line.starts_with('/') {
                        match ReplCommand::parse(line) {
                            Ok(command) => {
                                if self.handle_command(command).await {
                                    break;
                                }
                            }
                            Err(message) => {
                                println!("{}", message);
                                println!("Type /help for available commands");
                            }
                        }
                        continue;
                    }

                    self.process_message(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        // Save history
        if let Some(ref path) = self.history_file {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    /// Enter `scenario`, send one message, print the reply and return.
    pub async fn run_once(self, scenario: Scenario, text: &str) {
        self.enter(scenario).await;
        self.process_message(text).await;
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", ConsoleFormatter::header("Scenario Tutor"));
        println!();
        println!("Character: {}", self.character);
        println!("Type /help for commands.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /scenario <type> [k=v ...]  - Switch scenario (general, menu, task)");
        println!("  /detour <type> [k=v ...]    - Pause this scenario and open another");
        println!("  /character <id>             - Talk to another character");
        println!("  /pause                      - Pause the current scenario");
        println!("  /resume [<type> k=v ...]    - Resume a scenario (default: last paused)");
        println!("  /clear                      - Clear this scenario's history");
        println!("  /terminate                  - Forget this scenario entirely");
        println!("  /history [narration|interaction|json]");
        println!("  /narrate <text>             - Play script text as narration");
        println!("  /status                     - Show session state");
        println!("  /quit, /exit, /q            - Exit chat");
        println!();
    }

    /// Handle a slash command. Returns true if should exit.
    async fn handle_command(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => Self::print_help(),
            ReplCommand::Scenario(spec) => match self.build(&spec) {
                Ok(scenario) => self.enter(scenario).await,
                Err(e) => println!("{}", e.to_string().red()),
            },
            ReplCommand::Detour(spec) => match self.build(&spec) {
                Ok(scenario) => {
                    let target = scenario.id().clone();
                    if let Some(paused) = self.engine.detour(scenario).await {
                        println!("{} {}", "paused".dimmed(), paused);
                        self.paused.push(paused);
                    }
                    self.show_arrival(&target).await;
                }
                Err(e) => println!("{}", e.to_string().red()),
            },
            ReplCommand::Character(character) => {
                self.character = character;
                match Scenario::general(self.character.clone()) {
                    Ok(scenario) => self.enter(scenario).await,
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            ReplCommand::Pause => {
                if let Some(id) = self.current_id().await {
                    self.report(self.engine.pause(&id).await);
                    self.paused.push(id);
                }
            }
            ReplCommand::Resume(target) => {
                let id = match target {
                    Some(spec) => match self.build(&spec) {
                        Ok(scenario) => Some(scenario.id().clone()),
                        Err(e) => {
                            println!("{}", e.to_string().red());
                            return false;
                        }
                    },
                    None => self.paused.pop(),
                };
                match id {
                    Some(id) => {
                        let result = self.engine.resume(&id).await;
                        let resumed = result.is_ok();
                        self.report(result);
                        if resumed {
                            self.paused.retain(|p| p != &id);
                            if let Some(scenario) = self.engine.current_scenario().await {
                                self.character = scenario.character_id().to_string();
                            }
                            self.show_arrival(&id).await;
                        }
                    }
                    None => println!("Nothing to resume"),
                }
            }
            ReplCommand::Clear => {
                if let Some(id) = self.current_id().await {
                    self.engine.clear_history(&id).await;
                    println!("{}", "History cleared".dimmed());
                }
            }
            ReplCommand::Terminate => {
                if let Some(id) = self.current_id().await {
                    self.report(self.engine.terminate(&id).await);
                    self.paused.retain(|p| p != &id);
                    println!("{}", "Scenario terminated; use /scenario to start another".dimmed());
                }
            }
            ReplCommand::History(view) => {
                if let Some(id) = self.current_id().await {
                    self.print_history(&id, view).await;
                }
            }
            ReplCommand::Narrate(text) => match self.engine.narrate(&text).await {
                Ok(segments) => {
                    let messages: Vec<Message> = segments.into_iter().map(Message::from).collect();
                    self.play(&messages).await;
                }
                Err(e) => println!("{}", e.to_string().red()),
            },
            ReplCommand::Status => {
                let current = self.engine.current_scenario().await;
                let (state, count) = match &current {
                    Some(s) => (
                        self.engine.scenario_state(s.id()).await,
                        self.engine.history(s.id(), None).await.len(),
                    ),
                    None => (None, 0),
                };
                println!(
                    "{}",
                    ConsoleFormatter::format_status(current.as_ref(), state, count, self.engine.stats())
                );
            }
        }
        false
    }

    async fn process_message(&self, text: &str) {
        let mut stream = match self.engine.submit_user_message(text).await {
            Ok(stream) => stream,
            Err(DomainError::NoActiveScenario) => {
                println!("No active scenario. Use /scenario to start one.");
                return;
            }
            Err(e) => {
                println!("{}", e.to_string().red());
                return;
            }
        };

        let mut printed = 0;
        let mut started = false;
        while let Some(message) = stream.next_message().await {
            if message.is_error() {
                if started {
                    println!();
                }
                println!("{}", ConsoleFormatter::format_message(&message, &self.character));
                return;
            }
            if !started {
                print!("{} ", ConsoleFormatter::speaker(&message, &self.character));
                started = true;
            }
            // Snapshots grow monotonically; print only the new tail.
            let content = message.content();
            if let Some(tail) = content.get(printed..) {
                print!("{}", tail);
                let _ = std::io::stdout().flush();
            }
            printed = content.len();
        }
        if started {
            println!();
        } else {
            println!("{}", "(reply discarded after a scenario switch)".dimmed());
        }
    }

    fn build(&self, spec: &ScenarioSpec) -> Result<Scenario, DomainError> {
        Scenario::new(self.character.clone(), spec.scenario_type, spec.context.clone())
    }

    async fn enter(&self, scenario: Scenario) {
        let id = scenario.id().clone();
        self.engine.set_scenario(scenario).await;
        self.show_arrival(&id).await;
    }

    /// Print where we are and what was said last.
    async fn show_arrival(&self, id: &ScenarioId) {
        println!("{} {}", "scenario".dimmed(), id.to_string().cyan());
        let history = self.engine.history(id, None).await;
        let skipped = history.len().saturating_sub(3);
        if skipped > 0 {
            println!("{}", format!("({} earlier messages, see /history)", skipped).dimmed());
        }
        for message in &history[skipped..] {
            println!("{}", ConsoleFormatter::format_message(message, &self.character));
        }
    }

    async fn play(&self, messages: &[Message]) {
        for message in messages {
            println!("{}", ConsoleFormatter::format_message(message, &self.character));
            if !self.honor_pacing {
                continue;
            }
            if let Some(pacing) = message.as_narration().and_then(|n| n.pacing()) {
                tokio::time::sleep(pacing.display_duration + pacing.gap_after).await;
            }
        }
    }

    async fn print_history(&self, id: &ScenarioId, view: HistoryView) {
        let messages = match view {
            HistoryView::All | HistoryView::Json => self.engine.history(id, None).await,
            HistoryView::Only(channel) => self.engine.history(id, Some(channel)).await,
        };
        match view {
            HistoryView::Json => println!("{}", ConsoleFormatter::format_history_json(&messages)),
            _ => println!("{}", ConsoleFormatter::format_history(&messages, &self.character)),
        }
    }

    async fn current_id(&self) -> Option<ScenarioId> {
        let current = self.engine.current_scenario().await.map(|s| s.id().clone());
        if current.is_none() {
            println!("No active scenario");
        }
        current
    }

    fn report(&self, result: Result<(), DomainError>) {
        if let Err(e) = result {
            println!("{}", e.to_string().red());
        }
    }
}
