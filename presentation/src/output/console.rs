//! Console output formatter for scenario conversations

use colored::Colorize;
use tutor_application::EngineStats;
use tutor_domain::{Channel, Message, Role, Scenario, ScenarioState};

/// Formats messages and session state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format one message with a speaker label.
    pub fn format_message(message: &Message, character: &str) -> String {
        let label = Self::speaker(message, character);
        if message.is_error() {
            return format!("{} {}", label, message.content().red());
        }
        match message.channel() {
            Channel::Narration => format!("{} {}", label, message.content().italic()),
            Channel::Interaction => format!("{} {}", label, message.content()),
        }
    }

    /// Label shown in front of a message or a streaming reply.
    pub fn speaker(message: &Message, character: &str) -> String {
        match (message.channel(), message.role()) {
            (_, Role::User) => "you:".green().bold().to_string(),
            (Channel::Narration, Role::System) => "~".dimmed().to_string(),
            _ => format!("{}:", character).yellow().bold().to_string(),
        }
    }

    /// Format a whole history, one message per line.
    pub fn format_history(messages: &[Message], character: &str) -> String {
        if messages.is_empty() {
            return "(no messages)".dimmed().to_string();
        }
        messages
            .iter()
            .map(|m| {
                format!(
                    "{} {}",
                    m.timestamp().format("%H:%M:%S").to_string().dimmed(),
                    Self::format_message(m, character)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format as JSON
    pub fn format_history_json(messages: &[Message]) -> String {
        serde_json::to_string_pretty(messages).unwrap_or_else(|_| "[]".to_string())
    }

    /// Format the current scenario, its state and engine counters.
    pub fn format_status(
        current: Option<&Scenario>,
        state: Option<ScenarioState>,
        message_count: usize,
        stats: EngineStats,
    ) -> String {
        let mut output = String::new();
        output.push_str(&Self::section_header("Session"));

        match current {
            Some(scenario) => {
                output.push_str(&format!("{} {}\n", "Scenario:".cyan().bold(), scenario.id()));
                output.push_str(&format!(
                    "{} {}\n",
                    "Character:".cyan().bold(),
                    scenario.character_id()
                ));
                output.push_str(&format!(
                    "{} {}\n",
                    "State:".cyan().bold(),
                    state.map(|s| s.as_str()).unwrap_or("unknown")
                ));
                output.push_str(&format!("{} {}\n", "Messages:".cyan().bold(), message_count));
            }
            None => output.push_str(&format!("{}\n", "No active scenario".dimmed())),
        }

        output.push_str(&format!(
            "{} {} greetings, {} discarded, {} failures\n",
            "Engine:".cyan().bold(),
            stats.greeting_requests,
            stats.discarded_results,
            stats.responder_failures
        ));
        output
    }

    pub fn header(title: &str) -> String {
        let line = "=".repeat(48);
        format!("{}\n{:^48}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(32))
    }
}
