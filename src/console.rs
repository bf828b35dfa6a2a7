use std::sync::Arc;

use log::warn;

use crate::{bridge::Bridge, command::looks_like_setpoint};

pub const HELP: &str = "\
target+ / target-   move the target (bounds follow)
min+ / min-         move the minimum
max+ / max-         move the maximum
exec                push the current setpoints
send <command>      push free text, e.g. send SP:20,SM:21,Sm:19
status              show connection and setpoints
logs                show the execute history
help                this text
quit                leave";

/// One line typed at the operator console
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action{
    IncrementTarget,
    DecrementTarget,
    IncrementMinimum,
    DecrementMinimum,
    IncrementMaximum,
    DecrementMaximum,
    Execute,
    Send(String),
    Status,
    Logs,
    Help,
    Quit,
    Nothing,
    Unknown(String),
}

impl Action{
    pub fn parse(line: &str) -> Action {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace){
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        match word.to_ascii_lowercase().as_str(){
            "" => Action::Nothing,
            "target+" => Action::IncrementTarget,
            "target-" => Action::DecrementTarget,
            "min+" => Action::IncrementMinimum,
            "min-" => Action::DecrementMinimum,
            "max+" => Action::IncrementMaximum,
            "max-" => Action::DecrementMaximum,
            "exec" | "execute" => Action::Execute,
            "send" => Action::Send(rest.to_string()),
            "status" => Action::Status,
            "logs" => Action::Logs,
            "help" | "?" => Action::Help,
            "quit" | "exit" => Action::Quit,
            _ => Action::Unknown(line.to_string()),
        }
    }
}

/// Runs one console action against the bridge and returns the text to show.
/// `None` means the console should stop.
pub async fn run(bridge: &Arc<Bridge>, action: Action) -> Option<String> {
    let text = match action{
        Action::IncrementTarget => bridge.increment_target().await.to_string(),
        Action::DecrementTarget => bridge.decrement_target().await.to_string(),
        Action::IncrementMinimum => bridge.increment_minimum().await.to_string(),
        Action::DecrementMinimum => bridge.decrement_minimum().await.to_string(),
        Action::IncrementMaximum => bridge.increment_maximum().await.to_string(),
        Action::DecrementMaximum => bridge.decrement_maximum().await.to_string(),
        Action::Execute => {
            let report = bridge.execute().await;
            match (report.sent, &report.response){
                (true, Some(reply)) => format!("{} sent, device confirmed: {}", report.command, reply),
                (true, None) => format!("{} sent, no response captured", report.command),
                (false, _) => format!("{} not sent", report.command),
            }
        }
        Action::Send(text) => {
            let reply = bridge.send_custom(&text).await;
            let json = serde_json::to_string(&reply).unwrap_or(reply.message);
            if text.is_empty() || looks_like_setpoint(&text){
                json
            }
            else{
                warn!("Free text '{}' is not a setpoint line", text);
                format!("Note: not in SP:value,SM:value,Sm:value form\n{}", json)
            }
        }
        Action::Status => {
            let status = bridge.status().await;
            let mut text = serde_json::to_string_pretty(&status).unwrap_or_else(|e| e.to_string());
            if !status.connected{
                if let Some(e) = bridge.last_error().await{
                    text.push_str(&format!("\nlast error: {}", e));
                }
            }
            text
        }
        Action::Logs => match bridge.history().await{
            Ok(history) => history,
            Err(e) => format!("Could not read history: {}", e),
        },
        Action::Help => HELP.to_string(),
        Action::Quit => return None,
        Action::Nothing => String::new(),
        Action::Unknown(line) => format!("Unknown command '{}', type help", line),
    };
    Some(text)
}
