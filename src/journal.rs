use std::{io, path::{Path, PathBuf}};

use chrono::Local;
use tokio::{fs::{self, OpenOptions}, io::AsyncWriteExt};

use crate::setpoint::Setpoint;

pub const HISTORY_HEADER: &str = "timestamp,set_target,set_minimo,set_maximo";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Plain text record of every executed setpoint: an append-only csv history
/// and a one line snapshot of the latest state.
#[derive(Clone, Debug)]
pub struct Journal{
    history: PathBuf,
    state: PathBuf,
}

impl Journal{
    /// Creates the history file with its header if it is not there yet
    pub async fn open(history: impl Into<PathBuf>, state: impl Into<PathBuf>) -> io::Result<Journal> {
        let journal = Self{
            history: history.into(),
            state: state.into(),
        };
        if fs::metadata(&journal.history).await.is_err(){
            fs::write(&journal.history, format!("{}\n", HISTORY_HEADER)).await?;
        }
        Ok(journal)
    }

    /// Appends `sp` to the history and replaces the state snapshot
    pub async fn record(&self, sp: &Setpoint) -> io::Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut history = OpenOptions::new().create(true).append(true).open(&self.history).await?;
        history.write_all(history_line(&timestamp, sp).as_bytes()).await?;
        history.flush().await?;
        fs::write(&self.state, state_line(sp)).await
    }

    /// The whole history file
    pub async fn history(&self) -> io::Result<String> {
        fs::read_to_string(&self.history).await
    }

    pub fn history_path(&self) -> &Path {
        &self.history
    }
}

fn history_line(timestamp: &str, sp: &Setpoint) -> String {
    format!("{},set target {},set minimo {},set maximo {}\n", timestamp, sp.target(), sp.minimum(), sp.maximum())
}

fn state_line(sp: &Setpoint) -> String {
    format!("set target {}, set minimo {}, set maximo {}", sp.target(), sp.minimum(), sp.maximum())
}

#[cfg(test)]
mod tests{
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("setpoint-bridge-journal-{}-{}", std::process::id(), name))
    }

    #[test]
    fn line_formats(){
        let sp = Setpoint::new(20, 19, 21).unwrap();
        assert_eq!(history_line("2024-01-01 10:00:00", &sp), "2024-01-01 10:00:00,set target 20,set minimo 19,set maximo 21\n");
        assert_eq!(state_line(&sp), "set target 20, set minimo 19, set maximo 21");
    }

    #[tokio::test]
    async fn records_history_and_state(){
        let history = scratch("history.csv");
        let state = scratch("state.csv");
        let _ = std::fs::remove_file(&history);

        let journal = Journal::open(&history, &state).await.unwrap();
        journal.record(&Setpoint::new(20, 19, 21).unwrap()).await.unwrap();
        journal.record(&Setpoint::new(15, 12, 18).unwrap()).await.unwrap();

        let text = journal.history().await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HISTORY_HEADER);
        assert!(lines[1].ends_with(",set target 20,set minimo 19,set maximo 21"));
        assert!(lines[2].ends_with(",set target 15,set minimo 12,set maximo 18"));
        assert_eq!(std::fs::read_to_string(&state).unwrap(), "set target 15, set minimo 12, set maximo 18");

        // reopening keeps the existing history
        let journal = Journal::open(&history, &state).await.unwrap();
        assert_eq!(journal.history().await.unwrap().lines().count(), 3);

        std::fs::remove_file(&history).unwrap();
        std::fs::remove_file(&state).unwrap();
    }
}
