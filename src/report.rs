use std::fmt::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::models::LeaderboardResult;
use crate::window::Window;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    rank: usize,
    username: &'a str,
    user_id: u64,
    current_merit: i64,
    delta: i64,
}

pub fn build_report(result: &LeaderboardResult, limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Merit Leaderboard");
    let _ = writeln!(output, "Generated at {}", result.last_updated.to_rfc3339());

    for window in Window::ALL {
        let board = result.board(window);
        let _ = writeln!(output);
        let _ = writeln!(output, "## Top earners, last {} days", window.days());

        if board.is_empty() {
            let _ = writeln!(output, "No users recorded for this window.");
            continue;
        }

        for (rank, entry) in board.iter().take(limit).enumerate() {
            let _ = writeln!(
                output,
                "{}. {} (#{}) {:+} merit ({} total)",
                rank + 1,
                entry.username,
                entry.user_id,
                entry.delta(window),
                entry.current_merit
            );
        }
    }

    output
}

/// Writes one window's board as CSV, ranked from 1.
pub fn export_csv(result: &LeaderboardResult, window: Window, path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    let board = result.board(window);

    for (rank, entry) in board.iter().enumerate() {
        writer.serialize(ExportRow {
            rank: rank + 1,
            username: &entry.username,
            user_id: entry.user_id,
            current_merit: entry.current_merit,
            delta: entry.delta(window),
        })?;
    }
    writer.flush()?;

    Ok(board.len())
}
