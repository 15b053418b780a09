use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{LeaderboardEntry, LeaderboardResult, Snapshot};
use crate::store::SnapshotStore;
use crate::window::{compute_delta, Comparisons, Window};

pub const DEFAULT_LIMIT: usize = 200;

/// Ranks every user in `latest` against the comparison snapshots.
pub fn assemble(
    latest: &Snapshot,
    comparisons: &Comparisons<'_>,
    limit: usize,
    generated_at: DateTime<Utc>,
) -> LeaderboardResult {
    let entries: Vec<LeaderboardEntry> = latest
        .users()
        .iter()
        .map(|user| {
            let delta = |window| compute_delta(user.merits, comparisons.get(window), user.user_id);
            LeaderboardEntry {
                username: user.username.clone(),
                user_id: user.user_id,
                current_merit: user.merits,
                merit_7d: delta(Window::Week),
                merit_30d: delta(Window::Month),
                merit_90d: delta(Window::Quarter),
                merit_120d: delta(Window::Third),
            }
        })
        .collect();

    LeaderboardResult {
        last_updated: generated_at,
        leaderboard_7d: ranked(&entries, Window::Week, limit),
        leaderboard_30d: ranked(&entries, Window::Month, limit),
        leaderboard_90d: ranked(&entries, Window::Quarter, limit),
        leaderboard_120d: ranked(&entries, Window::Third, limit),
    }
}

/// Builds the leaderboard from the newest snapshot in the store, or `None`
/// when nothing was collected.
pub fn build(
    store: &SnapshotStore,
    limit: usize,
    generated_at: DateTime<Utc>,
) -> Option<LeaderboardResult> {
    let latest = store.latest()?;
    let comparisons = Comparisons::resolve(store, latest.date);
    let result = assemble(latest, &comparisons, limit, generated_at);

    info!(
        latest = %latest.date,
        earliest = ?store.oldest().map(|s| s.date),
        snapshots = store.len(),
        users = latest.len(),
        "leaderboard assembled"
    );

    Some(result)
}

fn ranked(entries: &[LeaderboardEntry], window: Window, limit: usize) -> Vec<LeaderboardEntry> {
    let mut board = entries.to_vec();
    // stable: equal deltas keep snapshot order
    board.sort_by(|a, b| b.delta(window).cmp(&a.delta(window)));
    board.truncate(limit);
    board
}
