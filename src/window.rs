use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use tracing::info;

use crate::models::Snapshot;
use crate::store::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Window {
    #[value(name = "7d")]
    Week,
    #[value(name = "30d")]
    Month,
    #[value(name = "90d")]
    Quarter,
    #[value(name = "120d")]
    Third,
}

impl Window {
    pub const ALL: [Window; 4] = [Window::Week, Window::Month, Window::Quarter, Window::Third];

    pub fn days(self) -> i64 {
        match self {
            Window::Week => 7,
            Window::Month => 30,
            Window::Quarter => 90,
            Window::Third => 120,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Window::Week => "7d",
            Window::Month => "30d",
            Window::Quarter => "90d",
            Window::Third => "120d",
        }
    }

    fn index(self) -> usize {
        match self {
            Window::Week => 0,
            Window::Month => 1,
            Window::Quarter => 2,
            Window::Third => 3,
        }
    }
}

pub fn target_date(reference: NaiveDate, lookback_days: i64) -> NaiveDate {
    reference - Duration::days(lookback_days)
}

/// Picks the snapshot dated closest to `reference - lookback_days`.
/// Equal distances resolve to the older snapshot. `None` only for empty input.
pub fn resolve<'a>(
    snapshots: impl IntoIterator<Item = &'a Snapshot>,
    reference: NaiveDate,
    lookback_days: i64,
) -> Option<&'a Snapshot> {
    let target = target_date(reference, lookback_days);
    snapshots
        .into_iter()
        .min_by_key(|snapshot| ((snapshot.date - target).num_days().abs(), snapshot.date))
}

/// Change in a user's total since `prior`. A user missing from `prior` counts
/// their whole current total as gained.
pub fn compute_delta(current_total: i64, prior: Option<&Snapshot>, user_id: u64) -> i64 {
    let Some(prior) = prior else {
        return 0;
    };

    match prior.get(user_id) {
        Some(previous) => current_total - previous.merits,
        None => current_total,
    }
}

/// The comparison snapshot chosen for each window.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparisons<'a> {
    snapshots: [Option<&'a Snapshot>; 4],
}

impl<'a> Comparisons<'a> {
    pub fn resolve(store: &'a SnapshotStore, reference: NaiveDate) -> Self {
        let mut comparisons = Self::default();
        for window in Window::ALL {
            let chosen = resolve(store.snapshots(), reference, window.days());
            if let Some(snapshot) = chosen {
                info!(
                    window = window.label(),
                    target = %target_date(reference, window.days()),
                    chosen = %snapshot.date,
                    "resolved comparison snapshot"
                );
            }
            comparisons.snapshots[window.index()] = chosen;
        }
        comparisons
    }

    #[cfg(test)]
    pub fn with(mut self, window: Window, snapshot: &'a Snapshot) -> Self {
        self.snapshots[window.index()] = Some(snapshot);
        self
    }

    pub fn get(&self, window: Window) -> Option<&'a Snapshot> {
        self.snapshots[window.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserTotal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot(on: NaiveDate, rows: &[(u64, i64)]) -> Snapshot {
        Snapshot::new(
            on,
            rows.iter().map(|&(user_id, merits)| UserTotal {
                user_id,
                username: format!("user{user_id}"),
                merits,
            }),
        )
    }

    #[test]
    fn resolves_nearest_snapshot_to_target() {
        let snapshots = vec![
            snapshot(date(2024, 1, 1), &[]),
            snapshot(date(2024, 1, 5), &[]),
            snapshot(date(2024, 1, 8), &[]),
        ];

        let chosen = resolve(&snapshots, date(2024, 1, 8), 7).unwrap();
        assert_eq!(chosen.date, date(2024, 1, 1));

        let chosen = resolve(&snapshots, date(2024, 1, 8), 4).unwrap();
        assert_eq!(chosen.date, date(2024, 1, 5));
    }

    #[test]
    fn tie_prefers_older_snapshot_regardless_of_order() {
        let snapshots = vec![
            snapshot(date(2024, 1, 6), &[]),
            snapshot(date(2024, 1, 2), &[]),
        ];

        // target 2024-01-04 is two days from both
        let chosen = resolve(&snapshots, date(2024, 1, 11), 7).unwrap();
        assert_eq!(chosen.date, date(2024, 1, 2));

        let reversed: Vec<&Snapshot> = snapshots.iter().rev().collect();
        let chosen = resolve(reversed, date(2024, 1, 11), 7).unwrap();
        assert_eq!(chosen.date, date(2024, 1, 2));
    }

    #[test]
    fn shallow_history_still_resolves_to_a_member() {
        let snapshots = vec![snapshot(date(2024, 3, 1), &[]), snapshot(date(2024, 3, 4), &[])];

        let chosen = resolve(&snapshots, date(2024, 3, 4), 120).unwrap();
        assert!(snapshots.iter().any(|s| s.date == chosen.date));
        assert_eq!(chosen.date, date(2024, 3, 1));
    }

    #[test]
    fn empty_input_resolves_to_none() {
        let snapshots: Vec<Snapshot> = Vec::new();
        assert!(resolve(&snapshots, date(2024, 1, 8), 7).is_none());
    }

    #[test]
    fn delta_handles_known_new_and_missing_prior() {
        let prior = snapshot(date(2024, 1, 1), &[(1, 100), (3, 50)]);

        assert_eq!(compute_delta(140, Some(&prior), 1), 40);
        assert_eq!(compute_delta(10, Some(&prior), 2), 10);
        assert_eq!(compute_delta(45, Some(&prior), 3), -5);
        assert_eq!(compute_delta(140, None, 1), 0);
    }

    #[test]
    fn comparisons_cover_every_window() {
        let store: SnapshotStore = vec![
            snapshot(date(2024, 1, 1), &[]),
            snapshot(date(2024, 4, 1), &[]),
            snapshot(date(2024, 5, 1), &[]),
        ]
        .into_iter()
        .collect();

        let comparisons = Comparisons::resolve(&store, date(2024, 5, 1));
        assert_eq!(comparisons.get(Window::Week).map(|s| s.date), Some(date(2024, 5, 1)));
        assert_eq!(comparisons.get(Window::Month).map(|s| s.date), Some(date(2024, 4, 1)));
        assert_eq!(comparisons.get(Window::Quarter).map(|s| s.date), Some(date(2024, 1, 1)));
        assert_eq!(comparisons.get(Window::Third).map(|s| s.date), Some(date(2024, 1, 1)));
    }
}
