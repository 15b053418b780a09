use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::window::Window;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTotal {
    pub user_id: u64,
    pub username: String,
    pub merits: i64,
}

/// Every user's cumulative merit on one day.
///
/// Users keep the order of the source file. A user id listed twice keeps its
/// first position and takes the later row's values.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: NaiveDate,
    users: Vec<UserTotal>,
    index: HashMap<u64, usize>,
}

impl Snapshot {
    pub fn new(date: NaiveDate, rows: impl IntoIterator<Item = UserTotal>) -> Self {
        let mut users: Vec<UserTotal> = Vec::new();
        let mut index = HashMap::new();

        for row in rows {
            match index.get(&row.user_id) {
                Some(&pos) => users[pos] = row,
                None => {
                    index.insert(row.user_id, users.len());
                    users.push(row);
                }
            }
        }

        Self { date, users, index }
    }

    pub fn users(&self) -> &[UserTotal] {
        &self.users
    }

    pub fn get(&self, user_id: u64) -> Option<&UserTotal> {
        self.index.get(&user_id).map(|&pos| &self.users[pos])
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(rename = "userId")]
    pub user_id: u64,
    #[serde(rename = "currentMerit")]
    pub current_merit: i64,
    #[serde(rename = "merit7d")]
    pub merit_7d: i64,
    #[serde(rename = "merit30d")]
    pub merit_30d: i64,
    #[serde(rename = "merit90d")]
    pub merit_90d: i64,
    #[serde(rename = "merit120d")]
    pub merit_120d: i64,
}

impl LeaderboardEntry {
    pub fn delta(&self, window: Window) -> i64 {
        match window {
            Window::Week => self.merit_7d,
            Window::Month => self.merit_30d,
            Window::Quarter => self.merit_90d,
            Window::Third => self.merit_120d,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardResult {
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "leaderboard7d")]
    pub leaderboard_7d: Vec<LeaderboardEntry>,
    #[serde(rename = "leaderboard30d")]
    pub leaderboard_30d: Vec<LeaderboardEntry>,
    #[serde(rename = "leaderboard90d")]
    pub leaderboard_90d: Vec<LeaderboardEntry>,
    #[serde(rename = "leaderboard120d")]
    pub leaderboard_120d: Vec<LeaderboardEntry>,
}

impl LeaderboardResult {
    pub fn board(&self, window: Window) -> &[LeaderboardEntry] {
        match window {
            Window::Week => &self.leaderboard_7d,
            Window::Month => &self.leaderboard_30d,
            Window::Quarter => &self.leaderboard_90d,
            Window::Third => &self.leaderboard_120d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: u64, username: &str, merits: i64) -> UserTotal {
        UserTotal {
            user_id,
            username: username.to_string(),
            merits,
        }
    }

    #[test]
    fn duplicate_user_keeps_first_position_and_last_value() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let snapshot = Snapshot::new(
            date,
            vec![row(1, "alice", 10), row(2, "bob", 5), row(1, "alice2", 12)],
        );

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.users()[0].username, "alice2");
        assert_eq!(snapshot.get(1).map(|u| u.merits), Some(12));
        assert_eq!(snapshot.get(3), None);
    }

    #[test]
    fn serializes_with_published_field_names() {
        let entry = LeaderboardEntry {
            username: "alice".to_string(),
            user_id: 42,
            current_merit: 100,
            merit_7d: 1,
            merit_30d: 2,
            merit_90d: 3,
            merit_120d: 4,
        };
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["userId"], 42);
        assert_eq!(value["currentMerit"], 100);
        assert_eq!(value["merit7d"], 1);
        assert_eq!(value["merit120d"], 4);
    }
}
