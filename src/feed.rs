use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::config::ForumSettings;
use crate::error::{MeritError, Result};
use crate::models::Snapshot;
use crate::parse::{self, MeritPost};
use crate::store::SnapshotStore;

/// Offset that lands on the thread's last page.
const LAST_PAGE_OFFSET: u32 = 99999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanMode {
    /// Stop once enough history for the longest window is collected
    Update,
    /// Walk every page of the thread
    Initial,
}

/// Scrapes merit snapshots from the forum thread, newest page first.
pub struct ThreadFeed<'a> {
    client: reqwest::Client,
    forum: &'a ForumSettings,
}

impl<'a> ThreadFeed<'a> {
    pub fn new(forum: &'a ForumSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(forum.user_agent.clone())
            .build()?;
        Ok(Self { client, forum })
    }

    async fn get_text(&self, url: &str, timeout_secs: u64) -> Result<String> {
        let text = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    pub async fn page_count(&self) -> Result<u32> {
        let url = format!("{}{}", self.forum.base_url, LAST_PAGE_OFFSET);
        let html = self.get_text(&url, self.forum.page_timeout_secs).await?;
        parse::last_page_number(&html)
            .ok_or_else(|| MeritError::Layout(format!("no page navigation at {url}")))
    }

    /// Downloads and parses one merit file. Failures are logged and dropped.
    pub async fn fetch_snapshot(&self, post: &MeritPost) -> Option<Snapshot> {
        debug!(url = %post.file_url, date = %post.date, "downloading merit file");
        let text = match self.get_text(&post.file_url, self.forum.file_timeout_secs).await {
            Ok(text) => text,
            Err(err) => {
                warn!(url = %post.file_url, error = %err, "could not download merit file");
                return None;
            }
        };

        let snapshot = Snapshot::new(post.date, parse::parse_merit_file(&text));
        if snapshot.is_empty() {
            warn!(url = %post.file_url, "merit file had no users");
            return None;
        }
        Some(snapshot)
    }

    pub async fn collect(&self, mode: ScanMode, today: NaiveDate) -> Result<SnapshotStore> {
        let required = today - chrono::Duration::days(self.forum.history_days);
        let pages = self.page_count().await?;
        info!(pages, ?mode, required = %required, "scanning merit thread");

        let mut store = SnapshotStore::new();
        for page in (0..pages).rev() {
            let offset = post_offset(page, self.forum.page_size);
            let url = format!("{}{}", self.forum.base_url, offset);
            debug!(%url, "scraping page");

            let html = match self.get_text(&url, self.forum.page_timeout_secs).await {
                Ok(html) => html,
                Err(err) => {
                    warn!(%url, error = %err, "failed to fetch page");
                    continue;
                }
            };

            let mut oldest: Option<NaiveDate> = None;
            for post in parse::extract_posts(&html, &self.forum.author) {
                let Some(snapshot) = self.fetch_snapshot(&post).await else {
                    continue;
                };
                oldest = Some(oldest.map_or(snapshot.date, |d| d.min(snapshot.date)));
                info!(date = %snapshot.date, users = snapshot.len(), "collected snapshot");
                if store.insert(snapshot) {
                    debug!(date = %post.date, "replaced snapshot with same date");
                }
            }

            if mode == ScanMode::Update {
                if let Some(oldest) = oldest.filter(|d| *d <= required) {
                    info!(oldest = %oldest, "sufficient history collected; stopping page scan");
                    break;
                }
            }
        }

        Ok(store)
    }
}

/// First post index of a zero-based page.
fn post_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page) * u64::from(page_size)
}

/// Loads every `*.txt` merit file in `dir`, dated by its file name.
/// Unreadable or undated files are skipped.
pub fn load_directory(dir: &Path) -> Result<SnapshotStore> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    Ok(paths.iter().filter_map(|path| load_file(path)).collect())
}

fn load_file(path: &Path) -> Option<Snapshot> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(date) = parse::date_in_name(&name) else {
        warn!(file = %path.display(), "no date in file name; skipping");
        return None;
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "could not read merit file; skipping");
            return None;
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    let snapshot = Snapshot::new(date, parse::parse_merit_file(&text));
    if snapshot.is_empty() {
        warn!(file = %path.display(), "merit file had no users; skipping");
        return None;
    }
    debug!(file = %path.display(), %date, users = snapshot.len(), "loaded snapshot");
    Some(snapshot)
}
