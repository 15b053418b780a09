//! Text and HTML parsing for the merit thread and the merit data files.
//!
//! Anything that fails to parse is dropped here so the rest of the crate only
//! ever sees well-formed dates and totals.

use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::models::UserTotal;

const MERIT_MARKER: &str = "Merit received by";
const MERIT_FILE_MARKER: &str = "all_users_who_earned_Merit";

static POST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.td_headerandpost").expect("static selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static NAV_PAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.navPages").expect("static selector"));

/// A thread post that announces a merit data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeritPost {
    pub date: NaiveDate,
    pub file_url: String,
}

pub fn parse_merit_file(text: &str) -> Vec<UserTotal> {
    text.lines().filter_map(parse_merit_line).collect()
}

/// Parses `1,234 Merit received by name (#5678)`.
pub fn parse_merit_line(line: &str) -> Option<UserTotal> {
    let (head, tail) = line.split_once(MERIT_MARKER)?;

    let trimmed = head.trim_end();
    if trimmed.len() == head.len() {
        return None;
    }
    let count = trimmed.rsplit(char::is_whitespace).next()?;
    if !count.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }
    let merits: i64 = count.replace(',', "").parse().ok()?;

    if !tail.starts_with(char::is_whitespace) {
        return None;
    }
    for (idx, _) in tail.match_indices("(#") {
        let name = &tail[..idx];
        if !name.ends_with(char::is_whitespace) {
            continue;
        }
        let rest = &tail[idx + 2..];
        let Some(close) = rest.find(')') else {
            continue;
        };
        let Ok(user_id) = rest[..close].parse::<u64>() else {
            continue;
        };
        if !rest[..close].chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let username = name.trim();
        if username.is_empty() {
            continue;
        }
        return Some(UserTotal {
            user_id,
            username: username.to_string(),
            merits,
        });
    }

    None
}

/// Finds a stamp like `(2024-01-08_Mon_12.00h)` and returns its date.
pub fn parse_snapshot_stamp(text: &str) -> Option<NaiveDate> {
    text.match_indices('(').find_map(|(idx, _)| {
        let rest = &text[idx + 1..];
        let inner = &rest[..rest.find(')')?];
        stamp_date(inner)
    })
}

fn stamp_date(inner: &str) -> Option<NaiveDate> {
    let date_part = inner.get(..10)?;
    let rest = inner.get(10..)?.strip_prefix('_')?;
    let (word, time) = rest.rsplit_once('_')?;

    if word.is_empty() || !word.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let time = time.as_bytes();
    let time_ok = time.len() == 6
        && time[0].is_ascii_digit()
        && time[1].is_ascii_digit()
        && time[2] == b'.'
        && time[3].is_ascii_digit()
        && time[4].is_ascii_digit()
        && time[5] == b'h';
    if !time_ok {
        return None;
    }

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// First `YYYY-MM-DD` in a file name.
pub fn date_in_name(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    (0..bytes.len().saturating_sub(9)).find_map(|start| {
        let candidate = name.get(start..start + 10)?;
        let shaped = candidate
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
        if !shaped {
            return None;
        }
        NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()
    })
}

/// Highest page number in the thread's pagination links.
pub fn last_page_number(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    document
        .select(&NAV_PAGE)
        .filter_map(|link| link.text().collect::<String>().trim().parse::<u32>().ok())
        .max()
}

/// Posts by `author` that carry a snapshot stamp and a merit file link.
pub fn extract_posts(html: &str, author: &str) -> Vec<MeritPost> {
    let document = Html::parse_document(html);
    document
        .select(&POST)
        .filter(|post| {
            poster_info(*post)
                .map(|info| info.text().collect::<String>().contains(author))
                .unwrap_or(false)
        })
        .filter_map(|post| {
            let text: String = post.text().collect();
            let date = parse_snapshot_stamp(&text)?;
            let file_url = merit_file_link(post)?;
            Some(MeritPost { date, file_url })
        })
        .collect()
}

fn poster_info(post: ElementRef<'_>) -> Option<ElementRef<'_>> {
    post.prev_siblings().filter_map(ElementRef::wrap).find(|cell| {
        cell.value().name() == "td" && cell.value().classes().any(|c| c == "poster_info")
    })
}

fn merit_file_link(post: ElementRef<'_>) -> Option<String> {
    post.select(&LINK)
        .filter_map(|link| link.value().attr("href"))
        .find(|href| {
            href.find(MERIT_FILE_MARKER)
                .is_some_and(|idx| href[idx..].contains(".txt"))
        })
        .map(str::to_string)
}
