//! Render models for the destination lists and the recent-post feed.
//!
//! Everything here is a pure function of server data plus local selection.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::{
    api::{Destination, PostStatus, RecentPost},
    composer::selection::Selection,
};

pub const NO_RECENT_POSTS: &str = "NO RECENT POSTS";

const FEED_TIME_FORMAT: &str = "%b %-d, %I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    Vk,
    Telegram,
}

impl DestinationKind {
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Vk => "VK",
            Self::Telegram => "TG",
        }
    }

    pub fn empty_label(self) -> &'static str {
        match self {
            Self::Vk => "NO GROUPS SAVED",
            Self::Telegram => "NO CHANNELS SAVED",
        }
    }

    pub fn delete_question(self) -> &'static str {
        match self {
            Self::Vk => "Delete this group?",
            Self::Telegram => "Delete this channel?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRow {
    pub id: String,
    pub name: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationListView {
    pub kind: DestinationKind,
    pub rows: Vec<DestinationRow>,
    pub selected_count: usize,
}

impl DestinationListView {
    /// Placeholder to show instead of rows.
    pub fn empty_label(&self) -> Option<&'static str> {
        self.rows.is_empty().then(|| self.kind.empty_label())
    }
}

pub fn render_destinations(
    kind: DestinationKind,
    destinations: &[Destination],
    selection: &Selection,
) -> DestinationListView {
    let rows = destinations
        .iter()
        .map(|d| DestinationRow {
            id: d.id.clone(),
            name: d.name.clone(),
            checked: selection.contains(&d.id),
        })
        .collect();

    DestinationListView {
        kind,
        rows,
        selected_count: selection.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentPostView {
    pub status: PostStatus,
    /// `SCHEDULED` or `PUBLISHED`
    pub status_label: &'static str,
    pub time: String,
    pub text: String,
    /// e.g. `VK (2) • TG (1)`
    pub platforms: String,
}

/// Keeps server order.
pub fn render_recent_posts<Tz>(posts: &[RecentPost], tz: &Tz) -> Vec<RecentPostView>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    posts.iter().map(|post| render_recent_post(post, tz)).collect()
}

fn render_recent_post<Tz>(post: &RecentPost, tz: &Tz) -> RecentPostView
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let status_label = match post.status {
        PostStatus::Scheduled => "SCHEDULED",
        PostStatus::Published => "PUBLISHED",
    };

    let mut platforms = vec![];
    for (kind, list) in [
        (DestinationKind::Vk, &post.vk_groups),
        (DestinationKind::Telegram, &post.tg_channels),
    ] {
        if let Some(list) = list.as_ref().filter(|l| !l.is_empty()) {
            platforms.push(format!("{} ({})", kind.short_name(), list.len()));
        }
    }

    let time = post
        .scheduled_time
        .as_deref()
        .or(post.created_at.as_deref())
        .map(|raw| display_time(raw, tz))
        .unwrap_or_default();

    RecentPostView {
        status: post.status,
        status_label,
        time,
        text: post.text.clone(),
        platforms: platforms.join(" • "),
    }
}

fn display_time<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    parse_timestamp(raw)
        .map(|t| t.with_timezone(tz).format(FEED_TIME_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_owned())
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
