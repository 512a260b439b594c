use std::{fs, io, path::Path};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::composer::selection::Selection;

/// The post being composed, before it is sent anywhere.
#[derive(Clone, Debug, Default)]
pub struct Draft {
    /// Post text. May be empty if files are attached.
    pub text: String,
    /// Attached files, sent in order.
    pub files: Vec<Attachment>,
    /// Selected VK group ids.
    pub vk_groups: Selection,
    /// Selected Telegram channel ids.
    pub tg_channels: Selection,
    /// `None` means publish immediately.
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// File attached to a draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// File name as sent in the multipart part.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".into());

        Ok(Self { name, bytes })
    }
}

impl Draft {
    /// Text as it will be submitted.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    pub fn has_content(&self) -> bool {
        !self.trimmed_text().is_empty() || !self.files.is_empty()
    }

    pub fn has_destination(&self) -> bool {
        !self.vk_groups.is_empty() || !self.tg_channels.is_empty()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_time.is_some()
    }

    /// `2099-01-01T10:00:00.000Z`
    pub fn scheduled_time_iso(&self) -> Option<String> {
        self.scheduled_time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Attachment names for the file label, e.g. `a.png, b.png`.
    pub fn file_names(&self) -> String {
        self.files
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Forget everything after a successful publish.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
