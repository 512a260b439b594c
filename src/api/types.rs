use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::draft::{Attachment, Draft};

/// VK group or Telegram channel saved on the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Destination {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Destination {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

#[derive(Debug, Deserialize)]
pub struct SavedGroupsResponse {
    pub success: bool,
    #[serde(default)]
    pub vk_groups: Vec<Destination>,
    #[serde(default)]
    pub tg_channels: Vec<Destination>,
}

#[derive(Debug, Deserialize)]
pub struct RecentPostsResponse {
    pub success: bool,
    #[serde(default)]
    pub posts: Vec<RecentPost>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    #[serde(other)]
    Published,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentPost {
    pub status: PostStatus,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Only the length is shown, so entries stay untyped.
    #[serde(default)]
    pub vk_groups: Option<Vec<Value>>,
    #[serde(default)]
    pub tg_channels: Option<Vec<Value>>,
}

/// Reply of every mutating endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Per-destination failures from `publish-post`.
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveVkGroupRequest {
    pub group_id: String,
    pub group_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveVkGroupRequest {
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveTgChannelRequest {
    pub channel_id: String,
    pub channel_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveTgChannelRequest {
    pub channel_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TgSendCodeRequest {
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TgVerifyCodeRequest {
    pub code: String,
    pub password: String,
}

/// Multipart body of `publish-post`.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub text: String,
    /// Comma separated ids.
    pub vk_groups: String,
    /// Comma separated ids.
    pub tg_channels: String,
    pub scheduled_time: Option<String>,
    pub files: Vec<Attachment>,
}

impl PublishRequest {
    pub fn from_draft(draft: &Draft) -> Self {
        Self {
            text: draft.trimmed_text().to_owned(),
            vk_groups: draft.vk_groups.to_csv(),
            tg_channels: draft.tg_channels.to_csv(),
            scheduled_time: draft.scheduled_time_iso(),
            files: draft.files.clone(),
        }
    }

    /// Text parts, in the order they are appended to the form.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("text", self.text.clone()),
            ("vk_groups", self.vk_groups.clone()),
            ("tg_channels", self.tg_channels.clone()),
        ];

        if let Some(at) = &self.scheduled_time {
            fields.push(("scheduled_time", at.clone()));
        }

        fields
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
