//! Composer controller: selection, schedule and publish workflow.

use std::{fmt, ops::Range, time::Instant};

use chrono::{DateTime, TimeZone};
use tracing::{info, warn};

use crate::{
    api::{
        ActionResponse, ApiError, Backend, Destination, PublishRequest, RecentPost,
        RecentPostsResponse, RemoveTgChannelRequest, RemoveVkGroupRequest, SaveTgChannelRequest,
        SaveVkGroupRequest, SavedGroupsResponse,
    },
    draft::{Attachment, Draft},
    tg_login::{TgLogin, TgLoginError},
    ui::{insert_formatting, Dropdowns, FormatError, FormatKind, Modal},
    view::{self, DestinationKind, DestinationListView, RecentPostView},
};

pub mod error;
pub mod schedule;
pub mod selection;

pub use error::{ComposerError, ValidationError};
use schedule::{SchedulePicker, SchedulePreview};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishButton {
    #[default]
    Idle,
    Busy { scheduling: bool },
}

impl PublishButton {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "PUBLISH",
            Self::Busy { scheduling: true } => "SCHEDULING...",
            Self::Busy { scheduling: false } => "PUBLISHING...",
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    Scheduled,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Published => "Post published successfully!",
            Self::Scheduled => "Post scheduled! It will be published at the specified time.",
        })
    }
}

/// Owns all dashboard state and talks to the server through `B`.
pub struct Composer<B> {
    backend: B,
    pub draft: Draft,
    pub schedule: SchedulePicker,
    vk_groups: Vec<Destination>,
    tg_channels: Vec<Destination>,
    recent_posts: Vec<RecentPost>,
    button: PublishButton,
    schedule_modal: Modal,
    tg_modal: Modal,
    profile_modal: Modal,
    dropdowns: Dropdowns,
    tg_login: TgLogin,
}

impl<B: Backend> Composer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            draft: Draft::default(),
            schedule: SchedulePicker::default(),
            vk_groups: vec![],
            tg_channels: vec![],
            recent_posts: vec![],
            button: PublishButton::Idle,
            schedule_modal: Modal::Closed,
            tg_modal: Modal::Closed,
            profile_modal: Modal::Closed,
            dropdowns: Dropdowns::default(),
            tg_login: TgLogin::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn publish_button(&self) -> PublishButton {
        self.button
    }

    pub fn schedule_modal(&self) -> Modal {
        self.schedule_modal
    }

    pub fn tg_modal(&self) -> Modal {
        self.tg_modal
    }

    pub fn profile_modal(&self) -> Modal {
        self.profile_modal
    }

    pub fn dropdowns(&mut self) -> &mut Dropdowns {
        &mut self.dropdowns
    }

    pub fn tg_login(&self) -> &TgLogin {
        &self.tg_login
    }

    // Loading

    pub async fn load_saved_groups(&mut self) {
        let res = self.backend.saved_groups().await;
        self.apply_saved_groups(res);
    }

    pub async fn load_recent_posts(&mut self) {
        let res = self.backend.recent_posts().await;
        self.apply_recent_posts(res);
    }

    /// Re-fetch destination lists and the recent-post feed together.
    pub async fn refresh(&mut self) {
        let (groups, posts) =
            futures::join!(self.backend.saved_groups(), self.backend.recent_posts());
        self.apply_saved_groups(groups);
        self.apply_recent_posts(posts);
    }

    fn apply_saved_groups(&mut self, res: Result<SavedGroupsResponse, ApiError>) {
        match res {
            Ok(res) if res.success => {
                self.vk_groups = res.vk_groups;
                self.tg_channels = res.tg_channels;
            }
            Ok(_) => warn!("server refused to list saved groups"),
            Err(e) => warn!(error = %e, "failed to load saved groups"),
        }
    }

    fn apply_recent_posts(&mut self, res: Result<RecentPostsResponse, ApiError>) {
        match res {
            Ok(res) if res.success => self.recent_posts = res.posts,
            Ok(_) => warn!("server refused to list recent posts"),
            Err(e) => warn!(error = %e, "failed to load recent posts"),
        }
    }

    // Destinations

    pub fn destinations(&self, kind: DestinationKind) -> &[Destination] {
        match kind {
            DestinationKind::Vk => &self.vk_groups,
            DestinationKind::Telegram => &self.tg_channels,
        }
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, kind: DestinationKind, id: &str) -> bool {
        match kind {
            DestinationKind::Vk => self.draft.vk_groups.toggle(id),
            DestinationKind::Telegram => self.draft.tg_channels.toggle(id),
        }
    }

    pub fn destination_view(&self, kind: DestinationKind) -> DestinationListView {
        let selection = match kind {
            DestinationKind::Vk => &self.draft.vk_groups,
            DestinationKind::Telegram => &self.draft.tg_channels,
        };

        view::render_destinations(kind, self.destinations(kind), selection)
    }

    pub fn recent_view<Tz>(&self, tz: &Tz) -> Vec<RecentPostView>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        view::render_recent_posts(&self.recent_posts, tz)
    }

    pub async fn add_vk_group(
        &mut self,
        group_id: &str,
        token: &str,
    ) -> Result<String, ComposerError> {
        let (group_id, token) = (group_id.trim(), token.trim());
        if group_id.is_empty() || token.is_empty() {
            return Err(ValidationError::MissingVkGroup.into());
        }

        let req = SaveVkGroupRequest {
            group_id: group_id.to_owned(),
            group_token: token.to_owned(),
        };
        let res = self.backend.save_vk_group(&req).await?;
        if !res.success {
            return Err(ComposerError::Save(reason(&res, "failed to save token")));
        }

        info!(group_id, "vk group saved");
        self.load_saved_groups().await;
        Ok(format!("VK group {group_id} added"))
    }

    pub async fn add_tg_channel(&mut self, channel_id: &str) -> Result<String, ComposerError> {
        let channel_id = channel_id.trim();
        if channel_id.is_empty() {
            return Err(ValidationError::MissingTgChannel.into());
        }

        let req = SaveTgChannelRequest {
            channel_id: channel_id.to_owned(),
            channel_name: channel_id.to_owned(),
        };
        let res = self.backend.save_tg_channel(&req).await?;
        if !res.success {
            return Err(ComposerError::Save(reason(&res, "failed to save channel")));
        }

        info!(channel_id, "telegram channel saved");
        self.load_saved_groups().await;
        Ok(format!("Telegram channel {channel_id} added"))
    }

    /// Asks `confirm` first; returns false if the user declined.
    ///
    /// The list is re-fetched rather than edited locally.
    pub async fn delete_destination<F>(
        &mut self,
        kind: DestinationKind,
        id: &str,
        confirm: F,
    ) -> Result<bool, ComposerError>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(kind.delete_question()) {
            return Ok(false);
        }

        let res = match kind {
            DestinationKind::Vk => {
                let req = RemoveVkGroupRequest { group_id: id.to_owned() };
                self.backend.remove_vk_group(&req).await?
            }
            DestinationKind::Telegram => {
                let req = RemoveTgChannelRequest { channel_id: id.to_owned() };
                self.backend.remove_tg_channel(&req).await?
            }
        };
        if !res.success {
            return Err(ComposerError::Delete(reason(&res, "Unknown error")));
        }

        match kind {
            DestinationKind::Vk => self.draft.vk_groups.remove(id),
            DestinationKind::Telegram => self.draft.tg_channels.remove(id),
        }

        info!(id, kind = kind.short_name(), "destination deleted");
        self.load_saved_groups().await;
        Ok(true)
    }

    // Draft

    pub fn attach(&mut self, file: Attachment) {
        self.draft.files.push(file);
    }

    /// Wraps the byte range `selection` of the draft text; returns the new selection.
    pub fn apply_format(
        &mut self,
        selection: Range<usize>,
        kind: FormatKind,
    ) -> Result<Range<usize>, FormatError> {
        let (text, selection) = insert_formatting(&self.draft.text, selection, kind)?;
        self.draft.text = text;
        Ok(selection)
    }

    // Scheduling

    pub fn open_schedule<Tz>(&mut self, at: Instant, now: &DateTime<Tz>) -> SchedulePreview
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.schedule_modal.open(at);
        self.schedule.fill_defaults(now);
        self.schedule.preview(now)
    }

    pub fn close_schedule(&mut self, at: Instant) {
        self.schedule_modal.close(at);
    }

    /// Advance modal animations.
    pub fn tick(&mut self, at: Instant) {
        self.schedule_modal.tick(at);
        self.tg_modal.tick(at);
        self.profile_modal.tick(at);
    }

    pub async fn publish_now(&mut self, at: Instant) -> Result<PublishOutcome, ComposerError> {
        self.draft.scheduled_time = None;
        self.schedule_modal.close(at);
        self.publish().await
    }

    /// Invalid picker input leaves the dialog open and sends nothing.
    pub async fn publish_later<Tz: TimeZone>(
        &mut self,
        at: Instant,
        now: &DateTime<Tz>,
    ) -> Result<PublishOutcome, ComposerError> {
        let scheduled = self.schedule.confirm(now)?;
        self.draft.scheduled_time = Some(scheduled);
        self.schedule_modal.close(at);
        self.publish().await
    }

    /// Send the draft. Nothing goes out unless it has content and a destination.
    ///
    /// Refused while the button is busy. A publish whose future is dropped
    /// mid-request leaves the button busy, since the server may already have
    /// the post; [`Composer::reset_button`] re-enables it.
    pub async fn publish(&mut self) -> Result<PublishOutcome, ComposerError> {
        if !self.button.is_enabled() {
            return Err(ValidationError::Busy.into());
        }
        if !self.draft.has_content() {
            return Err(ValidationError::EmptyDraft.into());
        }
        if !self.draft.has_destination() {
            return Err(ValidationError::NoDestination.into());
        }

        let scheduling = self.draft.is_scheduled();
        let req = PublishRequest::from_draft(&self.draft);

        self.button = PublishButton::Busy { scheduling };
        let res = self.backend.publish_post(&req).await;
        self.button = PublishButton::Idle;

        let res = res?;
        if !res.success {
            let reason = reason(&res, "Unknown error");
            return Err(if scheduling {
                ComposerError::Schedule(reason)
            } else {
                ComposerError::Publish(reason)
            });
        }

        info!(
            vk = self.draft.vk_groups.len(),
            tg = self.draft.tg_channels.len(),
            scheduled_time = req.scheduled_time.as_deref().unwrap_or("now"),
            "post accepted"
        );

        self.draft.reset();
        self.refresh().await;

        Ok(if scheduling {
            PublishOutcome::Scheduled
        } else {
            PublishOutcome::Published
        })
    }

    pub fn reset_button(&mut self) {
        self.button = PublishButton::Idle;
    }

    // Profile

    pub fn open_profile(&mut self, at: Instant) {
        self.profile_modal.open(at);
    }

    pub fn close_profile(&mut self, at: Instant) {
        self.profile_modal.close(at);
    }

    // Telegram login

    pub fn open_tg_login(&mut self, at: Instant) {
        self.tg_modal.open(at);
    }

    pub fn close_tg_login(&mut self, at: Instant) {
        self.tg_modal.close(at);
    }

    pub async fn send_tg_code(&mut self, phone: &str) -> Result<(), TgLoginError> {
        self.tg_login.send_code(&self.backend, phone).await
    }

    /// Re-fetches lists and posts once logged in.
    pub async fn verify_tg_code(&mut self, code: &str, password: &str) -> Result<(), TgLoginError> {
        self.tg_login.verify(&self.backend, code, password).await?;
        self.refresh().await;
        Ok(())
    }
}

/// Per-item errors joined by newlines, else the single error, else `fallback`.
fn reason(res: &ActionResponse, fallback: &str) -> String {
    match &res.errors {
        Some(errors) if !errors.is_empty() => errors.join("\n"),
        _ => res
            .error
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_owned()),
    }
}
