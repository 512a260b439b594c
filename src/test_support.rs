//! In-memory [`Backend`] that records every call.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use crate::api::*;

#[derive(Default)]
struct State {
    calls: Vec<String>,
    published: Vec<PublishRequest>,
    replies: VecDeque<ActionResponse>,
    vk_groups: Vec<Destination>,
    tg_channels: Vec<Destination>,
    posts: Vec<RecentPost>,
    fail_next: bool,
    stall_next_publish: bool,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

pub fn reply(success: bool, error: Option<&str>) -> ActionResponse {
    ActionResponse {
        success,
        error: error.map(Into::into),
        errors: None,
    }
}

pub fn reply_errors(errors: &[&str]) -> ActionResponse {
    ActionResponse {
        success: false,
        error: None,
        errors: Some(errors.iter().map(|e| e.to_string()).collect()),
    }
}

impl FakeBackend {
    pub fn with_groups(vk: &[(&str, &str)], tg: &[(&str, &str)]) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.vk_groups = vk.iter().map(|(id, name)| Destination::new(*id, *name)).collect();
            state.tg_channels = tg.iter().map(|(id, name)| Destination::new(*id, *name)).collect();
        }
        backend
    }

    pub fn set_posts(&self, posts: Vec<RecentPost>) {
        self.state.lock().unwrap().posts = posts;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn published(&self) -> Vec<PublishRequest> {
        self.state.lock().unwrap().published.clone()
    }

    /// Reply for the next mutating call. Unqueued calls succeed.
    pub fn queue_action(&self, res: ActionResponse) {
        self.state.lock().unwrap().replies.push_back(res);
    }

    /// Make the next call fail at the transport level.
    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    /// Make the next publish reach the server and then never answer.
    pub fn stall_next_publish(&self) {
        self.state.lock().unwrap().stall_next_publish = true;
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);

        if std::mem::take(&mut state.fail_next) {
            let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
            return Err(ApiError::Decode { status: 502, source });
        }
        Ok(())
    }

    fn next_reply(&self) -> ActionResponse {
        self.state
            .lock()
            .unwrap()
            .replies
            .pop_front()
            .unwrap_or_else(|| reply(true, None))
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn saved_groups(&self) -> Result<SavedGroupsResponse, ApiError> {
        self.record("get-saved-groups".into())?;
        let state = self.state.lock().unwrap();

        Ok(SavedGroupsResponse {
            success: true,
            vk_groups: state.vk_groups.clone(),
            tg_channels: state.tg_channels.clone(),
        })
    }

    async fn recent_posts(&self) -> Result<RecentPostsResponse, ApiError> {
        self.record("get-recent-posts".into())?;

        Ok(RecentPostsResponse {
            success: true,
            posts: self.state.lock().unwrap().posts.clone(),
        })
    }

    async fn save_vk_group(&self, req: &SaveVkGroupRequest) -> Result<ActionResponse, ApiError> {
        self.record(format!(
            "save-vk-group-token group_id={} group_token={}",
            req.group_id, req.group_token
        ))?;
        let res = self.next_reply();
        if res.success {
            let name = format!("Group {}", req.group_id);
            let group = Destination::new(req.group_id.clone(), name);
            self.state.lock().unwrap().vk_groups.push(group);
        }
        Ok(res)
    }

    async fn remove_vk_group(
        &self,
        req: &RemoveVkGroupRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.record(format!("remove-vk-group-token group_id={}", req.group_id))?;
        let res = self.next_reply();
        if res.success {
            self.state.lock().unwrap().vk_groups.retain(|d| d.id != req.group_id);
        }
        Ok(res)
    }

    async fn save_tg_channel(
        &self,
        req: &SaveTgChannelRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.record(format!(
            "save-tg-channel channel_id={} channel_name={}",
            req.channel_id, req.channel_name
        ))?;
        let res = self.next_reply();
        if res.success {
            self.state
                .lock()
                .unwrap()
                .tg_channels
                .push(Destination::new(req.channel_id.clone(), req.channel_name.clone()));
        }
        Ok(res)
    }

    async fn remove_tg_channel(
        &self,
        req: &RemoveTgChannelRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.record(format!("remove-tg-channel channel_id={}", req.channel_id))?;
        let res = self.next_reply();
        if res.success {
            self.state.lock().unwrap().tg_channels.retain(|d| d.id != req.channel_id);
        }
        Ok(res)
    }

    async fn publish_post(&self, req: &PublishRequest) -> Result<ActionResponse, ApiError> {
        self.record("publish-post".into())?;
        let stall = {
            let mut state = self.state.lock().unwrap();
            state.published.push(req.clone());
            std::mem::take(&mut state.stall_next_publish)
        };
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(self.next_reply())
    }

    async fn tg_send_code(&self, req: &TgSendCodeRequest) -> Result<ActionResponse, ApiError> {
        self.record(format!("tg-send-code phone={}", req.phone))?;
        Ok(self.next_reply())
    }

    async fn tg_verify_code(
        &self,
        req: &TgVerifyCodeRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.record(format!("tg-verify-code code={} password={}", req.code, req.password))?;
        Ok(self.next_reply())
    }
}
