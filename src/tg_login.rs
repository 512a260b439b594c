use std::future::Future;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ActionResponse, ApiError, Backend, TgSendCodeRequest, TgVerifyCodeRequest};

/// Server error code asking for the cloud password.
const TWO_FA_REQUIRED: &str = "2fa_required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TgLoginStep {
    #[default]
    Phone,
    Code,
    /// Code accepted, account has two-step verification.
    CodeWithPassword,
    LoggedIn,
}

/// Request currently in flight, for the button label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TgAction {
    SendCode,
    Verify,
}

impl TgAction {
    pub fn busy_label(self) -> &'static str {
        match self {
            Self::SendCode => "SENDING...",
            Self::Verify => "VERIFYING...",
        }
    }

    pub fn idle_label(self) -> &'static str {
        match self {
            Self::SendCode => "GET CODE",
            Self::Verify => "CONFIRM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TgLoginError {
    #[error("Enter phone number")]
    EmptyPhone,
    #[error("Enter code")]
    EmptyCode,
    #[error("2FA password required")]
    TwoFactorRequired,
    #[error("{0}")]
    Rejected(String),
    #[error("Connection error")]
    Connection,
}

/// Telegram account login: phone, then code, then optionally the 2FA password.
#[derive(Debug, Default)]
pub struct TgLogin {
    step: TgLoginStep,
    pending: Option<TgAction>,
}

impl TgLogin {
    pub fn step(&self) -> TgLoginStep {
        self.step
    }

    pub fn pending(&self) -> Option<TgAction> {
        self.pending
    }

    /// Whether the password input should be shown.
    pub fn needs_password(&self) -> bool {
        self.step == TgLoginStep::CodeWithPassword
    }

    pub async fn send_code<B: Backend>(
        &mut self,
        backend: &B,
        phone: &str,
    ) -> Result<(), TgLoginError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(TgLoginError::EmptyPhone);
        }

        let req = TgSendCodeRequest { phone: phone.to_owned() };
        let res = self.run(TgAction::SendCode, backend.tg_send_code(&req)).await?;

        if !res.success {
            return Err(rejected(res, "Code sending error"));
        }

        self.step = TgLoginStep::Code;
        Ok(())
    }

    pub async fn verify<B: Backend>(
        &mut self,
        backend: &B,
        code: &str,
        password: &str,
    ) -> Result<(), TgLoginError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TgLoginError::EmptyCode);
        }

        let req = TgVerifyCodeRequest {
            code: code.to_owned(),
            password: password.to_owned(),
        };
        let res = self.run(TgAction::Verify, backend.tg_verify_code(&req)).await?;

        if res.success {
            info!("telegram account connected");
            self.step = TgLoginStep::LoggedIn;
            return Ok(());
        }

        if res.error.as_deref() == Some(TWO_FA_REQUIRED) {
            self.step = TgLoginStep::CodeWithPassword;
            return Err(TgLoginError::TwoFactorRequired);
        }

        Err(rejected(res, "Verification error"))
    }

    async fn run<F>(&mut self, action: TgAction, call: F) -> Result<ActionResponse, TgLoginError>
    where
        F: Future<Output = Result<ActionResponse, ApiError>>,
    {
        self.pending = Some(action);
        let res = call.await;
        self.pending = None;

        res.map_err(|e| {
            warn!(error = %e, "telegram login request failed");
            TgLoginError::Connection
        })
    }
}

fn rejected(res: ActionResponse, fallback: &str) -> TgLoginError {
    TgLoginError::Rejected(
        res.error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_owned()),
    )
}
