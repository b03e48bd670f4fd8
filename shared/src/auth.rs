//! Auth gate: login and MFA state machine, plus the session store seam.
//!
//! ```text
//! AwaitingCredentials --submit--> CredentialsPending --> Authenticated
//!                                                   \--> MfaRequired --qr--> AwaitingOtp
//! AwaitingOtp --submit--> OtpPending --> Authenticated
//! ```
//!
//! A failed step drops back to the awaiting state it came from with an
//! error message. There is no lockout.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AuthMode, LoginOutcome, QrOutcome};
use crate::models::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    AwaitingCredentials,
    CredentialsPending,
    MfaRequired { user_id: EntityId },
    AwaitingOtp { user_id: EntityId, qr: QrOutcome },
    OtpPending { user_id: EntityId, qr: QrOutcome },
    Authenticated,
}

impl AuthStep {
    pub fn name(&self) -> &'static str {
        match self {
            AuthStep::AwaitingCredentials => "awaiting_credentials",
            AuthStep::CredentialsPending => "credentials_pending",
            AuthStep::MfaRequired { .. } => "mfa_required",
            AuthStep::AwaitingOtp { .. } => "awaiting_otp",
            AuthStep::OtpPending { .. } => "otp_pending",
            AuthStep::Authenticated => "authenticated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFlowError {
    #[error("cannot {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// Persisted session. `token` is `None` in cookie mode, where the browser
/// or cookie jar holds the real credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub auth_mode: AuthMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFlow {
    step: AuthStep,
    username: String,
    error: Option<String>,
    auth_mode: AuthMode,
}

impl AuthFlow {
    pub fn new(auth_mode: AuthMode) -> Self {
        AuthFlow {
            step: AuthStep::AwaitingCredentials,
            username: String::new(),
            error: None,
            auth_mode,
        }
    }

    /// Enter the flow directly at the MFA step, as the `/mfa-verify/:id`
    /// route does after a page reload.
    pub fn resume_mfa(auth_mode: AuthMode, user_id: impl Into<EntityId>) -> Self {
        AuthFlow {
            step: AuthStep::MfaRequired {
                user_id: user_id.into(),
            },
            ..Self::new(auth_mode)
        }
    }

    pub fn step(&self) -> &AuthStep {
        &self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.step,
            AuthStep::CredentialsPending | AuthStep::OtpPending { .. }
        )
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.step {
            AuthStep::MfaRequired { user_id }
            | AuthStep::AwaitingOtp { user_id, .. }
            | AuthStep::OtpPending { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    fn invalid(&self, event: &'static str) -> AuthFlowError {
        AuthFlowError::InvalidTransition {
            state: self.step.name(),
            event,
        }
    }

    /// Client-side rejection (validation) without leaving the current step.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn submit_credentials(&mut self, username: &str) -> Result<(), AuthFlowError> {
        if self.step != AuthStep::AwaitingCredentials {
            return Err(self.invalid("submit credentials"));
        }
        self.username = username.trim().to_string();
        self.error = None;
        self.step = AuthStep::CredentialsPending;
        Ok(())
    }

    /// Returns the session to store when login completes without MFA.
    pub fn credentials_resolved(
        &mut self,
        result: Result<LoginOutcome, ApiError>,
    ) -> Result<Option<Session>, AuthFlowError> {
        if self.step != AuthStep::CredentialsPending {
            return Err(self.invalid("resolve credentials"));
        }
        match result {
            Ok(LoginOutcome::Authenticated { token }) => {
                self.step = AuthStep::Authenticated;
                Ok(Some(self.session(token, None)))
            }
            Ok(LoginOutcome::MfaRequired { user_id }) => {
                self.step = AuthStep::MfaRequired { user_id };
                Ok(None)
            }
            Err(err) => {
                self.error = Some(err.user_message());
                self.step = AuthStep::AwaitingCredentials;
                Ok(None)
            }
        }
    }

    /// QR provisioning fetched (or already shown). A fetch failure still
    /// moves on to code entry so an enrolled user is not blocked.
    pub fn qr_resolved(&mut self, result: Result<QrOutcome, ApiError>) -> Result<(), AuthFlowError> {
        let AuthStep::MfaRequired { user_id } = &self.step else {
            return Err(self.invalid("resolve qr code"));
        };
        let user_id = user_id.clone();
        let qr = match QrOutcome::from_result(result) {
            Ok(qr) => qr,
            Err(err) => {
                self.error = Some(err.user_message());
                QrOutcome::AlreadyShown
            }
        };
        self.step = AuthStep::AwaitingOtp { user_id, qr };
        Ok(())
    }

    pub fn submit_otp(&mut self) -> Result<(), AuthFlowError> {
        let AuthStep::AwaitingOtp { user_id, qr } = &self.step else {
            return Err(self.invalid("submit code"));
        };
        self.step = AuthStep::OtpPending {
            user_id: user_id.clone(),
            qr: qr.clone(),
        };
        self.error = None;
        Ok(())
    }

    pub fn otp_resolved(
        &mut self,
        result: Result<Option<String>, ApiError>,
    ) -> Result<Option<Session>, AuthFlowError> {
        let AuthStep::OtpPending { user_id, qr } = &self.step else {
            return Err(self.invalid("resolve code"));
        };
        let (user_id, qr) = (user_id.clone(), qr.clone());
        match result {
            Ok(token) => {
                self.step = AuthStep::Authenticated;
                Ok(Some(self.session(token, Some(user_id))))
            }
            Err(err) => {
                self.error = Some(err.user_message());
                self.step = AuthStep::AwaitingOtp { user_id, qr };
                Ok(None)
            }
        }
    }

    fn session(&self, token: Option<String>, user_id: Option<EntityId>) -> Session {
        Session {
            username: self.username.clone(),
            token,
            user_id,
            auth_mode: self.auth_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write session: {0}")]
    Write(String),
    #[error("stored session is corrupt: {0}")]
    Corrupt(String),
}

/// Where the current session lives between requests and reloads.
pub trait SessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;
    fn clear(&self) -> Result<(), SessionStoreError>;

    fn is_authenticated(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}

/// Process-local store, used by tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RefCell<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.session.borrow().clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.session.borrow_mut() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        self.session.borrow_mut().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_login_authenticates() {
        let mut flow = AuthFlow::new(AuthMode::Bearer);
        flow.submit_credentials(" admin ").unwrap();
        assert!(flow.is_pending());
        let session = flow
            .credentials_resolved(Ok(LoginOutcome::Authenticated {
                token: Some("tok".into()),
            }))
            .unwrap()
            .unwrap();
        assert_eq!(flow.step(), &AuthStep::Authenticated);
        assert_eq!(session.username, "admin");
        assert_eq!(session.token.as_deref(), Some("tok"));
        assert_eq!(session.auth_mode, AuthMode::Bearer);
    }

    #[test]
    fn mfa_path_reaches_authenticated() {
        let mut flow = AuthFlow::new(AuthMode::Cookie);
        flow.submit_credentials("admin").unwrap();
        let session = flow
            .credentials_resolved(Ok(LoginOutcome::MfaRequired {
                user_id: "u1".into(),
            }))
            .unwrap();
        assert!(session.is_none());
        assert_eq!(flow.user_id(), Some("u1"));

        flow.qr_resolved(Ok(QrOutcome::Image("data:image/png;base64,AA".into())))
            .unwrap();
        assert!(matches!(flow.step(), AuthStep::AwaitingOtp { .. }));

        flow.submit_otp().unwrap();
        let session = flow.otp_resolved(Ok(Some("tok".into()))).unwrap().unwrap();
        assert_eq!(flow.step(), &AuthStep::Authenticated);
        assert_eq!(session.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn failures_return_to_awaiting_state_with_message() {
        let mut flow = AuthFlow::new(AuthMode::Cookie);
        flow.submit_credentials("admin").unwrap();
        flow.credentials_resolved(Err(ApiError::Unauthorized("Invalid credentials".into())))
            .unwrap();
        assert_eq!(flow.step(), &AuthStep::AwaitingCredentials);
        assert_eq!(flow.error(), Some("Invalid credentials"));

        let mut flow = AuthFlow::resume_mfa(AuthMode::Cookie, "u1");
        flow.qr_resolved(Err(ApiError::Server {
            status: 400,
            message: "QR code already shown".into(),
        }))
        .unwrap();
        assert_eq!(flow.error(), None);
        flow.submit_otp().unwrap();
        flow.otp_resolved(Err(ApiError::Server {
            status: 400,
            message: "Invalid MFA token".into(),
        }))
        .unwrap();
        assert_eq!(
            flow.step(),
            &AuthStep::AwaitingOtp {
                user_id: "u1".into(),
                qr: QrOutcome::AlreadyShown
            }
        );
        assert_eq!(flow.error(), Some("Invalid MFA token"));
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let mut flow = AuthFlow::new(AuthMode::Cookie);
        assert_eq!(
            flow.submit_otp(),
            Err(AuthFlowError::InvalidTransition {
                state: "awaiting_credentials",
                event: "submit code"
            })
        );
        flow.submit_credentials("admin").unwrap();
        assert!(flow.submit_credentials("admin").is_err());
    }

    #[test]
    fn memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        assert!(!store.is_authenticated());
        let session = Session {
            username: "admin".into(),
            token: None,
            user_id: None,
            auth_mode: AuthMode::Cookie,
        };
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
