//! API client types and trait definitions
//!
//! This module defines the REST contract that is implemented by both the
//! native (reqwest) and WASM (gloo-net) HTTP clients. Response bodies are
//! decoded here through [`crate::wire`] so both clients return the same
//! canonical types.

use serde::{Deserialize, Serialize};

use crate::models::{
    ActiveSession, EntityId, Group, HistoryRecord, Organization, OrganizationDetail, User,
};
use crate::validate::FieldErrors;
use crate::wire::{
    self, GroupEnvelope, GroupsEnvelope, HistoryEnvelope, MessageEnvelope,
    OrganizationDetailEnvelope, OrganizationEnvelope, OrganizationsEnvelope, SessionsEnvelope,
    UserEnvelope, UsersEnvelope, WireLoginResponse, WireQrResponse, WireTokenResponse,
};

/// Shown for transport failures; the underlying error only goes to the log.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Shown when a referenced entity vanished between list load and action.
pub const NOT_FOUND_MESSAGE: &str = "This item no longer exists";

/// Server message fragment meaning the QR was already delivered once.
pub const QR_ALREADY_SHOWN: &str = "QR code already shown";

/// API error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Caught client-side before any request was made
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),
    /// Server returned an error status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// Authentication required or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Referenced resource no longer exists
    #[error("Not found: {0}")]
    NotFound(String),
    /// Failed to parse a successful response
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Text to put in front of the user.
    ///
    /// Server messages are surfaced verbatim; transport and parse failures
    /// get a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(errors) => errors
                .first_message()
                .unwrap_or("Please correct the highlighted fields")
                .to_string(),
            ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Unauthorized(message) => message.clone(),
            ApiError::NotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            ApiError::Parse(_) => "Unexpected response from server".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Parse(e.to_string())
    }
}

/// Pull the `{message}` out of an error body, falling back to the raw text.
pub fn server_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<MessageEnvelope>(body) {
        Ok(MessageEnvelope { message: Some(m) }) if !m.is_empty() => m,
        _ if !body.trim().is_empty() && !body.trim_start().starts_with('{') => {
            body.trim().to_string()
        }
        _ => format!("Request failed with status {}", status),
    }
}

/// A body that could not be read after the status arrived is a network
/// failure, whatever the status said.
pub fn read_body<E: std::fmt::Display>(body: Result<String, E>) -> Result<String, ApiError> {
    body.map_err(|e| ApiError::Network(e.to_string()))
}

/// Map a completed HTTP exchange to the body text or a typed error.
///
/// Both clients call this so status handling is identical everywhere.
pub fn check_status(status: u16, body: String) -> Result<String, ApiError> {
    match status {
        200..=299 => Ok(body),
        401 => Err(ApiError::Unauthorized(server_message(status, &body))),
        404 => Err(ApiError::NotFound(server_message(status, &body))),
        _ => Err(ApiError::Server {
            status,
            message: server_message(status, &body),
        }),
    }
}

// =============================================================================
// Auth
// =============================================================================

/// How the session credential travels with each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HTTP-only cookie managed by the browser / cookie jar
    #[default]
    Cookie,
    /// `Authorization: Bearer <token>` from the session store
    Bearer,
}

impl AuthMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cookie" => Some(AuthMode::Cookie),
            "bearer" | "token" => Some(AuthMode::Bearer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Typed result of a credential submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// `token` is `None` when the backend only set a cookie
    Authenticated { token: Option<String> },
    MfaRequired { user_id: EntityId },
}

impl LoginOutcome {
    /// Decode a successful login body. Accepts both MFA signals the backend
    /// has used: `message == "MFA required"` and `mfaEnabled: true`.
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        let wire: WireLoginResponse = if body.trim().is_empty() {
            WireLoginResponse::default()
        } else {
            serde_json::from_str(body)?
        };

        let mfa_signalled = wire.mfa_required == Some(true)
            || wire.mfa_enabled == Some(true)
            || wire
                .message
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case("MFA required"));

        match (mfa_signalled, wire.user_id, wire.token) {
            (true, Some(user_id), None) => Ok(LoginOutcome::MfaRequired { user_id }),
            (true, None, None) => Err(ApiError::Parse(
                "MFA required but no user id returned".to_string(),
            )),
            (_, _, token) => Ok(LoginOutcome::Authenticated { token }),
        }
    }
}

/// Result of fetching the TOTP provisioning artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrOutcome {
    /// Data URL of the provisioning image
    Image(String),
    /// Enrollment already happened; only the code is needed
    AlreadyShown,
}

impl QrOutcome {
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        let wire: WireQrResponse = serde_json::from_str(body)?;
        match wire.qr_code_image {
            Some(image) if !image.is_empty() => Ok(QrOutcome::Image(image)),
            _ => Ok(QrOutcome::AlreadyShown),
        }
    }

    /// Fold the "already shown" server error into a successful outcome.
    pub fn from_result(result: Result<QrOutcome, ApiError>) -> Result<QrOutcome, ApiError> {
        match result {
            Err(ApiError::Server { message, .. }) if message.contains(QR_ALREADY_SHOWN) => {
                Ok(QrOutcome::AlreadyShown)
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyMfaRequest {
    pub token: String,
}

/// Token returned by MFA verification, if any.
pub fn token_from_body(body: &str) -> Result<Option<String>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let wire: WireTokenResponse = serde_json::from_str(body)?;
    Ok(wire.token.filter(|t| !t.is_empty()))
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrganizationRequest {
    pub organization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub username: String,
    pub password: String,
    pub organization_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAdminRequest {
    pub user_id: EntityId,
    pub organization_id: EntityId,
}

/// Body for user create and update. `password` is omitted when `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub organization_ids: Vec<EntityId>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub mfa_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub name: String,
    pub organization_id: EntityId,
    pub user_ids: Vec<EntityId>,
}

impl GroupRequest {
    /// Full replacement body for an existing group.
    pub fn from_group(group: &Group) -> Self {
        GroupRequest {
            name: group.name.clone(),
            organization_id: group.organization_id().unwrap_or_default().to_string(),
            user_ids: group.member_ids(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillSessionsRequest {
    pub session_ids: Vec<EntityId>,
}

/// Server reply to a group write: the updated group (if echoed) and a message.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupWriteResponse {
    pub group: Option<Group>,
    pub message: Option<String>,
}

// =============================================================================
// Response decoding
// =============================================================================

/// Body decoders shared by every client implementation.
pub mod decode {
    use super::*;

    pub fn organizations(body: &str) -> Result<Vec<Organization>, ApiError> {
        Ok(wire::decode_list::<OrganizationsEnvelope, _, _, _>(body, |e| e.orgs)?)
    }

    pub fn organization(body: &str) -> Result<Option<Organization>, ApiError> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let envelope: OrganizationEnvelope = serde_json::from_str(body)?;
        Ok(envelope.org.map(Into::into))
    }

    pub fn organization_detail(body: &str) -> Result<OrganizationDetail, ApiError> {
        Ok(wire::decode::<OrganizationDetailEnvelope, _>(body)?)
    }

    pub fn users(body: &str) -> Result<Vec<User>, ApiError> {
        Ok(wire::decode_list::<UsersEnvelope, _, _, _>(body, |e| e.users)?)
    }

    pub fn user(body: &str) -> Result<Option<User>, ApiError> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let envelope: UserEnvelope = serde_json::from_str(body)?;
        Ok(envelope.user.map(Into::into))
    }

    pub fn groups(body: &str) -> Result<Vec<Group>, ApiError> {
        Ok(wire::decode_list::<GroupsEnvelope, _, _, _>(body, |e| e.groups)?)
    }

    pub fn group_write(body: &str) -> Result<GroupWriteResponse, ApiError> {
        if body.trim().is_empty() {
            return Ok(GroupWriteResponse {
                group: None,
                message: None,
            });
        }
        let envelope: GroupEnvelope = serde_json::from_str(body)?;
        Ok(GroupWriteResponse {
            group: envelope.group.map(Into::into),
            message: envelope.message,
        })
    }

    pub fn sessions(body: &str) -> Result<Vec<ActiveSession>, ApiError> {
        Ok(wire::decode_list::<SessionsEnvelope, _, _, _>(body, |e| e.sessions)?)
    }

    pub fn history(body: &str) -> Result<Vec<HistoryRecord>, ApiError> {
        Ok(wire::decode_list::<HistoryEnvelope, _, _, _>(body, |e| e.history)?)
    }

    pub fn message(body: &str) -> Option<String> {
        serde_json::from_str::<MessageEnvelope>(body)
            .ok()
            .and_then(|e| e.message)
    }
}

/// API endpoint definitions
pub mod endpoints {
    pub const LOGIN: &str = "/api/role/admin/login";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const ORGANIZATIONS: &str = "/api/user/organization";
    pub const CREATE_ORGANIZATION: &str = "/api/user/create/organization";
    pub const CREATE_ADMIN: &str = "/api/user/create/admin";
    pub const REMOVE_ADMIN: &str = "/api/user/remove/admin";
    pub const USERS: &str = "/api/user/users";
    pub const CREATE_USER: &str = "/api/user/create";
    pub const GROUPS: &str = "/api/user/groups";
    pub const CREATE_GROUP: &str = "/api/user/create/group";
    pub const ACTIVE_SESSIONS: &str = "/api/sessions/active";
    pub const KILL_SESSIONS: &str = "/api/sessions/kill";
    pub const HISTORY: &str = "/api/sessions/history";

    pub fn mfa_qrcode(user_id: &str) -> String {
        format!("/api/auth/mfa-qrcode/{}", user_id)
    }

    pub fn verify_mfa(user_id: &str) -> String {
        format!("/api/auth/verify-mfa/{}", user_id)
    }

    pub fn organization_detail(id: &str) -> String {
        format!("/api/user/get/organization/{}", id)
    }

    pub fn organization_status(id: &str) -> String {
        format!("/api/user/organization/{}/status", id)
    }

    pub fn user(id: &str) -> String {
        format!("/api/user/{}", id)
    }

    pub fn user_activate(id: &str) -> String {
        format!("/api/user/activate/{}", id)
    }

    pub fn users_by_organization(org_id: &str) -> String {
        format!("/api/user/by-organization/{}", org_id)
    }

    pub fn generate_mfa(user_id: &str) -> String {
        format!("/api/user/generate-mfa/{}", user_id)
    }

    pub fn group(id: &str) -> String {
        format!("/api/user/group/{}", id)
    }
}

/// Trait defining the Securita admin API
///
/// Implemented by the native CLI client and the WASM console client.
/// All methods are async and return `Result<T, ApiError>`.
#[allow(async_fn_in_trait)]
pub trait AdminApi {
    // Auth
    async fn login(&self, req: &LoginRequest) -> Result<LoginOutcome, ApiError>;
    async fn mfa_qrcode(&self, user_id: &str) -> Result<QrOutcome, ApiError>;
    /// Returns the session token if the backend issued one
    async fn verify_mfa(&self, user_id: &str, code: &str) -> Result<Option<String>, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;

    // Organizations
    async fn list_organizations(&self) -> Result<Vec<Organization>, ApiError>;
    async fn get_organization(&self, id: &str) -> Result<OrganizationDetail, ApiError>;
    async fn create_organization(
        &self,
        req: &CreateOrganizationRequest,
    ) -> Result<Option<Organization>, ApiError>;
    async fn set_organization_active(
        &self,
        id: &str,
        active: bool,
    ) -> Result<Option<Organization>, ApiError>;
    async fn create_admin(&self, req: &CreateAdminRequest) -> Result<(), ApiError>;
    async fn remove_admin(&self, req: &RemoveAdminRequest) -> Result<(), ApiError>;

    // Users
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn list_users_by_organization(&self, org_id: &str) -> Result<Vec<User>, ApiError>;
    async fn create_user(&self, req: &UserRequest) -> Result<Option<User>, ApiError>;
    async fn update_user(&self, id: &str, req: &UserRequest) -> Result<Option<User>, ApiError>;
    async fn set_user_active(&self, id: &str, active: bool) -> Result<Option<User>, ApiError>;
    async fn generate_mfa(&self, user_id: &str) -> Result<(), ApiError>;

    // Groups
    async fn list_groups(&self) -> Result<Vec<Group>, ApiError>;
    async fn create_group(&self, req: &GroupRequest) -> Result<GroupWriteResponse, ApiError>;
    async fn update_group(
        &self,
        id: &str,
        req: &GroupRequest,
    ) -> Result<GroupWriteResponse, ApiError>;
    async fn delete_group(&self, id: &str) -> Result<(), ApiError>;

    // Sessions
    async fn list_active_sessions(&self) -> Result<Vec<ActiveSession>, ApiError>;
    async fn kill_sessions(&self, ids: &[EntityId]) -> Result<(), ApiError>;
    async fn list_history(&self) -> Result<Vec<HistoryRecord>, ApiError>;
}

/// Configuration for creating an API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the server (e.g., "http://localhost:3001")
    pub base_url: String,
    pub auth_mode: AuthMode,
    /// Bearer token for authenticated requests
    pub auth_token: Option<String>,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_mode: AuthMode::default(),
            auth_token: None,
        }
    }

    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Header value to attach, if bearer auth applies.
    pub fn bearer_header(&self) -> Option<String> {
        match (self.auth_mode, &self.auth_token) {
            (AuthMode::Bearer, Some(token)) => Some(format!("Bearer {}", token)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_message_prefers_json_message() {
        assert_eq!(
            server_message(409, r#"{"message":"Username already exists"}"#),
            "Username already exists"
        );
        assert_eq!(server_message(500, "Internal Server Error"), "Internal Server Error");
        assert_eq!(server_message(502, ""), "Request failed with status 502");
        assert_eq!(server_message(400, r#"{"error":"x"}"#), "Request failed with status 400");
    }

    #[test]
    fn unreadable_body_is_a_network_error() {
        let failed: Result<String, &str> = Err("connection reset");
        assert_eq!(
            read_body(failed).unwrap_err(),
            ApiError::Network("connection reset".into())
        );
        let read: Result<String, &str> = Ok("{}".into());
        assert_eq!(read_body(read).unwrap(), "{}");
    }

    #[test]
    fn check_status_maps_errors() {
        assert_eq!(check_status(200, "ok".into()).unwrap(), "ok");
        assert!(check_status(401, String::new()).unwrap_err().is_unauthorized());
        assert!(check_status(404, String::new()).unwrap_err().is_not_found());
        assert_eq!(
            check_status(400, r#"{"message":"Invalid org"}"#.into()),
            Err(ApiError::Server {
                status: 400,
                message: "Invalid org".into()
            })
        );
    }

    #[test]
    fn user_message_is_verbatim_for_server_errors() {
        let err = ApiError::Server {
            status: 409,
            message: "Email already in use".into(),
        };
        assert_eq!(err.user_message(), "Email already in use");
        assert_eq!(
            ApiError::Network("dns".into()).user_message(),
            NETWORK_ERROR_MESSAGE
        );
        assert_eq!(ApiError::NotFound("x".into()).user_message(), NOT_FOUND_MESSAGE);
    }

    #[test]
    fn login_outcome_token() {
        let outcome = LoginOutcome::from_body(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                token: Some("abc".into())
            }
        );
    }

    #[test]
    fn login_outcome_cookie_only() {
        assert_eq!(
            LoginOutcome::from_body("").unwrap(),
            LoginOutcome::Authenticated { token: None }
        );
        assert_eq!(
            LoginOutcome::from_body(r#"{"message":"Login successful"}"#).unwrap(),
            LoginOutcome::Authenticated { token: None }
        );
    }

    #[test]
    fn login_outcome_mfa_by_message() {
        let outcome =
            LoginOutcome::from_body(r#"{"message":"MFA required","userId":"u1"}"#).unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::MfaRequired {
                user_id: "u1".into()
            }
        );
    }

    #[test]
    fn login_outcome_mfa_by_flag() {
        let outcome = LoginOutcome::from_body(r#"{"mfaEnabled":true,"userId":"u7"}"#).unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::MfaRequired {
                user_id: "u7".into()
            }
        );
    }

    #[test]
    fn login_outcome_mfa_without_user_is_parse_error() {
        assert!(matches!(
            LoginOutcome::from_body(r#"{"message":"MFA required"}"#),
            Err(ApiError::Parse(_))
        ));
    }

    #[test]
    fn qr_outcome_already_shown_is_not_an_error() {
        let folded = QrOutcome::from_result(Err(ApiError::Server {
            status: 400,
            message: "QR code already shown. Use your authenticator app.".into(),
        }));
        assert_eq!(folded, Ok(QrOutcome::AlreadyShown));

        let other = QrOutcome::from_result(Err(ApiError::Server {
            status: 500,
            message: "boom".into(),
        }));
        assert!(other.is_err());

        let image = QrOutcome::from_body(r#"{"qrCodeImage":"data:image/png;base64,AAA"}"#);
        assert_eq!(image, Ok(QrOutcome::Image("data:image/png;base64,AAA".into())));
    }

    #[test]
    fn create_organization_body_shape() {
        let body = serde_json::to_value(CreateOrganizationRequest {
            organization: "Acme Corp".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"organization": "Acme Corp"}));
    }

    #[test]
    fn user_request_omits_blank_password() {
        let req = UserRequest {
            organization_ids: vec!["o1".into()],
            username: "devuser".into(),
            password: None,
            first_name: "Dev".into(),
            last_name: "User".into(),
            email: "dev@acme.io".into(),
            phone: "555".into(),
            mfa_enabled: false,
        };
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("password").is_none());
        assert_eq!(body["organizationIds"], json!(["o1"]));
        assert_eq!(body["mfaEnabled"], json!(false));
    }

    #[test]
    fn kill_sessions_body_shape() {
        let body = serde_json::to_value(KillSessionsRequest {
            session_ids: vec!["1".into(), "3".into()],
        })
        .unwrap();
        assert_eq!(body, json!({"sessionIds": ["1", "3"]}));
    }

    #[test]
    fn bearer_header_only_in_bearer_mode() {
        let cookie = ApiClientConfig::new("http://localhost:3001/").with_token("t");
        assert_eq!(cookie.bearer_header(), None);
        assert_eq!(cookie.url(endpoints::LOGIN), "http://localhost:3001/api/role/admin/login");

        let bearer = cookie.with_auth_mode(AuthMode::Bearer);
        assert_eq!(bearer.bearer_header().as_deref(), Some("Bearer t"));
    }

    #[test]
    fn auth_mode_parse() {
        assert_eq!(AuthMode::parse("Bearer"), Some(AuthMode::Bearer));
        assert_eq!(AuthMode::parse("cookie"), Some(AuthMode::Cookie));
        assert_eq!(AuthMode::parse("basic"), None);
    }

    #[test]
    fn group_write_decodes_optional_group() {
        let resp = decode::group_write(
            &json!({"message": "Group updated successfully", "group": {"_id": "g1", "name": "Ops"}})
                .to_string(),
        )
        .unwrap();
        assert_eq!(resp.message.as_deref(), Some("Group updated successfully"));
        assert_eq!(resp.group.unwrap().name, "Ops");
        assert!(decode::group_write("").unwrap().group.is_none());
    }
}
