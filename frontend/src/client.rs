//! WASM HTTP client implementation using gloo-net

use gloo_net::http::{Request, RequestBuilder};
use serde::Serialize;
use shared::api::{
    check_status, decode, endpoints, read_body, AdminApi, ApiClientConfig, ApiError, AuthMode,
    CreateAdminRequest, CreateOrganizationRequest, GroupRequest, GroupWriteResponse,
    KillSessionsRequest, LoginOutcome, LoginRequest, QrOutcome, RemoveAdminRequest,
    SetActiveRequest, UserRequest, VerifyMfaRequest,
};
use shared::{
    ActiveSession, EntityId, Group, HistoryRecord, Organization, OrganizationDetail, Session,
    SessionStore, User,
};
use web_sys::RequestCredentials;

use crate::session_store::LocalStorageSessionStore;
use crate::utils;

/// Browser API client using gloo-net
#[derive(Debug, Clone)]
pub struct WasmApiClient {
    config: ApiClientConfig,
}

impl WasmApiClient {
    pub fn new(config: ApiClientConfig) -> Self {
        Self { config }
    }

    /// Client for the current page: build-time base URL and auth mode, plus
    /// the stored token when running in bearer mode.
    pub fn from_session() -> Self {
        let features = utils::features();
        let mut config = ApiClientConfig::new(utils::api_base()).with_auth_mode(features.auth_mode);
        if let Ok(Some(Session {
            token: Some(token), ..
        })) = LocalStorageSessionStore.load()
        {
            config = config.with_token(token);
        }
        Self::new(config)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match self.config.auth_mode {
            AuthMode::Cookie => builder.credentials(RequestCredentials::Include),
            AuthMode::Bearer => builder,
        };
        match self.config.bearer_header() {
            Some(header) => builder.header("Authorization", &header),
            None => builder,
        }
    }

    async fn send(&self, endpoint: &str, request: Request) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| {
            log::error!("Request to {} failed: {:?}", endpoint, e);
            ApiError::Network(e.to_string())
        })?;
        let status = response.status();
        let body = read_body(response.text().await).inspect_err(|e| {
            log::error!("Reading {} response failed: {}", endpoint, e);
        })?;
        check_status(status, body).inspect_err(|e| {
            log::error!("{} returned {}: {}", endpoint, status, e);
        })
    }

    async fn get(&self, endpoint: &str) -> Result<String, ApiError> {
        let request = self
            .authorize(Request::get(&self.config.url(endpoint)))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        self.send(endpoint, request).await
    }

    async fn delete(&self, endpoint: &str) -> Result<String, ApiError> {
        let request = self
            .authorize(Request::delete(&self.config.url(endpoint)))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        self.send(endpoint, request).await
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<String, ApiError> {
        let request = self
            .authorize(Request::post(&self.config.url(endpoint)))
            .json(body)
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send(endpoint, request).await
    }

    async fn put<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<String, ApiError> {
        let request = self
            .authorize(Request::put(&self.config.url(endpoint)))
            .json(body)
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send(endpoint, request).await
    }
}

impl AdminApi for WasmApiClient {
    async fn login(&self, req: &LoginRequest) -> Result<LoginOutcome, ApiError> {
        let body = self.post(endpoints::LOGIN, req).await?;
        LoginOutcome::from_body(&body)
    }

    async fn mfa_qrcode(&self, user_id: &str) -> Result<QrOutcome, ApiError> {
        let result = match self.get(&endpoints::mfa_qrcode(user_id)).await {
            Ok(body) => QrOutcome::from_body(&body),
            Err(e) => Err(e),
        };
        QrOutcome::from_result(result)
    }

    async fn verify_mfa(&self, user_id: &str, code: &str) -> Result<Option<String>, ApiError> {
        let req = VerifyMfaRequest {
            token: code.to_string(),
        };
        let body = self.post(&endpoints::verify_mfa(user_id), &req).await?;
        shared::api::token_from_body(&body)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.post(endpoints::LOGOUT, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        decode::organizations(&self.get(endpoints::ORGANIZATIONS).await?)
    }

    async fn get_organization(&self, id: &str) -> Result<OrganizationDetail, ApiError> {
        decode::organization_detail(&self.get(&endpoints::organization_detail(id)).await?)
    }

    async fn create_organization(
        &self,
        req: &CreateOrganizationRequest,
    ) -> Result<Option<Organization>, ApiError> {
        decode::organization(&self.post(endpoints::CREATE_ORGANIZATION, req).await?)
    }

    async fn set_organization_active(
        &self,
        id: &str,
        active: bool,
    ) -> Result<Option<Organization>, ApiError> {
        let req = SetActiveRequest { is_active: active };
        decode::organization(&self.put(&endpoints::organization_status(id), &req).await?)
    }

    async fn create_admin(&self, req: &CreateAdminRequest) -> Result<(), ApiError> {
        self.post(endpoints::CREATE_ADMIN, req).await?;
        Ok(())
    }

    async fn remove_admin(&self, req: &RemoveAdminRequest) -> Result<(), ApiError> {
        self.post(endpoints::REMOVE_ADMIN, req).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        decode::users(&self.get(endpoints::USERS).await?)
    }

    async fn list_users_by_organization(&self, org_id: &str) -> Result<Vec<User>, ApiError> {
        decode::users(&self.get(&endpoints::users_by_organization(org_id)).await?)
    }

    async fn create_user(&self, req: &UserRequest) -> Result<Option<User>, ApiError> {
        decode::user(&self.post(endpoints::CREATE_USER, req).await?)
    }

    async fn update_user(&self, id: &str, req: &UserRequest) -> Result<Option<User>, ApiError> {
        decode::user(&self.put(&endpoints::user(id), req).await?)
    }

    async fn set_user_active(&self, id: &str, active: bool) -> Result<Option<User>, ApiError> {
        let req = SetActiveRequest { is_active: active };
        decode::user(&self.put(&endpoints::user_activate(id), &req).await?)
    }

    async fn generate_mfa(&self, user_id: &str) -> Result<(), ApiError> {
        self.get(&endpoints::generate_mfa(user_id)).await?;
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        decode::groups(&self.get(endpoints::GROUPS).await?)
    }

    async fn create_group(&self, req: &GroupRequest) -> Result<GroupWriteResponse, ApiError> {
        decode::group_write(&self.post(endpoints::CREATE_GROUP, req).await?)
    }

    async fn update_group(
        &self,
        id: &str,
        req: &GroupRequest,
    ) -> Result<GroupWriteResponse, ApiError> {
        decode::group_write(&self.put(&endpoints::group(id), req).await?)
    }

    async fn delete_group(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&endpoints::group(id)).await?;
        Ok(())
    }

    async fn list_active_sessions(&self) -> Result<Vec<ActiveSession>, ApiError> {
        decode::sessions(&self.get(endpoints::ACTIVE_SESSIONS).await?)
    }

    async fn kill_sessions(&self, ids: &[EntityId]) -> Result<(), ApiError> {
        let req = KillSessionsRequest {
            session_ids: ids.to_vec(),
        };
        self.post(endpoints::KILL_SESSIONS, &req).await?;
        Ok(())
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>, ApiError> {
        decode::history(&self.get(endpoints::HISTORY).await?)
    }
}
