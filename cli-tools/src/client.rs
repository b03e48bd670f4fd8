//! Native HTTP client implementation using reqwest

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use shared::api::{
    check_status, decode, endpoints, read_body, token_from_body, AdminApi, ApiClientConfig, ApiError,
    CreateAdminRequest, CreateOrganizationRequest, GroupRequest, GroupWriteResponse,
    KillSessionsRequest, LoginOutcome, LoginRequest, QrOutcome, RemoveAdminRequest,
    SetActiveRequest, UserRequest, VerifyMfaRequest,
};
use shared::{
    ActiveSession, EntityId, Group, HistoryRecord, Organization, OrganizationDetail, User,
};

/// Native API client using reqwest
pub struct NativeApiClient {
    client: Client,
    jar: Arc<Jar>,
    config: ApiClientConfig,
}

impl NativeApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            jar,
            config,
        })
    }

    fn base_url(&self) -> Result<Url, ApiError> {
        Url::parse(&self.config.base_url).map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Seed the jar from a previous run's `Cookie` header.
    pub fn restore_cookies(&self, header: &str) -> Result<(), ApiError> {
        let url = self.base_url()?;
        for cookie in header.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            self.jar.add_cookie_str(cookie, &url);
        }
        Ok(())
    }

    /// Cookies the server has set so far, as a `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        let url = self.base_url().ok()?;
        self.jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.config.bearer_header() {
            Some(header) => req.header("Authorization", header),
            None => req,
        }
    }

    async fn send(&self, method: &str, endpoint: &str, req: RequestBuilder) -> Result<String, ApiError> {
        tracing::debug!("{} {}", method, self.config.url(endpoint));
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = read_body(response.text().await)?;
        tracing::debug!("{} {} -> {}", method, endpoint, status);
        check_status(status, body)
    }

    async fn get(&self, endpoint: &str) -> Result<String, ApiError> {
        let req = self.client.get(self.config.url(endpoint));
        self.send("GET", endpoint, req).await
    }

    async fn delete(&self, endpoint: &str) -> Result<String, ApiError> {
        let req = self.client.delete(self.config.url(endpoint));
        self.send("DELETE", endpoint, req).await
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<String, ApiError> {
        let req = self.client.post(self.config.url(endpoint)).json(body);
        self.send("POST", endpoint, req).await
    }

    async fn put<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<String, ApiError> {
        let req = self.client.put(self.config.url(endpoint)).json(body);
        self.send("PUT", endpoint, req).await
    }
}

impl AdminApi for NativeApiClient {
    async fn login(&self, req: &LoginRequest) -> Result<LoginOutcome, ApiError> {
        LoginOutcome::from_body(&self.post(endpoints::LOGIN, req).await?)
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
        token_from_body(&self.post(&endpoints::verify_mfa(user_id), &req).await?)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_round_trip_through_header() {
        let client = NativeApiClient::new(ApiClientConfig::new("http://localhost:8080")).unwrap();
        assert_eq!(client.cookie_header(), None);

        client.restore_cookies("sid=abc; theme=dark").unwrap();
        let header = client.cookie_header().unwrap();
        assert!(header.contains("sid=abc"));
        assert!(header.contains("theme=dark"));
    }
}
