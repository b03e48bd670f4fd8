//! Console operations as plain async functions over [`AdminApi`].
//!
//! Each submit validates its draft first and returns
//! [`ApiError::Validation`] without touching the network when the draft is
//! invalid. The browser pages and the CLI both drive these.

use std::future::Future;

use crate::api::{AdminApi, ApiError, GroupRequest, RemoveAdminRequest};
use crate::auth::{AuthFlow, AuthFlowError, Session, SessionStore, SessionStoreError};
use crate::features::ConsoleFeatures;
use crate::list_state::{EntityList, Selection};
use crate::models::{
    Activatable, EntityId, Group, Keyed, Organization, User, UserSummary,
};
use crate::validate::{
    validate_group_rename, AdminDraft, FormMode, GroupDraft, LoginDraft, OrganizationDraft,
    OtpDraft, UserDraft, Validate,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Flow(#[from] AuthFlowError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

impl WorkflowError {
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

fn check(draft: &impl Validate) -> Result<(), ApiError> {
    draft.validate().into_result().map_err(ApiError::Validation)
}

/// Run a list fetch through the reconciliation state.
pub async fn load_into<T, F>(list: &mut EntityList<T>, fetch: F) -> Result<(), ApiError>
where
    T: Keyed + Clone,
    F: Future<Output = Result<Vec<T>, ApiError>>,
{
    list.begin_fetch();
    match fetch.await {
        Ok(items) => {
            list.fetch_succeeded(items);
            Ok(())
        }
        Err(e) => {
            list.fetch_failed(&e);
            Err(e)
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

fn persist(store: &impl SessionStore, session: Option<Session>) -> Result<Option<Session>, WorkflowError> {
    if let Some(session) = &session {
        store.save(session)?;
    }
    Ok(session)
}

/// Submit credentials. `Ok(None)` means the flow moved to the MFA step (or
/// back to credentials with an error); `Ok(Some)` is a stored session.
pub async fn login<A: AdminApi, S: SessionStore>(
    api: &A,
    store: &S,
    flow: &mut AuthFlow,
    draft: &LoginDraft,
) -> Result<Option<Session>, WorkflowError> {
    if let Err(e) = check(draft) {
        flow.reject(e.user_message());
        return Err(e.into());
    }
    flow.submit_credentials(&draft.username)?;
    let result = api.login(&draft.to_request()).await;
    let session = flow.credentials_resolved(result)?;
    persist(store, session)
}

/// Fetch the provisioning QR for the user the flow is waiting on.
pub async fn fetch_qr<A: AdminApi>(api: &A, flow: &mut AuthFlow) -> Result<(), WorkflowError> {
    let user_id = flow
        .user_id()
        .map(str::to_string)
        .ok_or(AuthFlowError::InvalidTransition {
            state: flow.step().name(),
            event: "resolve qr code",
        })?;
    let result = api.mfa_qrcode(&user_id).await;
    flow.qr_resolved(result)?;
    Ok(())
}

pub async fn verify_otp<A: AdminApi, S: SessionStore>(
    api: &A,
    store: &S,
    flow: &mut AuthFlow,
    draft: &OtpDraft,
) -> Result<Option<Session>, WorkflowError> {
    if let Err(e) = check(draft) {
        flow.reject(e.user_message());
        return Err(e.into());
    }
    flow.submit_otp()?;
    let user_id = flow.user_id().unwrap_or_default().to_string();
    let result = api.verify_mfa(&user_id, &draft.code).await;
    let session = flow.otp_resolved(result)?;
    persist(store, session)
}

/// Best-effort server logout, then local teardown.
pub async fn logout<A: AdminApi, S: SessionStore>(api: &A, store: &S) -> Result<(), WorkflowError> {
    // Server-side failure must not keep a stale local session around
    let _ = api.logout().await;
    store.clear()?;
    Ok(())
}

// =============================================================================
// Organizations
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationCreated {
    pub organization: Option<Organization>,
    /// Result of the follow-up admin creation, if one was requested
    pub admin: Option<Result<(), ApiError>>,
}

pub async fn create_organization<A: AdminApi>(
    api: &A,
    draft: &OrganizationDraft,
    features: &ConsoleFeatures,
) -> Result<OrganizationCreated, ApiError> {
    check(draft)?;
    let organization = api.create_organization(&draft.to_request()).await?;

    let admin = match (&draft.admin, &organization) {
        (Some(admin), Some(org)) if features.admin_assignment => {
            Some(api.create_admin(&admin.to_request(&org.id)).await)
        }
        (Some(_), None) if features.admin_assignment => Some(Err(ApiError::Parse(
            "organization created but no id returned".to_string(),
        ))),
        _ => None,
    };

    Ok(OrganizationCreated {
        organization,
        admin,
    })
}

/// Flip an entity's active flag through `call`, patching the list with the
/// echo (or the requested state when the server sends none). A 404 drops
/// the entity from the list.
async fn toggle_active<T, F, Fut>(
    list: &mut EntityList<T>,
    id: &str,
    call: F,
) -> Result<bool, ApiError>
where
    T: Keyed + Activatable + Clone,
    F: FnOnce(bool) -> Fut,
    Fut: Future<Output = Result<Option<T>, ApiError>>,
{
    let current = list
        .get(id)
        .map(Activatable::is_active)
        .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
    let target = !current;
    match call(target).await {
        Ok(Some(updated)) => {
            let active = updated.is_active();
            list.upsert(updated);
            Ok(active)
        }
        Ok(None) => {
            list.patch(id, |item| item.set_active(target));
            Ok(target)
        }
        Err(e) => {
            if e.is_not_found() {
                list.remove(id);
            }
            Err(e)
        }
    }
}

pub async fn toggle_organization<A: AdminApi>(
    api: &A,
    list: &mut EntityList<Organization>,
    id: &str,
) -> Result<bool, ApiError> {
    toggle_active(list, id, |active| api.set_organization_active(id, active)).await
}

pub async fn assign_admin<A: AdminApi>(
    api: &A,
    organization_id: &str,
    draft: &AdminDraft,
) -> Result<(), ApiError> {
    check(draft)?;
    api.create_admin(&draft.to_request(organization_id)).await
}

pub async fn remove_admin<A: AdminApi>(
    api: &A,
    organization_id: &str,
    user_id: &str,
) -> Result<(), ApiError> {
    api.remove_admin(&RemoveAdminRequest {
        user_id: user_id.to_string(),
        organization_id: organization_id.to_string(),
    })
    .await
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UserSaved {
    pub user: Option<User>,
    /// Result of the follow-up generate-mfa call, if one was made
    pub mfa: Option<Result<(), ApiError>>,
}

/// Create (`id == None`) or update a user from its draft.
pub async fn save_user<A: AdminApi>(
    api: &A,
    id: Option<&str>,
    draft: &UserDraft,
    features: &ConsoleFeatures,
) -> Result<UserSaved, ApiError> {
    check(draft)?;
    let req = draft.to_request();
    match (draft.mode, id) {
        (FormMode::Update, Some(id)) => Ok(UserSaved {
            user: api.update_user(id, &req).await?,
            mfa: None,
        }),
        (FormMode::Update, None) => Err(ApiError::NotFound("user id missing".to_string())),
        (FormMode::Create, _) => {
            let user = api.create_user(&req).await?;
            let mfa = match &user {
                Some(created) if draft.mfa_enabled && features.mfa_on_create => {
                    Some(api.generate_mfa(&created.id).await)
                }
                _ => None,
            };
            Ok(UserSaved { user, mfa })
        }
    }
}

pub async fn toggle_user<A: AdminApi>(
    api: &A,
    list: &mut EntityList<User>,
    id: &str,
) -> Result<bool, ApiError> {
    toggle_active(list, id, |active| api.set_user_active(id, active)).await
}

// =============================================================================
// Groups
// =============================================================================

/// Copy of `group` with `user` appended; unchanged if already a member.
pub fn with_member_added(group: &Group, user: &UserSummary) -> Group {
    let mut next = group.clone();
    if !next.has_member(&user.id) {
        next.members.push(user.clone());
    }
    next
}

pub fn with_member_removed(group: &Group, user_id: &str) -> Group {
    let mut next = group.clone();
    next.members.retain(|m| m.id != user_id);
    next
}

/// Organization users not yet in the group.
pub fn member_candidates<'a>(group: &Group, users: &'a [User]) -> Vec<&'a User> {
    users.iter().filter(|u| !group.has_member(&u.id)).collect()
}

pub async fn create_group<A: AdminApi>(api: &A, draft: &GroupDraft) -> Result<Option<Group>, ApiError> {
    check(draft)?;
    Ok(api.create_group(&draft.to_request()).await?.group)
}

/// PUT the full replacement; the list takes the server echo when present,
/// otherwise the value that was sent.
async fn replace_group<A: AdminApi>(
    api: &A,
    list: &mut EntityList<Group>,
    next: Group,
) -> Result<Group, ApiError> {
    match api.update_group(&next.id, &GroupRequest::from_group(&next)).await {
        Ok(resp) => {
            let group = resp.group.unwrap_or(next);
            list.upsert(group.clone());
            Ok(group)
        }
        Err(e) => {
            if e.is_not_found() {
                list.remove(&next.id);
            }
            Err(e)
        }
    }
}

pub async fn add_member<A: AdminApi>(
    api: &A,
    list: &mut EntityList<Group>,
    group_id: &str,
    user: &UserSummary,
) -> Result<Group, ApiError> {
    let group = list
        .get(group_id)
        .ok_or_else(|| ApiError::NotFound(group_id.to_string()))?;
    if group.has_member(&user.id) {
        return Ok(group.clone());
    }
    let next = with_member_added(group, user);
    replace_group(api, list, next).await
}

pub async fn remove_member<A: AdminApi>(
    api: &A,
    list: &mut EntityList<Group>,
    group_id: &str,
    user_id: &str,
) -> Result<Group, ApiError> {
    let group = list
        .get(group_id)
        .ok_or_else(|| ApiError::NotFound(group_id.to_string()))?;
    let next = with_member_removed(group, user_id);
    replace_group(api, list, next).await
}

pub async fn rename_group<A: AdminApi>(
    api: &A,
    list: &mut EntityList<Group>,
    group_id: &str,
    name: &str,
) -> Result<Group, ApiError> {
    validate_group_rename(name)
        .into_result()
        .map_err(ApiError::Validation)?;
    let mut next = list
        .get(group_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(group_id.to_string()))?;
    next.name = name.trim().to_string();
    replace_group(api, list, next).await
}

pub async fn delete_group<A: AdminApi>(
    api: &A,
    list: &mut EntityList<Group>,
    group_id: &str,
) -> Result<(), ApiError> {
    match api.delete_group(group_id).await {
        Ok(()) => {
            list.remove(group_id);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            list.remove(group_id);
            Err(e)
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Kill the selected sessions. Returns how many were terminated; an empty
/// selection makes no call.
pub async fn kill_selected<A: AdminApi, T: Keyed + Clone>(
    api: &A,
    list: &mut EntityList<T>,
    selection: &mut Selection,
) -> Result<usize, ApiError> {
    if selection.is_empty() {
        return Ok(0);
    }
    let ids: Vec<EntityId> = selection.ids();
    api.kill_sessions(&ids).await?;
    list.remove_many(&ids);
    selection.clear();
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        AuthMode, CreateAdminRequest, CreateOrganizationRequest, GroupWriteResponse,
        LoginOutcome, LoginRequest, QrOutcome, UserRequest,
    };
    use crate::auth::{AuthStep, MemorySessionStore};
    use crate::filter::{filter_items, ListQuery};
    use crate::models::{
        ActiveSession, HistoryRecord, OrganizationDetail, OrganizationRef,
    };
    use std::cell::{Cell, RefCell};

    /// In-memory backend that counts every call.
    #[derive(Default)]
    struct FakeApi {
        calls: RefCell<Vec<String>>,
        next_id: Cell<u32>,
        login_outcome: RefCell<Option<LoginOutcome>>,
        orgs: RefCell<Vec<Organization>>,
        users: RefCell<Vec<User>>,
        groups: RefCell<Vec<Group>>,
        sessions: RefCell<Vec<ActiveSession>>,
        created_admins: RefCell<Vec<CreateAdminRequest>>,
        created_org_bodies: RefCell<Vec<CreateOrganizationRequest>>,
    }

    impl FakeApi {
        fn hit(&self, name: &str) {
            self.calls.borrow_mut().push(name.to_string());
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn fresh_id(&self, prefix: &str) -> String {
            let n = self.next_id.get() + 1;
            self.next_id.set(n);
            format!("{}{}", prefix, n)
        }
    }

    fn user_from(id: &str, req: &UserRequest) -> User {
        User {
            id: id.into(),
            username: req.username.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            organization_ids: req.organization_ids.clone(),
            organization_names: vec![],
            mfa_enabled: req.mfa_enabled,
            active: true,
            role: None,
            last_active: None,
        }
    }

    impl AdminApi for FakeApi {
        async fn login(&self, _req: &LoginRequest) -> Result<LoginOutcome, ApiError> {
            self.hit("login");
            self.login_outcome
                .borrow()
                .clone()
                .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))
        }

        async fn mfa_qrcode(&self, _user_id: &str) -> Result<QrOutcome, ApiError> {
            self.hit("mfa_qrcode");
            Ok(QrOutcome::Image("data:image/png;base64,QR".into()))
        }

        async fn verify_mfa(&self, _user_id: &str, code: &str) -> Result<Option<String>, ApiError> {
            self.hit("verify_mfa");
            if code == "123456" {
                Ok(Some("mfa-token".into()))
            } else {
                Err(ApiError::Server {
                    status: 400,
                    message: "Invalid MFA token".into(),
                })
            }
        }

        async fn logout(&self) -> Result<(), ApiError> {
            self.hit("logout");
            Err(ApiError::Network("offline".into()))
        }

        async fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
            self.hit("list_organizations");
            Ok(self.orgs.borrow().clone())
        }

        async fn get_organization(&self, id: &str) -> Result<OrganizationDetail, ApiError> {
            self.hit("get_organization");
            let org = self
                .orgs
                .borrow()
                .iter()
                .find(|o| o.id == id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(id.into()))?;
            Ok(OrganizationDetail {
                admins: org.admins.clone(),
                user_count: 0,
                organization: org,
            })
        }

        async fn create_organization(
            &self,
            req: &CreateOrganizationRequest,
        ) -> Result<Option<Organization>, ApiError> {
            self.hit("create_organization");
            self.created_org_bodies.borrow_mut().push(req.clone());
            let org = Organization {
                id: self.fresh_id("o"),
                name: req.organization.clone(),
                active: true,
                created_at: None,
                admins: vec![],
                member_count: None,
            };
            self.orgs.borrow_mut().push(org.clone());
            Ok(Some(org))
        }

        async fn set_organization_active(
            &self,
            id: &str,
            active: bool,
        ) -> Result<Option<Organization>, ApiError> {
            self.hit("set_organization_active");
            let mut orgs = self.orgs.borrow_mut();
            let org = orgs
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| ApiError::NotFound(id.into()))?;
            org.active = active;
            Ok(None)
        }

        async fn create_admin(&self, req: &CreateAdminRequest) -> Result<(), ApiError> {
            self.hit("create_admin");
            self.created_admins.borrow_mut().push(req.clone());
            Ok(())
        }

        async fn remove_admin(&self, _req: &RemoveAdminRequest) -> Result<(), ApiError> {
            self.hit("remove_admin");
            Ok(())
        }

        async fn list_users(&self) -> Result<Vec<User>, ApiError> {
            self.hit("list_users");
            Ok(self.users.borrow().clone())
        }

        async fn list_users_by_organization(&self, org_id: &str) -> Result<Vec<User>, ApiError> {
            self.hit("list_users_by_organization");
            Ok(self
                .users
                .borrow()
                .iter()
                .filter(|u| u.organization_ids.iter().any(|o| o == org_id))
                .cloned()
                .collect())
        }

        async fn create_user(&self, req: &UserRequest) -> Result<Option<User>, ApiError> {
            self.hit("create_user");
            let user = user_from(&self.fresh_id("u"), req);
            self.users.borrow_mut().push(user.clone());
            Ok(Some(user))
        }

        async fn update_user(&self, id: &str, req: &UserRequest) -> Result<Option<User>, ApiError> {
            self.hit("update_user");
            Ok(Some(user_from(id, req)))
        }

        async fn set_user_active(&self, id: &str, active: bool) -> Result<Option<User>, ApiError> {
            self.hit("set_user_active");
            let mut users = self.users.borrow_mut();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| ApiError::NotFound(id.into()))?;
            user.active = active;
            Ok(Some(user.clone()))
        }

        async fn generate_mfa(&self, _user_id: &str) -> Result<(), ApiError> {
            self.hit("generate_mfa");
            Ok(())
        }

        async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
            self.hit("list_groups");
            Ok(self.groups.borrow().clone())
        }

        async fn create_group(&self, req: &GroupRequest) -> Result<GroupWriteResponse, ApiError> {
            self.hit("create_group");
            let group = Group {
                id: self.fresh_id("g"),
                name: req.name.clone(),
                organization: Some(OrganizationRef {
                    id: req.organization_id.clone(),
                    name: String::new(),
                }),
                members: vec![],
            };
            self.groups.borrow_mut().push(group.clone());
            Ok(GroupWriteResponse {
                group: Some(group),
                message: Some("Group created successfully".into()),
            })
        }

        async fn update_group(
            &self,
            id: &str,
            req: &GroupRequest,
        ) -> Result<GroupWriteResponse, ApiError> {
            self.hit("update_group");
            let mut groups = self.groups.borrow_mut();
            let group = groups
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| ApiError::NotFound(id.into()))?;
            group.name = req.name.clone();
            let users = self.users.borrow();
            group.members = req
                .user_ids
                .iter()
                .map(|uid| UserSummary {
                    id: uid.clone(),
                    username: users
                        .iter()
                        .find(|u| &u.id == uid)
                        .map(|u| u.username.clone())
                        .unwrap_or_default(),
                })
                .collect();
            Ok(GroupWriteResponse {
                group: None,
                message: Some("Group updated successfully".into()),
            })
        }

        async fn delete_group(&self, id: &str) -> Result<(), ApiError> {
            self.hit("delete_group");
            let mut groups = self.groups.borrow_mut();
            let before = groups.len();
            groups.retain(|g| g.id != id);
            if groups.len() == before {
                return Err(ApiError::NotFound(id.into()));
            }
            Ok(())
        }

        async fn list_active_sessions(&self) -> Result<Vec<ActiveSession>, ApiError> {
            self.hit("list_active_sessions");
            Ok(self.sessions.borrow().clone())
        }

        async fn kill_sessions(&self, ids: &[EntityId]) -> Result<(), ApiError> {
            self.hit("kill_sessions");
            self.sessions.borrow_mut().retain(|s| !ids.contains(&s.id));
            Ok(())
        }

        async fn list_history(&self) -> Result<Vec<HistoryRecord>, ApiError> {
            self.hit("list_history");
            Ok(vec![])
        }
    }

    fn session(id: &str, user: &str) -> ActiveSession {
        ActiveSession {
            id: id.into(),
            username: user.into(),
            active_since: "2025-04-29 15:28:45".into(),
            remote_host: "192.168.1.101".into(),
            connection_name: "QA Environment".into(),
            location: None,
            duration: None,
            last_activity: None,
        }
    }

    fn valid_user_draft() -> UserDraft {
        UserDraft {
            organization_ids: vec!["o1".into()],
            username: "devuser".into(),
            password: "secret1".into(),
            first_name: "Dev".into(),
            last_name: "User".into(),
            email: "dev@acme.io".into(),
            phone: "555-0100".into(),
            ..UserDraft::create()
        }
    }

    #[tokio::test]
    async fn invalid_drafts_make_no_network_call() {
        let api = FakeApi::default();
        let features = ConsoleFeatures::default();

        let err = save_user(&api, None, &UserDraft::create(), &features)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = create_organization(&api, &OrganizationDraft::default(), &features)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = create_group(&api, &GroupDraft::default()).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Please select organization and enter group name"
        );

        let store = MemorySessionStore::new();
        let mut flow = AuthFlow::new(AuthMode::Cookie);
        let err = login(&api, &store, &mut flow, &LoginDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Api(ApiError::Validation(_))));
        assert_eq!(flow.step(), &AuthStep::AwaitingCredentials);

        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn create_organization_then_refetch_lists_it_once() {
        let api = FakeApi::default();
        let mut list = EntityList::new();
        load_into(&mut list, api.list_organizations()).await.unwrap();
        assert!(list.is_empty());

        let draft = OrganizationDraft {
            name: "Acme Corp".into(),
            admin: None,
        };
        let created = create_organization(&api, &draft, &ConsoleFeatures::default())
            .await
            .unwrap();
        assert_eq!(
            api.created_org_bodies.borrow().as_slice(),
            &[CreateOrganizationRequest {
                organization: "Acme Corp".into()
            }]
        );
        assert!(created.admin.is_none());
        if let Some(org) = created.organization {
            list.upsert(org);
        }

        load_into(&mut list, api.list_organizations()).await.unwrap();
        let matches = list.items().iter().filter(|o| o.name == "Acme Corp").count();
        assert_eq!(matches, 1);
    }

    #[tokio::test]
    async fn organization_admin_uses_returned_id() {
        let api = FakeApi::default();
        let draft = OrganizationDraft {
            name: "Acme Corp".into(),
            admin: Some(AdminDraft {
                username: "acmeadmin".into(),
                password: "secret1".into(),
            }),
        };
        let created = create_organization(&api, &draft, &ConsoleFeatures::default())
            .await
            .unwrap();
        assert_eq!(created.admin, Some(Ok(())));
        let admins = api.created_admins.borrow();
        assert_eq!(admins[0].organization_id, created.organization.unwrap().id);
    }

    #[tokio::test]
    async fn toggling_twice_restores_status() {
        let api = FakeApi::default();
        api.create_organization(&CreateOrganizationRequest {
            organization: "Acme Corp".into(),
        })
        .await
        .unwrap();
        let mut list = EntityList::new();
        load_into(&mut list, api.list_organizations()).await.unwrap();
        let id = list.items()[0].id.clone();

        assert!(!toggle_organization(&api, &mut list, &id).await.unwrap());
        assert!(!list.get(&id).unwrap().active);
        assert!(toggle_organization(&api, &mut list, &id).await.unwrap());
        assert!(list.get(&id).unwrap().active);

        let mut users = EntityList::new();
        let saved = save_user(&api, None, &valid_user_draft(), &ConsoleFeatures::default())
            .await
            .unwrap();
        users.upsert(saved.user.unwrap());
        let uid = users.items()[0].id.clone();
        toggle_user(&api, &mut users, &uid).await.unwrap();
        toggle_user(&api, &mut users, &uid).await.unwrap();
        assert!(users.get(&uid).unwrap().active);
    }

    #[tokio::test]
    async fn toggle_on_vanished_entity_drops_it() {
        let api = FakeApi::default();
        let mut list = EntityList::new();
        list.fetch_succeeded(vec![Organization {
            id: "gone".into(),
            name: "Old".into(),
            active: true,
            created_at: None,
            admins: vec![],
            member_count: None,
        }]);
        let err = toggle_organization(&api, &mut list, "gone").await.unwrap_err();
        assert_eq!(err.user_message(), "This item no longer exists");
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn user_create_with_mfa_calls_generate_mfa() {
        let api = FakeApi::default();
        let mut draft = valid_user_draft();
        draft.mfa_enabled = true;
        let saved = save_user(&api, None, &draft, &ConsoleFeatures::default())
            .await
            .unwrap();
        assert_eq!(saved.mfa, Some(Ok(())));
        assert!(!saved.user.unwrap().mfa_enabled);
        assert_eq!(
            api.calls.borrow().as_slice(),
            &["create_user".to_string(), "generate_mfa".to_string()]
        );
    }

    #[tokio::test]
    async fn login_without_mfa_stores_session() {
        let api = FakeApi::default();
        *api.login_outcome.borrow_mut() = Some(LoginOutcome::Authenticated {
            token: Some("tok".into()),
        });
        let store = MemorySessionStore::new();
        let mut flow = AuthFlow::new(AuthMode::Bearer);
        let draft = LoginDraft {
            username: "guacadmin".into(),
            password: "guacadmin".into(),
        };
        let session = login(&api, &store, &mut flow, &draft).await.unwrap().unwrap();
        assert_eq!(session.token.as_deref(), Some("tok"));
        assert_eq!(store.load().unwrap(), Some(session));
    }

    #[tokio::test]
    async fn mfa_login_scenario() {
        let api = FakeApi::default();
        *api.login_outcome.borrow_mut() = Some(LoginOutcome::MfaRequired {
            user_id: "u1".into(),
        });
        let store = MemorySessionStore::new();
        let mut flow = AuthFlow::new(AuthMode::Bearer);
        let draft = LoginDraft {
            username: "guacadmin".into(),
            password: "guacadmin".into(),
        };
        assert!(login(&api, &store, &mut flow, &draft).await.unwrap().is_none());
        assert_eq!(flow.user_id(), Some("u1"));
        assert!(!store.is_authenticated());

        fetch_qr(&api, &mut flow).await.unwrap();

        let wrong = OtpDraft {
            code: "000000".into(),
        };
        assert!(verify_otp(&api, &store, &mut flow, &wrong).await.unwrap().is_none());
        assert_eq!(flow.error(), Some("Invalid MFA token"));

        let short = OtpDraft { code: "12".into() };
        assert!(verify_otp(&api, &store, &mut flow, &short).await.is_err());
        assert_eq!(flow.error(), Some("Please enter a 6-digit code."));

        let code = OtpDraft {
            code: "123456".into(),
        };
        let session = verify_otp(&api, &store, &mut flow, &code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.token.as_deref(), Some("mfa-token"));
        assert!(store.is_authenticated());

        logout(&api, &store).await.unwrap();
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn group_membership_edits() {
        let api = FakeApi::default();
        let devuser = save_user(&api, None, &valid_user_draft(), &ConsoleFeatures::default())
            .await
            .unwrap()
            .user
            .unwrap();

        let draft = GroupDraft {
            name: "QA Team".into(),
            organization_id: "o1".into(),
        };
        let group = create_group(&api, &draft).await.unwrap().unwrap();
        let mut groups = EntityList::new();
        load_into(&mut groups, api.list_groups()).await.unwrap();

        let users = api.list_users_by_organization("o1").await.unwrap();
        assert_eq!(member_candidates(&group, &users).len(), 1);

        let updated = add_member(&api, &mut groups, &group.id, &devuser.summary())
            .await
            .unwrap();
        assert!(updated.has_member(&devuser.id));
        assert!(member_candidates(&updated, &users).is_empty());
        let calls = api.call_count();
        add_member(&api, &mut groups, &group.id, &devuser.summary())
            .await
            .unwrap();
        assert_eq!(api.call_count(), calls);

        let renamed = rename_group(&api, &mut groups, &group.id, " Ops ").await.unwrap();
        assert_eq!(renamed.name, "Ops");
        assert!(rename_group(&api, &mut groups, &group.id, "  ").await.is_err());

        let emptied = remove_member(&api, &mut groups, &group.id, &devuser.id)
            .await
            .unwrap();
        assert!(emptied.members.is_empty());

        let found = filter_items(groups.items(), &ListQuery::search("ops"));
        assert_eq!(found.len(), 1);

        delete_group(&api, &mut groups, &group.id).await.unwrap();
        assert!(groups.is_empty());
        assert!(api.groups.borrow().is_empty());
    }

    #[tokio::test]
    async fn kill_selected_sessions() {
        let api = FakeApi::default();
        *api.sessions.borrow_mut() = vec![session("1", "guacadmin"), session("2", "devuser"), session("3", "testuser")];
        let mut list = EntityList::new();
        load_into(&mut list, api.list_active_sessions()).await.unwrap();

        let mut selection = Selection::new();
        assert_eq!(kill_selected(&api, &mut list, &mut selection).await.unwrap(), 0);
        assert_eq!(api.calls.borrow().last().map(String::as_str), Some("list_active_sessions"));

        selection.toggle("1");
        selection.toggle("3");
        assert_eq!(kill_selected(&api, &mut list, &mut selection).await.unwrap(), 2);
        assert!(selection.is_empty());
        let left: Vec<&str> = list.items().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(left, vec!["2"]);
        assert_eq!(api.sessions.borrow().len(), 1);
    }
}
