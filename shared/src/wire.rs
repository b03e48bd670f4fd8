//! Mapping layer between backend JSON and the canonical schema.
//!
//! The backend is not consistent about field names (`_id` vs `id`,
//! `organization` vs `name`, `users` vs `members`, populated references vs
//! bare ids). Everything lenient lives here; the rest of the crate only sees
//! [`crate::models`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::models::{
    ActiveSession, EntityId, Group, HistoryRecord, HistoryStatus, Organization,
    OrganizationDetail, OrganizationRef, User, UserSummary,
};

/// Accept ids encoded as strings or numbers.
fn de_id<'de, D>(deserializer: D) -> Result<EntityId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Treat `null` like a missing field.
fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

// =============================================================================
// References (bare id or populated object)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WireUserObject {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: EntityId,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireUserRef {
    Populated(WireUserObject),
    Id(String),
}

impl From<WireUserRef> for UserSummary {
    fn from(wire: WireUserRef) -> Self {
        match wire {
            WireUserRef::Populated(u) => UserSummary {
                id: u.id,
                username: u.username,
            },
            WireUserRef::Id(id) => UserSummary {
                username: String::new(),
                id,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireOrganizationObject {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: EntityId,
    #[serde(default, alias = "name")]
    pub organization: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireOrganizationRef {
    Populated(WireOrganizationObject),
    Id(String),
}

impl From<WireOrganizationRef> for OrganizationRef {
    fn from(wire: WireOrganizationRef) -> Self {
        match wire {
            WireOrganizationRef::Populated(o) => OrganizationRef {
                id: o.id,
                name: o.organization,
            },
            WireOrganizationRef::Id(id) => OrganizationRef {
                name: String::new(),
                id,
            },
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrganization {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: EntityId,
    #[serde(default, alias = "name")]
    pub organization: String,
    #[serde(default = "default_true", alias = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub admins: Vec<WireUserRef>,
    #[serde(default, alias = "userCount")]
    pub member_count: Option<u64>,
}

/// Unreadable creation stamps are dropped rather than failing the whole list.
fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<WireOrganization> for Organization {
    fn from(wire: WireOrganization) -> Self {
        Organization {
            id: wire.id,
            name: wire.organization,
            active: wire.is_active,
            created_at: wire.created_at.as_deref().and_then(parse_created_at),
            admins: wire.admins.into_iter().map(Into::into).collect(),
            member_count: wire.member_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: EntityId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, alias = "fullName")]
    pub fullname: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(
        default,
        alias = "organizations",
        deserialize_with = "de_null_default"
    )]
    pub organization_ids: Vec<WireOrganizationRef>,
    /// Display-only organization name some list endpoints return
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default = "default_true", alias = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub last_active: Option<String>,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        let (first_name, last_name) = match (wire.first_name, wire.last_name, wire.fullname) {
            (None, None, Some(full)) => match full.split_once(' ') {
                Some((first, last)) => (first.to_string(), last.trim().to_string()),
                None => (full, String::new()),
            },
            (first, last, _) => (first.unwrap_or_default(), last.unwrap_or_default()),
        };

        let orgs: Vec<OrganizationRef> =
            wire.organization_ids.into_iter().map(Into::into).collect();
        let mut organization_names: Vec<String> = orgs
            .iter()
            .filter(|o| !o.name.is_empty())
            .map(|o| o.name.clone())
            .collect();
        if let Some(name) = wire.organization.filter(|n| !n.is_empty()) {
            if !organization_names.contains(&name) {
                organization_names.push(name);
            }
        }

        User {
            id: wire.id,
            username: wire.username,
            first_name,
            last_name,
            email: wire.email,
            phone: wire.phone,
            organization_ids: orgs.into_iter().map(|o| o.id).collect(),
            organization_names,
            mfa_enabled: wire.mfa_enabled,
            active: wire.is_active,
            role: wire.role,
            last_active: wire.last_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGroup {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "organizationId")]
    pub organization: Option<WireOrganizationRef>,
    #[serde(
        default,
        alias = "members",
        alias = "userIds",
        deserialize_with = "de_null_default"
    )]
    pub users: Vec<WireUserRef>,
}

impl From<WireGroup> for Group {
    fn from(wire: WireGroup) -> Self {
        Group {
            id: wire.id,
            name: wire.name,
            organization: wire.organization.map(Into::into),
            members: wire.users.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireActiveSession {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: EntityId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub active_since: String,
    #[serde(default)]
    pub remote_host: String,
    #[serde(default)]
    pub connection_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub last_activity: Option<String>,
}

impl From<WireActiveSession> for ActiveSession {
    fn from(wire: WireActiveSession) -> Self {
        ActiveSession {
            id: wire.id,
            username: wire.username,
            active_since: wire.active_since,
            remote_host: wire.remote_host,
            connection_name: wire.connection_name,
            location: wire.location,
            duration: wire.duration,
            last_activity: wire.last_activity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHistoryRecord {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: EntityId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub connection_name: String,
    #[serde(default)]
    pub remote_host: String,
    #[serde(default = "default_history_status")]
    pub status: HistoryStatus,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub logs_link: Option<String>,
}

fn default_history_status() -> HistoryStatus {
    HistoryStatus::Other
}

impl From<WireHistoryRecord> for HistoryRecord {
    fn from(wire: WireHistoryRecord) -> Self {
        HistoryRecord {
            id: wire.id,
            username: wire.username,
            start_time: wire.start_time,
            end_time: wire.end_time,
            duration: wire.duration,
            connection_name: wire.connection_name,
            remote_host: wire.remote_host,
            status: wire.status,
            protocol: wire.protocol,
            logs_link: wire.logs_link,
        }
    }
}

// =============================================================================
// Response envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OrganizationsEnvelope {
    #[serde(default, alias = "organizations", deserialize_with = "de_null_default")]
    pub orgs: Vec<WireOrganization>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationEnvelope {
    #[serde(alias = "organization")]
    pub org: Option<WireOrganization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetailEnvelope {
    #[serde(alias = "org", alias = "organization")]
    pub orgs: WireOrganization,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default, deserialize_with = "de_null_default")]
    pub admins: Vec<WireUserRef>,
}

impl From<OrganizationDetailEnvelope> for OrganizationDetail {
    fn from(wire: OrganizationDetailEnvelope) -> Self {
        let admins: Vec<UserSummary> = wire.admins.into_iter().map(Into::into).collect();
        let mut organization: Organization = wire.orgs.into();
        if organization.admins.is_empty() {
            organization.admins = admins.clone();
        }
        organization.member_count.get_or_insert(wire.user_count);
        OrganizationDetail {
            organization,
            user_count: wire.user_count,
            admins,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersEnvelope {
    #[serde(default, deserialize_with = "de_null_default")]
    pub users: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
pub struct GroupsEnvelope {
    #[serde(default, deserialize_with = "de_null_default")]
    pub groups: Vec<WireGroup>,
}

#[derive(Debug, Deserialize)]
pub struct GroupEnvelope {
    pub group: Option<WireGroup>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsEnvelope {
    #[serde(default, deserialize_with = "de_null_default")]
    pub sessions: Vec<WireActiveSession>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryEnvelope {
    #[serde(default, alias = "records", deserialize_with = "de_null_default")]
    pub history: Vec<WireHistoryRecord>,
}

/// Any body carrying an optional human-readable `message`.
#[derive(Debug, Default, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

/// Login response in every shape the backend has produced.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub mfa_enabled: Option<bool>,
    #[serde(default)]
    pub mfa_required: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQrResponse {
    #[serde(default, alias = "qrCode", alias = "qr_code_image")]
    pub qr_code_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireTokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Decode a JSON body into a canonical type via its wire form.
pub fn decode<W, T>(body: &str) -> Result<T, serde_json::Error>
where
    W: for<'de> Deserialize<'de>,
    T: From<W>,
{
    serde_json::from_str::<W>(body).map(T::from)
}

/// Decode a list envelope into canonical entities.
pub fn decode_list<E, W, T, F>(body: &str, unwrap: F) -> Result<Vec<T>, serde_json::Error>
where
    E: for<'de> Deserialize<'de>,
    T: From<W>,
    F: FnOnce(E) -> Vec<W>,
{
    let envelope: E = serde_json::from_str(body)?;
    Ok(unwrap(envelope).into_iter().map(T::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn organization_accepts_both_name_fields() {
        let a: Organization =
            decode::<WireOrganization, _>(&json!({"_id": "o1", "organization": "Acme Corp"}).to_string())
                .unwrap();
        let b: Organization =
            decode::<WireOrganization, _>(&json!({"id": "o1", "name": "Acme Corp"}).to_string())
                .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name, "Acme Corp");
        assert!(a.active, "missing status defaults to active");
    }

    #[test]
    fn organization_inactive_flag() {
        let org: Organization = decode::<WireOrganization, _>(
            &json!({"_id": "o2", "organization": "Globex", "isActive": false}).to_string(),
        )
        .unwrap();
        assert!(!org.active);
    }

    #[test]
    fn organization_created_at_is_typed() {
        let org: Organization = decode::<WireOrganization, _>(
            &json!({"_id": "o3", "organization": "Initech", "createdAt": "2025-04-28T10:15:00+02:00"})
                .to_string(),
        )
        .unwrap();
        let created = org.created_at.unwrap();
        assert_eq!(created.to_rfc3339(), "2025-04-28T08:15:00+00:00");

        let org: Organization = decode::<WireOrganization, _>(
            &json!({"_id": "o4", "organization": "Hooli", "createdAt": "last week"}).to_string(),
        )
        .unwrap();
        assert_eq!(org.created_at, None);
    }

    #[test]
    fn numeric_ids_become_strings() {
        let record: HistoryRecord = decode::<WireHistoryRecord, _>(
            &json!({
                "id": 3,
                "username": "devuser",
                "startTime": "2025-04-28 10:15:00",
                "connectionName": "Production Server",
                "remoteHost": "192.168.1.100",
                "status": "completed",
                "protocol": "VNC"
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(record.id, "3");
        assert_eq!(record.status, HistoryStatus::Completed);
    }

    #[test]
    fn user_with_populated_organizations() {
        let user: User = decode::<WireUser, _>(
            &json!({
                "_id": "u1",
                "username": "devuser",
                "firstName": "Dev",
                "lastName": "User",
                "email": "dev@acme.io",
                "phone": "555-0100",
                "organizationIds": [
                    {"_id": "o1", "organization": "Acme Corp"},
                    "o2"
                ],
                "mfaEnabled": true
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(user.organization_ids, vec!["o1", "o2"]);
        assert_eq!(user.organization_names, vec!["Acme Corp"]);
        assert!(user.mfa_enabled);
        assert!(user.active);
    }

    #[test]
    fn user_fullname_is_split() {
        let user: User = decode::<WireUser, _>(
            &json!({
                "_id": "1",
                "username": "john_doe",
                "fullname": "John Doe",
                "organization": "Acme Corp",
                "role": "admin"
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(user.first_name, "John");
        assert_eq!(user.last_name, "Doe");
        assert_eq!(user.organization_names, vec!["Acme Corp"]);
        assert_eq!(user.role.as_deref(), Some("admin"));
    }

    #[test]
    fn group_with_populated_members_and_org() {
        let groups: Vec<Group> = decode_list::<GroupsEnvelope, _, _, _>(
            &json!({
                "groups": [{
                    "_id": "g1",
                    "name": "Dev Team",
                    "organization": {"_id": "o1", "organization": "Acme Corp"},
                    "users": [{"_id": "u1", "username": "devuser"}]
                }, {
                    "_id": "g2",
                    "name": "QA Team",
                    "organizationId": "o1",
                    "userIds": ["u2"]
                }]
            })
            .to_string(),
            |e| e.groups,
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].organization.as_ref().unwrap().name, "Acme Corp");
        assert_eq!(groups[0].members[0].username, "devuser");
        assert_eq!(groups[1].organization_id(), Some("o1"));
        assert_eq!(groups[1].member_ids(), vec!["u2"]);
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let orgs: Vec<Organization> = decode_list::<OrganizationsEnvelope, _, _, _>(
            r#"{"orgs": null}"#,
            |e| e.orgs,
        )
        .unwrap();
        assert!(orgs.is_empty());
    }

    #[test]
    fn organization_detail_backfills_admins_and_count() {
        let detail: OrganizationDetail = decode::<OrganizationDetailEnvelope, _>(
            &json!({
                "orgs": {"_id": "o1", "organization": "Acme Corp"},
                "userCount": 12,
                "admins": [{"_id": "u9", "username": "acme-admin"}]
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(detail.user_count, 12);
        assert_eq!(detail.primary_admin(), Some("acme-admin"));
        assert_eq!(detail.organization.member_count, Some(12));
        assert_eq!(detail.organization.admins.len(), 1);
    }
}
