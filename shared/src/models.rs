//! Canonical entity schema used by every console surface.
//!
//! These are transient, non-authoritative copies of backend records. Raw
//! backend JSON never reaches this module; see [`crate::wire`] for the
//! mapping layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque backend identifier (`_id` on the wire).
pub type EntityId = String;

/// Anything held in an [`crate::list_state::EntityList`] needs a stable id.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Entities with an activate/deactivate toggle.
pub trait Activatable {
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

/// Minimal user reference embedded in groups and organizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: EntityId,
    pub username: String,
}

/// Organization reference embedded in groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: EntityId,
    pub name: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub admins: Vec<UserSummary>,
    pub member_count: Option<u64>,
}

/// Richer payload returned by the organization detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDetail {
    pub organization: Organization,
    pub user_count: u64,
    pub admins: Vec<UserSummary>,
}

impl OrganizationDetail {
    /// Username of the first admin, as shown in the detail header.
    pub fn primary_admin(&self) -> Option<&str> {
        self.admins.first().map(|a| a.username.as_str())
    }

    pub fn assignments(&self) -> Vec<AdminAssignment> {
        self.admins
            .iter()
            .map(|user| AdminAssignment {
                user: user.clone(),
                organization_id: self.organization.id.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub organization_ids: Vec<EntityId>,
    /// Display names for `organization_ids`, when the backend populates them
    pub organization_names: Vec<String>,
    pub mfa_enabled: bool,
    pub active: bool,
    pub role: Option<String>,
    pub last_active: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: EntityId,
    pub name: String,
    pub organization: Option<OrganizationRef>,
    pub members: Vec<UserSummary>,
}

impl Group {
    pub fn organization_id(&self) -> Option<&str> {
        self.organization.as_ref().map(|o| o.id.as_str())
    }

    pub fn member_ids(&self) -> Vec<EntityId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }
}

/// A currently open remote connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: EntityId,
    pub username: String,
    pub active_since: String,
    pub remote_host: String,
    pub connection_name: String,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub last_activity: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Completed,
    Failed,
    #[serde(other)]
    Other,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Completed => "completed",
            HistoryStatus::Failed => "failed",
            HistoryStatus::Other => "other",
        }
    }
}

/// Audit entry for a terminated connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: EntityId,
    pub username: String,
    /// `YYYY-MM-DD HH:MM:SS` or RFC 3339
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration: Option<String>,
    pub connection_name: String,
    pub remote_host: String,
    pub status: HistoryStatus,
    pub protocol: String,
    pub logs_link: Option<String>,
}

/// Privileged relation between a user and one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAssignment {
    pub user: UserSummary,
    pub organization_id: EntityId,
}

macro_rules! keyed_by_id {
    ($($ty:ty),* $(,)?) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

keyed_by_id!(
    Organization,
    User,
    Group,
    ActiveSession,
    HistoryRecord,
    UserSummary
);

impl Activatable for Organization {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Activatable for User {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: "u1".into(),
            username: "jdoe".into(),
            first_name: first.into(),
            last_name: last.into(),
            email: "jdoe@example.com".into(),
            phone: "555".into(),
            organization_ids: vec![],
            organization_names: vec![],
            mfa_enabled: false,
            active: true,
            role: None,
            last_active: None,
        }
    }

    #[test]
    fn full_name_trims_missing_parts() {
        assert_eq!(user("John", "Doe").full_name(), "John Doe");
        assert_eq!(user("John", "").full_name(), "John");
        assert_eq!(user("", "").full_name(), "");
    }

    #[test]
    fn detail_assignments_carry_the_organization() {
        let detail = OrganizationDetail {
            organization: Organization {
                id: "o1".into(),
                name: "Acme".into(),
                active: true,
                created_at: None,
                admins: vec![],
                member_count: None,
            },
            user_count: 3,
            admins: vec![
                UserSummary {
                    id: "a1".into(),
                    username: "root".into(),
                },
                UserSummary {
                    id: "a2".into(),
                    username: "ops".into(),
                },
            ],
        };
        let assignments = detail.assignments();
        assert_eq!(detail.primary_admin(), Some("root"));
        assert_eq!(assignments.len(), 2);
        assert!(assignments.iter().all(|a| a.organization_id == "o1"));
        assert_eq!(assignments[1].user.username, "ops");
    }

    #[test]
    fn history_status_unknown_values_map_to_other() {
        let status: HistoryStatus = serde_json::from_str(r#""timeout""#).unwrap();
        assert_eq!(status, HistoryStatus::Other);
        let status: HistoryStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(status, HistoryStatus::Failed);
    }

    #[test]
    fn group_membership_helpers() {
        let group = Group {
            id: "g1".into(),
            name: "Dev Team".into(),
            organization: Some(OrganizationRef {
                id: "o1".into(),
                name: "Acme Corp".into(),
            }),
            members: vec![UserSummary {
                id: "u1".into(),
                username: "devuser".into(),
            }],
        };
        assert_eq!(group.organization_id(), Some("o1"));
        assert!(group.has_member("u1"));
        assert!(!group.has_member("u2"));
        assert_eq!(group.member_ids(), vec!["u1".to_string()]);
    }
}
