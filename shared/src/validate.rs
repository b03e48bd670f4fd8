//! Form drafts and their validation rules.
//!
//! `validate` is pure: same draft, same [`FieldErrors`]. Forms refuse to
//! submit while any error is present, so a draft with empty required fields
//! never produces a request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{
    CreateAdminRequest, CreateOrganizationRequest, GroupRequest, LoginRequest, UserRequest,
};
use crate::models::{EntityId, User};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const OTP_LEN: usize = 6;

/// Field name -> message. Ordered so rendering and tests are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Drop one field's error, e.g. when the user edits that field.
    pub fn clear(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise the errors themselves.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

pub trait Validate {
    fn validate(&self) -> FieldErrors;
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn check_username(errors: &mut FieldErrors, field: &str, username: &str) {
    if username.trim().is_empty() {
        errors.insert(field, "Username is required");
    } else if username.trim().chars().count() < MIN_USERNAME_LEN {
        errors.insert(field, "Min 3 characters");
    }
}

fn check_password(errors: &mut FieldErrors, field: &str, password: &str, required: bool) {
    if password.is_empty() {
        if required {
            errors.insert(field, "Password is required");
        }
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(field, "Min 6 characters");
    }
}

// =============================================================================
// Login / MFA
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginDraft {
    pub username: String,
    pub password: String,
}

impl Validate for LoginDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.insert("username", "Username is required");
        }
        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        }
        errors
    }
}

impl LoginDraft {
    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Strip everything but ASCII digits and cap at six characters.
pub fn sanitize_otp(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(OTP_LEN)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpDraft {
    pub code: String,
}

impl Validate for OtpDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.code.len() != OTP_LEN || !self.code.chars().all(|c| c.is_ascii_digit()) {
            errors.insert("code", "Please enter a 6-digit code.");
        }
        errors
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub mode: FormMode,
    pub organization_ids: Vec<EntityId>,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub mfa_enabled: bool,
}

impl Default for UserDraft {
    fn default() -> Self {
        Self::create()
    }
}

impl UserDraft {
    pub fn create() -> Self {
        UserDraft {
            mode: FormMode::Create,
            organization_ids: Vec::new(),
            username: String::new(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            mfa_enabled: false,
        }
    }

    /// Pre-filled draft for editing; the password starts blank.
    pub fn edit(user: &User) -> Self {
        UserDraft {
            mode: FormMode::Update,
            organization_ids: user.organization_ids.clone(),
            username: user.username.clone(),
            password: String::new(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            mfa_enabled: user.mfa_enabled,
        }
    }

    pub fn toggle_organization(&mut self, org_id: &str) {
        if let Some(pos) = self.organization_ids.iter().position(|id| id == org_id) {
            self.organization_ids.remove(pos);
        } else {
            self.organization_ids.push(org_id.to_string());
        }
    }

    /// Request body. On create the MFA flag is always sent off; enabling it
    /// is a separate call once the user exists.
    pub fn to_request(&self) -> UserRequest {
        UserRequest {
            organization_ids: self.organization_ids.clone(),
            username: self.username.trim().to_string(),
            password: if self.password.is_empty() {
                None
            } else {
                Some(self.password.clone())
            },
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            mfa_enabled: match self.mode {
                FormMode::Create => false,
                FormMode::Update => self.mfa_enabled,
            },
        }
    }
}

impl Validate for UserDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_username(&mut errors, "username", &self.username);
        check_password(
            &mut errors,
            "password",
            &self.password,
            self.mode == FormMode::Create,
        );

        if self.email.trim().is_empty() {
            errors.insert("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.insert("email", "Invalid email");
        } else if self.email != self.email.to_lowercase() {
            errors.insert("email", "Email must be lowercase");
        }

        if self.phone.trim().is_empty() {
            errors.insert("phone", "Phone number is required");
        }

        if self.organization_ids.is_empty() {
            errors.insert(
                "organization_ids",
                "At least one organization must be selected",
            );
        }

        errors
    }
}

// =============================================================================
// Organizations
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminDraft {
    pub username: String,
    pub password: String,
}

impl Validate for AdminDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, "admin_username", &self.username);
        check_password(&mut errors, "admin_password", &self.password, true);
        errors
    }
}

impl AdminDraft {
    pub fn to_request(&self, organization_id: &str) -> CreateAdminRequest {
        CreateAdminRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            organization_id: organization_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationDraft {
    pub name: String,
    /// Present when the admin-assignment feature is enabled
    pub admin: Option<AdminDraft>,
}

impl Validate for OrganizationDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name", "Organization name is required");
        }
        if let Some(admin) = &self.admin {
            for (field, message) in admin.validate().iter() {
                errors.insert(field, message);
            }
        }
        errors
    }
}

impl OrganizationDraft {
    pub fn to_request(&self) -> CreateOrganizationRequest {
        CreateOrganizationRequest {
            organization: self.name.trim().to_string(),
        }
    }
}

// =============================================================================
// Groups
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDraft {
    pub name: String,
    pub organization_id: EntityId,
}

impl Validate for GroupDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.organization_id.is_empty() || self.name.trim().is_empty() {
            errors.insert("name", "Please select organization and enter group name");
        }
        errors
    }
}

impl GroupDraft {
    pub fn to_request(&self) -> GroupRequest {
        GroupRequest {
            name: self.name.trim().to_string(),
            organization_id: self.organization_id.clone(),
            user_ids: Vec::new(),
        }
    }
}

/// Validation for renaming an existing group.
pub fn validate_group_rename(name: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if name.trim().is_empty() {
        errors.insert("name", "Group name cannot be empty");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_user() -> UserDraft {
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

    #[test]
    fn valid_user_has_no_errors() {
        assert!(valid_user().validate().is_empty());
    }

    #[test]
    fn empty_user_draft_reports_every_required_field() {
        let errors = UserDraft::create().validate();
        assert_eq!(errors.get("username"), Some("Username is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("phone"), Some("Phone number is required"));
        assert_eq!(
            errors.get("organization_ids"),
            Some("At least one organization must be selected")
        );
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn validation_is_deterministic() {
        let draft = UserDraft {
            username: "ab".into(),
            email: "Bad@Example.com".into(),
            ..UserDraft::create()
        };
        assert_eq!(draft.validate(), draft.validate());
    }

    #[test]
    fn length_rules() {
        let mut draft = valid_user();
        draft.username = "ab".into();
        draft.password = "12345".into();
        let errors = draft.validate();
        assert_eq!(errors.get("username"), Some("Min 3 characters"));
        assert_eq!(errors.get("password"), Some("Min 6 characters"));
    }

    #[test]
    fn padded_username_is_measured_after_trimming() {
        let mut draft = valid_user();
        draft.username = "ab ".into();
        assert_eq!(draft.validate().get("username"), Some("Min 3 characters"));

        let admin = AdminDraft {
            username: "  x ".into(),
            password: "secret1".into(),
        };
        assert_eq!(admin.validate().get("admin_username"), Some("Min 3 characters"));

        draft.username = " abc ".into();
        assert!(draft.validate().is_empty());
        assert_eq!(draft.to_request().username, "abc");
    }

    #[test]
    fn email_rules() {
        let mut draft = valid_user();
        draft.email = "not-an-email".into();
        assert_eq!(draft.validate().get("email"), Some("Invalid email"));

        draft.email = "Dev@Acme.io".into();
        assert_eq!(draft.validate().get("email"), Some("Email must be lowercase"));

        draft.email = "dev @acme.io".into();
        assert_eq!(draft.validate().get("email"), Some("Invalid email"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.c"));
        assert!(!is_valid_email("a@.c"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a@b@c.d"));
    }

    #[test]
    fn password_optional_on_update() {
        let mut draft = valid_user();
        draft.mode = FormMode::Update;
        draft.password.clear();
        assert!(draft.validate().is_empty());
        assert_eq!(draft.to_request().password, None);

        draft.password = "123".into();
        assert_eq!(draft.validate().get("password"), Some("Min 6 characters"));
    }

    #[test]
    fn create_request_never_enables_mfa() {
        let mut draft = valid_user();
        draft.mfa_enabled = true;
        assert!(!draft.to_request().mfa_enabled);
        draft.mode = FormMode::Update;
        assert!(draft.to_request().mfa_enabled);
    }

    #[test]
    fn toggle_organization_adds_and_removes() {
        let mut draft = UserDraft::create();
        draft.toggle_organization("o1");
        draft.toggle_organization("o2");
        draft.toggle_organization("o1");
        assert_eq!(draft.organization_ids, vec!["o2".to_string()]);
    }

    #[test]
    fn clearing_a_field_error_leaves_others() {
        let mut errors = UserDraft::create().validate();
        errors.clear("username");
        assert!(errors.get("username").is_none());
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn organization_with_admin_assignment() {
        let draft = OrganizationDraft {
            name: "Acme Corp".into(),
            admin: Some(AdminDraft {
                username: "ad".into(),
                password: "".into(),
            }),
        };
        let errors = draft.validate();
        assert_eq!(errors.get("admin_username"), Some("Min 3 characters"));
        assert_eq!(errors.get("admin_password"), Some("Password is required"));
        assert!(errors.get("name").is_none());

        let plain = OrganizationDraft {
            name: "  ".into(),
            admin: None,
        };
        assert_eq!(
            plain.validate().get("name"),
            Some("Organization name is required")
        );
    }

    #[test]
    fn group_rules() {
        let draft = GroupDraft {
            name: "Dev Team".into(),
            organization_id: String::new(),
        };
        assert_eq!(
            draft.validate().get("name"),
            Some("Please select organization and enter group name")
        );
        assert_eq!(
            validate_group_rename(" ").get("name"),
            Some("Group name cannot be empty")
        );
        assert!(validate_group_rename("Ops").is_empty());
    }

    #[test]
    fn otp_rules() {
        assert!(OtpDraft { code: "123456".into() }.validate().is_empty());
        assert!(!OtpDraft { code: "12345".into() }.validate().is_empty());
        assert!(!OtpDraft { code: "12a456".into() }.validate().is_empty());
        assert_eq!(sanitize_otp("12-34 56789"), "123456");
        assert_eq!(sanitize_otp("abc"), "");
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginDraft::default().validate();
        assert_eq!(errors.len(), 2);
        let ok = LoginDraft {
            username: " admin ".into(),
            password: "pw".into(),
        };
        assert!(ok.validate().is_empty());
        assert_eq!(ok.to_request().username, "admin");
    }
}
