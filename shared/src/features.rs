//! Console feature flags.

use serde::{Deserialize, Serialize};

use crate::api::AuthMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleFeatures {
    /// Organization form also creates the organization's first admin
    pub admin_assignment: bool,
    /// User form offers "enable MFA", which calls generate-mfa after create
    pub mfa_on_create: bool,
    pub auth_mode: AuthMode,
}

impl Default for ConsoleFeatures {
    fn default() -> Self {
        ConsoleFeatures {
            admin_assignment: true,
            mfa_on_create: true,
            auth_mode: AuthMode::Cookie,
        }
    }
}

impl ConsoleFeatures {
    pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = auth_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let features: ConsoleFeatures =
            serde_json::from_str(r#"{"admin_assignment": false}"#).unwrap();
        assert!(!features.admin_assignment);
        assert!(features.mfa_on_create);
        assert_eq!(features.auth_mode, AuthMode::Cookie);

        let bearer: ConsoleFeatures = serde_json::from_str(r#"{"auth_mode":"bearer"}"#).unwrap();
        assert_eq!(bearer.auth_mode, AuthMode::Bearer);
    }
}
