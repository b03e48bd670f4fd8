pub mod active_sessions;
pub mod groups;
pub mod history;
pub mod home;
pub mod login;
pub mod mfa_verify;
pub mod organizations;
pub mod users;
