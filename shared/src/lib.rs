//! Types and logic shared by the Securita console (WASM) and the admin CLI.
//!
//! Everything here is pure Rust with WASM-compatible dependencies only.

// Canonical entity schema
pub mod models;
pub use models::{
    ActiveSession, AdminAssignment, EntityId, Group, HistoryRecord, HistoryStatus, Keyed,
    Organization, OrganizationDetail, OrganizationRef, User, UserSummary,
};

// Lenient backend JSON shapes, mapped into `models`
pub mod wire;

// API client types and trait
pub mod api;
pub use api::{ApiClientConfig, ApiError, AdminApi, AuthMode, LoginOutcome, QrOutcome};

pub mod auth;
pub mod features;
pub mod filter;
pub mod history;
pub mod list_state;
pub mod validate;
pub mod workflow;

pub use auth::{AuthFlow, AuthStep, Session, SessionStore, SessionStoreError};
pub use features::ConsoleFeatures;
pub use list_state::{EntityList, Selection};
pub use validate::{FieldErrors, Validate};
