mod controls;
mod group_modal;
mod navbar;
mod organization_form;
mod organization_modal;
mod user_form;

pub use controls::{
    ConfirmModal, NoticeBanner, SearchBar, SelectFilter, StatCard, StatusBadge, TextField,
};
pub use group_modal::GroupModal;
pub use navbar::Navbar;
pub use organization_form::OrganizationForm;
pub use organization_modal::OrganizationModal;
pub use user_form::UserForm;
