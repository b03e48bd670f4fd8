//! Client-side search and filtering for list views.
//!
//! Recomputed on every keystroke; there is no debounce and no caching, so
//! everything here is a plain function of `(items, query)`.

use std::borrow::Cow;

use crate::models::{ActiveSession, Group, HistoryRecord, Organization, User};

/// Text fields a list view searches over.
pub trait Searchable {
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// Equality key for the status filter (`"active"`, `"failed"`, ...).
    fn status_key(&self) -> Option<&str> {
        None
    }

    /// Organizations the entity belongs to, for the organization filter.
    fn organization_keys(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// Case-insensitive substring match. An empty term matches everything.
pub fn matches_term<T: Searchable + ?Sized>(item: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Search term plus optional equality filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub status: Option<String>,
    pub organization: Option<String>,
}

impl ListQuery {
    pub fn search(term: impl Into<String>) -> Self {
        ListQuery {
            search: term.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_organization(mut self, org_id: impl Into<String>) -> Self {
        self.organization = Some(org_id.into());
        self
    }

    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        if !matches_term(item, &self.search) {
            return false;
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
            if item.status_key() != Some(status) {
                return false;
            }
        }
        if let Some(org) = self.organization.as_deref().filter(|o| !o.is_empty()) {
            if !item.organization_keys().contains(&org) {
                return false;
            }
        }
        true
    }
}

/// The `filteredItems` view: borrowed, order-preserving subset of `items`.
pub fn filter_items<'a, T: Searchable>(items: &'a [T], query: &ListQuery) -> Vec<&'a T> {
    items.iter().filter(|item| query.matches(*item)).collect()
}

fn active_key(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}

impl Searchable for Organization {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.name.as_str())]
    }

    fn status_key(&self) -> Option<&str> {
        Some(active_key(self.active))
    }

    fn organization_keys(&self) -> Vec<&str> {
        vec![self.id.as_str()]
    }
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![
            Cow::Borrowed(self.username.as_str()),
            Cow::Owned(self.full_name()),
        ];
        fields.extend(self.organization_names.iter().map(|n| Cow::Borrowed(n.as_str())));
        fields
    }

    fn status_key(&self) -> Option<&str> {
        Some(active_key(self.active))
    }

    fn organization_keys(&self) -> Vec<&str> {
        self.organization_ids.iter().map(String::as_str).collect()
    }
}

impl Searchable for Group {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::Borrowed(self.name.as_str())];
        fields.extend(self.members.iter().map(|m| Cow::Borrowed(m.username.as_str())));
        fields
    }

    fn organization_keys(&self) -> Vec<&str> {
        self.organization_id().into_iter().collect()
    }
}

impl Searchable for ActiveSession {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.username.as_str()),
            Cow::Borrowed(self.connection_name.as_str()),
            Cow::Borrowed(self.remote_host.as_str()),
        ]
    }
}

impl Searchable for HistoryRecord {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.username.as_str()),
            Cow::Borrowed(self.connection_name.as_str()),
            Cow::Borrowed(self.remote_host.as_str()),
            Cow::Borrowed(self.protocol.as_str()),
        ]
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrganizationRef, UserSummary};

    fn user(id: &str, username: &str, org: &str) -> User {
        User {
            id: id.into(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: format!("{}@example.com", username),
            phone: "555".into(),
            organization_ids: vec![org.into()],
            organization_names: vec![],
            mfa_enabled: false,
            active: true,
            role: None,
            last_active: None,
        }
    }

    fn users() -> Vec<User> {
        vec![
            user("1", "devuser", "o1"),
            user("2", "admin", "o1"),
            user("3", "guacadmin", "o2"),
        ]
    }

    #[test]
    fn search_dev_returns_only_devuser() {
        let items = users();
        let filtered = filter_items(&items, &ListQuery::search("dev"));
        let names: Vec<&str> = filtered.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["devuser"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let items = users();
        let filtered = filter_items(&items, &ListQuery::search("ADMIN"));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn filtered_is_subset_of_items_and_every_member_matches() {
        let items = users();
        for term in ["a", "dev", "min", "GUAC", "zzz", "d"] {
            let query = ListQuery::search(term);
            let filtered = filter_items(&items, &query);
            assert!(filtered.len() <= items.len());
            for item in filtered {
                assert!(items.iter().any(|i| std::ptr::eq(i, item)));
                assert!(item
                    .search_fields()
                    .iter()
                    .any(|f| f.to_lowercase().contains(&term.to_lowercase())));
            }
        }
    }

    #[test]
    fn search_matches_full_name_across_first_and_last() {
        let mut items = users();
        items[1].first_name = "John".into();
        items[1].last_name = "Doe".into();

        let filtered = filter_items(&items, &ListQuery::search("john doe"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].username, "admin");
        assert_eq!(filter_items(&items, &ListQuery::search("doe")).len(), 1);
        assert!(filter_items(&items, &ListQuery::search("jane doe")).is_empty());
    }

    #[test]
    fn empty_search_keeps_everything() {
        let items = users();
        assert_eq!(filter_items(&items, &ListQuery::default()).len(), 3);
        assert_eq!(filter_items(&items, &ListQuery::search("   ")).len(), 3);
    }

    #[test]
    fn status_and_organization_filters() {
        let mut items = users();
        items[1].active = false;

        let inactive = filter_items(&items, &ListQuery::default().with_status("inactive"));
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].username, "admin");

        let all = filter_items(&items, &ListQuery::default().with_status("all"));
        assert_eq!(all.len(), 3);

        let org2 = filter_items(&items, &ListQuery::search("").with_organization("o2"));
        assert_eq!(org2.len(), 1);
        assert_eq!(org2[0].username, "guacadmin");
    }

    #[test]
    fn groups_match_on_member_usernames() {
        let groups = vec![Group {
            id: "g1".into(),
            name: "QA Team".into(),
            organization: Some(OrganizationRef {
                id: "o1".into(),
                name: "Acme".into(),
            }),
            members: vec![UserSummary {
                id: "u1".into(),
                username: "devuser".into(),
            }],
        }];
        assert_eq!(filter_items(&groups, &ListQuery::search("dev")).len(), 1);
        assert_eq!(filter_items(&groups, &ListQuery::search("qa")).len(), 1);
        assert_eq!(filter_items(&groups, &ListQuery::search("ops")).len(), 0);
    }
}
