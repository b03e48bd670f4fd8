//! Local list state for a single entity collection.
//!
//! Each view owns one [`EntityList`]. After a successful write the view
//! either re-fetches (`fetch_succeeded`) or applies the server echo
//! (`upsert`); both keep ids unique, so a created entity never shows up
//! twice.

use std::collections::{BTreeSet, HashSet};

use crate::api::ApiError;
use crate::models::{EntityId, Keyed};

#[derive(Debug, Clone, PartialEq)]
pub struct EntityList<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        EntityList {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T: Keyed + Clone> EntityList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == id)
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Replace the collection with a fresh server list. Duplicate ids keep
    /// their first occurrence.
    pub fn fetch_succeeded(&mut self, items: Vec<T>) {
        let mut seen = HashSet::new();
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.key().to_string()))
            .collect();
        self.loading = false;
        self.error = None;
    }

    /// A failed fetch keeps whatever was already loaded.
    pub fn fetch_failed(&mut self, error: &ApiError) {
        self.loading = false;
        self.error = Some(error.user_message());
    }

    /// Replace the entity with the same id in place, or append it.
    pub fn upsert(&mut self, item: T) {
        match self.items.iter_mut().find(|existing| existing.key() == item.key()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.items.iter().position(|item| item.key() == id)?;
        Some(self.items.remove(pos))
    }

    pub fn remove_many(&mut self, ids: &[EntityId]) {
        self.items.retain(|item| !ids.iter().any(|id| id == item.key()));
    }

    /// Apply `f` to the entity with `id`. Returns false if it is gone.
    pub fn patch(&mut self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.key() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }
}

/// Row selection for bulk actions (kill sessions, history export).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// True when every visible row is selected (and there is at least one).
    pub fn all_selected<T: Keyed>(&self, visible: &[&T]) -> bool {
        !visible.is_empty() && visible.iter().all(|item| self.contains(item.key()))
    }

    /// Header checkbox: deselect everything when all visible rows are
    /// selected, otherwise select exactly the visible rows.
    pub fn toggle_all<T: Keyed>(&mut self, visible: &[&T]) {
        if self.all_selected(visible) {
            self.ids.clear();
        } else {
            self.ids = visible.iter().map(|item| item.key().to_string()).collect();
        }
    }

    /// Drop ids that no longer exist after a re-fetch.
    pub fn retain_existing<T: Keyed>(&mut self, items: &[T]) {
        let live: HashSet<&str> = items.iter().map(|item| item.key()).collect();
        self.ids.retain(|id| live.contains(id.as_str()));
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserSummary;

    fn summary(id: &str, name: &str) -> UserSummary {
        UserSummary {
            id: id.into(),
            username: name.into(),
        }
    }

    #[test]
    fn fetch_replaces_and_dedupes() {
        let mut list = EntityList::new();
        list.begin_fetch();
        assert!(list.is_loading());
        list.fetch_succeeded(vec![summary("1", "a"), summary("2", "b"), summary("1", "dup")]);
        assert!(!list.is_loading());
        assert_eq!(list.len(), 2);
        assert_eq!(list.get("1").map(|u| u.username.as_str()), Some("a"));
    }

    #[test]
    fn failed_fetch_keeps_existing_items() {
        let mut list = EntityList::new();
        list.fetch_succeeded(vec![summary("1", "a")]);
        list.begin_fetch();
        list.fetch_failed(&ApiError::Network("offline".into()));
        assert_eq!(list.len(), 1);
        assert_eq!(list.error(), Some(crate::api::NETWORK_ERROR_MESSAGE));
        list.begin_fetch();
        assert_eq!(list.error(), None);
    }

    #[test]
    fn create_then_refetch_shows_entity_once() {
        let mut list = EntityList::new();
        list.fetch_succeeded(vec![summary("1", "a")]);
        list.upsert(summary("2", "new"));
        list.fetch_succeeded(vec![summary("1", "a"), summary("2", "new")]);
        assert_eq!(list.items().iter().filter(|u| u.id == "2").count(), 1);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut list = EntityList::new();
        list.fetch_succeeded(vec![summary("1", "a"), summary("2", "b")]);
        list.upsert(summary("1", "renamed"));
        assert_eq!(list.items()[0].username, "renamed");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn remove_and_patch() {
        let mut list = EntityList::new();
        list.fetch_succeeded(vec![summary("1", "a"), summary("2", "b"), summary("3", "c")]);
        assert!(list.patch("2", |u| u.username = "bee".into()));
        assert!(!list.patch("9", |u| u.username = "x".into()));
        assert_eq!(list.get("2").unwrap().username, "bee");

        assert_eq!(list.remove("1").map(|u| u.id), Some("1".to_string()));
        assert!(list.remove("1").is_none());
        list.remove_many(&["2".to_string(), "3".to_string()]);
        assert!(list.is_empty());
    }

    #[test]
    fn selection_toggle_twice_is_identity() {
        let mut selection = Selection::new();
        selection.toggle("1");
        selection.toggle("3");
        let before = selection.clone();
        selection.toggle("2");
        selection.toggle("2");
        assert_eq!(selection, before);
        assert_eq!(selection.ids(), vec!["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn toggle_all_selects_visible_then_clears() {
        let items = vec![summary("1", "a"), summary("2", "b")];
        let visible: Vec<&UserSummary> = items.iter().collect();
        let mut selection = Selection::new();
        selection.toggle("1");

        selection.toggle_all(&visible);
        assert_eq!(selection.len(), 2);
        assert!(selection.all_selected(&visible));

        selection.toggle_all(&visible);
        assert!(selection.is_empty());

        let none: Vec<&UserSummary> = Vec::new();
        selection.toggle_all(&none);
        assert!(selection.is_empty());
    }

    #[test]
    fn retain_existing_drops_stale_ids() {
        let mut selection = Selection::new();
        selection.toggle("1");
        selection.toggle("9");
        selection.retain_existing(&[summary("1", "a")]);
        assert_eq!(selection.ids(), vec!["1".to_string()]);
    }
}
