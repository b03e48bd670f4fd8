//! Hook owning one entity collection: fetch on mount, reconcile after writes.

use std::future::Future;
use std::rc::Rc;

use shared::{ApiError, EntityId, EntityList, Keyed};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::session_store::expire_session;

/// Mutations applied to the list, in dispatch order.
pub enum ListAction<T> {
    Begin,
    Loaded(Vec<T>),
    Failed(ApiError),
    Upsert(T),
    Remove(EntityId),
    RemoveMany(Vec<EntityId>),
}

#[derive(PartialEq)]
pub struct ListState<T>(pub EntityList<T>);

impl<T> Default for ListState<T> {
    fn default() -> Self {
        ListState(EntityList::default())
    }
}

impl<T: Keyed + Clone + PartialEq + 'static> Reducible for ListState<T> {
    type Action = ListAction<T>;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut list = self.0.clone();
        match action {
            ListAction::Begin => list.begin_fetch(),
            ListAction::Loaded(items) => list.fetch_succeeded(items),
            ListAction::Failed(e) => list.fetch_failed(&e),
            ListAction::Upsert(item) => list.upsert(item),
            ListAction::Remove(id) => {
                list.remove(&id);
            }
            ListAction::RemoveMany(ids) => list.remove_many(&ids),
        }
        Rc::new(ListState(list))
    }
}

/// Return value from the use_entity_list hook.
pub struct UseEntityList<T: Keyed + Clone + PartialEq + 'static> {
    /// Current list snapshot
    pub list: EntityList<T>,
    /// Apply a local mutation
    pub dispatch: UseReducerDispatcher<ListState<T>>,
    /// Re-fetch from the server
    pub refresh: Callback<()>,
}

/// Log a failed call; a 401 also tears down the session.
pub fn report_error(context: &str, error: &ApiError) {
    log::error!("{}: {}", context, error);
    if error.is_unauthorized() {
        expire_session();
    }
}

/// Fetch a collection on mount and keep it in an [`EntityList`].
///
/// A failed fetch keeps the previous items and sets the list error.
#[hook]
pub fn use_entity_list<T, F, Fut>(label: &'static str, fetch: F) -> UseEntityList<T>
where
    T: Keyed + Clone + PartialEq + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<Vec<T>, ApiError>> + 'static,
{
    let state = use_reducer(ListState::<T>::default);

    let refresh = {
        let dispatch = state.dispatcher();
        Callback::from(move |_: ()| {
            let dispatch = dispatch.clone();
            let request = fetch();
            dispatch.dispatch(ListAction::Begin);
            spawn_local(async move {
                match request.await {
                    Ok(items) => dispatch.dispatch(ListAction::Loaded(items)),
                    Err(e) => {
                        report_error(&format!("Failed to fetch {}", label), &e);
                        dispatch.dispatch(ListAction::Failed(e));
                    }
                }
            });
        })
    };

    // Initial fetch
    {
        let refresh = refresh.clone();
        use_effect_with((), move |_| {
            refresh.emit(());
            || ()
        });
    }

    UseEntityList {
        list: state.0.clone(),
        dispatch: state.dispatcher(),
        refresh,
    }
}
