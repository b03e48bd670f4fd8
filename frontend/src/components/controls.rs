//! Small building blocks shared by the list pages and forms.

use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::hooks::{Notice, NoticeKind};

#[derive(Properties, PartialEq)]
pub struct SearchBarProps {
    pub value: AttrValue,
    pub on_search: Callback<String>,
    #[prop_or(AttrValue::from("Search..."))]
    pub placeholder: AttrValue,
}

/// Filters on every keystroke.
#[function_component(SearchBar)]
pub fn search_bar(props: &SearchBarProps) -> Html {
    let on_input = {
        let on_search = props.on_search.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_search.emit(input.value());
        })
    };

    html! {
        <input
            class="search-bar"
            type="search"
            placeholder={props.placeholder.clone()}
            value={props.value.clone()}
            oninput={on_input}
        />
    }
}

#[derive(Properties, PartialEq)]
pub struct SelectFilterProps {
    pub value: AttrValue,
    /// `(value, label)` pairs
    pub options: Vec<(String, String)>,
    pub on_change: Callback<String>,
}

#[function_component(SelectFilter)]
pub fn select_filter(props: &SelectFilterProps) -> Html {
    let on_change = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            on_change.emit(select.value());
        })
    };

    html! {
        <select class="select-filter" onchange={on_change}>
            {
                props.options.iter().map(|(value, label)| html! {
                    <option value={value.clone()} selected={props.value.as_str() == value.as_str()}>
                        { label }
                    </option>
                }).collect::<Html>()
            }
        </select>
    }
}

#[derive(Properties, PartialEq)]
pub struct TextFieldProps {
    pub label: AttrValue,
    pub value: AttrValue,
    pub on_input: Callback<String>,
    #[prop_or(AttrValue::from("text"))]
    pub input_type: AttrValue,
    #[prop_or_default]
    pub placeholder: AttrValue,
    #[prop_or_default]
    pub error: Option<AttrValue>,
    #[prop_or_default]
    pub disabled: bool,
}

/// Labelled input with its field error underneath.
#[function_component(TextField)]
pub fn text_field(props: &TextFieldProps) -> Html {
    let on_input = {
        let on_input = props.on_input.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_input.emit(input.value());
        })
    };

    html! {
        <label class={classes!("form-field", props.error.is_some().then_some("has-error"))}>
            <span class="form-label">{ &props.label }</span>
            <input
                type={props.input_type.clone()}
                placeholder={props.placeholder.clone()}
                value={props.value.clone()}
                disabled={props.disabled}
                oninput={on_input}
            />
            {
                if let Some(ref error) = props.error {
                    html! { <span class="field-error">{ error }</span> }
                } else {
                    html! {}
                }
            }
        </label>
    }
}

#[derive(Properties, PartialEq)]
pub struct NoticeBannerProps {
    pub notice: Option<Notice>,
    pub on_dismiss: Callback<()>,
}

#[function_component(NoticeBanner)]
pub fn notice_banner(props: &NoticeBannerProps) -> Html {
    let Some(notice) = &props.notice else {
        return html! {};
    };
    let class = match notice.kind {
        NoticeKind::Success => "notice success",
        NoticeKind::Error => "notice error",
    };
    let on_dismiss = {
        let on_dismiss = props.on_dismiss.clone();
        Callback::from(move |_: MouseEvent| on_dismiss.emit(()))
    };

    html! {
        <div class={class} role="alert">
            <span>{ &notice.text }</span>
            <button class="notice-close" onclick={on_dismiss}>{ "×" }</button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ConfirmModalProps {
    pub message: AttrValue,
    pub on_confirm: Callback<()>,
    pub on_cancel: Callback<()>,
}

#[function_component(ConfirmModal)]
pub fn confirm_modal(props: &ConfirmModalProps) -> Html {
    let on_cancel = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| on_cancel.emit(()))
    };
    let on_confirm = {
        let on_confirm = props.on_confirm.clone();
        Callback::from(move |_: MouseEvent| on_confirm.emit(()))
    };

    html! {
        <div class="modal-overlay" onclick={on_cancel.clone()}>
            <div class="modal-content confirm-modal" onclick={Callback::from(|e: MouseEvent| e.stop_propagation())}>
                <p>{ &props.message }</p>
                <div class="modal-actions">
                    <button class="modal-cancel" onclick={on_cancel}>{ "Cancel" }</button>
                    <button class="modal-confirm" onclick={on_confirm}>{ "Confirm" }</button>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatCardProps {
    pub label: AttrValue,
    pub value: String,
    #[prop_or_default]
    pub class: Option<&'static str>,
}

#[function_component(StatCard)]
pub fn stat_card(props: &StatCardProps) -> Html {
    let class = classes!("stat-card", props.class);
    html! {
        <div class={class}>
            <div class="stat-value">{ &props.value }</div>
            <div class="stat-label">{ &props.label }</div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusBadgeProps {
    pub active: bool,
}

#[function_component(StatusBadge)]
pub fn status_badge(props: &StatusBadgeProps) -> Html {
    if props.active {
        html! { <span class="status-badge active">{ "Active" }</span> }
    } else {
        html! { <span class="status-badge inactive">{ "Inactive" }</span> }
    }
}
