//! Transient success / error message shown above a page.

use gloo::timers::callback::Timeout;
use yew::prelude::*;

const NOTICE_MS: u32 = 4_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

pub struct UseNotice {
    pub current: Option<Notice>,
    pub success: Callback<String>,
    pub error: Callback<String>,
    pub dismiss: Callback<()>,
}

/// Holds at most one notice, cleared after a few seconds.
#[hook]
pub fn use_notice() -> UseNotice {
    let notice = use_state(|| None::<Notice>);

    // Auto-dismiss; a newer notice restarts the timer
    {
        let notice_handle = notice.clone();
        use_effect_with((*notice).clone(), move |current| {
            let timeout = current.as_ref().map(|_| {
                Timeout::new(NOTICE_MS, move || notice_handle.set(None))
            });
            move || drop(timeout)
        });
    }

    let show = |kind: NoticeKind| {
        let notice = notice.clone();
        Callback::from(move |text: String| notice.set(Some(Notice { kind, text })))
    };

    let dismiss = {
        let notice = notice.clone();
        Callback::from(move |_| notice.set(None))
    };

    UseNotice {
        current: (*notice).clone(),
        success: show(NoticeKind::Success),
        error: show(NoticeKind::Error),
        dismiss,
    }
}
