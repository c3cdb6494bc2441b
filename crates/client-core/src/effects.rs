use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, UNKNOWN_ERROR_MESSAGE},
    state::PresentationState,
};

/// Presentation side effect derived from a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewEffect {
    SetLoaderVisible(bool),
    SetContentVisible(bool),
    HideSkeleton,
    ShowMessage(String),
}

/// Loader visibility for `state`; `None` leaves it unchanged.
pub fn loading_indicator_visible<T>(
    state: &PresentationState<T>,
    show_on_success: bool,
) -> Option<bool> {
    match state {
        PresentationState::Idle => None,
        PresentationState::Loading => Some(true),
        PresentationState::Error(_) => Some(false),
        PresentationState::Success(_) => Some(!show_on_success),
    }
}

/// Content is shown exactly when the loader is hidden.
pub fn content_visible<T>(state: &PresentationState<T>, show_on_success: bool) -> Option<bool> {
    loading_indicator_visible(state, show_on_success).map(|loader| !loader)
}

/// Message effect for `error`, or nothing for silent errors.
pub fn surface_error(error: &AppError) -> Option<ViewEffect> {
    error
        .user_message()
        .map(|message| ViewEffect::ShowMessage(message.to_owned()))
}

/// Message effect for a consumer that failed while handling a state.
pub fn consumer_failure(message: &str) -> ViewEffect {
    if message.is_empty() {
        ViewEffect::ShowMessage(UNKNOWN_ERROR_MESSAGE.to_owned())
    } else {
        ViewEffect::ShowMessage(message.to_owned())
    }
}

/// Every effect a screen applies when it observes `state`, in order.
pub fn effects_for<T>(state: &PresentationState<T>, show_on_success: bool) -> Vec<ViewEffect> {
    let mut effects = Vec::new();
    if let Some(loader) = loading_indicator_visible(state, show_on_success) {
        effects.push(ViewEffect::SetLoaderVisible(loader));
        effects.push(ViewEffect::SetContentVisible(!loader));
    }

    match state {
        PresentationState::Idle | PresentationState::Loading => {}
        PresentationState::Error(error) => effects.extend(surface_error(error)),
        PresentationState::Success(_) => effects.push(ViewEffect::HideSkeleton),
    }
    effects
}
