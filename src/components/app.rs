use super::{canvas_view::CanvasView, settings_modal::SettingsModal};
use crate::model::CanvasState;
use crate::settings::{LocalStore, Settings};
use yew::prelude::*;

/// Writes only on user action, so a blob that failed to load is kept.
fn persist(next: &Settings) {
    match next.save_to(&LocalStore) {
        Ok(()) => log::debug!("settings saved"),
        Err(e) => log::warn!("settings not saved: {e}"),
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let canvas_state = use_reducer(CanvasState::demo);
    let settings = use_state(|| Settings::load_or_default(&LocalStore));
    let show_settings = use_state(|| false);

    let on_change = {
        let settings = settings.clone();
        Callback::from(move |next: Settings| {
            if let Err(e) = next.validate() {
                log::warn!("ignoring settings change: {e}");
                return;
            }
            persist(&next);
            settings.set(next);
        })
    };
    let on_reset = {
        let settings = settings.clone();
        Callback::from(move |_| {
            let defaults = Settings::default();
            persist(&defaults);
            settings.set(defaults);
        })
    };
    let open_settings = {
        let show = show_settings.clone();
        Callback::from(move |_| show.set(true))
    };
    let close_settings = {
        let show = show_settings.clone();
        Callback::from(move |_| show.set(false))
    };

    html! {
        <>
            <CanvasView canvas_state={canvas_state.clone()} settings={(*settings).clone()} />
            <button onclick={open_settings} style="position:fixed; top:12px; right:12px; padding:6px 10px; z-index:10;">{"Settings"}</button>
            <SettingsModal
                show={*show_settings}
                settings={(*settings).clone()}
                {on_change}
                on_close={close_settings}
                {on_reset}
            />
        </>
    }
}
