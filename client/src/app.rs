use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen_futures::spawn_local;

use zonemap_shared::MapCatalog;

use crate::canvas::MapCanvas;
use crate::catalog;
use crate::session::{self, Session};

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

/// Newtype so the resize counter has a distinct type in Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct ResizeEpoch(pub RwSignal<u64>);

struct ResizeBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// Root application component. Provides the catalog and session via context,
/// kicks off the one-shot catalog fetch, and wires the window resize trigger.
#[component]
pub fn App() -> impl IntoView {
    let catalog_signal: RwSignal<Option<MapCatalog>> = RwSignal::new(None);
    let session = Session::new();
    let resize_epoch: RwSignal<u64> = RwSignal::new(0);

    provide_context(catalog_signal);
    provide_context(session);
    provide_context(ResizeEpoch(resize_epoch));

    // Fetch the catalog on mount, then activate the persisted (or first) map.
    Effect::new(move || {
        spawn_local(async move {
            match catalog::fetch_catalog().await {
                Ok(loaded) => {
                    let saved = session::saved_map_key();
                    let startup =
                        session::initial_key(&loaded, saved.as_deref()).map(str::to_string);
                    catalog_signal.set(Some(loaded));
                    if let Some(key) = startup {
                        catalog_signal.with_untracked(|loaded| {
                            if let Some(loaded) = loaded {
                                session.select_map(loaded, &key);
                            }
                        });
                    }
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Failed to load map catalog: {e}").into());
                }
            }
        });
    });

    // Window resize → full redraw. Replaces any previous listener so a
    // remount can't leave a stale handler bumping the epoch.
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "resize",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler = Closure::<dyn Fn()>::new(move || {
            resize_epoch.update(|epoch| *epoch += 1);
        });
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17;">
            <MapCanvas />
            <MapSelector />
        </div>
    }
}

/// Dropdown listing every catalog key in catalog order; its value always
/// mirrors the active map key. Empty (just the element) until the catalog
/// arrives, and stays empty if the fetch failed.
#[component]
fn MapSelector() -> impl IntoView {
    let catalog_signal: RwSignal<Option<MapCatalog>> = expect_context();
    let session: Session = expect_context();

    let on_change = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(select) = target.dyn_into::<web_sys::HtmlSelectElement>() else {
            return;
        };
        let value = select.value();
        catalog_signal.with_untracked(|loaded| {
            if let Some(loaded) = loaded {
                session.select_map(loaded, &value);
            }
        });
    };

    view! {
        <select
            on:change=on_change
            style="position: absolute; top: 16px; left: 16px; z-index: 10; min-width: 140px; background: #13161f; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; font-size: 0.8rem; padding: 6px 8px; outline: none; cursor: pointer;"
        >
            {move || {
                catalog_signal
                    .get()
                    .map(|loaded| {
                        loaded
                            .keys()
                            .map(|key| {
                                let value = key.to_string();
                                let label = value.clone();
                                let current = value.clone();
                                view! {
                                    <option
                                        value=value
                                        selected=move || {
                                            session.selected_key.get().as_deref()
                                                == Some(current.as_str())
                                        }
                                    >
                                        {label}
                                    </option>
                                }
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            }}
        </select>
    }
}
