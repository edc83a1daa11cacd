use std::cell::RefCell;
use std::collections::HashMap;

use leptos::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::HtmlImageElement;

use crate::session::Session;

/// Marker images keyed by icon identifier, cached for the page lifetime.
/// One load per identifier: the same icon reused across maps is never
/// fetched twice.
thread_local! {
    static ICON_CACHE: RefCell<HashMap<String, IconSlot>> = RefCell::new(HashMap::new());
}

#[derive(Clone)]
pub enum IconSlot {
    /// Fetch/decode in flight; its completion callback owns the follow-up.
    Loading,
    Ready(HtmlImageElement),
    /// The resource never resolved; this identifier draws nothing.
    Failed,
}

fn background_src(map_key: &str) -> String {
    format!("/zones/{map_key}.png")
}

fn icon_src(name: &str) -> String {
    format!("/icons/{name}.png")
}

/// Start loading the background image for a map switch. The previous image
/// is dropped immediately (the next redraw shows a cleared canvas until the
/// new one decodes). Publishes into the session only if no later switch has
/// bumped the load generation in the meantime.
pub fn load_background(session: Session, map_key: &str) {
    let generation = session.load_generation.get_untracked();
    let src = background_src(map_key);
    session.background.set(None);

    spawn_local(async move {
        let Ok(image) = HtmlImageElement::new() else {
            return;
        };
        image.set_src(&src);
        match JsFuture::from(image.decode()).await {
            Ok(_) => {
                if session.load_generation.get_untracked() == generation {
                    session.background.set(Some(image));
                }
            }
            Err(err) => {
                // The canvas stays cleared; nothing is shown to the user.
                web_sys::console::warn_1(
                    &format!("Failed to load background {src}: {err:?}").into(),
                );
            }
        }
    });
}

/// Current cache state for an icon identifier; `None` means it has never
/// been requested.
pub fn cached_icon(name: &str) -> Option<IconSlot> {
    ICON_CACHE.with(|cache| cache.borrow().get(name).cloned())
}

/// Fetch and decode an icon image once, then hand the result (or `None` on
/// failure) to `on_done`. Callers are expected to have checked the cache
/// first; a racing second request for the same identifier is dropped here.
pub fn request_icon(name: String, on_done: impl FnOnce(Option<HtmlImageElement>) + 'static) {
    let already_tracked = ICON_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.contains_key(&name) {
            true
        } else {
            cache.insert(name.clone(), IconSlot::Loading);
            false
        }
    });
    if already_tracked {
        return;
    }

    let src = icon_src(&name);
    spawn_local(async move {
        let Ok(image) = HtmlImageElement::new() else {
            ICON_CACHE.with(|cache| {
                cache.borrow_mut().insert(name, IconSlot::Failed);
            });
            on_done(None);
            return;
        };
        image.set_src(&src);
        match JsFuture::from(image.decode()).await {
            Ok(_) => {
                ICON_CACHE.with(|cache| {
                    cache
                        .borrow_mut()
                        .insert(name, IconSlot::Ready(image.clone()));
                });
                on_done(Some(image));
            }
            Err(_) => {
                ICON_CACHE.with(|cache| {
                    cache.borrow_mut().insert(name, IconSlot::Failed);
                });
                on_done(None);
            }
        }
    });
}
