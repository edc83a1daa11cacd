use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use zonemap_shared::{MapCatalog, MapDefinition, RenderConfig, ViewportTransform, fit, project};

use crate::app::{ResizeEpoch, canvas_dimensions};
use crate::images::{self, IconSlot};
use crate::render_loop::RenderScheduler;
use crate::session::Session;

pub fn render_scale() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
}

/// Full-window map canvas: background letterboxed to the viewport, markers
/// composited on top. Every state change invalidates the whole scene; the
/// scheduler coalesces invalidations into one redraw per frame.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let catalog: RwSignal<Option<MapCatalog>> = expect_context();
    let session: Session = expect_context();
    let ResizeEpoch(resize_epoch) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Cached Canvas 2D context (invalidated whenever the backing store resizes)
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));

    // Bumped at the start of every redraw. Icon decodes completing after a
    // newer frame started must not stamp markers through the old transform.
    let frame_generation: Rc<Cell<u64>> = Rc::new(Cell::new(0));

    // Bumped when a stale icon decode wants its markers on the current scene.
    let icons_epoch: RwSignal<u64> = RwSignal::new(0);

    let config = RenderConfig::default();

    let cached_ctx_render = cached_ctx.clone();
    let frame_gen_render = frame_generation.clone();
    let scheduler = RenderScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        redraw(
            canvas,
            &cached_ctx_render,
            &frame_gen_render,
            catalog,
            session,
            icons_epoch,
            &config,
        );
    });
    let scheduler = Rc::new(scheduler);

    // Every redraw trigger: catalog arrival, map switch, background decode,
    // viewport resize, late icon arrival.
    let sched = scheduler.clone();
    Effect::new(move || {
        catalog.track();
        session.selected_key.track();
        session.background.track();
        resize_epoch.track();
        icons_epoch.track();
        sched.mark_dirty();
    });

    view! {
        <canvas
            node_ref=canvas_ref
            style="position: absolute; inset: 0; width: 100%; height: 100%; display: block;"
        />
    }
}

/// One full compositing pass: resize + clear the surface, letterbox the
/// background, then stamp every marker of the active map through the
/// freshly computed transform.
fn redraw(
    canvas: &HtmlCanvasElement,
    cached_ctx: &Rc<RefCell<Option<CanvasRenderingContext2d>>>,
    frame_generation: &Rc<Cell<u64>>,
    catalog: RwSignal<Option<MapCatalog>>,
    session: Session,
    icons_epoch: RwSignal<u64>,
    config: &RenderConfig,
) {
    let generation = frame_generation.get() + 1;
    frame_generation.set(generation);

    let (css_w, css_h) = canvas_dimensions();
    let dpr = render_scale();

    // Backing store in device pixels, drawing in CSS pixels via ctx.scale.
    let expected_w = (css_w * dpr) as u32;
    let expected_h = (css_h * dpr) as u32;
    if canvas.width() != expected_w || canvas.height() != expected_h {
        canvas.set_width(expected_w);
        canvas.set_height(expected_h);
        *cached_ctx.borrow_mut() = None;
    }

    let ctx = {
        let mut ctx_cache = cached_ctx.borrow_mut();
        if ctx_cache.is_none() {
            let Some(ctx) = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            else {
                return;
            };
            ctx.scale(dpr, dpr).ok();
            *ctx_cache = Some(ctx);
        }
        let Some(ctx) = ctx_cache.clone() else {
            return;
        };
        ctx
    };

    ctx.clear_rect(0.0, 0.0, css_w, css_h);

    // No background yet (startup, mid-switch, or failed load): the cleared
    // canvas is the whole frame.
    let Some(image) = session.background.get_untracked() else {
        return;
    };
    let image_w = image.natural_width() as f64;
    let image_h = image.natural_height() as f64;
    let Some(transform) = fit(image_w, image_h, css_w, css_h) else {
        return;
    };

    ctx.draw_image_with_html_image_element_and_dw_and_dh(
        &image,
        transform.offset_x,
        transform.offset_y,
        image_w * transform.scale,
        image_h * transform.scale,
    )
    .ok();

    let Some(key) = session.selected_key.get_untracked() else {
        return;
    };
    catalog.with_untracked(|catalog| {
        let Some(definition) = catalog.as_ref().and_then(|c| c.get(&key)) else {
            return;
        };
        draw_markers(
            &ctx,
            definition,
            &transform,
            frame_generation,
            generation,
            icons_epoch,
            config,
        );
    });
}

fn draw_markers(
    ctx: &CanvasRenderingContext2d,
    definition: &MapDefinition,
    transform: &ViewportTransform,
    frame_generation: &Rc<Cell<u64>>,
    generation: u64,
    icons_epoch: RwSignal<u64>,
    config: &RenderConfig,
) {
    for group in &definition.icons {
        for (name, entry) in group {
            if entry.locations.is_empty() {
                continue;
            }

            let points: Vec<(f64, f64)> = entry
                .locations
                .iter()
                .map(|loc| {
                    let (tex_x, tex_y) = project(
                        loc.x,
                        loc.y,
                        definition.size_factor,
                        definition.is_small_map,
                        config,
                    );
                    transform.apply(tex_x, tex_y)
                })
                .collect();

            match images::cached_icon(name) {
                Some(IconSlot::Ready(image)) => {
                    draw_icon_points(ctx, &image, &points, config.icon_size_px);
                }
                // In flight or known-missing: the markers for this identifier
                // contribute nothing to this frame.
                Some(IconSlot::Loading) | Some(IconSlot::Failed) => {}
                None => {
                    // First sighting of this identifier: fetch it once. If the
                    // decode lands while this frame is still current, stamp the
                    // markers straight onto it; otherwise ask for a fresh frame,
                    // which will find the image in the cache.
                    let ctx = ctx.clone();
                    let frame_generation = frame_generation.clone();
                    let size = config.icon_size_px;
                    images::request_icon(name.clone(), move |image| {
                        let Some(image) = image else {
                            return;
                        };
                        if frame_generation.get() == generation {
                            draw_icon_points(&ctx, &image, &points, size);
                        } else {
                            icons_epoch.update(|epoch| *epoch += 1);
                        }
                    });
                }
            }
        }
    }
}

/// Draw one icon image centered at each screen point.
fn draw_icon_points(
    ctx: &CanvasRenderingContext2d,
    image: &HtmlImageElement,
    points: &[(f64, f64)],
    size: f64,
) {
    for &(sx, sy) in points {
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            sx - size / 2.0,
            sy - size / 2.0,
            size,
            size,
        )
        .ok();
    }
}
