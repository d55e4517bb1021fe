use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{
    CanvasRenderingContext2d, CanvasWindingRule, HtmlCanvasElement, MouseEvent, PointerEvent,
    TouchEvent, WheelEvent,
};

use travelmap_shared::CountryFeature;

use crate::app::{BaseMap, FlagEpoch, ShowLabels, Transform, VisitedIds, VisitedStoreHandle};
use crate::colors::{ACCENT, BORDER, LABEL, OCEAN, land_fill, rgba_css};
use crate::flags::{FlagImages, load_flag};
use crate::label_layout::{LabelEngine, prepare_label_sources};
use crate::overlay::{FlagOverlay, visited_overlays};
use crate::projection::{MapProjection, PathCommand, ProjectedCountry};
use crate::render_loop::RenderScheduler;
use crate::spatial::SpatialGrid;
use crate::viewport::{Gesture, ViewportController, ViewportTransform};

const BORDER_WIDTH_PX: f64 = 0.6;
const LABEL_HALO_PX: f64 = 3.0;

/// Everything derived from the base map at one viewport size.
struct Scene {
    width: f64,
    height: f64,
    version: u64,
    projection: MapProjection,
    projected: Vec<ProjectedCountry>,
    index: HashMap<String, usize>,
    grid: SpatialGrid,
    labels: LabelEngine,
    overlays: Vec<FlagOverlay>,
}

impl Scene {
    fn build(features: &[CountryFeature], width: f64, height: f64, version: u64) -> Self {
        let projection = MapProjection::for_viewport(width, height);
        let projected = projection.project_all(features);
        let index = projected
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let grid = SpatialGrid::build(&projected);
        let labels = LabelEngine::new(prepare_label_sources(&projected, &projection));
        Self {
            width,
            height,
            version,
            projection,
            projected,
            index,
            grid,
            labels,
            overlays: Vec::new(),
        }
    }

    fn is_stale(&self, width: f64, height: f64, version: u64) -> bool {
        self.width != width || self.height != height || self.version != version
    }

    fn refresh_overlays(&mut self, visited: &BTreeSet<String>) {
        self.overlays = visited_overlays(&self.projected, &self.projection, |id| visited.contains(id));
    }

    /// Country under a screen point, after undoing the viewport transform.
    fn hit(&self, transform: &ViewportTransform, x: f64, y: f64) -> Option<usize> {
        let [ux, uy] = transform.invert([x, y]);
        self.grid.find_at(&self.projected, ux, uy)
    }
}

struct ResizeBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()
}

fn trace_outline(ctx: &CanvasRenderingContext2d, commands: &[PathCommand]) {
    ctx.begin_path();
    for command in commands {
        match *command {
            PathCommand::MoveTo(x, y) => ctx.move_to(x, y),
            PathCommand::LineTo(x, y) => ctx.line_to(x, y),
            PathCommand::ClosePath => ctx.close_path(),
        }
    }
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: i32, client_y: i32) -> (f64, f64) {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            (client_x as f64 - rect.left(), client_y as f64 - rect.top())
        })
        .unwrap_or((client_x as f64, client_y as f64))
}

fn touch_pair(e: &TouchEvent) -> Option<(f64, f64, f64)> {
    let touches = e.touches();
    if touches.length() != 2 {
        return None;
    }
    let (t0, t1) = (touches.get(0)?, touches.get(1)?);
    let dx = (t1.client_x() - t0.client_x()) as f64;
    let dy = (t1.client_y() - t0.client_y()) as f64;
    let mid_x = (t0.client_x() + t1.client_x()) as f64 / 2.0;
    let mid_y = (t0.client_y() + t1.client_y()) as f64 / 2.0;
    Some(((dx * dx + dy * dy).sqrt(), mid_x, mid_y))
}

/// Canvas 2D world map: country fills, flag overlays for visited countries,
/// and collision-free labels. Clicking a country toggles it.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let BaseMap(features) = expect_context();
    let VisitedIds(visited) = expect_context();
    let Transform(transform) = expect_context();
    let FlagEpoch(flag_epoch) = expect_context();
    let ShowLabels(show_labels) = expect_context();
    let store: VisitedStoreHandle = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let controller = Rc::new(RefCell::new(ViewportController::new(1.0, 1.0)));
    let scene: Rc<RefCell<Option<Scene>>> = Rc::new(RefCell::new(None));
    let flags: Rc<RefCell<FlagImages>> = Rc::new(RefCell::new(FlagImages::default()));
    let features_version = Rc::new(Cell::new(0u64));
    let overlays_dirty = Rc::new(Cell::new(true));
    let hovered: Rc<Cell<Option<usize>>> = Rc::new(Cell::new(None));

    // Drag state
    let drag_pointer: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let down_x = Rc::new(Cell::new(0.0f64));
    let down_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    // Pinch state; zero when no pinch is active
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    let scheduler = RenderScheduler::new({
        let controller = controller.clone();
        let scene = scene.clone();
        let flags = flags.clone();
        let features_version = features_version.clone();
        let overlays_dirty = overlays_dirty.clone();
        let hovered = hovered.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let canvas: &HtmlCanvasElement = &canvas;
            let Some(parent) = canvas.parent_element() else {
                return;
            };
            let w = parent.client_width() as f64;
            let h = parent.client_height() as f64;
            if w <= 0.0 || h <= 0.0 {
                return;
            }
            let dpr = web_sys::window()
                .map_or(1.0, |window| window.device_pixel_ratio())
                .max(1.0);
            let px_w = (w * dpr).round() as u32;
            let px_h = (h * dpr).round() as u32;
            if canvas.width() != px_w || canvas.height() != px_h {
                canvas.set_width(px_w);
                canvas.set_height(px_h);
            }
            let Some(ctx) = context_2d(canvas) else {
                return;
            };

            let mut scene_slot = scene.borrow_mut();
            let version = features_version.get();
            if scene_slot
                .as_ref()
                .is_none_or(|s| s.is_stale(w, h, version))
            {
                let built = features.with_untracked(|f| Scene::build(f, w, h, version));
                let has_features = !built.projected.is_empty();
                *scene_slot = Some(built);
                overlays_dirty.set(true);
                hovered.set(None);

                let mut ctl = controller.borrow_mut();
                let next = ctl.resize(w, h);
                if has_features {
                    ctl.enable();
                }
                if next != transform.get_untracked() {
                    transform.set(next);
                }
            }
            let Some(scene) = scene_slot.as_mut() else {
                return;
            };
            if overlays_dirty.replace(false) {
                visited.with_untracked(|v| scene.refresh_overlays(v));
            }

            let t = transform.get_untracked();
            ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
            ctx.set_fill_style_str(&rgba_css(OCEAN.0, OCEAN.1, OCEAN.2, 1.0));
            ctx.fill_rect(0.0, 0.0, w, h);

            // Geometry is drawn in unzoomed space under the viewport transform.
            ctx.save();
            ctx.translate(t.translate_x, t.translate_y).ok();
            ctx.scale(t.scale, t.scale).ok();

            let fill = land_fill(false);
            let fill_hovered = land_fill(true);
            let border = rgba_css(BORDER.0, BORDER.1, BORDER.2, 1.0);
            let hovered_idx = hovered.get();
            ctx.set_line_width(BORDER_WIDTH_PX / t.scale);
            ctx.set_stroke_style_str(&border);
            for (idx, country) in scene.projected.iter().enumerate() {
                trace_outline(&ctx, &country.outline);
                ctx.set_fill_style_str(if hovered_idx == Some(idx) { &fill_hovered } else { &fill });
                ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
                ctx.stroke();
            }

            let mut missing: Vec<String> = Vec::new();
            let placeholder = rgba_css(ACCENT.0, ACCENT.1, ACCENT.2, 0.55);
            {
                let images = flags.borrow();
                for overlay in &scene.overlays {
                    let Some(country) = scene.index.get(&overlay.id).map(|&i| &scene.projected[i])
                    else {
                        continue;
                    };
                    let p = overlay.placement;
                    ctx.save();
                    trace_outline(&ctx, &country.outline);
                    ctx.clip_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
                    match images.get(&overlay.flag_url) {
                        Some(image) => {
                            ctx.draw_image_with_html_image_element_and_dw_and_dh(
                                image, p.x, p.y, p.width, p.height,
                            )
                            .ok();
                        }
                        None => {
                            ctx.set_fill_style_str(&placeholder);
                            ctx.fill_rect(p.x, p.y, p.width, p.height);
                            missing.push(overlay.flag_url.clone());
                        }
                    }
                    ctx.restore();
                    trace_outline(&ctx, &country.outline);
                    ctx.stroke();
                }
            }
            ctx.restore();

            for url in missing {
                load_flag(flags.clone(), url, move || {
                    flag_epoch.update(|n| *n = n.wrapping_add(1));
                });
            }

            if !show_labels.get_untracked() {
                return;
            }
            let halo = rgba_css(OCEAN.0, OCEAN.1, OCEAN.2, 0.85);
            let text = rgba_css(LABEL.0, LABEL.1, LABEL.2, 0.92);
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.set_line_join("round");
            ctx.set_line_width(LABEL_HALO_PX);
            ctx.set_stroke_style_str(&halo);
            ctx.set_fill_style_str(&text);
            for label in scene.labels.placements(&t).iter().filter(|l| l.visible) {
                let [x, y] = label.centroid;
                ctx.set_font(&format!(
                    "500 {:.1}px Inter, system-ui, sans-serif",
                    label.font_size
                ));
                ctx.stroke_text(&label.name, x, y).ok();
                ctx.fill_text(&label.name, x, y).ok();
            }
        }
    });
    let scheduler = Rc::new(scheduler);

    // Base map replaced: rebuild the scene on the next frame.
    Effect::new({
        let sched = scheduler.clone();
        let features_version = features_version.clone();
        move || {
            features.track();
            features_version.set(features_version.get().wrapping_add(1));
            sched.mark_dirty();
        }
    });

    Effect::new({
        let sched = scheduler.clone();
        let overlays_dirty = overlays_dirty.clone();
        move || {
            visited.track();
            overlays_dirty.set(true);
            sched.mark_dirty();
        }
    });

    Effect::new({
        let sched = scheduler.clone();
        move || {
            transform.track();
            flag_epoch.track();
            show_labels.track();
            sched.mark_dirty();
        }
    });

    // Window resizes change the parent size the scene is built for.
    Effect::new({
        let sched = scheduler.clone();
        move || {
            let Some(window) = web_sys::window() else {
                return;
            };
            RESIZE_BINDING.with(|slot| {
                if let Some(old) = slot.borrow_mut().take() {
                    let _ = old.window.remove_event_listener_with_callback(
                        "resize",
                        old.handler.as_ref().unchecked_ref(),
                    );
                }
            });
            let sched = sched.clone();
            let handler = Closure::<dyn Fn()>::new(move || sched.mark_dirty());
            if window
                .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
                .is_ok()
            {
                RESIZE_BINDING.with(|slot| {
                    *slot.borrow_mut() = Some(ResizeBinding {
                        window: window.clone(),
                        handler,
                    });
                });
            }
        }
    });

    // --- Input handlers ---

    let apply_gesture = {
        let controller = controller.clone();
        move |gesture: Gesture| {
            let next = controller.borrow_mut().apply(gesture);
            if let Some(next) = next {
                transform.set(next);
            }
        }
    };

    let on_wheel = {
        let apply_gesture = apply_gesture.clone();
        move |e: WheelEvent| {
            e.prevent_default();
            let (x, y) = local_point(canvas_ref, e.client_x(), e.client_y());
            apply_gesture(Gesture::Wheel {
                delta_y: e.delta_y(),
                delta_mode: e.delta_mode(),
                ctrl: e.ctrl_key(),
                x,
                y,
            });
        }
    };

    let on_pointer_down = {
        let drag_pointer = drag_pointer.clone();
        let down_x = down_x.clone();
        let down_y = down_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            if !ViewportController::accepts_button(e.button()) || drag_pointer.get().is_some() {
                return;
            }
            drag_pointer.set(Some(e.pointer_id()));
            down_x.set(e.client_x() as f64);
            down_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let drag_pointer = drag_pointer.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let pinch_dist = pinch_dist.clone();
        let scene = scene.clone();
        let hovered = hovered.clone();
        let scheduler = scheduler.clone();
        let apply_gesture = apply_gesture.clone();
        move |e: PointerEvent| {
            if drag_pointer.get() == Some(e.pointer_id()) {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                if pinch_dist.get() == 0.0 {
                    apply_gesture(Gesture::Drag { dx, dy });
                }
                return;
            }
            if drag_pointer.get().is_some() {
                return;
            }

            let (x, y) = local_point(canvas_ref, e.client_x(), e.client_y());
            let t = transform.get_untracked();
            let hit = scene.borrow().as_ref().and_then(|s| s.hit(&t, x, y));
            if hit != hovered.get() {
                hovered.set(hit);
                scheduler.mark_dirty();
                if let Some(target) = e.target()
                    && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
                {
                    let cursor = if hit.is_some() { "pointer" } else { "grab" };
                    el.style().set_property("cursor", cursor).ok();
                }
            }
        }
    };

    let on_pointer_up = {
        let drag_pointer = drag_pointer.clone();
        move |e: PointerEvent| {
            if drag_pointer.get() != Some(e.pointer_id()) {
                return;
            }
            drag_pointer.set(None);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_pointer_leave = {
        let hovered = hovered.clone();
        let scheduler = scheduler.clone();
        move |_: PointerEvent| {
            if hovered.replace(None).is_some() {
                scheduler.mark_dirty();
            }
        }
    };

    let on_click = {
        let down_x = down_x.clone();
        let down_y = down_y.clone();
        let scene = scene.clone();
        move |e: MouseEvent| {
            let dx = e.client_x() as f64 - down_x.get();
            let dy = e.client_y() as f64 - down_y.get();
            if !ViewportController::is_click(dx, dy) {
                return;
            }
            let (x, y) = local_point(canvas_ref, e.client_x(), e.client_y());
            let t = transform.get_untracked();
            let id = scene
                .borrow()
                .as_ref()
                .and_then(|s| s.hit(&t, x, y).map(|i| s.projected[i].id.clone()));
            if let Some(id) = id {
                store.toggle(id);
            }
        }
    };

    let on_double_click = {
        let apply_gesture = apply_gesture.clone();
        move |e: MouseEvent| {
            e.prevent_default();
            apply_gesture(Gesture::DoubleTap);
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: TouchEvent| {
            if let Some((dist, _, _)) = touch_pair(&e) {
                e.prevent_default();
                pinch_dist.set(dist);
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: TouchEvent| {
            let Some((dist, mid_x, mid_y)) = touch_pair(&e) else {
                return;
            };
            e.prevent_default();
            let previous = pinch_dist.get();
            if previous > 0.0 {
                let (center_x, center_y) = local_point(canvas_ref, mid_x as i32, mid_y as i32);
                apply_gesture(Gesture::Pinch {
                    previous_distance: previous,
                    distance: dist,
                    center_x,
                    center_y,
                });
            }
            pinch_dist.set(dist);
        }
    };

    let on_touch_end = {
        let pinch_dist = pinch_dist.clone();
        move |e: TouchEvent| {
            if e.touches().length() < 2 {
                pinch_dist.set(0.0);
            }
        }
    };

    view! {
        <div
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointercancel=move |_: PointerEvent| drag_pointer.set(None)
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:dblclick=on_double_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
            on:touchend=on_touch_end
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}
