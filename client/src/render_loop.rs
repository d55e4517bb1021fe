use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalescing state for one render target. Any number of requests between
/// two animation frames produce exactly one render.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameGate {
    dirty: bool,
    scheduled: bool,
    frames: u64,
}

impl FrameGate {
    /// Mark dirty. Returns `true` when the caller must schedule a frame.
    pub fn request(&mut self) -> bool {
        self.dirty = true;
        if self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }

    /// Called at the top of a frame. Returns whether to render.
    pub fn begin_frame(&mut self) -> bool {
        self.scheduled = false;
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.frames += 1;
        true
    }

    /// Scheduling failed or was cancelled; the next request reschedules.
    pub fn unschedule(&mut self) {
        self.scheduled = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Runs a render closure at most once per `requestAnimationFrame`.
///
/// Viewport and visited-set changes call `mark_dirty()`; labels and flag
/// overlays are then recomputed once in the next frame.
pub struct RenderScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    gate: RefCell<FrameGate>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn schedule(&self) {
        let callback = self.callback.borrow();
        let (Some(window), Some(cb)) = (self.window.as_ref(), callback.as_ref()) else {
            self.gate.borrow_mut().unschedule();
            return;
        };
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(_) => self.gate.borrow_mut().unschedule(),
        }
    }
}

impl RenderScheduler {
    pub fn new(render_fn: impl Fn() + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            gate: RefCell::new(FrameGate::default()),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        // Weak so the closure does not keep the scheduler alive.
        let weak = Rc::downgrade(&inner);
        let cb = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.raf_id.set(None);
            let render = inner.gate.borrow_mut().begin_frame();
            if render {
                render_fn();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    pub fn mark_dirty(&self) {
        let needs_frame = self.inner.gate.borrow_mut().request();
        if needs_frame {
            self.inner.schedule();
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.inner.gate.borrow().frames()
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        *self.inner.gate.borrow_mut() = FrameGate::default();
        self.inner.callback.borrow_mut().take();
    }
}
