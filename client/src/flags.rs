use std::collections::HashMap;

use crate::console;

#[derive(Debug, Clone)]
enum Slot<I> {
    Loading,
    Ready(I),
    Failed,
}

/// Decoded flag images keyed by URL. Each URL is requested at most once;
/// failures are remembered so a broken flag is not retried every frame.
#[derive(Debug, Clone)]
pub struct FlagCache<I> {
    slots: HashMap<String, Slot<I>>,
}

impl<I> Default for FlagCache<I> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<I> FlagCache<I> {
    /// Returns `true` when the caller should start loading `url`.
    pub fn request(&mut self, url: &str) -> bool {
        if self.slots.contains_key(url) {
            return false;
        }
        self.slots.insert(url.to_string(), Slot::Loading);
        true
    }

    pub fn resolve(&mut self, url: &str, image: Option<I>) {
        let slot = match image {
            Some(image) => Slot::Ready(image),
            None => Slot::Failed,
        };
        self.slots.insert(url.to_string(), slot);
    }

    pub fn get(&self, url: &str) -> Option<&I> {
        match self.slots.get(url) {
            Some(Slot::Ready(image)) => Some(image),
            _ => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Loading))
            .count()
    }
}

pub type FlagImages = FlagCache<web_sys::HtmlImageElement>;

/// Load and decode a flag off the render path, then call `on_ready` so the
/// next frame can draw it.
pub fn load_flag(
    cache: std::rc::Rc<std::cell::RefCell<FlagImages>>,
    url: String,
    on_ready: impl FnOnce() + 'static,
) {
    if !cache.borrow_mut().request(&url) {
        return;
    }
    wasm_bindgen_futures::spawn_local(async move {
        let Ok(image) = web_sys::HtmlImageElement::new() else {
            cache.borrow_mut().resolve(&url, None);
            return;
        };
        image.set_cross_origin(Some("anonymous"));
        image.set_src(&url);
        match wasm_bindgen_futures::JsFuture::from(image.decode()).await {
            Ok(_) => {
                cache.borrow_mut().resolve(&url, Some(image));
                on_ready();
            }
            Err(err) => {
                cache.borrow_mut().resolve(&url, None);
                console::warn(&format!("Failed to decode flag {url}: {err:?}"));
            }
        }
    });
}
