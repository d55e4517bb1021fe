/// Pan/zoom state applied on top of the unzoomed projection:
/// `screen = base * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 12.0;
/// Pointer travel below this many pixels between down and up is a click.
pub const CLICK_DISTANCE: f64 = 4.0;

const WHEEL_PIXEL_SENSITIVITY: f64 = 0.002;
const WHEEL_LINE_SENSITIVITY: f64 = 0.05;
const WHEEL_PAGE_SENSITIVITY: f64 = 1.0;
const WHEEL_CTRL_BOOST: f64 = 10.0;

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewportTransform {
    /// Convert unzoomed coordinates to screen coordinates.
    pub fn apply(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        ]
    }

    /// Convert screen coordinates to unzoomed coordinates.
    pub fn invert(&self, [sx, sy]: [f64; 2]) -> [f64; 2] {
        [
            (sx - self.translate_x) / self.scale,
            (sy - self.translate_y) / self.scale,
        ]
    }

    /// Clamp scale to the zoom range and translation so the world rectangle
    /// always covers a `width`×`height` viewport.
    pub fn clamped(self, width: f64, height: f64) -> Self {
        let scale = if self.scale.is_finite() {
            self.scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            MIN_SCALE
        };
        let clamp_axis = |t: f64, extent: f64| {
            let lower = extent * (1.0 - scale);
            if t.is_finite() { t.clamp(lower, 0.0) } else { 0.0 }
        };
        Self {
            scale,
            translate_x: clamp_axis(self.translate_x, width),
            translate_y: clamp_axis(self.translate_y, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// `delta_mode`: 0 = pixels, 1 = lines, 2 = pages.
    Wheel {
        delta_y: f64,
        delta_mode: u32,
        ctrl: bool,
        x: f64,
        y: f64,
    },
    Drag {
        dx: f64,
        dy: f64,
    },
    Pinch {
        previous_distance: f64,
        distance: f64,
        center_x: f64,
        center_y: f64,
    },
    DoubleTap,
}

/// Owns the single viewport transform and turns gestures into clamped
/// transitions. Inert until base map data has loaded.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: ViewportTransform,
    width: f64,
    height: f64,
    enabled: bool,
}

impl ViewportController {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            transform: ViewportTransform::default(),
            width,
            height,
            enabled: false,
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn resize(&mut self, width: f64, height: f64) -> ViewportTransform {
        self.width = width;
        self.height = height;
        self.transform = self.transform.clamped(width, height);
        self.transform
    }

    /// Only the primary mouse button starts a drag.
    pub fn accepts_button(button: i16) -> bool {
        button == 0
    }

    pub fn is_click(dx: f64, dy: f64) -> bool {
        dx * dx + dy * dy < CLICK_DISTANCE * CLICK_DISTANCE
    }

    /// Apply a gesture. Returns the new transform, or `None` when the gesture
    /// is ignored.
    pub fn apply(&mut self, gesture: Gesture) -> Option<ViewportTransform> {
        if !self.enabled {
            return None;
        }
        let next = match gesture {
            Gesture::Wheel {
                delta_y,
                delta_mode,
                ctrl,
                x,
                y,
            } => {
                let sensitivity = match delta_mode {
                    0 => WHEEL_PIXEL_SENSITIVITY,
                    1 => WHEEL_LINE_SENSITIVITY,
                    _ => WHEEL_PAGE_SENSITIVITY,
                };
                let boost = if ctrl { WHEEL_CTRL_BOOST } else { 1.0 };
                let factor = (-delta_y * sensitivity * boost).exp2();
                self.zoomed_at(factor, x, y)
            }
            Gesture::Drag { dx, dy } => ViewportTransform {
                translate_x: self.transform.translate_x + dx,
                translate_y: self.transform.translate_y + dy,
                ..self.transform
            },
            Gesture::Pinch {
                previous_distance,
                distance,
                center_x,
                center_y,
            } => {
                if previous_distance <= 0.0 || distance <= 0.0 {
                    return None;
                }
                self.zoomed_at(distance / previous_distance, center_x, center_y)
            }
            Gesture::DoubleTap => return None,
        };
        self.transform = next.clamped(self.width, self.height);
        Some(self.transform)
    }

    /// Scale by `factor`, keeping the screen point `(x, y)` fixed.
    fn zoomed_at(&self, factor: f64, x: f64, y: f64) -> ViewportTransform {
        let current = self.transform;
        let scale = (current.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = scale / current.scale;
        ViewportTransform {
            scale,
            translate_x: x - (x - current.translate_x) * ratio,
            translate_y: y - (y - current.translate_y) * ratio,
        }
    }
}
