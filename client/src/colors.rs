/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Brighten a color by a factor (1.0 = no change, >1.0 = brighter).
pub fn brighten(r: u8, g: u8, b: u8, factor: f64) -> (u8, u8, u8) {
    (
        ((r as f64 * factor).min(255.0)) as u8,
        ((g as f64 * factor).min(255.0)) as u8,
        ((b as f64 * factor).min(255.0)) as u8,
    )
}

pub const OCEAN: (u8, u8, u8) = (12, 14, 23);
pub const LAND: (u8, u8, u8) = (30, 34, 48);
pub const BORDER: (u8, u8, u8) = (70, 76, 96);
pub const ACCENT: (u8, u8, u8) = (201, 169, 110);
pub const LABEL: (u8, u8, u8) = (226, 224, 216);

/// Land fill, lifted while hovered.
pub fn land_fill(hovered: bool) -> String {
    let (r, g, b) = if hovered { brighten(LAND.0, LAND.1, LAND.2, 1.35) } else { LAND };
    rgba_css(r, g, b, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brighten_saturates() {
        assert_eq!(brighten(200, 100, 0, 2.0), (255, 200, 0));
        assert_eq!(brighten(10, 20, 30, 1.0), (10, 20, 30));
    }

    #[test]
    fn hovered_land_is_lighter() {
        assert_eq!(land_fill(false), "rgba(30,34,48,1)");
        assert_eq!(land_fill(true), "rgba(40,45,64,1)");
    }
}
