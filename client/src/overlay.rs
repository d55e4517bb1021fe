use travelmap_shared::LonLat;
use travelmap_shared::countries;

use crate::projection::{MapProjection, ProjectedCountry};

/// Mainland geography for countries whose overseas territories would drag
/// the geometric centroid and bounds off the main landmass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainlandOverride {
    pub id: &'static str,
    pub centroid: LonLat,
    /// South-west and north-east corners.
    pub extent: [LonLat; 2],
}

const MAINLAND_OVERRIDES: &[MainlandOverride] = &[
    MainlandOverride {
        id: "250",
        centroid: [2.5, 46.5],
        extent: [[-5.0, 42.0], [10.0, 51.0]],
    },
    MainlandOverride {
        id: "840",
        centroid: [-98.0, 39.0],
        extent: [[-125.0, 24.0], [-66.0, 50.0]],
    },
    MainlandOverride {
        id: "643",
        centroid: [100.0, 60.0],
        extent: [[20.0, 45.0], [180.0, 75.0]],
    },
    MainlandOverride {
        id: "578",
        centroid: [10.0, 62.0],
        extent: [[4.0, 58.0], [31.0, 71.0]],
    },
    MainlandOverride {
        id: "528",
        centroid: [5.5, 52.5],
        extent: [[3.0, 50.0], [8.0, 54.0]],
    },
    MainlandOverride {
        id: "826",
        centroid: [-2.0, 54.0],
        extent: [[-8.0, 49.0], [2.0, 61.0]],
    },
];

pub fn mainland_override(id: &str) -> Option<&'static MainlandOverride> {
    MAINLAND_OVERRIDES.iter().find(|o| o.id == id)
}

/// Projected mainland centroid when an override exists, otherwise the
/// geometric centroid.
pub fn display_centroid(country: &ProjectedCountry, projection: &MapProjection) -> [f64; 2] {
    mainland_override(&country.id)
        .and_then(|o| projection.project(o.centroid))
        .unwrap_or(country.centroid)
}

/// Flag rectangle in unzoomed screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub center: [f64; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagOverlay {
    pub id: String,
    pub flag_url: String,
    pub placement: OverlayPlacement,
}

const OVERLAY_PADDING: f64 = 1.2;
const FLAG_ASPECT: f64 = 1.5;

/// Flag fill for a visited country. `None` when the country has no alpha-2
/// code or no usable centroid.
pub fn resolve_overlay(country: &ProjectedCountry, projection: &MapProjection) -> Option<FlagOverlay> {
    let alpha2 = countries::alpha2_for(&country.id)?;

    let mainland = mainland_override(&country.id).and_then(|o| {
        let sw = projection.project(o.extent[0])?;
        let ne = projection.project(o.extent[1])?;
        Some(((ne[0] - sw[0]).abs(), (ne[1] - sw[1]).abs()))
    });
    let (width, height) = match (mainland, country.bounds) {
        (Some(extent), _) => extent,
        (None, Some(bounds)) => (bounds.width(), bounds.height()),
        (None, None) => return None,
    };
    let center = display_centroid(country, projection);
    if !center[0].is_finite() || !center[1].is_finite() {
        return None;
    }

    let max_dim = width.max(height) * OVERLAY_PADDING;
    let overlay_width = max_dim * FLAG_ASPECT;
    let overlay_height = max_dim;
    Some(FlagOverlay {
        id: country.id.clone(),
        flag_url: countries::flag_url(alpha2),
        placement: OverlayPlacement {
            x: center[0] - overlay_width / 2.0,
            y: center[1] - overlay_height / 2.0,
            width: overlay_width,
            height: overlay_height,
            center,
        },
    })
}

/// Overlays for every visited country that resolves one, in feature order.
pub fn visited_overlays(
    projected: &[ProjectedCountry],
    projection: &MapProjection,
    is_visited: impl Fn(&str) -> bool,
) -> Vec<FlagOverlay> {
    projected
        .iter()
        .filter(|c| is_visited(&c.id))
        .filter_map(|c| resolve_overlay(c, projection))
        .collect()
}

#[cfg(test)]
mod tests {
    use travelmap_shared::{CountryFeature, Geometry};

    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-6,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn country(id: &str, lon: f64, lat: f64, size: f64, projection: &MapProjection) -> ProjectedCountry {
        projection.project_feature(&CountryFeature {
            id: id.into(),
            name: String::new(),
            geometry: Geometry::Polygon(vec![vec![
                [lon, lat],
                [lon + size, lat],
                [lon + size, lat + size],
                [lon, lat + size],
                [lon, lat],
            ]]),
        })
    }

    #[test]
    fn default_overlay_uses_bounds_and_centroid() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        let germany = country("276", 6.0, 47.0, 8.0, &projection);
        let overlay = resolve_overlay(&germany, &projection).unwrap();
        let bounds = germany.bounds.unwrap();
        let max_dim = bounds.width().max(bounds.height()) * 1.2;

        assert_eq!(overlay.flag_url, "https://flagcdn.com/w640/de.png");
        assert_close(overlay.placement.width, max_dim * 1.5);
        assert_close(overlay.placement.height, max_dim);
        assert_eq!(overlay.placement.center, germany.centroid);
        assert_close(
            overlay.placement.x + overlay.placement.width / 2.0,
            germany.centroid[0],
        );
    }

    #[test]
    fn mainland_override_replaces_extent_and_centroid() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        // French Guiana-sized square far from Europe stands in for overseas parts.
        let france = country("250", -54.0, 2.0, 40.0, &projection);
        let overlay = resolve_overlay(&france, &projection).unwrap();

        let sw = projection.project([-5.0, 42.0]).unwrap();
        let ne = projection.project([10.0, 51.0]).unwrap();
        let max_dim = (ne[0] - sw[0]).abs().max((ne[1] - sw[1]).abs()) * 1.2;
        assert_close(overlay.placement.height, max_dim);
        assert_eq!(
            overlay.placement.center,
            projection.project([2.5, 46.5]).unwrap()
        );
    }

    #[test]
    fn unknown_country_has_no_overlay() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        let unknown = country("999", 0.0, 0.0, 5.0, &projection);
        assert!(resolve_overlay(&unknown, &projection).is_none());
    }

    #[test]
    fn empty_geometry_has_no_overlay() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        let empty = projection.project_feature(&CountryFeature {
            id: "276".into(),
            name: String::new(),
            geometry: Geometry::MultiPolygon(Vec::new()),
        });
        assert!(resolve_overlay(&empty, &projection).is_none());
    }

    #[test]
    fn only_visited_countries_get_overlays() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        let list = vec![
            country("276", 6.0, 47.0, 8.0, &projection),
            country("724", -9.0, 36.0, 12.0, &projection),
        ];
        let overlays = visited_overlays(&list, &projection, |id| id == "724");
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].id, "724");
    }
}
