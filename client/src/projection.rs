//! Natural Earth I projection and projected country geometry.

use std::fmt::Write as FmtWrite;

use travelmap_shared::{CountryFeature, Geometry, LonLat};

/// Ratio of viewport width to projection scale.
const SCALE_DIVISOR: f64 = 5.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapProjection {
    pub width: f64,
    pub height: f64,
    scale: f64,
    translate_x: f64,
    translate_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    ClosePath,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ScreenBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    fn include(bounds: &mut Option<ScreenBounds>, [x, y]: [f64; 2]) {
        match bounds {
            Some(b) => {
                b.min_x = b.min_x.min(x);
                b.min_y = b.min_y.min(y);
                b.max_x = b.max_x.max(x);
                b.max_y = b.max_y.max(y);
            }
            None => {
                *bounds = Some(ScreenBounds {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
            }
        }
    }
}

/// A country projected into unzoomed screen space. Rebuilt whenever the
/// viewport dimensions change.
#[derive(Debug, Clone)]
pub struct ProjectedCountry {
    pub id: String,
    /// Polygons of rings; the first ring of each polygon is the outer boundary.
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
    pub outline: Vec<PathCommand>,
    pub centroid: [f64; 2],
    pub bounds: Option<ScreenBounds>,
    /// Area of the screen-space bounding box.
    pub base_area: f64,
}

impl MapProjection {
    pub fn for_viewport(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale: width / SCALE_DIVISOR,
            translate_x: width / 2.0,
            translate_y: height / 2.0,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn project(&self, [lon, lat]: LonLat) -> Option<[f64; 2]> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let (x, y) = natural_earth(lon.to_radians(), lat.to_radians());
        Some([
            self.translate_x + x * self.scale,
            self.translate_y - y * self.scale,
        ])
    }

    fn project_rings(&self, geometry: &Geometry) -> Vec<Vec<Vec<[f64; 2]>>> {
        geometry
            .polygons()
            .iter()
            .map(|polygon| {
                polygon
                    .iter()
                    .map(|ring| ring.iter().filter_map(|&p| self.project(p)).collect())
                    .collect()
            })
            .collect()
    }

    pub fn outline(&self, geometry: &Geometry) -> Vec<PathCommand> {
        outline_of(&self.project_rings(geometry))
    }

    pub fn centroid(&self, geometry: &Geometry) -> [f64; 2] {
        centroid_of(&self.project_rings(geometry))
    }

    pub fn bounds(&self, geometry: &Geometry) -> Option<ScreenBounds> {
        bounds_of(&self.project_rings(geometry))
    }

    pub fn project_feature(&self, feature: &CountryFeature) -> ProjectedCountry {
        let polygons = self.project_rings(&feature.geometry);
        let bounds = bounds_of(&polygons);
        ProjectedCountry {
            id: feature.id.clone(),
            outline: outline_of(&polygons),
            centroid: centroid_of(&polygons),
            base_area: bounds.map_or(0.0, |b| b.area()),
            bounds,
            polygons,
        }
    }

    pub fn project_all(&self, features: &[CountryFeature]) -> Vec<ProjectedCountry> {
        features.iter().map(|f| self.project_feature(f)).collect()
    }
}

/// Raw Natural Earth I forward projection (Šavrič et al.), radians in.
fn natural_earth(lambda: f64, phi: f64) -> (f64, f64) {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    let x = lambda
        * (0.8707 - 0.131979 * phi2
            + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4)));
    let y = phi
        * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)));
    (x, y)
}

fn outline_of(polygons: &[Vec<Vec<[f64; 2]>>]) -> Vec<PathCommand> {
    let mut commands = Vec::new();
    for ring in polygons.iter().flatten() {
        let mut points = ring.iter();
        let Some(&[x, y]) = points.next() else {
            continue;
        };
        commands.push(PathCommand::MoveTo(x, y));
        commands.extend(points.map(|&[x, y]| PathCommand::LineTo(x, y)));
        commands.push(PathCommand::ClosePath);
    }
    commands
}

fn bounds_of(polygons: &[Vec<Vec<[f64; 2]>>]) -> Option<ScreenBounds> {
    let mut bounds = None;
    for &point in polygons.iter().flatten().flatten() {
        ScreenBounds::include(&mut bounds, point);
    }
    bounds
}

/// Area-weighted centroid. Holes subtract regardless of winding; zero-area
/// shapes fall back to the vertex mean.
fn centroid_of(polygons: &[Vec<Vec<[f64; 2]>>]) -> [f64; 2] {
    let mut area_sum = 0.0;
    let mut cx_sum = 0.0;
    let mut cy_sum = 0.0;
    let mut vertex_sum = [0.0, 0.0];
    let mut vertex_count = 0usize;

    for polygon in polygons {
        for (ring_index, ring) in polygon.iter().enumerate() {
            let (area, cx, cy) = ring_moments(ring);
            let role = if ring_index == 0 { 1.0 } else { -1.0 };
            let sign = role * area.signum();
            area_sum += sign * area;
            cx_sum += sign * cx;
            cy_sum += sign * cy;
            for &[x, y] in ring {
                vertex_sum[0] += x;
                vertex_sum[1] += y;
                vertex_count += 1;
            }
        }
    }

    if area_sum.abs() > f64::EPSILON {
        return [cx_sum / area_sum, cy_sum / area_sum];
    }
    if vertex_count == 0 {
        return [f64::NAN, f64::NAN];
    }
    let n = vertex_count as f64;
    [vertex_sum[0] / n, vertex_sum[1] / n]
}

/// Signed shoelace area and first moments of a ring.
fn ring_moments(ring: &[[f64; 2]]) -> (f64, f64, f64) {
    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, &[x0, y0]) in ring.iter().enumerate() {
        let [x1, y1] = ring[(i + 1) % ring.len()];
        let cross = x0 * y1 - x1 * y0;
        area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    (area / 2.0, cx / 6.0, cy / 6.0)
}

/// Serialize path commands as SVG path data.
pub fn svg_path(commands: &[PathCommand]) -> String {
    let mut out = String::with_capacity(commands.len() * 12);
    for command in commands {
        let _ = match *command {
            PathCommand::MoveTo(x, y) => write!(out, "M{x},{y}"),
            PathCommand::LineTo(x, y) => write!(out, "L{x},{y}"),
            PathCommand::ClosePath => write!(out, "Z"),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-6,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<[f64; 2]> {
        vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]
    }

    #[test]
    fn origin_maps_to_viewport_center() {
        let projection = MapProjection::for_viewport(1100.0, 600.0);
        let [x, y] = projection.project([0.0, 0.0]).unwrap();
        assert_close(x, 550.0);
        assert_close(y, 300.0);
        assert_close(projection.scale(), 200.0);
    }

    #[test]
    fn equator_longitude_scales_linearly() {
        let projection = MapProjection::for_viewport(1100.0, 600.0);
        let [x, _] = projection.project([180.0, 0.0]).unwrap();
        assert_close(x, 550.0 + std::f64::consts::PI * 0.8707 * 200.0);
    }

    #[test]
    fn north_is_up_and_hemispheres_mirror() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        let [ex, ny] = projection.project([30.0, 45.0]).unwrap();
        let [wx, sy] = projection.project([-30.0, -45.0]).unwrap();
        assert!(ny < 400.0);
        assert_close(ex - 500.0, 500.0 - wx);
        assert_close(400.0 - ny, sy - 400.0);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        assert!(projection.project([f64::NAN, 0.0]).is_none());
        assert!(projection.project([0.0, f64::INFINITY]).is_none());
    }

    #[test]
    fn centroid_of_square_is_its_center() {
        let c = centroid_of(&[vec![square(0.0, 0.0, 10.0)]]);
        assert_close(c[0], 5.0);
        assert_close(c[1], 5.0);
    }

    #[test]
    fn holes_pull_the_centroid_away() {
        let mut hole = square(5.0, 0.0, 5.0);
        hole.reverse();
        let c = centroid_of(&[vec![square(0.0, 0.0, 10.0), hole]]);
        // 100 - 25 area; the hole's moment (7.5, 2.5) * 25 is removed.
        assert_close(c[0], (5.0 * 100.0 - 7.5 * 25.0) / 75.0);
        assert_close(c[1], (5.0 * 100.0 - 2.5 * 25.0) / 75.0);
    }

    #[test]
    fn multipolygon_centroid_weights_by_area() {
        let c = centroid_of(&[vec![square(0.0, 0.0, 2.0)], vec![square(10.0, 0.0, 1.0)]]);
        assert_close(c[0], (1.0 * 4.0 + 10.5 * 1.0) / 5.0);
    }

    #[test]
    fn degenerate_and_empty_centroids() {
        let line = centroid_of(&[vec![vec![[0.0, 0.0], [4.0, 0.0], [0.0, 0.0]]]]);
        assert_close(line[0], 4.0 / 3.0);
        assert_close(line[1], 0.0);

        let empty = centroid_of(&[]);
        assert!(empty[0].is_nan() && empty[1].is_nan());
    }

    #[test]
    fn projected_feature_carries_bounds_and_outline() {
        let projection = MapProjection::for_viewport(1000.0, 800.0);
        let feature = CountryFeature {
            id: "250".into(),
            name: "France".into(),
            geometry: Geometry::Polygon(vec![square(-5.0, 42.0, 10.0)]),
        };
        let projected = projection.project_feature(&feature);
        let bounds = projected.bounds.unwrap();
        assert_close(projected.base_area, bounds.area());
        assert!(bounds.contains(projected.centroid[0], projected.centroid[1]));
        assert_eq!(projected.outline.len(), 6);
        assert!(matches!(projected.outline[0], PathCommand::MoveTo(..)));
        assert_eq!(projected.outline[5], PathCommand::ClosePath);
    }

    #[test]
    fn svg_path_serializes_commands() {
        let commands = [
            PathCommand::MoveTo(0.0, 1.0),
            PathCommand::LineTo(2.5, 3.0),
            PathCommand::ClosePath,
        ];
        assert_eq!(svg_path(&commands), "M0,1L2.5,3Z");
    }
}
