use crate::projection::{ProjectedCountry, ScreenBounds};

const GRID_COLS: usize = 64;
const GRID_ROWS: usize = 32;

/// A flat 2D spatial grid over unzoomed screen space for country hit-testing.
/// Rebuilt only when the projection changes (base map load or resize).
pub struct SpatialGrid {
    cells: Vec<Vec<usize>>,
    bounds: Vec<ScreenBounds>,
    min_x: f64,
    min_y: f64,
    cell_w: f64,
    cell_h: f64,
}

impl SpatialGrid {
    pub fn build(countries: &[ProjectedCountry]) -> Self {
        let mut extent: Option<ScreenBounds> = None;
        for b in countries.iter().filter_map(|c| c.bounds) {
            extent = Some(match extent {
                Some(e) => ScreenBounds {
                    min_x: e.min_x.min(b.min_x),
                    min_y: e.min_y.min(b.min_y),
                    max_x: e.max_x.max(b.max_x),
                    max_y: e.max_y.max(b.max_y),
                },
                None => b,
            });
        }
        let Some(extent) = extent else {
            return Self {
                cells: Vec::new(),
                bounds: Vec::new(),
                min_x: 0.0,
                min_y: 0.0,
                cell_w: 1.0,
                cell_h: 1.0,
            };
        };

        // Pad so points on the outer edge still land inside the grid.
        let min_x = extent.min_x - 1.0;
        let min_y = extent.min_y - 1.0;
        let cell_w = (extent.max_x + 1.0 - min_x) / GRID_COLS as f64;
        let cell_h = (extent.max_y + 1.0 - min_y) / GRID_ROWS as f64;

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        let mut bounds = Vec::with_capacity(countries.len());
        for (idx, country) in countries.iter().enumerate() {
            let Some(b) = country.bounds else {
                bounds.push(ScreenBounds {
                    min_x: f64::NAN,
                    min_y: f64::NAN,
                    max_x: f64::NAN,
                    max_y: f64::NAN,
                });
                continue;
            };
            bounds.push(b);

            let col_start = ((b.min_x - min_x) / cell_w).floor().max(0.0) as usize;
            let col_end = ((b.max_x - min_x) / cell_w).ceil().min(GRID_COLS as f64) as usize;
            let row_start = ((b.min_y - min_y) / cell_h).floor().max(0.0) as usize;
            let row_end = ((b.max_y - min_y) / cell_h).ceil().min(GRID_ROWS as f64) as usize;

            for row in row_start..row_end.max(row_start + 1).min(GRID_ROWS) {
                for col in col_start..col_end.max(col_start + 1).min(GRID_COLS) {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            cells,
            bounds,
            min_x,
            min_y,
            cell_w,
            cell_h,
        }
    }

    /// Index of the country containing an unzoomed screen point, if any.
    /// `countries` must be the slice the grid was built from.
    pub fn find_at(&self, countries: &[ProjectedCountry], x: f64, y: f64) -> Option<usize> {
        if self.cells.is_empty() || !x.is_finite() || !y.is_finite() {
            return None;
        }

        let col = ((x - self.min_x) / self.cell_w).floor() as isize;
        let row = ((y - self.min_y) / self.cell_h).floor() as isize;
        if col < 0 || row < 0 || col >= GRID_COLS as isize || row >= GRID_ROWS as isize {
            return None;
        }

        let cell = &self.cells[row as usize * GRID_COLS + col as usize];
        cell.iter().copied().find(|&idx| {
            self.bounds[idx].contains(x, y)
                && countries
                    .get(idx)
                    .is_some_and(|country| contains_point(&country.polygons, x, y))
        })
    }
}

/// Even-odd point-in-polygon test across every ring, so holes exclude.
pub fn contains_point(polygons: &[Vec<Vec<[f64; 2]>>], x: f64, y: f64) -> bool {
    let mut inside = false;
    for ring in polygons.iter().flatten() {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let [xi, yi] = ring[i];
            let [xj, yj] = ring[j];
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country(id: &str, rings: Vec<Vec<[f64; 2]>>) -> ProjectedCountry {
        let mut bounds: Option<ScreenBounds> = None;
        for &[x, y] in rings.iter().flatten() {
            let b = bounds.get_or_insert(ScreenBounds {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            });
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        ProjectedCountry {
            id: id.into(),
            polygons: vec![rings],
            outline: Vec::new(),
            centroid: [0.0, 0.0],
            base_area: bounds.map_or(0.0, |b| b.area()),
            bounds,
        }
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<[f64; 2]> {
        vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size]]
    }

    #[test]
    fn finds_country_under_point() {
        let countries = vec![
            country("a", vec![square(0.0, 0.0, 100.0)]),
            country("b", vec![square(200.0, 50.0, 50.0)]),
        ];
        let grid = SpatialGrid::build(&countries);
        assert_eq!(grid.find_at(&countries, 10.0, 10.0), Some(0));
        assert_eq!(grid.find_at(&countries, 225.0, 75.0), Some(1));
        assert_eq!(grid.find_at(&countries, 150.0, 75.0), None);
        assert_eq!(grid.find_at(&countries, -500.0, 0.0), None);
    }

    #[test]
    fn holes_are_not_hits() {
        let countries = vec![
            country("outer", vec![square(0.0, 0.0, 100.0), square(40.0, 40.0, 20.0)]),
            country("enclave", vec![square(40.0, 40.0, 20.0)]),
        ];
        let grid = SpatialGrid::build(&countries);
        assert_eq!(grid.find_at(&countries, 10.0, 10.0), Some(0));
        assert_eq!(grid.find_at(&countries, 50.0, 50.0), Some(1));
    }

    #[test]
    fn bounding_box_alone_is_not_a_hit() {
        let triangle = vec![[0.0, 0.0], [100.0, 0.0], [0.0, 100.0]];
        let countries = vec![country("t", vec![triangle])];
        let grid = SpatialGrid::build(&countries);
        assert_eq!(grid.find_at(&countries, 10.0, 10.0), Some(0));
        assert_eq!(grid.find_at(&countries, 90.0, 90.0), None);
    }

    #[test]
    fn empty_grid_finds_nothing() {
        let grid = SpatialGrid::build(&[]);
        assert_eq!(grid.find_at(&[], 0.0, 0.0), None);
    }
}
