use serde::{Deserialize, Serialize};

/// `[longitude, latitude]` in degrees.
pub type LonLat = [f64; 2];
pub type Ring = Vec<LonLat>;
/// Outer ring first, holes after.
pub type Polygon = Vec<Ring>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
            Geometry::MultiPolygon(polygons) => polygons,
        }
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons().iter().flat_map(|polygon| polygon.iter())
    }

    pub fn vertex_count(&self) -> usize {
        self.rings().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }
}

/// One country boundary from the base map, keyed by ISO numeric code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryFeature {
    pub id: String,
    pub name: String,
    pub geometry: Geometry,
}
