//! TopoJSON decoding for the base map.
//!
//! Only the subset used by country boundary datasets is supported: a named
//! object holding a `GeometryCollection` of `Polygon` / `MultiPolygon`
//! geometries referencing shared, optionally quantized arcs.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{CountryFeature, Geometry, LonLat, Polygon, Ring};

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("invalid topology json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("topology has no object named {0:?}")]
    MissingObject(String),
    #[error("arc index {index} out of range ({len} arcs)")]
    ArcOutOfRange { index: i64, len: usize },
    #[error("malformed arcs for geometry {id:?}")]
    MalformedArcs { id: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<TopologyTransform>,
    pub objects: HashMap<String, TopologyGeometry>,
    pub arcs: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TopologyTransform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyGeometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub properties: Option<GeometryProperties>,
    #[serde(default)]
    pub arcs: serde_json::Value,
    #[serde(default)]
    pub geometries: Vec<TopologyGeometry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeometryProperties {
    #[serde(default)]
    pub name: Option<String>,
}

impl TopologyGeometry {
    /// ISO numeric ids are three-digit strings; bare numbers get zero-padded.
    fn feature_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => n.as_u64().map(|n| format!("{n:03}")),
            _ => None,
        }
    }
}

/// Parse a TopoJSON document and decode the named object into features.
pub fn decode_features(json: &str, object: &str) -> Result<Vec<CountryFeature>, TopologyError> {
    let topology: Topology = serde_json::from_str(json)?;
    topology.features(object)
}

impl Topology {
    /// Decode every polygonal geometry under `object`. Geometries without an
    /// id or with a non-polygonal type are skipped.
    pub fn features(&self, object: &str) -> Result<Vec<CountryFeature>, TopologyError> {
        let root = self
            .objects
            .get(object)
            .ok_or_else(|| TopologyError::MissingObject(object.to_string()))?;

        let arcs = self.decoded_arcs();
        let members: Vec<&TopologyGeometry> = if root.kind.as_deref() == Some("GeometryCollection") {
            root.geometries.iter().collect()
        } else {
            vec![root]
        };

        let mut features = Vec::with_capacity(members.len());
        for member in members {
            let Some(id) = member.feature_id() else {
                continue;
            };
            let geometry = match member.kind.as_deref() {
                Some("Polygon") => {
                    let refs: Vec<Vec<i64>> = serde_json::from_value(member.arcs.clone())
                        .map_err(|_| TopologyError::MalformedArcs { id: id.clone() })?;
                    Geometry::Polygon(polygon(&arcs, &refs)?)
                }
                Some("MultiPolygon") => {
                    let refs: Vec<Vec<Vec<i64>>> = serde_json::from_value(member.arcs.clone())
                        .map_err(|_| TopologyError::MalformedArcs { id: id.clone() })?;
                    let parts = refs
                        .iter()
                        .map(|part| polygon(&arcs, part))
                        .collect::<Result<Vec<_>, _>>()?;
                    Geometry::MultiPolygon(parts)
                }
                _ => continue,
            };
            let name = member
                .properties
                .as_ref()
                .and_then(|p| p.name.clone())
                .unwrap_or_default();
            features.push(CountryFeature { id, name, geometry });
        }
        Ok(features)
    }

    /// Absolute coordinates for every arc, undoing delta quantization.
    fn decoded_arcs(&self) -> Vec<Vec<LonLat>> {
        self.arcs
            .iter()
            .map(|arc| {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .filter(|position| position.len() >= 2)
                    .map(|position| match self.transform {
                        Some(t) => {
                            x += position[0];
                            y += position[1];
                            [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                        }
                        None => [position[0], position[1]],
                    })
                    .collect()
            })
            .collect()
    }
}

fn polygon(arcs: &[Vec<LonLat>], rings: &[Vec<i64>]) -> Result<Polygon, TopologyError> {
    rings.iter().map(|refs| ring(arcs, refs)).collect()
}

/// Stitch arcs end to end. Consecutive arcs share their joint vertex, so the
/// last point is dropped before appending the next arc.
fn ring(arcs: &[Vec<LonLat>], refs: &[i64]) -> Result<Ring, TopologyError> {
    let mut points: Ring = Vec::new();
    for &index in refs {
        let resolved = if index < 0 { !index } else { index };
        let arc = usize::try_from(resolved)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(TopologyError::ArcOutOfRange {
                index,
                len: arcs.len(),
            })?;
        points.pop();
        if index < 0 {
            points.extend(arc.iter().rev());
        } else {
            points.extend(arc.iter());
        }
    }
    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two unit squares sharing the edge x = 1. Arc 1 is the shared edge,
    // traversed reversed by the left square and forward by the right one.
    const SHARED_EDGE: &str = r#"{
        "type": "Topology",
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": "001", "properties": {"name": "Left"}, "arcs": [[0, -2]]},
                    {"type": "Polygon", "id": 2, "properties": {"name": "Right"}, "arcs": [[2, 1]]},
                    {"type": "Polygon", "properties": {"name": "Nameless"}, "arcs": [[0, 1]]},
                    {"type": null, "id": "003"}
                ]
            }
        },
        "arcs": [
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 1], [1, 0]],
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        ]
    }"#;

    #[test]
    fn stitches_arcs_and_reverses_negative_indexes() {
        let features = decode_features(SHARED_EDGE, "countries").unwrap();
        assert_eq!(features.len(), 2);

        let left = &features[0];
        assert_eq!(left.id, "001");
        assert_eq!(left.name, "Left");
        let Geometry::Polygon(rings) = &left.geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![[1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]
        );

        let right = &features[1];
        assert_eq!(right.id, "002");
        let Geometry::Polygon(rings) = &right.geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 0.0]]
        );
    }

    #[test]
    fn delta_decodes_quantized_arcs() {
        let json = r#"{
            "type": "Topology",
            "transform": {"scale": [0.5, 2.0], "translate": [-10.0, 5.0]},
            "objects": {
                "countries": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "MultiPolygon", "id": "250", "arcs": [[[0]]]}
                    ]
                }
            },
            "arcs": [[[0, 0], [4, 0], [0, 2], [-4, -2]]]
        }"#;
        let features = decode_features(json, "countries").unwrap();
        let Geometry::MultiPolygon(parts) = &features[0].geometry else {
            panic!("expected multipolygon");
        };
        assert_eq!(
            parts[0][0],
            vec![[-10.0, 5.0], [-8.0, 5.0], [-8.0, 9.0], [-10.0, 5.0]]
        );
        assert_eq!(features[0].name, "");
    }

    #[test]
    fn missing_object_is_an_error() {
        let err = decode_features(SHARED_EDGE, "land").unwrap_err();
        assert!(matches!(err, TopologyError::MissingObject(name) if name == "land"));
    }

    #[test]
    fn out_of_range_arc_is_an_error() {
        let json = r#"{
            "type": "Topology",
            "objects": {"countries": {"type": "Polygon", "id": "004", "arcs": [[5]]}},
            "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]]
        }"#;
        let err = decode_features(json, "countries").unwrap_err();
        assert!(matches!(err, TopologyError::ArcOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(
            decode_features("{not json", "countries"),
            Err(TopologyError::Json(_))
        ));
    }
}
