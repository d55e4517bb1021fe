//! Greedy collision-avoiding country label placement.
//!
//! Labels are ranked by zoomed screen area; each is accepted only if its
//! rectangle does not touch any previously accepted one.

use std::cmp::Ordering;

use travelmap_shared::countries;

use crate::overlay::display_centroid;
use crate::projection::{MapProjection, ProjectedCountry};
use crate::viewport::ViewportTransform;

/// Minimum zoomed screen area (px²) a country needs to be labelled.
pub const MIN_AREA_THRESHOLD: f64 = 2000.0;
pub const LABEL_PADDING: f64 = 4.0;
const CHAR_WIDTH_RATIO: f64 = 0.55;
const BASE_FONT_SIZE: f64 = 12.0;
const MIN_FONT_SIZE: f64 = 9.0;
const MAX_FONT_SIZE: f64 = 14.0;

/// Per-country label input, fixed for a given projection.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSource {
    pub id: String,
    pub name: String,
    pub centroid: [f64; 2],
    pub base_area: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LabelRect {
    /// Touching edges count as overlap.
    pub fn overlaps(&self, other: &LabelRect) -> bool {
        !(self.x + self.width < other.x
            || other.x + other.width < self.x
            || self.y + self.height < other.y
            || other.y + other.height < self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub id: String,
    pub name: String,
    /// Unzoomed screen centroid.
    pub base_centroid: [f64; 2],
    /// Centroid after the viewport transform.
    pub centroid: [f64; 2],
    pub screen_area: f64,
    pub font_size: f64,
    pub rect: LabelRect,
    pub visible: bool,
}

pub fn label_font_size(scale: f64) -> f64 {
    (BASE_FONT_SIZE / scale.sqrt()).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Build label sources for the projected countries. Countries without
/// metadata or without a finite centroid are dropped.
pub fn prepare_label_sources(
    projected: &[ProjectedCountry],
    projection: &MapProjection,
) -> Vec<LabelSource> {
    projected
        .iter()
        .filter_map(|country| {
            let name = countries::name_for(&country.id)?;
            let centroid = display_centroid(country, projection);
            if !centroid[0].is_finite() || !centroid[1].is_finite() {
                return None;
            }
            Some(LabelSource {
                id: country.id.clone(),
                name: name.to_string(),
                centroid,
                base_area: country.base_area,
            })
        })
        .collect()
}

/// Place labels for one transform. Output is in input order with one entry
/// per source; rejected and culled labels have `visible == false`.
pub fn place_labels(sources: &[LabelSource], transform: &ViewportTransform) -> Vec<LabelPlacement> {
    let scale = transform.scale;
    let font_size = label_font_size(scale);
    let char_width = font_size * CHAR_WIDTH_RATIO;
    let height = font_size + LABEL_PADDING * 2.0;

    let mut placements: Vec<LabelPlacement> = sources
        .iter()
        .map(|source| {
            let centroid = transform.apply(source.centroid);
            let width = source.name.chars().count() as f64 * char_width + LABEL_PADDING * 2.0;
            LabelPlacement {
                id: source.id.clone(),
                name: source.name.clone(),
                base_centroid: source.centroid,
                centroid,
                screen_area: source.base_area * scale * scale,
                font_size,
                rect: LabelRect {
                    x: centroid[0] - width / 2.0,
                    y: centroid[1] - height / 2.0,
                    width,
                    height,
                },
                visible: false,
            }
        })
        .collect();

    let mut ranked: Vec<usize> = (0..placements.len())
        .filter(|&i| placements[i].screen_area > MIN_AREA_THRESHOLD)
        .collect();
    // Stable: equal areas keep input order.
    ranked.sort_by(|&a, &b| {
        placements[b]
            .screen_area
            .partial_cmp(&placements[a].screen_area)
            .unwrap_or(Ordering::Equal)
    });

    let mut accepted: Vec<LabelRect> = Vec::with_capacity(ranked.len());
    for i in ranked {
        let rect = placements[i].rect;
        if accepted.iter().any(|placed| placed.overlaps(&rect)) {
            continue;
        }
        accepted.push(rect);
        placements[i].visible = true;
    }
    placements
}

/// Caches the placements for the last transform so unchanged frames do no
/// layout work.
#[derive(Default)]
pub struct LabelEngine {
    sources: Vec<LabelSource>,
    cached: Option<(ViewportTransform, Vec<LabelPlacement>)>,
    computations: u64,
}

impl LabelEngine {
    pub fn new(sources: Vec<LabelSource>) -> Self {
        Self {
            sources,
            cached: None,
            computations: 0,
        }
    }

    pub fn set_sources(&mut self, sources: Vec<LabelSource>) {
        self.sources = sources;
        self.cached = None;
    }

    pub fn placements(&mut self, transform: &ViewportTransform) -> &[LabelPlacement] {
        let stale = !matches!(&self.cached, Some((t, _)) if t == transform);
        if stale {
            self.computations += 1;
            let placements = place_labels(&self.sources, transform);
            self.cached = Some((*transform, placements));
        }
        match &self.cached {
            Some((_, placements)) => placements,
            None => &[],
        }
    }

    pub fn computations(&self) -> u64 {
        self.computations
    }
}
