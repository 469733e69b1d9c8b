//! Self-contained fallback renderer.
//!
//! `CanvasEngine` needs no external script or GPU context: it keeps its
//! overlays in memory and renders them into a flat display list using an
//! equirectangular projection of a fixed viewport.

use std::collections::BTreeMap;

use foundation::bounds::GeoBounds;
use foundation::geo::{GeoPoint, KM_PER_DEGREE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runtime::frame::Frame;
use selection::data_layers::LayerKey;
use serde::Serialize;

use crate::engine::{EngineError, EngineKind, MapEngine, Readiness, ScreenPoint};
use crate::layer::{Overlay, OverlayId, OverlayStore, Shape};
use crate::symbology::{BACKGROUND, CYAN, GRID, LayerStyle, WHITE};

pub const GRID_SPACING_PX: f64 = 50.0;
pub const PARTICLE_COUNT: usize = 10;
const PARTICLE_RADIUS_PX: f64 = 4.0;

/// North-west Atlantic, where the demo data lives.
pub fn default_view() -> GeoBounds {
    GeoBounds::new(GeoPoint::new(-90.0, 25.0), GeoPoint::new(-50.0, 55.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Fill {
        color: &'static str,
    },
    Line {
        from: ScreenPoint,
        to: ScreenPoint,
        color: &'static str,
    },
    Path {
        points: Vec<ScreenPoint>,
        style: LayerStyle,
    },
    Circle {
        center: ScreenPoint,
        radius_px: f64,
        style: LayerStyle,
    },
    Text {
        at: ScreenPoint,
        text: String,
        style: LayerStyle,
    },
}

impl DrawCommand {
    fn op(&self) -> &'static str {
        match self {
            DrawCommand::Fill { .. } => "fill",
            DrawCommand::Line { .. } => "line",
            DrawCommand::Path { .. } => "path",
            DrawCommand::Circle { .. } => "circle",
            DrawCommand::Text { .. } => "text",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayList {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    /// Command counts by op name.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for cmd in &self.commands {
            *counts.entry(cmd.op()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Particle {
    progress: f64,
    speed: f64,
}

pub struct CanvasEngine {
    width: f64,
    height: f64,
    view: GeoBounds,
    overlays: OverlayStore,
    particles: Vec<Particle>,
    destroyed: bool,
}

impl CanvasEngine {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_seed(width, height, 0x6d77)
    }

    pub fn with_seed(width: f64, height: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = (0..PARTICLE_COUNT)
            .map(|_| Particle {
                progress: rng.gen_range(0.0..1.0),
                speed: 0.001 + rng.gen_range(0.0..0.002),
            })
            .collect();
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            view: default_view(),
            overlays: OverlayStore::new(),
            particles,
            destroyed: false,
        }
    }

    pub fn with_view(mut self, view: GeoBounds) -> Self {
        self.view = view;
        self
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    fn px_per_degree(&self) -> f64 {
        self.width / self.view.width().max(f64::EPSILON)
    }

    fn migration_path(&self) -> Option<&[GeoPoint]> {
        self.overlays.iter().find_map(|(_, o)| match (&o.layer, &o.shape) {
            (LayerKey::MigrationRoutes, Shape::Polyline { points }) => Some(points.as_slice()),
            _ => None,
        })
    }

    /// Position `progress` (0..1) of the way along `path`, by vertex index.
    fn along(&self, path: &[GeoPoint], progress: f64) -> ScreenPoint {
        let segments = (path.len() - 1) as f64;
        let scaled = progress * segments;
        let idx = (scaled.floor() as usize).min(path.len() - 1);
        let t = scaled - idx as f64;
        let start = path[idx];
        let end = path[(idx + 1).min(path.len() - 1)];
        self.project(GeoPoint::new(
            start.lon + (end.lon - start.lon) * t,
            start.lat + (end.lat - start.lat) * t,
        ))
    }

    pub fn render(&self) -> DisplayList {
        let mut commands = vec![DrawCommand::Fill { color: BACKGROUND }];
        if self.destroyed {
            return DisplayList {
                width: self.width,
                height: self.height,
                commands,
            };
        }

        let mut x = 0.0;
        while x <= self.width {
            commands.push(DrawCommand::Line {
                from: ScreenPoint::new(x, 0.0),
                to: ScreenPoint::new(x, self.height),
                color: GRID,
            });
            x += GRID_SPACING_PX;
        }
        let mut y = 0.0;
        while y <= self.height {
            commands.push(DrawCommand::Line {
                from: ScreenPoint::new(0.0, y),
                to: ScreenPoint::new(self.width, y),
                color: GRID,
            });
            y += GRID_SPACING_PX;
        }

        for (_, overlay) in self.overlays.iter() {
            commands.push(self.draw(overlay));
        }

        if let Some(path) = self.migration_path().filter(|p| p.len() >= 2) {
            let style = LayerStyle::new(WHITE, 1.0).filled(CYAN, 1.0);
            for particle in &self.particles {
                commands.push(DrawCommand::Circle {
                    center: self.along(path, particle.progress),
                    radius_px: PARTICLE_RADIUS_PX,
                    style,
                });
            }
        }

        DisplayList {
            width: self.width,
            height: self.height,
            commands,
        }
    }

    fn draw(&self, overlay: &Overlay) -> DrawCommand {
        let style = overlay.style;
        match &overlay.shape {
            Shape::Marker { at, radius_px } => DrawCommand::Circle {
                center: self.project(*at),
                radius_px: *radius_px,
                style,
            },
            Shape::Polyline { points } => DrawCommand::Path {
                points: points.iter().map(|p| self.project(*p)).collect(),
                style,
            },
            Shape::Circle { center, radius_m } => DrawCommand::Circle {
                center: self.project(*center),
                radius_px: radius_m / 1_000.0 / KM_PER_DEGREE * self.px_per_degree(),
                style,
            },
            Shape::Label { at, text } => DrawCommand::Text {
                at: self.project(*at),
                text: text.clone(),
                style,
            },
        }
    }
}

impl MapEngine for CanvasEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Canvas
    }

    fn poll_ready(&mut self) -> Readiness {
        if self.destroyed {
            Readiness::Failed("canvas destroyed".to_string())
        } else {
            Readiness::Ready
        }
    }

    fn add_overlay(&mut self, overlay: Overlay) -> Result<OverlayId, EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        Ok(self.overlays.insert(overlay))
    }

    fn remove_overlay(&mut self, id: OverlayId) -> bool {
        self.overlays.remove(id)
    }

    fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn project(&self, at: GeoPoint) -> ScreenPoint {
        let x = (at.lon - self.view.min.lon) / self.view.width().max(f64::EPSILON) * self.width;
        let y = (self.view.max.lat - at.lat) / self.view.height().max(f64::EPSILON) * self.height;
        ScreenPoint::new(x, y)
    }

    fn on_frame(&mut self, _frame: Frame) {
        for particle in &mut self.particles {
            particle.progress += particle.speed;
            if particle.progress >= 1.0 {
                particle.progress = 0.0;
            }
        }
    }

    fn display_list(&self) -> Option<DisplayList> {
        Some(self.render())
    }

    fn destroy(&mut self) {
        self.overlays.clear();
        self.destroyed = true;
    }
}
