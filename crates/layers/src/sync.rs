use std::collections::BTreeMap;

use selection::data_layers::{DataLayers, LayerKey};
use serde::Serialize;
use sources::series::CoordinateSeries;
use tracing::debug;

use crate::engine::{EngineError, MapEngine};
use crate::layer::{Overlay, OverlayId, Shape};
use crate::symbology::LayerStyle;
use crate::zones::ConflictZone;

/// The latest series the renderer draws from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInputs {
    pub migration: CoordinateSeries,
    pub shipping: CoordinateSeries,
    /// No upstream source serves temperatures yet; stays empty unless a
    /// caller supplies samples.
    pub sea_temperature: CoordinateSeries,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Overlays that make up `layer` for the given inputs. Empty means hidden.
pub fn overlays_for(layer: LayerKey, inputs: &RenderInputs, zones: &[ConflictZone]) -> Vec<Overlay> {
    match layer {
        LayerKey::MigrationRoutes => {
            let series = &inputs.migration;
            if series.is_empty() {
                return Vec::new();
            }
            let mut out = Vec::with_capacity(series.len() + 1);
            if series.len() >= 2 {
                out.push(Overlay::new(
                    layer,
                    Shape::Polyline {
                        points: series.points.clone(),
                    },
                    LayerStyle::migration_path(),
                ));
            }
            out.extend(series.points.iter().map(|p| {
                Overlay::new(
                    layer,
                    Shape::Marker {
                        at: *p,
                        radius_px: 6.0,
                    },
                    LayerStyle::migration_point(),
                )
            }));
            out
        }
        LayerKey::ShippingLanes => {
            let series = &inputs.shipping;
            match series.points.as_slice() {
                _ if series.is_empty() => Vec::new(),
                [only] => vec![Overlay::new(
                    layer,
                    Shape::Marker {
                        at: *only,
                        radius_px: 4.0,
                    },
                    LayerStyle::shipping_lane(),
                )],
                points => vec![Overlay::new(
                    layer,
                    Shape::Polyline {
                        points: points.to_vec(),
                    },
                    LayerStyle::shipping_lane(),
                )],
            }
        }
        LayerKey::ConflictZones => zones
            .iter()
            .flat_map(|zone| {
                [
                    Overlay::new(
                        layer,
                        Shape::Circle {
                            center: zone.center(),
                            radius_m: zone.radius_m,
                        },
                        LayerStyle::conflict_zone(),
                    ),
                    Overlay::new(
                        layer,
                        Shape::Label {
                            at: zone.center(),
                            text: zone.caption(),
                        },
                        LayerStyle::zone_label(),
                    ),
                ]
            })
            .collect(),
        LayerKey::SeaTemperature => inputs
            .sea_temperature
            .points
            .iter()
            .map(|p| {
                Overlay::new(
                    layer,
                    Shape::Marker {
                        at: *p,
                        radius_px: 10.0,
                    },
                    LayerStyle::sea_temperature(),
                )
            })
            .collect(),
    }
}

#[derive(Debug, Clone)]
struct Applied {
    overlays: Vec<Overlay>,
    ids: Vec<OverlayId>,
}

/// Reconciles layer flags and series with what an engine currently shows.
///
/// A layer is visible iff its flag is on and it has something to draw.
/// Re-running with unchanged inputs adds and removes nothing.
#[derive(Debug, Default)]
pub struct LayerSync {
    applied: BTreeMap<LayerKey, Applied>,
}

impl LayerSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(
        &mut self,
        engine: &mut dyn MapEngine,
        layers: DataLayers,
        inputs: &RenderInputs,
        zones: &[ConflictZone],
    ) -> Result<SyncReport, EngineError> {
        let mut report = SyncReport::default();
        for key in LayerKey::ALL {
            let desired = if layers.get(key) {
                overlays_for(key, inputs, zones)
            } else {
                Vec::new()
            };
            let current = self.applied.get(&key);
            if current.map(|a| a.overlays == desired).unwrap_or(desired.is_empty()) {
                continue;
            }
            if let Some(old) = self.applied.remove(&key) {
                for id in old.ids {
                    if engine.remove_overlay(id) {
                        report.removed += 1;
                    }
                }
            }
            if desired.is_empty() {
                debug!(layer = %key, "layer hidden");
                continue;
            }
            let mut ids = Vec::with_capacity(desired.len());
            for overlay in &desired {
                match engine.add_overlay(overlay.clone()) {
                    Ok(id) => ids.push(id),
                    Err(e) => {
                        for id in ids {
                            engine.remove_overlay(id);
                        }
                        return Err(e);
                    }
                }
            }
            report.added += ids.len();
            debug!(layer = %key, overlays = ids.len(), "layer shown");
            self.applied.insert(
                key,
                Applied {
                    overlays: desired,
                    ids,
                },
            );
        }
        Ok(report)
    }

    pub fn is_visible(&self, key: LayerKey) -> bool {
        self.applied.contains_key(&key)
    }

    pub fn visible_layers(&self) -> Vec<LayerKey> {
        self.applied.keys().copied().collect()
    }

    pub fn overlay_count(&self, key: LayerKey) -> usize {
        self.applied.get(&key).map(|a| a.ids.len()).unwrap_or(0)
    }

    /// Forgets applied state without touching any engine; used after the
    /// engine that held the overlays was destroyed.
    pub fn reset(&mut self) {
        self.applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerSync, RenderInputs};
    use crate::canvas::CanvasEngine;
    use crate::engine::MapEngine;
    use crate::zones::conflict_zones;
    use foundation::geo::GeoPoint;
    use pretty_assertions::assert_eq;
    use selection::data_layers::{DataLayers, LayerKey};
    use sources::series::CoordinateSeries;

    fn inputs() -> RenderInputs {
        RenderInputs {
            migration: CoordinateSeries::from_points(vec![
                GeoPoint::new(-70.0, 40.0),
                GeoPoint::new(-68.0, 42.0),
                GeoPoint::new(-66.0, 44.0),
            ]),
            shipping: CoordinateSeries::from_points(vec![
                GeoPoint::new(-72.0, 39.0),
                GeoPoint::new(-65.0, 41.0),
            ]),
            sea_temperature: CoordinateSeries::no_data(),
        }
    }

    #[test]
    fn second_sync_with_same_inputs_is_a_noop() {
        let mut engine = CanvasEngine::new(800.0, 600.0);
        let mut sync = LayerSync::new();
        let zones = conflict_zones();
        let first = sync
            .sync(&mut engine, DataLayers::default(), &inputs(), &zones)
            .unwrap();
        // 1 path + 3 markers, 1 lane, 2 zones with labels.
        assert_eq!(first.added, 4 + 1 + 4);
        let count = engine.overlay_count();
        let second = sync
            .sync(&mut engine, DataLayers::default(), &inputs(), &zones)
            .unwrap();
        assert!(second.is_noop());
        assert_eq!(engine.overlay_count(), count);
    }

    #[test]
    fn flag_off_or_empty_series_hides_layer() {
        let mut engine = CanvasEngine::new(800.0, 600.0);
        let mut sync = LayerSync::new();
        let zones = conflict_zones();
        sync.sync(&mut engine, DataLayers::default(), &inputs(), &zones)
            .unwrap();

        let mut layers = DataLayers::default();
        layers.toggle(LayerKey::ShippingLanes);
        let report = sync.sync(&mut engine, layers, &inputs(), &zones).unwrap();
        assert_eq!(report.removed, 1);
        assert!(!sync.is_visible(LayerKey::ShippingLanes));

        let mut empty = inputs();
        empty.migration = CoordinateSeries::no_data();
        sync.sync(&mut engine, layers, &empty, &zones).unwrap();
        assert!(!sync.is_visible(LayerKey::MigrationRoutes));
        assert_eq!(sync.visible_layers(), vec![LayerKey::ConflictZones]);
        assert_eq!(engine.overlay_count(), 4);
    }

    #[test]
    fn sea_temperature_needs_samples() {
        let mut engine = CanvasEngine::new(800.0, 600.0);
        let mut sync = LayerSync::new();
        let mut layers = DataLayers::none();
        layers.sea_temperature = true;
        sync.sync(&mut engine, layers, &inputs(), &[]).unwrap();
        assert!(!sync.is_visible(LayerKey::SeaTemperature));

        let mut with_samples = inputs();
        with_samples.sea_temperature = CoordinateSeries::from_points(vec![GeoPoint::new(-60.0, 40.0)]);
        sync.sync(&mut engine, layers, &with_samples, &[]).unwrap();
        assert_eq!(sync.overlay_count(LayerKey::SeaTemperature), 1);
    }

    #[test]
    fn changed_series_replaces_overlays() {
        let mut engine = CanvasEngine::new(800.0, 600.0);
        let mut sync = LayerSync::new();
        let mut layers = DataLayers::none();
        layers.migration_routes = true;
        sync.sync(&mut engine, layers, &inputs(), &[]).unwrap();

        let mut next = inputs();
        next.migration = CoordinateSeries::from_points(vec![GeoPoint::new(-50.0, 50.0)]);
        let report = sync.sync(&mut engine, layers, &next, &[]).unwrap();
        assert_eq!(report.removed, 4);
        assert_eq!(report.added, 1);
        assert_eq!(engine.overlay_count(), 1);
    }
}
