use std::collections::BTreeMap;

use foundation::geo::GeoPoint;
use selection::data_layers::LayerKey;
use serde::Serialize;

use crate::symbology::LayerStyle;

/// Engine-assigned handle for one visual element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OverlayId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Shape {
    Marker { at: GeoPoint, radius_px: f64 },
    Polyline { points: Vec<GeoPoint> },
    Circle { center: GeoPoint, radius_m: f64 },
    Label { at: GeoPoint, text: String },
}

/// A visual element belonging to one data layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub layer: LayerKey,
    pub shape: Shape,
    pub style: LayerStyle,
}

impl Overlay {
    pub fn new(layer: LayerKey, shape: Shape, style: LayerStyle) -> Self {
        Self {
            layer,
            shape,
            style,
        }
    }
}

/// Id-keyed overlay storage shared by the built-in engines.
///
/// Iteration is in insertion order (ids are monotonic).
#[derive(Debug, Default, Clone)]
pub struct OverlayStore {
    next_id: u64,
    items: BTreeMap<OverlayId, Overlay>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, overlay: Overlay) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, overlay);
        id
    }

    pub fn remove(&mut self, id: OverlayId) -> bool {
        self.items.remove(&id).is_some()
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (OverlayId, &Overlay)> + '_ {
        self.items.iter().map(|(id, o)| (*id, o))
    }

    pub fn count_layer(&self, layer: LayerKey) -> usize {
        self.items.values().filter(|o| o.layer == layer).count()
    }
}

#[cfg(test)]
mod tests {
    use super::{Overlay, OverlayStore, Shape};
    use crate::symbology::LayerStyle;
    use foundation::geo::GeoPoint;
    use selection::data_layers::LayerKey;

    #[test]
    fn ids_are_never_reused() {
        let mut store = OverlayStore::new();
        let marker = Overlay::new(
            LayerKey::MigrationRoutes,
            Shape::Marker {
                at: GeoPoint::new(0.0, 0.0),
                radius_px: 6.0,
            },
            LayerStyle::migration_point(),
        );
        let a = store.insert(marker.clone());
        assert!(store.remove(a));
        let b = store.insert(marker);
        assert_ne!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.count_layer(LayerKey::MigrationRoutes), 1);
        assert_eq!(store.count_layer(LayerKey::ShippingLanes), 0);
    }
}
