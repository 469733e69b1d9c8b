use serde::{Deserialize, Serialize};

use crate::data_layers::DataLayers;

/// Top-level dashboard tabs.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Dashboard,
    Migrations,
    ShippingData,
    ConflictZones,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::Dashboard,
        Tab::Migrations,
        Tab::ShippingData,
        Tab::ConflictZones,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Migrations => "Migrations",
            Tab::ShippingData => "Shipping Data",
            Tab::ConflictZones => "Conflict Zones",
        }
    }

    /// Applies this tab's layer preset. Sea temperature is left alone.
    pub fn apply_preset(self, layers: &mut DataLayers) {
        let (routes, lanes, zones) = match self {
            Tab::Dashboard => return,
            Tab::Migrations => (true, false, false),
            Tab::ShippingData => (false, true, false),
            Tab::ConflictZones => (true, true, true),
        };
        layers.migration_routes = routes;
        layers.shipping_lanes = lanes;
        layers.conflict_zones = zones;
    }
}

#[cfg(test)]
mod tests {
    use super::Tab;
    use crate::data_layers::DataLayers;

    #[test]
    fn presets_leave_sea_temperature() {
        let mut layers = DataLayers {
            sea_temperature: true,
            ..DataLayers::default()
        };
        Tab::ShippingData.apply_preset(&mut layers);
        assert!(!layers.migration_routes);
        assert!(layers.shipping_lanes);
        assert!(!layers.conflict_zones);
        assert!(layers.sea_temperature);
    }

    #[test]
    fn dashboard_preset_is_a_no_op() {
        let mut layers = DataLayers::none();
        Tab::Dashboard.apply_preset(&mut layers);
        assert_eq!(layers, DataLayers::none());
    }
}
