use serde::{Deserialize, Serialize};

/// One of the four toggleable overlay layers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKey {
    MigrationRoutes,
    ShippingLanes,
    ConflictZones,
    SeaTemperature,
}

impl LayerKey {
    pub const ALL: [LayerKey; 4] = [
        LayerKey::MigrationRoutes,
        LayerKey::ShippingLanes,
        LayerKey::ConflictZones,
        LayerKey::SeaTemperature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKey::MigrationRoutes => "migrationRoutes",
            LayerKey::ShippingLanes => "shippingLanes",
            LayerKey::ConflictZones => "conflictZones",
            LayerKey::SeaTemperature => "seaTemperature",
        }
    }
}

impl std::fmt::Display for LayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLayerKeyError {
    pub input: String,
}

impl std::fmt::Display for ParseLayerKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown layer '{}'", self.input)
    }
}

impl std::error::Error for ParseLayerKeyError {}

impl std::str::FromStr for LayerKey {
    type Err = ParseLayerKeyError;

    /// Accepts the camelCase wire names and their kebab-case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "migrationRoutes" | "migration-routes" | "routes" => Ok(LayerKey::MigrationRoutes),
            "shippingLanes" | "shipping-lanes" | "lanes" => Ok(LayerKey::ShippingLanes),
            "conflictZones" | "conflict-zones" | "zones" => Ok(LayerKey::ConflictZones),
            "seaTemperature" | "sea-temperature" => Ok(LayerKey::SeaTemperature),
            other => Err(ParseLayerKeyError {
                input: other.to_string(),
            }),
        }
    }
}

/// Per-layer render flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLayers {
    pub migration_routes: bool,
    pub shipping_lanes: bool,
    pub conflict_zones: bool,
    pub sea_temperature: bool,
}

impl Default for DataLayers {
    fn default() -> Self {
        Self {
            migration_routes: true,
            shipping_lanes: true,
            conflict_zones: true,
            sea_temperature: false,
        }
    }
}

impl DataLayers {
    pub fn none() -> Self {
        Self {
            migration_routes: false,
            shipping_lanes: false,
            conflict_zones: false,
            sea_temperature: false,
        }
    }

    pub fn get(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::MigrationRoutes => self.migration_routes,
            LayerKey::ShippingLanes => self.shipping_lanes,
            LayerKey::ConflictZones => self.conflict_zones,
            LayerKey::SeaTemperature => self.sea_temperature,
        }
    }

    pub fn set(&mut self, key: LayerKey, on: bool) {
        let slot = match key {
            LayerKey::MigrationRoutes => &mut self.migration_routes,
            LayerKey::ShippingLanes => &mut self.shipping_lanes,
            LayerKey::ConflictZones => &mut self.conflict_zones,
            LayerKey::SeaTemperature => &mut self.sea_temperature,
        };
        *slot = on;
    }

    /// Flips `key` and returns the new value.
    pub fn toggle(&mut self, key: LayerKey) -> bool {
        let on = !self.get(key);
        self.set(key, on);
        on
    }

    pub fn enabled(&self) -> impl Iterator<Item = LayerKey> + '_ {
        LayerKey::ALL.into_iter().filter(|k| self.get(*k))
    }
}
