use serde::Serialize;

use crate::engine::ScreenPoint;
use crate::zones::ConflictZone;

pub const INFO_CARD_TITLE: &str = "Conflict Zone Analysis";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeRoute {
    pub distance: &'static str,
    pub risk_reduction: &'static str,
    pub time_impact: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonePayload {
    pub risk_level: &'static str,
    pub risk_percentage: u8,
    pub vessel_count: u32,
    pub recommended_action: &'static str,
    pub alternative_route: AlternativeRoute,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelTone {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLabel {
    pub id: &'static str,
    pub text: &'static str,
    pub position: ScreenPoint,
    pub tone: LabelTone,
}

/// Popup describing a clicked conflict zone. At most one is open.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoCard {
    pub title: &'static str,
    pub species: String,
    pub zone_index: usize,
    pub screen_position: ScreenPoint,
    pub payload: ZonePayload,
    pub labels: Vec<MapLabel>,
}

impl InfoCard {
    pub fn for_zone(zone_index: usize, zone: &ConflictZone, species: &str, at: ScreenPoint) -> Self {
        Self {
            title: INFO_CARD_TITLE,
            species: species.to_string(),
            zone_index,
            screen_position: at,
            payload: ZonePayload {
                risk_level: zone.risk_label,
                risk_percentage: zone.risk_percent,
                vessel_count: 247,
                recommended_action: "Seasonal speed restriction",
                alternative_route: AlternativeRoute {
                    distance: "+42 km (+8%)",
                    risk_reduction: "65%",
                    time_impact: "+2.5 hours",
                },
            },
            labels: vec![
                MapLabel {
                    id: "risk-label-1",
                    text: "High whale density",
                    position: at.offset(-100.0, -50.0),
                    tone: LabelTone::Info,
                },
                MapLabel {
                    id: "risk-label-2",
                    text: "Recommended detour",
                    position: at.offset(100.0, -30.0),
                    tone: LabelTone::Success,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{INFO_CARD_TITLE, InfoCard, LabelTone};
    use crate::engine::ScreenPoint;
    use crate::zones::conflict_zones;

    #[test]
    fn card_carries_zone_risk_and_offset_labels() {
        let zones = conflict_zones();
        let card = InfoCard::for_zone(1, &zones[1], "Gadus morhua", ScreenPoint::new(300.0, 200.0));
        assert_eq!(card.title, INFO_CARD_TITLE);
        assert_eq!(card.payload.risk_level, "Medium");
        assert_eq!(card.payload.risk_percentage, 62);
        assert_eq!(card.labels[0].position, ScreenPoint::new(200.0, 150.0));
        assert_eq!(card.labels[1].position, ScreenPoint::new(400.0, 170.0));
        assert_eq!(card.labels[1].tone, LabelTone::Success);
    }
}
