use rand::Rng;
use selection::DataKey;
use serde::Serialize;
use sources::TextRelay;

use crate::panel::{Produced, ask_relay, fits};
use crate::prompts::alert_prompt;

pub const MAX_ALERT_CHARS: usize = 100;

/// Alert messages, most urgent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Alerts {
    pub messages: Vec<String>,
}

impl Alerts {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub fn default_alerts<R: Rng>(species: &str, rng: &mut R) -> Alerts {
    let vessels: u32 = rng.gen_range(2..12);
    Alerts {
        messages: vec![
            format!("Critical conflict detected: High concentration of {species} intersecting with shipping lane"),
            "Unusual migration pattern detected in sector C4".to_string(),
            format!("{vessels} vessels entering protected migration corridor"),
            "Increased vessel speed observed in high-density migration area".to_string(),
            "Weather alert: Storm system may impact migration patterns in the next 48 hours".to_string(),
        ],
    }
}

/// Default alerts with the lead alert replaced by the relay's, when short enough.
pub async fn alerts<R: Rng>(relay: &dyn TextRelay, key: &DataKey, rng: &mut R) -> Produced<Alerts> {
    let mut alerts = default_alerts(&key.species_name, rng);
    match ask_relay(relay, alert_prompt(&key.species_name), "alerts").await {
        Some(message) if fits(&message, MAX_ALERT_CHARS) => {
            alerts.messages[0] = message;
            Produced::relay(alerts)
        }
        _ => Produced::fallback(alerts),
    }
}

#[cfg(test)]
mod tests {
    use super::{alerts, default_alerts};
    use crate::panel::Origin;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use selection::DataKey;
    use sources::StaticRelay;

    #[test]
    fn five_defaults_with_species_and_vessel_count() {
        let mut rng = StdRng::seed_from_u64(9);
        let a = default_alerts("Thunnus thynnus", &mut rng);
        assert_eq!(a.len(), 5);
        assert!(a.messages[0].contains("High concentration of Thunnus thynnus"));
        let count: u32 = a.messages[2].split(' ').next().unwrap().parse().unwrap();
        assert!((2..12).contains(&count));
    }

    #[tokio::test]
    async fn relay_replaces_only_the_first_alert() {
        let key = DataKey::new("Thunnus thynnus", None, None);
        let relay = StaticRelay::replying("Tanker on course through tuna aggregation.");
        let out = alerts(&relay, &key, &mut StdRng::seed_from_u64(3)).await;
        assert_eq!(out.origin, Origin::Relay);
        assert_eq!(out.data.messages[0], "Tanker on course through tuna aggregation.");
        assert_eq!(out.data.messages[1], "Unusual migration pattern detected in sector C4");
    }
}
