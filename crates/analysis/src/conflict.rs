use rand::Rng;
use rand::seq::SliceRandom;
use selection::DataKey;
use serde::Serialize;
use sources::TextRelay;

use crate::panel::{Produced, ask_relay, fits};
use crate::prompts::{conflict_action_prompt, period_label};

pub const RECOMMENDED_ACTIONS: [&str; 5] = [
    "Seasonal speed restriction",
    "Route adjustment",
    "Temporal closure",
    "Vessel monitoring",
    "Acoustic deterrents",
];

/// Relay answers this long or longer are ignored.
pub const MAX_ACTION_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictAnalysis {
    pub species: String,
    pub period: String,
    pub high_risk_areas: u32,
    pub collision_risk_reduction: String,
    /// Nautical miles, one decimal.
    pub avg_route_deviation: f64,
    pub recommended_action: String,
}

pub fn default_conflict_analysis<R: Rng>(key: &DataKey, rng: &mut R) -> ConflictAnalysis {
    let whole = rng.gen_range(8u32..18);
    let tenths = rng.gen_range(0u32..10);
    ConflictAnalysis {
        species: key.species_name.clone(),
        period: period_label(key),
        high_risk_areas: rng.gen_range(2..=4),
        collision_risk_reduction: format!("{}%", rng.gen_range(65..85)),
        avg_route_deviation: f64::from(whole) + f64::from(tenths) / 10.0,
        recommended_action: RECOMMENDED_ACTIONS
            .choose(rng)
            .copied()
            .unwrap_or(RECOMMENDED_ACTIONS[0])
            .to_string(),
    }
}

/// Randomized analysis whose recommended action comes from the relay when it
/// gives a short answer.
pub async fn conflict_analysis<R: Rng>(
    relay: &dyn TextRelay,
    key: &DataKey,
    rng: &mut R,
) -> Produced<ConflictAnalysis> {
    let mut analysis = default_conflict_analysis(key, rng);
    match ask_relay(relay, conflict_action_prompt(&key.species_name), "conflict").await {
        Some(action) if fits(&action, MAX_ACTION_CHARS) => {
            analysis.recommended_action = action;
            Produced::relay(analysis)
        }
        _ => Produced::fallback(analysis),
    }
}

#[cfg(test)]
mod tests {
    use super::{RECOMMENDED_ACTIONS, conflict_analysis, default_conflict_analysis};
    use crate::panel::Origin;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use selection::DataKey;
    use sources::StaticRelay;

    #[test]
    fn defaults_stay_in_range() {
        let key = DataKey::new("Gadus morhua", Some("2022"), Some("4"));
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = default_conflict_analysis(&key, &mut rng);
            assert_eq!(a.period, "Month 4 2022");
            assert!((2..=4).contains(&a.high_risk_areas));
            let pct: u32 = a.collision_risk_reduction.trim_end_matches('%').parse().unwrap();
            assert!((65..85).contains(&pct));
            assert!(a.avg_route_deviation >= 8.0 && a.avg_route_deviation < 18.0);
            assert!(RECOMMENDED_ACTIONS.contains(&a.recommended_action.as_str()));
        }
    }

    #[tokio::test]
    async fn short_answer_replaces_action() {
        let relay = StaticRelay::replying("  Reduce vessel speed \n");
        let key = DataKey::new("Gadus morhua", None, None);
        let out = conflict_analysis(&relay, &key, &mut StdRng::seed_from_u64(1)).await;
        assert_eq!(out.origin, Origin::Relay);
        assert_eq!(out.data.recommended_action, "Reduce vessel speed");
        assert_eq!(out.data.period, "All year");
        assert!(relay.prompts()[0].contains("between Gadus morhua and shipping vessels"));
    }

    #[tokio::test]
    async fn long_answer_or_failure_keeps_default() {
        let key = DataKey::new("Gadus morhua", None, None);
        let long = "x".repeat(50);
        let relay = StaticRelay::replying(&long);
        let out = conflict_analysis(&relay, &key, &mut StdRng::seed_from_u64(1)).await;
        assert_eq!(out.origin, Origin::Fallback);
        assert!(RECOMMENDED_ACTIONS.contains(&out.data.recommended_action.as_str()));

        let out = conflict_analysis(&StaticRelay::failing(), &key, &mut StdRng::seed_from_u64(1)).await;
        assert_eq!(out.origin, Origin::Fallback);
    }
}
