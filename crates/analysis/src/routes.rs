use rand::Rng;
use selection::DataKey;
use serde::Serialize;
use sources::TextRelay;

use crate::panel::{Produced, ask_relay, fits};
use crate::prompts::route_prompt;

pub const CURRENT_ROUTE_COLOR: &str = "#f72585";
pub const OPTION_ROUTE_COLOR: &str = "#4cc9f0";
pub const MAX_SUMMARY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOption {
    pub name: String,
    /// Collision risk relative to the current route (percent).
    pub risk: u32,
    pub color: String,
}

impl RouteOption {
    fn new(name: &str, risk: u32, color: &str) -> Self {
        Self {
            name: name.to_string(),
            risk,
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOptimizations {
    pub routes: Vec<RouteOption>,
    pub summary: String,
}

pub fn default_route_optimizations<R: Rng>(species: &str, rng: &mut R) -> RouteOptimizations {
    let routes = vec![
        RouteOption::new("Current", 100, CURRENT_ROUTE_COLOR),
        RouteOption::new("Option 1", rng.gen_range(30..40), OPTION_ROUTE_COLOR),
        RouteOption::new("Option 2", rng.gen_range(15..25), OPTION_ROUTE_COLOR),
        RouteOption::new("Option 3", rng.gen_range(5..15), OPTION_ROUTE_COLOR),
    ];
    let reduction: u32 = rng.gen_range(65..85);
    RouteOptimizations {
        routes,
        summary: format!(
            "Shifting shipping lanes to avoid {species} migration routes can reduce collision \
             risk by up to {reduction}% with minimal impact on shipping efficiency."
        ),
    }
}

pub async fn route_optimizations<R: Rng>(
    relay: &dyn TextRelay,
    key: &DataKey,
    rng: &mut R,
) -> Produced<RouteOptimizations> {
    let mut optimizations = default_route_optimizations(&key.species_name, rng);
    match ask_relay(relay, route_prompt(&key.species_name), "routes").await {
        Some(summary) if fits(&summary, MAX_SUMMARY_CHARS) => {
            optimizations.summary = summary;
            Produced::relay(optimizations)
        }
        _ => Produced::fallback(optimizations),
    }
}
