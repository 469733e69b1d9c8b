//! Relay prompts, one per analysis task.

use selection::DataKey;
use sources::ALL;

fn chosen(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != ALL)
}

fn period_parts(key: &DataKey) -> (Option<&str>, Option<&str>) {
    let year = chosen(key.year.as_deref());
    let month = year.and(chosen(key.month.as_deref()));
    (month, year)
}

/// Caption for the selected period: `Month 3 2023`, `All year 2023` or `All year`.
pub fn period_label(key: &DataKey) -> String {
    match period_parts(key) {
        (Some(month), Some(year)) => format!("Month {month} {year}"),
        (_, Some(year)) => format!("All year {year}"),
        _ => "All year".to_string(),
    }
}

pub fn conflict_action_prompt(species: &str) -> String {
    format!(
        "What would be a good recommended action to reduce conflicts between {species} and \
         shipping vessels? Keep it short (5 words or less)."
    )
}

pub fn insight_prompt(key: &DataKey) -> String {
    let during = match period_parts(key) {
        (Some(month), Some(year)) => format!(" during Month {month} {year}"),
        (_, Some(year)) => format!(" during {year}"),
        _ => String::new(),
    };
    format!(
        "Generate a brief insight about marine species migration patterns for {}{during}. \
         Focus on comparing current patterns to previous years and suggest ways to reduce \
         collision risk with shipping lanes. Keep it under 2 sentences.",
        key.species_name
    )
}

pub fn route_prompt(species: &str) -> String {
    format!(
        "Suggest a brief recommendation (1 sentence) for optimizing shipping routes to avoid \
         conflicts with {species}."
    )
}

pub fn alert_prompt(species: &str) -> String {
    format!(
        "Generate one alert message about a potential conflict between {species} and shipping \
         vessels. Keep it to one sentence."
    )
}

pub fn species_analysis_prompt(observations_json: &str) -> String {
    format!(
        "Analyze the following marine species observation data and extract key information:\n\
         {observations_json}\n\n\
         Please provide:\n\
         1. Species identification (scientific name and common name if available)\n\
         2. Geographic distribution summary (latitude/longitude range, specific regions mentioned)\n\
         3. Temporal patterns (observation years, any seasonal patterns)\n\
         4. Habitat characteristics (depth range, distance from shore, water temperature, salinity)\n\
         5. Conservation implications (population trends, potential threats, habitat importance)\n\
         6. Key statistics (number of observations, average depth, temperature range)"
    )
}

#[cfg(test)]
mod tests {
    use super::{conflict_action_prompt, insight_prompt, period_label, species_analysis_prompt};
    use selection::DataKey;

    #[test]
    fn period_labels() {
        assert_eq!(period_label(&DataKey::new("x", Some("2023"), Some("3"))), "Month 3 2023");
        assert_eq!(period_label(&DataKey::new("x", Some("2023"), None)), "All year 2023");
        assert_eq!(period_label(&DataKey::new("x", Some("2023"), Some("all"))), "All year 2023");
        assert_eq!(period_label(&DataKey::new("x", Some("all"), Some("3"))), "All year");
        assert_eq!(period_label(&DataKey::new("x", None, None)), "All year");
    }

    #[test]
    fn insight_prompt_mentions_period_only_when_set() {
        let with = insight_prompt(&DataKey::new("Gadus morhua", Some("2021"), Some("7")));
        assert!(with.contains("for Gadus morhua during Month 7 2021. Focus"));

        let without = insight_prompt(&DataKey::new("Gadus morhua", None, None));
        assert!(without.contains("for Gadus morhua. Focus"));
    }

    #[test]
    fn prompts_embed_inputs() {
        assert!(conflict_action_prompt("Thunnus thynnus").contains("between Thunnus thynnus and"));
        let p = species_analysis_prompt("{\"total\":1}");
        assert!(p.starts_with("Analyze the following"));
        assert!(p.contains("\n{\"total\":1}\n\nPlease provide:\n1. Species"));
    }
}
