//! Supported species catalog.

use serde::Serialize;

/// Scientific names the data service is known to serve.
pub const SUPPORTED_SPECIES: [&str; 18] = [
    "Gadus morhua",
    "Clupea pallasii",
    "Genypterus blacodes",
    "Squalus acanthias",
    "Deania calceus",
    "Balaenoptera physalus",
    "Centroselachus crepidater",
    "Diastobranchus capensis",
    "Galeorhinus galeus",
    "Eubalaena glacialis",
    "Centroscymnus owstonii",
    "Hyperoodon ampullatus",
    "Kurtiella bidentata",
    "Thunnus thynnus",
    "Hippoglossus hippoglossus",
    "Merluccius bilinearis",
    "Pollachius virens",
    "Urophycis tenuis",
];

/// Species used when nothing else is selected, or a name cannot be resolved.
pub const DEFAULT_SPECIES: &str = "Clupea pallasii";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesEntry {
    pub id: String,
    pub name: &'static str,
}

/// Kebab-case id for a scientific name: `"Gadus morhua"` -> `"gadus-morhua"`.
pub fn species_id(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn catalog() -> Vec<SpeciesEntry> {
    SUPPORTED_SPECIES
        .iter()
        .map(|&name| SpeciesEntry {
            id: species_id(name),
            name,
        })
        .collect()
}

pub fn find_species(id: &str) -> Option<&'static str> {
    SUPPORTED_SPECIES
        .iter()
        .copied()
        .find(|name| species_id(name) == id)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SPECIES, SUPPORTED_SPECIES, catalog, find_species, species_id};

    #[test]
    fn ids_are_kebab_case() {
        assert_eq!(species_id("Clupea pallasii"), "clupea-pallasii");
        assert_eq!(species_id("  Thunnus   thynnus "), "thunnus-thynnus");
    }

    #[test]
    fn catalog_round_trips_ids() {
        let entries = catalog();
        assert_eq!(entries.len(), SUPPORTED_SPECIES.len());
        for entry in entries {
            assert_eq!(find_species(&entry.id), Some(entry.name));
        }
        assert!(find_species("kraken").is_none());
    }

    #[test]
    fn default_is_supported() {
        assert!(SUPPORTED_SPECIES.contains(&DEFAULT_SPECIES));
    }
}
