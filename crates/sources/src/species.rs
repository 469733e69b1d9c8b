use selection::species::{DEFAULT_SPECIES, SUPPORTED_SPECIES};
use serde::Serialize;
use tracing::warn;

/// How a requested species name was mapped onto a supported one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SpeciesResolution {
    Exact,
    /// The requested text contains a supported name, e.g. `"Gadus morhua (cod)"`.
    Contained { requested: String },
    /// Nothing matched; the default species was used instead.
    Substituted { requested: String },
}

impl SpeciesResolution {
    pub fn is_substituted(&self) -> bool {
        matches!(self, SpeciesResolution::Substituted { .. })
    }
}

/// Resolves `requested` against the supported list: exact match, then
/// containment, else [`DEFAULT_SPECIES`].
pub fn resolve_species(requested: &str) -> (&'static str, SpeciesResolution) {
    if let Some(name) = SUPPORTED_SPECIES.iter().find(|n| **n == requested) {
        return (name, SpeciesResolution::Exact);
    }
    if let Some(name) = SUPPORTED_SPECIES.iter().find(|n| requested.contains(**n)) {
        return (
            name,
            SpeciesResolution::Contained {
                requested: requested.to_string(),
            },
        );
    }
    warn!(
        requested,
        substitute = DEFAULT_SPECIES,
        "unsupported species name; using default"
    );
    (
        DEFAULT_SPECIES,
        SpeciesResolution::Substituted {
            requested: requested.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{resolve_species, SpeciesResolution};

    #[test]
    fn exact_match() {
        assert_eq!(
            resolve_species("Thunnus thynnus"),
            ("Thunnus thynnus", SpeciesResolution::Exact)
        );
    }

    #[test]
    fn containment_match() {
        let (name, how) = resolve_species("Atlantic cod (Gadus morhua)");
        assert_eq!(name, "Gadus morhua");
        assert!(matches!(how, SpeciesResolution::Contained { .. }));
    }

    #[test]
    fn unknown_is_substituted_and_reported() {
        let (name, how) = resolve_species("Gadus morhuaa");
        // "Gadus morhuaa" contains "Gadus morhua".
        assert_eq!(name, "Gadus morhua");
        assert!(!how.is_substituted());

        let (name, how) = resolve_species("Megalodon");
        assert_eq!(name, "Clupea pallasii");
        assert_eq!(
            how,
            SpeciesResolution::Substituted {
                requested: "Megalodon".to_string()
            }
        );
    }
}
