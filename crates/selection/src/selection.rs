use serde::Serialize;

use crate::data_layers::DataLayers;
use crate::species::{DEFAULT_SPECIES, species_id};

/// The user's current choice of species, period and visible layers.
///
/// Fields are private so the only way to move between selections is through
/// [`crate::SelectionStore`], which keeps `month` empty whenever `year` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    species_id: String,
    species_name: String,
    year: Option<String>,
    month: Option<String>,
    data_layers: DataLayers,
}

impl Default for Selection {
    fn default() -> Self {
        Self::for_species(species_id(DEFAULT_SPECIES), DEFAULT_SPECIES.to_string())
    }
}

impl Selection {
    pub fn for_species(species_id: String, species_name: String) -> Self {
        Self {
            species_id,
            species_name,
            year: None,
            month: None,
            data_layers: DataLayers::default(),
        }
    }

    pub fn species_id(&self) -> &str {
        &self.species_id
    }

    pub fn species_name(&self) -> &str {
        &self.species_name
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn data_layers(&self) -> DataLayers {
        self.data_layers
    }

    /// The part of the selection that determines what data is fetched.
    pub fn data_key(&self) -> DataKey {
        DataKey {
            species_name: self.species_name.clone(),
            year: self.year.clone(),
            month: self.month.clone(),
        }
    }

    pub(crate) fn set_species(&mut self, id: String, name: String) {
        self.species_id = id;
        self.species_name = name;
        self.year = None;
        self.month = None;
    }

    pub(crate) fn set_year(&mut self, year: Option<String>) {
        self.year = year;
        self.month = None;
    }

    pub(crate) fn set_month(&mut self, month: Option<String>) {
        debug_assert!(month.is_none() || self.year.is_some());
        self.month = month;
    }

    pub(crate) fn data_layers_mut(&mut self) -> &mut DataLayers {
        &mut self.data_layers
    }
}

/// `(species, year, month)`: the identity of a fetch or analysis request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataKey {
    pub species_name: String,
    pub year: Option<String>,
    pub month: Option<String>,
}

impl DataKey {
    pub fn new(species_name: impl Into<String>, year: Option<&str>, month: Option<&str>) -> Self {
        let year = normalize(year);
        let month = if year.is_some() { normalize(month) } else { None };
        Self {
            species_name: species_name.into(),
            year,
            month,
        }
    }
}

/// Empty and whitespace-only values mean "not set".
pub fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
