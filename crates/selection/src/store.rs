use foundation::ids::Generation;
use tracing::debug;

use crate::data_layers::LayerKey;
use crate::selection::{Selection, normalize};
use crate::tab::Tab;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// A month was chosen while no year is selected.
    MonthWithoutYear { month: String },
    EmptySpeciesName,
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::MonthWithoutYear { month } => {
                write!(f, "cannot select month '{month}' without a year")
            }
            SelectionError::EmptySpeciesName => write!(f, "species name is empty"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// What a mutation did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChangeCause {
    Species,
    Year,
    Month,
    Layer(LayerKey),
    Tab(Tab),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub cause: ChangeCause,
    /// `false` when the mutation left the selection as it was.
    pub changed: bool,
    /// Revision after the mutation; bumped by every effective change.
    pub revision: Generation,
    /// Bumped only when the species, year or month changed.
    pub data_generation: Generation,
    pub selection: Selection,
}

impl SelectionChange {
    /// Whether consumers must fetch fresh series for the new selection.
    pub fn requires_refetch(&self) -> bool {
        self.changed
            && matches!(
                self.cause,
                ChangeCause::Species | ChangeCause::Year | ChangeCause::Month
            )
    }
}

pub type SelectionListener = Box<dyn FnMut(&SelectionChange) + Send>;

/// Owner of the current [`Selection`].
///
/// Listeners run synchronously inside each mutator, before it returns.
pub struct SelectionStore {
    current: Selection,
    tab: Tab,
    revision: Generation,
    data_generation: Generation,
    listeners: Vec<SelectionListener>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(Selection::default())
    }
}

impl std::fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionStore")
            .field("current", &self.current)
            .field("tab", &self.tab)
            .field("revision", &self.revision)
            .field("data_generation", &self.data_generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SelectionStore {
    pub fn new(initial: Selection) -> Self {
        Self {
            current: initial,
            tab: Tab::default(),
            revision: Generation::default(),
            data_generation: Generation::default(),
            listeners: Vec::new(),
        }
    }

    pub fn current(&self) -> &Selection {
        &self.current
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn revision(&self) -> Generation {
        self.revision
    }

    pub fn data_generation(&self) -> Generation {
        self.data_generation
    }

    pub fn subscribe(&mut self, listener: SelectionListener) {
        self.listeners.push(listener);
    }

    /// Selects a species and clears year and month.
    pub fn select_species(
        &mut self,
        id: &str,
        name: &str,
    ) -> Result<SelectionChange, SelectionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SelectionError::EmptySpeciesName);
        }
        let id = id.trim();
        let changed = self.current.species_id() != id
            || self.current.species_name() != name
            || self.current.year().is_some();
        if changed {
            self.current.set_species(id.to_string(), name.to_string());
        }
        Ok(self.commit(ChangeCause::Species, changed))
    }

    /// Selects a year and clears the month. An empty year clears both.
    pub fn select_year(&mut self, year: &str) -> SelectionChange {
        let year = normalize(Some(year));
        let changed = self.current.year() != year.as_deref() || self.current.month().is_some();
        if changed {
            self.current.set_year(year);
        }
        self.commit(ChangeCause::Year, changed)
    }

    /// Selects a month within the current year. An empty month clears it.
    pub fn select_month(&mut self, month: &str) -> Result<SelectionChange, SelectionError> {
        let month = normalize(Some(month));
        if let Some(m) = &month {
            if self.current.year().is_none() {
                return Err(SelectionError::MonthWithoutYear { month: m.clone() });
            }
        }
        let changed = self.current.month() != month.as_deref();
        if changed {
            self.current.set_month(month);
        }
        Ok(self.commit(ChangeCause::Month, changed))
    }

    pub fn toggle_layer(&mut self, key: LayerKey) -> SelectionChange {
        self.current.data_layers_mut().toggle(key);
        self.commit(ChangeCause::Layer(key), true)
    }

    /// Switches tab and applies its layer preset.
    pub fn select_tab(&mut self, tab: Tab) -> SelectionChange {
        let before = self.current.data_layers();
        tab.apply_preset(self.current.data_layers_mut());
        let changed = self.tab != tab || before != self.current.data_layers();
        self.tab = tab;
        self.commit(ChangeCause::Tab(tab), changed)
    }

    fn commit(&mut self, cause: ChangeCause, changed: bool) -> SelectionChange {
        if changed {
            self.revision = self.revision.next();
            if matches!(
                cause,
                ChangeCause::Species | ChangeCause::Year | ChangeCause::Month
            ) {
                self.data_generation = self.data_generation.next();
            }
        }
        let change = SelectionChange {
            cause,
            changed,
            revision: self.revision,
            data_generation: self.data_generation,
            selection: self.current.clone(),
        };
        debug!(
            ?cause,
            changed,
            revision = %change.revision,
            species = change.selection.species_name(),
            "selection updated"
        );
        for listener in &mut self.listeners {
            listener(&change);
        }
        change
    }
}
