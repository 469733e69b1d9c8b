pub mod data_layers;
pub mod selection;
pub mod species;
pub mod store;
pub mod tab;

pub use data_layers::*;
pub use selection::*;
pub use species::*;
pub use store::*;
pub use tab::*;
