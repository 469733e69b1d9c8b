pub mod alerts;
pub mod assistant;
pub mod conflict;
pub mod detection;
pub mod insight;
pub mod panel;
pub mod panels;
pub mod prompts;
pub mod routes;
pub mod species_info;
pub mod statistics;

pub use alerts::*;
pub use assistant::*;
pub use conflict::*;
pub use insight::*;
pub use panel::*;
pub use panels::*;
pub use routes::*;
pub use species_info::*;
