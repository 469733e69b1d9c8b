pub mod client;
pub mod config;
pub mod error;
pub mod migration;
pub mod occurrence;
pub mod query;
pub mod relay;
pub mod series;
pub mod shipping;
pub mod species;
pub mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use migration::*;
pub use occurrence::*;
pub use query::*;
pub use relay::*;
pub use series::*;
pub use shipping::*;
pub use species::*;
pub use transport::*;
