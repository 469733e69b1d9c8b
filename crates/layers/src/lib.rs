pub mod canvas;
pub mod engine;
pub mod headless;
pub mod info_card;
pub mod layer;
pub mod renderer;
pub mod symbology;
pub mod sync;
pub mod view_mode;
pub mod zones;

pub use engine::*;
pub use layer::*;
pub use renderer::*;
pub use sync::*;
pub use view_mode::*;
