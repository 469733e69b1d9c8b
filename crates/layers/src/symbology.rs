use serde::Serialize;

pub const CYAN: &str = "#4cc9f0";
pub const ORANGE: &str = "#ff9e00";
pub const MAGENTA: &str = "#f72585";
pub const GREEN: &str = "#4af699";
pub const WHITE: &str = "#ffffff";
pub const BACKGROUND: &str = "#12233f";
pub const GRID: &str = "#172d4f";

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LayerStyle {
    pub stroke: &'static str,
    pub fill: Option<&'static str>,
    pub fill_opacity: f32,
    pub width_px: f32,
    /// Dash pattern in pixels, `None` for solid.
    pub dash: Option<[f32; 2]>,
}

impl LayerStyle {
    pub const fn new(stroke: &'static str, width_px: f32) -> Self {
        Self {
            stroke,
            fill: None,
            fill_opacity: 0.0,
            width_px,
            dash: None,
        }
    }

    pub const fn filled(mut self, fill: &'static str, opacity: f32) -> Self {
        self.fill = Some(fill);
        self.fill_opacity = opacity;
        self
    }

    pub const fn dashed(mut self, on: f32, off: f32) -> Self {
        self.dash = Some([on, off]);
        self
    }

    pub const fn migration_point() -> Self {
        Self::new(WHITE, 2.0).filled(CYAN, 1.0)
    }

    pub const fn migration_path() -> Self {
        Self::new(CYAN, 3.0)
    }

    pub const fn shipping_lane() -> Self {
        Self::new(ORANGE, 3.0).dashed(8.0, 4.0)
    }

    pub const fn conflict_zone() -> Self {
        Self::new(MAGENTA, 2.0).filled(MAGENTA, 0.5)
    }

    pub const fn zone_label() -> Self {
        Self::new(WHITE, 1.0).filled(MAGENTA, 0.8)
    }

    pub const fn sea_temperature() -> Self {
        Self::new(GREEN, 1.0).filled(GREEN, 0.3)
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::new(WHITE, 1.0)
    }
}
