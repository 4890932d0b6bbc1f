mod geometry;
mod projection;
mod renderer;

pub use projection::Viewport;
pub use renderer::{bubble_radius, shade_band, Lod, MapLayers, MapRenderer, SHADE_BANDS};
