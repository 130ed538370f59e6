pub mod mapper;
pub mod palette;

pub use mapper::{map_scene, FixtureState, ResolvedScene};
pub use palette::{color_at, palette_colors, PaletteColors, Rgb};
