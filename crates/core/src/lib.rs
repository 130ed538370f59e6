pub use dmx::{color_at, map_scene, palette_colors, FixtureState, PaletteColors, ResolvedScene, Rgb};
pub use error::PipelineError;
pub use generate::{
    build_prompt, response_schema, CompletionError, DisabledCompletionService, GenerationError,
    SceneGenerator, TextCompletionService,
};
pub use resolve::SceneResolver;
pub use scene::{
    Catalog, CatalogError, Focus, Motion, Palette, Section, SemanticScene, StrobeRate,
};
pub use select::{SceneContext, SceneSelector, Selection, SelectionConstraints};
pub use settings::{ResolveSettings, SettingsError};
pub use sink::{JsonFileSink, MemorySink, SceneSet, SceneSink, SinkWriteError};

mod dmx;
mod error;
mod generate;
mod resolve;
mod scene;
mod select;
mod settings;
mod sink;
