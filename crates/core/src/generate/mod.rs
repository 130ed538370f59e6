pub mod completion;
pub mod generator;
pub mod prompt;

pub use completion::{CompletionError, DisabledCompletionService, TextCompletionService};
pub use generator::{GenerationError, SceneGenerator};
pub use prompt::{build_prompt, response_schema};
