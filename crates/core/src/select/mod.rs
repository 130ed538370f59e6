pub mod selector;

pub use selector::{SceneContext, SceneSelector, Selection, SelectionConstraints};
