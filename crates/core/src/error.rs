use prism_rig::MalformedRigError;

use crate::scene::CatalogError;
use crate::settings::SettingsError;
use crate::sink::SinkWriteError;

/// Failures that abort a resolution run and surface to the caller.
/// Selector misses and generation failures are recovered inside the
/// resolver and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Rig(#[from] MalformedRigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Sink(#[from] SinkWriteError),
}
