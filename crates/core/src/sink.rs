use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::to_writer_pretty;

use crate::dmx::ResolvedScene;

/// A sink write failing is fatal to the run; scenes already appended are
/// left in place, not rolled back.
#[derive(Debug, thiserror::Error)]
#[error("failed to write to scene sink: {0}")]
pub struct SinkWriteError(pub String);

/// Receives each resolved scene, in order, exactly once. The sink owns
/// whatever file format or device sits behind it; the core never looks.
pub trait SceneSink {
    fn append(&mut self, resolved: ResolvedScene) -> Result<(), SinkWriteError>;
}

/// Collects resolved scenes in memory. Used by tests and by library
/// callers that post-process the sequence themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    scenes: Vec<ResolvedScene>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn scenes(&self) -> &[ResolvedScene] {
        &self.scenes
    }

    pub fn into_scenes(self) -> Vec<ResolvedScene> {
        self.scenes
    }
}

impl SceneSink for MemorySink {
    fn append(&mut self, resolved: ResolvedScene) -> Result<(), SinkWriteError> {
        self.scenes.push(resolved);
        Ok(())
    }
}

/// A titled group of resolved scenes for one song or show.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneSet {
    pub title: String,
    pub scenes: Vec<ResolvedScene>,
}

/// Buffers appends and writes the whole scene set as pretty JSON on
/// `finish`.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    scenes: Vec<ResolvedScene>,
}

impl JsonFileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonFileSink {
            path: path.as_ref().to_path_buf(),
            scenes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn finish(self, title: &str) -> Result<PathBuf, SinkWriteError> {
        let set = SceneSet {
            title: title.to_string(),
            scenes: self.scenes,
        };
        let file = File::create(&self.path).map_err(|e| SinkWriteError(e.to_string()))?;
        to_writer_pretty(file, &set).map_err(|e| SinkWriteError(e.to_string()))?;
        Ok(self.path)
    }
}

impl SceneSink for JsonFileSink {
    fn append(&mut self, resolved: ResolvedScene) -> Result<(), SinkWriteError> {
        self.scenes.push(resolved);
        Ok(())
    }
}
