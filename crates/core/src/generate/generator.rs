use std::time::Duration;

use log::debug;
use prism_rig::Rig;
use serde_json::Value;

use super::completion::{CompletionError, TextCompletionService};
use super::prompt::{build_prompt, response_schema};
use crate::scene::{Focus, Motion, Palette, SemanticScene, StrobeRate};
use crate::select::SceneContext;
use crate::settings::ResolveSettings;

/// Everything that can go wrong between asking the model for a scene and
/// holding a validated one. The resolver treats every variant the same
/// (fall back); the variant is kept for logging.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Service(#[from] CompletionError),
    #[error("completion call exceeded the configured timeout")]
    Timeout,
    #[error("response is not a JSON object: {0}")]
    MalformedJson(String),
    #[error("field '{field}' violates the response schema: {detail}")]
    SchemaViolation { field: &'static str, detail: String },
    #[error("generated scene violates an invariant: {0}")]
    InvariantViolation(String),
}

/// Model-backed scene generation: prompt the completion service, then
/// validate its answer field by field. A field the model got wrong is a
/// failure, never silently replaced with a default.
pub struct SceneGenerator {
    timeout: Duration,
    special_min_energy: u8,
}

impl SceneGenerator {
    pub fn new(settings: &ResolveSettings) -> Self {
        SceneGenerator {
            timeout: Duration::from_secs(settings.generation_timeout_secs),
            special_min_energy: settings.special_min_energy,
        }
    }

    pub async fn generate(
        &self,
        rig: &Rig,
        context: &SceneContext,
        description: Option<&str>,
        service: &dyn TextCompletionService,
    ) -> Result<SemanticScene, GenerationError> {
        let prompt = build_prompt(rig, context, description);
        let schema = response_schema();

        let response = match tokio::time::timeout(self.timeout, service.generate(&prompt, &schema))
            .await
        {
            Err(_) => return Err(GenerationError::Timeout),
            Ok(Err(err)) => return Err(GenerationError::Service(err)),
            Ok(Ok(value)) => value,
        };

        let scene = self.parse_response(&response)?;
        debug!("generated scene {}", scene);
        Ok(scene)
    }

    fn parse_response(&self, response: &Value) -> Result<SemanticScene, GenerationError> {
        let object = response
            .as_object()
            .ok_or_else(|| GenerationError::MalformedJson(response.to_string()))?;

        let energy_value = object
            .get("energy")
            .ok_or_else(|| missing("energy"))?
            .as_i64()
            .ok_or_else(|| wrong_type("energy", "integer"))?;
        if !(1..=5).contains(&energy_value) {
            return Err(GenerationError::SchemaViolation {
                field: "energy",
                detail: format!("{} out of range 1-5", energy_value),
            });
        }
        let energy = energy_value as u8;

        let palette: Palette = field(object, "palette")?;
        let motion: Motion = field(object, "motion")?;
        let strobe: StrobeRate = field(object, "strobe")?;
        let focus: Focus = field(object, "focus")?;

        let mut scene = SemanticScene::new("", energy, palette, motion, strobe, focus);
        if !scene.strobe_invariant_holds() {
            return Err(GenerationError::InvariantViolation(format!(
                "strobe {} at energy {}",
                strobe.as_str(),
                energy
            )));
        }
        if focus == Focus::Special && energy < self.special_min_energy {
            return Err(GenerationError::InvariantViolation(format!(
                "special focus at energy {} (minimum {})",
                energy, self.special_min_energy
            )));
        }

        scene.name = generated_name(&scene);
        Ok(scene)
    }
}

/// Deterministic synthetic name for a generated scene: identical model
/// output always maps to the same name.
fn generated_name(scene: &SemanticScene) -> String {
    let hash = blake3::hash(scene.canonical_string().as_bytes());
    format!("gen_{}", &hash.to_hex()[..8])
}

fn field<T: serde::de::DeserializeOwned>(
    object: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<T, GenerationError> {
    let value = object.get(name).ok_or_else(|| missing(name))?;
    serde_json::from_value(value.clone()).map_err(|e| GenerationError::SchemaViolation {
        field: name,
        detail: e.to_string(),
    })
}

fn missing(field: &'static str) -> GenerationError {
    GenerationError::SchemaViolation {
        field,
        detail: "missing".to_string(),
    }
}

fn wrong_type(field: &'static str, expected: &str) -> GenerationError {
    GenerationError::SchemaViolation {
        field,
        detail: format!("expected {}", expected),
    }
}
