use prism_rig::{FixtureCategory, Rig};
use serde_json::{json, Value};

use crate::scene::{Focus, Motion, Palette, StrobeRate};
use crate::select::SceneContext;

/// Build the completion prompt from the rig summary plus either the
/// structured musical context or a raw description of the song.
pub fn build_prompt(rig: &Rig, context: &SceneContext, description: Option<&str>) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are choosing one lighting look for a fixed DMX rig.\n");
    prompt.push_str(&format!(
        "Rig '{}': {} wash, {} spot, {} special fixtures.\n",
        rig.name(),
        rig.category_count(FixtureCategory::Wash),
        rig.category_count(FixtureCategory::Spot),
        rig.category_count(FixtureCategory::Special),
    ));

    match description {
        Some(text) => {
            prompt.push_str(&format!("Song description: {}\n", text));
        }
        None => {
            prompt.push_str(&format!(
                "Musical moment: energy {}/5, tempo {:.0} bpm, section {:?}, drop: {}.\n",
                context.energy, context.tempo, context.section, context.is_drop
            ));
        }
    }

    if let Some(last_palette) = context.last_palette {
        prompt.push_str(&format!(
            "The previous scene used the '{}' palette; prefer a different one.\n",
            last_palette.as_str()
        ));
    }
    if !context.strobe_allowed {
        prompt.push_str("Strobing is not allowed: strobe must be \"none\".\n");
    }

    prompt.push_str(&format!(
        "Allowed values: energy 1-5 (integer); palette one of {}; motion one of {}; \
         strobe one of {}; focus one of {}.\n",
        tokens(Palette::ALL.iter().map(Palette::as_str)),
        tokens(Motion::ALL.iter().map(Motion::as_str)),
        tokens(StrobeRate::ALL.iter().map(StrobeRate::as_str)),
        tokens(Focus::ALL.iter().map(Focus::as_str)),
    ));
    prompt.push_str(
        "A strobe other than \"none\" requires energy 3 or higher. \
         Use the most deterministic decoding available. \
         Respond with a single JSON object matching the schema, no prose.\n",
    );

    prompt
}

/// The structured-output shape handed to the completion service alongside
/// the prompt. Mirrors the allowed-value lists in the prompt text.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "energy": { "type": "integer", "minimum": 1, "maximum": 5 },
            "palette": { "type": "string", "enum": enum_tokens(Palette::ALL.iter().map(Palette::as_str)) },
            "motion": { "type": "string", "enum": enum_tokens(Motion::ALL.iter().map(Motion::as_str)) },
            "strobe": { "type": "string", "enum": enum_tokens(StrobeRate::ALL.iter().map(StrobeRate::as_str)) },
            "focus": { "type": "string", "enum": enum_tokens(Focus::ALL.iter().map(Focus::as_str)) }
        },
        "required": ["energy", "palette", "motion", "strobe", "focus"],
        "additionalProperties": false
    })
}

fn tokens<'a>(iter: impl Iterator<Item = &'a str>) -> String {
    iter.collect::<Vec<_>>().join("|")
}

fn enum_tokens<'a>(iter: impl Iterator<Item = &'a str>) -> Vec<String> {
    iter.map(|s| s.to_string()).collect()
}
