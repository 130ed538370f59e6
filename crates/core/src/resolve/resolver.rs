use log::{debug, warn};
use prism_rig::Rig;

use crate::dmx::map_scene;
use crate::error::PipelineError;
use crate::generate::{SceneGenerator, TextCompletionService};
use crate::scene::{Catalog, Focus, Motion, Palette, SemanticScene, StrobeRate};
use crate::select::{SceneContext, SceneSelector, Selection, SelectionConstraints};
use crate::settings::ResolveSettings;
use crate::sink::SceneSink;

/// Palette order tried when the placeholder needs a color that differs
/// from the previous scene.
const PLACEHOLDER_PALETTES: [Palette; 5] = [
    Palette::Warm,
    Palette::Cool,
    Palette::Neutral,
    Palette::MonoBlue,
    Palette::MonoRed,
];

/// Runs the three-tier chain for every timeline step: rule-based selection,
/// then model generation, then the deterministic placeholder. Owns the RNG
/// and all cross-step state; one resolver per run, one seed per resolver.
pub struct SceneResolver {
    settings: ResolveSettings,
    selector: SceneSelector,
    generator: SceneGenerator,
    palette_run: Option<(Palette, usize)>,
    last_was_hard_strobe: bool,
}

impl SceneResolver {
    pub fn new(settings: ResolveSettings) -> Result<Self, PipelineError> {
        settings.validate()?;
        Ok(SceneResolver {
            selector: SceneSelector::new(settings.seed),
            generator: SceneGenerator::new(&settings),
            palette_run: None,
            last_was_hard_strobe: false,
            settings,
        })
    }

    /// Resolve a structured timeline. Steps run strictly in order: each
    /// step's outcome feeds the next step's context. Every resolved scene
    /// is mapped and appended to the sink before the next step starts.
    pub async fn resolve_timeline(
        &mut self,
        catalog: &Catalog,
        mut contexts: Vec<SceneContext>,
        rig: &Rig,
        service: &dyn TextCompletionService,
        sink: &mut dyn SceneSink,
    ) -> Result<Vec<SemanticScene>, PipelineError> {
        catalog.validate(self.settings.special_min_energy)?;

        let mut resolved = Vec::with_capacity(contexts.len());
        for step in 0..contexts.len() {
            if !self.settings.strobe_allowed {
                contexts[step].strobe_allowed = false;
            }

            let scene = self
                .resolve_step(catalog, &contexts[step], rig, service, None)
                .await;
            debug!("step {} resolved to {}", step, scene);

            sink.append(map_scene(&scene, rig, &self.settings))?;
            self.note_resolved(&scene);

            if let Some(next) = contexts.get_mut(step + 1) {
                next.last_palette = Some(scene.palette);
                next.last_scene = Some(scene.clone());
            }
            resolved.push(scene);
        }
        Ok(resolved)
    }

    /// Resolve from a free-text description alone: one synthetic step with
    /// neutral musical defaults, the description carried into the
    /// generation prompt.
    pub async fn resolve_description(
        &mut self,
        catalog: &Catalog,
        description: &str,
        rig: &Rig,
        service: &dyn TextCompletionService,
        sink: &mut dyn SceneSink,
    ) -> Result<Vec<SemanticScene>, PipelineError> {
        catalog.validate(self.settings.special_min_energy)?;

        let mut context = SceneContext::neutral();
        if !self.settings.strobe_allowed {
            context.strobe_allowed = false;
        }

        let scene = self
            .resolve_step(catalog, &context, rig, service, Some(description))
            .await;
        sink.append(map_scene(&scene, rig, &self.settings))?;
        self.note_resolved(&scene);
        Ok(vec![scene])
    }

    /// One pass down the chain, then a post-hoc variety check; on a
    /// violation the chain reruns once with the offending palette/strobe
    /// excluded. Terminal states are a resolved scene or the placeholder,
    /// so a step cannot fail.
    async fn resolve_step(
        &mut self,
        catalog: &Catalog,
        context: &SceneContext,
        rig: &Rig,
        service: &dyn TextCompletionService,
        description: Option<&str>,
    ) -> SemanticScene {
        let candidate = self
            .attempt_chain(catalog, context, rig, service, description, &SelectionConstraints::none())
            .await;

        match self.variety_violation(&candidate) {
            None => candidate,
            Some(constraints) => {
                debug!(
                    "candidate {} breaks the variety rules, re-filtering",
                    candidate.name
                );
                self.attempt_chain(catalog, context, rig, service, description, &constraints)
                    .await
            }
        }
    }

    async fn attempt_chain(
        &mut self,
        catalog: &Catalog,
        context: &SceneContext,
        rig: &Rig,
        service: &dyn TextCompletionService,
        description: Option<&str>,
        constraints: &SelectionConstraints,
    ) -> SemanticScene {
        match self.selector.select(catalog, context, constraints) {
            Selection::Match(scene) => return scene,
            Selection::NoMatch => {
                debug!("selector has no candidate, trying the generator");
            }
        }

        match self
            .generator
            .generate(rig, context, description, service)
            .await
        {
            Ok(scene) => {
                let repeats_last = context
                    .last_scene
                    .as_ref()
                    .map_or(false, |last| *last == scene);
                if constraints.allows(&scene) && !repeats_last {
                    return scene;
                }
                debug!("generated scene {} rejected by variety rules", scene.name);
            }
            Err(err) => {
                warn!("scene generation failed ({}), using placeholder", err);
            }
        }

        self.placeholder(context, constraints)
    }

    /// The always-available tier: conservative wash look, no strobe, energy
    /// taken from the context, palette differing from the previous scene
    /// whenever one is constructible.
    fn placeholder(
        &self,
        context: &SceneContext,
        constraints: &SelectionConstraints,
    ) -> SemanticScene {
        let energy = context.energy.clamp(1, 5);
        let palette = PLACEHOLDER_PALETTES
            .iter()
            .find(|p| {
                Some(**p) != context.last_palette && !constraints.exclude_palettes.contains(p)
            })
            .copied()
            .unwrap_or(Palette::Neutral);

        SemanticScene::new(
            &format!("placeholder_e{}", energy),
            energy,
            palette,
            Motion::Slow,
            StrobeRate::None,
            Focus::Wash,
        )
    }

    /// Post-hoc variety check: palette run length and hard-strobe cooldown.
    /// Returns the exclusions for a rerun when the candidate breaks either.
    fn variety_violation(&self, candidate: &SemanticScene) -> Option<SelectionConstraints> {
        let mut constraints = SelectionConstraints::none();

        if let Some((palette, run)) = self.palette_run {
            if candidate.palette == palette && run >= self.settings.max_consecutive_palette_repeat {
                constraints.exclude_palettes.push(palette);
            }
        }
        if self.last_was_hard_strobe && candidate.strobe == StrobeRate::Hard {
            constraints.forbid_hard_strobe = true;
        }

        if constraints == SelectionConstraints::none() {
            None
        } else {
            Some(constraints)
        }
    }

    fn note_resolved(&mut self, scene: &SemanticScene) {
        self.palette_run = match self.palette_run {
            Some((palette, run)) if palette == scene.palette => Some((palette, run + 1)),
            _ => Some((scene.palette, 1)),
        };
        self.last_was_hard_strobe = scene.strobe == StrobeRate::Hard;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::generate::{CompletionError, DisabledCompletionService};
    use crate::scene::Section;
    use crate::sink::MemorySink;
    use prism_rig::{channel_map, ChannelControl, Fixture, FixtureCategory};

    fn test_rig() -> Rig {
        let wash = Fixture::new(
            "w1",
            "Wash",
            FixtureCategory::Wash,
            channel_map![
                (ChannelControl::Dimmer, 0),
                (ChannelControl::Red, 1),
                (ChannelControl::Green, 2),
                (ChannelControl::Blue, 3),
            ],
        );
        let spot = Fixture::new(
            "s1",
            "Spot",
            FixtureCategory::Spot,
            channel_map![
                (ChannelControl::Dimmer, 0),
                (ChannelControl::Red, 1),
                (ChannelControl::Green, 2),
                (ChannelControl::Blue, 3),
            ],
        );
        Rig::new("Test", vec![wash, spot]).unwrap()
    }

    fn contexts(steps: &[(u8, bool, bool)]) -> Vec<SceneContext> {
        steps
            .iter()
            .map(|&(energy, is_drop, strobe_allowed)| {
                let mut ctx = SceneContext::new(energy, 120.0, Section::Verse);
                ctx.is_drop = is_drop;
                ctx.strobe_allowed = strobe_allowed;
                ctx
            })
            .collect()
    }

    async fn resolve(
        seed: u64,
        steps: &[(u8, bool, bool)],
    ) -> (Vec<SemanticScene>, MemorySink) {
        let mut settings = ResolveSettings::default();
        settings.seed = seed;
        let mut resolver = SceneResolver::new(settings).unwrap();
        let mut sink = MemorySink::new();
        let resolved = resolver
            .resolve_timeline(
                &Catalog::standard(),
                contexts(steps),
                &test_rig(),
                &DisabledCompletionService,
                &mut sink,
            )
            .await
            .unwrap();
        (resolved, sink)
    }

    #[tokio::test]
    async fn low_energy_step_gets_a_calm_wash() {
        let (resolved, _) = resolve(42, &[(1, false, true)]).await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].focus, Focus::Wash);
        assert_eq!(resolved[0].strobe, StrobeRate::None);
    }

    #[tokio::test]
    async fn drop_step_gets_accents_or_special() {
        let (resolved, _) = resolve(42, &[(5, true, true)]).await;
        assert!(matches!(
            resolved[0].focus,
            Focus::Accents | Focus::Special
        ));
    }

    #[tokio::test]
    async fn strobe_ban_holds_across_steps() {
        let steps = [(4, false, false); 10];
        let (resolved, _) = resolve(7, &steps).await;
        assert_eq!(resolved.len(), 10);
        assert!(resolved.iter().all(|s| s.strobe == StrobeRate::None));
    }

    #[tokio::test]
    async fn conflicting_constraints_fall_to_the_placeholder() {
        // Energy 1 forces wash focus, a drop demands accents/special, and
        // the service is down: only the placeholder can serve the step.
        let (resolved, _) = resolve(3, &[(1, true, true)]).await;
        assert_eq!(resolved[0].name, "placeholder_e1");
        assert_eq!(resolved[0].focus, Focus::Wash);
        assert_eq!(resolved[0].strobe, StrobeRate::None);
        assert_eq!(resolved[0].energy, 1);
    }

    #[tokio::test]
    async fn consecutive_placeholders_differ() {
        // Both steps land on the placeholder; the second one must pick a
        // palette the first did not use.
        let (resolved, _) = resolve(19, &[(1, true, true), (1, true, true)]).await;
        assert_eq!(resolved[0].name, "placeholder_e1");
        assert_eq!(resolved[1].name, "placeholder_e1");
        assert_ne!(resolved[0].palette, resolved[1].palette);
        assert_ne!(resolved[0], resolved[1]);
    }

    #[tokio::test]
    async fn no_immediate_repeats() {
        let steps = [(3, false, true); 12];
        let (resolved, _) = resolve(11, &steps).await;
        for pair in resolved.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[tokio::test]
    async fn palette_runs_stay_bounded() {
        let steps = [(3, false, true); 16];
        let (resolved, _) = resolve(13, &steps).await;
        let mut run = 1;
        for pair in resolved.windows(2) {
            if pair[0].palette == pair[1].palette {
                run += 1;
            } else {
                run = 1;
            }
            assert!(run <= 2, "palette {} ran {} times", pair[1].palette.as_str(), run);
        }
    }

    #[tokio::test]
    async fn hard_strobe_never_repeats_back_to_back() {
        let mut steps = Vec::new();
        for _ in 0..12 {
            steps.push((5, true, true));
        }
        let (resolved, _) = resolve(17, &steps).await;
        for pair in resolved.windows(2) {
            assert!(
                !(pair[0].strobe == StrobeRate::Hard && pair[1].strobe == StrobeRate::Hard),
                "hard strobe twice in a row"
            );
        }
    }

    #[tokio::test]
    async fn identical_seeds_reproduce_the_run() {
        let steps = [
            (1, false, true),
            (2, false, true),
            (4, false, true),
            (5, true, true),
            (3, false, true),
        ];
        let (a, _) = resolve(42, &steps).await;
        let (b, _) = resolve(42, &steps).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn every_step_reaches_the_sink_in_order() {
        let steps = [(2, false, true), (3, false, true), (4, false, true)];
        let (resolved, sink) = resolve(23, &steps).await;
        assert_eq!(sink.scenes().len(), 3);
        for (scene, mapped) in resolved.iter().zip(sink.scenes()) {
            assert_eq!(*scene, mapped.scene);
        }
    }

    #[tokio::test]
    async fn settings_strobe_switch_overrides_contexts() {
        let mut settings = ResolveSettings::default();
        settings.strobe_allowed = false;
        settings.seed = 5;
        let mut resolver = SceneResolver::new(settings).unwrap();
        let mut sink = MemorySink::new();
        let resolved = resolver
            .resolve_timeline(
                &Catalog::standard(),
                contexts(&[(5, true, true), (5, true, true)]),
                &test_rig(),
                &DisabledCompletionService,
                &mut sink,
            )
            .await
            .unwrap();
        assert!(resolved.iter().all(|s| s.strobe == StrobeRate::None));
    }

    #[tokio::test]
    async fn description_mode_resolves_one_scene() {
        let mut resolver = SceneResolver::new(ResolveSettings::default()).unwrap();
        let mut sink = MemorySink::new();
        let resolved = resolver
            .resolve_description(
                &Catalog::standard(),
                "dreamy ambient intro",
                &test_rig(),
                &DisabledCompletionService,
                &mut sink,
            )
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(sink.scenes().len(), 1);
    }

    struct FixedSceneService {
        payload: Value,
    }

    #[async_trait]
    impl TextCompletionService for FixedSceneService {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<Value, CompletionError> {
            Ok(self.payload.clone())
        }
    }

    #[tokio::test]
    async fn generator_serves_steps_the_selector_cannot() {
        // A drop at energy 1 has no catalog candidates, but the model
        // offers a valid accent scene.
        let service = FixedSceneService {
            payload: serde_json::json!({
                "energy": 4, "palette": "mono_red", "motion": "fast",
                "strobe": "none", "focus": "accents"
            }),
        };
        let mut resolver = SceneResolver::new(ResolveSettings::default()).unwrap();
        let mut sink = MemorySink::new();
        let resolved = resolver
            .resolve_timeline(
                &Catalog::standard(),
                contexts(&[(1, true, true)]),
                &test_rig(),
                &service,
                &mut sink,
            )
            .await
            .unwrap();
        assert!(resolved[0].name.starts_with("gen_"));
        assert_eq!(resolved[0].focus, Focus::Accents);
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected_up_front() {
        let mut settings = ResolveSettings::default();
        settings.special_min_energy = 0;
        assert!(SceneResolver::new(settings).is_err());
    }
}
