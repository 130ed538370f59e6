use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use prism_core::{
    Catalog, DisabledCompletionService, JsonFileSink, ResolveSettings, SceneContext, SceneResolver,
};
use prism_rig::Rig;
use serde::Deserialize;

/// Turn a song's mood into lighting scenes for a fixed rig.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(about = "Mood-driven scene generation for DMX lighting rigs")]
struct Args {
    /// Rig description file (JSON)
    #[arg(long)]
    rig: PathBuf,

    /// Timeline of musical contexts (JSON list, or an object with a
    /// 'contexts' key)
    #[arg(long)]
    contexts: Option<PathBuf>,

    /// Free-text description of the song (used when no timeline exists)
    #[arg(long, conflicts_with = "contexts")]
    describe: Option<String>,

    /// Where to write the generated scene set (default: <rig>_scenes.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scene catalog file (default: the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Resolver settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Selection seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Disallow strobing for the whole run
    #[arg(long, default_value = "false")]
    no_strobe: bool,
}

/// Timeline files come in two shapes: a bare array of contexts, or an
/// object with a 'contexts' key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContextsFile {
    Wrapped { contexts: Vec<SceneContext> },
    Bare(Vec<SceneContext>),
}

fn load_contexts(path: &Path) -> anyhow::Result<Vec<SceneContext>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read contexts file {}", path.display()))?;
    let file: ContextsFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse contexts file {}", path.display()))?;
    Ok(match file {
        ContextsFile::Wrapped { contexts } => contexts,
        ContextsFile::Bare(contexts) => contexts,
    })
}

fn default_output(rig_path: &Path) -> PathBuf {
    let stem = rig_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "rig".to_string());
    rig_path.with_file_name(format!("{}_scenes.json", stem))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => ResolveSettings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => ResolveSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.no_strobe {
        settings.strobe_allowed = false;
    }

    let rig = Rig::from_json_file(&args.rig)
        .with_context(|| format!("failed to load rig from {}", args.rig.display()))?;
    info!(
        "loaded rig '{}' with {} fixtures",
        rig.name(),
        rig.fixtures().len()
    );

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::standard(),
    };

    let output = args.output.clone().unwrap_or_else(|| default_output(&args.rig));
    let mut sink = JsonFileSink::new(&output);
    let mut resolver = SceneResolver::new(settings)?;
    let service = DisabledCompletionService;

    let title = match (&args.contexts, &args.describe) {
        (Some(contexts_path), _) => {
            let contexts = load_contexts(contexts_path)?;
            if contexts.is_empty() {
                bail!("contexts file {} is empty", contexts_path.display());
            }
            let steps = contexts.len();
            resolver
                .resolve_timeline(&catalog, contexts, &rig, &service, &mut sink)
                .await?;
            format!("Generated for {} ({} steps)", rig.name(), steps)
        }
        (None, Some(description)) => {
            resolver
                .resolve_description(&catalog, description, &rig, &service, &mut sink)
                .await?;
            format!("Generated for {}", description)
        }
        (None, None) => bail!("either --contexts or --describe is required"),
    };

    let count = sink.len();
    let path = sink.finish(&title)?;
    println!("Wrote {} scenes to {}", count, path.display());

    Ok(())
}
