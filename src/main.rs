//! VisionForge - Main Entry Point
//!
//! Loads a saved project graph and compiles it into pipeline source code
//! for the selected target language.

use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use visionforge_rs::codegen::{CodeGenManager, JavaLanguage, Language, PythonLanguage};
use visionforge_rs::config::AppConfig;
use visionforge_rs::graph::{ProjectFile, RegistryLoader};

struct Args {
    project: Option<PathBuf>,
    language: Option<String>,
    name: Option<String>,
    output: Option<PathBuf>,
    previz: bool,
    list_nodes: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        project: None,
        language: None,
        name: None,
        output: None,
        previz: false,
        list_nodes: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--language" | "-l" => {
                args.language = Some(iter.next().context("--language needs a value")?)
            }
            "--name" | "-n" => args.name = Some(iter.next().context("--name needs a value")?),
            "--output" | "-o" => {
                args.output = Some(PathBuf::from(
                    iter.next().context("--output needs a value")?,
                ))
            }
            "--previz" => args.previz = true,
            "--list-nodes" => args.list_nodes = true,
            "--help" | "-h" => {
                eprintln!(
                    "usage: visionforge <project.json> [--language java|python] \
                     [--name NAME] [--output FILE] [--previz] [--list-nodes]"
                );
                std::process::exit(0);
            }
            other if !other.starts_with('-') => args.project = Some(PathBuf::from(other)),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,visionforge_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args()?;
    let config = AppConfig::load_or_default("visionforge.toml");

    // Kick off node-type discovery in the background; joined only where
    // the palette is actually needed.
    let registry_loader = RegistryLoader::spawn();

    if args.list_nodes {
        let registry = registry_loader.join();
        for meta in registry.palette() {
            println!("{:<28} {:?}  {}", meta.type_tag, meta.category, meta.description);
        }
        return Ok(());
    }

    let project_path = args.project.context("no project file given; try --help")?;
    let project = ProjectFile::load(&project_path)
        .with_context(|| format!("failed to load {}", project_path.display()))?;
    let graph = project.into_graph();

    let language_name = args
        .language
        .unwrap_or_else(|| config.default_language.clone());
    let language: &dyn Language = match language_name.as_str() {
        "java" => &JavaLanguage,
        "python" | "py" => &PythonLanguage,
        other => bail!("unknown language: {other} (expected java or python)"),
    };

    let name = args.name.unwrap_or_else(|| config.pipeline_name.clone());

    tracing::info!(
        project = %project_path.display(),
        language = language.name(),
        "compiling pipeline"
    );

    let source = CodeGenManager::build(&graph, &name, language, args.previz)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &source)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "wrote generated source");
        }
        None => {
            let default = PathBuf::from(format!("{name}.{}", language.file_extension()));
            std::fs::write(&default, &source)
                .with_context(|| format!("failed to write {}", default.display()))?;
            tracing::info!(output = %default.display(), "wrote generated source");
        }
    }

    Ok(())
}
