//! Deploy-time model fetch.
//!
//! Runs the same resolution chain as the serving daemon, verifies the
//! artifact actually loads, and (for registry artifacts) downloads it to a
//! destination directory. Exit code 0 means the production model is
//! deployable.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use inferd::config;
use inferd::model::ModelLoader;
use inferd::registry::{ArtifactStore, RestArtifactStore};
use inferd::resolve::{ArtifactLocation, ModelReference, Resolver};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut cfg = config::load();
    let mut dest: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--name" => match args.get(i + 1) {
                Some(v) => {
                    cfg.model_name = v.clone();
                    i += 2;
                }
                None => return missing_value("--name"),
            },
            "--alias" => match args.get(i + 1) {
                Some(v) => {
                    cfg.model_alias = v.clone();
                    i += 2;
                }
                None => return missing_value("--alias"),
            },
            "--dest" => match args.get(i + 1) {
                Some(v) => {
                    dest = Some(PathBuf::from(v));
                    i += 2;
                }
                None => return missing_value("--dest"),
            },
            "--help" | "-h" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                return ExitCode::FAILURE;
            }
        }
    }

    let store: Arc<dyn ArtifactStore> =
        match RestArtifactStore::new(&cfg.tracking_uri, cfg.registry_timeout) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                eprintln!("Store client setup failed: {}", e);
                return ExitCode::FAILURE;
            }
        };

    let reference = ModelReference::new(&cfg.model_name, &cfg.model_alias);
    let resolver = Resolver::new(
        store.clone(),
        cfg.scan_roots.clone(),
        &cfg.manifest_name,
        cfg.registry_timeout,
    );
    let loader = ModelLoader::new(store.clone(), &cfg.manifest_name);

    let artifact = match resolver.resolve(&reference).await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Resolution failed for {}:", reference);
            for failure in &e.failures {
                eprintln!("  {}", failure);
            }
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Resolved {} via {} at {}",
        reference, artifact.origin, artifact.location
    );

    // Load to prove the artifact is actually servable, not just present.
    if let Err(e) = loader.load(&artifact).await {
        eprintln!("Artifact resolved but failed to load: {}", e);
        return ExitCode::FAILURE;
    }
    println!("Model loaded successfully");

    if let Some(dest) = dest {
        match &artifact.location {
            ArtifactLocation::Local(dir) => {
                println!("Artifact already local at {}, skipping download", dir.display());
            }
            ArtifactLocation::Registry(uri) => {
                if let Err(e) = store.download_artifacts(uri, &dest).await {
                    eprintln!("Download failed: {}", e);
                    return ExitCode::FAILURE;
                }
                println!("Downloaded {} to {}", uri, dest.display());
            }
        }
    }

    ExitCode::SUCCESS
}

fn missing_value(flag: &str) -> ExitCode {
    eprintln!("Missing value for {}", flag);
    ExitCode::FAILURE
}

fn print_usage() {
    eprintln!(
        "fetch-model - resolve and fetch the production model

USAGE:
    fetch-model [OPTIONS]

OPTIONS:
    --name <NAME>    Override the configured model name
    --alias <ALIAS>  Override the configured alias
    --dest <DIR>     Download registry artifacts into DIR
    -h, --help       Show this help message

Configuration comes from the same INFERD_* environment variables as the
serving daemon.
"
    );
}
