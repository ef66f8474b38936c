//! inferd entry point.
//!
//! Bootstraps the serving daemon:
//! - Configuration loading from `INFERD_*` environment variables
//! - Logging initialization
//! - Initial model resolution and load (fail-fast: a startup load failure
//!   exits nonzero)
//! - HTTP listener with graceful shutdown on Ctrl+C

use std::process::ExitCode;

use inferd::{config, serve, telemetry, Service};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "serve" | "" => run_serve().await,
        "version" | "--version" | "-V" => {
            println!("inferd {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

async fn run_serve() -> ExitCode {
    let cfg = config::load();

    if let Err(e) = telemetry::init_logging(&cfg.log) {
        eprintln!("Logging setup failed: {}", e);
        return ExitCode::FAILURE;
    }

    let service = match Service::new(cfg) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "artifact store client setup failed");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        model = %service.lifecycle.reference(),
        tracking_uri = %service.config.tracking_uri,
        bind = %service.config.bind_addr,
        "starting inferd"
    );

    // Startup load is fail-fast: without a model there is nothing to serve.
    if let Err(e) = service.lifecycle.load_initial().await {
        tracing::error!(error = %e, "startup model load failed");
        return ExitCode::FAILURE;
    }

    match run_http(service).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server error");
            ExitCode::FAILURE
        }
    }
}

async fn run_http(service: Service) -> Result<(), std::io::Error> {
    let addr = service.config.bind_addr;
    let app = serve::router(service.app_state());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "inferd - model resolution and prediction serving v{}

USAGE:
    inferd [COMMAND]

COMMANDS:
    serve        Run the HTTP server (default when no command given)
    version      Show version information
    help         Show this help message

ENVIRONMENT:
    INFERD_MODEL_NAME             Registered model name
    INFERD_MODEL_ALIAS            Registry alias to resolve
    INFERD_SCAN_ROOTS             `:`-separated local scan roots
    INFERD_TRACKING_URI           Registry base URL
    INFERD_MANIFEST_NAME          Manifest sentinel file name
    INFERD_BIND_ADDR              HTTP listen address
    INFERD_REGISTRY_TIMEOUT_SECS  Per-strategy registry timeout
    INFERD_LOG_FORMAT             json | pretty
    INFERD_LOG_LEVEL              Log level filter

EXIT CODES:
    0  Success
    1  Startup or server failure
",
        version
    );
}
