// src/main.rs

use axum::serve;
use ping_proxy::{
    build_application_state,
    cli::{Cli, Commands},
    run, setup_configuration, AppConfig, AppError,
    tls::TrustStore,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!(signal = "Ctrl+C", "Received signal. Initiating graceful shutdown...") },
        () = terminate => { info!(signal = "Terminate", "Received signal. Initiating graceful shutdown...") },
    }
}

fn init_tracing(cli: &Cli) {
    let env_filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    let result = match cli.command.clone().unwrap_or(Commands::Serve) {
        Commands::Serve => serve_forever(&cli).await,
        Commands::Config { verbose } => check_config(&cli, verbose),
        Commands::Ping { timeout } => ping_once(&cli, timeout).await,
    };

    if let Err(e) = &result {
        if e.is_startup_fatal() {
            eprintln!("Application setup error: {e}");
        }
    }
    result
}

async fn serve_forever(cli: &Cli) -> Result<(), AppError> {
    let (app, config) = run(cli.config.clone(), cli.overrides()).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!(server.address = %addr, error = ?e, "Failed to bind to address. Exiting.");
        AppError::from(e)
    })?;
    info!(server.address = %addr, "Server listening");

    info!("Starting server run loop...");
    serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = ?e, "Server run loop encountered an error. Exiting.");
            AppError::from(e)
        })?;

    info!("Server shut down gracefully.");
    Ok(())
}

fn check_config(cli: &Cli, verbose: bool) -> Result<(), AppError> {
    let config: AppConfig = setup_configuration(cli.config.clone(), cli.overrides())?;
    build_application_state(&config)?;

    println!("Configuration OK");
    println!("  upstream:   {}{}", config.upstream.base_url, config.upstream.ping_path);
    println!("  trust mode: {}", config.tls.mode);

    if verbose && config.tls.mode == ping_proxy::TrustMode::TrustSpecific {
        let store = TrustStore::load(&config.tls.bundle_source())?;
        for cert in store.bundle().iter() {
            println!(
                "  anchor #{}: {} (valid {} .. {})",
                cert.ordinal, cert.subject, cert.not_before, cert.not_after
            );
        }
    } else if verbose {
        warn!("trust-all mode has no trust bundle to show");
    }
    Ok(())
}

async fn ping_once(cli: &Cli, timeout: Option<u64>) -> Result<(), AppError> {
    let config = setup_configuration(cli.config.clone(), cli.overrides())?;
    let state = build_application_state(&config)?;

    let client = &state.ping_client;
    let deadline = timeout.map_or(client.timeout(), Duration::from_secs);
    let body = client.ping_within(deadline).await?;
    println!("{body}");
    Ok(())
}
