use clap::Parser;
use plunder::{install_prometheus_exporter, setup_logging, Cli, CliRunner, Config};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    setup_logging(args.verbose)?;

    info!("Starting plunder v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).await?;

    if let Some(addr) = args.metrics_addr {
        install_prometheus_exporter(addr)?;
    }

    let cli_runner = CliRunner::new(config);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel(1);
    let _shutdown_handler = setup_shutdown_handler(shutdown_tx);

    let result = tokio::select! {
        result = cli_runner.run(args.command) => result,
        _ = shutdown_rx.recv() => {
            warn!("Interrupted, browsers are closed on exit");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Defaults, then the config file, then `PLUNDER_BROWSER_LIMIT`, then flags.
async fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };

    config.apply_env();

    if let Some(page_limit) = args.page_limit {
        config.page_limit = page_limit;
    }

    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    config.validate()?;

    info!("Page limit: {} ({:?} queue)", config.page_limit, config.queue_order);
    info!("Navigation timeout: {:?}", config.navigation_timeout);

    Ok(config)
}

fn setup_shutdown_handler(
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    return;
                }
            };
            tokio::select! {
                _ = signal::ctrl_c() => info!("Received SIGINT"),
                _ = sigterm.recv() => info!("Received SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            if signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C");
            }
        }

        let _ = shutdown_tx.send(());
    })
}
