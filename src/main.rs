use clap::Parser;
use port_ingest::utils::{logger, monitor::SystemMonitor, validation::Validate};
use port_ingest::{
    CliConfig, ConfigProvider, IngestReport, InMemoryPortRepository, PortError, PortService,
    PortServiceImpl, Settings,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let settings = match Settings::from_cli(CliConfig::parse()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    if settings.json_logs {
        logger::init_json_logger(settings.verbose);
    } else {
        logger::init_cli_logger(settings.verbose);
    }
    tracing::debug!("settings: {:?}", settings);

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        std::process::exit(e.exit_code());
    }

    let service = PortServiceImpl::new(Arc::new(InMemoryPortRepository::new()));
    let monitor = SystemMonitor::new(settings.monitor);
    let cancel = CancellationToken::new();
    monitor.log_stats("start");

    let mut run: JoinHandle<port_ingest::Result<IngestReport>> = {
        let service = service.clone();
        let cancel = cancel.clone();
        let path = settings.source_path().to_path_buf();
        tokio::spawn(async move { service.process_ports_file(&cancel, &path).await })
    };

    let outcome = tokio::select! {
        joined = &mut run => joined.map_err(PortError::from).and_then(|r| r),
        signal = shutdown_signal() => {
            tracing::warn!(signal, "shutdown requested, cancelling ingestion");
            cancel.cancel();
            match tokio::time::timeout(settings.shutdown_grace(), &mut run).await {
                Ok(joined) => joined.map_err(PortError::from).and_then(|r| r),
                Err(_) => {
                    tracing::error!(grace = ?settings.shutdown_grace(), "ingestion did not stop in time");
                    Err(PortError::Cancelled)
                }
            }
        }
    };
    monitor.log_stats("ingest");

    match &outcome {
        Ok(report) => {
            let stats = service.statistics();
            tracing::info!(
                elapsed = ?report.elapsed,
                written = report.written,
                skipped = report.skipped,
                "✅ File processing completed"
            );
            tracing::info!(
                total_ports = stats.total_ports,
                total_updates = stats.total_updates,
                last_update = %stats.last_update_rfc3339().unwrap_or_default(),
                ports_per_second = %format!("{:.2}", report.ports_per_second()),
                "repository statistics"
            );
        }
        Err(e) if e.is_cancelled() => tracing::info!("processing was cancelled"),
        Err(e) => tracing::error!("❌ Error processing file: {}", e),
    }

    // Lookups and close run under a fresh token: the run's token may be cancelled.
    let housekeeping = CancellationToken::new();
    for id in settings.lookups() {
        match service.get_port(&housekeeping, id).await {
            Ok(Some(port)) => match serde_json::to_string_pretty(&port) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::error!(port_id = %id, "cannot render port: {}", e),
            },
            Ok(None) => tracing::warn!(port_id = %id, "port not found"),
            Err(e) => tracing::error!(port_id = %id, "lookup failed: {}", e),
        }
    }

    if let Err(e) = service.close(&housekeeping) {
        tracing::error!("Error closing repository: {}", e);
    }
    tracing::info!("service stopped");

    // Exit explicitly: a run that ignored cancellation still holds a blocking thread.
    let code = match outcome {
        Ok(_) => 0,
        Err(e) if e.is_cancelled() => 0,
        Err(e) => e.exit_code(),
    };
    std::process::exit(code);
}

async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
