// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::header, http::StatusCode, response::IntoResponse, routing::get, Router};
use bastion_controller::{
    cloud::http::HttpCloudClient,
    config::OperatorConfig,
    constants::{
        BASTION_FINALIZER, DEFAULT_METRICS_ADDRESS, ERROR_REQUEUE_SECS, KIND_BASTION,
        METRICS_PATH, READY_REQUEUE_SECS, TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::Bastion,
    errors::BastionError,
    metrics,
    reconcilers::{
        delete_bastion, deleting_condition, error_condition,
        finalizers::{ensure_finalizer, has_finalizer, remove_finalizer},
        outcome_condition, reconcile,
        status::update_ready_condition,
        DeleteOutcome, ReconcileOutcome,
    },
    status_reasons::{REASON_DELETING, REASON_PROVISIONING},
};
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Kubernetes controller provisioning temporary SSH bastion hosts
#[derive(Parser, Debug)]
#[command(name = "bastion-controller", version, about, long_about = None)]
struct Cli {
    /// Path to the controller configuration file
    #[arg(long, env = "BASTION_CONFIG")]
    config: PathBuf,

    /// Listen address of the Prometheus metrics endpoint
    #[arg(long, default_value = DEFAULT_METRICS_ADDRESS)]
    metrics_address: String,
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] BastionError);

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("bastion-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Format: timestamp file:line LEVEL message
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT=json|text
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting Bastion Controller");

    debug!(path = %cli.config.display(), "Loading configuration");
    let config = OperatorConfig::load(&cli.config).await?;
    let token = config.cloud.read_token().await?;
    let cloud = HttpCloudClient::new(&config.cloud.endpoint, token)?;
    info!(endpoint = %cloud.base_url(), "Cloud API client initialized");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let ctx = Arc::new(Context::new(
        client,
        Arc::new(cloud),
        config.infrastructure,
    ));

    // The controller and metrics server should never exit on their own
    tokio::select! {
        result = run_bastion_controller(ctx) => {
            error!("CRITICAL: Bastion controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Bastion controller exited unexpectedly without error")
        }
        result = run_metrics_server(cli.metrics_address) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        result = shutdown_signal() => {
            result?;
            info!("Shutting down Bastion Controller");
            Ok(())
        }
    }
}

/// Wait for SIGINT, or SIGTERM on unix.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received SIGINT");
    }
    Ok(())
}

/// Serve the Prometheus registry on [`METRICS_PATH`].
async fn run_metrics_server(address: String) -> Result<()> {
    let app = Router::new().route(METRICS_PATH, get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Metrics server listening on {address}{METRICS_PATH}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Run the `Bastion` controller
async fn run_bastion_controller(ctx: Arc<Context>) -> Result<()> {
    info!("Starting Bastion controller");
    debug!("Initializing Bastion controller with cluster-wide watch");

    let api = Api::<Bastion>::all(ctx.client.clone());

    Controller::new(api, Config::default())
        .run(reconcile_bastion_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `Bastion`
///
/// Dispatches to teardown when the resource is being deleted, writes the `Ready`
/// condition and maps outcomes to requeue intervals.
async fn reconcile_bastion_wrapper(
    bastion: Arc<Bastion>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let name = bastion.name_any();
    let namespace = bastion.namespace().unwrap_or_default();

    let result = if bastion.metadata.deletion_timestamp.is_some() {
        finalize(&ctx, &bastion).await
    } else {
        provision(&ctx, &bastion).await
    };

    match result {
        Ok(action) => {
            debug!("Successfully reconciled Bastion {namespace}/{name}");
            metrics::record_reconciliation_success(KIND_BASTION, start.elapsed());
            Ok(action)
        }
        Err(e) => {
            error!("Failed to reconcile Bastion {namespace}/{name}: {e}");
            metrics::record_reconciliation_error(KIND_BASTION, start.elapsed());
            metrics::record_error(KIND_BASTION, e.reason());

            let (status, reason, message) = error_condition(&e);
            if let Err(status_err) =
                update_ready_condition(&ctx.client, &bastion, status, reason, &message).await
            {
                warn!("Failed to record error on Bastion {namespace}/{name}: {status_err}");
            }
            Err(e.into())
        }
    }
}

/// One provisioning pass, guarded by the finalizer.
async fn provision(ctx: &Context, bastion: &Bastion) -> Result<Action, BastionError> {
    ensure_finalizer(&ctx.client, bastion, BASTION_FINALIZER).await?;

    let outcome = reconcile(ctx, bastion).await?;
    let (status, reason, message) = outcome_condition(&outcome);
    update_ready_condition(&ctx.client, bastion, status, reason, &message).await?;

    Ok(match outcome {
        ReconcileOutcome::Ready { .. } => Action::requeue(Duration::from_secs(READY_REQUEUE_SECS)),
        ReconcileOutcome::Requeue(requeue) => {
            debug!("Requeueing Bastion {}: {}", bastion.name_any(), requeue.cause);
            metrics::record_reconciliation_requeue(KIND_BASTION, REASON_PROVISIONING);
            Action::requeue(requeue.delay)
        }
    })
}

/// One teardown pass; the finalizer is released once everything is gone.
async fn finalize(ctx: &Context, bastion: &Bastion) -> Result<Action, BastionError> {
    if !has_finalizer(bastion, BASTION_FINALIZER) {
        return Ok(Action::await_change());
    }

    match delete_bastion(ctx, bastion).await? {
        DeleteOutcome::Deleted => {
            remove_finalizer(&ctx.client, bastion, BASTION_FINALIZER).await?;
            info!(
                bastion = %bastion.name_any(),
                namespace = ?bastion.namespace(),
                "Bastion resources deleted"
            );
            Ok(Action::await_change())
        }
        DeleteOutcome::Requeue(requeue) => {
            let (status, reason, message) = deleting_condition(&requeue);
            update_ready_condition(&ctx.client, bastion, status, reason, &message).await?;
            metrics::record_reconciliation_requeue(KIND_BASTION, REASON_DELETING);
            Ok(Action::requeue(requeue.delay))
        }
    }
}

/// Error policy for controller
fn error_policy(_resource: Arc<Bastion>, _err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
}
