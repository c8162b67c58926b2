//! Kubernetes Awaiter - blocks until a Kubernetes API resource exists
//!
//! Normally launched by the orchestration host, which drives the lifecycle
//! operations itself. The binary exposes `--version` and a `wait` command for
//! running one create by hand.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use kubernetes_awaiter::diag::Severity;
use kubernetes_awaiter::poll::TransportErrorPolicy;
use kubernetes_awaiter::provider::{Provider, VERSION};
use kubernetes_awaiter::schema::{DEFAULT_POLL, DEFAULT_TIMEOUT, RESOURCE_TYPE};
use kubernetes_awaiter::telemetry::init_tracing;
use kubernetes_awaiter::{AwaiterSpec, ResourceAwaiter, ResourceIdentity};

/// Kubernetes Awaiter - wait for a Kubernetes API resource to exist
#[derive(Parser, Debug)]
#[command(name = "kubernetes-awaiter", about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Show version
    #[arg(long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait for a resource once, outside the orchestration host
    Wait(WaitArgs),
}

/// Arguments mirroring the resource fields
#[derive(Args, Debug)]
struct WaitArgs {
    /// Full URI to the Kubernetes API resource
    #[arg(long, env = "AWAITER_URI")]
    uri: String,

    /// Bearer token for the service account
    #[arg(long, env = "AWAITER_TOKEN", hide_env_values = true)]
    token: String,

    /// CA certificate content (PEM)
    #[arg(long, env = "AWAITER_CACERT", hide_env_values = true, conflicts_with = "cacert_path")]
    cacert: Option<String>,

    /// Path to CA certificate file
    #[arg(long, env = "AWAITER_CACERT_PATH")]
    cacert_path: Option<String>,

    /// Polling timeout, e.g. 2m30s
    #[arg(long, env = "AWAITER_TIMEOUT", default_value = DEFAULT_TIMEOUT)]
    timeout: String,

    /// Polling interval, e.g. 1s
    #[arg(long, env = "AWAITER_POLL", default_value = DEFAULT_POLL)]
    poll: String,

    /// Keep polling through connection failures instead of failing fast
    #[arg(long)]
    retry_transport_errors: bool,
}

impl WaitArgs {
    fn spec(&self) -> AwaiterSpec {
        AwaiterSpec {
            cacert: self.cacert.clone(),
            cacert_path: self.cacert_path.clone(),
            token: self.token.clone(),
            timeout: self.timeout.clone(),
            poll: self.poll.clone(),
            uri: self.uri.clone(),
        }
    }

    fn policy(&self) -> TransportErrorPolicy {
        if self.retry_transport_errors {
            TransportErrorPolicy::Retry
        } else {
            TransportErrorPolicy::Fail
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", VERSION);
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing()?;

    match cli.command {
        Some(Commands::Wait(args)) => run_wait(args).await,
        None => {
            eprintln!(
                "kubernetes-awaiter serves {} to its orchestration host and is not meant \
                 to be run directly. Use --version or the wait command.",
                RESOURCE_TYPE
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Run one create, cancelling on Ctrl-C
async fn run_wait(args: WaitArgs) -> anyhow::Result<ExitCode> {
    let awaiter = ResourceAwaiter::new().with_transport_policy(args.policy());
    let provider = Provider::with_awaiter(awaiter);
    let resource = provider
        .resource(RESOURCE_TYPE)
        .ok_or_else(|| anyhow::anyhow!("provider does not serve {}", RESOURCE_TYPE))?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let mut identity = ResourceIdentity::absent();
    let diags = resource
        .awaiter()
        .create(&args.spec(), &mut identity, &cancel)
        .await;

    for diag in &diags {
        match diag.severity {
            Severity::Error => error!(detail = %diag.detail, "{}", diag.summary),
            Severity::Warning => warn!(detail = %diag.detail, "{}", diag.summary),
        }
    }

    if diags.has_error() {
        return Ok(ExitCode::FAILURE);
    }

    info!(identity = %identity, "Resource is available");
    println!("{}", identity);
    Ok(ExitCode::SUCCESS)
}
