//! voxverify: command-line front end for the verification client.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use voxverify_client::{
    CancelHandle, ClientSettings, Environment, ProgressNotifier, VerificationClient,
    VerificationOptions,
};
use voxverify_types::{CustomerData, Identity, RiskLevel, SessionId};
use voxverify_utils::{format_duration, init_logging, LogFormat};
use voxverify_webhook::{WebhookServer, WebhookVerifier};

#[derive(Parser)]
#[command(name = "voxverify", about = "Voice verification session client")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the verification service.
    #[arg(long, env = "VOXVERIFY_BASE_URL", global = true)]
    base_url: Option<String>,

    /// API key, sent as a bearer token.
    #[arg(long, env = "VOXVERIFY_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Overall budget per verification, in milliseconds.
    #[arg(long, env = "VOXVERIFY_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    /// Transport retries after a server or network failure.
    #[arg(long, env = "VOXVERIFY_RETRIES", global = true)]
    retries: Option<u32>,

    /// "development", "staging" or "production".
    #[arg(long, env = "VOXVERIFY_ENVIRONMENT", global = true)]
    environment: Option<Environment>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "warn", env = "VOXVERIFY_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "VOXVERIFY_LOG_FORMAT", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run a verification and wait for its result.
    Verify {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        transaction_id: Option<String>,

        /// "low", "medium", "high" or "critical".
        #[arg(long)]
        risk_level: Option<RiskLevel>,

        /// Customer name passed to the voice agent.
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Upper bound on status polls.
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Show the current state of a session.
    Status { session_id: String },

    /// Receive webhook deliveries.
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },
}

#[derive(clap::Subcommand)]
enum WebhookAction {
    /// Listen for deliveries and print accepted events as JSON lines.
    Serve {
        #[arg(long, default_value_t = 8787, env = "VOXVERIFY_WEBHOOK_PORT")]
        port: u16,

        /// Shared HMAC secret. Without it deliveries are not authenticated.
        #[arg(long, env = "VOXVERIFY_WEBHOOK_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Reject events older than this many seconds.
        #[arg(long)]
        max_age_secs: Option<u64>,
    },
}

/// File settings (if any) overridden by flags and environment variables.
fn load_settings(cli: &Cli) -> anyhow::Result<ClientSettings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let settings = ClientSettings::from_toml_str(&contents)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            tracing::info!("Loaded config from {}", path.display());
            settings
        }
        None => {
            let base_url = cli
                .base_url
                .clone()
                .context("--base-url (or VOXVERIFY_BASE_URL) is required without --config")?;
            ClientSettings::new(base_url)
        }
    };

    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(api_key) = &cli.api_key {
        settings.api_key = Some(api_key.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    if let Some(retries) = cli.retries {
        settings.retries = retries;
    }
    if let Some(environment) = cli.environment {
        settings.environment = environment;
    }
    Ok(settings)
}

fn build_client(cli: &Cli) -> anyhow::Result<VerificationClient> {
    let config = load_settings(cli)?.build()?;
    tracing::debug!(?config, "client configured");
    Ok(VerificationClient::new(config)?)
}

#[allow(clippy::too_many_arguments)]
async fn run_verify(
    client: VerificationClient,
    email: Option<String>,
    transaction_id: Option<String>,
    risk_level: Option<RiskLevel>,
    name: Option<String>,
    phone: Option<String>,
    max_attempts: Option<u32>,
) -> anyhow::Result<()> {
    let identity = Identity::from_parts(email, transaction_id)
        .context("give --email, --transaction-id or both")?;

    let (notifier, mut events) = ProgressNotifier::channel(16);
    let cancel = CancelHandle::new();
    let mut builder = VerificationOptions::builder(identity)
        .progress(notifier)
        .cancel_token(cancel.token());
    let customer = CustomerData {
        name,
        phone,
        ..CustomerData::default()
    };
    if !customer.is_empty() {
        builder = builder.customer_data(customer);
    }
    if let Some(level) = risk_level {
        builder = builder.risk_level(level);
    }
    if let Some(max_attempts) = max_attempts {
        builder = builder.max_attempts(max_attempts);
    }
    let options = builder.build()?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let session = event.session_id.as_ref().map(SessionId::as_str).unwrap_or("-");
            eprintln!(
                "[{:>7}] {:<10} session={session}",
                format_duration(event.elapsed),
                event.stage.as_str()
            );
        }
    });
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted, cancelling verification");
            cancel.cancel();
        }
    });

    let outcome = client.verify(options).await;
    // The options (and the progress sender) are gone; let the printer drain.
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;

    let result = outcome?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_status(client: VerificationClient, session_id: String) -> anyhow::Result<()> {
    let id = SessionId::new(session_id)?;
    let session = client.session_status(&id).await?;
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

async fn run_webhook_server(
    port: u16,
    secret: Option<String>,
    max_age_secs: Option<u64>,
) -> anyhow::Result<()> {
    let mut verifier = WebhookVerifier::new(secret);
    if let Some(secs) = max_age_secs {
        verifier = verifier.with_max_age(secs);
    }
    if !verifier.requires_signature() {
        tracing::warn!("no webhook secret configured; deliveries are not authenticated");
    }

    let server = WebhookServer::new(port, verifier);
    let mut events = server.state.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!("failed to print event: {e}"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("dropped {n} webhook events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        res = server.start() => res?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level);

    match &cli.command {
        Command::Verify {
            email,
            transaction_id,
            risk_level,
            name,
            phone,
            max_attempts,
        } => {
            let client = build_client(&cli)?;
            run_verify(
                client,
                email.clone(),
                transaction_id.clone(),
                *risk_level,
                name.clone(),
                phone.clone(),
                *max_attempts,
            )
            .await
        }
        Command::Status { session_id } => {
            let client = build_client(&cli)?;
            run_status(client, session_id.clone()).await
        }
        Command::Webhook { action } => match action {
            WebhookAction::Serve {
                port,
                secret,
                max_age_secs,
            } => run_webhook_server(*port, secret.clone(), *max_age_secs).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "base_url = \"https://file.example\"\nretries = 1\n").unwrap();

        let cli = Cli::try_parse_from([
            "voxverify",
            "--config",
            path.to_str().unwrap(),
            "--retries",
            "4",
            "status",
            "sess_1",
        ])
        .unwrap();
        let settings = load_settings(&cli).unwrap();

        assert_eq!(settings.retries, 4);
        assert_eq!(settings.timeout_ms, 30_000);
    }

    #[test]
    fn parses_verify_arguments() {
        let cli = Cli::try_parse_from([
            "voxverify",
            "--base-url",
            "https://api.example",
            "verify",
            "--email",
            "a@example.com",
            "--risk-level",
            "high",
        ])
        .unwrap();

        match cli.command {
            Command::Verify {
                email, risk_level, ..
            } => {
                assert_eq!(email.as_deref(), Some("a@example.com"));
                assert_eq!(risk_level, Some(RiskLevel::High));
            }
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn webhook_serve_defaults() {
        let cli = Cli::try_parse_from(["voxverify", "webhook", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Webhook {
                action: WebhookAction::Serve { port: 8787, .. }
            }
        ));
    }
}
