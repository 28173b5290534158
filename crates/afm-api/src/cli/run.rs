//! `afm run`: load an agent, serve its interfaces, shut down cleanly.
//!
//! Startup order: document, logging, config, provider and runner (which
//! connects the MCP servers), HTTP server, WebSub subscription task, then the
//! console chat in the foreground (or a wait for Ctrl+C/SIGTERM). Shutdown
//! runs the same resources in reverse.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use afm_core::document::{self, InterfaceSet};
use afm_core::runner::{BoxAgentRunner, LlmAgentRunner};
use afm_core::websub::RetryPolicy;
use afm_infra::config::load_config;
use afm_infra::filesystem::load_agent_file;
use afm_infra::llm::create_provider;
use afm_infra::mcp::McpToolset;
use afm_infra::websub::ReqwestHubClient;
use afm_observe::tracing_setup::{LogOptions, init_tracing, shutdown_tracing};
use afm_types::agent::AgentRecord;
use afm_types::config::AfmConfig;
use afm_types::interface::WebhookInterface;
use afm_types::websub::SubscriptionConfig;

use crate::cli::RunArgs;
use crate::cli::chat::loop_runner::run_chat_loop;
use crate::cli::validate::print_summary;
use crate::http::lifecycle::{SubscriptionTask, callback_url};
use crate::http::router::{build_router, validate_paths};
use crate::shutdown_signal;
use crate::state::{AppState, Subscriber, WebChatState, WebhookState};

/// Whether the interactive console owns the terminal.
pub fn console_enabled(interfaces: &InterfaceSet, no_console: bool) -> bool {
    !no_console && (interfaces.consolechat.is_some() || !interfaces.has_http())
}

/// Apply `afm run` flags on top of the loaded config.
pub fn apply_overrides(config: &mut AfmConfig, args: &RunArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.webhook.verify_signatures = config.webhook.verify_signatures && !args.no_verify_signatures;
}

/// Build the subscriber for a webhook that names a WebSub hub and topic.
pub fn build_subscriber(webhook: &WebhookInterface, config: &AfmConfig) -> Option<Arc<Subscriber>> {
    let subscription = &webhook.subscription;
    let (Some(hub), Some(topic)) = (&subscription.hub, &subscription.topic) else {
        return None;
    };
    if !subscription.protocol.eq_ignore_ascii_case("websub") {
        tracing::warn!(
            protocol = %subscription.protocol,
            "unsupported subscription protocol, not subscribing"
        );
        return None;
    }

    let subscription_config = SubscriptionConfig {
        hub: hub.clone(),
        topic: topic.clone(),
        callback: callback_url(
            subscription.callback.as_deref(),
            &config.server.host,
            config.server.port,
            webhook.http_path(),
        ),
        secret: subscription.secret.clone(),
        lease_seconds: config.websub.lease_seconds,
        protocol: subscription.protocol.clone(),
    };
    let client = ReqwestHubClient::new(Duration::from_secs(config.websub.request_timeout_secs))
        .with_authentication(subscription.authentication.clone());

    Some(Arc::new(Subscriber::new(subscription_config, client)))
}

fn webhook_state(
    record: &AgentRecord,
    webhook: &WebhookInterface,
    config: &AfmConfig,
    subscriber: Option<Arc<Subscriber>>,
) -> anyhow::Result<WebhookState> {
    Ok(WebhookState {
        path: webhook.http_path().to_string(),
        template: document::webhook_template(record)?,
        output_is_string: webhook.signature.output.is_string(),
        secret: webhook
            .subscription
            .secret
            .clone()
            .map(SecretString::from),
        verify_signatures: config.webhook.verify_signatures,
        subscriber,
    })
}

pub async fn run(args: RunArgs, log: LogOptions) -> anyhow::Result<()> {
    let record = load_agent_file(&args.file)
        .await
        .with_context(|| format!("failed to load agent {}", args.file.display()))?;
    let interfaces = document::split_interfaces(&record)?;

    let console_mode = console_enabled(&interfaces, args.no_console);
    if !console_mode && !interfaces.has_http() {
        anyhow::bail!("nothing to serve: --no-console was given and the agent declares no HTTP interface");
    }
    init_tracing(&LogOptions { console_mode, ..log })
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let mut config = load_config(&args.file).await;
    apply_overrides(&mut config, &args);

    if args.dry_run {
        print_summary(&record);
        return Ok(());
    }

    let provider = create_provider(record.metadata.model.as_ref())
        .context("failed to configure the LLM provider")?;
    let runner = Arc::new(BoxAgentRunner::new(
        LlmAgentRunner::new(record.clone(), provider, &config.llm)
            .with_tools(McpToolset::from_record(&record)),
    ));
    runner.connect().await.context("failed to connect agent")?;

    let subscriber = interfaces
        .webhook
        .as_ref()
        .and_then(|w| build_subscriber(w, &config));
    let webhook = match &interfaces.webhook {
        Some(w) => Some(Arc::new(webhook_state(&record, w, &config, subscriber.clone())?)),
        None => None,
    };
    let webchat = interfaces.webchat.as_ref().map(|w| {
        Arc::new(WebChatState {
            path: w.http_path().to_string(),
            signature: w.signature.clone(),
        })
    });

    let shutdown = CancellationToken::new();
    let mut server = None;
    let mut subscription_task = None;

    if interfaces.has_http() {
        validate_paths(
            webchat.as_ref().map(|w| w.path.as_str()),
            webhook.as_ref().map(|w| w.path.as_str()),
        )
        .map_err(anyhow::Error::msg)?;

        let state = AppState {
            runner: Arc::clone(&runner),
            webhook,
            webchat,
        };
        let app = build_router(state, &args.cors_origins);

        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!(addr = %addr, agent = %runner.name(), "HTTP server listening");
        if !console_mode {
            println!("\n  {} listening on http://{addr}\n", runner.name());
        }

        let token = shutdown.clone();
        server = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                tracing::error!(error = %e, "HTTP server failed");
            }
        }));

        if let Some(subscriber) = &subscriber {
            subscription_task = Some(SubscriptionTask::spawn(
                Arc::clone(subscriber),
                RetryPolicy::from_config(&config.websub),
            ));
        }
    }

    let chat_result = if console_mode {
        tokio::select! {
            result = run_chat_loop(Arc::clone(&runner)) => result,
            _ = shutdown_signal() => Ok(()),
        }
    } else {
        shutdown_signal().await;
        Ok(())
    };

    tracing::info!("shutting down");
    shutdown.cancel();
    if let Some(server) = server
        && let Err(e) = server.await
    {
        tracing::warn!(error = %e, "HTTP server task did not finish cleanly");
    }
    if let Some(task) = subscription_task {
        task.shutdown().await;
    }
    if let Some(subscriber) = &subscriber {
        subscriber.release().await;
    }
    if let Err(e) = runner.disconnect().await {
        tracing::warn!(error = %e, "agent disconnect failed");
    }
    shutdown_tracing();

    chat_result
}
