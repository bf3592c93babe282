#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::sync::Arc;

use anyhow::Context;
use args::Args;
use clap::Parser;
use roam_config::Config;
use roam_llm::{CallerIdentity, ChatRequest, ChatService, Gateway, InMemoryHistory};
use tokio::io::{AsyncRead, AsyncReadExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::from_env()?
    };

    let _telemetry_guard = roam_telemetry::init(config.telemetry.as_ref(), "warn")?;

    tracing::info!(
        config_path = %args.config.display(),
        from_file = args.config.exists(),
        "starting roam"
    );

    let gateway = Arc::new(Gateway::from_config(&config.llm)?);

    if args.list_models {
        let models = gateway.available_models();
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    let prompt = match args.prompt {
        Some(prompt) => prompt,
        None => read_prompt(tokio::io::stdin()).await?,
    };
    let prompt = prompt.trim();
    anyhow::ensure!(!prompt.is_empty(), "no prompt given");

    if let Some(persona) = args.system {
        config.chat.persona = persona;
    }

    let service = ChatService::new(gateway, Arc::new(InMemoryHistory::new()), config.chat);
    let mut request = ChatRequest::new(prompt, CallerIdentity::new("cli"));
    if let Some(model) = args.model {
        request = request.model(model);
    }

    tokio::select! {
        reply = service.respond(request) => {
            let reply = reply?;
            tracing::info!(model = reply.model.as_deref().unwrap_or("none"), "reply ready");
            println!("{}", reply.text);
        }
        () = shutdown_signal() => {}
    }

    Ok(())
}

/// Read the whole prompt from `reader`
async fn read_prompt<R: AsyncRead + Unpin>(mut reader: R) -> anyhow::Result<String> {
    let mut buffer = String::new();
    reader
        .read_to_string(&mut buffer)
        .await
        .context("failed to read prompt from stdin")?;
    Ok(buffer)
}

/// Wait for Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }

    tracing::info!("interrupted, abandoning request");
}
