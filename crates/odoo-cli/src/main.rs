mod args;

use anyhow::Context;
use clap::Parser;
use odoo_client::{OdooClient, SearchOptions};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use args::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.resolve_config()?;
    tracing::debug!(?config, "Resolved connection settings");

    let output = match &args.command {
        Command::Version => {
            let client = OdooClient::with_config(&config)?;
            serde_json::to_value(client.version().await.context("common.version failed")?)?
        }
        Command::Databases => {
            let client = OdooClient::with_config(&config)?;
            serde_json::to_value(client.list_databases().await.context("db.list failed")?)?
        }
        Command::Login => {
            let client = odoo_client::connect(&config).await?;
            serde_json::json!({ "uid": client.uid() })
        }
        Command::Call {
            model,
            method,
            args: positional,
            kwargs,
        } => {
            let client = odoo_client::connect(&config).await?;
            client
                .call(model, method, positional.clone(), kwargs.clone())
                .await
                .with_context(|| format!("{}.{} failed", model, method))?
        }
        Command::SearchRead {
            model,
            domain,
            fields,
            limit,
            offset,
            order,
        } => {
            let client = odoo_client::connect(&config).await?;
            let options = SearchOptions {
                fields: fields.clone(),
                offset: *offset,
                limit: *limit,
                order: order.clone(),
            };
            Value::Array(
                client
                    .search_read(model, domain.clone(), &options)
                    .await
                    .with_context(|| format!("{}.search_read failed", model))?,
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
