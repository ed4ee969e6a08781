//! tempfiles - command line front end for tempfiles-core.
//!
//! Descriptors and reports go to stdout as JSON; logs go to stderr.

mod cli;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Value, json};
use tempfiles_core::app::{ReclaimLoop, SweepLoop};
use tempfiles_core::impls::{ChannelScheduler, ScheduledReclaim, TracingEventSink};
use tempfiles_core::{Config, FileData, LifecycleManager, ManagerBuilder, ReclamationMode};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let mut config = Config::from_env().context("reading TEMPFILES_* configuration")?;
    if let Some(root) = cli.root {
        config.root = root;
    }

    // queued モードの予約はこのプロセスが生きている間だけ有効。
    // scheduler が無いと build が通らないので、どのコマンドでも用意する
    let queued = config.mode == ReclamationMode::Queued;
    let mut builder = ManagerBuilder::new(config).event_sink(Arc::new(TracingEventSink));
    let mut reclaims = None;
    if queued {
        let (scheduler, rx) = ChannelScheduler::channel();
        builder = builder.scheduler(Arc::new(scheduler));
        reclaims = Some(rx);
    }
    let manager = Arc::new(builder.build_verified().await?);

    match cli.command {
        Command::Create {
            path,
            name,
            data,
            owner,
            delete_original,
        } => {
            let data = parse_data(data.as_deref())?;
            let file = manager
                .create_from_path(&path, name.as_deref(), data, owner.as_deref(), delete_original)
                .await?;
            if manager.config().mode == ReclamationMode::Queued {
                warn!(id = %file.id, "Queued reclaim is held in memory; `tempfiles watch` will sweep it after expiry");
            }
            print_json(&manager.view(&file))?;
        }
        Command::Get { id } => {
            let file = manager.get(&id).await?.with_context(|| format!("no temporary file {id}"))?;
            print_json(&manager.view(&file))?;
        }
        Command::Cat { id } => {
            let bytes = manager
                .get_contents(&id)
                .await?
                .with_context(|| format!("no temporary file {id}"))?;
            std::io::stdout().lock().write_all(&bytes)?;
        }
        Command::List { expired } => {
            let store = manager.store();
            let entries = if expired {
                store.list_expired().await?
            } else {
                store.list_all().await?
            };
            let mut views = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Ok(file) => views.push(manager.view(&file)),
                    Err((name, e)) => warn!(directory = %name, error = %e, "Unreadable temporary file"),
                }
            }
            print_json(&views)?;
        }
        Command::Lock { id } => {
            let file = manager.lock(&id).await?.with_context(|| format!("no temporary file {id}"))?;
            print_json(&manager.view(&file))?;
        }
        Command::Unlock { id } => {
            let file = manager.unlock(&id).await?.with_context(|| format!("no temporary file {id}"))?;
            print_json(&manager.view(&file))?;
        }
        Command::Delete { id } => {
            let outcome = manager.delete(&id).await?;
            print_json(&json!({ "id": id, "outcome": outcome }))?;
        }
        Command::Cleanup => {
            let report = manager.sweep().await?;
            print_json(&report)?;
        }
        Command::Clear {
            yes,
            include_corrupt,
        } => {
            if !yes {
                bail!("refusing to delete every temporary file without --yes");
            }
            let cleared = if include_corrupt {
                manager.clear_all_including_corrupt().await?
            } else {
                manager.clear_all().await?
            };
            print_json(&json!({ "cleared": cleared }))?;
        }
        Command::Watch => watch(manager, reclaims).await?,
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::from_default_env().add_directive("tempfiles_core=info".parse()?);

    // Use JSON lines when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn parse_data(raw: Option<&str>) -> Result<FileData> {
    let Some(raw) = raw else {
        return Ok(FileData::new());
    };
    match serde_json::from_str::<Value>(raw).context("--data is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--data must be a JSON object, got {other}"),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

async fn watch(
    manager: Arc<LifecycleManager>,
    reclaims: Option<mpsc::UnboundedReceiver<ScheduledReclaim>>,
) -> Result<()> {
    match (manager.config().mode, reclaims) {
        (ReclamationMode::Periodic, _) => {
            let interval = manager.config().sweep_interval();
            info!(?interval, "Sweeping periodically");
            let sweeper = SweepLoop::spawn(Arc::clone(&manager), interval);
            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            sweeper.shutdown_and_join().await;
        }
        (ReclamationMode::Queued, Some(rx)) => {
            // ChannelScheduler はプロセス内だけ。別プロセスの create が積んだ予約は
            // ここに届かないので、定期 sweep を並走させて回収する
            let interval = manager.config().sweep_interval();
            info!(?interval, "Waiting for scheduled reclaims, sweeping periodically");
            let reclaimer = ReclaimLoop::spawn(Arc::clone(&manager), rx);
            let sweeper = SweepLoop::spawn(Arc::clone(&manager), interval);
            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            reclaimer.shutdown_and_join().await;
            sweeper.shutdown_and_join().await;
        }
        (ReclamationMode::Queued, None) => bail!("queued mode started without a scheduler"),
        (ReclamationMode::Manual, _) => {
            bail!("reclamation mode is manual; use `tempfiles cleanup` instead of `watch`")
        }
    }
    Ok(())
}
