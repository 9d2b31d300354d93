// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kompakt: PDF compression from the command line.
//
// Entry point. Initialises logging and services, then runs one subcommand.

mod cli;
mod output;
mod services;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use kompakt_core::KompaktError;
use kompakt_core::human_errors::humanize_error;
use kompakt_core::types::ProgressEvent;
use kompakt_engine::diagnostics::render_text;
use kompakt_pipeline::{CancelToken, NoProgress, RunHandle};
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use services::app_services::AppServices;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(command = ?cli.command, "kompakt starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<KompaktError>() {
                Some(kompakt) => {
                    tracing::debug!(error = ?kompakt, "command failed");
                    eprintln!("{}", output::error(&humanize_error(kompakt)));
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` and `-vv` raise the default `info` level.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let svc = AppServices::init(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Command::Compress(args) => {
            let request = args.request(&svc.config());
            let (progress, printer) = progress_printer(json);
            let handle = svc.runner().compress(request, progress)?;
            let result = wait(handle, printer).await?;
            emit(json, &result, output::compression)
        }
        Command::Merge { inputs, output } => {
            let (progress, printer) = progress_printer(json);
            let handle = svc.runner().merge(inputs, output, progress)?;
            let result = wait(handle, printer).await?;
            emit(json, &result, output::merge)
        }
        Command::Split {
            input,
            pages,
            size_mb,
            output_dir,
        } => {
            let part_size = cli::part_size(pages, size_mb, &svc.config());
            let (progress, printer) = progress_printer(json);
            let handle = svc
                .runner()
                .split(input, part_size, output_dir, progress)?;
            let report = wait(handle, printer).await?;
            emit(json, &report, output::split)
        }
        Command::Pages { input } => {
            let count = svc.blocking(move |svc| svc.page_count(&input)).await?;
            emit(json, &count, output::pages)
        }
        Command::Classify { input } => {
            let report = svc.blocking(move |svc| svc.classify(&input)).await?;
            emit(json, &report, output::classification)
        }
        Command::Probe {
            input,
            quality,
            scanned,
        } => {
            let cancel = CancelToken::new();
            cancel_on_ctrl_c(cancel.clone());
            let report = svc
                .blocking(move |svc| {
                    let quality = quality.unwrap_or(svc.config().default_image_quality);
                    if json {
                        svc.probe(&input, quality, scanned, &NoProgress, &cancel)
                    } else {
                        svc.probe(&input, quality, scanned, &print_progress, &cancel)
                    }
                })
                .await?;
            emit(json, &report, output::probe)
        }
        Command::Doctor => {
            let report = svc.blocking(|svc| Ok(svc.diagnose())).await?;
            emit(json, &report, render_text)
        }
        Command::Config { save } => {
            let config = svc.config();
            if save {
                svc.save_config(&config)?;
                eprintln!("saved {}", svc.config_path().display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Wait for a background run, cancelling it on Ctrl-C, then for its
/// progress printer to drain.
async fn wait<T>(handle: RunHandle<T>, printer: JoinHandle<()>) -> Result<T> {
    cancel_on_ctrl_c(handle.cancel_token());
    let result = handle.join().await;
    // The run dropped its sender when it finished.
    if let Err(e) = printer.await {
        tracing::debug!(error = %e, "progress printer stopped");
    }
    result.context("run failed")
}

fn cancel_on_ctrl_c(token: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; stopping after the current stage");
            token.cancel();
        }
    });
}

fn print_progress(event: ProgressEvent) {
    eprintln!("{}", output::progress(&event));
}

/// Progress channel whose events are printed to stderr, or dropped with
/// `--json`.
fn progress_printer(json: bool) -> (UnboundedSender<ProgressEvent>, JoinHandle<()>) {
    forward_progress(move |event| {
        if !json {
            print_progress(event);
        }
    })
}

/// Hand every event sent on the channel to `handle`. The task ends once all
/// senders are dropped and the queue is empty.
fn forward_progress(
    mut handle: impl FnMut(ProgressEvent) + Send + 'static,
) -> (UnboundedSender<ProgressEvent>, JoinHandle<()>) {
    let (tx, mut rx) = unbounded_channel::<ProgressEvent>();
    let task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            handle(event);
        }
    });
    (tx, task)
}

fn emit<T: Serialize>(json: bool, value: &T, render: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", render(value));
    }
    Ok(())
}
