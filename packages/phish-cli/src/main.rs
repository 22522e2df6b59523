//! `phish` - analyze a URL for phishing indicators from the terminal.

mod cli;
mod report;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use phish_analyzer::{event_channel, AnalysisPipeline, HttpFetcher, PipelineEvent, RunError};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::report::TextMode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let url = match &args.url {
        Some(url) => url.clone(),
        None => prompt_for_url()?,
    };

    let config = args.pipeline_config()?;
    let fetcher = HttpFetcher::from_config(&config).context("Failed to build HTTP client")?;
    let model = args.ollama_client()?;

    let (tx, mut rx) = event_channel();
    let pipeline = AnalysisPipeline::new(fetcher, model, config, tx);

    let handle = match pipeline.run(&url, &args.model) {
        Ok(handle) => handle,
        Err(RunError::Validation(e)) => {
            eprintln!("{} {}", "invalid input:".red().bold(), e.hint());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };
    info!(run_id = %handle.run_id(), url = %url, model = %args.model, "Analysis submitted");

    println!("{} {}", "Target:".bold(), url);
    println!("{} {}", "Model: ".bold(), args.model);
    println!();

    let mut cancel_requested = false;
    let complete = loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(PipelineEvent::Status { state, message, .. }) => {
                    println!("{}", report::status_line(state, &message));
                }
                Some(event @ PipelineEvent::Complete { .. }) => break event,
                None => bail!("Analysis stopped without a result"),
            },
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                cancel_requested = true;
                eprintln!("{}", "Cancelling analysis...".yellow());
                handle.cancel();
            }
        }
    };
    handle.wait().await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&complete).context("Failed to serialize result")?
        );
    }

    let PipelineEvent::Complete {
        request,
        outcome,
        finished_at,
        ..
    } = complete
    else {
        bail!("Unexpected event");
    };

    if !args.json {
        let mode = if args.markup {
            TextMode::Markup
        } else {
            TextMode::Terminal
        };
        println!(
            "{}",
            report::status_line(outcome.state(), outcome.state().status_text())
        );
        println!();
        print!(
            "{}",
            report::render(&request, &outcome, finished_at.with_timezone(&Local), mode)
        );
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn prompt_for_url() -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter URL")
        .with_initial_text("https://")
        .interact_text()
        .context("Failed to read URL")
}
