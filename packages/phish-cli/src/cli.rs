//! Command line arguments and the configuration derived from them.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ollama_client::OllamaClient;
use phish_analyzer::{PipelineConfig, RetryPolicy};

/// Model used when neither `--model` nor `PHISH_MODEL` is given.
pub const DEFAULT_MODEL: &str = "phishing-detector";

/// Analyze a website for phishing indicators with a local language model.
#[derive(Debug, Parser)]
#[command(name = "phish", version, about)]
pub struct Args {
    /// URL to analyze. Prompted for when omitted.
    pub url: Option<String>,

    /// Model served by Ollama
    #[arg(short, long, env = "PHISH_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Ollama server address [default: $OLLAMA_HOST or http://localhost:11434]
    #[arg(long, value_name = "URL")]
    pub ollama_url: Option<String>,

    /// Page fetch timeout
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,

    /// Model generation timeout
    #[arg(long, value_name = "SECS")]
    pub model_timeout: Option<u64>,

    /// Characters of page content sent to the model
    #[arg(long, value_name = "N")]
    pub max_chars: Option<usize>,

    /// Extra attempts for transient fetch or model failures
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Print the HTML markup of the result instead of coloured text
    #[arg(long, conflicts_with = "json")]
    pub markup: bool,

    /// Print the completion event as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// `PHISH_*` environment overlaid with command line flags.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config =
            PipelineConfig::from_env().context("Invalid PHISH_* environment variable")?;

        if let Some(secs) = self.fetch_timeout {
            config = config.with_fetch_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.model_timeout {
            config = config.with_model_timeout(Duration::from_secs(secs));
        }
        if let Some(max_chars) = self.max_chars {
            config = config.with_max_chars(max_chars);
        }
        if let Some(retries) = self.retries {
            let retry = RetryPolicy {
                max_attempts: retries.saturating_add(1),
                ..config.retry.clone()
            };
            config = config.with_retry(retry);
        }

        Ok(config)
    }

    pub fn ollama_client(&self) -> Result<OllamaClient> {
        match &self.ollama_url {
            Some(url) => Ok(OllamaClient::new()
                .context("Failed to build Ollama client")?
                .with_base_url(url.as_str())),
            None => OllamaClient::from_env().context("Invalid OLLAMA_HOST"),
        }
    }
}
