//! Basic Ollama client usage example

use std::time::Duration;

use ollama_client::{GenerateOptions, GenerateRequest, OllamaClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment (OLLAMA_HOST or localhost:11434)
    let client = OllamaClient::from_env()?;
    let model = std::env::args().nth(1).unwrap_or_else(|| "llama3".to_string());

    println!("=== Generate ({}) ===", client.base_url());
    let response = client
        .generate(
            &GenerateRequest::new(&model, "What is Rust in one sentence?")
                .system("You are a helpful assistant.")
                .options(GenerateOptions {
                    temperature: Some(0.7),
                    num_predict: Some(100),
                    ..Default::default()
                }),
            Some(Duration::from_secs(120)),
        )
        .await?;

    println!("Response: {}", response.text().unwrap_or("<no text>"));
    if let Some(ns) = response.total_duration {
        println!("Took {} ms", ns / 1_000_000);
    }

    Ok(())
}
