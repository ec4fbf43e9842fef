//! Sends one fixed conversation straight to the configured provider and
//! prints what comes back. Takes the same flags as the server.

use canvas_chat::{Settings, init_environment};
use chat_gateway::{ChatMessage, ChatRequest, ProviderError, build_provider};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_environment(None);

    let settings = Settings::parse();
    let config = settings.provider_config()?;
    println!("Provider: {}", settings.provider);
    println!("API key: {}", mask(&config.api_key));

    let provider = build_provider(settings.provider, config)?;
    let request = ChatRequest::new(vec![
        ChatMessage::system(
            "you are a little baby who is mad about there being too many balloons in your room. \
             tell me about the balloons every chance you get.",
        ),
        ChatMessage::user("Say hello in one sentence"),
    ])
    .with_max_tokens(100)
    .with_temperature(1.0)
    .with_top_p(1.0);

    println!("\nMaking request to {} ...", provider.model());
    match provider.send(&request).await {
        Ok(body) => {
            println!("Success!");
            match chat_gateway::normalize(provider.kind(), &body) {
                Ok(response) => println!("Response: {}", response.text().unwrap_or_default()),
                Err(e) => println!("Could not normalize response: {e}"),
            }
            let pretty = serde_json::from_str::<serde_json::Value>(&body)
                .and_then(|value| serde_json::to_string_pretty(&value))
                .unwrap_or(body);
            println!("\nFull response: {pretty}");
        }
        Err(ProviderError::Upstream { status, body }) => {
            eprintln!("\n=== ERROR ===");
            eprintln!("Status: {status}");
            eprintln!("Body: {body}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("\n=== ERROR ===");
            eprintln!("Message: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    format!("{prefix}… ({} chars)", key.chars().count())
}
