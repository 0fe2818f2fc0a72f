use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use connectivity_monitor::recovery::{Confirmer, IssuedTicket, StdinConfirmer};

#[derive(Parser)]
#[command(name = "monitor-cli")]
#[command(about = "Management CLI for the connectivity monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check monitor status
    Status,
    /// Show the connectivity alert
    Alert,
    /// Show cache and realtime status
    Dashboard,
    /// Clear all cached collections, or just one
    ClearCache {
        collection: Option<String>,
    },
    /// Acknowledge new realtime data
    Ack,
    /// Clear all local state and restart (asks first)
    Recover,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Alert => {
            let res = client.get(format!("{}/admin/alert", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Dashboard => {
            let res = client.get(format!("{}/admin/dashboard", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::ClearCache { collection } => {
            let path = match collection {
                Some(name) => format!("/admin/cache/{}/clear", name),
                None => "/admin/cache/clear".to_string(),
            };
            let res = client.post(format!("{}{}", cli.url, path))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Ack => {
            let res = client.post(format!("{}/admin/realtime/ack", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Recover => {
            let res = client.get(format!("{}/admin/recovery", cli.url))
                .headers(headers.clone())
                .send()
                .await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }

            // Typed parse: a missing or out-of-range count is an error, never zero.
            let issued: IssuedTicket = res.json().await?;
            let ticket = issued.ticket;
            let prompt = issued.prompt();

            let confirmed =
                tokio::task::spawn_blocking(move || StdinConfirmer::new().confirm(&prompt)).await?;
            if !confirmed {
                eprintln!("Recovery cancelled");
                return Ok(());
            }

            let res = client.post(format!("{}/admin/recovery/{}", cli.url, ticket))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
