use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use df_gateway::client::{ApiClient, JsonOutcome, Params};
use df_gateway::config::load_config;
use df_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "df-cli")]
#[command(about = "Operator CLI for the Delta Force API gateway", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API bearer key (required for admin commands).
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show endpoint mode, quarantine and current URL
    Status,
    /// Switch endpoint mode ("auto" or an endpoint key)
    Mode { mode: String },
    /// Clear all endpoint failure records
    Reset,
    /// Run one API call locally and print the outcome
    Call {
        /// API path, e.g. /df/person/info
        path: String,

        /// Send as POST instead of GET
        #[arg(long)]
        post: bool,

        /// Request parameter as key=value (value may be JSON, e.g. ids=[1,2,3])
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// Gateway config file supplying credential and endpoints
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (path, post, params, config) = match cli.command {
        Commands::Call {
            path,
            post,
            params,
            config,
        } => (path, post, params, config),
        admin => {
            let key = cli.key.ok_or("--key is required for admin commands")?;
            return run_admin(&cli.url, &key, admin).await;
        }
    };

    let config = load_config(&config)?;
    logging::init(&config.observability);
    let client = ApiClient::from_config(&config)?;
    let params: Params = params.into_iter().collect();
    let outcome = if post {
        client.post(&path, &params).await
    } else {
        client.get(&path, &params).await
    };

    let report = match outcome {
        JsonOutcome::Ok(body) => json!({ "ok": true, "body": body }),
        JsonOutcome::HttpError { status, body } => {
            json!({ "ok": false, "status": status, "body": body })
        }
        JsonOutcome::Failed(err) => {
            json!({ "ok": false, "error": err.to_string(), "message": err.user_message() })
        }
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_admin(
    url: &str,
    key: &str,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", key))?,
    );

    let request = match command {
        Commands::Status => client.get(format!("{}/admin/status", url)),
        Commands::Mode { mode } => client
            .post(format!("{}/admin/mode", url))
            .json(&json!({ "mode": mode })),
        Commands::Reset => client.post(format!("{}/admin/reset", url)),
        Commands::Call { .. } => return Ok(()),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
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
