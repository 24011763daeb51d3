//! huddle-cli — operator frontend for the Huddle HTTP API.
//!
//! # Subcommands
//! - `status`                       — show server health
//! - `agents list [--search ..]`    — list the caller's agents
//! - `meetings list [--search ..]`  — list the caller's meetings

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8780";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "huddle-cli", version, about = "Operator CLI for the Huddle meeting service")]
struct Cli {
    /// Huddle HTTP server URL (overrides HUDDLE_HTTP_URL env var)
    #[arg(long, env = "HUDDLE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Session bearer token (required for agents/meetings commands)
    #[arg(long, env = "HUDDLE_SESSION_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show Huddle server status
    Status,

    /// Agent operations
    Agents {
        #[command(subcommand)]
        command: ListCommand,
    },

    /// Meeting operations
    Meetings {
        #[command(subcommand)]
        command: ListCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ListCommand {
    /// List rows owned by the session user
    List {
        /// Case-insensitive substring filter on name
        #[arg(long)]
        search: Option<String>,

        /// Page to fetch
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Rows per page (server clamps to its configured bounds)
        #[arg(long)]
        page_size: Option<u32>,

        /// Output the raw JSON page
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AgentRow {
    name: String,
    instructions: String,
    #[serde(rename = "createdAt")]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct MeetingRow {
    name: String,
    status: String,
    #[serde(rename = "agentName")]
    agent_name: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse<T> {
    items: Vec<T>,
    total: i64,
    #[serde(rename = "totalPages")]
    total_pages: i64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    message: String,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::blocking::Client::new();

    match &cli.command {
        Commands::Status => status(&client, &cli.server),
        Commands::Agents { command } => {
            let ListCommand::List { search, page, page_size, json } = command;
            let page: PageResponse<AgentRow> =
                list(&client, &cli, "/agents", search, *page, *page_size, *json)?;
            if *json {
                return Ok(());
            }
            for agent in &page.items {
                println!("{:<24} {:<20} {}", agent.name, agent.created_at, agent.instructions);
            }
            eprintln!("{} total across {} pages", page.total, page.total_pages);
            Ok(())
        }
        Commands::Meetings { command } => {
            let ListCommand::List { search, page, page_size, json } = command;
            let page: PageResponse<MeetingRow> =
                list(&client, &cli, "/meetings", search, *page, *page_size, *json)?;
            if *json {
                return Ok(());
            }
            for meeting in &page.items {
                println!(
                    "{:<24} {:<10} {:<20} {}",
                    meeting.name,
                    meeting.status,
                    meeting.agent_name.as_deref().unwrap_or("-"),
                    meeting.created_at,
                );
            }
            eprintln!("{} total across {} pages", page.total, page.total_pages);
            Ok(())
        }
    }
}

fn status(client: &reqwest::blocking::Client, server: &str) -> anyhow::Result<()> {
    let response = client
        .get(format!("{server}/health"))
        .send()
        .context("health request failed")?;
    let body: serde_json::Value = response.json().context("invalid health response")?;
    println!("status:     {}", body["status"].as_str().unwrap_or("unknown"));
    println!("version:    {}", body["version"].as_str().unwrap_or("unknown"));
    if let Some(pg) = body["postgresql"].as_str() {
        println!("postgresql: {}", pg);
    }
    Ok(())
}

fn list<T: serde::de::DeserializeOwned>(
    client: &reqwest::blocking::Client,
    cli: &Cli,
    path: &str,
    search: &Option<String>,
    page: u32,
    page_size: Option<u32>,
    raw_json: bool,
) -> anyhow::Result<PageResponse<T>> {
    let token = cli
        .token
        .as_deref()
        .context("a session token is required (--token or HUDDLE_SESSION_TOKEN)")?;

    let mut request = client
        .get(format!("{}{}", cli.server, path))
        .bearer_auth(token)
        .query(&[("page", page.to_string())]);
    if let Some(search) = search {
        request = request.query(&[("search", search)]);
    }
    if let Some(size) = page_size {
        request = request.query(&[("pageSize", size.to_string())]);
    }

    let response = request.send().context("list request failed")?;
    if !response.status().is_success() {
        let status = response.status();
        if let Ok(err) = response.json::<ApiError>() {
            bail!("{} ({}): {}", err.code, status, err.message);
        }
        bail!("request failed with status {}", status);
    }

    if raw_json {
        let value: serde_json::Value = response.json()?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        let page = serde_json::from_value(value)?;
        return Ok(page);
    }

    Ok(response.json()?)
}
