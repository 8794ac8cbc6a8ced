//! `pollux auth` subcommands (§4.12): add/list/remove/export named Google
//! credentials, independent of the single active credential the gateway
//! itself loads at boot. Mirrors the standalone credential manager the
//! upstream client ships, rehomed onto this gateway's own OAuth/storage
//! machinery.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::response::Html;
use axum::routing::get;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::oneshot;

use crate::credentials::{CredentialRecord, OauthManager};
use crate::error::CliError;

const APP_NAME: &str = "pollux";
const CALLBACK_PORT: u16 = 8765;
const CALLBACK_TIMEOUT_SECS: u64 = 300;

#[derive(Parser)]
#[command(name = "pollux", about = "Multi-protocol Gemini Code Assist gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage stored Google credentials.
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Add a new credential via the OAuth browser flow.
    Add {
        #[arg(long, short)]
        name: Option<String>,
    },
    /// List all stored credentials.
    List,
    /// Remove a stored credential.
    Remove { name: String },
    /// Export credentials as environment variable assignments.
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        docker: bool,
    },
}

pub async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Auth { command } => run_auth(command).await,
    }
}

async fn run_auth(command: AuthCommand) -> Result<(), CliError> {
    match command {
        AuthCommand::Add { name } => cmd_add(name).await,
        AuthCommand::List => cmd_list().await,
        AuthCommand::Remove { name } => cmd_remove(&name).await,
        AuthCommand::Export { output, docker } => cmd_export(output.as_deref(), docker).await,
    }
}

struct StoredCredential {
    name: String,
    record: Option<CredentialRecord>,
}

fn credentials_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(format!(".{APP_NAME}")).join("credentials")
}

fn credential_path(name: &str) -> PathBuf {
    credentials_dir().join(format!("{name}.json"))
}

async fn list_stored() -> Vec<StoredCredential> {
    let dir = credentials_dir();
    let mut entries = Vec::new();
    let Ok(mut read_dir) = tokio::fs::read_dir(&dir).await else {
        return entries;
    };

    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let record = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str::<CredentialRecord>(&contents).ok(),
            Err(_) => None,
        };
        entries.push(StoredCredential { name, record });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

fn next_credential_name(existing: &[StoredCredential]) -> String {
    let mut i = 1;
    loop {
        let candidate = format!("credential_{i}");
        if !existing.iter().any(|c| c.name == candidate) {
            return candidate;
        }
        i += 1;
    }
}

fn confirm() -> Result<bool, CliError> {
    use std::io::Write;
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

async fn save_credential(path: &Path, record: &CredentialRecord) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let serialized = serde_json::to_vec_pretty(record)?;
    tokio::fs::write(path, serialized).await?;
    Ok(())
}

async fn cmd_add(name: Option<String>) -> Result<(), CliError> {
    println!("Starting OAuth authentication...");

    let manager = OauthManager::new(CALLBACK_PORT);
    let (auth_url, csrf_token, pkce_verifier) = manager.authorize_url();

    println!("\n{}", "=".repeat(60));
    println!("GOOGLE AUTHENTICATION");
    println!("{}", "=".repeat(60));
    println!("\nOpen this URL in a browser to authenticate:\n\n{auth_url}");
    println!("\n{}", "=".repeat(60));

    let (code, state) = wait_for_callback(CALLBACK_PORT).await?;
    if state != *csrf_token.secret() {
        return Err(CliError::CsrfMismatch);
    }

    let record = manager.exchange_code(code, pkce_verifier).await?;
    if let Some(email) = &record.email {
        println!("Authenticated as: {email}");
    }

    let existing = list_stored().await;
    let name = name.unwrap_or_else(|| next_credential_name(&existing));
    let path = credential_path(&name);

    if path.exists() {
        print!("Credential '{name}' already exists. Overwrite? [y/N]: ");
        if !confirm()? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    save_credential(&path, &record).await?;

    println!("\nCredential saved successfully!");
    println!("  Name: {name}");
    println!("  Path: {}", path.display());
    if let Some(email) = &record.email {
        println!("  Email: {email}");
    }

    Ok(())
}

async fn cmd_list() -> Result<(), CliError> {
    let credentials = list_stored().await;
    let dir = credentials_dir();

    if credentials.is_empty() {
        println!("No credentials found.");
        println!("\nCredentials directory: {}", dir.display());
        println!("Run 'pollux auth add' to add a credential.");
        return Ok(());
    }

    println!("Found {} credential(s):\n", credentials.len());
    println!("{:<20} {:<35} {:<25}", "Name", "Email", "Created");
    println!("{}", "-".repeat(80));

    for cred in &credentials {
        let (email, created) = match &cred.record {
            Some(record) => (
                record.email.clone().unwrap_or_else(|| "unknown".to_string()),
                record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ),
            None => ("error reading file".to_string(), "error".to_string()),
        };
        let email: String = if email.chars().count() > 33 {
            format!("{}...", email.chars().take(30).collect::<String>())
        } else {
            email
        };
        println!("{:<20} {:<35} {:<25}", cred.name, email, created);
    }

    println!("\nCredentials directory: {}", dir.display());
    Ok(())
}

async fn cmd_remove(name: &str) -> Result<(), CliError> {
    let path = credential_path(name);
    if !path.exists() {
        println!("Credential '{name}' not found.");
        return Err(CliError::NotFound(name.to_string()));
    }

    print!("Remove credential '{name}'? [y/N]: ");
    if !confirm()? {
        println!("Cancelled.");
        return Ok(());
    }

    tokio::fs::remove_file(&path).await?;
    println!("Credential '{name}' removed.");
    Ok(())
}

async fn cmd_export(output: Option<&Path>, docker: bool) -> Result<(), CliError> {
    let credentials = list_stored().await;
    if credentials.is_empty() {
        println!("No credentials found to export.");
        return Err(CliError::NotFound("*".to_string()));
    }

    let mut lines = Vec::new();
    if docker {
        lines.push("# Add to your docker-compose.yml environment section:".to_string());
        lines.push("environment:".to_string());
    } else {
        lines.push("# Gemini credentials - add to your .env file".to_string());
        lines.push(format!("# Exported at {}", Utc::now().to_rfc3339()));
        lines.push(String::new());
    }

    for (i, cred) in credentials.iter().enumerate() {
        let Some(record) = &cred.record else {
            eprintln!("Warning: could not read credential '{}'", cred.name);
            continue;
        };
        let export = serde_json::json!({
            "client_id": record.client_id,
            "client_secret": record.client_secret,
            "refresh_token": record.refresh_token,
            "token_uri": record.token_uri,
        });
        let json_str = serde_json::to_string(&export)?;
        let idx = i + 1;
        if docker {
            lines.push(format!("  - GEMINI_CREDENTIALS_{idx}='{json_str}'"));
        } else {
            let email = record.email.clone().unwrap_or_else(|| "unknown".to_string());
            lines.push(format!("# {} ({})", cred.name, email));
            lines.push(format!("GEMINI_CREDENTIALS_{idx}='{json_str}'"));
            lines.push(String::new());
        }
    }

    let rendered = lines.join("\n");
    match output {
        Some(path) => {
            tokio::fs::write(path, &rendered).await?;
            println!("Exported {} credential(s) to {}", credentials.len(), path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

type CallbackResult = Result<(String, String), String>;

fn send_callback_result(tx: &Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>, value: CallbackResult) {
    if let Some(sender) = tx.lock().expect("callback result mutex poisoned").take() {
        let _ = sender.send(value);
    }
}

fn callback_page(ok: bool) -> Html<&'static str> {
    if ok {
        Html(
            "<html><head><style>body { font-family: system-ui, sans-serif; display: flex; \
             justify-content: center; align-items: center; height: 100vh; margin: 0; \
             background: #f5f5f5; } .card { background: white; padding: 2rem 3rem; \
             border-radius: 12px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); text-align: center; } \
             h1 { color: #1a73e8; margin-bottom: 0.5rem; } p { color: #666; }</style></head>\
             <body><div class='card'><h1>Authentication successful</h1>\
             <p>You can close this window and return to the terminal.</p></div></body></html>",
        )
    } else {
        Html("<h1>Authentication failed</h1><p>You can close this window.</p>")
    }
}

/// Runs a single-shot local HTTP listener for the OAuth redirect (§4.12),
/// shutting itself down the moment it has handled one request.
async fn wait_for_callback(port: u16) -> Result<(String, String), CliError> {
    let (result_tx, result_rx) = oneshot::channel::<CallbackResult>();
    let result_tx = Arc::new(Mutex::new(Some(result_tx)));
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let shutdown_tx = Arc::new(Mutex::new(Some(shutdown_tx)));

    let app = Router::new().route(
        "/oauth2callback",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let result_tx = result_tx.clone();
            let shutdown_tx = shutdown_tx.clone();
            async move {
                let page = if let Some(error) = params.get("error") {
                    send_callback_result(&result_tx, Err(error.clone()));
                    callback_page(false)
                } else if let Some(code) = params.get("code") {
                    let state = params.get("state").cloned().unwrap_or_default();
                    send_callback_result(&result_tx, Ok((code.clone(), state)));
                    callback_page(true)
                } else {
                    callback_page(false)
                };
                if let Some(tx) = shutdown_tx.lock().expect("shutdown mutex poisoned").take() {
                    let _ = tx.send(());
                }
                page
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });

    tokio::select! {
        result = server => {
            result?;
        }
        () = tokio::time::sleep(Duration::from_secs(CALLBACK_TIMEOUT_SECS)) => {
            return Err(CliError::CallbackTimeout);
        }
    }

    match result_rx.await {
        Ok(Ok(pair)) => Ok(pair),
        Ok(Err(error)) => Err(CliError::CallbackDenied(error)),
        Err(_) => Err(CliError::CallbackTimeout),
    }
}
