use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lexia::api::{AuthApi, DocsApi};
use lexia::cli::{Cli, Commands, SessionCommands};
use lexia::config;
use lexia::gateway::Gateway;
use lexia::models::auth::SignupRequest;
use lexia::session::SessionCache;
use lexia::store::{file::FileStore, CredentialStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lexia=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = Cli::parse();

    let store: Arc<dyn CredentialStore> = Arc::new(FileStore::default_location()?);
    let gateway = Arc::new(Gateway::new(cfg, store));

    // The gateway only emits an event when it drops a session; what to
    // do about it is decided here, outside of it.
    let mut invalidations = gateway.subscribe_invalidations();
    tokio::spawn(async move {
        while let Ok(event) = invalidations.recv().await {
            eprintln!(
                "session invalidated ({}); run `lexia login` to sign in again",
                event.reason
            );
        }
    });

    let auth = AuthApi::new(gateway.clone());
    let docs = DocsApi::new(gateway.clone());

    match args.command {
        Commands::Login { email, password } => {
            let tokens = auth.login(&email, &password).await?;
            let who = tokens.display_name.or(tokens.email).unwrap_or(email);
            println!("logged in as {}", who);
        }
        Commands::Signup {
            email,
            password,
            display_name,
        } => {
            let tokens = auth
                .signup(&SignupRequest {
                    email: email.clone(),
                    password,
                    display_name,
                })
                .await?;
            let who = tokens.display_name.or(tokens.email).unwrap_or(email);
            println!("account created, logged in as {}", who);
        }
        Commands::GoogleLogin { token } => {
            let tokens = auth.google_login(&token).await?;
            println!(
                "logged in as {}",
                tokens
                    .display_name
                    .or(tokens.email)
                    .unwrap_or_else(|| "unknown user".into())
            );
        }
        Commands::Whoami => {
            let logged_in = gateway
                .store()
                .load()
                .await?
                .is_some_and(|c| c.is_authenticated());
            if !logged_in {
                anyhow::bail!("not logged in; run `lexia login` first");
            }
            let who = auth.whoami().await?;
            println!("{}", who.message);
        }
        Commands::ForgotPassword { email } => {
            let res = auth.forgot_password(&email).await?;
            println!("{}", res.message);
        }
        Commands::ResetPassword {
            email,
            token,
            new_password,
        } => {
            let res = auth.reset_password(&email, &token, &new_password).await?;
            println!("{}", res.message);
        }
        Commands::Logout => {
            auth.logout().await?;
            println!("logged out");
        }
        Commands::Upload { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("document.pdf");
            let res = docs.upload_document(file_name, bytes.into()).await?;
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
        Commands::Ask {
            query,
            session,
            document,
        } => {
            let res = docs
                .ask_question(&query, session.as_deref(), document.as_deref())
                .await?;
            println!("{}", res.response);
            if let Some(chat_id) = res.chat_id {
                eprintln!("(session {})", chat_id);
            }
        }
        Commands::Sessions { command } => match command {
            SessionCommands::List => {
                let sessions = docs.list_sessions().await?;
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            }
            SessionCommands::Create { name, document_id } => {
                let session = docs.create_session(&name, document_id).await?;
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
            SessionCommands::Messages { id } => {
                let messages = docs.session_messages(id).await?;
                println!("{}", serde_json::to_string_pretty(&messages)?);
            }
            SessionCommands::Sync => {
                let fetched = docs.sessions_with_messages().await?;
                let cache = SessionCache::new();
                cache.replace_all(fetched);
                println!("{}", serde_json::to_string_pretty(&cache.list())?);
                eprintln!("{} session(s) mirrored", cache.len());
            }
        },
    }

    Ok(())
}
