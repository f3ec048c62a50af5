use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Lexia — client for the Lexia document assistant
#[derive(Parser)]
#[command(name = "lexia", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
    },

    /// Log in with a Google OAuth access token
    GoogleLogin {
        #[arg(long)]
        token: String,
    },

    /// Probe the protected endpoint with the stored credentials
    Whoami,

    /// Request a password-reset token
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// Redeem a password-reset token
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        new_password: String,
    },

    /// Clear stored credentials
    Logout,

    /// Upload a PDF and start a chat session for it
    Upload {
        /// Path to the PDF file
        file: PathBuf,
    },

    /// Ask a question about an uploaded document
    Ask {
        query: String,
        /// Continue an existing chat session
        #[arg(long)]
        session: Option<String>,
        /// Scope retrieval to one uploaded document
        #[arg(long)]
        document: Option<String>,
    },

    /// Inspect chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List sessions, newest activity first
    List,

    /// Create a named session
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        document_id: Option<Uuid>,
    },

    /// Print the transcript of one session
    Messages { id: Uuid },

    /// Fetch every session with its transcript
    Sync,
}
