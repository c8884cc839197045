//! Command-line front end for pixshare.

pub mod auth;
pub mod images;

use std::sync::Mutex;

use clap::{Parser, Subcommand};

use crate::auth::claims::RecordId;
use crate::http::{is_auth_route, Navigator, LOGIN_ROUTE};

/// pixshare image-sharing client
#[derive(Parser, Debug)]
#[command(name = "pixshare", version, about = "Command-line client for pixshare")]
pub struct Cli {
    /// API base URL (overrides PIXSHARE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Account management
    Auth(AuthArgs),
    /// Browse and manage images
    Images(ImagesArgs),
    /// Comments on an image
    Comments(CommentsArgs),
    /// Like or unlike an image
    Like {
        /// Image id
        image: String,
    },
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in with a username or email
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Show who is logged in
    Status,
    /// Forget stored tokens
    Logout,
}

/// Arguments for `pixshare auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Username or email address
    pub login: String,

    /// Password (prompted on stdin when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Arguments for `pixshare auth register`.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    pub email: String,
    pub username: String,

    /// Password (prompted on stdin when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ImagesArgs {
    #[command(subcommand)]
    pub command: ImagesCommands,
}

#[derive(Subcommand, Debug)]
pub enum ImagesCommands {
    /// List everyone's images
    List(PageArgs),
    /// List your own images
    Mine(PageArgs),
    /// Show one image
    Get { id: String },
    /// Search images by description
    Search {
        query: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Upload an image file
    Upload {
        path: std::path::PathBuf,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete one of your images
    Delete { id: String },
}

/// Paging flags shared by listing commands.
#[derive(Parser, Debug, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = crate::api::DEFAULT_PAGE)]
    pub page: u32,
    #[arg(long, default_value_t = crate::api::DEFAULT_LIMIT)]
    pub limit: u32,
}

#[derive(Parser, Debug)]
pub struct CommentsArgs {
    /// Image id
    pub image: String,

    #[command(subcommand)]
    pub command: Option<CommentsCommands>,
}

#[derive(Subcommand, Debug)]
pub enum CommentsCommands {
    /// List comments (default)
    List,
    /// Add a comment
    Add { text: String },
    /// Edit a comment
    Edit { comment: String, text: String },
    /// Remove a comment
    Delete { comment: String },
}

/// Parse an id typed on the command line.
pub fn record_id(raw: &str) -> RecordId {
    RecordId::from(raw.trim())
}

/// Terminal stand-in for a router: the CLI has no views, so a forced
/// redirect becomes a hint on stderr.
#[derive(Debug)]
pub struct TerminalNavigator {
    route: Mutex<String>,
}

impl TerminalNavigator {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: Mutex::new(route.into()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn navigate(&self, route: &str) {
        if route == LOGIN_ROUTE {
            eprintln!("Session expired. Run `pixshare auth login <user>` to sign in again.");
        }
        *self
            .route
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = route.to_string();
    }
}

/// Route name reported to the pipeline for a command.
pub fn route_for(command: &Commands) -> &'static str {
    match command {
        Commands::Auth(args) => match args.command {
            AuthCommands::Login(_) => LOGIN_ROUTE,
            AuthCommands::Register(_) => crate::http::REGISTER_ROUTE,
            AuthCommands::Status | AuthCommands::Logout => "/profile",
        },
        Commands::Images(_) => "/gallery",
        Commands::Comments(_) | Commands::Like { .. } => "/image",
    }
}
