//! pixshare CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use pixshare::cli::{self, AuthCommands, Cli, Commands, TerminalNavigator};
use pixshare::config::ClientConfig;
use pixshare::error::{PixshareError, RecoverySuggestion};
use pixshare::session::Session;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        if let Some(hint) = e.downcast_ref::<PixshareError>().and_then(hint_for) {
            eprintln!("Hint: {hint}");
        }
        std::process::exit(1);
    }
}

fn hint_for(error: &PixshareError) -> Option<&'static str> {
    match error.recovery_suggestion() {
        RecoverySuggestion::LogIn => Some("run `pixshare auth login <user>`"),
        RecoverySuggestion::RetryWithBackoff => Some("the server may be busy, try again shortly"),
        RecoverySuggestion::CheckConfiguration => {
            Some("check PIXSHARE_API_URL and PIXSHARE_HOME")
        }
        RecoverySuggestion::CheckInput | RecoverySuggestion::None => None,
    }
}

fn init_tracing() {
    let filter = std::env::var("PIXSHARE_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    let navigator = Arc::new(TerminalNavigator::new(cli::route_for(&cli.command)));
    let session = Session::open(&config)?.with_navigator(navigator);

    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                cli::auth::handle_login(&session, &args.login, args.password).await
            }
            AuthCommands::Register(args) => {
                cli::auth::handle_register(&session, &args.email, &args.username, args.password)
                    .await
            }
            AuthCommands::Status => cli::auth::handle_status(&session).await,
            AuthCommands::Logout => cli::auth::handle_logout(&session),
        },
        Commands::Images(args) => cli::images::handle_images(&session, args.command).await,
        Commands::Comments(args) => {
            cli::images::handle_comments(&session, &args.image, args.command).await
        }
        Commands::Like { image } => cli::images::handle_like(&session, &image).await,
    }
}
