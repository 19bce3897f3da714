//! NHD Portal - command-line client for the client portal backends.

mod app;
mod commands;

use std::path::PathBuf;

use app::AppContext;
use clap::{Parser, Subcommand};
use commands::{MessagesCommand, OrgCommand, PrefsCommand, ProjectsCommand, UsersCommand};
use portal_config_and_utils::{init_logging, Config, Paths};

/// NHD Portal command-line interface.
#[derive(Parser)]
#[command(name = "nhd-portal")]
#[command(about = "Client portal: session, messages, projects and organizations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the config value
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (storage, logs, config). Defaults to ~/.nhd-portal
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Mirror log events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long, env = "NHD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "NHD_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        company: String,
    },
    /// Sign out and clear the stored credential
    Logout,
    /// Verify the stored credential and show who it belongs to
    Whoami,
    /// Check backend health
    Health,
    /// Messages (rest profile)
    #[command(subcommand)]
    Messages(MessagesCommand),
    /// Projects (rest profile)
    #[command(subcommand)]
    Projects(ProjectsCommand),
    /// User administration (rest profile, admin only)
    #[command(subcommand)]
    Users(UsersCommand),
    /// Organizations, their projects and files (organization profile)
    #[command(subcommand)]
    Org(OrgCommand),
    /// Local preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging("nhd-portal", &config.log_level, &paths, cli.verbose)?;

    let ctx = AppContext::build(config, paths)?;

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, &password).await?,
        Commands::Register {
            name,
            email,
            password,
            company,
        } => commands::auth::register(&ctx, name, email, password, company).await?,
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Health => commands::auth::health(&ctx).await?,
        Commands::Messages(cmd) => commands::messages::run(&ctx, cmd).await?,
        Commands::Projects(cmd) => commands::projects::run(&ctx, cmd).await?,
        Commands::Users(cmd) => commands::users::run(&ctx, cmd).await?,
        Commands::Org(cmd) => commands::org::run(&ctx, cmd).await?,
        Commands::Prefs(cmd) => commands::prefs::run(&ctx, cmd)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "nhd-portal",
            "messages",
            "send",
            "--subject",
            "Hi",
            "--content",
            "Body",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(
            cli.command,
            Commands::Messages(MessagesCommand::Send { ref priority, .. }) if priority == "medium"
        ));
    }

    #[test]
    fn test_cli_org_create_defaults_slug() {
        let cli = Cli::try_parse_from(["nhd-portal", "org", "create", "Acme Corp"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Org(OrgCommand::Create { ref name, ref slug }) if name == "Acme Corp" && slug.is_empty()
        ));
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
