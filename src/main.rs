mod commands;
mod logging;
mod render;
mod reporter;
mod utils;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use commands::ConnectionArgs;

#[derive(Parser)]
#[command(name = "taskdav")]
#[command(about = "Keep Taskwarrior tasks and CalDAV to-dos in sync")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile Taskwarrior and the CalDAV server
    Sync {
        /// Ask before applying each kind of change
        #[arg(short, long)]
        interactive: bool,

        /// Never ask, even when the config enables interactive mode
        #[arg(long, conflicts_with = "interactive")]
        yes: bool,
    },
    /// Show what a sync would change, without changing anything
    Status,
    /// List the tasks of one store
    List {
        /// Taskwarrior tasks (the default)
        #[arg(long, conflicts_with = "remote")]
        local: bool,

        /// CalDAV tasks
        #[arg(long)]
        remote: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete every task on the CalDAV server
    PurgeRemote {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Show the config path and effective settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let connection = &cli.connection;
    match cli.command {
        Commands::Sync { interactive, yes } => commands::sync::run(connection, interactive, yes).await,
        Commands::Status => commands::status::run(connection).await,
        Commands::List { local: _, remote, json } => {
            commands::list::run(connection, remote, json).await
        }
        Commands::PurgeRemote { force } => commands::purge::run(connection, force).await,
        Commands::Config => commands::config::run(connection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taskdav", "sync", "-vv", "--url", "https://dav.example.com/", "--user", "me",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.connection.url.as_deref(), Some("https://dav.example.com/"));
        assert_eq!(cli.connection.user.as_deref(), Some("me"));
        assert!(matches!(cli.command, Commands::Sync { interactive: false, yes: false }));
    }

    #[test]
    fn test_list_sides_conflict() {
        assert!(Cli::try_parse_from(["taskdav", "list", "--local", "--remote"]).is_err());
        assert!(Cli::try_parse_from(["taskdav", "sync", "-i", "--yes"]).is_err());
    }
}
