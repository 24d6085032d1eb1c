use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "grant-wizard")]
#[command(about = "Program drafts and fund reclaims for the grant platform")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "grant-wizard.toml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the draft database and write a config template if none exists
    Init,

    /// Inspect or discard the locally saved program draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// List or execute reclaims for the configured user
    Reclaim {
        #[command(subcommand)]
        action: ReclaimAction,
    },
}

#[derive(Subcommand)]
pub enum DraftAction {
    /// Print the saved draft as JSON
    Show,

    /// Run every wizard tab's validation against the saved draft
    Check,

    /// Delete the saved draft
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ReclaimAction {
    /// Show reclaimable programs and milestones
    List {
        /// Also explain why each sponsored program is or is not reclaimable
        #[arg(short, long)]
        verbose: bool,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Reclaim unused funds of a program you created
    Program {
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Reclaim an unpaid milestone of your application
    Milestone {
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
