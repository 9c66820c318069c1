use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "thingbase",
    about = "Create, resolve and validate Thing records",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Context locator that things resolve against
    #[arg(long, global = true)]
    pub context: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new thing record
    Create(CreateArgs),
    /// Validate a thing against a schema
    Validate(ValidateArgs),
    /// Show where a thing locator resolves to
    Resolve(ResolveArgs),
    /// Print a thing record
    Show(ShowArgs),
    /// Open a thing record in an editor
    Edit(EditArgs),
    /// List the records under the context
    List(ListArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(short, long)]
    pub thing: String,
    /// Allow the thing to resolve outside the context
    #[arg(long)]
    pub context_less: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(short, long)]
    pub thing: String,
    /// Schema locator; falls back to the configured schema
    #[arg(short, long)]
    pub schema: Option<String>,
    #[arg(long)]
    pub context_less: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(short, long)]
    pub thing: String,
    #[arg(long)]
    pub context_less: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(short, long)]
    pub thing: String,
    #[arg(long)]
    pub context_less: bool,
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(short, long)]
    pub thing: String,
    /// Editor command; defaults to the configured editor, then $EDITOR
    #[arg(long)]
    pub editor: Option<String>,
    #[arg(long)]
    pub context_less: bool,
}

#[derive(Args)]
pub struct ListArgs {}
