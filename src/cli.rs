use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::adapter::DEFAULT_MAX_RETRIES;
use crate::api_connection::DEFAULT_MODEL;

#[derive(Parser, Debug)]
#[command(author, version, about = "Adapt recipes to dietary restrictions with a chain of LLM calls", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API and serve the frontend
    Serve(ServeArgs),
    /// Adapt a single recipe file and print the result
    Adapt(AdaptArgs),
    /// Report whether prompt templates and the API key are in place
    CheckSetup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Cerebras,
    Openrouter,
}

/// Completion service and pipeline settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    #[arg(long, env = "RECIPE_ADAPT_PROVIDER", value_enum, default_value_t = ProviderKind::Cerebras, global = true)]
    pub provider: ProviderKind,

    /// Name of the environment variable holding the API key
    /// (defaults to the provider's usual variable)
    #[arg(long, env = "RECIPE_ADAPT_API_KEY_VAR", global = true)]
    pub api_key_var: Option<String>,

    #[arg(long, env = "RECIPE_ADAPT_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Per-call timeout for the completion service, in seconds
    #[arg(long, env = "RECIPE_ADAPT_TIMEOUT_SECS", default_value_t = 60, global = true)]
    pub timeout_secs: u64,

    /// Full pipeline restarts allowed after a failed verification
    #[arg(long, env = "RECIPE_ADAPT_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    pub max_retries: u32,

    /// Directory holding the stage prompt templates
    #[arg(long, env = "RECIPE_ADAPT_PROMPTS_DIR", default_value = "contexts", global = true)]
    pub prompts_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "RECIPE_ADAPT_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory served at `/static`, containing `index.html`
    #[arg(long, env = "RECIPE_ADAPT_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// JSON-lines file that rating submissions are appended to
    #[arg(long, env = "RECIPE_ADAPT_RATINGS_PATH", default_value = "data/ratings.jsonl")]
    pub ratings_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct AdaptArgs {
    /// Path to the recipe text file
    #[arg(short, long)]
    pub recipe_file: PathBuf,

    /// Dietary restriction to satisfy; repeat for several (default: vegetarian)
    #[arg(short = 'x', long = "restriction")]
    pub restrictions: Vec<String>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
