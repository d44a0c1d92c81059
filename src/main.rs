use std::sync::Arc;

use anyhow::{bail, Context, Result};
use recipe_adapt::adapter::{PipelineResult, RestrictionSet};
use recipe_adapt::cli::{parse_args, AdaptArgs, Command, ServeArgs, ServiceArgs};
use recipe_adapt::prompts::PromptSet;
use recipe_adapt::ratings::RatingStore;
use recipe_adapt::server::{run_serve, AppState};
use tokio::fs;

async fn serve(service: &ServiceArgs, args: &ServeArgs) -> Result<()> {
    let adapter = service.build_adapter().await?;
    let state = AppState {
        adapter: Arc::new(adapter),
        ratings: Arc::new(RatingStore::new(&args.ratings_path)),
        prompts_dir: service.prompts_dir.clone(),
        api_key_env_var: service.api_key_env_var().to_string(),
    };
    run_serve(state, &args.static_dir, &args.bind, args.port).await
}

async fn adapt(service: &ServiceArgs, args: &AdaptArgs) -> Result<()> {
    let recipe = fs::read_to_string(&args.recipe_file)
        .await
        .with_context(|| format!("Failed to read recipe file '{}'", args.recipe_file.display()))?;
    let restrictions = RestrictionSet::with_default(args.restrictions.iter().cloned());
    let adapter = service.build_adapter().await?;

    match adapter.adapt(&recipe, &restrictions).await {
        PipelineResult::Success(text) => {
            println!("{text}");
            Ok(())
        }
        PipelineResult::Failure(reason) => bail!("{} ({reason})", reason.user_message()),
    }
}

fn check_setup(service: &ServiceArgs) -> Result<()> {
    println!("Prompt templates in '{}':", service.prompts_dir.display());
    let mut missing = 0;
    for (path, exists) in PromptSet::check_files(&service.prompts_dir) {
        let mark = if exists { "ok" } else { "MISSING" };
        println!("  [{mark}] {}", path.display());
        if !exists {
            missing += 1;
        }
    }

    let key_var = service.api_key_env_var();
    let key_present = service.api_key_present();
    println!(
        "API key variable {key_var}: {}",
        if key_present { "set" } else { "NOT SET" }
    );

    if missing > 0 || !key_present {
        bail!("setup incomplete: {missing} template file(s) missing, api key set: {key_present}");
    }
    println!("Setup looks good.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env before clap reads env fallbacks

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    match &cli.command {
        Command::Serve(args) => serve(&cli.service, args).await,
        Command::Adapt(args) => adapt(&cli.service, args).await,
        Command::CheckSetup => check_setup(&cli.service),
    }
}
