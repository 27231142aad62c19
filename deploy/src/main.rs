use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, ensure};
use deploy_lib::{
    config::Config,
    loader::load_descriptors,
    registry::DiscordRegistry,
    session::Session,
    sync::deploy_then_terminate,
};
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

/// Replaces the bot's slash commands with the definitions on disk
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Load and print the command definitions without connecting to discord
    #[arg(short, long, default_value = "false")]
    pub dry_run: bool,

    /// Directory holding one `.json` or `.toml` definition per command
    #[arg(short, long, default_value = "commands")]
    pub commands_dir: PathBuf,

    /// How long to wait before closing the connection once done
    #[arg(long, default_value_t = 500)]
    pub shutdown_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine, the variables may come from the real environment
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serenity=warn")),
        )
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .finish()
        .init();

    let Args {
        dry_run,
        commands_dir,
        shutdown_delay_ms,
    } = Args::parse();
    ensure!(shutdown_delay_ms > 0, "--shutdown-delay-ms must be greater than 0");

    let descriptors = load_descriptors(&commands_dir).wrap_err("Failed to load commands")?;
    tracing::info!(
        "Loaded {} commands from {}",
        descriptors.len(),
        commands_dir.display()
    );

    if dry_run {
        for descriptor in &descriptors {
            println!("{}", serde_json::to_string_pretty(descriptor.schema())?);
        }
        println!("Dry run enabled, not connecting to discord");
        return Ok(());
    }

    let config = Config::from_env()?;
    let session = Session::connect(&config.token).await?;
    let registry = DiscordRegistry::new(&session, &config.token);

    deploy_then_terminate(
        &registry,
        &descriptors,
        config.permission_target(),
        session,
        Duration::from_millis(shutdown_delay_ms),
    )
    .await;

    Ok(())
}
