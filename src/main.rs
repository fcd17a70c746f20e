use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use promptstudio::llm::LlmClient;
use promptstudio::llm::types::LlmError;
use promptstudio::services::{assistant, editor, generation};
use promptstudio::state::{DEFAULT_DOWNLOAD_PREFIX, SessionState, Studio, StudioError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("llm client setup failed: {0}")]
    Llm(#[from] LlmError),
    #[error("{0}")]
    Studio(#[from] StudioError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "promptstudio", about = "AI-assisted prompt editing and image generation")]
struct Cli {
    /// Main prompt.
    #[arg(long, default_value = "")]
    prompt: String,

    /// Elements to keep out of the image.
    #[arg(long, default_value = "")]
    negative: String,

    /// Style tag applied to image generation.
    #[arg(long)]
    style: Option<String>,

    /// Reference image file; repeat for several.
    #[arg(long = "reference")]
    references: Vec<PathBuf>,

    #[arg(long, env = "STUDIO_DOWNLOAD_PREFIX", default_value = DEFAULT_DOWNLOAD_PREFIX)]
    download_prefix: String,

    /// Print the full session snapshot as JSON instead of the result field.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite the prompt into a more detailed one.
    Enhance,
    /// Propose alternative prompts.
    Suggest,
    /// Generate a negative prompt for the current prompt.
    Negative,
    /// Invent a prompt from scratch.
    Inspire,
    /// Write a short story around the prompt.
    Story,
    /// Generate an image and save it as a PNG.
    Image {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!(error = %e, "promptstudio failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = Arc::new(LlmClient::from_env()?);
    tracing::info!(text_model = client.text_model(), image_model = client.image_model(), "llm client ready");
    let studio = Studio::new(client.clone(), client).with_download_prefix(cli.download_prefix);

    editor::set_prompt(&studio, &cli.prompt);
    editor::set_negative_prompt(&studio, &cli.negative);
    editor::select_style(&studio, cli.style.as_deref())?;
    if !cli.references.is_empty() {
        generation::upload_reference_images(&studio, &cli.references).await?;
    }

    let saved = match cli.command {
        Command::Enhance => assistant::enhance_prompt(&studio).await.map(|()| None),
        Command::Suggest => assistant::suggest_prompts(&studio).await.map(|()| None),
        Command::Negative => assistant::generate_negative_prompt(&studio).await.map(|()| None),
        Command::Inspire => assistant::inspire_me(&studio).await.map(|()| None),
        Command::Story => assistant::generate_story(&studio).await.map(|()| None),
        Command::Image { ref out } => match generation::generate_image(&studio).await {
            Ok(()) => generation::download_image(&studio, out).await,
            Err(e) => Err(e),
        },
    }?;

    let snapshot = studio.snapshot();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_result(&cli.command, &snapshot, saved);
    }
    Ok(())
}

fn print_result(command: &Command, snapshot: &SessionState, saved: Option<PathBuf>) {
    match command {
        Command::Enhance | Command::Inspire => println!("{}", snapshot.prompt()),
        Command::Negative => println!("{}", snapshot.negative_prompt()),
        Command::Story => println!("{}", snapshot.story()),
        Command::Suggest => {
            for (i, suggestion) in snapshot.suggestions().iter().enumerate() {
                println!("{}. {suggestion}", i + 1);
            }
        }
        Command::Image { .. } => {
            if let Some(path) = saved {
                println!("{}", path.display());
            }
        }
    }
}
