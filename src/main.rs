use clap::{Parser, Subcommand};
use imaginai::logger::{self, LogLevel, LoggerConfig};
use imaginai::{
    build_orchestrator, AppConfig, Backend, GenerationOutcome, GenerationSession,
    ImprovementPolicy, ModelCategory,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "imaginai", version, about = "Turn ideas into images")]
struct Cli {
    /// Override IMAGINAI_BACKEND (bedrock or gemini)
    #[arg(long, global = true)]
    backend: Option<Backend>,

    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one image from a prompt
    Generate {
        prompt: String,
        /// Save the image after a successful generation
        #[arg(long)]
        download: bool,
        /// Directory to save into (defaults to IMAGINAI_DOWNLOAD_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Read prompts from stdin; `:regen`, `:download` and `:quit` are commands
    Interactive {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the models the selected backend supports
    Models,
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    logger::init_with_config(
        LoggerConfig::new()
            .with_level(cli.log_level)
            .with_json_output(cli.json_logs),
    )?;
    if !dotenv_loaded {
        log::debug!("No .env file found, using process environment only");
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::from_env()?;
    if let Some(backend) = cli.backend {
        config = config.with_backend(backend);
    }
    logger::log_config_info(&config);

    let result = run(cli.command, &config).await;
    logger::flush();
    result
}

async fn run(
    command: Command,
    config: &AppConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::Models => {
            for model in imaginai::supported_models(config.backend) {
                let kind = match model.category {
                    ModelCategory::Text => "text",
                    ModelCategory::Image => "image",
                };
                println!("{:<6} {:<48} {} ({})", kind, model.id, model.name, model.provider);
            }
        }
        Command::Generate {
            prompt,
            download,
            out,
        } => {
            let orchestrator = connect(config).await?;
            let mut session = GenerationSession::new(orchestrator);
            let outcome = session.submit(&prompt).await?;
            print_outcome(&session, &outcome);

            if download && outcome.is_success() {
                let dir = out.unwrap_or_else(|| config.download_dir.clone());
                let path = session.download(&dir).await?;
                println!("Saved to {}", path.display());
            }
            if !outcome.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Interactive { out } => {
            let orchestrator = connect(config).await?;
            let dir = out.unwrap_or_else(|| config.download_dir.clone());
            run_interactive(GenerationSession::new(orchestrator), dir).await?;
        }
        Command::Serve { port } => {
            let port = port.unwrap_or_else(|| config.port());
            serve(config, port).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn connect(config: &AppConfig) -> imaginai::Result<Arc<imaginai::Orchestrator>> {
    let policy = Arc::new(ImprovementPolicy::default());
    Ok(Arc::new(build_orchestrator(config, policy).await?))
}

#[cfg(feature = "server")]
async fn serve(config: &AppConfig, port: u16) -> imaginai::Result<()> {
    let orchestrator = connect(config).await?;
    imaginai::server::serve(orchestrator, port).await
}

#[cfg(not(feature = "server"))]
async fn serve(_config: &AppConfig, _port: u16) -> imaginai::Result<()> {
    Err(imaginai::ImaginError::ConfigError(
        "HTTP server not compiled in; rebuild with --features server".into(),
    ))
}

async fn run_interactive(mut session: GenerationSession, dir: PathBuf) -> imaginai::Result<()> {
    println!("Enter a prompt, or :regen, :download, :quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        let result = match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":regen" => session.regenerate().await.map(Some),
            ":download" => session.download(&dir).await.map(|path| {
                println!("Saved to {}", path.display());
                None
            }),
            prompt => session.submit(prompt).await.map(Some),
        };

        match result {
            Ok(Some(outcome)) => print_outcome(&session, &outcome),
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

fn print_outcome(session: &GenerationSession, outcome: &GenerationOutcome) {
    if let Some(error) = &outcome.error {
        println!("Error: {}", error);
    }
    if let Some(enhanced) = session.prompt_enhancement() {
        println!("Prompt enhanced: {}", enhanced);
    }
    if let Some(url) = &outcome.image_url {
        if url.starts_with("data:") {
            println!("Image: inline data ({} bytes encoded)", url.len());
        } else {
            println!("Image: {}", url);
        }
    }
}
