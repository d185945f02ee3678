use clap::Parser;
use slides_writer_api::Config;
use slides_writer_api::SlidesClient;
use slides_writer_api::replace_text;
use slides_writer_api::resolve_text_boxes;
use slides_writer_login::LoginError;
use slides_writer_login::ServerOptions;
use slides_writer_login::load_or_login;
use slides_writer_login::read_app_credentials;
use slides_writer_login::run_login_server;
use slides_writer_login::try_read_token_cache;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(
    name = "slides-writer",
    version,
    about = "Write slide text in a Google Slides presentation, as an MCP server or from the command line"
)]
struct MultitoolCli {
    #[clap(subcommand)]
    subcommand: Option<Subcommand>,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Run the one-time OAuth authorization flow and cache the credential.
    Auth,

    /// Replace the title or content text box on a slide.
    WriteSlide(WriteSlideCommand),
}

#[derive(Debug, clap::Args)]
#[command(allow_missing_positional = true)]
struct WriteSlideCommand {
    /// 1-based slide number to update.
    #[arg(default_value_t = 1)]
    slide: usize,

    /// Which text box on the slide to replace.
    #[arg(value_enum)]
    target: SlideTarget,

    /// The replacement text.
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum SlideTarget {
    Title,
    Content,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is reserved for the MCP transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = MultitoolCli::parse();
    let config = Config::default();

    match cli.subcommand {
        Some(Subcommand::Auth) => run_auth(config).await,
        Some(Subcommand::WriteSlide(command)) => run_write_slide(config, command).await,
        None => {
            slides_writer_mcp_server::run_main(config).await?;
            Ok(())
        }
    }
}

#[derive(Debug)]
enum AuthOutcome {
    AlreadyAuthenticated,
    Completed,
}

async fn run_auth(config: Config) -> anyhow::Result<()> {
    let opts = config.login_options();
    let token_path = opts.token_path.clone();
    match obtain_credential(opts).await {
        Ok(AuthOutcome::AlreadyAuthenticated) => {
            eprintln!(
                "Already authenticated; cached credentials found at {}.",
                token_path.display()
            );
            Ok(())
        }
        Ok(AuthOutcome::Completed) => {
            eprintln!("Authentication completed successfully.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Authentication failed: {e}");
            std::process::exit(1);
        }
    }
}

/// The app-credentials file is required in every case, cached tokens or
/// not; a deployment with a cache but no credentials cannot refresh and
/// should fail here rather than later.
async fn obtain_credential(opts: ServerOptions) -> Result<AuthOutcome, LoginError> {
    read_app_credentials(&opts.credentials_path)?;
    if try_read_token_cache(&opts.token_path).is_ok() {
        return Ok(AuthOutcome::AlreadyAuthenticated);
    }

    let server = run_login_server(opts)?;
    eprintln!(
        "Starting local login server on http://localhost:{}.\nIf your browser did not open, navigate to this URL to authenticate:\n\n{}",
        server.actual_port, server.auth_url
    );
    server.block_until_done().await?;
    Ok(AuthOutcome::Completed)
}

async fn run_write_slide(config: Config, command: WriteSlideCommand) -> anyhow::Result<()> {
    match write_slide(&config, &command).await {
        Ok(()) => {
            eprintln!("Update successful.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error updating slide: {e}");
            std::process::exit(1);
        }
    }
}

async fn write_slide(
    config: &Config,
    command: &WriteSlideCommand,
) -> slides_writer_api::Result<()> {
    let auth = load_or_login(config.login_options()).await?;
    let client = SlidesClient::new(auth, config.api_base_url.clone());
    let presentation = client
        .get_presentation(&config.presentation_id, None)
        .await?;
    let pair = resolve_text_boxes(&presentation, command.slide)?;
    let element_id = match command.target {
        SlideTarget::Title => &pair.title_id,
        SlideTarget::Content => &pair.content_id,
    };
    replace_text(&client, &config.presentation_id, element_id, &command.text).await
}
