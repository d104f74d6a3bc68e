use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spotcli::{cli, config, error, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Output more info and debug logs
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage user authentication for spotcli
    Auth(AuthOptions),

    /// Browse your playlists
    Lists(ListsOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthSubcommand {
    /// Authorize spotcli to access the Spotify API
    Login(LoginOptions),

    /// Show who's logged in (with --verbose, also where credentials are stored)
    Status,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOptions {
    /// Authenticate with your own application ID (helps avoid rate limiting)
    #[clap(long, requires = "client_secret")]
    pub client_id: Option<String>,

    /// Required if --client-id is provided
    #[clap(long, requires = "client_id")]
    pub client_secret: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListsOptions {
    /// Number of items to show per page
    #[clap(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub limit: u32,

    /// Output the raw API response
    #[clap(long)]
    pub raw: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("spotcli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let result = match cli.command {
        Command::Auth(opt) => match opt.command {
            AuthSubcommand::Login(o) => cli::login(o.client_id, o.client_secret).await,
            AuthSubcommand::Status => cli::status(cli.verbose).await,
        },
        Command::Lists(opt) => cli::lists(opt.limit, opt.raw).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
