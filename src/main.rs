use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(not(windows))]
use colorful::{Color, Colorful};
use ga_link::links::{self, Link};
use ga_link::settings::{save_game_keys, stored_keys};
use ga_link::{
    ApiClient, ClientOptions, Credential, OrganizationTree, Platform, Selection, Session,
    SessionEvent, TomlConfigStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Link a GameAnalytics account to a game project.
#[derive(Parser)]
#[command(name = "ga-link", version, about)]
struct Cli {
    /// User API base URL.
    #[arg(long, env = "GA_LINK_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Verbose request logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and list the account's studios and games.
    Login(LoginArgs),
    /// Log in, select a game and save its keys into the settings file.
    Select {
        #[command(flatten)]
        login: LoginArgs,
        #[arg(long, value_enum)]
        platform: PlatformArg,
        /// Studio id.
        #[arg(long)]
        studio: i64,
        /// Game id.
        #[arg(long)]
        game: i64,
        #[arg(long)]
        settings: PathBuf,
    },
    /// Print the game keys stored in the settings file.
    Show {
        #[arg(long)]
        settings: PathBuf,
    },
    /// Open the documentation in the browser.
    Docs,
    /// Open the account sign-up page in the browser.
    Signup,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "GA_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Ios,
    Android,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ios => Platform::Ios,
            PlatformArg::Android => Platform::Android,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(cli.debug))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut options = ClientOptions::from_env();
    if let Some(url) = cli.base_url {
        options.base_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        options.timeout = Duration::from_secs(secs);
    }
    options.debug = cli.debug;

    match cli.command {
        Command::Login(login) => {
            let tree = load_organization(options, login)?;
            print_tree(&tree);
        }
        Command::Select {
            login,
            platform,
            studio,
            game,
            settings,
        } => {
            let tree = load_organization(options, login)?;
            let platform = Platform::from(platform);

            let studio = tree
                .studio(studio)
                .ok_or_else(|| anyhow!("studio {} is not part of this account", studio))?;
            let game = studio
                .game(game)
                .cloned()
                .ok_or_else(|| anyhow!("game {} is not part of studio {}", game, studio.name))?;

            let mut selection = Selection::default();
            selection.select_studio(studio.clone());
            let game = selection.select_game(game)?;

            let mut store = TomlConfigStore::open(&settings)?;
            save_game_keys(&mut store, platform, game)?;
            report(&format!(
                "Platform selected: {}, game key saved: {}",
                platform, game.game_key
            ));
        }
        Command::Show { settings } => {
            let store = TomlConfigStore::open(&settings)?;
            for platform in Platform::ALL {
                match stored_keys(&store, platform) {
                    Some((game_key, _)) => println!("{}: {}", platform, game_key),
                    None => println!("{}: (not set)", platform),
                }
            }
        }
        Command::Docs => links::open_link(Link::Documentation)?,
        Command::Signup => links::open_link(Link::Signup)?,
    }

    Ok(())
}

/// Log filter used when `RUST_LOG` is not set.
fn default_log_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn,ga_link=info"
    }
}

/// Runs login and fetch to completion and returns the loaded tree.
fn load_organization(
    options: ClientOptions,
    login: LoginArgs,
) -> anyhow::Result<OrganizationTree> {
    let session = Session::new(ApiClient::new(options)?);
    let events = session
        .login(Credential::new(login.email, login.password))
        .context("a user API request is already in flight")?;

    let mut loaded = false;
    for event in events {
        if event.is_failure() {
            report_failure(&event.message());
        } else {
            report(&event.message());
        }
        loaded |= matches!(event, SessionEvent::OrganizationLoaded { .. });
    }

    if !loaded {
        bail!("could not load the account's studios");
    }

    Ok(session.organization())
}

fn print_tree(tree: &OrganizationTree) {
    if tree.is_empty() {
        println!("No studios found for this account.");
        return;
    }

    for studio in tree.studios() {
        println!("{} ({})", studio.name, studio.id);
        for game in tree.games_of(studio.id) {
            println!("  - {} ({}) key {}", game.name, game.id, game.game_key);
        }
    }
}

fn report(message: &str) {
    #[cfg(windows)]
    println!("{}", message.trim_end());

    #[cfg(not(windows))]
    println!(
        "{}",
        message
            .trim_end()
            .gradient_with_color(Color::Cyan, Color::SpringGreen4)
    );
}

fn report_failure(message: &str) {
    #[cfg(windows)]
    eprintln!("{}", message.trim_end());

    #[cfg(not(windows))]
    eprintln!("{}", message.trim_end().color(Color::Red));
}
