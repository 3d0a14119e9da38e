//! toot-relay - relay tweets to Mastodon

use std::path::PathBuf;

use clap::Parser;
use libtootrelay::daemon::Daemon;
use libtootrelay::logging::{self, LogFormat};
use libtootrelay::{Config, Result};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "toot-relay")]
#[command(version)]
#[command(about = "Relay tweets from a Twitter home stream to Mastodon accounts")]
#[command(long_about = "\
toot-relay - Relay tweets from a Twitter home stream to Mastodon accounts

DESCRIPTION:
    toot-relay signs in to Twitter, opens the user stream of the configured
    account (its own tweets and those of every account it follows) and, for
    each new tweet whose author matches a configured relay, posts the tweet
    text and a link back to it on that relay's Mastodon account.

    Retweets are never relayed. Only the first relay configured for a
    screen name is used. Failed posts are logged and skipped.

CONFIGURATION:
    Looked up in order: --config, $TOOTRELAY_CONFIG, ./config.toml,
    ~/.config/toot-relay/config.toml

    [twitter]
    consumer_key = \"...\"
    consumer_secret = \"...\"
    access_key = \"...\"
    access_secret = \"...\"

    [[relays]]
    mastodon = { server = \"https://mastodon.social\", access_token = \"...\" }
    twitter = { screen_name = \"alice\" }

EXIT CODES:
    0 - Twitter closed the stream
    1 - Runtime error (stream failure, network error)
    2 - Authentication error
    3 - Configuration error
")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log format: text, json or pretty (overrides $TOOTRELAY_LOG_FORMAT)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logging = logging::from_env(cli.verbose);
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    logging.init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    info!("toot-relay starting");
    let daemon = Daemon::from_config(&config)?;
    daemon.run().await?;

    info!("toot-relay stopped");
    Ok(())
}
