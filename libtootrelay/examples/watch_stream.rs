//! Print the user stream without relaying anything
//!
//! Useful for checking which screen names show up before writing relays.
//!
//! Usage:
//!   cargo run --example watch_stream                     # uses the default config
//!   cargo run --example watch_stream -- path/to/config.toml

use std::path::PathBuf;

use futures::StreamExt;
use libtootrelay::twitter::StreamWith;
use libtootrelay::{Config, StreamMessage, TwitterClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    libtootrelay::logging::init_default();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(path.as_deref())?;

    let client = TwitterClient::new(&config.twitter)?;
    let user = client.verify_credentials().await?;
    println!("Watching the home stream of @{}\n", user.screen_name);

    let mut stream = client.user_stream(StreamWith::Followings).await?;
    while let Some(message) = stream.next().await {
        match message? {
            StreamMessage::Tweet(tweet) => {
                let marker = if tweet.is_reshare() { "RT" } else { "  " };
                println!("{} @{}: {}", marker, tweet.user.screen_name, tweet.text);
            }
            other => println!("-- {}", other.kind()),
        }
    }

    println!("\nStream closed");
    Ok(())
}
