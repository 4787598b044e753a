//! feedview - read feeds through a running rss-proxy from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::Url;
use tracing_subscriber::{fmt, EnvFilter};

use rss_proxy::storage::{JsonFileStore, KeyValueStore};
use rss_proxy::viewer::{AppContext, Viewer};

#[derive(Parser, Debug)]
#[command(name = "feedview", about = "Show RSS and Atom feeds via rss-proxy")]
struct Args {
    /// Base URL of the proxy server
    #[arg(long, default_value = "http://localhost:3000")]
    proxy: Url,

    /// File holding saved feeds and the theme preference
    #[arg(long, value_name = "FILE", default_value = "feedview.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and display a feed
    Show {
        url: String,
        /// Print the HTML fragment instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Remember a feed URL
    Save { url: String },
    /// Forget a feed URL
    Remove { url: String },
    /// List saved feeds, newest first
    List,
    /// Show or change the theme preference
    Theme { mode: Option<ThemeMode> },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeMode {
    Dark,
    Light,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&args.state));
    let mut ctx = AppContext::new(store, Viewer::new(args.proxy)?);

    match args.command {
        Command::Show { url, html } => show(&ctx, &url, html).await,
        Command::Save { url } => {
            if ctx.saved_feeds.add(&url) {
                println!("Saved {}", url.trim());
            } else {
                println!("Not saved: already present or not an http(s) URL");
            }
            Ok(())
        }
        Command::Remove { url } => {
            ctx.saved_feeds.remove(&url);
            Ok(())
        }
        Command::List => {
            for url in ctx.saved_feeds.list() {
                println!("{}", url);
            }
            Ok(())
        }
        Command::Theme { mode } => {
            if let Some(mode) = mode {
                ctx.theme.set(matches!(mode, ThemeMode::Dark));
            }
            println!("{}", if ctx.theme.get() { "dark" } else { "light" });
            Ok(())
        }
    }
}

async fn show(ctx: &AppContext, url: &str, html: bool) -> anyhow::Result<()> {
    ctx.viewer.load_feed(url).await;
    let state = ctx.viewer.display().snapshot();

    if let Some(message) = state.error {
        anyhow::bail!(message);
    }
    let Some(view) = state.content else {
        return Ok(());
    };

    if html {
        println!("{}", view.html);
        return Ok(());
    }

    let feed = &view.feed;
    println!("{}", feed.title);
    if let Some(subtitle) = &feed.subtitle {
        println!("{}", subtitle);
    }
    println!("{} {}\n", feed.entries.len(), feed.count_label);

    for entry in &feed.entries {
        println!("* {}", entry.title);
        println!("  {}", entry.link);
        if let Some(published) = &entry.published {
            println!("  {}", published);
        }
        if let Some(summary) = &entry.summary {
            println!("  {}", summary);
        }
        println!();
    }

    Ok(())
}
