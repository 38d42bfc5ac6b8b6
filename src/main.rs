mod tui;

use anyhow::{Context, Result};
use classfeed::classroom::auth::Credentials;
use classfeed::classroom::rest::ClassroomRest;
use classfeed::classroom::ClassroomApi;
use classfeed::config::Config;
use classfeed::engine::feed::FeedEngine;
use classfeed::storage::FileStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("classfeed.log")?;
    tracing_subscriber::fmt()
        .with_env_filter("classfeed=info")
        .with_writer(log_file)
        .init();

    let config = Config::load(Path::new("config.toml"))?;

    // Load saved values from .env (real env vars take precedence)
    Config::load_env_file();

    println!();
    println!("  classfeed v0.1.0");
    println!("  ================");
    println!();
    println!("  Loading credentials (.env / env vars / interactive prompt):");
    println!();

    let api_key = Config::classroom_api_key()?;
    let email = Config::sign_in_email()?;
    let password = Config::sign_in_password()?;

    let rest = Arc::new(ClassroomRest::new(&config.api, api_key));
    rest.sign_in(&Credentials { email, password })
        .await
        .context("sign-in failed")?;

    println!();
    println!("  Signed in. Starting...");
    println!();

    let store = Box::new(FileStore::open(Path::new(&config.storage.state_path)));
    let mut engine = FeedEngine::new(
        rest.clone(),
        store,
        Duration::from_millis(config.feed.sync_delay_ms),
    );

    // Profile failure is non-fatal; posts just lose the "that's me" shortcut.
    match rest.fetch_profile().await {
        Ok(profile) => engine.set_profile(profile),
        Err(err) => tracing::warn!(%err, "profile fetch failed"),
    }

    if let Err(err) = engine.load_feed().await {
        tracing::warn!(%err, "initial feed load failed");
    }

    let api: Arc<dyn ClassroomApi> = rest;
    tui::run(&mut engine, api, &config).await
}
