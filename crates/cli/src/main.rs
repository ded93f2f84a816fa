//! `lumen` -- terminal host for the gallery session engine.
//!
//! Reads one action per line from stdin (see `help`) and drives a
//! gallery session against a live image server. Session events are
//! printed as JSON lines.
//!
//! # Environment variables
//!
//! | Variable         | Required | Default | Description                         |
//! |------------------|----------|---------|-------------------------------------|
//! | `LUMEN_USERNAME` | no       | --      | Log in with these credentials first |
//! | `LUMEN_PASSWORD` | no       | --      | Password for `LUMEN_USERNAME`       |
//!
//! Engine settings (`LUMEN_BASE_URL`, `LUMEN_PAGE_SIZE`, ...) are read by
//! `SessionConfig::from_env`.

use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use lumen_cli::input::{self, Input, HELP};
use lumen_cli::view;
use lumen_client::api::GalleryApi;
use lumen_client::wire::UploadFile;
use lumen_core::validation::Credentials;
use lumen_events::bus::{EventBus, GalleryEvent};
use lumen_session::commands::CommandScope;
use lumen_session::config::SessionConfig;
use lumen_session::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumen=info,lumen_cli=info,lumen_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SessionConfig::from_env().context("invalid configuration")?;
    let run_id = Uuid::new_v4();
    tracing::info!(
        %run_id,
        base_url = %config.base_url,
        page_size = config.page_size,
        upload_concurrency = config.upload_concurrency,
        "Starting lumen",
    );

    let api = GalleryApi::new(config.base_url.clone(), config.request_timeout)
        .context("failed to build HTTP client")?;

    if let (Ok(username), Ok(password)) = (
        std::env::var("LUMEN_USERNAME"),
        std::env::var("LUMEN_PASSWORD"),
    ) {
        api.login(&Credentials::new(username, password))
            .await
            .context("login failed")?;
        tracing::info!("Logged in");
    }

    let bus = Arc::new(EventBus::default());
    let session = Session::new(config, Arc::new(api), bus.clone());
    tokio::spawn(print_events(bus.subscribe()));

    session.start()?;
    let scope = session.activate_commands()?;
    if let Err(e) = session.commit_term("").await {
        tracing::warn!(error = %e, "Initial page load failed");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };

        let input = match input::parse(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if input == Input::Quit {
            break;
        }
        if let Err(e) = run(&session, &scope, input).await {
            eprintln!("error: {e:#}");
        }
    }

    drop(scope);
    session.shutdown().await;
    Ok(())
}

async fn run(session: &Session, scope: &CommandScope, input: Input) -> anyhow::Result<()> {
    match input {
        Input::Search(term) => {
            session.commit_term(term).await?;
        }
        Input::Type(text) => session.set_query(text)?,
        Input::More => {
            session.advance().await?;
        }
        Input::Scroll => {
            session.sentinel()?.notify_visible();
        }
        Input::All => {
            let count = session.load_all().await?;
            println!("loaded {count} images");
        }
        Input::Open(id) => session.open(&id).await?,
        Input::Click { id, extend } => {
            session.click(&id, extend).await?;
        }
        Input::Key(event) => {
            if !scope.handle_key(&event).await? {
                println!("(no effect)");
            }
        }
        Input::Command(command) => {
            if !scope.dispatch(command).await? {
                println!("(no effect)");
            }
        }
        Input::AddTags(tags) => {
            let changed = session.add_tags(tags).await?;
            println!("{changed} images updated");
        }
        Input::RemoveTags(tags) => {
            let changed = session.remove_tags(tags).await?;
            println!("{changed} images updated");
        }
        Input::Upload(paths) => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                let file = UploadFile::from_path(path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))?;
                files.push(file);
            }
            let batch = session.upload(files).await?;
            tokio::spawn(async move {
                match batch.wait().await {
                    Ok(summary) => tracing::info!(
                        done = summary.done,
                        failed = summary.failed,
                        "Upload batch settled"
                    ),
                    Err(e) => tracing::error!(error = %e, "Upload batch failed"),
                }
            });
        }
        Input::Layout => print!("{}", view::describe(&session.render_model().await)),
        Input::Tags => {
            for (tag, coverage) in session.tag_coverage().await {
                println!("{tag} ({coverage:?})");
            }
        }
        Input::Status => {
            println!(
                "term={:?} images={} mode={:?} lightbox={:?}",
                session.term().await,
                session.images().await.len(),
                session.mode().await,
                session.lightbox().await
            );
            if let Some(batch) = session.upload_snapshot().await {
                print!("{}", view::describe_upload(&batch));
            }
        }
        Input::Help => println!("{HELP}"),
        Input::Quit => {}
    }
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<GalleryEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = view::event_line(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
