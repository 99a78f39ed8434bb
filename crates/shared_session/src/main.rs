//! Shared Games - demo CLI
//!
//! Plays tic-tac-toe through the session controller against an
//! in-memory store, or inspects a stored snapshot.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use shared_session::{
    ForfeitOutcome, GameSessionController, MemoryNotifier, MemoryStore, Notification,
    SessionConfig, SubmitOutcome,
};
use shared_tictactoe::{Position, Snapshot, TicTacToeGame};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Demo {
            host,
            guest,
            config,
        } => run_demo(host, guest, config).await,
        Command::Inspect { path, player, host } => run_inspect(path, player, host),
    }
}

/// Delivers every queued notification to its controller.
async fn drain(
    controller: &mut GameSessionController<shared_session::MemoryStoreClient, MemoryNotifier>,
    inbox: &mut UnboundedReceiver<Notification>,
) -> Result<()> {
    while let Ok(notification) = inbox.try_recv() {
        info!(
            user = controller.username(),
            key = %notification.key(),
            text = %notification.text(),
            "Notification received"
        );
        controller.handle_notification(&notification).await?;
    }
    Ok(())
}

/// Run a scripted match between two in-memory clients
#[instrument]
async fn run_demo(host: String, guest: String, config: Option<PathBuf>) -> Result<()> {
    let config = match config {
        Some(path) => SessionConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let store = MemoryStore::new();
    let notifier = MemoryNotifier::new();
    let mut host_inbox = notifier.subscribe(&host).await;
    let mut guest_inbox = notifier.subscribe(&guest).await;

    let mut host_ctl =
        GameSessionController::with_config(store.client(&host), notifier.clone(), config.clone());
    let mut guest_ctl = GameSessionController::with_config(store.client(&guest), notifier, config);

    let share = host_ctl.create_game().await?;
    print!("{}", guest_ctl.find_games().await?.render());
    guest_ctl.join_game(&share).await?;
    drain(&mut host_ctl, &mut host_inbox).await?;

    // Host takes the top row while the guest plays the middle row.
    let script = [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0)];
    for (turn, (x, y)) in script.into_iter().enumerate() {
        let position = Position::new(x, y)?;
        let (mover, inbox) = if turn % 2 == 0 {
            (&mut host_ctl, &mut guest_inbox)
        } else {
            (&mut guest_ctl, &mut host_inbox)
        };
        match mover.submit_move(position).await? {
            SubmitOutcome::Applied => info!(player = mover.username(), %position, "Move applied"),
            outcome => warn!(player = mover.username(), ?outcome, "Move not applied"),
        }
        let receiver = if turn % 2 == 0 {
            &mut guest_ctl
        } else {
            &mut host_ctl
        };
        drain(receiver, inbox).await?;
    }

    for controller in [&guest_ctl, &host_ctl] {
        if let Some(game) = controller.current_game() {
            println!("{}'s view:", controller.username());
            println!("{}", game.board().display());
            println!("{}\n", game.status());
        }
    }

    if let ForfeitOutcome::RoundAlreadyOver(end) = guest_ctl.forfeit_game().await? {
        info!(%end, "Forfeit after the round ended is a no-op");
    }

    print!("{}", guest_ctl.to_lobby().await?.render());
    Ok(())
}

/// Decode a stored snapshot and print board and status
#[instrument]
fn run_inspect(path: PathBuf, player: Option<String>, host: Option<String>) -> Result<()> {
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let snapshot = Snapshot::decode(raw.trim())?;

    let first_player = snapshot.moves.keys().next().cloned().unwrap_or_default();
    let host = host.unwrap_or_else(|| first_player.clone());
    let player = player.unwrap_or(first_player);

    let mut game = TicTacToeGame::new(player, host);
    game.apply_snapshot(snapshot)?;
    if let Err(violations) = game.check_invariants() {
        for violation in violations {
            println!("warning: {}", violation.description);
        }
    }

    println!("{}", game.users().join(" vs "));
    println!("{}", game.board().display());
    println!("{}", game.status());
    Ok(())
}
