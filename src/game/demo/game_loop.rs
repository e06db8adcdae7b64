//! Interactive terminal rounds.
//!
//! Wires a session with the default grid and monster count, redraws on every
//! published change, and forwards `x y` tap lines from stdin until the game
//! stops or the board is cleared. Difficulty comes from the first program
//! argument; after each round the player may start a fresh one.

use std::env;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::config::game::{GRID_HEIGHT, GRID_WIDTH, MONSTER_COUNT};
use crate::game::demo::render::print_snapshot;
use crate::game::session::GameSession;
use crate::game::types::{CellIcon, Difficulty, GameMode};

/// Parse a tap line of the form "x y".
fn parse_tap(line: &str) -> Option<(i32, i32)> {
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((x, y))
}

/// Difficulty names accepted on the command line.
fn parse_difficulty(arg: &str) -> Option<Difficulty> {
    match arg {
        "normal" => Some(Difficulty::Normal),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}

/// Run terminal games until the player quits.
pub async fn run_demo() -> std::io::Result<()> {
    let session = GameSession::new();
    if let Some(arg) = env::args().nth(1) {
        match parse_difficulty(&arg) {
            Some(difficulty) => session.set_difficulty(difficulty),
            None => warn!("[Demo] unknown difficulty {:?}, staying on normal", arg),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        play_round(&session, &mut lines).await?;

        println!("play again? [y/N]");
        match lines.next_line().await? {
            Some(answer) if answer.trim() == "y" => session.reset(),
            _ => break,
        }
    }
    Ok(())
}

/// One full game: spawn, start, forward taps, report the score.
async fn play_round(
    session: &GameSession,
    lines: &mut Lines<BufReader<Stdin>>,
) -> std::io::Result<()> {
    session.configure(GRID_WIDTH, GRID_HEIGHT);
    let placed = session.generate_monsters(MONSTER_COUNT);
    let (width, height) = session.dimensions();
    info!(
        "[Demo] {} monsters on a {}x{} board, difficulty {:?}",
        placed,
        width,
        height,
        session.difficulty()
    );

    // Redraw whenever the world publishes, until the game stops.
    let mut changes = session.subscribe();
    let renderer = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let snapshot = changes.borrow_and_update().clone();
            print_snapshot(&snapshot);
            if snapshot.mode == GameMode::Stopped {
                break;
            }
        }
    });

    session.start_game();
    println!("tap a cell by typing `x y` + Enter; X is vulnerable, o is safe.");
    println!("`r` redraws, `q` ends the round.");

    while session.mode() == GameMode::Running {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "q" => break,
            "r" => {
                session.refresh();
                continue;
            }
            tap => match parse_tap(tap) {
                Some((x, y)) => {
                    if session.touch_cell(x, y) {
                        println!("hit!");
                    } else {
                        match session.icon_at(x, y) {
                            CellIcon::Blank => println!("miss, nothing there"),
                            CellIcon::Safe => println!("miss, it is safe right now"),
                            CellIcon::Vulnerable => println!("miss"),
                        }
                    }
                }
                None => println!("could not read that, try e.g. `2 3`"),
            },
        }
        if session.is_game_over() {
            break;
        }
    }

    session.stop_game();
    let _ = renderer.await;
    println!(
        "final score: {:?} with {}s left",
        session.score(),
        session.time_remaining()
    );
    Ok(())
}
