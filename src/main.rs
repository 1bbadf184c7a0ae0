mod app;
mod error;
mod logging;
mod media;
mod model;
mod session;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio::sync::mpsc;

use app::Orchestrator;
use media::RodioBackend;
use model::catalog::CatalogClient;
use model::favorites::FavoritesStore;
use model::types::GenreDescriptor;
use session::PlaybackSession;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== trackdial starting ===");

    let catalog = Arc::new(CatalogClient::new()?);
    let favorites = Arc::new(FavoritesStore::new());
    let backend = Arc::new(RodioBackend::new()?);

    let (signals_tx, signals_rx) = mpsc::unbounded_channel();
    let (notices_tx, mut notices_rx) = mpsc::unbounded_channel::<String>();

    let session = Arc::new(Mutex::new(PlaybackSession::new(backend, signals_tx)));

    let orchestrator = Orchestrator::new(session.clone(), catalog, favorites, notices_tx);
    orchestrator.spawn_signal_listener(signals_rx);

    // one fetch per run; the list barely changes
    let genres = match orchestrator.list_genres().await {
        Ok(genres) => genres,
        Err(e) => {
            tracing::warn!(error = %e, "Genre preload failed");
            println!("{}", app::user_message(&e));
            Vec::new()
        }
    };

    tokio::spawn(async move {
        while let Some(notice) = notices_rx.recv().await {
            println!("* {notice}");
        }
    });

    print_help(&genres);
    run_repl(orchestrator, genres).await?;

    tracing::info!("trackdial shutting down");
    Ok(())
}

async fn run_repl(orchestrator: Orchestrator, genres: Vec<GenreDescriptor>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        match command {
            "" => {}
            "artist" => orchestrator.start_by_artist(rest.to_string()),
            "genre" => match pick_genre(&genres, rest) {
                Some(genre) => {
                    println!("Mixing {}...", genre.name);
                    orchestrator.start_by_genre(genre);
                }
                None => println!("Unknown genre. Type 'genres' for the list."),
            },
            "genres" => print_genres(&genres),
            "p" => orchestrator.toggle_play_pause().await,
            "+" => orchestrator.like().await,
            "-" => orchestrator.dislike().await,
            "fav" => orchestrator.save_current_favorite().await,
            "favgenre" => match pick_genre(&genres, rest) {
                Some(genre) => orchestrator.save_favorite_genre(&genre.name).await,
                None => println!("Unknown genre. Type 'genres' for the list."),
            },
            "favgenres" => match orchestrator.favorite_genres().await {
                Ok(names) if names.is_empty() => println!("No favorite genres yet."),
                Ok(names) => println!("{}", names.join(", ")),
                Err(e) => println!("{}", app::user_message(&e)),
            },
            "favs" => match orchestrator.favorites().await {
                Ok(tracks) if tracks.is_empty() => println!("No favorites yet."),
                Ok(tracks) => {
                    for (i, t) in tracks.iter().enumerate() {
                        println!("{:2}. {} — {}", i + 1, t.title, t.artist);
                    }
                }
                Err(e) => println!("{}", app::user_message(&e)),
            },
            "share" => match orchestrator.share_current().await {
                Ok(text) => println!("{text}"),
                Err(hint) => println!("* {hint}"),
            },
            "np" => {
                let session = orchestrator.session();
                let now = session.lock().await.now_playing();
                println!("{} — {} [{}]", now.title, now.artist, now.play_label);
            }
            "quit" | "q" => break,
            other => {
                tracing::debug!(command = other, "Unknown command");
                print_help(&genres);
            }
        }
    }
    Ok(())
}

fn pick_genre(genres: &[GenreDescriptor], name: &str) -> Option<GenreDescriptor> {
    if name.is_empty() {
        return None;
    }
    genres
        .iter()
        .find(|g| g.name.eq_ignore_ascii_case(name))
        .cloned()
}

fn print_genres(genres: &[GenreDescriptor]) {
    if genres.is_empty() {
        println!("No genres available.");
        return;
    }
    for g in genres {
        println!("  {}", g.name);
    }
}

fn print_help(genres: &[GenreDescriptor]) {
    println!("Commands:");
    println!("  artist <name>   search an artist and play their top previews");
    println!("  genre <name>    play a random mix from a genre");
    println!("  genres          list genres");
    println!("  p               play/pause");
    println!("  +               like (queue keeps advancing on its own)");
    println!("  -               skip to the next preview");
    println!("  fav             save the current track");
    println!("  favs            list saved tracks");
    println!("  favgenre <name> remember a genre");
    println!("  favgenres       list remembered genres");
    println!("  share           print a shareable line for the current track");
    println!("  np              show what is playing");
    println!("  quit            exit");
    if !genres.is_empty() {
        println!("Genres loaded: {}", genres.len());
    }
}
