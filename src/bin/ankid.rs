//! Interactive console front end for ANKID.
//!
//! Pure glue: renders screens from [`AppState`] views and session events,
//! and forwards user input to the conversation controller. On platforms
//! without speech engines, typed chat is the input path and replies are
//! rendered instead of synthesized.

use ankid::app::{AppState, Difficulty, Section};
use ankid::conversation::{Command, ConversationController, SessionEvent};
use ankid::speech::console::{ConsolePlayback, UnsupportedCapture};
use ankid::tutor::DialogueEngine;
use ankid::tutor::rating::RatingGenerator;
use ankid::{AppConfig, GenerativeApi, LanguageModel, TutorError};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing. Quiet by default; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ankid=warn")),
        )
        .init();

    println!("ANKID v{}", env!("CARGO_PKG_VERSION"));

    let config_path = AppConfig::default_config_path();
    let config = if config_path.exists() {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    // A missing credential must not take the flashcards down with it: chat
    // degrades to the apology path and the guidance is shown up front.
    let model: Arc<dyn LanguageModel> = match GenerativeApi::new(&config.model) {
        Ok(api) => Arc::new(api),
        Err(TutorError::Credential(guidance)) => {
            println!("\nNote: {guidance}\n");
            Arc::new(ankid::llm::UnconfiguredModel::new(guidance))
        }
        Err(e) => return Err(e.into()),
    };

    let (capture, capture_rx) = UnsupportedCapture::new();
    let (playback, playback_rx) = ConsolePlayback::new();
    let engine = DialogueEngine::new(Arc::clone(&model));
    let rater = RatingGenerator::new(model);

    let (controller, handle) = ConversationController::new(
        engine,
        rater,
        Box::new(capture),
        capture_rx,
        Box::new(playback),
        playback_rx,
        &config,
    );
    tokio::spawn(controller.run());

    // Render session events as they arrive.
    let mut events = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::AssistantTurn(text) => println!("Tutor: {text}"),
                SessionEvent::Alert(msg) => println!("! {msg}"),
                SessionEvent::RatingStarted => println!("Evaluating your session..."),
                SessionEvent::RatingReady(rating) => {
                    println!("\nSession rating: {}/10", rating.score);
                    println!("{}", rating.feedback);
                    for s in &rating.strengths {
                        println!("  + {s}");
                    }
                    for i in &rating.improvements {
                        println!("  - {i}");
                    }
                }
                _ => {}
            }
        }
    });

    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            shutdown.shutdown();
        }
    });

    println!(
        "Voice capture isn't available in this build; chat by typing and replies are \
         rendered as text."
    );
    println!("Type /help for commands, or just start chatting with your tutor.\n");

    let mut state = AppState::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" {
            break;
        }
        handle_input(input, &mut state, &handle);
    }

    handle.shutdown();
    Ok(())
}

fn handle_input(input: &str, state: &mut AppState, handle: &ankid::ControllerHandle) {
    match input {
        "/help" => print_help(),
        "/dashboard" => {
            state.show_section(Section::Dashboard);
            render_dashboard(state);
        }
        "/cards" => {
            state.show_section(Section::Collection);
            render_collection(state);
        }
        "/market" => {
            state.show_section(Section::Marketplace);
            render_marketplace(state);
        }
        "/quests" => {
            state.show_section(Section::Quests);
            render_quests(state);
        }
        "/board" => {
            state.show_section(Section::Leaderboard);
            render_leaderboard(state);
        }
        "/study" => {
            state.show_section(Section::Study);
            match state.start_study_session() {
                Ok(()) => render_study_card(state),
                Err(e) => println!("! {e}"),
            }
        }
        "/show" => {
            state.reveal_answer();
            render_study_card(state);
        }
        "/got" | "/missed" => {
            match state.mark_card(input == "/got") {
                Ok(()) => render_study_card(state),
                Err(e) => println!("! {e}"),
            }
        }
        "/next" => {
            state.next_card();
            render_study_card(state);
        }
        "/prev" => {
            state.prev_card();
            render_study_card(state);
        }
        "/end" => {
            state.end_study_session();
            println!("Study session ended.");
        }
        "/rate" => handle.send(Command::RateSession),
        "/voice" => handle.send(Command::StartConversation),
        "/stop" => handle.send(Command::StopConversation),
        _ if input.starts_with("/add ") => add_card(state, &input[5..]),
        _ if input.starts_with("/buy ") => match input[5..].trim().parse::<u32>() {
            Ok(id) => match state.purchase(id) {
                Ok(()) => println!("Purchased! {} coins left.", state.stats().coins),
                Err(e) => println!("! {e}"),
            },
            Err(_) => println!("! usage: /buy <listing id>"),
        },
        _ if input.starts_with('/') => println!("! unknown command, try /help"),
        _ => {
            state.show_section(Section::Chat);
            println!("You: {input}");
            handle.send(Command::SendText(input.to_owned()));
        }
    }
}

fn add_card(state: &mut AppState, args: &str) {
    let parts: Vec<&str> = args.split('|').map(str::trim).collect();
    let [front, back, subject, rest @ ..] = parts.as_slice() else {
        println!("! usage: /add front | back | subject [| easy/medium/hard]");
        return;
    };
    let difficulty = match rest.first().map(|d| d.to_ascii_lowercase()) {
        Some(d) if d == "medium" => Difficulty::Medium,
        Some(d) if d == "hard" => Difficulty::Hard,
        _ => Difficulty::Easy,
    };
    match state.add_card(front, back, subject, difficulty) {
        Ok(id) => println!("Created card #{id}."),
        Err(e) => println!("! {e}"),
    }
}

fn print_help() {
    println!(
        "\
Commands:
  /dashboard /cards /market /quests /board   browse screens
  /study /show /got /missed /next /prev /end study flashcards
  /add front | back | subject [| difficulty] create a card
  /buy <listing id>                          buy a marketplace card
  /voice /stop                               start/stop voice conversation
  /rate                                      rate the chat session
  /quit                                      exit
Anything else is sent to your tutor."
    );
}

fn render_dashboard(state: &AppState) {
    let stats = state.stats();
    println!("\nWelcome back, Scholar!");
    println!(
        "Level {}  |  {} XP ({} to next)  |  {} day streak",
        stats.level, stats.xp, stats.xp_to_next, stats.streak
    );
    println!(
        "Cards: {} ({} mastered, {}% accuracy)  |  Coins: {}  Gems: {}",
        stats.total_cards,
        stats.mastered_cards,
        state.accuracy_percent(),
        stats.coins,
        stats.gems
    );
}

fn render_study_card(state: &AppState) {
    let Some(study) = state.study() else {
        println!("! no active study session, try /study");
        return;
    };
    let Some(card) = state.current_card() else {
        return;
    };
    println!(
        "\nCard {} of {} [{} / {:?}]",
        study.card_index + 1,
        state.cards().len(),
        card.subject,
        card.difficulty
    );
    if study.show_answer {
        println!("A: {}", card.back);
        println!("(/got or /missed, /prev, /end)");
    } else {
        println!("Q: {}", card.front);
        println!("(/show to reveal, /next, /end)");
    }
}

fn render_collection(state: &AppState) {
    println!("\nYour collection:");
    for card in state.cards() {
        let status = if card.mastered { "mastered" } else { "learning" };
        println!(
            "  #{} [{} / {:?}] {} ({status})",
            card.id, card.subject, card.difficulty, card.front
        );
    }
}

fn render_marketplace(state: &AppState) {
    println!("\nMarketplace (you have {} coins):", state.stats().coins);
    for l in state.listings() {
        println!(
            "  #{} [{:?}] {} - {} coins, by {}",
            l.id, l.rarity, l.front, l.price, l.seller
        );
    }
}

fn render_quests(state: &AppState) {
    println!("\nQuests:");
    for q in state.quests() {
        let status = if q.completed { "done" } else { "open" };
        println!(
            "  [{status}] {} - {} ({}/{}, +{} XP, {:?})",
            q.title, q.description, q.progress, q.target, q.reward, q.kind
        );
    }
}

fn render_leaderboard(state: &AppState) {
    println!("\nLeaderboard:");
    for entry in state.leaderboard() {
        println!(
            "  #{} {} - {} XP, level {}, {} day streak",
            entry.rank, entry.name, entry.xp, entry.level, entry.streak
        );
    }
}
