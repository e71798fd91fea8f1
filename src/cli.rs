//! Command line front end: `prompted host` and `prompted join <CODE>`
//!
//! Both run a line-oriented prompt on stdin. Game output goes to stdout,
//! diagnostics go through tracing.

use crate::ai::AiConfig;
use crate::client::{join_room, ClientHandle};
use crate::config::{GameConfig, HostConfig};
use crate::error::{ClientError, HostError, TransportError, ValidationError};
use crate::host::{self, HostHandle, HostOptions};
use crate::media::{load_drawing, MediaError};
use crate::protocol::Ephemeral;
use crate::room::{new_peer_id, RoomCode};
use crate::transport::ws;
use crate::types::*;
use clap::{Parser, Subcommand};
use rand::seq::IndexedRandom;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::trace::TraceLayer;

const AVATAR_COLORS: &[&str] = &[
    "bg-red-100 text-red-600",
    "bg-orange-100 text-orange-600",
    "bg-amber-100 text-amber-600",
    "bg-green-100 text-green-600",
    "bg-teal-100 text-teal-600",
    "bg-sky-100 text-sky-600",
    "bg-indigo-100 text-indigo-600",
    "bg-purple-100 text-purple-600",
    "bg-pink-100 text-pink-600",
    "bg-rose-100 text-rose-600",
];

const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(author, version, about = "Draw, merge and get roasted with friends")]
pub struct Cli {
    /// Display name; a random one is picked when omitted
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Host a new session and play as its host
    Host {
        /// Room code to use; PUBLIC hosts the public lobby
        #[arg(short, long)]
        code: Option<String>,
        /// Address to accept peers on [default: PROMPTED_BIND or 0.0.0.0:8082]
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Join a session by room code
    Join {
        code: String,
        /// Host to dial
        #[arg(short, long, default_value = "127.0.0.1:8082")]
        server: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("{0}")]
    Input(String),

    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
}

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Start,
    Deal,
    Confirm,
    Draw(PathBuf),
    Vote(PlayerId),
    Results,
    Next,
    Finish,
    Say(String),
    Throw(String),
    State,
    Help,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self, CliError> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let needs = |what: &str| -> Result<String, CliError> {
            if rest.is_empty() {
                Err(CliError::Input(format!("{word} needs {what}")))
            } else {
                Ok(rest.to_string())
            }
        };

        Ok(match word.to_ascii_lowercase().as_str() {
            "start" => ReplCommand::Start,
            "deal" => ReplCommand::Deal,
            "confirm" => ReplCommand::Confirm,
            "draw" => ReplCommand::Draw(PathBuf::from(needs("an image path")?)),
            "vote" => ReplCommand::Vote(needs("a player id")?),
            "results" => ReplCommand::Results,
            "next" => ReplCommand::Next,
            "finish" => ReplCommand::Finish,
            "say" => ReplCommand::Say(needs("a message")?),
            "throw" => ReplCommand::Throw(needs("an emoji")?),
            "state" | "" => ReplCommand::State,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            other => return Err(CliError::Input(format!("Unknown command: {other}"))),
        })
    }
}

const HELP: &str = "\
  start | deal | confirm | results | next | finish   (host only)
  draw <image path>      submit your drawing
  vote <player id>       vote during the reveal
  say <text>             chat
  throw <emoji>          graffiti
  state                  show the session
  quit";

/// Friendly two-word name such as "Cosmic Walrus"
pub fn default_name() -> String {
    petname::petname(2, " ")
        .map(|name| {
            name.split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    chars
                        .next()
                        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| "Player".to_string())
}

pub fn profile_for(name: &str) -> PlayerProfile {
    let color = AVATAR_COLORS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(AVATAR_COLORS[0]);
    PlayerProfile {
        name: name.to_string(),
        avatar: format!(
            "https://api.dicebear.com/7.x/notionists/svg?seed={}",
            name.replace(' ', "")
        ),
        avatar_color: color.to_string(),
    }
}

/// Multi-line summary of a snapshot from `me`'s point of view
pub fn describe(state: &SessionState, me: &str) -> String {
    let mut out = format!(
        "[{}] {:?} round {}/{}",
        state.settings.room_code, state.phase, state.settings.current_round, state.settings.rounds
    );
    if state.time_left > 0 {
        out.push_str(&format!(" ({}s left)", state.time_left));
    }

    for player in &state.players {
        let marker = if player.id == me { "*" } else { " " };
        let drew = if player.has_drawing() { " ✏" } else { "" };
        out.push_str(&format!(
            "\n {marker} {:<20} {:>5} pts  {}{drew}",
            player.name, player.score, player.id
        ));
    }

    if let Some(slots) = state.player(me).and_then(|p| p.slots.as_ref()) {
        out.push_str(&format!("\n Your prompt: {}", slots.describe()));
    }
    if let Some(trivia) = &state.trivia {
        out.push_str(&format!("\n Trivia: {}", trivia.question));
        for (i, option) in trivia.options.iter().enumerate() {
            out.push_str(&format!("\n   {}. {option}", i + 1));
        }
        if state.phase != GamePhase::Trivia {
            out.push_str(&format!(
                "\n Answer: {}",
                trivia.options[trivia.correct_index.min(3)]
            ));
        }
    }
    if let Some(roast) = &state.judge_roast {
        out.push_str(&format!("\n {}: \"{roast}\"", state.settings.judge.display_name()));
    }
    out
}

fn print_ephemeral(event: &Ephemeral) {
    match event {
        Ephemeral::Chat(line) => println!("<{}> {}", line.sender_name, line.text),
        Ephemeral::Graffiti(item) => println!("{} threw {}", item.sender_id, item.emoji),
    }
}

/// Print a summary whenever something other than the countdown changes
fn spawn_printer(
    mut states: tokio::sync::watch::Receiver<SessionState>,
    mut ephemeral: tokio::sync::broadcast::Receiver<Ephemeral>,
    me: String,
) {
    tokio::spawn(async move {
        let mut last: Option<SessionState> = None;
        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    let mut comparable = state.clone();
                    comparable.version = 0;
                    comparable.time_left = 0;
                    if last.as_ref() != Some(&comparable) {
                        println!("{}", describe(&state, &me));
                        last = Some(comparable);
                    }
                }
                event = ephemeral.recv() => match event {
                    Ok(event) => print_ephemeral(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(_) => break,
                },
            }
        }
    });
}

type Stdin = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

fn stdin_lines() -> Stdin {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Next actionable command; None on quit or end of input
async fn next_command(lines: &mut Stdin) -> Result<Option<ReplCommand>, CliError> {
    while let Some(line) = lines.next_line().await? {
        match ReplCommand::parse(&line) {
            Ok(ReplCommand::Quit) => return Ok(None),
            Ok(ReplCommand::Help) => println!("{HELP}"),
            Ok(command) => return Ok(Some(command)),
            Err(e) => println!("{e}"),
        }
    }
    Ok(None)
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let name = cli.name.unwrap_or_else(default_name);
    match cli.command {
        Command::Host { code, bind } => run_host(name, code, bind).await,
        Command::Join { code, server } => run_join(name, code, server).await,
    }
}

async fn run_host(name: String, code: Option<String>, bind: Option<SocketAddr>) -> Result<(), CliError> {
    let code = match code {
        Some(raw) => RoomCode::parse(&raw)?,
        None => RoomCode::generate(),
    };
    let bind = bind.unwrap_or_else(|| HostConfig::from_env().bind);

    let ai = AiConfig::from_env();
    let collaborator = match ai.build_collaborator() {
        Ok(collaborator) => {
            tracing::info!("AI collaborator {} ready", collaborator.name());
            Some(collaborator)
        }
        Err(e) => {
            tracing::warn!("{}. Rounds will skip straight to results.", e);
            None
        }
    };

    let (router, acceptor) = ws::listen(&code.address());
    let handle = host::spawn(
        &code,
        profile_for(&name),
        acceptor,
        HostOptions {
            game: GameConfig::from_env(),
            collaborator,
            ai_timeout: ai.timeout,
        },
    )?;

    let app = router
        .merge(host::health_router(handle.clone()))
        .layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(TransportError::Bind)?;
    tokio::spawn(async move {
        if let Err(e) = ws::serve(listener, app).await {
            tracing::error!("Server stopped: {}", e);
        }
    });

    println!("Hosting room {code} on {bind}. Type `help` for commands.");
    spawn_printer(
        handle.subscribe(),
        handle.subscribe_ephemeral(),
        HOST_PLAYER_ID.to_string(),
    );

    let mut lines = stdin_lines();
    while let Some(command) = next_command(&mut lines).await? {
        if let Err(e) = host_command(&handle, command).await {
            println!("{e}");
        }
    }

    handle.shutdown();
    Ok(())
}

async fn host_command(handle: &HostHandle, command: ReplCommand) -> Result<(), CliError> {
    match command {
        ReplCommand::Start => handle.start_game().await?,
        ReplCommand::Deal => handle.deal_prompts().await?,
        ReplCommand::Confirm => handle.confirm_prompt().await?,
        ReplCommand::Draw(path) => handle.submit_drawing(load_drawing(path)?).await?,
        ReplCommand::Vote(target) => handle.vote(target).await?,
        ReplCommand::Results => handle.show_results().await?,
        ReplCommand::Next => handle.next_round().await?,
        ReplCommand::Finish => handle.finish_game().await?,
        ReplCommand::Say(text) => handle.chat(text)?,
        ReplCommand::Throw(emoji) => handle.graffiti(GraffitiItem::scatter(HOST_PLAYER_ID, emoji))?,
        ReplCommand::State => println!("{}", describe(&handle.snapshot(), HOST_PLAYER_ID)),
        ReplCommand::Help | ReplCommand::Quit => {}
    }
    Ok(())
}

async fn run_join(name: String, code: String, server: String) -> Result<(), CliError> {
    let code = RoomCode::parse(&code)?;
    let peer = new_peer_id();

    let connection = ws::connect(&server, &code.address(), &peer).await?;
    let client = join_room(connection, peer.clone(), profile_for(&name))?;
    client.wait_until_joined(JOIN_TIMEOUT).await?;
    println!("Joined room {code} as {name}. Type `help` for commands.");

    let (states_tx, states_rx) = tokio::sync::watch::channel(client.snapshot().state);
    let mut mirror = client.subscribe();
    tokio::spawn(async move {
        while mirror.changed().await.is_ok() {
            let state = mirror.borrow_and_update().state.clone();
            if states_tx.send(state).is_err() {
                break;
            }
        }
        println!("Disconnected from host");
    });
    spawn_printer(states_rx, client.subscribe_ephemeral(), peer);

    let mut lines = stdin_lines();
    while let Some(command) = next_command(&mut lines).await? {
        match client_command(&client, command).await {
            Ok(()) => {}
            Err(CliError::Client(ClientError::Stopped)) => break,
            Err(e) => println!("{e}"),
        }
    }

    client.leave();
    Ok(())
}

async fn client_command(client: &ClientHandle, command: ReplCommand) -> Result<(), CliError> {
    match command {
        ReplCommand::Draw(path) => client.submit_drawing(load_drawing(path)?).await?,
        ReplCommand::Vote(target) => client.vote(target).await?,
        ReplCommand::Say(text) => client.chat(text)?,
        ReplCommand::Throw(emoji) => client.graffiti(emoji)?,
        ReplCommand::State => println!("{}", describe(&client.snapshot().state, client.my_id())),
        ReplCommand::Help | ReplCommand::Quit => {}
        _ => println!("Only the host can do that"),
    }
    Ok(())
}
