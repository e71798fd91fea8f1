//! The authoritative peer
//!
//! One actor task owns the [`Session`]. Connections, peer messages, host
//! commands, clock ticks and AI results all arrive on a single queue and are
//! applied one at a time. After every successful mutation the full snapshot
//! goes out to every connection.

pub mod handlers;

use crate::ai::{
    run_ai_stage, run_roast_stage, AiError, AiResult, Collaborator, RoundArtifacts, Sketch,
};
use crate::config::GameConfig;
use crate::error::{HostError, Rejection};
use crate::protocol::{Ephemeral, Message};
use crate::room::RoomCode;
use crate::state::{AiStage, Session};
use crate::transport::{Acceptor, ConnectionSender};
use crate::types::*;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use handlers::Dispatch;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// Actions the local host player can take
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    StartGame,
    DealPrompts,
    ConfirmPrompt,
    SubmitDrawing(String),
    Vote(PlayerId),
    ShowResults,
    NextRound,
    FinishGame,
}

/// Accept-order number telling apart connections that share a peer id
type ConnectionSeq = u64;

enum HostEvent {
    PeerConnected {
        seq: ConnectionSeq,
        sender: ConnectionSender,
    },
    PeerMessage {
        peer: PeerId,
        seq: ConnectionSeq,
        message: Message,
    },
    PeerClosed {
        peer: PeerId,
        seq: ConnectionSeq,
    },
    Command {
        command: HostCommand,
        reply: oneshot::Sender<Result<(), Rejection>>,
    },
    Say(Ephemeral),
    AiStageFinished {
        round: u32,
        outcome: AiResult<RoundArtifacts>,
    },
    RoastFinished {
        round: u32,
        outcome: AiResult<String>,
    },
    Shutdown,
}

pub struct HostOptions {
    pub game: GameConfig,
    pub collaborator: Option<Arc<dyn Collaborator>>,
    pub ai_timeout: Duration,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            collaborator: None,
            ai_timeout: Duration::from_secs(60),
        }
    }
}

/// Cloneable handle to a running host
#[derive(Clone)]
pub struct HostHandle {
    code: RoomCode,
    events: mpsc::UnboundedSender<HostEvent>,
    state: watch::Receiver<SessionState>,
    peers: watch::Receiver<usize>,
    ephemeral: broadcast::Sender<Ephemeral>,
}

/// Create the session and start serving peers from `acceptor`
pub fn spawn(
    code: &RoomCode,
    host_profile: PlayerProfile,
    mut acceptor: Acceptor,
    options: HostOptions,
) -> Result<HostHandle, HostError> {
    let mut session = Session::new(options.game);
    session.create_session(code, host_profile)?;
    session.bump_version();

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(session.snapshot());
    let (peers_tx, peers_rx) = watch::channel(0);
    let (ephemeral_tx, _) = broadcast::channel(100);

    let accept_events = events_tx.clone();
    let accept_task = tokio::spawn(async move {
        let mut next_seq: ConnectionSeq = 0;
        while let Some(connection) = acceptor.accept().await {
            let seq = next_seq;
            next_seq += 1;
            let (sender, mut inbound) = connection.split();
            let peer = sender.peer().to_string();
            if accept_events
                .send(HostEvent::PeerConnected { seq, sender })
                .is_err()
            {
                break;
            }

            let events = accept_events.clone();
            tokio::spawn(async move {
                while let Some(message) = inbound.recv().await {
                    let event = HostEvent::PeerMessage {
                        peer: peer.clone(),
                        seq,
                        message,
                    };
                    if events.send(event).is_err() {
                        return;
                    }
                }
                let _ = events.send(HostEvent::PeerClosed { peer, seq });
            });
        }
    });

    let actor = HostActor {
        session,
        connections: HashMap::new(),
        events: events_tx.clone(),
        state: state_tx,
        peers: peers_tx,
        ephemeral: ephemeral_tx.clone(),
        collaborator: options.collaborator,
        ai_timeout: options.ai_timeout,
        ai_round: None,
        roast_round: None,
    };
    tokio::spawn(async move {
        actor.run(events_rx).await;
        accept_task.abort();
    });

    tracing::info!("Hosting room {} at {}", code, code.address());
    Ok(HostHandle {
        code: code.clone(),
        events: events_tx,
        state: state_rx,
        peers: peers_rx,
        ephemeral: ephemeral_tx,
    })
}

impl HostHandle {
    pub fn room_code(&self) -> &RoomCode {
        &self.code
    }

    pub async fn command(&self, command: HostCommand) -> Result<(), HostError> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(HostEvent::Command { command, reply })
            .map_err(|_| HostError::Stopped)?;
        response.await.map_err(|_| HostError::Stopped)??;
        Ok(())
    }

    pub async fn start_game(&self) -> Result<(), HostError> {
        self.command(HostCommand::StartGame).await
    }

    pub async fn deal_prompts(&self) -> Result<(), HostError> {
        self.command(HostCommand::DealPrompts).await
    }

    pub async fn confirm_prompt(&self) -> Result<(), HostError> {
        self.command(HostCommand::ConfirmPrompt).await
    }

    pub async fn submit_drawing(&self, drawing: String) -> Result<(), HostError> {
        self.command(HostCommand::SubmitDrawing(drawing)).await
    }

    pub async fn vote(&self, target: impl Into<PlayerId>) -> Result<(), HostError> {
        self.command(HostCommand::Vote(target.into())).await
    }

    pub async fn show_results(&self) -> Result<(), HostError> {
        self.command(HostCommand::ShowResults).await
    }

    pub async fn next_round(&self) -> Result<(), HostError> {
        self.command(HostCommand::NextRound).await
    }

    pub async fn finish_game(&self) -> Result<(), HostError> {
        self.command(HostCommand::FinishGame).await
    }

    /// Chat as the host player
    pub fn chat(&self, text: impl Into<String>) -> Result<(), HostError> {
        let name = self
            .state
            .borrow()
            .player(HOST_PLAYER_ID)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let line = ChatLine::new(HOST_PLAYER_ID, name, text.into());
        self.events
            .send(HostEvent::Say(Ephemeral::Chat(line)))
            .map_err(|_| HostError::Stopped)
    }

    pub fn graffiti(&self, item: GraffitiItem) -> Result<(), HostError> {
        self.events
            .send(HostEvent::Say(Ephemeral::Graffiti(item)))
            .map_err(|_| HostError::Stopped)
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Chat and graffiti seen by the host, including its own
    pub fn subscribe_ephemeral(&self) -> broadcast::Receiver<Ephemeral> {
        self.ephemeral.subscribe()
    }

    pub fn connection_count(&self) -> usize {
        *self.peers.borrow()
    }

    /// Wait until a committed snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, HostError> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(predicate).await.map_err(|_| HostError::Stopped)?;
        Ok(state.clone())
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(HostEvent::Shutdown);
    }
}

struct HostActor {
    session: Session,
    /// One live connection per peer id; later duplicates are refused
    connections: HashMap<PeerId, (ConnectionSeq, ConnectionSender)>,
    events: mpsc::UnboundedSender<HostEvent>,
    state: watch::Sender<SessionState>,
    peers: watch::Sender<usize>,
    ephemeral: broadcast::Sender<Ephemeral>,
    collaborator: Option<Arc<dyn Collaborator>>,
    ai_timeout: Duration,
    /// Round whose AI stage has been launched
    ai_round: Option<u32>,
    roast_round: Option<u32>,
}

impl HostActor {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<HostEvent>) {
        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let counting = self.session.is_counting_down();
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if !self.handle_event(event) {
                        break;
                    }
                    if !counting && self.session.is_counting_down() {
                        // Full second before the first decrement
                        ticker.reset();
                    }
                }
                _ = ticker.tick(), if counting => {
                    if self.session.tick().is_ok() {
                        self.commit();
                    }
                }
            }
        }

        tracing::info!("Host for room {} stopped", self.session.state().settings.room_code);
    }

    /// Returns false when the actor should stop
    fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::PeerConnected { seq, sender } => {
                let peer = sender.peer().to_string();
                if peer == HOST_PLAYER_ID {
                    tracing::debug!("Refusing connection claiming the host id");
                    return true;
                }
                if self
                    .connections
                    .get(&peer)
                    .is_some_and(|(_, live)| !live.is_closed())
                {
                    tracing::debug!("Refusing second connection for peer {}", peer);
                    return true;
                }

                tracing::info!("Peer {} connected", peer);
                let _ = sender.send(Message::GameStateUpdate(self.session.snapshot()));
                self.connections.insert(peer, (seq, sender));
                self.peers.send_replace(self.connections.len());
            }

            HostEvent::PeerMessage { peer, seq, message } => {
                if !self.is_live(&peer, seq) {
                    tracing::debug!("Ignoring {} from refused connection {}", message.kind(), peer);
                    return true;
                }
                let kind = message.kind();
                match handlers::handle_message(&mut self.session, &peer, message) {
                    Dispatch::Mutated => self.commit(),
                    Dispatch::Relay(ephemeral) => self.relay(Some(&peer), ephemeral),
                    Dispatch::Dropped(rejection) => {
                        tracing::debug!("Dropped {} from {}: {}", kind, peer, rejection)
                    }
                }
            }

            HostEvent::PeerClosed { peer, seq } => {
                if self.is_live(&peer, seq) {
                    self.connections.remove(&peer);
                    self.peers.send_replace(self.connections.len());
                    tracing::info!("Peer {} disconnected", peer);
                }
            }

            HostEvent::Command { command, reply } => {
                let result = self.apply(command);
                if result.is_ok() {
                    self.commit();
                }
                let _ = reply.send(result);
            }

            HostEvent::Say(ephemeral) => self.relay(None, ephemeral),

            HostEvent::AiStageFinished { round, outcome } => {
                let result = match outcome {
                    Ok(artifacts) => self.session.complete_ai_stage(
                        round,
                        artifacts.combined_image,
                        artifacts.trivia,
                    ),
                    Err(e) => {
                        tracing::warn!("AI stage for round {} failed: {}", round, e);
                        self.session.abort_ai_stage(round)
                    }
                };
                match result {
                    Ok(()) => self.commit(),
                    Err(e) => tracing::debug!("Ignoring AI result: {}", e),
                }
            }

            HostEvent::RoastFinished { round, outcome } => match outcome {
                Ok(roast) => match self.session.record_roast(round, roast) {
                    Ok(()) => self.commit(),
                    Err(e) => tracing::debug!("Ignoring roast: {}", e),
                },
                Err(e) => tracing::warn!("Roast for round {} failed: {}", round, e),
            },

            HostEvent::Shutdown => return false,
        }
        true
    }

    fn is_live(&self, peer: &str, seq: ConnectionSeq) -> bool {
        self.connections
            .get(peer)
            .is_some_and(|(live_seq, _)| *live_seq == seq)
    }

    fn apply(&mut self, command: HostCommand) -> Result<(), Rejection> {
        tracing::debug!("Host command {:?}", command);
        match command {
            HostCommand::StartGame => self.session.start_game(),
            HostCommand::DealPrompts => self.session.deal_prompts(),
            HostCommand::ConfirmPrompt => self.session.confirm_prompt(),
            HostCommand::SubmitDrawing(drawing) => {
                self.session.record_drawing(HOST_PLAYER_ID, drawing)
            }
            HostCommand::Vote(target) => self.session.record_vote(HOST_PLAYER_ID, &target),
            HostCommand::ShowResults => self.session.show_results(),
            HostCommand::NextRound => self.session.next_round(),
            HostCommand::FinishGame => self.session.finish_game(),
        }
    }

    /// Publish the new state to everyone, then start any stage it calls for
    fn commit(&mut self) {
        self.session.bump_version();
        let snapshot = self.session.snapshot();
        for (peer, (_, connection)) in &self.connections {
            if connection
                .send(Message::GameStateUpdate(snapshot.clone()))
                .is_err()
            {
                tracing::debug!("Skipping closed connection {}", peer);
            }
        }
        self.state.send_replace(snapshot);
        self.advance_stages();
    }

    fn advance_stages(&mut self) {
        let round = self.session.round();

        if self.session.phase() == GamePhase::Combining && self.ai_round != Some(round) {
            match self.session.begin_ai_stage() {
                Ok(AiStage::Skipped) => {
                    self.ai_round = Some(round);
                    self.commit();
                }
                Ok(AiStage::Pending(sketches)) => {
                    self.ai_round = Some(round);
                    self.spawn_ai_stage(round, sketches);
                }
                Err(e) => tracing::error!("Could not start AI stage: {}", e),
            }
            return;
        }

        if self.roast_round != Some(round) {
            if let Some(request) = self.session.roast_request() {
                self.roast_round = Some(round);
                let events = self.events.clone();
                let timeout = self.ai_timeout;
                match self.collaborator.clone() {
                    Some(collaborator) => {
                        tokio::spawn(async move {
                            let outcome =
                                run_roast_stage(collaborator.as_ref(), &request, timeout).await;
                            let _ = events.send(HostEvent::RoastFinished { round, outcome });
                        });
                    }
                    None => tracing::debug!("No collaborator, skipping the roast"),
                }
            }
        }
    }

    fn spawn_ai_stage(&self, round: u32, sketches: Vec<Sketch>) {
        let events = self.events.clone();
        let Some(collaborator) = self.collaborator.clone() else {
            let _ = events.send(HostEvent::AiStageFinished {
                round,
                outcome: Err(AiError::ConfigError("No AI collaborator configured".to_string())),
            });
            return;
        };

        let timeout = self.ai_timeout;
        tokio::spawn(async move {
            let outcome = run_ai_stage(collaborator.as_ref(), &sketches, timeout).await;
            let _ = events.send(HostEvent::AiStageFinished { round, outcome });
        });
    }

    /// Chat and graffiti go to every peer except the one it came from
    fn relay(&self, from: Option<&str>, ephemeral: Ephemeral) {
        for (peer, (_, connection)) in &self.connections {
            if Some(peer.as_str()) == from {
                continue;
            }
            let _ = connection.send(ephemeral.clone().into());
        }
        let _ = self.ephemeral.send(ephemeral);
    }
}

// ========== Health ==========

async fn health(State(host): State<HostHandle>) -> impl IntoResponse {
    let state = host.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "roomCode": host.room_code().as_str(),
        "phase": state.phase,
        "players": state.players.len(),
        "connections": host.connection_count(),
        "version": state.version,
    }))
}

pub fn health_router(host: HostHandle) -> Router {
    Router::new().route("/health", get(health)).with_state(host)
}
