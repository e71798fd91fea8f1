//! Non-host peer
//!
//! A client never edits the session. It replaces its local copy with every
//! snapshot the host sends and keeps a couple of optimistic flags of its own
//! so the UI can react before the next snapshot arrives.

use crate::error::{ClientError, ValidationError};
use crate::protocol::{Ephemeral, Message, SubmitDrawing, Vote};
use crate::transport::{Connection, ConnectionSender};
use crate::types::*;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Optimistic per-round flags, never replicated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalFlags {
    pub drawing_submitted: bool,
    pub voted: bool,
}

/// The client's mirror of the session plus its local flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientSession {
    pub my_id: PlayerId,
    pub state: SessionState,
    pub flags: LocalFlags,
}

impl ClientSession {
    pub fn new(my_id: impl Into<PlayerId>) -> Self {
        Self {
            my_id: my_id.into(),
            ..Default::default()
        }
    }

    /// Replace the mirror wholesale. Entering prompt selection starts a new
    /// round, which clears the local flags.
    pub fn ingest(&mut self, snapshot: SessionState) {
        let new_round = snapshot.phase == GamePhase::PromptSelection
            && self.state.phase != GamePhase::PromptSelection;
        self.state = snapshot;
        if new_round {
            self.flags = LocalFlags::default();
        }
    }

    pub fn me(&self) -> Option<&Player> {
        self.state.player(&self.my_id)
    }

    pub fn is_joined(&self) -> bool {
        self.me().is_some()
    }

    pub fn check_drawing(&self, drawing: &str) -> Result<(), ValidationError> {
        if self.state.phase != GamePhase::Drawing {
            return Err(ValidationError::WrongPhase(self.state.phase));
        }
        if drawing.trim().is_empty() {
            return Err(ValidationError::EmptyDrawing);
        }
        if self.flags.drawing_submitted {
            return Err(ValidationError::AlreadySubmitted);
        }
        Ok(())
    }

    pub fn check_vote(&self, target_id: &str) -> Result<(), ValidationError> {
        if self.state.phase != GamePhase::Reveal {
            return Err(ValidationError::WrongPhase(self.state.phase));
        }
        if target_id == self.my_id {
            return Err(ValidationError::SelfVote);
        }
        let already = self.me().is_some_and(|p| p.voted_target_id.is_some());
        if self.flags.voted || already {
            return Err(ValidationError::AlreadyVoted);
        }
        Ok(())
    }
}

pub fn validate_profile(profile: &PlayerProfile) -> Result<(), ValidationError> {
    if profile.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

enum ClientCommand {
    SubmitDrawing {
        drawing: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Vote {
        target_id: PlayerId,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Say(Ephemeral),
    Leave,
}

/// Cloneable handle to a joined client
#[derive(Clone)]
pub struct ClientHandle {
    my_id: PlayerId,
    my_name: String,
    commands: mpsc::UnboundedSender<ClientCommand>,
    state: watch::Receiver<ClientSession>,
    ephemeral: broadcast::Sender<Ephemeral>,
}

/// Ask the host behind `connection` to admit us, then keep the mirror in sync
pub fn join_room(
    connection: Connection,
    my_id: impl Into<PlayerId>,
    profile: PlayerProfile,
) -> Result<ClientHandle, ClientError> {
    validate_profile(&profile)?;
    let my_id = my_id.into();
    let my_name = profile.name.trim().to_string();

    let record = Player::new(
        my_id.clone(),
        PlayerProfile {
            name: my_name.clone(),
            ..profile
        },
    );
    connection.send(Message::PlayerJoined(record))?;
    tracing::info!("Joining {} as {}", connection.peer(), my_id);

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ClientSession::new(my_id.clone()));
    let (ephemeral_tx, _) = broadcast::channel(100);

    let task = ClientTask {
        my_id: my_id.clone(),
        state: state_tx,
        ephemeral: ephemeral_tx.clone(),
    };
    tokio::spawn(task.run(connection, commands_rx));

    Ok(ClientHandle {
        my_id,
        my_name,
        commands: commands_tx,
        state: state_rx,
        ephemeral: ephemeral_tx,
    })
}

impl ClientHandle {
    pub fn my_id(&self) -> &str {
        &self.my_id
    }

    pub fn snapshot(&self) -> ClientSession {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientSession> {
        self.state.clone()
    }

    pub fn subscribe_ephemeral(&self) -> broadcast::Receiver<Ephemeral> {
        self.ephemeral.subscribe()
    }

    /// Wait until the mirror satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ClientSession) -> bool,
    ) -> Result<ClientSession, ClientError> {
        let mut rx = self.state.clone();
        let session = rx.wait_for(predicate).await.map_err(|_| ClientError::Stopped)?;
        Ok(session.clone())
    }

    /// Joined once a snapshot lists our id
    pub async fn wait_until_joined(&self, timeout: Duration) -> Result<ClientSession, ClientError> {
        tokio::time::timeout(timeout, self.wait_for(ClientSession::is_joined))
            .await
            .map_err(|_| ClientError::JoinTimedOut(timeout))?
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), ClientError>>) -> ClientCommand,
    ) -> Result<(), ClientError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .map_err(|_| ClientError::Stopped)?;
        response.await.map_err(|_| ClientError::Stopped)?
    }

    pub async fn submit_drawing(&self, drawing: String) -> Result<(), ClientError> {
        self.request(|reply| ClientCommand::SubmitDrawing { drawing, reply })
            .await
    }

    pub async fn vote(&self, target_id: impl Into<PlayerId>) -> Result<(), ClientError> {
        let target_id = target_id.into();
        self.request(|reply| ClientCommand::Vote { target_id, reply })
            .await
    }

    pub fn chat(&self, text: impl Into<String>) -> Result<(), ClientError> {
        let line = ChatLine::new(self.my_id.clone(), self.my_name.clone(), text.into());
        self.commands
            .send(ClientCommand::Say(Ephemeral::Chat(line)))
            .map_err(|_| ClientError::Stopped)
    }

    pub fn graffiti(&self, emoji: impl Into<String>) -> Result<(), ClientError> {
        let item = GraffitiItem::scatter(self.my_id.clone(), emoji);
        self.commands
            .send(ClientCommand::Say(Ephemeral::Graffiti(item)))
            .map_err(|_| ClientError::Stopped)
    }

    /// Close the connection to the host
    pub fn leave(&self) {
        let _ = self.commands.send(ClientCommand::Leave);
    }
}

struct ClientTask {
    my_id: PlayerId,
    state: watch::Sender<ClientSession>,
    ephemeral: broadcast::Sender<Ephemeral>,
}

impl ClientTask {
    async fn run(self, connection: Connection, mut commands: mpsc::UnboundedReceiver<ClientCommand>) {
        let (sender, mut inbound) = connection.split();

        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(message) = message else {
                        tracing::info!("Host closed the connection");
                        break;
                    };
                    self.on_message(message);
                }
                command = commands.recv() => {
                    match command {
                        Some(ClientCommand::Leave) | None => break,
                        Some(command) => self.on_command(&sender, command),
                    }
                }
            }
        }

        tracing::debug!("Client {} stopped", self.my_id);
    }

    fn on_message(&self, message: Message) {
        match message {
            Message::GameStateUpdate(snapshot) => {
                self.state.send_modify(|session| session.ingest(snapshot));
            }
            Message::Chat(line) => {
                let _ = self.ephemeral.send(Ephemeral::Chat(line));
            }
            Message::Graffiti(item) => {
                let _ = self.ephemeral.send(Ephemeral::Graffiti(item));
            }
            other => tracing::debug!("Ignoring {} from host", other.kind()),
        }
    }

    fn on_command(&self, sender: &ConnectionSender, command: ClientCommand) {
        match command {
            ClientCommand::SubmitDrawing { drawing, reply } => {
                let result = self
                    .state
                    .borrow()
                    .check_drawing(&drawing)
                    .map_err(ClientError::from)
                    .and_then(|()| {
                        sender
                            .send(Message::ActionSubmitDrawing(SubmitDrawing {
                                id: self.my_id.clone(),
                                drawing,
                            }))
                            .map_err(ClientError::from)
                    });
                if result.is_ok() {
                    self.state
                        .send_modify(|session| session.flags.drawing_submitted = true);
                }
                let _ = reply.send(result);
            }

            ClientCommand::Vote { target_id, reply } => {
                let result = self
                    .state
                    .borrow()
                    .check_vote(&target_id)
                    .map_err(ClientError::from)
                    .and_then(|()| {
                        sender
                            .send(Message::ActionVote(Vote {
                                voter_id: self.my_id.clone(),
                                target_id,
                            }))
                            .map_err(ClientError::from)
                    });
                if result.is_ok() {
                    self.state.send_modify(|session| session.flags.voted = true);
                }
                let _ = reply.send(result);
            }

            ClientCommand::Say(ephemeral) => {
                if let Err(e) = sender.send(ephemeral.clone().into()) {
                    tracing::debug!("Could not send chat: {}", e);
                }
                let _ = self.ephemeral.send(ephemeral);
            }

            ClientCommand::Leave => {}
        }
    }
}
