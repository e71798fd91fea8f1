use async_trait::async_trait;
use prompted::ai::{AiResult, Collaborator, Sketch};
use prompted::client::{join_room, ClientHandle};
use prompted::config::GameConfig;
use prompted::error::{ClientError, HostError, Rejection, ValidationError};
use prompted::host::{self, HostHandle, HostOptions};
use prompted::protocol::Ephemeral;
use prompted::room::RoomCode;
use prompted::transport::memory::MemoryNetwork;
use prompted::transport::ws;
use prompted::types::*;
use std::sync::Arc;
use std::time::Duration;

const DRAWING: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Collaborator that answers instantly with canned content
struct Scripted;

#[async_trait]
impl Collaborator for Scripted {
    async fn combine(&self, sketches: &[Sketch]) -> AiResult<String> {
        Ok(format!("data:image/png;base64,{}", sketches.len()))
    }

    async fn trivia_for(&self, _image: &str) -> AiResult<TriviaQuestion> {
        Ok(TriviaQuestion {
            question: "How many legs does the creature have?".to_string(),
            options: ["Two", "Four", "Six", "Eleven"].map(String::from),
            correct_index: 3,
        })
    }

    async fn roast_for(&self, _image: &str, judge: JudgeStyle, nouns: &[String]) -> AiResult<String> {
        Ok(format!("{:?} judge is unimpressed by {}", judge, nouns.len()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn profile(name: &str) -> PlayerProfile {
    PlayerProfile {
        name: name.to_string(),
        avatar: format!("https://api.dicebear.com/7.x/notionists/svg?seed={name}"),
        avatar_color: "bg-teal-100 text-teal-600".to_string(),
    }
}

fn options(collaborator: Option<Arc<dyn Collaborator>>) -> HostOptions {
    HostOptions {
        game: GameConfig::default(),
        collaborator,
        ai_timeout: Duration::from_secs(5),
    }
}

async fn memory_host(net: &MemoryNetwork, code: &str) -> (RoomCode, HostHandle) {
    let code = RoomCode::parse(code).unwrap();
    let acceptor = net.listen(&code.address()).await.unwrap();
    let host = host::spawn(&code, profile("Hostess"), acceptor, options(Some(Arc::new(Scripted)))).unwrap();
    (code, host)
}

async fn memory_client(net: &MemoryNetwork, code: &RoomCode, id: &str) -> ClientHandle {
    let conn = net.connect(&code.address(), id).await.unwrap();
    let client = join_room(conn, id, profile(id)).unwrap();
    client.wait_until_joined(Duration::from_secs(5)).await.unwrap();
    client
}

async fn wait_phase(client: &ClientHandle, phase: GamePhase) -> SessionState {
    client
        .wait_for(|s| s.state.phase == phase)
        .await
        .unwrap()
        .state
}

#[tokio::test(start_paused = true)]
async fn test_full_round_over_memory_network() {
    let net = MemoryNetwork::new();
    let (code, host) = memory_host(&net, "GAME").await;
    let alice = memory_client(&net, &code, "alice").await;
    let bob = memory_client(&net, &code, "bob").await;
    host.wait_for(|s| s.players.len() == 3).await.unwrap();

    host.start_game().await.unwrap();
    let state = wait_phase(&alice, GamePhase::PromptSelection).await;
    assert!(state.players.iter().all(|p| p.slots.is_some()));

    host.confirm_prompt().await.unwrap();
    wait_phase(&bob, GamePhase::Drawing).await;
    wait_phase(&alice, GamePhase::Drawing).await;

    alice.submit_drawing(DRAWING.to_string()).await.unwrap();
    bob.submit_drawing(DRAWING.to_string()).await.unwrap();
    assert!(matches!(
        bob.submit_drawing(DRAWING.to_string()).await,
        Err(ClientError::Validation(ValidationError::AlreadySubmitted))
    ));
    host.submit_drawing(DRAWING.to_string()).await.unwrap();

    // Everyone drew, so the AI stage runs and trivia starts
    let trivia = wait_phase(&alice, GamePhase::Trivia).await;
    assert_eq!(trivia.combined_image.as_deref(), Some("data:image/png;base64,3"));
    assert_eq!(trivia.trivia.as_ref().unwrap().correct_index, 3);

    // Trivia counts down on the host clock into the reveal
    let reveal = wait_phase(&bob, GamePhase::Reveal).await;
    assert_eq!(reveal.time_left, 0);

    wait_phase(&alice, GamePhase::Reveal).await;
    alice.vote("bob").await.unwrap();
    bob.vote("alice").await.unwrap();
    host.vote("alice").await.unwrap();
    assert!(matches!(
        host.vote("bob").await,
        Err(HostError::Rejected(Rejection::AlreadyVoted(_)))
    ));

    let scored = host
        .wait_for(|s| s.players.iter().map(|p| p.votes_received).sum::<u32>() == 3)
        .await
        .unwrap();
    assert_eq!(scored.player("alice").unwrap().score, 2 * VOTE_AWARD);
    assert_eq!(scored.player("bob").unwrap().score, VOTE_AWARD);
    assert_eq!(scored.player(HOST_PLAYER_ID).unwrap().score, 0);

    host.show_results().await.unwrap();
    let results = alice
        .wait_for(|s| s.state.judge_roast.is_some())
        .await
        .unwrap()
        .state;
    assert_eq!(results.phase, GamePhase::Results);
    assert_eq!(
        results.judge_roast.as_deref(),
        Some("Roast judge is unimpressed by 3")
    );

    host.next_round().await.unwrap();
    let next = bob
        .wait_for(|s| s.state.settings.current_round == 2)
        .await
        .unwrap();
    assert_eq!(next.state.phase, GamePhase::PromptSelection);
    assert_eq!(next.flags, Default::default());
    assert!(next.state.players.iter().all(|p| p.drawing.is_none()));
    assert!(next.state.combined_image.is_none());
    assert!(next.state.judge_roast.is_none());
    assert_eq!(next.state.player("alice").unwrap().score, 2 * VOTE_AWARD);

    // Every peer converges on the host's latest snapshot
    let latest = host.snapshot();
    alice.wait_for(|s| s.state == latest).await.unwrap();
    bob.wait_for(|s| s.state == latest).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_round_without_collaborator_goes_to_results() {
    let net = MemoryNetwork::new();
    let code = RoomCode::parse("SOLO").unwrap();
    let acceptor = net.listen(&code.address()).await.unwrap();
    let host = host::spawn(&code, profile("Hostess"), acceptor, options(None)).unwrap();
    let alice = memory_client(&net, &code, "alice").await;

    host.start_game().await.unwrap();
    host.confirm_prompt().await.unwrap();
    wait_phase(&alice, GamePhase::Drawing).await;

    // Nobody draws; the drawing clock runs out
    let results = wait_phase(&alice, GamePhase::Results).await;
    assert!(results.combined_image.is_none());
    assert!(results.trivia.is_none());
    assert!(results.judge_roast.is_none());
}

#[tokio::test]
async fn test_lobby_rejects_late_and_duplicate_joins() {
    let net = MemoryNetwork::new();
    let (code, host) = memory_host(&net, "LATE").await;
    let alice = memory_client(&net, &code, "alice").await;

    // A second connection under the same peer id is refused outright
    let conn = net.connect(&code.address(), "alice").await.unwrap();
    let twin = join_room(conn, "alice", profile("Twin")).unwrap();
    assert!(matches!(
        twin.wait_for(|s| s.is_joined()).await,
        Err(ClientError::Stopped)
    ));
    assert_eq!(host.snapshot().player("alice").unwrap().name, "alice");

    // ...and the original player is still in the game
    host.start_game().await.unwrap();
    let state = wait_phase(&alice, GamePhase::PromptSelection).await;
    assert!(state.player("alice").unwrap().slots.is_some());

    let conn = net.connect(&code.address(), "carol").await.unwrap();
    let carol = join_room(conn, "carol", profile("Carol")).unwrap();
    let mirror = carol
        .wait_for(|s| s.state.phase == GamePhase::PromptSelection)
        .await
        .unwrap();
    assert!(!mirror.is_joined());
    assert_eq!(host.snapshot().players.len(), 2);
}

#[tokio::test]
async fn test_chat_and_graffiti_bypass_state() {
    let net = MemoryNetwork::new();
    let (code, host) = memory_host(&net, "CHAT").await;
    let alice = memory_client(&net, &code, "alice").await;
    let bob = memory_client(&net, &code, "bob").await;
    let mut bob_events = bob.subscribe_ephemeral();
    let mut host_events = host.subscribe_ephemeral();
    let version = host.snapshot().version;

    alice.chat("nice frog").unwrap();
    match bob_events.recv().await.unwrap() {
        Ephemeral::Chat(line) => {
            assert_eq!(line.sender_id, "alice");
            assert_eq!(line.text, "nice frog");
        }
        other => panic!("Expected chat, got {other:?}"),
    }
    assert!(matches!(host_events.recv().await, Ok(Ephemeral::Chat(_))));

    host.graffiti(GraffitiItem::scatter(HOST_PLAYER_ID, "🔥")).unwrap();
    match bob_events.recv().await.unwrap() {
        Ephemeral::Graffiti(item) => {
            assert_eq!(item.emoji, "🔥");
            assert!((0.0..=1.0).contains(&item.x));
        }
        other => panic!("Expected graffiti, got {other:?}"),
    }

    assert_eq!(host.snapshot().version, version);
}

#[tokio::test]
async fn test_websocket_session_with_health() {
    let code = RoomCode::parse("WIRE").unwrap();
    let (router, acceptor) = ws::listen(&code.address());
    let host = host::spawn(&code, profile("Hostess"), acceptor, options(Some(Arc::new(Scripted)))).unwrap();

    let app = router.merge(host::health_router(host.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(ws::serve(listener, app));

    let conn = ws::connect(&addr.to_string(), &code.address(), "peer-ws")
        .await
        .unwrap();
    let client = join_room(conn, "peer-ws", profile("Wes")).unwrap();
    let joined = client
        .wait_until_joined(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(joined.state.settings.room_code, "WIRE");

    let health: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["players"], 2);
    assert_eq!(health["connections"], 1);

    host.start_game().await.unwrap();
    let state = client
        .wait_for(|s| s.state.phase == GamePhase::PromptSelection)
        .await
        .unwrap();
    assert!(state.me().unwrap().slots.is_some());

    host.shutdown();
    assert!(matches!(
        client.wait_for(|_| false).await,
        Err(ClientError::Stopped)
    ));
}
