//! WebSocket adapter
//!
//! The host serves `GET /peer/{address}?from={peerId}` and hands every
//! upgraded socket to its [`Acceptor`] as a [`Connection`]. Clients dial the
//! same route with `tokio-tungstenite`. Each side runs a pump task that moves
//! JSON text frames between the socket and the connection's channels.

use super::{Acceptor, Connection};
use crate::error::TransportError;
use crate::protocol::Message;
use crate::types::HOST_PLAYER_ID;
use axum::{
    extract::{
        ws::{
            rejection::WebSocketUpgradeRejection, Message as WsMessage, WebSocket,
            WebSocketUpgrade,
        },
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

#[derive(Debug, Deserialize)]
pub struct PeerQuery {
    pub from: Option<String>,
}

#[derive(Clone)]
struct PeerRoute {
    address: String,
    incoming: mpsc::UnboundedSender<Connection>,
}

/// Router accepting peers for `address`, plus the acceptor they arrive on
pub fn listen(address: &str) -> (Router, Acceptor) {
    let (acceptor, incoming) = Acceptor::new(address.to_string());
    let route = PeerRoute {
        address: address.to_string(),
        incoming,
    };
    let router = Router::new()
        .route("/peer/{address}", get(peer_handler))
        .with_state(route);
    (router, acceptor)
}

/// Bind and serve a router until the process exits
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), TransportError> {
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn peer_handler(
    Path(address): Path<String>,
    Query(params): Query<PeerQuery>,
    State(route): State<PeerRoute>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if address != route.address {
        tracing::debug!("Rejecting peer for unknown address {}", address);
        return (StatusCode::NOT_FOUND, "No session at this address").into_response();
    }
    let Some(peer) = params.from.filter(|p| !p.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing from parameter").into_response();
    };
    if peer == HOST_PLAYER_ID {
        return (StatusCode::BAD_REQUEST, "Peer id is reserved").into_response();
    }
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    tracing::info!("WebSocket peer {} connecting to {}", peer, address);
    ws.on_upgrade(move |socket| handle_socket(socket, route, peer))
}

/// Bridge one upgraded socket into a connection for the host
async fn handle_socket(socket: WebSocket, route: PeerRoute, peer: String) {
    let (host_end, bridge) = Connection::pair(route.address.clone(), peer.clone());
    if route.incoming.send(host_end).is_err() {
        tracing::warn!("Host is gone, dropping peer {}", peer);
        return;
    }

    let (tx, mut outbound) = bridge.split();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            msg = outbound.recv() => {
                let Some(msg) = msg else { break };
                match msg.encode() {
                    Ok(json) => {
                        if sink.send(WsMessage::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!("Failed to encode {}: {}", msg.kind(), e),
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => match Message::decode(text.as_str()) {
                        Ok(msg) => {
                            if tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::debug!("Dropping undecodable frame from {}: {}", peer, e),
                    },
                    Some(Ok(WsMessage::Ping(data))) => {
                        if sink.send(WsMessage::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket error from {}: {}", peer, e);
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("WebSocket peer {} disconnected", peer);
}

/// Dial a host at `host` (e.g. `127.0.0.1:8082`) and join `address`
pub async fn connect(host: &str, address: &str, local_peer: &str) -> Result<Connection, TransportError> {
    let url = format!("ws://{host}/peer/{address}?from={local_peer}");
    let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;

    let (local, bridge) = Connection::pair(local_peer, address);
    let (tx, mut outbound) = bridge.split();
    let (mut sink, mut stream) = socket.split();
    let address = address.to_string();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = outbound.recv() => {
                    let Some(msg) = msg else { break };
                    match msg.encode() {
                        Ok(json) => {
                            if sink.send(TungsteniteMessage::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::error!("Failed to encode {}: {}", msg.kind(), e),
                    }
                }

                frame = stream.next() => {
                    match frame {
                        Some(Ok(TungsteniteMessage::Text(text))) => match Message::decode(text.as_str()) {
                            Ok(msg) => {
                                if tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::debug!("Dropping undecodable frame: {}", e),
                        },
                        Some(Ok(TungsteniteMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::debug!("WebSocket error: {}", e);
                            break;
                        }
                    }
                }
            }
        }
        let _ = sink.close().await;
        tracing::debug!("Connection to {} closed", address);
    });

    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatLine;
    use std::net::SocketAddr;

    async fn spawn_router(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, router));
        addr
    }

    #[tokio::test]
    async fn test_round_trip_over_websocket() {
        let (router, mut acceptor) = listen("prompted-v2-ABCD");
        let addr = spawn_router(router).await;

        let mut client = connect(&addr.to_string(), "prompted-v2-ABCD", "peer-1")
            .await
            .unwrap();
        let mut host_side = acceptor.accept().await.unwrap();
        assert_eq!(host_side.peer(), "peer-1");

        client
            .send(Message::Chat(ChatLine::new("peer-1", "Pat", "hello".to_string())))
            .unwrap();
        match host_side.recv().await {
            Some(Message::Chat(line)) => assert_eq!(line.text, "hello"),
            other => panic!("Expected chat, got {other:?}"),
        }

        host_side
            .send(Message::Chat(ChatLine::new("host", "Hal", "welcome".to_string())))
            .unwrap();
        assert!(matches!(client.recv().await, Some(Message::Chat(_))));

        drop(client);
        assert!(host_side.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_address_is_not_found() {
        let (router, _acceptor) = listen("prompted-v2-ABCD");
        let addr = spawn_router(router).await;

        let result = connect(&addr.to_string(), "prompted-v2-WXYZ", "peer-1").await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }

    async fn status_for(uri: &str) -> StatusCode {
        use tower::ServiceExt;

        let (router, _acceptor) = listen("prompted-v2-ABCD");
        router
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_route_checks_address_then_peer() {
        assert_eq!(
            status_for("/peer/prompted-v2-WXYZ?from=peer-1").await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for("/peer/prompted-v2-ABCD").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for("/peer/prompted-v2-ABCD?from=").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for("/peer/prompted-v2-ABCD?from=host").await,
            StatusCode::BAD_REQUEST
        );
    }
}
