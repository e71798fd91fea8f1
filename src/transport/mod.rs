//! Peer-to-peer message transport
//!
//! A [`Connection`] is an ordered, bidirectional stream of protocol
//! [`Message`]s to one remote peer. `recv` returning `None` means the remote
//! end is gone. Two adapters exist: an in-process [`memory::MemoryNetwork`]
//! and WebSockets in [`ws`].

pub mod memory;
pub mod ws;

use crate::error::TransportError;
use crate::protocol::Message;
use crate::types::PeerId;
use tokio::sync::mpsc;

/// Cloneable sending half of a connection
#[derive(Debug, Clone)]
pub struct ConnectionSender {
    peer: PeerId,
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionSender {
    /// The remote peer this sender delivers to
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn send(&self, message: Message) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .map_err(|_| TransportError::Closed(self.peer.clone()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
pub struct Connection {
    sender: ConnectionSender,
    inbound: mpsc::UnboundedReceiver<Message>,
}

impl Connection {
    /// Two connected ends. The first belongs to `left` and talks to `right`,
    /// the second the other way round.
    pub fn pair(left: impl Into<PeerId>, right: impl Into<PeerId>) -> (Connection, Connection) {
        let (left, right) = (left.into(), right.into());
        let (to_right, from_left) = mpsc::unbounded_channel();
        let (to_left, from_right) = mpsc::unbounded_channel();

        let left_end = Connection {
            sender: ConnectionSender {
                peer: right,
                tx: to_right,
            },
            inbound: from_right,
        };
        let right_end = Connection {
            sender: ConnectionSender {
                peer: left,
                tx: to_left,
            },
            inbound: from_left,
        };
        (left_end, right_end)
    }

    pub fn peer(&self) -> &str {
        self.sender.peer()
    }

    pub fn send(&self, message: Message) -> Result<(), TransportError> {
        self.sender.send(message)
    }

    /// Next message from the remote peer; `None` once it has gone away
    pub async fn recv(&mut self) -> Option<Message> {
        self.inbound.recv().await
    }

    pub fn sender(&self) -> ConnectionSender {
        self.sender.clone()
    }

    pub fn split(self) -> (ConnectionSender, mpsc::UnboundedReceiver<Message>) {
        (self.sender, self.inbound)
    }
}

/// Incoming connections for one listening address
#[derive(Debug)]
pub struct Acceptor {
    address: String,
    incoming: mpsc::UnboundedReceiver<Connection>,
}

impl Acceptor {
    pub(crate) fn new(address: String) -> (Self, mpsc::UnboundedSender<Connection>) {
        let (tx, incoming) = mpsc::unbounded_channel();
        (Self { address, incoming }, tx)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Wait for the next peer; `None` once the listener is gone
    pub async fn accept(&mut self) -> Option<Connection> {
        self.incoming.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatLine, GraffitiItem};

    fn chat(text: &str) -> Message {
        Message::Chat(ChatLine::new("a", "Alice", text.to_string()))
    }

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (mut a, mut b) = Connection::pair("a", "b");
        assert_eq!(a.peer(), "b");
        assert_eq!(b.peer(), "a");

        a.send(chat("one")).unwrap();
        a.send(chat("two")).unwrap();
        b.send(Message::Graffiti(GraffitiItem {
            id: "g1".to_string(),
            x: 0.5,
            y: 0.5,
            emoji: "🔥".to_string(),
            rotation: 0.0,
            scale: 1.0,
            sender_id: "b".to_string(),
        }))
        .unwrap();

        for expected in ["one", "two"] {
            match b.recv().await {
                Some(Message::Chat(line)) => assert_eq!(line.text, expected),
                other => panic!("Expected chat, got {other:?}"),
            }
        }
        assert!(matches!(a.recv().await, Some(Message::Graffiti(_))));
    }

    #[tokio::test]
    async fn test_dropping_one_end_closes_the_other() {
        let (a, mut b) = Connection::pair("a", "b");
        let sender = b.sender();
        drop(a);

        assert!(b.recv().await.is_none());
        assert!(sender.is_closed());
        assert!(matches!(
            sender.send(chat("late")),
            Err(TransportError::Closed(peer)) if peer == "a"
        ));
    }
}
