use super::{Acceptor, Connection};
use crate::error::TransportError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// In-process stand-in for the network; cheap to clone
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    listeners: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Connection>>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an address. A listener whose acceptor was dropped frees it.
    pub async fn listen(&self, address: &str) -> Result<Acceptor, TransportError> {
        let mut listeners = self.listeners.lock().await;
        if listeners.get(address).is_some_and(|tx| !tx.is_closed()) {
            return Err(TransportError::AddressInUse(address.to_string()));
        }

        let (acceptor, tx) = Acceptor::new(address.to_string());
        listeners.insert(address.to_string(), tx);
        tracing::debug!("Listening on {}", address);
        Ok(acceptor)
    }

    pub async fn connect(&self, address: &str, local_peer: &str) -> Result<Connection, TransportError> {
        let mut listeners = self.listeners.lock().await;
        let tx = listeners
            .get(address)
            .ok_or_else(|| TransportError::Unreachable(address.to_string()))?;

        let (local, remote) = Connection::pair(local_peer, address);
        if tx.send(remote).is_err() {
            listeners.remove(address);
            return Err(TransportError::Unreachable(address.to_string()));
        }
        tracing::debug!("{} connected to {}", local_peer, address);
        Ok(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use crate::types::ChatLine;

    #[tokio::test]
    async fn test_connect_and_accept() {
        let net = MemoryNetwork::new();
        let mut acceptor = net.listen("prompted-v2-ABCD").await.unwrap();

        let client = net.connect("prompted-v2-ABCD", "peer-1").await.unwrap();
        assert_eq!(client.peer(), "prompted-v2-ABCD");

        let mut host_side = acceptor.accept().await.unwrap();
        assert_eq!(host_side.peer(), "peer-1");

        client
            .send(Message::Chat(ChatLine::new("peer-1", "Pat", "hi".to_string())))
            .unwrap();
        assert!(matches!(host_side.recv().await, Some(Message::Chat(_))));
    }

    #[tokio::test]
    async fn test_unknown_address_is_unreachable() {
        let net = MemoryNetwork::new();
        assert!(matches!(
            net.connect("prompted-v2-NOPE", "peer-1").await,
            Err(TransportError::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_address_in_use_until_acceptor_dropped() {
        let net = MemoryNetwork::new();
        let acceptor = net.listen("prompted-v2-ABCD").await.unwrap();
        assert!(matches!(
            net.listen("prompted-v2-ABCD").await,
            Err(TransportError::AddressInUse(_))
        ));

        drop(acceptor);
        assert!(matches!(
            net.connect("prompted-v2-ABCD", "peer-1").await,
            Err(TransportError::Unreachable(_))
        ));
        assert!(net.listen("prompted-v2-ABCD").await.is_ok());
    }
}
