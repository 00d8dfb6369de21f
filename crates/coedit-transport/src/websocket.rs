//! WebSocket transport for coedit

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info};

use coedit_core::{ParticipantHandle, ParticipantId, SessionRegistry};
use coedit_protocol::ServerEvent;
use coedit_storage::DocumentStore;

use crate::handler::ConnectionHandler;

/// WebSocket server for coedit
///
/// One spawned task per connection; each task owns its participant
/// handle and the receiving end of its delta queue.
pub struct WebSocketServer {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn DocumentStore>,
    addr: SocketAddr,
    client_counter: AtomicU64,
}

impl WebSocketServer {
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn DocumentStore>,
        addr: SocketAddr,
    ) -> Self {
        Self {
            registry,
            store,
            addr,
            client_counter: AtomicU64::new(0),
        }
    }

    /// Start the WebSocket server
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "coedit WebSocket server listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let participant_id = ParticipantId::new(format!(
                        "ws:{}:{}",
                        peer_addr,
                        self.client_counter.fetch_add(1, Ordering::Relaxed)
                    ));
                    let registry = self.registry.clone();
                    let store = self.store.clone();

                    tokio::spawn(async move {
                        let id = participant_id.clone();
                        if let Err(e) =
                            Self::handle_connection(stream, participant_id, registry, store).await
                        {
                            error!(client = %id, error = %e, "WebSocket connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        participant_id: ParticipantId,
        registry: Arc<SessionRegistry>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ws_stream = accept_async(stream).await?;
        let (mut write, mut read) = ws_stream.split();

        info!(client = %participant_id, "Client connected");

        let (participant, mut delta_rx) = ParticipantHandle::channel(participant_id.clone());
        let handler = ConnectionHandler::new(participant, registry, store);

        loop {
            tokio::select! {
                // Inbound frames from this client
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reply) = handler.process(&text).await {
                                if let Err(e) = write.send(Message::Text(reply.encode())).await {
                                    error!(client = %participant_id, error = %e, "Write error");
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if write.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(client = %participant_id, "Client disconnected");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Binary and pong frames are ignored
                        }
                        Some(Err(e)) => {
                            error!(client = %participant_id, error = %e, "Read error");
                            break;
                        }
                    }
                }

                // Deltas relayed from other session members
                delta = delta_rx.recv() => {
                    match delta {
                        Some(delta) => {
                            let reply = ServerEvent::receive_changes(delta);
                            if let Err(e) = write.send(Message::Text(reply.encode())).await {
                                error!(client = %participant_id, error = %e, "Write error");
                                break;
                            }
                        }
                        // The handler holds the sending half, so the
                        // queue cannot close before this loop exits.
                        None => break,
                    }
                }
            }
        }

        // Membership cleanup runs on every exit path
        handler.cleanup();
        debug!(client = %participant_id, "Connection closed");
        Ok(())
    }
}
