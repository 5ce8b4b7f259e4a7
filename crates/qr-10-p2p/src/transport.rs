//! # Transport
//!
//! Peer lifecycle: accept or dial, handshake, then one task per
//! connection. The task writes queued outbound messages, answers PINGs,
//! emits PINGs on the keep-alive interval, and tears the peer down after
//! `connection_timeout` without inbound activity.

use crate::errors::NetError;
use crate::frame::{handshake, read_frame, write_frame};
use crate::message::{NetEvent, NetMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct P2pConfig {
    /// Address to accept peers on.
    pub listen_addr: SocketAddr,
    /// Keep-alive probe interval.
    pub ping_interval: Duration,
    /// Inactivity window before a peer is disconnected.
    pub connection_timeout: Duration,
    /// Bound of the inbound event channel.
    pub event_capacity: usize,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".parse().unwrap_or_else(|_| {
                SocketAddr::from(([127, 0, 0, 1], 0))
            }),
            ping_interval: Duration::from_secs(15),
            connection_timeout: Duration::from_secs(60),
            event_capacity: 1024,
        }
    }
}

type PeerMap = Arc<Mutex<HashMap<SocketAddr, mpsc::Sender<NetMessage>>>>;

/// The P2P transport handle.
pub struct P2pTransport {
    config: P2pConfig,
    local_addr: SocketAddr,
    peers: PeerMap,
    events: mpsc::Sender<NetEvent>,
}

impl P2pTransport {
    /// Bind the listener and start accepting peers. Returns the transport
    /// handle plus the single consumer end of the event channel.
    ///
    /// # Errors
    ///
    /// Returns an io error if the listen address cannot be bound.
    pub async fn bind(config: P2pConfig) -> Result<(Self, mpsc::Receiver<NetEvent>), NetError> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        let (events, event_receiver) = mpsc::channel(config.event_capacity);

        let transport = Self {
            config: config.clone(),
            local_addr,
            peers: Arc::new(Mutex::new(HashMap::new())),
            events: events.clone(),
        };

        let peers = Arc::clone(&transport.peers);
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        spawn_peer(stream, addr, &config, &peers, &events);
                    }
                    Err(error) => {
                        tracing::warn!(%error, "accept failed");
                    }
                }
            }
        });

        Ok((transport, event_receiver))
    }

    /// Address the listener actually bound.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Dial a peer and run the handshake.
    ///
    /// # Errors
    ///
    /// Returns an io or handshake error.
    pub async fn connect(&self, addr: SocketAddr) -> Result<(), NetError> {
        let stream = TcpStream::connect(addr).await?;
        spawn_peer(stream, addr, &self.config, &self.peers, &self.events);
        Ok(())
    }

    /// Queue a message to one peer.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::PeerUnavailable`] with no live connection.
    pub fn unicast(&self, addr: SocketAddr, message: NetMessage) -> Result<(), NetError> {
        let sender = {
            let peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
            peers.get(&addr).cloned()
        };
        let Some(sender) = sender else {
            return Err(NetError::PeerUnavailable(addr));
        };
        sender
            .try_send(message)
            .map_err(|_| NetError::PeerUnavailable(addr))
    }

    /// Queue a message to every connected peer. Unreachable or congested
    /// peers are skipped.
    pub fn broadcast(&self, message: &NetMessage) {
        let senders: Vec<(SocketAddr, mpsc::Sender<NetMessage>)> = {
            let peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
            peers
                .iter()
                .map(|(addr, sender)| (*addr, sender.clone()))
                .collect()
        };
        for (addr, sender) in senders {
            if sender.try_send(message.clone()).is_err() {
                tracing::debug!(%addr, "dropping broadcast to congested peer");
            }
        }
    }

    /// Currently connected peers.
    #[must_use]
    pub fn peer_addrs(&self) -> Vec<SocketAddr> {
        self.peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }
}

fn spawn_peer(
    stream: TcpStream,
    addr: SocketAddr,
    config: &P2pConfig,
    peers: &PeerMap,
    events: &mpsc::Sender<NetEvent>,
) {
    let config = config.clone();
    let peers = Arc::clone(peers);
    let events = events.clone();

    tokio::spawn(async move {
        let mut stream = stream;
        if let Err(error) = handshake(&mut stream).await {
            tracing::debug!(%addr, %error, "handshake failed");
            return;
        }

        let (outbound_tx, outbound_rx) = mpsc::channel::<NetMessage>(256);
        peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(addr, outbound_tx.clone());
        let _ = events.send(NetEvent::PeerConnected(addr)).await;

        let (read_half, write_half) = stream.into_split();
        run_peer(
            addr,
            read_half,
            write_half,
            outbound_rx,
            outbound_tx,
            &config,
            &events,
        )
        .await;

        peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&addr);
        let _ = events.send(NetEvent::PeerDisconnected(addr)).await;
    });
}

async fn run_peer(
    addr: SocketAddr,
    read_half: OwnedReadHalf,
    mut write_half: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<NetMessage>,
    loopback: mpsc::Sender<NetMessage>,
    config: &P2pConfig,
    events: &mpsc::Sender<NetEvent>,
) {
    // The reader owns the read half outright; frames are never torn by
    // select cancellation. PONGs are queued through the peer's own
    // outbound channel.
    let last_activity = Arc::new(Mutex::new(tokio::time::Instant::now()));
    let reader_activity = Arc::clone(&last_activity);
    let reader_events = events.clone();
    let reader = tokio::spawn(async move {
        let mut read_half = read_half;
        loop {
            let payload = match read_frame(&mut read_half).await {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::debug!(%addr, %error, "read failed; disconnecting");
                    return;
                }
            };
            *reader_activity.lock().unwrap_or_else(|e| e.into_inner()) =
                tokio::time::Instant::now();

            match NetMessage::decode(&payload) {
                Ok(NetMessage::Ping) => {
                    if loopback.send(NetMessage::Pong).await.is_err() {
                        return;
                    }
                }
                Ok(NetMessage::Pong) => {}
                Ok(message) => {
                    // A full event channel sheds load; datagram semantics
                    // allow the drop.
                    let _ = reader_events.try_send(NetEvent::Message { from: addr, message });
                }
                Err(error) => {
                    tracing::debug!(%addr, %error, "undecodable frame dropped");
                }
            }
        }
    });

    let mut ping_timer = tokio::time::interval(config.ping_interval);
    ping_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(message) = queued else { break };
                if write_frame(&mut write_half, &message.encode()).await.is_err() {
                    break;
                }
            }
            _ = ping_timer.tick() => {
                let idle = last_activity
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .elapsed();
                if idle > config.connection_timeout {
                    tracing::info!(%addr, "peer timed out");
                    break;
                }
                if reader.is_finished() {
                    break;
                }
                if write_frame(&mut write_half, &NetMessage::Ping.encode())
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }
    reader.abort();
}

// =============================================================================
// TESTS
// =============================================================================
