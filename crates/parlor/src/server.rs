//! `ParlorServer` builder and server loop.
//!
//! This is the entry point for running a Parlor broker. It ties together
//! all the layers: transport → protocol → session → game.
//!
//! All broker state lives in one actor task. Connection handlers send it
//! [`BrokerEvent`]s over a channel; the actor applies them one at a time
//! and sweeps stale sessions on a timer, so message handling, close
//! handling and reaping never overlap.

use std::marker::PhantomData;
use std::time::{Duration, Instant};

use parlor_game::GameInstance;
use parlor_session::SessionConfig;
use parlor_transport::{
    CloseReason, ConnectionHandle, ConnectionId, Transport, WebSocketTransport,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::broker::{Admission, Broker, Continuation};
use crate::handler::handle_connection;
use crate::ParlorError;

/// Everything the actor reacts to besides the reaper timer.
#[derive(Debug)]
pub(crate) enum BrokerEvent {
    /// A connection opened.
    Opened(ConnectionHandle),
    /// A text frame arrived.
    Message {
        connection: ConnectionHandle,
        text: String,
    },
    /// A connection closed.
    Closed {
        connection: ConnectionId,
        reason: CloseReason,
    },
    /// Issued credentials were flushed; dispatch the parked message.
    Resume(Continuation),
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::prelude::*;
///
/// let server = ParlorServer::builder()
///     .bind("0.0.0.0:8080")
///     .build::<MyGame>()
///     .await?;
/// server.run().await
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and creates the server for game `G`.
    pub async fn build<G: GameInstance>(self) -> Result<ParlorServer<G>, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(ParlorServer {
            transport,
            session_config: self.session_config,
            _game: PhantomData,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<G: GameInstance> {
    transport: WebSocketTransport,
    session_config: SessionConfig,
    _game: PhantomData<fn() -> G>,
}

impl<G: GameInstance> ParlorServer<G> {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server.
    ///
    /// Starts the broker actor, then accepts connections and spawns a
    /// handler task for each. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        let (events, inbox) = mpsc::unbounded_channel();
        let broker = Broker::<G>::new(&self.session_config);
        tracing::info!(
            runtime_identifier = %broker.runtime_identifier(),
            "Parlor server running"
        );
        tokio::spawn(run_broker(
            broker,
            inbox,
            events.clone(),
            self.session_config.reap_interval,
        ));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let events = events.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, events).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// The broker actor: the only code that touches broker state.
async fn run_broker<G: GameInstance>(
    mut broker: Broker<G>,
    mut inbox: mpsc::UnboundedReceiver<BrokerEvent>,
    resumes: mpsc::UnboundedSender<BrokerEvent>,
    reap_interval: Duration,
) {
    // `interval` rejects a zero period.
    let mut reap = tokio::time::interval(reap_interval.max(Duration::from_millis(1)));
    reap.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = inbox.recv() => {
                let Some(event) = event else { break };
                match event {
                    BrokerEvent::Opened(connection) => broker.on_open(&connection),
                    BrokerEvent::Message { connection, text } => {
                        if let Admission::AwaitingDelivery { delivered, continuation } =
                            broker.on_message(&connection, &text)
                        {
                            let resumes = resumes.clone();
                            tokio::spawn(async move {
                                if delivered.await.is_ok() {
                                    let _ = resumes.send(BrokerEvent::Resume(continuation));
                                } else {
                                    tracing::debug!(
                                        identity = %continuation.identity(),
                                        "credentials never delivered, dropping message"
                                    );
                                }
                            });
                        }
                    }
                    BrokerEvent::Closed { connection, reason } => {
                        broker.on_close(connection, &reason, Instant::now());
                    }
                    BrokerEvent::Resume(continuation) => {
                        broker.resume(continuation);
                    }
                }
            }
            _ = reap.tick() => {
                broker.reap(Instant::now());
            }
        }
    }
}
