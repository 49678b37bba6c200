//! Per-connection handler: read frames, forward them to the broker.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task draining the connection's outbound queue. The
//! handler never touches broker state; it only turns socket traffic into
//! [`BrokerEvent`]s:
//!   1. `Opened` as soon as the writer is running
//!   2. `Message` for every text frame (binary frames are ignored)
//!   3. `Closed` exactly once when the reader stops, whatever the cause

use std::sync::Arc;

use parlor_transport::{
    pump, CloseReason, Connection, ConnectionHandle, ConnectionId, Frame,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::server::BrokerEvent;
use crate::ParlorError;

/// Drop guard that reports the close and stops the writer when the
/// handler exits.
///
/// This ensures the broker hears about the close even if the handler
/// returns early with an error.
struct CloseGuard {
    connection: ConnectionId,
    reason: Option<CloseReason>,
    events: mpsc::UnboundedSender<BrokerEvent>,
    writer: JoinHandle<()>,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.writer.abort();
        let reason = self.reason.take().unwrap_or_else(CloseReason::abnormal);
        let _ = self.events.send(BrokerEvent::Closed {
            connection: self.connection,
            reason,
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: C,
    events: mpsc::UnboundedSender<BrokerEvent>,
) -> Result<(), ParlorError>
where
    C: Connection,
    ParlorError: From<C::Error>,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (handle, outbox) = ConnectionHandle::channel(conn_id);
    let writer = tokio::spawn({
        let conn = Arc::clone(&conn);
        async move {
            if let Err(e) = pump(&*conn, outbox).await {
                tracing::debug!(%conn_id, error = %e, "writer stopped");
            }
        }
    });

    let mut guard = CloseGuard {
        connection: conn_id,
        reason: None,
        events: events.clone(),
        writer,
    };

    if events.send(BrokerEvent::Opened(handle.clone())).is_err() {
        tracing::debug!(%conn_id, "broker gone, closing connection");
        conn.close().await?;
        return Ok(());
    }

    loop {
        match conn.recv().await? {
            Frame::Text(text) => {
                let event = BrokerEvent::Message {
                    connection: handle.clone(),
                    text,
                };
                if events.send(event).is_err() {
                    tracing::debug!(%conn_id, "broker gone, closing connection");
                    conn.close().await?;
                    break;
                }
            }
            Frame::Binary(len) => {
                tracing::debug!(%conn_id, len, "ignoring binary frame");
            }
            Frame::Closed(reason) => {
                guard.reason = Some(reason);
                break;
            }
        }
    }

    // guard drops here → writer stops, broker hears the close.
    Ok(())
}
