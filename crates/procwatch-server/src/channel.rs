//! WebSocket-backed notification channel.

use procwatch_core::{
    CancellationToken, NotificationChannel, ProcessEvent, ProcwatchError, Result,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Encode an event as the text frame sent to clients: `[event, payload]`.
pub fn encode_event(event: &str, payload: &ProcessEvent) -> Result<String> {
    Ok(serde_json::to_string(&(event, payload))?)
}

/// Queues encoded frames for the connection's writer task.
///
/// The queue is bounded and emission never waits. A client that stops reading
/// fills the queue; the overflowing emit cancels `overflow`, which the
/// connection handler treats as a disconnect. Either way, every emit after
/// that fails with [`ProcwatchError::ChannelClosed`].
pub struct WsChannel {
    tx: mpsc::Sender<String>,
    overflow: CancellationToken,
}

impl WsChannel {
    pub fn new(tx: mpsc::Sender<String>, overflow: CancellationToken) -> Self {
        Self { tx, overflow }
    }
}

impl NotificationChannel for WsChannel {
    fn emit(&self, event: &str, payload: &ProcessEvent) -> Result<()> {
        if self.overflow.is_cancelled() {
            return Err(ProcwatchError::ChannelClosed);
        }

        let frame = encode_event(event, payload)?;
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Client is not reading; dropping connection");
                self.overflow.cancel();
                Err(ProcwatchError::ChannelClosed)
            }
            Err(TrySendError::Closed(_)) => Err(ProcwatchError::ChannelClosed),
        }
    }
}
