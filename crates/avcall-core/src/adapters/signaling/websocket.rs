//! WebSocket-based SignalingChannel adapter.
//!
//! Maintains one client connection to the signaling server, reconnecting
//! autonomously on a fixed backoff without a retry bound. Messages lost
//! while disconnected are not replayed; the session layer tolerates their
//! absence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::application::ports::{SignalCodec, SignalingChannel};
use crate::domain::signaling::SignalMsg;

use super::codec::JsonSignalCodec;

/// Fixed delay between reconnection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Client-side [`SignalingChannel`] backed by tungstenite.
pub struct WsSignalingChannel {
    url: String,
    codec: JsonSignalCodec,
    connected: AtomicBool,
    sink: Mutex<Option<WsSink>>,
}

impl WsSignalingChannel {
    fn new(url: String) -> Arc<Self> {
        Arc::new(Self {
            url,
            codec: JsonSignalCodec,
            connected: AtomicBool::new(false),
            sink: Mutex::new(None),
        })
    }

    /// Connect to `url` and keep the connection alive in a background task.
    /// Decoded inbound messages are pushed into `inbound`, which the call
    /// session's dispatcher drains.
    pub fn start(url: String, inbound: mpsc::Sender<SignalMsg>) -> Arc<Self> {
        let channel = Self::new(url);
        let runner = channel.clone();
        tokio::spawn(async move { runner.run(inbound).await });
        channel
    }

    /// Connection maintenance loop: connect, pump inbound frames, and on
    /// any disconnect retry after [`RECONNECT_DELAY`]. Exits only when the
    /// inbound receiver is dropped.
    async fn run(self: Arc<Self>, inbound: mpsc::Sender<SignalMsg>) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((socket, _)) => {
                    info!(url = %self.url, "signaling connected");
                    let (sink, mut stream) = socket.split();
                    *self.sink.lock().await = Some(sink);
                    self.connected.store(true, Ordering::SeqCst);

                    while let Some(frame) = stream.next().await {
                        let text = match frame {
                            Ok(Message::Text(text)) => text,
                            // Some relays deliver the JSON as a binary blob.
                            Ok(Message::Binary(data)) => match String::from_utf8(data) {
                                Ok(text) => text,
                                Err(e) => {
                                    warn!("dropping non-UTF-8 signaling frame: {e}");
                                    continue;
                                }
                            },
                            Ok(Message::Close(_)) => break,
                            Ok(_) => continue,
                            Err(e) => {
                                warn!("signaling read error: {e}");
                                break;
                            }
                        };
                        match self.codec.decode(&text) {
                            Ok(msg) => {
                                debug!(msg_type = msg.type_name(), "received signaling message");
                                if inbound.send(msg).await.is_err() {
                                    // Session dropped its queue; stop for good.
                                    self.disconnect().await;
                                    return;
                                }
                            }
                            Err(e) => warn!("ignoring undecodable signaling message: {e}"),
                        }
                    }

                    self.disconnect().await;
                    warn!("signaling disconnected, retrying");
                }
                Err(e) => warn!(url = %self.url, "signaling connect failed: {e}"),
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        *self.sink.lock().await = None;
    }
}

#[async_trait]
impl SignalingChannel for WsSignalingChannel {
    async fn send(&self, msg: SignalMsg) -> anyhow::Result<()> {
        let text = self.codec.encode(&msg)?;
        let mut guard = self.sink.lock().await;
        let sink = guard
            .as_mut()
            .context("signaling socket not connected")?;
        sink.send(Message::Text(text)).await?;
        debug!(msg_type = msg.type_name(), "sent signaling message");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_while_disconnected() {
        let channel = WsSignalingChannel::new("ws://127.0.0.1:1/".into());
        assert!(!channel.is_connected());
        assert!(channel.send(SignalMsg::Hangup).await.is_err());
    }
}
