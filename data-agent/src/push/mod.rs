//! Optional WebSocket push channel
//!
//! Server frames are forwarded to the [`EventBus`] as
//! [`AgentEvent::Push`]. Nothing else in the crate depends on this channel
//! being up.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{AgentEvent, EventBus};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Frame sent by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Search { query: String },
    Chat { message: String },
}

/// Frame pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// One streamed search hit
    SearchResult { data: Value },
    /// One streamed chunk of a chat reply
    ChatResponse { data: Value },
    /// A background analysis finished
    AnalysisComplete {
        analysis_type: String,
        result: Value,
    },
    AnalysisError {
        analysis_type: String,
        error: String,
    },
    Error { message: String },
}

pub struct PushClient {
    write: SplitSink<WsStream, Message>,
    reader: JoinHandle<()>,
}

impl PushClient {
    /// Open the socket and start forwarding server frames to `bus`
    pub async fn connect(ws_url: &str, bus: EventBus) -> Result<Self> {
        let (stream, _) = connect_async(ws_url).await?;
        info!("🔌 Push channel connected to {}", ws_url);

        let (write, read) = stream.split();
        let reader = tokio::spawn(forward_frames(read, bus));

        Ok(Self { write, reader })
    }

    pub async fn send_search(&mut self, query: &str) -> Result<()> {
        self.send(ClientFrame::Search {
            query: query.to_string(),
        })
        .await
    }

    pub async fn send_chat(&mut self, message: &str) -> Result<()> {
        self.send(ClientFrame::Chat {
            message: message.to_string(),
        })
        .await
    }

    async fn send(&mut self, frame: ClientFrame) -> Result<()> {
        let json = serde_json::to_string(&frame)?;
        debug!("📤 {}", json);
        self.write.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Whether the reader is still receiving
    pub fn is_open(&self) -> bool {
        !self.reader.is_finished()
    }

    pub async fn close(mut self) -> Result<()> {
        let result = self.write.close().await;
        self.reader.abort();
        info!("Push channel closed");
        result.map_err(Into::into)
    }
}

async fn forward_frames(mut read: SplitStream<WsStream>, bus: EventBus) {
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<PushMessage>(&text) {
                Ok(message) => {
                    debug!("📥 push frame: {:?}", message);
                    bus.publish(AgentEvent::Push(message));
                }
                Err(e) => warn!("Dropping unrecognised push frame ({}): {}", e, text),
            },
            Ok(Message::Close(_)) => {
                debug!("Server closed the push channel");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Push channel error: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frame_shape() {
        let json = serde_json::to_value(ClientFrame::Search {
            query: "rust".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "search", "query": "rust"}));
    }

    #[test]
    fn test_server_frames_parse() {
        let frame: PushMessage = serde_json::from_str(
            r#"{"type": "analysis_error", "analysis_type": "trends", "error": "timeout"}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            PushMessage::AnalysisError {
                analysis_type: "trends".to_string(),
                error: "timeout".to_string()
            }
        );

        assert!(serde_json::from_str::<PushMessage>(r#"{"type": "unknown"}"#).is_err());
    }
}
