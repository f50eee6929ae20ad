use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use super::{encode_response, handle_message};
use crate::dispatch::Dispatcher;
use crate::error::ExplainError;
use crate::request::Response;

/// WebSocket endpoint the page-side script connects to.
///
/// Frames on one connection are answered strictly in arrival order, one at a
/// time, so a page never has two of its requests in flight at once.
pub struct MessageBridge {
    dispatcher: Arc<Dispatcher>,
    port: u16,
}

impl MessageBridge {
    pub fn new(dispatcher: Arc<Dispatcher>, port: u16) -> Self {
        Self { dispatcher, port }
    }

    /// Binds `127.0.0.1:<port>` and spawns the accept loop. Returns the bound
    /// address (useful with port 0).
    pub async fn start(&self) -> Result<SocketAddr, String> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind WebSocket server: {}", e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        info!("Message bridge listening on ws://{}", local_addr);

        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                debug!("Page script connected from: {}", peer);
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    serve_connection(stream, dispatcher).await;
                });
            }
        });

        Ok(local_addr)
    }
}

async fn serve_connection(stream: TcpStream, dispatcher: Arc<Dispatcher>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            error!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    while let Some(msg_result) = read.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                debug!("WebSocket error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let response = handle_message(&dispatcher, text.as_str()).await;
                if response.is_error() {
                    debug!("Answering with error: {:?}", response);
                }
                if let Err(e) = write.send(Message::text(encode_response(&response))).await {
                    warn!("Failed to send bridge response: {}", e);
                    break;
                }
            }
            Message::Close(_) => break,
            Message::Binary(_) => {
                let response: Response =
                    ExplainError::Malformed("binary frames are not supported".to_string()).into();
                if write
                    .send(Message::text(encode_response(&response)))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            _ => {}
        }
    }

    debug!("Page script disconnected");
}
