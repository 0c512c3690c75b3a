//! WebSocket transport

use async_trait::async_trait;
use futures::StreamExt;
use http::header::{HeaderValue, USER_AGENT};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, protocol::Message},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::ClientError;
use crate::transport::channel::{Channel, ChannelEvent};
use crate::transport::Connector;

/// Opens channels over WebSocket
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Channel, ClientError> {
        let mut request = url.as_str().into_client_request()?;
        request.headers_mut().insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("jobdeck/", env!("CARGO_PKG_VERSION"))),
        );

        let (mut ws_stream, _) = connect_async(request).await?;
        info!("WebSocket connected: {}", url);

        let (channel, mut remote) = Channel::pair();
        let url = url.clone();

        // Pump frames into the channel until either side goes away
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = remote.closed() => {
                        debug!("Closing WebSocket {}", url);
                        let _ = ws_stream.close(None).await;
                        return;
                    }
                    msg = ws_stream.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                if !remote.send(ChannelEvent::Text(text.as_str().to_owned())) {
                                    let _ = ws_stream.close(None).await;
                                    return;
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                let (code, reason) = frame
                                    .map(|f| (Some(u16::from(f.code)), f.reason.as_str().to_owned()))
                                    .unwrap_or((None, String::new()));
                                debug!("WebSocket {} closed by peer: {:?}", url, code);
                                remote.send(ChannelEvent::Closed { code, reason });
                                // The close reply goes out on the next read
                                while let Some(Ok(_)) = ws_stream.next().await {}
                                return;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("WebSocket {} error: {}", url, e);
                                remote.send(ChannelEvent::Error(e.to_string()));
                                return;
                            }
                            None => {
                                remote.send(ChannelEvent::Closed {
                                    code: None,
                                    reason: "stream ended".to_string(),
                                });
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(channel)
    }
}
