//! Push-channel transport
//!
//! A [`Connector`] opens a [`Channel`]: a receive-only stream of
//! [`ChannelEvent`]s plus a close handle. The sync and log-stream layers only
//! ever see this abstraction; [`ws::WsConnector`] backs it with a WebSocket.

pub mod channel;
pub mod ws;

use async_trait::async_trait;
use url::Url;

use crate::errors::ClientError;

pub use channel::{Channel, ChannelEvent, RemoteEnd, NORMAL_CLOSURE};
pub use ws::WsConnector;

/// Opens push channels
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a channel. Returning `Ok` is the "open" event.
    async fn connect(&self, url: &Url) -> Result<Channel, ClientError>;
}
