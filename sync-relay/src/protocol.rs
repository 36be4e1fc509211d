//! WebSocket upgrade handler for the `/ws` endpoint.
//!
//! Each upgraded socket is split: the write half becomes a [`Peer`] shared
//! with the hub, the read half is driven by a [`Session`] on the upgrade task.

use crate::peer::Peer;
use crate::server::RelayHub;
use crate::session::Session;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::Extension;
use futures_util::StreamExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Path peers connect to.
pub const WS_PATH: &str = "/ws";

/// Upgrade handler; any origin is accepted.
pub async fn ws_handler(ws: WebSocketUpgrade, Extension(hub): Extension<Arc<RelayHub>>) -> Response {
    let max_message_size = hub.config().limits.max_message_size;
    ws.max_message_size(max_message_size)
        .max_frame_size(max_message_size)
        .on_upgrade(move |socket| accept(hub, socket))
}

/// Run a freshly upgraded socket until it closes.
pub async fn accept(hub: Arc<RelayHub>, socket: WebSocket) {
    hub.metrics()
        .connections_total
        .fetch_add(1, Ordering::Relaxed);

    let (sink, stream) = socket.split();
    let peer = Arc::new(Peer::new(
        hub.next_peer_id(),
        sink,
        hub.config().limits.write_timeout(),
    ));

    Session::new(hub, peer).run(stream).await;
}
