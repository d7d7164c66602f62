//! # Relay Client Session
//!
//! A self-healing WebSocket link to the relay, shared by the control and wall
//! roles.
//!
//! - Decoded events flow to the role through `inbound`; malformed frames are
//!   dropped here and never reach it.
//! - Events the role queues on `outbound` are written to the socket.
//! - `open` mirrors link liveness so roles can refuse to act while offline.
//!
//! On close or error the session waits a constant delay and reconnects,
//! forever. Nothing is replayed: events queued while the link was down are
//! discarded when it comes back.

use crate::protocol::Event;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The role's end of a session.
pub struct Link {
    pub inbound: mpsc::UnboundedReceiver<Event>,
    pub outbound: mpsc::UnboundedSender<Event>,
    pub open: watch::Receiver<bool>,
}

/// Why a connected session stopped pumping.
enum Ended {
    /// Socket closed or errored; reconnect.
    Disconnected(String),
    /// The role dropped its channels; stop for good.
    RoleGone,
}

/// Spawns a session task connected to `url`.
///
/// The task ends only when the role drops both ends of its [`Link`].
pub fn spawn_session(url: impl Into<String>, reconnect_delay: Duration) -> (Link, JoinHandle<()>) {
    let (inbound_tx, inbound) = mpsc::unbounded_channel();
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let (open_tx, open) = watch::channel(false);

    let handle = tokio::spawn(run_session(
        url.into(),
        reconnect_delay,
        inbound_tx,
        outbound_rx,
        open_tx,
    ));

    (
        Link {
            inbound,
            outbound,
            open,
        },
        handle,
    )
}

async fn run_session(
    url: String,
    reconnect_delay: Duration,
    inbound: mpsc::UnboundedSender<Event>,
    mut outbound: mpsc::UnboundedReceiver<Event>,
    open: watch::Sender<bool>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                let stale = discard_queued(&mut outbound);
                if stale > 0 {
                    debug!(stale, "dropping events queued while offline");
                }
                info!(url = %url, "connected to relay");
                open.send_replace(true);

                let ended = pump(socket, &inbound, &mut outbound).await;
                open.send_replace(false);

                match ended {
                    Ended::RoleGone => return,
                    Ended::Disconnected(reason) => {
                        warn!(reason = %reason, "relay connection closed, reconnecting");
                    }
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "failed to connect to relay, retrying");
            }
        }

        if inbound.is_closed() {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Moves frames in both directions until the socket or the role goes away.
async fn pump(
    socket: RelaySocket,
    inbound: &mpsc::UnboundedSender<Event>,
    outbound: &mut mpsc::UnboundedReceiver<Event>,
) -> Ended {
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match Event::decode(text.as_str()) {
                    Some(event) => {
                        if inbound.send(event).is_err() {
                            let _ = write.close().await;
                            return Ended::RoleGone;
                        }
                    }
                    None => debug!(frame = %text.as_str(), "dropping malformed frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    return Ended::Disconnected("closed by relay".to_string());
                }
                Some(Ok(_)) => {} // binary and control frames
                Some(Err(e)) => return Ended::Disconnected(e.to_string()),
            },
            event = outbound.recv() => match event {
                Some(event) => {
                    if let Err(e) = write.send(Message::Text(event.encode().into())).await {
                        return Ended::Disconnected(e.to_string());
                    }
                }
                None => {
                    let _ = write.close().await;
                    return Ended::RoleGone;
                }
            },
        }
    }
}

fn discard_queued(outbound: &mut mpsc::UnboundedReceiver<Event>) -> usize {
    let mut discarded = 0;
    while outbound.try_recv().is_ok() {
        discarded += 1;
    }
    discarded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_queued_empties_the_backlog() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Event::ScanStart).unwrap();
        tx.send(Event::ScanEnd).unwrap();

        assert_eq!(discard_queued(&mut rx), 2);
        assert_eq!(discard_queued(&mut rx), 0);
    }

    #[tokio::test]
    async fn session_reports_offline_while_relay_is_unreachable() {
        // Nothing listens on port 9 locally.
        let (link, handle) = spawn_session("ws://127.0.0.1:9/", Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!*link.open.borrow());

        drop(link);
        handle.abort();
    }

    #[tokio::test]
    async fn reconnects_without_replaying_events_queued_offline() {
        let wait = Duration::from_secs(2);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/", listener.local_addr().unwrap());
        let (mut link, handle) = spawn_session(url, Duration::from_millis(20));

        // First connection, dropped by the relay side.
        let (tcp, _) = listener.accept().await.unwrap();
        let first = tokio_tungstenite::accept_async(tcp).await.unwrap();
        tokio::time::timeout(wait, link.open.wait_for(|open| *open))
            .await
            .unwrap()
            .unwrap();
        drop(first);
        tokio::time::timeout(wait, link.open.wait_for(|open| !*open))
            .await
            .unwrap()
            .unwrap();

        // Queued while offline; must never reach the relay.
        link.outbound.send(Event::ScanStart).unwrap();

        let (tcp, _) = listener.accept().await.unwrap();
        let mut second = tokio_tungstenite::accept_async(tcp).await.unwrap();
        tokio::time::timeout(wait, link.open.wait_for(|open| *open))
            .await
            .unwrap()
            .unwrap();

        link.outbound.send(Event::Print).unwrap();
        let frame = tokio::time::timeout(wait, second.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(frame, Message::Text(r#"{"type":"print"}"#.into()));

        // Traffic flows the other way too.
        second
            .send(Message::Text(r#"{"type":"scan-end"}"#.into()))
            .await
            .unwrap();
        let event = tokio::time::timeout(wait, link.inbound.recv()).await.unwrap();
        assert_eq!(event, Some(Event::ScanEnd));

        handle.abort();
    }
}
