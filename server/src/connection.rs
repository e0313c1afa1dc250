//! One worker per client connection.
//!
//! A connection moves through four phases: accepted, authenticating,
//! active, closed. The worker owns the read half; a companion task owns
//! the write half and drains the player's outgoing queue, so everything
//! queued for one connection hits the socket in order. Any receive
//! failure, at any phase, counts as an implicit Quit.

use crate::dispatcher;
use crate::lobby::{Lobby, SessionId};
use log::{debug, info, warn};
use shared::{read_client_frame, write_server_frame, Code, Message};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Serves one client from accept to close. Disconnect cleanup runs
/// exactly once, whether the client quits, fails the handshake or
/// vanishes mid-match.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, lobby: Arc<Lobby>) {
    let (mut reader, writer) = stream.into_split();
    let (sender, receiver) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_outgoing(writer, receiver, peer));

    if let Some(session) = authenticate(&mut reader, &sender, &lobby, peer).await {
        serve(&mut reader, &lobby, session).await;
        lobby.disconnect(session).await;
    }

    // With the lobby's handle gone and ours dropped, the writer drains
    // whatever is still queued (a final Reset, say) and exits.
    drop(sender);
    if let Err(err) = writer_task.await {
        debug!("Writer task for {} ended abnormally: {}", peer, err);
    }
}

/// The login handshake. Replies LoginFail until a valid unique name
/// arrives; Quit or a receive failure aborts without registering.
async fn authenticate(
    reader: &mut OwnedReadHalf,
    sender: &UnboundedSender<Message>,
    lobby: &Lobby,
    peer: SocketAddr,
) -> Option<SessionId> {
    loop {
        let message = match read_client_frame(reader).await {
            Ok(message) => message,
            Err(err) => {
                debug!("{} left during login: {}", peer, err);
                return None;
            }
        };
        match message.code {
            Code::Quit => return None,
            Code::LoginSuccess => {
                match lobby.register(&message.payload, sender.clone()).await {
                    Ok(session) => {
                        // Reply before entering the pool so LoginSuccess
                        // always precedes a MatchReady on the queue.
                        queue(sender, Message::empty(Code::LoginSuccess));
                        lobby.enter_pool(session).await;
                        info!("{} logged in as {}", peer, message.payload);
                        return Some(session);
                    }
                    Err(err) => {
                        debug!("Login {:?} from {} refused: {:?}", message.payload, peer, err);
                        queue(sender, Message::empty(Code::LoginFail));
                    }
                }
            }
            other => {
                warn!("Unexpected code {:?} from {} during login", other, peer);
                queue(sender, Message::empty(Code::LoginFail));
            }
        }
    }
}

/// The active loop: one decoded frame at a time until Quit, or a receive
/// failure that stands in for it.
async fn serve(reader: &mut OwnedReadHalf, lobby: &Lobby, session: SessionId) {
    loop {
        match read_client_frame(reader).await {
            Ok(message) if message.code == Code::Quit => {
                debug!("Session {} quit", session);
                return;
            }
            Ok(message) => dispatcher::dispatch(lobby, session, message).await,
            Err(err) => {
                debug!("Receive failed for session {}: {}", session, err);
                return;
            }
        }
    }
}

/// Drains one player's outgoing queue onto the socket. A write failure
/// drops the connection; the reader side observes the dead socket and
/// runs the usual cleanup.
async fn write_outgoing(
    mut writer: OwnedWriteHalf,
    mut receiver: UnboundedReceiver<Message>,
    peer: SocketAddr,
) {
    while let Some(message) = receiver.recv().await {
        if let Err(err) = write_server_frame(&mut writer, &message).await {
            debug!("Write to {} failed: {}", peer, err);
            return;
        }
    }
}

fn queue(sender: &UnboundedSender<Message>, message: Message) {
    if sender.send(message).is_err() {
        debug!("Outgoing queue closed before the reply could be sent");
    }
}
