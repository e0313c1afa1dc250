//! Routes one decoded message from an authenticated player.

use crate::lobby::{Lobby, SessionId};
use log::warn;
use shared::{Code, Message};

/// Turns are parsed and applied to the sender's match; every other code is
/// relayed verbatim to the opponent, which covers future extension codes
/// without new dispatch logic. Messages from players outside a match are
/// dropped by the lobby. Quit never reaches this point; the connection
/// worker handles it.
pub async fn dispatch(lobby: &Lobby, session: SessionId, message: Message) {
    match message.code {
        Code::Turn => match message.parse_turn() {
            Some((cell, mark)) => lobby.apply_turn(session, cell, mark, message).await,
            None => warn!(
                "Dropping turn with malformed payload {:?} from session {}",
                message.payload, session
            ),
        },
        _ => lobby.relay_to_opponent(session, message).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    async fn paired_lobby() -> (Lobby, SessionId, UnboundedReceiver<Message>) {
        let lobby = Lobby::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = lobby.register("A", tx_a).await.unwrap();
        lobby.enter_pool(a).await;
        let b = lobby.register("B", tx_b).await.unwrap();
        lobby.enter_pool(b).await;
        rx_a.try_recv().expect("match ready for A");
        rx_b.try_recv().expect("match ready for B");
        (lobby, a, rx_b)
    }

    #[tokio::test]
    async fn test_turn_reaches_the_match() {
        let (lobby, a, mut rx_b) = paired_lobby().await;
        dispatch(&lobby, a, Message::new(Code::Turn, "4X")).await;
        assert_eq!(rx_b.try_recv().unwrap().payload, "4X");
    }

    #[tokio::test]
    async fn test_malformed_turn_is_dropped() {
        let (lobby, a, mut rx_b) = paired_lobby().await;
        dispatch(&lobby, a, Message::new(Code::Turn, "banana")).await;
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_code_is_relayed_verbatim() {
        let (lobby, a, mut rx_b) = paired_lobby().await;
        let extension = Message::new(Code::Extension(42), "ping");
        dispatch(&lobby, a, extension.clone()).await;
        assert_eq!(rx_b.try_recv().unwrap(), extension);
    }
}
