//! The matchmaking service: session registry, waiting pool and active
//! matches behind one lock.
//!
//! Connection workers share a single [`Lobby`] and never touch each other's
//! sockets directly; every cross-player effect (pairing, relayed turns,
//! terminal messages, resets) goes through a player's outgoing queue. All
//! registry, pool and board mutations run under the same mutex, which makes
//! pairing atomic: nobody can observe a player between their removal from
//! the pool and their assignment to a new match.

use log::{debug, info, warn};
use shared::{match_title, Board, Code, Mark, Message, Outcome};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

/// Opaque identifier for one authenticated connection, independent of the
/// underlying socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for one active match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchId(u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a registered player currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Waiting,
    InMatch(MatchId),
}

/// Why a login request was refused. Both answers are recoverable: the
/// client may retry with another name indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    /// Another connected player already uses the name.
    NameTaken,
    /// Empty, or contains whitespace.
    InvalidName,
}

/// A registered player: display name, outgoing message queue, whereabouts.
#[derive(Debug)]
struct PlayerHandle {
    name: String,
    sender: UnboundedSender<Message>,
    status: Status,
}

/// One active game between two registered players. The first player
/// removed from the pool plays X and moves first by convention.
#[derive(Debug)]
struct ActiveMatch {
    x: SessionId,
    o: SessionId,
    board: Board,
}

impl ActiveMatch {
    fn opponent_of(&self, session: SessionId) -> SessionId {
        if session == self.x {
            self.o
        } else {
            self.x
        }
    }
}

#[derive(Debug, Default)]
struct LobbyState {
    players: HashMap<SessionId, PlayerHandle>,
    waiting: VecDeque<SessionId>,
    matches: HashMap<MatchId, ActiveMatch>,
    next_session: u64,
    next_match: u64,
}

/// The synchronized matchmaking service shared by all connection workers.
#[derive(Debug, Default)]
pub struct Lobby {
    state: Mutex<LobbyState>,
}

impl Lobby {
    pub fn new() -> Self {
        Lobby::default()
    }

    /// Validates a login request and registers the player with status
    /// `Waiting`. The player does not enter the pool yet; the caller
    /// queues the LoginSuccess reply first and then calls [`enter_pool`],
    /// so the reply always precedes a MatchReady.
    ///
    /// [`enter_pool`]: Lobby::enter_pool
    pub async fn register(
        &self,
        name: &str,
        sender: UnboundedSender<Message>,
    ) -> Result<SessionId, LoginError> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(LoginError::InvalidName);
        }
        let mut state = self.state.lock().await;
        if state.players.values().any(|player| player.name == name) {
            return Err(LoginError::NameTaken);
        }
        let session = SessionId(state.next_session);
        state.next_session += 1;
        state.players.insert(
            session,
            PlayerHandle {
                name: name.to_string(),
                sender,
                status: Status::Waiting,
            },
        );
        info!("Player {} registered (session {})", name, session);
        Ok(session)
    }

    /// Puts a registered player at the back of the waiting pool, then
    /// attempts pairing. Pairing happens here and nowhere else: on login,
    /// after a finished match, and when a disconnect repools the survivor.
    pub async fn enter_pool(&self, session: SessionId) {
        let mut state = self.state.lock().await;
        if !state.players.contains_key(&session) {
            return;
        }
        state.waiting.push_back(session);
        Self::pair_waiting(&mut state);
    }

    /// Records a validated move, relays the original Turn to the opponent
    /// and runs the termination check, all under the state lock. Rejected
    /// moves are dropped without relay, so a set cell is never overwritten.
    pub async fn apply_turn(&self, session: SessionId, cell: usize, mark: Mark, message: Message) {
        let mut state = self.state.lock().await;
        let Some(Status::InMatch(match_id)) = state.players.get(&session).map(|p| p.status) else {
            debug!("Ignoring turn from session {} outside a match", session);
            return;
        };
        let Some(game) = state.matches.get_mut(&match_id) else {
            return;
        };
        if let Err(err) = game.board.apply(cell, mark) {
            warn!("Rejected move from session {}: {}", session, err);
            return;
        }
        let opponent = game.opponent_of(session);
        let outcome = game.board.outcome();
        Self::send_to(&state, opponent, message);
        match outcome {
            Some(Outcome::Win(winner)) => {
                info!("Match {} won by {}", match_id, winner);
                Self::finish_match(
                    &mut state,
                    match_id,
                    Message::new(Code::EndGame, winner.to_string()),
                );
            }
            Some(Outcome::Tie) => {
                info!("Match {} ended in a tie", match_id);
                Self::finish_match(&mut state, match_id, Message::empty(Code::Tie));
            }
            None => {}
        }
    }

    /// Relays a message verbatim to the sender's current opponent. This
    /// covers protocol extension codes without dedicated dispatch logic.
    pub async fn relay_to_opponent(&self, session: SessionId, message: Message) {
        let state = self.state.lock().await;
        let Some(Status::InMatch(match_id)) = state.players.get(&session).map(|p| p.status) else {
            debug!(
                "Ignoring message {:?} from session {} outside a match",
                message.code, session
            );
            return;
        };
        if let Some(game) = state.matches.get(&match_id) {
            Self::send_to(&state, game.opponent_of(session), message);
        }
    }

    /// Tears down everything a vanished connection owned: the registry
    /// entry, the pool slot and, when mid-match, the match itself. The
    /// opponent gets exactly one Reset and returns to the pool. Safe to
    /// call for sessions that already left.
    pub async fn disconnect(&self, session: SessionId) {
        let mut state = self.state.lock().await;
        let Some(player) = state.players.remove(&session) else {
            return;
        };
        state.waiting.retain(|waiting| *waiting != session);
        info!("Player {} disconnected (session {})", player.name, session);
        if let Status::InMatch(match_id) = player.status {
            // The leaver is gone from the registry, so only the opponent
            // receives the Reset and re-enters the pool.
            Self::finish_match(&mut state, match_id, Message::empty(Code::Reset));
        }
    }

    pub async fn player_count(&self) -> usize {
        self.state.lock().await.players.len()
    }

    pub async fn waiting_count(&self) -> usize {
        self.state.lock().await.waiting.len()
    }

    pub async fn match_count(&self) -> usize {
        self.state.lock().await.matches.len()
    }

    /// Pairs front-of-pool players while at least two are waiting. The
    /// first removed plays X. Runs under the state lock held by the caller.
    fn pair_waiting(state: &mut LobbyState) {
        while state.waiting.len() >= 2 {
            let (x, o) = match (state.waiting.pop_front(), state.waiting.pop_front()) {
                (Some(x), Some(o)) => (x, o),
                _ => return,
            };
            let (Some(player_x), Some(player_o)) = (state.players.get(&x), state.players.get(&o))
            else {
                continue;
            };
            let title = match_title(&player_x.name, &player_o.name);
            let match_id = MatchId(state.next_match);
            state.next_match += 1;
            state.matches.insert(
                match_id,
                ActiveMatch {
                    x,
                    o,
                    board: Board::new(),
                },
            );
            if let Some(player) = state.players.get_mut(&x) {
                player.status = Status::InMatch(match_id);
            }
            if let Some(player) = state.players.get_mut(&o) {
                player.status = Status::InMatch(match_id);
            }
            info!("Match {} started: {}", match_id, title);
            Self::send_to(state, x, Message::new(Code::MatchReady, title.clone()));
            Self::send_to(state, o, Message::new(Code::MatchReady, title));
        }
    }

    /// Sends the terminal message to both participants, removes the match
    /// and returns the still-registered players to the back of the pool
    /// (X first), then attempts pairing again.
    fn finish_match(state: &mut LobbyState, match_id: MatchId, message: Message) {
        let Some(game) = state.matches.remove(&match_id) else {
            return;
        };
        for session in [game.x, game.o] {
            Self::send_to(state, session, message.clone());
            if let Some(player) = state.players.get_mut(&session) {
                player.status = Status::Waiting;
                state.waiting.push_back(session);
            }
        }
        Self::pair_waiting(state);
    }

    fn send_to(state: &LobbyState, session: SessionId, message: Message) {
        if let Some(player) = state.players.get(&session) {
            if player.sender.send(message).is_err() {
                debug!("Dropping message for {}: writer gone", player.name);
            }
        }
    }
}
