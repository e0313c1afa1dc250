//! Client-side game state: a mirror of the server's view of the match
//! plus the screen phase driving the UI.

use log::{debug, warn};
use shared::{mark_from_title, Board, Code, Mark, Message, TITLE_SEPARATOR};

/// How long a finished game's announcement stays on screen before the
/// board resets and the client waits for the next opponent.
pub const RESET_DELAY_SECS: f64 = 5.0;

/// Which screen the client is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    WaitingForOpponent,
    Playing,
    /// A finished game's announcement, shown until the reset delay expires.
    GameOver { announcement: String },
    /// The server connection is gone; terminal.
    Disconnected,
}

#[derive(Debug)]
pub struct ClientGameState {
    name: String,
    phase: Phase,
    board: Board,
    title: String,
    mark: Option<Mark>,
    my_turn: bool,
}

impl ClientGameState {
    pub fn new(name: impl Into<String>) -> Self {
        ClientGameState {
            name: name.into(),
            phase: Phase::WaitingForOpponent,
            board: Board::new(),
            title: String::new(),
            mark: None,
            my_turn: false,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mark(&self) -> Option<Mark> {
        self.mark
    }

    /// Whether a click on the board means anything right now.
    pub fn can_play(&self) -> bool {
        self.phase == Phase::Playing && self.my_turn
    }

    /// A local click on `cell`. Applies the player's mark optimistically
    /// and hands back the Turn message to send; `None` when the click is
    /// not playable (not our turn, occupied cell).
    pub fn click(&mut self, cell: usize) -> Option<Message> {
        if !self.can_play() {
            return None;
        }
        let mark = self.mark?;
        if self.board.apply(cell, mark).is_err() {
            return None;
        }
        self.my_turn = false;
        Some(Message::turn(cell, mark))
    }

    /// Applies one message received from the server.
    pub fn apply_server_message(&mut self, message: Message) {
        match message.code {
            Code::MatchReady => self.start_match(&message.payload),
            Code::Turn => self.apply_remote_turn(&message),
            Code::EndGame => {
                let announcement = winner_announcement(&self.title, &message.payload);
                self.finish(announcement);
            }
            Code::Tie => self.finish("It's a tie!".to_string()),
            Code::Reset => self.finish("Opponent left the match".to_string()),
            Code::Quit => self.phase = Phase::Disconnected,
            other => debug!("Ignoring message {:?}", other),
        }
    }

    /// After a finished game's announcement: clears the board and waits
    /// for the next opponent. Called by the UI when the delay expires.
    pub fn reset_board(&mut self) {
        if matches!(self.phase, Phase::GameOver { .. }) {
            self.board = Board::new();
            self.title.clear();
            self.phase = Phase::WaitingForOpponent;
        }
    }

    fn start_match(&mut self, title: &str) {
        self.board = Board::new();
        self.title = title.to_string();
        self.mark = mark_from_title(title, &self.name);
        // X moves first; O waits for the opening turn.
        self.my_turn = self.mark == Some(Mark::X);
        self.phase = Phase::Playing;
    }

    fn apply_remote_turn(&mut self, message: &Message) {
        let Some((cell, mark)) = message.parse_turn() else {
            warn!("Malformed turn payload {:?}", message.payload);
            return;
        };
        if self.board.apply(cell, mark).is_err() {
            warn!("Server relayed a move for unplayable cell {}", cell);
            return;
        }
        self.my_turn = true;
    }

    fn finish(&mut self, announcement: String) {
        self.phase = Phase::GameOver { announcement };
        self.mark = None;
        self.my_turn = false;
    }
}

/// Names the winner from the match title: the name before the separator
/// played X, the one after played O.
fn winner_announcement(title: &str, winning_mark: &str) -> String {
    let Some((name_x, name_o)) = title.split_once(TITLE_SEPARATOR) else {
        return format!("Player {} wins!", winning_mark);
    };
    let winner = if winning_mark == "X" { name_x } else { name_o };
    format!("Player {} wins!", winner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_ready(title: &str) -> Message {
        Message::new(Code::MatchReady, title)
    }

    #[test]
    fn test_first_named_player_opens_as_x() {
        let mut state = ClientGameState::new("Alice");
        state.apply_server_message(match_ready("Alice VS Bob"));
        assert_eq!(state.mark(), Some(Mark::X));
        assert!(state.can_play());
        assert_eq!(state.phase(), &Phase::Playing);
    }

    #[test]
    fn test_second_named_player_waits_for_opening_turn() {
        let mut state = ClientGameState::new("Bob");
        state.apply_server_message(match_ready("Alice VS Bob"));
        assert_eq!(state.mark(), Some(Mark::O));
        assert!(!state.can_play());

        state.apply_server_message(Message::new(Code::Turn, "4X"));
        assert!(state.can_play());
        assert_eq!(state.board().cell(4), Some(Mark::X));
    }

    #[test]
    fn test_click_produces_turn_and_yields() {
        let mut state = ClientGameState::new("Alice");
        state.apply_server_message(match_ready("Alice VS Bob"));

        let turn = state.click(4).expect("playable cell");
        assert_eq!(turn.payload, "4X");
        assert!(!state.can_play(), "interaction off until the reply");
        assert_eq!(state.click(0), None);

        state.apply_server_message(Message::new(Code::Turn, "0O"));
        assert_eq!(state.click(0), None, "occupied cell");
        assert!(state.click(1).is_some());
    }

    #[test]
    fn test_end_game_names_the_winner() {
        let mut state = ClientGameState::new("Bob");
        state.apply_server_message(match_ready("Alice VS Bob"));
        state.apply_server_message(Message::new(Code::EndGame, "O"));
        match state.phase() {
            Phase::GameOver { announcement } => assert_eq!(announcement, "Player Bob wins!"),
            other => panic!("unexpected phase {:?}", other),
        }
        assert_eq!(state.mark(), None);
    }

    #[test]
    fn test_reset_returns_to_waiting() {
        let mut state = ClientGameState::new("Alice");
        state.apply_server_message(match_ready("Alice VS Bob"));
        state.apply_server_message(Message::new(Code::Turn, "4O"));
        state.apply_server_message(Message::empty(Code::Tie));
        state.reset_board();
        assert_eq!(state.phase(), &Phase::WaitingForOpponent);
        assert_eq!(state.board().cell(4), None);
        assert_eq!(state.title(), "");
    }

    #[test]
    fn test_opponent_reset_and_disconnect() {
        let mut state = ClientGameState::new("Alice");
        state.apply_server_message(match_ready("Alice VS Bob"));
        state.apply_server_message(Message::empty(Code::Reset));
        assert!(matches!(state.phase(), Phase::GameOver { .. }));

        state.apply_server_message(Message::empty(Code::Quit));
        assert_eq!(state.phase(), &Phase::Disconnected);
        assert_eq!(state.click(0), None);
    }
}
