//! End-to-end tests driving the real TCP server with blocking client
//! sockets speaking the actual wire protocol.

use server::network::Server;
use shared::{read_server_frame, write_client_frame, Code, Mark, Message};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Boots a server on an ephemeral port. The runtime must stay alive for
/// the duration of the test, so it is returned alongside the address.
fn start_server() -> (Runtime, SocketAddr) {
    let runtime = Runtime::new().expect("tokio runtime");
    let server = runtime
        .block_on(Server::bind("127.0.0.1:0"))
        .expect("bind server");
    let addr = server.local_addr().expect("local addr");
    runtime.spawn(async move {
        if let Err(err) = server.run().await {
            eprintln!("server stopped: {}", err);
        }
    });
    (runtime, addr)
}

/// One blocking test client.
struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        TestClient { stream }
    }

    /// Connects and logs in, asserting the name is accepted.
    fn login(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::connect(addr);
        client.send(&Message::login_request(name));
        let reply = client.recv();
        assert_eq!(reply.code, Code::LoginSuccess, "login as {} refused", name);
        client
    }

    fn send(&mut self, message: &Message) {
        write_client_frame(&mut self.stream, message).expect("send frame");
    }

    fn recv(&mut self) -> Message {
        read_server_frame(&mut self.stream).expect("receive frame")
    }

    fn expect(&mut self, code: Code) -> Message {
        let message = self.recv();
        assert_eq!(message.code, code, "unexpected message {:?}", message);
        message
    }

    /// Asserts that nothing arrives within a short window.
    fn assert_silent(&mut self) {
        self.stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .expect("read timeout");
        if let Ok(message) = read_server_frame(&mut self.stream) {
            panic!("expected silence, received {:?}", message);
        }
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
    }
}

/// LOGIN HANDSHAKE TESTS
mod login_tests {
    use super::*;

    #[test]
    fn duplicate_and_invalid_names_are_refused() {
        let (_rt, addr) = start_server();
        let mut alice = TestClient::login(addr, "Alice");

        let mut bob = TestClient::connect(addr);
        bob.send(&Message::login_request("Alice"));
        assert_eq!(bob.recv().code, Code::LoginFail);
        bob.send(&Message::login_request(""));
        assert_eq!(bob.recv().code, Code::LoginFail);
        bob.send(&Message::login_request("Bob Smith"));
        assert_eq!(bob.recv().code, Code::LoginFail);
        bob.send(&Message::new(Code::Turn, "0X"));
        assert_eq!(bob.recv().code, Code::LoginFail);

        bob.send(&Message::login_request("Bob"));
        assert_eq!(bob.recv().code, Code::LoginSuccess);

        assert_eq!(alice.expect(Code::MatchReady).payload, "Alice VS Bob");
        assert_eq!(bob.expect(Code::MatchReady).payload, "Alice VS Bob");
    }

    #[test]
    fn name_is_freed_after_disconnect() {
        let (_rt, addr) = start_server();
        let alice = TestClient::login(addr, "Alice");
        drop(alice);

        // The server notices the drop asynchronously.
        let mut accepted = false;
        let mut retry = TestClient::connect(addr);
        for _ in 0..50 {
            retry.send(&Message::login_request("Alice"));
            if retry.recv().code == Code::LoginSuccess {
                accepted = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(accepted, "name was not released after disconnect");
    }

    #[test]
    fn quit_during_login_registers_nothing() {
        let (_rt, addr) = start_server();
        let mut quitter = TestClient::connect(addr);
        quitter.send(&Message::empty(Code::Quit));
        drop(quitter);

        // The quitter never entered the pool, so a following pair still
        // matches with each other.
        let mut alice = TestClient::login(addr, "Alice");
        let mut bob = TestClient::login(addr, "Bob");
        assert_eq!(alice.expect(Code::MatchReady).payload, "Alice VS Bob");
        bob.expect(Code::MatchReady);
    }
}

/// MATCHMAKING TESTS
mod matchmaking_tests {
    use super::*;

    #[test]
    fn arrivals_pair_fifo_and_third_waits() {
        let (_rt, addr) = start_server();
        let mut a = TestClient::login(addr, "A");
        let mut b = TestClient::login(addr, "B");
        assert_eq!(a.expect(Code::MatchReady).payload, "A VS B");
        assert_eq!(b.expect(Code::MatchReady).payload, "A VS B");

        let mut c = TestClient::login(addr, "C");
        c.assert_silent();
    }
}

/// MATCH PLAY TESTS
mod match_tests {
    use super::*;

    fn paired(addr: SocketAddr) -> (TestClient, TestClient) {
        let mut alice = TestClient::login(addr, "Alice");
        let mut bob = TestClient::login(addr, "Bob");
        alice.expect(Code::MatchReady);
        bob.expect(Code::MatchReady);
        (alice, bob)
    }

    #[test]
    fn three_turns_win_for_x() {
        let (_rt, addr) = start_server();
        let (mut alice, mut bob) = paired(addr);

        // Turn order is not enforced; the first mover can fill a row.
        for cell in 0..3 {
            alice.send(&Message::turn(cell, Mark::X));
            assert_eq!(bob.expect(Code::Turn).payload, format!("{}X", cell));
        }
        assert_eq!(alice.expect(Code::EndGame).payload, "X");
        assert_eq!(bob.expect(Code::EndGame).payload, "X");
    }

    #[test]
    fn full_board_without_winner_is_a_tie() {
        let (_rt, addr) = start_server();
        let (mut alice, mut bob) = paired(addr);

        // X X O / O O X / X O X, interleaved so no triple fills early.
        let script = [
            (Mark::X, 0),
            (Mark::O, 2),
            (Mark::X, 1),
            (Mark::O, 3),
            (Mark::X, 5),
            (Mark::O, 4),
            (Mark::X, 6),
            (Mark::O, 7),
            (Mark::X, 8),
        ];
        for (mark, cell) in script {
            match mark {
                Mark::X => {
                    alice.send(&Message::turn(cell, mark));
                    bob.expect(Code::Turn);
                }
                Mark::O => {
                    bob.send(&Message::turn(cell, mark));
                    alice.expect(Code::Turn);
                }
            }
        }
        assert_eq!(alice.expect(Code::Tie).payload, "");
        assert_eq!(bob.expect(Code::Tie).payload, "");
    }

    #[test]
    fn occupied_cell_is_never_overwritten() {
        let (_rt, addr) = start_server();
        let (mut alice, mut bob) = paired(addr);

        alice.send(&Message::turn(4, Mark::X));
        bob.expect(Code::Turn);

        // Bob tries to steal the center; the move is dropped, not relayed.
        bob.send(&Message::turn(4, Mark::O));
        alice.assert_silent();

        // The center still holds X: the diagonal wins for Alice.
        for cell in [0, 8] {
            alice.send(&Message::turn(cell, Mark::X));
            bob.expect(Code::Turn);
        }
        assert_eq!(alice.expect(Code::EndGame).payload, "X");
        assert_eq!(bob.expect(Code::EndGame).payload, "X");
    }
}

/// DISCONNECT HANDLING TESTS
mod disconnect_tests {
    use super::*;

    #[test]
    fn opponent_gets_one_reset_and_is_repairable() {
        let (_rt, addr) = start_server();
        let mut alice = TestClient::login(addr, "Alice");
        let mut bob = TestClient::login(addr, "Bob");
        alice.expect(Code::MatchReady);
        bob.expect(Code::MatchReady);

        drop(bob);
        alice.expect(Code::Reset);

        // Alice is back in the pool; a new arrival pairs with her.
        let mut carol = TestClient::login(addr, "Carol");
        assert_eq!(alice.expect(Code::MatchReady).payload, "Alice VS Carol");
        assert_eq!(carol.expect(Code::MatchReady).payload, "Alice VS Carol");
        alice.assert_silent();
    }

    #[test]
    fn malformed_frame_counts_as_quit() {
        let (_rt, addr) = start_server();
        let mut alice = TestClient::login(addr, "Alice");
        let mut bob = TestClient::login(addr, "Bob");
        alice.expect(Code::MatchReady);
        bob.expect(Code::MatchReady);

        // An absurd declared length gets Bob disconnected.
        use std::io::Write;
        bob.stream
            .write_all(&u32::MAX.to_be_bytes())
            .expect("write garbage");
        alice.expect(Code::Reset);
    }
}

/// CLIENT STATE MACHINE TESTS (headless)
mod client_state_tests {
    use super::*;
    use client::game::{ClientGameState, Phase};

    #[test]
    fn client_mirrors_a_full_match() {
        let mut state = ClientGameState::new("Alice");
        state.apply_server_message(Message::new(Code::MatchReady, "Alice VS Bob"));
        assert_eq!(state.mark(), Some(Mark::X));
        assert!(state.can_play());

        let turn = state.click(4).expect("playable cell");
        assert_eq!(turn.payload, "4X");
        assert!(!state.can_play());

        state.apply_server_message(Message::new(Code::Turn, "0O"));
        assert!(state.can_play());

        state.apply_server_message(Message::new(Code::EndGame, "X"));
        match state.phase() {
            Phase::GameOver { announcement } => assert_eq!(announcement, "Player Alice wins!"),
            other => panic!("unexpected phase {:?}", other),
        }

        state.reset_board();
        assert_eq!(state.phase(), &Phase::WaitingForOpponent);
    }

    #[test]
    fn lost_connection_is_terminal() {
        let mut state = ClientGameState::new("Alice");
        state.apply_server_message(Message::empty(Code::Quit));
        assert_eq!(state.phase(), &Phase::Disconnected);
    }
}
