//! # Tic-Tac-Toe Game Server Library
//!
//! The authoritative server for the networked two-player tic-tac-toe game.
//! Clients connect over TCP, authenticate with a unique display name, are
//! paired in arrival order with another waiting client, and play a match to
//! a win or tie, after which both players return to the waiting pool.
//!
//! ## Architecture
//!
//! One tokio task is spawned per accepted connection; it performs the login
//! handshake, then reads frames and hands them to the dispatcher until the
//! client quits or the connection dies. A second, per-connection writer task
//! drains that player's outgoing queue, so messages to a single connection
//! always reach the socket in the order they were generated.
//!
//! All shared mutable state lives in the [`lobby::Lobby`]: the session
//! registry, the FIFO waiting pool and the set of active matches, guarded by
//! a single lock. Pairing removes two players from the pool and creates the
//! match in one critical section, so a player can never be paired twice or
//! end up in a half-created match.
//!
//! ## Module Organization
//!
//! ### Lobby Module (`lobby`)
//! The synchronized matchmaking service: login validation and name
//! uniqueness, the waiting pool, atomic pairing, per-match boards with
//! win/tie detection, and disconnect teardown.
//!
//! ### Connection Module (`connection`)
//! The per-connection lifecycle: login handshake with retries, the active
//! dispatch loop, the ordered writer task, and exactly-once cleanup.
//!
//! ### Dispatcher Module (`dispatcher`)
//! Routes one decoded message by the sender's status: turns go to the
//! sender's match, everything else is relayed verbatim to the opponent.
//!
//! ### Network Module (`network`)
//! The TCP listener and accept loop.
//!
//! ## Protocol
//!
//! Frames and message codes live in the `shared` crate and are byte-exact
//! with the historical wire format: clients prefix frames with a 4-byte
//! big-endian length, the server replies with a 4-digit ASCII length, and
//! both sides tag messages with 4-digit zero-padded codes. Any receive
//! failure counts as an implicit Quit for that connection.

pub mod connection;
pub mod dispatcher;
pub mod lobby;
pub mod network;
