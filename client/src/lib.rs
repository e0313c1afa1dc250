//! Thin display client for the tic-tac-toe server.
//!
//! The client holds no authority: it encodes user clicks as Turn messages
//! and mirrors whatever the server relays back. Networking is a blocking
//! socket with one reader thread behind the render loop; game state and
//! board geometry are plain data so they stay testable without a window.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
