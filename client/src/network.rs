//! Blocking socket plumbing: the login handshake runs on the caller's
//! thread, then a reader thread forwards decoded messages to the render
//! loop through a channel.

use log::{debug, info};
use shared::{read_server_frame, write_client_frame, Code, Message, ProtocolError};
use std::io;
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// The client's connection to the game server.
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    pub fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        info!("Connected to {}", addr);
        Ok(Connection { stream })
    }

    /// Requests a display name and synchronously awaits the verdict.
    /// `true` means the server accepted the name; `false` invites a retry.
    pub fn login(&mut self, name: &str) -> Result<bool, ProtocolError> {
        write_client_frame(&mut self.stream, &Message::login_request(name))?;
        let reply = read_server_frame(&mut self.stream)?;
        Ok(reply.code == Code::LoginSuccess)
    }

    pub fn send(&mut self, message: &Message) -> Result<(), ProtocolError> {
        write_client_frame(&mut self.stream, message)
    }

    /// Spawns the reader thread. Every decoded message lands in the
    /// returned channel; a receive failure is forwarded as Quit (the
    /// signal that the connection is gone) and ends the thread.
    pub fn listen(&self) -> io::Result<Receiver<Message>> {
        let mut stream = self.stream.try_clone()?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || loop {
            let message = match read_server_frame(&mut stream) {
                Ok(message) => message,
                Err(err) => {
                    debug!("Receive failed: {}", err);
                    let _ = tx.send(Message::empty(Code::Quit));
                    return;
                }
            };
            if tx.send(message).is_err() {
                return;
            }
        });
        Ok(rx)
    }
}
