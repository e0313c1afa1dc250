use std::fmt;
use std::io::{Read, Write};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Width of a frame length field: 4 raw bytes (client to server) or
/// 4 ASCII digits (server to client).
pub const LEN_SIZE: usize = 4;
/// Width of the zero-padded decimal message code on the wire.
pub const CODE_SIZE: usize = 4;
/// Largest frame body the server accepts from a client. Real traffic
/// (names, two-byte turn payloads) stays far below this.
pub const MAX_FRAME_LEN: usize = 512;
/// Largest frame body the 4-digit server length field can describe.
pub const MAX_SERVER_FRAME_LEN: usize = 9999;
pub const DEFAULT_PORT: u16 = 12345;
/// Separator between the two player names in a MatchReady payload.
pub const TITLE_SEPARATOR: &str = " VS ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Quit,
    LoginFail,
    LoginSuccess,
    MatchReady,
    Turn,
    EndGame,
    Tie,
    Reset,
    /// Any code outside the known range, carried so it can be relayed
    /// verbatim to the opponent.
    Extension(u16),
}

impl Code {
    pub fn from_value(value: u16) -> Self {
        match value {
            1 => Code::Quit,
            2 => Code::LoginFail,
            3 => Code::LoginSuccess,
            4 => Code::MatchReady,
            5 => Code::Turn,
            6 => Code::EndGame,
            7 => Code::Tie,
            8 => Code::Reset,
            other => Code::Extension(other),
        }
    }

    pub fn value(self) -> u16 {
        match self {
            Code::Quit => 1,
            Code::LoginFail => 2,
            Code::LoginSuccess => 3,
            Code::MatchReady => 4,
            Code::Turn => 5,
            Code::EndGame => 6,
            Code::Tie => 7,
            Code::Reset => 8,
            Code::Extension(value) => value,
        }
    }

    fn to_wire(self) -> String {
        format!("{:04}", self.value())
    }
}

/// One protocol message: a code and an ASCII payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub code: Code,
    pub payload: String,
}

impl Message {
    pub fn new(code: Code, payload: impl Into<String>) -> Self {
        Message {
            code,
            payload: payload.into(),
        }
    }

    pub fn empty(code: Code) -> Self {
        Message::new(code, "")
    }

    /// The login request a client sends; the server's reply reuses the
    /// same code with an empty payload.
    pub fn login_request(name: &str) -> Self {
        Message::new(Code::LoginSuccess, name)
    }

    pub fn turn(cell: usize, mark: Mark) -> Self {
        Message::new(Code::Turn, format!("{}{}", cell, mark.as_char()))
    }

    /// Splits a Turn payload (`<cell digits><mark char>`) back into its
    /// parts. `None` for anything that does not fit that shape; range
    /// checking is left to the board.
    pub fn parse_turn(&self) -> Option<(usize, Mark)> {
        let mark = Mark::from_char(self.payload.chars().last()?)?;
        let cell = self.payload[..self.payload.len() - 1].parse().ok()?;
        Some((cell, mark))
    }
}

#[derive(Debug)]
pub enum ProtocolError {
    /// The peer closed the connection, or an IO error made it unusable.
    ConnectionClosed,
    /// The bytes on the wire do not form a valid frame.
    MalformedFrame(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::ConnectionClosed => write!(f, "connection closed"),
            ProtocolError::MalformedFrame(reason) => write!(f, "malformed frame: {}", reason),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<std::io::Error> for ProtocolError {
    fn from(_: std::io::Error) -> Self {
        ProtocolError::ConnectionClosed
    }
}

fn body_bytes(message: &Message) -> Vec<u8> {
    let mut body = Vec::with_capacity(CODE_SIZE + message.payload.len());
    body.extend_from_slice(message.code.to_wire().as_bytes());
    body.extend_from_slice(message.payload.as_bytes());
    body
}

/// Client-to-server framing: a 4-byte big-endian length of the
/// code+payload block, then the block itself.
pub fn encode_client_frame(message: &Message) -> Vec<u8> {
    let body = body_bytes(message);
    let mut frame = Vec::with_capacity(LEN_SIZE + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    frame
}

/// Server-to-client framing: the same block, but the length field is a
/// 4-digit zero-padded ASCII decimal. The two directions differ on the
/// wire and must stay that way for compatibility.
pub fn encode_server_frame(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let body = body_bytes(message);
    if body.len() > MAX_SERVER_FRAME_LEN {
        return Err(ProtocolError::MalformedFrame(format!(
            "frame body of {} bytes exceeds the 4-digit length field",
            body.len()
        )));
    }
    let mut frame = Vec::with_capacity(LEN_SIZE + body.len());
    frame.extend_from_slice(format!("{:04}", body.len()).as_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Splits a frame body into its code and payload.
pub fn decode_body(body: &[u8]) -> Result<Message, ProtocolError> {
    if body.len() < CODE_SIZE {
        return Err(ProtocolError::MalformedFrame(format!(
            "frame body of {} bytes is shorter than a message code",
            body.len()
        )));
    }
    let code_str = std::str::from_utf8(&body[..CODE_SIZE])
        .map_err(|_| ProtocolError::MalformedFrame("message code is not ASCII".to_string()))?;
    let value: u16 = code_str.parse().map_err(|_| {
        ProtocolError::MalformedFrame(format!("non-numeric message code {:?}", code_str))
    })?;
    let payload = String::from_utf8(body[CODE_SIZE..].to_vec())
        .map_err(|_| ProtocolError::MalformedFrame("payload is not valid UTF-8".to_string()))?;
    Ok(Message::new(Code::from_value(value), payload))
}

/// Reads one client frame. Only the server reads this direction, so the
/// reader is async. A short read or EOF maps to `ConnectionClosed`.
pub async fn read_client_frame<R>(reader: &mut R) -> Result<Message, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; LEN_SIZE];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if !(CODE_SIZE..=MAX_FRAME_LEN).contains(&len) {
        return Err(ProtocolError::MalformedFrame(format!(
            "declared frame length {} outside {}..={}",
            len, CODE_SIZE, MAX_FRAME_LEN
        )));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    decode_body(&body)
}

pub async fn write_server_frame<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_server_frame(message)?;
    writer.write_all(&frame).await?;
    Ok(())
}

/// Reads one server frame. Only the client reads this direction, and the
/// client's networking is blocking, so the reader is sync.
pub fn read_server_frame<R: Read>(reader: &mut R) -> Result<Message, ProtocolError> {
    let mut len_buf = [0u8; LEN_SIZE];
    reader.read_exact(&mut len_buf)?;
    let len_str = std::str::from_utf8(&len_buf)
        .map_err(|_| ProtocolError::MalformedFrame("length field is not ASCII".to_string()))?;
    let len: usize = len_str.parse().map_err(|_| {
        ProtocolError::MalformedFrame(format!("non-numeric length field {:?}", len_str))
    })?;
    if len < CODE_SIZE {
        return Err(ProtocolError::MalformedFrame(format!(
            "declared frame length {} is shorter than a message code",
            len
        )));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    decode_body(&body)
}

pub fn write_client_frame<W: Write>(writer: &mut W, message: &Message) -> Result<(), ProtocolError> {
    writer.write_all(&encode_client_frame(message))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn as_char(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Mark> {
        match c {
            'X' => Some(Mark::X),
            'O' => Some(Mark::O),
            _ => None,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

pub const BOARD_CELLS: usize = 9;

/// The 8 cell triples that decide a game.
pub const WINNING_TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    OutOfRange(usize),
    CellOccupied(usize),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::OutOfRange(cell) => write!(f, "cell {} is outside the board", cell),
            MoveError::CellOccupied(cell) => write!(f, "cell {} is already occupied", cell),
        }
    }
}

impl std::error::Error for MoveError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Mark),
    Tie,
}

/// The 3x3 board. A cell, once set, is never cleared within a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Mark>; BOARD_CELLS],
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Records a move. Out-of-range and already-occupied cells are
    /// rejected; a set cell is never overwritten.
    pub fn apply(&mut self, index: usize, mark: Mark) -> Result<(), MoveError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(MoveError::OutOfRange(index))?;
        if cell.is_some() {
            return Err(MoveError::CellOccupied(index));
        }
        *cell = Some(mark);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    /// Terminal state, if any: a filled winning triple beats a full board.
    pub fn outcome(&self) -> Option<Outcome> {
        for triple in &WINNING_TRIPLES {
            let [a, b, c] = *triple;
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Some(Outcome::Win(mark));
                }
            }
        }
        if self.is_full() {
            Some(Outcome::Tie)
        } else {
            None
        }
    }
}

pub fn match_title(name_x: &str, name_o: &str) -> String {
    format!("{}{}{}", name_x, TITLE_SEPARATOR, name_o)
}

/// Which mark a player holds, derived from a MatchReady title: the name
/// before the separator plays X, the one after plays O.
pub fn mark_from_title(title: &str, own_name: &str) -> Option<Mark> {
    let (name_x, name_o) = title.split_once(TITLE_SEPARATOR)?;
    if name_x == own_name {
        Some(Mark::X)
    } else if name_o == own_name {
        Some(Mark::O)
    } else {
        None
    }
}
