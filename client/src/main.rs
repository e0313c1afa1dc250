mod game;
mod input;
mod network;
mod rendering;

use clap::Parser;
use game::{ClientGameState, Phase, RESET_DELAY_SECS};
use log::{error, info};
use macroquad::prelude::*;
use network::Connection;
use rendering::Renderer;
use shared::{Code, Message};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:12345")]
    server: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Tic-Tac-Toe".to_string(),
        window_width: 600,
        window_height: 700,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    let renderer = Renderer::new();

    let mut connection = match Connection::connect(&args.server) {
        Ok(connection) => connection,
        Err(err) => {
            error!("Could not connect to {}: {}", args.server, err);
            fatal_screen(&renderer, &format!("Could not connect to {}", args.server)).await;
            return;
        }
    };

    // Name entry; a refusal keeps the screen up with an error line.
    let mut draft = String::new();
    let mut refusal: Option<String> = None;
    let name = loop {
        if input::edit_name(&mut draft) {
            match connection.login(&draft) {
                Ok(true) => break draft,
                Ok(false) => {
                    refusal = Some(format!("Name {:?} was refused, try another", draft));
                    draft.clear();
                }
                Err(err) => {
                    error!("Login failed: {}", err);
                    fatal_screen(&renderer, "Lost the server during login").await;
                    return;
                }
            }
        }
        renderer.draw_name_entry(&draft, refusal.as_deref());
        next_frame().await;
    };

    let incoming = match connection.listen() {
        Ok(incoming) => incoming,
        Err(err) => {
            error!("Could not start the reader thread: {}", err);
            fatal_screen(&renderer, "Lost the server after login").await;
            return;
        }
    };

    info!("Logged in as {}", name);
    let mut state = ClientGameState::new(name);
    let mut game_over_since: Option<f64> = None;

    loop {
        if let Some(since) = game_over_since {
            // The announcement stays up for a moment; messages for the
            // next match queue up in the channel meanwhile.
            if get_time() - since >= RESET_DELAY_SECS {
                state.reset_board();
                game_over_since = None;
            }
        } else {
            while let Ok(message) = incoming.try_recv() {
                state.apply_server_message(message);
                match state.phase() {
                    Phase::GameOver { .. } => {
                        game_over_since = Some(get_time());
                        break;
                    }
                    Phase::Disconnected => break,
                    _ => {}
                }
            }

            if let Some(cell) = input::clicked_cell(&renderer.layout) {
                if let Some(turn) = state.click(cell) {
                    if let Err(err) = connection.send(&turn) {
                        error!("Send failed: {}", err);
                        state.apply_server_message(Message::empty(Code::Quit));
                    }
                }
            }
        }

        renderer.draw_game(&state);
        next_frame().await;
    }
}

/// Shows a terminal error until the window is closed.
async fn fatal_screen(renderer: &Renderer, message: &str) {
    loop {
        renderer.draw_fatal(message);
        next_frame().await;
    }
}
