//! Immediate-mode drawing of the login screen, the board and the status
//! lines.

use crate::game::{ClientGameState, Phase};
use crate::input::BoardLayout;
use macroquad::prelude::*;

const BACKGROUND: Color = Color::new(0.10, 0.10, 0.10, 1.0);
const CELL_COLOR: Color = Color::new(0.27, 0.27, 0.27, 1.0);
const X_COLOR: Color = Color::new(0.30, 0.85, 0.45, 1.0);
const O_COLOR: Color = Color::new(1.00, 0.35, 0.35, 1.0);

pub struct Renderer {
    pub layout: BoardLayout,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            layout: BoardLayout {
                origin_x: 50.0,
                origin_y: 120.0,
                cell_size: 160.0,
                gap: 10.0,
            },
        }
    }

    pub fn draw_name_entry(&self, name: &str, error: Option<&str>) {
        clear_background(BACKGROUND);
        self.draw_centered("Enter username:", 200.0, 40.0, WHITE);
        self.draw_centered(&format!("{}_", name), 280.0, 48.0, X_COLOR);
        if let Some(error) = error {
            self.draw_centered(error, 360.0, 24.0, O_COLOR);
        }
        self.draw_centered("Press Enter to join", 430.0, 24.0, GRAY);
    }

    pub fn draw_fatal(&self, message: &str) {
        clear_background(BACKGROUND);
        self.draw_centered(message, 300.0, 32.0, O_COLOR);
    }

    pub fn draw_game(&self, state: &ClientGameState) {
        clear_background(BACKGROUND);
        self.draw_centered(state.title(), 60.0, 32.0, WHITE);
        self.draw_board(state);
        self.draw_status(state);
    }

    fn draw_board(&self, state: &ClientGameState) {
        for index in 0..9 {
            let (x, y, w, h) = self.layout.cell_rect(index);
            draw_rectangle(x, y, w, h, CELL_COLOR);
            draw_rectangle_lines(x, y, w, h, 2.0, WHITE);
            if let Some(mark) = state.board().cell(index) {
                let color = if mark == shared::Mark::X { X_COLOR } else { O_COLOR };
                let text = mark.as_char().to_string();
                let dims = measure_text(&text, None, 96, 1.0);
                draw_text(
                    &text,
                    x + (w - dims.width) / 2.0,
                    y + (h + dims.height) / 2.0,
                    96.0,
                    color,
                );
            }
        }
    }

    fn draw_status(&self, state: &ClientGameState) {
        let line = match state.phase() {
            Phase::WaitingForOpponent => "Waiting for opponent".to_string(),
            Phase::Playing => {
                let mark = state
                    .mark()
                    .map(|mark| format!("You play {}. ", mark))
                    .unwrap_or_default();
                if state.can_play() {
                    format!("{}Your turn", mark)
                } else {
                    format!("{}Opponent's turn", mark)
                }
            }
            Phase::GameOver { announcement } => announcement.clone(),
            Phase::Disconnected => "Disconnected from server".to_string(),
        };
        self.draw_centered(&line, 660.0, 28.0, WHITE);
    }

    fn draw_centered(&self, text: &str, y: f32, font_size: f32, color: Color) {
        let dims = measure_text(text, None, font_size as u16, 1.0);
        draw_text(text, (screen_width() - dims.width) / 2.0, y, font_size, color);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}
