//! Frame-sampled input: name editing on the login screen and board hit
//! testing for clicks.

use macroquad::prelude::*;

/// Longest display name the entry field accepts.
pub const MAX_NAME_LEN: usize = 16;

/// Applies this frame's keystrokes to the name being typed. Returns true
/// when the player submitted a non-empty name with Enter.
pub fn edit_name(name: &mut String) -> bool {
    while let Some(c) = get_char_pressed() {
        if !c.is_whitespace() && !c.is_control() && name.chars().count() < MAX_NAME_LEN {
            name.push(c);
        }
    }
    if is_key_pressed(KeyCode::Backspace) {
        name.pop();
    }
    is_key_pressed(KeyCode::Enter) && !name.is_empty()
}

/// Maps this frame's click, if any, to a board cell.
pub fn clicked_cell(layout: &BoardLayout) -> Option<usize> {
    if !is_mouse_button_pressed(MouseButton::Left) {
        return None;
    }
    let (x, y) = mouse_position();
    layout.cell_at(x, y)
}

/// Pixel geometry of the 3x3 grid.
#[derive(Debug, Clone, Copy)]
pub struct BoardLayout {
    pub origin_x: f32,
    pub origin_y: f32,
    pub cell_size: f32,
    pub gap: f32,
}

impl BoardLayout {
    /// Top-left corner and extent of one cell.
    pub fn cell_rect(&self, index: usize) -> (f32, f32, f32, f32) {
        let row = (index / 3) as f32;
        let col = (index % 3) as f32;
        let x = self.origin_x + col * (self.cell_size + self.gap);
        let y = self.origin_y + row * (self.cell_size + self.gap);
        (x, y, self.cell_size, self.cell_size)
    }

    /// The cell containing the point, if it landed on one.
    pub fn cell_at(&self, px: f32, py: f32) -> Option<usize> {
        (0..9).find(|&index| {
            let (x, y, w, h) = self.cell_rect(index);
            px >= x && px < x + w && py >= y && py < y + h
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BoardLayout {
        BoardLayout {
            origin_x: 50.0,
            origin_y: 120.0,
            cell_size: 160.0,
            gap: 10.0,
        }
    }

    #[test]
    fn test_cell_rect_positions() {
        let layout = layout();
        assert_eq!(layout.cell_rect(0), (50.0, 120.0, 160.0, 160.0));
        assert_eq!(layout.cell_rect(2), (390.0, 120.0, 160.0, 160.0));
        assert_eq!(layout.cell_rect(4), (220.0, 290.0, 160.0, 160.0));
        assert_eq!(layout.cell_rect(8), (390.0, 460.0, 160.0, 160.0));
    }

    #[test]
    fn test_cell_at_hits_and_misses() {
        let layout = layout();
        assert_eq!(layout.cell_at(51.0, 121.0), Some(0));
        assert_eq!(layout.cell_at(300.0, 300.0), Some(4));
        assert_eq!(layout.cell_at(540.0, 610.0), Some(8));
        assert_eq!(layout.cell_at(0.0, 0.0), None);
        assert_eq!(layout.cell_at(215.0, 300.0), None, "gap between cells");
    }
}
