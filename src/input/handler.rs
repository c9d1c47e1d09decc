use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::Side;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Bet(Side),
    TogglePause,
    Restart,
    Quit,
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Betting
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('1') => {
                KeyAction::Bet(Side::A)
            }
            KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Char('2') => {
                KeyAction::Bet(Side::B)
            }

            // Controls
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                KeyAction::TogglePause
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
