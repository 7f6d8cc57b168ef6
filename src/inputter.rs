use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Line-editor state machine for the filter box and command prompts. Raw
/// key events go in, the edited text plus finished/cancelled flags come
/// out; the debounce policy stays with the owner.
#[derive(Debug, Default)]
pub struct Inputter {
    text: String,
    cursor: usize,
    finished: bool,
    cancelled: bool,
}

/// Snapshot of the editor after a keystroke.
#[derive(Debug, Default, Clone)]
pub struct InputResult {
    pub text: String,
    pub cursor: usize,
    pub finished: bool,
    pub cancelled: bool,
    /// The text changed with this keystroke, so debounced consumers should
    /// reschedule.
    pub changed: bool,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        let before = self.text.clone();
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.finished = true,
            (KeyCode::Esc, KeyModifiers::NONE) => {
                self.text.clear();
                self.cursor = 0;
                self.cancelled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, KeyModifiers::NONE) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_pos();
                    self.text.remove(at);
                }
            }
            (KeyCode::Delete, KeyModifiers::NONE) => {
                if self.cursor < self.char_count() {
                    let at = self.byte_pos();
                    self.text.remove(at);
                }
            }
            (KeyCode::Left, KeyModifiers::NONE) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.cursor < self.char_count() {
                    self.cursor += 1;
                }
            }
            (KeyCode::Home, KeyModifiers::NONE) => self.cursor = 0,
            (KeyCode::End, KeyModifiers::NONE) => self.cursor = self.char_count(),
            (code, _) => {
                if let Some(c) = code.as_char() {
                    let at = self.byte_pos();
                    self.text.insert(at, c);
                    self.cursor += 1;
                }
            }
        }
        let mut result = self.snapshot();
        result.changed = self.text != before;
        result
    }

    pub fn snapshot(&self) -> InputResult {
        InputResult {
            text: self.text.clone(),
            cursor: self.cursor,
            finished: self.finished,
            cancelled: self.cancelled,
            changed: false,
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.finished = false;
        self.cancelled = false;
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_pos(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_editing() {
        let mut input = Inputter::default();
        for c in "jose".chars() {
            input.read(key(KeyCode::Char(c)));
        }
        assert_eq!(input.snapshot().text, "jose");

        input.read(key(KeyCode::Backspace));
        assert_eq!(input.snapshot().text, "jos");

        input.read(key(KeyCode::Home));
        input.read(key(KeyCode::Char('x')));
        assert_eq!(input.snapshot().text, "xjos");
    }

    #[test]
    fn multibyte_cursor_positions() {
        let mut input = Inputter::default();
        for c in "Jé".chars() {
            input.read(key(KeyCode::Char(c)));
        }
        input.read(key(KeyCode::Left));
        input.read(key(KeyCode::Delete));
        assert_eq!(input.snapshot().text, "J");
    }

    #[test]
    fn escape_cancels_and_finishes() {
        let mut input = Inputter::default();
        input.read(key(KeyCode::Char('a')));
        let result = input.read(key(KeyCode::Esc));
        assert!(result.cancelled && result.finished);
        assert!(result.text.is_empty());
    }

    #[test]
    fn changed_flag_tracks_text_edits() {
        let mut input = Inputter::default();
        let typed = input.read(key(KeyCode::Char('a')));
        assert!(typed.changed);
        let moved = input.read(key(KeyCode::Left));
        assert!(!moved.changed);
    }
}
