use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor behind the search and upload prompts.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    cursor: usize, // in chars, not bytes
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor: usize,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => {
                self.clear();
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = std::cmp::min(self.cursor + 1, self.char_count()),
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = self.char_count(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.clear(),
            (KeyCode::Char(chr), m) if !m.contains(KeyModifiers::CONTROL) => self.insert(chr),
            (kc, km) => trace!("Ignored input key {kc:?} {km:?}"),
        }
        self.get()
    }

    /// Replaces the input and puts the cursor at its end.
    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.cursor = self.char_count();
        self.finished = false;
        self.canceled = false;
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            cursor: self.cursor,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor = 0;
    }

    fn insert(&mut self, chr: char) {
        let pos = self.byte_pos(self.cursor);
        self.current_input.insert(pos, chr);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let pos = self.byte_pos(self.cursor);
            self.current_input.remove(pos);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let pos = self.byte_pos(self.cursor);
            self.current_input.remove(pos);
        }
    }

    fn char_count(&self) -> usize {
        self.current_input.chars().count()
    }

    fn byte_pos(&self, char_idx: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_idx)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
