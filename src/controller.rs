use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, XVConfig, XVError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &XVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Waits up to the poll time for a terminal event and maps it to a message.
    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, XVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    if model.raw_keyevents() {
                        Some(Message::RawKey(key))
                    } else {
                        Self::handle_key(key)
                    }
                }
                Event::Resize(width, height) => {
                    Some(Message::Resize(width as usize, height as usize))
                }
                _ => None,
            });
        }
        Ok(None)
    }

    fn handle_key(key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::PageDown, _) | (KeyCode::Char('n'), _) => Some(Message::NextPage),
            (KeyCode::PageUp, _) | (KeyCode::Char('p'), _) => Some(Message::PreviousPage),
            (KeyCode::Char('s'), _) => Some(Message::Sort),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('u'), _) => Some(Message::Upload),
            (KeyCode::Char('c'), _) => Some(Message::Clear),
            (KeyCode::Char('r'), _) => Some(Message::Refresh),
            (KeyCode::Char('t'), _) => Some(Message::ToggleStatistics),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn map(code: KeyCode, modifiers: KeyModifiers) -> Option<Message> {
        Controller::handle_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn maps_keys_to_messages() {
        assert_eq!(map(KeyCode::Char('q'), KeyModifiers::NONE), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('c'), KeyModifiers::NONE), Some(Message::Clear));
        assert_eq!(map(KeyCode::PageDown, KeyModifiers::NONE), Some(Message::NextPage));
        assert_eq!(map(KeyCode::Char('p'), KeyModifiers::NONE), Some(Message::PreviousPage));
        assert_eq!(map(KeyCode::Char('/'), KeyModifiers::NONE), Some(Message::Search));
        assert_eq!(map(KeyCode::Esc, KeyModifiers::NONE), Some(Message::Exit));
        assert_eq!(map(KeyCode::F(5), KeyModifiers::NONE), None);
    }
}
