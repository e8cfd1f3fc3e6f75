//! Key handling utilities.
//!
//! Provides key-to-byte conversion for remote shells and shared scroll handling logic.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Converts a key press into the bytes a terminal would send for it.
///
/// Handles ANSI escape sequences for special keys and control characters.
pub fn key_to_bytes(key: &KeyEvent) -> Option<Vec<u8>> {
    use KeyCode::*;

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let mut bytes: Vec<u8> = match key.code {
        Char(c) if ctrl => {
            let upper = c.to_ascii_uppercase();
            match upper {
                '@'..='_' => vec![upper as u8 & 0x1f],
                ' ' => vec![0],
                '?' => vec![0x7f],
                _ => return None,
            }
        }
        Char(c) => c.to_string().into_bytes(),
        // Arrow keys
        Up => b"\x1B[A".to_vec(),
        Down => b"\x1B[B".to_vec(),
        Right => b"\x1B[C".to_vec(),
        Left => b"\x1B[D".to_vec(),
        // Page navigation
        Home => b"\x1B[H".to_vec(),
        End => b"\x1B[F".to_vec(),
        PageUp => b"\x1B[5~".to_vec(),
        PageDown => b"\x1B[6~".to_vec(),
        Insert => b"\x1B[2~".to_vec(),
        Delete => b"\x1B[3~".to_vec(),
        // Tab variants
        BackTab => b"\x1B[Z".to_vec(),
        Tab => b"\t".to_vec(),
        // Editing
        Backspace => b"\x7F".to_vec(),
        Enter => b"\r".to_vec(),
        Esc => b"\x1B".to_vec(),
        _ => return None,
    };

    if alt {
        bytes.insert(0, 0x1b);
    }
    Some(bytes)
}

/// Trait for types that support scrolling.
///
/// Provides a unified interface for scroll operations across different views.
pub trait Scrollable {
    fn scroll_down(&mut self);
    fn scroll_up(&mut self);
    fn scroll_page_down(&mut self);
    fn scroll_page_up(&mut self);
}

/// Handles scroll navigation keys for any Scrollable type.
///
/// Returns `true` if the key was handled, `false` otherwise.
pub fn handle_scroll_key<S: Scrollable>(state: &mut S, key: KeyCode) -> bool {
    match key {
        KeyCode::Down | KeyCode::Char('j') => {
            state.scroll_down();
            true
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.scroll_up();
            true
        }
        KeyCode::PageDown => {
            state.scroll_page_down();
            true
        }
        KeyCode::PageUp => {
            state.scroll_page_up();
            true
        }
        _ => false,
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Checks if the key is a quit command.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    (key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::NONE) || is_ctrl(key, 'c')
}

/// Leaves a live exec session without ending it remotely.
pub fn is_detach_key(key: &KeyEvent) -> bool {
    is_ctrl(key, ']') || is_ctrl(key, '5')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_key_to_bytes_arrows() {
        assert_eq!(key_to_bytes(&key(KeyCode::Up, KeyModifiers::NONE)), Some(b"\x1B[A".to_vec()));
        assert_eq!(key_to_bytes(&key(KeyCode::Down, KeyModifiers::NONE)), Some(b"\x1B[B".to_vec()));
    }

    #[test]
    fn test_key_to_bytes_chars() {
        assert_eq!(key_to_bytes(&key(KeyCode::Char('a'), KeyModifiers::NONE)), Some(b"a".to_vec()));
        assert_eq!(key_to_bytes(&key(KeyCode::Char('é'), KeyModifiers::NONE)), Some("é".as_bytes().to_vec()));
        assert_eq!(key_to_bytes(&key(KeyCode::Enter, KeyModifiers::NONE)), Some(b"\r".to_vec()));
    }

    #[test]
    fn test_key_to_bytes_control() {
        assert_eq!(key_to_bytes(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(vec![0x03]));
        assert_eq!(key_to_bytes(&key(KeyCode::Char('d'), KeyModifiers::CONTROL)), Some(vec![0x04]));
        assert_eq!(key_to_bytes(&key(KeyCode::Char('b'), KeyModifiers::ALT)), Some(b"\x1Bb".to_vec()));
        assert_eq!(key_to_bytes(&key(KeyCode::F(5), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_quit_and_detach_keys() {
        assert!(is_quit_key(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&key(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&key(KeyCode::Char('a'), KeyModifiers::NONE)));
        assert!(is_detach_key(&key(KeyCode::Char(']'), KeyModifiers::CONTROL)));
    }

    struct MockScrollable {
        down_count: usize,
        up_count: usize,
    }

    impl Scrollable for MockScrollable {
        fn scroll_down(&mut self) {
            self.down_count += 1;
        }
        fn scroll_up(&mut self) {
            self.up_count += 1;
        }
        fn scroll_page_down(&mut self) {
            self.down_count += 10;
        }
        fn scroll_page_up(&mut self) {
            self.up_count += 10;
        }
    }

    #[test]
    fn test_handle_scroll_key() {
        let mut state = MockScrollable {
            down_count: 0,
            up_count: 0,
        };

        assert!(handle_scroll_key(&mut state, KeyCode::Down));
        assert_eq!(state.down_count, 1);

        assert!(handle_scroll_key(&mut state, KeyCode::Char('j')));
        assert_eq!(state.down_count, 2);

        assert!(handle_scroll_key(&mut state, KeyCode::Up));
        assert_eq!(state.up_count, 1);

        assert!(!handle_scroll_key(&mut state, KeyCode::Char('x')));
    }
}
