//! Key mapping from terminal events to camera actions.

use crate::types::CameraAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map keyboard input to camera actions.
pub fn handle_key_event(key: KeyEvent) -> Option<CameraAction> {
    match key.code {
        // Look
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => Some(CameraAction::YawLeft),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') => Some(CameraAction::YawRight),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => Some(CameraAction::PitchUp),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => Some(CameraAction::PitchDown),

        // Move
        KeyCode::Char('w') | KeyCode::Char('W') => Some(CameraAction::MoveForward),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(CameraAction::MoveBack),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(CameraAction::StrafeLeft),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(CameraAction::StrafeRight),

        // 2D view
        KeyCode::Char('+') | KeyCode::Char('=') => Some(CameraAction::ZoomIn),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(CameraAction::ZoomOut),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(CameraAction::CycleScaleMode),

        KeyCode::Char('r') | KeyCode::Char('R') => Some(CameraAction::Reset),

        _ => None,
    }
}

/// Check if key should quit the viewer.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_look_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Left)),
            Some(CameraAction::YawLeft)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('L'))),
            Some(CameraAction::YawRight)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Up)),
            Some(CameraAction::PitchUp)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('j'))),
            Some(CameraAction::PitchDown)
        );
    }

    #[test]
    fn test_move_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('w'))),
            Some(CameraAction::MoveForward)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('S'))),
            Some(CameraAction::MoveBack)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('a'))),
            Some(CameraAction::StrafeLeft)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('D'))),
            Some(CameraAction::StrafeRight)
        );
    }

    #[test]
    fn test_view_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('+'))),
            Some(CameraAction::ZoomIn)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('-'))),
            Some(CameraAction::ZoomOut)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('m'))),
            Some(CameraAction::CycleScaleMode)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('r'))),
            Some(CameraAction::Reset)
        );
        assert_eq!(handle_key_event(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::from(KeyCode::Esc)));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('x'))));
    }
}
