//! Key handling for the browse screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Whether keys go to the gallery or to a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Keys drive the gallery.
    #[default]
    Normal,
    /// Keys edit the filter text.
    Filter,
    /// Keys edit the path of a file to upload.
    UploadPath,
}

/// What a key press asks the browse screen to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseAction {
    /// Leave the application.
    Quit,
    /// Move the selection down.
    Down,
    /// Move the selection up.
    Up,
    /// Jump to the first record.
    Top,
    /// Jump to the last record.
    Bottom,
    /// Open the filter prompt.
    StartFilter,
    /// Open the upload prompt.
    StartUpload,
    /// Cycle the sort key.
    CycleSort,
    /// Flip the sort order.
    ToggleOrder,
    /// Delete the selected record.
    Delete,
    /// Reload from the first page.
    Reload,
    /// Type into the open prompt.
    PromptInput(char),
    /// Remove the character before the cursor.
    PromptBackspace,
    /// Move the prompt cursor left.
    PromptLeft,
    /// Move the prompt cursor right.
    PromptRight,
    /// Submit the prompt.
    PromptAccept,
    /// Close the prompt, discarding its effect.
    PromptCancel,
}

/// Checks if key is a quit event in any mode.
#[must_use]
pub fn is_force_quit(key: &KeyEvent) -> bool {
    matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    )
}

/// Maps `key` to an action for the current `mode`.
#[must_use]
pub fn map_key(key: &KeyEvent, mode: InputMode) -> Option<BrowseAction> {
    if is_force_quit(key) {
        return Some(BrowseAction::Quit);
    }

    match mode {
        InputMode::Filter | InputMode::UploadPath => match key.code {
            KeyCode::Enter => Some(BrowseAction::PromptAccept),
            KeyCode::Esc => Some(BrowseAction::PromptCancel),
            KeyCode::Backspace => Some(BrowseAction::PromptBackspace),
            KeyCode::Left => Some(BrowseAction::PromptLeft),
            KeyCode::Right => Some(BrowseAction::PromptRight),
            KeyCode::Char(c) => Some(BrowseAction::PromptInput(c)),
            _ => None,
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(BrowseAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(BrowseAction::Down),
            KeyCode::Char('k') | KeyCode::Up => Some(BrowseAction::Up),
            KeyCode::Char('g') | KeyCode::Home => Some(BrowseAction::Top),
            KeyCode::Char('G') | KeyCode::End => Some(BrowseAction::Bottom),
            KeyCode::Char('/') => Some(BrowseAction::StartFilter),
            KeyCode::Char('u') => Some(BrowseAction::StartUpload),
            KeyCode::Char('s') => Some(BrowseAction::CycleSort),
            KeyCode::Char('o') => Some(BrowseAction::ToggleOrder),
            KeyCode::Char('d') | KeyCode::Delete => Some(BrowseAction::Delete),
            KeyCode::Char('r') => Some(BrowseAction::Reload),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test_case(KeyCode::Char('q'), Some(BrowseAction::Quit) ; "quit")]
    #[test_case(KeyCode::Char('j'), Some(BrowseAction::Down) ; "down")]
    #[test_case(KeyCode::Char('/'), Some(BrowseAction::StartFilter) ; "filter")]
    #[test_case(KeyCode::Char('s'), Some(BrowseAction::CycleSort) ; "sort")]
    #[test_case(KeyCode::Char('u'), Some(BrowseAction::StartUpload) ; "upload")]
    #[test_case(KeyCode::Char('x'), None ; "unbound")]
    fn test_normal_mode(code: KeyCode, expected: Option<BrowseAction>) {
        assert_eq!(map_key(&key(code), InputMode::Normal), expected);
    }

    #[test]
    fn test_prompt_modes_capture_letters() {
        assert_eq!(
            map_key(&key(KeyCode::Char('q')), InputMode::Filter),
            Some(BrowseAction::PromptInput('q'))
        );
        assert_eq!(
            map_key(&key(KeyCode::Esc), InputMode::UploadPath),
            Some(BrowseAction::PromptCancel)
        );
    }

    #[test]
    fn test_ctrl_c_quits_in_any_mode() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&ctrl_c, InputMode::Filter), Some(BrowseAction::Quit));
    }
}
