use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::listing::SearchMode;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The chat panel is modal while open: every key goes to it
    if app.session.is_open() {
        handle_chat_key(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_browse_key(app, key),
        InputMode::Editing => handle_search_editing(app, key),
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.list_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.list_nav_up(),
        KeyCode::Char('g') => {
            if !app.filtered.is_empty() {
                app.list_state.select(Some(0));
            }
        }
        KeyCode::Char('G') => {
            if !app.filtered.is_empty() {
                app.list_state.select(Some(app.filtered.len() - 1));
            }
        }

        // Search
        KeyCode::Char('/') | KeyCode::Char('i') => {
            app.input_mode = InputMode::Editing;
        }

        // Mode tabs (Todo / Renta / Venta)
        KeyCode::Tab | KeyCode::Char('t') => app.cycle_search_mode(),
        KeyCode::Char('1') => app.set_search_mode(SearchMode::All),
        KeyCode::Char('2') => app.set_search_mode(SearchMode::Rent),
        KeyCode::Char('3') => app.set_search_mode(SearchMode::Sale),

        // Clear both filters back to defaults
        KeyCode::Char('r') => app.reset_filters(),

        // Services pitch panel
        KeyCode::Char('s') => app.show_services = !app.show_services,

        // Assistant widget
        KeyCode::Char('a') => app.open_chat(),

        _ => {}
    }
}

fn handle_search_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.apply_filters();
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            app.apply_filters();
        }
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_chat(),
        KeyCode::Enter => app.submit_chat(),

        // Cycle the response mode; only affects the next submission
        KeyCode::Tab => {
            let next = app.session.mode().next();
            app.session.set_mode(next);
        }

        KeyCode::Up => app.chat_scroll_up(),
        KeyCode::Down => app.chat_scroll_down(),

        KeyCode::Backspace => {
            app.chat_input.pop();
        }
        KeyCode::Char(c) => {
            app.chat_input.push(c);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::{ResponseMode, SessionState};

    fn test_app() -> App {
        App::new(&Config {
            gemini_api_key: None,
            stream_upstream: None,
        })
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_typing_in_search_filters_live() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "polanco".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.filtered.len(), 1);

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.search_input, "polanc");
    }

    #[test]
    fn test_mode_tabs_cycle_and_reset() {
        let mut app = test_app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.search_mode, SearchMode::Rent);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.search_mode, SearchMode::Sale);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.search_mode, SearchMode::All);
        assert_eq!(app.filtered.len(), app.listings.len());
    }

    #[test]
    fn test_chat_is_modal_while_open() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.session.state(), SessionState::OpenIdle);

        // 'q' types into the chat input instead of quitting
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.chat_input, "q");

        // Tab cycles the response mode
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.session.mode(), ResponseMode::Thinking);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.session.state(), SessionState::Closed);
    }
}
