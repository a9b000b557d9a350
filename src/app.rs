use ratatui::widgets::ListState;
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::Config;
use crate::gemini::{GeminiClient, StreamEvent};
use crate::listing::{ListingDb, Property, SearchMode};
use crate::session::AssistantSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Catalog and filter state
    pub listings: ListingDb,
    pub search_mode: SearchMode,
    pub search_input: String,
    pub filtered: Vec<Property>,
    pub list_state: ListState,
    pub show_services: bool,

    // Assistant state
    pub session: AssistantSession,
    pub assistant: GeminiClient,
    pub chat_input: String,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub stream_rx: Option<mpsc::Receiver<StreamEvent>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config) -> Self {
        let listings = ListingDb::sample();
        let filtered: Vec<Property> = listings.properties().to_vec();
        let assistant = GeminiClient::new(config.api_key(), config.stream_upstream());

        let mut list_state = ListState::default();
        if !filtered.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            listings,
            search_mode: SearchMode::default(),
            search_input: String::new(),
            filtered,
            list_state,
            show_services: false,

            session: AssistantSession::new(),
            assistant,
            chat_input: String::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            stream_rx: None,

            animation_frame: 0,
        }
    }

    // Filter view

    pub fn apply_filters(&mut self) {
        self.filtered = self
            .listings
            .filter(self.search_mode, &self.search_input)
            .into_iter()
            .cloned()
            .collect();

        // Keep the selection on a valid row
        match self.list_state.selected() {
            Some(i) if i < self.filtered.len() => {}
            _ if self.filtered.is_empty() => self.list_state.select(None),
            _ => self.list_state.select(Some(0)),
        }
    }

    /// Back to defaults: empty query, every kind. Always shows the full
    /// catalog again.
    pub fn reset_filters(&mut self) {
        self.search_input.clear();
        self.search_mode = SearchMode::default();
        self.apply_filters();
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) {
        self.search_mode = mode;
        self.apply_filters();
    }

    pub fn cycle_search_mode(&mut self) {
        self.set_search_mode(self.search_mode.next());
    }

    pub fn selected_property(&self) -> Option<&Property> {
        self.list_state.selected().and_then(|i| self.filtered.get(i))
    }

    pub fn list_nav_down(&mut self) {
        let len = self.filtered.len();
        if len > 0 {
            let i = self.list_state.selected().unwrap_or(0);
            self.list_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn list_nav_up(&mut self) {
        let i = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(i.saturating_sub(1)));
    }

    // Assistant widget

    pub fn open_chat(&mut self) {
        self.session.open();
        self.scroll_chat_to_bottom();
    }

    pub fn close_chat(&mut self) {
        self.session.close();
    }

    /// Submit the chat input. Appends the user turn and placeholder, then
    /// hands the request to the client; a missing credential fails the
    /// placeholder immediately.
    pub fn submit_chat(&mut self) {
        let Some(submission) = self.session.submit(&self.chat_input) else {
            return;
        };
        self.chat_input.clear();

        match self
            .assistant
            .generate(&submission.prompt, submission.mode, &submission.history)
        {
            Ok(rx) => self.stream_rx = Some(rx),
            Err(e) => {
                warn!(error = %e, "assistant unavailable");
                self.session.fail();
            }
        }
        self.scroll_chat_to_bottom();
    }

    pub fn on_stream_event(&mut self, event: Option<StreamEvent>) {
        match event {
            Some(StreamEvent::Fragment(fragment)) => {
                self.session.push_fragment(&fragment);
            }
            Some(StreamEvent::Failed) => {
                self.session.fail();
                self.stream_rx = None;
            }
            None => {
                self.session.finish();
                self.stream_rx = None;
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Keep the newest turn visible as fragments stream in.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for turn in self.session.turns() {
            total_lines += 1; // Role line ("Tú:" or "Vistura:")
            if turn.is_pending() {
                total_lines += 1; // indicator line
            } else {
                for line in turn.text().lines() {
                    // Character count, not byte length, for UTF-8 text
                    let char_count = line.chars().count();
                    if char_count == 0 {
                        total_lines += 1;
                    } else {
                        total_lines += ((char_count / wrap_width) + 1) as u16;
                    }
                }
            }
            total_lines += 1; // Blank line after turn
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionState, CONNECTION_APOLOGY};

    fn test_app() -> App {
        let config = Config {
            gemini_api_key: None,
            stream_upstream: None,
        };
        let mut app = App::new(&config);
        // Pin a keyless client so a GEMINI_API_KEY in the host environment
        // cannot leak into these tests
        app.assistant = GeminiClient::new(None, true);
        app
    }

    #[test]
    fn test_starts_with_full_catalog() {
        let app = test_app();
        assert_eq!(app.filtered.len(), app.listings.len());
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn test_filters_and_reset() {
        let mut app = test_app();
        app.search_input = "roma".to_string();
        app.set_search_mode(SearchMode::Rent);
        assert_eq!(app.filtered.len(), 1);
        assert_eq!(app.filtered[0].location, "Roma Norte, CDMX");

        app.reset_filters();
        assert_eq!(app.filtered.len(), app.listings.len());
        assert_eq!(app.search_mode, SearchMode::All);
        assert!(app.search_input.is_empty());
    }

    #[test]
    fn test_empty_result_clears_selection() {
        let mut app = test_app();
        app.search_input = "tokio".to_string();
        app.apply_filters();
        assert!(app.filtered.is_empty());
        assert!(app.list_state.selected().is_none());
        assert!(app.selected_property().is_none());
    }

    #[tokio::test]
    async fn test_submit_without_key_fails_placeholder() {
        let mut app = test_app();
        app.open_chat();
        app.chat_input = "hola".to_string();
        app.submit_chat();

        assert_eq!(app.session.state(), SessionState::OpenIdle);
        assert!(app.stream_rx.is_none());
        assert_eq!(
            app.session.turns().last().unwrap().text(),
            CONNECTION_APOLOGY
        );
    }

    #[test]
    fn test_blank_chat_submit_keeps_input_state() {
        let mut app = test_app();
        app.open_chat();
        app.chat_input = "   ".to_string();
        app.submit_chat();

        assert_eq!(app.session.turns().len(), 1); // greeting only
        assert_eq!(app.chat_input, "   "); // nothing consumed
    }
}
