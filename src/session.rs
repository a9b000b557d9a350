//! Assistant conversation state, independent of any UI framework or
//! transport. The async glue feeds completed work back in through
//! `push_fragment`, `finish` and `fail`, so every transition here is
//! synchronous and unit-testable.

/// Generation preset selected per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    Fast,
    #[default]
    Standard,
    Thinking,
}

impl ResponseMode {
    pub fn all() -> [ResponseMode; 3] {
        [
            ResponseMode::Fast,
            ResponseMode::Standard,
            ResponseMode::Thinking,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResponseMode::Fast => "Rápido",
            ResponseMode::Standard => "Estándar",
            ResponseMode::Thinking => "Pensando",
        }
    }

    pub fn next(&self) -> ResponseMode {
        match self {
            ResponseMode::Fast => ResponseMode::Standard,
            ResponseMode::Standard => ResponseMode::Thinking,
            ResponseMode::Thinking => ResponseMode::Fast,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// Content of a turn. A freshly-appended model turn is `Pending` until the
/// first fragment arrives; the mode it was submitted under drives the
/// "Razonando..." indicator for `Thinking`.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnContent {
    Pending { mode: ResponseMode },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub id: u64,
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    pub fn text(&self) -> &str {
        match &self.content {
            TurnContent::Pending { .. } => "",
            TurnContent::Text(text) => text,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.content, TurnContent::Pending { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    OpenIdle,
    OpenAwaitingResponse,
}

pub const GREETING: &str =
    "Bienvenido a Vistura360. ¿Buscas Rentar, Comprar o Vender una propiedad hoy?";

pub const CONNECTION_APOLOGY: &str =
    "Lo siento, tengo problemas para conectarme a la red en este momento.";

/// Everything the transport needs for one generation request. The history
/// is the turn list as it stood before this submission, oldest first.
#[derive(Debug, Clone)]
pub struct Submission {
    pub prompt: String,
    pub mode: ResponseMode,
    pub history: Vec<(Role, String)>,
}

pub struct AssistantSession {
    state: SessionState,
    turns: Vec<Turn>,
    mode: ResponseMode,
    next_id: u64,
    pending_id: Option<u64>,
}

impl AssistantSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Closed,
            turns: Vec::new(),
            mode: ResponseMode::default(),
            next_id: 0,
            pending_id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != SessionState::Closed
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == SessionState::OpenAwaitingResponse
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Settable at any time; only affects the next submission.
    pub fn set_mode(&mut self, mode: ResponseMode) {
        self.mode = mode;
    }

    /// Open the widget. The first open with an empty turn list synthesizes
    /// the greeting; reopening never duplicates it.
    pub fn open(&mut self) {
        if self.state != SessionState::Closed {
            return;
        }
        self.state = SessionState::OpenIdle;
        if self.turns.is_empty() {
            let text = TurnContent::Text(GREETING.to_string());
            self.push_turn(Role::Model, text);
        }
    }

    /// Close the widget. Turns are kept for reopening; the whole list is
    /// dropped with the session itself.
    pub fn close(&mut self) {
        if self.state == SessionState::OpenIdle {
            self.state = SessionState::Closed;
        }
        // Closing while awaiting is ignored so the in-flight stream keeps a
        // consistent target.
    }

    /// Submit user input. Returns what the transport should send, or `None`
    /// when the input is blank or a response is already in flight.
    pub fn submit(&mut self, input: &str) -> Option<Submission> {
        if self.state != SessionState::OpenIdle {
            return None;
        }
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }

        // History is the conversation as it stood before this prompt
        let history: Vec<(Role, String)> = self
            .turns
            .iter()
            .map(|t| (t.role, t.text().to_string()))
            .collect();

        self.push_turn(Role::User, TurnContent::Text(prompt.to_string()));
        let placeholder = self.push_turn(Role::Model, TurnContent::Pending { mode: self.mode });
        self.pending_id = Some(placeholder);
        self.state = SessionState::OpenAwaitingResponse;

        Some(Submission {
            prompt: prompt.to_string(),
            mode: self.mode,
            history,
        })
    }

    /// Append one incoming fragment to the placeholder turn. The first
    /// fragment flips it from `Pending` to accumulated text.
    pub fn push_fragment(&mut self, fragment: &str) {
        if self.state != SessionState::OpenAwaitingResponse {
            return;
        }
        if let Some(turn) = self.pending_turn_mut() {
            match &mut turn.content {
                TurnContent::Pending { .. } => {
                    turn.content = TurnContent::Text(fragment.to_string());
                }
                TurnContent::Text(text) => text.push_str(fragment),
            }
        }
    }

    /// Stream completed normally.
    pub fn finish(&mut self) {
        if self.state != SessionState::OpenAwaitingResponse {
            return;
        }
        // A stream that closed without a single fragment leaves the
        // placeholder empty rather than forever pending
        if let Some(turn) = self.pending_turn_mut() {
            if turn.is_pending() {
                turn.content = TurnContent::Text(String::new());
            }
        }
        self.pending_id = None;
        self.state = SessionState::OpenIdle;
    }

    /// Generation failed after the fallback chain was exhausted (or never
    /// started). The placeholder is abandoned and a single apology turn is
    /// appended so the conversation always has renderable content.
    pub fn fail(&mut self) {
        if self.state != SessionState::OpenAwaitingResponse {
            return;
        }
        if let Some(id) = self.pending_id.take() {
            self.turns.retain(|t| t.id != id);
        }
        self.push_turn(
            Role::Model,
            TurnContent::Text(CONNECTION_APOLOGY.to_string()),
        );
        self.state = SessionState::OpenIdle;
    }

    fn push_turn(&mut self, role: Role, content: TurnContent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.turns.push(Turn { id, role, content });
        id
    }

    fn pending_turn_mut(&mut self) -> Option<&mut Turn> {
        let id = self.pending_id?;
        self.turns.iter_mut().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_session() -> AssistantSession {
        let mut session = AssistantSession::new();
        session.open();
        session
    }

    #[test]
    fn test_open_synthesizes_greeting_once() {
        let mut session = AssistantSession::new();
        assert_eq!(session.state(), SessionState::Closed);

        session.open();
        assert_eq!(session.state(), SessionState::OpenIdle);
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::Model);
        assert_eq!(session.turns()[0].text(), GREETING);

        session.close();
        session.open();
        assert_eq!(session.turns().len(), 1);
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let mut session = open_session();
        assert!(session.submit("").is_none());
        assert!(session.submit("   \t ").is_none());
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.state(), SessionState::OpenIdle);
    }

    #[test]
    fn test_submit_appends_user_turn_and_placeholder() {
        let mut session = open_session();
        let submission = session.submit("  ¿Qué hay en Polanco?  ").unwrap();

        assert_eq!(submission.prompt, "¿Qué hay en Polanco?");
        assert_eq!(submission.history.len(), 1);
        assert_eq!(submission.history[0].0, Role::Model);

        assert_eq!(session.state(), SessionState::OpenAwaitingResponse);
        assert_eq!(session.turns().len(), 3);
        assert_eq!(session.turns()[1].role, Role::User);
        assert!(session.turns()[2].is_pending());
    }

    #[test]
    fn test_submit_while_awaiting_is_a_noop() {
        let mut session = open_session();
        session.submit("primera").unwrap();
        let turns_before = session.turns().len();

        assert!(session.submit("segunda").is_none());
        assert_eq!(session.turns().len(), turns_before);
        assert_eq!(session.state(), SessionState::OpenAwaitingResponse);
    }

    #[test]
    fn test_fragments_accumulate_into_placeholder() {
        let mut session = open_session();
        session.set_mode(ResponseMode::Thinking);
        session.submit("hola").unwrap();

        assert_eq!(
            session.turns().last().unwrap().content,
            TurnContent::Pending {
                mode: ResponseMode::Thinking
            }
        );

        session.push_fragment("Claro, ");
        assert!(!session.turns().last().unwrap().is_pending());

        session.push_fragment("con gusto.");
        session.finish();

        assert_eq!(session.state(), SessionState::OpenIdle);
        assert_eq!(session.turns().last().unwrap().text(), "Claro, con gusto.");
    }

    #[test]
    fn test_failure_replaces_placeholder_with_one_apology() {
        let mut session = open_session();
        session.submit("hola").unwrap();
        let turns_before = session.turns().len();

        session.fail();

        assert_eq!(session.state(), SessionState::OpenIdle);
        // placeholder removed, apology appended: count unchanged
        assert_eq!(session.turns().len(), turns_before);
        let apologies = session
            .turns()
            .iter()
            .filter(|t| t.text() == CONNECTION_APOLOGY)
            .count();
        assert_eq!(apologies, 1);
        assert!(!session.turns().iter().any(|t| t.is_pending()));
    }

    #[test]
    fn test_history_replays_in_insertion_order() {
        let mut session = open_session();
        session.submit("uno").unwrap();
        session.push_fragment("respuesta uno");
        session.finish();

        let submission = session.submit("dos").unwrap();
        let roles: Vec<Role> = submission.history.iter().map(|(r, _)| *r).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert_eq!(submission.history[1].1, "uno");
        assert_eq!(submission.history[2].1, "respuesta uno");
    }

    #[test]
    fn test_mode_change_affects_next_submission_only() {
        let mut session = open_session();
        session.submit("uno").unwrap();

        // change mode mid-flight; in-flight placeholder keeps its mode
        session.set_mode(ResponseMode::Fast);
        assert_eq!(
            session.turns().last().unwrap().content,
            TurnContent::Pending {
                mode: ResponseMode::Standard
            }
        );

        session.push_fragment("ok");
        session.finish();

        let submission = session.submit("dos").unwrap();
        assert_eq!(submission.mode, ResponseMode::Fast);
    }

    #[test]
    fn test_empty_stream_leaves_empty_text() {
        let mut session = open_session();
        session.submit("hola").unwrap();
        session.finish();

        let last = session.turns().last().unwrap();
        assert!(!last.is_pending());
        assert_eq!(last.text(), "");
        assert_eq!(session.state(), SessionState::OpenIdle);
    }
}
