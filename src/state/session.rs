use std::collections::HashSet;

use crate::record::model::{ResponseRecord, Row};
use crate::record::parse;

/// First suggestion offered before the model has said anything.
pub const SEED_SUGGESTION: &str = "Show me all the tables in the database";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Explore,
    Saved,
}

/// Everything a click on the panel can mean. Buttons and chips register one
/// of these in the hit-test index; the controller executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Suggest(String),
    SwitchView(View),
    ToggleDetails(String),
    Save(String),
    Update(String),
    Delete(String),
}

/// The whole conversation state, owned by the controller and mutated only
/// through the methods below. Renderers read it, they never change it.
pub struct Session {
    pub view: View,
    pub transcript: Vec<ResponseRecord>,
    pub saved: Vec<ResponseRecord>,
    pub messages: Vec<String>,
    pub suggestions: Vec<String>,
    pub waiting: bool,
    pub open_details: HashSet<String>,
    pub api_key: String,
}

impl Session {
    pub fn new(api_key: String, saved: Vec<ResponseRecord>) -> Self {
        Self {
            view: View::Explore,
            transcript: Vec::new(),
            saved,
            messages: Vec::new(),
            suggestions: vec![SEED_SUGGESTION.to_string()],
            waiting: false,
            open_details: HashSet::new(),
            api_key,
        }
    }

    /// Records that a question went out. Questions accumulate for the whole
    /// session; the newest one renders as a pending card until an answer
    /// resolves it. The chip row empties until that answer brings new
    /// suggestions.
    pub fn begin_question(&mut self, question: &str) {
        self.messages.push(question.to_string());
        self.suggestions.clear();
        self.waiting = true;
        self.view = View::Explore;
    }

    /// The question the pending card shows, present only mid-request.
    pub fn pending_question(&self) -> Option<&str> {
        if self.waiting {
            self.messages.last().map(String::as_str)
        } else {
            None
        }
    }

    /// Lands an answer: the pending question resolves into a card and the
    /// suggestion row is replaced by whatever the answer carried. A payload
    /// that stayed raw text still gets a second-chance extraction.
    pub fn resolve(&mut self, record: ResponseRecord) {
        self.suggestions = if record.payload().is_some() {
            record.suggestions().to_vec()
        } else {
            parse::parse_suggestions(record.body_text())
        };
        self.transcript.push(record);
        self.waiting = false;
    }

    pub fn switch_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn visible(&self) -> &[ResponseRecord] {
        match self.view {
            View::Explore => &self.transcript,
            View::Saved => &self.saved,
        }
    }

    pub fn toggle_details(&mut self, id: &str) {
        if !self.open_details.remove(id) {
            self.open_details.insert(id.to_string());
        }
    }

    pub fn details_open(&self, id: &str) -> bool {
        self.open_details.contains(id)
    }

    /// Copies a card into the saved set. Saving the same id again replaces
    /// the stored copy instead of duplicating it.
    pub fn save(&mut self, id: &str) -> bool {
        let Some(record) = self
            .transcript
            .iter()
            .chain(self.saved.iter())
            .find(|record| record.id == id)
            .cloned()
        else {
            return false;
        };
        match self.saved.iter_mut().find(|slot| slot.id == record.id) {
            Some(slot) => *slot = record,
            None => self.saved.push(record),
        }
        true
    }

    pub fn delete_saved(&mut self, id: &str) -> bool {
        let before = self.saved.len();
        self.saved.retain(|record| record.id != id);
        self.open_details.remove(id);
        self.saved.len() != before
    }

    /// Swaps in fresh rows for a saved card after its queries were re-run.
    pub fn update_result(&mut self, id: &str, rows: Vec<Row>) -> bool {
        match self.saved.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.result = rows;
                true
            }
            None => false,
        }
    }

    pub fn queries_of(&self, id: &str) -> Option<Vec<String>> {
        self.saved
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.queries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::model::{ComponentKind, ContentPayload, PayloadData};

    fn record(id: &str) -> ResponseRecord {
        ResponseRecord {
            id: id.to_string(),
            user_input: format!("question {id}"),
            ..ResponseRecord::default()
        }
    }

    fn session_with(transcript: Vec<ResponseRecord>) -> Session {
        let mut session = Session::new(String::new(), Vec::new());
        session.transcript = transcript;
        session
    }

    #[test]
    fn starts_with_seed_suggestion() {
        let session = Session::new(String::new(), Vec::new());
        assert_eq!(session.suggestions, vec![SEED_SUGGESTION.to_string()]);
        assert_eq!(session.view, View::Explore);
    }

    #[test]
    fn resolve_lands_answer_and_refreshes_suggestions() {
        let mut session = session_with(Vec::new());
        session.begin_question("how many users?");
        assert_eq!(session.pending_question(), Some("how many users?"));
        let mut answer = record("a1");
        answer.data = PayloadData::Structured(ContentPayload {
            content: "42".to_string(),
            suggestions: vec!["break it down by month".to_string()],
        });
        session.resolve(answer);
        assert!(session.pending_question().is_none());
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.suggestions, vec!["break it down by month"]);
    }

    #[test]
    fn sent_messages_accumulate() {
        let mut session = session_with(Vec::new());
        session.begin_question("first");
        session.resolve(record("a1"));
        session.begin_question("second");
        assert_eq!(session.messages, vec!["first", "second"]);
        assert_eq!(session.pending_question(), Some("second"));
    }

    #[test]
    fn asking_clears_the_chip_row() {
        let mut session = session_with(Vec::new());
        assert!(!session.suggestions.is_empty());
        session.begin_question("anything");
        assert!(session.suggestions.is_empty());
    }

    #[test]
    fn wire_record_resolves_to_markdown_card_with_chips() {
        let raw = r#"{"component_name":"markdown_component","user_input":"greet the world","data":"{\"content\":\"Hello\n **world**\",\"suggestions\":[\"a\",\"b\"]}"}"#;
        let record = crate::record::ingest(serde_json::from_str(raw).unwrap());
        assert_eq!(record.kind(), ComponentKind::Markdown);
        assert_eq!(record.body_text(), "Hello\n **world**");

        let mut session = session_with(Vec::new());
        session.begin_question("greet the world");
        session.resolve(record);
        assert!(session.pending_question().is_none());
        assert_eq!(session.suggestions, vec!["a", "b"]);
    }

    #[test]
    fn resolve_extracts_suggestions_from_raw_text() {
        let mut session = session_with(Vec::new());
        let mut answer = record("r1");
        answer.data =
            PayloadData::Text(r#"{"content":"x","suggestions":["next"]}"#.to_string());
        session.resolve(answer);
        assert_eq!(session.suggestions, vec!["next"]);

        let mut opaque = record("r2");
        opaque.data = PayloadData::Text("no json here".to_string());
        session.resolve(opaque);
        assert!(session.suggestions.is_empty());
    }

    #[test]
    fn save_is_replace_or_append() {
        let mut session = session_with(vec![record("a"), record("b")]);
        assert!(session.save("a"));
        assert!(session.save("b"));
        assert_eq!(session.saved.len(), 2);

        session.transcript[0].user_input = "revised".to_string();
        assert!(session.save("a"));
        assert_eq!(session.saved.len(), 2);
        assert_eq!(session.saved[0].user_input, "revised");
        assert!(!session.save("missing"));
    }

    #[test]
    fn delete_removes_saved_card() {
        let mut session = session_with(vec![record("a")]);
        session.save("a");
        assert!(session.delete_saved("a"));
        assert!(session.saved.is_empty());
        assert!(!session.delete_saved("a"));
    }

    #[test]
    fn update_result_touches_only_saved() {
        let mut session = session_with(vec![record("a")]);
        session.save("a");
        let mut row = Row::new();
        row.insert("n".to_string(), serde_json::json!(7));
        assert!(session.update_result("a", vec![row]));
        assert_eq!(session.saved[0].result.len(), 1);
        assert!(session.transcript[0].result.is_empty());
        assert!(!session.update_result("ghost", Vec::new()));
    }

    #[test]
    fn details_toggle_flips() {
        let mut session = session_with(Vec::new());
        assert!(!session.details_open("x"));
        session.toggle_details("x");
        assert!(session.details_open("x"));
        session.toggle_details("x");
        assert!(!session.details_open("x"));
    }

    #[test]
    fn visible_follows_view() {
        let mut session = session_with(vec![record("a")]);
        session.save("a");
        session.transcript.push(record("b"));
        assert_eq!(session.visible().len(), 2);
        session.switch_view(View::Saved);
        assert_eq!(session.visible().len(), 1);
    }
}
