//! Review records: critiques, analysis feedback and knowledge frameworks.
//!
//! Records are plain serde types. Their invariants (version arithmetic,
//! revision numbering, status transitions) are enforced by the services that
//! create them, not by the types themselves.

use chrono::{DateTime, Utc};
use folio_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default `critique_type` when none is given.
pub const DEFAULT_CRITIQUE_TYPE: &str = "general";

// ============================================================================
// Article identity
// ============================================================================

/// How feedback and critiques identify the article they concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleIdentity {
    /// Numeric article id, preferred when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_id: Option<i64>,

    /// Canonical article URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_url: Option<String>,
}

impl ArticleIdentity {
    /// Identity by numeric id.
    pub fn id(article_id: i64) -> Self {
        Self {
            article_id: Some(article_id),
            article_url: None,
        }
    }

    /// Identity by URL.
    pub fn url(article_url: impl Into<String>) -> Self {
        Self {
            article_id: None,
            article_url: Some(article_url.into()),
        }
    }

    /// The grouping key: the id when present, else the non-blank URL.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when neither is available.
    pub fn key(&self) -> Result<ArticleKey> {
        ArticleKey::from_parts(self.article_id, self.article_url.as_deref())
            .ok_or_else(|| Error::validation("article_id or article_url is required"))
    }
}

/// Resolved article identity used to group records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleKey {
    /// Keyed by numeric id.
    Id(i64),
    /// Keyed by URL.
    Url(String),
}

impl ArticleKey {
    /// Prefer the id, fall back to a non-blank URL.
    pub fn from_parts(article_id: Option<i64>, article_url: Option<&str>) -> Option<Self> {
        match (article_id, article_url.map(str::trim)) {
            (Some(id), _) => Some(Self::Id(id)),
            (None, Some(url)) if !url.is_empty() => Some(Self::Url(url.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ArticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Url(url) => write!(f, "url:{url}"),
        }
    }
}

// ============================================================================
// Critiques
// ============================================================================

/// Free-form editor notes attached to a critique.
///
/// Stored and returned exactly as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EditorNotes {
    /// A single note.
    Text(String),
    /// An ordered checklist.
    Checklist(Vec<String>),
    /// Named fields.
    Fields(Map<String, Value>),
    /// Anything else.
    Other(Value),
}

/// One immutable version of an editorial critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    /// Unique id.
    pub id: Uuid,

    /// Numeric article id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_id: Option<i64>,

    /// Article URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_url: Option<String>,

    /// Article headline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_title: Option<String>,

    /// The critique itself.
    pub critique_text: String,

    /// Free-form classification, `"general"` by default.
    pub critique_type: String,

    /// Optional structured notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_notes: Option<EditorNotes>,

    /// 1 for a root, parent version + 1 otherwise.
    pub version: u32,

    /// Previous version, absent for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,

    /// Id of the version-1 critique of this chain.
    pub root_id: Uuid,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Critique {
    /// Whether this is the first version of its chain.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The article this critique concerns, if identified.
    pub fn article_key(&self) -> Option<ArticleKey> {
        ArticleKey::from_parts(self.news_id, self.article_url.as_deref())
    }

    /// Whether this critique concerns the article identified by `key`.
    pub fn concerns(&self, key: &ArticleKey) -> bool {
        match key {
            ArticleKey::Id(id) => self.news_id == Some(*id),
            ArticleKey::Url(url) => self.article_url.as_deref().map(str::trim) == Some(url.as_str()),
        }
    }
}

/// Input for creating or revising a critique.
///
/// On revision, absent article fields are inherited from the parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CritiqueInput {
    /// Numeric article id.
    #[serde(default)]
    pub news_id: Option<i64>,
    /// Article URL.
    #[serde(default)]
    pub article_url: Option<String>,
    /// Article headline.
    #[serde(default)]
    pub article_title: Option<String>,
    /// The critique text; must not be blank.
    pub critique_text: String,
    /// Classification; `"general"` when absent.
    #[serde(default)]
    pub critique_type: Option<String>,
    /// Structured notes.
    #[serde(default)]
    pub editor_notes: Option<EditorNotes>,
}

impl CritiqueInput {
    /// Input with just the critique text.
    pub fn new(critique_text: impl Into<String>) -> Self {
        Self {
            critique_text: critique_text.into(),
            ..Default::default()
        }
    }

    /// Set the numeric article id.
    pub fn with_news_id(mut self, news_id: i64) -> Self {
        self.news_id = Some(news_id);
        self
    }

    /// Set the article URL.
    pub fn with_article_url(mut self, url: impl Into<String>) -> Self {
        self.article_url = Some(url.into());
        self
    }

    /// Set the article headline.
    pub fn with_article_title(mut self, title: impl Into<String>) -> Self {
        self.article_title = Some(title.into());
        self
    }

    /// Set the classification.
    pub fn with_critique_type(mut self, critique_type: impl Into<String>) -> Self {
        self.critique_type = Some(critique_type.into());
        self
    }

    /// Attach editor notes.
    pub fn with_editor_notes(mut self, notes: EditorNotes) -> Self {
        self.editor_notes = Some(notes);
        self
    }
}

// ============================================================================
// Analysis payloads and feedback
// ============================================================================

/// A model analysis, kept as the JSON object it was produced as.
///
/// Typed accessors read the fields used for embedding; every other field is
/// preserved untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisPayload(Map<String, Value>);

impl AnalysisPayload {
    /// Wrap a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap any JSON value; only objects are accepted.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for non-object values.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::validation(format!(
                "analysis must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// The underlying object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying object.
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `content_summary`, falling back to `summary`.
    pub fn summary(&self) -> Option<&str> {
        self.non_blank_str("content_summary")
            .or_else(|| self.non_blank_str("summary"))
    }

    /// `narration`.
    pub fn narration(&self) -> Option<&str> {
        self.non_blank_str("narration")
    }

    /// `key_points`, tolerating a list of strings, a list of objects with a
    /// `point` or `text` field, or a single newline-separated string.
    pub fn key_points(&self) -> Vec<String> {
        match self.0.get("key_points") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim()),
                    Value::Object(o) => o
                        .get("point")
                        .or_else(|| o.get("text"))
                        .and_then(Value::as_str)
                        .map(str::trim),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .lines()
                .map(|l| l.trim().trim_start_matches(['-', '*']).trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Summary, narration and key points joined by blank lines.
    ///
    /// Empty when none of the three is present.
    pub fn embedding_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(self.summary().map(str::to_string));
        parts.extend(self.narration().map(str::to_string));
        let points = self.key_points();
        if !points.is_empty() {
            parts.push(points.join("\n"));
        }
        parts.join("\n\n")
    }

    fn non_blank_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl From<Map<String, Value>> for AnalysisPayload {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Lifecycle state of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    /// Plain feedback, no re-analysis.
    Reviewed,
    /// Feedback that produced a re-analysis.
    Revised,
    /// Accepted by an editor; terminal.
    Approved,
}

impl FeedbackStatus {
    /// Lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reviewed => "reviewed",
            Self::Revised => "revised",
            Self::Approved => "approved",
        }
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in an article's feedback history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFeedback {
    /// Unique id.
    pub id: Uuid,

    /// Numeric article id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_id: Option<i64>,

    /// Article URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_url: Option<String>,

    /// Position in the article's history, starting at 1.
    pub revision_number: u32,

    /// The editor's comment.
    pub admin_comment: String,

    /// Optional score in 1..=10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,

    /// The analysis the comment was made against.
    pub gpt_analysis: AnalysisPayload,

    /// Re-analysis output, for revised entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpt_revision: Option<AnalysisPayload>,

    /// The instruction sent for re-analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_prompt: Option<String>,

    /// Lifecycle state.
    pub status: FeedbackStatus,

    /// Previous entry for the same article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl AnalysisFeedback {
    /// The grouping key of this entry.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the entry carries no identity, which the
    /// pipeline never writes.
    pub fn article_key(&self) -> Result<ArticleKey> {
        ArticleKey::from_parts(self.article_id, self.article_url.as_deref())
            .ok_or_else(|| Error::validation(format!("feedback {} has no article identity", self.id)))
    }
}

// ============================================================================
// Knowledge frameworks
// ============================================================================

/// Framework category. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameworkCategory {
    /// International relations theory.
    IrTheory,
    /// Geopolitics.
    Geopolitics,
    /// Economics.
    Economics,
    /// History.
    History,
    /// Security studies.
    Security,
    /// Any other tag, including `"other"`.
    Other(String),
}

impl FrameworkCategory {
    /// The category tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::IrTheory => "ir_theory",
            Self::Geopolitics => "geopolitics",
            Self::Economics => "economics",
            Self::History => "history",
            Self::Security => "security",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for FrameworkCategory {
    fn from(tag: String) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ir_theory" => Self::IrTheory,
            "geopolitics" => Self::Geopolitics,
            "economics" => Self::Economics,
            "history" => Self::History,
            "security" => Self::Security,
            _ => Self::Other(tag.trim().to_string()),
        }
    }
}

impl From<FrameworkCategory> for String {
    fn from(category: FrameworkCategory) -> Self {
        category.as_str().to_string()
    }
}

impl FromStr for FrameworkCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::validation("category must not be empty"));
        }
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for FrameworkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A curated analytical framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeFrameworkEntry {
    /// Unique id.
    pub id: Uuid,
    /// Category.
    pub category: FrameworkCategory,
    /// Short framework name (e.g. "offensive realism").
    pub framework_name: String,
    /// Display title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Ordered keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Citation or origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl KnowledgeFrameworkEntry {
    /// Title, content and keywords, as embedded.
    pub fn embedding_text(&self) -> String {
        let mut text = format!("{}\n\n{}", self.title.trim(), self.content.trim());
        if !self.keywords.is_empty() {
            text.push_str("\n\nKeywords: ");
            text.push_str(&self.keywords.join(", "));
        }
        text
    }
}

/// Input for adding a framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameworkInput {
    /// Category tag; must not be blank.
    pub category: String,
    /// Framework name; must not be blank.
    pub framework_name: String,
    /// Title; must not be blank.
    pub title: String,
    /// Content; must not be blank.
    pub content: String,
    /// Keywords, order preserved.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Citation or origin.
    #[serde(default)]
    pub source: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    // ------------------------------------------------------------------------
    // Article identity
    // ------------------------------------------------------------------------

    #[test]
    fn test_article_key_prefers_id() {
        let identity = ArticleIdentity {
            article_id: Some(42),
            article_url: Some("https://example.com/a".into()),
        };
        assert_eq!(identity.key().unwrap(), ArticleKey::Id(42));
        assert_eq!(
            ArticleIdentity::url(" https://example.com/a ").key().unwrap(),
            ArticleKey::Url("https://example.com/a".into())
        );
    }

    #[test]
    fn test_article_key_requires_something() {
        assert!(ArticleIdentity::default().key().is_err());
        assert!(ArticleIdentity::url("   ").key().is_err());
    }

    #[test]
    fn test_article_key_display() {
        assert_eq!(ArticleKey::Id(7).to_string(), "id:7");
        assert_eq!(ArticleKey::Url("u".into()).to_string(), "url:u");
    }

    // ------------------------------------------------------------------------
    // Editor notes
    // ------------------------------------------------------------------------

    #[test]
    fn test_editor_notes_shapes() {
        let text: EditorNotes = serde_json::from_value(json!("check sourcing")).unwrap();
        assert_eq!(text, EditorNotes::Text("check sourcing".into()));

        let list: EditorNotes = serde_json::from_value(json!(["tone", "sources"])).unwrap();
        assert_eq!(list, EditorNotes::Checklist(vec!["tone".into(), "sources".into()]));

        let fields: EditorNotes = serde_json::from_value(json!({"tone": "alarmist"})).unwrap();
        assert!(matches!(fields, EditorNotes::Fields(_)));

        let other: EditorNotes = serde_json::from_value(json!([1, "mixed"])).unwrap();
        assert!(matches!(other, EditorNotes::Other(_)));
    }

    #[test]
    fn test_editor_notes_round_trip_unchanged() {
        for raw in [json!("x"), json!(["a"]), json!({"k": [1, 2]}), json!(3.5), json!(null)] {
            let notes: EditorNotes = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(serde_json::to_value(&notes).unwrap(), raw);
        }
    }

    // ------------------------------------------------------------------------
    // Analysis payload
    // ------------------------------------------------------------------------

    #[test]
    fn test_payload_accessors() {
        let payload = AnalysisPayload::from_value(json!({
            "content_summary": "Summary.",
            "summary": "ignored",
            "narration": "Narration.",
            "key_points": ["one", {"point": "two"}, {"text": "three"}, 4, "  "],
            "bias_score": 3
        }))
        .unwrap();

        assert_eq!(payload.summary(), Some("Summary."));
        assert_eq!(payload.narration(), Some("Narration."));
        assert_eq!(payload.key_points(), vec!["one", "two", "three"]);
        assert_eq!(payload.embedding_text(), "Summary.\n\nNarration.\n\none\ntwo\nthree");
    }

    #[test]
    fn test_payload_summary_fallback_and_string_points() {
        let payload = AnalysisPayload::from_value(json!({
            "summary": "Fallback.",
            "key_points": "- first\n* second\n\n"
        }))
        .unwrap();
        assert_eq!(payload.summary(), Some("Fallback."));
        assert_eq!(payload.key_points(), vec!["first", "second"]);
    }

    #[test]
    fn test_payload_embedding_text_empty() {
        let payload = AnalysisPayload::from_value(json!({"bias_score": 2, "narration": " "})).unwrap();
        assert!(payload.embedding_text().is_empty());
    }

    #[test]
    fn test_payload_rejects_non_object() {
        let err = AnalysisPayload::from_value(json!(["a"])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_payload_round_trips_unknown_fields() {
        let raw = json!({"narration": "n", "nested": {"deep": [1, 2, 3]}});
        let payload: AnalysisPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    // ------------------------------------------------------------------------
    // Categories and frameworks
    // ------------------------------------------------------------------------

    #[test]
    fn test_category_parsing() {
        assert_eq!("ir_theory".parse::<FrameworkCategory>().unwrap(), FrameworkCategory::IrTheory);
        assert_eq!("Security".parse::<FrameworkCategory>().unwrap(), FrameworkCategory::Security);
        assert_eq!(
            "maritime_law".parse::<FrameworkCategory>().unwrap(),
            FrameworkCategory::Other("maritime_law".into())
        );
        assert!("  ".parse::<FrameworkCategory>().is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&FrameworkCategory::Geopolitics).unwrap();
        assert_eq!(json, r#""geopolitics""#);
        let other: FrameworkCategory = serde_json::from_str(r#""other""#).unwrap();
        assert_eq!(other.as_str(), "other");
    }

    #[test]
    fn test_framework_embedding_text() {
        let entry = KnowledgeFrameworkEntry {
            id: Uuid::new_v4(),
            category: FrameworkCategory::IrTheory,
            framework_name: "realism".into(),
            title: "Structural Realism".into(),
            content: "States seek security under anarchy.".into(),
            keywords: vec!["anarchy".into(), "balance of power".into()],
            source: None,
            created_at: Utc::now(),
        };
        assert_eq!(
            entry.embedding_text(),
            "Structural Realism\n\nStates seek security under anarchy.\n\nKeywords: anarchy, balance of power"
        );
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&FeedbackStatus::Revised).unwrap(), r#""revised""#);
        assert_eq!(FeedbackStatus::Approved.to_string(), "approved");
    }
}
