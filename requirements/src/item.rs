//! Requirement items, their analysis results, and the legal status graph.
//!
//! ```text
//! Pending → Analyzing
//! Error → Analyzing
//! Analyzing → Completed | Error | Pending (cancelled while in flight)
//! ```
//!
//! `result` is populated if and only if the item is `Completed`; the
//! transition helpers on [`RequirementItem`] are the only way to change
//! status, so that invariant holds by construction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Language;
use crate::i18n;

/// Opaque item identifier.
pub type ItemId = Uuid;

/// Lifecycle status of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Analyzing,
    Completed,
    Error,
}

impl ItemStatus {
    /// Whether a batch run should pick this item up.
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Pending | Self::Error)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

fn is_legal_transition(from: ItemStatus, to: ItemStatus) -> bool {
    use ItemStatus::*;

    matches!(
        (from, to),
        (Pending, Analyzing)
            | (Error, Analyzing)
            | (Analyzing, Completed)
            | (Analyzing, Error)
            // cancelled mid-flight: the computed result is discarded
            | (Analyzing, Pending)
    )
}

/// Error returned when an illegal status transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalTransition {
    pub id: ItemId,
    pub from: ItemStatus,
    pub to: ItemStatus,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Illegal status transition for item {}: {} → {}",
            self.id, self.from, self.to
        )
    }
}

impl std::error::Error for IllegalTransition {}

/// Compliance outcome for one requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Yes,
    No,
    Partial,
    #[default]
    Indeterminate,
}

impl Verdict {
    /// Localized label (e.g. `Sim` / `Não` for Portuguese).
    pub fn label(self, lang: Language) -> &'static str {
        i18n::verdict_label(self, lang)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
            Self::Partial => write!(f, "partial"),
            Self::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// A documentation reference backing a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    pub title: String,
    pub uri: String,
}

/// Parsed backend verdict for a single requirement. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    pub manufacturer: String,
    pub description: String,
    /// Zero or one entries in practice.
    pub sources: Vec<SourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_model: Option<String>,
}

impl AnalysisResult {
    pub fn primary_source(&self) -> Option<&SourceReference> {
        self.sources.first()
    }
}

/// One imported or typed requirement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementItem {
    id: ItemId,
    text: String,
    status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl RequirementItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            status: ItemStatus::Pending,
            result: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn advance(&mut self, to: ItemStatus) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.status, to) {
            return Err(IllegalTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        tracing::debug!(item = %self.id, from = %self.status, to = %to, "Item transition");
        self.status = to;
        Ok(())
    }

    /// Pending/Error → Analyzing. Clears any previous error message and result.
    pub fn start_analysis(&mut self) -> Result<(), IllegalTransition> {
        self.advance(ItemStatus::Analyzing)?;
        self.error_message = None;
        self.result = None;
        Ok(())
    }

    /// Analyzing → Completed with the parsed result.
    pub fn complete(&mut self, result: AnalysisResult) -> Result<(), IllegalTransition> {
        self.advance(ItemStatus::Completed)?;
        self.result = Some(result);
        self.error_message = None;
        Ok(())
    }

    /// Analyzing → Error with a user-facing message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), IllegalTransition> {
        self.advance(ItemStatus::Error)?;
        self.result = None;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Analyzing → Pending, used when a run is cancelled while this item was in flight.
    pub fn revert_to_pending(&mut self) -> Result<(), IllegalTransition> {
        self.advance(ItemStatus::Pending)?;
        self.result = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            verdict: Verdict::Yes,
            manufacturer: "Fortinet".into(),
            description: "Supported natively".into(),
            sources: vec![],
            suggested_model: None,
        }
    }

    #[test]
    fn new_item_is_pending_and_eligible() {
        let item = RequirementItem::new("Must support IPsec VPN");
        assert_eq!(item.status(), ItemStatus::Pending);
        assert!(item.status().is_eligible());
        assert!(item.result().is_none());
        assert!(item.error_message().is_none());
    }

    #[test]
    fn happy_path_sets_result_only_when_completed() {
        let mut item = RequirementItem::new("Must support IPsec VPN");
        item.start_analysis().unwrap();
        assert_eq!(item.status(), ItemStatus::Analyzing);
        assert!(item.result().is_none());

        item.complete(sample_result()).unwrap();
        assert_eq!(item.status(), ItemStatus::Completed);
        assert_eq!(item.result().unwrap().verdict, Verdict::Yes);
        assert!(!item.status().is_eligible());
    }

    #[test]
    fn error_item_is_rerunnable_and_message_cleared() {
        let mut item = RequirementItem::new("Must support SD-WAN");
        item.start_analysis().unwrap();
        item.fail("backend unavailable").unwrap();
        assert_eq!(item.error_message(), Some("backend unavailable"));
        assert!(item.status().is_eligible());

        item.start_analysis().unwrap();
        assert!(item.error_message().is_none());
    }

    #[test]
    fn revert_discards_in_flight_state() {
        let mut item = RequirementItem::new("Must support SD-WAN");
        item.start_analysis().unwrap();
        item.revert_to_pending().unwrap();
        assert_eq!(item.status(), ItemStatus::Pending);
        assert!(item.result().is_none());
    }

    #[test]
    fn completed_cannot_restart() {
        let mut item = RequirementItem::new("Must support SD-WAN");
        item.start_analysis().unwrap();
        item.complete(sample_result()).unwrap();

        let err = item.start_analysis().unwrap_err();
        assert_eq!(err.from, ItemStatus::Completed);
        assert_eq!(err.to, ItemStatus::Analyzing);
        assert!(item.result().is_some());
    }

    #[test]
    fn pending_cannot_complete_directly() {
        let mut item = RequirementItem::new("Must support SD-WAN");
        assert!(item.complete(sample_result()).is_err());
        assert!(item.fail("x").is_err());
        assert!(item.revert_to_pending().is_err());
        assert_eq!(item.status(), ItemStatus::Pending);
    }

    #[test]
    fn illegal_transition_display() {
        let item = RequirementItem::new("x");
        let err = IllegalTransition {
            id: item.id(),
            from: ItemStatus::Completed,
            to: ItemStatus::Analyzing,
        };
        assert!(err.to_string().contains("completed → analyzing"));
    }
}
