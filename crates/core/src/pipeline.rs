//! Applicant pipeline statuses.
//!
//! Clients may customise their pipeline; when they have not, the default
//! pipeline below applies. Status names are stored verbatim on applicant
//! rows and referenced by trigger configuration.

// ---------------------------------------------------------------------------
// Default pipeline
// ---------------------------------------------------------------------------

pub const STATUS_NEW: &str = "Neu";
pub const STATUS_CV_REQUESTED: &str = "CV angefragt";
pub const STATUS_PREQUALIFYING: &str = "In Vorqualifizierung";
pub const STATUS_QUALIFIED: &str = "Qualifiziert";
pub const STATUS_PRESENTED: &str = "Vorgestellt";
pub const STATUS_INTERVIEW: &str = "Interview terminiert";
pub const STATUS_HIRED: &str = "Eingestellt";
pub const STATUS_REJECTED: &str = "Abgesagt";
pub const STATUS_WITHDRAWN: &str = "Bewerber hat abgesagt";

/// Default pipeline in display order.
pub const DEFAULT_PIPELINE: &[&str] = &[
    STATUS_NEW,
    STATUS_CV_REQUESTED,
    STATUS_PREQUALIFYING,
    STATUS_QUALIFIED,
    STATUS_PRESENTED,
    STATUS_INTERVIEW,
    STATUS_HIRED,
    STATUS_REJECTED,
    STATUS_WITHDRAWN,
];

/// Statuses after which an applicant is no longer an open subject.
pub const TERMINAL_STATUSES: &[&str] = &[STATUS_HIRED, STATUS_REJECTED, STATUS_WITHDRAWN];

/// Whether an applicant in `status` has left the active pipeline.
pub fn is_terminal(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

/// Client-facing label for an internal pipeline status.
///
/// Several internal statuses collapse into one label on the portal. Unknown
/// statuses (custom pipeline stages) are shown as-is.
pub fn client_label(status: &str) -> &str {
    match status {
        STATUS_NEW | STATUS_CV_REQUESTED => "Eingegangen",
        STATUS_PREQUALIFYING => "In Prüfung",
        STATUS_QUALIFIED => "Qualifiziert",
        STATUS_PRESENTED => "Vorgestellt",
        STATUS_INTERVIEW => "Interview",
        STATUS_HIRED => "Eingestellt",
        STATUS_REJECTED | STATUS_WITHDRAWN => "Nicht passend",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The set of statuses known for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    statuses: Vec<String>,
}

impl Pipeline {
    /// Build a pipeline from the client's configured statuses, falling back
    /// to [`DEFAULT_PIPELINE`] when none are configured.
    pub fn from_statuses(statuses: Vec<String>) -> Self {
        if statuses.is_empty() {
            return Self::default();
        }
        Self { statuses }
    }

    pub fn contains(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            statuses: DEFAULT_PIPELINE.iter().map(|s| s.to_string()).collect(),
        }
    }
}
