//! Lifecycle phase of a crawler instance

use crate::CrawlError;
use serde::Serialize;
use std::fmt;

/// Represents where a crawler is in its crawl lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    /// No crawl has been started yet
    #[default]
    Idle,

    /// Workers are draining the frontier
    Running,

    /// The last crawl finished; the crawler may be reused
    Done,
}

impl CrawlPhase {
    /// Returns true if moving from `self` to `to` is allowed
    ///
    /// A finished crawler can start a new crawl, but a running crawl cannot
    /// be started again until it completes.
    pub fn can_transition_to(&self, to: CrawlPhase) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Running) | (Self::Running, Self::Done) | (Self::Done, Self::Running)
        )
    }

    /// Performs a checked transition
    pub fn transition(self, to: CrawlPhase) -> Result<CrawlPhase, CrawlError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CrawlError::InvalidTransition { from: self, to })
        }
    }

    /// String form used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
