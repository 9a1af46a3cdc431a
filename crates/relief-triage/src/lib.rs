//! Stateless classifiers for incoming reports and observer positions.
//!
//! - [`classify_report`] flags a report as priority from its wording.
//! - [`classify_proximity`] decides whether a disaster is close enough to an
//!   observer to warrant an alert.
//! - [`ObserverView`] combines the two for a client that receives change
//!   events and knows (maybe) where it is.

mod observer;
mod proximity;

pub use observer::{Alert, AlertSeverity, ObserverView};
pub use proximity::{classify_proximity, haversine_km, Proximity, NEARBY_RADIUS_KM};

use regex::Regex;
use relief_types::VerificationStatus;
use serde::Serialize;
use std::sync::LazyLock;

static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)urgent|sos|emergency").expect("priority pattern is valid"));

/// Result of triaging report content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportTriage {
    pub priority: bool,
}

impl ReportTriage {
    /// The verification status stored on a newly created report.
    pub fn status(self) -> VerificationStatus {
        if self.priority {
            VerificationStatus::Priority
        } else {
            VerificationStatus::Pending
        }
    }
}

/// Flags content containing "urgent", "sos" or "emergency", in any case.
///
/// Matching is by substring, so "SOS!" and "emergency-level" both count.
pub fn classify_report(content: &str) -> ReportTriage {
    ReportTriage {
        priority: PRIORITY_RE.is_match(content),
    }
}
