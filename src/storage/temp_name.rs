//! Temporary file name candidates.

use chrono::Utc;
use uuid::Uuid;

/// Produces `<prefix><unix millis>_<0..=999>` candidates.
///
/// The millisecond clock alone repeats within a tick, so each candidate also
/// carries a random component. Candidates are not checked against any
/// backend here.
#[derive(Debug, Clone)]
pub struct TempNameGenerator {
    prefix: String,
}

impl TempNameGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn candidate(&self) -> String {
        let millis = Utc::now().timestamp_millis();
        let random = Uuid::new_v4().as_u128() % 1000;
        format!("{}{}_{}", self.prefix, millis, random)
    }
}
