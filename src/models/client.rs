use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person's name as used for matching: a stored client's name or a name
/// extracted from an uploaded report. All comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub first_name: String,
    pub last_name: String,
    pub middle_initial: Option<String>,
}

impl Identity {
    pub fn new(first_name: &str, last_name: &str, middle_initial: Option<&str>) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            middle_initial: middle_initial
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        }
    }

    /// Display form, "First Last" (middle initial omitted).
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    #[serde(flatten)]
    pub identity: Identity,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_trims_fields() {
        let id = Identity::new("  John ", " Doe ", Some(" Q "));
        assert_eq!(id.first_name, "John");
        assert_eq!(id.last_name, "Doe");
        assert_eq!(id.middle_initial.as_deref(), Some("Q"));
    }

    #[test]
    fn empty_middle_initial_becomes_none() {
        let id = Identity::new("John", "Doe", Some("  "));
        assert_eq!(id.middle_initial, None);
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let id = Identity::new("John", "Doe", Some("Q"));
        assert_eq!(id.full_name(), "John Doe");
    }
}
