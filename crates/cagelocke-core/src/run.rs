//! Shared run records

use crate::error::{Error, Result};
use crate::identity::RunId;
use crate::share_code::ShareCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shared run other players can join by share code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier
    pub id: RunId,
    /// Run name
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Creator, when the directory knows who asked
    pub created_by: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether the run is listed and joinable
    pub is_public: bool,
    /// The code players type to join
    pub share_code: ShareCode,
}

impl Run {
    /// Create a run record
    ///
    /// Trims the name and description; an empty description collapses to
    /// `None`, an empty name is rejected.
    pub fn new(
        id: RunId,
        name: &str,
        description: &str,
        share_code: ShareCode,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyField("name"));
        }
        let description = description.trim();
        let description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
        Ok(Self {
            id,
            name: name.to_string(),
            description,
            created_by: None,
            created_at: now,
            is_public: true,
            share_code,
        })
    }

    /// Check the record's invariants
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyField("name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> ShareCode {
        ShareCode::parse("ABC23DEF").unwrap()
    }

    #[test]
    fn test_new_trims_fields() {
        let run = Run::new(
            RunId::new("r1"),
            "  Johto Cagelocke ",
            "  fresh start  ",
            code(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(run.name, "Johto Cagelocke");
        assert_eq!(run.description.as_deref(), Some("fresh start"));
        assert!(run.is_public);
    }

    #[test]
    fn test_new_collapses_blank_description() {
        let run = Run::new(RunId::new("r1"), "Johto", "   ", code(), Utc::now()).unwrap();
        assert_eq!(run.description, None);
    }

    #[test]
    fn test_new_rejects_blank_name() {
        assert!(matches!(
            Run::new(RunId::new("r1"), "  ", "desc", code(), Utc::now()),
            Err(Error::EmptyField("name"))
        ));
    }
}
