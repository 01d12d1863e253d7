use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Externally supplied key naming the ledger slot a fingerprint attaches to
/// (e.g. a patient health number such as `HH1001`).
///
/// The identifier is opaque: the only rule enforced here is that it is not
/// empty or whitespace-only. Surrounding whitespace is trimmed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a subject identifier, rejecting empty input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, TypeError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypeError::EmptySubject);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(subject: SubjectId) -> Self {
        subject.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_opaque_identifiers() {
        assert_eq!(SubjectId::new("HH1001").unwrap().as_str(), "HH1001");
        assert_eq!(SubjectId::new("patient/7 #2").unwrap().as_str(), "patient/7 #2");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(SubjectId::new("  HH1001 ").unwrap(), SubjectId::new("HH1001").unwrap());
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(SubjectId::new(""), Err(TypeError::EmptySubject));
        assert_eq!(SubjectId::new(" \t\n"), Err(TypeError::EmptySubject));
    }

    #[test]
    fn serde_roundtrip_and_validation() {
        let subject = SubjectId::new("HH1002").unwrap();
        let json = serde_json::to_string(&subject).unwrap();
        assert_eq!(json, "\"HH1002\"");
        assert_eq!(serde_json::from_str::<SubjectId>(&json).unwrap(), subject);
        assert!(serde_json::from_str::<SubjectId>("\" \"").is_err());
    }
}
