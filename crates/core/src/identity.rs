//! Reviewer identity captured for the public review flow
//!
//! Session-scoped, never stored by this engine. The public flow requires
//! an identity before any annotation-creating tool is usable; the internal
//! flow supplies one implicitly from its authenticated user.

/// Identity of the person acting on a review
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReviewerIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
}

impl ReviewerIdentity {
    /// Create a new identity
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            company: None,
        }
    }

    /// Attach a company name
    pub fn with_company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }

    /// Full display name, as attached to created annotations
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
