//! Owner's manual entries served by the backend

use serde::{Deserialize, Serialize};

use super::Severity;

/// A dashboard warning light and what to do about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningLight {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    /// Recommended action for the driver
    pub action: String,
}

/// A how-to article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideArticle {
    pub id: String,
    pub title: String,
    pub category: String,
    pub body: String,
}

/// Remote account profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl WarningLight {
    /// Case-insensitive match against name and description
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

impl GuideArticle {
    /// Case-insensitive match against title and category
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }
}
