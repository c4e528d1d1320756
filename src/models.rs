use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub industry: String,
    pub location: String,
    pub website: String,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub location: String,
    pub job_type: String, // "Full-time", "Part-time", "Contract", ...
    pub salary: String,   // display-only, unstructured
    pub description: String,
    pub requirements: Vec<String>,
    pub banner_image: String,
}

/// A job flattened together with its owning company's display fields.
/// Derived from the company list on demand, never persisted.
#[derive(Debug, Clone)]
pub struct JobListingEntry {
    pub company_id: String,
    pub company_name: String,
    pub company_logo: String,
    pub company_website: String,
    pub job: Job,
}

/// The three-dimensional job query. `"all"` or an empty string means
/// "no constraint on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub job_type: String,
    pub location: String,
}

impl FilterCriteria {
    pub fn reset() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.job_type.is_empty() && self.location.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub photo_url: String,
    pub provider: String, // "password", "google.com", ...
}
