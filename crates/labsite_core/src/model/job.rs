//! Job posting model.
//!
//! # Invariants
//! - `title`, `location` and `description` are non-blank.
//! - New postings start as `JobStatus::Draft`.

use crate::model::ordering::{Orderable, RecordId};
use crate::model::validation::{require_text, RecordValidationError};
use serde::{Deserialize, Serialize};

/// Employment arrangement of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Remote,
    Hybrid,
    Contract,
}

/// Publication state of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepting applications and publicly listed.
    Open,
    Closed,
    #[default]
    Draft,
}

impl JobStatus {
    /// Stored and command-line spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Draft => "draft",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }
}

/// Job posting row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: RecordId,
    pub title: String,
    pub job_type: JobType,
    pub location: String,
    pub description: String,
    pub status: JobStatus,
    pub funded_by: Option<String>,
    pub visa_type: Option<String>,
    pub job_tenure: Option<String>,
    pub required_qualifications: Option<String>,
    pub preferred_qualifications: Option<String>,
    pub sort_order: i64,
    pub is_deleted: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Job {
    /// Creates an unsaved draft posting. Store-assigned fields are zeroed.
    pub fn new(
        title: impl Into<String>,
        job_type: JobType,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            job_type,
            location: location.into(),
            description: description.into(),
            status: JobStatus::Draft,
            funded_by: None,
            visa_type: None,
            job_tenure: None,
            required_qualifications: None,
            preferred_qualifications: None,
            sort_order: 0,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("title", &self.title)?;
        require_text("location", &self.location)?;
        require_text("description", &self.description)?;
        Ok(())
    }
}

impl Orderable for Job {
    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }

    fn set_sort_order(&mut self, value: i64) {
        self.sort_order = value;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// Partial update of a posting. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub job_type: Option<JobType>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<JobStatus>,
    pub funded_by: Option<String>,
    pub visa_type: Option<String>,
    pub job_tenure: Option<String>,
    pub required_qualifications: Option<String>,
    pub preferred_qualifications: Option<String>,
    pub order: Option<i64>,
}

impl JobPatch {
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(title) = &self.title {
            job.title = title.clone();
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(location) = &self.location {
            job.location = location.clone();
        }
        if let Some(description) = &self.description {
            job.description = description.clone();
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if self.funded_by.is_some() {
            job.funded_by = self.funded_by.clone();
        }
        if self.visa_type.is_some() {
            job.visa_type = self.visa_type.clone();
        }
        if self.job_tenure.is_some() {
            job.job_tenure = self.job_tenure.clone();
        }
        if self.required_qualifications.is_some() {
            job.required_qualifications = self.required_qualifications.clone();
        }
        if self.preferred_qualifications.is_some() {
            job.preferred_qualifications = self.preferred_qualifications.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JobStatus;

    #[test]
    fn status_parse_accepts_stored_spelling_in_any_case() {
        for status in [JobStatus::Open, JobStatus::Closed, JobStatus::Draft] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse(" OPEN "), Some(JobStatus::Open));
        assert_eq!(JobStatus::parse("archived"), None);
    }
}
