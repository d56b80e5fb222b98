//! Publication models: the paper catalogue and curated feature publications.
//!
//! # Invariants
//! - `title` is non-blank.
//! - `doi`, when non-empty, is shaped `10.<registrant>/<suffix>`.
//! - Paper tags are trimmed, lowercase and unique.

use crate::model::ordering::{Orderable, RecordId};
use crate::model::validation::{
    check_doi, check_optional_url, require_text, RecordValidationError,
};
use serde::{Deserialize, Serialize};

/// Catalogue paper row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub id: RecordId,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: String,
    pub journal: String,
    /// Free-form date as reported by the source (`2021 Mar 4`, `2021`).
    pub publish_date: String,
    pub pubmed_id: String,
    pub nct_number: String,
    pub doi: String,
    pub tags: Vec<String>,
    pub sort_order: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Paper {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            abstract_text: String::new(),
            authors: String::new(),
            journal: String::new(),
            publish_date: String::new(),
            pubmed_id: String::new(),
            nct_number: String::new(),
            doi: String::new(),
            tags: Vec::new(),
            sort_order: 0,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Replaces tags with their normalized form.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("title", &self.title)?;
        check_doi(&self.doi)?;
        Ok(())
    }
}

impl Orderable for Paper {
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

/// Partial update of a paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperPatch {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub authors: Option<String>,
    pub journal: Option<String>,
    pub publish_date: Option<String>,
    pub pubmed_id: Option<String>,
    pub nct_number: Option<String>,
    pub doi: Option<String>,
    pub tags: Option<Vec<String>>,
    pub order: Option<i64>,
}

impl PaperPatch {
    pub fn apply_to(&self, paper: &mut Paper) {
        if let Some(title) = &self.title {
            paper.title = title.clone();
        }
        if let Some(abstract_text) = &self.abstract_text {
            paper.abstract_text = abstract_text.clone();
        }
        if let Some(authors) = &self.authors {
            paper.authors = authors.clone();
        }
        if let Some(journal) = &self.journal {
            paper.journal = journal.clone();
        }
        if let Some(publish_date) = &self.publish_date {
            paper.publish_date = publish_date.clone();
        }
        if let Some(pubmed_id) = &self.pubmed_id {
            paper.pubmed_id = pubmed_id.clone();
        }
        if let Some(nct_number) = &self.nct_number {
            paper.nct_number = nct_number.clone();
        }
        if let Some(doi) = &self.doi {
            paper.doi = doi.clone();
        }
        if let Some(tags) = &self.tags {
            paper.set_tags(tags);
        }
    }
}

/// Curated publication highlighted on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePublication {
    pub id: RecordId,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: String,
    pub journal: String,
    pub image_url: Option<String>,
    /// Catalogue paper this highlight was derived from, if any.
    pub paper_id: String,
    pub publish_date: String,
    pub pubmed_id: String,
    pub nct_number: String,
    pub doi: String,
    pub sort_order: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FeaturePublication {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            abstract_text: String::new(),
            authors: String::new(),
            journal: String::new(),
            image_url: None,
            paper_id: String::new(),
            publish_date: String::new(),
            pubmed_id: String::new(),
            nct_number: String::new(),
            doi: String::new(),
            sort_order: 0,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Builds a highlight carrying the bibliographic fields of `paper`.
    pub fn from_paper(paper: &Paper) -> Self {
        Self {
            abstract_text: paper.abstract_text.clone(),
            authors: paper.authors.clone(),
            journal: paper.journal.clone(),
            paper_id: paper.id.to_string(),
            publish_date: paper.publish_date.clone(),
            pubmed_id: paper.pubmed_id.clone(),
            nct_number: paper.nct_number.clone(),
            doi: paper.doi.clone(),
            ..Self::new(paper.title.clone())
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("title", &self.title)?;
        check_doi(&self.doi)?;
        check_optional_url("image_url", self.image_url.as_deref())?;
        Ok(())
    }
}

impl Orderable for FeaturePublication {
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

/// Partial update of a feature publication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePublicationPatch {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub authors: Option<String>,
    pub journal: Option<String>,
    pub image_url: Option<String>,
    pub publish_date: Option<String>,
    pub pubmed_id: Option<String>,
    pub nct_number: Option<String>,
    pub doi: Option<String>,
    pub order: Option<i64>,
}

impl FeaturePublicationPatch {
    pub fn apply_to(&self, publication: &mut FeaturePublication) {
        if let Some(title) = &self.title {
            publication.title = title.clone();
        }
        if let Some(abstract_text) = &self.abstract_text {
            publication.abstract_text = abstract_text.clone();
        }
        if let Some(authors) = &self.authors {
            publication.authors = authors.clone();
        }
        if let Some(journal) = &self.journal {
            publication.journal = journal.clone();
        }
        if self.image_url.is_some() {
            publication.image_url = self.image_url.clone();
        }
        if let Some(publish_date) = &self.publish_date {
            publication.publish_date = publish_date.clone();
        }
        if let Some(pubmed_id) = &self.pubmed_id {
            publication.pubmed_id = pubmed_id.clone();
        }
        if let Some(nct_number) = &self.nct_number {
            publication.nct_number = nct_number.clone();
        }
        if let Some(doi) = &self.doi {
            publication.doi = doi.clone();
        }
    }
}

/// Trims, lowercases and deduplicates tags, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let value = tag.as_ref().trim().to_lowercase();
        if !value.is_empty() && !normalized.contains(&value) {
            normalized.push(value);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, FeaturePublication, Paper};

    #[test]
    fn tags_are_normalized() {
        let tags = normalize_tags([" Genomics", "genomics", "", "CRISPR "]);
        assert_eq!(tags, vec!["genomics".to_string(), "crispr".to_string()]);
    }

    #[test]
    fn feature_publication_copies_paper_metadata() {
        let mut paper = Paper::new("Single-cell atlas");
        paper.id = 42;
        paper.doi = "10.1000/atlas".to_string();
        paper.journal = "Nature".to_string();

        let feature = FeaturePublication::from_paper(&paper);
        assert_eq!(feature.title, "Single-cell atlas");
        assert_eq!(feature.paper_id, "42");
        assert_eq!(feature.doi, "10.1000/atlas");
        assert_eq!(feature.id, 0);
        assert!(feature.validate().is_ok());
    }

    #[test]
    fn invalid_doi_fails_validation() {
        let mut paper = Paper::new("Bad DOI");
        paper.doi = "not-a-doi".to_string();
        assert!(paper.validate().is_err());
    }
}
