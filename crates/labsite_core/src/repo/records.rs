//! Table mappings for the orderable record types.
//!
//! # Invariants
//! - `COLUMNS` and `column_values` stay in lockstep per record type.
//! - Read paths reject invalid persisted enums/flags instead of masking them.

use crate::model::job::{Job, JobPatch, JobStatus, JobType};
use crate::model::news::{News, NewsPatch};
use crate::model::ordering::{Collection, RecordId};
use crate::model::paper::{FeaturePublication, FeaturePublicationPatch, Paper, PaperPatch};
use crate::model::team_member::{TeamMember, TeamMemberPatch};
use crate::model::validation::RecordValidationError;
use crate::repo::collection_repo::{
    CollectionRepoError, CollectionRepoResult, ListQuery, OrderedRecord,
};
use rusqlite::types::Value;
use rusqlite::Row;

/// Bookkeeping fields common to every collection row.
struct RowMeta {
    id: RecordId,
    sort_order: i64,
    is_deleted: bool,
    created_at: i64,
    updated_at: i64,
}

fn parse_meta(row: &Row<'_>, table: &str) -> CollectionRepoResult<RowMeta> {
    Ok(RowMeta {
        id: row.get("id")?,
        sort_order: row.get("sort_order")?,
        is_deleted: parse_flag(row, table, "is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_flag(row: &Row<'_>, table: &str, column: &str) -> CollectionRepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CollectionRepoError::InvalidData(format!(
            "invalid {column} value `{other}` in {table}.{column}"
        ))),
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

fn job_type_to_db(job_type: JobType) -> &'static str {
    match job_type {
        JobType::FullTime => "full_time",
        JobType::PartTime => "part_time",
        JobType::Remote => "remote",
        JobType::Hybrid => "hybrid",
        JobType::Contract => "contract",
    }
}

fn parse_job_type(value: &str) -> Option<JobType> {
    match value {
        "full_time" => Some(JobType::FullTime),
        "part_time" => Some(JobType::PartTime),
        "remote" => Some(JobType::Remote),
        "hybrid" => Some(JobType::Hybrid),
        "contract" => Some(JobType::Contract),
        _ => None,
    }
}

impl OrderedRecord for Job {
    type Patch = JobPatch;

    const COLLECTION: Collection = Collection::Jobs;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "job_type",
        "location",
        "description",
        "status",
        "funded_by",
        "visa_type",
        "job_tenure",
        "required_qualifications",
        "preferred_qualifications",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "location", "description"];

    fn validate(&self) -> Result<(), RecordValidationError> {
        Job::validate(self)
    }

    fn column_values(&self) -> CollectionRepoResult<Vec<Value>> {
        Ok(vec![
            text(&self.title),
            text(job_type_to_db(self.job_type)),
            text(&self.location),
            text(&self.description),
            text(self.status.as_str()),
            optional_text(self.funded_by.as_deref()),
            optional_text(self.visa_type.as_deref()),
            optional_text(self.job_tenure.as_deref()),
            optional_text(self.required_qualifications.as_deref()),
            optional_text(self.preferred_qualifications.as_deref()),
        ])
    }

    fn from_row(row: &Row<'_>) -> CollectionRepoResult<Self> {
        let meta = parse_meta(row, "jobs")?;

        let type_text: String = row.get("job_type")?;
        let job_type = parse_job_type(&type_text).ok_or_else(|| {
            CollectionRepoError::InvalidData(format!(
                "invalid job type `{type_text}` in jobs.job_type"
            ))
        })?;
        let status_text: String = row.get("status")?;
        let status = JobStatus::parse(&status_text).ok_or_else(|| {
            CollectionRepoError::InvalidData(format!(
                "invalid job status `{status_text}` in jobs.status"
            ))
        })?;

        Ok(Job {
            id: meta.id,
            title: row.get("title")?,
            job_type,
            location: row.get("location")?,
            description: row.get("description")?,
            status,
            funded_by: row.get("funded_by")?,
            visa_type: row.get("visa_type")?,
            job_tenure: row.get("job_tenure")?,
            required_qualifications: row.get("required_qualifications")?,
            preferred_qualifications: row.get("preferred_qualifications")?,
            sort_order: meta.sort_order,
            is_deleted: meta.is_deleted,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    fn apply_patch(&mut self, patch: &JobPatch) {
        patch.apply_to(self);
    }

    fn requested_order(patch: &JobPatch) -> Option<i64> {
        patch.order
    }

    fn list_filter(query: &ListQuery) -> CollectionRepoResult<Option<(String, Vec<Value>)>> {
        Ok(query
            .status
            .map(|status| ("status = ?".to_string(), vec![text(status.as_str())])))
    }
}

impl OrderedRecord for News {
    type Patch = NewsPatch;

    const COLLECTION: Collection = Collection::News;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "content",
        "image_url",
        "hyperlink",
        "publish_date",
        "is_open",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "content"];

    fn validate(&self) -> Result<(), RecordValidationError> {
        News::validate(self)
    }

    fn column_values(&self) -> CollectionRepoResult<Vec<Value>> {
        Ok(vec![
            text(&self.title),
            text(&self.content),
            optional_text(self.image_url.as_deref()),
            optional_text(self.hyperlink.as_deref()),
            Value::Integer(self.publish_date),
            Value::Integer(i64::from(self.is_open)),
        ])
    }

    fn from_row(row: &Row<'_>) -> CollectionRepoResult<Self> {
        let meta = parse_meta(row, "news")?;
        Ok(News {
            id: meta.id,
            title: row.get("title")?,
            content: row.get("content")?,
            image_url: row.get("image_url")?,
            hyperlink: row.get("hyperlink")?,
            publish_date: row.get("publish_date")?,
            is_open: parse_flag(row, "news", "is_open")?,
            sort_order: meta.sort_order,
            is_deleted: meta.is_deleted,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    fn apply_patch(&mut self, patch: &NewsPatch) {
        patch.apply_to(self);
    }

    fn requested_order(patch: &NewsPatch) -> Option<i64> {
        patch.order
    }
}

impl OrderedRecord for Paper {
    type Patch = PaperPatch;

    const COLLECTION: Collection = Collection::Papers;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "abstract",
        "authors",
        "journal",
        "publish_date",
        "pubmed_id",
        "nct_number",
        "doi",
        "tags",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] =
        &["title", "abstract", "authors", "journal", "doi", "tags"];

    fn validate(&self) -> Result<(), RecordValidationError> {
        Paper::validate(self)
    }

    fn column_values(&self) -> CollectionRepoResult<Vec<Value>> {
        let tags = serde_json::to_string(&self.tags).map_err(|err| {
            CollectionRepoError::InvalidData(format!("cannot encode paper tags: {err}"))
        })?;
        Ok(vec![
            text(&self.title),
            text(&self.abstract_text),
            text(&self.authors),
            text(&self.journal),
            text(&self.publish_date),
            text(&self.pubmed_id),
            text(&self.nct_number),
            text(&self.doi),
            Value::Text(tags),
        ])
    }

    fn from_row(row: &Row<'_>) -> CollectionRepoResult<Self> {
        let meta = parse_meta(row, "papers")?;
        let tags_text: String = row.get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&tags_text).map_err(|err| {
            CollectionRepoError::InvalidData(format!(
                "invalid tags `{tags_text}` in papers.tags: {err}"
            ))
        })?;

        Ok(Paper {
            id: meta.id,
            title: row.get("title")?,
            abstract_text: row.get("abstract")?,
            authors: row.get("authors")?,
            journal: row.get("journal")?,
            publish_date: row.get("publish_date")?,
            pubmed_id: row.get("pubmed_id")?,
            nct_number: row.get("nct_number")?,
            doi: row.get("doi")?,
            tags,
            sort_order: meta.sort_order,
            is_deleted: meta.is_deleted,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    fn apply_patch(&mut self, patch: &PaperPatch) {
        patch.apply_to(self);
    }

    fn requested_order(patch: &PaperPatch) -> Option<i64> {
        patch.order
    }

    // Tags are a JSON array; match elements, not the encoded text.
    fn search_predicate(column: &str) -> String {
        if column == "tags" {
            return "EXISTS (SELECT 1 FROM json_each(papers.tags) WHERE json_each.value LIKE ? ESCAPE '\\')"
                .to_string();
        }
        format!("{column} LIKE ? ESCAPE '\\'")
    }
}

impl OrderedRecord for TeamMember {
    type Patch = TeamMemberPatch;

    const COLLECTION: Collection = Collection::TeamMembers;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "category",
        "role",
        "designation",
        "description",
        "image_url",
        "hyperlink",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "category", "role", "designation"];

    fn validate(&self) -> Result<(), RecordValidationError> {
        TeamMember::validate(self)
    }

    fn column_values(&self) -> CollectionRepoResult<Vec<Value>> {
        Ok(vec![
            text(&self.name),
            text(&self.category),
            text(&self.role),
            text(&self.designation),
            text(&self.description),
            text(&self.image_url),
            text(&self.hyperlink),
        ])
    }

    fn from_row(row: &Row<'_>) -> CollectionRepoResult<Self> {
        let meta = parse_meta(row, "team_members")?;
        Ok(TeamMember {
            id: meta.id,
            name: row.get("name")?,
            category: row.get("category")?,
            role: row.get("role")?,
            designation: row.get("designation")?,
            description: row.get("description")?,
            image_url: row.get("image_url")?,
            hyperlink: row.get("hyperlink")?,
            sort_order: meta.sort_order,
            is_deleted: meta.is_deleted,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    fn apply_patch(&mut self, patch: &TeamMemberPatch) {
        patch.apply_to(self);
    }

    fn requested_order(patch: &TeamMemberPatch) -> Option<i64> {
        patch.order
    }
}

impl OrderedRecord for FeaturePublication {
    type Patch = FeaturePublicationPatch;

    const COLLECTION: Collection = Collection::FeaturePublications;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "abstract",
        "authors",
        "journal",
        "image_url",
        "paper_id",
        "publish_date",
        "pubmed_id",
        "nct_number",
        "doi",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "abstract", "authors", "journal"];

    fn validate(&self) -> Result<(), RecordValidationError> {
        FeaturePublication::validate(self)
    }

    fn column_values(&self) -> CollectionRepoResult<Vec<Value>> {
        Ok(vec![
            text(&self.title),
            text(&self.abstract_text),
            text(&self.authors),
            text(&self.journal),
            optional_text(self.image_url.as_deref()),
            text(&self.paper_id),
            text(&self.publish_date),
            text(&self.pubmed_id),
            text(&self.nct_number),
            text(&self.doi),
        ])
    }

    fn from_row(row: &Row<'_>) -> CollectionRepoResult<Self> {
        let meta = parse_meta(row, "feature_publications")?;
        Ok(FeaturePublication {
            id: meta.id,
            title: row.get("title")?,
            abstract_text: row.get("abstract")?,
            authors: row.get("authors")?,
            journal: row.get("journal")?,
            image_url: row.get("image_url")?,
            paper_id: row.get("paper_id")?,
            publish_date: row.get("publish_date")?,
            pubmed_id: row.get("pubmed_id")?,
            nct_number: row.get("nct_number")?,
            doi: row.get("doi")?,
            sort_order: meta.sort_order,
            is_deleted: meta.is_deleted,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    fn apply_patch(&mut self, patch: &FeaturePublicationPatch) {
        patch.apply_to(self);
    }

    fn requested_order(patch: &FeaturePublicationPatch) -> Option<i64> {
        patch.order
    }
}
