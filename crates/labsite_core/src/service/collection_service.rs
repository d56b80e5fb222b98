//! Collection use-case service.
//!
//! # Responsibility
//! - Validate create/update input above the repository layer.
//! - Translate repository failures into the caller-facing taxonomy:
//!   not found, invalid argument, conflict, internal.
//!
//! # Invariants
//! - A requested order is always `>= 1` before reaching the repository.
//! - Service APIs never bypass repository ordering contracts.

use crate::db::DbError;
use crate::model::job::Job;
use crate::model::news::News;
use crate::model::ordering::{Collection, RecordId};
use crate::model::page::Page;
use crate::model::paper::{FeaturePublication, Paper};
use crate::model::team_member::TeamMember;
use crate::repo::collection_repo::{
    CollectionRepoError, CollectionRepository, ListQuery, OrderedRecord,
    SqliteCollectionRepository,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type JobService<'conn> = CollectionService<Job, SqliteCollectionRepository<'conn, Job>>;
pub type NewsService<'conn> = CollectionService<News, SqliteCollectionRepository<'conn, News>>;
pub type PaperService<'conn> = CollectionService<Paper, SqliteCollectionRepository<'conn, Paper>>;
pub type TeamMemberService<'conn> =
    CollectionService<TeamMember, SqliteCollectionRepository<'conn, TeamMember>>;
pub type FeaturePublicationService<'conn> =
    CollectionService<FeaturePublication, SqliteCollectionRepository<'conn, FeaturePublication>>;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error taxonomy.
#[derive(Debug)]
pub enum ServiceError {
    /// Target record is absent or soft-deleted.
    NotFound {
        collection: Collection,
        id: RecordId,
    },
    /// Input was rejected; the message names the violated rule.
    InvalidArgument(String),
    /// Store failed to commit (lock contention, constraint, I/O). Nothing
    /// was written; the caller may retry the whole request.
    Conflict(CollectionRepoError),
    /// Store is not set up for this build or holds unreadable rows.
    Internal(CollectionRepoError),
}

impl ServiceError {
    /// Returns whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict(CollectionRepoError::Db(err)) => err.is_busy(),
            _ => false,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "{} not found: {id}", collection.item_label())
            }
            Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::Internal(err) => write!(f, "internal store error: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Conflict(err) | Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CollectionRepoError> for ServiceError {
    fn from(value: CollectionRepoError) -> Self {
        match value {
            CollectionRepoError::NotFound { collection, id } => Self::NotFound { collection, id },
            CollectionRepoError::InvalidOrder { .. }
            | CollectionRepoError::Validation(_)
            | CollectionRepoError::UnsupportedFilter { .. } => {
                Self::InvalidArgument(value.to_string())
            }
            CollectionRepoError::Db(DbError::Sqlite(_)) => Self::Conflict(value),
            CollectionRepoError::Db(DbError::UnsupportedSchemaVersion { .. })
            | CollectionRepoError::InvalidData(_)
            | CollectionRepoError::UninitializedConnection { .. }
            | CollectionRepoError::MissingRequiredTable(_)
            | CollectionRepoError::MissingRequiredColumn { .. } => Self::Internal(value),
        }
    }
}

/// Use-case service for one orderable collection.
pub struct CollectionService<T, R> {
    repo: R,
    _record: PhantomData<fn() -> T>,
}

impl<T: OrderedRecord, R: CollectionRepository<T>> CollectionService<T, R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _record: PhantomData,
        }
    }

    /// Creates one record at `order`, or last when `None`.
    pub fn create(&self, record: &T, order: Option<i64>) -> ServiceResult<T> {
        if let Some(order) = order {
            ensure_positive_order(order)?;
        }
        record
            .validate()
            .map_err(|err| ServiceError::InvalidArgument(err.to_string()))?;
        self.repo.create(record, order).map_err(Into::into)
    }

    /// Loads one live record.
    pub fn get(&self, id: RecordId) -> ServiceResult<T> {
        self.repo
            .get(id, false)?
            .ok_or(ServiceError::NotFound {
                collection: T::COLLECTION,
                id,
            })
    }

    /// Lists one page of records in display order.
    pub fn list(&self, query: &ListQuery) -> ServiceResult<Page<T>> {
        self.repo.list(query).map_err(Into::into)
    }

    /// Applies a partial update.
    ///
    /// When the patch carries an order different from the stored one, the
    /// record is moved in the same transaction as the field edits.
    pub fn update(&self, id: RecordId, patch: &T::Patch) -> ServiceResult<T> {
        if let Some(order) = T::requested_order(patch) {
            ensure_positive_order(order)?;
        }
        self.repo.update(id, patch).map_err(Into::into)
    }

    /// Soft-deletes one record.
    pub fn delete(&self, id: RecordId) -> ServiceResult<()> {
        self.repo.soft_delete(id).map_err(Into::into)
    }

    /// Moves one record to `new_order`.
    pub fn reorder(&self, id: RecordId, new_order: i64) -> ServiceResult<()> {
        self.repo.reorder(id, new_order).map_err(Into::into)
    }

    /// Renumbers live records to `1..=N`.
    pub fn compact(&self) -> ServiceResult<usize> {
        self.repo.compact().map_err(Into::into)
    }

    /// Reports whether live records hold exactly `1..=N`.
    pub fn check_dense(&self) -> ServiceResult<bool> {
        self.repo.check_dense().map_err(Into::into)
    }
}

fn ensure_positive_order(order: i64) -> ServiceResult<()> {
    if order < 1 {
        return Err(ServiceError::InvalidArgument(
            "order must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
