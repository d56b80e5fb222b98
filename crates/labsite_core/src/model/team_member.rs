//! Team member profile model.

use crate::model::ordering::{Orderable, RecordId};
use crate::model::validation::{check_url, require_text, RecordValidationError};
use serde::{Deserialize, Serialize};

/// Team member profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: RecordId,
    pub name: String,
    /// Grouping on the team page (`faculty`, `students`, `alumni`, ...).
    pub category: String,
    pub role: String,
    pub designation: String,
    pub description: String,
    pub image_url: String,
    pub hyperlink: String,
    pub sort_order: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TeamMember {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        role: impl Into<String>,
        designation: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category: category.into(),
            role: role.into(),
            designation: designation.into(),
            description: String::new(),
            image_url: String::new(),
            hyperlink: String::new(),
            sort_order: 0,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_text("role", &self.role)?;
        require_text("designation", &self.designation)?;
        check_url("image_url", &self.image_url)?;
        check_url("hyperlink", &self.hyperlink)?;
        Ok(())
    }
}

impl Orderable for TeamMember {
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

/// Partial update of a team member profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub role: Option<String>,
    pub designation: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub hyperlink: Option<String>,
    pub order: Option<i64>,
}

impl TeamMemberPatch {
    pub fn apply_to(&self, member: &mut TeamMember) {
        let fields = [
            (&self.name, &mut member.name),
            (&self.category, &mut member.category),
            (&self.role, &mut member.role),
            (&self.designation, &mut member.designation),
            (&self.description, &mut member.description),
            (&self.image_url, &mut member.image_url),
            (&self.hyperlink, &mut member.hyperlink),
        ];
        for (patch, target) in fields {
            if let Some(value) = patch {
                *target = value.clone();
            }
        }
    }
}
