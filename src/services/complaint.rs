use crate::config::complaints::{is_known_priority, ComplaintConfig};
use crate::error::{AppError, AppResult};
use crate::models::{complaint, Complaint, ComplaintModel};
use crate::response::PageMeta;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

/// Raw intake payload as posted by the submission form.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SubmitComplaint {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Details must be at most 5000 characters"))]
    pub details: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[validate(length(max = 100, message = "Student name must be at most 100 characters"))]
    pub student_name: Option<String>,
    #[validate(length(max = 50, message = "Student ID must be at most 50 characters"))]
    pub student_id: Option<String>,
    #[validate(length(max = 255, message = "Student email must be at most 255 characters"))]
    pub student_email: Option<String>,
    pub priority: Option<String>,
}

/// A submission that passed validation, with identity fields already
/// cleared for anonymous complaints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintDraft {
    pub category: String,
    pub title: String,
    pub details: String,
    pub priority: Option<String>,
    pub identity: Option<StudentIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub name: String,
    pub id: String,
    pub email: String,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks a submission without touching the store. Every failing field is
/// reported at once.
pub fn validate_submission(
    input: &SubmitComplaint,
    config: &ComplaintConfig,
) -> AppResult<ComplaintDraft> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();

    if let Err(errors) = input.validate() {
        for (field, errs) in errors.field_errors() {
            if let Some(err) = errs.first() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {field}"));
                fields.insert(field.to_string(), message);
            }
        }
    }

    let category = input.category.trim();
    if !config.is_known_category(category) {
        fields.insert("category".into(), "Please select a category".into());
    }

    let title = input.title.trim();
    if title.is_empty() {
        fields.insert("title".into(), "Please enter a title".into());
    }

    let details = input.details.trim();
    if details.is_empty() {
        fields.insert(
            "details".into(),
            "Please provide details about your complaint".into(),
        );
    }

    let priority = non_empty(&input.priority);
    if let Some(p) = &priority {
        if !is_known_priority(p) {
            fields.insert("priority".into(), "Please select a valid priority".into());
        }
    }

    let identity = if input.is_anonymous {
        None
    } else {
        let name = non_empty(&input.student_name);
        let id = non_empty(&input.student_id);
        let email = non_empty(&input.student_email);

        if name.is_none() {
            fields.insert(
                "student_name".into(),
                "Student name is required for non-anonymous complaints".into(),
            );
        }
        if id.is_none() {
            fields.insert(
                "student_id".into(),
                "Student ID is required for non-anonymous complaints".into(),
            );
        }
        match &email {
            None => {
                fields.insert(
                    "student_email".into(),
                    "Student email is required for non-anonymous complaints".into(),
                );
            }
            Some(e) if !e.validate_email() => {
                fields.insert(
                    "student_email".into(),
                    "Please enter a valid email address".into(),
                );
            }
            Some(_) => {}
        }

        match (name, id, email) {
            (Some(name), Some(id), Some(email)) => Some(StudentIdentity { name, id, email }),
            _ => None,
        }
    };

    if !fields.is_empty() {
        return Err(AppError::FieldValidation(fields));
    }

    Ok(ComplaintDraft {
        category: category.to_string(),
        title: title.to_string(),
        details: details.to_string(),
        priority,
        identity,
    })
}

/// Category selector for listings and exports. `all` (any case) or a
/// blank value selects everything; anything else matches exactly, padding
/// included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => CategoryFilter::All,
            Some(v) if v.trim().is_empty() || v.trim().eq_ignore_ascii_case("all") => {
                CategoryFilter::All
            }
            Some(v) => CategoryFilter::Only(v.to_string()),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(label) => Some(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
    pub category: CategoryFilter,
}

impl PageRequest {
    /// Pages are 1-based; 0 or a missing page means the first one.
    pub fn new(page: Option<u64>, per_page: u64, category: CategoryFilter) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.max(1),
            category,
        }
    }

    /// Rows to skip before this page, or `None` when that does not fit in
    /// a `u64` (such a page is necessarily past the end).
    pub fn offset(&self) -> Option<u64> {
        (self.page - 1).checked_mul(self.per_page)
    }
}

pub struct ComplaintService {
    db: DatabaseConnection,
}

impl ComplaintService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, draft: ComplaintDraft) -> AppResult<ComplaintModel> {
        let now = chrono::Utc::now().naive_utc();
        let is_anonymous = draft.identity.is_none();
        let (student_name, student_id, student_email) = match draft.identity {
            Some(identity) => (Some(identity.name), Some(identity.id), Some(identity.email)),
            None => (None, None, None),
        };

        let new_complaint = complaint::ActiveModel {
            id: sea_orm::ActiveValue::Set(Uuid::new_v4()),
            category: sea_orm::ActiveValue::Set(draft.category),
            title: sea_orm::ActiveValue::Set(draft.title),
            details: sea_orm::ActiveValue::Set(draft.details),
            priority: sea_orm::ActiveValue::Set(draft.priority),
            is_anonymous: sea_orm::ActiveValue::Set(is_anonymous),
            student_name: sea_orm::ActiveValue::Set(student_name),
            student_email: sea_orm::ActiveValue::Set(student_email),
            student_id: sea_orm::ActiveValue::Set(student_id),
            created_at: sea_orm::ActiveValue::Set(now),
        };

        let complaint = new_complaint.insert(&self.db).await?;
        tracing::info!(
            complaint_id = %complaint.id,
            category = %complaint.category,
            anonymous = complaint.is_anonymous,
            "Complaint submitted"
        );
        Ok(complaint)
    }

    fn filtered(filter: &CategoryFilter) -> Select<Complaint> {
        let query = Complaint::find();
        let query = match filter {
            CategoryFilter::All => query,
            CategoryFilter::Only(label) => {
                query.filter(complaint::Column::Category.eq(label.as_str()))
            }
        };
        query
            .order_by_desc(complaint::Column::CreatedAt)
            .order_by_desc(complaint::Column::Id)
    }

    /// One page of complaints, newest first, with the totals of the
    /// filtered set. A page past the end comes back empty.
    pub async fn fetch_page(&self, req: &PageRequest) -> AppResult<(Vec<ComplaintModel>, PageMeta)> {
        let paginator = Self::filtered(&req.category).paginate(&self.db, req.per_page);

        let total = paginator.num_items().await?;
        let complaints = match req.offset() {
            Some(offset) if offset < total => paginator.fetch_page(req.page - 1).await?,
            _ => Vec::new(),
        };

        Ok((complaints, PageMeta::new(total, req.page, req.per_page)))
    }

    pub async fn list_all(&self, filter: &CategoryFilter) -> AppResult<Vec<ComplaintModel>> {
        let complaints = Self::filtered(filter).all(&self.db).await?;
        Ok(complaints)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<ComplaintModel> {
        Complaint::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}
