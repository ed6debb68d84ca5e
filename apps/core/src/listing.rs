//! Client-side search and pagination over loaded record lists.

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{Appointment, Doctor, HealthMetric, Medication, Prescription, Report};

/// Records that can be matched against a free-text query.
pub trait Searchable {
    /// Text fields the query is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match on any field. `needle` must
    /// already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Keep the items matching `query`. A blank query keeps everything.
pub fn filter_by_search<T: Searchable>(items: Vec<T>, query: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items.into_iter().filter(|item| item.matches(&needle)).collect()
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, after clamping.
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice out page `page` (1-based). Out of range pages are clamped, and an
/// empty list still has one (empty) page.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> AppResult<Page<T>> {
    if per_page == 0 {
        return Err(AppError::Validation(
            "per_page must be at least 1".to_string(),
        ));
    }

    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;

    let items = items.into_iter().skip(start).take(per_page).collect();

    Ok(Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    })
}

impl Searchable for Doctor {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.specialty.as_str()];
        fields.extend(self.hospital.as_deref());
        fields
    }
}

impl Searchable for Medication {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.dosage.as_str(), self.frequency.as_str()];
        fields.extend(self.instructions.as_deref());
        fields
    }
}

impl Searchable for Prescription {
    fn search_fields(&self) -> Vec<&str> {
        self.diagnosis
            .as_deref()
            .into_iter()
            .chain(self.notes.as_deref())
            .collect()
    }
}

impl Searchable for Report {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.report_type.as_str()];
        fields.extend(self.lab_name.as_deref());
        fields.extend(self.findings.as_deref());
        fields
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.status.label()];
        fields.extend(self.location.as_deref());
        fields
    }
}

impl Searchable for HealthMetric {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.metric_type.label(), self.unit.as_str()];
        fields.extend(self.notes.as_deref());
        fields
    }
}
