//! Request validation with field-keyed error maps.
//!
//! Validation runs before any store access. Each failing field collects one or
//! more human-readable messages; the API layer renders the map as the `errors`
//! member of a problem-details body.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::defaults;
use crate::models::{
    CreateEntryRequest, CreateProjectRequest, CreateTemplateRequest, EntryType,
    UpdateEntryRequest, UpdateProjectRequest, UpdateTemplateRequest,
};

/// Field name → validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for a field, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn check_max_len(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(v) = value {
        if v.chars().count() > max {
            errors.add(
                field,
                format!("{} must not exceed {} characters", label, max),
            );
        }
    }
}

/// True for absolute `http`/`https` URLs.
pub fn is_http_url(value: &str) -> bool {
    match reqwest::Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// True for `#RGB` or `#RRGGBB` hex colors.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn check_tags(errors: &mut ValidationErrors, tags: &[String]) {
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            errors.add("tags", "Tags cannot be empty");
        } else if trimmed.chars().count() > defaults::TAG_NAME_MAX_LEN {
            errors.add(
                "tags",
                format!(
                    "Each tag must not exceed {} characters",
                    defaults::TAG_NAME_MAX_LEN
                ),
            );
        }
    }
}

fn check_entry_fields(
    errors: &mut ValidationErrors,
    title: &str,
    description: Option<&str>,
    entry_type: EntryType,
    content: Option<&str>,
    url: Option<&str>,
    tags: &[String],
) {
    if title.trim().is_empty() {
        errors.add("title", "Title is required");
    }
    check_max_len(
        errors,
        "title",
        "Title",
        Some(title),
        defaults::ENTRY_TITLE_MAX_LEN,
    );
    check_max_len(
        errors,
        "description",
        "Description",
        description,
        defaults::ENTRY_DESCRIPTION_MAX_LEN,
    );

    match entry_type {
        EntryType::Link => {
            if is_blank(url) {
                errors.add("url", "URL is required for Link entries");
            } else if !url.map_or(false, is_http_url) {
                errors.add("url", "URL must be a valid http or https address");
            }
        }
        EntryType::Note | EntryType::Code | EntryType::Task => {
            if is_blank(content) {
                errors.add(
                    "content",
                    format!("Content is required for {} entries", entry_type.display_name()),
                );
            }
        }
    }

    check_tags(errors, tags);
}

/// Validate an entry creation request.
pub fn validate_create_entry(req: &CreateEntryRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if req.project_id.is_nil() {
        errors.add("projectId", "Project is required");
    }
    check_entry_fields(
        &mut errors,
        &req.title,
        req.description.as_deref(),
        req.entry_type,
        req.content.as_deref(),
        req.url.as_deref(),
        &req.tags,
    );
    errors.into_result()
}

/// Validate an entry update request.
pub fn validate_update_entry(req: &UpdateEntryRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_entry_fields(
        &mut errors,
        &req.title,
        req.description.as_deref(),
        req.entry_type,
        req.content.as_deref(),
        req.url.as_deref(),
        &req.tags,
    );
    errors.into_result()
}

fn check_project_fields(
    errors: &mut ValidationErrors,
    name: &str,
    description: Option<&str>,
    color: Option<&str>,
) {
    if name.trim().is_empty() {
        errors.add("name", "Project name is required");
    }
    check_max_len(
        errors,
        "name",
        "Project name",
        Some(name),
        defaults::PROJECT_NAME_MAX_LEN,
    );
    check_max_len(
        errors,
        "description",
        "Description",
        description,
        defaults::PROJECT_DESCRIPTION_MAX_LEN,
    );
    if let Some(color) = color {
        if !is_hex_color(color) {
            errors.add(
                "color",
                "Color must be a valid hex color code (e.g., #3B82F6)",
            );
        }
    }
}

pub fn validate_create_project(req: &CreateProjectRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_project_fields(
        &mut errors,
        &req.name,
        req.description.as_deref(),
        req.color.as_deref(),
    );
    errors.into_result()
}

pub fn validate_update_project(req: &UpdateProjectRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_project_fields(
        &mut errors,
        &req.name,
        req.description.as_deref(),
        req.color.as_deref(),
    );
    errors.into_result()
}

fn check_template_fields(
    errors: &mut ValidationErrors,
    name: &str,
    description: Option<&str>,
    title: Option<&str>,
    tags: &[String],
) {
    if name.trim().is_empty() {
        errors.add("name", "Template name is required");
    }
    check_max_len(
        errors,
        "name",
        "Template name",
        Some(name),
        defaults::TEMPLATE_NAME_MAX_LEN,
    );
    check_max_len(
        errors,
        "description",
        "Description",
        description,
        defaults::TEMPLATE_DESCRIPTION_MAX_LEN,
    );
    check_max_len(
        errors,
        "title",
        "Title",
        title,
        defaults::ENTRY_TITLE_MAX_LEN,
    );
    check_tags(errors, tags);
}

pub fn validate_create_template(req: &CreateTemplateRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_template_fields(
        &mut errors,
        &req.name,
        req.description.as_deref(),
        req.title.as_deref(),
        &req.tags,
    );
    errors.into_result()
}

pub fn validate_update_template(req: &UpdateTemplateRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_template_fields(
        &mut errors,
        &req.name,
        req.description.as_deref(),
        req.title.as_deref(),
        &req.tags,
    );
    errors.into_result()
}
