//! Project listings and their attachments.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::choices::choice_enum;
use super::media::StoredFile;
use super::money::ensure_money;
use crate::config::AMOUNT_MAX_DIGITS;
use crate::errors::{AppError, AppResult};

choice_enum! {
    /// Project lifecycle status
    ProjectStatus("project status") {
        Draft => ("draft", "Draft"),
        Submitted => ("submitted", "Submitted"),
        UnderReview => ("under_review", "Under Review"),
        Approved => ("approved", "Approved"),
        Rejected => ("rejected", "Rejected"),
        Active => ("active", "Active"),
        Completed => ("completed", "Completed"),
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Draft
    }
}

impl ProjectStatus {
    /// Statuses reachable from this one
    pub fn next_statuses(&self) -> &'static [ProjectStatus] {
        use ProjectStatus::*;
        match self {
            Draft => &[Submitted],
            Submitted => &[UnderReview],
            UnderReview => &[Approved, Rejected],
            Approved => &[Active],
            Active => &[Completed],
            Rejected | Completed => &[],
        }
    }

    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Moves made by the project's proponent; everything else is a reviewer's call
    pub fn is_proponent_move(next: ProjectStatus) -> bool {
        matches!(next, ProjectStatus::Submitted)
    }

    /// Details may only be edited before review starts
    pub fn is_editable(&self) -> bool {
        matches!(self, ProjectStatus::Draft | ProjectStatus::Submitted)
    }
}

choice_enum! {
    /// Project category
    ProjectCategory("project category") {
        Reforestation => ("reforestation", "Reforestation"),
        RenewableEnergy => ("renewable_energy", "Renewable Energy"),
        EnergyEfficiency => ("energy_efficiency", "Energy Efficiency"),
        WasteManagement => ("waste_management", "Waste Management"),
        Agriculture => ("agriculture", "Agriculture"),
        Other => ("other", "Other"),
    }
}

/// Carbon project listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub proponent_id: Uuid,
    pub location: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub estimated_credits: i64,
    pub current_credits: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    pub total_cost: Decimal,
    pub funding_received: Decimal,
    pub verifier_id: Option<Uuid>,
    pub verification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Share of estimated credits already issued, as a whole percentage in 0..=100.
    /// Zero when nothing is estimated.
    pub fn progress_percentage(&self) -> u8 {
        progress_percentage(self.current_credits, self.estimated_credits)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.proponent_id == user_id
    }

    /// Credits that may still be issued
    pub fn remaining_credits(&self) -> i64 {
        (self.estimated_credits - self.current_credits).max(0)
    }

    /// Move to the next lifecycle status.
    ///
    /// Approval and rejection stamp the verifier and verification date.
    pub fn transition_to(
        &mut self,
        next: ProjectStatus,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::invalid_transition("project", self.status, next));
        }

        match next {
            ProjectStatus::UnderReview => {
                self.verifier_id.get_or_insert(actor);
            }
            ProjectStatus::Approved | ProjectStatus::Rejected => {
                self.verifier_id = Some(actor);
                self.verification_date = Some(now);
            }
            _ => {}
        }

        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Issue verified credits against the estimate.
    pub fn issue_credits(&mut self, amount: i64) -> AppResult<()> {
        if amount <= 0 {
            return Err(AppError::validation("Credit amount must be positive"));
        }
        if !matches!(self.status, ProjectStatus::Approved | ProjectStatus::Active) {
            return Err(AppError::validation(
                "Credits can only be issued for approved or active projects",
            ));
        }
        let current = self
            .current_credits
            .checked_add(amount)
            .ok_or_else(|| AppError::validation("Credit amount is too large"))?;
        validate_credits(self.estimated_credits, current)?;

        self.current_credits = current;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply a change set, re-checking the credit and date invariants.
    pub fn apply(&mut self, changes: ProjectChanges) -> AppResult<()> {
        let estimated = changes.estimated_credits.unwrap_or(self.estimated_credits);
        validate_credits(estimated, self.current_credits)?;
        validate_dates(
            changes.start_date.unwrap_or(self.start_date),
            changes.end_date.unwrap_or(self.end_date),
        )?;
        if let Some(total_cost) = changes.total_cost {
            ensure_money("Total cost", total_cost, AMOUNT_MAX_DIGITS)?;
        }
        if let Some(funding) = changes.funding_received {
            ensure_money("Funding received", funding, AMOUNT_MAX_DIGITS)?;
        }

        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(location) = changes.location {
            self.location = location;
        }
        if changes.latitude.is_some() {
            self.latitude = changes.latitude;
        }
        if changes.longitude.is_some() {
            self.longitude = changes.longitude;
        }
        self.estimated_credits = estimated;
        if let Some(start) = changes.start_date {
            self.start_date = start;
        }
        if let Some(end) = changes.end_date {
            self.end_date = end;
        }
        if let Some(total_cost) = changes.total_cost {
            self.total_cost = total_cost;
        }
        if let Some(funding) = changes.funding_received {
            self.funding_received = funding;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Whole percentage of `current` over `estimated`, clamped to 0..=100.
pub fn progress_percentage(current: i64, estimated: i64) -> u8 {
    if estimated <= 0 {
        return 0;
    }
    let pct = i128::from(current) * 100 / i128::from(estimated);
    pct.clamp(0, 100) as u8
}

/// Credits are non-negative and never exceed the estimate
pub fn validate_credits(estimated: i64, current: i64) -> AppResult<()> {
    if estimated < 0 || current < 0 {
        return Err(AppError::validation("Credit counts cannot be negative"));
    }
    if current > estimated {
        return Err(AppError::validation(format!(
            "Current credits ({}) cannot exceed estimated credits ({})",
            current, estimated
        )));
    }
    Ok(())
}

pub fn validate_dates(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::validation("End date cannot be before start date"));
    }
    Ok(())
}

/// Data required to create a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub proponent_id: Uuid,
    pub location: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub estimated_credits: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: Decimal,
    pub funding_received: Decimal,
}

impl NewProject {
    pub fn validate(&self) -> AppResult<()> {
        validate_credits(self.estimated_credits, 0)?;
        validate_dates(self.start_date, self.end_date)?;
        ensure_money("Total cost", self.total_cost, AMOUNT_MAX_DIGITS)?;
        ensure_money("Funding received", self.funding_received, AMOUNT_MAX_DIGITS)
    }
}

/// Editable project fields
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProjectCategory>,
    pub location: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub estimated_credits: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_cost: Option<Decimal>,
    pub funding_received: Option<Decimal>,
}

/// Image attached to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectImage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub image: StoredFile,
    pub caption: String,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

/// Document attached to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub document: StoredFile,
    /// PDF, DOC, XLS, ...
    pub document_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Project response with derived progress
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    #[schema(example = "Mangrove restoration, Sundarbans")]
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub proponent_id: Uuid,
    pub location: String,
    #[schema(value_type = Option<String>, example = "21.949700")]
    pub latitude: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "89.183300")]
    pub longitude: Option<Decimal>,
    pub estimated_credits: i64,
    pub current_credits: i64,
    #[schema(example = 40)]
    pub progress_percentage: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    #[schema(value_type = String, example = "250000.00")]
    pub total_cost: Decimal,
    #[schema(value_type = String, example = "10000.00")]
    pub funding_received: Decimal,
    pub verifier_id: Option<Uuid>,
    pub verification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            progress_percentage: project.progress_percentage(),
            id: project.id,
            title: project.title,
            description: project.description,
            category: project.category,
            proponent_id: project.proponent_id,
            location: project.location,
            latitude: project.latitude,
            longitude: project.longitude,
            estimated_credits: project.estimated_credits,
            current_credits: project.current_credits,
            start_date: project.start_date,
            end_date: project.end_date,
            status: project.status,
            total_cost: project.total_cost,
            funding_received: project.funding_received,
            verifier_id: project.verifier_id,
            verification_date: project.verification_date,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}
