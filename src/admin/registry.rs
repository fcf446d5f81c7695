//! Listing configuration for every administered table.
//!
//! Field names follow the lookup convention used throughout: a plain name
//! is a column, a relation name stands for its foreign-key column, and
//! `relation__field` follows foreign keys (`wallet__user__username`).

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    EvidenceStatus, EvidenceType, ProjectCategory, ProjectStatus, TransactionStatus,
    TransactionType, UserRole,
};

/// How a filter parameter is parsed and matched
#[derive(Debug, Clone, Copy)]
pub enum FilterKind {
    /// One of a fixed set of stored values
    Choice(fn() -> Vec<&'static str>),
    Boolean,
    /// `YYYY-MM-DD`, matching the whole UTC day
    Date,
    /// Exact text match
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct ListFilter {
    pub field: &'static str,
    pub kind: FilterKind,
}

/// Foreign key from one administered table to another
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub column: &'static str,
    pub target: &'static str,
}

/// Listing configuration of one table
#[derive(Debug, Clone, Copy)]
pub struct ModelAdmin {
    /// URL slug, e.g. `credit_holdings`
    pub name: &'static str,
    pub label: &'static str,
    pub table: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [ListFilter],
    pub search_fields: &'static [&'static str],
    /// Default ordering; `-` prefix sorts descending
    pub ordering: &'static [&'static str],
    pub relations: &'static [Relation],
}

impl ModelAdmin {
    pub fn relation(&self, name: &str) -> Option<&'static Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn filter(&self, field: &str) -> Option<&'static ListFilter> {
        self.list_filter.iter().find(|f| f.field == field)
    }

    /// Column behind a display or ordering field
    pub fn column(&self, field: &str) -> &'static str {
        match self.relation(field) {
            Some(relation) => relation.column,
            None => self
                .list_display
                .iter()
                .chain(self.ordering)
                .copied()
                .chain(self.list_filter.iter().map(|f| f.field))
                .map(|f| f.trim_start_matches('-'))
                .find(|f| *f == field)
                .unwrap_or("id"),
        }
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name,
            label: self.label,
            list_display: self.list_display.to_vec(),
            list_filter: self.list_filter.iter().map(|f| f.field).collect(),
            search_fields: self.search_fields.to_vec(),
            ordering: self.ordering.to_vec(),
        }
    }
}

/// Public description of an administered table
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModelSummary {
    #[schema(example = "projects")]
    pub name: &'static str,
    #[schema(example = "Projects")]
    pub label: &'static str,
    pub list_display: Vec<&'static str>,
    pub list_filter: Vec<&'static str>,
    pub search_fields: Vec<&'static str>,
    pub ordering: Vec<&'static str>,
}

fn user_roles() -> Vec<&'static str> {
    UserRole::ALL.iter().map(UserRole::as_str).collect()
}

fn project_statuses() -> Vec<&'static str> {
    ProjectStatus::ALL.iter().map(ProjectStatus::as_str).collect()
}

fn project_categories() -> Vec<&'static str> {
    ProjectCategory::ALL.iter().map(ProjectCategory::as_str).collect()
}

fn transaction_types() -> Vec<&'static str> {
    TransactionType::ALL.iter().map(TransactionType::as_str).collect()
}

fn transaction_statuses() -> Vec<&'static str> {
    TransactionStatus::ALL.iter().map(TransactionStatus::as_str).collect()
}

fn evidence_types() -> Vec<&'static str> {
    EvidenceType::ALL.iter().map(EvidenceType::as_str).collect()
}

fn evidence_statuses() -> Vec<&'static str> {
    EvidenceStatus::ALL.iter().map(EvidenceStatus::as_str).collect()
}

const fn filter(field: &'static str, kind: FilterKind) -> ListFilter {
    ListFilter { field, kind }
}

const fn relation(name: &'static str, column: &'static str, target: &'static str) -> Relation {
    Relation {
        name,
        column,
        target,
    }
}

pub static MODELS: &[ModelAdmin] = &[
    ModelAdmin {
        name: "users",
        label: "Users",
        table: "users",
        list_display: &[
            "username",
            "email",
            "role",
            "is_project_proponent",
            "has_completed_kyc",
            "is_active",
        ],
        list_filter: &[
            filter("role", FilterKind::Choice(user_roles)),
            filter("is_project_proponent", FilterKind::Boolean),
            filter("has_completed_kyc", FilterKind::Boolean),
            filter("is_active", FilterKind::Boolean),
        ],
        search_fields: &["username", "email", "first_name", "last_name"],
        ordering: &["-created_at"],
        relations: &[],
    },
    ModelAdmin {
        name: "projects",
        label: "Projects",
        table: "projects",
        list_display: &[
            "title",
            "proponent",
            "category",
            "status",
            "estimated_credits",
            "current_credits",
            "created_at",
        ],
        list_filter: &[
            filter("status", FilterKind::Choice(project_statuses)),
            filter("category", FilterKind::Choice(project_categories)),
            filter("created_at", FilterKind::Date),
        ],
        search_fields: &[
            "title",
            "description",
            "proponent__username",
            "proponent__email",
        ],
        ordering: &["-created_at"],
        relations: &[
            relation("proponent", "proponent_id", "users"),
            relation("verifier", "verifier_id", "users"),
        ],
    },
    ModelAdmin {
        name: "project_images",
        label: "Project images",
        table: "project_images",
        list_display: &["project", "caption", "is_primary", "uploaded_at"],
        list_filter: &[
            filter("is_primary", FilterKind::Boolean),
            filter("uploaded_at", FilterKind::Date),
        ],
        search_fields: &["project__title", "caption"],
        ordering: &["-uploaded_at"],
        relations: &[relation("project", "project_id", "projects")],
    },
    ModelAdmin {
        name: "project_documents",
        label: "Project documents",
        table: "project_documents",
        list_display: &["title", "project", "document_type", "uploaded_at"],
        list_filter: &[
            filter("document_type", FilterKind::Text),
            filter("uploaded_at", FilterKind::Date),
        ],
        search_fields: &["title", "project__title"],
        ordering: &["-uploaded_at"],
        relations: &[relation("project", "project_id", "projects")],
    },
    ModelAdmin {
        name: "transactions",
        label: "Transactions",
        table: "transactions",
        list_display: &[
            "transaction_id",
            "transaction_type",
            "buyer",
            "seller",
            "credit_amount",
            "total_amount",
            "status",
            "transaction_date",
        ],
        list_filter: &[
            filter("transaction_type", FilterKind::Choice(transaction_types)),
            filter("status", FilterKind::Choice(transaction_statuses)),
            filter("transaction_date", FilterKind::Date),
        ],
        search_fields: &[
            "transaction_id",
            "buyer__username",
            "seller__username",
            "project__title",
        ],
        ordering: &["-transaction_date"],
        relations: &[
            relation("buyer", "buyer_id", "users"),
            relation("seller", "seller_id", "users"),
            relation("project", "project_id", "projects"),
        ],
    },
    ModelAdmin {
        name: "credit_wallets",
        label: "Credit wallets",
        table: "credit_wallets",
        list_display: &[
            "user",
            "total_credits",
            "available_credits",
            "retired_credits",
            "total_invested",
            "total_earned",
        ],
        list_filter: &[],
        search_fields: &["user__username", "user__email"],
        ordering: &["-created_at"],
        relations: &[relation("user", "user_id", "users")],
    },
    ModelAdmin {
        name: "credit_holdings",
        label: "Credit holdings",
        table: "credit_holdings",
        list_display: &[
            "wallet",
            "project",
            "credit_amount",
            "purchase_price",
            "purchase_date",
        ],
        list_filter: &[filter("purchase_date", FilterKind::Date)],
        search_fields: &["wallet__user__username", "project__title"],
        ordering: &["-purchase_date"],
        relations: &[
            relation("wallet", "wallet_id", "credit_wallets"),
            relation("project", "project_id", "projects"),
        ],
    },
    ModelAdmin {
        name: "evidence",
        label: "Evidence",
        table: "evidence",
        list_display: &[
            "title",
            "project",
            "evidence_type",
            "status",
            "submitted_by",
            "submitted_at",
        ],
        list_filter: &[
            filter("evidence_type", FilterKind::Choice(evidence_types)),
            filter("status", FilterKind::Choice(evidence_statuses)),
            filter("submitted_at", FilterKind::Date),
        ],
        search_fields: &[
            "title",
            "description",
            "project__title",
            "submitted_by__username",
        ],
        ordering: &["-submitted_at"],
        relations: &[
            relation("project", "project_id", "projects"),
            relation("submitted_by", "submitted_by", "users"),
            relation("reviewed_by", "reviewed_by", "users"),
        ],
    },
    ModelAdmin {
        name: "evidence_comments",
        label: "Evidence comments",
        table: "evidence_comments",
        list_display: &["evidence", "author", "is_internal", "created_at"],
        list_filter: &[
            filter("is_internal", FilterKind::Boolean),
            filter("created_at", FilterKind::Date),
        ],
        search_fields: &["evidence__title", "author__username", "comment"],
        ordering: &["created_at"],
        relations: &[
            relation("evidence", "evidence_id", "evidence"),
            relation("author", "author_id", "users"),
        ],
    },
    ModelAdmin {
        name: "evidence_revisions",
        label: "Evidence revisions",
        table: "evidence_revisions",
        list_display: &["evidence", "revision_number", "requested_by", "created_at"],
        list_filter: &[filter("created_at", FilterKind::Date)],
        search_fields: &[
            "evidence__title",
            "changes_description",
            "requested_by__username",
        ],
        ordering: &["-revision_number"],
        relations: &[
            relation("evidence", "evidence_id", "evidence"),
            relation("requested_by", "requested_by", "users"),
        ],
    },
];

/// Registered model by slug
pub fn find(name: &str) -> Option<&'static ModelAdmin> {
    MODELS.iter().find(|m| m.name == name)
}

/// Registered model by table name
pub fn for_table(table: &str) -> Option<&'static ModelAdmin> {
    MODELS.iter().find(|m| m.table == table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_relation_targets_a_registered_table() {
        for model in MODELS {
            for relation in model.relations {
                assert!(
                    for_table(relation.target).is_some(),
                    "{}.{} -> {}",
                    model.name,
                    relation.name,
                    relation.target
                );
            }
        }
    }

    #[test]
    fn test_search_paths_resolve() {
        for model in MODELS {
            for path in model.search_fields {
                let mut current = model;
                let mut parts: Vec<&str> = path.split("__").collect();
                parts.pop();
                for hop in parts {
                    let relation = current
                        .relation(hop)
                        .unwrap_or_else(|| panic!("{}: unknown relation {}", model.name, hop));
                    current = for_table(relation.target).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_relation_fields_map_to_fk_columns() {
        let projects = find("projects").unwrap();
        assert_eq!(projects.column("proponent"), "proponent_id");
        assert_eq!(projects.column("title"), "title");
        assert_eq!(projects.column("created_at"), "created_at");
    }

    #[test]
    fn test_choice_filters_list_stored_values() {
        let users = find("users").unwrap();
        match users.filter("role").unwrap().kind {
            FilterKind::Choice(values) => {
                assert!(values().contains(&"verifier"));
                assert_eq!(values().len(), UserRole::ALL.len());
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_slugs_are_unique() {
        let mut names: Vec<_> = MODELS.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MODELS.len());
    }
}
