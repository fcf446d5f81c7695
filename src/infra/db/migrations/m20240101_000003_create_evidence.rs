//! Migration: evidence with comments and revisions.

use sea_orm_migration::prelude::*;

use super::{Projects, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Evidence::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Evidence::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Evidence::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Evidence::Description).text().not_null())
                    .col(ColumnDef::new(Evidence::EvidenceType).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Evidence::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Evidence::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Evidence::SubmittedBy).uuid().not_null())
                    .col(ColumnDef::new(Evidence::ReviewedBy).uuid().null())
                    .col(ColumnDef::new(Evidence::DocumentFile).string_len(100).null())
                    .col(ColumnDef::new(Evidence::ImageFile).string_len(100).null())
                    .col(ColumnDef::new(Evidence::VideoFile).string_len(100).null())
                    .col(ColumnDef::new(Evidence::FileSize).big_integer().null())
                    .col(
                        ColumnDef::new(Evidence::MimeType)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Evidence::Latitude).decimal_len(9, 6).null())
                    .col(ColumnDef::new(Evidence::Longitude).decimal_len(9, 6).null())
                    .col(ColumnDef::new(Evidence::LocationAccuracy).decimal_len(6, 2).null())
                    .col(ColumnDef::new(Evidence::ReviewNotes).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Evidence::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Evidence::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Evidence::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_project")
                            .from(Evidence::Table, Evidence::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_submitted_by")
                            .from(Evidence::Table, Evidence::SubmittedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_reviewed_by")
                            .from(Evidence::Table, Evidence::ReviewedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_evidence_project_status")
                    .table(Evidence::Table)
                    .col(Evidence::ProjectId)
                    .col(Evidence::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EvidenceComments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EvidenceComments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(EvidenceComments::EvidenceId).uuid().not_null())
                    .col(ColumnDef::new(EvidenceComments::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(EvidenceComments::Comment).text().not_null())
                    .col(
                        ColumnDef::new(EvidenceComments::IsInternal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EvidenceComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EvidenceComments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_comments_evidence")
                            .from(EvidenceComments::Table, EvidenceComments::EvidenceId)
                            .to(Evidence::Table, Evidence::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_comments_author")
                            .from(EvidenceComments::Table, EvidenceComments::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EvidenceRevisions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EvidenceRevisions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(EvidenceRevisions::EvidenceId).uuid().not_null())
                    .col(
                        ColumnDef::new(EvidenceRevisions::RevisionNumber)
                            .integer()
                            .not_null()
                            .check(Expr::col(EvidenceRevisions::RevisionNumber).gte(1)),
                    )
                    .col(ColumnDef::new(EvidenceRevisions::ChangesDescription).text().not_null())
                    .col(ColumnDef::new(EvidenceRevisions::OldFile).string_len(100).null())
                    .col(ColumnDef::new(EvidenceRevisions::NewFile).string_len(100).not_null())
                    .col(ColumnDef::new(EvidenceRevisions::RequestedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(EvidenceRevisions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_revisions_evidence")
                            .from(EvidenceRevisions::Table, EvidenceRevisions::EvidenceId)
                            .to(Evidence::Table, Evidence::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_revisions_requested_by")
                            .from(EvidenceRevisions::Table, EvidenceRevisions::RequestedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_evidence_revisions_evidence_number")
                    .table(EvidenceRevisions::Table)
                    .col(EvidenceRevisions::EvidenceId)
                    .col(EvidenceRevisions::RevisionNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EvidenceRevisions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EvidenceComments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Evidence::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Evidence {
    Table,
    Id,
    Title,
    Description,
    EvidenceType,
    Status,
    ProjectId,
    SubmittedBy,
    ReviewedBy,
    DocumentFile,
    ImageFile,
    VideoFile,
    FileSize,
    MimeType,
    Latitude,
    Longitude,
    LocationAccuracy,
    ReviewNotes,
    ReviewedAt,
    SubmittedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EvidenceComments {
    Table,
    Id,
    EvidenceId,
    AuthorId,
    Comment,
    IsInternal,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EvidenceRevisions {
    Table,
    Id,
    EvidenceId,
    RevisionNumber,
    ChangesDescription,
    OldFile,
    NewFile,
    RequestedBy,
    CreatedAt,
}
