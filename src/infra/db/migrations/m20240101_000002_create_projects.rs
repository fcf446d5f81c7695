//! Migration: projects with their images and documents.

use sea_orm_migration::prelude::*;

use super::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Projects::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Projects::Description).text().not_null())
                    .col(ColumnDef::new(Projects::Category).string_len(20).not_null())
                    .col(ColumnDef::new(Projects::ProponentId).uuid().not_null())
                    .col(ColumnDef::new(Projects::Location).string_len(200).not_null())
                    .col(ColumnDef::new(Projects::Latitude).decimal_len(9, 6).null())
                    .col(ColumnDef::new(Projects::Longitude).decimal_len(9, 6).null())
                    .col(
                        ColumnDef::new(Projects::EstimatedCredits)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Projects::EstimatedCredits).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Projects::CurrentCredits)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Projects::CurrentCredits).gte(0)),
                    )
                    .col(ColumnDef::new(Projects::StartDate).date().not_null())
                    .col(ColumnDef::new(Projects::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Projects::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Projects::TotalCost).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Projects::FundingReceived)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Projects::VerifierId).uuid().null())
                    .col(
                        ColumnDef::new(Projects::VerificationDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_proponent")
                            .from(Projects::Table, Projects::ProponentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_verifier")
                            .from(Projects::Table, Projects::VerifierId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_proponent_id")
                    .table(Projects::Table)
                    .col(Projects::ProponentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_status")
                    .table(Projects::Table)
                    .col(Projects::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectImages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectImages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ProjectImages::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectImages::Image).string_len(100).not_null())
                    .col(
                        ColumnDef::new(ProjectImages::Caption)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ProjectImages::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ProjectImages::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_images_project")
                            .from(ProjectImages::Table, ProjectImages::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectDocuments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectDocuments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ProjectDocuments::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectDocuments::Title).string_len(200).not_null())
                    .col(ColumnDef::new(ProjectDocuments::Document).string_len(100).not_null())
                    .col(ColumnDef::new(ProjectDocuments::DocumentType).string_len(50).not_null())
                    .col(
                        ColumnDef::new(ProjectDocuments::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_documents_project")
                            .from(ProjectDocuments::Table, ProjectDocuments::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectImages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Title,
    Description,
    Category,
    ProponentId,
    Location,
    Latitude,
    Longitude,
    EstimatedCredits,
    CurrentCredits,
    StartDate,
    EndDate,
    Status,
    TotalCost,
    FundingReceived,
    VerifierId,
    VerificationDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProjectImages {
    Table,
    Id,
    ProjectId,
    Image,
    Caption,
    IsPrimary,
    UploadedAt,
}

#[derive(DeriveIden)]
enum ProjectDocuments {
    Table,
    Id,
    ProjectId,
    Title,
    Document,
    DocumentType,
    UploadedAt,
}
