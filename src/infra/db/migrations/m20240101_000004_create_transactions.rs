//! Migration: transactions, credit wallets and holdings.

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
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transactions::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Transactions::TransactionId)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Transactions::TransactionType).string_len(20).not_null())
                    .col(ColumnDef::new(Transactions::BuyerId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::SellerId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::ProjectId).uuid().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreditAmount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transactions::CreditAmount).gte(1)),
                    )
                    .col(ColumnDef::new(Transactions::PricePerCredit).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Transactions::TotalAmount).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Transactions::TransactionDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Transactions::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Transactions::Notes).text().not_null().default(""))
                    .col(ColumnDef::new(Transactions::BlockchainTxHash).string_len(128).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_buyer")
                            .from(Transactions::Table, Transactions::BuyerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_seller")
                            .from(Transactions::Table, Transactions::SellerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_project")
                            .from(Transactions::Table, Transactions::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_transaction_date")
                    .table(Transactions::Table)
                    .col(Transactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CreditWallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CreditWallets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CreditWallets::UserId).uuid().not_null().unique_key())
                    .col(
                        ColumnDef::new(CreditWallets::TotalCredits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditWallets::AvailableCredits)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(CreditWallets::AvailableCredits).gte(0)),
                    )
                    .col(
                        ColumnDef::new(CreditWallets::RetiredCredits)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(CreditWallets::RetiredCredits).gte(0)),
                    )
                    .col(
                        ColumnDef::new(CreditWallets::TotalInvested)
                            .decimal_len(15, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditWallets::TotalEarned)
                            .decimal_len(15, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditWallets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CreditWallets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credit_wallets_user")
                            .from(CreditWallets::Table, CreditWallets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CreditHoldings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CreditHoldings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CreditHoldings::WalletId).uuid().not_null())
                    .col(ColumnDef::new(CreditHoldings::ProjectId).uuid().not_null())
                    .col(
                        ColumnDef::new(CreditHoldings::CreditAmount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(CreditHoldings::CreditAmount).gte(1)),
                    )
                    .col(
                        ColumnDef::new(CreditHoldings::PurchasePrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditHoldings::PurchaseDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credit_holdings_wallet")
                            .from(CreditHoldings::Table, CreditHoldings::WalletId)
                            .to(CreditWallets::Table, CreditWallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credit_holdings_project")
                            .from(CreditHoldings::Table, CreditHoldings::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditHoldings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditWallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TransactionId,
    TransactionType,
    BuyerId,
    SellerId,
    ProjectId,
    CreditAmount,
    PricePerCredit,
    TotalAmount,
    Status,
    TransactionDate,
    CompletedAt,
    Notes,
    BlockchainTxHash,
}

#[derive(DeriveIden)]
enum CreditWallets {
    Table,
    Id,
    UserId,
    TotalCredits,
    AvailableCredits,
    RetiredCredits,
    TotalInvested,
    TotalEarned,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CreditHoldings {
    Table,
    Id,
    WalletId,
    ProjectId,
    CreditAmount,
    PurchasePrice,
    PurchaseDate,
}
