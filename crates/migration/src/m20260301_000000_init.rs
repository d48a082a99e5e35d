//! Initial schema for the community fund ledger.
//!
//! - `users`, `community_members`, `community_events`: platform tables the
//!   ledger reads (and, for events, annotates)
//! - `community_funds`: one pooled balance per community
//! - `fund_transactions`: append-only ledger entries
//! - `community_loans`, `community_investments`: member lending and saving

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    FullName,
}

#[derive(Iden)]
enum CommunityMembers {
    Table,
    Id,
    CommunityId,
    UserId,
    Role,
    IsActive,
}

#[derive(Iden)]
enum CommunityEvents {
    Table,
    Id,
    CommunityId,
    Title,
    ActualReturn,
}

#[derive(Iden)]
enum CommunityFunds {
    Table,
    CommunityId,
    CurrentBalance,
    TotalRaised,
    TotalLoans,
    TotalInvestments,
    CommissionRate,
    FixedReturnRate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum FundTransactions {
    Table,
    Id,
    CommunityId,
    UserId,
    Kind,
    Amount,
    Description,
    ReferenceId,
    ReferenceType,
    CreatedAt,
}

#[derive(Iden)]
enum CommunityLoans {
    Table,
    Id,
    CommunityId,
    BorrowerId,
    Amount,
    Purpose,
    Status,
    LoanDate,
    DueDate,
    ReturnedDate,
    ReturnedAmount,
    Notes,
}

#[derive(Iden)]
enum CommunityInvestments {
    Table,
    Id,
    CommunityId,
    InvestorId,
    Amount,
    ProfitRate,
    Status,
    InvestmentDate,
    MaturityDate,
    WithdrawnDate,
    TotalEarned,
    Notes,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Platform tables
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommunityMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityMembers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityMembers::CommunityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityMembers::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityMembers::Role).string().not_null())
                    .col(
                        ColumnDef::new(CommunityMembers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-community_members-user_id")
                            .from(CommunityMembers::Table, CommunityMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-community_members-community_id-user_id")
                    .table(CommunityMembers::Table)
                    .col(CommunityMembers::CommunityId)
                    .col(CommunityMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommunityEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityEvents::CommunityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityEvents::Title).string().not_null())
                    .col(ColumnDef::new(CommunityEvents::ActualReturn).big_integer())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Community funds
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CommunityFunds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityFunds::CommunityId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::CurrentBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::TotalRaised)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::TotalLoans)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::TotalInvestments)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::CommissionRate)
                            .double()
                            .not_null()
                            .default(0.05),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::FixedReturnRate)
                            .double()
                            .not_null()
                            .default(0.10),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityFunds::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Fund transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FundTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FundTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FundTransactions::CommunityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FundTransactions::UserId).big_integer())
                    .col(ColumnDef::new(FundTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(FundTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FundTransactions::Description).string())
                    .col(ColumnDef::new(FundTransactions::ReferenceId).string())
                    .col(ColumnDef::new(FundTransactions::ReferenceType).string())
                    .col(
                        ColumnDef::new(FundTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fund_transactions-community_id")
                            .from(FundTransactions::Table, FundTransactions::CommunityId)
                            .to(CommunityFunds::Table, CommunityFunds::CommunityId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fund_transactions-community_id-created_at")
                    .table(FundTransactions::Table)
                    .col(FundTransactions::CommunityId)
                    .col(FundTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Loans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CommunityLoans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityLoans::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityLoans::CommunityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityLoans::BorrowerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityLoans::Amount).big_integer().not_null())
                    .col(ColumnDef::new(CommunityLoans::Purpose).string().not_null())
                    .col(ColumnDef::new(CommunityLoans::Status).string().not_null())
                    .col(ColumnDef::new(CommunityLoans::LoanDate).timestamp().not_null())
                    .col(ColumnDef::new(CommunityLoans::DueDate).timestamp().not_null())
                    .col(ColumnDef::new(CommunityLoans::ReturnedDate).timestamp())
                    .col(
                        ColumnDef::new(CommunityLoans::ReturnedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CommunityLoans::Notes).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-community_loans-community_id-borrower_id")
                    .table(CommunityLoans::Table)
                    .col(CommunityLoans::CommunityId)
                    .col(CommunityLoans::BorrowerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Investments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CommunityInvestments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityInvestments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityInvestments::CommunityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityInvestments::InvestorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityInvestments::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityInvestments::ProfitRate)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityInvestments::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityInvestments::InvestmentDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityInvestments::MaturityDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityInvestments::WithdrawnDate).timestamp())
                    .col(
                        ColumnDef::new(CommunityInvestments::TotalEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CommunityInvestments::Notes).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-community_investments-community_id-investor_id")
                    .table(CommunityInvestments::Table)
                    .col(CommunityInvestments::CommunityId)
                    .col(CommunityInvestments::InvestorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunityInvestments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommunityLoans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FundTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommunityFunds::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommunityEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommunityMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
