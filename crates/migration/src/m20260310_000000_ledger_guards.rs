//! Database-level guards for the ledger:
//!
//! - `fund_transactions.idempotency_key` with a unique index, so a marketplace
//!   order is charged commission at most once per listing
//! - a partial unique index allowing one `active` loan per borrower and
//!   community

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum FundTransactions {
    Table,
    IdempotencyKey,
}

const ONE_ACTIVE_LOAN_INDEX: &str = "uidx-community_loans-one_active";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(FundTransactions::Table)
                    .add_column(ColumnDef::new(FundTransactions::IdempotencyKey).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-fund_transactions-idempotency_key")
                    .table(FundTransactions::Table)
                    .col(FundTransactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // sea-query has no builder for partial indexes.
        let db = manager.get_connection();
        db.execute_unprepared(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"{ONE_ACTIVE_LOAN_INDEX}\" \
             ON community_loans (community_id, borrower_id) WHERE status = 'active'"
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(&format!(
            "DROP INDEX IF EXISTS \"{ONE_ACTIVE_LOAN_INDEX}\""
        ))
        .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("uidx-fund_transactions-idempotency_key")
                    .table(FundTransactions::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(FundTransactions::Table)
                    .drop_column(FundTransactions::IdempotencyKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
