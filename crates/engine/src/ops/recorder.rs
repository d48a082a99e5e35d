//! The transaction recorder: the only code path that changes a fund's
//! balance or counters.

use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, DbBackend, QueryFilter, QuerySelect, Select, SqlErr,
    prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, LedgerAccount, ResultEngine, Transaction, fund_transactions, ledger_accounts,
};

use super::Engine;

/// Adds `FOR UPDATE` on backends with row locks; SQLite serialises writers
/// itself.
pub(super) fn for_update<E: EntityTrait>(query: Select<E>, db: &DatabaseTransaction) -> Select<E> {
    if db.get_database_backend() == DbBackend::Sqlite {
        query
    } else {
        query.lock_exclusive()
    }
}

impl Engine {
    /// Returns the community's fund, creating it with default rates on first
    /// use. The row stays locked until the surrounding transaction ends.
    pub(super) async fn fund_or_create(
        &self,
        db: &DatabaseTransaction,
        community_id: i64,
        now: DateTimeUtc,
    ) -> ResultEngine<LedgerAccount> {
        let query = for_update(ledger_accounts::Entity::find_by_id(community_id), db);
        if let Some(model) = query.one(db).await? {
            return Ok(model.into());
        }

        let account = LedgerAccount::new(community_id, now);
        ledger_accounts::ActiveModel::from(&account)
            .insert(db)
            .await?;
        tracing::info!(community_id, "created community fund");
        Ok(account)
    }

    pub(super) async fn idempotency_key_exists(
        &self,
        db: &DatabaseTransaction,
        key: &str,
    ) -> ResultEngine<bool> {
        Ok(fund_transactions::Entity::find()
            .filter(fund_transactions::Column::IdempotencyKey.eq(key))
            .one(db)
            .await?
            .is_some())
    }

    /// Appends `tx` and applies its balance effect in the same database
    /// transaction.
    ///
    /// Debits are applied with a guarded `UPDATE ... WHERE current_balance >=
    /// amount`, so a debit that lost a race against another one fails with
    /// `InsufficientFunds` instead of overdrawing the fund.
    pub(super) async fn record(
        &self,
        db: &DatabaseTransaction,
        tx: Transaction,
    ) -> ResultEngine<Transaction> {
        if !tx.amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        if let Some(key) = tx.idempotency_key.as_deref()
            && self.idempotency_key_exists(db, key).await?
        {
            return Err(EngineError::Conflict(format!(
                "transaction already recorded: {key}"
            )));
        }

        self.fund_or_create(db, tx.community_id, tx.created_at)
            .await?;

        let effect = tx.kind.effect(tx.amount);
        let bump = |column: ledger_accounts::Column, delta: i64| Expr::col(column).add(delta);

        let mut update = ledger_accounts::Entity::update_many()
            .col_expr(
                ledger_accounts::Column::CurrentBalance,
                bump(ledger_accounts::Column::CurrentBalance, effect.balance.cents()),
            )
            .col_expr(
                ledger_accounts::Column::TotalRaised,
                bump(ledger_accounts::Column::TotalRaised, effect.raised.cents()),
            )
            .col_expr(
                ledger_accounts::Column::TotalLoans,
                bump(ledger_accounts::Column::TotalLoans, effect.loans.cents()),
            )
            .col_expr(
                ledger_accounts::Column::TotalInvestments,
                bump(
                    ledger_accounts::Column::TotalInvestments,
                    effect.investments.cents(),
                ),
            )
            .col_expr(
                ledger_accounts::Column::UpdatedAt,
                Expr::value(tx.created_at),
            )
            .filter(ledger_accounts::Column::CommunityId.eq(tx.community_id));
        if effect.is_debit() {
            update = update.filter(ledger_accounts::Column::CurrentBalance.gte(tx.amount.cents()));
        }

        let updated = update.exec(db).await?;
        if updated.rows_affected == 0 {
            return Err(EngineError::InsufficientFunds(format!(
                "community fund cannot cover {}",
                tx.amount
            )));
        }

        fund_transactions::ActiveModel::from(&tx)
            .insert(db)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    EngineError::Conflict("transaction already recorded".to_string())
                }
                _ => err.into(),
            })?;

        tracing::info!(
            community_id = tx.community_id,
            kind = tx.kind.as_str(),
            amount = tx.amount.cents(),
            reference_type = tx.reference_type.map(|r| r.as_str()),
            reference_id = tx.reference_id.as_deref(),
            "recorded fund transaction"
        );
        Ok(tx)
    }
}
