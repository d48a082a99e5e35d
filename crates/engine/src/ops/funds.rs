use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    DonateCmd, EngineError, ExpenseCmd, LedgerAccount, MoneyCents, ResultEngine, Transaction,
    TransactionKind, TransactionView, fund_transactions,
    ledger_accounts::{self, validate_rate},
    util::normalize_optional_text,
};

use super::{Engine, MAX_PAGE_SIZE, with_tx};

/// Page size used when the caller does not ask for one.
const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Clone, Copy)]
enum FundRate {
    Commission,
    FixedReturn,
}

impl Engine {
    /// Return the community fund, creating it on first access.
    pub async fn get_fund(
        &self,
        community_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<LedgerAccount> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, community_id, user_id).await?;
            self.fund_or_create(&db_tx, community_id, now).await
        })
    }

    /// List fund transactions, newest first.
    pub async fn list_transactions(
        &self,
        community_id: i64,
        user_id: i64,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> ResultEngine<Vec<TransactionView>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0);

        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, community_id, user_id).await?;

            let rows = fund_transactions::Entity::find()
                .filter(fund_transactions::Column::CommunityId.eq(community_id))
                .order_by_desc(fund_transactions::Column::CreatedAt)
                .order_by_desc(fund_transactions::Column::Id)
                .limit(limit)
                .offset(offset)
                .all(&db_tx)
                .await?;
            let transactions = rows
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let names = self
                .display_names(&db_tx, transactions.iter().filter_map(|t| t.user_id))
                .await?;
            Ok(transactions
                .into_iter()
                .map(|t| {
                    let name = t.user_id.and_then(|id| names.get(&id).cloned());
                    TransactionView::new(t, name)
                })
                .collect::<Vec<_>>())
        })
    }

    /// Donate to the community fund.
    pub async fn donate(&self, cmd: DonateCmd) -> ResultEngine<TransactionView> {
        let description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, cmd.community_id, cmd.user_id)
                .await?;
            let name = self.display_name(&db_tx, cmd.user_id).await?;
            let description = description.unwrap_or_else(|| format!("Donation by {name}"));

            let tx = Transaction::new(
                cmd.community_id,
                Some(cmd.user_id),
                TransactionKind::FundRaise,
                cmd.amount,
                Some(description),
                cmd.occurred_at,
            )?;
            let tx = self.record(&db_tx, tx).await?;
            Ok(TransactionView::new(tx, Some(name)))
        })
    }

    /// Record a fund expense. Leaders and co-leaders only.
    pub async fn record_expense(&self, cmd: ExpenseCmd) -> ResultEngine<TransactionView> {
        let description = normalize_optional_text(Some(cmd.description.as_str())).ok_or_else(|| {
            EngineError::InvalidAmount("expense description must not be empty".to_string())
        })?;

        with_tx!(self, |db_tx| {
            self.require_fund_manager(&db_tx, cmd.community_id, cmd.user_id)
                .await?;
            let name = self.display_name(&db_tx, cmd.user_id).await?;

            let tx = Transaction::new(
                cmd.community_id,
                Some(cmd.user_id),
                TransactionKind::Expense,
                cmd.amount,
                Some(description),
                cmd.occurred_at,
            )?;
            let tx = self.record(&db_tx, tx).await?;
            Ok(TransactionView::new(tx, Some(name)))
        })
    }

    /// Change the annual rate offered to new investments. Existing
    /// investments keep the rate they were created with.
    pub async fn set_fixed_return_rate(
        &self,
        community_id: i64,
        user_id: i64,
        rate: f64,
        now: DateTime<Utc>,
    ) -> ResultEngine<LedgerAccount> {
        let rate = validate_rate(rate, "fixed_return_rate")?;
        self.set_rate(community_id, user_id, FundRate::FixedReturn, rate, now)
            .await
    }

    /// Change the share of community-listing sales credited to the fund.
    pub async fn set_commission_rate(
        &self,
        community_id: i64,
        user_id: i64,
        rate: f64,
        now: DateTime<Utc>,
    ) -> ResultEngine<LedgerAccount> {
        let rate = validate_rate(rate, "commission_rate")?;
        self.set_rate(community_id, user_id, FundRate::Commission, rate, now)
            .await
    }

    async fn set_rate(
        &self,
        community_id: i64,
        user_id: i64,
        which: FundRate,
        rate: f64,
        now: DateTime<Utc>,
    ) -> ResultEngine<LedgerAccount> {
        with_tx!(self, |db_tx| {
            self.require_fund_manager(&db_tx, community_id, user_id)
                .await?;
            let mut account = self.fund_or_create(&db_tx, community_id, now).await?;
            match which {
                FundRate::Commission => account.commission_rate = rate,
                FundRate::FixedReturn => account.fixed_return_rate = rate,
            }
            account.updated_at = now;
            ledger_accounts::ActiveModel::from(&account)
                .update(&db_tx)
                .await?;

            tracing::info!(
                community_id,
                commission_rate = account.commission_rate,
                fixed_return_rate = account.fixed_return_rate,
                "updated fund rates"
            );
            Ok(account)
        })
    }

    /// Rebuild the balance and counters by replaying every transaction of the
    /// community from zero. Leaders and co-leaders only.
    pub async fn recompute_fund(
        &self,
        community_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<LedgerAccount> {
        with_tx!(self, |db_tx| {
            self.require_fund_manager(&db_tx, community_id, user_id)
                .await?;
            let mut account = self.fund_or_create(&db_tx, community_id, now).await?;
            let stored = (
                account.current_balance,
                account.total_raised,
                account.total_loans,
                account.total_investments,
            );

            account.current_balance = MoneyCents::ZERO;
            account.total_raised = MoneyCents::ZERO;
            account.total_loans = MoneyCents::ZERO;
            account.total_investments = MoneyCents::ZERO;

            let rows = fund_transactions::Entity::find()
                .filter(fund_transactions::Column::CommunityId.eq(community_id))
                .order_by_asc(fund_transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            for row in rows {
                let tx = Transaction::try_from(row)?;
                tx.kind.effect(tx.amount).apply_to(&mut account);
            }

            let replayed = (
                account.current_balance,
                account.total_raised,
                account.total_loans,
                account.total_investments,
            );
            if replayed != stored {
                tracing::warn!(
                    community_id,
                    stored_balance = stored.0.cents(),
                    replayed_balance = replayed.0.cents(),
                    "fund counters drifted from the ledger, rewriting"
                );
            }

            account.updated_at = now;
            ledger_accounts::ActiveModel::from(&account)
                .update(&db_tx)
                .await?;
            Ok(account)
        })
    }
}
