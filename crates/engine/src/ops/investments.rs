use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    CreateInvestmentCmd, EngineError, Investment, InvestmentStatus, InvestmentView, ReferenceType,
    ResultEngine, Transaction, TransactionKind, WithdrawInvestmentCmd, investments,
    util::normalize_optional_text,
};

use super::{Engine, recorder::for_update, with_tx};

impl Engine {
    /// Invest into the community fund at its current fixed return rate.
    pub async fn create_investment(
        &self,
        cmd: CreateInvestmentCmd,
    ) -> ResultEngine<InvestmentView> {
        let notes = normalize_optional_text(cmd.notes.as_deref());

        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, cmd.community_id, cmd.investor_id)
                .await?;
            let fund = self
                .fund_or_create(&db_tx, cmd.community_id, cmd.occurred_at)
                .await?;

            let investment = Investment::new(
                cmd.community_id,
                cmd.investor_id,
                cmd.amount,
                fund.fixed_return_rate,
                cmd.maturity_months,
                cmd.occurred_at,
                notes,
            )?;
            investments::ActiveModel::from(&investment)
                .insert(&db_tx)
                .await?;

            let name = self.display_name(&db_tx, cmd.investor_id).await?;
            let tx = Transaction::new(
                cmd.community_id,
                Some(cmd.investor_id),
                TransactionKind::InvestmentReceived,
                investment.amount,
                Some(format!("Investment by {name}")),
                cmd.occurred_at,
            )?
            .reference(ReferenceType::Investment, investment.id.to_string());
            self.record(&db_tx, tx).await?;

            InvestmentView::new(investment, name, cmd.occurred_at)
        })
    }

    /// Withdraw a matured investment together with its accrued return.
    pub async fn withdraw_investment(
        &self,
        cmd: WithdrawInvestmentCmd,
    ) -> ResultEngine<InvestmentView> {
        let notes = normalize_optional_text(cmd.notes.as_deref());

        with_tx!(self, |db_tx| {
            let query = investments::Entity::find_by_id(cmd.investment_id.to_string())
                .filter(investments::Column::CommunityId.eq(cmd.community_id))
                .filter(investments::Column::InvestorId.eq(cmd.investor_id));
            let model = for_update(query, &db_tx)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::InvestmentNotFound(cmd.investment_id.to_string()))?;
            let mut investment = Investment::try_from(model)?;

            // Maturity is checked before the balance.
            let payout = investment.payout_at(cmd.occurred_at)?;
            let fund = self
                .fund_or_create(&db_tx, cmd.community_id, cmd.occurred_at)
                .await?;
            if payout > fund.current_balance {
                return Err(EngineError::InsufficientFunds(format!(
                    "payout of {payout} exceeds the fund balance of {}",
                    fund.current_balance
                )));
            }

            investment.mark_withdrawn(payout, notes, cmd.occurred_at);
            investments::ActiveModel::from(&investment)
                .update(&db_tx)
                .await?;

            let name = self.display_name(&db_tx, cmd.investor_id).await?;
            let tx = Transaction::new(
                cmd.community_id,
                Some(cmd.investor_id),
                TransactionKind::InvestmentReturned,
                payout,
                Some(format!("Investment withdrawal by {name}")),
                cmd.occurred_at,
            )?
            .reference(ReferenceType::Investment, investment.id.to_string());
            self.record(&db_tx, tx).await?;

            InvestmentView::new(investment, name, cmd.occurred_at)
        })
    }

    /// List investments, newest first, valued at `now`.
    ///
    /// Visibility follows [`Engine::list_loans`]. Filtering by `Matured`
    /// selects active investments at or past maturity; any other status
    /// matches the stored one.
    pub async fn list_investments(
        &self,
        community_id: i64,
        user_id: i64,
        status: Option<InvestmentStatus>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<InvestmentView>> {
        with_tx!(self, |db_tx| {
            let role = self.require_member(&db_tx, community_id, user_id).await?;

            let mut query = investments::Entity::find()
                .filter(investments::Column::CommunityId.eq(community_id))
                .order_by_desc(investments::Column::InvestmentDate);
            if !role.can_manage_fund() {
                query = query.filter(investments::Column::InvestorId.eq(user_id));
            }

            let found = query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Investment::try_from)
                .collect::<ResultEngine<Vec<_>>>()?
                .into_iter()
                .filter(|inv| match status {
                    None => true,
                    Some(InvestmentStatus::Matured) => {
                        inv.status == InvestmentStatus::Active && inv.is_matured(now)
                    }
                    Some(wanted) => inv.status == wanted,
                })
                .collect::<Vec<_>>();

            let names = self
                .display_names(&db_tx, found.iter().map(|i| i.investor_id))
                .await?;
            found
                .into_iter()
                .map(|inv| {
                    let name = names.get(&inv.investor_id).cloned().unwrap_or_default();
                    InvestmentView::new(inv, name, now)
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
