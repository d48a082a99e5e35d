use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait, prelude::*};

use crate::{
    ApplyLoanCmd, EngineError, Loan, LoanStatus, LoanView, ReferenceType, ResultEngine,
    ReturnLoanCmd, Transaction, TransactionKind, loans, util::normalize_optional_text,
};

use super::{Engine, recorder::for_update, with_tx};

fn duplicate_active_loan() -> EngineError {
    EngineError::DuplicateActiveLoan("you already have an active loan in this community".to_string())
}

impl Engine {
    /// Apply for a loan. An approved loan is disbursed immediately.
    pub async fn apply_for_loan(&self, cmd: ApplyLoanCmd) -> ResultEngine<LoanView> {
        let notes = normalize_optional_text(cmd.notes.as_deref());

        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, cmd.community_id, cmd.borrower_id)
                .await?;
            let loan = Loan::new(
                cmd.community_id,
                cmd.borrower_id,
                cmd.amount,
                cmd.purpose.clone(),
                cmd.occurred_at,
                cmd.due_date,
                notes,
            )?;

            let fund = self
                .fund_or_create(&db_tx, cmd.community_id, cmd.occurred_at)
                .await?;
            if loan.amount > fund.current_balance {
                return Err(EngineError::InsufficientFunds(format!(
                    "requested {} but the fund holds {}",
                    loan.amount, fund.current_balance
                )));
            }

            let has_active = loans::Entity::find()
                .filter(loans::Column::CommunityId.eq(cmd.community_id))
                .filter(loans::Column::BorrowerId.eq(cmd.borrower_id))
                .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if has_active {
                return Err(duplicate_active_loan());
            }

            loans::ActiveModel::from(&loan)
                .insert(&db_tx)
                .await
                .map_err(|err| match err.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_active_loan(),
                    _ => err.into(),
                })?;

            let name = self.display_name(&db_tx, cmd.borrower_id).await?;
            let tx = Transaction::new(
                cmd.community_id,
                Some(cmd.borrower_id),
                TransactionKind::LoanGiven,
                loan.amount,
                Some(format!("Loan given to {name}: {}", loan.purpose)),
                cmd.occurred_at,
            )?
            .reference(ReferenceType::Loan, loan.id.to_string());
            self.record(&db_tx, tx).await?;

            Ok(LoanView::new(loan, name, cmd.occurred_at))
        })
    }

    /// Repay part or all of an active loan.
    pub async fn return_loan(&self, cmd: ReturnLoanCmd) -> ResultEngine<LoanView> {
        let notes = normalize_optional_text(cmd.notes.as_deref());

        with_tx!(self, |db_tx| {
            let query = loans::Entity::find_by_id(cmd.loan_id.to_string())
                .filter(loans::Column::CommunityId.eq(cmd.community_id))
                .filter(loans::Column::BorrowerId.eq(cmd.borrower_id));
            let model = for_update(query, &db_tx)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::LoanNotFound(cmd.loan_id.to_string()))?;

            let mut loan = Loan::try_from(model)?;
            loan.apply_repayment(cmd.amount, notes, cmd.occurred_at)?;
            loans::ActiveModel::from(&loan).update(&db_tx).await?;

            let name = self.display_name(&db_tx, cmd.borrower_id).await?;
            let tx = Transaction::new(
                cmd.community_id,
                Some(cmd.borrower_id),
                TransactionKind::LoanReturned,
                cmd.amount,
                Some(format!("Loan return by {name}")),
                cmd.occurred_at,
            )?
            .reference(ReferenceType::Loan, loan.id.to_string());
            self.record(&db_tx, tx).await?;

            if loan.status == LoanStatus::Completed {
                tracing::info!(
                    community_id = cmd.community_id,
                    loan_id = %loan.id,
                    "loan fully repaid"
                );
            }
            Ok(LoanView::new(loan, name, cmd.occurred_at))
        })
    }

    /// List loans, newest first.
    ///
    /// Leaders and co-leaders see every loan of the community, other members
    /// only their own. Filtering by `Overdue` selects active loans past due;
    /// any other status matches the stored one.
    pub async fn list_loans(
        &self,
        community_id: i64,
        user_id: i64,
        status: Option<LoanStatus>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<LoanView>> {
        with_tx!(self, |db_tx| {
            let role = self.require_member(&db_tx, community_id, user_id).await?;

            let mut query = loans::Entity::find()
                .filter(loans::Column::CommunityId.eq(community_id))
                .order_by_desc(loans::Column::LoanDate);
            if !role.can_manage_fund() {
                query = query.filter(loans::Column::BorrowerId.eq(user_id));
            }

            let loans = query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Loan::try_from)
                .collect::<ResultEngine<Vec<_>>>()?
                .into_iter()
                .filter(|loan| match status {
                    None => true,
                    Some(LoanStatus::Overdue) => loan.is_overdue(now),
                    Some(wanted) => loan.status == wanted,
                })
                .collect::<Vec<_>>();

            let names = self
                .display_names(&db_tx, loans.iter().map(|l| l.borrower_id))
                .await?;
            Ok(loans
                .into_iter()
                .map(|loan| {
                    let name = names.get(&loan.borrower_id).cloned().unwrap_or_default();
                    LoanView::new(loan, name, now)
                })
                .collect::<Vec<_>>())
        })
    }
}
