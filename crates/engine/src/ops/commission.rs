use sea_orm::{ActiveModelTrait, ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, MoneyCents, PaidOrder, RecordEventReturnCmd, ReferenceType, ResultEngine,
    Transaction, TransactionKind, TransactionView, community_events,
};

use super::{Engine, with_tx};

/// Idempotency key of the commission entry for one listing of an order.
#[must_use]
pub fn commission_key(order_id: i64, listing_id: i64) -> String {
    format!("order:{order_id}:listing:{listing_id}")
}

fn event_return_key(event_id: i64) -> String {
    format!("event:{event_id}:return")
}

/// Sale total of one community listing within an order.
#[derive(Debug, PartialEq)]
struct ListingSale<'a> {
    listing_id: i64,
    listing_name: &'a str,
    community_id: i64,
    total: MoneyCents,
}

/// Sums line totals per community listing, in order of first appearance.
/// Lines of listings without a community are dropped.
fn community_sales(order: &PaidOrder) -> ResultEngine<Vec<ListingSale<'_>>> {
    let mut sales: Vec<ListingSale<'_>> = Vec::new();
    for line in &order.lines {
        let Some(community_id) = line.community_id else {
            continue;
        };
        if line.line_total.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "negative line total for listing {}",
                line.listing_id
            )));
        }
        match sales.iter_mut().find(|s| s.listing_id == line.listing_id) {
            Some(sale) => {
                sale.total = sale.total.checked_add(line.line_total).ok_or_else(|| {
                    EngineError::InvalidAmount("order total overflow".to_string())
                })?;
            }
            None => sales.push(ListingSale {
                listing_id: line.listing_id,
                listing_name: &line.listing_name,
                community_id,
                total: line.line_total,
            }),
        }
    }
    Ok(sales)
}

impl Engine {
    /// Credit each community whose listings appear in a paid order with its
    /// commission share.
    ///
    /// One `commission_earned` entry is recorded per community listing. The
    /// entry is keyed by order and listing, so charging the same order again
    /// records nothing new. Returns the entries recorded by this call.
    pub async fn charge_commission_on_order(
        &self,
        order: &PaidOrder,
    ) -> ResultEngine<Vec<Transaction>> {
        let sales = community_sales(order)?;

        with_tx!(self, |db_tx| {
            let mut recorded = Vec::new();
            for sale in &sales {
                let key = commission_key(order.order_id, sale.listing_id);
                if self.idempotency_key_exists(&db_tx, &key).await? {
                    tracing::debug!(
                        order_id = order.order_id,
                        listing_id = sale.listing_id,
                        "commission already charged, skipping"
                    );
                    continue;
                }

                let fund = self
                    .fund_or_create(&db_tx, sale.community_id, order.paid_at)
                    .await?;
                let commission = sale.total.scale(fund.commission_rate)?;
                if !commission.is_positive() {
                    tracing::debug!(
                        order_id = order.order_id,
                        listing_id = sale.listing_id,
                        "commission rounds to zero, skipping"
                    );
                    continue;
                }

                let tx = Transaction::new(
                    sale.community_id,
                    None,
                    TransactionKind::CommissionEarned,
                    commission,
                    Some(format!("Commission from sale of {}", sale.listing_name)),
                    order.paid_at,
                )?
                .reference(ReferenceType::Order, order.order_id.to_string())
                .idempotency_key(key);
                recorded.push(self.record(&db_tx, tx).await?);
            }
            Ok(recorded)
        })
    }

    /// Record the realised return of a community event and credit a positive
    /// return to the fund. Leaders and co-leaders only.
    ///
    /// A zero return may be corrected later; once a positive return has been
    /// credited the event is closed and further recordings fail with
    /// `Conflict`. Returns `None` when the return is zero and nothing was
    /// credited.
    pub async fn record_event_return(
        &self,
        cmd: RecordEventReturnCmd,
    ) -> ResultEngine<Option<TransactionView>> {
        if cmd.actual_return.is_negative() {
            return Err(EngineError::InvalidAmount(
                "actual return must not be negative".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.require_fund_manager(&db_tx, cmd.community_id, cmd.recorded_by)
                .await?;
            let event = community_events::Entity::find_by_id(cmd.event_id)
                .filter(community_events::Column::CommunityId.eq(cmd.community_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::EntityNotFound(format!("event {}", cmd.event_id)))?;

            if event.actual_return.is_some_and(|previous| previous > 0) {
                return Err(EngineError::Conflict(format!(
                    "return for event {} is already recorded",
                    cmd.event_id
                )));
            }

            let title = event.title.clone();
            let mut active: community_events::ActiveModel = event.into();
            active.actual_return = ActiveValue::Set(Some(cmd.actual_return.cents()));
            active.update(&db_tx).await?;

            if !cmd.actual_return.is_positive() {
                return Ok(None);
            }

            let name = self.display_name(&db_tx, cmd.recorded_by).await?;
            let tx = Transaction::new(
                cmd.community_id,
                Some(cmd.recorded_by),
                TransactionKind::FundRaise,
                cmd.actual_return,
                Some(format!("Return from event: {title}")),
                cmd.occurred_at,
            )?
            .reference(ReferenceType::Event, cmd.event_id.to_string())
            .idempotency_key(event_return_key(cmd.event_id));
            let tx = self.record(&db_tx, tx).await?;
            Ok(Some(TransactionView::new(tx, Some(name))))
        })
    }
}
