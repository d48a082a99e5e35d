mod common;

use common::*;
use engine::{
    CreateInvestmentCmd, EngineError, ExpenseCmd, InvestmentStatus, ReferenceType,
    TransactionKind, WithdrawInvestmentCmd,
};
use uuid::Uuid;

fn invest(investor: i64, amount: i64, months: u32, day: i64) -> CreateInvestmentCmd {
    CreateInvestmentCmd::new(COMMUNITY, investor, cents(amount), months, at(day))
}

fn withdraw(investment_id: Uuid, investor: i64, day: i64) -> WithdrawInvestmentCmd {
    WithdrawInvestmentCmd::new(COMMUNITY, investment_id, investor, at(day))
}

#[tokio::test]
async fn investment_lifecycle_scenario() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 20_000, t0()).await;

    let view = engine.create_investment(invest(ALICE, 100_000, 12, 0)).await.unwrap();
    assert_eq!(view.investment.profit_rate, 0.10);
    assert_eq!(view.status, InvestmentStatus::Active);
    assert_eq!(view.current_value.cents(), 100_000);
    assert_eq!(view.investor_name, "Alice Wanjiru");

    let fund = engine.get_fund(COMMUNITY, LEADER, at(1)).await.unwrap();
    assert_eq!(fund.current_balance.cents(), 120_000);
    assert_eq!(fund.total_investments.cents(), 100_000);

    // 2026-01-01 is twelve months after 2025-01-01.
    let matured = at(365);
    assert_eq!(view.investment.maturity_date, matured);

    let done = engine
        .withdraw_investment(withdraw(view.investment.id, ALICE, 365).notes("harvest"))
        .await
        .unwrap();
    let payout = done.investment.total_earned.cents();
    assert!((payout - 110_000).abs() <= 100, "payout was {payout}");
    assert_eq!(done.investment.status, InvestmentStatus::Withdrawn);
    assert_eq!(done.status, InvestmentStatus::Withdrawn);
    assert_eq!(done.investment.withdrawn_date, Some(matured));
    assert_eq!(done.current_value.cents(), payout);
    assert_eq!(done.investment.notes.as_deref(), Some("harvest"));

    let fund = engine.get_fund(COMMUNITY, LEADER, at(366)).await.unwrap();
    assert_eq!(fund.current_balance.cents(), 120_000 - payout);
    assert_eq!(fund.total_investments.cents(), 0);

    let txs = engine
        .list_transactions(COMMUNITY, LEADER, None, None)
        .await
        .unwrap();
    let returned = &txs[0].transaction;
    assert_eq!(returned.kind, TransactionKind::InvestmentReturned);
    assert_eq!(returned.amount.cents(), payout);
    assert_eq!(returned.reference_type, Some(ReferenceType::Investment));
    assert_eq!(
        returned.description.as_deref(),
        Some("Investment withdrawal by Alice Wanjiru")
    );
}

#[tokio::test]
async fn withdrawal_before_maturity_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 1_000_000, t0()).await;
    let inv = engine.create_investment(invest(BOB, 50_000, 6, 0)).await.unwrap().investment;

    let err = engine
        .withdraw_investment(withdraw(inv.id, BOB, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotMatured(_)));

    // Maturity is reported even when the fund could not pay out.
    engine
        .record_expense(ExpenseCmd::new(
            COMMUNITY,
            LEADER,
            cents(1_050_000),
            "warehouse",
            at(101),
        ))
        .await
        .unwrap();
    let err = engine
        .withdraw_investment(withdraw(inv.id, BOB, 102))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotMatured(_)));
}

#[tokio::test]
async fn matured_withdrawal_needs_a_covering_balance() {
    let (engine, _db) = engine_with_db().await;
    let inv = engine.create_investment(invest(ALICE, 10_000, 1, 0)).await.unwrap().investment;
    engine
        .record_expense(ExpenseCmd::new(COMMUNITY, LEADER, cents(9_000), "tools", at(5)))
        .await
        .unwrap();

    let err = engine
        .withdraw_investment(withdraw(inv.id, ALICE, 40))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let listed = engine
        .list_investments(COMMUNITY, ALICE, None, at(40))
        .await
        .unwrap();
    assert_eq!(listed[0].investment.status, InvestmentStatus::Active);
    assert_eq!(listed[0].status, InvestmentStatus::Matured);
    assert_eq!(balance(&engine, COMMUNITY).await, 1_000);
}

#[tokio::test]
async fn rate_is_fixed_at_creation() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 100_000, t0()).await;
    let inv = engine.create_investment(invest(ALICE, 10_000, 12, 0)).await.unwrap().investment;
    let before = engine
        .list_investments(COMMUNITY, ALICE, None, at(200))
        .await
        .unwrap();

    engine
        .set_fixed_return_rate(COMMUNITY, LEADER, 0.5, at(1))
        .await
        .unwrap();

    let after = engine
        .list_investments(COMMUNITY, ALICE, None, at(200))
        .await
        .unwrap();
    assert_eq!(after[0].investment.id, inv.id);
    assert_eq!(after[0].investment.profit_rate, 0.10);
    assert_eq!(after[0].current_value, before[0].current_value);

    let newer = engine.create_investment(invest(BOB, 10_000, 12, 2)).await.unwrap();
    assert_eq!(newer.investment.profit_rate, 0.5);
}

#[tokio::test]
async fn investments_are_withdrawn_once_by_their_investor() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 100_000, t0()).await;
    let inv = engine.create_investment(invest(ALICE, 10_000, 1, 0)).await.unwrap().investment;

    let err = engine
        .withdraw_investment(withdraw(inv.id, BOB, 40))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvestmentNotFound(inv.id.to_string()));

    engine
        .withdraw_investment(withdraw(inv.id, ALICE, 40))
        .await
        .unwrap();
    let err = engine
        .withdraw_investment(withdraw(inv.id, ALICE, 41))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvestmentNotFound(_)));
}

#[tokio::test]
async fn investment_input_is_validated() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.create_investment(invest(OUTSIDER, 100, 3, 0)).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAMember(_)));
    let err = engine.create_investment(invest(ALICE, 0, 3, 0)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    let err = engine.create_investment(invest(ALICE, 100, 0, 0)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(balance(&engine, COMMUNITY).await, 0);
}

#[tokio::test]
async fn listing_filters_by_derived_status_and_visibility() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 100_000, t0()).await;

    let short = engine.create_investment(invest(ALICE, 1_000, 1, 0)).await.unwrap();
    let long = engine.create_investment(invest(BOB, 2_000, 24, 1)).await.unwrap();
    let now = at(60);

    let all = engine.list_investments(COMMUNITY, LEADER, None, now).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].investment.id, long.investment.id);
    assert!(all[0].current_value.cents() > 2_000);

    let matured = engine
        .list_investments(COMMUNITY, LEADER, Some(InvestmentStatus::Matured), now)
        .await
        .unwrap();
    assert_eq!(matured.len(), 1);
    assert_eq!(matured[0].investment.id, short.investment.id);

    let own = engine.list_investments(COMMUNITY, BOB, None, now).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].investor_name, "Bob Otieno");

    engine
        .withdraw_investment(withdraw(short.investment.id, ALICE, 61))
        .await
        .unwrap();
    let withdrawn = engine
        .list_investments(COMMUNITY, LEADER, Some(InvestmentStatus::Withdrawn), at(62))
        .await
        .unwrap();
    assert_eq!(withdrawn.len(), 1);
    let matured = engine
        .list_investments(COMMUNITY, LEADER, Some(InvestmentStatus::Matured), at(62))
        .await
        .unwrap();
    assert!(matured.is_empty());
}
