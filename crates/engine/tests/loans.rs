mod common;

use std::sync::Arc;

use common::*;
use engine::{ApplyLoanCmd, EngineError, LoanStatus, ReferenceType, ReturnLoanCmd, TransactionKind};
use uuid::Uuid;

fn apply(borrower: i64, amount: i64, day: i64) -> ApplyLoanCmd {
    ApplyLoanCmd::new(COMMUNITY, borrower, cents(amount), "seeds", at(day + 30), at(day))
}

#[tokio::test]
async fn loan_lifecycle_scenario() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 100_000, t0()).await;

    let view = engine.apply_for_loan(apply(ALICE, 60_000, 1)).await.unwrap();
    assert_eq!(view.loan.status, LoanStatus::Active);
    assert_eq!(view.borrower_name, "Alice Wanjiru");
    assert_eq!(balance(&engine, COMMUNITY).await, 40_000);

    let active = engine
        .list_loans(COMMUNITY, ALICE, Some(LoanStatus::Active), at(2))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    let err = engine.apply_for_loan(apply(ALICE, 50_000, 2)).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, COMMUNITY).await, 40_000);

    let repaid = engine
        .return_loan(ReturnLoanCmd::new(COMMUNITY, view.loan.id, ALICE, cents(60_000), at(3)))
        .await
        .unwrap();
    assert_eq!(repaid.loan.status, LoanStatus::Completed);
    assert_eq!(repaid.loan.returned_amount, repaid.loan.amount);
    assert_eq!(repaid.loan.returned_date, Some(at(3)));

    let fund = engine.get_fund(COMMUNITY, LEADER, at(4)).await.unwrap();
    assert_eq!(fund.current_balance.cents(), 100_000);
    assert_eq!(fund.total_loans.cents(), 0);
}

#[tokio::test]
async fn disbursal_is_recorded_against_the_loan() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 5_000, t0()).await;

    let view = engine.apply_for_loan(apply(BOB, 2_000, 1)).await.unwrap();
    let txs = engine
        .list_transactions(COMMUNITY, LEADER, None, None)
        .await
        .unwrap();
    let given = &txs[0].transaction;
    assert_eq!(given.kind, TransactionKind::LoanGiven);
    assert_eq!(given.amount.cents(), 2_000);
    assert_eq!(given.reference_type, Some(ReferenceType::Loan));
    assert_eq!(given.reference_id, Some(view.loan.id.to_string()));
    assert_eq!(given.description.as_deref(), Some("Loan given to Bob Otieno: seeds"));
}

#[tokio::test]
async fn one_active_loan_per_borrower() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 10_000, t0()).await;

    let first = engine.apply_for_loan(apply(ALICE, 1_000, 1)).await.unwrap();
    let err = engine.apply_for_loan(apply(ALICE, 1_000, 2)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::DuplicateActiveLoan(
            "you already have an active loan in this community".to_string()
        )
    );
    assert_eq!(balance(&engine, COMMUNITY).await, 9_000);

    // Another member is not affected.
    engine.apply_for_loan(apply(BOB, 1_000, 2)).await.unwrap();

    // Once repaid, the borrower may apply again.
    engine
        .return_loan(ReturnLoanCmd::new(COMMUNITY, first.loan.id, ALICE, cents(1_000), at(3)))
        .await
        .unwrap();
    engine.apply_for_loan(apply(ALICE, 500, 4)).await.unwrap();
}

#[tokio::test]
async fn loan_application_is_validated() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 10_000, t0()).await;

    let err = engine.apply_for_loan(apply(OUTSIDER, 100, 1)).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAMember(_)));
    let err = engine.apply_for_loan(apply(FORMER, 100, 1)).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAMember(_)));

    let err = engine.apply_for_loan(apply(ALICE, 0, 1)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .apply_for_loan(ApplyLoanCmd::new(COMMUNITY, ALICE, cents(100), " ", at(30), at(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(balance(&engine, COMMUNITY).await, 10_000);
}

#[tokio::test]
async fn repayments_are_bounded_by_the_remaining_amount() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 10_000, t0()).await;
    let loan = engine.apply_for_loan(apply(ALICE, 6_000, 1)).await.unwrap().loan;

    let partial = engine
        .return_loan(
            ReturnLoanCmd::new(COMMUNITY, loan.id, ALICE, cents(2_000), at(2)).notes("first half"),
        )
        .await
        .unwrap();
    assert_eq!(partial.loan.status, LoanStatus::Active);
    assert_eq!(partial.loan.returned_amount.cents(), 2_000);
    assert!(partial.loan.returned_date.is_none());

    let err = engine
        .return_loan(ReturnLoanCmd::new(COMMUNITY, loan.id, ALICE, cents(4_001), at(3)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::OverRepayment(
            "return amount cannot exceed remaining loan amount of 40.00".to_string()
        )
    );
    assert_eq!(balance(&engine, COMMUNITY).await, 6_000);

    let done = engine
        .return_loan(
            ReturnLoanCmd::new(COMMUNITY, loan.id, ALICE, cents(4_000), at(4)).notes("rest"),
        )
        .await
        .unwrap();
    assert_eq!(done.loan.status, LoanStatus::Completed);
    assert_eq!(done.loan.notes.as_deref(), Some("first half\nrest"));

    let err = engine
        .return_loan(ReturnLoanCmd::new(COMMUNITY, loan.id, ALICE, cents(1), at(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::LoanNotFound(_)));
}

#[tokio::test]
async fn loans_can_only_be_repaid_by_their_borrower() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 10_000, t0()).await;
    let loan = engine.apply_for_loan(apply(ALICE, 1_000, 1)).await.unwrap().loan;

    let err = engine
        .return_loan(ReturnLoanCmd::new(COMMUNITY, loan.id, BOB, cents(100), at(2)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::LoanNotFound(loan.id.to_string()));

    let unknown = Uuid::new_v4();
    let err = engine
        .return_loan(ReturnLoanCmd::new(COMMUNITY, unknown, ALICE, cents(100), at(2)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::LoanNotFound(unknown.to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_applications_cannot_overdraw_the_fund() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    donate(&engine, COMMUNITY, 1_000, t0()).await;

    for round in 0..20 {
        let day = round * 2 + 1;
        let spawn_apply = |borrower: i64, amount: i64| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.apply_for_loan(apply(borrower, amount, day)).await })
        };
        let (a, b) = (spawn_apply(ALICE, 600), spawn_apply(BOB, 700));
        let results = [a.await.unwrap(), b.await.unwrap()];

        let approved: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert!(approved.len() <= 1, "round {round}: both loans were approved");
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                matches!(err, EngineError::InsufficientFunds(_) | EngineError::Conflict(_)),
                "round {round}: unexpected error {err:?}"
            );
        }

        let remaining = balance(&engine, COMMUNITY).await;
        match approved.first() {
            Some(view) => {
                assert_eq!(remaining, 1_000 - view.loan.amount.cents());
                engine
                    .return_loan(ReturnLoanCmd::new(
                        COMMUNITY,
                        view.loan.id,
                        view.loan.borrower_id,
                        view.loan.amount,
                        at(day + 1),
                    ))
                    .await
                    .unwrap();
            }
            None => assert_eq!(remaining, 1_000),
        }
        assert_eq!(balance(&engine, COMMUNITY).await, 1_000);
    }

    let fund = engine.recompute_fund(COMMUNITY, LEADER, at(100)).await.unwrap();
    assert_eq!(fund.current_balance.cents(), 1_000);
    assert_eq!(fund.total_loans.cents(), 0);

    drop(engine);
    remove_db_file(db, path).await;
}

#[tokio::test]
async fn listing_derives_overdue_and_respects_visibility() {
    let (engine, _db) = engine_with_db().await;
    donate(&engine, COMMUNITY, 10_000, t0()).await;

    let alice = engine.apply_for_loan(apply(ALICE, 1_000, 1)).await.unwrap();
    assert!(!alice.is_overdue);
    engine
        .apply_for_loan(ApplyLoanCmd::new(
            COMMUNITY,
            BOB,
            cents(1_000),
            "irrigation",
            at(100),
            at(2),
        ))
        .await
        .unwrap();

    // Alice's loan is due on day 31.
    let now = at(40);
    let all = engine.list_loans(COMMUNITY, LEADER, None, now).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].borrower_name, "Bob Otieno");
    assert_eq!(all[0].status, LoanStatus::Active);
    assert_eq!(all[1].status, LoanStatus::Overdue);
    assert!(all[1].is_overdue);
    assert_eq!(all[1].loan.status, LoanStatus::Active);

    let overdue = engine
        .list_loans(COMMUNITY, LEADER, Some(LoanStatus::Overdue), now)
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].loan.id, alice.loan.id);

    let own = engine.list_loans(COMMUNITY, ALICE, None, now).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].loan.borrower_id, ALICE);

    let err = engine
        .list_loans(COMMUNITY, OUTSIDER, None, now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAMember(_)));
}
