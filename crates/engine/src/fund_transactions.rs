//! Fund transaction primitives.
//!
//! A `Transaction` is an immutable record of one balance-affecting event on a
//! community fund. The `TransactionKind` alone decides the direction of the
//! change; amounts are always positive magnitudes.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, LedgerAccount, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    FundRaise,
    LoanGiven,
    LoanReturned,
    InvestmentReceived,
    InvestmentReturned,
    CommissionEarned,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FundRaise => "fund_raise",
            Self::LoanGiven => "loan_given",
            Self::LoanReturned => "loan_returned",
            Self::InvestmentReceived => "investment_received",
            Self::InvestmentReturned => "investment_returned",
            Self::CommissionEarned => "commission_earned",
            Self::Expense => "expense",
        }
    }

    /// Signed deltas applied to the fund when a transaction of this kind and
    /// `amount` is recorded.
    #[must_use]
    pub fn effect(self, amount: MoneyCents) -> BalanceEffect {
        let zero = MoneyCents::ZERO;
        let (balance, raised, loans, investments) = match self {
            Self::FundRaise => (amount, amount, zero, zero),
            Self::LoanGiven => (-amount, zero, amount, zero),
            Self::LoanReturned => (amount, zero, -amount, zero),
            Self::InvestmentReceived => (amount, zero, zero, amount),
            Self::InvestmentReturned => (-amount, zero, zero, -amount),
            Self::CommissionEarned => (amount, zero, zero, zero),
            Self::Expense => (-amount, zero, zero, zero),
        };
        BalanceEffect {
            balance,
            raised,
            loans,
            investments,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "fund_raise" => Ok(Self::FundRaise),
            "loan_given" => Ok(Self::LoanGiven),
            "loan_returned" => Ok(Self::LoanReturned),
            "investment_received" => Ok(Self::InvestmentReceived),
            "investment_returned" => Ok(Self::InvestmentReturned),
            "commission_earned" => Ok(Self::CommissionEarned),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidId(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Deltas on the fund balance and its cumulative counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceEffect {
    pub balance: MoneyCents,
    pub raised: MoneyCents,
    pub loans: MoneyCents,
    pub investments: MoneyCents,
}

impl BalanceEffect {
    /// Returns `true` if the effect takes money out of the fund.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.balance.is_negative()
    }

    /// Applies the deltas to an in-memory account. Used when replaying the
    /// ledger.
    pub fn apply_to(&self, account: &mut LedgerAccount) {
        account.current_balance += self.balance;
        account.total_raised += self.raised;
        account.total_loans += self.loans;
        account.total_investments += self.investments;
    }
}

/// What a transaction's `reference_id` points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Loan,
    Investment,
    Order,
    Event,
}

impl ReferenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loan => "loan",
            Self::Investment => "investment",
            Self::Order => "order",
            Self::Event => "event",
        }
    }
}

impl TryFrom<&str> for ReferenceType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "loan" => Ok(Self::Loan),
            "investment" => Ok(Self::Investment),
            "order" => Ok(Self::Order),
            "event" => Ok(Self::Event),
            other => Err(EngineError::InvalidId(format!(
                "invalid reference type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub community_id: i64,
    /// `None` for system-generated entries such as commission.
    pub user_id: Option<i64>,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub reference_type: Option<ReferenceType>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        community_id: i64,
        user_id: Option<i64>,
        kind: TransactionKind,
        amount: MoneyCents,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            community_id,
            user_id,
            kind,
            amount,
            description,
            reference_id: None,
            reference_type: None,
            idempotency_key: None,
            created_at,
        })
    }

    #[must_use]
    pub fn reference(mut self, reference_type: ReferenceType, reference_id: impl Into<String>) -> Self {
        self.reference_type = Some(reference_type);
        self.reference_id = Some(reference_id.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fund_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: i64,
    pub user_id: Option<i64>,
    pub kind: String,
    pub amount: i64,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledger_accounts::Entity",
        from = "Column::CommunityId",
        to = "super::ledger_accounts::Column::CommunityId",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Fund,
}

impl Related<super::ledger_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fund.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            community_id: ActiveValue::Set(tx.community_id),
            user_id: ActiveValue::Set(tx.user_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount.cents()),
            description: ActiveValue::Set(tx.description.clone()),
            reference_id: ActiveValue::Set(tx.reference_id.clone()),
            reference_type: ActiveValue::Set(tx.reference_type.map(|r| r.as_str().to_string())),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            community_id: model.community_id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: MoneyCents::new(model.amount),
            description: model.description,
            reference_id: model.reference_id,
            reference_type: model
                .reference_type
                .as_deref()
                .map(ReferenceType::try_from)
                .transpose()?,
            idempotency_key: model.idempotency_key,
            created_at: model.created_at,
        })
    }
}
