//! Transaction primitives.
//!
//! A `Transaction` is a single-entry ledger row: it references exactly one
//! account and contributes a signed effect to that account's cached balance.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Signed contribution of an amount to an account balance.
    ///
    /// This is the single place the income/expense sign convention lives:
    /// `+amount` for income, `-amount` for expense. All balance mutations and
    /// reverts go through it.
    #[must_use]
    pub fn signed_effect(self, amount_minor: i64) -> i64 {
        match self {
            Self::Income => amount_minor,
            Self::Expense => -amount_minor,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub amount: MoneyCents,
    pub description: String,
    pub occurred_on: NaiveDate,
    pub kind: TransactionKind,
    pub notes: Option<String>,
    pub category_id: Uuid,
    pub account_id: Uuid,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        amount_minor: i64,
        description: String,
        occurred_on: NaiveDate,
        kind: TransactionKind,
        notes: Option<String>,
        category_id: Uuid,
        account_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            amount: MoneyCents::new(amount_minor),
            description,
            occurred_on,
            kind,
            notes,
            category_id,
            account_id,
            deleted: false,
            created_at,
            updated_at: None,
        })
    }

    /// Signed contribution of this transaction to its account balance.
    #[must_use]
    pub fn effect(&self) -> MoneyCents {
        MoneyCents::new(self.kind.signed_effect(self.amount.cents()))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub description: String,
    pub occurred_on: Date,
    pub kind: String,
    pub notes: Option<String>,
    pub category_id: String,
    pub account_id: String,
    pub deleted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Categories,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_on: ActiveValue::Set(tx.occurred_on),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            notes: ActiveValue::Set(tx.notes.clone()),
            category_id: ActiveValue::Set(tx.category_id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            deleted: ActiveValue::Set(tx.deleted),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("transaction not exists".to_string()))?,
            user_id: model.user_id,
            amount: MoneyCents::new(model.amount_minor),
            description: model.description,
            occurred_on: model.occurred_on,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            notes: model.notes,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| EngineError::NotFound("category not exists".to_string()))?,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::NotFound("account not exists".to_string()))?,
            deleted: model.deleted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
