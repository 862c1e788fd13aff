//! Account entity: a money holder with a cached balance.
//!
//! The cached `balance` is denormalized state. The ledger operations in
//! `ops::transactions` are the only writers; every other component treats it
//! as read-only.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub balance: MoneyCents,
    pub currency: String,
    pub description: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Creates a fresh account with a zero balance.
    ///
    /// Balances only ever move through ledger operations; an opening balance
    /// is entered as an ordinary transaction.
    pub fn new(
        name: String,
        currency: String,
        description: Option<String>,
        user_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            balance: MoneyCents::ZERO,
            currency,
            description,
            deleted: false,
            created_at,
            updated_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub balance_minor: i64,
    pub currency: String,
    pub description: Option<String>,
    pub deleted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            user_id: ActiveValue::Set(account.user_id.clone()),
            name: ActiveValue::Set(account.name.clone()),
            balance_minor: ActiveValue::Set(account.balance.cents()),
            currency: ActiveValue::Set(account.currency.clone()),
            description: ActiveValue::Set(account.description.clone()),
            deleted: ActiveValue::Set(account.deleted),
            created_at: ActiveValue::Set(account.created_at),
            updated_at: ActiveValue::Set(account.updated_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("account not exists".to_string()))?,
            user_id: model.user_id,
            name: model.name,
            balance: MoneyCents::new(model.balance_minor),
            currency: model.currency,
            description: model.description,
            deleted: model.deleted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
