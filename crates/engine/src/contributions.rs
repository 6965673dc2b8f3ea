//! Contribution primitives.
//!
//! A `Contribution` is one funding event against a pooled item. Rows are
//! append-only: no update or delete is exposed, and a correction would be a
//! new offsetting record rather than a mutation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Uuid,
    pub item_id: Uuid,
    /// Display name, not necessarily a registered user.
    pub contributor_name: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(
        item_id: Uuid,
        contributor_name: String,
        amount_minor: i64,
        currency: Currency,
        message: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            item_id,
            contributor_name,
            amount_minor,
            currency,
            message,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub item_id: String,
    pub contributor_name: String,
    pub amount_minor: i64,
    pub currency: String,
    pub message: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::items::Entity",
        from = "Column::ItemId",
        to = "super::items::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Items,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Contribution> for ActiveModel {
    fn from(contribution: &Contribution) -> Self {
        Self {
            id: ActiveValue::Set(contribution.id.to_string()),
            item_id: ActiveValue::Set(contribution.item_id.to_string()),
            contributor_name: ActiveValue::Set(contribution.contributor_name.clone()),
            amount_minor: ActiveValue::Set(contribution.amount_minor),
            currency: ActiveValue::Set(contribution.currency.code().to_string()),
            message: ActiveValue::Set(contribution.message.clone()),
            created_at: ActiveValue::Set(contribution.created_at),
        }
    }
}

impl TryFrom<Model> for Contribution {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("contribution not exists".to_string()))?,
            item_id: Uuid::parse_str(&model.item_id)
                .map_err(|_| EngineError::KeyNotFound("item not exists".to_string()))?,
            contributor_name: model.contributor_name,
            amount_minor: model.amount_minor,
            currency: Currency::try_from(model.currency.as_str())?,
            message: model.message,
            created_at: model.created_at,
        })
    }
}
