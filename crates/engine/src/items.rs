//! Gift items and the derived funding total.
//!
//! `current_amount_minor` denormalizes the sum of the item's contributions
//! for cheap reads. The column is only ever touched by an atomic SQL
//! increment inside the same transaction that inserts the contribution row,
//! so it stays consistent with the contribution ledger under concurrency.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError};

/// Whether an item is bought outright or funded incrementally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Normal,
    Pooled,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Pooled => "pooled",
        }
    }
}

impl TryFrom<&str> for ItemType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "normal" => Ok(Self::Normal),
            "pooled" => Ok(Self::Pooled),
            other => Err(EngineError::InvalidItemType(format!(
                "invalid item type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GiftItem {
    pub id: Uuid,
    pub title: String,
    pub item_type: ItemType,
    pub target_amount_minor: Option<i64>,
    pub current_amount_minor: i64,
    pub currency: Currency,
}

impl GiftItem {
    pub fn new(
        title: String,
        item_type: ItemType,
        target_amount_minor: Option<i64>,
        currency: Currency,
    ) -> Result<Self, EngineError> {
        if let Some(target) = target_amount_minor {
            if target <= 0 {
                return Err(EngineError::InvalidAmount(
                    "target_amount_minor must be > 0".to_string(),
                ));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            item_type,
            target_amount_minor,
            current_amount_minor: 0,
            currency,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "gift_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub item_type: String,
    pub target_amount_minor: Option<i64>,
    pub current_amount_minor: i64,
    pub currency: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contributions::Entity")]
    Contributions,
}

impl Related<super::contributions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&GiftItem> for ActiveModel {
    fn from(item: &GiftItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            title: ActiveValue::Set(item.title.clone()),
            item_type: ActiveValue::Set(item.item_type.as_str().to_string()),
            target_amount_minor: ActiveValue::Set(item.target_amount_minor),
            current_amount_minor: ActiveValue::Set(item.current_amount_minor),
            currency: ActiveValue::Set(item.currency.code().to_string()),
            created_at: ActiveValue::Set(chrono::Utc::now()),
        }
    }
}

impl TryFrom<Model> for GiftItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("item not exists".to_string()))?,
            title: model.title,
            item_type: ItemType::try_from(model.item_type.as_str())?,
            target_amount_minor: model.target_amount_minor,
            current_amount_minor: model.current_amount_minor,
            currency: Currency::try_from(model.currency.as_str())?,
        })
    }
}
