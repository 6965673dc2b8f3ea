use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    Contribution, Currency, EngineError, GiftItem, ItemType, ResultEngine, contributions, items,
};

use super::{Engine, normalize_required_name};

/// Snapshot of a pooled item's funding progress.
///
/// `contributions` is one page, ordered oldest first; completion is a caller
/// concern (compare the two amounts) and is undefined when no target is set.
#[derive(Clone, Debug, PartialEq)]
pub struct FundingStatus {
    pub current_amount_minor: i64,
    pub target_amount_minor: Option<i64>,
    pub currency: Currency,
    pub contributions: Vec<Contribution>,
}

impl Engine {
    /// Registers a gift item with the ledger.
    ///
    /// Item metadata (descriptions, images, wishlist placement) lives in the
    /// catalog outside this crate; the ledger only needs identity, type,
    /// currency and the optional funding target.
    pub async fn new_item(
        &self,
        title: &str,
        item_type: ItemType,
        target_amount_minor: Option<i64>,
        currency: Currency,
    ) -> ResultEngine<GiftItem> {
        let title = normalize_required_name(title, "item")?;
        let item = GiftItem::new(title, item_type, target_amount_minor, currency)?;
        items::ActiveModel::from(&item).insert(&self.database).await?;
        Ok(item)
    }

    pub async fn item(&self, item_id: &str) -> ResultEngine<GiftItem> {
        let model = items::Entity::find_by_id(item_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("item not exists".to_string()))?;
        GiftItem::try_from(model)
    }

    /// Pure read of an item's funding state with one page of contributions.
    ///
    /// Ordered by creation time ascending (id as tiebreak) so pagination is
    /// restartable; a snapshot read, no transaction needed.
    pub async fn funding_status(
        &self,
        item_id: &str,
        limit: u64,
        offset: u64,
    ) -> ResultEngine<FundingStatus> {
        let item = self.item(item_id).await?;

        let rows = contributions::Entity::find()
            .filter(contributions::Column::ItemId.eq(item_id.to_string()))
            .order_by_asc(contributions::Column::CreatedAt)
            .order_by_asc(contributions::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.database)
            .await?;

        let mut page = Vec::with_capacity(rows.len());
        for row in rows {
            page.push(Contribution::try_from(row)?);
        }

        Ok(FundingStatus {
            current_amount_minor: item.current_amount_minor,
            target_amount_minor: item.target_amount_minor,
            currency: item.currency,
            contributions: page,
        })
    }
}
