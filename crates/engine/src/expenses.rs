//! Group gift expenses.
//!
//! An expense records that one member paid for a shared gift; recording it
//! fans out one debt per liable member (see `ops::expenses`). Expenses are
//! immutable once created; corrections are offsetting expenses.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "group_gift_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    /// The person the gift is for; excluded from the debt distribution.
    pub birthday_user_id: String,
    pub paid_by_user_id: String,
    pub title: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_account: String,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::debts::Entity")]
    Debts,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::debts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
