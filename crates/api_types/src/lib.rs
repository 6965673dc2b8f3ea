//! Wire types shared between the Giftpool server and its clients.
//!
//! All monetary amounts travel as integer minor units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Uyu,
    Usd,
    Eur,
}

pub mod item {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum ItemType {
        #[default]
        Normal,
        Pooled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemNew {
        pub title: String,
        #[serde(default)]
        pub item_type: ItemType,
        pub target_amount_minor: Option<i64>,
        #[serde(default)]
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Item {
        pub id: String,
        pub title: String,
        pub item_type: ItemType,
        pub target_amount_minor: Option<i64>,
        pub current_amount_minor: i64,
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundingStatus {
        pub current_amount_minor: i64,
        pub target_amount_minor: Option<i64>,
        pub currency: Currency,
        pub contributions: Vec<super::contribution::Contribution>,
    }
}

pub mod contribution {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionNew {
        pub contributor_name: String,
        pub amount_minor: i64,
        #[serde(default)]
        pub currency: Currency,
        pub message: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Contribution {
        pub id: String,
        pub item_id: String,
        pub contributor_name: String,
        pub amount_minor: i64,
        pub currency: Currency,
        pub message: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupSummary {
        pub id: String,
        pub name: String,
        pub member_count: u64,
        pub created_at: DateTime<Utc>,
    }

    /// Returned from group creation: the group plus its first invite token.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupCreated {
        pub id: String,
        pub name: String,
        pub invite_token: String,
        pub invite_expires_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupDetail {
        pub id: String,
        pub name: String,
        pub created_at: DateTime<Utc>,
        pub members: Vec<super::member::Member>,
    }
}

pub mod invite {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InviteNew {
        pub expires_at: Option<DateTime<Utc>>,
        pub max_uses: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Invite {
        pub token: String,
        pub group_id: String,
        pub expires_at: Option<DateTime<Utc>>,
        pub max_uses: Option<i32>,
        pub uses_count: i32,
        pub is_active: bool,
    }

    /// Pre-login preview of what a token unlocks.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct InviteInfo {
        pub group_name: String,
        pub expires_at: Option<DateTime<Utc>>,
        pub is_active: bool,
    }
}

pub mod member {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum Role {
        Owner,
        #[default]
        Member,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Member {
        pub user_id: String,
        pub name: String,
        pub role: Role,
        pub joined_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub birthday_user_id: String,
        pub title: Option<String>,
        pub amount_minor: i64,
        #[serde(default)]
        pub currency: Currency,
        pub payment_account: String,
        pub note: Option<String>,
        /// When omitted, every current member shares the cost.
        pub participants: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Expense {
        pub id: String,
        pub group_id: String,
        pub birthday_user_id: String,
        pub paid_by_user_id: String,
        pub title: Option<String>,
        pub amount_minor: i64,
        pub currency: Currency,
        pub payment_account: String,
        pub note: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseWithDebts {
        pub expense: Expense,
        pub debts: Vec<super::debt::Debt>,
    }
}

pub mod debt {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum Status {
        #[default]
        Pending,
        Paid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Debt {
        pub id: String,
        pub expense_id: String,
        pub owed_by_user_id: String,
        pub owed_to_user_id: String,
        pub amount_minor: i64,
        pub currency: Currency,
        pub status: Status,
        pub paid_at: Option<DateTime<Utc>>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceLine {
        pub currency: Currency,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Balances {
        pub owed_to_me: Vec<BalanceLine>,
        pub i_owe: Vec<BalanceLine>,
    }
}
