use sea_orm::{DatabaseConnection, DbErr, SqlErr};

use crate::{EngineError, ResultEngine};

mod access;
mod contributions;
mod debts;
mod expenses;
mod groups;
mod invites;
mod items;
mod memberships;
mod notifications;
mod reminders;

pub use debts::Balances;
pub use expenses::NewExpense;
pub use groups::GroupSummary;
pub use items::FundingStatus;
pub use reminders::{Mailer, MailerError, ReminderRun};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// What happens when the sole OWNER of a group is removed while other
/// members remain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OwnerExitPolicy {
    /// Promote the longest-standing remaining member to OWNER.
    #[default]
    PromoteOldest,
    /// Reject with `LastOwnerCannotLeave`.
    Block,
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    owner_exit: OwnerExitPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    owner_exit: OwnerExitPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the owner-exit policy (defaults to promoting the oldest
    /// remaining member).
    pub fn owner_exit(mut self, policy: OwnerExitPolicy) -> EngineBuilder {
        self.owner_exit = policy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            owner_exit: self.owner_exit,
        })
    }
}
