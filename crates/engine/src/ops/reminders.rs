use std::future::Future;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{QueryFilter, prelude::*};
use thiserror::Error;
use tracing::{info, warn};

use crate::{NotificationType, ResultEngine, group_members, groups, users};

use super::Engine;

/// Personal reminders fire when the birthday is this many days out.
const PERSONAL_WINDOW_DAYS: std::ops::RangeInclusive<i64> = 30..=31;
/// Group reminders fire exactly this many days out.
const GROUP_LEAD_DAYS: i64 = 14;

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailerError(pub String);

/// Outbound email delivery, implemented by the application shell.
///
/// The engine decides *who* gets *which* reminder and claims each one in the
/// dedup log before calling here; implementations only render and send.
pub trait Mailer: Send + Sync {
    /// Heads-up to a user about their own upcoming birthday.
    fn send_personal_reminder(
        &self,
        to_email: &str,
        to_name: &str,
        birthday: NaiveDate,
        days_until: i64,
        base_url: &str,
    ) -> impl Future<Output = Result<(), MailerError>> + Send;

    /// Nudge to a group member that a fellow member's birthday is close.
    fn send_group_reminder(
        &self,
        to_email: &str,
        to_name: &str,
        birthday_name: &str,
        group_name: &str,
        birthday: NaiveDate,
        base_url: &str,
    ) -> impl Future<Output = Result<(), MailerError>> + Send;
}

/// Tally of one reminder sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReminderRun {
    pub personal_sent: u64,
    pub group_sent: u64,
    /// Claims lost to an earlier run or a concurrent worker.
    pub skipped_duplicates: u64,
    /// Claimed but the mailer failed. The claim stands; these are never
    /// retried.
    pub failed: u64,
}

/// Next occurrence of `birthday` on or after `today`. A Feb 29 birthday
/// falls on Feb 28 in non-leap years.
pub(super) fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> NaiveDate {
    let in_year = |year: i32| {
        birthday
            .with_year(year)
            .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
    };
    match in_year(today.year()) {
        Some(date) if date >= today => date,
        _ => match in_year(today.year() + 1) {
            Some(date) => date,
            // Feb 28 exists in every year.
            None => today,
        },
    }
}

impl Engine {
    /// One idempotent sweep over every upcoming birthday.
    ///
    /// Any number of processes may run this for the same day; the dedup log
    /// guarantees each logical reminder is sent at most once ever. A claim is
    /// not released when the send fails, trading a lost email for the
    /// certainty of never double-sending.
    pub async fn run_daily_reminders<M: Mailer>(
        &self,
        now: DateTime<Utc>,
        base_url: &str,
        mailer: &M,
    ) -> ResultEngine<ReminderRun> {
        let today = now.date_naive();
        let mut run = ReminderRun::default();

        let celebrants = users::Entity::find()
            .filter(users::Column::Birthday.is_not_null())
            .all(&self.database)
            .await?;

        for celebrant in &celebrants {
            let Some(birthday) = celebrant.birthday else {
                continue;
            };
            let upcoming = next_birthday(birthday, today);
            let days_until = (upcoming - today).num_days();

            if PERSONAL_WINDOW_DAYS.contains(&days_until) {
                self.personal_reminder(celebrant, upcoming, days_until, now, base_url, mailer, &mut run)
                    .await?;
            }
            if days_until == GROUP_LEAD_DAYS {
                self.group_reminders(celebrant, upcoming, now, base_url, mailer, &mut run)
                    .await?;
            }
        }

        info!(
            personal_sent = run.personal_sent,
            group_sent = run.group_sent,
            skipped_duplicates = run.skipped_duplicates,
            failed = run.failed,
            "reminder sweep finished"
        );
        Ok(run)
    }

    async fn personal_reminder<M: Mailer>(
        &self,
        celebrant: &users::Model,
        upcoming: NaiveDate,
        days_until: i64,
        now: DateTime<Utc>,
        base_url: &str,
        mailer: &M,
        run: &mut ReminderRun,
    ) -> ResultEngine<()> {
        let claimed = self
            .try_claim_notification(
                NotificationType::Birthday30Days,
                &celebrant.id,
                None,
                None,
                upcoming,
                now,
            )
            .await?;
        if !claimed {
            run.skipped_duplicates += 1;
            return Ok(());
        }

        match mailer
            .send_personal_reminder(&celebrant.email, &celebrant.name, upcoming, days_until, base_url)
            .await
        {
            Ok(()) => run.personal_sent += 1,
            Err(err) => {
                warn!(user_id = %celebrant.id, error = %err, "personal reminder failed");
                run.failed += 1;
            }
        }
        Ok(())
    }

    async fn group_reminders<M: Mailer>(
        &self,
        celebrant: &users::Model,
        upcoming: NaiveDate,
        now: DateTime<Utc>,
        base_url: &str,
        mailer: &M,
        run: &mut ReminderRun,
    ) -> ResultEngine<()> {
        let shared_groups: Vec<(group_members::Model, Option<groups::Model>)> =
            group_members::Entity::find()
                .filter(group_members::Column::UserId.eq(celebrant.id.clone()))
                .find_also_related(groups::Entity)
                .all(&self.database)
                .await?;

        for (_, group) in shared_groups {
            let Some(group) = group else { continue };

            let recipients: Vec<(group_members::Model, Option<users::Model>)> =
                group_members::Entity::find()
                    .filter(group_members::Column::GroupId.eq(group.id.clone()))
                    .filter(group_members::Column::UserId.ne(celebrant.id.clone()))
                    .find_also_related(users::Entity)
                    .all(&self.database)
                    .await?;

            for (_, recipient) in recipients {
                let Some(recipient) = recipient else { continue };

                let claimed = self
                    .try_claim_notification(
                        NotificationType::GroupBirthday14Days,
                        &recipient.id,
                        Some(&group.id),
                        Some(&celebrant.id),
                        upcoming,
                        now,
                    )
                    .await?;
                if !claimed {
                    run.skipped_duplicates += 1;
                    continue;
                }

                match mailer
                    .send_group_reminder(
                        &recipient.email,
                        &recipient.name,
                        &celebrant.name,
                        &group.name,
                        upcoming,
                        base_url,
                    )
                    .await
                {
                    Ok(()) => run.group_sent += 1,
                    Err(err) => {
                        warn!(
                            user_id = %recipient.id,
                            group_id = %group.id,
                            error = %err,
                            "group reminder failed"
                        );
                        run.failed += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn next_birthday_stays_in_year_when_ahead() {
        assert_eq!(next_birthday(d(1990, 9, 15), d(2026, 8, 30)), d(2026, 9, 15));
    }

    #[test]
    fn next_birthday_rolls_to_next_year_when_passed() {
        assert_eq!(next_birthday(d(1990, 3, 1), d(2026, 8, 30)), d(2027, 3, 1));
    }

    #[test]
    fn next_birthday_today_counts_as_zero_days_out() {
        assert_eq!(next_birthday(d(1990, 8, 30), d(2026, 8, 30)), d(2026, 8, 30));
    }

    #[test]
    fn leap_day_clamps_to_feb_28() {
        assert_eq!(next_birthday(d(1992, 2, 29), d(2026, 1, 10)), d(2026, 2, 28));
        // Leap years keep the real date.
        assert_eq!(next_birthday(d(1992, 2, 29), d(2028, 1, 10)), d(2028, 2, 29));
    }
}
