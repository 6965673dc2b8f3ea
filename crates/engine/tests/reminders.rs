use std::sync::Mutex;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};

use engine::{Engine, Mailer, MailerError, NotificationType};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn insert_user(db: &DatabaseConnection, id: &str, birthday: Option<NaiveDate>) {
    engine::users::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        name: ActiveValue::Set(id.to_string()),
        email: ActiveValue::Set(format!("{id}@example.com")),
        hashed_password: ActiveValue::Set("secret".to_string()),
        birthday: ActiveValue::Set(birthday),
        created_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingMailer {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn log(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send_personal_reminder(
        &self,
        to_email: &str,
        _to_name: &str,
        _birthday: NaiveDate,
        days_until: i64,
        _base_url: &str,
    ) -> Result<(), MailerError> {
        if self.fail {
            return Err(MailerError("smtp unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push(format!("personal:{to_email}:{days_until}"));
        Ok(())
    }

    async fn send_group_reminder(
        &self,
        to_email: &str,
        _to_name: &str,
        birthday_name: &str,
        group_name: &str,
        _birthday: NaiveDate,
        _base_url: &str,
    ) -> Result<(), MailerError> {
        if self.fail {
            return Err(MailerError("smtp unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push(format!("group:{to_email}:{birthday_name}:{group_name}"));
        Ok(())
    }
}

#[tokio::test]
async fn notification_claim_is_at_most_once() {
    let (engine, db) = engine_with_db().await;
    insert_user(&db, "alice", None).await;

    let date = d(2026, 9, 29);
    let first = engine
        .try_claim_notification(
            NotificationType::Birthday30Days,
            "alice",
            None,
            None,
            date,
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(first);

    let second = engine
        .try_claim_notification(
            NotificationType::Birthday30Days,
            "alice",
            None,
            None,
            date,
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(!second);
}

#[tokio::test]
async fn distinct_identities_claim_independently() {
    let (engine, db) = engine_with_db().await;
    insert_user(&db, "alice", None).await;

    let date = d(2026, 9, 29);
    assert!(
        engine
            .try_claim_notification(
                NotificationType::GroupBirthday14Days,
                "alice",
                Some("g1"),
                Some("bob"),
                date,
                Utc::now(),
            )
            .await
            .unwrap()
    );
    // Same recipient and target, different group.
    assert!(
        engine
            .try_claim_notification(
                NotificationType::GroupBirthday14Days,
                "alice",
                Some("g2"),
                Some("bob"),
                date,
                Utc::now(),
            )
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn personal_reminder_fires_once_in_the_window() {
    let (engine, db) = engine_with_db().await;
    // 2026-08-30 + 30 days = 2026-09-29.
    insert_user(&db, "alice", Some(d(1990, 9, 29))).await;

    let now = Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap();
    let mailer = RecordingMailer::default();

    let run = engine
        .run_daily_reminders(now, "https://gifts.example", &mailer)
        .await
        .unwrap();
    assert_eq!(run.personal_sent, 1);
    assert_eq!(run.failed, 0);
    assert_eq!(mailer.log(), vec!["personal:alice@example.com:30"]);

    // Next day the birthday is 29 days out and the claim already exists.
    let run = engine
        .run_daily_reminders(now + Duration::days(1), "https://gifts.example", &mailer)
        .await
        .unwrap();
    assert_eq!(run.personal_sent, 0);
    assert_eq!(mailer.log().len(), 1);
}

#[tokio::test]
async fn rerun_on_the_same_day_skips_duplicates() {
    let (engine, db) = engine_with_db().await;
    insert_user(&db, "alice", Some(d(1990, 9, 29))).await;

    let now = Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap();
    let mailer = RecordingMailer::default();

    engine
        .run_daily_reminders(now, "https://gifts.example", &mailer)
        .await
        .unwrap();
    let rerun = engine
        .run_daily_reminders(now, "https://gifts.example", &mailer)
        .await
        .unwrap();
    assert_eq!(rerun.personal_sent, 0);
    assert_eq!(rerun.skipped_duplicates, 1);
    assert_eq!(mailer.log().len(), 1);
}

#[tokio::test]
async fn group_reminder_reaches_everyone_but_the_celebrant() {
    let (engine, db) = engine_with_db().await;
    // 2026-08-30 + 14 days = 2026-09-13.
    insert_user(&db, "alice", Some(d(1991, 9, 13))).await;
    insert_user(&db, "bob", None).await;
    insert_user(&db, "carol", None).await;

    let (_, invite) = engine
        .create_group("Equipo", "alice", Utc::now())
        .await
        .unwrap();
    engine
        .redeem_invite(&invite.token, "bob", Utc::now())
        .await
        .unwrap();
    engine
        .redeem_invite(&invite.token, "carol", Utc::now())
        .await
        .unwrap();

    let now = Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap();
    let mailer = RecordingMailer::default();
    let run = engine
        .run_daily_reminders(now, "https://gifts.example", &mailer)
        .await
        .unwrap();

    assert_eq!(run.group_sent, 2);
    let mut log = mailer.log();
    log.sort();
    assert_eq!(
        log,
        vec![
            "group:bob@example.com:alice:Equipo",
            "group:carol@example.com:alice:Equipo",
        ]
    );
    // No personal reminder at 14 days out.
    assert_eq!(run.personal_sent, 0);
}

#[tokio::test]
async fn failed_delivery_keeps_the_claim() {
    let (engine, db) = engine_with_db().await;
    insert_user(&db, "alice", Some(d(1990, 9, 29))).await;

    let now = Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap();
    let failing = RecordingMailer::failing();

    let run = engine
        .run_daily_reminders(now, "https://gifts.example", &failing)
        .await
        .unwrap();
    assert_eq!(run.failed, 1);
    assert_eq!(run.personal_sent, 0);

    // The claim survives the failure; a healthy rerun does not resend.
    let healthy = RecordingMailer::default();
    let run = engine
        .run_daily_reminders(now, "https://gifts.example", &healthy)
        .await
        .unwrap();
    assert_eq!(run.personal_sent, 0);
    assert_eq!(run.skipped_duplicates, 1);
    assert!(healthy.log().is_empty());
}

#[tokio::test]
async fn users_without_birthdays_are_ignored() {
    let (engine, db) = engine_with_db().await;
    insert_user(&db, "alice", None).await;

    let now = Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap();
    let mailer = RecordingMailer::default();
    let run = engine
        .run_daily_reminders(now, "https://gifts.example", &mailer)
        .await
        .unwrap();
    assert_eq!(run, engine::ReminderRun::default());
}
