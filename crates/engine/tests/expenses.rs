use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};

use engine::{Currency, DebtStatus, Engine, EngineError, NewExpense};
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

/// Group of `user_ids` with the first id as owner/creator.
async fn group_of(engine: &Engine, db: &DatabaseConnection, user_ids: &[&str]) -> String {
    for id in user_ids {
        insert_user(db, id, None).await;
    }
    let (group, invite) = engine
        .create_group("Cumple", user_ids[0], Utc::now())
        .await
        .unwrap();
    for id in &user_ids[1..] {
        engine
            .redeem_invite(&invite.token, id, Utc::now())
            .await
            .unwrap();
    }
    group.id
}

fn expense<'a>(group_id: &'a str, birthday: &'a str, payer: &'a str, amount: i64) -> NewExpense<'a> {
    NewExpense {
        group_id,
        birthday_user_id: birthday,
        paid_by_user_id: payer,
        title: Some("Regalo"),
        amount_minor: amount,
        currency: Currency::Uyu,
        payment_account: "CBU 000123",
        note: None,
        participants: None,
    }
}

#[tokio::test]
async fn expense_fans_out_into_even_shares() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2", "u3", "u4"]).await;

    // u1 pays 1000 for u4's gift; u2 and u3 owe 500 each.
    let (created, debts) = engine
        .record_expense(expense(&group_id, "u4", "u1", 1_000), Utc::now())
        .await
        .unwrap();

    assert_eq!(created.amount_minor, 1_000);
    assert_eq!(debts.len(), 2);
    for debt in &debts {
        assert_eq!(debt.amount_minor, 500);
        assert_eq!(debt.owed_to_user_id, "u1");
        assert_eq!(debt.status, DebtStatus::Pending.as_str());
    }
    let debtors: Vec<&str> = debts.iter().map(|d| d.owed_by_user_id.as_str()).collect();
    assert_eq!(debtors, vec!["u2", "u3"]);
}

#[tokio::test]
async fn remainder_lands_on_lowest_user_ids() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2", "u3", "u4", "u5"]).await;

    // Payer u1 and birthday u2 are excluded; u3, u4, u5 split 1001.
    let (_, debts) = engine
        .record_expense(expense(&group_id, "u2", "u1", 1_001), Utc::now())
        .await
        .unwrap();

    let shares: Vec<(&str, i64)> = debts
        .iter()
        .map(|d| (d.owed_by_user_id.as_str(), d.amount_minor))
        .collect();
    assert_eq!(shares, vec![("u3", 334), ("u4", 334), ("u5", 333)]);
    assert_eq!(debts.iter().map(|d| d.amount_minor).sum::<i64>(), 1_001);
}

#[tokio::test]
async fn explicit_participants_narrow_the_split() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2", "u3", "u4"]).await;

    let mut params = expense(&group_id, "u4", "u1", 900);
    // Duplicates collapse; payer and birthday user are dropped if listed.
    let chosen = ["u2", "u2", "u3", "u1", "u4"];
    params.participants = Some(&chosen);
    let (_, debts) = engine.record_expense(params, Utc::now()).await.unwrap();

    let shares: Vec<(&str, i64)> = debts
        .iter()
        .map(|d| (d.owed_by_user_id.as_str(), d.amount_minor))
        .collect();
    assert_eq!(shares, vec![("u2", 450), ("u3", 450)]);
}

#[tokio::test]
async fn participant_outside_the_group_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2", "u3"]).await;
    insert_user(&db, "stranger", None).await;

    let mut params = expense(&group_id, "u3", "u1", 600);
    let chosen = ["u2", "stranger"];
    params.participants = Some(&chosen);
    let err = engine.record_expense(params, Utc::now()).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn payer_cannot_record_their_own_gift() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2"]).await;

    let err = engine
        .record_expense(expense(&group_id, "u1", "u1", 500), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn two_person_group_yields_no_debts() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2"]).await;

    let (created, debts) = engine
        .record_expense(expense(&group_id, "u2", "u1", 2_500), Utc::now())
        .await
        .unwrap();
    assert_eq!(created.amount_minor, 2_500);
    assert!(debts.is_empty());
}

#[tokio::test]
async fn settlement_is_permissioned_and_irreversible() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2", "u3", "u4"]).await;

    let (_, debts) = engine
        .record_expense(expense(&group_id, "u4", "u1", 1_000), Utc::now())
        .await
        .unwrap();
    let debt = debts.iter().find(|d| d.owed_by_user_id == "u2").unwrap();

    // u3 is neither debtor nor creditor of this row.
    let err = engine
        .settle_debt(&debt.id, "u3", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let settled = engine
        .settle_debt(&debt.id, "u2", Utc::now())
        .await
        .unwrap();
    assert_eq!(settled.status, DebtStatus::Paid.as_str());
    assert!(settled.paid_at.is_some());

    let err = engine
        .settle_debt(&debt.id, "u1", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadySettled);
}

#[tokio::test]
async fn expenses_listing_filters_by_birthday_user() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2", "u3"]).await;

    engine
        .record_expense(expense(&group_id, "u2", "u1", 500), Utc::now())
        .await
        .unwrap();
    engine
        .record_expense(expense(&group_id, "u3", "u1", 700), Utc::now())
        .await
        .unwrap();

    let all = engine
        .expenses_for_group(&group_id, "u2", None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let for_u3 = engine
        .expenses_for_group(&group_id, "u2", Some("u3"))
        .await
        .unwrap();
    assert_eq!(for_u3.len(), 1);
    assert_eq!(for_u3[0].amount_minor, 700);
}

#[tokio::test]
async fn balances_sum_pending_debts_per_currency() {
    let (engine, db) = engine_with_db().await;
    let group_id = group_of(&engine, &db, &["u1", "u2", "u3", "u4"]).await;

    let (_, uyu_debts) = engine
        .record_expense(expense(&group_id, "u4", "u1", 1_000), Utc::now())
        .await
        .unwrap();
    let mut usd = expense(&group_id, "u4", "u1", 600);
    usd.currency = Currency::Usd;
    engine.record_expense(usd, Utc::now()).await.unwrap();

    let creditor = engine.balances(&group_id, "u1").await.unwrap();
    assert_eq!(
        creditor.owed_to_me,
        vec![("USD".to_string(), 600), ("UYU".to_string(), 1_000)]
    );
    assert!(creditor.i_owe.is_empty());

    let debtor = engine.balances(&group_id, "u2").await.unwrap();
    assert_eq!(
        debtor.i_owe,
        vec![("USD".to_string(), 300), ("UYU".to_string(), 500)]
    );

    // Settled debts drop out of the standing.
    let u2_uyu = uyu_debts.iter().find(|d| d.owed_by_user_id == "u2").unwrap();
    engine
        .settle_debt(&u2_uyu.id, "u2", Utc::now())
        .await
        .unwrap();
    let debtor = engine.balances(&group_id, "u2").await.unwrap();
    assert_eq!(debtor.i_owe, vec![("USD".to_string(), 300)]);
}

#[tokio::test]
async fn balances_do_not_cross_group_boundaries() {
    let (engine, db) = engine_with_db().await;
    let first = group_of(&engine, &db, &["u1", "u2", "u3"]).await;
    let (second, invite) = engine
        .create_group("Oficina", "u1", Utc::now())
        .await
        .unwrap();
    engine
        .redeem_invite(&invite.token, "u2", Utc::now())
        .await
        .unwrap();

    engine
        .record_expense(expense(&first, "u3", "u1", 900), Utc::now())
        .await
        .unwrap();

    // u1's credit lives in the first group only.
    let standing = engine.balances(&second.id, "u1").await.unwrap();
    assert!(standing.owed_to_me.is_empty());
    assert!(standing.i_owe.is_empty());

    // Non-members may not read a group's standings.
    assert!(matches!(
        engine.balances(&second.id, "u3").await.unwrap_err(),
        EngineError::Forbidden(_)
    ));
}
