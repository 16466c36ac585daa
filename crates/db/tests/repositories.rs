//! Repository behaviour against a real database: ownership scoping,
//! unique constraints, upsert rules and cascades.

use assert_matches::assert_matches;
use serde_json::json;
use sqlx::PgPool;
use widgetry_core::notification::EmailNotificationConfig;
use widgetry_db::models::google::UpsertGoogleSheetToken;
use widgetry_db::models::user::CreateUser;
use widgetry_db::models::widget::{CreatePreFill, WidgetWrite};
use widgetry_db::repositories::{
    EmailNotificationRepo, GoogleTokenRepo, OAuthStateRepo, PreFillRepo, PricingColumnRepo,
    PricingContainerRepo, SubmissionRepo, UserRepo, WidgetRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: Some("hash".into()),
            is_oauth: false,
        },
    )
    .await
    .unwrap()
    .id
}

fn widget(widget_type: &str) -> WidgetWrite {
    WidgetWrite {
        widget_type: widget_type.to_string(),
        name: "Contact".into(),
        widget_fields: json!([]),
        post_submit_action: "success_msg".into(),
        direction: "ltr".into(),
        default_language: "en".into(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_email_violates_unique_constraint(pool: PgPool) {
    user(&pool, "dup@example.com").await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            email: "dup@example.com".into(),
            password_hash: None,
            is_oauth: true,
        },
    )
    .await
    .unwrap_err();

    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_users_email"));
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn widget_lookup_is_scoped_to_owner(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    let other = user(&pool, "other@example.com").await;
    let created = WidgetRepo::create(&pool, owner, &widget("contact_form")).await.unwrap();

    assert!(WidgetRepo::find_owned(&pool, created.id, owner).await.unwrap().is_some());
    assert!(WidgetRepo::find_owned(&pool, created.id, other).await.unwrap().is_none());
    assert!(!WidgetRepo::delete_owned(&pool, created.id, other).await.unwrap());
    assert!(WidgetRepo::delete_owned(&pool, created.id, owner).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn widget_writes_roll_back_with_their_transaction(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;

    let mut tx = pool.begin().await.unwrap();
    let w = WidgetRepo::create(&mut *tx, owner, &widget("contact_form")).await.unwrap();
    let items = [CreatePreFill { field_id: "a".into(), parameter_name: "pa".into() }];
    PreFillRepo::replace_for_widget(&mut *tx, w.id, &items).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(WidgetRepo::find_by_id(&pool, w.id).await.unwrap().is_none());
    assert!(PreFillRepo::list_for_widget(&pool, w.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn widget_type_filter_ignores_case(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    WidgetRepo::create(&pool, owner, &widget("contact_form")).await.unwrap();
    WidgetRepo::create(&pool, owner, &widget("Form_Builder")).await.unwrap();

    let all = WidgetRepo::list_for_user(&pool, owner, None).await.unwrap();
    let filtered = WidgetRepo::list_for_user(&pool, owner, Some("FORM_BUILDER")).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].widget_type, "Form_Builder");
}

#[sqlx::test(migrations = "./migrations")]
async fn invalid_post_submit_action_is_rejected(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    let mut input = widget("contact_form");
    input.post_submit_action = "explode".into();
    assert!(WidgetRepo::create(&pool, owner, &input).await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn pre_fills_are_replaced_wholesale(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    let w = WidgetRepo::create(&pool, owner, &widget("contact_form")).await.unwrap();

    let first = [
        CreatePreFill { field_id: "a".into(), parameter_name: "pa".into() },
        CreatePreFill { field_id: "b".into(), parameter_name: "pb".into() },
    ];
    PreFillRepo::replace_for_widget(&pool, w.id, &first).await.unwrap();
    let second = [CreatePreFill { field_id: "c".into(), parameter_name: "pc".into() }];
    PreFillRepo::replace_for_widget(&pool, w.id, &second).await.unwrap();

    let rows = PreFillRepo::list_for_widget(&pool, w.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].field_id, "c");
}

#[sqlx::test(migrations = "./migrations")]
async fn email_notification_upsert_keeps_one_row(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    let w = WidgetRepo::create(&pool, owner, &widget("contact_form")).await.unwrap();

    let mut config = EmailNotificationConfig {
        subject: "New lead".into(),
        email: vec!["a@example.com".into()],
        ..Default::default()
    };
    let first = EmailNotificationRepo::upsert(&pool, w.id, &config).await.unwrap();
    config.subject = "Updated".into();
    let second = EmailNotificationRepo::upsert(&pool, w.id, &config).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.subject, "Updated");
    assert_eq!(second.email, vec!["a@example.com".to_string()]);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_widget_cascades_to_submissions(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    let w = WidgetRepo::create(&pool, owner, &widget("contact_form")).await.unwrap();
    let data = json!({"Name": "Ada"}).as_object().unwrap().clone();
    SubmissionRepo::create(&pool, w.id, &data).await.unwrap();
    assert_eq!(SubmissionRepo::count_for_widget(&pool, w.id).await.unwrap(), 1);

    WidgetRepo::delete_owned(&pool, w.id, owner).await.unwrap();
    assert_eq!(SubmissionRepo::count_for_widget(&pool, w.id).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Google credentials
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn token_upsert_keeps_refresh_token_when_none_given(pool: PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    GoogleTokenRepo::upsert(
        &pool,
        &UpsertGoogleSheetToken {
            user_id: owner,
            encrypted_access_token: "access-1".into(),
            encrypted_refresh_token: Some("refresh-1".into()),
            access_token_expires_at: None,
        },
    )
    .await
    .unwrap();

    let updated = GoogleTokenRepo::upsert(
        &pool,
        &UpsertGoogleSheetToken {
            user_id: owner,
            encrypted_access_token: "access-2".into(),
            encrypted_refresh_token: None,
            access_token_expires_at: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.encrypted_access_token, "access-2");
    assert_eq!(updated.encrypted_refresh_token.as_deref(), Some("refresh-1"));
}

#[sqlx::test(migrations = "./migrations")]
async fn oauth_state_is_consumed_once(pool: PgPool) {
    OAuthStateRepo::create(&pool, "abc").await.unwrap();
    assert!(OAuthStateRepo::consume(&pool, "abc").await.unwrap());
    assert!(!OAuthStateRepo::consume(&pool, "abc").await.unwrap());
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn pricing_columns_append_in_order_and_stay_in_their_container(pool: PgPool) {
    use widgetry_db::models::pricing::PricingContainerWrite;

    let owner = user(&pool, "owner@example.com").await;
    let input = PricingContainerWrite {
        title: "Plans".into(),
        layout: json!({}),
        appearance: json!({}),
    };
    let a = PricingContainerRepo::create(&pool, owner, &input).await.unwrap();
    let b = PricingContainerRepo::create(&pool, owner, &input).await.unwrap();

    let first = PricingColumnRepo::create(&pool, a.id, &json!({"title": "Basic"})).await.unwrap();
    let second = PricingColumnRepo::create(&pool, a.id, &json!({"title": "Pro"})).await.unwrap();
    assert_eq!(first.position, 0);
    assert_eq!(second.position, 1);

    assert!(PricingColumnRepo::update_body(&pool, b.id, first.id, &json!({})).await.unwrap().is_none());
    assert!(!PricingColumnRepo::delete(&pool, b.id, first.id).await.unwrap());

    let cols = PricingColumnRepo::list_for_container(&pool, a.id).await.unwrap();
    assert_eq!(cols.iter().map(|c| c.id).collect::<Vec<_>>(), vec![first.id, second.id]);
}
