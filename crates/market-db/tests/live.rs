//! Live integration tests for market-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/market-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{DateTime, Duration, Utc};
use market_core::{hash_password, hash_session_token, new_session_token};
use market_db::{
    add_product_image, confirm_payment, create_pending_order, create_product, create_session,
    create_user, daily_sales, delete_expired_sessions, delete_session, get_order_by_payment_intent,
    get_product, get_user_by_session_token, get_user_by_username, list_orders_for_customer,
    list_product_images, list_products, list_products_for_seller, product_sales, sales_totals,
    soft_delete_product, update_product, DbError, ProductInput,
};
use market_core::{sales::daily_breakdown_cutoff, SalesWindow};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_user(pool: &sqlx::PgPool, username: &str) -> i64 {
    let password = hash_password("password123", "pepper");
    create_user(pool, username, &format!("{username}@example.com"), &password)
        .await
        .unwrap_or_else(|e| panic!("insert_test_user failed for '{username}': {e}"))
        .id
}

async fn insert_test_product(pool: &sqlx::PgPool, seller_id: i64, name: &str, price: &str) -> i64 {
    let input = ProductInput {
        name,
        description: Some("test listing"),
        price: price.parse::<Decimal>().expect("price literal"),
    };
    create_product(pool, seller_id, &input)
        .await
        .unwrap_or_else(|e| panic!("insert_test_product failed for '{name}': {e}"))
        .id
}

/// Creates an order, optionally confirms it, then overwrites its `created_at`.
async fn insert_order_at(
    pool: &sqlx::PgPool,
    product_id: i64,
    intent: &str,
    amount: i64,
    paid: bool,
    created_at: DateTime<Utc>,
) {
    let order = create_pending_order(
        pool,
        "buyer@example.com",
        product_id,
        &format!("cs_{intent}"),
        intent,
        amount,
    )
    .await
    .expect("create_pending_order failed");

    if paid {
        confirm_payment(pool, intent)
            .await
            .expect("confirm_payment failed");
    }

    sqlx::query("UPDATE orders SET created_at = $1 WHERE id = $2")
        .bind(created_at)
        .bind(order.id)
        .execute(pool)
        .await
        .expect("backdate order");
}

async fn insert_order(
    pool: &sqlx::PgPool,
    product_id: i64,
    intent: &str,
    amount: i64,
    paid: bool,
    days_ago: i64,
) {
    let created_at = Utc::now() - Duration::days(days_ago);
    insert_order_at(pool, product_id, intent, amount, paid, created_at).await;
}

// ---------------------------------------------------------------------------
// Section 1: Users and sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_username_is_unique_violation(pool: sqlx::PgPool) {
    insert_test_user(&pool, "alice").await;

    let err = create_user(
        &pool,
        "alice",
        "other@example.com",
        &hash_password("password123", "pepper"),
    )
    .await
    .expect_err("second alice should fail");

    assert!(err.is_unique_violation(), "got: {err:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn session_token_resolves_until_deleted(pool: sqlx::PgPool) {
    let user_id = insert_test_user(&pool, "bob").await;
    let (token, digest) = new_session_token();

    create_session(&pool, user_id, &digest, Utc::now() + Duration::hours(1))
        .await
        .expect("create_session failed");

    let user = get_user_by_session_token(&pool, &hash_session_token(&token))
        .await
        .expect("lookup failed")
        .expect("session should resolve");
    assert_eq!(user.username, "bob");

    assert!(delete_session(&pool, &digest).await.expect("delete failed"));
    assert!(get_user_by_session_token(&pool, &digest)
        .await
        .expect("lookup failed")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn expired_session_does_not_resolve_and_is_pruned(pool: sqlx::PgPool) {
    let user_id = insert_test_user(&pool, "carol").await;
    let (_, digest) = new_session_token();

    create_session(&pool, user_id, &digest, Utc::now() - Duration::minutes(1))
        .await
        .expect("create_session failed");

    assert!(get_user_by_session_token(&pool, &digest)
        .await
        .expect("lookup failed")
        .is_none());
    assert_eq!(
        delete_expired_sessions(&pool, user_id)
            .await
            .expect("prune failed"),
        1
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_user_by_username_returns_none_for_unknown(pool: sqlx::PgPool) {
    assert!(get_user_by_username(&pool, "nobody")
        .await
        .expect("query failed")
        .is_none());
}

// ---------------------------------------------------------------------------
// Section 2: Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn created_product_has_zeroed_counters_and_seller(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Mug", "12.50").await;

    let product = get_product(&pool, product_id)
        .await
        .expect("get_product failed")
        .expect("product exists");

    assert_eq!(product.seller_id, seller_id);
    assert_eq!(product.seller_username, "seller");
    assert_eq!(product.price, "12.50".parse::<Decimal>().unwrap());
    assert_eq!(product.total_sales, 0);
    assert_eq!(product.total_sales_amount, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_product_requires_owner(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "owner").await;
    let intruder = insert_test_user(&pool, "intruder").await;
    let product_id = insert_test_product(&pool, owner, "Lamp", "30.00").await;

    let input = ProductInput {
        name: "Hijacked",
        description: None,
        price: "1.00".parse().unwrap(),
    };
    let err = update_product(&pool, product_id, intruder, &input)
        .await
        .expect_err("non-owner update must fail");
    assert!(matches!(err, DbError::NotFound));

    let updated = update_product(&pool, product_id, owner, &input)
        .await
        .expect("owner update succeeds");
    assert_eq!(updated.name, "Hijacked");
    assert!(updated.description.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn soft_deleted_product_leaves_catalog(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let keep = insert_test_product(&pool, seller_id, "Keep", "5.00").await;
    let gone = insert_test_product(&pool, seller_id, "Gone", "5.00").await;

    assert!(soft_delete_product(&pool, gone, seller_id)
        .await
        .expect("delete failed"));
    assert!(!soft_delete_product(&pool, gone, seller_id)
        .await
        .expect("second delete failed"));

    let catalog = list_products(&pool).await.expect("list failed");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].id, keep);
    assert!(get_product(&pool, gone).await.expect("get failed").is_none());
    assert_eq!(
        list_products_for_seller(&pool, seller_id)
            .await
            .expect("dashboard failed")
            .len(),
        1
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_images_are_listed_in_insertion_order(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Vase", "40.00").await;

    add_product_image(&pool, product_id, "https://cdn.example.com/a.jpg")
        .await
        .expect("add image a");
    add_product_image(&pool, product_id, "https://cdn.example.com/b.jpg")
        .await
        .expect("add image b");

    let images = list_product_images(&pool, product_id)
        .await
        .expect("list images");
    let urls: Vec<_> = images.iter().map(|i| i.image_url.as_str()).collect();
    assert_eq!(
        urls,
        ["https://cdn.example.com/a.jpg", "https://cdn.example.com/b.jpg"]
    );
}

// ---------------------------------------------------------------------------
// Section 3: Orders and payment confirmation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pending_order_starts_unpaid(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Hat", "19.99").await;

    let order = create_pending_order(&pool, "buyer@example.com", product_id, "cs_1", "pi_1", 19)
        .await
        .expect("create_pending_order failed");

    assert!(!order.has_paid);
    assert!(order.paid_at.is_none());
    assert_eq!(order.amount, 19);
    assert_eq!(order.checkout_session_id, "cs_1");
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_payment_intent_is_rejected(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Hat", "19.99").await;

    create_pending_order(&pool, "a@example.com", product_id, "cs_1", "pi_dup", 19)
        .await
        .expect("first order");
    let err = create_pending_order(&pool, "b@example.com", product_id, "cs_2", "pi_dup", 19)
        .await
        .expect_err("duplicate intent must fail");

    assert!(err.is_unique_violation(), "got: {err:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn confirm_payment_marks_paid_and_increments_once(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Scarf", "25.75").await;
    create_pending_order(&pool, "buyer@example.com", product_id, "cs_9", "pi_9", 25)
        .await
        .expect("create_pending_order failed");

    let first = confirm_payment(&pool, "pi_9").await.expect("first confirm");
    assert!(first.newly_paid);
    assert!(first.order.has_paid);
    assert!(first.order.paid_at.is_some());

    let second = confirm_payment(&pool, "pi_9").await.expect("second confirm");
    assert!(!second.newly_paid);
    assert!(second.order.has_paid);

    let product = get_product(&pool, product_id)
        .await
        .expect("get_product failed")
        .expect("product exists");
    assert_eq!(product.total_sales, 1);
    assert_eq!(product.total_sales_amount, 25);
}

#[sqlx::test(migrations = "../../migrations")]
async fn confirm_payment_unknown_intent_is_not_found(pool: sqlx::PgPool) {
    let err = confirm_payment(&pool, "pi_missing")
        .await
        .expect_err("unknown intent must fail");
    assert!(matches!(err, DbError::NotFound));
    assert!(get_order_by_payment_intent(&pool, "pi_missing")
        .await
        .expect("lookup failed")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn purchases_are_filtered_by_customer_email(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Book", "9.00").await;

    create_pending_order(&pool, "mine@example.com", product_id, "cs_a", "pi_a", 9)
        .await
        .expect("order a");
    create_pending_order(&pool, "theirs@example.com", product_id, "cs_b", "pi_b", 9)
        .await
        .expect("order b");

    let purchases = list_orders_for_customer(&pool, "mine@example.com")
        .await
        .expect("list purchases");
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].product_name, "Book");
}

// ---------------------------------------------------------------------------
// Section 4: Sales aggregation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sales_totals_respect_windows(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Widget", "10.00").await;

    insert_order(&pool, product_id, "pi_w", 1, true, 2).await;
    insert_order(&pool, product_id, "pi_m", 10, true, 20).await;
    insert_order(&pool, product_id, "pi_y", 100, true, 200).await;
    insert_order(&pool, product_id, "pi_l", 1000, true, 400).await;
    insert_order(&pool, product_id, "pi_pending", 5000, false, 1).await;

    let totals = sales_totals(&pool, seller_id, Utc::now().date_naive())
        .await
        .expect("sales_totals failed");

    assert_eq!(totals.weekly, 5001);
    assert_eq!(totals.monthly, 5011);
    assert_eq!(totals.yearly, 5111);
    assert_eq!(totals.lifetime, 6111);
}

#[sqlx::test(migrations = "../../migrations")]
async fn pending_order_counts_toward_sales(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Widget", "12.00").await;

    create_pending_order(&pool, "buyer@example.com", product_id, "cs_p", "pi_p", 12)
        .await
        .expect("create_pending_order failed");

    let totals = sales_totals(&pool, seller_id, Utc::now().date_naive())
        .await
        .expect("sales_totals failed");
    assert_eq!(totals.weekly, 12);
    assert_eq!(totals.lifetime, 12);

    let per_product = product_sales(&pool, seller_id)
        .await
        .expect("product_sales failed");
    assert_eq!(per_product.len(), 1);
    assert_eq!(per_product[0].sum, 12);
}

#[sqlx::test(migrations = "../../migrations")]
async fn window_cutoff_is_exclusive(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Widget", "10.00").await;
    let today = Utc::now().date_naive();
    let cutoff = SalesWindow::Weekly.cutoff(today);

    insert_order_at(&pool, product_id, "pi_edge", 1, true, cutoff).await;
    let inside = cutoff + Duration::seconds(1);
    insert_order_at(&pool, product_id, "pi_inside", 10, true, inside).await;

    let totals = sales_totals(&pool, seller_id, today)
        .await
        .expect("sales_totals failed");
    assert_eq!(totals.weekly, 10, "order at the cutoff is outside the week");
    assert_eq!(totals.monthly, 11);
    assert_eq!(totals.lifetime, 11);
}

#[sqlx::test(migrations = "../../migrations")]
async fn daily_breakdown_cutoff_is_exclusive(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let product_id = insert_test_product(&pool, seller_id, "Widget", "10.00").await;
    let since = daily_breakdown_cutoff(Utc::now().date_naive());

    insert_order_at(&pool, product_id, "pi_edge", 1, true, since).await;
    let inside = since + Duration::seconds(1);
    insert_order_at(&pool, product_id, "pi_inside", 10, true, inside).await;

    let daily = daily_sales(&pool, seller_id, since)
        .await
        .expect("daily_sales failed");
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].day, since.date_naive());
    assert_eq!(daily[0].sum, 10, "order at the cutoff is outside the breakdown");
}

#[sqlx::test(migrations = "../../migrations")]
async fn sales_totals_exclude_other_sellers(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let rival_id = insert_test_user(&pool, "rival").await;
    let mine = insert_test_product(&pool, seller_id, "Mine", "10.00").await;
    let theirs = insert_test_product(&pool, rival_id, "Theirs", "10.00").await;

    insert_order(&pool, mine, "pi_mine", 7, true, 1).await;
    insert_order(&pool, theirs, "pi_theirs", 70, true, 1).await;

    let totals = sales_totals(&pool, seller_id, Utc::now().date_naive())
        .await
        .expect("sales_totals failed");
    assert_eq!(totals.lifetime, 7);
    assert_eq!(totals.weekly, 7);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sales_totals_are_zero_without_orders(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;

    let totals = sales_totals(&pool, seller_id, Utc::now().date_naive())
        .await
        .expect("sales_totals failed");
    assert_eq!(totals.lifetime, 0);
    assert_eq!(totals.yearly, 0);
    assert_eq!(totals.monthly, 0);
    assert_eq!(totals.weekly, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn daily_and_product_breakdowns(pool: sqlx::PgPool) {
    let seller_id = insert_test_user(&pool, "seller").await;
    let alpha = insert_test_product(&pool, seller_id, "Alpha", "10.00").await;
    let beta = insert_test_product(&pool, seller_id, "Beta", "10.00").await;

    insert_order(&pool, alpha, "pi_1", 3, true, 1).await;
    insert_order(&pool, beta, "pi_2", 4, true, 1).await;
    insert_order(&pool, alpha, "pi_3", 5, true, 3).await;
    insert_order(&pool, beta, "pi_4", 6, true, 60).await;

    let since = daily_breakdown_cutoff(Utc::now().date_naive());
    let daily = daily_sales(&pool, seller_id, since)
        .await
        .expect("daily_sales failed");
    assert_eq!(daily.len(), 2, "60-day-old order is outside the breakdown");
    assert!(daily[0].day < daily[1].day, "ascending by day");
    assert_eq!(daily[0].sum, 5);
    assert_eq!(daily[1].sum, 7);

    let per_product = product_sales(&pool, seller_id)
        .await
        .expect("product_sales failed");
    assert_eq!(per_product.len(), 2);
    assert_eq!(per_product[0].product_name, "Alpha");
    assert_eq!(per_product[0].sum, 8);
    assert_eq!(per_product[1].product_name, "Beta");
    assert_eq!(per_product[1].sum, 10);
}
