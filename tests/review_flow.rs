//! 评论审核与评分聚合测试

use purestore_server::db::DbService;
use purestore_server::db::models::{
    Product, ProductCategory, ProductCreate, Review, ReviewStatus, User,
};
use purestore_server::db::repository::{ProductRepository, ReviewRepository, UserRepository};
use purestore_server::utils::PageQuery;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tempfile::TempDir;

async fn setup() -> (TempDir, Surreal<Db>) {
    let tmp = TempDir::new().expect("create tempdir");
    let service = DbService::new(&tmp.path().join("storefront.db"))
        .await
        .expect("open database");
    (tmp, service.db)
}

async fn seed_product(db: &Surreal<Db>, slug: &str) -> Product {
    ProductRepository::new(db.clone())
        .create(ProductCreate {
            name: format!("Test {}", slug),
            slug: slug.to_string(),
            description: "test product".to_string(),
            price: 999.0,
            original_price: None,
            category: ProductCategory::Accessories,
            images: None,
            features: None,
            specifications: None,
            stock: Some(10),
        })
        .await
        .expect("seed product")
}

async fn seed_user(db: &Surreal<Db>, email: &str) -> User {
    let hash = User::hash_password("password-123").unwrap();
    UserRepository::new(db.clone())
        .create("Reviewer".to_string(), email.to_string(), hash, None)
        .await
        .expect("seed user")
}

fn review(product: &RecordId, user: &RecordId, rating: i32) -> Review {
    Review {
        id: None,
        product: product.clone(),
        user: user.clone(),
        rating,
        title: "Solid purifier".to_string(),
        comment: "Works as advertised.".to_string(),
        images: vec![],
        verified: false,
        helpful: 0,
        status: ReviewStatus::Pending,
        created_at: Some(chrono::Utc::now().to_rfc3339()),
    }
}

async fn product_aggregate(db: &Surreal<Db>, product: &RecordId) -> (f64, i32) {
    let reloaded = ProductRepository::new(db.clone())
        .find_by_id(&product.to_string())
        .await
        .unwrap()
        .unwrap();
    (reloaded.rating, reloaded.review_count)
}

#[tokio::test]
async fn test_rating_is_mean_of_approved_reviews() {
    let (_tmp, db) = setup().await;
    let product = seed_product(&db, "tds-meter").await;
    let product_id = product.id.clone().unwrap();
    let alice = seed_user(&db, "alice@example.com").await.id.unwrap();
    let bob = seed_user(&db, "bob@example.com").await.id.unwrap();

    let repo = ReviewRepository::new(db.clone());
    let r1 = repo.create(review(&product_id, &alice, 5)).await.unwrap();
    let r2 = repo.create(review(&product_id, &bob, 3)).await.unwrap();

    // Pending reviews contribute nothing
    repo.recompute_product_rating(&product_id).await.unwrap();
    assert_eq!(product_aggregate(&db, &product_id).await, (0.0, 0));

    // Approve both: mean of 5 and 3 is 4.0
    for r in [&r1, &r2] {
        repo.set_status(&r.id.as_ref().unwrap().to_string(), ReviewStatus::Approved)
            .await
            .unwrap();
    }
    repo.recompute_product_rating(&product_id).await.unwrap();
    assert_eq!(product_aggregate(&db, &product_id).await, (4.0, 2));
}

#[tokio::test]
async fn test_rating_rounds_to_one_decimal() {
    let (_tmp, db) = setup().await;
    let product = seed_product(&db, "mineral-cartridge").await;
    let product_id = product.id.clone().unwrap();

    let repo = ReviewRepository::new(db.clone());
    for (i, rating) in [5, 4, 4].into_iter().enumerate() {
        let user = seed_user(&db, &format!("u{}@example.com", i)).await.id.unwrap();
        let r = repo.create(review(&product_id, &user, rating)).await.unwrap();
        repo.set_status(&r.id.as_ref().unwrap().to_string(), ReviewStatus::Approved)
            .await
            .unwrap();
    }

    // 13 / 3 = 4.333... rounds to 4.3
    let (rating, count) = repo.recompute_product_rating(&product_id).await.unwrap();
    assert_eq!(rating, 4.3);
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_only_approved_reviews_are_public() {
    let (_tmp, db) = setup().await;
    let product = seed_product(&db, "uv-lamp").await;
    let product_id = product.id.clone().unwrap();
    let alice = seed_user(&db, "alice2@example.com").await.id.unwrap();
    let bob = seed_user(&db, "bob2@example.com").await.id.unwrap();

    let repo = ReviewRepository::new(db.clone());
    let approved = repo.create(review(&product_id, &alice, 5)).await.unwrap();
    let _pending = repo.create(review(&product_id, &bob, 1)).await.unwrap();
    repo.set_status(
        &approved.id.as_ref().unwrap().to_string(),
        ReviewStatus::Approved,
    )
    .await
    .unwrap();

    let (visible, total) = repo
        .find_approved_for_product(&product_id, None, &PageQuery::default())
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].rating, 5);
}

#[tokio::test]
async fn test_rejecting_approved_review_recomputes_to_zero() {
    let (_tmp, db) = setup().await;
    let product = seed_product(&db, "pre-filter").await;
    let product_id = product.id.clone().unwrap();
    let alice = seed_user(&db, "alice3@example.com").await.id.unwrap();

    let repo = ReviewRepository::new(db.clone());
    let r = repo.create(review(&product_id, &alice, 4)).await.unwrap();
    let review_id = r.id.as_ref().unwrap().to_string();

    repo.set_status(&review_id, ReviewStatus::Approved).await.unwrap();
    repo.recompute_product_rating(&product_id).await.unwrap();
    assert_eq!(product_aggregate(&db, &product_id).await, (4.0, 1));

    // No approved reviews remain: the aggregate falls back to 0/0
    repo.set_status(&review_id, ReviewStatus::Rejected).await.unwrap();
    repo.recompute_product_rating(&product_id).await.unwrap();
    assert_eq!(product_aggregate(&db, &product_id).await, (0.0, 0));
}

#[tokio::test]
async fn test_deleting_review_recomputes_aggregate() {
    let (_tmp, db) = setup().await;
    let product = seed_product(&db, "spun-filter").await;
    let product_id = product.id.clone().unwrap();
    let alice = seed_user(&db, "alice4@example.com").await.id.unwrap();
    let bob = seed_user(&db, "bob4@example.com").await.id.unwrap();

    let repo = ReviewRepository::new(db.clone());
    let r1 = repo.create(review(&product_id, &alice, 5)).await.unwrap();
    let r2 = repo.create(review(&product_id, &bob, 3)).await.unwrap();
    for r in [&r1, &r2] {
        repo.set_status(&r.id.as_ref().unwrap().to_string(), ReviewStatus::Approved)
            .await
            .unwrap();
    }
    repo.recompute_product_rating(&product_id).await.unwrap();
    assert_eq!(product_aggregate(&db, &product_id).await, (4.0, 2));

    repo.delete(&r2.id.as_ref().unwrap().to_string()).await.unwrap();
    repo.recompute_product_rating(&product_id).await.unwrap();
    assert_eq!(product_aggregate(&db, &product_id).await, (5.0, 1));
}

#[tokio::test]
async fn test_one_review_per_user_per_product() {
    let (_tmp, db) = setup().await;
    let product = seed_product(&db, "storage-tank").await;
    let product_id = product.id.clone().unwrap();
    let alice = seed_user(&db, "alice5@example.com").await.id.unwrap();

    let repo = ReviewRepository::new(db.clone());
    repo.create(review(&product_id, &alice, 5)).await.unwrap();

    // The unique (product, user) index rejects the second insert
    let second = repo.create(review(&product_id, &alice, 1)).await;
    assert!(second.is_err());
}

#[tokio::test]
async fn test_owner_edit_resets_moderation() {
    let (_tmp, db) = setup().await;
    let product = seed_product(&db, "booster-pump").await;
    let product_id = product.id.clone().unwrap();
    let alice = seed_user(&db, "alice6@example.com").await.id.unwrap();

    let repo = ReviewRepository::new(db.clone());
    let r = repo.create(review(&product_id, &alice, 4)).await.unwrap();
    let review_id = r.id.as_ref().unwrap().to_string();
    repo.set_status(&review_id, ReviewStatus::Approved).await.unwrap();

    let updated = repo
        .update(
            &review_id,
            purestore_server::db::models::ReviewUpdate {
                rating: Some(2),
                title: None,
                comment: Some("Broke after a month.".to_string()),
                images: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ReviewStatus::Pending);
    assert_eq!(updated.rating, 2);
}
