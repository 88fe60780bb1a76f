//! Review Repository
//!
//! Owns the derived product rating aggregate: every mutation that can
//! change the approved set calls [`ReviewRepository::recompute_product_rating`].

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Review, ReviewStatus, ReviewUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::PageQuery;

const REVIEW_TABLE: &str = "review";

#[derive(Clone)]
pub struct ReviewRepository {
    base: BaseRepository,
}

impl ReviewRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a new review (moderation status set by the caller)
    pub async fn create(&self, review: Review) -> RepoResult<Review> {
        let created: Option<Review> = self.base.db().create(REVIEW_TABLE).content(review).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create review".to_string()))
    }

    /// Find review by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Review>> {
        let record = parse_record_id(REVIEW_TABLE, id);
        let review: Option<Review> = self.base.db().select(record).await?;
        Ok(review)
    }

    /// The one review a user may have for a product
    pub async fn find_by_product_and_user(
        &self,
        product: &RecordId,
        user: &RecordId,
    ) -> RepoResult<Option<Review>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM review WHERE product = $product AND user = $user LIMIT 1")
            .bind(("product", product.to_string()))
            .bind(("user", user.to_string()))
            .await?;
        let reviews: Vec<Review> = result.take(0)?;
        Ok(reviews.into_iter().next())
    }

    /// Public listing: approved reviews of one product, sorted and paginated
    pub async fn find_approved_for_product(
        &self,
        product: &RecordId,
        sort: Option<&str>,
        page: &PageQuery,
    ) -> RepoResult<(Vec<Review>, i64)> {
        // Whitelisted sort keys only
        let order_by = match sort {
            Some("rating-high") => "rating DESC",
            Some("rating-low") => "rating ASC",
            Some("helpful") => "helpful DESC",
            _ => "created_at DESC",
        };

        let list_sql = format!(
            "SELECT * FROM review WHERE product = $product AND status = 'approved' \
             ORDER BY {order_by} LIMIT $limit START $offset"
        );

        let mut result = self
            .base
            .db()
            .query(list_sql)
            .query(
                "SELECT count() FROM review WHERE product = $product AND status = 'approved' \
                 GROUP ALL",
            )
            .bind(("product", product.to_string()))
            .bind(("limit", page.limit))
            .bind(("offset", page.offset()))
            .await?;

        let reviews: Vec<Review> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);

        Ok((reviews, total))
    }

    /// Admin listing with optional moderation-status filter
    pub async fn find_all(
        &self,
        status: Option<ReviewStatus>,
        page: &PageQuery,
    ) -> RepoResult<(Vec<Review>, i64)> {
        let (list_sql, count_sql) = if status.is_some() {
            (
                "SELECT * FROM review WHERE status = $status ORDER BY created_at DESC LIMIT $limit START $offset",
                "SELECT count() FROM review WHERE status = $status GROUP ALL",
            )
        } else {
            (
                "SELECT * FROM review ORDER BY created_at DESC LIMIT $limit START $offset",
                "SELECT count() FROM review GROUP ALL",
            )
        };

        let mut query = self
            .base
            .db()
            .query(list_sql)
            .query(count_sql)
            .bind(("limit", page.limit))
            .bind(("offset", page.offset()));
        if let Some(status) = status {
            query = query.bind(("status", status));
        }

        let mut result = query.await?;
        let reviews: Vec<Review> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);

        Ok((reviews, total))
    }

    /// Owner edit. Any content change sends the review back to moderation.
    pub async fn update(&self, id: &str, data: ReviewUpdate) -> RepoResult<Review> {
        let record = parse_record_id(REVIEW_TABLE, id);

        let mut set_parts = vec!["status = 'pending'"];
        if data.rating.is_some() {
            set_parts.push("rating = $rating");
        }
        if data.title.is_some() {
            set_parts.push("title = $title");
        }
        if data.comment.is_some() {
            set_parts.push("comment = $comment");
        }
        if data.images.is_some() {
            set_parts.push("images = $images");
        }

        let sql = format!("UPDATE $record SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(sql).bind(("record", record));
        if let Some(v) = data.rating {
            query = query.bind(("rating", v));
        }
        if let Some(v) = data.title {
            query = query.bind(("title", v));
        }
        if let Some(v) = data.comment {
            query = query.bind(("comment", v));
        }
        if let Some(v) = data.images {
            query = query.bind(("images", v));
        }

        let mut result = query.await?;
        let reviews: Vec<Review> = result.take(0)?;
        reviews
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Review {} not found", id)))
    }

    /// Hard delete (reviews, unlike orders, are removable)
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record = parse_record_id(REVIEW_TABLE, id);
        let deleted: Option<Review> = self.base.db().delete(record).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Review {} not found", id)));
        }
        Ok(())
    }

    /// Moderation decision
    pub async fn set_status(&self, id: &str, status: ReviewStatus) -> RepoResult<Review> {
        let record = parse_record_id(REVIEW_TABLE, id);
        let mut result = self
            .base
            .db()
            .query("UPDATE $record SET status = $status RETURN AFTER")
            .bind(("record", record))
            .bind(("status", status))
            .await?;
        let reviews: Vec<Review> = result.take(0)?;
        reviews
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Review {} not found", id)))
    }

    /// Bump the helpful counter
    pub async fn increment_helpful(&self, id: &str) -> RepoResult<Review> {
        let record = parse_record_id(REVIEW_TABLE, id);
        let mut result = self
            .base
            .db()
            .query("UPDATE $record SET helpful += 1 RETURN AFTER")
            .bind(("record", record))
            .await?;
        let reviews: Vec<Review> = result.take(0)?;
        reviews
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Review {} not found", id)))
    }

    /// Recompute the product's rating aggregate from its approved reviews:
    /// mean rounded to one decimal, 0/0 when none remain.
    pub async fn recompute_product_rating(&self, product: &RecordId) -> RepoResult<(f64, i32)> {
        #[derive(serde::Deserialize)]
        struct RatingRow {
            rating: i32,
        }

        let mut result = self
            .base
            .db()
            .query("SELECT rating FROM review WHERE product = $product AND status = 'approved'")
            .bind(("product", product.to_string()))
            .await?;
        let rows: Vec<RatingRow> = result.take(0)?;

        let (rating, count) = if rows.is_empty() {
            (0.0, 0)
        } else {
            let sum: i32 = rows.iter().map(|r| r.rating).sum();
            let avg = f64::from(sum) / rows.len() as f64;
            ((avg * 10.0).round() / 10.0, rows.len() as i32)
        };

        ProductRepository::new(self.base.db().clone())
            .update_rating(product, rating, count)
            .await?;

        Ok((rating, count))
    }
}
