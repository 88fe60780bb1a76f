//! Product Repository

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, CountRow, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use crate::utils::PageQuery;

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List active products with filters, sort and pagination.
    /// Returns the page plus the total match count.
    pub async fn find_all(
        &self,
        query: &ProductQuery,
        page: &PageQuery,
    ) -> RepoResult<(Vec<Product>, i64)> {
        let mut conditions = vec!["is_active = true"];

        let category = query
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
            .map(str::to_string);
        if category.is_some() {
            conditions.push("category = $category");
        }
        if query.min_price.is_some() {
            conditions.push("price >= $min_price");
        }
        if query.max_price.is_some() {
            conditions.push("price <= $max_price");
        }
        let search = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        if search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(name), $search) \
                 OR string::contains(string::lowercase(description), $search))",
            );
        }

        // Sort keys are whitelisted; nothing from the request reaches the
        // query text
        let order_by = match query.sort.as_deref() {
            Some("price-asc") => "price ASC",
            Some("price-desc") => "price DESC",
            Some("rating") => "rating DESC",
            Some("name") => "name ASC",
            _ => "created_at DESC",
        };

        let where_clause = conditions.join(" AND ");
        let list_sql = format!(
            "SELECT * FROM product WHERE {where_clause} ORDER BY {order_by} LIMIT $limit START $offset"
        );
        let count_sql = format!("SELECT count() FROM product WHERE {where_clause} GROUP ALL");

        let mut list_query = self
            .base
            .db()
            .query(list_sql)
            .query(count_sql)
            .bind(("limit", page.limit))
            .bind(("offset", page.offset()));

        if let Some(category) = category {
            list_query = list_query.bind(("category", category));
        }
        if let Some(min_price) = query.min_price {
            list_query = list_query.bind(("min_price", min_price));
        }
        if let Some(max_price) = query.max_price {
            list_query = list_query.bind(("max_price", max_price));
        }
        if let Some(search) = search {
            list_query = list_query.bind(("search", search));
        }

        let mut result = list_query.await?;
        let products: Vec<Product> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);

        Ok((products, total))
    }

    /// Find an active product by its slug
    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Product>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product WHERE slug = $slug AND is_active = true LIMIT 1")
            .bind(("slug", slug.to_lowercase()))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Find product by id (active or not)
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record = parse_record_id(PRODUCT_TABLE, id);
        let product: Option<Product> = self.base.db().select(record).await?;
        Ok(product)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let product = Product {
            id: None,
            name: data.name,
            slug: data.slug.to_lowercase(),
            description: data.description,
            price: data.price,
            original_price: data.original_price,
            category: data.category,
            images: data.images.unwrap_or_default(),
            features: data.features.unwrap_or_default(),
            specifications: data.specifications.unwrap_or_default(),
            stock: data.stock.unwrap_or(0),
            rating: 0.0,
            review_count: 0,
            is_active: true,
            created_at: Some(now_rfc3339()),
        };

        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product (partial)
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let record = parse_record_id(PRODUCT_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.description.is_some() {
            set_parts.push("description = $description");
        }
        if data.price.is_some() {
            set_parts.push("price = $price");
        }
        if data.original_price.is_some() {
            set_parts.push("original_price = $original_price");
        }
        if data.category.is_some() {
            set_parts.push("category = $category");
        }
        if data.images.is_some() {
            set_parts.push("images = $images");
        }
        if data.features.is_some() {
            set_parts.push("features = $features");
        }
        if data.specifications.is_some() {
            set_parts.push("specifications = $specifications");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)));
        }

        let sql = format!("UPDATE $record SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(sql).bind(("record", record));

        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.description {
            query = query.bind(("description", v));
        }
        if let Some(v) = data.price {
            query = query.bind(("price", v));
        }
        if let Some(v) = data.original_price {
            query = query.bind(("original_price", v));
        }
        if let Some(v) = data.category {
            query = query.bind(("category", v));
        }
        if let Some(v) = data.images {
            query = query.bind(("images", v));
        }
        if let Some(v) = data.features {
            query = query.bind(("features", v));
        }
        if let Some(v) = data.specifications {
            query = query.bind(("specifications", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let mut result = query.await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Soft-delete a product (catalog hides it; orders keep their snapshots)
    pub async fn soft_delete(&self, id: &str) -> RepoResult<Product> {
        let record = parse_record_id(PRODUCT_TABLE, id);
        let mut result = self
            .base
            .db()
            .query("UPDATE $record SET is_active = false RETURN AFTER")
            .bind(("record", record))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Overwrite the stock count (admin restock)
    pub async fn set_stock(&self, id: &str, stock: i32) -> RepoResult<Product> {
        if stock < 0 {
            return Err(RepoError::Validation("Invalid stock value".to_string()));
        }
        let record = parse_record_id(PRODUCT_TABLE, id);
        let mut result = self
            .base
            .db()
            .query("UPDATE $record SET stock = $stock RETURN AFTER")
            .bind(("record", record))
            .bind(("stock", stock))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Atomically reserve stock: decrements only when enough is available,
    /// in a single statement, so concurrent orders cannot overdraw.
    /// Returns false when the product had less stock than requested.
    pub async fn reserve_stock(&self, product: &RecordId, quantity: i32) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $product SET stock -= $qty WHERE stock >= $qty RETURN AFTER")
            .bind(("product", product.clone()))
            .bind(("qty", quantity))
            .await?;
        let updated: Vec<Product> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Return previously reserved stock (cancellation, failed reservation)
    pub async fn release_stock(&self, product: &RecordId, quantity: i32) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $product SET stock += $qty")
            .bind(("product", product.clone()))
            .bind(("qty", quantity))
            .await?
            .check()?;
        Ok(())
    }

    /// Write the derived rating aggregate (review repository only)
    pub async fn update_rating(
        &self,
        product: &RecordId,
        rating: f64,
        review_count: i32,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $product SET rating = $rating, review_count = $review_count")
            .bind(("product", product.clone()))
            .bind(("rating", rating))
            .bind(("review_count", review_count))
            .await?
            .check()?;
        Ok(())
    }
}
