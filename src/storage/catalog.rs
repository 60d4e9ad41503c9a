use crate::models::{
    Carousel, CarouselPayload, CompanyImage, CompanyImagePayload, Content, ContentPayload,
    Paginated, Product, ProductPayload, SocialButton, SocialButtonPayload, SocialOrderItem, Stats,
    SupportedCard, SupportedCardPayload, Trade, TradePayload, Video, VideoPayload,
};
use crate::AppError;
use uuid::Uuid;

/// How many company images may be active at once.
pub const MAX_ACTIVE_COMPANY_IMAGES: i64 = 3;

/// Whether a company image may be (or stay) active given how many other
/// rows are currently active. Inactive writes are always allowed;
/// deleting or deactivating a row lowers the count and frees a slot
/// immediately.
pub fn company_image_slot_available(active_others: i64, wants_active: bool) -> bool {
    !wants_active || active_others < MAX_ACTIVE_COMPANY_IMAGES
}

#[derive(Clone)]
pub struct CatalogStorage {
    pool: sqlx::PgPool,
}

impl CatalogStorage {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    // ---- products ----

    pub async fn products_page(
        &self,
        page: i64,
        limit: i64,
        only_active: bool,
    ) -> crate::Result<Paginated<Product>> {
        let filter = if only_active { "WHERE is_active" } else { "" };
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM products {filter}"))
            .fetch_one(&self.pool)
            .await?;
        let query = format!(
            "SELECT * FROM products {filter} ORDER BY sort_order, created_at DESC LIMIT $1 OFFSET $2"
        );
        let items = sqlx::query_as::<_, Product>(&query)
            .bind(limit)
            .bind((page - 1) * limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(Paginated::new(items, total.0, page, limit))
    }

    pub async fn get_product(&self, id: Uuid) -> crate::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn create_product(&self, p: ProductPayload) -> crate::Result<Product> {
        let query = "INSERT INTO products (name, category, description, image, price, sort_order, is_active) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *";
        let product = sqlx::query_as::<_, Product>(query)
            .bind(&p.name)
            .bind(&p.category)
            .bind(&p.description)
            .bind(&p.image)
            .bind(&p.price)
            .bind(p.sort_order)
            .bind(p.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        p: ProductPayload,
    ) -> crate::Result<Option<Product>> {
        let query = "UPDATE products SET name = $2, category = $3, description = $4, image = $5, \
                     price = $6, sort_order = $7, is_active = $8, updated_at = now() \
                     WHERE id = $1 RETURNING *";
        let product = sqlx::query_as::<_, Product>(query)
            .bind(id)
            .bind(&p.name)
            .bind(&p.category)
            .bind(&p.description)
            .bind(&p.image)
            .bind(&p.price)
            .bind(p.sort_order)
            .bind(p.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> crate::Result<Option<Product>> {
        let product =
            sqlx::query_as::<_, Product>("DELETE FROM products WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(product)
    }

    // ---- trades ----

    pub async fn trades_page(
        &self,
        page: i64,
        limit: i64,
        status: Option<&str>,
    ) -> crate::Result<Paginated<Trade>> {
        let (filter, count_query) = match status {
            Some(_) => (
                "WHERE status = $3",
                "SELECT COUNT(*) FROM trades WHERE status = $1",
            ),
            None => ("", "SELECT COUNT(*) FROM trades"),
        };
        let mut count = sqlx::query_as::<_, (i64,)>(count_query);
        if let Some(status) = status {
            count = count.bind(status);
        }
        let total = count.fetch_one(&self.pool).await?;
        let query = format!(
            "SELECT * FROM trades {filter} ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let mut items = sqlx::query_as::<_, Trade>(&query)
            .bind(limit)
            .bind((page - 1) * limit);
        if let Some(status) = status {
            items = items.bind(status);
        }
        let items = items.fetch_all(&self.pool).await?;
        Ok(Paginated::new(items, total.0, page, limit))
    }

    pub async fn create_trade(&self, t: TradePayload) -> crate::Result<Trade> {
        let query = "INSERT INTO trades (order_no, product_name, amount, payout, currency, status) \
                     VALUES ($1, $2, $3, $4, $5, $6) RETURNING *";
        let trade = sqlx::query_as::<_, Trade>(query)
            .bind(&t.order_no)
            .bind(&t.product_name)
            .bind(t.amount)
            .bind(t.payout)
            .bind(&t.currency)
            .bind(&t.status)
            .fetch_one(&self.pool)
            .await?;
        Ok(trade)
    }

    pub async fn update_trade(&self, id: Uuid, t: TradePayload) -> crate::Result<Option<Trade>> {
        let query = "UPDATE trades SET order_no = $2, product_name = $3, amount = $4, \
                     payout = $5, currency = $6, status = $7 WHERE id = $1 RETURNING *";
        let trade = sqlx::query_as::<_, Trade>(query)
            .bind(id)
            .bind(&t.order_no)
            .bind(&t.product_name)
            .bind(t.amount)
            .bind(t.payout)
            .bind(&t.currency)
            .bind(&t.status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(trade)
    }

    pub async fn delete_trade(&self, id: Uuid) -> crate::Result<bool> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- carousels ----

    pub async fn carousels(&self, only_active: bool) -> crate::Result<Vec<Carousel>> {
        let filter = if only_active { "WHERE is_active" } else { "" };
        let query = format!("SELECT * FROM carousels {filter} ORDER BY sort_order");
        let items = sqlx::query_as::<_, Carousel>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn get_carousel(&self, id: Uuid) -> crate::Result<Option<Carousel>> {
        let item = sqlx::query_as::<_, Carousel>("SELECT * FROM carousels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn create_carousel(&self, c: CarouselPayload) -> crate::Result<Carousel> {
        let query = "INSERT INTO carousels (title, image, link, sort_order, is_active) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING *";
        let item = sqlx::query_as::<_, Carousel>(query)
            .bind(&c.title)
            .bind(&c.image)
            .bind(&c.link)
            .bind(c.sort_order)
            .bind(c.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn update_carousel(
        &self,
        id: Uuid,
        c: CarouselPayload,
    ) -> crate::Result<Option<Carousel>> {
        let query = "UPDATE carousels SET title = $2, image = $3, link = $4, sort_order = $5, \
                     is_active = $6 WHERE id = $1 RETURNING *";
        let item = sqlx::query_as::<_, Carousel>(query)
            .bind(id)
            .bind(&c.title)
            .bind(&c.image)
            .bind(&c.link)
            .bind(c.sort_order)
            .bind(c.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn delete_carousel(&self, id: Uuid) -> crate::Result<Option<Carousel>> {
        let item =
            sqlx::query_as::<_, Carousel>("DELETE FROM carousels WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(item)
    }

    // ---- company images ----

    pub async fn company_images(&self, only_active: bool) -> crate::Result<Vec<CompanyImage>> {
        let filter = if only_active { "WHERE is_active" } else { "" };
        let query = format!("SELECT * FROM company_images {filter} ORDER BY sort_order");
        let items = sqlx::query_as::<_, CompanyImage>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn get_company_image(&self, id: Uuid) -> crate::Result<Option<CompanyImage>> {
        let item = sqlx::query_as::<_, CompanyImage>("SELECT * FROM company_images WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn active_company_images(&self, exclude: Option<Uuid>) -> crate::Result<i64> {
        let (query, id) = match exclude {
            Some(id) => (
                "SELECT COUNT(*) FROM company_images WHERE is_active AND id <> $1",
                Some(id),
            ),
            None => ("SELECT COUNT(*) FROM company_images WHERE is_active", None),
        };
        let mut count = sqlx::query_as::<_, (i64,)>(query);
        if let Some(id) = id {
            count = count.bind(id);
        }
        let (count,) = count.fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn create_company_image(
        &self,
        c: CompanyImagePayload,
    ) -> crate::Result<CompanyImage> {
        let active_others = self.active_company_images(None).await?;
        if !company_image_slot_available(active_others, c.is_active) {
            return Err(AppError::Validation(format!(
                "at most {MAX_ACTIVE_COMPANY_IMAGES} active company images allowed"
            )));
        }
        let query = "INSERT INTO company_images (title, image, sort_order, is_active) \
                     VALUES ($1, $2, $3, $4) RETURNING *";
        let item = sqlx::query_as::<_, CompanyImage>(query)
            .bind(&c.title)
            .bind(&c.image)
            .bind(c.sort_order)
            .bind(c.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn update_company_image(
        &self,
        id: Uuid,
        c: CompanyImagePayload,
    ) -> crate::Result<Option<CompanyImage>> {
        let active_others = self.active_company_images(Some(id)).await?;
        if !company_image_slot_available(active_others, c.is_active) {
            return Err(AppError::Validation(format!(
                "at most {MAX_ACTIVE_COMPANY_IMAGES} active company images allowed"
            )));
        }
        let query = "UPDATE company_images SET title = $2, image = $3, sort_order = $4, \
                     is_active = $5 WHERE id = $1 RETURNING *";
        let item = sqlx::query_as::<_, CompanyImage>(query)
            .bind(id)
            .bind(&c.title)
            .bind(&c.image)
            .bind(c.sort_order)
            .bind(c.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn delete_company_image(&self, id: Uuid) -> crate::Result<Option<CompanyImage>> {
        let item = sqlx::query_as::<_, CompanyImage>(
            "DELETE FROM company_images WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    // ---- supported cards ----

    pub async fn cards(&self, only_active: bool) -> crate::Result<Vec<SupportedCard>> {
        let filter = if only_active { "WHERE is_active" } else { "" };
        let query = format!("SELECT * FROM supported_cards {filter} ORDER BY sort_order");
        let items = sqlx::query_as::<_, SupportedCard>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn create_card(&self, c: SupportedCardPayload) -> crate::Result<SupportedCard> {
        let query = "INSERT INTO supported_cards (name, image, sort_order, is_active) \
                     VALUES ($1, $2, $3, $4) RETURNING *";
        let item = sqlx::query_as::<_, SupportedCard>(query)
            .bind(&c.name)
            .bind(&c.image)
            .bind(c.sort_order)
            .bind(c.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn update_card(
        &self,
        id: Uuid,
        c: SupportedCardPayload,
    ) -> crate::Result<Option<SupportedCard>> {
        let query = "UPDATE supported_cards SET name = $2, image = $3, sort_order = $4, \
                     is_active = $5 WHERE id = $1 RETURNING *";
        let item = sqlx::query_as::<_, SupportedCard>(query)
            .bind(id)
            .bind(&c.name)
            .bind(&c.image)
            .bind(c.sort_order)
            .bind(c.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn delete_card(&self, id: Uuid) -> crate::Result<Option<SupportedCard>> {
        let item = sqlx::query_as::<_, SupportedCard>(
            "DELETE FROM supported_cards WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    // ---- videos ----

    pub async fn videos(&self, only_active: bool) -> crate::Result<Vec<Video>> {
        let filter = if only_active { "WHERE is_active" } else { "" };
        let query = format!("SELECT * FROM videos {filter} ORDER BY sort_order");
        let items = sqlx::query_as::<_, Video>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn create_video(&self, v: VideoPayload) -> crate::Result<Video> {
        let query = "INSERT INTO videos (title, url, sort_order, is_active) \
                     VALUES ($1, $2, $3, $4) RETURNING *";
        let item = sqlx::query_as::<_, Video>(query)
            .bind(&v.title)
            .bind(&v.url)
            .bind(v.sort_order)
            .bind(v.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn update_video(&self, id: Uuid, v: VideoPayload) -> crate::Result<Option<Video>> {
        let query = "UPDATE videos SET title = $2, url = $3, sort_order = $4, is_active = $5 \
                     WHERE id = $1 RETURNING *";
        let item = sqlx::query_as::<_, Video>(query)
            .bind(id)
            .bind(&v.title)
            .bind(&v.url)
            .bind(v.sort_order)
            .bind(v.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn delete_video(&self, id: Uuid) -> crate::Result<Option<Video>> {
        let item = sqlx::query_as::<_, Video>("DELETE FROM videos WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    // ---- social buttons ----

    pub async fn social_buttons(&self, only_active: bool) -> crate::Result<Vec<SocialButton>> {
        let filter = if only_active { "WHERE is_active" } else { "" };
        let query = format!("SELECT * FROM social_buttons {filter} ORDER BY sort_order");
        let items = sqlx::query_as::<_, SocialButton>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn create_social_button(
        &self,
        s: SocialButtonPayload,
    ) -> crate::Result<SocialButton> {
        let query = "INSERT INTO social_buttons (name, icon, link, sort_order, is_active) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING *";
        let item = sqlx::query_as::<_, SocialButton>(query)
            .bind(&s.name)
            .bind(&s.icon)
            .bind(&s.link)
            .bind(s.sort_order)
            .bind(s.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn update_social_button(
        &self,
        id: Uuid,
        s: SocialButtonPayload,
    ) -> crate::Result<Option<SocialButton>> {
        let query = "UPDATE social_buttons SET name = $2, icon = $3, link = $4, sort_order = $5, \
                     is_active = $6 WHERE id = $1 RETURNING *";
        let item = sqlx::query_as::<_, SocialButton>(query)
            .bind(id)
            .bind(&s.name)
            .bind(&s.icon)
            .bind(&s.link)
            .bind(s.sort_order)
            .bind(s.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn delete_social_button(&self, id: Uuid) -> crate::Result<Option<SocialButton>> {
        let item = sqlx::query_as::<_, SocialButton>(
            "DELETE FROM social_buttons WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// Batch sort-order update; each row saved on its own.
    pub async fn reorder_social_buttons(&self, items: &[SocialOrderItem]) -> crate::Result<u64> {
        let mut updated = 0;
        for item in items {
            let result = sqlx::query("UPDATE social_buttons SET sort_order = $2 WHERE id = $1")
                .bind(item.id)
                .bind(item.sort_order)
                .execute(&self.pool)
                .await?;
            updated += result.rows_affected();
        }
        Ok(updated)
    }

    // ---- contents ----

    pub async fn contents(&self) -> crate::Result<Vec<Content>> {
        let items = sqlx::query_as::<_, Content>("SELECT * FROM contents ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn content_by_key(&self, key: &str) -> crate::Result<Option<Content>> {
        let item = sqlx::query_as::<_, Content>("SELECT * FROM contents WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Content blocks are keyed site copy; writes upsert by key.
    pub async fn upsert_content(&self, c: ContentPayload) -> crate::Result<Content> {
        let query = "INSERT INTO contents (key, title, body) VALUES ($1, $2, $3) \
                     ON CONFLICT (key) DO UPDATE \
                     SET title = EXCLUDED.title, body = EXCLUDED.body, updated_at = now() \
                     RETURNING *";
        let item = sqlx::query_as::<_, Content>(query)
            .bind(&c.key)
            .bind(&c.title)
            .bind(&c.body)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn delete_content(&self, id: Uuid) -> crate::Result<bool> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- stats ----

    pub async fn stats(&self) -> crate::Result<Stats> {
        let query = "SELECT \
                     (SELECT COUNT(*) FROM products) AS products, \
                     (SELECT COUNT(*) FROM trades) AS trades, \
                     (SELECT COUNT(*) FROM trades WHERE status = 'completed') AS completed_trades, \
                     (SELECT COALESCE(SUM(payout), 0) FROM trades WHERE status = 'completed') AS total_payout, \
                     (SELECT COUNT(*) FROM exchange_rates) AS rates, \
                     (SELECT COUNT(*) FROM videos) AS videos";
        let stats = sqlx::query_as::<_, Stats>(query)
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::company_image_slot_available;

    #[test]
    fn fourth_active_image_is_rejected() {
        assert!(!company_image_slot_available(3, true));
    }

    #[test]
    fn deleting_one_of_three_frees_a_slot() {
        // Three active, one deleted: only two others remain.
        assert!(company_image_slot_available(2, true));
    }

    #[test]
    fn inactive_images_ignore_the_cap() {
        assert!(company_image_slot_available(3, false));
        assert!(company_image_slot_available(10, false));
    }

    #[test]
    fn reactivating_an_already_active_image_is_allowed() {
        // The row itself is excluded from the count, so at the cap its
        // own update still sees two others.
        assert!(company_image_slot_available(2, true));
        assert!(!company_image_slot_available(3, true));
    }
}
