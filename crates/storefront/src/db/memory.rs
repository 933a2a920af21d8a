//! In-process store.
//!
//! Implements every storage trait over one set of tables guarded by a
//! `RwLock`. The lock is held for a single operation and never across an
//! `.await`. Used by tests and by `LUMA_STORE_BACKEND=memory`.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use luma_core::{CartLineId, CategoryId, OrderId, OrderItemId, OrderStatus, ProductId, ShopperId};

use super::{CartStore, CatalogStore, OrderStore, StoreError};
use crate::models::{
    BlogPost, CartLine, Category, NewCartLine, NewOrder, NewOrderItem, Order, OrderItem, Product,
};

#[derive(Debug, Clone)]
struct StoredLine {
    id: CartLineId,
    shopper_id: ShopperId,
    product_id: ProductId,
    quantity: u32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    categories: Vec<Category>,
    products: Vec<Product>,
    posts: Vec<BlogPost>,
    cart_lines: Vec<StoredLine>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

/// Process-local implementation of the catalog, cart and order stores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(poisoned)
    }

    /// Insert or replace a category (matched by slug).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn put_category(&self, category: Category) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.categories.retain(|c| c.slug != category.slug);
        tables.categories.push(category);
        Ok(())
    }

    /// Insert or replace a product (matched by slug).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn put_product(&self, product: Product) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.products.retain(|p| p.slug != product.slug);
        tables.products.push(product);
        Ok(())
    }

    /// Insert or replace a journal post (matched by slug).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn put_post(&self, post: BlogPost) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.posts.retain(|p| p.slug != post.slug);
        tables.posts.push(post);
        Ok(())
    }

    /// Remove a product, cascading to cart lines like the schema does.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.products.retain(|p| p.id != id);
        tables.cart_lines.retain(|l| l.product_id != id);
        Ok(())
    }

    /// Number of stored orders.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn order_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.orders.len())
    }

    /// Number of stored order lines across all orders.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn order_item_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.order_items.len())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn featured_products(&self, limit: u32) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .read()?
            .products
            .iter()
            .filter(|p| p.featured)
            .cloned()
            .collect();
        newest_first(&mut products, |p| p.created_at);
        products.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(products)
    }

    async fn products(&self, category: Option<CategoryId>) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .read()?
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category_id == Some(c)))
            .cloned()
            .collect();
        newest_first(&mut products, |p| p.created_at);
        Ok(products)
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.iter().find(|p| p.id == id).cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.read()?.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError> {
        let mut posts: Vec<BlogPost> = self
            .read()?
            .posts
            .iter()
            .filter(|p| p.published)
            .cloned()
            .collect();
        newest_first(&mut posts, |p| p.created_at);
        Ok(posts)
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        Ok(self
            .read()?
            .posts
            .iter()
            .find(|p| p.published && p.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn lines(&self, shopper: ShopperId) -> Result<Vec<CartLine>, StoreError> {
        let tables = self.read()?;
        let lines = tables
            .cart_lines
            .iter()
            .filter(|l| l.shopper_id == shopper)
            .map(|l| CartLine {
                id: l.id,
                shopper_id: l.shopper_id,
                product_id: l.product_id,
                quantity: l.quantity,
                product: tables.products.iter().find(|p| p.id == l.product_id).cloned(),
                created_at: l.created_at,
            })
            .collect();
        Ok(lines)
    }

    async fn insert_line(&self, line: NewCartLine) -> Result<(), StoreError> {
        self.write()?.cart_lines.push(StoredLine {
            id: line.id,
            shopper_id: line.shopper_id,
            product_id: line.product_id,
            quantity: line.quantity,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn update_quantity(
        &self,
        shopper: ShopperId,
        line: CartLineId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if let Some(stored) = tables
            .cart_lines
            .iter_mut()
            .find(|l| l.id == line && l.shopper_id == shopper)
        {
            stored.quantity = quantity;
        }
        Ok(())
    }

    async fn delete_line(&self, shopper: ShopperId, line: CartLineId) -> Result<(), StoreError> {
        self.write()?
            .cart_lines
            .retain(|l| !(l.id == line && l.shopper_id == shopper));
        Ok(())
    }

    async fn clear(&self, shopper: ShopperId) -> Result<(), StoreError> {
        self.write()?.cart_lines.retain(|l| l.shopper_id != shopper);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tables = self.write()?;
        if tables
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate order number {}",
                order.order_number
            )));
        }

        let created = Order {
            id: OrderId::generate(),
            order_number: order.order_number,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            shipping_address: order.shipping_address,
            city: order.city,
            postal_code: order.postal_code,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        tables.orders.push(created.clone());
        Ok(created)
    }

    async fn insert_items(&self, items: &[NewOrderItem]) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.order_items.extend(items.iter().map(|item| OrderItem {
            id: OrderItemId::generate(),
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }));
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self
            .read()?
            .order_items
            .iter()
            .filter(|i| i.order_id == id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use luma_core::{BlogPostId, Price};

    fn product(slug: &str, featured: bool, age_days: i64, category: Option<CategoryId>) -> Product {
        Product {
            id: ProductId::generate(),
            slug: slug.to_string(),
            name: slug.to_string(),
            description: String::new(),
            price: Price::from_cents(10_000),
            image_url: None,
            category_id: category,
            featured,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn post(slug: &str, published: bool, age_days: i64) -> BlogPost {
        BlogPost {
            id: BlogPostId::generate(),
            slug: slug.to_string(),
            title: slug.to_string(),
            excerpt: String::new(),
            content: String::new(),
            image_url: None,
            author: None,
            published,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn test_featured_newest_first_and_limited() {
        let store = MemoryStore::new();
        store.put_product(product("old", true, 10, None)).unwrap();
        store.put_product(product("new", true, 1, None)).unwrap();
        store.put_product(product("plain", false, 0, None)).unwrap();
        store.put_product(product("mid", true, 5, None)).unwrap();

        let featured = store.featured_products(2).await.unwrap();
        let slugs: Vec<_> = featured.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["new", "mid"]);
    }

    #[tokio::test]
    async fn test_products_filtered_by_category() {
        let store = MemoryStore::new();
        let lighting = CategoryId::generate();
        store.put_product(product("lamp", false, 1, Some(lighting))).unwrap();
        store.put_product(product("vase", false, 2, None)).unwrap();

        assert_eq!(store.products(None).await.unwrap().len(), 2);
        let lit = store.products(Some(lighting)).await.unwrap();
        assert_eq!(lit.len(), 1);
        assert_eq!(lit[0].slug, "lamp");
    }

    #[tokio::test]
    async fn test_drafts_are_hidden() {
        let store = MemoryStore::new();
        store.put_post(post("live", true, 1)).unwrap();
        store.put_post(post("draft", false, 0)).unwrap();

        assert_eq!(store.published_posts().await.unwrap().len(), 1);
        assert!(store.post_by_slug("draft").await.unwrap().is_none());
        assert!(store.post_by_slug("live").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cart_lines_are_scoped_to_shopper() {
        let store = MemoryStore::new();
        let vase = product("vase", false, 1, None);
        let product_id = vase.id;
        store.put_product(vase).unwrap();

        let alice = ShopperId::generate();
        let bob = ShopperId::generate();
        let line = CartLineId::generate();
        store
            .insert_line(NewCartLine {
                id: line,
                shopper_id: alice,
                product_id,
                quantity: 1,
            })
            .await
            .unwrap();

        // Bob cannot touch Alice's line.
        store.update_quantity(bob, line, 9).await.unwrap();
        store.delete_line(bob, line).await.unwrap();
        store.clear(bob).await.unwrap();

        let lines = store.lines(alice).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 1);
        assert!(store.lines(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_product_cascades_to_cart() {
        let store = MemoryStore::new();
        let vase = product("vase", false, 1, None);
        let product_id = vase.id;
        store.put_product(vase).unwrap();
        let shopper = ShopperId::generate();
        store
            .insert_line(NewCartLine {
                id: CartLineId::generate(),
                shopper_id: shopper,
                product_id,
                quantity: 2,
            })
            .await
            .unwrap();

        store.delete_product(product_id).unwrap();
        assert!(store.lines(shopper).await.unwrap().is_empty());
    }
}
