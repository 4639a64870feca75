//! The five entity services the API serves, built from one set of settings.

use std::sync::Arc;

use models::item::ItemInput;
use models::order::OrderInput;
use models::product::ProductInput;
use models::review::ReviewInput;
use models::user::UserInput;
use models::{Item, Order, Product, Review, User};
use serde_json::json;
use tracing::info;

use crate::entity_service::{EntityService, ServiceSettings};
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct Services {
    pub items: Arc<EntityService<Item>>,
    pub users: Arc<EntityService<User>>,
    pub products: Arc<EntityService<Product>>,
    pub orders: Arc<EntityService<Order>>,
    pub reviews: Arc<EntityService<Review>>,
}

impl Default for Services {
    fn default() -> Self { Self::new(ServiceSettings::default()) }
}

impl Services {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            items: Arc::new(EntityService::new(settings)),
            users: Arc::new(EntityService::new(settings)),
            products: Arc::new(EntityService::new(settings)),
            orders: Arc::new(EntityService::new(settings)),
            reviews: Arc::new(EntityService::new(settings)),
        }
    }

    /// Populate every collection with a handful of demo records.
    /// Goes through the regular create path, so all validation applies.
    pub async fn seed_demo_data(&self) -> Result<(), ServiceError> {
        for (name, category, quantity, price) in [
            ("Laptop", "electronics", 10, 999.99),
            ("Desk Chair", "furniture", 25, 149.5),
            ("Notebook", "stationery", 200, 2.99),
        ] {
            self.items
                .create(ItemInput {
                    name: Some(json!(name)),
                    category: Some(json!(category)),
                    quantity: Some(json!(quantity)),
                    price: Some(json!(price)),
                    ..Default::default()
                })
                .await?;
        }

        for (name, email, role) in [
            ("Alice Admin", "alice@example.com", "admin"),
            ("Bob Manager", "bob@example.com", "manager"),
            ("Carol User", "carol@example.com", "user"),
        ] {
            self.users
                .create(UserInput {
                    name: Some(json!(name)),
                    email: Some(json!(email)),
                    role: Some(json!(role)),
                    ..Default::default()
                })
                .await?;
        }

        for (name, category, price, stock, sku) in [
            ("Wireless Mouse", "electronics", 24.99, 150, "WM-001"),
            ("Standing Desk", "furniture", 499.0, 5, "SD-002"),
            ("Fountain Pen", "stationery", 35.5, 0, "FP-003"),
        ] {
            self.products
                .create(ProductInput {
                    name: Some(json!(name)),
                    category: Some(json!(category)),
                    price: Some(json!(price)),
                    stock: Some(json!(stock)),
                    sku: Some(json!(sku)),
                    ..Default::default()
                })
                .await?;
        }

        for (customer, email, product, quantity, unit_price, status) in [
            ("Alice Admin", "alice@example.com", "Wireless Mouse", 2, 24.99, "completed"),
            ("Carol User", "carol@example.com", "Standing Desk", 1, 499.0, "pending"),
        ] {
            self.orders
                .create(OrderInput {
                    customer_name: Some(json!(customer)),
                    customer_email: Some(json!(email)),
                    product_name: Some(json!(product)),
                    quantity: Some(json!(quantity)),
                    unit_price: Some(json!(unit_price)),
                    status: Some(json!(status)),
                })
                .await?;
        }

        for (product_id, author, rating, title) in [
            (1, "Alice Admin", 5, "Works great"),
            (2, "Carol User", 4, "Sturdy but heavy"),
        ] {
            self.reviews
                .create(ReviewInput {
                    product_id: Some(json!(product_id)),
                    author: Some(json!(author)),
                    rating: Some(json!(rating)),
                    title: Some(json!(title)),
                    ..Default::default()
                })
                .await?;
        }

        info!(event = "seeded", "demo data loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_populates_every_collection() {
        let services = Services::default();
        services.seed_demo_data().await.unwrap();
        assert_eq!(services.items.count().await, 3);
        assert_eq!(services.users.count().await, 3);
        assert_eq!(services.products.count().await, 3);
        assert_eq!(services.orders.count().await, 2);
        assert_eq!(services.reviews.count().await, 2);

        let stats = services.products.stats().await;
        assert_eq!(stats.low_stock, 1);
        assert_eq!(stats.out_of_stock, 1);

        // 重复导入会触发唯一性校验
        assert!(services.seed_demo_data().await.is_err());
    }
}
