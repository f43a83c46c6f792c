use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

use subhub_core::{DomainResult, Entity, ProductId, SubscriptionId, UserId};
use subhub_infra::read_model::{SubscriptionView, UserView};
use subhub_products::{MonthlyFee, Product, ProductStatus};
use subhub_subscriptions::Subscription;
use subhub_users::{Email, User};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub id: Uuid,
    pub monthly_fee_in_euros: Decimal,
    pub name: String,
    pub status: ProductStatus,
}

impl CreateProductRequest {
    pub fn into_product(self) -> DomainResult<Product> {
        Product::new(
            ProductId::from_uuid(self.id),
            MonthlyFee::new(self.monthly_fee_in_euros)?,
            self.name,
            self.status,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub monthly_fee_in_euros: Decimal,
    pub name: String,
    pub status: ProductStatus,
}

impl UpdateProductRequest {
    pub fn into_product(self, id: ProductId) -> DomainResult<Product> {
        Product::new(
            id,
            MonthlyFee::new(self.monthly_fee_in_euros)?,
            self.name,
            self.status,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub id: Uuid,
    pub email: String,
}

impl CreateUserRequest {
    pub fn into_user(self) -> DomainResult<User> {
        Ok(User::new(UserId::from_uuid(self.id), Email::parse(&self.email)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
}

impl UpdateUserRequest {
    pub fn into_user(self, id: UserId) -> DomainResult<User> {
        Ok(User::new(id, Email::parse(&self.email)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub id: Uuid,
    pub is_active: bool,
    pub user_id: Uuid,
    pub product_id: Uuid,
}

impl CreateSubscriptionRequest {
    pub fn into_subscription(self) -> Subscription {
        Subscription::new(
            SubscriptionId::from_uuid(self.id),
            self.is_active,
            UserId::from_uuid(self.user_id),
            ProductId::from_uuid(self.product_id),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub is_active: bool,
    pub user_id: Uuid,
    pub product_id: Uuid,
}

impl UpdateSubscriptionRequest {
    pub fn into_subscription(self, id: SubscriptionId) -> Subscription {
        Subscription::new(
            id,
            self.is_active,
            UserId::from_uuid(self.user_id),
            ProductId::from_uuid(self.product_id),
        )
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(product: &Product) -> JsonValue {
    json!({
        "id": product.id().to_string(),
        "monthly_fee_in_euros": product.monthly_fee().amount(),
        "name": product.name(),
        "status": product.status(),
    })
}

pub fn subscription_to_json(view: &SubscriptionView) -> JsonValue {
    json!({
        "id": view.subscription.id().to_string(),
        "is_active": view.subscription.is_active(),
        "user_id": view.subscription.user_id().to_string(),
        "product": product_to_json(&view.product),
    })
}

pub fn user_to_json(view: &UserView) -> JsonValue {
    json!({
        "id": view.user.id().to_string(),
        "email": view.user.email().as_str(),
        "subscriptions": view.subscriptions.iter().map(subscription_to_json).collect::<Vec<_>>(),
    })
}
