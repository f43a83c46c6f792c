//! Postgres-backed entity store.
//!
//! Uniqueness and referential integrity are enforced by named constraints in
//! the schema below; violations come back as structured [`StoreError`]s keyed
//! on the constraint name, never on the error message.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation(field)` for a known constraint |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation(fk)` for a known constraint |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | N/A | `Database` |

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use subhub_core::{Entity, ProductId, SubscriptionId, UserId};
use subhub_products::{MonthlyFee, Product, ProductStatus};
use subhub_subscriptions::Subscription;
use subhub_users::{Email, User};

use super::r#trait::{EntityStore, ForeignKey, StoreError, StoreTx, UniqueField};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID NOT NULL,
        monthly_fee_in_euros NUMERIC(10, 2) NOT NULL,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT products_pkey PRIMARY KEY (id),
        CONSTRAINT products_name_key UNIQUE (name),
        CONSTRAINT products_fee_check CHECK (monthly_fee_in_euros >= 0),
        CONSTRAINT products_status_check CHECK (status IN ('draft', 'published', 'deprecated'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID NOT NULL,
        email TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT users_pkey PRIMARY KEY (id),
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subscriptions (
        id UUID NOT NULL,
        is_active BOOLEAN NOT NULL,
        user_id UUID NOT NULL,
        product_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT subscriptions_pkey PRIMARY KEY (id),
        CONSTRAINT subscriptions_user_id_fkey FOREIGN KEY (user_id)
            REFERENCES users (id) ON DELETE CASCADE,
        CONSTRAINT subscriptions_product_id_fkey FOREIGN KEY (product_id)
            REFERENCES products (id) ON DELETE RESTRICT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS subscriptions_user_id_idx ON subscriptions (user_id)",
];

const PRODUCT_COLUMNS: &str = "id, monthly_fee_in_euros, name, status";
const USER_COLUMNS: &str = "id, email";
const SUBSCRIPTION_COLUMNS: &str = "id, is_active, user_id, product_id";

/// Postgres-backed entity store.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: Arc<PgPool>,
}

impl PostgresEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and constraints if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresTx { tx })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

/// Transaction over [`PostgresEntityStore`]. Dropping it rolls back.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

impl core::fmt::Debug for PostgresTx {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresTx").finish_non_exhaustive()
    }
}

impl PostgresTx {
    async fn fetch_product(
        &mut self,
        operation: &'static str,
        sql: &str,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.as_ref().map(ProductRow::decode).transpose()
    }

    async fn fetch_user(
        &mut self,
        operation: &'static str,
        sql: &str,
        id: UserId,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.as_ref().map(UserRow::decode).transpose()
    }

    async fn fetch_subscription(
        &mut self,
        operation: &'static str,
        sql: &str,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query(sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.as_ref().map(SubscriptionRow::decode).transpose()
    }
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR SHARE");
        self.fetch_product("get_product", &sql, id).await
    }

    async fn get_product_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        self.fetch_product("get_product_for_update", &sql, id).await
    }

    async fn find_product_by_name(&mut self, name: &str) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_product_by_name", e))?;
        row.as_ref().map(ProductRow::decode).transpose()
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id");
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(ProductRow::decode).collect()
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, monthly_fee_in_euros, name, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.monthly_fee().amount())
        .bind(product.name())
        .bind(product.status().as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<Option<Product>, StoreError> {
        let sql = format!(
            "UPDATE products SET monthly_fee_in_euros = $2, name = $3, status = $4 \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(product.id().as_uuid())
            .bind(product.monthly_fee().amount())
            .bind(product.name())
            .bind(product.status().as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;
        row.as_ref().map(ProductRow::decode).transpose()
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}");
        self.fetch_product("delete_product", &sql, id).await
    }

    async fn get_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR SHARE");
        self.fetch_user("get_user", &sql, id).await
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(UserRow::decode).transpose()
    }

    async fn list_users(&mut self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(UserRow::decode).collect()
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
            .bind(user.id().as_uuid())
            .bind(user.email().as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<Option<User>, StoreError> {
        let sql = format!("UPDATE users SET email = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(user.id().as_uuid())
            .bind(user.email().as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        row.as_ref().map(UserRow::decode).transpose()
    }

    async fn delete_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        // Subscriptions go with it via ON DELETE CASCADE.
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");
        self.fetch_user("delete_user", &sql, id).await
    }

    async fn get_subscription(
        &mut self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1");
        self.fetch_subscription("get_subscription", &sql, id).await
    }

    async fn list_subscriptions(&mut self) -> Result<Vec<Subscription>, StoreError> {
        let sql =
            format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY created_at, id");
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_subscriptions", e))?;
        rows.iter().map(SubscriptionRow::decode).collect()
    }

    async fn list_subscriptions_for_user(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<Subscription>, StoreError> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE user_id = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_subscriptions_for_user", e))?;
        rows.iter().map(SubscriptionRow::decode).collect()
    }

    async fn insert_subscription(&mut self, subscription: &Subscription) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, is_active, user_id, product_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(subscription.id().as_uuid())
        .bind(subscription.is_active())
        .bind(subscription.user_id().as_uuid())
        .bind(subscription.product_id().as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_subscription", e))?;
        Ok(())
    }

    async fn update_subscription(
        &mut self,
        subscription: &Subscription,
    ) -> Result<Option<Subscription>, StoreError> {
        let sql = format!(
            "UPDATE subscriptions SET is_active = $2, user_id = $3, product_id = $4 \
             WHERE id = $1 RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(subscription.id().as_uuid())
            .bind(subscription.is_active())
            .bind(subscription.user_id().as_uuid())
            .bind(subscription.product_id().as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_subscription", e))?;
        row.as_ref().map(SubscriptionRow::decode).transpose()
    }

    async fn delete_subscription(
        &mut self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        let sql = format!("DELETE FROM subscriptions WHERE id = $1 RETURNING {SUBSCRIPTION_COLUMNS}");
        self.fetch_subscription("delete_subscription", &sql, id).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

fn unique_field(constraint: &str) -> Option<UniqueField> {
    match constraint {
        "products_pkey" => Some(UniqueField::ProductId),
        "products_name_key" => Some(UniqueField::ProductName),
        "users_pkey" => Some(UniqueField::UserId),
        "users_email_key" => Some(UniqueField::UserEmail),
        "subscriptions_pkey" => Some(UniqueField::SubscriptionId),
        _ => None,
    }
}

fn foreign_key(constraint: &str) -> Option<ForeignKey> {
    match constraint {
        "subscriptions_product_id_fkey" => Some(ForeignKey::SubscriptionProduct),
        "subscriptions_user_id_fkey" => Some(ForeignKey::SubscriptionUser),
        _ => None,
    }
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            let constraint = db_err.constraint();
            let known = match (code.as_deref(), constraint) {
                (Some("23505"), Some(name)) => unique_field(name).map(StoreError::UniqueViolation),
                (Some("23503"), Some(name)) => {
                    foreign_key(name).map(StoreError::ForeignKeyViolation)
                }
                _ => None,
            };
            known.unwrap_or_else(|| StoreError::Database {
                operation,
                message: db_err.message().to_string(),
            })
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        other => StoreError::Database {
            operation,
            message: other.to_string(),
        },
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: uuid::Uuid,
    monthly_fee_in_euros: Decimal,
    name: String,
    status: String,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            monthly_fee_in_euros: row.try_get("monthly_fee_in_euros")?,
            name: row.try_get("name")?,
            status: row.try_get("status")?,
        })
    }
}

impl ProductRow {
    fn decode(row: &PgRow) -> Result<Product, StoreError> {
        let row = ProductRow::from_row(row).map_err(|e| map_sqlx_error("decode_product", e))?;
        row.try_into()
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let inconsistent = |e: subhub_core::DomainError| {
            StoreError::Inconsistent(format!("product {}: {e}", row.id))
        };
        let status: ProductStatus = row.status.parse().map_err(inconsistent)?;
        let fee = MonthlyFee::new(row.monthly_fee_in_euros).map_err(inconsistent)?;
        Product::new(ProductId::from_uuid(row.id), fee, row.name.clone(), status)
            .map_err(inconsistent)
    }
}

#[derive(Debug)]
struct UserRow {
    id: uuid::Uuid,
    email: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
        })
    }
}

impl UserRow {
    fn decode(row: &PgRow) -> Result<User, StoreError> {
        let row = UserRow::from_row(row).map_err(|e| map_sqlx_error("decode_user", e))?;
        let email = Email::parse(&row.email)
            .map_err(|e| StoreError::Inconsistent(format!("user {}: {e}", row.id)))?;
        Ok(User::new(UserId::from_uuid(row.id), email))
    }
}

#[derive(Debug)]
struct SubscriptionRow {
    id: uuid::Uuid,
    is_active: bool,
    user_id: uuid::Uuid,
    product_id: uuid::Uuid,
}

impl<'r> FromRow<'r, PgRow> for SubscriptionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SubscriptionRow {
            id: row.try_get("id")?,
            is_active: row.try_get("is_active")?,
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
        })
    }
}

impl SubscriptionRow {
    fn decode(row: &PgRow) -> Result<Subscription, StoreError> {
        let row =
            SubscriptionRow::from_row(row).map_err(|e| map_sqlx_error("decode_subscription", e))?;
        Ok(Subscription::new(
            SubscriptionId::from_uuid(row.id),
            row.is_active,
            UserId::from_uuid(row.user_id),
            ProductId::from_uuid(row.product_id),
        ))
    }
}
