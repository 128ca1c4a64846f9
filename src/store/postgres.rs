//! Postgres-backed stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::{CatalogPrice, NewOrder, OrderItemView, OrderLine, OrderStatus, OrderSummary, OrderUpdate, PaymentStatus, StockLevel};
use crate::domain::value_objects::Quantity;
use crate::store::{CatalogStore, OrderStore};
use crate::{EcommerceError, OrderId, ProductId, Result, UserId};

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow { product_id: i64, product_name: String, quantity: i32, unit_price: Decimal }

#[derive(sqlx::FromRow)]
struct OrderJoinRow {
    id: Uuid,
    total_price: Decimal,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
}

fn decode_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> EcommerceError {
    EcommerceError::Storage(sqlx::Error::Decode(Box::new(e)))
}

fn quantity(raw: i32) -> Result<Quantity> {
    u32::try_from(raw).map(Quantity::new).map_err(decode_err)
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn stock_level(&self, id: ProductId) -> Result<Option<StockLevel>> {
        Ok(sqlx::query_as::<_, StockLevel>("SELECT name, stock FROM products WHERE id = $1 LIMIT 1")
            .bind(id).fetch_optional(&self.pool).await?)
    }

    async fn prices(&self, ids: &[ProductId]) -> Result<Vec<CatalogPrice>> {
        Ok(sqlx::query_as::<_, CatalogPrice>("SELECT id, name, price FROM products WHERE id = ANY($1)")
            .bind(ids.to_vec()).fetch_all(&self.pool).await?)
    }

    async fn record_sale(&self, id: ProductId, qty: Quantity) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("UPDATE products SET stock = stock - $2, sales_count = sales_count + $2, updated_at = NOW() WHERE id = $1 RETURNING stock")
            .bind(id).bind(i64::from(qty.value())).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.0))
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert(&self, order: &NewOrder) -> Result<Option<OrderId>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(Uuid,)> = sqlx::query_as("INSERT INTO orders (id, user_id, total_price, currency, status, payment_status, shipping_address, created_at, updated_at) VALUES ($1, $2, $3, $4, 'pending', 'unpaid', $5, NOW(), NOW()) RETURNING id")
            .bind(Uuid::now_v7()).bind(order.user_id()).bind(order.total().amount()).bind(order.total().currency()).bind(order.shipping_address())
            .fetch_optional(&mut *tx).await?;
        let Some((order_id,)) = row else { return Ok(None) };

        for line in order.lines() {
            let qty = i32::try_from(line.quantity.value()).map_err(|e| EcommerceError::InvalidOrder(e.to_string()))?;
            sqlx::query("INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)")
                .bind(order_id).bind(line.product_id).bind(&line.product_name).bind(qty).bind(line.unit_price)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(Some(order_id))
    }

    async fn attach_session(&self, user_id: UserId, order_id: OrderId, session_id: &str) -> Result<u64> {
        let r = sqlx::query("UPDATE orders SET payment_session_id = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2")
            .bind(order_id).bind(user_id).bind(session_id).execute(&self.pool).await?;
        Ok(r.rows_affected())
    }

    async fn update_status(&self, user_id: UserId, order_id: OrderId, update: &OrderUpdate) -> Result<u64> {
        if update.is_empty() { return Ok(0); }
        let r = sqlx::query("UPDATE orders SET status = COALESCE($3, status), payment_status = COALESCE($4, payment_status), updated_at = NOW() WHERE id = $1 AND user_id = $2 AND payment_status <> 'payment_success'")
            .bind(order_id).bind(user_id)
            .bind(update.status.map(|s| s.as_str())).bind(update.payment_status.map(|p| p.as_str()))
            .execute(&self.pool).await?;
        Ok(r.rows_affected())
    }

    async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query_as::<_, OrderItemRow>("SELECT product_id, product_name, quantity, unit_price FROM order_items WHERE order_id = $1 ORDER BY id")
            .bind(order_id).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Ok(OrderLine { product_id: r.product_id, product_name: r.product_name, quantity: quantity(r.quantity)?, unit_price: r.unit_price }))
            .collect()
    }

    async fn history(&self, user_id: UserId) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query_as::<_, OrderJoinRow>(
            "SELECT o.id, o.total_price, o.status, o.payment_status, o.created_at, oi.product_name, oi.quantity, oi.unit_price \
             FROM orders AS o JOIN order_items AS oi ON o.id = oi.order_id \
             WHERE o.user_id = $1 ORDER BY o.created_at DESC, oi.id ASC")
            .bind(user_id).fetch_all(&self.pool).await?;

        let mut orders: Vec<OrderSummary> = Vec::new();
        let mut index: HashMap<Uuid, usize> = HashMap::new();
        for row in rows {
            let slot = match index.get(&row.id) {
                Some(&i) => i,
                None => {
                    orders.push(OrderSummary {
                        id: row.id, total_price: row.total_price,
                        status: row.status.parse::<OrderStatus>().map_err(decode_err)?,
                        payment_status: row.payment_status.parse::<PaymentStatus>().map_err(decode_err)?,
                        created_at: row.created_at, items: vec![],
                    });
                    index.insert(row.id, orders.len() - 1);
                    orders.len() - 1
                }
            };
            orders[slot].items.push(OrderItemView { product_name: row.product_name, quantity: quantity(row.quantity)?.value(), unit_price: row.unit_price });
        }
        Ok(orders)
    }
}
