use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::routes::params::Pagination;

/// Month window for dashboard figures; defaults to the current month.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DashboardQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl DashboardQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Overview {
    pub period: Period,
    pub total_users: i64,
    pub new_users: i64,
    pub total_shops: i64,
    pub new_shops: i64,
    pub pending_shops: i64,
    pub total_orders: i64,
    pub orders_in_period: i64,
    pub total_revenue: i64,
    pub revenue_in_period: i64,
    pub total_services: i64,
    pub available_services: i64,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStats {
    pub period: Period,
    pub total: i64,
    pub new_in_period: i64,
    pub verified: i64,
    pub unverified: i64,
    pub by_role: Vec<RoleCount>,
    pub users: Vec<UserRow>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct ShopRow {
    pub id: Uuid,
    pub shop_name: String,
    pub owner_email: String,
    pub approval_status: String,
    pub is_active: bool,
    pub has_active_package: bool,
    pub service_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopStats {
    pub period: Period,
    pub total: i64,
    pub new_in_period: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub active: i64,
    pub with_package: i64,
    pub shops: Vec<ShopRow>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct DailyRevenue {
    pub day: i32,
    pub orders: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct RevenueOrderRow {
    pub id: Uuid,
    pub order_code: i64,
    pub customer_email: String,
    pub total_amount: i64,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueStats {
    pub period: Period,
    pub total_revenue: i64,
    pub revenue_in_period: i64,
    pub total_orders: i64,
    pub orders_in_period: i64,
    pub average_order_value: i64,
    pub average_order_value_in_period: i64,
    pub pending_revenue: i64,
    pub completed_revenue: i64,
    pub daily: Vec<DailyRevenue>,
    pub orders: Vec<RevenueOrderRow>,
}
