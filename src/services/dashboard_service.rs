use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    db::DbPool,
    dto::dashboard::{
        DailyRevenue, DashboardQuery, Overview, Period, RevenueOrderRow, RevenueStats, RoleCount,
        ShopRow, ShopStats, UserRow, UserStats,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    status::OrderStatus,
};

/// Half-open `[start, end)` range covering one calendar month in UTC.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub period: Period,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn resolve(month: Option<u32>, year: Option<i32>) -> AppResult<Self> {
        let today = Utc::now().date_naive();
        let month = month.unwrap_or(today.month());
        let year = year.unwrap_or(today.year());
        if !(1..=12).contains(&month) {
            return Err(AppError::BadRequest("month must be between 1 and 12".into()));
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::BadRequest("year is out of range".into()))?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| AppError::BadRequest("year is out of range".into()))?;
        Ok(Self {
            period: Period { month, year },
            start: start.and_time(chrono::NaiveTime::MIN).and_utc(),
            end: end.and_time(chrono::NaiveTime::MIN).and_utc(),
        })
    }
}

fn revenue_states() -> Vec<String> {
    OrderStatus::revenue_states()
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

async fn count(pool: &DbPool, sql: &str) -> AppResult<i64> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?)
}

async fn count_in(pool: &DbPool, sql: &str, window: &Window) -> AppResult<i64> {
    Ok(sqlx::query_scalar::<_, i64>(sql)
        .bind(window.start)
        .bind(window.end)
        .fetch_one(pool)
        .await?)
}

async fn revenue(pool: &DbPool, window: Option<&Window>) -> AppResult<i64> {
    let total = match window {
        Some(w) => {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COALESCE(SUM(total_amount), 0)::BIGINT
                FROM orders
                WHERE status = ANY($1) AND created_at >= $2 AND created_at < $3
                "#,
            )
            .bind(revenue_states())
            .bind(w.start)
            .bind(w.end)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders WHERE status = ANY($1)",
            )
            .bind(revenue_states())
            .fetch_one(pool)
            .await?
        }
    };
    Ok(total)
}

async fn revenue_with_status(pool: &DbPool, status: OrderStatus) -> AppResult<i64> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders WHERE status = $1",
    )
    .bind(status.as_str())
    .fetch_one(pool)
    .await?)
}

fn average(total: i64, count: i64) -> i64 {
    if count > 0 { total / count } else { 0 }
}

pub async fn overview(
    pool: &DbPool,
    user: &AuthUser,
    query: DashboardQuery,
) -> AppResult<ApiResponse<Overview>> {
    ensure_admin(user)?;
    let window = Window::resolve(query.month, query.year)?;

    let data = Overview {
        period: window.period,
        total_users: count(pool, "SELECT COUNT(*) FROM accounts").await?,
        new_users: count_in(
            pool,
            "SELECT COUNT(*) FROM accounts WHERE created_at >= $1 AND created_at < $2",
            &window,
        )
        .await?,
        total_shops: count(pool, "SELECT COUNT(*) FROM shops").await?,
        new_shops: count_in(
            pool,
            "SELECT COUNT(*) FROM shops WHERE created_at >= $1 AND created_at < $2",
            &window,
        )
        .await?,
        pending_shops: count(
            pool,
            "SELECT COUNT(*) FROM shops WHERE approval_status = 'pending'",
        )
        .await?,
        total_orders: count(pool, "SELECT COUNT(*) FROM orders").await?,
        orders_in_period: count_in(
            pool,
            "SELECT COUNT(*) FROM orders WHERE created_at >= $1 AND created_at < $2",
            &window,
        )
        .await?,
        total_revenue: revenue(pool, None).await?,
        revenue_in_period: revenue(pool, Some(&window)).await?,
        total_services: count(pool, "SELECT COUNT(*) FROM services").await?,
        available_services: count(
            pool,
            "SELECT COUNT(*) FROM services WHERE availability = 'available'",
        )
        .await?,
    };

    Ok(ApiResponse::success("Dashboard overview", data, None))
}

pub async fn users(
    pool: &DbPool,
    user: &AuthUser,
    query: DashboardQuery,
) -> AppResult<ApiResponse<UserStats>> {
    ensure_admin(user)?;
    let window = Window::resolve(query.month, query.year)?;
    let (page, limit, offset) = query.pagination().normalize();

    let total = count(pool, "SELECT COUNT(*) FROM accounts").await?;
    let verified = count(
        pool,
        "SELECT COUNT(*) FROM accounts WHERE is_email_verified",
    )
    .await?;
    let by_role = sqlx::query_as::<_, RoleCount>(
        "SELECT role, COUNT(*) AS count FROM accounts GROUP BY role ORDER BY role",
    )
    .fetch_all(pool)
    .await?;
    let users = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, role, is_email_verified, created_at
        FROM accounts
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let data = UserStats {
        period: window.period,
        total,
        new_in_period: count_in(
            pool,
            "SELECT COUNT(*) FROM accounts WHERE created_at >= $1 AND created_at < $2",
            &window,
        )
        .await?,
        verified,
        unverified: total - verified,
        by_role,
        users,
    };

    Ok(ApiResponse::success(
        "User statistics",
        data,
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn shops(
    pool: &DbPool,
    user: &AuthUser,
    query: DashboardQuery,
) -> AppResult<ApiResponse<ShopStats>> {
    ensure_admin(user)?;
    let window = Window::resolve(query.month, query.year)?;
    let (page, limit, offset) = query.pagination().normalize();

    let total = count(pool, "SELECT COUNT(*) FROM shops").await?;
    let shops = sqlx::query_as::<_, ShopRow>(
        r#"
        SELECT s.id, s.shop_name, a.email AS owner_email, s.approval_status,
               s.is_active, s.has_active_package,
               (SELECT COUNT(*) FROM services sv WHERE sv.shop_id = s.id) AS service_count,
               s.created_at
        FROM shops s
        JOIN accounts a ON a.id = s.account_id
        ORDER BY s.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let data = ShopStats {
        period: window.period,
        total,
        new_in_period: count_in(
            pool,
            "SELECT COUNT(*) FROM shops WHERE created_at >= $1 AND created_at < $2",
            &window,
        )
        .await?,
        pending: count(pool, "SELECT COUNT(*) FROM shops WHERE approval_status = 'pending'").await?,
        approved: count(pool, "SELECT COUNT(*) FROM shops WHERE approval_status = 'approved'")
            .await?,
        rejected: count(pool, "SELECT COUNT(*) FROM shops WHERE approval_status = 'rejected'")
            .await?,
        active: count(pool, "SELECT COUNT(*) FROM shops WHERE is_active").await?,
        with_package: count(pool, "SELECT COUNT(*) FROM shops WHERE has_active_package").await?,
        shops,
    };

    Ok(ApiResponse::success(
        "Shop statistics",
        data,
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn revenue_stats(
    pool: &DbPool,
    user: &AuthUser,
    query: DashboardQuery,
) -> AppResult<ApiResponse<RevenueStats>> {
    ensure_admin(user)?;
    let window = Window::resolve(query.month, query.year)?;
    let (page, limit, offset) = query.pagination().normalize();

    let total_revenue = revenue(pool, None).await?;
    let revenue_in_period = revenue(pool, Some(&window)).await?;
    let total_orders = count(pool, "SELECT COUNT(*) FROM orders").await?;
    let orders_in_period = count_in(
        pool,
        "SELECT COUNT(*) FROM orders WHERE created_at >= $1 AND created_at < $2",
        &window,
    )
    .await?;

    let daily = sqlx::query_as::<_, DailyRevenue>(
        r#"
        SELECT EXTRACT(DAY FROM created_at AT TIME ZONE 'UTC')::INT AS day,
               COUNT(*) AS orders,
               COALESCE(SUM(total_amount), 0)::BIGINT AS revenue
        FROM orders
        WHERE status = ANY($1) AND created_at >= $2 AND created_at < $3
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(revenue_states())
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await?;

    let paid_total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ANY($1)")
            .bind(revenue_states())
            .fetch_one(pool)
            .await?;
    let orders = sqlx::query_as::<_, RevenueOrderRow>(
        r#"
        SELECT id, order_code, customer_email, total_amount, status, payment_status, created_at
        FROM orders
        WHERE status = ANY($1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(revenue_states())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let data = RevenueStats {
        period: window.period,
        total_revenue,
        revenue_in_period,
        total_orders,
        orders_in_period,
        average_order_value: average(total_revenue, total_orders),
        average_order_value_in_period: average(revenue_in_period, orders_in_period),
        pending_revenue: revenue_with_status(pool, OrderStatus::Pending).await?,
        completed_revenue: revenue_with_status(pool, OrderStatus::Completed).await?,
        daily,
        orders,
    };

    Ok(ApiResponse::success(
        "Revenue statistics",
        data,
        Some(Meta::new(page, limit, paid_total)),
    ))
}
