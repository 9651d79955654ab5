use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    status::{
        AvailabilityType, BookingPaymentStatus, BookingStatus, ComboType, OrderStatus,
        ServiceAvailability, ServiceType,
    },
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
    Rating,
}

/// `serde(flatten)` cannot decode numbers from a query string, so list queries
/// carry `page`/`per_page` inline and expose them through this.
macro_rules! paginated {
    ($($name:ident),+) => {
        $(impl $name {
            pub fn pagination(&self) -> Pagination {
                Pagination {
                    page: self.page,
                    per_page: self.per_page,
                }
            }
        })+
    };
}

paginated!(
    ProductQuery,
    ComboQuery,
    OrderListQuery,
    ServiceQuery,
    BookingQuery,
    ConsultationQuery
);

/// Parses a comma separated list of ids such as `brand=a,b`.
pub fn parse_id_list(raw: Option<&str>, field: &str) -> AppResult<Vec<Uuid>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| AppError::BadRequest(format!("{field} contains an invalid id")))
        })
        .collect()
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    /// Comma separated brand ids.
    pub brand: Option<String>,
    /// Comma separated product type ids.
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub availability_type: Option<AvailabilityType>,
    pub camera_type: Option<String>,
    pub sensor_type: Option<String>,
    pub lens_mount: Option<String>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ComboQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub combo_type: Option<ComboType>,
    pub area: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ServiceQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub shop_id: Option<Uuid>,
    /// Comma separated product type ids.
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub service_type: Option<ServiceType>,
    pub availability: Option<ServiceAvailability>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BookingQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<BookingStatus>,
    pub payment_status: Option<BookingPaymentStatus>,
    /// Matches customer name, email or phone.
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ConsultationQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Comma separated statuses, e.g. `scheduled,pending_reschedule`.
    pub status: Option<String>,
}
