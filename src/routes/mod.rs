use axum::Router;

use crate::state::AppState;

pub mod bookings;
pub mod brands;
pub mod cart;
pub mod combos;
pub mod consultations;
pub mod dashboard;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod product_types;
pub mod products;
pub mod reviews;
pub mod service_listings;
pub mod shops;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/brands", brands::router())
        .nest("/product-types", product_types::router())
        .nest("/combos", combos::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/bookings", bookings::router())
        .nest("/services", service_listings::router())
        .nest("/reviews", reviews::router())
        .nest("/shops", shops::router())
        .nest("/payments", payments::router())
        .nest("/consultations", consultations::router())
        .nest("/dashboard", dashboard::router())
}
