pub mod accounts;
pub mod bookings;
pub mod brands;
pub mod cart_items;
pub mod carts;
pub mod combo_products;
pub mod combos;
pub mod consultation_calls;
pub mod consultation_requests;
pub mod order_items;
pub mod orders;
pub mod payment_events;
pub mod payment_links;
pub mod product_categories;
pub mod product_types;
pub mod products;
pub mod service_categories;
pub mod service_reviews;
pub mod services;
pub mod shops;

pub use accounts::Entity as Accounts;
pub use bookings::Entity as Bookings;
pub use brands::Entity as Brands;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use combo_products::Entity as ComboProducts;
pub use combos::Entity as Combos;
pub use consultation_calls::Entity as ConsultationCalls;
pub use consultation_requests::Entity as ConsultationRequests;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_events::Entity as PaymentEvents;
pub use payment_links::Entity as PaymentLinks;
pub use product_categories::Entity as ProductCategories;
pub use product_types::Entity as ProductTypes;
pub use products::Entity as Products;
pub use service_categories::Entity as ServiceCategories;
pub use service_reviews::Entity as ServiceReviews;
pub use services::Entity as Services;
pub use shops::Entity as Shops;
