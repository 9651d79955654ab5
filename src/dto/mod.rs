pub mod auth;
pub mod cart;
pub mod catalog;
pub mod consultations;
pub mod dashboard;
pub mod orders;
pub mod payments;
pub mod products;
pub mod services;
pub mod shops;
