pub mod admin_orders;
pub mod auth;
pub mod catalog;
pub mod orders;
