pub mod auth;
pub mod catalog_service;
pub mod eligibility;
pub mod notification;
pub mod numbering;
pub mod order_service;
