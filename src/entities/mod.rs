pub mod activity_log;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod service;
pub mod settings;
pub mod status_history;
pub mod user;
