pub mod activity;
pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod reports;
pub mod settings;
pub mod users;
