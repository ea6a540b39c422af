//! sea-orm entities for the shop service database.

pub mod email_jobs;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod transactions;
