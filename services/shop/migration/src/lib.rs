use sea_orm_migration::prelude::*;

mod m20260901_000001_create_products;
mod m20260901_000002_create_orders;
mod m20260901_000003_create_order_items;
mod m20260901_000004_create_transactions;
mod m20260901_000005_create_email_jobs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_products::Migration),
            Box::new(m20260901_000002_create_orders::Migration),
            Box::new(m20260901_000003_create_order_items::Migration),
            Box::new(m20260901_000004_create_transactions::Migration),
            Box::new(m20260901_000005_create_email_jobs::Migration),
        ]
    }
}
