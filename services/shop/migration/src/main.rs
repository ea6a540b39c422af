use sea_orm_migration::prelude::*;

use spriie_shop_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
