pub use sea_orm_migration::prelude::*;

mod m20260801_000001_users;
mod m20260801_000002_owners;
mod m20260801_000003_tags;
mod m20260801_000004_transactions;
mod m20260801_000005_lpg;
mod m20260801_000006_settings_audit;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_users::Migration),
            Box::new(m20260801_000002_owners::Migration),
            Box::new(m20260801_000003_tags::Migration),
            Box::new(m20260801_000004_transactions::Migration),
            Box::new(m20260801_000005_lpg::Migration),
            Box::new(m20260801_000006_settings_audit::Migration),
        ]
    }
}
