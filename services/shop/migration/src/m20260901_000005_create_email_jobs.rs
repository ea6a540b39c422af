use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailJobs::Recipient).string().not_null())
                    .col(ColumnDef::new(EmailJobs::Sender).string().not_null())
                    .col(ColumnDef::new(EmailJobs::Subject).string().not_null())
                    .col(ColumnDef::new(EmailJobs::Html).text().not_null())
                    .col(
                        ColumnDef::new(EmailJobs::State)
                            .string()
                            .not_null()
                            .default("queued"),
                    )
                    .col(
                        ColumnDef::new(EmailJobs::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(EmailJobs::LastError).text())
                    .col(
                        ColumnDef::new(EmailJobs::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EmailJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailJobs::SentAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(EmailJobs::FailedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Dispatcher poll: queued jobs, oldest first.
        manager
            .create_index(
                Index::create()
                    .table(EmailJobs::Table)
                    .col(EmailJobs::State)
                    .col(EmailJobs::CreatedAt)
                    .name("idx_email_jobs_state_created_at")
                    .to_owned(),
            )
            .await?;

        // Resurrector poll: dead-lettered jobs, oldest failure first.
        manager
            .create_index(
                Index::create()
                    .table(EmailJobs::Table)
                    .col(EmailJobs::State)
                    .col(EmailJobs::FailedAt)
                    .name("idx_email_jobs_state_failed_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailJobs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EmailJobs {
    Table,
    Id,
    Recipient,
    Sender,
    Subject,
    Html,
    State,
    Attempts,
    LastError,
    Version,
    CreatedAt,
    SentAt,
    FailedAt,
}
