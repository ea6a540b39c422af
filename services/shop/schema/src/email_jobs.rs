use sea_orm::entity::prelude::*;

/// Outbound email queued for background delivery.
/// `state` holds an `EmailJobState`; `version` guards concurrent workers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "email_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub recipient: String,
    pub sender: String,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub html: String,
    pub state: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub version: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub sent_at: Option<chrono::DateTime<chrono::Utc>>,
    pub failed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
