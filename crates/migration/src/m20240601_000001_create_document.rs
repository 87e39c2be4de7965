//! Create `document` table.
//!
//! One row per schema-flexible record; `collection` names the logical
//! collection (`services`, `bookings`) and `doc` holds the JSON body.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Document::Table)
                    .if_not_exists()
                    .col(uuid(Document::Id).primary_key())
                    .col(string_len(Document::Collection, 64).not_null())
                    .col(json_binary(Document::Doc).not_null())
                    .col(timestamp_with_time_zone(Document::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Document::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Document { Table, Id, Collection, Doc, CreatedAt }
