use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Collection scans ordered by insertion time
        manager
            .create_index(
                Index::create()
                    .name("idx_document_collection_created")
                    .table(Document::Table)
                    .col(Document::Collection)
                    .col(Document::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Owner lookups for booking listings; expression index needs raw SQL
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX IF NOT EXISTS "idx_document_collection_email" ON "document" ("collection", ("doc" ->> 'email'))"#,
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"DROP INDEX IF EXISTS "idx_document_collection_email""#)
            .await?;
        manager
            .drop_index(Index::drop().name("idx_document_collection_created").table(Document::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Document { Table, Collection, CreatedAt }
