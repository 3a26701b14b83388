use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Complaints {
    Table,
    Id,
    Category,
    Title,
    Details,
    Priority,
    IsAnonymous,
    StudentName,
    StudentEmail,
    StudentId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaints::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Complaints::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Complaints::Category).string_len(50).not_null())
                    .col(ColumnDef::new(Complaints::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Complaints::Details).text().not_null())
                    .col(ColumnDef::new(Complaints::Priority).string_len(20).null())
                    .col(
                        ColumnDef::new(Complaints::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Complaints::StudentName).string_len(100).null())
                    .col(ColumnDef::new(Complaints::StudentEmail).string_len(255).null())
                    .col(ColumnDef::new(Complaints::StudentId).string_len(50).null())
                    .col(
                        ColumnDef::new(Complaints::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Anonymous rows carry no identity; named rows carry all of it.
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE complaints ADD CONSTRAINT chk_complaints_identity CHECK (
                    (is_anonymous AND student_name IS NULL AND student_email IS NULL AND student_id IS NULL)
                    OR (NOT is_anonymous AND student_name IS NOT NULL AND student_email IS NOT NULL AND student_id IS NOT NULL)
                )",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_complaints_created_at")
                    .table(Complaints::Table)
                    .col(Complaints::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_complaints_category_created_at")
                    .table(Complaints::Table)
                    .col(Complaints::Category)
                    .col(Complaints::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Complaints::Table).to_owned())
            .await
    }
}
