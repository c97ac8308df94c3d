use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_uniq(Users::Username))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LibraryEntries::Table)
                    .if_not_exists()
                    .col(pk_auto(LibraryEntries::Id))
                    .col(integer(LibraryEntries::UserId))
                    .col(integer(LibraryEntries::MediaId))
                    .col(string(LibraryEntries::MediaType))
                    .col(string(LibraryEntries::List))
                    .col(big_integer(LibraryEntries::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // One entry per title per user across both lists.
        manager
            .create_index(
                Index::create()
                    .name("idx_library_entries_unique")
                    .table(LibraryEntries::Table)
                    .col(LibraryEntries::UserId)
                    .col(LibraryEntries::MediaId)
                    .col(LibraryEntries::MediaType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_library_entries_user_list")
                    .table(LibraryEntries::Table)
                    .col(LibraryEntries::UserId)
                    .col(LibraryEntries::List)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(pk_auto(Reviews::Id))
                    .col(integer(Reviews::UserId))
                    .col(integer(Reviews::MediaId))
                    .col(string(Reviews::MediaType))
                    .col(double(Reviews::Rating))
                    .col(text_null(Reviews::Comment))
                    .col(boolean(Reviews::IsPublicUtility))
                    .col(big_integer(Reviews::CreatedAt))
                    .col(big_integer(Reviews::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_unique")
                    .table(Reviews::Table)
                    .col(Reviews::UserId)
                    .col(Reviews::MediaId)
                    .col(Reviews::MediaType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(LibraryEntries::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
}

#[derive(DeriveIden)]
enum LibraryEntries {
    Table,
    Id,
    UserId,
    MediaId,
    MediaType,
    List,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    UserId,
    MediaId,
    MediaType,
    Rating,
    Comment,
    IsPublicUtility,
    CreatedAt,
    UpdatedAt,
}
