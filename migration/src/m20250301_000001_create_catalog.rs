use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(integer(Movies::Id).primary_key())
                    .col(string(Movies::Title))
                    .col(string_null(Movies::ReleaseDate))
                    .col(integer_null(Movies::Runtime))
                    .col(text_null(Movies::Overview))
                    .col(string_null(Movies::PosterPath))
                    .col(double(Movies::Popularity))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_release_date")
                    .table(Movies::Table)
                    .col(Movies::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TvShows::Table)
                    .if_not_exists()
                    .col(integer(TvShows::Id).primary_key())
                    .col(string(TvShows::Name))
                    .col(string_null(TvShows::FirstAirDate))
                    .col(text_null(TvShows::Overview))
                    .col(string_null(TvShows::PosterPath))
                    .col(double(TvShows::Popularity))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(integer(Genres::Id).primary_key())
                    .col(string(Genres::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenres::Table)
                    .if_not_exists()
                    .col(integer(MovieGenres::MovieId))
                    .col(integer(MovieGenres::GenreId))
                    .primary_key(Index::create().col(MovieGenres::MovieId).col(MovieGenres::GenreId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genres_genre")
                    .table(MovieGenres::Table)
                    .col(MovieGenres::GenreId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionCompanies::Table)
                    .if_not_exists()
                    .col(integer(ProductionCompanies::Id).primary_key())
                    .col(string(ProductionCompanies::Name))
                    .col(string_null(ProductionCompanies::LogoPath))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCompanies::Table)
                    .if_not_exists()
                    .col(integer(MovieCompanies::MovieId))
                    .col(integer(MovieCompanies::CompanyId))
                    .primary_key(
                        Index::create().col(MovieCompanies::MovieId).col(MovieCompanies::CompanyId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_companies_company")
                    .table(MovieCompanies::Table)
                    .col(MovieCompanies::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(People::Table)
                    .if_not_exists()
                    .col(integer(People::Id).primary_key())
                    .col(string(People::Name))
                    .col(string_null(People::ProfilePath))
                    .col(double(People::Popularity))
                    .col(string(People::Roles))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCredits::Table)
                    .if_not_exists()
                    .col(integer(MovieCredits::MovieId))
                    .col(integer(MovieCredits::PersonId))
                    .col(string(MovieCredits::Role))
                    .primary_key(
                        Index::create()
                            .col(MovieCredits::MovieId)
                            .col(MovieCredits::PersonId)
                            .col(MovieCredits::Role),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_credits_role_person")
                    .table(MovieCredits::Table)
                    .col(MovieCredits::Role)
                    .col(MovieCredits::PersonId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieCredits::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(People::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieCompanies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ProductionCompanies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(TvShows::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    ReleaseDate,
    Runtime,
    Overview,
    PosterPath,
    Popularity,
}

#[derive(DeriveIden)]
enum TvShows {
    Table,
    Id,
    Name,
    FirstAirDate,
    Overview,
    PosterPath,
    Popularity,
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum MovieGenres {
    Table,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum ProductionCompanies {
    Table,
    Id,
    Name,
    LogoPath,
}

#[derive(DeriveIden)]
enum MovieCompanies {
    Table,
    MovieId,
    CompanyId,
}

#[derive(DeriveIden)]
enum People {
    Table,
    Id,
    Name,
    ProfilePath,
    Popularity,
    Roles,
}

#[derive(DeriveIden)]
enum MovieCredits {
    Table,
    MovieId,
    PersonId,
    Role,
}
