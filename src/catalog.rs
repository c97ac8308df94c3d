use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::OnConflict,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    entities::{
        genre, movie, movie_company, movie_credit, movie_genre, person, production_company, tv_show,
    },
    error::{AppError, AppResult},
    filters::YEAR_RANGE,
    models::CrewRole,
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieImport {
    pub id: i32,
    pub title: String,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genres: Vec<GenreRef>,
    #[serde(default)]
    pub companies: Vec<CompanyRef>,
    #[serde(default)]
    pub credits: Vec<CreditImport>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenreRef {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRef {
    pub id: i32,
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: i32,
    pub name: String,
    pub profile_path: Option<String>,
    pub popularity: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreditImport {
    pub person: PersonRef,
    pub role: CrewRole,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowImport {
    pub id: i32,
    pub name: String,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub popularity: Option<f64>,
}

/// Upserts a movie and replaces its genre, company and credit links.
pub async fn import_movie(db: &DatabaseConnection, import: MovieImport) -> AppResult<movie::Model> {
    let title = import.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    let release_date = normalize_date(import.release_date.as_deref())?;

    let txn = db.begin().await?;

    movie::Entity::insert(movie::ActiveModel {
        id: Set(import.id),
        title: Set(title),
        release_date: Set(release_date),
        runtime: Set(import.runtime),
        overview: Set(import.overview.clone()),
        poster_path: Set(import.poster_path.clone()),
        popularity: Set(import.popularity.unwrap_or_default()),
    })
    .on_conflict(
        OnConflict::column(movie::Column::Id)
            .update_columns([
                movie::Column::Title,
                movie::Column::ReleaseDate,
                movie::Column::Runtime,
                movie::Column::Overview,
                movie::Column::PosterPath,
                movie::Column::Popularity,
            ])
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    replace_genres(&txn, import.id, &import.genres).await?;
    replace_companies(&txn, import.id, &import.companies).await?;
    replace_credits(&txn, import.id, &import.credits).await?;

    txn.commit().await?;

    info!(
        movie_id = import.id,
        genres = import.genres.len(),
        companies = import.companies.len(),
        credits = import.credits.len(),
        "imported movie"
    );

    movie::Entity::find_by_id(import.id)
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("movie {} missing after import", import.id).into())
}

pub async fn import_show(db: &DatabaseConnection, import: ShowImport) -> AppResult<tv_show::Model> {
    let name = import.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    let first_air_date = normalize_date(import.first_air_date.as_deref())?;

    tv_show::Entity::insert(tv_show::ActiveModel {
        id: Set(import.id),
        name: Set(name),
        first_air_date: Set(first_air_date),
        overview: Set(import.overview),
        poster_path: Set(import.poster_path),
        popularity: Set(import.popularity.unwrap_or_default()),
    })
    .on_conflict(
        OnConflict::column(tv_show::Column::Id)
            .update_columns([
                tv_show::Column::Name,
                tv_show::Column::FirstAirDate,
                tv_show::Column::Overview,
                tv_show::Column::PosterPath,
                tv_show::Column::Popularity,
            ])
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    info!(show_id = import.id, "imported show");

    tv_show::Entity::find_by_id(import.id)
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("show {} missing after import", import.id).into())
}

async fn replace_genres<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    genres: &[GenreRef],
) -> AppResult<()> {
    movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;

    let mut linked = BTreeSet::new();
    for g in genres {
        genre::Entity::insert(genre::ActiveModel { id: Set(g.id), name: Set(g.name.clone()) })
            .on_conflict(
                OnConflict::column(genre::Column::Id)
                    .update_columns([genre::Column::Name])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        linked.insert(g.id);
    }

    if linked.is_empty() {
        return Ok(());
    }

    movie_genre::Entity::insert_many(linked.into_iter().map(|genre_id| {
        movie_genre::ActiveModel { movie_id: Set(movie_id), genre_id: Set(genre_id) }
    }))
    .exec_without_returning(conn)
    .await?;

    Ok(())
}

async fn replace_companies<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    companies: &[CompanyRef],
) -> AppResult<()> {
    movie_company::Entity::delete_many()
        .filter(movie_company::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;

    let mut linked = BTreeSet::new();
    for c in companies {
        production_company::Entity::insert(production_company::ActiveModel {
            id: Set(c.id),
            name: Set(c.name.clone()),
            logo_path: Set(c.logo_path.clone()),
        })
        .on_conflict(
            OnConflict::column(production_company::Column::Id)
                .update_columns([
                    production_company::Column::Name,
                    production_company::Column::LogoPath,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
        linked.insert(c.id);
    }

    if linked.is_empty() {
        return Ok(());
    }

    movie_company::Entity::insert_many(linked.into_iter().map(|company_id| {
        movie_company::ActiveModel { movie_id: Set(movie_id), company_id: Set(company_id) }
    }))
    .exec_without_returning(conn)
    .await?;

    Ok(())
}

async fn replace_credits<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    credits: &[CreditImport],
) -> AppResult<()> {
    movie_credit::Entity::delete_many()
        .filter(movie_credit::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;

    // One upsert per person, carrying every role they hold on this movie.
    let mut people: BTreeMap<i32, (&PersonRef, BTreeSet<CrewRole>)> = BTreeMap::new();
    for credit in credits {
        people
            .entry(credit.person.id)
            .or_insert_with(|| (&credit.person, BTreeSet::new()))
            .1
            .insert(credit.role);
    }

    if people.is_empty() {
        return Ok(());
    }

    let mut links = Vec::new();
    for (person_id, (person_ref, roles)) in &people {
        upsert_person(conn, person_ref, roles).await?;
        links.extend(roles.iter().map(|role| movie_credit::ActiveModel {
            movie_id: Set(movie_id),
            person_id: Set(*person_id),
            role: Set(role.as_str().to_string()),
        }));
    }

    movie_credit::Entity::insert_many(links).exec_without_returning(conn).await?;
    Ok(())
}

async fn upsert_person<C: ConnectionTrait>(
    conn: &C,
    person_ref: &PersonRef,
    new_roles: &BTreeSet<CrewRole>,
) -> AppResult<()> {
    let existing = person::Entity::find_by_id(person_ref.id).one(conn).await?;

    let mut roles = existing.as_ref().map(|p| parse_roles(&p.roles)).unwrap_or_default();
    roles.extend(new_roles.iter().copied());
    debug!(person_id = person_ref.id, roles = roles.len(), "upserting person");

    person::Entity::insert(person::ActiveModel {
        id: Set(person_ref.id),
        name: Set(person_ref.name.clone()),
        profile_path: Set(person_ref.profile_path.clone()),
        popularity: Set(person_ref
            .popularity
            .or(existing.as_ref().map(|p| p.popularity))
            .unwrap_or_default()),
        roles: Set(join_roles(&roles)),
    })
    .on_conflict(
        OnConflict::column(person::Column::Id)
            .update_columns([
                person::Column::Name,
                person::Column::ProfilePath,
                person::Column::Popularity,
                person::Column::Roles,
            ])
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    Ok(())
}

pub fn parse_roles(tags: &str) -> BTreeSet<CrewRole> {
    tags.split(',').filter_map(|t| CrewRole::parse(t.trim())).collect()
}

pub fn join_roles(roles: &BTreeSet<CrewRole>) -> String {
    roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(",")
}

fn normalize_date(raw: Option<&str>) -> AppResult<Option<String>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let date: jiff::civil::Date = raw
        .parse()
        .map_err(|_| AppError::bad_request(format!("invalid date '{raw}', expected YYYY-MM-DD")))?;
    if !YEAR_RANGE.contains(&date.year()) {
        return Err(AppError::bad_request(format!(
            "date '{raw}' is outside years {}..={}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    Ok(Some(date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_merge_without_duplicates() {
        let mut roles = parse_roles("actor,director");
        roles.insert(CrewRole::Actor);
        roles.insert(CrewRole::Writer);
        assert_eq!(join_roles(&roles), "actor,director,writer");
    }

    #[test]
    fn unknown_role_tags_are_ignored() {
        assert_eq!(parse_roles(""), BTreeSet::new());
        assert_eq!(join_roles(&parse_roles("grip, composer")), "composer");
    }

    #[test]
    fn dates_are_validated() {
        assert_eq!(normalize_date(Some("1999-03-31")).unwrap().as_deref(), Some("1999-03-31"));
        assert_eq!(normalize_date(Some("  ")).unwrap(), None);
        assert_eq!(normalize_date(None).unwrap(), None);
        assert!(normalize_date(Some("1999-13-01")).is_err());
        assert!(normalize_date(Some("yesterday")).is_err());
    }

    #[test]
    fn dates_need_four_digit_years() {
        assert_eq!(normalize_date(Some("1000-01-01")).unwrap().as_deref(), Some("1000-01-01"));
        assert!(matches!(normalize_date(Some("0999-12-31")), Err(AppError::BadRequest(_))));
        assert!(matches!(normalize_date(Some("-000001-06-01")), Err(AppError::BadRequest(_))));
    }
}
