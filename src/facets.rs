//! Facet counts over the movies matching a [`PredicateSet`].
//!
//! Every dimension is one aggregation query, and all of them run concurrently.
//! Failure is all-or-nothing: if any dimension's query fails, the whole facet
//! computation fails and no partially populated facets are returned.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::AppResult,
    filters::{Dimension, decade_base},
    models::{CrewRole, ListKind, MediaType, Rating},
    predicate::PredicateSet,
    sql::SqlBuilder,
};

#[derive(Clone, Debug, PartialEq, Serialize, FromQueryResult)]
pub struct FacetEntry {
    pub id: i32,
    pub name: String,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearBucket {
    pub value: i32,
    pub label: String,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingBucket {
    pub value: Rating,
    pub label: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub genres: Vec<FacetEntry>,
    pub companies: Vec<FacetEntry>,
    pub actors: Vec<FacetEntry>,
    pub directors: Vec<FacetEntry>,
    pub producers: Vec<FacetEntry>,
    pub exec_producers: Vec<FacetEntry>,
    pub writers: Vec<FacetEntry>,
    pub composers: Vec<FacetEntry>,
    pub cinematographers: Vec<FacetEntry>,
    pub decades: Vec<YearBucket>,
    pub years: Vec<YearBucket>,
    /// Watched listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<RatingBucket>>,
}

/// Row caps per dimension.
#[derive(Clone, Copy, Debug)]
pub struct FacetLimits {
    pub genres: i64,
    pub companies: i64,
    pub actors: i64,
    pub directors: i64,
    pub crew: i64,
}

impl FacetLimits {
    /// For filter chips on listing pages.
    pub const FILTERS: Self =
        Self { genres: 100, companies: 200, actors: 500, directors: 200, crew: 150 };

    /// For top-N profile statistics.
    pub const STATS: Self = Self { genres: 10, companies: 10, actors: 10, directors: 10, crew: 10 };

    pub fn cap(&self, dimension: Dimension) -> i64 {
        match dimension {
            Dimension::Genre => self.genres,
            Dimension::Company => self.companies,
            Dimension::Crew(CrewRole::Actor) => self.actors,
            Dimension::Crew(CrewRole::Director) => self.directors,
            Dimension::Crew(_) => self.crew,
        }
    }
}

/// Computes all facets, or returns `None` without querying when `include`
/// is false.
pub async fn aggregate(
    db: &DatabaseConnection,
    predicates: &PredicateSet,
    include: bool,
    limits: &FacetLimits,
) -> AppResult<Option<Facets>> {
    if !include {
        debug!("facets skipped");
        return Ok(None);
    }

    let crew = try_join_all(
        CrewRole::ALL
            .into_iter()
            .map(|role| entity_facet(db, predicates, Dimension::Crew(role), limits)),
    );

    let ratings = async {
        match predicates.list() {
            ListKind::Watched => rating_facet(db, predicates).await.map(Some),
            ListKind::Watchlist => Ok(None),
        }
    };

    let (genres, companies, crew, years, ratings) = tokio::try_join!(
        entity_facet(db, predicates, Dimension::Genre, limits),
        entity_facet(db, predicates, Dimension::Company, limits),
        crew,
        year_facet(db, predicates),
        ratings,
    )?;

    let mut crew = crew.into_iter();
    let mut next_role = || crew.next().unwrap_or_default();

    let facets = Facets {
        genres,
        companies,
        actors: next_role(),
        directors: next_role(),
        producers: next_role(),
        exec_producers: next_role(),
        writers: next_role(),
        composers: next_role(),
        cinematographers: next_role(),
        decades: decade_buckets(&years),
        years,
        ratings,
    };

    debug!(
        genres = facets.genres.len(),
        companies = facets.companies.len(),
        actors = facets.actors.len(),
        years = facets.years.len(),
        "facets computed"
    );

    Ok(Some(facets))
}

async fn entity_facet(
    db: &DatabaseConnection,
    predicates: &PredicateSet,
    dimension: Dimension,
    limits: &FacetLimits,
) -> AppResult<Vec<FacetEntry>> {
    let mut q = SqlBuilder::new(db.get_database_backend(), "");

    let order = match dimension {
        Dimension::Genre => {
            q.push(
                "SELECT g.id AS id, g.name AS name, COUNT(DISTINCT m.id) AS count FROM movies m \
                 JOIN movie_genres fg ON fg.movie_id = m.id \
                 JOIN genres g ON g.id = fg.genre_id",
            );
            " GROUP BY g.id, g.name ORDER BY COUNT(DISTINCT m.id) DESC, g.name ASC"
        },
        Dimension::Company => {
            q.push(
                "SELECT c.id AS id, c.name AS name, COUNT(DISTINCT m.id) AS count FROM movies m \
                 JOIN movie_companies fc ON fc.movie_id = m.id \
                 JOIN production_companies c ON c.id = fc.company_id",
            );
            " GROUP BY c.id, c.name ORDER BY COUNT(DISTINCT m.id) DESC, c.name ASC"
        },
        Dimension::Crew(role) => {
            q.push(
                "SELECT p.id AS id, p.name AS name, COUNT(DISTINCT m.id) AS count FROM movies m \
                 JOIN movie_credits fp ON fp.movie_id = m.id AND fp.role = ",
            )
            .push_bind(role.as_str())
            .push(" JOIN people p ON p.id = fp.person_id");
            " GROUP BY p.id, p.name, p.popularity \
             ORDER BY COUNT(DISTINCT m.id) DESC, p.popularity DESC, p.id ASC"
        },
    };

    q.push(" WHERE 1 = 1");
    predicates.write_sql(&mut q);
    q.push(order).push(" LIMIT ").push_bind(limits.cap(dimension));

    let rows = FacetEntry::find_by_statement(q.build()).all(db).await?;
    Ok(rows)
}

#[derive(Debug, FromQueryResult)]
struct YearRow {
    year: i64,
    count: i64,
}

async fn year_facet(
    db: &DatabaseConnection,
    predicates: &PredicateSet,
) -> AppResult<Vec<YearBucket>> {
    let mut q = SqlBuilder::new(
        db.get_database_backend(),
        "SELECT CAST(substr(m.release_date, 1, 4) AS INTEGER) AS year, \
         COUNT(DISTINCT m.id) AS count FROM movies m WHERE m.release_date IS NOT NULL",
    );
    predicates.write_sql(&mut q);
    q.push(" GROUP BY year ORDER BY year DESC");

    let rows = YearRow::find_by_statement(q.build()).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|r| YearBucket { value: r.year as i32, label: r.year.to_string(), count: r.count })
        .collect())
}

#[derive(Debug, FromQueryResult)]
struct RatingRow {
    rating: f64,
    count: i64,
}

async fn rating_facet(
    db: &DatabaseConnection,
    predicates: &PredicateSet,
) -> AppResult<Vec<RatingBucket>> {
    let mut q = SqlBuilder::new(
        db.get_database_backend(),
        "SELECT fr.rating AS rating, COUNT(DISTINCT m.id) AS count FROM movies m \
         JOIN reviews fr ON fr.media_id = m.id AND fr.media_type = ",
    );
    q.push_bind(MediaType::Movie.as_str())
        .push(" AND fr.user_id = ")
        .push_bind(predicates.user_id())
        .push(" WHERE 1 = 1");
    predicates.write_sql(&mut q);
    q.push(" GROUP BY fr.rating ORDER BY fr.rating DESC");

    let rows = RatingRow::find_by_statement(q.build()).all(db).await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let value = Rating::from_f64(r.rating)?;
            Some(RatingBucket { value, label: value.to_string(), count: r.count })
        })
        .collect())
}

/// Sums per-year counts into decade buckets, newest first.
pub fn decade_buckets(years: &[YearBucket]) -> Vec<YearBucket> {
    let mut sums: BTreeMap<i32, i64> = BTreeMap::new();
    for year in years {
        let decade = i32::from(decade_base(year.value as i16));
        *sums.entry(decade).or_default() += year.count;
    }

    sums.into_iter()
        .rev()
        .map(|(value, count)| YearBucket { value, label: format!("{value}s"), count })
        .collect()
}
