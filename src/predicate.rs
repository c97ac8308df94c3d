//! The conjunction of filter conditions for a profile listing.
//!
//! A [`PredicateSet`] is built once per request and rendered twice: as a
//! `sea_orm::Condition` for the ORM page and count queries, and as a raw SQL
//! fragment for the facet aggregation queries. Both renderers walk the same
//! clause list, so the candidate set is identical across all queries.
//!
//! The raw fragment refers to the movie being filtered as `m`.

use sea_orm::{
    ColumnTrait, Condition,
    sea_query::{Query, SimpleExpr},
};

use crate::{
    entities::{library_entry, movie, movie_company, movie_credit, movie_genre, review},
    filters::{Dimension, FilterState},
    models::{ListKind, MediaType, Rating},
    sql::SqlBuilder,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    /// The movie is on the user's watched list or watchlist.
    InList { list: ListKind, user_id: i32 },
    /// The movie is linked to at least one of `ids` in `dimension`.
    Related { dimension: Dimension, ids: Vec<i32> },
    /// Released between Jan 1 of `from_year` and Dec 31 of `to_year`.
    Released { from_year: i16, to_year: i16 },
    /// The user rated the movie exactly `rating`.
    Rated { user_id: i32, rating: Rating },
    /// The user flagged their review of the movie as public utility.
    PublicUtility { user_id: i32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PredicateSet {
    list: ListKind,
    user_id: i32,
    clauses: Vec<Clause>,
}

impl PredicateSet {
    /// Membership only, no filters.
    pub fn membership(list: ListKind, user_id: i32) -> Self {
        Self { list, user_id, clauses: vec![Clause::InList { list, user_id }] }
    }

    pub fn build(list: ListKind, user_id: i32, filters: &FilterState) -> Self {
        let mut set = Self::membership(list, user_id);

        for dimension in Dimension::ALL {
            let ids = filters.ids(dimension);
            if !ids.is_empty() {
                set.clauses.push(Clause::Related { dimension, ids: ids.to_vec() });
            }
        }

        // Decade wins when both are present.
        if let Some(decade) = filters.decade {
            set.clauses.push(Clause::Released { from_year: decade, to_year: decade + 9 });
        } else if let Some(year) = filters.year {
            set.clauses.push(Clause::Released { from_year: year, to_year: year });
        }

        // Watchlist entries carry no review.
        if list == ListKind::Watched {
            if let Some(rating) = filters.rating {
                set.clauses.push(Clause::Rated { user_id, rating });
            }
            if filters.public_utility {
                set.clauses.push(Clause::PublicUtility { user_id });
            }
        }

        set
    }

    pub fn list(&self) -> ListKind {
        self.list
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Structural rendering for `movie::Entity` queries.
    pub fn to_condition(&self) -> Condition {
        self.clauses.iter().fold(Condition::all(), |cond, clause| cond.add(clause.to_expr()))
    }

    /// Appends ` AND <clause>` for every clause.
    pub fn write_sql(&self, q: &mut SqlBuilder) {
        for clause in &self.clauses {
            q.push(" AND ");
            clause.write_sql(q);
        }
    }
}

impl Clause {
    fn to_expr(&self) -> SimpleExpr {
        match self {
            Clause::InList { list, user_id } => movie::Column::Id.in_subquery(
                Query::select()
                    .column(library_entry::Column::MediaId)
                    .from(library_entry::Entity)
                    .and_where(library_entry::Column::UserId.eq(*user_id))
                    .and_where(library_entry::Column::MediaType.eq(MediaType::Movie.as_str()))
                    .and_where(library_entry::Column::List.eq(list.as_str()))
                    .to_owned(),
            ),
            Clause::Related { dimension: Dimension::Genre, ids } => movie::Column::Id.in_subquery(
                Query::select()
                    .column(movie_genre::Column::MovieId)
                    .from(movie_genre::Entity)
                    .and_where(movie_genre::Column::GenreId.is_in(ids.iter().copied()))
                    .to_owned(),
            ),
            Clause::Related { dimension: Dimension::Company, ids } => {
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_company::Column::MovieId)
                        .from(movie_company::Entity)
                        .and_where(movie_company::Column::CompanyId.is_in(ids.iter().copied()))
                        .to_owned(),
                )
            },
            Clause::Related { dimension: Dimension::Crew(role), ids } => {
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_credit::Column::MovieId)
                        .from(movie_credit::Entity)
                        .and_where(movie_credit::Column::Role.eq(role.as_str()))
                        .and_where(movie_credit::Column::PersonId.is_in(ids.iter().copied()))
                        .to_owned(),
                )
            },
            Clause::Released { from_year, to_year } => movie::Column::ReleaseDate
                .between(first_day(*from_year), last_day(*to_year)),
            Clause::Rated { user_id, rating } => movie::Column::Id.in_subquery(
                user_reviews(*user_id).and_where(review::Column::Rating.eq(rating.value())).to_owned(),
            ),
            Clause::PublicUtility { user_id } => movie::Column::Id.in_subquery(
                user_reviews(*user_id).and_where(review::Column::IsPublicUtility.eq(true)).to_owned(),
            ),
        }
    }

    fn write_sql(&self, q: &mut SqlBuilder) {
        match self {
            Clause::InList { list, user_id } => {
                q.push("EXISTS (SELECT 1 FROM library_entries x WHERE x.media_id = m.id")
                    .push(" AND x.media_type = ")
                    .push_bind(MediaType::Movie.as_str())
                    .push(" AND x.user_id = ")
                    .push_bind(*user_id)
                    .push(" AND x.list = ")
                    .push_bind(list.as_str())
                    .push(")");
            },
            Clause::Related { dimension: Dimension::Genre, ids } => {
                q.push("EXISTS (SELECT 1 FROM movie_genres x WHERE x.movie_id = m.id")
                    .push(" AND x.genre_id IN ")
                    .push_bind_list(ids.iter().copied())
                    .push(")");
            },
            Clause::Related { dimension: Dimension::Company, ids } => {
                q.push("EXISTS (SELECT 1 FROM movie_companies x WHERE x.movie_id = m.id")
                    .push(" AND x.company_id IN ")
                    .push_bind_list(ids.iter().copied())
                    .push(")");
            },
            Clause::Related { dimension: Dimension::Crew(role), ids } => {
                q.push("EXISTS (SELECT 1 FROM movie_credits x WHERE x.movie_id = m.id")
                    .push(" AND x.role = ")
                    .push_bind(role.as_str())
                    .push(" AND x.person_id IN ")
                    .push_bind_list(ids.iter().copied())
                    .push(")");
            },
            Clause::Released { from_year, to_year } => {
                q.push("m.release_date BETWEEN ")
                    .push_bind(first_day(*from_year))
                    .push(" AND ")
                    .push_bind(last_day(*to_year));
            },
            Clause::Rated { user_id, rating } => {
                write_review_exists(q, *user_id);
                q.push(" AND x.rating = ").push_bind(rating.value()).push(")");
            },
            Clause::PublicUtility { user_id } => {
                write_review_exists(q, *user_id);
                q.push(" AND x.is_public_utility = ").push_bind(true).push(")");
            },
        }
    }
}

fn user_reviews(user_id: i32) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(review::Column::MediaId)
        .from(review::Entity)
        .and_where(review::Column::UserId.eq(user_id))
        .and_where(review::Column::MediaType.eq(MediaType::Movie.as_str()))
        .to_owned()
}

// Leaves the EXISTS open for the caller's last condition.
fn write_review_exists(q: &mut SqlBuilder, user_id: i32) {
    q.push("EXISTS (SELECT 1 FROM reviews x WHERE x.media_id = m.id")
        .push(" AND x.media_type = ")
        .push_bind(MediaType::Movie.as_str())
        .push(" AND x.user_id = ")
        .push_bind(user_id);
}

fn first_day(year: i16) -> String {
    format!("{year:04}-01-01")
}

fn last_day(year: i16) -> String {
    format!("{year:04}-12-31")
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait, Value};

    use super::*;
    use crate::{filters::FilterAction, models::CrewRole};

    fn filters(query: &str) -> FilterState {
        FilterState::from_query_string(query)
    }

    fn rendered(set: &PredicateSet) -> SqlBuilder {
        let mut q = SqlBuilder::new(DbBackend::Sqlite, "");
        set.write_sql(&mut q);
        q
    }

    #[test]
    fn membership_is_always_first() {
        let set = PredicateSet::build(ListKind::Watched, 7, &FilterState::default());
        assert_eq!(set.clauses(), &[Clause::InList { list: ListKind::Watched, user_id: 7 }]);
    }

    #[test]
    fn empty_dimensions_contribute_nothing() {
        let set = PredicateSet::build(ListKind::Watched, 1, &filters("genres=&actors="));
        assert_eq!(set.clauses().len(), 1);
    }

    #[test]
    fn one_clause_per_dimension() {
        let set = PredicateSet::build(ListKind::Watched, 1, &filters("actors=1,2&directors=3"));
        assert_eq!(
            &set.clauses()[1..],
            &[
                Clause::Related { dimension: Dimension::Crew(CrewRole::Actor), ids: vec![1, 2] },
                Clause::Related { dimension: Dimension::Crew(CrewRole::Director), ids: vec![3] },
            ]
        );

        let sql = rendered(&set);
        assert_eq!(sql.sql().matches("EXISTS").count(), 3);
        assert!(sql.sql().contains("x.person_id IN (?, ?)"));
    }

    #[test]
    fn decade_takes_precedence_over_year() {
        let set = PredicateSet::build(ListKind::Watched, 1, &filters("decade=1990&year=2004"));
        assert_eq!(set.clauses()[1], Clause::Released { from_year: 1990, to_year: 1999 });

        let sql = rendered(&set);
        assert!(sql.values().contains(&Value::from("1990-01-01".to_string())));
        assert!(sql.values().contains(&Value::from("1999-12-31".to_string())));
    }

    #[test]
    fn single_year_range() {
        let mut state = FilterState::default();
        state.apply(FilterAction::SetYear(Some(1994)));
        let set = PredicateSet::build(ListKind::Watchlist, 1, &state);
        assert_eq!(set.clauses()[1], Clause::Released { from_year: 1994, to_year: 1994 });
    }

    #[test]
    fn review_clauses_only_for_watched() {
        let state = filters("rating=4&isPublicUtility=true");

        let watched = PredicateSet::build(ListKind::Watched, 3, &state);
        assert!(watched.clauses().contains(&Clause::PublicUtility { user_id: 3 }));
        assert!(matches!(watched.clauses()[1], Clause::Rated { user_id: 3, .. }));

        let watchlist = PredicateSet::build(ListKind::Watchlist, 3, &state);
        assert_eq!(watchlist.clauses().len(), 1);
    }

    #[test]
    fn raw_sql_binds_every_value() {
        let set = PredicateSet::build(
            ListKind::Watched,
            42,
            &filters("genres=1,2&companies=3&writers=4&year=2001&rating=2.5&isPublicUtility=true"),
        );
        let sql = rendered(&set);

        assert_eq!(sql.sql().matches('?').count(), sql.values().len());
        assert!(!sql.sql().contains("42"));
        assert!(!sql.sql().contains("2001"));
        assert!(!sql.sql().contains("2.5"));
    }

    #[test]
    fn condition_renders_nested_subqueries() {
        let set = PredicateSet::build(ListKind::Watched, 1, &filters("genres=27&directors=9"));
        let sql = movie::Entity::find()
            .filter(set.to_condition())
            .build(DbBackend::Sqlite)
            .to_string();

        assert_eq!(sql.matches("IN (SELECT").count(), 3);
        assert!(sql.contains("\"movie_genres\""));
        assert!(sql.contains("'director'"));
    }
}
