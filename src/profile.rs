use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use tracing::debug;

use crate::{
    entities::{library_entry, movie},
    error::{AppError, AppResult},
    facets::{self, FacetLimits, Facets},
    filters::FilterState,
    models::{ListKind, MediaType, SortOrder, TitleSummary},
    pagination::{PAGE_SIZE, Pagination, page_index},
    predicate::PredicateSet,
    sql::SqlBuilder,
    users,
};

/// One page of a user's watched or watchlist movies.
#[derive(Clone, Debug)]
pub struct ProfileListing {
    pub list: ListKind,
    pub items: Vec<TitleSummary>,
    pub pagination: Pagination,
    pub facets: Option<Facets>,
}

// The items key is the list name: `{"watched": [...]}` or `{"watchlist": [...]}`.
impl Serialize for ProfileListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.list.as_str(), &self.items)?;
        map.serialize_entry("pagination", &self.pagination)?;
        map.serialize_entry("facets", &self.facets)?;
        map.end()
    }
}

pub async fn list_movies(
    db: &DatabaseConnection,
    list: ListKind,
    username: &str,
    filters: &FilterState,
    page: i64,
    include_facets: bool,
) -> AppResult<ProfileListing> {
    let user = users::find_by_username(db, username).await?;
    let predicates = PredicateSet::build(list, user.id, filters);

    debug!(
        user_id = user.id,
        list = list.as_str(),
        clauses = predicates.clauses().len(),
        page,
        include_facets,
        "listing profile movies"
    );

    let query = movie::Entity::find().filter(predicates.to_condition());
    let query = match filters.sort {
        SortOrder::RuntimeDesc => query.order_by_desc(movie::Column::Runtime),
        SortOrder::RuntimeAsc => query.order_by_asc(movie::Column::Runtime),
        SortOrder::Default => query.order_by_desc(movie::Column::ReleaseDate),
    };
    let paginator = query.order_by_asc(movie::Column::Id).paginate(db, PAGE_SIZE);

    let total = async { Ok::<_, AppError>(paginator.num_items().await?) };
    let items = async {
        let rows = match page_index(page, PAGE_SIZE) {
            Some(index) => paginator.fetch_page(index).await?,
            None => Vec::new(),
        };
        Ok::<_, AppError>(rows)
    };
    let facets = facets::aggregate(db, &predicates, include_facets, &FacetLimits::FILTERS);

    let (total, items, facets): (u64, Vec<movie::Model>, Option<Facets>) =
        tokio::try_join!(total, items, facets)?;

    Ok(ProfileListing {
        list,
        items: items.into_iter().map(TitleSummary::from).collect(),
        pagination: Pagination::new(total, page, PAGE_SIZE),
        facets,
    })
}

/// Movie-only summary of a user's library.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub username: String,
    pub watched_count: u64,
    pub watchlist_count: u64,
    pub review_count: i64,
    pub average_rating: Option<f64>,
    pub total_runtime_minutes: i64,
    /// Top values among watched movies.
    pub top: Facets,
}

#[derive(Debug, FromQueryResult)]
struct RuntimeRow {
    total_runtime: i64,
}

#[derive(Debug, FromQueryResult)]
struct ReviewSummaryRow {
    review_count: i64,
    average_rating: Option<f64>,
}

pub async fn stats(db: &DatabaseConnection, username: &str) -> AppResult<ProfileStats> {
    let user = users::find_by_username(db, username).await?;
    let watched = PredicateSet::membership(ListKind::Watched, user.id);

    let watched_count = count_list(db, user.id, ListKind::Watched);
    let watchlist_count = count_list(db, user.id, ListKind::Watchlist);
    let runtime = total_runtime(db, &watched);
    let reviews = review_summary(db, user.id);
    let top = facets::aggregate(db, &watched, true, &FacetLimits::STATS);

    let (watched_count, watchlist_count, total_runtime_minutes, reviews, top) =
        tokio::try_join!(watched_count, watchlist_count, runtime, reviews, top)?;

    debug!(user_id = user.id, watched_count, watchlist_count, "computed profile stats");

    Ok(ProfileStats {
        username: user.username,
        watched_count,
        watchlist_count,
        review_count: reviews.review_count,
        average_rating: reviews.average_rating,
        total_runtime_minutes,
        top: top.unwrap_or_default(),
    })
}

async fn count_list(db: &DatabaseConnection, user_id: i32, list: ListKind) -> AppResult<u64> {
    let count = library_entry::Entity::find()
        .filter(library_entry::Column::UserId.eq(user_id))
        .filter(library_entry::Column::List.eq(list.as_str()))
        .filter(library_entry::Column::MediaType.eq(MediaType::Movie.as_str()))
        .count(db)
        .await?;
    Ok(count)
}

async fn total_runtime(db: &DatabaseConnection, predicates: &PredicateSet) -> AppResult<i64> {
    let mut q = SqlBuilder::new(
        db.get_database_backend(),
        "SELECT CAST(COALESCE(SUM(m.runtime), 0) AS INTEGER) AS total_runtime \
         FROM movies m WHERE 1 = 1",
    );
    predicates.write_sql(&mut q);

    let row = RuntimeRow::find_by_statement(q.build()).one(db).await?;
    Ok(row.map(|r| r.total_runtime).unwrap_or_default())
}

async fn review_summary(db: &DatabaseConnection, user_id: i32) -> AppResult<ReviewSummaryRow> {
    let mut q = SqlBuilder::new(
        db.get_database_backend(),
        "SELECT COUNT(*) AS review_count, AVG(r.rating) AS average_rating \
         FROM reviews r WHERE r.media_type = ",
    );
    q.push_bind(MediaType::Movie.as_str()).push(" AND r.user_id = ").push_bind(user_id);

    let row = ReviewSummaryRow::find_by_statement(q.build()).one(db).await?;
    Ok(row.unwrap_or(ReviewSummaryRow { review_count: 0, average_rating: None }))
}
