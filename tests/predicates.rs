mod common;

use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder};

use cinelog::{
    entities::movie,
    filters::FilterState,
    models::{CrewRole, ListKind},
    predicate::PredicateSet,
    sql::SqlBuilder,
};
use common::{TestApp, company, credit, genre, movie};

#[derive(Debug, FromQueryResult)]
struct IdRow {
    id: i32,
}

async fn seeded() -> (TestApp, i32) {
    let app = TestApp::new().await;
    let viewer = app.user("viewer").await;
    let other = app.user("other").await;

    let mut m1 = movie(1, "One", "1988-02-02");
    m1.genres = vec![genre(1, "Drama")];
    m1.companies = vec![company(5, "Studio")];
    m1.credits = vec![credit(10, "Ava", CrewRole::Actor), credit(20, "Ben", CrewRole::Director)];

    let mut m2 = movie(2, "Two", "1993-03-03");
    m2.genres = vec![genre(1, "Drama"), genre(2, "Thriller")];
    m2.credits = vec![credit(11, "Cal", CrewRole::Actor), credit(30, "Dot", CrewRole::Composer)];

    let mut m3 = movie(3, "Three", "1997-04-04");
    m3.genres = vec![genre(2, "Thriller")];
    m3.companies = vec![company(5, "Studio")];
    m3.credits = vec![credit(10, "Ava", CrewRole::Actor), credit(20, "Ben", CrewRole::Writer)];

    let m4 = movie(4, "Four", "2008-05-05");

    for m in [m1, m2, m3, m4] {
        app.movie(m).await;
    }
    for id in 1..=3 {
        app.watch(viewer, id).await;
    }
    app.plan(viewer, 4).await;
    app.watch(other, 4).await;

    app.rate(viewer, 1, 4.0, true).await;
    app.rate(viewer, 3, 4.0, false).await;
    app.rate(other, 2, 4.0, true).await;

    (app, viewer)
}

async fn structural_ids(app: &TestApp, predicates: &PredicateSet) -> Vec<i32> {
    movie::Entity::find()
        .filter(predicates.to_condition())
        .order_by_asc(movie::Column::Id)
        .all(&app.state.db)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect()
}

async fn raw_ids(app: &TestApp, predicates: &PredicateSet) -> Vec<i32> {
    let db = &app.state.db;
    let mut q = SqlBuilder::new(db.get_database_backend(), "SELECT m.id AS id FROM movies m WHERE 1 = 1");
    predicates.write_sql(&mut q);
    q.push(" ORDER BY m.id ASC");

    IdRow::find_by_statement(q.build())
        .all(db)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect()
}

#[tokio::test]
async fn both_renderers_select_the_same_movies() {
    let (app, viewer) = seeded().await;

    let cases = [
        ("", ListKind::Watched, vec![1, 2, 3]),
        ("", ListKind::Watchlist, vec![4]),
        ("genres=1", ListKind::Watched, vec![1, 2]),
        ("genres=1,2", ListKind::Watched, vec![1, 2, 3]),
        ("genres=2&companies=5", ListKind::Watched, vec![3]),
        ("actors=10", ListKind::Watched, vec![1, 3]),
        ("actors=10&directors=20", ListKind::Watched, vec![1]),
        ("writers=20", ListKind::Watched, vec![3]),
        ("composers=30&genres=2", ListKind::Watched, vec![2]),
        ("decade=1990", ListKind::Watched, vec![2, 3]),
        ("year=1988", ListKind::Watched, vec![1]),
        ("decade=1980&year=1997", ListKind::Watched, vec![1]),
        ("rating=4", ListKind::Watched, vec![1, 3]),
        ("rating=4&isPublicUtility=true", ListKind::Watched, vec![1]),
        ("rating=3.5", ListKind::Watched, vec![]),
        ("rating=4", ListKind::Watchlist, vec![4]),
        ("genres=abc", ListKind::Watched, vec![1, 2, 3]),
    ];

    for (query, list, expected) in cases {
        let filters = FilterState::from_query_string(query);
        let predicates = PredicateSet::build(list, viewer, &filters);

        let structural = structural_ids(&app, &predicates).await;
        let raw = raw_ids(&app, &predicates).await;

        assert_eq!(structural, expected, "structural {list:?} {query}");
        assert_eq!(raw, expected, "raw {list:?} {query}");
    }
}
