//! Watched/watchlist membership and reviews.
//!
//! A title sits on at most one of a user's lists: the unique key on
//! `library_entries` spans both, so adding to one list moves the entry out of
//! the other.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
    sea_query::OnConflict,
};
use serde::Serialize;
use tracing::info;

use crate::{
    entities::{library_entry, movie, review, tv_show},
    error::{AppError, AppResult},
    models::{ListKind, MediaType, Rating},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryChange {
    pub media_id: i32,
    pub media_type: MediaType,
    pub list: ListKind,
    pub moved_from: Option<ListKind>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub media_id: i32,
    pub media_type: MediaType,
    pub rating: Rating,
    pub comment: Option<String>,
    pub is_public_utility: bool,
    pub updated_at: i64,
}

pub async fn add(
    db: &DatabaseConnection,
    user_id: i32,
    list: ListKind,
    media_id: i32,
    media_type: MediaType,
) -> AppResult<LibraryChange> {
    ensure_title_exists(db, media_id, media_type).await?;

    let txn = db.begin().await?;

    let existing = library_entry::Entity::find()
        .filter(library_entry::Column::UserId.eq(user_id))
        .filter(library_entry::Column::MediaId.eq(media_id))
        .filter(library_entry::Column::MediaType.eq(media_type.as_str()))
        .one(&txn)
        .await?;

    let moved_from = match &existing {
        Some(entry) if entry.list == list.as_str() => {
            txn.commit().await?;
            return Ok(LibraryChange { media_id, media_type, list, moved_from: None });
        },
        Some(entry) => ListKind::parse(&entry.list),
        None => None,
    };

    library_entry::Entity::insert(library_entry::ActiveModel {
        id: Default::default(),
        user_id: Set(user_id),
        media_id: Set(media_id),
        media_type: Set(media_type.as_str().to_string()),
        list: Set(list.as_str().to_string()),
        created_at: Set(now_sec()),
    })
    .on_conflict(
        OnConflict::columns([
            library_entry::Column::UserId,
            library_entry::Column::MediaId,
            library_entry::Column::MediaType,
        ])
        .update_columns([library_entry::Column::List, library_entry::Column::CreatedAt])
        .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    txn.commit().await?;

    info!(
        user_id,
        media_id,
        media_type = media_type.as_str(),
        list = list.as_str(),
        moved_from = moved_from.map(ListKind::as_str),
        "library entry added"
    );

    Ok(LibraryChange { media_id, media_type, list, moved_from })
}

/// Returns `NotFound` when the title is not on that list.
pub async fn remove(
    db: &DatabaseConnection,
    user_id: i32,
    list: ListKind,
    media_id: i32,
    media_type: MediaType,
) -> AppResult<()> {
    let res = library_entry::Entity::delete_many()
        .filter(library_entry::Column::UserId.eq(user_id))
        .filter(library_entry::Column::MediaId.eq(media_id))
        .filter(library_entry::Column::MediaType.eq(media_type.as_str()))
        .filter(library_entry::Column::List.eq(list.as_str()))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::not_found(format!(
            "{} {media_id} is not on the {} list",
            media_type.as_str(),
            list.as_str()
        )));
    }

    info!(user_id, media_id, list = list.as_str(), "library entry removed");
    Ok(())
}

/// Creates or replaces the user's single review of a title.
pub async fn rate(
    db: &DatabaseConnection,
    user_id: i32,
    media_id: i32,
    media_type: MediaType,
    rating: Rating,
    comment: Option<String>,
    is_public_utility: bool,
) -> AppResult<ReviewView> {
    ensure_title_exists(db, media_id, media_type).await?;

    let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    let now = now_sec();

    review::Entity::insert(review::ActiveModel {
        id: Default::default(),
        user_id: Set(user_id),
        media_id: Set(media_id),
        media_type: Set(media_type.as_str().to_string()),
        rating: Set(rating.value()),
        comment: Set(comment),
        is_public_utility: Set(is_public_utility),
        created_at: Set(now),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::columns([
            review::Column::UserId,
            review::Column::MediaId,
            review::Column::MediaType,
        ])
        .update_columns([
            review::Column::Rating,
            review::Column::Comment,
            review::Column::IsPublicUtility,
            review::Column::UpdatedAt,
        ])
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    info!(user_id, media_id, rating = %rating, "review saved");

    let saved = find_review(db, user_id, media_id, media_type)
        .await?
        .ok_or_else(|| anyhow::anyhow!("review for {media_id} missing after save"))?;
    review_view(saved)
}

pub async fn unrate(
    db: &DatabaseConnection,
    user_id: i32,
    media_id: i32,
    media_type: MediaType,
) -> AppResult<()> {
    let res = review::Entity::delete_many()
        .filter(review::Column::UserId.eq(user_id))
        .filter(review::Column::MediaId.eq(media_id))
        .filter(review::Column::MediaType.eq(media_type.as_str()))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::not_found(format!("no review of {} {media_id}", media_type.as_str())));
    }
    Ok(())
}

async fn find_review(
    db: &DatabaseConnection,
    user_id: i32,
    media_id: i32,
    media_type: MediaType,
) -> AppResult<Option<review::Model>> {
    let found = review::Entity::find()
        .filter(review::Column::UserId.eq(user_id))
        .filter(review::Column::MediaId.eq(media_id))
        .filter(review::Column::MediaType.eq(media_type.as_str()))
        .one(db)
        .await?;
    Ok(found)
}

fn review_view(model: review::Model) -> AppResult<ReviewView> {
    let rating = Rating::from_f64(model.rating)
        .ok_or_else(|| anyhow::anyhow!("stored rating {} out of range", model.rating))?;
    let media_type = MediaType::parse(&model.media_type)
        .ok_or_else(|| anyhow::anyhow!("unknown media type {}", model.media_type))?;

    Ok(ReviewView {
        media_id: model.media_id,
        media_type,
        rating,
        comment: model.comment,
        is_public_utility: model.is_public_utility,
        updated_at: model.updated_at,
    })
}

async fn ensure_title_exists(
    db: &DatabaseConnection,
    media_id: i32,
    media_type: MediaType,
) -> AppResult<()> {
    let exists = match media_type {
        MediaType::Movie => movie::Entity::find_by_id(media_id).one(db).await?.is_some(),
        MediaType::Tv => tv_show::Entity::find_by_id(media_id).one(db).await?.is_some(),
    };

    if !exists {
        return Err(AppError::not_found(format!("{} {media_id} not found", media_type.as_str())));
    }
    Ok(())
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
