use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    models::{NewRating, Rating, TitledRating},
    schema::{comics, ratings},
};

use super::RepoError;

/// Ratings are append-only: rating the same comic twice stores two rows.
pub async fn create(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    comic_id: i32,
    rating: i32,
) -> Result<(), RepoError> {
    diesel::insert_into(ratings::table)
        .values(&NewRating {
            user_id,
            comic_id,
            rating,
        })
        .execute(conn)
        .await?;

    tracing::info!("User {user_id} rated comic {comic_id}: {rating}");

    Ok(())
}

fn rounded_mean(sum: Option<i64>, count: i64) -> Option<f64> {
    match (sum, count) {
        (Some(sum), count) if count > 0 => {
            let mean = sum as f64 / count as f64;
            Some((mean * 100.).round() / 100.)
        }
        _ => None,
    }
}

/// Mean of every rating of the comic, rounded to two decimals.
pub async fn average_for(
    conn: &mut AsyncPgConnection,
    comic_id: i32,
) -> Result<Option<f64>, RepoError> {
    let (total, amount): (Option<i64>, i64) = ratings::table
        .filter(ratings::comic_id.eq(comic_id))
        .select((
            diesel::dsl::sum(ratings::rating),
            diesel::dsl::count(ratings::rating),
        ))
        .get_result(conn)
        .await?;

    Ok(rounded_mean(total, amount))
}

pub async fn all_for_user(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<Vec<TitledRating>, RepoError> {
    let rows: Vec<(Rating, String)> = ratings::table
        .inner_join(comics::table)
        .filter(ratings::user_id.eq(user_id))
        .order(ratings::id.asc())
        .select((Rating::as_select(), comics::title))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(rating, comic_title)| TitledRating {
            rating,
            comic_title,
        })
        .collect())
}
