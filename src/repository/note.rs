use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    models::{Comic, NewNote, Note, NoteWithComic},
    schema::{comics, notes},
};

use super::RepoError;

pub async fn create(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    comic_id: i32,
    note: &str,
) -> Result<(), RepoError> {
    diesel::insert_into(notes::table)
        .values(&NewNote {
            user_id,
            comic_id,
            note,
        })
        .execute(conn)
        .await?;

    tracing::info!("User {user_id} added a note to comic {comic_id}");

    Ok(())
}

/// Notes are never replaced, so a user may have several for a comic. The most
/// recent one is returned.
pub async fn get_one_for_user_and_comic(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    comic_id: i32,
) -> Result<Option<Note>, RepoError> {
    Ok(notes::table
        .filter(notes::user_id.eq(user_id).and(notes::comic_id.eq(comic_id)))
        .order(notes::id.desc())
        .select(Note::as_select())
        .first(conn)
        .await
        .optional()?)
}

pub async fn all_for_user(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<Vec<NoteWithComic>, RepoError> {
    let rows: Vec<(Note, Comic)> = notes::table
        .inner_join(comics::table)
        .filter(notes::user_id.eq(user_id))
        .order(notes::id.asc())
        .select((Note::as_select(), Comic::as_select()))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(note, comic)| NoteWithComic { note, comic })
        .collect())
}
