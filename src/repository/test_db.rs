//! Connections for database-backed tests.
//!
//! Tests run inside a transaction that is never committed, against the
//! database named by `COMICSHELF_TEST_DATABASE_URL`. Without it they are
//! skipped with a notice, unless `COMICSHELF_REQUIRE_TEST_DATABASE` is set, in
//! which case they fail.

use std::{future::Future, pin::Pin, sync::Mutex};

use diesel::result::{ConnectionError, ConnectionResult};
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncConnection, AsyncPgConnection,
};

use crate::models::{ComicStatus, NewComic, NewUser, User};

use super::{comic, user};

const DATABASE_VAR: &str = "COMICSHELF_TEST_DATABASE_URL";
const REQUIRE_VAR: &str = "COMICSHELF_REQUIRE_TEST_DATABASE";

static MIGRATED: Mutex<bool> = Mutex::new(false);

fn unavailable<T>(required: bool) -> Option<T> {
    assert!(!required, "{REQUIRE_VAR} is set but {DATABASE_VAR} is not");
    eprintln!("skipping database test, {DATABASE_VAR} is not set");
    None
}

/// The migrated test database, or `None` when tests should be skipped.
pub(crate) async fn database_url() -> Option<String> {
    let Ok(url) = std::env::var(DATABASE_VAR) else {
        return unavailable(std::env::var_os(REQUIRE_VAR).is_some());
    };

    let migration_url = url.clone();
    tokio::task::spawn_blocking(move || {
        let mut migrated = MIGRATED.lock().unwrap_or_else(|e| e.into_inner());
        if !*migrated {
            crate::run_migrations(&migration_url).unwrap();
            *migrated = true;
        }
    })
    .await
    .unwrap();

    Some(url)
}

pub(crate) async fn connection() -> Option<AsyncPgConnection> {
    let url = database_url().await?;

    let mut conn = AsyncPgConnection::establish(&url).await.unwrap();
    conn.begin_test_transaction().await.unwrap();
    Some(conn)
}

type SetupFuture<'a> =
    Pin<Box<dyn Future<Output = ConnectionResult<AsyncPgConnection>> + Send + 'a>>;

fn establish_in_test_transaction(url: &str) -> SetupFuture<'_> {
    Box::pin(async move {
        let mut conn = AsyncPgConnection::establish(url).await?;
        conn.begin_test_transaction()
            .await
            .map_err(ConnectionError::CouldntSetupConfiguration)?;
        Ok(conn)
    })
}

/// A pool holding a single connection whose test transaction is never
/// committed. Everything a router does through it is rolled back once the
/// pool is dropped.
pub(crate) fn transactional_pool(url: &str) -> Pool<AsyncPgConnection> {
    let mut config = ManagerConfig::default();
    config.custom_setup = Box::new(establish_in_test_transaction);

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(url, config);
    Pool::<AsyncPgConnection>::builder(manager)
        .max_size(1)
        .build()
        .unwrap()
}

pub(crate) async fn user(conn: &mut AsyncPgConnection, username: &str) -> User {
    user::create(
        conn,
        NewUser {
            username,
            password: "not-a-real-hash",
            email: "reader@example.org",
        },
    )
    .await
    .unwrap()
}

pub(crate) fn comic(title: &str, author: &str, genre: &str, status: ComicStatus) -> NewComic {
    NewComic {
        title: title.into(),
        author: author.into(),
        artist: "Artist".into(),
        publisher: "Publisher".into(),
        volume: Some(1),
        year_published: None,
        genre: genre.into(),
        short_description: "A comic used in tests".into(),
        cover_image: "cover.png".into(),
        status,
    }
}

pub(crate) async fn insert_comic(conn: &mut AsyncPgConnection, new: NewComic) -> i32 {
    comic::create(conn, &new).await.unwrap().id
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_database_is_skipped() {
        assert!(unavailable::<()>(false).is_none());
    }

    #[test]
    #[should_panic(expected = "COMICSHELF_REQUIRE_TEST_DATABASE is set")]
    fn missing_database_fails_when_required() {
        unavailable::<()>(true);
    }
}
