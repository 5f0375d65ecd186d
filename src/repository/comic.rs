use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    models::{Comic, ComicStatus, NewComic},
    schema::comics,
};

use super::RepoError;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SortOrder {
    #[default]
    Title,
    Author,
    Year,
}

impl SortOrder {
    /// Unknown or missing values fall back to sorting by title.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("year") => SortOrder::Year,
            Some("author") => SortOrder::Author,
            _ => SortOrder::Title,
        }
    }

    pub fn param(&self) -> &'static str {
        match self {
            SortOrder::Title => "title",
            SortOrder::Author => "author",
            SortOrder::Year => "year",
        }
    }
}

fn search_pattern(search: &str) -> String {
    format!("%{}%", search.trim())
}

pub async fn list(
    conn: &mut AsyncPgConnection,
    search: &str,
    sort: SortOrder,
    status: Option<ComicStatus>,
) -> Result<Vec<Comic>, RepoError> {
    let pattern = search_pattern(search);

    let mut query = comics::table
        .filter(
            comics::title
                .ilike(&pattern)
                .or(comics::author.ilike(&pattern))
                .or(comics::genre.ilike(&pattern)),
        )
        .select(Comic::as_select())
        .into_boxed();

    if let Some(status) = status {
        query = query.filter(comics::status.eq(status));
    }

    query = match sort {
        SortOrder::Year => query.order(comics::year_published.desc()),
        SortOrder::Author => query.order(comics::author.asc()),
        SortOrder::Title => query.order(comics::title.asc()),
    };

    Ok(query.load(conn).await?)
}

pub async fn create(conn: &mut AsyncPgConnection, comic: &NewComic) -> Result<Comic, RepoError> {
    let comic = diesel::insert_into(comics::table)
        .values(comic)
        .returning(Comic::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!("Added comic {} '{}'", comic.id, comic.title);

    Ok(comic)
}

pub async fn get_by_id(conn: &mut AsyncPgConnection, id: i32) -> Result<Option<Comic>, RepoError> {
    Ok(comics::table
        .find(id)
        .select(Comic::as_select())
        .first(conn)
        .await
        .optional()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::repository::test_db;

    #[test]
    fn sort_parameter_defaults_to_title() {
        assert_eq!(SortOrder::from_param(None), SortOrder::Title);
        assert_eq!(SortOrder::from_param(Some("")), SortOrder::Title);
        assert_eq!(SortOrder::from_param(Some("rating")), SortOrder::Title);
        assert_eq!(SortOrder::from_param(Some("year")), SortOrder::Year);
        assert_eq!(SortOrder::from_param(Some("author")), SortOrder::Author);
    }

    #[test]
    fn search_term_is_trimmed() {
        assert_eq!(search_pattern("  naruto "), "%naruto%");
        assert_eq!(search_pattern(""), "%%");
    }

    fn titles(comics: &[Comic]) -> Vec<&str> {
        comics.iter().map(|c| c.title.as_str()).collect()
    }

    #[tokio::test]
    async fn empty_search_lists_everything_by_title() {
        let Some(mut conn) = test_db::connection().await else {
            return;
        };

        for title in ["Monstress", "Akira", "Saga"] {
            let new = test_db::comic(title, "Someone", "Fantasy", ComicStatus::InStock);
            test_db::insert_comic(&mut conn, new).await;
        }

        let all = list(&mut conn, "", SortOrder::Title, None).await.unwrap();
        assert_eq!(titles(&all), ["Akira", "Monstress", "Saga"]);
    }

    #[tokio::test]
    async fn search_matches_title_author_or_genre_case_insensitively() {
        let Some(mut conn) = test_db::connection().await else {
            return;
        };

        let rows = [
            ("Berserk", "Kentaro Miura", "Dark fantasy"),
            ("Monster", "Naoki Urasawa", "Thriller"),
            ("Pluto", "Naoki Urasawa", "Science fiction"),
            ("Yotsuba&!", "Kiyohiko Azuma", "Comedy"),
        ];
        for (title, author, genre) in rows {
            let new = test_db::comic(title, author, genre, ComicStatus::InStock);
            test_db::insert_comic(&mut conn, new).await;
        }

        let by_author = list(&mut conn, "URASAWA", SortOrder::Title, None)
            .await
            .unwrap();
        assert_eq!(titles(&by_author), ["Monster", "Pluto"]);

        let by_genre = list(&mut conn, " fantasy ", SortOrder::Title, None)
            .await
            .unwrap();
        assert_eq!(titles(&by_genre), ["Berserk"]);

        let by_title = list(&mut conn, "yotsuba", SortOrder::Title, None)
            .await
            .unwrap();
        assert_eq!(titles(&by_title), ["Yotsuba&!"]);
    }

    #[tokio::test]
    async fn status_filter_is_combined_with_the_search() {
        let Some(mut conn) = test_db::connection().await else {
            return;
        };

        let rows = [
            ("Hellboy", "Mike Mignola", ComicStatus::InStock),
            ("B.P.R.D.", "Mike Mignola", ComicStatus::LoanedOut),
            ("Watchmen", "Alan Moore", ComicStatus::LoanedOut),
        ];
        for (title, author, status) in rows {
            let new = test_db::comic(title, author, "Superhero", status);
            test_db::insert_comic(&mut conn, new).await;
        }

        let loaned = list(&mut conn, "", SortOrder::Title, Some(ComicStatus::LoanedOut))
            .await
            .unwrap();
        assert_eq!(titles(&loaned), ["B.P.R.D.", "Watchmen"]);

        let loaned_mignola = list(
            &mut conn,
            "mignola",
            SortOrder::Title,
            Some(ComicStatus::LoanedOut),
        )
        .await
        .unwrap();
        assert_eq!(titles(&loaned_mignola), ["B.P.R.D."]);
    }

    #[tokio::test]
    async fn sort_orders() {
        let Some(mut conn) = test_db::connection().await else {
            return;
        };

        let rows = [
            ("Bone", "Jeff Smith", 1991),
            ("Maus", "Art Spiegelman", 1980),
            ("Persepolis", "Marjane Satrapi", 2000),
        ];
        for (title, author, year) in rows {
            let mut new = test_db::comic(title, author, "Memoir", ComicStatus::InStock);
            new.year_published = Some(year);
            test_db::insert_comic(&mut conn, new).await;
        }

        let by_year = list(&mut conn, "memoir", SortOrder::Year, None)
            .await
            .unwrap();
        assert_eq!(titles(&by_year), ["Persepolis", "Bone", "Maus"]);

        let by_author = list(&mut conn, "memoir", SortOrder::Author, None)
            .await
            .unwrap();
        assert_eq!(titles(&by_author), ["Maus", "Bone", "Persepolis"]);
    }

    #[tokio::test]
    async fn get_by_id_distinguishes_absent_rows() {
        let Some(mut conn) = test_db::connection().await else {
            return;
        };

        let new = test_db::comic("Blacksad", "Juan Díaz Canales", "Noir", ComicStatus::InStock);
        let id = test_db::insert_comic(&mut conn, new.clone()).await;

        let found = get_by_id(&mut conn, id).await.unwrap().unwrap();
        assert_eq!(found.title, new.title);
        assert_eq!(found.status, ComicStatus::InStock);
        assert_eq!(found.volume, Some(1));

        assert!(get_by_id(&mut conn, id + 1000).await.unwrap().is_none());
    }
}
