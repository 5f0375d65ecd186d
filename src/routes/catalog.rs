use axum::extract::Query;
use maud::html;

use crate::{
    auth::Session,
    models::{Comic, ComicStatus},
    repository::{self, comic::SortOrder},
    AppState, State,
};

use super::{
    app_page,
    components::{catalog_filters, comic_cards, CatalogFilters},
    Page, RouteError,
};

#[derive(Debug, serde::Deserialize)]
pub(crate) struct CatalogQuery {
    #[serde(default)]
    search: String,
    sort: Option<String>,
    #[serde(default)]
    status: String,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    query: String,
}

async fn listing(
    state: &AppState,
    search: &str,
    sort: SortOrder,
    status: &str,
) -> Result<Vec<Comic>, RouteError> {
    let status = match status {
        "" => None,
        status => match status.parse::<ComicStatus>() {
            Ok(status) => Some(status),
            // No stored comic can have it
            Err(e) => {
                tracing::debug!("{e}, listing nothing");
                return Ok(Vec::new());
            }
        },
    };

    let mut conn = state.connection().await?;
    Ok(repository::comic::list(&mut conn, search, sort, status).await?)
}

pub(crate) async fn index(
    state: State,
    session: Session,
    Query(query): Query<CatalogQuery>,
) -> Result<maud::Markup, RouteError> {
    let sort = SortOrder::from_param(query.sort.as_deref());
    let comics = listing(&state, &query.search, sort, &query.status).await?;

    Ok(app_page(
        Page::Catalog,
        session.user(),
        html! {
            (catalog_filters(&CatalogFilters {
                search: &query.search,
                sort,
                status: &query.status,
            }))
            (comic_cards(&comics))
        },
    ))
}

pub(crate) async fn search(
    state: State,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Result<maud::Markup, RouteError> {
    let comics = listing(&state, &query.query, SortOrder::Title, "").await?;

    Ok(app_page(
        Page::Catalog,
        session.user(),
        html! {
            (catalog_filters(&CatalogFilters {
                search: &query.query,
                sort: SortOrder::Title,
                status: "",
            }))
            (comic_cards(&comics))
        },
    ))
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;

    use crate::routes::test::{body_text, get, offline_state};

    #[tokio::test]
    async fn unknown_status_lists_nothing_without_querying() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(offline_state(dir.path()), "/index?status=Lost&sort=year").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("No comics match."));
        assert!(body.contains(r#"<option value="year" selected>"#));
    }
}
