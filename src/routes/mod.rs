use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, rejection::FormRejection, DefaultBodyLimit},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use maud::{html, Markup};

use crate::{
    auth::{session::SessionError, LoginError, Session},
    models::User,
    repository::RepoError,
    AppState,
};

mod account;
mod add;
mod catalog;
mod comic;
mod components;
mod covers;
mod profile;

#[derive(thiserror::Error, Debug)]
pub(crate) enum RouteError {
    #[error("Database error")]
    Repo(#[from] RepoError),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Could not read the submitted form")]
    Multipart(#[from] MultipartError),
    #[error("Invalid form submission")]
    Form(#[from] FormRejection),
    #[error("Could not store the cover image")]
    CoverSave(#[source] std::io::Error),
    #[error("Could not read the cover image")]
    CoverRead(#[source] std::io::Error),
    #[error("Could not hash the password")]
    Hash(#[from] argon2::password_hash::Error),
    #[error("Could not check the credentials")]
    Login(#[from] LoginError),
    #[error("Could not create a session")]
    Session(#[from] SessionError),
    #[error("A background task failed")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("route error: {self} ({self:#?})");
        let (code, text) = match &self {
            RouteError::NotFound(what) => (StatusCode::NOT_FOUND, *what),
            RouteError::Repo(RepoError::NotFound) => (StatusCode::NOT_FOUND, "Not found"),
            RouteError::Multipart(e) => (e.status(), "Invalid form submission"),
            RouteError::Form(_) => (StatusCode::BAD_REQUEST, "Invalid form submission"),
            RouteError::Repo(_)
            | RouteError::CoverSave(_)
            | RouteError::CoverRead(_)
            | RouteError::Hash(_)
            | RouteError::Login(_)
            | RouteError::Session(_)
            | RouteError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error"),
        };

        (
            code,
            base_page(html! {
                .container.text-center."mt-5" {
                    h1 { "Error" }
                    p { (text) }
                    a href="/index" { "Back to the catalog" }
                }
            }),
        )
            .into_response()
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Page {
    Catalog,
    AddComic,
    Notes,
}

impl Page {
    fn variants() -> &'static [Self] {
        &[Self::Catalog, Self::AddComic, Self::Notes]
    }

    fn name(&self) -> &'static str {
        match self {
            Page::Catalog => "Catalog",
            Page::AddComic => "Add a Comic",
            Page::Notes => "My Notes",
        }
    }

    fn location(&self) -> &'static str {
        match self {
            Page::Catalog => "/index",
            Page::AddComic => "/add_comic",
            Page::Notes => "/user_notes",
        }
    }

    fn needs_login(&self) -> bool {
        !matches!(self, Page::Catalog)
    }
}

fn base_page(body: Markup) -> Markup {
    html! {
        (maud::DOCTYPE)
        html lang="en" data-bs-theme="dark" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Comicshelf" }
                link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css"
                     rel="stylesheet"
                     integrity="sha384-T3c6CoIi6uLrA9TneNEoa7RxnatzjcDSCmG1MXxSR1GAsXEV/Dwwykc2MPK8M2HN"
                     crossorigin="anonymous";
                link rel="stylesheet"
                     href="https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.3/font/bootstrap-icons.min.css"
                     integrity="sha384-XGjxtQfXaH2tnPFa9x+ruJTuLE3Aa6LhHSWRr1XeTyhezb4abCG4ccI5AkVDxqC+"
                     crossorigin="anonymous";
            }
            body {
                (body)
                script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js"
                       integrity="sha384-C6RzsynM9kWDrMNeT87bh95OGNyZPhcTNXj1NW7RuBCsyN/o0jlpcV8Qyq46cDfL"
                       crossorigin="anonymous" {}
            }
        }
    }
}

fn raw_app_page(page: Option<Page>, user: Option<&User>, body: Markup) -> Markup {
    base_page(html! {
        .container-fluid {
            header .d-flex
                   .flex-wrap
                   .align-items-center
                   .justify-content-center
                   .justify-content-md-between
                   ."py-3"."mb-4" {
                h2 ."col-md-3"."mb-2"."mb-md-0" {
                    a .d-inline-flex.link-body-emphasis.text-decoration-none href="/" {
                        i .bi.bi-journal-richtext {}
                    }
                }
                ul .nav.nav-pills."col-12".col-md-auto."mb-2".justify-content-center."mb-md-0" {
                    @for p in Page::variants() {
                        @if user.is_some() || !p.needs_login() {
                            @let current = Some(*p) == page;
                            li .nav-item {
                                a .nav-link.active[current]
                                    aria-current=[current.then(|| "page")]
                                    href=(p.location()) {
                                    (p.name())
                                }
                            }
                        }
                    }
                }
                ."col-md-3".text-end."me-2" {
                    @match user {
                        Some(user) => {
                            a .btn.btn-outline-light.me-2 href="/profile" {
                                i .bi.bi-person-circle.me-1 {} (user.username)
                            }
                            a .btn.btn-outline-secondary href="/logout" { "Logout" }
                        },
                        None => {
                            a .btn.btn-outline-light.me-2 href="/login" { "Login" }
                            a .btn.btn-primary href="/register" { "Register" }
                        },
                    }
                }
            }
            (body)
        }
    })
}

fn app_page(page: Page, user: Option<&User>, body: Markup) -> Markup {
    raw_app_page(Some(page), user, body)
}

pub(crate) async fn welcome(session: Session) -> Markup {
    raw_app_page(
        None,
        session.user(),
        html! {
            .container.text-center."mt-5" {
                h1 ."mb-3" { "Welcome to the library" }
                p .lead {
                    "Browse the comic and manga catalog, rate what you read and keep notes on every volume."
                }
                a .btn.btn-primary.btn-lg href="/index" { "Open the catalog" }
            }
        },
    )
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.uploads.max_size;

    Router::new()
        .route("/", get(welcome))
        .route("/index", get(catalog::index))
        .route("/search", get(catalog::search))
        .route("/add_comic", get(add::add_comic).post(add::do_add_comic))
        .route("/register", get(account::register).post(account::do_register))
        .route("/login", get(account::login).post(account::do_login))
        .route("/logout", get(account::logout))
        .route("/profile", get(profile::profile))
        .route("/user_notes", get(profile::user_notes))
        .route("/comic/:id", get(comic::comic_detail))
        .route("/add_rating/:id", post(comic::add_rating))
        .route("/add_note/:id", post(comic::add_note))
        .route("/covers/:file_name", get(covers::cover))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
