use axum::{
    extract::Query,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::{CookieJar, WithRejection};
use maud::html;
use validator::Validate;

use crate::{
    auth::{
        check_credentials, password,
        session::{self, safe_next},
        LoginError, Session,
    },
    forms::field_errors,
    models::{NewUser, User},
    repository,
    State,
};

use super::{components::error_alerts, raw_app_page, RouteError};

const USERNAME_TAKEN: &str = "Username already exists";

fn account_page(
    session: &Session,
    title: &str,
    errors: &[String],
    form: maud::Markup,
) -> maud::Markup {
    raw_app_page(
        None,
        session.user(),
        html! {
            .container-sm style="max-width: 28rem" {
                h2 .text-center."mb-3" { (title) }
                (error_alerts(errors))
                (form)
            }
        },
    )
}

#[derive(Debug, Default, serde::Deserialize, Validate)]
pub(crate) struct RegisterForm {
    #[validate(length(min = 1, message = "This field is required."))]
    username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    password: String,
    #[validate(length(min = 1, message = "This field is required."))]
    email: String,
}

const REGISTER_FIELDS: &[(&str, &str)] = &[
    ("username", "Username"),
    ("password", "Password"),
    ("email", "Email"),
];

fn register_page(session: &Session, form: &RegisterForm, errors: &[String]) -> maud::Markup {
    account_page(
        session,
        "Register",
        errors,
        html! {
            form method="POST" action="/register" {
                .form-floating."mb-2" {
                    input .form-control required #username name="username" type="text"
                        placeholder="Username" value=(form.username);
                    label for="username" { "Username" }
                }
                .form-floating."mb-2" {
                    input .form-control required #email name="email" type="email"
                        placeholder="Email" value=(form.email);
                    label for="email" { "Email" }
                }
                .form-floating."mb-2" {
                    input .form-control required #password name="password" type="password"
                        placeholder="Password";
                    label for="password" { "Password" }
                }
                input type="submit" .btn.btn-primary value="Register";
                p ."mt-3" { "Already registered? " a href="/login" { "Log in" } }
            }
        },
    )
}

pub(crate) async fn register(session: Session) -> maud::Markup {
    register_page(&session, &RegisterForm::default(), &[])
}

pub(crate) async fn do_register(
    state: State,
    session: Session,
    WithRejection(Form(mut form), _): WithRejection<Form<RegisterForm>, RouteError>,
) -> Result<Response, RouteError> {
    form.username = form.username.trim().to_string();
    form.email = form.email.trim().to_string();

    if let Err(e) = form.validate() {
        let errors: Vec<_> = field_errors(&e, REGISTER_FIELDS)
            .iter()
            .map(ToString::to_string)
            .collect();
        return Ok(register_page(&session, &form, &errors).into_response());
    }

    let taken = || register_page(&session, &form, &[USERNAME_TAKEN.to_string()]);

    let mut conn = state.connection().await?;
    if repository::user::find_by_username(&mut conn, &form.username)
        .await?
        .is_some()
    {
        return Ok(taken().into_response());
    }

    let plain = form.password.clone();
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain)).await??;

    let created = repository::user::create(
        &mut conn,
        NewUser {
            username: &form.username,
            password: &hash,
            email: &form.email,
        },
    )
    .await;

    match created {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        // Registered concurrently since the check above
        Err(e) if e.is_unique_violation() => {
            tracing::debug!("Registration raced: {e}");
            Ok(taken().into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct LoginQuery {
    next: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
    next: Option<String>,
}

fn login_page(
    session: &Session,
    username: &str,
    next: Option<&str>,
    errors: &[String],
) -> maud::Markup {
    account_page(
        session,
        "Log in",
        errors,
        html! {
            form method="POST" action="/login" {
                .form-floating."mb-2" {
                    input .form-control required #username name="username" type="text"
                        placeholder="Username" value=(username);
                    label for="username" { "Username" }
                }
                .form-floating."mb-2" {
                    input .form-control required #password name="password" type="password"
                        placeholder="Password";
                    label for="password" { "Password" }
                }
                @if let Some(next) = next {
                    input type="hidden" name="next" value=(next);
                }
                input type="submit" .btn.btn-primary value="Log in";
                p ."mt-3" { "No account yet? " a href="/register" { "Register" } }
            }
        },
    )
}

pub(crate) async fn login(session: Session, Query(query): Query<LoginQuery>) -> maud::Markup {
    login_page(&session, "", query.next.as_deref(), &[])
}

pub(crate) async fn do_login(
    state: State,
    session: Session,
    jar: CookieJar,
    WithRejection(Form(form), _): WithRejection<Form<LoginForm>, RouteError>,
) -> Result<Response, RouteError> {
    let mut conn = state.connection().await?;
    let found = repository::user::find_by_username(&mut conn, &form.username).await?;
    drop(conn);

    let password = form.password.clone();
    let checked = tokio::task::spawn_blocking(move || check_credentials(found, &password)).await?;

    let user = match checked {
        Ok(user) => user,
        Err(e @ LoginError::InvalidCredentials) => {
            tracing::info!("Failed login for '{}'", form.username);
            let errors = [e.to_string()];
            return Ok(
                login_page(&session, &form.username, form.next.as_deref(), &errors)
                    .into_response(),
            );
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("{} logged in", user.username);

    let jar = jar.add(state.sessions.login_cookie(user.id)?);
    Ok((jar, Redirect::to(safe_next(form.next.as_deref()))).into_response())
}

pub(crate) async fn logout(user: User, jar: CookieJar) -> (CookieJar, Redirect) {
    tracing::info!("{} logged out", user.username);
    (session::logout(jar), Redirect::to("/index"))
}
