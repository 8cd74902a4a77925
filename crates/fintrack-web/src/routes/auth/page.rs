//! Sign-in page, sign-in and sign-out

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use fintrack_core::{CoreError, SessionGuard};
use serde::Deserialize;

use crate::error::ApiError;
use crate::session::{clear_cookie, read_cookie, session_cookie};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    #[serde(default)]
    pub error: Option<String>,
}

pub async fn page_sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SignInQuery>,
) -> Response {
    let marker = read_cookie(&headers, &state.config.session.cookie_name);
    if !SessionGuard::new(&state.registry).check(marker.as_deref()).is_redirect() {
        return Redirect::to("/").into_response();
    }

    let error = match query.error.as_deref() {
        Some(_) => "<p class='text-sm text-red-600 mb-4'>Wrong username or password</p>",
        None => "",
    };

    let content = format!(
        r#"<div class='min-h-screen flex items-center justify-center'>
            <form method='post' action='/auth' class='bg-white rounded-xl shadow-sm p-8 w-80'>
                <h1 class='text-xl font-bold text-indigo-600 mb-6'>Fintrack</h1>
                {}
                <label class='block text-sm text-gray-500 mb-1' for='username'>Username</label>
                <input id='username' name='username' class='border rounded w-full px-2 py-1 mb-4' autofocus>
                <label class='block text-sm text-gray-500 mb-1' for='password'>Password</label>
                <input id='password' name='password' type='password' class='border rounded w-full px-2 py-1 mb-6'>
                <button class='bg-indigo-600 text-white rounded w-full py-2'>Sign in</button>
            </form>
        </div>"#,
        error
    );

    Html(crate::base_html("Sign in", &content)).into_response()
}

pub async fn sign_in(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Result<Response, ApiError> {
    let identity = match state
        .identity
        .authenticate(form.username.trim(), &form.password)
        .await
    {
        Ok(identity) => identity,
        Err(CoreError::Unauthorized) => {
            log::warn!("Failed sign-in for {}", form.username.trim());
            return Ok(Redirect::to("/auth?error=1").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let session = state.registry.sign_in(identity);
    let cookie = session_cookie(
        &state.config.session.cookie_name,
        &session.token,
        state.config.session.ttl_minutes,
    );
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = read_cookie(&headers, &state.config.session.cookie_name) {
        state.registry.sign_out(&token);
    }
    let cookie = clear_cookie(&state.config.session.cookie_name);
    ([(SET_COOKIE, cookie)], Redirect::to(fintrack_core::AUTH_ROUTE)).into_response()
}
