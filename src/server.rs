//! The HTTP surface: an axum route table in front of [`Site`].
//!
//! Site views do blocking file I/O, so every handler runs its view on the
//! blocking thread pool.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::site::{AdminOutcome, ArchiveDate, Error, Page, Site};

type SiteState = Arc<Site>;

/// Builds the route table.
pub fn router(site: SiteState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/{year}/{month}/{day}/{slug}", get(article))
        .route("/archives", get(archives_root))
        .route("/archives/{year}", get(archives))
        .route("/archives/{year}/{month}", get(archives))
        .route("/archives/{year}/{month}/{day}", get(archives))
        .route("/tag/{tag}", get(tag))
        .route("/rss", get(rss))
        .route("/atom", get(atom))
        .route("/sitemap", get(sitemap))
        .route("/admin/{action}", get(admin))
        .fallback(page)
        .layer(TraceLayer::new_for_http())
        .with_state(site)
}

/// The router wrapped so trailing slashes are trimmed before routing.
pub fn app(site: SiteState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(site))
}

/// Serves `site` on `listener` until ctrl-c.
pub async fn serve(listener: tokio::net::TcpListener, site: SiteState) -> std::io::Result<()> {
    use axum::ServiceExt;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app(site)))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Runs `view` on the blocking pool and turns its result into a response.
async fn respond<F>(site: SiteState, view: F) -> Response
where
    F: FnOnce(&Site) -> crate::site::Result<Page> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || match view(site.as_ref()) {
        Ok(page) => (StatusCode::OK, page),
        Err(Error::NotFound) => (StatusCode::NOT_FOUND, site.not_found()),
        Err(e) => {
            error!(error = %e, "rendering view");
            (StatusCode::INTERNAL_SERVER_ERROR, internal_error_page())
        }
    });
    match task.await {
        Ok((status, page)) => into_response(status, page),
        Err(e) => {
            error!(error = %e, "view task failed");
            into_response(StatusCode::INTERNAL_SERVER_ERROR, internal_error_page())
        }
    }
}

fn internal_error_page() -> Page {
    Page {
        body: String::from("Internal Server Error"),
        content_type: "text/plain; charset=utf-8",
    }
}

fn into_response(status: StatusCode, page: Page) -> Response {
    (status, [(header::CONTENT_TYPE, page.content_type)], page.body).into_response()
}

async fn index(State(site): State<SiteState>) -> Response {
    respond(site, |site| site.index()).await
}

async fn article(
    State(site): State<SiteState>,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
) -> Response {
    respond(site, move |site| site.article(&year, &month, &day, &slug)).await
}

#[derive(Deserialize)]
struct ArchivePath {
    year: String,
    month: Option<String>,
    day: Option<String>,
}

#[derive(Deserialize)]
struct ArchiveQuery {
    #[serde(default)]
    page: usize,
}

type ArchiveQueryResult = std::result::Result<Query<ArchiveQuery>, QueryRejection>;

/// The requested archive page. A query string that doesn't parse names no
/// page, so it renders as not found.
fn page_number(query: ArchiveQueryResult) -> crate::site::Result<usize> {
    query.map(|Query(query)| query.page).map_err(|_| Error::NotFound)
}

async fn archives_root(State(site): State<SiteState>, query: ArchiveQueryResult) -> Response {
    let page = page_number(query);
    respond(site, move |site| site.archives(&ArchiveDate::default(), page?)).await
}

async fn archives(
    State(site): State<SiteState>,
    Path(path): Path<ArchivePath>,
    query: ArchiveQueryResult,
) -> Response {
    let date = ArchiveDate {
        year: Some(path.year),
        month: path.month,
        day: path.day,
    };
    let page = page_number(query);
    respond(site, move |site| site.archives(&date, page?)).await
}

async fn tag(State(site): State<SiteState>, Path(tag): Path<String>) -> Response {
    respond(site, move |site| site.tag(&tag)).await
}

async fn rss(State(site): State<SiteState>) -> Response {
    respond(site, |site| site.rss()).await
}

async fn atom(State(site): State<SiteState>) -> Response {
    respond(site, |site| site.atom()).await
}

async fn sitemap(State(site): State<SiteState>) -> Response {
    respond(site, |site| site.sitemap()).await
}

async fn admin(State(site): State<SiteState>, Path(action): Path<String>) -> Response {
    let outcome = tokio::task::spawn_blocking({
        let site = site.clone();
        move || site.admin(&action)
    })
    .await;
    match outcome {
        Ok(Ok(AdminOutcome::Flushed)) => Redirect::to("/").into_response(),
        Ok(Err(_)) => respond(site, |_| Err(Error::NotFound)).await,
        Err(e) => {
            error!(error = %e, "admin task failed");
            into_response(StatusCode::INTERNAL_SERVER_ERROR, internal_error_page())
        }
    }
}

async fn page(State(site): State<SiteState>, uri: Uri) -> Response {
    let name = uri.path().to_owned();
    respond(site, move |site| site.page(&name)).await
}
