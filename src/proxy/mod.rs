//! HTTP front end: fetch upstream JSON, select, answer as XML or plain text.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

use crate::json::{stringify, Selector};
use crate::xml::{render, ROOT_TAG};

pub mod error;
pub mod upstream;

pub use error::{ProxyError, Result};
pub use upstream::{Target, Upstream, UpstreamError, COINGECKO_ADDRESS};

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Query parameter holding the selector path; never forwarded upstream
pub const JSONPATH_PARAM: &str = "jsonpath";

#[derive(Debug, Clone)]
pub struct AppState {
    pub upstream: Upstream,
}

impl AppState {
    pub fn new(upstream: Upstream) -> AppState {
        AppState { upstream }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/xml/coingecko/*route", get(xml_coingecko))
        .route("/xml/any/*url", get(xml_any))
        .route("/value/coingecko/*route", get(value_coingecko))
        .route("/value/any/*url", get(value_any))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// The request's query split into the selector and the parameters meant for
/// the upstream API. Parameters belonging to the target URL arrive here too,
/// since its `&` separators end the proxy's own `jsonpath` value.
#[derive(Debug, Default, PartialEq, Eq)]
struct ProxyQuery {
    jsonpath: Option<String>,
    forwarded: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for ProxyQuery {
    fn from(params: Vec<(String, String)>) -> Self {
        let mut query = ProxyQuery::default();
        for (key, value) in params {
            if key == JSONPATH_PARAM {
                query.jsonpath = Some(value);
            } else {
                query.forwarded.push((key, value));
            }
        }
        query
    }
}

impl ProxyQuery {
    fn selector(&self) -> Result<Selector> {
        Ok(Selector::parse(self.jsonpath.as_deref().unwrap_or_default())?)
    }
}

async fn xml_response(state: &AppState, target: Target, query: ProxyQuery) -> Result<Response> {
    log::info!("xml {target}");
    let selector = query.selector()?;
    let json = state.upstream.fetch_json(&target, &query.forwarded).await?;
    let selected = selector.select_all(&json)?;
    let document = render(&selected, ROOT_TAG).to_document()?;
    Ok(([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], document).into_response())
}

async fn value_response(state: &AppState, target: Target, query: ProxyQuery) -> Result<Response> {
    log::info!("value {target}");
    let selector = query.selector()?;
    let json = state.upstream.fetch_json(&target, &query.forwarded).await?;
    let value = stringify(selector.select(&json)?)?;
    Ok(([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], value).into_response())
}

async fn xml_coingecko(
    State(state): State<AppState>,
    Path(route): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response> {
    xml_response(&state, Target::CoinGecko(route), params.into()).await
}

async fn xml_any(
    State(state): State<AppState>,
    Path(url): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response> {
    xml_response(&state, Target::Any(url), params.into()).await
}

async fn value_coingecko(
    State(state): State<AppState>,
    Path(route): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response> {
    value_response(&state, Target::CoinGecko(route), params.into()).await
}

async fn value_any(
    State(state): State<AppState>,
    Path(url): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response> {
    value_response(&state, Target::Any(url), params.into()).await
}

async fn welcome() -> Html<&'static str> {
    Html(
        r#"Welcome!<br>
JSON to XML for <code>IMPORTXML</code>: <code>/xml/coingecko/{route}</code>, <code>/xml/any/{url}</code><br>
Single values for <code>IMPORTDATA</code>: <code>/value/coingecko/{route}</code>, <code>/value/any/{url}</code><br>
Add <code>?jsonpath=bitcoin.usd</code> to select part of the response."#,
    )
}
