//! Stateless HTTP request builder and response parser for the Timetonic API.
//!
//! # Design
//! `TimetonicClient` holds the base URL plus the app name and protocol version
//! it declares to the server, and carries no mutable state between calls.
//! Each remote operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//!
//! All operations hit the same endpoint and are told apart by the `req`
//! query parameter. The server answers 200 for refusals too, so every parse
//! goes through [`parse_envelope`], which turns `status: "nok"` into
//! [`ApiError::Rejected`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AllBooksResponse, AppKeyResponse, Book, BookItem, Envelope, GetAllBooksParams, LogInParams,
    OauthKeyResponse, SessKeyResponse, Status,
};

/// Path of the single API endpoint, relative to the base URL.
pub const API_PATH: &str = "live/api.php";

#[derive(Serialize)]
struct CreateAppKeyQuery<'a> {
    req: &'static str,
    appname: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
struct CreateOauthKeyQuery<'a> {
    req: &'static str,
    version: &'a str,
    login: &'a str,
    pwd: &'a str,
    appkey: &'a str,
}

#[derive(Serialize)]
struct CreateSessKeyQuery<'a> {
    req: &'static str,
    version: &'a str,
    o_u: &'a str,
    u_c: &'a str,
    oauthkey: &'a str,
}

#[derive(Serialize)]
struct GetAllBooksQuery<'a> {
    req: &'static str,
    version: &'a str,
    o_u: &'a str,
    u_c: &'a str,
    sesskey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sstamp: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    b_c: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    b_o: Option<&'a str>,
}

/// Synchronous, stateless client for the Timetonic API.
#[derive(Debug, Clone)]
pub struct TimetonicClient {
    base_url: String,
    app_name: String,
    version: String,
}

impl TimetonicClient {
    pub fn new(base_url: &str, app_name: &str, version: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_name: app_name.to_string(),
            version: version.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, &config.app_name, &config.api_version)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_create_app_key(&self) -> Result<HttpRequest, ApiError> {
        self.post(&CreateAppKeyQuery {
            req: "createAppkey",
            appname: &self.app_name,
            version: &self.version,
        })
    }

    pub fn build_create_oauth_key(
        &self,
        params: &LogInParams,
        app_key: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.post(&CreateOauthKeyQuery {
            req: "createOauthkey",
            version: &self.version,
            login: &params.login,
            pwd: &params.password,
            appkey: app_key,
        })
    }

    /// The server expects the OAuth user id twice, as `o_u` and `u_c`.
    pub fn build_create_sess_key(
        &self,
        oauth_user_id: &str,
        oauth_key: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.post(&CreateSessKeyQuery {
            req: "createSesskey",
            version: &self.version,
            o_u: oauth_user_id,
            u_c: oauth_user_id,
            oauthkey: oauth_key,
        })
    }

    pub fn build_get_all_books(
        &self,
        oauth_user_id: &str,
        sess_key: &str,
        filter: &GetAllBooksParams,
    ) -> Result<HttpRequest, ApiError> {
        self.post(&GetAllBooksQuery {
            req: "getAllBooks",
            version: &self.version,
            o_u: oauth_user_id,
            u_c: oauth_user_id,
            sesskey: sess_key,
            sstamp: filter.server_stamp.as_deref(),
            b_c: filter.book_code.as_deref(),
            b_o: filter.book_owner.as_deref(),
        })
    }

    pub fn parse_create_app_key(&self, response: HttpResponse) -> Result<AppKeyResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_create_oauth_key(
        &self,
        response: HttpResponse,
    ) -> Result<OauthKeyResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_create_sess_key(
        &self,
        response: HttpResponse,
    ) -> Result<SessKeyResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_get_all_books(
        &self,
        response: HttpResponse,
    ) -> Result<AllBooksResponse, ApiError> {
        parse_envelope(response)
    }

    /// Project a listing into display items. A missing `allBooks` block is an
    /// empty list, not an error.
    pub fn book_items(&self, response: &AllBooksResponse) -> Vec<BookItem> {
        response
            .all_books
            .as_ref()
            .map(|all| all.books.iter().map(|book| self.book_item(book)).collect())
            .unwrap_or_default()
    }

    pub fn book_item(&self, book: &Book) -> BookItem {
        BookItem {
            title: book.owner_prefs.title.clone(),
            image_url: self.image_url(book.owner_prefs.o_cover_img.as_deref()),
        }
    }

    /// Resolve a server-relative cover path against the base URL.
    pub fn image_url(&self, cover: Option<&str>) -> Option<String> {
        let path = cover.filter(|p| !p.is_empty())?;
        if path.starts_with('/') {
            Some(format!("{}{path}", self.base_url))
        } else {
            Some(format!("{}/{path}", self.base_url))
        }
    }

    fn post<Q: Serialize>(&self, query: &Q) -> Result<HttpRequest, ApiError> {
        let query = serde_urlencoded::to_string(query)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/{API_PATH}?{query}", self.base_url),
            headers: Vec::new(),
            body: None,
        })
    }
}

/// Message used when a `"nok"` envelope carries neither code nor message.
pub const REFUSED_WITHOUT_DETAIL: &str = "server refused the request";

/// Decode any response payload and map a `"nok"` envelope to `Rejected`.
pub fn parse_envelope<T>(response: HttpResponse) -> Result<T, ApiError>
where
    T: DeserializeOwned + Envelope,
{
    check_status(&response)?;
    let payload: T = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))?;

    let outcome = payload.outcome();
    if outcome.status == Status::Nok {
        let code = outcome.error_code.clone().unwrap_or_default();
        let mut message = outcome.error_msg.clone().unwrap_or_default();
        if code.is_empty() && message.is_empty() {
            message = REFUSED_WITHOUT_DETAIL.to_string();
        }
        tracing::warn!(%code, %message, "request rejected by server");
        return Err(ApiError::Rejected { code, message });
    }
    Ok(payload)
}

/// Map non-2xx status codes to `ApiError::HttpError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
