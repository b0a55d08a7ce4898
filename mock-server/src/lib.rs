//! In-memory stand-in for the Timetonic `live/api.php` endpoint.
//!
//! Every operation is a POST to the same path, selected by the `req` query
//! parameter. Like the real service it always answers 200 and reports
//! refusals as `{"status":"nok","errorCode":..,"errorMsg":..}`.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_PATH: &str = "/live/api.php";

pub const DEMO_LOGIN: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "secret";
pub const DEMO_USER_ID: &str = "demo";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    pub password: String,
    pub user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub code: String,
    pub owner: String,
    pub title: String,
    pub cover: Option<String>,
    pub sstamp: i64,
}

impl Book {
    fn to_wire(&self) -> Value {
        json!({
            "accepted": true,
            "archived": false,
            "sstamp": self.sstamp,
            "del": false,
            "b_c": self.code,
            "b_o": self.owner,
            "contact_u_c": null,
            "nbNotRead": 0,
            "nbMembers": 1,
            "members": [{ "u_c": self.owner, "invite": "done", "right": 1 }],
            "ownerPrefs": {
                "oCoverColor": "#ffffff",
                "oCoverUseLastImg": false,
                "oCoverImg": self.cover,
                "oCoverType": "image",
                "authorizeMemberBroadcast": false,
                "acceptExternalMsg": false,
                "title": self.title,
                "notifyMobileConfidential": false
            },
            "sbid": 0,
            "lastMsgRead": 0,
            "lastMedia": 0,
            "favorite": false,
            "order": 0
        })
    }
}

/// Accounts, books and every key the server has issued.
#[derive(Debug, Default)]
pub struct Store {
    accounts: Vec<Account>,
    books: Vec<Book>,
    app_keys: HashSet<String>,
    oauth_keys: HashMap<String, String>,
    sess_keys: HashMap<String, String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// One demo account owning three books, one without a cover.
    pub fn demo() -> Self {
        Self::new()
            .with_account(DEMO_LOGIN, DEMO_PASSWORD, DEMO_USER_ID)
            .with_book(Book {
                code: "b-recipes".to_string(),
                owner: DEMO_USER_ID.to_string(),
                title: "Recipes".to_string(),
                cover: Some("/live/dbi/in/tb/recipes.png".to_string()),
                sstamp: 1_700_000_000,
            })
            .with_book(Book {
                code: "b-travel".to_string(),
                owner: DEMO_USER_ID.to_string(),
                title: "Travel Notes".to_string(),
                cover: None,
                sstamp: 1_700_000_100,
            })
            .with_book(Book {
                code: "b-reading".to_string(),
                owner: DEMO_USER_ID.to_string(),
                title: "Reading List".to_string(),
                cover: Some("/live/dbi/in/tb/reading.png".to_string()),
                sstamp: 1_700_000_200,
            })
    }

    pub fn with_account(mut self, login: &str, password: &str, user_id: &str) -> Self {
        self.accounts.push(Account {
            login: login.to_string(),
            password: password.to_string(),
            user_id: user_id.to_string(),
        });
        self
    }

    pub fn with_book(mut self, book: Book) -> Self {
        self.books.push(book);
        self
    }
}

pub type Db = Arc<RwLock<Store>>;

type Reply = Result<Value, Value>;
type Params = HashMap<String, String>;

pub fn app() -> Router {
    app_with(Store::demo())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new().route(API_PATH, post(api)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn api(State(db): State<Db>, Query(params): Query<Params>) -> Json<Value> {
    let req = params.get("req").map(String::as_str).unwrap_or_default();
    tracing::debug!(req, "api call");
    let reply = match req {
        "createAppkey" => create_app_key(&db, &params).await,
        "createOauthkey" => create_oauth_key(&db, &params).await,
        "createSesskey" => create_sess_key(&db, &params).await,
        "getAllBooks" => get_all_books(&db, &params).await,
        "" => Err(nok("ERR_MISSING_PARAM", "missing parameter req")),
        other => Err(nok("ERR_UNKNOWN_REQ", &format!("unknown request {other}"))),
    };
    Json(reply.unwrap_or_else(|refusal| refusal))
}

fn nok(code: &str, message: &str) -> Value {
    json!({ "status": "nok", "errorCode": code, "errorMsg": message })
}

fn required<'a>(params: &'a Params, name: &str) -> Result<&'a str, Value> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| nok("ERR_MISSING_PARAM", &format!("missing parameter {name}")))
}

fn new_key(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

async fn create_app_key(db: &Db, params: &Params) -> Reply {
    required(params, "appname")?;
    required(params, "version")?;
    let key = new_key("ak");
    db.write().await.app_keys.insert(key.clone());
    Ok(json!({ "status": "ok", "appkey": key }))
}

async fn create_oauth_key(db: &Db, params: &Params) -> Reply {
    required(params, "version")?;
    let login = required(params, "login")?;
    let password = required(params, "pwd")?;
    let app_key = required(params, "appkey")?;

    let mut store = db.write().await;
    if !store.app_keys.contains(app_key) {
        return Err(nok("ERR_BAD_APPKEY", "invalid appkey"));
    }
    let user_id = store
        .accounts
        .iter()
        .find(|a| a.login == login && a.password == password)
        .map(|a| a.user_id.clone())
        .ok_or_else(|| nok("ERR_BAD_CREDENTIALS", "wrong login or password"))?;

    let key = new_key("ok");
    store.oauth_keys.insert(key.clone(), user_id.clone());
    Ok(json!({ "status": "ok", "oauthkey": key, "o_u": user_id }))
}

async fn create_sess_key(db: &Db, params: &Params) -> Reply {
    required(params, "version")?;
    let user_id = required(params, "o_u")?;
    let user_code = required(params, "u_c")?;
    let oauth_key = required(params, "oauthkey")?;

    let mut store = db.write().await;
    if store.oauth_keys.get(oauth_key).map(String::as_str) != Some(user_id) || user_code != user_id {
        return Err(nok("ERR_BAD_OAUTHKEY", "invalid oauthkey"));
    }
    let key = new_key("sk");
    store.sess_keys.insert(key.clone(), user_id.to_string());
    Ok(json!({ "status": "ok", "sesskey": key }))
}

async fn get_all_books(db: &Db, params: &Params) -> Reply {
    required(params, "version")?;
    let user_id = required(params, "o_u")?;
    let user_code = required(params, "u_c")?;
    let sess_key = required(params, "sesskey")?;
    let since = match params.get("sstamp").filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| nok("ERR_BAD_PARAM", "sstamp must be an integer"))?,
        ),
        None => None,
    };
    let book_code = params.get("b_c").filter(|s| !s.is_empty());
    let book_owner = params.get("b_o").filter(|s| !s.is_empty());

    let store = db.read().await;
    if store.sess_keys.get(sess_key).map(String::as_str) != Some(user_id) || user_code != user_id {
        return Err(nok("ERR_BAD_SESSKEY", "invalid sesskey"));
    }

    let books: Vec<&Book> = store
        .books
        .iter()
        .filter(|b| b.owner == user_id)
        .filter(|b| since.is_none_or(|stamp| b.sstamp > stamp))
        .filter(|b| book_code.is_none_or(|code| &b.code == code))
        .filter(|b| book_owner.is_none_or(|owner| &b.owner == owner))
        .collect();
    let sstamp = store.books.iter().map(|b| b.sstamp).max().unwrap_or(0);

    Ok(json!({
        "status": "ok",
        "sstamp": sstamp,
        "allBooks": {
            "nbBooks": books.len(),
            "nbContacts": 0,
            "contacts": [],
            "books": books.iter().map(|b| b.to_wire()).collect::<Vec<_>>()
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_wire_shape_carries_owner_prefs() {
        let book = Book {
            code: "b1".to_string(),
            owner: "u1".to_string(),
            title: "Test".to_string(),
            cover: None,
            sstamp: 5,
        };
        let json = book.to_wire();
        assert_eq!(json["b_c"], "b1");
        assert_eq!(json["b_o"], "u1");
        assert_eq!(json["ownerPrefs"]["title"], "Test");
        assert!(json["ownerPrefs"]["oCoverImg"].is_null());
    }

    #[test]
    fn nok_has_error_fields() {
        let json = nok("E1", "bad credentials");
        assert_eq!(json["status"], "nok");
        assert_eq!(json["errorCode"], "E1");
        assert_eq!(json["errorMsg"], "bad credentials");
    }

    #[test]
    fn required_rejects_missing_and_empty() {
        let mut params = Params::new();
        params.insert("login".to_string(), String::new());
        assert!(required(&params, "login").is_err());
        assert!(required(&params, "pwd").is_err());
        params.insert("pwd".to_string(), "x".to_string());
        assert_eq!(required(&params, "pwd").unwrap(), "x");
    }

    #[test]
    fn demo_store_has_one_account_and_three_books() {
        let store = Store::demo();
        assert_eq!(store.accounts.len(), 1);
        assert_eq!(store.books.len(), 3);
    }
}
