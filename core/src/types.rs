//! Wire DTOs for the Timetonic API and the display-level projections.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any schema drift between the two crates.
//!
//! Every response shares the `status` / `errorCode` / `errorMsg` envelope,
//! captured once in [`Outcome`] and flattened into each payload. The book
//! record is far richer than what the list screen needs, so everything below
//! `Book` decodes leniently: a missing field and an explicit `null` both
//! fall back to the field's default.

use serde::{Deserialize, Deserializer, Serialize};

/// Application-level verdict carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Nok,
}

/// The envelope shared by all responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            error_code: None,
            error_msg: None,
        }
    }
}

/// Implemented by every response payload so result mapping can be written once.
pub trait Envelope {
    fn outcome(&self) -> &Outcome;
}

macro_rules! impl_envelope {
    ($($ty:ty),+ $(,)?) => {
        $(impl Envelope for $ty {
            fn outcome(&self) -> &Outcome {
                &self.outcome
            }
        })+
    };
}

impl_envelope!(AppKeyResponse, OauthKeyResponse, SessKeyResponse, AllBooksResponse);

// ---------------------------------------------------------------------------
// Handshake responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppKeyResponse {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(rename = "appkey", default)]
    pub app_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OauthKeyResponse {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(rename = "oauthkey", default)]
    pub oauth_key: Option<String>,
    #[serde(rename = "o_u", default)]
    pub oauth_user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessKeyResponse {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(rename = "sesskey", default)]
    pub sess_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Book listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllBooksResponse {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(default)]
    pub sstamp: Option<i64>,
    #[serde(rename = "allBooks", default)]
    pub all_books: Option<AllBooks>,
}

/// Decode an explicit `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllBooks {
    #[serde(deserialize_with = "null_as_default")]
    pub nb_books: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub nb_contacts: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub contacts: Vec<Contact>,
    #[serde(deserialize_with = "null_as_default")]
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    #[serde(rename = "u_c", deserialize_with = "null_as_default")]
    pub user_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sstamp: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_confirmed: bool,
}

/// A book as the server describes it. Only `owner_prefs` feeds the list
/// screen; the rest is kept so nothing the server sends is silently lost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Book {
    #[serde(deserialize_with = "null_as_default")]
    pub accepted: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub archived: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sstamp: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub del: bool,
    #[serde(rename = "b_c", deserialize_with = "null_as_default")]
    pub book_code: String,
    #[serde(rename = "b_o", deserialize_with = "null_as_default")]
    pub book_owner: String,
    #[serde(rename = "contact_u_c")]
    pub contact_user_code: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub nb_not_read: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub nb_members: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub members: Vec<Member>,
    pub fp_form: Option<FpForm>,
    pub last_msg: Option<LastMsg>,
    pub user_prefs: Option<UserPrefs>,
    #[serde(deserialize_with = "null_as_default")]
    pub owner_prefs: OwnerPrefs,
    #[serde(deserialize_with = "null_as_default")]
    pub sbid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub last_msg_read: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub last_media: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub favorite: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    #[serde(rename = "u_c", deserialize_with = "null_as_default")]
    pub user_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub invite: String,
    #[serde(deserialize_with = "null_as_default")]
    pub right: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FpForm {
    #[serde(deserialize_with = "null_as_default")]
    pub sfpid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_modified: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LastMsg {
    #[serde(deserialize_with = "null_as_default")]
    pub smid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sstamp: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub last_comment_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub msg_body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub msg_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub msg_method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub nb_comments: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub nb_medias: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub nb_docs: u32,
    #[serde(rename = "b_c", deserialize_with = "null_as_default")]
    pub book_code: String,
    #[serde(rename = "b_o", deserialize_with = "null_as_default")]
    pub book_owner: String,
    #[serde(rename = "u_c", deserialize_with = "null_as_default")]
    pub user_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(deserialize_with = "null_as_default")]
    pub del: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub created: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub last_modified: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub medias: Vec<Media>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Media {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub ext: String,
    #[serde(deserialize_with = "null_as_default")]
    pub origin_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub intern_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub size: i64,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub media_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email_cid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub del: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPrefs {
    #[serde(deserialize_with = "null_as_default")]
    pub max_msgs_offline: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub sync_with_hubic: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub u_cover_let_owner_decide: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub u_cover_color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub u_cover_use_last_img: bool,
    pub u_cover_img: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub u_cover_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub in_global_search: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub in_global_tasks: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub notify_email_copy: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub notify_sms_copy: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub notify_mobile: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub notify_when_msg_in_archived_book: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerPrefs {
    #[serde(deserialize_with = "null_as_default")]
    pub o_cover_color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub o_cover_use_last_img: bool,
    pub o_cover_img: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub o_cover_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub authorize_member_broadcast: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub accept_external_msg: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub notify_mobile_confidential: bool,
}

// ---------------------------------------------------------------------------
// Requests and projections
// ---------------------------------------------------------------------------

/// Credentials typed by the user on the login screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInParams {
    pub login: String,
    pub password: String,
}

/// Optional filters for an incremental or targeted book fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllBooksParams {
    pub server_stamp: Option<String>,
    pub book_code: Option<String>,
    pub book_owner: Option<String>,
}

/// A book as the list screen shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookItem {
    pub title: String,
    pub image_url: Option<String>,
}

/// Snapshot of the four persisted credentials. Empty strings mean "not yet
/// obtained".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub app_key: String,
    pub oauth_key: String,
    pub oauth_user_id: String,
    pub sess_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_key_response_reads_flattened_envelope() {
        let resp: AppKeyResponse =
            serde_json::from_str(r#"{"status":"ok","appkey":"ak-1"}"#).unwrap();
        assert_eq!(resp.outcome, Outcome::ok());
        assert_eq!(resp.app_key.as_deref(), Some("ak-1"));
    }

    #[test]
    fn nok_response_keeps_error_fields() {
        let resp: OauthKeyResponse = serde_json::from_str(
            r#"{"status":"nok","errorCode":"E1","errorMsg":"bad credentials"}"#,
        )
        .unwrap();
        assert_eq!(resp.outcome.status, Status::Nok);
        assert_eq!(resp.outcome.error_code.as_deref(), Some("E1"));
        assert!(resp.oauth_key.is_none());
        assert!(resp.oauth_user_id.is_none());
    }

    #[test]
    fn all_books_null_decodes_as_none() {
        let resp: AllBooksResponse =
            serde_json::from_str(r#"{"status":"ok","allBooks":null}"#).unwrap();
        assert!(resp.all_books.is_none());
        assert!(resp.sstamp.is_none());
    }

    #[test]
    fn sparse_book_decodes_with_defaults() {
        let book: Book = serde_json::from_str(
            r#"{"b_c":"book-1","b_o":"alice","ownerPrefs":{"title":"Recipes","oCoverImg":"/img/1.png"}}"#,
        )
        .unwrap();
        assert_eq!(book.book_code, "book-1");
        assert_eq!(book.book_owner, "alice");
        assert_eq!(book.owner_prefs.title, "Recipes");
        assert_eq!(book.owner_prefs.o_cover_img.as_deref(), Some("/img/1.png"));
        assert!(book.members.is_empty());
        assert!(book.last_msg.is_none());
    }

    #[test]
    fn nulls_in_unused_book_fields_decode_as_defaults() {
        let resp: AllBooksResponse = serde_json::from_str(
            r#"{"status":"ok","allBooks":{"nbBooks":1,"contacts":null,"books":[
                {"b_c":"b1","b_o":"u","members":null,"sstamp":null,
                 "ownerPrefs":{"title":"A","oCoverImg":null,"oCoverColor":null,"oCoverType":null},
                 "lastMsg":{"msgBody":null,"medias":null,"nbComments":null},
                 "userPrefs":{"uCoverColor":null,"uCoverImg":null}}]}}"#,
        )
        .unwrap();
        let listing = resp.all_books.unwrap();
        assert!(listing.contacts.is_empty());
        let book = &listing.books[0];
        assert_eq!(book.owner_prefs.title, "A");
        assert_eq!(book.owner_prefs.o_cover_color, "");
        assert!(book.owner_prefs.o_cover_img.is_none());
        assert!(book.members.is_empty());
        assert_eq!(book.sstamp, 0);
        let last_msg = book.last_msg.as_ref().unwrap();
        assert_eq!(last_msg.msg_body, "");
        assert!(last_msg.medias.is_empty());
        assert_eq!(book.user_prefs.as_ref().unwrap().u_cover_color, "");
    }

    #[test]
    fn null_owner_prefs_decodes_as_untitled() {
        let book: Book =
            serde_json::from_str(r#"{"b_c":"b1","b_o":"u","ownerPrefs":null}"#).unwrap();
        assert_eq!(book.owner_prefs, OwnerPrefs::default());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: Result<SessKeyResponse, _> = serde_json::from_str(r#"{"status":"maybe"}"#);
        assert!(result.is_err());
    }
}
