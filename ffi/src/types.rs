//! C-layout mirrors of the core request, response and result values.
//!
//! Strings cross as NUL-terminated `*mut c_char` owned by this library,
//! sequences as a pointer plus a `u32` length, and every enum carries fixed
//! discriminants so the generated header stays stable. The constructors
//! below do all the heap work; `lib.rs` only validates arguments and
//! dispatches.

use std::ffi::CString;
use std::os::raw::c_char;

use booklist_core::error::ApiError;
use booklist_core::http::HttpMethod;
use booklist_core::state::FieldError;
use booklist_core::types::{BookItem, OauthKeyResponse};

/// Opaque handle to a `TimetonicClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiBooklistClient {
    pub(crate) inner: booklist_core::TimetonicClient,
}

/// Move a Rust string onto the C heap. Interior NULs yield an empty string.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    CString::new(s.into()).unwrap_or_default().into_raw()
}

fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), c_string)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `booklist_build_*` functions. The C caller executes the request
/// and passes the response back through `booklist_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: booklist_core::HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            // Exact capacity so the free side can rebuild the Vec from len.
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: c_string_opt(req.body),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `booklist_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiBooklistResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// The server answered `status: "nok"`; see `server_error_code`.
    Rejected = 1,
    Http = 2,
    Deserialization = 3,
    Serialization = 4,
    Transport = 5,
    Session = 6,
    Panic = 7,
    NullArg = 8,
}

/// Tag that tells `booklist_free_result` what `FfiBooklistResult::data` points to.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiKey` (app key or session key).
    Key = 1,
    OauthKey = 2,
    BookList = 3,
}

/// A single credential; `value` is null if the server omitted it.
#[repr(C)]
pub struct FfiKey {
    pub value: *mut c_char,
}

#[repr(C)]
pub struct FfiOauthKey {
    pub oauth_key: *mut c_char,
    pub oauth_user_id: *mut c_char,
}

/// A book as the list screen shows it. `image_url` may be null.
#[repr(C)]
pub struct FfiBook {
    pub title: *mut c_char,
    pub image_url: *mut c_char,
}

/// A list of books. `server_stamp` is 0 when the server sent none.
#[repr(C)]
pub struct FfiBookList {
    pub items: *mut FfiBook,
    pub len: u32,
    pub server_stamp: i64,
}

/// Result of a client-side form check.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiFieldError {
    None = 0,
    EmptyEmail = 1,
    InvalidEmail = 2,
    EmptyPassword = 3,
}

impl From<Option<FieldError>> for FfiFieldError {
    fn from(err: Option<FieldError>) -> Self {
        match err {
            None => FfiFieldError::None,
            Some(FieldError::EmptyEmail) => FfiFieldError::EmptyEmail,
            Some(FieldError::InvalidEmail) => FfiFieldError::InvalidEmail,
            Some(FieldError::EmptyPassword) => FfiFieldError::EmptyPassword,
        }
    }
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null. For `Rejected`,
/// `server_error_code` holds the server's `errorCode`.
#[repr(C)]
pub struct FfiBooklistResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub server_error_code: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiBooklistResult {
    fn ok(data_tag: FfiDataTag, data: *mut std::ffi::c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiBooklistResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            server_error_code: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn failure(error_code: FfiErrorCode, message: String, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiBooklistResult {
            error_code,
            error_message: c_string(message),
            server_error_code: std::ptr::null_mut(),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build a success result carrying a single key.
    pub(crate) fn ok_key(key: Option<String>) -> *mut Self {
        let ffi_key = Box::new(FfiKey {
            value: c_string_opt(key),
        });
        Self::ok(FfiDataTag::Key, Box::into_raw(ffi_key) as *mut std::ffi::c_void)
    }

    pub(crate) fn ok_oauth_key(resp: OauthKeyResponse) -> *mut Self {
        let ffi_oauth = Box::new(FfiOauthKey {
            oauth_key: c_string_opt(resp.oauth_key),
            oauth_user_id: c_string_opt(resp.oauth_user_id),
        });
        Self::ok(
            FfiDataTag::OauthKey,
            Box::into_raw(ffi_oauth) as *mut std::ffi::c_void,
        )
    }

    /// Build a success result carrying an `FfiBookList`.
    pub(crate) fn ok_book_list(books: Vec<BookItem>, server_stamp: Option<i64>) -> *mut Self {
        let len = books.len() as u32;
        let items = if books.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_books: Vec<FfiBook> = books
                .into_iter()
                .map(|b| FfiBook {
                    title: c_string(b.title),
                    image_url: c_string_opt(b.image_url),
                })
                .collect();
            Box::into_raw(ffi_books.into_boxed_slice()) as *mut FfiBook
        };

        let ffi_list = Box::new(FfiBookList {
            items,
            len,
            server_stamp: server_stamp.unwrap_or(0),
        });
        Self::ok(
            FfiDataTag::BookList,
            Box::into_raw(ffi_list) as *mut std::ffi::c_void,
        )
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let msg = err.to_string();
        match err {
            ApiError::Rejected { code, .. } => {
                let result = Self::failure(FfiErrorCode::Rejected, msg, 200);
                unsafe { (*result).server_error_code = c_string(code) };
                result
            }
            ApiError::HttpError { status, .. } => Self::failure(FfiErrorCode::Http, msg, status),
            ApiError::DeserializationError(_) => {
                Self::failure(FfiErrorCode::Deserialization, msg, 0)
            }
            ApiError::SerializationError(_) => Self::failure(FfiErrorCode::Serialization, msg, 0),
            ApiError::Transport(_) | ApiError::Timeout => {
                Self::failure(FfiErrorCode::Transport, msg, 0)
            }
            ApiError::Session(_) => Self::failure(FfiErrorCode::Session, msg, 0),
        }
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"), 0)
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string(), 0)
    }
}
