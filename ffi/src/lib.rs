//! C-ABI wrapper around `booklist-core`.
//!
//! # Overview
//! Exposes the Timetonic key handshake and the book listing through
//! `extern "C"` functions so a mobile host (or anything else with a C FFI)
//! can build requests, run them with its own HTTP stack, and hand the
//! responses back for parsing.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core client 1:1.
//! - A single `FfiBooklistResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - Persisting keys is the host's job; the library keeps no session state.
//! - The C caller owns all returned pointers and must call the matching
//!   `booklist_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use booklist_core::http::HttpResponse;
use booklist_core::state::login::{validate_email, validate_password};
use booklist_core::types::{GetAllBooksParams, LogInParams};
use booklist_core::TimetonicClient;

use types::*;

/// Borrow a C string argument. Null becomes `None`; invalid UTF-8 becomes "".
fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or(""))
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`, declaring `app_name` and
/// `version` to the server.
///
/// Returns null if any argument is null or if an internal panic occurs.
/// The caller must free the returned pointer with `booklist_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_client_new(
    base_url: *const c_char,
    app_name: *const c_char,
    version: *const c_char,
) -> *mut FfiBooklistClient {
    catch_unwind(|| {
        let (Some(url), Some(app), Some(version)) =
            (str_arg(base_url), str_arg(app_name), str_arg(version))
        else {
            return std::ptr::null_mut();
        };
        let client = TimetonicClient::new(url, app, version);
        Box::into_raw(Box::new(FfiBooklistClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `booklist_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_client_free(client: *mut FfiBooklistClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the `createAppkey` request.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `booklist_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_build_create_app_key(
    client: *const FfiBooklistClient,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.inner.build_create_app_key() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the `createOauthkey` request from the user's credentials and the
/// app key returned by the previous step.
///
/// Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_build_create_oauth_key(
    client: *const FfiBooklistClient,
    login: *const c_char,
    password: *const c_char,
    app_key: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(login), Some(password), Some(app_key)) =
            (str_arg(login), str_arg(password), str_arg(app_key))
        else {
            return std::ptr::null_mut();
        };
        let params = LogInParams {
            login: login.to_string(),
            password: password.to_string(),
        };
        match client.inner.build_create_oauth_key(&params, app_key) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the `createSesskey` request.
///
/// Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_build_create_sess_key(
    client: *const FfiBooklistClient,
    oauth_user_id: *const c_char,
    oauth_key: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(user_id), Some(oauth_key)) = (str_arg(oauth_user_id), str_arg(oauth_key)) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_create_sess_key(user_id, oauth_key) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the `getAllBooks` request.
///
/// `server_stamp`, `book_code` and `book_owner` are optional filters; pass
/// null to leave them out of the query. Returns null if `client`,
/// `oauth_user_id` or `sess_key` is null.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_build_get_all_books(
    client: *const FfiBooklistClient,
    oauth_user_id: *const c_char,
    sess_key: *const c_char,
    server_stamp: *const c_char,
    book_code: *const c_char,
    book_owner: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(user_id), Some(sess_key)) = (str_arg(oauth_user_id), str_arg(sess_key)) else {
            return std::ptr::null_mut();
        };
        let filter = GetAllBooksParams {
            server_stamp: str_arg(server_stamp).map(str::to_string),
            book_code: str_arg(book_code).map(str::to_string),
            book_owner: str_arg(book_owner).map(str::to_string),
        };
        match client.inner.build_get_all_books(user_id, sess_key, &filter) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as an empty one.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: str_arg(resp.body).unwrap_or("").to_string(),
    }
}

/// Shared prologue of every `booklist_parse_*`: null checks, conversion and
/// panic containment.
fn parse_with<F>(
    name: &'static str,
    client: *const FfiBooklistClient,
    response: *const FfiHttpResponse,
    parse: F,
) -> *mut FfiBooklistResult
where
    F: FnOnce(&TimetonicClient, HttpResponse) -> *mut FfiBooklistResult + UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return FfiBooklistResult::null_arg("client");
        }
        if response.is_null() {
            return FfiBooklistResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        parse(&client.inner, ffi_response_to_core(resp))
    })
    .unwrap_or_else(|_| FfiBooklistResult::panic(&format!("panic in {name}")))
}

/// Parse a `createAppkey` response.
///
/// Returns a result with `data_tag = Key` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_parse_create_app_key(
    client: *const FfiBooklistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBooklistResult {
    parse_with("booklist_parse_create_app_key", client, response, |c, resp| {
        match c.parse_create_app_key(resp) {
            Ok(r) => FfiBooklistResult::ok_key(r.app_key),
            Err(e) => FfiBooklistResult::from_error(e),
        }
    })
}

/// Parse a `createOauthkey` response.
///
/// Returns a result with `data_tag = OauthKey` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_parse_create_oauth_key(
    client: *const FfiBooklistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBooklistResult {
    parse_with("booklist_parse_create_oauth_key", client, response, |c, resp| {
        match c.parse_create_oauth_key(resp) {
            Ok(r) => FfiBooklistResult::ok_oauth_key(r),
            Err(e) => FfiBooklistResult::from_error(e),
        }
    })
}

/// Parse a `createSesskey` response.
///
/// Returns a result with `data_tag = Key` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_parse_create_sess_key(
    client: *const FfiBooklistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBooklistResult {
    parse_with("booklist_parse_create_sess_key", client, response, |c, resp| {
        match c.parse_create_sess_key(resp) {
            Ok(r) => FfiBooklistResult::ok_key(r.sess_key),
            Err(e) => FfiBooklistResult::from_error(e),
        }
    })
}

/// Parse a `getAllBooks` response into display items (title plus absolute
/// cover URL).
///
/// Returns a result with `data_tag = BookList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_parse_get_all_books(
    client: *const FfiBooklistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBooklistResult {
    parse_with("booklist_parse_get_all_books", client, response, |c, resp| {
        match c.parse_get_all_books(resp) {
            Ok(r) => FfiBooklistResult::ok_book_list(c.book_items(&r), r.sstamp),
            Err(e) => FfiBooklistResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Form validation
// ---------------------------------------------------------------------------

/// Check an email the way the login screen does. Null counts as empty.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_validate_email(email: *const c_char) -> FfiFieldError {
    catch_unwind(|| FfiFieldError::from(validate_email(str_arg(email).unwrap_or(""))))
        .unwrap_or(FfiFieldError::InvalidEmail)
}

/// Check a password the way the login screen does. Null counts as empty.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_validate_password(password: *const c_char) -> FfiFieldError {
    catch_unwind(|| FfiFieldError::from(validate_password(str_arg(password).unwrap_or(""))))
        .unwrap_or(FfiFieldError::EmptyPassword)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free an `FfiHttpRequest` returned by any `booklist_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Vec::from_raw_parts(req.headers, req.headers_len as usize, req.headers_len as usize)
            };
            for h in headers {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiBooklistResult` returned by any `booklist_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_free_result(result: *mut FfiBooklistResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.server_error_code);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Key => {
                let key = unsafe { Box::from_raw(result.data as *mut FfiKey) };
                free_c_string(key.value);
            }
            FfiDataTag::OauthKey => {
                let oauth = unsafe { Box::from_raw(result.data as *mut FfiOauthKey) };
                free_c_string(oauth.oauth_key);
                free_c_string(oauth.oauth_user_id);
            }
            FfiDataTag::BookList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiBookList) };
                if !list.items.is_null() && list.len > 0 {
                    let items = unsafe {
                        Vec::from_raw_parts(list.items, list.len as usize, list.len as usize)
                    };
                    for item in items {
                        free_c_string(item.title);
                        free_c_string(item.image_url);
                    }
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn booklist_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
