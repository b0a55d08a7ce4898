//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Query strings are compared as decoded maps so
//! parameter order and percent-encoding choices do not cause false negatives.

use std::collections::BTreeMap;

use booklist_core::{
    ApiError, BookItem, GetAllBooksParams, HttpMethod, HttpRequest, HttpResponse, LogInParams,
    TimetonicClient,
};
use pretty_assertions::assert_eq;
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> TimetonicClient {
    TimetonicClient::new(BASE_URL, "android", "6.49q/6.49")
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

/// Compare a built request with the vector's `expected_request`.
fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(
        req.method,
        parse_method(expected["method"].as_str().unwrap()),
        "{name}: method"
    );
    assert!(req.body.is_none(), "{name}: body should be None");

    let (path, query) = req.url.split_once('?').expect("url carries a query");
    assert_eq!(
        path,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: path"
    );

    let actual: BTreeMap<String, String> = serde_urlencoded::from_str(query).unwrap();
    let wanted: BTreeMap<String, String> =
        serde_json::from_value(expected["query"].clone()).unwrap();
    assert_eq!(actual, wanted, "{name}: query");
}

fn simulated_response(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Compare a parse failure with the vector's `expected_error`.
fn check_error(name: &str, err: ApiError, expected: &Value) {
    match expected["kind"].as_str().unwrap() {
        "Rejected" => assert!(matches!(err, ApiError::Rejected { .. }), "{name}: expected Rejected"),
        "HttpError" => assert!(matches!(err, ApiError::HttpError { .. }), "{name}: expected HttpError"),
        other => panic!("{name}: unknown expected_error: {other}"),
    }
    assert_eq!(err.to_string(), expected["display"].as_str().unwrap(), "{name}: display");
}

// ---------------------------------------------------------------------------
// createAppkey
// ---------------------------------------------------------------------------

#[test]
fn app_key_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/app_key.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_create_app_key().unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_app_key(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
        } else {
            let parsed = result.unwrap();
            let expected = case["expected_result"]["app_key"].as_str().map(str::to_string);
            assert_eq!(parsed.app_key, expected, "{name}: app key");
        }
    }
}

// ---------------------------------------------------------------------------
// createOauthkey
// ---------------------------------------------------------------------------

#[test]
fn oauth_key_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/oauth_key.json")) {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let params = LogInParams {
            login: input["login"].as_str().unwrap().to_string(),
            password: input["password"].as_str().unwrap().to_string(),
        };

        let req = c
            .build_create_oauth_key(&params, input["app_key"].as_str().unwrap())
            .unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_oauth_key(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
        } else {
            let parsed = result.unwrap();
            let expected = &case["expected_result"];
            assert_eq!(parsed.oauth_key.as_deref(), expected["oauth_key"].as_str(), "{name}");
            assert_eq!(
                parsed.oauth_user_id.as_deref(),
                expected["oauth_user_id"].as_str(),
                "{name}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// createSesskey
// ---------------------------------------------------------------------------

#[test]
fn sess_key_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/sess_key.json")) {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];

        let req = c
            .build_create_sess_key(
                input["oauth_user_id"].as_str().unwrap(),
                input["oauth_key"].as_str().unwrap(),
            )
            .unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_sess_key(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
        } else {
            let parsed = result.unwrap();
            assert_eq!(
                parsed.sess_key.as_deref(),
                case["expected_result"]["sess_key"].as_str(),
                "{name}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// getAllBooks
// ---------------------------------------------------------------------------

#[test]
fn all_books_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/all_books.json")) {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let filter: GetAllBooksParams = serde_json::from_value(input["filter"].clone()).unwrap();

        let req = c
            .build_get_all_books(
                input["oauth_user_id"].as_str().unwrap(),
                input["sess_key"].as_str().unwrap(),
                &filter,
            )
            .unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_get_all_books(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
        } else {
            let parsed = result.unwrap();
            let expected = &case["expected_result"];
            assert_eq!(parsed.sstamp, expected["sstamp"].as_i64(), "{name}: sstamp");

            let items: Vec<BookItem> = serde_json::from_value(expected["items"].clone()).unwrap();
            assert_eq!(c.book_items(&parsed), items, "{name}: items");
        }
    }
}
