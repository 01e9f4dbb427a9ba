use hyper::header::HeaderValue;

use super::*;

fn table() -> TokenTable {
    TokenTable::from_pairs([("s3cret", "alice"), ("other", "bob")])
}

fn headers(auth: Option<&'static str>) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Some(v) = auth {
        h.insert(AUTHORIZATION, HeaderValue::from_static(v));
    }
    h
}

#[test]
fn bearer_token_resolves_user() {
    let t = table();
    assert_eq!(t.authenticate(&headers(Some("Bearer s3cret"))), Ok("alice"));
    assert_eq!(t.authenticate(&headers(Some("Bearer other"))), Ok("bob"));
}

#[test]
fn missing_and_malformed_headers() {
    let t = table();
    assert_eq!(t.authenticate(&headers(None)), Err(AuthError::Missing));
    let malformed = [
        "s3cret",
        "Basic s3cret",
        "Bearer",
        "Bearer a b",
        "bearer s3cret",
        "Bearer ",
    ];
    for bad in malformed {
        assert_eq!(
            t.authenticate(&headers(Some(bad))),
            Err(AuthError::Malformed),
            "{bad}"
        );
    }
}

#[test]
fn unknown_token_is_rejected() {
    assert_eq!(
        table().authenticate(&headers(Some("Bearer nope"))),
        Err(AuthError::UnknownToken)
    );
}

#[test]
fn messages_match_api_contract() {
    assert_eq!(
        AuthError::Missing.to_string(),
        "Missing Authorization header"
    );
    assert_eq!(
        AuthError::Malformed.to_string(),
        "Invalid Authorization header format"
    );
    assert_eq!(
        AuthError::UnknownToken.to_string(),
        "Invalid authentication token"
    );
}

#[test]
fn tokens_file_round_trip() {
    let dir = std::path::PathBuf::from("target").join("auth_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tokens.json");
    std::fs::write(&path, r#"{ "abc": "carol" }"#).unwrap();

    let t = TokenTable::from_path(&path).unwrap();
    assert!(!t.is_empty());
    assert_eq!(t.authenticate(&headers(Some("Bearer abc"))), Ok("carol"));

    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(TokenTable::from_path(&path).is_err());
    assert!(TokenTable::from_path(&dir.join("absent.json")).is_err());
}
