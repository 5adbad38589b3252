use std::sync::Arc;

use super::*;
use crate::error::PatternError;

fn compile(template: &str, options: &RegexOptions) -> CompiledPattern {
    tokens_to_regex(&parse(template, &options.parse_options()), options).unwrap()
}

fn match_once(uri: &str, pattern: RoutePattern) -> Option<MatchResult> {
    PatternCache::new(16).match_path(uri, &pattern).unwrap()
}

#[test]
fn test_parse_named_segment() {
    let tokens = parse("/users/:id", &ParseOptions::default());
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0], Token::Literal("/users".to_string()));
    let key = tokens[1].as_key().unwrap();
    assert_eq!(key.name, ParamName::from("id"));
    assert_eq!(key.prefix, "/");
    assert_eq!(key.delimiter, "/");
    assert_eq!(key.pattern, "[^/]+?");
    assert!(!key.optional && !key.repeat && !key.partial);
}

#[test]
fn test_parse_empty_template() {
    assert!(parse("", &ParseOptions::default()).is_empty());
}

#[test]
fn test_parse_trailing_literal() {
    let tokens = parse("/:id/edit", &ParseOptions::default());
    assert_eq!(tokens.last(), Some(&Token::Literal("/edit".to_string())));
}

#[test]
fn test_parse_unnamed_groups_are_numbered() {
    let tokens = parse("/(\\d+)/(\\w+)", &ParseOptions::default());
    let names: Vec<_> = tokens.iter().filter_map(Token::as_key).map(|k| k.name.clone()).collect();
    assert_eq!(names, vec![ParamName::Index(0), ParamName::Index(1)]);
}

#[test]
fn test_parse_escaped_delimiter_is_not_a_prefix() {
    let tokens = parse("/file\\.:ext", &ParseOptions::default());
    assert_eq!(tokens[0], Token::Literal("/file.".to_string()));
    let key = tokens[1].as_key().unwrap();
    assert_eq!(key.prefix, "");
    assert_eq!(key.delimiter, "/");
}

#[test]
fn test_parse_partial_flag() {
    let tokens = parse("/:foo?-bar", &ParseOptions::default());
    let key = tokens[0].as_key().unwrap();
    assert!(key.partial);
    assert!(key.optional);
}

#[test]
fn test_regex_for_named_segment() {
    let compiled = compile("/users/:id", &RegexOptions::default());
    assert_eq!(compiled.as_str(), "(?i)^/users/([^/]+?)(?:/)?$");
    assert_eq!(compiled.keys().len(), 1);
}

#[test]
fn test_regex_strict_and_sensitive() {
    let options = RegexOptions {
        strict: true,
        sensitive: true,
        ..RegexOptions::default()
    };
    let compiled = compile("/users/:id", &options);
    assert_eq!(compiled.as_str(), "^/users/([^/]+?)$");
}

#[test]
fn test_regex_non_end_adds_delimiter_lookahead() {
    let options = RegexOptions {
        end: false,
        ..RegexOptions::default()
    };
    let compiled = compile("/users", &options);
    assert_eq!(compiled.as_str(), "(?i)^/users(?:/(?=$))?(?=/|$)");
    assert!(compiled.regex().is_match("/users/42").unwrap());
    assert!(!compiled.regex().is_match("/usersx").unwrap());
}

#[test]
fn test_regex_ends_with() {
    let options = RegexOptions {
        ends_with: vec!["?".to_string()],
        ..RegexOptions::default()
    };
    let compiled = compile("/test", &options);
    assert_eq!(compiled.as_str(), "(?i)^/test(?:/)?(?=\\?|$)");
    let caps = compiled.regex().captures("/test?q=1").unwrap().unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "/test");
}

#[test]
fn test_regex_ends_with_without_end_anchor() {
    let options = RegexOptions {
        end: false,
        ends_with: vec!["?".to_string()],
        ..RegexOptions::default()
    };
    let compiled = compile("/test", &options);
    assert_eq!(compiled.as_str(), "(?i)^/test(?:/(?=\\?|$))?(?=/|\\?|$)");
    let caps = compiled.regex().captures("/test?q=1").unwrap().unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "/test");
    let caps = compiled.regex().captures("/test/?q=1").unwrap().unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "/test/");
    assert!(compiled.regex().is_match("/test/nested").unwrap());
    assert!(!compiled.regex().is_match("/testing").unwrap());
}

#[test]
fn test_regex_without_start_anchor() {
    let options = RegexOptions {
        start: false,
        ..RegexOptions::default()
    };
    let compiled = compile("/users/:id", &options);
    assert_eq!(compiled.as_str(), "(?i)/users/([^/]+?)(?:/)?$");
    let caps = compiled.regex().captures("/api/users/42").unwrap().unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "/users/42");
    assert_eq!(caps.get(1).unwrap().as_str(), "42");
    assert!(!compiled.regex().is_match("/users/42/posts").unwrap());
}

#[test]
fn test_regex_empty_tokens() {
    let compiled = tokens_to_regex(&[], &RegexOptions::default()).unwrap();
    assert!(compiled.regex().is_match("").unwrap());
    assert!(compiled.regex().is_match("/").unwrap());
    assert!(!compiled.regex().is_match("/a").unwrap());
}

#[test]
fn test_invalid_capture_is_reported() {
    let err = path_to_regex(&PatternSource::from("/:id([a-)"), &RegexOptions::default()).unwrap_err();
    assert!(matches!(err, PatternError::InvalidRegex { .. }));
}

#[test]
fn test_path_array_compiles_to_alternation() {
    let source = PatternSource::from(vec!["/a/:x".to_string(), "/b/:y".to_string()]);
    let compiled = path_to_regex(&source, &RegexOptions::default()).unwrap();
    let names: Vec<_> = compiled.keys().iter().map(|k| k.name.to_string()).collect();
    assert_eq!(names, vec!["x", "y"]);

    let caps = compiled.regex().captures("/b/2").unwrap().unwrap();
    assert!(caps.get(1).is_none());
    assert_eq!(caps.get(2).unwrap().as_str(), "2");
}

#[test]
fn test_prebuilt_regex_passthrough() {
    let regex = fancy_regex::Regex::new(r"^/(\d+)/(\w+)$").unwrap();
    let compiled = path_to_regex(&PatternSource::from(regex), &RegexOptions::default()).unwrap();
    assert_eq!(compiled.as_str(), r"^/(\d+)/(\w+)$");
    assert_eq!(compiled.keys()[0].name, ParamName::Index(0));
    assert_eq!(compiled.keys()[1].name, ParamName::Index(1));
}

#[test]
fn test_match_exact_extracts_params() {
    let found = match_once("/users/42", RoutePattern::new("/users/:id").exact(true)).unwrap();
    assert_eq!(found.get("id"), Some("42"));
    assert!(found.is_exact);
    assert_eq!(found.url, "/users/42");
    assert_eq!(found.path, "/users/:id");
}

#[test]
fn test_match_strict_rejects_trailing_slash() {
    let pattern = RoutePattern::new("/users/:id").exact(true).strict(true);
    assert!(match_once("/users/42/", pattern).is_none());
}

#[test]
fn test_match_tolerates_trailing_slash_when_not_strict() {
    let found = match_once("/users/42/", RoutePattern::new("/users/:id").exact(true)).unwrap();
    assert_eq!(found.get("id"), Some("42"));
}

#[test]
fn test_match_prefix_is_not_exact() {
    let found = match_once("/users/42", RoutePattern::new("/users")).unwrap();
    assert_eq!(found.url, "/users");
    assert!(!found.is_exact);
    assert!(match_once("/users/42", RoutePattern::new("/users").exact(true)).is_none());
}

#[test]
fn test_match_root_prefix() {
    let found = match_once("/anything", RoutePattern::new("/")).unwrap();
    assert_eq!(found.url, "/");
    assert!(!found.is_exact);
}

#[test]
fn test_match_case_sensitivity() {
    assert!(match_once("/USERS", RoutePattern::new("/users").exact(true)).is_some());
    assert!(match_once("/USERS", RoutePattern::new("/users").exact(true).sensitive(true)).is_none());
}

#[test]
fn test_match_optional_segment() {
    let pattern = RoutePattern::new("/:foo/:bar?").exact(true);
    let found = match_once("/a", pattern.clone()).unwrap();
    assert_eq!(found.get("foo"), Some("a"));
    assert_eq!(found.get("bar"), None);
    assert_eq!(found.params.len(), 2);
    assert_eq!(found.params_map().len(), 1);

    let found = match_once("/a/b", pattern).unwrap();
    assert_eq!(found.get("bar"), Some("b"));
}

#[test]
fn test_match_partial_optional_segment() {
    let pattern = RoutePattern::new("/:foo?-bar").exact(true);
    assert_eq!(match_once("/x-bar", pattern.clone()).unwrap().get("foo"), Some("x"));
    assert_eq!(match_once("/-bar", pattern).unwrap().get("foo"), None);
}

#[test]
fn test_match_repeat_segment() {
    let pattern = RoutePattern::new("/files/:path+").exact(true);
    let found = match_once("/files/a/b/c", pattern.clone()).unwrap();
    assert_eq!(found.get("path"), Some("a/b/c"));
    assert!(match_once("/files", pattern).is_none());

    let optional = RoutePattern::new("/files/:path*").exact(true);
    let found = match_once("/files", optional).unwrap();
    assert_eq!(found.get("path"), None);
}

#[test]
fn test_match_custom_and_unnamed_captures() {
    let pattern = RoutePattern::new("/items/:id(\\d+)").exact(true);
    assert!(match_once("/items/12", pattern.clone()).is_some());
    assert!(match_once("/items/ab", pattern).is_none());

    let found = match_once("/files/7", RoutePattern::new("/files/(\\d+)").exact(true)).unwrap();
    assert_eq!(found.get_index(0), Some("7"));
    assert_eq!(found.get("0"), Some("7"));
}

#[test]
fn test_match_escaped_delimiter() {
    let unescaped = RoutePattern::new("/file.:ext").exact(true);
    let escaped = RoutePattern::new("/file\\.:ext").exact(true);
    assert!(match_once("/file.tar.gz", unescaped).is_none());
    assert_eq!(
        match_once("/file.tar.gz", escaped).unwrap().get("ext"),
        Some("tar.gz")
    );
}

#[test]
fn test_match_any_of_first_wins() {
    let pattern = RoutePattern::any_of(["/a/:x", "/:y/:x"]).exact(true);
    let found = match_once("/a/1", pattern.clone()).unwrap();
    assert_eq!(found.path, "/a/:x");
    let found = match_once("/b/1", pattern).unwrap();
    assert_eq!(found.path, "/:y/:x");
    assert_eq!(found.get("y"), Some("b"));
}

#[test]
fn test_duplicate_names_last_write_wins() {
    let found = match_once("/org/1/user/2", RoutePattern::new("/org/:id/user/:id").exact(true)).unwrap();
    assert_eq!(found.get("id"), Some("2"));
    let json = serde_json::to_value(&found).unwrap();
    assert_eq!(json["params"], serde_json::json!({ "id": "2" }));
}

#[test]
fn test_match_result_serializes_as_map() {
    let found = match_once("/users/42", RoutePattern::new("/users/:id").exact(true)).unwrap();
    let json = serde_json::to_value(&found).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "path": "/users/:id",
            "url": "/users/42",
            "is_exact": true,
            "params": { "id": "42" }
        })
    );
}

#[test]
fn test_matching_is_deterministic() {
    let cache = PatternCache::new(4);
    let pattern = RoutePattern::new("/users/:id/:tab?").exact(true);
    let first = cache.match_path("/users/9/posts", &pattern).unwrap();
    let second = cache.match_path("/users/9/posts", &pattern).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_cache_returns_same_compiled_object() {
    let cache = PatternCache::new(4);
    let flags = MatchFlags {
        end: true,
        ..MatchFlags::default()
    };
    let a = cache.compile("/users/:id", flags).unwrap();
    let b = cache.compile("/users/:id", flags).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let strict = cache
        .compile(
            "/users/:id",
            MatchFlags {
                strict: true,
                ..flags
            },
        )
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &strict));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.size, 2);
}

#[test]
fn test_cache_evicts_least_recently_used() {
    let cache = PatternCache::new(2);
    let flags = MatchFlags::default();
    let a = cache.compile("/a", flags).unwrap();
    cache.compile("/b", flags).unwrap();
    // touch /a so /b becomes the eviction candidate
    cache.compile("/a", flags).unwrap();
    cache.compile("/c", flags).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.capacity, 2);
    assert_eq!(stats.evictions, 1);

    let a_again = cache.compile("/a", flags).unwrap();
    assert!(Arc::ptr_eq(&a, &a_again));
    let misses_before = cache.stats().misses;
    cache.compile("/b", flags).unwrap();
    assert_eq!(cache.stats().misses, misses_before + 1);
}

#[test]
fn test_cache_hits_from_many_threads() {
    let cache = PatternCache::new(4);
    let flags = MatchFlags::default();
    let first = cache.compile("/users/:id", flags).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let again = cache.compile("/users/:id", flags).unwrap();
                    assert!(Arc::ptr_eq(&first, &again));
                }
            });
        }
    });

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 200);
}

#[test]
fn test_cache_clear_keeps_counters() {
    let cache = PatternCache::new(2);
    cache.compile("/a", MatchFlags::default()).unwrap();
    cache.clear();
    let stats = cache.stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_to_path_round_trip() {
    let template = "/users/:id/posts/:slug?";
    let tokens = parse(template, &ParseOptions::default());
    let params = PathParams::new().set("id", "42").set("slug", "hello-world");
    let path = to_path(&tokens, &params).unwrap();
    assert_eq!(path, "/users/42/posts/hello-world");

    let found = match_once(&path, RoutePattern::new(template).exact(true)).unwrap();
    assert_eq!(found.get("id"), Some("42"));
    assert_eq!(found.get("slug"), Some("hello-world"));
}

#[test]
fn test_to_path_skips_missing_optional() {
    let tokens = parse("/users/:id/:tab?", &ParseOptions::default());
    let path = to_path(&tokens, &PathParams::new().set("id", "7")).unwrap();
    assert_eq!(path, "/users/7");
}

#[test]
fn test_to_path_joins_repeat_values() {
    let tokens = parse("/files/:path+", &ParseOptions::default());
    let path = to_path(&tokens, &PathParams::new().set_many("path", ["a", "b", "c"])).unwrap();
    assert_eq!(path, "/files/a/b/c");
}

#[test]
fn test_to_path_errors() {
    let tokens = parse("/items/:id(\\d+)", &ParseOptions::default());
    assert!(matches!(
        to_path(&tokens, &PathParams::new()),
        Err(PatternError::MissingParam(name)) if name == "id"
    ));
    assert!(matches!(
        to_path(&tokens, &PathParams::new().set("id", "abc")),
        Err(PatternError::InvalidParam { .. })
    ));
    assert!(matches!(
        to_path(&tokens, &PathParams::new().set_many("id", ["1", "2"])),
        Err(PatternError::UnexpectedRepeat(_))
    ));
}
