use pathmock::pattern::{
    match_path, parse, path_to_regex, to_path, ParseOptions, PathParams, PatternCache,
    PatternSource, RegexOptions, RoutePattern,
};

#[test]
fn test_users_id_exact() {
    let found = match_path("/users/42", &RoutePattern::new("/users/:id").exact(true))
        .unwrap()
        .unwrap();
    assert_eq!(found.get("id"), Some("42"));
    assert!(found.is_exact);
}

#[test]
fn test_users_id_strict_trailing_slash() {
    let pattern = RoutePattern::new("/users/:id").exact(true).strict(true);
    assert!(match_path("/users/42/", &pattern).unwrap().is_none());
}

#[test]
fn test_repeated_matching_is_identical() {
    let pattern = RoutePattern::new("/a/:b?/:c*").exact(true);
    let first = match_path("/a/x/y/z", &pattern).unwrap();
    for _ in 0..5 {
        assert_eq!(match_path("/a/x/y/z", &pattern).unwrap(), first);
    }
}

#[test]
fn test_generated_paths_round_trip() {
    let cases: &[(&str, &[(&str, &str)])] = &[
        ("/users/:id", &[("id", "42")]),
        ("/users/:id/posts/:post", &[("id", "7"), ("post", "hello-world")]),
        ("/files/:name.:ext", &[("name", "report"), ("ext", "pdf")]),
        ("/items/:id(\\d+)", &[("id", "12345")]),
        ("/search/:query/:page?", &[("query", "rust"), ("page", "2")]),
        ("/:lang-:region", &[("lang", "en"), ("region", "GB")]),
    ];
    let cache = PatternCache::new(32);

    for (template, values) in cases {
        let tokens = parse(template, &ParseOptions::default());
        let params = values
            .iter()
            .fold(PathParams::new(), |p, (k, v)| p.set(*k, *v));
        let path = to_path(&tokens, &params).unwrap();

        let pattern = RoutePattern::new(*template).exact(true).sensitive(true);
        let found = cache
            .match_path(&path, &pattern)
            .unwrap()
            .unwrap_or_else(|| panic!("{template} did not match {path}"));
        for (k, v) in *values {
            assert_eq!(found.get(k), Some(*v), "{template}: {k}");
        }
    }
}

#[test]
fn test_alternation_source_and_route_pattern_agree() {
    let templates = vec!["/a/:x".to_string(), "/b/:x".to_string()];
    let compiled = path_to_regex(&PatternSource::from(templates.clone()), &RegexOptions::default()).unwrap();
    assert!(compiled.regex().is_match("/b/1").unwrap());
    assert!(match_path("/b/1", &RoutePattern::any_of(templates).exact(true))
        .unwrap()
        .is_some());
}
