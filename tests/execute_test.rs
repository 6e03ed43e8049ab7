// Integration tests for expanding templates against real-world contexts

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use uritemplate::{escape, execute, parse, Ast, Mapping, Mask, Value};

mod common;

#[derive(Serialize)]
struct Person {
    #[serde(rename = "firstName")]
    first_name: String,
    #[serde(rename = "lastName")]
    last_name: String,
    nickname: Option<String>,
}

#[derive(Serialize)]
struct Search {
    person: Person,
    tags: Vec<&'static str>,
    page: u32,
}

fn search() -> Search {
    Search {
        person: Person {
            first_name: "Gontrand".to_string(),
            last_name: "Fauxfilet".to_string(),
            nickname: None,
        },
        tags: vec!["rust", "uri template"],
        page: 2,
    }
}

#[test]
fn test_serialized_record_context() {
    let context = Value::from_serialize(&search()).unwrap();
    let ast = parse("/hello/{person.firstName}{?person.lastName,person.nickname,page}").unwrap();
    assert_eq!(
        ast.expand(&context),
        "/hello/Gontrand?lastName=Fauxfilet&page=2"
    );

    let ast = parse("/tags{/tags*}").unwrap();
    assert_eq!(ast.expand(&context), "/tags/rust/uri%20template");
}

#[test]
fn test_field_aliases() {
    let mut person = Mapping::new();
    person
        .insert_aliased("first_name", "firstName", "Gontrand")
        .insert_aliased("last_name", "lastName", "Fauxfilet");
    let context = common::context([("person", person)]);

    let ast = parse("{person.firstName}-{person.last_name}").unwrap();
    assert_eq!(ast.expand(&context), "Gontrand-Fauxfilet");
}

#[test]
fn test_exact_key_beats_alias() {
    let mut record = Mapping::new();
    record
        .insert_aliased("id", "name", "by-alias")
        .insert("name", "by-key");
    let context = common::context([("record", record)]);

    assert_eq!(parse("{record.name}").unwrap().expand(&context), "by-key");
}

#[test]
fn test_deep_paths_and_missing_steps() {
    let context = Value::from_json_str(
        r#"{"a": {"b": {"c": "deep"}, "list": ["x", "y"]}, "s": "scalar"}"#,
    )
    .unwrap();

    assert_eq!(parse("{a.b.c}").unwrap().expand(&context), "deep");
    assert_eq!(parse("{/a.list*}").unwrap().expand(&context), "/x/y");
    assert_eq!(parse("{a.missing.c}").unwrap().expand(&context), "");
    assert_eq!(parse("{s.field}").unwrap().expand(&context), "");
    assert_eq!(parse("{?a.b.c}").unwrap().expand(&context), "?c=deep");
}

#[test]
fn test_yaml_context() {
    let context = Value::from_yaml_str(
        "owner: rust-lang\nrepo: rust\nfilters:\n  state: open\n  labels: bug\n",
    )
    .unwrap();

    let ast = parse("/repos/{owner}/{repo}/issues{?filters*}").unwrap();
    assert_eq!(
        ast.expand(&context),
        "/repos/rust-lang/rust/issues?state=open&labels=bug"
    );
}

#[test]
fn test_nested_composites_flatten() {
    let context = common::context([(
        "matrix",
        Value::List(vec![vec!["1", "2"].into(), "3".into(), Value::Undefined]),
    )]);

    assert_eq!(parse("{matrix}").unwrap().expand(&context), "1%2C2,3");
    assert_eq!(parse("{/matrix*}").unwrap().expand(&context), "/1%2C2/3");
}

#[test]
fn test_sorted_map_context() {
    let mut params = BTreeMap::new();
    params.insert("b", "2");
    params.insert("a", "1");
    let context = common::context([("params", params)]);

    assert_eq!(parse("{?params*}").unwrap().expand(&context), "?a=1&b=2");
}

#[test]
fn test_duplicate_slashes_collapse() {
    let context = common::context([("a", "x")]);
    assert_eq!(parse("//{a}///b/").unwrap().expand(&context), "/x/b/");
}

#[test]
fn test_execute_writes_to_sink() {
    let ast = parse("/files/{+path}{?v}").unwrap();
    let context = common::context([("path", "a/b.txt"), ("v", "3")]);

    let mut out = Vec::new();
    execute(&ast, &mut out, &context).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "/files/a/b.txt?v=3");
}

#[test]
fn test_shared_ast_across_threads() {
    let ast: Arc<Ast> = Arc::new("/users/{id}{?fields*}".parse().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ast = Arc::clone(&ast);
            thread::spawn(move || {
                let context = common::context([
                    ("id", Value::from(i)),
                    ("fields", vec!["name", "email"].into()),
                ]);
                (i, ast.expand(&context))
            })
        })
        .collect();

    for handle in handles {
        let (i, expanded) = handle.join().unwrap();
        assert_eq!(expanded, format!("/users/{}?fields=name&fields=email", i));
    }
}

#[test]
fn test_escape_matches_urlencoding() {
    for input in ["Hello World!", "a/b?c=d&e", "ça va", "日本語", "50%", "~-._", ""] {
        assert_eq!(
            escape(input, Mask::DISALLOWED | Mask::RESERVED),
            urlencoding::encode(input),
            "input {:?}",
            input
        );
    }
}

#[test]
fn test_query_values_decode_back() {
    let value = "rust & \"uri\" = 100%";
    let context = common::context([("q", value)]);
    let expanded = parse("/search{?q}").unwrap().expand(&context);

    let base = url::Url::parse("http://example.com/").unwrap();
    let url = base.join(&expanded).unwrap();
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs, vec![("q".to_string(), value.to_string())]);
}
