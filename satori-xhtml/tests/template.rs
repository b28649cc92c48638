use rstest::rstest;
use satori_xhtml::{Element, Map, Value, fold::MAX_DEPTH, parse, render, to_markup};

fn render_json(src: &str, json: serde_json::Value) -> String {
    let vars = match Value::from(json) {
        Value::Map(map) => map,
        _ => Map::new(),
    };
    to_markup(&render(src, &vars), false)
}

#[rstest]
#[case("{#if ok}yes{:else}no{/if}", serde_json::json!({"ok": true}), "yes")]
#[case("{#if ok}yes{:else}no{/if}", serde_json::json!({"ok": ""}), "no")]
#[case("{#each items as it}<i>{it}</i>{/each}", serde_json::json!({"items": ["a", "b"]}), "<i>a</i><i>b</i>")]
#[case(r#"<a href={url}>x</a>"#, serde_json::json!({"url": "http://e/?a=1&b=2"}), r#"<a href="http://e/?a=1&amp;b=2">x</a>"#)]
#[case("{n + 1}", serde_json::json!({"n": 2}), "3")]
#[case("{@ n * 2}", serde_json::json!({"n": 2}), "4")]
#[case("[{missing}]", serde_json::json!({}), "[]")]
#[case("{list}", serde_json::json!({"list": [1, "a", true]}), "1atrue")]
fn renders(#[case] src: &str, #[case] json: serde_json::Value, #[case] expected: &str) {
    assert_eq!(render_json(src, json), expected);
}

#[test]
fn nested_loops_see_outer_bindings() {
    let src = "{#each rows as row}{#each row.cells as cell}{row.id}{cell};{/each}{/each}";
    let json = serde_json::json!({"rows": [{"id": "a", "cells": [1, 2]}, {"id": "b", "cells": [3]}]});
    assert_eq!(render_json(src, json), "a1;a2;b3;");
}

#[test]
fn layout_whitespace_is_trimmed() {
    let src = "<message>\n  <p>hi</p>\n</message>\n";
    assert_eq!(render_json(src, serde_json::json!({})), "<message><p>hi</p></message>");
}

fn depth(elements: &[Element]) -> usize {
    elements.iter().map(|e| 1 + depth(e.children())).max().unwrap_or(0)
}

#[test]
fn deeply_nested_tags_stay_bounded() {
    let src = format!("{}x", "<b>".repeat(50_000));
    let elements = parse(&src);
    assert_eq!(depth(&elements), MAX_DEPTH);
    assert_eq!(to_markup(&elements, true), "x");
}

#[test]
fn deeply_nested_expressions_render_empty() {
    let src = format!("[{{{}1{}}}]", "(".repeat(20_000), ")".repeat(20_000));
    assert_eq!(render_json(&src, serde_json::json!({})), "[]");
}
