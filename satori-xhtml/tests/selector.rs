use rstest::rstest;
use satori_xhtml::{Value, parse, select, select_str};

const FIXTURE: &str = r#"<root><a id="1"/><b><a id="2"/><c id="7"><a id="3"/></c></b><c id="4"/><a id="5"/><a id="6"/></root>"#;

fn ids(query: &str) -> Vec<String> {
    select_str(FIXTURE, query)
        .iter()
        .map(|e| e.attr("id").map(Value::to_string).unwrap_or_default())
        .collect()
}

#[rstest]
#[case("a", &["1", "2", "3", "5", "6"])]
#[case("c", &["7", "4"])]
#[case("b a", &["2", "3"])]
#[case("b > a", &["2"])]
#[case("c + a", &["5"])]
#[case("c ~ a", &["5", "6"])]
#[case("a + a", &["6"])]
#[case("c a, c + a", &["3", "5"])]
#[case("d", &[])]
fn queries(#[case] query: &str, #[case] expected: &[&str]) {
    assert_eq!(ids(query), expected);
}

#[test]
fn results_are_borrowed_from_the_tree() {
    let tree = parse(FIXTURE);
    let found = select(&tree, "root");
    assert_eq!(found.len(), 1);
    assert!(std::ptr::eq(found[0], &tree[0]));
}

#[test]
fn whitespace_around_combinators_is_ignored() {
    assert_eq!(ids("b>a"), ids("b > a"));
    assert_eq!(ids("  c+a  "), ids("c + a"));
}
