#![cfg(test)]
use rstest::rstest;

use super::{TOMLParser, TOMLTable, TOMLType, TableOps};
use crate::error::TomlError;
type TestReturn = Result<(), String>;

fn parse(text: &str) -> Result<TOMLTable, String> {
    TOMLParser::init(text).parse_toml().map_err(|e| e.to_string())
}

fn int_at(table: &TOMLTable, path: &[&str]) -> Option<i64> {
    table.lookup(path).and_then(TOMLType::i64)
}

// TESTS
#[test]
fn test_keyvals() -> TestReturn {
    let table = parse(concat!(
        "title = \"TOML Example\"\n",
        "\"quoted key\" = 1\n",
        "'literal.key' = 2\n",
        "site.\"google.com\" = true\n",
        "3.14159 = \"pi\"\n",
    ))?;
    assert_eq!(
        Some("TOML Example"),
        table.lookup(&["title"]).and_then(TOMLType::str)
    );
    assert_eq!(Some(1), int_at(&table, &["quoted key"]));
    assert_eq!(Some(2), int_at(&table, &["literal.key"]));
    assert_eq!(
        Some(true),
        table.lookup(&["site", "google.com"]).and_then(TOMLType::bool)
    );
    assert_eq!(
        Some("pi"),
        table.lookup(&["3", "14159"]).and_then(TOMLType::str)
    );
    Ok(())
}

#[test]
fn dotted_keys_match_headers() -> TestReturn {
    let dotted = parse("a.b.c = 1")?;
    let headers = parse("[a]\n[a.b]\nc = 1")?;
    assert_eq!(Some(1), int_at(&dotted, &["a", "b", "c"]));
    assert_eq!(Some(1), int_at(&headers, &["a", "b", "c"]));
    assert!(dotted.has_table(&["a", "b"]) && headers.has_table(&["a", "b"]));
    // same shape, different provenance
    assert!(matches!(dotted.get("a"), Some(TOMLType::DKTable(_))));
    assert!(matches!(headers.get("a"), Some(TOMLType::HTable(_))));
    Ok(())
}

#[test]
fn dotted_keys_with_spaces() -> TestReturn {
    let table = parse("[dog]\n\"tater.man\" . type . name = \"pug\"")?;
    assert_eq!(
        Some("pug"),
        table
            .lookup(&["dog", "tater.man", "type", "name"])
            .and_then(TOMLType::str)
    );
    Ok(())
}

#[test]
fn dotted_keys_restore_the_active_table() -> TestReturn {
    let table = parse("[server]\nlimits.max = 10\nport = 80")?;
    assert_eq!(Some(10), int_at(&table, &["server", "limits", "max"]));
    assert_eq!(Some(80), int_at(&table, &["server", "port"]));
    assert!(!table.has_key(&["server", "limits", "port"], true));
    Ok(())
}

#[test]
fn parse_tableheads() -> TestReturn {
    let table = parse(concat!(
        "[fruit]\n",
        "apple.color = \"red\"\n",
        "apple.taste.sweet = true\n",
        "[fruit.apple.texture]\n",
        "smooth = true\n",
        "[ j . \"ʞ\" . 'l' ]\n",
        "[x.y.z.w]\n",
        "[x]\n",
    ))?;
    assert_eq!(
        Some(true),
        table
            .lookup(&["fruit", "apple", "texture", "smooth"])
            .and_then(TOMLType::bool)
    );
    assert!(table.has_table(&["j", "ʞ", "l"]));
    assert!(table.has_table(&["x", "y", "z", "w"]));
    Ok(())
}

#[test]
fn tables_of_arrays() -> TestReturn {
    let table = parse(concat!(
        "[[products]]\n",
        "name = \"Hammer\"\n",
        "sku = 738594937\n",
        "\n",
        "[[products]]  # empty table within the array\n",
        "\n",
        "[[products]]\n",
        "name = \"Nail\"\n",
        "color = \"gray\"\n",
    ))?;
    let products = table
        .get("products")
        .and_then(TOMLType::aot)
        .ok_or("Expected an array of tables")?;
    assert_eq!(3, products.len());
    assert_eq!(Some(738594937), products[0].get("sku").and_then(TOMLType::i64));
    assert!(products[1].is_empty());
    assert_eq!(Some("gray"), products[2].get("color").and_then(TOMLType::str));
    Ok(())
}

#[test]
fn nested_tables_land_in_the_last_element() -> TestReturn {
    let table = parse(concat!(
        "[[fruit]]\n",
        "name = \"apple\"\n",
        "[fruit.physical]\n",
        "color = \"red\"\n",
        "[[fruit.variety]]\n",
        "name = \"red delicious\"\n",
        "[[fruit.variety]]\n",
        "name = \"granny smith\"\n",
        "\n",
        "[[fruit]]\n",
        "name = \"banana\"\n",
        "[fruit.physical]\n",
        "color = \"yellow\"\n",
        "[[fruit.variety]]\n",
        "name = \"plantain\"\n",
    ))?;
    let fruit = table
        .get("fruit")
        .and_then(TOMLType::aot)
        .ok_or("Expected an array of tables")?;
    assert_eq!(2, fruit.len());
    assert_eq!(
        Some("red"),
        fruit[0]
            .lookup(&["physical", "color"])
            .and_then(TOMLType::str)
    );
    let varieties = fruit[0]
        .get("variety")
        .and_then(TOMLType::aot)
        .ok_or("Expected varieties")?;
    assert_eq!(2, varieties.len());
    assert_eq!(
        Some("granny smith"),
        varieties[1].get("name").and_then(TOMLType::str)
    );
    assert_eq!(
        Some("yellow"),
        table
            .lookup(&["fruit", "physical", "color"])
            .and_then(TOMLType::str)
    );
    assert_eq!(
        Some("plantain"),
        table
            .lookup(&["fruit", "variety", "name"])
            .and_then(TOMLType::str)
    );
    Ok(())
}

#[test]
fn tables_may_follow_an_interrupted_array() -> TestReturn {
    let table = parse("[[a]]\nx = 1\n[b]\n[a.c]\ny = 2\n[[a.d]]\nz = 3")?;
    assert_eq!(Some(2), int_at(&table, &["a", "c", "y"]));
    assert_eq!(Some(3), int_at(&table, &["a", "d", "z"]));
    Ok(())
}

#[test]
fn new_elements_reopen_their_tables() -> TestReturn {
    let table = parse("[[a]]\n[y]\n[a.b]\nx = 1\n[[a]]\n[a.b]\nx = 2\n[z]\n[[a]]\n[a.b]\nx = 3")?;
    let elements = table
        .get("a")
        .and_then(TOMLType::aot)
        .ok_or("Expected an array of tables")?;
    assert_eq!(3, elements.len());
    for (i, element) in elements.iter().enumerate() {
        assert_eq!(Some(i as i64 + 1), int_at(element, &["b", "x"]));
    }
    Ok(())
}

#[test]
fn test_arrays() -> TestReturn {
    let table = parse(concat!(
        "empty = []\n",
        "ints = [1, 2, 3]\n",
        "nested = [[1, 2], [\"a\", \"b\"], []]\n",
        "points = [{ x = 1 }, { x = 2, y = 3 }]\n",
        "multi = [\n  1,\n  2, # two\n]\n",
    ))?;
    assert_eq!(Some(0), table.lookup(&["empty"]).and_then(TOMLType::array).map(Vec::len));
    assert_eq!(
        Some(&vec![TOMLType::Int(1), TOMLType::Int(2), TOMLType::Int(3)]),
        table.lookup(&["ints"]).and_then(TOMLType::array)
    );
    assert_eq!(Some(3), table.lookup(&["nested"]).and_then(TOMLType::array).map(Vec::len));
    let points = table
        .lookup(&["points"])
        .and_then(TOMLType::array)
        .ok_or("Expected points")?;
    assert_eq!(
        Some(3),
        points[1].table().and_then(|t| t.get("y")).and_then(TOMLType::i64)
    );
    assert_eq!(Some(2), table.lookup(&["multi"]).and_then(TOMLType::array).map(Vec::len));
    Ok(())
}

#[rstest]
#[case("a = [1, 2.0]", "integer", "float")]
#[case("a = [\"x\", 1]", "string", "integer")]
#[case("a = [[1], 2]", "array", "integer")]
#[case("a = [{ b = 1 }, 2]", "table", "integer")]
#[case("a = [1979-05-27, 07:32:00]", "local date", "local time")]
fn heterogeneous_arrays(
    #[case] text: &str,
    #[case] expected_kind: &str,
    #[case] found_kind: &str,
) -> TestReturn {
    match TOMLParser::init(text).parse_toml() {
        Err(TomlError::HeterogeneousArray {
            path,
            expected,
            found,
        }) => {
            assert_eq!(r#"["a"]"#, path);
            assert_eq!(expected_kind, expected);
            assert_eq!(found_kind, found);
            Ok(())
        }
        other => Err(format!("Expected a heterogeneous array error, got {other:?}")),
    }
}

#[test]
fn test_inlinetable() -> TestReturn {
    let table = parse(concat!(
        "name = { first = \"Tom\", last = \"Preston-Werner\" }\n",
        "animal = { type.name = \"pug\" }\n",
        "nested = { inner = { deep = 1 }, list = [1] }\n",
    ))?;
    assert!(matches!(table.get("name"), Some(TOMLType::InlineTable(_))));
    assert_eq!(
        Some("Preston-Werner"),
        table.lookup(&["name", "last"]).and_then(TOMLType::str)
    );
    assert_eq!(
        Some("pug"),
        table
            .lookup(&["animal", "type", "name"])
            .and_then(TOMLType::str)
    );
    assert_eq!(Some(1), int_at(&table, &["nested", "inner", "deep"]));
    Ok(())
}

#[rstest]
// same key twice, in any form
#[case("a = 1\na = 2")]
#[case("a = 1\n\"a\" = 2")]
#[case("a.b = 1\na.b = 2")]
#[case("a = 1\na.b = 2")]
#[case("a.b = 1\na = 2")]
#[case("a.b = 1\n[a]")]
#[case("[a]\nb = 1\n[a]")]
#[case("[a]\nb = 1\n[a.b]")]
#[case("[a.b]\n[a]\nb = 1")]
#[case("[a.b]\n[a]\nb.c = 1")]
#[case("[a]\n[[a]]")]
#[case("[[a]]\n[a]")]
#[case("a = []\n[[a]]")]
#[case("[fruit]\napple.color = \"red\"\n[fruit.apple]")]
// a table of an array element, declared again after another header
#[case("[[a]]\n[a.b]\nx = 1\n[y]\n[a.b]\nz = 2")]
#[case("[[a]]\n[[a.c]]\n[a.c.d]\n[y]\n[a.c.d]")]
#[case("[[a]]\n[y]\n[a.b]\n[z]\n[a.b]")]
// inline tables are sealed
#[case("a = { b = 1 }\na.c = 2")]
#[case("a = { b = 1 }\n[a]")]
#[case("a = { b = 1 }\n[a.c]")]
#[case("a = { b = 1 }\n[[a.c]]")]
#[case("a = { b = 1, b = 2 }")]
#[case("a = { b.c = 1 }\na.b.d = 2")]
fn duplicates(#[case] text: &str) {
    let res = TOMLParser::init(text).parse_toml();
    assert!(
        matches!(res, Err(TomlError::DuplicateKey(_))),
        "{text:?} -> {res:?}"
    );
}

#[rstest]
#[case("[]")]
#[case("[[]]")]
#[case("[a..b]")]
#[case("[.a]")]
#[case("[a.]")]
#[case("[a b]")]
fn bad_headers(#[case] text: &str) {
    let res = TOMLParser::init(text).parse_toml();
    assert!(
        matches!(res, Err(TomlError::SyntaxError(_))),
        "{text:?} -> {res:?}"
    );
}

#[test]
fn empty_quoted_names_are_names() -> TestReturn {
    let table = parse("[\"\"]\n'' = 1\n")?;
    assert_eq!(Some(1), int_at(&table, &["", ""]));
    Ok(())
}

#[test]
fn failures_leave_no_document() {
    // the failure comes after several valid lines
    let text = "a = 1\nb = 2\n[c]\nd = [1, \"x\"]\n";
    assert!(TOMLParser::init(text).parse_toml().is_err());
}

#[test]
fn file_extension_is_checked() {
    assert!(matches!(
        TOMLParser::from_file("Cargo.lock"),
        Err(TomlError::FileExtension(_))
    ));
    assert!(matches!(
        TOMLParser::from_file("does/not/exist.toml"),
        Err(TomlError::Io(_))
    ));
}
