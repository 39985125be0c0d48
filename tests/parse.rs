use std::str::FromStr;

use keyed_json_path::{CompareOp, Error, Expr, JsonPath, PathNode, Segment, SubscriptElement};

#[test]
fn canonical_form() {
    #[track_caller]
    fn test(s: &str, display: &str) {
        let path = JsonPath::from_str(s).unwrap();
        assert_eq!(path.to_string(), display);
    }

    test("a", "a");
    test(" a . b ", "a.b");
    test("$", "@");
    test("@.a", "@.a");
    test(".a", "@.a");
    test("..a", "@..a");
    test("..", "@..*");
    test("a..", "a..*");
    test("a..*", "a..*");
    test("a.*", "a.*");
    test("a[0]", "a[0]");
    test("a [ 0 ] [ 1 ]", "a[0][1]");
    test("a.[0]", "a[0]");
    test("a..[0]", "a..[0]");
    test("a[-1]", "a[-1]");
    test("a[3.0]", "a[3]");
    test("a[1.50]", "a[1.5]");
    test("a[1 : 2]", "a[1:2]");
    test("a[:]", "a[:]");
    test("a[-2:]", "a[-2:]");
    test("a[:-2]", "a[:-2]");
    test("a[ b > 1 , c ? ]", "a[b>1,c?]");
    test("a[b == \"x\"]", "a[b==\"x\"]");
    test("a[\"x\" != b]", "a[\"x\"!=b]");
    test("a[b <= -0.5]", "a[b<=-0.5]");
    test("a[b >= true]", "a[b>=true]");
    test("a[@ < 1]", "a[@<1]");
    test("a[b.c[0]?]", "a[b.c[0]?]");
    test("[a, b]", "[a,b]");
    test("'a'", "a");
    test("'$a'", "$a");
    test("'a b'.c", "'a b'.c");
    test("'true'", "'true'");
    test("'$'", "'$'");
    test("'1a'", "'1a'");
    test("''", "''");
    test(r"'it\u0027s'", r"'it\u0027s'");
    test(r"'a\nb'", r"'a\nb'");
    test(r"'a\\b'", r"'a\\b'");
    test(r"'\u0001'", r"'\u0001'");
    test(r#""a\"b""#, r#""a\"b""#);
    test(r#""é""#, "\"\u{e9}\"");
    test("1", "1");
    test("-1.25", "-1.25");
    test("true", "true");
    test("\"text\"", "\"text\"");
}

#[test]
fn round_trip() {
    #[track_caller]
    fn test(s: &str) {
        let path = JsonPath::new(s).unwrap();
        let canonical = path.to_string();
        let reparsed = JsonPath::new(&canonical).unwrap();
        assert_eq!(reparsed, path, "{s} => {canonical}");
        assert_eq!(reparsed.to_string(), canonical);
    }

    test("users[age > 28].name");
    test("[users[0].name, users[1].name]");
    test("items[_key == \"b\"]");
    test("..");
    test("..[0]");
    test("$..a[*].b");
    test("a[1:, :2, 1:2, :]");
    test("a[b?, @.c?, [0]?]");
    test("a[b == c.d, 1 == b, \"s\" != true]");
    test("'a.b'.'c d'['e']");
    test("'\\u0027'");
    test("a[..]");
    test("a[.. == 1]");
    test("a[..?]");
    test("a[0.5]");
    test("a[[0][0]]");
}

#[test]
fn ast() {
    let path = JsonPath::new("users[age > 28].name").unwrap();
    let users = PathNode::new(Segment::Identifier("users".into()));
    let filter = SubscriptElement::Comparison {
        left: Expr::Path(PathNode::new(Segment::Identifier("age".into()))),
        op: CompareOp::Gt,
        right: Expr::Number(28.0),
    };
    let expected = users
        .then(false, Segment::Subscript(vec![filter]))
        .then(false, Segment::Identifier("name".into()));
    assert_eq!(path.expr(), &Expr::Path(expected));

    // built by hand and rendered
    let path = JsonPath::from(Expr::Path(
        PathNode::new(Segment::Identifier("x y".into())).then(true, Segment::Wildcard),
    ));
    assert_eq!(path.to_string(), "'x y'..*");
}

#[test]
fn errors() {
    #[track_caller]
    fn test_err(s: &str, display: &str) {
        let err = JsonPath::new(s).unwrap_err();
        assert_eq!(err.to_string(), display);
    }

    test_err("", "at position 0, empty expression");
    test_err("   ", "at position 3, empty expression");
    test_err("a[", "at position 2, unterminated subscript");
    test_err("a[0", "at position 3, unterminated subscript");
    test_err("a[0 1]", "at position 4, expected `,` or `]`, found number 1");
    test_err("a.", "at position 2, expected path segment, found end of input");
    test_err("a.]", "at position 2, expected path segment, found `]`");
    test_err("a[b <]", "at position 5, incomplete constraint");
    test_err("a[1?]", "at position 3, existence check requires a path");
    test_err("a[0.5:]", "at position 2, slice bounds must be integers");
    test_err("a b", "at position 2, unexpected trailing identifier `b`");
    test_err("a # b", "at position 2, unexpected character '#'");
    test_err("a[b = 1]", "at position 4, invalid operator");
    test_err("'abc", "at position 0, unterminated quoted identifier");
    test_err("\"abc", "at position 0, unterminated string");
    test_err(r#""\q""#, "at position 1, invalid escape sequence");
}

#[test]
fn error_kinds() {
    let err = JsonPath::new("a # b").unwrap_err();
    let Error::Lex(lex) = &err else {
        panic!("expected a lex error: {err:?}");
    };
    assert_eq!(lex.character(), '#');
    assert_eq!(err.offset(), 2);

    let err = "a[".parse::<JsonPath>().unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err:?}");
    assert_eq!(err.offset(), 2);
}
