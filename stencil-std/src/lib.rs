//! Stencil Standard Provider
//!
//! A small binding grammar for templates: `$` data paths, arithmetic,
//! comparisons, `&&`/`||`/`!`, `cond ? a : b` and `value ?: fallback`.
//!
//! Text starting with `$` is an expression. Text starting with `(`, `!` or
//! a quote is one only if it parses; any other text is a literal.

pub mod ast;
pub mod parser;
pub mod eval;
mod provider;

pub use eval::truthy;
pub use provider::{StandardProvider, StandardExpression};

use stencil_plugin::ExtensionRegistry;

/// Install the standard provider as the active provider
pub fn load_standard_provider(registry: ExtensionRegistry) -> ExtensionRegistry {
    registry.with_provider(StandardProvider::new())
}

/// Create registry with the standard provider installed
pub fn standard_registry() -> ExtensionRegistry {
    load_standard_provider(ExtensionRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::{BinOp, Expr, Template, UnaryOp};
    use serde_json::json;
    use stencil_core::{codes, Value};
    use stencil_plugin::{DataContext, ExpressionProvider};

    fn data() -> DataContext {
        DataContext::new(Value::from(json!({
            "user": {"name": "Ada", "age": 36, "vip": true},
            "items": [{"title": "first", "price": 10}, {"title": "second", "price": 2.5}],
            "empty": "",
            "count": 0
        })))
    }

    fn eval(src: &str) -> Value {
        let provider = StandardProvider::new();
        let compiled = provider.create(Some("1"), &Value::from(src)).unwrap();
        compiled.evaluate(&data())
    }

    mod parser_tests {
        use super::*;
        use parser::parse_expr;

        fn num(n: f64) -> Box<Expr> {
            Box::new(Expr::Literal(Value::Number(n)))
        }

        fn path(p: &str) -> Box<Expr> {
            Box::new(Expr::Path(p.to_string()))
        }

        #[test]
        fn test_comparison() {
            assert_eq!(parse_expr("$a > 1").unwrap(), Expr::Binary(path("a"), BinOp::Gt, num(1.0)));
            assert_eq!(parse_expr("$a>=1").unwrap(), Expr::Binary(path("a"), BinOp::Ge, num(1.0)));
            assert_eq!(parse_expr("$a != $b").unwrap(), Expr::Binary(path("a"), BinOp::Ne, path("b")));
        }

        #[test]
        fn test_precedence() {
            assert_eq!(
                parse_expr("$a + 1 * 2").unwrap(),
                Expr::Binary(path("a"), BinOp::Add, Box::new(Expr::Binary(num(1.0), BinOp::Mul, num(2.0))))
            );
            assert_eq!(
                parse_expr("!$a || $b && $c").unwrap(),
                Expr::Or(
                    Box::new(Expr::Unary(UnaryOp::Not, path("a"))),
                    Box::new(Expr::And(path("b"), path("c")))
                )
            );
        }

        #[test]
        fn test_left_associative_subtraction() {
            assert_eq!(
                parse_expr("10 - 4 - 3").unwrap(),
                Expr::Binary(Box::new(Expr::Binary(num(10.0), BinOp::Sub, num(4.0))), BinOp::Sub, num(3.0))
            );
        }

        #[test]
        fn test_unary_minus_and_exponent() {
            assert_eq!(parse_expr("-5").unwrap(), Expr::Literal(Value::Number(-5.0)));
            assert_eq!(parse_expr("2 * -3").unwrap(), Expr::Binary(num(2.0), BinOp::Mul, num(-3.0)));
            assert_eq!(parse_expr("1e-3").unwrap(), Expr::Literal(Value::Number(0.001)));
            assert_eq!(parse_expr("-$a").unwrap(), Expr::Unary(UnaryOp::Neg, path("a")));
        }

        #[test]
        fn test_ternary_and_elvis() {
            assert_eq!(
                parse_expr("$flag ? 'yes' : 'no'").unwrap(),
                Expr::Ternary(
                    path("flag"),
                    Box::new(Expr::Literal(Value::from("yes"))),
                    Box::new(Expr::Literal(Value::from("no")))
                )
            );
            assert_eq!(
                parse_expr("$name ?: 'anon'").unwrap(),
                Expr::Elvis(path("name"), Box::new(Expr::Literal(Value::from("anon"))))
            );
            // nested in the then-branch
            assert!(matches!(
                parse_expr("$a ? $b ? 1 : 2 : 3").unwrap(),
                Expr::Ternary(_, then, _) if matches!(*then, Expr::Ternary(..))
            ));
        }

        #[test]
        fn test_quotes_hide_operators() {
            assert_eq!(parse_expr("'a+b'").unwrap(), Expr::Literal(Value::from("a+b")));
            assert_eq!(parse_expr(r#""it's""#).unwrap(), Expr::Literal(Value::from("it's")));
            assert_eq!(parse_expr(r"'a\'b'").unwrap(), Expr::Literal(Value::from("a'b")));
        }

        #[test]
        fn test_paths() {
            assert_eq!(parse_expr("$").unwrap(), Expr::Path(String::new()));
            assert_eq!(parse_expr("$items[0].title").unwrap(), Expr::Path("items[0].title".to_string()));
            assert!(parse_expr("$a b").is_err());
        }

        #[test]
        fn test_parens() {
            assert_eq!(
                parse_expr("($a + 1) * 2").unwrap(),
                Expr::Binary(Box::new(Expr::Binary(path("a"), BinOp::Add, num(1.0))), BinOp::Mul, num(2.0))
            );
        }

        #[test]
        fn test_errors() {
            for bad in ["", "$a >", "(1 + 2", "'abc", "$a = 1", "* 3", "$a ? 1", "hello", "(1)(2)", "'a' 'b'"] {
                let err = parse_expr(bad).unwrap_err();
                assert_eq!(err.code, codes::PARSE_ERROR, "expected parse error for {:?}", bad);
            }
        }

        #[test]
        fn test_classify() {
            use parser::{classify, TextKind};
            assert_eq!(classify("$a"), TextKind::Expression);
            assert_eq!(classify("  $a > 1"), TextKind::Expression);
            assert_eq!(classify("'x'"), TextKind::Candidate);
            assert_eq!(classify("!$a"), TextKind::Candidate);
            assert_eq!(classify("(optional)"), TextKind::Candidate);
            assert_eq!(classify("42"), TextKind::Literal);
            assert_eq!(classify("2024-01-01"), TextKind::Literal);
            assert_eq!(classify("true story"), TextKind::Literal);
            assert_eq!(classify("hello"), TextKind::Literal);
            assert_eq!(classify(""), TextKind::Literal);
        }

        #[test]
        fn test_operator_typos() {
            let err = parse_expr("$a = 1").unwrap_err();
            assert_eq!(err.suggestion.as_deref(), Some("Use '==' for comparison"));
            assert!(parse_expr("$a & $b").is_err());
            assert!(parse_expr("$a < $b < $c").is_err());
            assert!(parse_expr("1st").is_err());
        }

        #[test]
        fn test_bracket_paths() {
            assert_eq!(parse_expr("$a['x y']").unwrap(), Expr::Path("a['x y']".to_string()));
            assert_eq!(
                parse_expr("$items[0].price*2").unwrap(),
                Expr::Binary(path("items[0].price"), BinOp::Mul, num(2.0))
            );
            assert!(parse_expr("$a.").is_err());
        }

        #[test]
        fn test_deep_nesting_is_an_error() {
            let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
            assert_eq!(parse_expr(&deep).unwrap_err().code, codes::PARSE_ERROR);

            let nested = format!("{}1{}", "(".repeat(parser::MAX_DEPTH + 1), ")".repeat(parser::MAX_DEPTH + 1));
            let err = parse_expr(&nested).unwrap_err();
            assert!(err.message.contains("nested too deeply"), "{}", err);

            let ok = format!("{}1{}", "(".repeat(parser::MAX_DEPTH), ")".repeat(parser::MAX_DEPTH));
            assert_eq!(parse_expr(&ok).unwrap(), Expr::Literal(Value::Number(1.0)));

            let ternaries = format!("{}0", "$a ? 1 : ".repeat(10_000));
            assert_eq!(parse_expr(&ternaries).unwrap_err().code, codes::PARSE_ERROR);
        }

        #[test]
        fn test_long_chains() {
            let huge = vec!["1"; 10_000].join("+");
            assert_eq!(parse_expr(&huge).unwrap_err().code, codes::PARSE_ERROR);

            let nots = format!("{}$a", "!".repeat(10_000));
            assert_eq!(parse_expr(&nots).unwrap_err().code, codes::PARSE_ERROR);

            let sum = format!("$n{}", " + 1".repeat(300));
            assert!(parse_expr(&sum).is_ok());
        }
    }

    mod eval_tests {
        use super::*;

        #[test]
        fn test_paths() {
            assert_eq!(eval("$user.name"), Value::from("Ada"));
            assert_eq!(eval("$items[1].title"), Value::from("second"));
            assert!(eval("$user.missing").is_null());
        }

        #[test]
        fn test_arithmetic() {
            assert_eq!(eval("$items[0].price + $items[1].price"), Value::Number(12.5));
            assert_eq!(eval("$user.age - 6"), Value::Number(30.0));
            assert_eq!(eval("(7 % 4)"), Value::Number(3.0));
            assert_eq!(eval("($user.age + 4) / 10"), Value::Number(4.0));
        }

        #[test]
        fn test_division_by_zero_is_null() {
            assert!(eval("(1 / 0)").is_null());
            assert!(eval("1 % $count").is_null());
        }

        #[test]
        fn test_concatenation() {
            assert_eq!(eval("'Hi ' + $user.name"), Value::from("Hi Ada"));
            assert_eq!(eval("$user.age + ' years'"), Value::from("36 years"));
            assert_eq!(eval("'x' + $nothing"), Value::from("x"));
        }

        #[test]
        fn test_type_mismatch_is_null() {
            assert!(eval("$user.name - 1").is_null());
            assert!(eval("-$user.name").is_null());
        }

        #[test]
        fn test_comparisons() {
            assert_eq!(eval("$user.age > 30"), Value::Bool(true));
            assert_eq!(eval("$user.age <= 30"), Value::Bool(false));
            assert_eq!(eval("$user.name == 'Ada'"), Value::Bool(true));
            assert_eq!(eval("'abc' < 'abd'"), Value::Bool(true));
            assert_eq!(eval("$user.name > 1"), Value::Bool(false));
            assert_eq!(eval("$missing == null"), Value::Bool(true));
        }

        #[test]
        fn test_logic() {
            assert_eq!(eval("$user.vip && $user.age > 18"), Value::Bool(true));
            assert_eq!(eval("$empty || $count"), Value::Bool(false));
            assert_eq!(eval("!$empty"), Value::Bool(true));
        }

        #[test]
        fn test_conditionals() {
            assert_eq!(eval("$user.vip ? 'gold' : 'plain'"), Value::from("gold"));
            assert_eq!(eval("$count ? 'some' : 'none'"), Value::from("none"));
            assert_eq!(eval("$user.nick ?: $user.name"), Value::from("Ada"));
            assert_eq!(eval("$empty ?: 'fallback'"), Value::from(""));
        }

        #[test]
        fn test_literal_text() {
            assert_eq!(eval("hello world"), Value::from("hello world"));
            for text in ["a>b", "3 items", "1st place", "10:30", "true story", "(optional)", "!important", "-"] {
                assert_eq!(eval(text), Value::from(text), "{:?} should stay text", text);
            }
            // numeric-looking labels are not arithmetic
            assert_eq!(eval("2024-01-01"), Value::from("2024-01-01"));
            assert_eq!(eval("555-1234"), Value::from("555-1234"));
            assert_eq!(eval("42"), Value::from("42"));
        }

        #[test]
        fn test_long_chain_evaluates() {
            let sum = format!("$count{}", " + 1".repeat(300));
            assert_eq!(eval(&sum), Value::Number(300.0));
            assert_eq!(eval(&format!("{}$count", "!".repeat(101))), Value::Bool(true));
        }

        #[test]
        fn test_whole_data() {
            assert_eq!(eval("$"), data().data);
        }
    }

    mod provider_tests {
        use super::*;

        #[test]
        fn test_truthiness() {
            let p = StandardProvider::new();
            assert!(!p.is_true(None, &Value::Null));
            assert!(!p.is_true(None, &Value::Bool(false)));
            assert!(!p.is_true(None, &Value::Number(0.0)));
            assert!(!p.is_true(None, &Value::Number(f64::NAN)));
            assert!(!p.is_true(None, &Value::from("")));
            assert!(!p.is_true(None, &Value::from("false")));
            assert!(!p.is_true(None, &Value::List(vec![])));
            assert!(p.is_true(None, &Value::from("0")));
            assert!(p.is_true(Some("anything"), &Value::Number(-1.0)));
            assert!(p.is_true(None, &Value::from(json!({"k": 1}))));
        }

        #[test]
        fn test_structured_source() {
            let p = StandardProvider::new();
            let source = Value::from(json!({
                "title": "$user.name",
                "badge": "$user.vip ? 'VIP' : ''",
                "label": "Price",
                "prices": ["$items[0].price", 3]
            }));
            let compiled = p.create(None, &source).unwrap();
            assert_eq!(
                compiled.evaluate(&data()).to_json(),
                json!({"title": "Ada", "badge": "VIP", "label": "Price", "prices": [10, 3]})
            );
            assert_eq!(compiled.source(), &source);
        }

        #[test]
        fn test_structured_source_error_names_leaf() {
            let p = StandardProvider::new();
            let err = p.create(None, &Value::from(json!({"ok": "$a", "bad": "$a >"}))).unwrap_err();
            assert_eq!(err.code, codes::PARSE_ERROR);
            assert_eq!(err.expression.as_deref(), Some("$a >"));
        }

        #[test]
        fn test_structured_source_keeps_labels() {
            let p = StandardProvider::new();
            let source = Value::from(json!({
                "title": "$user.name",
                "label": "3 items",
                "date": "2024-01-01",
                "hint": "(optional)",
                "tagline": "true story"
            }));
            let compiled = p.create(None, &source).unwrap();
            assert_eq!(
                compiled.evaluate(&data()).to_json(),
                json!({
                    "title": "Ada",
                    "label": "3 items",
                    "date": "2024-01-01",
                    "hint": "(optional)",
                    "tagline": "true story"
                })
            );
        }

        #[test]
        fn test_runaway_expression_is_an_error() {
            let p = StandardProvider::new();
            let deep = format!("${}", "(".repeat(10_000));
            assert_eq!(p.create(None, &Value::from(deep)).unwrap_err().code, codes::PARSE_ERROR);

            let sum = format!("$count{}", "+1".repeat(10_000));
            let err = p.create(None, &Value::from(sum.as_str())).unwrap_err();
            assert_eq!(err.code, codes::PARSE_ERROR);
            assert_eq!(err.expression.as_deref(), Some(sum.as_str()));

            // a label starting with a bracket falls back to text instead of failing
            let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
            let compiled = p.create(None, &Value::from(parens.as_str())).unwrap();
            assert_eq!(compiled.evaluate(&data()), Value::from(parens.as_str()));
        }

        #[test]
        fn test_constants() {
            let p = StandardProvider::new();
            for source in [Value::Number(4.0), Value::Bool(true), Value::Null] {
                let compiled = p.create(None, &source).unwrap();
                assert_eq!(compiled.evaluate(&data()), source);
            }
        }

        #[test]
        fn test_version_restriction() {
            let p = StandardProvider::new().with_versions(["1", "2"]);
            assert!(p.create(Some("2"), &Value::from("$a")).is_ok());
            assert!(p.create(None, &Value::from("$a")).is_ok());

            let err = p.create(Some("3"), &Value::from("$a")).unwrap_err();
            assert_eq!(err.code, codes::UNSUPPORTED_VERSION);
            assert_eq!(p.meta().versions, vec!["1".to_string(), "2".to_string()]);
        }

        #[test]
        fn test_compiled_keeps_version() {
            let p = StandardProvider::new();
            let compiled = p.create(Some("v7"), &Value::from("$a")).unwrap();
            assert_eq!(compiled.version(), Some("v7"));
            assert_eq!(p.create(None, &Value::from("$a")).unwrap().version(), None);
        }

        #[test]
        fn test_compile_template_shape() {
            let p = StandardProvider::new();
            assert_eq!(p.compile(&Value::from("plain")).unwrap(), Template::Const(Value::from("plain")));
            assert!(matches!(p.compile(&Value::from("$a")).unwrap(), Template::Expr(Expr::Path(_))));
        }

        #[test]
        fn test_standard_registry() {
            let registry = standard_registry();
            assert_eq!(registry.active_provider().unwrap().meta().name, "standard");
        }
    }
}
