use odata_query::advanced::{BINARY_OPERATORS, ExpressionCompiler, parse};
use odata_query::{Scope, compile_lambda};
use proptest::prelude::*;

fn arb_atom() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("c.x".to_string()),
        Just("c.y".to_string()),
        Just("limit".to_string()),
        (0i64..1000).prop_map(|n| n.to_string()),
    ]
}

fn arb_arith(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        return arb_atom().boxed();
    }

    let leaf = arb_atom();
    let nested = (
        arb_arith(depth - 1),
        prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("%")],
        arb_arith(depth - 1),
    )
        .prop_map(|(lhs, op, rhs)| format!("({lhs} {op} {rhs})"));
    prop_oneof![leaf, nested].boxed()
}

fn arb_predicate() -> impl Strategy<Value = String> {
    (
        arb_arith(2),
        prop_oneof![Just("=="), Just("!="), Just(">"), Just("<="), Just(">=")],
        arb_arith(2),
    )
        .prop_map(|(lhs, op, rhs)| format!("c => {lhs} {op} {rhs}"))
}

proptest! {
    #[test]
    fn binary_operators_use_table_tokens(index in 0..BINARY_OPERATORS.len(), pascalize in any::<bool>()) {
        let (op, token) = BINARY_OPERATORS[index];
        let text = compile_lambda(&format!("c => c.left {op} c.right"), &[], pascalize)
            .expect("binary lambda should compile");
        let expected = if pascalize {
            format!("Left {token} Right")
        } else {
            format!("left {token} right")
        };
        prop_assert_eq!(text, expected);
    }

    #[test]
    fn parse_pretty_roundtrip(source in arb_predicate()) {
        let parsed = parse(&source).expect("generated lambda should parse");
        let rendered = parsed.to_string();
        let reparsed = parse(&rendered).expect("pretty output should reparse");
        prop_assert_eq!(parsed, reparsed);
    }

    #[test]
    fn compilation_is_idempotent(source in arb_predicate(), limit in 0i64..100, pascalize in any::<bool>()) {
        let expr = parse(&source).expect("generated lambda should parse");
        let scopes = [Scope::new().with("limit", limit)];
        let first = ExpressionCompiler::new(&scopes, pascalize).compile(&expr);
        let second = ExpressionCompiler::new(&scopes, pascalize).compile(&expr);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn captured_integers_render_verbatim(limit in -10_000i64..10_000) {
        let scopes = [Scope::new().with("limit", limit)];
        let text = compile_lambda("c => c.x > limit", &scopes, false)
            .expect("comparison should compile");
        prop_assert_eq!(text, format!("x gt {limit}"));
    }
}
