use crate::ast::{
    AstBlock, AstBlockView, AstStatement, AstValue, NumberValue, lower_syntax_tree,
};
use crate::cst::from_green;
use crate::parser::parse;

fn lower(source: &str) -> crate::ast::AstSourceFile {
    let parsed = parse(source);
    assert!(
        parsed.diagnostics.is_empty(),
        "unexpected diagnostics for {source:?}: {:?}",
        parsed.diagnostics
    );
    lower_syntax_tree(&from_green(&parsed.root, source))
}

fn key_value(statement: &AstStatement) -> &crate::ast::AstKeyValue {
    match statement {
        AstStatement::KeyValue(key_value) => key_value,
        other => panic!("expected key-value, got {other:?}"),
    }
}

#[test]
fn lowers_simple_key_value() {
    let ast = lower("a = 1\n");
    assert_eq!(ast.statements.len(), 1);

    let statement = key_value(&ast.statements[0]);
    assert_eq!(statement.key.raw_text, "a");
    assert_eq!(statement.operator.as_deref(), Some("="));
    match &statement.value {
        Some(AstValue::Scalar(scalar)) => assert_eq!(scalar.raw_text, "1"),
        other => panic!("expected scalar value, got {other:?}"),
    }
}

#[test]
fn lowers_operator_variants() {
    let ast = lower("intrigue >= high_skill_rating\nc:RUS ?= this\n");
    assert_eq!(key_value(&ast.statements[0]).operator.as_deref(), Some(">="));
    let second = key_value(&ast.statements[1]);
    assert_eq!(second.key.raw_text, "c:RUS");
    assert_eq!(second.operator.as_deref(), Some("?="));
}

#[test]
fn glued_scalars_concatenate_adjacent_tokens() {
    let ast = lower(
        "flavor_tur.8=yes\nprovince_id=event_target:agenda_province\n@planet_standard_scale=11\nvalue=-5\n",
    );
    assert_eq!(key_value(&ast.statements[0]).key.raw_text, "flavor_tur.8");
    match &key_value(&ast.statements[1]).value {
        Some(AstValue::Scalar(scalar)) => {
            assert_eq!(scalar.raw_text, "event_target:agenda_province");
            assert!(scalar.token_kinds.len() > 1);
        }
        other => panic!("expected scalar, got {other:?}"),
    }
    assert_eq!(
        key_value(&ast.statements[2]).key.raw_text,
        "@planet_standard_scale"
    );
    match &key_value(&ast.statements[3]).value {
        Some(AstValue::Scalar(scalar)) => assert_eq!(scalar.raw_text, "-5"),
        other => panic!("expected scalar, got {other:?}"),
    }
}

#[test]
fn quoted_flag_tracks_string_tokens() {
    let ast = lower("unit_type=\"western\"\nunit_type=western\n");
    let quoted = key_value(&ast.statements[0]);
    let unquoted = key_value(&ast.statements[1]);

    match (&quoted.value, &unquoted.value) {
        (Some(AstValue::Scalar(first)), Some(AstValue::Scalar(second))) => {
            assert_eq!(first.raw_text, "\"western\"");
            assert!(first.was_quoted);
            assert_eq!(second.raw_text, "western");
            assert!(!second.was_quoted);
        }
        other => panic!("expected two scalars, got {other:?}"),
    }
}

#[test]
fn lowers_tagged_block_value() {
    let ast = lower("color = rgb { 100 200 150 }\n");
    let statement = key_value(&ast.statements[0]);
    match &statement.value {
        Some(AstValue::Tagged(tagged)) => {
            assert_eq!(tagged.tag.raw_text, "rgb");
            assert_eq!(tagged.block.statements.len(), 3);
            assert!(tagged.block.is_array_like());
        }
        other => panic!("expected tagged block, got {other:?}"),
    }
}

#[test]
fn implicit_block_assignment_has_no_operator() {
    let ast = lower("foo{bar=qux}\n");
    let statement = key_value(&ast.statements[0]);
    assert_eq!(statement.key.raw_text, "foo");
    assert_eq!(statement.operator, None);
    assert!(matches!(statement.value, Some(AstValue::Block(_))));
}

#[test]
fn error_nodes_survive_lowering_with_raw_text() {
    let source = "a=1 ?=oops\nb=2\n";
    let parsed = parse(source);
    assert!(!parsed.diagnostics.is_empty());
    let ast = lower_syntax_tree(&from_green(&parsed.root, source));

    let key_values = ast
        .statements
        .iter()
        .filter(|statement| matches!(statement, AstStatement::KeyValue(_)))
        .count();
    let errors: Vec<_> = ast
        .statements
        .iter()
        .filter_map(|statement| match statement {
            AstStatement::Error(error) => Some(error),
            _ => None,
        })
        .collect();

    assert_eq!(key_values, 2);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].raw_text.contains("?="));
}

#[test]
fn block_shape_classification_is_exclusive() {
    let object = match &key_value(&lower("flags={ a=1 b=2 }\n").statements[0]).value {
        Some(AstValue::Block(block)) => block.clone(),
        other => panic!("expected block, got {other:?}"),
    };
    let array = match &key_value(&lower("ids={ 1 2 3 }\n").statements[0]).value {
        Some(AstValue::Block(block)) => block.clone(),
        other => panic!("expected block, got {other:?}"),
    };
    let mixed = match &key_value(&lower("levels={ 10 0=2 1=2 }\n").statements[0]).value {
        Some(AstValue::Block(block)) => block.clone(),
        other => panic!("expected block, got {other:?}"),
    };
    let empty = match &key_value(&lower("discovered_by={}\n").statements[0]).value {
        Some(AstValue::Block(block)) => block.clone(),
        other => panic!("expected block, got {other:?}"),
    };

    for (block, expected) in [
        (&object, [true, false, false, false]),
        (&array, [false, true, false, false]),
        (&mixed, [false, false, true, false]),
        (&empty, [false, false, false, true]),
    ] {
        assert_eq!(
            [
                block.is_object_like(),
                block.is_array_like(),
                block.is_mixed(),
                block.is_empty_ambiguous(),
            ],
            expected
        );
    }
}

#[test]
fn to_object_keeps_last_occurrence_and_multimap_keeps_all() {
    let block = match &key_value(&lower("obj={ a=1 b=2 a=3 }\n").statements[0]).value {
        Some(AstValue::Block(block)) => block.clone(),
        other => panic!("expected block, got {other:?}"),
    };

    let object = block.to_object().expect("object conversion");
    match object.get("a") {
        Some(Some(AstValue::Scalar(scalar))) => assert_eq!(scalar.raw_text, "3"),
        other => panic!("expected scalar, got {other:?}"),
    }

    let multimap = block.to_object_multimap().expect("multimap conversion");
    let occurrences = multimap.get("a").expect("a entries");
    assert_eq!(occurrences.len(), 2);
    match occurrences.last() {
        Some(Some(AstValue::Scalar(scalar))) => assert_eq!(scalar.raw_text, "3"),
        other => panic!("expected scalar, got {other:?}"),
    }
}

#[test]
fn mixed_blocks_reject_every_conversion() {
    let block = match &key_value(&lower("levels={ 10 0=2 }\n").statements[0]).value {
        Some(AstValue::Block(block)) => block.clone(),
        other => panic!("expected block, got {other:?}"),
    };
    assert_eq!(block.to_object(), None);
    assert_eq!(block.to_object_multimap(), None);
    assert_eq!(block.to_array(), None);
}

#[test]
fn empty_block_converts_both_ways() {
    let block = AstBlock::empty();
    assert_eq!(block.to_object().map(|object| object.len()), Some(0));
    assert_eq!(block.to_array().map(|array| array.len()), Some(0));
}

#[test]
fn view_interprets_scalars_with_quote_opt_in() {
    let ast = lower("count=10\nlabel=\"10\"\nratio=0.5\nwhen=1821.1.1\nactive=yes\n");
    let view = AstBlockView::new(AstBlock {
        statements: ast.statements.clone(),
    });

    let count = view.get_scalar("count", false).expect("count");
    assert_eq!(count.number_value, Some(NumberValue::Int(10)));

    let opaque = view.get_scalar("label", false).expect("label");
    assert_eq!(opaque.number_value, None);
    let opted_in = view.get_scalar("label", true).expect("label opted in");
    assert_eq!(opted_in.number_value, Some(NumberValue::Int(10)));

    let ratio = view.get_scalar("ratio", false).expect("ratio");
    assert_eq!(ratio.number_value, Some(NumberValue::Float(0.5)));

    let when = view.get_scalar("when", false).expect("when");
    assert_eq!(when.date_value, Some((1821, 1, 1)));

    let active = view.get_scalar("active", false).expect("active");
    assert_eq!(active.bool_value, Some(true));
}

#[test]
fn view_get_scalar_all_preserves_insertion_order() {
    let ast = lower("a=1\nb=x\na=2\n");
    let view = AstBlockView::new(AstBlock {
        statements: ast.statements.clone(),
    });

    let all = view.get_scalar_all("a", false);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].number_value, Some(NumberValue::Int(1)));
    assert_eq!(all[1].number_value, Some(NumberValue::Int(2)));
}
