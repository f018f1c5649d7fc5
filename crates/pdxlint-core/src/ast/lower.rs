//! Lower the red CST into the typed AST.

use crate::ast::model::{
    AstBlock, AstError, AstKeyValue, AstScalar, AstSourceFile, AstStatement, AstTaggedBlockValue,
    AstValue,
};
use crate::cst::{JominiSyntaxKind, SyntaxElement, SyntaxNode};

/// Lower a red tree rooted at `ROOT` (or `SOURCE_FILE`) into an AST.
pub fn lower_syntax_tree(root: &SyntaxNode) -> AstSourceFile {
    let source_file = if root.kind() == JominiSyntaxKind::SourceFile {
        Some(root.clone())
    } else {
        first_child_node(root, JominiSyntaxKind::SourceFile)
    };
    let Some(source_file) = source_file else {
        return AstSourceFile::new(Vec::new());
    };

    let Some(statement_list) = first_child_node(&source_file, JominiSyntaxKind::StatementList)
    else {
        return AstSourceFile::new(Vec::new());
    };

    AstSourceFile::new(lower_statement_list(&statement_list))
}

fn lower_statement_list(node: &SyntaxNode) -> Vec<AstStatement> {
    let mut statements = Vec::new();
    for child in node.child_nodes() {
        match child.kind() {
            JominiSyntaxKind::KeyValue => statements.push(lower_key_value(child)),
            JominiSyntaxKind::Scalar => {
                statements.push(AstStatement::Scalar(lower_scalar(child)));
            }
            JominiSyntaxKind::Block => statements.push(AstStatement::Block(lower_block(child))),
            JominiSyntaxKind::Error => statements.push(AstStatement::Error(AstError {
                raw_text: collect_node_text(child),
            })),
            _ => {}
        }
    }
    statements
}

fn lower_key_value(node: &SyntaxNode) -> AstStatement {
    let mut key: Option<(SyntaxNode, usize)> = None;
    let mut operator: Option<String> = None;
    let mut value_node: Option<SyntaxNode> = None;

    for (index, child) in node.children().iter().enumerate() {
        match child {
            SyntaxElement::Node(child_node) => {
                if key.is_none() {
                    if child_node.kind() == JominiSyntaxKind::Scalar {
                        key = Some((child_node.clone(), index));
                    }
                    continue;
                }
                if value_node.is_none() {
                    let key_index = key.as_ref().map_or(0, |(_, key_index)| *key_index);
                    if index <= key_index {
                        continue;
                    }
                    if matches!(
                        child_node.kind(),
                        JominiSyntaxKind::Scalar
                            | JominiSyntaxKind::Block
                            | JominiSyntaxKind::TaggedBlockValue
                    ) {
                        value_node = Some(child_node.clone());
                    }
                }
            }
            SyntaxElement::Token(token) => {
                if operator.is_none() && is_assignment_kind(token.kind()) {
                    operator = Some(token.text_trimmed().to_string());
                }
            }
        }
    }

    let Some((key_node, _)) = key else {
        return AstStatement::Error(AstError {
            raw_text: collect_node_text(node),
        });
    };

    AstStatement::KeyValue(AstKeyValue {
        key: lower_scalar(&key_node),
        operator,
        value: value_node.as_ref().map(lower_value),
    })
}

fn lower_value(node: &SyntaxNode) -> AstValue {
    match node.kind() {
        JominiSyntaxKind::Block => AstValue::Block(lower_block(node)),
        JominiSyntaxKind::TaggedBlockValue => AstValue::Tagged(lower_tagged_block_value(node)),
        _ => AstValue::Scalar(lower_scalar(node)),
    }
}

fn lower_block(node: &SyntaxNode) -> AstBlock {
    match first_child_node(node, JominiSyntaxKind::StatementList) {
        Some(statement_list) => AstBlock::new(lower_statement_list(&statement_list)),
        None => AstBlock::empty(),
    }
}

fn lower_tagged_block_value(node: &SyntaxNode) -> AstTaggedBlockValue {
    let tag_node = first_child_node(node, JominiSyntaxKind::Scalar);
    let block_node = first_child_node(node, JominiSyntaxKind::Block);

    // Both parts are lowered leniently; a malformed tagged value still
    // produces an AST node.
    let tag = match &tag_node {
        Some(tag_node) => lower_scalar(tag_node),
        None => AstScalar {
            raw_text: String::new(),
            token_kinds: Vec::new(),
            was_quoted: false,
        },
    };
    let block = match &block_node {
        Some(block_node) => lower_block(block_node),
        None => AstBlock::empty(),
    };

    AstTaggedBlockValue { tag, block }
}

/// Concatenate every directly contained token (glued scalars carry more
/// than one). `was_quoted` is true only for a lone string token.
fn lower_scalar(node: &SyntaxNode) -> AstScalar {
    let mut token_kinds = Vec::new();
    let mut raw_text = String::new();

    for token in node.child_tokens() {
        token_kinds.push(token.kind());
        raw_text.push_str(token.text_trimmed());
    }

    let was_quoted = token_kinds.len() == 1 && token_kinds[0] == JominiSyntaxKind::String;
    AstScalar {
        raw_text,
        token_kinds,
        was_quoted,
    }
}

fn first_child_node(node: &SyntaxNode, kind: JominiSyntaxKind) -> Option<SyntaxNode> {
    node.child_nodes()
        .find(|child| child.kind() == kind)
        .cloned()
}

fn collect_node_text(node: &SyntaxNode) -> String {
    let mut text = String::new();
    for child in node.children() {
        match child {
            SyntaxElement::Token(token) => text.push_str(token.text_trimmed()),
            SyntaxElement::Node(child_node) => text.push_str(&collect_node_text(child_node)),
        }
    }
    text
}

fn is_assignment_kind(kind: JominiSyntaxKind) -> bool {
    matches!(
        kind,
        JominiSyntaxKind::Equal
            | JominiSyntaxKind::EqualEqual
            | JominiSyntaxKind::NotEqual
            | JominiSyntaxKind::LessThanOrEqual
            | JominiSyntaxKind::GreaterThanOrEqual
            | JominiSyntaxKind::LessThan
            | JominiSyntaxKind::GreaterThan
            | JominiSyntaxKind::QuestionEqual
    )
}
