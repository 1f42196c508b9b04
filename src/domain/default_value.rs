//! Default Value Serializer
//!
//! Renders the second argument of a setting constructor as the canonical string
//! stored in `defaultValue`. The `->` and `.` joiners and the literal-token vs
//! node-token distinction are part of the output format and must stay stable.

use crate::domain::java::{attributes, tags};
use crate::domain::uast::Node;

const PIECE_SEPARATOR: &str = "->";
const QUALIFIER_SEPARATOR: &str = ".";

/// Render a default-value subtree by dispatching on its tag.
pub fn render(node: &Node) -> String {
    match node.tag.as_str() {
        tags::NUMBER_LITERAL => literal_token(node).to_string(),
        tags::BOOLEAN_LITERAL => boolean_value(node),
        tags::METHOD_INVOCATION => node
            .children
            .iter()
            .map(|child| {
                if child.tag == tags::NUMBER_LITERAL {
                    literal_token(child)
                } else {
                    child.token.as_str()
                }
            })
            .collect::<Vec<_>>()
            .join(PIECE_SEPARATOR),
        tags::CLASS_INSTANCE_CREATION => node
            .children
            .iter()
            .filter_map(|child| match child.tag.as_str() {
                tags::NUMBER_LITERAL => Some(literal_token(child).to_string()),
                tags::QUALIFIED_NAME => Some(qualified_name(child)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(PIECE_SEPARATOR),
        // String literals and plain identifiers keep their token as given by the parser.
        _ => node.token.clone(),
    }
}

/// Numeric literals carry their source text in the `token` attribute; older
/// trees only set the node token.
fn literal_token(node: &Node) -> &str {
    node.attribute(attributes::TOKEN).unwrap_or(&node.token)
}

fn boolean_value(node: &Node) -> String {
    match node.attribute(attributes::BOOLEAN_VALUE).map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") => "true".to_string(),
        Some(v) if v.eq_ignore_ascii_case("false") => "false".to_string(),
        _ => node.token.clone(),
    }
}

fn qualified_name(node: &Node) -> String {
    node.children
        .iter()
        .map(|part| part.token.as_str())
        .collect::<Vec<_>>()
        .join(QUALIFIER_SEPARATOR)
}
