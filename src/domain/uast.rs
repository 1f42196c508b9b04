// UAST data structures for Setting Miner.
// These types mirror the per-file trees handed over by the parsing service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Attribute key that Babelfish uses to carry a node's role inside `Properties`.
pub const INTERNAL_ROLE: &str = "internalRole";

/// Line/column of the first character of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, alias = "Line")]
    pub line: u32,
    #[serde(default, alias = "Col")]
    pub col: u32,
}

/// A node in the universal abstract syntax tree.
///
/// JSON input may use either these field names or the Babelfish v1 names
/// (`InternalType`, `Token`, `Properties`, `Children`, `StartPosition`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(alias = "InternalType")]
    pub tag: String,
    #[serde(default, alias = "Token", deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(default, alias = "Role")]
    pub role: Option<String>,
    #[serde(default, alias = "Properties", deserialize_with = "null_as_default")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, alias = "Children", deserialize_with = "null_as_default")]
    pub children: Vec<Node>,
    #[serde(default, alias = "StartPosition")]
    pub position: Option<Position>,
}

// Go-produced trees encode empty slices and maps as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.position = Some(Position { line, col });
        self
    }

    /// Decode a tree from JSON and normalize it.
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut node: Node = decode_json(bytes)?;
        node.normalize();
        Ok(node)
    }

    /// Lift `attributes["internalRole"]` into `role` wherever `role` is unset.
    pub fn normalize(&mut self) {
        let mut stack = vec![self];
        while let Some(Node {
            role,
            attributes,
            children,
            ..
        }) = stack.pop()
        {
            if role.is_none() {
                *role = attributes.get(INTERNAL_ROLE).cloned();
            }
            stack.extend(children.iter_mut());
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Source line of the node, `0` when the parser gave no position.
    pub fn line(&self) -> u32 {
        self.position.map(|p| p.line).unwrap_or(0)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }
}

/// Decode JSON without serde_json's nesting limit. Every tree level costs two
/// JSON levels, so the default limit rejects trees deeper than 63 nodes; the
/// stack grows on the heap instead.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    let mut json = serde_json::Deserializer::from_slice(bytes);
    json.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_babelfish_shape() {
        let json = r#"{
            "InternalType": "SimpleName",
            "Token": "Setting",
            "Properties": {"internalRole": "name"},
            "Children": null,
            "StartPosition": {"Offset": 120, "Line": 7, "Col": 12}
        }"#;

        let node = Node::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(node.tag, "SimpleName");
        assert_eq!(node.token, "Setting");
        assert_eq!(node.role(), Some("name"));
        assert!(node.children.is_empty());
        assert_eq!(node.line(), 7);
    }

    #[test]
    fn test_decode_native_shape() {
        let json = r#"{
            "tag": "QualifiedName",
            "role": "arguments",
            "children": [{"tag": "SimpleName", "token": "Property"}]
        }"#;

        let node = Node::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(node.role(), Some("arguments"));
        assert_eq!(node.children[0].token, "Property");
        assert_eq!(node.line(), 0);
        assert_eq!(node.size(), 2);
    }

    #[test]
    fn test_normalize_keeps_explicit_role() {
        let mut node = Node::new("SimpleName")
            .with_role("name")
            .with_attribute(INTERNAL_ROLE, "typeArguments");
        node.normalize();
        assert_eq!(node.role(), Some("name"));
    }

    fn nested_json(depth: usize) -> String {
        let mut json = String::from(r#"{"InternalType":"SimpleName","Token":"leaf","Properties":{"internalRole":"name"}}"#);
        for _ in 1..depth {
            json = format!(
                r#"{{"InternalType":"IfStatement","Properties":{{"internalRole":"elseStatement"}},"Children":[{}]}}"#,
                json
            );
        }
        json
    }

    #[test]
    fn test_decode_deep_tree() {
        let node = Node::from_json_slice(nested_json(200).as_bytes()).unwrap();
        assert_eq!(node.size(), 200);
        assert_eq!(node.role(), Some("elseStatement"));

        let mut leaf = &node;
        while let Some(child) = leaf.children.first() {
            leaf = child;
        }
        assert_eq!(leaf.token, "leaf");
        assert_eq!(leaf.role(), Some("name"));
    }

    #[test]
    fn test_decode_rejects_trailing_garbage() {
        assert!(Node::from_json_slice(br#"{"tag":"A"} {"tag":"B"}"#).is_err());
    }
}
