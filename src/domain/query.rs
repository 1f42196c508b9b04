//! Tree Query Engine
//!
//! Restricted path expressions over [`Node`] trees. A path is a list of steps
//! evaluated left to right; every step maps the current match set to a new one
//! and an empty set short-circuits the rest of the path.
//!
//! Paths can be built with combinators:
//!
//! ```
//! use setting_miner::domain::query::Path;
//!
//! let path = Path::new()
//!     .descendant("QualifiedName")
//!     .child("SimpleName")
//!     .with_token("Property")
//!     .parent()
//!     .child("SimpleName")
//!     .with_role("name");
//! assert_eq!(
//!     path.to_string(),
//!     "//QualifiedName/SimpleName[@token='Property']/../SimpleName[@internalRole='name']"
//! );
//! ```
//!
//! or parsed from the same textual form with [`Path::parse`].
//!
//! Evaluation happens against a virtual document node whose only child is the
//! query root, so a leading `//Tag` also matches the root itself and a leading
//! `/Tag` tests the root.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::uast::{Node, INTERNAL_ROLE};

/// Attribute name that compares against [`Node::token`] instead of the attribute map.
const TOKEN_ATTRIBUTE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("empty path expression")]
    Empty,

    #[error("expected {expected} at offset {offset} in `{path}`")]
    Expected {
        expected: &'static str,
        offset: usize,
        path: String,
    },

    #[error("unterminated string literal at offset {offset} in `{path}`")]
    UnterminatedLiteral { offset: usize, path: String },

    #[error("`{step}` cannot follow `//` (offset {offset} in `{path}`)")]
    InvalidDescendant {
        step: &'static str,
        offset: usize,
        path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    Parent,
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    Any,
    Tag(String),
}

impl NodeTest {
    fn matches(&self, node: &Node) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Tag(tag) => node.tag == *tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Token(String),
    Role(String),
    Attribute { name: String, value: String },
}

impl Predicate {
    /// Map an `@name` filter onto the node field it compares.
    pub fn from_name(name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match name {
            TOKEN_ATTRIBUTE => Predicate::Token(value),
            INTERNAL_ROLE => Predicate::Role(value),
            _ => Predicate::Attribute {
                name: name.to_string(),
                value,
            },
        }
    }

    fn matches(&self, node: &Node) -> bool {
        match self {
            Predicate::Token(value) => node.token == *value,
            Predicate::Role(value) => node.role() == Some(value.as_str()),
            Predicate::Attribute { name, value } => node.attribute(name) == Some(value.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    fn accepts(&self, node: &Node) -> bool {
        self.test.matches(node) && self.predicates.iter().all(|p| p.matches(node))
    }

    /// Push every chain reachable from `chain` through this step onto `out`.
    fn expand<'a>(&self, root: &'a Node, chain: &Chain<'a>, out: &mut Vec<Chain<'a>>) {
        match self.axis {
            Axis::Child => match chain.last() {
                None => {
                    if self.accepts(root) {
                        out.push(vec![(0, root)]);
                    }
                }
                Some(&(_, node)) => {
                    for (index, child) in node.children.iter().enumerate() {
                        if self.accepts(child) {
                            let mut next = chain.clone();
                            next.push((index, child));
                            out.push(next);
                        }
                    }
                }
            },
            Axis::Descendant => {
                let mut stack: Vec<Chain<'a>> = match chain.last() {
                    None => vec![vec![(0, root)]],
                    Some(&(_, node)) => node
                        .children
                        .iter()
                        .enumerate()
                        .rev()
                        .map(|(index, child)| {
                            let mut next = chain.clone();
                            next.push((index, child));
                            next
                        })
                        .collect(),
                };
                // Pre-order walk; children are pushed in reverse to pop in source order.
                while let Some(current) = stack.pop() {
                    let Some(&(_, node)) = current.last() else {
                        continue;
                    };
                    for (index, child) in node.children.iter().enumerate().rev() {
                        let mut next = current.clone();
                        next.push((index, child));
                        stack.push(next);
                    }
                    if self.accepts(node) {
                        out.push(current);
                    }
                }
            }
            Axis::Parent => {
                // The parent of the query root is the virtual document, which is not a node.
                if chain.len() > 1 {
                    let mut next = chain.clone();
                    next.pop();
                    if next.last().is_some_and(|&(_, node)| self.accepts(node)) {
                        out.push(next);
                    }
                }
            }
            Axis::Current => {
                if chain.last().is_some_and(|&(_, node)| self.accepts(node)) {
                    out.push(chain.clone());
                }
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.axis, &self.test) {
            (Axis::Parent, _) => write!(f, "/..")?,
            (Axis::Current, _) => write!(f, "/.")?,
            (Axis::Child, NodeTest::Any) => write!(f, "/*")?,
            (Axis::Child, NodeTest::Tag(tag)) => write!(f, "/{}", tag)?,
            (Axis::Descendant, NodeTest::Any) => write!(f, "//*")?,
            (Axis::Descendant, NodeTest::Tag(tag)) => write!(f, "//{}", tag)?,
        }
        for predicate in &self.predicates {
            match predicate {
                Predicate::Token(value) => write!(f, "[@{}='{}']", TOKEN_ATTRIBUTE, value)?,
                Predicate::Role(value) => write!(f, "[@{}='{}']", INTERNAL_ROLE, value)?,
                Predicate::Attribute { name, value } => write!(f, "[@{}='{}']", name, value)?,
            }
        }
        Ok(())
    }
}

/// Nodes from the query root down to a match, each with its index in the parent.
/// Comparing the index sequences lexicographically gives document order.
type Chain<'a> = Vec<(usize, &'a Node)>;

fn sort_document_order(chains: &mut Vec<Chain<'_>>) {
    chains.sort_by(|a, b| a.iter().map(|e| e.0).cmp(b.iter().map(|e| e.0)));
    chains.dedup_by(|a, b| a.iter().map(|e| e.0).eq(b.iter().map(|e| e.0)));
}

/// A compiled path expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the textual form, e.g. `//FieldDeclaration/SimpleType[@internalRole='typeArguments']/..`.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        Parser::new(input).parse()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn descendant(self, tag: &str) -> Self {
        self.push(Step::new(Axis::Descendant, NodeTest::Tag(tag.to_string())))
    }

    pub fn child(self, tag: &str) -> Self {
        self.push(Step::new(Axis::Child, NodeTest::Tag(tag.to_string())))
    }

    pub fn any_child(self) -> Self {
        self.push(Step::new(Axis::Child, NodeTest::Any))
    }

    pub fn parent(self) -> Self {
        self.push(Step::new(Axis::Parent, NodeTest::Any))
    }

    pub fn with_token(self, value: &str) -> Self {
        self.filter(Predicate::Token(value.to_string()))
    }

    pub fn with_role(self, value: &str) -> Self {
        self.filter(Predicate::Role(value.to_string()))
    }

    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.filter(Predicate::from_name(name, value))
    }

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Attach a predicate to the last step; on an empty path it filters the query root.
    fn filter(mut self, predicate: Predicate) -> Self {
        if self.steps.is_empty() {
            self.steps.push(Step::new(Axis::Child, NodeTest::Any));
        }
        if let Some(step) = self.steps.last_mut() {
            step.predicates.push(predicate);
        }
        self
    }

    /// All nodes under `root` matching the full path, in document order, without duplicates.
    pub fn select<'a>(&self, root: &'a Node) -> Vec<&'a Node> {
        let mut contexts: Vec<Chain<'a>> = vec![Vec::new()];
        for step in &self.steps {
            let mut next = Vec::new();
            for chain in &contexts {
                step.expand(root, chain, &mut next);
            }
            if next.is_empty() {
                return Vec::new();
            }
            sort_document_order(&mut next);
            contexts = next;
        }
        contexts
            .into_iter()
            .filter_map(|chain| chain.last().map(|&(_, node)| node))
            .collect()
    }

    pub fn first<'a>(&self, root: &'a Node) -> Option<&'a Node> {
        self.select(root).into_iter().next()
    }
}

impl FromStr for Path {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

struct Parser<'s> {
    input: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(input: &'s str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Path, QueryError> {
        if self.input.trim().is_empty() {
            return Err(QueryError::Empty);
        }
        let mut path = Path::new();
        while self.pos < self.chars.len() {
            path.steps.push(self.step()?);
        }
        Ok(path)
    }

    fn step(&mut self) -> Result<Step, QueryError> {
        if !self.eat('/') {
            return Err(self.expected("`/` or `//`"));
        }
        let descendant = self.eat('/');
        let offset = self.pos;

        let mut step = if self.eat_str("..") {
            if descendant {
                return Err(self.invalid_descendant("..", offset));
            }
            Step::new(Axis::Parent, NodeTest::Any)
        } else if self.eat('.') {
            if descendant {
                return Err(self.invalid_descendant(".", offset));
            }
            Step::new(Axis::Current, NodeTest::Any)
        } else {
            let axis = if descendant { Axis::Descendant } else { Axis::Child };
            let test = if self.eat('*') {
                NodeTest::Any
            } else {
                NodeTest::Tag(self.name("node tag")?)
            };
            Step::new(axis, test)
        };

        while self.eat('[') {
            step.predicates.push(self.predicate()?);
        }
        Ok(step)
    }

    fn predicate(&mut self) -> Result<Predicate, QueryError> {
        if !self.eat('@') {
            return Err(self.expected("`@`"));
        }
        let name = self.name("attribute name")?;
        if !self.eat('=') {
            return Err(self.expected("`=`"));
        }
        let value = self.value()?;
        if !self.eat(']') {
            return Err(self.expected("`]`"));
        }
        Ok(Predicate::from_name(&name, value))
    }

    fn value(&mut self) -> Result<String, QueryError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                let offset = self.pos;
                self.pos += 1;
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == quote {
                        let value: String = self.chars[start..self.pos].iter().collect();
                        self.pos += 1;
                        return Ok(value);
                    }
                    self.pos += 1;
                }
                Err(QueryError::UnterminatedLiteral {
                    offset,
                    path: self.input.to_string(),
                })
            }
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ']') {
                    self.pos += 1;
                }
                if start == self.pos {
                    return Err(self.expected("attribute value"));
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
        }
    }

    fn name(&mut self, expected: &'static str) -> Result<String, QueryError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '$'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.expected(expected));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let len = s.chars().count();
        let matches = self.chars.len() >= self.pos + len
            && self.chars[self.pos..self.pos + len].iter().copied().eq(s.chars());
        if matches {
            self.pos += len;
        }
        matches
    }

    fn expected(&self, expected: &'static str) -> QueryError {
        QueryError::Expected {
            expected,
            offset: self.pos,
            path: self.input.to_string(),
        }
    }

    fn invalid_descendant(&self, step: &'static str, offset: usize) -> QueryError {
        QueryError::InvalidDescendant {
            step,
            offset,
            path: self.input.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // FieldDeclaration
    // ├── ParameterizedType
    // │   ├── SimpleType ── SimpleName "Setting"
    // │   └── SimpleType (typeArguments) ── SimpleName "Integer"
    // └── VariableDeclarationFragment
    //     ├── SimpleName "FOO" (name)
    //     └── QualifiedName
    //         ├── QualifiedName
    //         │   ├── SimpleName "Setting"
    //         │   └── SimpleName "Property" (name)
    //         └── SimpleName "Dynamic" (name)
    fn sample_tree() -> Node {
        Node::new("FieldDeclaration")
            .at(3, 5)
            .with_child(
                Node::new("ParameterizedType")
                    .with_child(
                        Node::new("SimpleType").with_child(Node::new("SimpleName").with_token("Setting")),
                    )
                    .with_child(
                        Node::new("SimpleType")
                            .with_role("typeArguments")
                            .with_child(Node::new("SimpleName").with_token("Integer")),
                    ),
            )
            .with_child(
                Node::new("VariableDeclarationFragment")
                    .with_child(Node::new("SimpleName").with_token("FOO").with_role("name"))
                    .with_child(
                        Node::new("QualifiedName")
                            .with_child(
                                Node::new("QualifiedName")
                                    .with_child(Node::new("SimpleName").with_token("Setting"))
                                    .with_child(
                                        Node::new("SimpleName").with_token("Property").with_role("name"),
                                    ),
                            )
                            .with_child(Node::new("SimpleName").with_token("Dynamic").with_role("name")),
                    ),
            )
    }

    fn tokens(nodes: &[&Node]) -> Vec<String> {
        nodes.iter().map(|n| n.token.clone()).collect()
    }

    #[test]
    fn test_descendant_matches_in_document_order() {
        let tree = sample_tree();
        let found = Path::parse("//SimpleName").unwrap().select(&tree);
        assert_eq!(
            tokens(&found),
            vec!["Setting", "Integer", "FOO", "Setting", "Property", "Dynamic"]
        );
    }

    #[test]
    fn test_leading_descendant_includes_root() {
        let tree = sample_tree();
        let found = Path::parse("//FieldDeclaration").unwrap().select(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line(), 3);
    }

    #[test]
    fn test_leading_child_tests_root() {
        let tree = sample_tree();
        assert_eq!(Path::parse("/FieldDeclaration").unwrap().select(&tree).len(), 1);
        assert!(Path::parse("/ParameterizedType").unwrap().select(&tree).is_empty());
    }

    #[test]
    fn test_parent_steps_climb_back_to_declaration() {
        let tree = sample_tree();
        let path = Path::parse("//FieldDeclaration/ParameterizedType/SimpleType/SimpleName[@token='Setting']/../../..")
            .unwrap();
        let found = path.select(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tag, "FieldDeclaration");
    }

    #[test]
    fn test_parent_of_root_is_empty() {
        let tree = sample_tree();
        assert!(Path::parse("/FieldDeclaration/..").unwrap().select(&tree).is_empty());
    }

    #[test]
    fn test_results_are_deduplicated() {
        let tree = sample_tree();
        // Both SimpleName children of the inner QualifiedName lead to the same parent.
        let found = Path::parse("//QualifiedName/QualifiedName/SimpleName/..")
            .unwrap()
            .select(&tree);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_long_form_property_query() {
        let tree = sample_tree();
        let path = Path::new()
            .descendant("QualifiedName")
            .child("QualifiedName")
            .child("SimpleName")
            .with_token("Property")
            .parent()
            .parent()
            .child("SimpleName")
            .with_role("name");
        assert_eq!(tokens(&path.select(&tree)), vec!["Dynamic"]);
    }

    #[test]
    fn test_wildcard_and_role_filter() {
        let tree = sample_tree();
        let found = Path::parse("//ParameterizedType/*[@internalRole='typeArguments']")
            .unwrap()
            .select(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].children[0].token, "Integer");
    }

    #[test]
    fn test_attribute_filter() {
        let tree = Node::new("Root").with_child(Node::new("NumberLiteral").with_attribute("token", "5"));
        // `@token` compares the node token, other names compare attributes.
        assert!(Path::parse("//NumberLiteral[@token='5']").unwrap().select(&tree).is_empty());
        let tree = Node::new("Root").with_child(Node::new("BooleanLiteral").with_attribute("booleanValue", "true"));
        assert_eq!(
            Path::parse("//BooleanLiteral[@booleanValue=true]").unwrap().select(&tree).len(),
            1
        );
    }

    #[test]
    fn test_no_match_short_circuits() {
        let tree = sample_tree();
        assert!(Path::parse("//MethodInvocation/*").unwrap().select(&tree).is_empty());
        assert!(Path::new().select(&tree).is_empty());
    }

    #[test]
    fn test_predicate_on_empty_path_filters_root() {
        let tree = sample_tree();
        assert!(Path::new().with_token("nope").first(&tree).is_none());
        assert!(Path::new().with_attribute("missing", "x").first(&tree).is_none());
    }

    #[rstest]
    #[case("//FieldDeclaration/VariableDeclarationFragment/SimpleName")]
    #[case("//FieldDeclaration/ParameterizedType/ParameterizedType[@internalRole='typeArguments']/*")]
    #[case("//QualifiedName/SimpleName[@token='Property']/../SimpleName[@internalRole='name']")]
    #[case("/a/./b[@k='v'][@token='t']")]
    fn test_display_round_trips(#[case] input: &str) {
        let path = Path::parse(input).unwrap();
        assert_eq!(path.to_string(), input);
        assert_eq!(input.parse::<Path>().unwrap(), path);
    }

    #[test]
    fn test_double_quoted_and_bare_values() {
        let quoted = Path::parse(r#"//SimpleName[@token="Setting"]"#).unwrap();
        let bare = Path::parse("//SimpleName[@token=Setting]").unwrap();
        assert_eq!(quoted, bare);
    }

    #[rstest]
    #[case("", QueryError::Empty)]
    #[case("   ", QueryError::Empty)]
    #[case("FieldDeclaration", QueryError::Expected { expected: "`/` or `//`", offset: 0, path: "FieldDeclaration".into() })]
    #[case("//", QueryError::Expected { expected: "node tag", offset: 2, path: "//".into() })]
    #[case("//..", QueryError::InvalidDescendant { step: "..", offset: 2, path: "//..".into() })]
    #[case("//A[token='x']", QueryError::Expected { expected: "`@`", offset: 4, path: "//A[token='x']".into() })]
    #[case("//A[@token]", QueryError::Expected { expected: "`=`", offset: 10, path: "//A[@token]".into() })]
    #[case("//A[@token='x", QueryError::UnterminatedLiteral { offset: 11, path: "//A[@token='x".into() })]
    #[case("//A[@token=]", QueryError::Expected { expected: "attribute value", offset: 11, path: "//A[@token=]".into() })]
    fn test_parse_errors(#[case] input: &str, #[case] expected: QueryError) {
        assert_eq!(Path::parse(input).unwrap_err(), expected);
    }
}
