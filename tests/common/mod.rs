//! Java UAST builders shared by the integration tests.
#![allow(dead_code)]

use setting_miner::domain::java::{attributes, roles, tags};
use setting_miner::domain::uast::Node;
use std::path::Path;

pub fn simple_name(token: &str) -> Node {
    Node::new(tags::SIMPLE_NAME).with_token(token)
}

pub fn simple_type(token: &str) -> Node {
    Node::new(tags::SIMPLE_TYPE).with_child(simple_name(token))
}

/// `Setting<argument>`
pub fn setting_of(setting_type: &str, argument: Node) -> Node {
    Node::new(tags::PARAMETERIZED_TYPE)
        .with_child(simple_type(setting_type))
        .with_child(argument.with_role(roles::TYPE_ARGUMENTS))
}

/// `Outer<Inner>` used as a type argument.
pub fn generic(outer: &str, inner: &str) -> Node {
    Node::new(tags::PARAMETERIZED_TYPE)
        .with_child(simple_type(outer))
        .with_child(simple_type(inner).with_role(roles::TYPE_ARGUMENTS))
}

pub fn string_arg(value: &str) -> Node {
    Node::new("StringLiteral").with_token(value).with_role(roles::ARGUMENTS)
}

pub fn number(value: &str) -> Node {
    Node::new(tags::NUMBER_LITERAL).with_attribute(attributes::TOKEN, value)
}

pub fn number_arg(value: &str) -> Node {
    number(value).with_role(roles::ARGUMENTS)
}

pub fn qualified(parts: &[&str]) -> Node {
    Node::new(tags::QUALIFIED_NAME).with_children(parts.iter().map(|p| simple_name(p)))
}

/// `Namespace.Anchor.flag`
pub fn long_property(namespace: &str, anchor: &str, flag: &str) -> Node {
    Node::new(tags::QUALIFIED_NAME)
        .with_role(roles::ARGUMENTS)
        .with_child(
            Node::new(tags::QUALIFIED_NAME)
                .with_child(simple_name(namespace))
                .with_child(simple_name(anchor).with_role(roles::NAME)),
        )
        .with_child(simple_name(flag).with_role(roles::NAME))
}

/// `Anchor.flag`
pub fn short_property(anchor: &str, flag: &str) -> Node {
    Node::new(tags::QUALIFIED_NAME)
        .with_role(roles::ARGUMENTS)
        .with_child(simple_name(anchor))
        .with_child(simple_name(flag).with_role(roles::NAME))
}

/// `new Setting<>(args...)`
pub fn construct(args: Vec<Node>) -> Node {
    Node::new(tags::CLASS_INSTANCE_CREATION)
        .with_child(Node::new(tags::PARAMETERIZED_TYPE).with_child(simple_type("Setting")))
        .with_children(args)
}

/// `Setting.method(args...)`
pub fn factory(method: &str, args: Vec<Node>) -> Node {
    Node::new(tags::METHOD_INVOCATION)
        .with_child(simple_name("Setting"))
        .with_child(simple_name(method).with_role(roles::NAME))
        .with_children(args)
}

pub fn field(line: u32, declared: Node, variable: &str, initializer: Node) -> Node {
    Node::new(tags::FIELD_DECLARATION)
        .at(line, 5)
        .with_child(declared)
        .with_child(
            Node::new(tags::VARIABLE_DECLARATION_FRAGMENT)
                .with_child(simple_name(variable).with_role(roles::NAME))
                .with_child(initializer),
        )
}

pub fn compilation_unit(fields: Vec<Node>) -> Node {
    Node::new("CompilationUnit").with_child(Node::new("TypeDeclaration").with_children(fields))
}

/// Write `source` and its sidecar tree `<source>.json`.
pub fn write_sidecar(source: &Path, tree: &Node) {
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    std::fs::write(source, "// java source").unwrap();
    let mut tree_path = source.as_os_str().to_owned();
    tree_path.push(".json");
    std::fs::write(tree_path, serde_json::to_vec(tree).unwrap()).unwrap();
}
