//! Setting Record Extractor
//!
//! Turns the field declarations of one file tree into [`SettingRecord`]s. Every
//! field is resolved through an ordered list of query fallbacks:
//! - type: direct type argument, then the nested generic chain
//! - arguments: factory method call, then direct `new` construction
//! - properties: long-form references, then short-form ones (see [`PropertyResolver`])

use tracing::{debug, warn};

use crate::domain::default_value;
use crate::domain::java::{roles, tags, DEFAULT_PROPERTY_ANCHOR, DEFAULT_SETTING_TYPE};
use crate::domain::properties::PropertyResolver;
use crate::domain::query::Path;
use crate::domain::setting::{Diagnostic, DiagnosticKind, SettingRecord};
use crate::domain::uast::Node;

/// Key, default value and at least one more argument.
pub const MIN_ARGUMENTS: usize = 3;

const NESTED_TYPE_SEPARATOR: &str = " of ";

/// Result of extracting one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileExtraction {
    pub records: Vec<SettingRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct SettingExtractor {
    candidates: Path,
    raw_name: Path,
    direct_type: Path,
    nested_type: Path,
    factory_arguments: Path,
    constructor_arguments: Path,
    properties: PropertyResolver,
}

impl Default for SettingExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SETTING_TYPE, DEFAULT_PROPERTY_ANCHOR)
    }
}

impl SettingExtractor {
    pub fn new(setting_type: &str, property_anchor: &str) -> Self {
        let declaration = || Path::new().descendant(tags::FIELD_DECLARATION);
        let fragment = || declaration().child(tags::VARIABLE_DECLARATION_FRAGMENT);

        Self {
            candidates: declaration()
                .child(tags::PARAMETERIZED_TYPE)
                .child(tags::SIMPLE_TYPE)
                .child(tags::SIMPLE_NAME)
                .with_token(setting_type)
                .parent()
                .parent()
                .parent(),
            raw_name: fragment().child(tags::SIMPLE_NAME),
            direct_type: declaration()
                .child(tags::PARAMETERIZED_TYPE)
                .child(tags::SIMPLE_TYPE)
                .with_role(roles::TYPE_ARGUMENTS)
                .child(tags::SIMPLE_NAME),
            nested_type: declaration()
                .child(tags::PARAMETERIZED_TYPE)
                .child(tags::PARAMETERIZED_TYPE)
                .with_role(roles::TYPE_ARGUMENTS)
                .any_child(),
            factory_arguments: fragment()
                .child(tags::METHOD_INVOCATION)
                .any_child()
                .with_role(roles::ARGUMENTS),
            constructor_arguments: fragment()
                .child(tags::CLASS_INSTANCE_CREATION)
                .any_child()
                .with_role(roles::ARGUMENTS),
            properties: PropertyResolver::new(property_anchor),
        }
    }

    /// Extract every setting declared in `root`. `source_file` is the path
    /// recorded as provenance.
    pub fn extract(&self, root: &Node, source_file: &str) -> FileExtraction {
        let mut extraction = FileExtraction::default();

        for candidate in self.candidates.select(root) {
            match self.extract_candidate(candidate, source_file) {
                Ok(record) => extraction.records.push(record),
                Err(diagnostic) => {
                    warn!("{}", diagnostic);
                    extraction.diagnostics.push(diagnostic);
                }
            }
        }

        debug!(
            file = source_file,
            records = extraction.records.len(),
            skipped = extraction.diagnostics.len(),
            "extracted settings"
        );
        extraction
    }

    /// Build the record for one field declaration, or explain why it was skipped.
    pub fn extract_candidate(&self, candidate: &Node, source_file: &str) -> Result<SettingRecord, Diagnostic> {
        let raw_name = self.raw_name(candidate);
        let arguments = self.arguments(candidate);

        if arguments.len() < MIN_ARGUMENTS {
            return Err(Diagnostic {
                source_file: source_file.to_string(),
                source_line: candidate.line(),
                raw_name: (!raw_name.is_empty()).then_some(raw_name),
                kind: DiagnosticKind::InsufficientArguments { found: arguments.len() },
            });
        }

        Ok(SettingRecord {
            name: arguments[0].token.clone(),
            raw_name,
            value_type: self.value_type(candidate),
            properties: self.properties.resolve(&arguments),
            default_value: default_value::render(arguments[1]),
            source_line: candidate.line(),
            source_file: source_file.to_string(),
        })
    }

    fn raw_name(&self, candidate: &Node) -> String {
        self.raw_name
            .first(candidate)
            .map(|name| name.token.clone())
            .unwrap_or_default()
    }

    fn value_type(&self, candidate: &Node) -> String {
        if let Some(simple) = self.direct_type.first(candidate) {
            return simple.token.clone();
        }

        self.nested_type
            .select(candidate)
            .into_iter()
            .map(|argument| {
                argument
                    .children
                    .first()
                    .map_or(argument.token.as_str(), |name| name.token.as_str())
            })
            .collect::<Vec<_>>()
            .join(NESTED_TYPE_SEPARATOR)
    }

    fn arguments<'a>(&self, candidate: &'a Node) -> Vec<&'a Node> {
        let factory = self.factory_arguments.select(candidate);
        if !factory.is_empty() {
            return factory;
        }
        self.constructor_arguments.select(candidate)
    }
}
