//! Property Flag Resolver
//!
//! Property flags show up fully qualified (`Setting.Property.Dynamic`) or
//! abbreviated (`Property.Dynamic`) depending on the imports of the file. Both
//! resolve to the bare flag name.

use crate::domain::java::{roles, tags};
use crate::domain::query::Path;
use crate::domain::uast::Node;

#[derive(Debug, Clone)]
pub struct PropertyResolver {
    long_form: Path,
    short_form: Path,
}

impl PropertyResolver {
    pub fn new(anchor: &str) -> Self {
        // Namespace.Anchor.Flag: the anchor sits in a QualifiedName nested two levels below the flag's parent.
        let long_form = Path::new()
            .descendant(tags::QUALIFIED_NAME)
            .child(tags::QUALIFIED_NAME)
            .child(tags::SIMPLE_NAME)
            .with_token(anchor)
            .parent()
            .parent()
            .child(tags::SIMPLE_NAME)
            .with_role(roles::NAME);

        // Anchor.Flag
        let short_form = Path::new()
            .descendant(tags::QUALIFIED_NAME)
            .child(tags::SIMPLE_NAME)
            .with_token(anchor)
            .parent()
            .child(tags::SIMPLE_NAME)
            .with_role(roles::NAME);

        Self {
            long_form,
            short_form,
        }
    }

    /// Flags referenced by each argument, in argument order. The short form is
    /// consulted only for arguments without any long-form match.
    pub fn resolve(&self, arguments: &[&Node]) -> Vec<String> {
        let mut flags = Vec::new();
        for argument in arguments {
            let mut found = self.long_form.select(argument);
            if found.is_empty() {
                found = self.short_form.select(argument);
            }
            flags.extend(found.into_iter().map(|name| name.token.clone()));
        }
        flags
    }
}
