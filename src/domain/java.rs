// Java UAST vocabulary
//
// Node tags and roles emitted by the Babelfish Java driver that the
// setting extraction queries rely on.

pub mod tags {
    pub const FIELD_DECLARATION: &str = "FieldDeclaration";
    pub const VARIABLE_DECLARATION_FRAGMENT: &str = "VariableDeclarationFragment";
    pub const PARAMETERIZED_TYPE: &str = "ParameterizedType";
    pub const SIMPLE_TYPE: &str = "SimpleType";
    pub const SIMPLE_NAME: &str = "SimpleName";
    pub const QUALIFIED_NAME: &str = "QualifiedName";
    pub const METHOD_INVOCATION: &str = "MethodInvocation";
    pub const CLASS_INSTANCE_CREATION: &str = "ClassInstanceCreation";
    pub const NUMBER_LITERAL: &str = "NumberLiteral";
    pub const BOOLEAN_LITERAL: &str = "BooleanLiteral";
}

pub mod roles {
    pub const TYPE_ARGUMENTS: &str = "typeArguments";
    pub const ARGUMENTS: &str = "arguments";
    pub const NAME: &str = "name";
}

pub mod attributes {
    /// Literal text of numeric literals.
    pub const TOKEN: &str = "token";
    pub const BOOLEAN_VALUE: &str = "booleanValue";
}

pub const DEFAULT_SETTING_TYPE: &str = "Setting";
pub const DEFAULT_PROPERTY_ANCHOR: &str = "Property";
pub const DEFAULT_FILE_EXTENSION: &str = ".java";
