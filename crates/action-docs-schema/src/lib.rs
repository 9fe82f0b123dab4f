// Action input schemas
//
// This crate turns action manifests and their optional type schemas into
// resolved, immutable schemas that documentation examples are checked against.

pub mod error;
pub mod manifest;
pub mod normalize;
pub mod registry;
pub mod types;

pub use error::{EntryKind, SchemaError, SchemaResult};
pub use manifest::{
    ActionIdentity, ActionSchema, ExampleText, InputSpec, SourceFile, load, type_schema_paths,
};
pub use normalize::{
    Normalized, Separator, ValueLayout, normalize_boolean, normalize_number, normalize_scalar,
    normalize_scalar_as, parse_boolean, parse_number, split_multi_value, split_multi_value_as,
};
pub use registry::{SchemaRegistry, split_uses};
pub use types::{Pattern, TypeDefinition, TypeDescriptor, TypeKind, resolve};
