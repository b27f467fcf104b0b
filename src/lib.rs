//! A JSON Schema draft-4 validator.
//!
//! [`Schema::compile`] turns a parsed schema document into an immutable
//! tree; [`validate`] walks a document against it and returns a [`Report`]
//! of every violation, with best-match diagnostics for `anyOf`/`oneOf`.
//!
//! ```
//! use serde_json::json;
//!
//! let schema = jsonvet::Schema::compile(&json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string", "minLength": 1}},
//!     "required": ["name"],
//! }))?;
//!
//! let report = jsonvet::validate(&schema, &json!({"name": ""}));
//! assert!(!report.valid());
//! assert_eq!(report.to_json(), json!({"(root).name": [["minLength", 1]]}));
//! # Ok::<(), jsonvet::CompileError>(())
//! ```

pub mod canon;
pub mod cli;
pub mod compile;
pub mod context;
pub mod prep;
pub mod report;
pub mod schema;
pub mod validate;
pub mod value;

pub use compile::CompileError;
pub use report::{Keyword, Report, ValidationError};
pub use schema::Schema;
pub use validate::validate;
pub use value::JsonType;
