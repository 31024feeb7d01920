//! Mapspec Core - declarative JSON-to-JSON mapping engine
//!
//! A mapping specification is a template tree whose leaves are rules. Mapping
//! an input document through it produces an output document with the
//! template's shape, plus an ordered audit log explaining how every value
//! was derived.
//!
//! # Main Components
//!
//! - **Specification model**: templates parsed once into a typed tree ([`spec`])
//! - **Mapping engine**: rule resolution, tree walk and profile overrides ([`mapping`])
//! - **Expressions**: a sandboxed language for `compute` rules ([`expression`])
//! - **Error Handling**: error types using `thiserror` and `anyhow`
//!
//! # Example
//!
//! ```
//! use mapspec_core::{execute, ExecuteOptions};
//! use serde_json::json;
//!
//! # fn example() -> mapspec_core::Result<()> {
//! let spec = json!({
//!     "mapping": {
//!         "loanAmount": { "from": "loan.amount", "convert": "toDecimal" },
//!         "loanType": { "from": "loan.type", "enum": "loanType", "default": "OTHER" }
//!     },
//!     "enums": { "loanType": { "Conventional": "CONV" } }
//! });
//! let input = json!({ "loan": { "amount": 250000, "type": "Conventional" } });
//!
//! let outcome = execute(&spec, &input, &ExecuteOptions::default())?;
//! assert_eq!(outcome.result, json!({ "loanAmount": "250000", "loanType": "CONV" }));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod clock;
pub mod error;
pub mod expression;
pub mod mapping;
pub mod spec;
pub mod value;

// Re-export main types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use expression::{CompiledExpression, ExpressionError};
pub use mapping::{
    execute, Aliases, AuditLog, BuiltinConverter, ConverterFn, CustomConverters, ExecuteOptions,
    MappingExecutor, MappingOutcome,
};
pub use spec::{EnumTable, EnumTables, FromPaths, MappingSpec, Profile, Rule, SpecSummary, Template, WhenBranch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
