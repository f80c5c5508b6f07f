//! A small, deterministic JavaScript interpreter for evaluating untrusted snippets.
//!
//! Scripts run against a [`Realm`] holding their global bindings. Every evaluation is bounded by a
//! [`Budget`] of fuel and call depth, so hostile input terminates with
//! [`SandboxError::Termination`] instead of hanging the host.
//!
//! ```
//! use sandbox_js::{Budget, Realm, Value};
//!
//! let mut realm = Realm::new(Budget::default());
//! realm.evaluate("function double(x) { return x * 2; }").unwrap();
//! let value = realm.evaluate("double(21)").unwrap();
//! assert!(matches!(value, Value::Number(n) if n == 42.0));
//! ```

mod builtins;
mod env;
pub mod error;
mod interp;
pub mod ops;
pub mod realm;
pub mod string;
pub mod value;

pub use error::SandboxError;
pub use error::SandboxResult;
pub use error::TerminationReason;
pub use realm::Budget;
pub use realm::ErrorKind;
pub use realm::Realm;
pub use string::JsString;
pub use value::ObjRef;
pub use value::Value;
