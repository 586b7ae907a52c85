//! Per-registration strategies: member naming, argument coercion and call
//! interception.

pub mod binder;
pub mod interceptor;
pub mod names;

pub use binder::{Binder, DefaultBinder};
pub use interceptor::{MethodInterceptor, Proceed};
pub use names::{AsDeclaredNameConverter, CamelCaseNameConverter, NameConverter};
