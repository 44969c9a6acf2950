pub mod ast;
pub mod callable;
pub mod class;
pub mod config;
pub mod control_flow;
pub mod diagnostic;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod stack;
pub mod token;
pub mod value;

pub use config::Config;
pub use diagnostic::{CollectingReporter, Diagnostic, Reporter, StderrReporter};
pub use error::{LoxError, RuntimeError};
pub use interpreter::Interpreter;
pub use session::{RunStatus, Session};
pub use value::Value;
