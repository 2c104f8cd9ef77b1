//! Static view of Python component sources, parsed with `rustpython_parser`.

pub mod expr;
pub mod outline;

mod proptests;

pub use expr::{literal_value, parse_expression, Expr};
pub use outline::{
    parse_module, ClassDef, ClassField, FunctionDef, ModuleOutline, Param, ParamKind, SyntaxError,
};
