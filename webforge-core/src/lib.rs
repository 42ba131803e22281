//! Core data types shared by the Webforge lexer, parser, and runtime:
//! the per-request scratch arena, the `Value` literal abstraction, the
//! intermediate tree (`Site` and friends), the fixed-bucket route index
//! primitive, and route-parameter extraction.

pub mod arena;
pub mod ast;
pub mod error;
pub mod index;
pub mod route_pattern;
pub mod strbuf;
pub mod value;

pub mod prelude {
    pub use crate::arena::ScratchArena;
    pub use crate::ast::*;
    pub use crate::error::{IncludeError, ParseError};
    pub use crate::index::BucketMap;
    pub use crate::route_pattern::{match_route, RouteParams, MAX_ROUTE_PARAMS};
    pub use crate::strbuf::StringAssembler;
    pub use crate::value::Value;
}
