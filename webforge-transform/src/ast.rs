//! The compiled form of a transform program — an expression tree evaluated
//! once per pipeline-step invocation against a JSON input value.

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `.` — the input value itself.
    Identity,
    /// `<base>.field`.
    Field(Box<Expr>, String),
    /// `<base>[n]` — negative indices count from the end of the array.
    Index(Box<Expr>, i64),
    /// `<base>[]` — no further field/index access; used only as a
    /// well-formedness marker, arrays are otherwise addressed positionally.
    Literal(serde_json::Value),
    Object(Vec<(String, Expr)>),
    Array(Vec<Expr>),
    /// Built-in function call: `length(.items)`, `default(.x, 0)`, ...
    Call(String, Vec<Expr>),
    /// `a + b` — numeric addition if both sides are numbers, otherwise
    /// string concatenation (numbers/bools/null stringified).
    Concat(Box<Expr>, Box<Expr>),
    /// `a | b` — pipes the result of `a` into `b` as its input.
    Pipe(Box<Expr>, Box<Expr>),
}
