use std::borrow::Cow;

/// Errors raised by tree operations that a real document would reject.
#[ln_derive::ln_error]
pub enum DomError {
    /// Inserting the node would create a cycle, or the parent cannot hold children.
    #[error("Hierarchy request error{}: {message}", format_context(.context))]
    HierarchyRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The node is not a child of the element it was removed from.
    #[error("Node not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid URL{}: {source}", format_context(.context))]
    InvalidUrl { source: url::ParseError, context: Option<Cow<'static, str>> },

    #[error("Internal DOM error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
