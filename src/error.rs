use thiserror::Error;

/// Programmer errors raised by the graph orchestrator.
///
/// These are fatal for the call that produced them: the instance is either
/// unusable (destroyed) or was asked to do something meaningless.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error(
        "Cannot call the '{method}' method on a destroyed graph. Destroying the graph detaches \
         its listeners, so reusing it would silently do nothing. Call 'draw' with a different \
         model instead, or create a new Workflow"
    )]
    Destroyed { method: &'static str },

    #[error("Cannot fit the workflow into a viewport with no visible area ({width}x{height})")]
    EmptyViewport { width: f64, height: f64 },

    #[error("Event '{0}' is not part of this hub's vocabulary")]
    UnregisteredEvent(String),

    #[error("Unknown event name '{0}'")]
    UnknownEventName(String),

    #[error("Scene element '{0}' is missing")]
    MissingElement(String),

    #[error("The workflow group transform cannot be inverted")]
    SingularTransform,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Transient problems while rendering a single node or edge.
///
/// These are logged and the offending fragment is skipped; they never abort a draw pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderDefect {
    #[error("Can't draw an edge between two endpoints of the same kind ('{source_id}' -> '{destination_id}')")]
    SameEndpointKind {
        source_id: String,
        destination_id: String,
    },

    #[error("The {side} port '{connection_id}' is not rendered in the scene")]
    PortNotFound {
        side: &'static str,
        connection_id: String,
    },

    #[error("Node '{0}' is not rendered in the scene")]
    NodeNotFound(String),

    #[error("Malformed connection id '{0}'")]
    MalformedConnectionId(String),

    #[error("Fragment markup could not be instantiated: {0}")]
    Template(#[from] TemplateError),
}

/// Errors produced while turning markup into scene elements.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Unexpected end of markup at byte {position}")]
    UnexpectedEof { position: usize },

    #[error("Unexpected character '{found}' at byte {position}, expected {expected}")]
    UnexpectedChar {
        position: usize,
        found: char,
        expected: &'static str,
    },

    #[error("Closing tag '</{found}>' does not match open tag '<{expected}>'")]
    MismatchedClosingTag { expected: String, found: String },

    #[error("Closing tag '</{0}>' has no matching open tag")]
    UnopenedClosingTag(String),

    #[error("Invalid transform '{0}'")]
    InvalidTransform(String),

    #[error("Unknown entity '&{0};'")]
    UnknownEntity(String),
}

/// Errors produced while parsing a selector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Invalid selector '{selector}' at byte {position}: {message}")]
    Invalid {
        selector: String,
        position: usize,
        message: &'static str,
    },
}

/// Errors raised by the in-memory workflow model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Failed to parse workflow document: {0}")]
    JsonParseError(String),

    #[error("A node with id '{0}' already exists")]
    DuplicateNode(String),

    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    #[error("Port '{port_id}' not found on step '{step_id}'")]
    PortNotFound { step_id: String, port_id: String },

    #[error("Connection endpoint '{0}' does not resolve to a port")]
    UnknownEndpoint(String),

    #[error("Connection '{source_id}' -> '{destination_id}' already exists")]
    DuplicateConnection {
        source_id: String,
        destination_id: String,
    },

    #[error("Connection '{source_id}' -> '{destination_id}' not found")]
    ConnectionNotFound {
        source_id: String,
        destination_id: String,
    },
}

/// Errors raised while persisting or restoring scene snapshots.
#[derive(Error, Debug, Clone)]
pub enum SnapshotError {
    #[error("Snapshot error: {0}")]
    Generic(String),
}
