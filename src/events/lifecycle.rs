use crate::error::GraphError;
use std::fmt;
use std::str::FromStr;

/// Events a [`Workflow`](crate::graph::Workflow) publishes to its host and plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphEvent {
    ConnectionCreate,
    AppCreateStep,
    AppCreateInput,
    AppCreateOutput,
    BeforeChange,
    AfterChange,
    AfterRender,
    SelectionChange,
}

impl GraphEvent {
    pub const ALL: [GraphEvent; 8] = [
        GraphEvent::ConnectionCreate,
        GraphEvent::AppCreateStep,
        GraphEvent::AppCreateInput,
        GraphEvent::AppCreateOutput,
        GraphEvent::BeforeChange,
        GraphEvent::AfterChange,
        GraphEvent::AfterRender,
        GraphEvent::SelectionChange,
    ];

    /// The wire name hosts use, e.g. `app.create.step`.
    pub fn name(&self) -> &'static str {
        match self {
            GraphEvent::ConnectionCreate => "connection.create",
            GraphEvent::AppCreateStep => "app.create.step",
            GraphEvent::AppCreateInput => "app.create.input",
            GraphEvent::AppCreateOutput => "app.create.output",
            GraphEvent::BeforeChange => "beforeChange",
            GraphEvent::AfterChange => "afterChange",
            GraphEvent::AfterRender => "afterRender",
            GraphEvent::SelectionChange => "selectionChange",
        }
    }
}

impl fmt::Display for GraphEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GraphEvent {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphEvent::ALL
            .iter()
            .find(|e| e.name() == s)
            .copied()
            .ok_or_else(|| GraphError::UnknownEventName(s.to_string()))
    }
}
