use std::fmt;

/// Anything an edge can terminate on: a step port, a workflow input or a workflow output.
pub trait Connectable {
    /// Stable `side/nodeId/portId` identifier.
    fn connection_id(&self) -> &str;

    fn is_visible(&self) -> bool;
}

/// Which side of a node a connection id addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSide {
    In,
    Out,
}

impl PortSide {
    pub fn prefix(&self) -> &'static str {
        match self {
            PortSide::In => "in",
            PortSide::Out => "out",
        }
    }

    /// Class of the port fragment on a node, `input-port` or `output-port`.
    pub fn port_class(&self) -> &'static str {
        match self {
            PortSide::In => "input-port",
            PortSide::Out => "output-port",
        }
    }
}

/// The three components of a connection id.
///
/// Parsing never fails: anything that does not split into `side/node/port`
/// decomposes into empty parts, because ids are probed opportunistically while
/// the pointer is still looking for a valid endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionId {
    pub side: String,
    pub node_id: String,
    pub port_id: String,
}

impl ConnectionId {
    pub fn new(side: PortSide, node_id: &str, port_id: &str) -> Self {
        Self {
            side: side.prefix().to_string(),
            node_id: node_id.to_string(),
            port_id: port_id.to_string(),
        }
    }

    pub fn parse(id: &str) -> Self {
        let mut parts = id.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(side), Some(node_id), Some(port_id), None) => Self {
                side: side.to_string(),
                node_id: node_id.to_string(),
                port_id: port_id.to_string(),
            },
            _ => Self::default(),
        }
    }

    pub fn side(&self) -> Option<PortSide> {
        match self.side.as_str() {
            "in" => Some(PortSide::In),
            "out" => Some(PortSide::Out),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.side.is_empty() && self.node_id.is_empty() && self.port_id.is_empty()
    }

    /// An id that is conventionally marked as the receiving end of a connection.
    pub fn is_input(id: &str) -> bool {
        id.starts_with("in")
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.side, self.node_id, self.port_id)
    }
}
