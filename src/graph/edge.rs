use super::connectable::ConnectionId;
use crate::error::RenderDefect;
use crate::geometry::Point;
use crate::geometry::matrix::format_number;
use crate::model::ConnectionModel;
use crate::scene::{Compound, ElementId, Scene, Selector, escape_attribute};
use tracing::{error, trace, warn};

/// Horizontal direction a connection path is forced to leave and enter in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
}

/// Cubic bezier between two points, as SVG path data.
///
/// With no direction both control points sit on the horizontal midpoint. With
/// [`Direction::Right`] the path leaves the source heading right and enters the
/// destination from the left; [`Direction::Left`] mirrors that.
pub fn make_connection_path(x1: f64, y1: f64, x2: f64, y2: f64, direction: Option<Direction>) -> String {
    let half_span = (x1 - x2).abs() / 2.0;
    let (out_x, in_x) = match direction {
        None => ((x1 + x2) / 2.0, (x1 + x2) / 2.0),
        Some(Direction::Right) => (x1 + half_span, x2 - half_span),
        Some(Direction::Left) => (x1 - half_span, x2 + half_span),
    };
    let n = format_number;
    format!(
        "M {} {} C {} {} {} {} {} {}",
        n(x1),
        n(y1),
        n(out_x),
        n(y1),
        n(in_x),
        n(y2),
        n(x2),
        n(y2)
    )
}

/// Materializes, updates and locates edge fragments.
pub struct Edge;

impl Edge {
    /// Markup for one connection, drawn between ports already rendered in `container`.
    ///
    /// An edge with an invisible endpoint renders as an empty string. Endpoints
    /// of the same kind or ports missing from the scene are reported as a
    /// [`RenderDefect`] so the caller can skip just this edge.
    pub fn make_template(
        connection: &ConnectionModel,
        scene: &Scene,
        container: ElementId,
        states: &str,
    ) -> Result<String, RenderDefect> {
        if !connection.is_visible() {
            return Ok(String::new());
        }
        let source = &connection.source;
        let destination = &connection.destination;

        if source.kind == destination.kind {
            let defect = RenderDefect::SameEndpointKind {
                source_id: source.id.clone(),
                destination_id: destination.id.clone(),
            };
            error!(source = %source.id, destination = %destination.id, "{}", defect);
            return Err(defect);
        }

        let source_point = Self::port_position(scene, container, &source.id, "source")?;
        let destination_point = Self::port_position(scene, container, &destination.id, "destination")?;

        let source_id = ConnectionId::parse(&source.id);
        let destination_id = ConnectionId::parse(&destination.id);
        let path = make_connection_path(
            source_point.x,
            source_point.y,
            destination_point.x,
            destination_point.y,
            Some(Direction::Right),
        );
        let class = if states.trim().is_empty() {
            "edge".to_string()
        } else {
            format!("edge {}", states.trim())
        };

        Ok(format!(
            concat!(
                r#"<g tabindex="-1" class="{class}" "#,
                r#"data-source-port="{source_port}" data-destination-port="{destination_port}" "#,
                r#"data-source-node="{source_node}" data-source-connection="{source_connection}" "#,
                r#"data-destination-connection="{destination_connection}" "#,
                r#"data-destination-node="{destination_node}">"#,
                r#"<path class="sub-edge outer" d="{path}"/>"#,
                r#"<path class="sub-edge inner" d="{path}"/>"#,
                "</g>"
            ),
            class = escape_attribute(&class),
            source_port = escape_attribute(&source_id.port_id),
            destination_port = escape_attribute(&destination_id.port_id),
            source_node = escape_attribute(&source_id.node_id),
            source_connection = escape_attribute(&source.id),
            destination_connection = escape_attribute(&destination.id),
            destination_node = escape_attribute(&destination_id.node_id),
            path = path,
        ))
    }

    /// Builds a detached edge fragment for a path that has no model connection yet.
    ///
    /// The node ids of both known endpoints are added as classes, so every edge
    /// touching a node can be selected with that node's id.
    pub fn spawn(
        scene: &mut Scene,
        path: &str,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> ElementId {
        let source_id = source.map(ConnectionId::parse).unwrap_or_default();
        let destination_id = destination.map(ConnectionId::parse).unwrap_or_default();

        let edge = scene.create_element("g");
        scene.add_class(edge, "edge");
        for node in [&source_id.node_id, &destination_id.node_id] {
            if !node.is_empty() {
                scene.add_class(edge, node);
            }
        }
        scene.set_attribute(edge, "tabindex", "-1");
        scene.set_attribute(edge, "data-destination-node", &destination_id.node_id);
        scene.set_attribute(edge, "data-destination-port", &destination_id.port_id);
        scene.set_attribute(edge, "data-source-port", &source_id.port_id);
        scene.set_attribute(edge, "data-source-node", &source_id.node_id);
        scene.set_attribute(edge, "data-source-connection", source.unwrap_or_default());
        scene.set_attribute(
            edge,
            "data-destination-connection",
            destination.unwrap_or_default(),
        );

        for layer in ["outer", "inner"] {
            let sub_edge = scene.create_element("path");
            scene.add_class(sub_edge, "sub-edge");
            scene.add_class(sub_edge, layer);
            scene.set_attribute(sub_edge, "d", path);
            scene.append_child(edge, sub_edge);
        }
        edge
    }

    /// Draws or redraws the edge between two rendered ports.
    ///
    /// An id on the receiving side is always treated as the destination,
    /// whatever order the arguments come in. When an edge for the pair already
    /// exists its path is updated in place; otherwise a new edge is inserted
    /// before the first node so it paints underneath.
    pub fn spawn_between_connection_ids(
        scene: &mut Scene,
        root: ElementId,
        source: &str,
        destination: &str,
    ) -> Result<ElementId, RenderDefect> {
        let (source, destination) = if ConnectionId::is_input(source) {
            (destination, source)
        } else {
            (source, destination)
        };

        let source_point = Self::port_position(scene, root, source, "source")?;
        let destination_point = Self::port_position(scene, root, destination, "destination")?;
        let path = make_connection_path(
            source_point.x,
            source_point.y,
            destination_point.x,
            destination_point.y,
            Some(Direction::Right),
        );

        if let Some(existing) = Self::find_edge(scene, root, source, destination) {
            let sub_edges = scene.query_all(existing, &Selector::class("sub-edge"));
            for sub_edge in sub_edges {
                scene.set_attribute(sub_edge, "d", &path);
            }
            trace!(source, destination, "updated edge in place");
            return Ok(existing);
        }

        let edge = Self::spawn(scene, &path, Some(source), Some(destination));
        let first_node = scene.query(root, &Selector::class("node"));
        let parent = first_node.and_then(|n| scene.parent(n)).unwrap_or(root);
        scene.insert_before(parent, edge, first_node);
        trace!(source, destination, "spawned edge");
        Ok(edge)
    }

    /// The edge fragment connecting exactly these two connection ids.
    pub fn find_edge(
        scene: &Scene,
        root: ElementId,
        source: &str,
        destination: &str,
    ) -> Option<ElementId> {
        let selector = Selector::new(
            Compound::new()
                .class("edge")
                .attr("data-source-connection", source)
                .attr("data-destination-connection", destination),
        );
        scene.query(root, &selector)
    }

    pub fn parse_connection_id(id: &str) -> ConnectionId {
        ConnectionId::parse(id)
    }

    /// Origin of the port carrying `connection_id`, in `root`'s user space.
    fn port_position(
        scene: &Scene,
        root: ElementId,
        connection_id: &str,
        side: &'static str,
    ) -> Result<Point, RenderDefect> {
        let selector = Selector::new(
            Compound::new()
                .class("port")
                .attr("data-connection-id", connection_id),
        );
        let port = scene.query(root, &selector).ok_or_else(|| {
            warn!(side, connection_id, "cannot find port to attach the edge to");
            RenderDefect::PortNotFound {
                side,
                connection_id: connection_id.to_string(),
            }
        })?;
        scene
            .local_to_ancestor(port, root)
            .map(|m| m.origin())
            .ok_or_else(|| RenderDefect::PortNotFound {
                side,
                connection_id: connection_id.to_string(),
            })
    }
}
