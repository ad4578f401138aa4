// Graph Snapshot - Nodes, pins and links the schema reasons about
//
// The schema never mutates a graph. Callers hand it a snapshot, ask for a
// verdict, and carry out whatever the verdict implies themselves.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pin_types::{PinDirection, PinType, PinTypeError, TypeDatabase, TypeHandle, parse_pin_type};
use serde::{Deserialize, Serialize};

/// Name of the implicit target pin of a function call
pub const SELF_PIN_NAME: &str = "self";

// ─────────────────────────────────────────────────────────────────────────────
// Pins and Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A pin instance on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPin {
    /// Pin name (used in connections)
    pub name: String,
    pub direction: PinDirection,
    #[serde(rename = "type")]
    pub pin_type: PinType,
}

impl GraphPin {
    pub fn input(name: &str, pin_type: PinType) -> Self {
        Self {
            name: name.to_string(),
            direction: PinDirection::Input,
            pin_type,
        }
    }

    pub fn output(name: &str, pin_type: PinType) -> Self {
        Self {
            name: name.to_string(),
            direction: PinDirection::Output,
            pin_type,
        }
    }
}

/// What a node does, as far as connection rules care
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Generic,
    /// Call of a member or library function
    CallFunction {
        /// Class declaring the called function
        #[serde(default)]
        function_class: Option<TypeHandle>,
        #[serde(default)]
        has_return_value: bool,
        #[serde(default)]
        pure: bool,
        #[serde(default)]
        latent: bool,
        /// Reference parameters that get a temporary when left unconnected
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        auto_create_ref_term: Vec<String>,
    },
}

impl NodeKind {
    /// Impure call with no return value and no latent action
    pub fn call(function_class: TypeHandle) -> Self {
        NodeKind::CallFunction {
            function_class: Some(function_class),
            has_return_value: false,
            pure: false,
            latent: false,
            auto_create_ref_term: Vec::new(),
        }
    }
}

/// A node instance within a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique instance ID within this graph
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub pins: Vec<GraphPin>,
}

impl GraphNode {
    pub fn new(id: &str, kind: NodeKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            pins: Vec::new(),
        }
    }

    pub fn with_pin(mut self, pin: GraphPin) -> Self {
        self.pins.push(pin);
        self
    }

    /// Get a pin by name
    pub fn get_pin(&self, name: &str) -> Option<&GraphPin> {
        self.pins.iter().find(|p| p.name == name)
    }

    pub fn is_call_function(&self) -> bool {
        matches!(self.kind, NodeKind::CallFunction { .. })
    }

    /// Class declaring the function this node calls
    pub fn function_class(&self) -> Option<TypeHandle> {
        match &self.kind {
            NodeKind::CallFunction { function_class, .. } => *function_class,
            NodeKind::Generic => None,
        }
    }

    /// Whether the self pin may receive several targets (fanned out per target
    /// when the graph is compiled)
    ///
    /// `input_as_array` is true when asked on behalf of array expansion; call
    /// nodes answer the same either way.
    pub fn allows_multiple_selfs(&self, _input_as_array: bool) -> bool {
        match &self.kind {
            NodeKind::CallFunction {
                has_return_value,
                pure,
                latent,
                ..
            } => !has_return_value && !pure && !latent,
            NodeKind::Generic => false,
        }
    }

    pub fn is_auto_create_ref_term(&self, pin_name: &str) -> bool {
        match &self.kind {
            NodeKind::CallFunction {
                auto_create_ref_term,
                ..
            } => auto_create_ref_term.iter().any(|p| p == pin_name),
            NodeKind::Generic => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Addresses and Connections
// ─────────────────────────────────────────────────────────────────────────────

/// Location of a pin: node ID plus pin name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinAddress {
    pub node: String,
    pub pin: String,
}

impl PinAddress {
    pub fn new(node: &str, pin: &str) -> Self {
        Self {
            node: node.to_string(),
            pin: pin.to_string(),
        }
    }

    /// Parse a "node_id.pin_name" string
    pub fn parse(text: &str) -> Option<Self> {
        let (node, pin) = text.split_once('.')?;
        if node.is_empty() || pin.is_empty() {
            return None;
        }
        Some(Self::new(node, pin))
    }
}

impl fmt::Display for PinAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.pin)
    }
}

impl TryFrom<String> for PinAddress {
    type Error = GraphError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text).ok_or(GraphError::InvalidAddress(text))
    }
}

impl From<PinAddress> for String {
    fn from(address: PinAddress) -> Self {
        address.to_string()
    }
}

impl std::str::FromStr for PinAddress {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| GraphError::InvalidAddress(s.to_string()))
    }
}

/// A link between an output pin and an input pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Source: "node_id.pin_name"
    pub from: String,
    /// Destination: "node_id.pin_name"
    pub to: String,
}

impl Connection {
    pub fn new(from: &PinAddress, to: &PinAddress) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// The other end of this link, if `address` is one of its ends
    fn peer_of(&self, address: &str) -> Option<&str> {
        if self.from == address {
            Some(&self.to)
        } else if self.to == address {
            Some(&self.from)
        } else {
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Veto Hooks
// ─────────────────────────────────────────────────────────────────────────────

/// Node-specific rule that can refuse a connection before any type checks
///
/// Implementations must be read-only queries.
pub trait ConnectionVeto: Send + Sync {
    /// Reason to refuse connecting `own` (a pin on the vetoing node) to `other`
    fn try_veto(&self, own: &PinView<'_>, other: &PinView<'_>) -> Option<String>;
}

/// Wrapper that turns a closure into a veto hook
pub struct FnVeto<F>
where
    F: Fn(&PinView<'_>, &PinView<'_>) -> Option<String> + Send + Sync,
{
    func: F,
}

impl<F> FnVeto<F>
where
    F: Fn(&PinView<'_>, &PinView<'_>) -> Option<String> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> ConnectionVeto for FnVeto<F>
where
    F: Fn(&PinView<'_>, &PinView<'_>) -> Option<String> + Send + Sync,
{
    fn try_veto(&self, own: &PinView<'_>, other: &PinView<'_>) -> Option<String> {
        (self.func)(own, other)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph
// ─────────────────────────────────────────────────────────────────────────────

/// Borrowed view of one pin together with its owning node
#[derive(Debug, Clone, Copy)]
pub struct PinView<'g> {
    pub node: &'g GraphNode,
    pub pin: &'g GraphPin,
}

impl<'g> PinView<'g> {
    pub fn pin_type(&self) -> &'g PinType {
        &self.pin.pin_type
    }

    pub fn direction(&self) -> PinDirection {
        self.pin.direction
    }

    pub fn address(&self) -> PinAddress {
        PinAddress::new(&self.node.id, &self.pin.name)
    }

    /// The implicit target pin of a call
    pub fn is_self_pin(&self) -> bool {
        self.pin.name == SELF_PIN_NAME
    }
}

/// Snapshot of a graph plus the veto hooks registered for its nodes
#[derive(Default)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub connections: Vec<Connection>,
    vetoes: HashMap<String, Arc<dyn ConnectionVeto>>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("connections", &self.connections)
            .field("vetoes", &self.vetoes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    /// Record an existing link (output to input)
    pub fn link(&mut self, from: &PinAddress, to: &PinAddress) {
        self.connections.push(Connection::new(from, to));
    }

    /// Register a veto hook for a node
    pub fn set_veto(&mut self, node_id: &str, veto: Arc<dyn ConnectionVeto>) {
        self.vetoes.insert(node_id.to_string(), veto);
    }

    pub fn veto(&self, node_id: &str) -> Option<&dyn ConnectionVeto> {
        self.vetoes.get(node_id).map(|v| v.as_ref())
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn pin(&self, address: &PinAddress) -> Option<PinView<'_>> {
        let node = self.get_node(&address.node)?;
        let pin = node.get_pin(&address.pin)?;
        Some(PinView { node, pin })
    }

    /// Addresses of every pin linked to `address`
    pub fn links_of(&self, address: &PinAddress) -> Vec<PinAddress> {
        let key = address.to_string();
        self.connections
            .iter()
            .filter_map(|c| c.peer_of(&key))
            .filter_map(PinAddress::parse)
            .collect()
    }

    pub fn has_links(&self, address: &PinAddress) -> bool {
        let key = address.to_string();
        self.connections.iter().any(|c| c.peer_of(&key).is_some())
    }

    /// Views of every resolvable pin linked to `address`
    pub fn linked_peers(&self, address: &PinAddress) -> Vec<PinView<'_>> {
        self.links_of(address)
            .iter()
            .filter_map(|peer| self.pin(peer))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Textual Graph Files
// ─────────────────────────────────────────────────────────────────────────────

/// Errors loading a graph description
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Invalid pin address '{0}', expected node.pin")]
    InvalidAddress(String),
    #[error("Invalid node id '{0}', ids must be non-empty and contain no '.'")]
    InvalidNodeId(String),
    #[error("Duplicate node: {0}")]
    DuplicateNode(String),
    #[error("Duplicate pin {pin} on node {node}")]
    DuplicatePin { node: String, pin: String },
    #[error("Connection references missing pin {0}")]
    DanglingConnection(String),
    #[error("Connection {from} -> {to} must run from an output to an input")]
    ConnectionDirection { from: String, to: String },
    #[error("Type not found: {0}")]
    UnknownType(String),
    #[error("Invalid type on {node}.{pin}: {source}")]
    PinType {
        node: String,
        pin: String,
        #[source]
        source: PinTypeError,
    },
    #[error("Failed to parse graph: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pin with its type in textual notation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinDef {
    pub name: String,
    pub direction: PinDirection,
    /// Pin type syntax, e.g. `object<Actor>` or `float[]`
    #[serde(rename = "type")]
    pub pin_type: String,
}

/// Call settings of a node, with the function class named instead of resolved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallDef {
    #[serde(default)]
    pub function_class: Option<String>,
    #[serde(default)]
    pub has_return_value: bool,
    #[serde(default)]
    pub pure: bool,
    #[serde(default)]
    pub latent: bool,
    #[serde(default)]
    pub auto_create_ref_term: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: String,
    /// Present on function call nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<CallDef>,
    #[serde(default)]
    pub pins: Vec<PinDef>,
}

/// Graph file contents, resolved against a type database before use
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDef {
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphDef {
    pub fn from_json_str(text: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a graph description from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Resolve type names and check that every connection joins existing pins
    pub fn resolve(&self, db: &TypeDatabase) -> Result<Graph, GraphError> {
        let mut graph = Graph::new();

        for def in &self.nodes {
            // Addresses split at the first '.', so such a node could never be reached
            if def.id.is_empty() || def.id.contains('.') {
                return Err(GraphError::InvalidNodeId(def.id.clone()));
            }
            if graph.get_node(&def.id).is_some() {
                return Err(GraphError::DuplicateNode(def.id.clone()));
            }

            let kind = match &def.call {
                None => NodeKind::Generic,
                Some(call) => NodeKind::CallFunction {
                    function_class: call
                        .function_class
                        .as_deref()
                        .map(|name| {
                            db.lookup(name)
                                .ok_or_else(|| GraphError::UnknownType(name.to_string()))
                        })
                        .transpose()?,
                    has_return_value: call.has_return_value,
                    pure: call.pure,
                    latent: call.latent,
                    auto_create_ref_term: call.auto_create_ref_term.clone(),
                },
            };

            let mut node = GraphNode::new(&def.id, kind);
            for pin in &def.pins {
                if node.get_pin(&pin.name).is_some() {
                    return Err(GraphError::DuplicatePin {
                        node: def.id.clone(),
                        pin: pin.name.clone(),
                    });
                }
                let pin_type =
                    parse_pin_type(&pin.pin_type, db).map_err(|source| GraphError::PinType {
                        node: def.id.clone(),
                        pin: pin.name.clone(),
                        source,
                    })?;
                node.pins.push(GraphPin {
                    name: pin.name.clone(),
                    direction: pin.direction,
                    pin_type,
                });
            }
            graph.add_node(node);
        }

        for connection in &self.connections {
            let from: PinAddress = connection.from.parse()?;
            let to: PinAddress = connection.to.parse()?;
            let from_pin = graph
                .pin(&from)
                .ok_or_else(|| GraphError::DanglingConnection(connection.from.clone()))?;
            let to_pin = graph
                .pin(&to)
                .ok_or_else(|| GraphError::DanglingConnection(connection.to.clone()))?;
            if from_pin.direction() != PinDirection::Output
                || to_pin.direction() != PinDirection::Input
            {
                return Err(GraphError::ConnectionDirection {
                    from: connection.from.clone(),
                    to: connection.to.clone(),
                });
            }
            graph.link(&from, &to);
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            connections = graph.connections.len(),
            "Resolved graph"
        );
        Ok(graph)
    }
}
