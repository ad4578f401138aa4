// Connection Rules - Verdict for a proposed link between two pins
//
// Order of checks: same node, node vetoes, directions, type compatibility. A
// compatible pair may still require existing links to be broken first; an
// incompatible pair may be bridged by a conversion node.

use std::fmt;

use pin_types::PinType;
use serde::Serialize;

use crate::{ConversionPlan, Graph, PinAddress, PinSchema, PinView, categorize_by_direction};

// ─────────────────────────────────────────────────────────────────────────────
// Verdicts
// ─────────────────────────────────────────────────────────────────────────────

/// What the caller may do with a proposed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionOutcome {
    Disallow,
    Allow,
    /// Insert the planned conversion node between the pins
    AllowWithConversion,
    /// Break the other links of the first pin, then connect
    AllowBreakingOtherLinksOnA,
    /// Break the other links of the second pin, then connect
    AllowBreakingOtherLinksOnB,
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionOutcome::Disallow => f.write_str("disallow"),
            ConnectionOutcome::Allow => f.write_str("allow"),
            ConnectionOutcome::AllowWithConversion => f.write_str("allow with conversion"),
            ConnectionOutcome::AllowBreakingOtherLinksOnA => f.write_str("allow, breaking links on A"),
            ConnectionOutcome::AllowBreakingOtherLinksOnB => f.write_str("allow, breaking links on B"),
        }
    }
}

/// Result of a connection query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionVerdict {
    pub outcome: ConnectionOutcome,
    /// Human-readable diagnostic, empty for a plain allow
    pub reason: String,
    /// Present only with `AllowWithConversion`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionPlan>,
}

impl ConnectionVerdict {
    pub fn disallow(reason: impl Into<String>) -> Self {
        Self {
            outcome: ConnectionOutcome::Disallow,
            reason: reason.into(),
            conversion: None,
        }
    }

    pub fn allow() -> Self {
        Self {
            outcome: ConnectionOutcome::Allow,
            reason: String::new(),
            conversion: None,
        }
    }

    pub fn with_conversion(reason: impl Into<String>, plan: ConversionPlan) -> Self {
        Self {
            outcome: ConnectionOutcome::AllowWithConversion,
            reason: reason.into(),
            conversion: Some(plan),
        }
    }

    fn breaking(on_a: bool, reason: &str) -> Self {
        Self {
            outcome: if on_a {
                ConnectionOutcome::AllowBreakingOtherLinksOnA
            } else {
                ConnectionOutcome::AllowBreakingOtherLinksOnB
            },
            reason: reason.to_string(),
            conversion: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome != ConnectionOutcome::Disallow
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestration
// ─────────────────────────────────────────────────────────────────────────────

impl PinSchema<'_> {
    /// Decide whether pin `a` may be connected to pin `b`
    pub fn can_create_connection(
        &self,
        graph: &Graph,
        a: &PinAddress,
        b: &PinAddress,
    ) -> ConnectionVerdict {
        let verdict = self.decide(graph, a, b);
        tracing::debug!(
            pin_a = %a,
            pin_b = %b,
            outcome = %verdict.outcome,
            reason = %verdict.reason,
            "Connection verdict"
        );
        verdict
    }

    fn decide(&self, graph: &Graph, a: &PinAddress, b: &PinAddress) -> ConnectionVerdict {
        if a.node == b.node {
            return ConnectionVerdict::disallow("Both are on the same node");
        }

        let Some(pin_a) = graph.pin(a) else {
            return ConnectionVerdict::disallow(format!("Pin not found: {a}"));
        };
        let Some(pin_b) = graph.pin(b) else {
            return ConnectionVerdict::disallow(format!("Pin not found: {b}"));
        };

        if let Some(reason) = graph.veto(&a.node).and_then(|v| v.try_veto(&pin_a, &pin_b)) {
            return ConnectionVerdict::disallow(reason);
        }
        if let Some(reason) = graph.veto(&b.node).and_then(|v| v.try_veto(&pin_b, &pin_a)) {
            return ConnectionVerdict::disallow(reason);
        }

        let Some((output, input)) = categorize_by_direction(pin_a, pin_b) else {
            return ConnectionVerdict::disallow("Directions are not compatible");
        };
        let output_is_a = output.address() == *a;

        // A scalar self pin of a multi-self call takes single objects and arrays
        // alike, whatever the shape of the output
        let ignore_array = input.node.allows_multiple_selfs(true)
            && input.is_self_pin()
            && !input.pin_type().is_array;

        let context = self.calling_context();
        if self.are_pin_types_compatible(output.pin_type(), input.pin_type(), context, ignore_array) {
            if self.requires_breaking_output_links(graph, output) {
                return ConnectionVerdict::breaking(
                    output_is_a,
                    "Replace existing output connections",
                );
            }
            if self.requires_breaking_input_links(graph, output, input) {
                return ConnectionVerdict::breaking(
                    !output_is_a,
                    "Replace existing input connections",
                );
            }
            return ConnectionVerdict::allow();
        }

        if let Some(plan) = self.plan_conversion(output, input) {
            tracing::trace!(plan = %plan, "Planned conversion");
            return ConnectionVerdict::with_conversion(
                format!(
                    "Convert {} to {}",
                    self.type_to_string(output.pin_type()),
                    self.type_to_string(input.pin_type())
                ),
                plan,
            );
        }

        ConnectionVerdict::disallow(format!(
            "{} is not compatible with {}",
            self.type_to_string(pin_a.pin_type()),
            self.type_to_string(pin_b.pin_type())
        ))
    }

    /// Exec outputs drive a single chain
    pub fn requires_breaking_output_links(&self, graph: &Graph, output: PinView<'_>) -> bool {
        output.pin_type().is_exec() && graph.has_links(&output.address())
    }

    /// Data inputs take one value, except a multi-self call target fed only by
    /// non-array objects
    pub fn requires_breaking_input_links(
        &self,
        graph: &Graph,
        output: PinView<'_>,
        input: PinView<'_>,
    ) -> bool {
        let address = input.address();
        if input.pin_type().is_exec() || !graph.has_links(&address) {
            return false;
        }

        let multiple_self_exception = input.is_self_pin()
            && input.node.allows_multiple_selfs(false)
            && !input.pin_type().is_array
            && !output.pin_type().is_array
            && !graph
                .linked_peers(&address)
                .iter()
                .any(|peer| peer.pin_type().is_array);

        !multiple_self_exception
    }

    /// Peers of `address` whose links no longer type-check, e.g. after its type changed
    pub fn find_invalid_links(&self, graph: &Graph, address: &PinAddress) -> Vec<PinAddress> {
        let Some(pin) = graph.pin(address) else {
            return Vec::new();
        };
        let context = self.calling_context();

        let invalid: Vec<_> = graph
            .linked_peers(address)
            .into_iter()
            .filter(|peer| !self.are_pins_compatible(pin, *peer, context, false))
            .map(|peer| peer.address())
            .collect();

        if !invalid.is_empty() {
            tracing::debug!(pin = %address, broken = invalid.len(), "Links invalidated");
        }
        invalid
    }

    /// Verdict for two free-standing pin types, output first
    ///
    /// Useful for tooling that has no graph at hand; there are no links, nodes
    /// or vetoes to consider.
    pub fn check_types(&self, output: &PinType, input: &PinType) -> ConnectionVerdict {
        let mut graph = Graph::new();
        graph.add_node(
            crate::GraphNode::new("output", crate::NodeKind::Generic)
                .with_pin(crate::GraphPin::output("value", output.clone())),
        );
        graph.add_node(
            crate::GraphNode::new("input", crate::NodeKind::Generic)
                .with_pin(crate::GraphPin::input("value", input.clone())),
        );
        self.can_create_connection(
            &graph,
            &PinAddress::new("output", "value"),
            &PinAddress::new("input", "value"),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fixtures::Fixture;
    use crate::{CastFunction, FnVeto, GraphNode, GraphPin, NodeKind, SELF_PIN_NAME};

    fn addr(text: &str) -> PinAddress {
        PinAddress::parse(text).unwrap()
    }

    #[test]
    fn test_exact_match_allows() {
        let fx = Fixture::new();
        let verdict = fx.schema().check_types(&PinType::int(), &PinType::int());
        assert_eq!(verdict, ConnectionVerdict::allow());
    }

    #[test]
    fn test_autocast_conversion() {
        let fx = Fixture::new();
        let verdict = fx.schema().check_types(&PinType::int(), &PinType::float());
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowWithConversion);
        assert_eq!(verdict.reason, "Convert int to float");
        assert_eq!(
            verdict.conversion,
            Some(ConversionPlan::FunctionCall {
                function: CastFunction::IntToFloat
            })
        );
    }

    #[test]
    fn test_incompatible_reports_both_types() {
        let fx = Fixture::new();
        let verdict = fx
            .schema()
            .check_types(&fx.object("Widget"), &fx.object("Actor"));
        assert_eq!(verdict.outcome, ConnectionOutcome::Disallow);
        assert_eq!(verdict.reason, "object'Widget' is not compatible with object'Actor'");
        assert!(verdict.conversion.is_none());
    }

    #[test]
    fn test_same_node_fires_first() {
        let fx = Fixture::new();
        let mut graph = Graph::new();
        graph.add_node(
            GraphNode::new("q", NodeKind::Generic)
                .with_pin(GraphPin::output("out", fx.structure("Vector")))
                .with_pin(GraphPin::input("in", PinType::exec())),
        );
        graph.set_veto("q", Arc::new(FnVeto::new(|_: &PinView<'_>, _: &PinView<'_>| Some("vetoed".to_string()))));

        let verdict = fx.schema().can_create_connection(&graph, &addr("q.out"), &addr("q.in"));
        assert_eq!(verdict, ConnectionVerdict::disallow("Both are on the same node"));
    }

    #[test]
    fn test_missing_pin() {
        let fx = Fixture::new();
        let mut graph = Graph::new();
        graph.add_node(GraphNode::new("a", NodeKind::Generic).with_pin(GraphPin::output("out", PinType::int())));

        let verdict = fx.schema().can_create_connection(&graph, &addr("a.out"), &addr("b.in"));
        assert_eq!(verdict.reason, "Pin not found: b.in");
    }

    #[test]
    fn test_veto_runs_before_types() {
        let fx = Fixture::new();
        let mut graph = Graph::new();
        graph.add_node(GraphNode::new("a", NodeKind::Generic).with_pin(GraphPin::output("out", PinType::int())));
        graph.add_node(GraphNode::new("b", NodeKind::Generic).with_pin(GraphPin::input("in", PinType::int())));
        graph.set_veto(
            "b",
            Arc::new(FnVeto::new(|own: &PinView<'_>, other: &PinView<'_>| {
                (own.pin.name == "in" && other.node.id == "a").then(|| "b refuses a".to_string())
            })),
        );

        let schema = fx.schema();
        assert_eq!(
            schema.can_create_connection(&graph, &addr("a.out"), &addr("b.in")),
            ConnectionVerdict::disallow("b refuses a")
        );
        assert_eq!(
            schema.can_create_connection(&graph, &addr("b.in"), &addr("a.out")),
            ConnectionVerdict::disallow("b refuses a")
        );
    }

    #[test]
    fn test_same_direction_rejected() {
        let fx = Fixture::new();
        let mut graph = Graph::new();
        graph.add_node(GraphNode::new("a", NodeKind::Generic).with_pin(GraphPin::output("out", PinType::int())));
        graph.add_node(GraphNode::new("b", NodeKind::Generic).with_pin(GraphPin::output("out", PinType::int())));

        let verdict = fx.schema().can_create_connection(&graph, &addr("a.out"), &addr("b.out"));
        assert_eq!(verdict, ConnectionVerdict::disallow("Directions are not compatible"));
    }

    fn exec_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(GraphNode::new("p", NodeKind::Generic).with_pin(GraphPin::output("then", PinType::exec())));
        graph.add_node(GraphNode::new("m", NodeKind::Generic).with_pin(GraphPin::input("exec", PinType::exec())));
        graph.add_node(GraphNode::new("n", NodeKind::Generic).with_pin(GraphPin::input("exec", PinType::exec())));
        graph.link(&addr("p.then"), &addr("m.exec"));
        graph
    }

    #[test]
    fn test_exec_fan_out_breaks_output_links() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let graph = exec_graph();

        let verdict = schema.can_create_connection(&graph, &addr("p.then"), &addr("n.exec"));
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnA);
        assert_eq!(verdict.reason, "Replace existing output connections");

        let verdict = schema.can_create_connection(&graph, &addr("n.exec"), &addr("p.then"));
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnB);
    }

    #[test]
    fn test_exec_inputs_accept_many_links() {
        let fx = Fixture::new();
        let mut graph = exec_graph();
        graph.add_node(GraphNode::new("q", NodeKind::Generic).with_pin(GraphPin::output("then", PinType::exec())));

        let verdict = fx.schema().can_create_connection(&graph, &addr("q.then"), &addr("m.exec"));
        assert_eq!(verdict, ConnectionVerdict::allow());
    }

    #[test]
    fn test_data_fan_in_breaks_input_links() {
        let fx = Fixture::new();
        let mut graph = Graph::new();
        graph.add_node(GraphNode::new("x", NodeKind::Generic).with_pin(GraphPin::output("v", PinType::int())));
        graph.add_node(GraphNode::new("y", NodeKind::Generic).with_pin(GraphPin::output("v", PinType::int())));
        graph.add_node(GraphNode::new("z", NodeKind::Generic).with_pin(GraphPin::input("v", PinType::int())));
        graph.link(&addr("x.v"), &addr("z.v"));

        let schema = fx.schema();
        let verdict = schema.can_create_connection(&graph, &addr("z.v"), &addr("y.v"));
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnA);
        assert_eq!(verdict.reason, "Replace existing input connections");

        let verdict = schema.can_create_connection(&graph, &addr("y.v"), &addr("z.v"));
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnB);

        // Data outputs fan out freely
        let verdict = schema.can_create_connection(&graph, &addr("x.v"), &addr("z.v"));
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnB);
    }

    fn multi_self_graph(fx: &Fixture, kind: NodeKind) -> Graph {
        let mut graph = Graph::new();
        for id in ["a", "b"] {
            graph.add_node(GraphNode::new(id, NodeKind::Generic).with_pin(GraphPin::output("obj", fx.object("Pawn"))));
        }
        graph.add_node(
            GraphNode::new("arr", NodeKind::Generic).with_pin(GraphPin::output("objs", fx.object("Pawn").array())),
        );
        graph.add_node(GraphNode::new("call", kind).with_pin(GraphPin::input(SELF_PIN_NAME, fx.object("Actor"))));
        graph
    }

    #[test]
    fn test_multi_self_keeps_existing_targets() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let mut graph = multi_self_graph(&fx, NodeKind::call(fx.ty("Actor")));
        graph.link(&addr("a.obj"), &addr("call.self"));

        let verdict = schema.can_create_connection(&graph, &addr("b.obj"), &addr("call.self"));
        assert_eq!(verdict, ConnectionVerdict::allow());
    }

    #[test]
    fn test_multi_self_exception_needs_scalar_peers() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let mut graph = multi_self_graph(&fx, NodeKind::call(fx.ty("Actor")));
        graph.link(&addr("arr.objs"), &addr("call.self"));

        let verdict = schema.can_create_connection(&graph, &addr("b.obj"), &addr("call.self"));
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnB);
    }

    #[test]
    fn test_multi_self_needs_impure_call() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let pure = NodeKind::CallFunction {
            function_class: Some(fx.ty("Actor")),
            has_return_value: true,
            pure: true,
            latent: false,
            auto_create_ref_term: Vec::new(),
        };
        let mut graph = multi_self_graph(&fx, pure);
        graph.link(&addr("a.obj"), &addr("call.self"));

        let verdict = schema.can_create_connection(&graph, &addr("b.obj"), &addr("call.self"));
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnB);
    }

    #[test]
    fn test_array_into_multi_self_target() {
        let fx = Fixture::new();
        let schema = fx.schema();

        let graph = multi_self_graph(&fx, NodeKind::call(fx.ty("Actor")));
        let verdict = schema.can_create_connection(&graph, &addr("arr.objs"), &addr("call.self"));
        assert_eq!(verdict, ConnectionVerdict::allow());
        assert!(verdict.is_allowed());

        // The shape gate alone would refuse it
        let objs = fx.object("Pawn").array();
        assert!(!schema.are_pin_types_compatible(&objs, &fx.object("Actor"), None, false));

        // Without multi-self support the array is promoted nowhere and rejected
        let graph = multi_self_graph(&fx, NodeKind::Generic);
        let verdict = schema.can_create_connection(&graph, &addr("arr.objs"), &addr("call.self"));
        assert_eq!(verdict.outcome, ConnectionOutcome::Disallow);
        assert!(!verdict.is_allowed());
    }

    #[test]
    fn test_enum_byte_verdicts() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let color = PinType::enumeration(fx.ty("EColor"));
        let shape = PinType::enumeration(fx.ty("EShape"));

        let verdict = schema.check_types(&color, &shape);
        assert_eq!(verdict.outcome, ConnectionOutcome::AllowWithConversion);
        assert_eq!(
            verdict.conversion,
            Some(ConversionPlan::ByteToEnum {
                enumeration: fx.ty("EShape"),
                safe: true
            })
        );

        assert_eq!(schema.check_types(&color, &PinType::byte()), ConnectionVerdict::allow());
    }

    #[test]
    fn test_find_invalid_links() {
        let fx = Fixture::new();
        let schema = fx.schema();
        let mut graph = Graph::new();
        graph.add_node(GraphNode::new("src", NodeKind::Generic).with_pin(GraphPin::output("v", PinType::float())));
        graph.add_node(GraphNode::new("ok", NodeKind::Generic).with_pin(GraphPin::input("v", PinType::float())));
        graph.add_node(GraphNode::new("bad", NodeKind::Generic).with_pin(GraphPin::input("v", PinType::int())));
        graph.add_node(GraphNode::new("any", NodeKind::Generic).with_pin(GraphPin::input("v", PinType::wildcard())));
        for sink in ["ok.v", "bad.v", "any.v"] {
            graph.link(&addr("src.v"), &addr(sink));
        }

        assert_eq!(schema.find_invalid_links(&graph, &addr("src.v")), vec![addr("bad.v")]);
        assert!(schema.find_invalid_links(&graph, &addr("ok.v")).is_empty());
        assert!(schema.find_invalid_links(&graph, &addr("ghost.v")).is_empty());
    }

    #[test]
    fn test_verdict_serializes() {
        let json = serde_json::to_value(ConnectionVerdict::disallow("nope")).unwrap();
        assert_eq!(json["outcome"], "disallow");
        assert_eq!(json["reason"], "nope");
        assert!(json.get("conversion").is_none());
    }
}
