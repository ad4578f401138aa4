// End-to-end connection scenarios over a graph file and a type manifest

use pin_schema::{
    CastFunction, ConnectionOutcome, ConnectionVerdict, ConversionPlan, Graph, GraphDef,
    PinAddress, PinSchema,
};
use pin_types::{PinType, TypeDatabase, parse_pin_type};

const TYPES: &str = r#"
[[interface]]
name = "Interactable"
parent = "Interface"

[[class]]
name = "Actor"
parent = "Object"

[[class.property]]
name = "Mesh"
class = "SceneComponent"

[[class]]
name = "Pawn"
parent = "Actor"
interfaces = ["Interactable"]

[[class]]
name = "Vehicle"
parent = "Pawn"

[[class]]
name = "Widget"
parent = "Object"

[[class]]
name = "SceneComponent"
parent = "Object"

[[enum]]
name = "EMode"
entries = ["Idle", "Walk", "Run"]
"#;

const GRAPH: &str = r#"{
    "nodes": [
        { "id": "begin", "pins": [
            { "name": "then", "direction": "output", "type": "exec" },
            { "name": "count", "direction": "output", "type": "int" },
            { "name": "pawn", "direction": "output", "type": "object<Pawn>" },
            { "name": "actors", "direction": "output", "type": "object<Actor>[]" },
            { "name": "me", "direction": "output", "type": "object<self>" },
            { "name": "any", "direction": "output", "type": "wildcard" },
            { "name": "mode", "direction": "output", "type": "byte<EMode>" }
        ]},
        { "id": "ui", "pins": [
            { "name": "widget", "direction": "output", "type": "object<Widget>" }
        ]},
        { "id": "move", "call": { "function_class": "Actor" }, "pins": [
            { "name": "exec", "direction": "input", "type": "exec" },
            { "name": "self", "direction": "input", "type": "object<Actor>" },
            { "name": "speed", "direction": "input", "type": "float" },
            { "name": "steps", "direction": "input", "type": "int" },
            { "name": "waypoints", "direction": "input", "type": "int[]" },
            { "name": "label", "direction": "input", "type": "name" }
        ]},
        { "id": "attach", "call": { "function_class": "SceneComponent" }, "pins": [
            { "name": "self", "direction": "input", "type": "object<SceneComponent>" }
        ]},
        { "id": "tick", "pins": [
            { "name": "exec", "direction": "input", "type": "exec" }
        ]}
    ],
    "connections": [
        { "from": "begin.then", "to": "move.exec" }
    ]
}"#;

fn setup() -> (TypeDatabase, Graph) {
    let db = TypeDatabase::from_toml_str(TYPES).unwrap();
    let graph = GraphDef::from_json_str(GRAPH).unwrap().resolve(&db).unwrap();
    (db, graph)
}

fn connect(schema: &PinSchema<'_>, graph: &Graph, a: &str, b: &str) -> ConnectionVerdict {
    schema.can_create_connection(graph, &a.parse().unwrap(), &b.parse().unwrap())
}

fn ty(db: &TypeDatabase, text: &str) -> PinType {
    parse_pin_type(text, db).unwrap()
}

#[test]
fn test_exact_match() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);
    assert_eq!(
        connect(&schema, &graph, "begin.count", "move.steps"),
        ConnectionVerdict::allow()
    );
}

#[test]
fn test_int_to_float_autocast() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    let verdict = connect(&schema, &graph, "move.speed", "begin.count");
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
fn test_unrelated_classes_disallowed() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    let verdict = connect(&schema, &graph, "ui.widget", "move.self");
    assert_eq!(verdict.outcome, ConnectionOutcome::Disallow);
    assert!(verdict.reason.contains("object'Widget'"));
    assert!(verdict.reason.contains("object'Actor'"));
}

#[test]
fn test_scalar_wildcard_into_array() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    // The shape gate only excuses a scalar wildcard on the input side
    assert!(!schema.are_pin_types_compatible(&PinType::wildcard(), &PinType::int().array(), None, false));
    assert!(schema.are_pin_types_compatible(&PinType::int().array(), &PinType::wildcard(), None, false));

    // The connection still goes through by wrapping the value in an array
    let verdict = connect(&schema, &graph, "begin.any", "move.waypoints");
    assert_eq!(verdict.outcome, ConnectionOutcome::AllowWithConversion);
    assert_eq!(verdict.conversion, Some(ConversionPlan::ArrayPromotion));
}

#[test]
fn test_actor_array_drives_multi_self_call() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    let verdict = connect(&schema, &graph, "begin.actors", "move.self");
    assert_eq!(verdict, ConnectionVerdict::allow());
    assert!(verdict.is_allowed());

    // Outside a self pin the array shape still has to match
    let actors = ty(&db, "object<Actor>[]");
    assert!(!schema.are_pin_types_compatible(&actors, &ty(&db, "object<Actor>"), None, false));
}

#[test]
fn test_exec_fan_out() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    let verdict = connect(&schema, &graph, "begin.then", "tick.exec");
    assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnA);
    let verdict = connect(&schema, &graph, "tick.exec", "begin.then");
    assert_eq!(verdict.outcome, ConnectionOutcome::AllowBreakingOtherLinksOnB);
}

#[test]
fn test_same_node_checked_first() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    let verdict = connect(&schema, &graph, "move.exec", "move.label");
    assert_eq!(verdict, ConnectionVerdict::disallow("Both are on the same node"));
}

#[test]
fn test_self_placeholder_uses_calling_context() {
    let (db, graph) = setup();

    let unbound = PinSchema::new(&db);
    assert_eq!(
        connect(&unbound, &graph, "begin.me", "move.self").outcome,
        ConnectionOutcome::Disallow
    );

    let in_vehicle = PinSchema::new(&db).with_calling_context(db.lookup("Vehicle"));
    assert_eq!(
        connect(&in_vehicle, &graph, "begin.me", "move.self"),
        ConnectionVerdict::allow()
    );

    let in_widget = PinSchema::new(&db).with_calling_context(db.lookup("Widget"));
    assert_eq!(
        connect(&in_widget, &graph, "begin.me", "move.self").outcome,
        ConnectionOutcome::Disallow
    );
}

#[test]
fn test_component_call_on_owner() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    let verdict = connect(&schema, &graph, "begin.pawn", "attach.self");
    assert_eq!(verdict.outcome, ConnectionOutcome::AllowWithConversion);
    match verdict.conversion {
        Some(ConversionPlan::PropertyAccess { property }) => {
            assert_eq!(property.name, "Mesh");
            assert_eq!(Some(property.owner), db.lookup("Actor"));
        }
        other => panic!("Expected property access, got {other:?}"),
    }
}

#[test]
fn test_enum_into_name() {
    let (db, graph) = setup();
    let schema = PinSchema::new(&db);

    let verdict = connect(&schema, &graph, "begin.mode", "move.label");
    assert_eq!(
        verdict.conversion,
        Some(ConversionPlan::EnumToName {
            enumeration: db.lookup("EMode").unwrap()
        })
    );
}

#[test]
fn test_subtyping_is_transitive() {
    let (db, _) = setup();
    let schema = PinSchema::new(&db);

    let vehicle = ty(&db, "object<Vehicle>");
    let actor = ty(&db, "object<Actor>");
    assert!(schema.are_pin_types_compatible(&vehicle, &actor, None, false));
    assert!(!schema.are_pin_types_compatible(&actor, &vehicle, None, false));
}

#[test]
fn test_interface_bridging_both_ways() {
    let (db, _) = setup();
    let schema = PinSchema::new(&db);

    let pawn = ty(&db, "object<Pawn>");
    let interactable = ty(&db, "object<Interactable>");
    let widget = ty(&db, "object<Widget>");

    assert!(schema.are_pin_types_compatible(&pawn, &interactable, None, false));
    assert!(schema.are_pin_types_compatible(&interactable, &pawn, None, false));
    assert!(!schema.are_pin_types_compatible(&widget, &interactable, None, false));
    assert!(!schema.are_pin_types_compatible(&interactable, &widget, None, false));
}

#[test]
fn test_index_wildcard_restriction() {
    let (db, _) = setup();
    let schema = PinSchema::new(&db);
    let index = PinType::index_wildcard();

    for accepted in ["bool", "byte", "int", "byte<EMode>"] {
        let other = ty(&db, accepted);
        assert!(schema.are_pin_types_compatible(&other, &index, None, false), "{accepted}");
        assert!(schema.are_pin_types_compatible(&index, &other, None, false), "{accepted}");
    }
    for rejected in ["float", "string", "object<Actor>", "struct<Vector>", "int[]"] {
        let other = ty(&db, rejected);
        assert!(!schema.are_pin_types_compatible(&other, &index, None, false), "{rejected}");
        assert!(!schema.are_pin_types_compatible(&index, &other, None, false), "{rejected}");
    }
}

#[test]
fn test_find_invalid_links_after_retype() {
    let (db, mut graph) = setup();
    let schema = PinSchema::new(&db);
    let steps = PinAddress::new("move", "steps");
    graph.link(&PinAddress::new("begin", "count"), &steps);
    assert!(schema.find_invalid_links(&graph, &steps).is_empty());

    // Retype the input after the fact
    let node = graph.nodes.iter_mut().find(|n| n.id == "move").unwrap();
    let pin = node.pins.iter_mut().find(|p| p.name == "steps").unwrap();
    pin.pin_type = PinType::string();

    assert_eq!(
        schema.find_invalid_links(&graph, &steps),
        vec![PinAddress::new("begin", "count")]
    );
}
