use std::io::Write;

use metatree_builder::{
    ARRAY_VALUES_ATTRIBUTE, Obligation, PropertyInfo, SchemaBuilder, StandardError, StaticStandard,
    TypeInfo, TypeRef,
};
use metatree_core::{
    Arity, Cardinality, ChildPolicy, PrimitiveType, Restriction, Schema, SchemaError,
    validate_schema,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ty(text: &str) -> TypeRef {
    text.parse().unwrap()
}

/// A small raster standard: a grid with repeated bands, a list of vectors,
/// a citation shared by two owners and an enumeration.
fn raster_standard() -> StaticStandard {
    StaticStandard::new("raster")
        .with_type(
            "Grid",
            TypeInfo::new()
                .with_description("Gridded coverage")
                .with_property(PropertyInfo::new("name", ty("string")).mandatory())
                .with_property(PropertyInfo::new("fillValues", ty("double")).collection())
                .with_property(PropertyInfo::new("bands", ty("Band")).collection())
                .with_property(PropertyInfo::new("offsetVectors", ty("double[]")).collection())
                .with_property(PropertyInfo::new("citation", ty("Citation")))
                .with_property(PropertyInfo::new("cellGeometry", ty("enum:CellGeometry"))),
        )
        .with_type(
            "Band",
            TypeInfo::new()
                .with_identifier("SampleDimension")
                .with_property(PropertyInfo::new("name", ty("string")))
                .with_property(PropertyInfo::new("minimum", ty("double")))
                .with_property(PropertyInfo::new("maximum", ty("double")))
                .with_property(PropertyInfo::new("citation", ty("Citation"))),
        )
        .with_type(
            "Citation",
            TypeInfo::new()
                .with_property(PropertyInfo::new("title", ty("string")).mandatory())
                .with_property(PropertyInfo::new("isbn", ty("identifier"))),
        )
        .with_enumeration("CellGeometry", &["point", "area", "voxel"])
}

fn build(standard: &StaticStandard, root_type: &str) -> Schema {
    let mut builder = SchemaBuilder::new(Schema::new(standard.name.as_str(), "Root"));
    builder
        .build(standard, root_type, root_type, None, true)
        .unwrap();
    builder.finish()
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

#[test]
fn test_derived_schema_is_valid() {
    let schema = build(&raster_standard(), "Grid");
    assert_eq!(validate_schema(&schema), vec![]);
    assert_eq!(schema.root().unwrap().children, vec!["Grid".to_string()]);
    assert_eq!(schema.element("Grid").unwrap().cardinality, Cardinality::MANDATORY);
    assert_eq!(schema.description("Grid", None), Some("Gridded coverage"));
}

#[test]
fn test_scalar_and_list_attributes() {
    let schema = build(&raster_standard(), "Grid");

    let name = schema.attribute("Grid", "name").unwrap();
    assert_eq!(name.cardinality, Cardinality::MANDATORY);
    assert_eq!(name.value_type.unwrap().arity, Arity::Scalar);

    let fill = schema.attribute("Grid", "fillValues").unwrap();
    let value_type = fill.value_type.unwrap();
    assert_eq!(value_type.arity, Arity::List);
    assert_eq!(value_type.primitive, PrimitiveType::Double);
}

#[test]
fn test_repeated_structure_gets_wrapper() {
    let schema = build(&raster_standard(), "Grid");

    let bands = schema.element("bands").unwrap();
    assert_eq!(bands.policy(), ChildPolicy::Repeat);
    assert_eq!(bands.cardinality, Cardinality::unbounded(0));

    let component = schema.repeat_component("bands").unwrap();
    assert_eq!(component.name, "SampleDimension");
    assert!(schema.attribute("SampleDimension", "minimum").is_some());
    assert_eq!(schema.method_name("Grid", "bands"), Some("bands"));
}

#[test]
fn test_list_of_arrays_keeps_vectors_apart() {
    let schema = build(&raster_standard(), "Grid");

    let wrapper = schema.element("offsetVectors").unwrap();
    assert_eq!(wrapper.policy(), ChildPolicy::Repeat);
    let component = schema.repeat_component("offsetVectors").unwrap();
    assert_eq!(component.name, "offsetVector");
    assert_eq!(component.policy(), ChildPolicy::Empty);

    let values = component.find_attribute(ARRAY_VALUES_ATTRIBUTE).unwrap();
    assert_eq!(values.value_type.unwrap().arity, Arity::List);
    assert!(schema.attribute("Grid", "offsetVectors").is_none());
}

#[test]
fn test_enumeration_becomes_restricted_string() {
    let schema = build(&raster_standard(), "Grid");
    let attribute = schema.attribute("Grid", "cellGeometry").unwrap();
    assert_eq!(
        attribute.restriction,
        Some(Restriction::Enumeration(vec![
            "point".into(),
            "area".into(),
            "voxel".into()
        ]))
    );
    assert_eq!(attribute.origin.as_ref().unwrap().to_string(), "raster:CellGeometry");
}

#[test]
fn test_shared_type_is_linked_not_rebuilt() {
    let schema = build(&raster_standard(), "Grid");

    let citation = schema.element("citation").unwrap();
    assert_eq!(citation.attributes.len(), 2);
    assert!(schema.child("Grid", "citation").is_some());
    assert!(schema.child("SampleDimension", "citation").is_some());

    let mut paths = schema.paths_to("citation");
    paths.sort();
    assert_eq!(paths, vec!["Grid/bands/SampleDimension/citation", "Grid/citation"]);
    assert!(matches!(
        schema.path_for_origin("Citation"),
        Err(SchemaError::AmbiguousSchema { .. })
    ));
    assert_eq!(schema.path_for_origin("Band").unwrap().as_deref(), Some("Grid/bands/SampleDimension"));
}

#[test]
fn test_conflicting_types_under_one_name() {
    let standard = StaticStandard::new("t")
        .with_type(
            "Outer",
            TypeInfo::new()
                .with_property(PropertyInfo::new("left", ty("A")))
                .with_property(PropertyInfo::new("right", ty("B"))),
        )
        .with_type(
            "A",
            TypeInfo::new().with_property(PropertyInfo::new("x", ty("Part")).with_identifier("part")),
        )
        .with_type(
            "B",
            TypeInfo::new().with_property(PropertyInfo::new("y", ty("Other")).with_identifier("part")),
        )
        .with_type("Part", TypeInfo::new())
        .with_type("Other", TypeInfo::new());

    let mut builder = SchemaBuilder::new(Schema::new("t", "Root"));
    let err = builder.build(&standard, "Outer", "Outer", None, false).unwrap_err();
    assert_eq!(
        err,
        SchemaError::SchemaConflict {
            name: "part".into(),
            existing: "Part".into(),
            requested: "Other".into(),
        }
    );
}

#[test]
fn test_self_referential_types_terminate() {
    let standard = StaticStandard::new("t")
        .with_type(
            "A",
            TypeInfo::new()
                .with_property(PropertyInfo::new("b", ty("B")).mandatory())
                .with_property(PropertyInfo::new("label", ty("string"))),
        )
        .with_type(
            "B",
            TypeInfo::new()
                .with_property(PropertyInfo::new("a", ty("A")).mandatory())
                .with_property(PropertyInfo::new("self", ty("B"))),
        );

    let schema = build(&standard, "A");
    assert_eq!(schema.len(), 3);
    assert!(schema.element("b").unwrap().children.is_empty());
    assert!(!schema.contains("a"));
    assert!(!schema.contains("self"));
    assert_eq!(validate_schema(&schema), vec![]);
}

#[test]
fn test_siblings_do_not_inherit_cycle_guard() {
    let standard = StaticStandard::new("t")
        .with_type(
            "Outer",
            TypeInfo::new()
                .with_property(PropertyInfo::new("first", ty("Leaf")))
                .with_property(PropertyInfo::new("second", ty("Leaf"))),
        )
        .with_type("Leaf", TypeInfo::new().with_property(PropertyInfo::new("v", ty("integer"))));

    let schema = build(&standard, "Outer");
    assert!(schema.attribute("first", "v").is_some());
    assert!(schema.attribute("second", "v").is_some());
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[test]
fn test_exclude_type_skips_properties() {
    let mut builder = SchemaBuilder::new(Schema::new("raster", "Root")).exclude_type("Citation");
    builder
        .build(&raster_standard(), "Grid", "Grid", None, true)
        .unwrap();
    let schema = builder.finish();
    assert!(!schema.contains("citation"));
    assert!(schema.method_name("Grid", "citation").is_none());
}

#[test]
fn test_substitute_array_collapses_collection() {
    let mut builder = SchemaBuilder::new(Schema::new("raster", "Root")).substitute(
        "Grid",
        "offsetVectors",
        Some(ty("double[]")),
    );
    builder
        .build(&raster_standard(), "Grid", "Grid", None, true)
        .unwrap();
    let schema = builder.finish();

    assert!(!schema.contains("offsetVectors"));
    let attribute = schema.attribute("Grid", "offsetVectors").unwrap();
    assert_eq!(attribute.value_type.unwrap().arity, Arity::List);
    assert_eq!(attribute.cardinality.max, Some(1));
}

#[test]
fn test_force_multiplicity() {
    let mut builder = SchemaBuilder::new(Schema::new("raster", "Root"))
        .force_singleton("Grid", "bands")
        .force_collection("Grid", "cellGeometry");
    builder
        .build(&raster_standard(), "Grid", "Grid", None, true)
        .unwrap();
    let schema = builder.finish();

    let bands = schema.element("bands").unwrap();
    assert_ne!(bands.policy(), ChildPolicy::Repeat);
    assert_eq!(bands.cardinality.max, Some(1));
    assert!(schema.attribute("bands", "minimum").is_some());

    let geometry = schema.attribute("Grid", "cellGeometry").unwrap();
    assert_eq!(geometry.value_type.unwrap().arity, Arity::List);
    assert_eq!(geometry.cardinality, Cardinality::unbounded(0));
}

#[test]
fn test_repeated_type_without_identifier_gets_entry_suffix() {
    let standard = StaticStandard::new("t")
        .with_type(
            "Owner",
            TypeInfo::new().with_property(PropertyInfo::new("citation", ty("Citation")).collection()),
        )
        .with_type("Citation", TypeInfo::new());

    let schema = build(&standard, "Owner");
    assert_eq!(schema.element("citation").unwrap().policy(), ChildPolicy::Repeat);
    assert_eq!(schema.repeat_component("citation").unwrap().name, "citationEntry");
}

#[test]
fn test_conditional_children_choice() {
    let standard = StaticStandard::new("t")
        .with_type(
            "Extent",
            TypeInfo::new()
                .with_property(
                    PropertyInfo::new("box", ty("Box")).with_obligation(Obligation::Conditional),
                )
                .with_property(
                    PropertyInfo::new("polygon", ty("Polygon"))
                        .with_obligation(Obligation::Conditional),
                ),
        )
        .with_type("Box", TypeInfo::new())
        .with_type("Polygon", TypeInfo::new());

    let schema = build(&standard, "Extent");
    assert_eq!(schema.element("Extent").unwrap().policy(), ChildPolicy::Choice);
}

#[test]
fn test_build_under_custom_parent() {
    let standard = raster_standard();
    let mut builder = SchemaBuilder::new(Schema::new("raster", "Root"));
    builder.build(&standard, "Grid", "Grid", None, true).unwrap();
    let name = builder
        .build(&standard, "Citation", "source", Some("Grid"), false)
        .unwrap();
    assert_eq!(name, "source");
    let schema = builder.finish();
    assert_eq!(schema.element("source").unwrap().cardinality, Cardinality::OPTIONAL);
    assert!(schema.child("Grid", "source").is_some());
}

// ---------------------------------------------------------------------------
// Standard files
// ---------------------------------------------------------------------------

#[test]
fn test_load_standard_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("standard.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(
        br#"
name: iso
types:
  Citation:
    properties:
      - key: title
        type: string
        obligation: mandatory
      - key: alternateTitles
        type: string
        collection: true
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let standard = StaticStandard::load(&path).unwrap();
    let schema = build(&standard, "Citation");
    let alternates = schema.attribute("Citation", "alternateTitles").unwrap();
    assert_eq!(alternates.value_type.unwrap().arity, Arity::List);
}

#[test]
fn test_load_standard_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("standard.toml");
    std::fs::write(&path, "name = 'x'").unwrap();
    assert!(matches!(
        StaticStandard::load(&path),
        Err(StandardError::UnsupportedFormat(_))
    ));
}
