//! Schema derivation example.
//!
//! Describes a small raster metadata standard in code, derives a schema from
//! it with `SchemaBuilder`, validates the result and prints its tree.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p metatree-demos --example derive_schema
//! ```

use metatree_builder::{PropertyInfo, SchemaBuilder, StaticStandard, TypeInfo, TypeRef};
use metatree_core::{NumberRange, Schema, validate_schema};

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let standard = raster_standard();
    let mut builder = SchemaBuilder::new(Schema::new("raster", "RasterMetadata"))
        // Citations are kept out of this schema
        .exclude_type("Citation")
        .force_singleton("Grid", "offsetVectors");

    let root = builder
        .build(&standard, "Grid", "Grid", None, true)
        .unwrap();
    let schema = builder.finish();
    println!("Derived '{root}' with {} element(s):\n", schema.len());
    print!("{}", schema.render_tree());

    let errors = validate_schema(&schema);
    if errors.is_empty() {
        println!("\nSchema is valid.");
    } else {
        for error in errors {
            println!("  invalid: {error}");
        }
    }

    println!("\nPaths reaching 'SampleDimension':");
    for path in schema.paths_to("SampleDimension") {
        println!("  {path}");
    }
}

fn ty(text: &str) -> TypeRef {
    text.parse().unwrap()
}

fn raster_standard() -> StaticStandard {
    StaticStandard::new("raster")
        .with_type(
            "Grid",
            TypeInfo::new()
                .with_description("Gridded coverage")
                .with_property(PropertyInfo::new("name", ty("string")).mandatory())
                .with_property(PropertyInfo::new("bands", ty("Band")).collection())
                .with_property(PropertyInfo::new("offsetVectors", ty("double[]")).collection())
                .with_property(PropertyInfo::new("cellGeometry", ty("enum:CellGeometry")))
                .with_property(PropertyInfo::new("citation", ty("Citation"))),
        )
        .with_type(
            "Band",
            TypeInfo::new()
                .with_identifier("SampleDimension")
                .with_property(PropertyInfo::new("name", ty("string")))
                .with_property(
                    PropertyInfo::new("scaleFactor", ty("double"))
                        .with_range(NumberRange::new(Some(0.0), None).exclusive_min()),
                )
                .with_property(PropertyInfo::new("units", ty("unit"))),
        )
        .with_type(
            "Citation",
            TypeInfo::new().with_property(PropertyInfo::new("title", ty("string"))),
        )
        .with_enumeration("CellGeometry", &["point", "area"])
}
