//! Accessor and view example.
//!
//! Builds a document by hand-written schema, fills it through accessors and
//! reads it back through object-shaped views. A write made after a view was
//! read shows up on the next read.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p metatree-demos --example live_views
//! ```

use std::sync::Arc;

use metatree_access::{AccessConfig, Accessor, ChildSlot, Document, InterfaceDesc, PropertyDesc, View};
use metatree_core::{Cardinality, ChildPolicy, PrimitiveType, Schema, SchemaNode, ValueKind, ValueType};

fn main() {
    tracing_subscriber::fmt::init();

    let document = Document::new(Arc::new(image_schema()), AccessConfig::default()).into_shared();

    let mut bands = Accessor::new(&document, "bands", ChildSlot::Auto).unwrap();
    for (name, minimum, maximum) in [("red", 0.0, 255.0), ("near infrared", 0.0, 4095.0)] {
        let index = bands.append_child().unwrap();
        bands.select_child(index).unwrap();
        bands.set("name", name).unwrap();
        bands.set("minimum", &[minimum]).unwrap();
        bands.set("maximum", &[maximum]).unwrap();
    }

    let band = Arc::new(
        InterfaceDesc::new("Band")
            .with_property(PropertyDesc::value("getName", ValueKind::String))
            .with_property(PropertyDesc::primitive("getSpan", ValueKind::Double).with_arguments(1)),
    );
    let image = Arc::new(
        InterfaceDesc::new("Image").with_property(PropertyDesc::structured_list("getBands", band)),
    );

    let view = View::open(&document, "", image).unwrap();
    let list = view.list("getBands").unwrap();
    for band in list.views().unwrap() {
        let name = band.get::<String>("getName").unwrap().unwrap_or_default();
        let span = band.call("getSpan", &[0]).unwrap();
        println!("{name}: span {span:?}");
    }

    bands.select_child(0).unwrap();
    bands.set("name", "red edge").unwrap();
    let first = list.get(0).unwrap();
    println!(
        "after rename: {}",
        first.get::<String>("getName").unwrap().unwrap_or_default()
    );
}

fn image_schema() -> Schema {
    let mut schema = Schema::new("image", "Image");
    schema
        .add_element("Image", SchemaNode::element("bands", ChildPolicy::Repeat, Cardinality::unbounded(0)))
        .unwrap();
    schema
        .add_element("bands", SchemaNode::element("band", ChildPolicy::Empty, Cardinality::unbounded(0)))
        .unwrap();
    for (name, value_type) in [
        ("name", ValueType::scalar(PrimitiveType::String)),
        ("minimum", ValueType::list(PrimitiveType::Double)),
        ("maximum", ValueType::list(PrimitiveType::Double)),
    ] {
        schema
            .add_attribute("band", SchemaNode::attribute(name, value_type))
            .unwrap();
    }
    schema
}
