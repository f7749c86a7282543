//! Model -> stream -> model round trips in both encodings.

use gto::binary::Endian;
use gto::core::{ComponentInfo, Layout};
use gto::{
    read_model, write_binary, write_text, Column, Component, Format, Model, Object, Property,
    SimpleWriter, Values, WriterOptions,
};

/// One property of every type, including awkward values.
fn every_type() -> Model {
    let points = Component::new("points")
        .with_interpretation("geometry")
        .with_property(
            Property::new("position", Values::Float(vec![0.0, 1.0, -2.5, 3.25, 1e-40, f32::MAX].into()))
                .with_width(3)
                .with_interpretation("coordinate"),
        )
        .with_property(Property::new(
            "weights",
            Values::Double(vec![0.1, -0.0, f64::MIN_POSITIVE, 1.7976931348623157e308, 1e16, -3e20].into()),
        ))
        .with_property(Property::new("halves", Values::Half(vec![0.5, -2.0, 1.25, 65504.0].into())).with_width(2))
        .with_property(Property::new("ids", Values::Int(vec![i32::MIN, -1, 0, i32::MAX].into())))
        .with_property(Property::new("big", Values::Int64(vec![i64::MIN, i64::MAX].into())))
        .with_property(Property::new("shorts", Values::Short(vec![-32768, 0, 32767].into())))
        .with_property(Property::new("bytes", Values::Byte(vec![0, 128, 255].into())))
        .with_property(Property::new("flags", Values::Boolean(vec![true, false, true].into())))
        .with_property(Property::new(
            "names",
            Values::String(Column::Scalar(vec![
                "plain".into(),
                "with space".into(),
                "quote \" and \\ backslash".into(),
                "tab\tnewline\n".into(),
                "日本語".into(),
                String::new(),
            ])),
        ))
        .with_property(Property::new("single", Values::Int(vec![42].into())))
        .with_property(Property::new("empty", Values::Float(Vec::<f32>::new().into())));

    let matrix = Component::new("object").with_property(
        Property::new("globalMatrix", Values::Float((0..32).map(|i| i as f32 * 0.5).collect::<Vec<_>>().into()))
            .with_layout(Layout::dims(&[4, 4])),
    );

    Model {
        version: 4,
        flags: 0,
        objects: vec![
            Object::new("cube", "polygon", 2)
                .with_component(points)
                .with_component(matrix),
            Object::new("odd name", "as", 0).with_component(Component::new("2d")),
            Object::new("camera1", "camera", 1),
        ],
    }
}

#[test]
fn test_text_round_trip_every_type() {
    let model = every_type();
    let text = write_text(&model).unwrap();
    assert_eq!(read_model(text.as_bytes()).unwrap(), model);
}

#[test]
fn test_binary_round_trip_every_type() {
    let model = every_type();
    let bytes = write_binary(&model).unwrap();
    assert_eq!(read_model(&bytes).unwrap(), model);
}

#[test]
fn test_text_and_binary_agree() {
    let model = every_type();
    let from_text = read_model(write_text(&model).unwrap().as_bytes()).unwrap();
    let from_binary = read_model(&write_binary(&model).unwrap()).unwrap();
    assert_eq!(from_text, from_binary);
}

#[test]
fn test_float_bit_patterns_survive_text() {
    let values: Vec<f32> = [0x0000_0001u32, 0x3dcc_cccd, 0x7f7f_ffff, 0x8000_0000, 0x0080_0000]
        .iter()
        .map(|&b| f32::from_bits(b))
        .collect();
    let model = Model {
        objects: vec![Object::new("o", "p", 1).with_component(
            Component::new("c").with_property(Property::new("f", Values::Float(values.clone().into()))),
        )],
        ..Default::default()
    };
    let back = read_model(write_text(&model).unwrap().as_bytes()).unwrap();
    let Values::Float(Column::Scalar(read)) = &back.property("o", "c", "f").unwrap().values else {
        panic!("float property expected");
    };
    let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(read), bits(&values));
}

#[test]
fn test_big_endian_round_trip() {
    let model = every_type();
    let options = WriterOptions::default().with_byte_order(Endian::Big);
    let bytes = SimpleWriter::new(options).write(&model, Format::Binary).unwrap();
    assert_eq!(&bytes[..4], &[0, 0, 0x02, 0x9f]);
    assert_eq!(read_model(&bytes).unwrap(), model);
}

#[test]
fn test_version_3_folds_dims() {
    let mut model = every_type();
    model.version = 3;
    let bytes = write_binary(&model).unwrap();
    let back = read_model(&bytes).unwrap();
    assert_eq!(back.version, 3);

    let matrix = back.property("cube", "object", "globalMatrix").unwrap();
    assert_eq!(matrix.layout, Layout::width(16));
    assert_eq!(matrix.size(), 2);
    let original = model.property("cube", "object", "globalMatrix").unwrap();
    assert_eq!(matrix.values, original.values);
}

#[test]
fn test_component_flags_survive_binary() {
    let mut component = Component::new("nested");
    component.flags = ComponentInfo::TRANSPOSED;
    component.child_level = 3;
    let model = Model {
        objects: vec![Object::new("o", "p", 1).with_component(component.clone())],
        ..Default::default()
    };
    let back = read_model(&write_binary(&model).unwrap()).unwrap();
    assert_eq!(back.objects[0].components[0], component);
}
