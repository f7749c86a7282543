//! Integration tests for the writer API.

use gto::binary::Endian;
use gto::core::{Layout, PropertyData};
use gto::{read_model, DataType, Error, Format, Values, Writer, WriterOptions};

struct Prop {
    name: &'static str,
    interpretation: &'static str,
    layout: Layout,
    data: PropertyData,
}

fn props(writer: &mut Writer) -> Vec<Prop> {
    let names = vec![writer.intern("left"), writer.intern("right"), writer.intern("left")];
    vec![
        Prop {
            name: "position",
            interpretation: "coordinate",
            layout: Layout::width(3),
            data: PropertyData::Float((0..15).map(|i| i as f32 / 4.0).collect()),
        },
        Prop {
            name: "sides",
            interpretation: "",
            layout: Layout::SCALAR,
            data: PropertyData::String(names),
        },
        Prop {
            name: "matrix",
            interpretation: "",
            layout: Layout::dims(&[4, 4]),
            data: PropertyData::Double((0..16).map(f64::from).collect()),
        },
    ]
}

fn inline(format: Format, options: WriterOptions) -> Vec<u8> {
    let mut w = Writer::new();
    w.open(format, options).unwrap();
    let props = props(&mut w);
    w.begin_object("shape", "polygon", 3).unwrap();
    w.begin_component("points", "geometry").unwrap();
    for p in props {
        w.property_with_data(p.name, p.interpretation, p.layout, p.data).unwrap();
    }
    w.end_component().unwrap();
    w.end_object().unwrap();
    w.close().unwrap()
}

fn two_phase(format: Format, options: WriterOptions) -> Vec<u8> {
    let mut w = Writer::new();
    w.open(format, options).unwrap();
    let props = props(&mut w);
    w.begin_object("shape", "polygon", 3).unwrap();
    w.begin_component("points", "geometry").unwrap();
    for p in &props {
        let size = (p.data.len() / p.layout.element_width()) as u32;
        w.property(p.name, p.interpretation, p.data.data_type(), p.layout, size).unwrap();
    }
    w.end_component().unwrap();
    w.end_object().unwrap();

    w.begin_data().unwrap();
    for p in props {
        w.property_data(p.data).unwrap();
    }
    w.end_data().unwrap();
    w.close().unwrap()
}

#[test]
fn test_two_phase_matches_inline() {
    for format in [Format::Text, Format::Binary] {
        for options in [
            WriterOptions::default(),
            WriterOptions::version(3),
            WriterOptions::default().with_byte_order(Endian::Big),
        ] {
            assert_eq!(inline(format, options), two_phase(format, options), "{:?} {:?}", format, options);
        }
    }
}

#[test]
fn test_written_streams_read_back() {
    for format in [Format::Text, Format::Binary] {
        let model = read_model(&inline(format, WriterOptions::default())).unwrap();
        let shape = model.object("shape").unwrap();
        assert_eq!(shape.protocol_version, 3);
        let points = shape.component("points").unwrap();
        assert_eq!(points.interpretation, "geometry");
        assert_eq!(points.property("position").unwrap().size(), 5);
        assert_eq!(points.property("position").unwrap().interpretation, "coordinate");
        assert_eq!(
            points.property("sides").unwrap().values,
            Values::String(vec!["left".to_string(), "right".into(), "left".into()].into())
        );
        assert_eq!(points.property("matrix").unwrap().layout, Layout::dims(&[4, 4]));
    }
}

#[test]
fn test_binary_output_has_exact_size() {
    let bytes = inline(Format::Binary, WriterOptions::default());
    // strings: left right shape polygon points geometry position coordinate "" sides matrix
    let strings = [
        "left", "right", "shape", "polygon", "points", "geometry", "position", "coordinate", "",
        "sides", "matrix",
    ]
    .iter()
    .map(|s| s.len() + 1)
    .sum::<usize>();
    let data = 15 * 4 + 3 * 4 + 16 * 8;
    assert_eq!(bytes.len(), 20 + strings + 20 + 20 + 3 * 36 + data);
}

#[test]
fn test_text_layout() {
    let text = String::from_utf8(inline(Format::Text, WriterOptions::default())).unwrap();
    let expected = "\
GTOa (4)

shape : polygon (3)
{
    points as geometry
    {
        float[3] position as coordinate =
        [
            [ 0.0 0.25 0.5 ]
            [ 0.75 1.0 1.25 ]
            [ 1.5 1.75 2.0 ]
            [ 2.25 2.5 2.75 ]
            [ 3.0 3.25 3.5 ]
        ]
        string sides = [ \"left\" \"right\" \"left\" ]
        double[4,4] matrix = [ [ 0.0 1.0 2.0 3.0 4.0 5.0 6.0 7.0 8.0 9.0 10.0 11.0 12.0 13.0 14.0 15.0 ] ]
    }
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_writer_state_errors() {
    let mut w = Writer::new();
    assert!(matches!(w.begin_object("o", "p", 1), Err(Error::InvalidState { state: "closed", .. })));

    w.open(Format::Binary, WriterOptions::default()).unwrap();
    assert!(w.end_object().is_err());
    assert!(w.property("x", "", DataType::Int, Layout::SCALAR, 1).is_err());
    assert!(w.property_data(PropertyData::Int(vec![1])).is_err());
    assert!(w.end_data().is_err());

    w.begin_object("o", "p", 1).unwrap();
    assert!(w.begin_object("o2", "p", 1).is_err());
    assert!(w.begin_data().is_err());
    w.begin_component("c", "").unwrap();
    assert!(w.begin_component("c2", "").is_err());
    assert!(w.end_object().is_err());
    w.end_component().unwrap();
    w.end_object().unwrap();
    w.close().unwrap();
}

#[test]
fn test_empty_stream() {
    let mut w = Writer::new();
    w.open(Format::Text, WriterOptions::default()).unwrap();
    let text = w.close().unwrap();
    assert_eq!(text, b"GTOa (4)\n");
    assert!(read_model(&text).unwrap().objects.is_empty());

    w.open(Format::Binary, WriterOptions::version(2)).unwrap();
    let bytes = w.close().unwrap();
    assert_eq!(bytes.len(), 20);
    assert_eq!(read_model(&bytes).unwrap().version, 2);
}
