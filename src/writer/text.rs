//! Text emission.

use std::fmt::{Debug, Display, Write};

use crate::core::{Index, PropertyData, PropertyInfo, StringTable};
use crate::text::{is_ident_char, TEXT_MAGIC};
use crate::util::Result;

const INDENT: &str = "    ";

/// Width > 1 properties with more elements than this go one per line.
const INLINE_GROUPS: usize = 4;

pub(super) fn encode(
    version: u32,
    strings: &StringTable,
    index: &Index,
    payloads: &[&PropertyData],
) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", TEXT_MAGIC, version);

    for (o, object) in index.objects.iter().enumerate() {
        out.push('\n');
        push_name(&mut out, strings.id_to_string(object.name)?);
        out.push_str(" : ");
        push_name(&mut out, strings.id_to_string(object.protocol)?);
        let _ = writeln!(out, " ({})", object.protocol_version);
        out.push_str("{\n");

        for (c, component) in index.components_of(o).iter().enumerate() {
            let c = object.component_offset + c;
            out.push_str(INDENT);
            push_name(&mut out, strings.id_to_string(component.name)?);
            push_interpretation(&mut out, strings.id_to_string(component.interpretation)?);
            out.push('\n');
            let _ = writeln!(out, "{}{{", INDENT);

            let first = component.property_offset;
            for (p, info) in index.properties_of(c).iter().enumerate() {
                push_property(&mut out, strings, info, payloads[first + p])?;
            }
            let _ = writeln!(out, "{}}}", INDENT);
        }
        out.push_str("}\n");
    }
    Ok(out)
}

fn push_property(
    out: &mut String,
    strings: &StringTable,
    info: &PropertyInfo,
    data: &PropertyData,
) -> Result<()> {
    let indent = INDENT.repeat(2);
    out.push_str(&indent);
    out.push_str(info.ty.name());

    let layout = info.layout;
    if layout.has_dims() && layout.width <= 1 {
        let dims: Vec<String> = layout.used_dims().iter().map(u32::to_string).collect();
        let _ = write!(out, "[{}]", dims.join(","));
    } else if layout.element_width() > 1 {
        let _ = write!(out, "[{}]", layout.element_width());
    }

    out.push(' ');
    push_name(out, strings.id_to_string(info.name)?);
    push_interpretation(out, strings.id_to_string(info.interpretation)?);
    out.push_str(" =");

    let width = layout.element_width();
    let count = data.len();
    if width == 1 && count == 1 {
        out.push(' ');
        push_value(out, strings, data, 0)?;
    } else if width == 1 {
        out.push_str(" [");
        for i in 0..count {
            out.push(' ');
            push_value(out, strings, data, i)?;
        }
        out.push_str(" ]");
    } else {
        let groups = count / width;
        let multiline = groups > INLINE_GROUPS;
        if multiline {
            let _ = write!(out, "\n{}[", indent);
        } else {
            out.push_str(" [");
        }
        for g in 0..groups {
            if multiline {
                let _ = write!(out, "\n{}{}", indent, INDENT);
            } else {
                out.push(' ');
            }
            out.push('[');
            for i in g * width..(g + 1) * width {
                out.push(' ');
                push_value(out, strings, data, i)?;
            }
            out.push_str(" ]");
        }
        if multiline {
            let _ = write!(out, "\n{}]", indent);
        } else {
            out.push_str(" ]");
        }
    }
    out.push('\n');
    Ok(())
}

fn push_interpretation(out: &mut String, interpretation: &str) {
    if !interpretation.is_empty() {
        out.push_str(" as ");
        push_name(out, interpretation);
    }
}

fn push_value(out: &mut String, strings: &StringTable, data: &PropertyData, i: usize) -> Result<()> {
    match data {
        PropertyData::Int(v) => {
            let _ = write!(out, "{}", v[i]);
        }
        PropertyData::Short(v) => {
            let _ = write!(out, "{}", v[i]);
        }
        PropertyData::Byte(v) => {
            let _ = write!(out, "{}", v[i]);
        }
        PropertyData::Int64(v) => {
            let _ = write!(out, "{}", v[i]);
        }
        PropertyData::Boolean(v) => out.push_str(if v[i] { "true" } else { "false" }),
        PropertyData::Float(v) | PropertyData::Half(v) => {
            push_float(out, v[i], v[i].is_nan(), v[i].is_infinite(), v[i].fract() == 0.0)
        }
        PropertyData::Double(v) => {
            push_float(out, v[i], v[i].is_nan(), v[i].is_infinite(), v[i].fract() == 0.0)
        }
        PropertyData::String(v) => push_quoted(out, strings.id_to_string(v[i])?),
    }
    Ok(())
}

// Integral values are written in full with one decimal place. Everything
// else uses Debug, the shortest exact representation, which may carry an
// exponent.
fn push_float<T: Debug + Display + PartialOrd + Default>(
    out: &mut String,
    v: T,
    nan: bool,
    infinite: bool,
    integral: bool,
) {
    if nan {
        out.push_str("nan");
    } else if infinite {
        out.push_str(if v < T::default() { "-inf" } else { "inf" });
    } else if integral {
        let _ = write!(out, "{}.0", v);
    } else {
        let _ = write!(out, "{:?}", v);
    }
}

/// Check whether a name can be written bare.
pub fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "as" && chars.all(is_ident_char)
}

fn push_name(out: &mut String, name: &str) {
    if is_plain_name(name) {
        out.push_str(name);
    } else {
        push_quoted(out, name);
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::super::{Format, Writer, WriterOptions};
    use super::*;
    use crate::core::Layout;

    fn write_one(layout: Layout, data: PropertyData) -> String {
        let mut w = Writer::new();
        w.open(Format::Text, WriterOptions::default()).unwrap();
        w.begin_object("obj", "proto", 1).unwrap();
        w.begin_component("comp", "").unwrap();
        w.property_with_data("p", "", layout, data).unwrap();
        w.end_component().unwrap();
        w.end_object().unwrap();
        String::from_utf8(w.close().unwrap()).unwrap()
    }

    fn property_line(text: &str) -> String {
        text.lines()
            .skip_while(|l| !l.contains(" ="))
            .take_while(|l| l.trim() != "}")
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_document_shape() {
        let text = write_one(Layout::SCALAR, PropertyData::Int(vec![1, 2, 3]));
        assert_eq!(
            text,
            "GTOa (4)\n\nobj : proto (1)\n{\n    comp\n    {\n        int p = [ 1 2 3 ]\n    }\n}\n"
        );
    }

    #[test]
    fn test_singleton_has_no_brackets() {
        let text = write_one(Layout::SCALAR, PropertyData::Double(vec![2.0]));
        assert_eq!(property_line(&text).trim(), "double p = 2.0");
    }

    #[test]
    fn test_grouped_values() {
        let text = write_one(Layout::width(3), PropertyData::Float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.5]));
        assert_eq!(
            property_line(&text).trim(),
            "float[3] p = [ [ 1.0 2.0 3.0 ] [ 4.0 5.0 6.5 ] ]"
        );
    }

    #[test]
    fn test_many_groups_go_multiline() {
        let text = write_one(Layout::width(2), PropertyData::Int((0..10).collect()));
        let block = property_line(&text);
        assert!(block.contains("int[2] p =\n"));
        assert_eq!(block.lines().filter(|l| l.trim_start().starts_with("[ ")).count(), 5);
    }

    #[test]
    fn test_dims_and_non_finite() {
        let text = write_one(
            Layout::dims(&[2, 2]),
            PropertyData::Float(vec![f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.0]),
        );
        assert_eq!(property_line(&text).trim(), "float[2,2] p = [ [ nan inf -inf -0.0 ] ]");
    }

    #[test]
    fn test_gapped_dims_are_compacted() {
        let text = write_one(Layout::dims(&[2, 0, 3, 0]), PropertyData::Int((0..6).collect()));
        assert_eq!(property_line(&text).trim(), "int[2,3] p = [ [ 0 1 2 3 4 5 ] ]");
        let model = crate::read_model(text.as_bytes()).unwrap();
        let p = model.property("obj", "comp", "p").unwrap();
        assert_eq!(p.layout, Layout::dims(&[2, 3]));
        assert_eq!(p.size(), 1);
    }

    #[test]
    fn test_large_integral_floats_keep_one_decimal() {
        let text = write_one(Layout::SCALAR, PropertyData::Double(vec![1e16, -2.5e20, 1e-7]));
        assert_eq!(
            property_line(&text).trim(),
            "double p = [ 10000000000000000.0 -250000000000000000000.0 1e-7 ]"
        );
        let text = write_one(Layout::SCALAR, PropertyData::Float(vec![3e10]));
        assert_eq!(property_line(&text).trim(), "float p = 30000000000.0");
    }

    #[test]
    fn test_name_quoting() {
        assert!(is_plain_name("points"));
        assert!(is_plain_name("_x.y-z"));
        assert!(!is_plain_name("as"));
        assert!(!is_plain_name("2d"));
        assert!(!is_plain_name("has space"));
        assert!(!is_plain_name(""));

        let mut out = String::new();
        push_name(&mut out, "a \"b\"\n");
        assert_eq!(out, "\"a \\\"b\\\"\\n\"");
    }
}
