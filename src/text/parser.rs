//! Recursive-descent parser for the text format.
//!
//! ```text
//! file       := "GTOa" "(" NUMBER ")" object*
//! object     := NAME ":" NAME [ "(" NUMBER ")" ] "{" component* "}"
//! component  := NAME [ "as" NAME ] "{" property* "}"
//! property   := TYPE [ "[" dims "]" ] [ "[" NUMBER "]" ] NAME [ "as" NAME ] "=" value
//! value      := "[" (value | scalar)* "]" | scalar
//! ```
//!
//! `NAME` is an identifier or a quoted string. The first bracket group after
//! the type is the element shape (one number is a width, a comma list is
//! dims); a second group is the element count. Without it the count is
//! inferred from the value.

use std::str::FromStr;

use super::lexer::{Lexer, Number, Spanned, Token};
use crate::core::{
    ComponentInfo, Header, Index, Layout, ObjectInfo, PropertyData, PropertyInfo, ReadHandler,
    Request, StringTable,
};
use crate::util::{quantize_half, DataType, Error, Result};

/// Leading keyword of every text stream.
pub const TEXT_MAGIC: &str = "GTOa";

/// Parser state for one text pass.
pub struct TextParser<'a, 's> {
    lexer: Lexer<'a>,
    current: Spanned<'a>,
    strings: &'s mut StringTable,
    index: &'s mut Index,
}

impl<'a, 's> TextParser<'a, 's> {
    /// Create a parser over `src`, filling `strings` and `index`.
    pub fn new(src: &'a str, strings: &'s mut StringTable, index: &'s mut Index) -> Result<Self> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            strings,
            index,
        })
    }

    /// Parse the whole stream, driving `handler`.
    ///
    /// With `header_only` parsing stops after the version line.
    pub fn parse<H: ReadHandler + ?Sized>(
        mut self,
        handler: &mut H,
        header_only: bool,
    ) -> Result<Header> {
        let mut header = self.parse_header()?;
        handler.header(&header);
        if header_only {
            return Ok(header);
        }

        while self.current.token != Token::Eof {
            self.parse_object(handler)?;
        }
        handler.description_complete();

        header.num_objects = self.index.objects.len() as u32;
        header.num_strings = self.strings.len() as u32;
        tracing::debug!(
            objects = header.num_objects,
            strings = header.num_strings,
            "parsed text stream"
        );
        Ok(header)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn advance(&mut self) -> Result<Spanned<'a>> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error_here(&self, msg: impl Into<String>) -> Error {
        Error::syntax(self.current.line, self.current.column, msg)
    }

    fn expected(&self, what: &str) -> Error {
        self.error_here(format!("expected {}, found {}", what, self.current.token))
    }

    fn expect(&mut self, token: Token<'static>, what: &str) -> Result<()> {
        if self.current.token == token {
            self.advance()?;
            Ok(())
        } else {
            Err(self.expected(what))
        }
    }

    fn eat(&mut self, token: Token<'static>) -> Result<bool> {
        if self.current.token == token {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn name(&mut self, what: &str) -> Result<String> {
        if !matches!(self.current.token, Token::Ident(_) | Token::Str(_)) {
            return Err(self.expected(what));
        }
        let Spanned { token, line, column } = self.advance()?;
        match token {
            Token::Ident(s) => Ok(s.to_string()),
            Token::Str(s) => Ok(s),
            other => Err(Error::syntax(line, column, format!("expected {}, found {}", what, other))),
        }
    }

    fn integer<T: FromStr>(&mut self, what: &str) -> Result<T> {
        match self.current.token {
            Token::Number(Number { text, is_float: false }) => {
                let value = text
                    .parse::<T>()
                    .map_err(|_| self.error_here(format!("{} out of range: {}", what, text)))?;
                self.advance()?;
                Ok(value)
            }
            _ => Err(self.expected(what)),
        }
    }

    fn interpretation(&mut self) -> Result<String> {
        if self.eat(Token::As)? {
            self.name("interpretation")
        } else {
            Ok(String::new())
        }
    }

    // ------------------------------------------------------------------
    // Grammar
    // ------------------------------------------------------------------

    fn parse_header(&mut self) -> Result<Header> {
        match self.current.token {
            Token::Ident(TEXT_MAGIC) => {
                self.advance()?;
            }
            _ => return Err(self.expected("'GTOa'")),
        }
        self.expect(Token::LParen, "'('")?;
        let version: u32 = self.integer("version")?;
        self.expect(Token::RParen, "')'")?;
        if !Header::is_supported_version(version) {
            return Err(Error::UnsupportedVersion(version));
        }
        Ok(Header::new(version))
    }

    fn parse_object<H: ReadHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        let name = self.name("object name")?;
        self.expect(Token::Colon, "':'")?;
        let protocol = self.name("protocol name")?;
        let protocol_version = if self.eat(Token::LParen)? {
            let v = self.integer("protocol version")?;
            self.expect(Token::RParen, "')'")?;
            v
        } else {
            0
        };

        let info = ObjectInfo {
            name: self.strings.intern(&name),
            protocol: self.strings.intern(&protocol),
            protocol_version,
            num_components: 0,
            component_offset: self.index.components.len(),
        };
        let object = self.index.objects.len();
        self.index.objects.push(info);

        let request = handler.object(&name, &protocol, protocol_version, &info);

        self.expect(Token::LBrace, "'{' to open object")?;
        while !matches!(self.current.token, Token::RBrace) {
            if self.current.token == Token::Eof {
                return Err(self.expected("'}' to close object"));
            }
            self.parse_component(handler, object, request)?;
        }
        self.advance()?;
        Ok(())
    }

    fn parse_component<H: ReadHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        object: usize,
        parent: Request,
    ) -> Result<()> {
        let name = self.name("component name")?;
        let interpretation = self.interpretation()?;

        let info = ComponentInfo {
            name: self.strings.intern(&name),
            interpretation: self.strings.intern(&interpretation),
            object,
            property_offset: self.index.properties.len(),
            ..Default::default()
        };
        let component = self.index.components.len();
        self.index.components.push(info);
        self.index.objects[object].num_components += 1;

        let request = if parent.is_read() {
            handler.component(&name, &interpretation, &info)
        } else {
            Request::Skip
        };

        self.expect(Token::LBrace, "'{' to open component")?;
        while !matches!(self.current.token, Token::RBrace) {
            if self.current.token == Token::Eof {
                return Err(self.expected("'}' to close component"));
            }
            self.parse_property(handler, component, request)?;
        }
        self.advance()?;
        Ok(())
    }

    fn parse_property<H: ReadHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        component: usize,
        parent: Request,
    ) -> Result<()> {
        let line = self.current.line;
        let ty = match self.current.token {
            Token::Ident(t) => DataType::from_name(t).ok_or_else(|| Error::UnknownType {
                name: t.to_string(),
                line,
            })?,
            _ => return Err(self.expected("property type")),
        };
        self.advance()?;

        let mut layout = Layout::SCALAR;
        let mut declared_size = None;
        if self.current.token == Token::LBracket {
            let shape = self.bracket_list()?;
            layout = match shape.as_slice() {
                [w] => Layout::width(*w),
                dims if dims.len() <= 4 => Layout::dims(dims),
                _ => {
                    return Err(Error::syntax(
                        line,
                        1,
                        format!("at most 4 dimensions allowed, found {}", shape.len()),
                    ))
                }
            };
            if self.current.token == Token::LBracket {
                match self.bracket_list()?.as_slice() {
                    [n] => declared_size = Some(*n),
                    _ => return Err(self.error_here("size bracket takes a single number")),
                }
            }
        }

        let name = self.name("property name")?;
        let interpretation = self.interpretation()?;
        self.expect(Token::Equals, "'='")?;

        // The size bracket is untrusted; storage grows with the parsed values.
        let mut data = PropertyData::with_capacity(ty, 0);
        self.parse_value(&mut data, 0)?;

        let element_width = layout.element_width();
        let size = match declared_size {
            Some(size) => {
                let expected = (size as usize)
                    .checked_mul(element_width)
                    .ok_or_else(|| Error::syntax(line, 1, "declared size overflows"))?;
                if expected != data.len() {
                    return Err(Error::syntax(
                        line,
                        1,
                        format!(
                            "property '{}' declares {} elements of width {} but has {} values",
                            name,
                            size,
                            element_width,
                            data.len()
                        ),
                    ));
                }
                size
            }
            None => {
                let size = data.len() / element_width;
                if size * element_width != data.len() {
                    tracing::warn!(
                        property = %name,
                        values = data.len(),
                        element_width,
                        "value count is not a multiple of the element width; truncating"
                    );
                    truncate(&mut data, size * element_width);
                }
                size as u32
            }
        };

        let info = PropertyInfo {
            name: self.strings.intern(&name),
            interpretation: self.strings.intern(&interpretation),
            ty,
            size,
            layout,
            component,
            data_offset: None,
        };
        self.index.properties.push(info);
        self.index.components[component].num_properties += 1;

        if parent.is_read()
            && handler.property(&name, &interpretation, &info).is_read()
            && handler.data_ready(&info, data.len()).is_read()
        {
            handler.data_read(&info, data, self.strings);
        }
        Ok(())
    }

    fn bracket_list(&mut self) -> Result<Vec<u32>> {
        self.expect(Token::LBracket, "'['")?;
        let mut out = vec![self.integer("dimension")?];
        while self.eat(Token::Comma)? {
            out.push(self.integer("dimension")?);
        }
        self.expect(Token::RBracket, "']'")?;
        Ok(out)
    }

    fn parse_value(&mut self, data: &mut PropertyData, depth: usize) -> Result<()> {
        if self.current.token != Token::LBracket {
            return self.parse_scalar(data);
        }
        if depth > 8 {
            return Err(self.error_here("value nesting too deep"));
        }
        self.advance()?;
        loop {
            match self.current.token {
                Token::RBracket => {
                    self.advance()?;
                    return Ok(());
                }
                Token::Comma => {
                    self.advance()?;
                }
                Token::Eof => return Err(self.expected("']'")),
                _ => self.parse_value(data, depth + 1)?,
            }
        }
    }

    fn parse_scalar(&mut self, data: &mut PropertyData) -> Result<()> {
        let tok = self.advance()?;
        match data {
            PropertyData::Int(v) => v.push(int_value(&tok, "int")?),
            PropertyData::Short(v) => v.push(int_value(&tok, "short")?),
            PropertyData::Byte(v) => v.push(int_value(&tok, "byte")?),
            PropertyData::Int64(v) => v.push(int_value(&tok, "int64")?),
            PropertyData::Float(v) => v.push(float_value(&tok, "float")?),
            PropertyData::Double(v) => v.push(float_value(&tok, "double")?),
            PropertyData::Half(v) => v.push(quantize_half(float_value(&tok, "half")?)),
            PropertyData::Boolean(v) => v.push(match &tok.token {
                Token::Ident("true") => true,
                Token::Ident("false") => false,
                _ => int_value::<i64>(&tok, "bool")? != 0,
            }),
            PropertyData::String(v) => match &tok.token {
                Token::Str(s) => v.push(self.strings.intern(s)),
                Token::Ident(s) => v.push(self.strings.intern(s)),
                _ => return Err(unexpected_value(&tok, "string")),
            },
        }
        Ok(())
    }
}

fn unexpected_value(tok: &Spanned<'_>, what: &str) -> Error {
    Error::syntax(
        tok.line,
        tok.column,
        format!("expected {} value, found {}", what, tok.token),
    )
}

fn int_value<T: FromStr>(tok: &Spanned<'_>, what: &str) -> Result<T> {
    match tok.token {
        Token::Number(Number { text, is_float: false }) => text.parse::<T>().map_err(|_| {
            Error::syntax(
                tok.line,
                tok.column,
                format!("{} value out of range: {}", what, text),
            )
        }),
        _ => Err(unexpected_value(tok, what)),
    }
}

/// Float literal, including the `nan`/`inf`/`-inf` spellings.
fn float_value<T: FromStr + NonFinite>(tok: &Spanned<'_>, what: &str) -> Result<T> {
    let value = match &tok.token {
        Token::Number(Number { text, .. }) => text.parse::<T>().ok(),
        Token::Ident("nan") => Some(T::NAN),
        Token::Ident("inf") => Some(T::INFINITY),
        Token::Ident("-inf") => Some(T::NEG_INFINITY),
        _ => None,
    };
    value.ok_or_else(|| unexpected_value(tok, what))
}

/// Non-finite constants for the float literal spellings.
pub(crate) trait NonFinite {
    const NAN: Self;
    const INFINITY: Self;
    const NEG_INFINITY: Self;
}

impl NonFinite for f32 {
    const NAN: Self = f32::NAN;
    const INFINITY: Self = f32::INFINITY;
    const NEG_INFINITY: Self = f32::NEG_INFINITY;
}

impl NonFinite for f64 {
    const NAN: Self = f64::NAN;
    const INFINITY: Self = f64::INFINITY;
    const NEG_INFINITY: Self = f64::NEG_INFINITY;
}

fn truncate(data: &mut PropertyData, len: usize) {
    match data {
        PropertyData::Int(v) => v.truncate(len),
        PropertyData::Float(v) => v.truncate(len),
        PropertyData::Double(v) => v.truncate(len),
        PropertyData::Half(v) => v.truncate(len),
        PropertyData::String(v) => v.truncate(len),
        PropertyData::Boolean(v) => v.truncate(len),
        PropertyData::Short(v) => v.truncate(len),
        PropertyData::Byte(v) => v.truncate(len),
        PropertyData::Int64(v) => v.truncate(len),
    }
}

/// Parse a text stream in one call.
pub fn parse_text<H: ReadHandler + ?Sized>(
    src: &str,
    strings: &mut StringTable,
    index: &mut Index,
    handler: &mut H,
    header_only: bool,
) -> Result<Header> {
    TextParser::new(src, strings, index)?.parse(handler, header_only)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        data: Vec<(String, PropertyData)>,
        skip_objects: Vec<&'static str>,
        skip_properties: Vec<&'static str>,
        names: Vec<String>,
    }

    impl ReadHandler for Recorder {
        fn object(&mut self, name: &str, protocol: &str, version: u32, _: &ObjectInfo) -> Request {
            self.events.push(format!("object {} {} {}", name, protocol, version));
            Request::from(!self.skip_objects.iter().any(|s| *s == name))
        }

        fn component(&mut self, name: &str, interp: &str, _: &ComponentInfo) -> Request {
            self.events.push(format!("component {} {}", name, interp));
            Request::Read
        }

        fn property(&mut self, name: &str, interp: &str, info: &PropertyInfo) -> Request {
            self.events.push(format!("property {} {} {}x{}", name, interp, info.size, info.layout.width));
            self.names.push(name.to_string());
            Request::from(!self.skip_properties.iter().any(|s| *s == name))
        }

        fn data_read(&mut self, _info: &PropertyInfo, data: PropertyData, _: &StringTable) {
            let name = self.names.last().cloned().unwrap_or_default();
            self.data.push((name, data));
        }
    }

    fn parse(src: &str, handler: &mut Recorder) -> Result<(Header, StringTable, Index)> {
        let mut strings = StringTable::new();
        let mut index = Index::default();
        let header = parse_text(src, &mut strings, &mut index, handler, false)?;
        Ok((header, strings, index))
    }

    #[test]
    fn test_minimal_stream() {
        let src = "GTOa (4)\n\nobj : proto (1)\n{\n  comp\n  {\n    int[1][3] v = [ 1 2 3 ]\n  }\n}\n";
        let mut rec = Recorder::default();
        let (header, strings, index) = parse(src, &mut rec).unwrap();

        assert_eq!(header.version, 4);
        assert_eq!(header.num_objects, 1);
        assert_eq!(index.properties.len(), 1);
        let p = index.properties[0];
        assert_eq!(p.ty, DataType::Int);
        assert_eq!(p.layout.width, 1);
        assert_eq!(p.size, 3);
        assert_eq!(strings.id_to_string(p.name).unwrap(), "v");
        assert_eq!(rec.data, vec![("v".to_string(), PropertyData::Int(vec![1, 2, 3]))]);
        assert_eq!(
            rec.events,
            vec!["object obj proto 1", "component comp ", "property v  3x1"]
        );
    }

    #[test]
    fn test_width_then_size() {
        let src = "GTOa (4)\no : p { c { float[3][2] p = [[1,2,3],[4,5,6]] } }";
        let mut rec = Recorder::default();
        let (_, _, index) = parse(src, &mut rec).unwrap();
        let p = index.properties[0];
        assert_eq!(p.layout, Layout::width(3));
        assert_eq!(p.size, 2);
        assert_eq!(
            rec.data[0].1,
            PropertyData::Float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
    }

    #[test]
    fn test_dims_then_size() {
        let src = "GTOa (4)\no : p { c { double[2,2][2] m = [ [1 0 0 1] [2 0 0 2] ] } }";
        let mut rec = Recorder::default();
        let (_, _, index) = parse(src, &mut rec).unwrap();
        let p = index.properties[0];
        assert_eq!(p.layout, Layout::dims(&[2, 2]));
        assert_eq!(p.size, 2);
        assert_eq!(p.total_count(), 8);
    }

    #[test]
    fn test_inferred_size() {
        let src = "GTOa (4)\no : p { c { float[3] p = [ [1 2 3] [4 5 6] [7 8 9] ] } }";
        let mut rec = Recorder::default();
        let (_, _, index) = parse(src, &mut rec).unwrap();
        assert_eq!(index.properties[0].size, 3);
    }

    #[test]
    fn test_inferred_size_floors() {
        let src = "GTOa (4)\no : p { c { int[2] p = [ 1 2 3 ] } }";
        let mut rec = Recorder::default();
        let (_, _, index) = parse(src, &mut rec).unwrap();
        assert_eq!(index.properties[0].size, 1);
        assert_eq!(rec.data[0].1, PropertyData::Int(vec![1, 2]));
    }

    #[test]
    fn test_declared_size_mismatch() {
        let src = "GTOa (4)\no : p { c { int[1][4] v = [ 1 2 3 ] } }";
        let mut rec = Recorder::default();
        assert!(matches!(parse(src, &mut rec), Err(Error::Syntax { line: 2, .. })));
    }

    #[test]
    fn test_declared_size_overflow_is_an_error() {
        let src = "GTOa (4)\no : p { c { int[4294967295,4294967295,4294967295][2] x = [ 1 ] } }";
        let mut rec = Recorder::default();
        match parse(src, &mut rec) {
            Err(Error::Syntax { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("overflows"));
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_huge_declared_size_does_not_allocate() {
        let src = "GTOa (4)\no : p { c { int64[1][4294967295] x = 1 } }";
        let mut rec = Recorder::default();
        assert!(matches!(parse(src, &mut rec), Err(Error::Syntax { line: 2, .. })));
        assert!(rec.data.is_empty());
    }

    #[test]
    fn test_scalars_and_interpretations() {
        let src = r#"GTOa (3)
# a comment
"my object" : polygon (2)
{
    points as particle
    {
        string s as label = "hello"
        string ids = [ alpha "beta gamma" ]
        bool flags = [ true false 1 0 ]
        short sh = -7
        byte b = 255
        int64 big = 9000000000
        half h = 0.1
        double d = [ nan inf -inf 1e300 ]
    }
}
"#;
        let mut rec = Recorder::default();
        let (header, strings, _) = parse(src, &mut rec).unwrap();
        assert_eq!(header.version, 3);
        assert_eq!(rec.events[0], "object my object polygon 2");
        assert_eq!(rec.events[1], "component points particle");
        assert_eq!(rec.events[2], "property s label 1x1");

        let by_name = |n: &str| rec.data.iter().find(|(k, _)| k == n).map(|(_, d)| d.clone()).unwrap();
        match by_name("ids") {
            PropertyData::String(ids) => {
                let resolved: Vec<&str> = ids.iter().map(|&i| strings.id_to_string(i).unwrap()).collect();
                assert_eq!(resolved, vec!["alpha", "beta gamma"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(by_name("flags"), PropertyData::Boolean(vec![true, false, true, false]));
        assert_eq!(by_name("sh"), PropertyData::Short(vec![-7]));
        assert_eq!(by_name("b"), PropertyData::Byte(vec![255]));
        assert_eq!(by_name("big"), PropertyData::Int64(vec![9_000_000_000]));
        assert_eq!(by_name("h"), PropertyData::Half(vec![quantize_half(0.1)]));
        match by_name("d") {
            PropertyData::Double(d) => {
                assert!(d[0].is_nan());
                assert_eq!(d[1], f64::INFINITY);
                assert_eq!(d[2], f64::NEG_INFINITY);
                assert_eq!(d[3], 1e300);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_skipped_object_is_fully_consumed() {
        let src = "GTOa (4)\n\
            a : p { c { int x = [ 1 2 ] } }\n\
            b : p { c { int y = 5 } }";
        let mut rec = Recorder {
            skip_objects: vec!["a"],
            ..Default::default()
        };
        let (_, _, index) = parse(src, &mut rec).unwrap();
        assert_eq!(index.objects.len(), 2);
        assert_eq!(index.properties.len(), 2);
        assert_eq!(rec.data, vec![("y".to_string(), PropertyData::Int(vec![5]))]);
        assert!(!rec.events.iter().any(|e| e.contains("property x")));
    }

    #[test]
    fn test_skipped_property_keeps_siblings() {
        let src = "GTOa (4)\no : p { c { int x = 1 float y = 2.5 int z = 3 } }";
        let mut rec = Recorder {
            skip_properties: vec!["y"],
            ..Default::default()
        };
        parse(src, &mut rec).unwrap();
        let names: Vec<&str> = rec.data.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["x", "z"]);
    }

    #[test]
    fn test_header_only() {
        let src = "GTOa (4)\nthis is { not parsed";
        let mut strings = StringTable::new();
        let mut index = Index::default();
        let mut rec = Recorder::default();
        let header = parse_text(src, &mut strings, &mut index, &mut rec, true).unwrap();
        assert_eq!(header.version, 4);
        assert!(index.objects.is_empty());
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let mut rec = Recorder::default();
        match parse("GTOa (4)\no : p {\n c {\n  vec3 x = 1 } }", &mut rec) {
            Err(Error::UnknownType { name, line }) => {
                assert_eq!(name, "vec3");
                assert_eq!(line, 4);
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            parse("GTOa (4)\no : p {\n c {\n  int x 1 } }", &mut rec),
            Err(Error::Syntax { line: 4, .. })
        ));
        assert!(matches!(
            parse("GTOa (4)\no : p { c { int[3 x = 1 } }", &mut rec),
            Err(Error::Syntax { .. })
        ));
        assert!(matches!(
            parse("GTOa (4)\no : p { c { int x = 1.5 } }", &mut rec),
            Err(Error::Syntax { .. })
        ));
        assert!(matches!(
            parse("GTOa (4)\no : p { c { byte x = 256 } }", &mut rec),
            Err(Error::Syntax { .. })
        ));
        assert!(matches!(parse("GTOa (9)", &mut rec), Err(Error::UnsupportedVersion(9))));
        assert!(matches!(parse("GTOb (4)", &mut rec), Err(Error::Syntax { line: 1, .. })));
        assert!(matches!(parse("GTOa (4)\no : p { c {", &mut rec), Err(Error::Syntax { .. })));
    }
}
