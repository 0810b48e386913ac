//! Encode plain data as a literal expression tree that can be embedded in
//! generated TypeScript/JavaScript source.
//!
//! Any `Serialize` value is accepted. `Option::None` plays the role of the
//! undefined marker: it prints as `void 0`, and object entries holding it are
//! left out entirely. Unit (and `serde_json::Value::Null`) prints as `null`.
use std::fmt;

use serde::ser::{self, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Void,
    Null,
    Bool(bool),
    /// numeric literal text
    Number(String),
    String(String),
    Array { elements: Vec<Expr>, multiline: bool },
    Object { properties: Vec<(String, Expr)>, multiline: bool },
}

pub fn encode_value_as_expression<T: Serialize + ?Sized>(value: &T) -> Result<Expr> {
    value.serialize(ExprSerializer)
}

// ------------------------------- Printing -------------------------------- //

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, 0)
    }
}

impl Expr {
    fn write(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Expr::Void => f.write_str("void 0"),
            Expr::Null => f.write_str("null"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Number(n) => f.write_str(n),
            Expr::String(s) => write_string_literal(f, s),
            Expr::Array { elements, .. } if elements.is_empty() => f.write_str("[]"),
            Expr::Array { elements, multiline } => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    separate(f, i, *multiline, indent + 1, "")?;
                    element.write(f, indent + 1)?;
                }
                close(f, *multiline, indent, "]")
            }
            Expr::Object { properties, .. } if properties.is_empty() => f.write_str("{}"),
            Expr::Object { properties, multiline } => {
                f.write_str("{")?;
                for (i, (key, value)) in properties.iter().enumerate() {
                    separate(f, i, *multiline, indent + 1, " ")?;
                    if is_identifier(key) {
                        f.write_str(key)?;
                    } else {
                        write_string_literal(f, key)?;
                    }
                    f.write_str(": ")?;
                    value.write(f, indent + 1)?;
                }
                if !*multiline {
                    f.write_str(" ")?;
                }
                close(f, *multiline, indent, "}")
            }
        }
    }
}

fn separate(
    f: &mut fmt::Formatter<'_>,
    index: usize,
    multiline: bool,
    indent: usize,
    pad: &str,
) -> fmt::Result {
    match (index, multiline) {
        (0, true) => write!(f, "\n{:width$}", "", width = indent * 2),
        (_, true) => write!(f, ",\n{:width$}", "", width = indent * 2),
        (0, false) => f.write_str(pad),
        (_, false) => f.write_str(", "),
    }
}

fn close(f: &mut fmt::Formatter<'_>, multiline: bool, indent: usize, bracket: &str) -> fmt::Result {
    if multiline {
        write!(f, "\n{:width$}{bracket}", "", width = indent * 2)
    } else {
        f.write_str(bracket)
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    // JSON string escaping is valid JS string syntax.
    let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

// ------------------------------ Serializer ------------------------------- //

pub struct ExprSerializer;

fn number(text: impl ToString) -> Result<Expr> {
    Ok(Expr::Number(text.to_string()))
}

fn float(v: f64) -> Result<Expr> {
    if v.is_finite() {
        number(v)
    } else {
        Err(Error::UnsupportedValue(format!("the non-finite number {v}")))
    }
}

impl ser::Serializer for ExprSerializer {
    type Ok = Expr;
    type Error = Error;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantBuilder<SeqBuilder>;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantBuilder<MapBuilder>;

    fn serialize_bool(self, v: bool) -> Result<Expr> {
        Ok(Expr::Bool(v))
    }
    fn serialize_i8(self, v: i8) -> Result<Expr> {
        number(v)
    }
    fn serialize_i16(self, v: i16) -> Result<Expr> {
        number(v)
    }
    fn serialize_i32(self, v: i32) -> Result<Expr> {
        number(v)
    }
    fn serialize_i64(self, v: i64) -> Result<Expr> {
        number(v)
    }
    fn serialize_i128(self, v: i128) -> Result<Expr> {
        number(v)
    }
    fn serialize_u8(self, v: u8) -> Result<Expr> {
        number(v)
    }
    fn serialize_u16(self, v: u16) -> Result<Expr> {
        number(v)
    }
    fn serialize_u32(self, v: u32) -> Result<Expr> {
        number(v)
    }
    fn serialize_u64(self, v: u64) -> Result<Expr> {
        number(v)
    }
    fn serialize_u128(self, v: u128) -> Result<Expr> {
        number(v)
    }
    fn serialize_f32(self, v: f32) -> Result<Expr> {
        float(f64::from(v))
    }
    fn serialize_f64(self, v: f64) -> Result<Expr> {
        float(v)
    }
    fn serialize_char(self, v: char) -> Result<Expr> {
        Ok(Expr::String(v.to_string()))
    }
    fn serialize_str(self, v: &str) -> Result<Expr> {
        Ok(Expr::String(v.to_owned()))
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<Expr> {
        Err(Error::UnsupportedValue(format!("a byte buffer ({} bytes)", v.len())))
    }
    fn serialize_none(self) -> Result<Expr> {
        Ok(Expr::Void)
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Expr> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Expr> {
        Ok(Expr::Null)
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Expr> {
        Ok(Expr::Null)
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Expr> {
        Ok(Expr::String(variant.to_owned()))
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Expr> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Expr> {
        Ok(variant_object(variant, value.serialize(ExprSerializer)?))
    }
    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder> {
        Ok(SeqBuilder { elements: Vec::with_capacity(len.unwrap_or(0)) })
    }
    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantBuilder<SeqBuilder>> {
        Ok(VariantBuilder { variant, inner: self.serialize_seq(Some(len))? })
    }
    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder> {
        Ok(MapBuilder::new(len))
    }
    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder> {
        Ok(MapBuilder::new(Some(len)))
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantBuilder<MapBuilder>> {
        Ok(VariantBuilder { variant, inner: MapBuilder::new(Some(len)) })
    }
}

pub struct SeqBuilder {
    elements: Vec<Expr>,
}

impl SeqBuilder {
    fn finish(self) -> Expr {
        Expr::Array { elements: self.elements, multiline: true }
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Expr;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.elements.push(value.serialize(ExprSerializer)?);
        Ok(())
    }
    fn end(self) -> Result<Expr> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Expr;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }
    fn end(self) -> Result<Expr> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Expr;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }
    fn end(self) -> Result<Expr> {
        Ok(self.finish())
    }
}

pub struct MapBuilder {
    properties: Vec<(String, Expr)>,
    pending_key: Option<String>,
}

impl MapBuilder {
    fn new(len: Option<usize>) -> Self {
        Self { properties: Vec::with_capacity(len.unwrap_or(0)), pending_key: None }
    }

    /// Entries holding the undefined marker are dropped.
    fn push(&mut self, key: String, value: Expr) {
        if value != Expr::Void {
            self.properties.push((key, value));
        }
    }

    fn finish(self) -> Expr {
        Expr::Object { properties: self.properties, multiline: true }
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Expr;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        // string keys, plus numbers spelled as strings (serde_json convention)
        let key = match key.serialize(ExprSerializer)? {
            Expr::String(s) | Expr::Number(s) => s,
            other => return Err(Error::UnsupportedValue(format!("a map key `{other}`"))),
        };
        self.pending_key = Some(key);
        Ok(())
    }
    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::UnsupportedValue("a map value without a key".to_owned()))?;
        let value = value.serialize(ExprSerializer)?;
        self.push(key, value);
        Ok(())
    }
    fn end(self) -> Result<Expr> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = Expr;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        let value = value.serialize(ExprSerializer)?;
        self.push(key.to_owned(), value);
        Ok(())
    }
    fn end(self) -> Result<Expr> {
        Ok(self.finish())
    }
}

/// Data-carrying enum variant, encoded as `{ Variant: payload }`.
pub struct VariantBuilder<B> {
    variant: &'static str,
    inner: B,
}

/// The payload is kept even when it is the undefined marker.
fn variant_object(variant: &'static str, payload: Expr) -> Expr {
    Expr::Object { properties: vec![(variant.to_owned(), payload)], multiline: true }
}

impl ser::SerializeTupleVariant for VariantBuilder<SeqBuilder> {
    type Ok = Expr;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(&mut self.inner, value)
    }
    fn end(self) -> Result<Expr> {
        Ok(variant_object(self.variant, self.inner.finish()))
    }
}

impl ser::SerializeStructVariant for VariantBuilder<MapBuilder> {
    type Ok = Expr;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }
    fn end(self) -> Result<Expr> {
        Ok(variant_object(self.variant, self.inner.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(serde::Serialize)]
    struct Sample {
        a: u32,
        b: Option<u32>,
        c: (bool, ()),
    }

    #[test]
    fn undefined_entries_are_omitted() {
        let expr = encode_value_as_expression(&Sample { a: 1, b: None, c: (true, ()) }).unwrap();
        let expected = encode_value_as_expression(&json!({ "a": 1, "c": [true, null] })).unwrap();
        assert_eq!(expr, expected);
        assert_eq!(expr.to_string(), "{\n  a: 1,\n  c: [\n    true,\n    null\n  ]\n}");
    }

    #[test]
    fn undefined_in_a_sequence_keeps_its_slot() {
        let expr = encode_value_as_expression(&vec![Some(1), None]).unwrap();
        assert_eq!(
            expr,
            Expr::Array {
                elements: vec![Expr::Number("1".into()), Expr::Void],
                multiline: true
            }
        );
    }

    #[test]
    fn null_and_undefined_are_distinct() {
        let mut map: BTreeMap<&str, Option<()>> = BTreeMap::new();
        map.insert("gone", None);
        map.insert("kept", Some(()));
        let expr = encode_value_as_expression(&map).unwrap();
        assert_eq!(expr.to_string(), "{\n  kept: null\n}");
        assert_eq!(encode_value_as_expression(&None::<u8>).unwrap(), Expr::Void);
    }

    #[test]
    fn bytes_are_unsupported() {
        struct Blob;
        impl serde::Serialize for Blob {
            fn serialize<S>(&self, s: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                s.serialize_bytes(&[0xde, 0xad])
            }
        }
        let err = encode_value_as_expression(&Blob).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue(ref what) if what.contains("byte buffer")));
    }

    #[test]
    fn non_finite_numbers_are_unsupported() {
        assert!(matches!(
            encode_value_as_expression(&f64::NAN),
            Err(Error::UnsupportedValue(_))
        ));
    }

    #[test]
    fn non_string_keys_are_unsupported() {
        let mut map = BTreeMap::new();
        map.insert(true, 1);
        assert!(matches!(encode_value_as_expression(&map), Err(Error::UnsupportedValue(_))));
    }

    #[test]
    fn prints_multiline_literal_source() {
        let expr = encode_value_as_expression(&json!({
            "type": "object",
            "$ref": "runtime#date",
            "min-items": 0,
            "items": [1.5, "x\"y"],
            "empty": [],
            "nested": {}
        }))
        .unwrap();
        let expected = [
            "{",
            "  type: \"object\",",
            "  $ref: \"runtime#date\",",
            "  \"min-items\": 0,",
            "  items: [",
            "    1.5,",
            "    \"x\\\"y\"",
            "  ],",
            "  empty: [],",
            "  nested: {}",
            "}",
        ]
        .join("\n");
        assert_eq!(expr.to_string(), expected);
    }

    #[test]
    fn prints_single_line_nodes() {
        let expr = Expr::Object {
            properties: vec![
                ("a".into(), Expr::Void),
                (
                    "b".into(),
                    Expr::Array {
                        elements: vec![Expr::Null, Expr::Bool(false)],
                        multiline: false,
                    },
                ),
            ],
            multiline: false,
        };
        assert_eq!(expr.to_string(), "{ a: void 0, b: [null, false] }");
    }

    #[derive(serde::Serialize)]
    enum Shape {
        Point,
        Circle(f64),
        Rect { w: u8, h: u8 },
        Label(Option<String>),
    }

    #[test]
    fn enum_variants_follow_serde_json_layout() {
        assert_eq!(encode_value_as_expression(&Shape::Point).unwrap().to_string(), "\"Point\"");
        assert_eq!(
            encode_value_as_expression(&Shape::Circle(2.0)).unwrap().to_string(),
            "{\n  Circle: 2\n}"
        );
        assert_eq!(
            encode_value_as_expression(&Shape::Rect { w: 1, h: 2 }).unwrap().to_string(),
            "{\n  Rect: {\n    w: 1,\n    h: 2\n  }\n}"
        );
    }

    #[test]
    fn newtype_variant_keeps_an_undefined_payload() {
        let expr = encode_value_as_expression(&Shape::Label(None)).unwrap();
        assert_eq!(expr.to_string(), "{\n  Label: void 0\n}");
    }
}
