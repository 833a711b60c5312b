//! Lowering of any `T: Serialize` into a [`Value`] tree.
//!
//! Enums use serde's externally tagged layout: unit variants become their
//! name, everything else a single-entry mapping `{variant: payload}`.
//! Mapping keys must serialize to a scalar; floats and composite keys are
//! rejected.

use serde::ser::{self, Impossible, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::value::{Mapping, Value};

/// Convert `value` into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> CodecResult<Value> {
    value.serialize(ValueSerializer)
}

/// Serializer whose output is a [`Value`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = CodecError;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> CodecResult<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> CodecResult<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> CodecResult<Value> {
        i128::try_from(v)
            .map(Value::Integer)
            .map_err(|_| CodecError::Serialize(format!("integer {v} is out of range")))
    }

    fn serialize_f32(self, v: f32) -> CodecResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> CodecResult<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> CodecResult<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> CodecResult<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> CodecResult<Value> {
        Ok(Value::Sequence(v.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> CodecResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> CodecResult<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> CodecResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> CodecResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> CodecResult<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> CodecResult<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> CodecResult<Value> {
        let mut map = Mapping::with_capacity(1);
        map.insert(variant, to_value(value)?);
        Ok(Value::Mapping(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> CodecResult<SerializeVec> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> CodecResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> CodecResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> CodecResult<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> CodecResult<SerializeMap> {
        Ok(SerializeMap {
            map: Mapping::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> CodecResult<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> CodecResult<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            map: Mapping::with_capacity(len),
        })
    }
}

pub struct SerializeVec {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> CodecResult<Value> {
        Ok(Value::Sequence(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> CodecResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> CodecResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> CodecResult<Value> {
        let mut map = Mapping::with_capacity(1);
        map.insert(self.variant, Value::Sequence(self.items));
        Ok(Value::Mapping(map))
    }
}

pub struct SerializeMap {
    map: Mapping,
    next_key: Option<String>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = CodecError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> CodecResult<()> {
        self.next_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| CodecError::Serialize("map value written before its key".into()))?;
        if self.map.contains_key(&key) {
            return Err(CodecError::Serialize(format!("duplicate mapping key `{key}`")));
        }
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> CodecResult<Value> {
        Ok(Value::Mapping(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> CodecResult<()> {
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> CodecResult<Value> {
        Ok(Value::Mapping(self.map))
    }
}

pub struct SerializeStructVariant {
    variant: &'static str,
    map: Mapping,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> CodecResult<()> {
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> CodecResult<Value> {
        let mut outer = Mapping::with_capacity(1);
        outer.insert(self.variant, Value::Mapping(self.map));
        Ok(Value::Mapping(outer))
    }
}

/// Turns scalar map keys into strings.
struct MapKeySerializer;

fn key_must_be_scalar(found: &str) -> CodecError {
    CodecError::Serialize(format!("mapping keys must be strings or integers, found {found}"))
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = CodecError;

    type SerializeSeq = Impossible<String, CodecError>;
    type SerializeTuple = Impossible<String, CodecError>;
    type SerializeTupleStruct = Impossible<String, CodecError>;
    type SerializeTupleVariant = Impossible<String, CodecError>;
    type SerializeMap = Impossible<String, CodecError>;
    type SerializeStruct = Impossible<String, CodecError>;
    type SerializeStructVariant = Impossible<String, CodecError>;

    fn serialize_bool(self, v: bool) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_i128(self, v: i128) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_u128(self, v: u128) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> CodecResult<String> {
        Err(key_must_be_scalar("a float"))
    }

    fn serialize_f64(self, _v: f64) -> CodecResult<String> {
        Err(key_must_be_scalar("a float"))
    }

    fn serialize_char(self, v: char) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> CodecResult<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> CodecResult<String> {
        Err(key_must_be_scalar("bytes"))
    }

    fn serialize_none(self) -> CodecResult<String> {
        Err(key_must_be_scalar("null"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> CodecResult<String> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> CodecResult<String> {
        Err(key_must_be_scalar("null"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> CodecResult<String> {
        Err(key_must_be_scalar("a unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> CodecResult<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> CodecResult<String> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> CodecResult<String> {
        Err(key_must_be_scalar("an enum variant with data"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> CodecResult<Self::SerializeSeq> {
        Err(key_must_be_scalar("a sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> CodecResult<Self::SerializeTuple> {
        Err(key_must_be_scalar("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeTupleStruct> {
        Err(key_must_be_scalar("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeTupleVariant> {
        Err(key_must_be_scalar("an enum variant with data"))
    }

    fn serialize_map(self, _len: Option<usize>) -> CodecResult<Self::SerializeMap> {
        Err(key_must_be_scalar("a mapping"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeStruct> {
        Err(key_must_be_scalar("a struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeStructVariant> {
        Err(key_must_be_scalar("an enum variant with data"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Record {
        name: String,
        count: u32,
        tags: Vec<&'static str>,
        parent: Option<u64>,
    }

    #[derive(Serialize)]
    enum Shape {
        Point,
        Circle(f64),
        Rect { w: u32, h: u32 },
        Pair(i8, i8),
    }

    #[test]
    fn struct_fields_keep_declaration_order() {
        let v = to_value(&Record {
            name: "x".into(),
            count: 3,
            tags: vec!["a", "b"],
            parent: None,
        })
        .unwrap();
        let keys: Vec<_> = v.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "count", "tags", "parent"]);
        assert!(v["parent"].is_null());
        assert_eq!(v["tags"][1].as_str(), Some("b"));
    }

    #[test]
    fn enums_are_externally_tagged() {
        assert_eq!(to_value(&Shape::Point).unwrap(), Value::from("Point"));
        assert_eq!(to_value(&Shape::Circle(1.5)).unwrap()["Circle"].as_f64(), Some(1.5));
        let rect = to_value(&Shape::Rect { w: 2, h: 3 }).unwrap();
        assert_eq!(rect["Rect"]["h"].as_u64(), Some(3));
        let pair = to_value(&Shape::Pair(-1, 1)).unwrap();
        assert_eq!(pair["Pair"][0].as_i64(), Some(-1));
    }

    #[test]
    fn integer_keys_become_strings() {
        let mut map = BTreeMap::new();
        map.insert(2u8, "two");
        map.insert(10u8, "ten");
        let v = to_value(&map).unwrap();
        assert_eq!(v["2"].as_str(), Some("two"));
        assert_eq!(v["10"].as_str(), Some("ten"));
    }

    #[test]
    fn composite_keys_are_rejected() {
        let mut map = BTreeMap::new();
        map.insert(vec![1, 2], "x");
        let err = to_value(&map).unwrap_err();
        assert!(err.to_string().contains("a sequence"), "{err}");
    }

    #[test]
    fn large_unsigned_survives() {
        assert_eq!(to_value(&u64::MAX).unwrap().as_u64(), Some(u64::MAX));
        assert!(to_value(&u128::MAX).is_err());
    }
}
