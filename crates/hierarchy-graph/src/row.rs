use hierarchy_core::{HierarchyNode, Result, StoreError};
use std::collections::HashMap;

pub const CODE: &str = "code";
pub const LABEL: &str = "label";
pub const HAS_DATA: &str = "hasData";
pub const NUMBER_OF_CHILDREN: &str = "numberOfChildren";
pub const ORDER: &str = "order";
pub const CODE_LIST: &str = "code_list";

/// A single property value read from a graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Null,
    /// Lists, maps, temporal and spatial values; never expected on hierarchy nodes
    Other,
}

impl Property {
    pub fn type_name(&self) -> &'static str {
        match self {
            Property::String(_) => "string",
            Property::Bool(_) => "bool",
            Property::Integer(_) => "integer",
            Property::Float(_) => "float",
            Property::Null => "null",
            Property::Other => "unsupported",
        }
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::String(value.to_string())
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::String(value)
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Property::Bool(value)
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Property::Integer(value)
    }
}

/// Property map of one returned node.
pub type Properties = HashMap<String, Property>;

/// Decode a hierarchy node, validating presence and type of every required property.
pub fn decode_node(props: &Properties) -> Result<HierarchyNode> {
    let number_of_children = required_integer(props, NUMBER_OF_CHILDREN)?;
    let number_of_children = u64::try_from(number_of_children).map_err(|_| {
        StoreError::decode(
            NUMBER_OF_CHILDREN,
            format!("expected a non-negative count, got {}", number_of_children),
        )
    })?;

    Ok(HierarchyNode {
        code: required_string(props, CODE)?,
        label: required_string(props, LABEL)?,
        has_data: required_bool(props, HAS_DATA)?,
        number_of_children,
        order: optional_integer(props, ORDER)?,
    })
}

/// The code list a node belongs to; `None` when absent or empty.
pub fn decode_code_list(props: &Properties) -> Result<Option<String>> {
    match props.get(CODE_LIST) {
        None | Some(Property::Null) => Ok(None),
        Some(Property::String(s)) if s.is_empty() => Ok(None),
        Some(Property::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(type_mismatch(CODE_LIST, "string", other)),
    }
}

fn required<'a>(props: &'a Properties, key: &str) -> Result<&'a Property> {
    props
        .get(key)
        .ok_or_else(|| StoreError::decode(key, "missing property"))
}

fn required_string(props: &Properties, key: &str) -> Result<String> {
    match required(props, key)? {
        Property::String(s) => Ok(s.clone()),
        other => Err(type_mismatch(key, "string", other)),
    }
}

fn required_bool(props: &Properties, key: &str) -> Result<bool> {
    match required(props, key)? {
        Property::Bool(b) => Ok(*b),
        other => Err(type_mismatch(key, "bool", other)),
    }
}

fn required_integer(props: &Properties, key: &str) -> Result<i64> {
    match required(props, key)? {
        Property::Integer(i) => Ok(*i),
        other => Err(type_mismatch(key, "integer", other)),
    }
}

fn optional_integer(props: &Properties, key: &str) -> Result<Option<i64>> {
    match props.get(key) {
        None | Some(Property::Null) => Ok(None),
        Some(Property::Integer(i)) => Ok(Some(*i)),
        Some(other) => Err(type_mismatch(key, "integer", other)),
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Property) -> StoreError {
    StoreError::decode(
        key,
        format!("expected {}, found {}", expected, found.type_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Properties {
        Properties::from([
            (CODE.to_string(), Property::from("cpih1dim1G10100")),
            (LABEL.to_string(), Property::from("01.1 Food")),
            (HAS_DATA.to_string(), Property::from(true)),
            (NUMBER_OF_CHILDREN.to_string(), Property::from(3_i64)),
        ])
    }

    #[test]
    fn decodes_a_complete_row() {
        let node = decode_node(&props()).unwrap();
        assert_eq!(node.code, "cpih1dim1G10100");
        assert_eq!(node.label, "01.1 Food");
        assert!(node.has_data);
        assert_eq!(node.number_of_children, 3);
        assert_eq!(node.order, None);
    }

    #[test]
    fn missing_property_is_a_decode_error() {
        let mut p = props();
        p.remove(HAS_DATA);
        let err = decode_node(&p).unwrap_err();
        assert_eq!(err, StoreError::decode(HAS_DATA, "missing property"));
    }

    #[test]
    fn wrong_type_is_a_decode_error() {
        let mut p = props();
        p.insert(NUMBER_OF_CHILDREN.to_string(), Property::from("3"));
        match decode_node(&p).unwrap_err() {
            StoreError::Decode { property, reason } => {
                assert_eq!(property, NUMBER_OF_CHILDREN);
                assert_eq!(reason, "expected integer, found string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_child_count_is_rejected() {
        let mut p = props();
        p.insert(NUMBER_OF_CHILDREN.to_string(), Property::from(-1_i64));
        assert!(matches!(decode_node(&p), Err(StoreError::Decode { .. })));
    }

    #[test]
    fn order_is_optional() {
        let mut p = props();
        p.insert(ORDER.to_string(), Property::from(7_i64));
        assert_eq!(decode_node(&p).unwrap().order, Some(7));
        p.insert(ORDER.to_string(), Property::Null);
        assert_eq!(decode_node(&p).unwrap().order, None);
    }

    #[test]
    fn empty_code_list_reads_as_absent() {
        let mut p = props();
        assert_eq!(decode_code_list(&p).unwrap(), None);
        p.insert(CODE_LIST.to_string(), Property::from(""));
        assert_eq!(decode_code_list(&p).unwrap(), None);
        p.insert(CODE_LIST.to_string(), Property::from("clistABC"));
        assert_eq!(decode_code_list(&p).unwrap().as_deref(), Some("clistABC"));
    }
}
