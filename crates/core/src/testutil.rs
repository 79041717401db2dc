//! An in-memory tree backend used by the engine's own tests.

use crate::backend::{Deserializer, Serializer};
use crate::error::MapError;
use crate::scalar::{Scalar, ScalarKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Array(Vec<Node>),
    Dict(Vec<(String, Node)>),
}

enum Frame {
    Array(Vec<Node>),
    Dict(Vec<(String, Node)>, Option<String>),
}

/// Serializer building a [`Node`] tree. Scalar kinds listed in
/// `unsupported` are rejected by `supports`, which lets tests exercise
/// canonical degradation.
pub struct TreeSerializer {
    stack: Vec<Frame>,
    root: Option<Node>,
    pub unsupported: Vec<ScalarKind>,
}

impl TreeSerializer {
    pub fn new() -> TreeSerializer {
        TreeSerializer {
            stack: Vec::new(),
            root: None,
            unsupported: Vec::new(),
        }
    }

    pub fn finish(self) -> Node {
        self.root.expect("no value was written")
    }

    fn put(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(Frame::Array(items)) => items.push(node),
            Some(Frame::Dict(entries, key)) => {
                let key = key.take().expect("value written without begin_entry");
                entries.push((key, node));
            }
        }
    }
}

impl Serializer for TreeSerializer {
    fn supports(&self, kind: ScalarKind) -> bool {
        !self.unsupported.contains(&kind)
    }

    fn write_scalar(&mut self, value: Scalar) -> Result<(), MapError> {
        self.put(Node::Scalar(value));
        Ok(())
    }

    fn begin_dictionary(&mut self) -> Result<(), MapError> {
        self.stack.push(Frame::Dict(Vec::new(), None));
        Ok(())
    }

    fn begin_entry(&mut self, key: &str) -> Result<(), MapError> {
        match self.stack.last_mut() {
            Some(Frame::Dict(_, pending)) => {
                *pending = Some(key.to_owned());
                Ok(())
            }
            _ => panic!("begin_entry outside a dictionary"),
        }
    }

    fn end_dictionary(&mut self) -> Result<(), MapError> {
        match self.stack.pop() {
            Some(Frame::Dict(entries, _)) => {
                self.put(Node::Dict(entries));
                Ok(())
            }
            _ => panic!("end_dictionary without begin_dictionary"),
        }
    }

    fn begin_array(&mut self, _len: Option<usize>) -> Result<(), MapError> {
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), MapError> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => {
                self.put(Node::Array(items));
                Ok(())
            }
            _ => panic!("end_array without begin_array"),
        }
    }
}

pub struct TreeDeserializer<'a> {
    pub node: &'a Node,
}

impl<'a> TreeDeserializer<'a> {
    pub fn new(node: &'a Node) -> TreeDeserializer<'a> {
        TreeDeserializer { node }
    }
}

impl Deserializer for TreeDeserializer<'_> {
    fn supports(&self, _kind: ScalarKind) -> bool {
        true
    }

    fn read_scalar(&mut self) -> Result<Scalar, MapError> {
        match self.node {
            Node::Scalar(value) => Ok(value.clone()),
            Node::Array(_) => Err(MapError::TypeMismatch {
                expected: "scalar",
                found: "array".to_owned(),
            }),
            Node::Dict(_) => Err(MapError::TypeMismatch {
                expected: "scalar",
                found: "dictionary".to_owned(),
            }),
        }
    }

    fn try_read_null(&mut self) -> Result<bool, MapError> {
        Ok(matches!(self.node, Node::Scalar(Scalar::Null)))
    }

    fn read_dictionary(
        &mut self,
        entry: &mut dyn FnMut(&mut dyn Deserializer, &str) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        match self.node {
            Node::Dict(entries) => {
                for (key, value) in entries {
                    let mut child = TreeDeserializer::new(value);
                    entry(&mut child, key)?;
                }
                Ok(())
            }
            _ => Err(MapError::TypeMismatch {
                expected: "dictionary",
                found: "scalar or array".to_owned(),
            }),
        }
    }

    fn read_array(
        &mut self,
        size_hint: &mut dyn FnMut(usize),
        element: &mut dyn FnMut(&mut dyn Deserializer) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        match self.node {
            Node::Array(items) => {
                size_hint(items.len());
                for item in items {
                    let mut child = TreeDeserializer::new(item);
                    element(&mut child)?;
                }
                Ok(())
            }
            _ => Err(MapError::TypeMismatch {
                expected: "array",
                found: "scalar or dictionary".to_owned(),
            }),
        }
    }

    fn skip_value(&mut self) -> Result<(), MapError> {
        Ok(())
    }
}

/// Maps `value` into a tree and returns the root.
pub fn to_tree<T: crate::Mappable>(value: &T, policies: &crate::Policies) -> Node {
    let mut ser = TreeSerializer::new();
    crate::map_value(value, &mut ser, policies).expect("map failed");
    ser.finish()
}

/// Reads a `T` back out of a tree.
pub fn from_tree<T: crate::Mappable>(
    node: &Node,
    policies: &crate::Policies,
) -> Result<T, MapError> {
    let mut de = TreeDeserializer::new(node);
    crate::unmap_value(&mut de, policies)
}
