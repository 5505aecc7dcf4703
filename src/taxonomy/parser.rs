//! Taxonomy response parser
//!
//! The response is `{"categories": [node, ...]}` where each node is
//! `{"id", "name", "path", "children"?}` and `children` holds nodes of the
//! same shape. Nodes are decoded one at a time as the iterator is pulled.

use std::iter::FusedIterator;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::department::Department;
use crate::error::{AppError, AppResult};

const CATEGORIES_KEY: &str = "categories";

#[derive(Debug, Deserialize)]
struct CategoryNode {
    id: String,
    name: String,
    path: String,
    #[serde(default)]
    children: Option<Value>,
}

/// Validate a raw response body and return its departments in pre-order
pub fn parse_taxonomy(body: &str) -> AppResult<DepartmentIter> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::invalid_response(format!("body is not JSON: {}", e)))?;
    parse_taxonomy_value(value)
}

/// Same as [`parse_taxonomy`] for an already decoded body
pub fn parse_taxonomy_value(mut value: Value) -> AppResult<DepartmentIter> {
    let roots = match value.get_mut(CATEGORIES_KEY).map(Value::take) {
        Some(Value::Array(roots)) => roots,
        Some(_) => {
            return Err(AppError::invalid_response(format!(
                "'{}' is not an array",
                CATEGORIES_KEY
            )))
        }
        None => {
            return Err(AppError::invalid_response(format!(
                "missing '{}'",
                CATEGORIES_KEY
            )))
        }
    };

    info!("There are {} root departments", roots.len());
    Ok(DepartmentIter::new(roots))
}

struct Frame {
    nodes: std::vec::IntoIter<Value>,
    parent: Option<Arc<Department>>,
}

/// Lazy depth-first pre-order walk over taxonomy nodes.
///
/// Each node is yielded before any of its descendants and siblings keep the
/// response order. The walk uses an explicit stack of sibling lists, so tree
/// depth does not grow the call stack. After the first malformed node the
/// iterator yields that error and then ends.
pub struct DepartmentIter {
    stack: Vec<Frame>,
}

impl DepartmentIter {
    fn new(roots: Vec<Value>) -> Self {
        Self {
            stack: vec![Frame {
                nodes: roots.into_iter(),
                parent: None,
            }],
        }
    }

    fn visit(&mut self, value: Value, parent: Option<Arc<Department>>) -> AppResult<Department> {
        let node: CategoryNode = serde_json::from_value(value)
            .map_err(|e| AppError::invalid_response(format!("malformed category: {}", e)))?;

        let dept = Department::new(node.id, node.name, node.path).with_parent(parent);
        dept.validate()?;

        match node.children {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => {
                if !children.is_empty() {
                    self.stack.push(Frame {
                        nodes: children.into_iter(),
                        parent: Some(Arc::new(dept.clone())),
                    });
                }
            }
            Some(_) => {
                return Err(AppError::invalid_response(format!(
                    "children of {} is not an array",
                    dept.id
                )))
            }
        }

        Ok(dept)
    }
}

impl Iterator for DepartmentIter {
    type Item = AppResult<Department>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(value) = frame.nodes.next() else {
                self.stack.pop();
                continue;
            };
            let parent = frame.parent.clone();

            let result = self.visit(value, parent);
            if result.is_err() {
                self.stack.clear();
            }
            return Some(result);
        }
    }
}

impl FusedIterator for DepartmentIter {}
