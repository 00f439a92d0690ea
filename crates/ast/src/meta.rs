// Copyright (C) 2025 the pysrc authors. This program is free software: you
// can redistribute it and/or modify it under the terms of the GNU General
// Public License as published by the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Parent/field/index annotations over a tree, for consumers that need to
//! navigate structurally: the graph-view renderer wants every node labelled
//! with the field of its parent it hangs off, and its position when that
//! field is a list. The unparser itself never reads any of this.

use crate::ast::{Node, Signature, Syntax};

/// One child of a node, labelled with the parent field that holds it and the
/// position within that field when it is an ordered list.
#[derive(Debug, Clone, Copy)]
pub struct ChildEdge<'a> {
    pub field: &'static str,
    pub index: Option<usize>,
    pub node: &'a Node,
}

fn one<'a>(edges: &mut Vec<ChildEdge<'a>>, field: &'static str, node: &'a Node) {
    edges.push(ChildEdge {
        field,
        index: None,
        node,
    });
}

fn opt<'a>(edges: &mut Vec<ChildEdge<'a>>, field: &'static str, node: &'a Option<Box<Node>>) {
    if let Some(node) = node {
        one(edges, field, node);
    }
}

fn many<'a>(edges: &mut Vec<ChildEdge<'a>>, field: &'static str, nodes: &'a [Node]) {
    for (index, node) in nodes.iter().enumerate() {
        edges.push(ChildEdge {
            field,
            index: Some(index),
            node,
        });
    }
}

fn signature<'a>(edges: &mut Vec<ChildEdge<'a>>, sig: &'a Signature) {
    many(edges, "args", &sig.params);
    many(edges, "defaults", &sig.defaults);
}

impl Node {
    /// Enumerates this node's children with the field each one is attached
    /// under. Scalar fields (names, operators, literal payloads) don't
    /// appear; only child nodes do.
    pub fn children(&self) -> Vec<ChildEdge<'_>> {
        let mut edges = Vec::new();
        match &self.syntax {
            Syntax::Module { body } => many(&mut edges, "body", body),
            Syntax::FunctionDef {
                args,
                body,
                decorators,
                returns,
                ..
            }
            | Syntax::AsyncFunctionDef {
                args,
                body,
                decorators,
                returns,
                ..
            } => {
                many(&mut edges, "decorators", decorators);
                signature(&mut edges, args);
                opt(&mut edges, "returns", returns);
                many(&mut edges, "body", body);
            }
            Syntax::ClassDef {
                bases,
                keywords,
                body,
                decorators,
                ..
            } => {
                many(&mut edges, "decorators", decorators);
                many(&mut edges, "bases", bases);
                many(&mut edges, "keywords", keywords);
                many(&mut edges, "body", body);
            }
            Syntax::Return { value } | Syntax::Yield { value } | Syntax::Await { value } => {
                opt(&mut edges, "value", value)
            }
            Syntax::Delete { targets } => many(&mut edges, "targets", targets),
            Syntax::Assign { targets, value } => {
                many(&mut edges, "targets", targets);
                one(&mut edges, "value", value);
            }
            Syntax::AugAssign { target, value, .. } => {
                one(&mut edges, "target", target);
                one(&mut edges, "value", value);
            }
            Syntax::Print { dest, values, .. } => {
                opt(&mut edges, "dest", dest);
                many(&mut edges, "values", values);
            }
            Syntax::For {
                target,
                iter,
                body,
                orelse,
            }
            | Syntax::AsyncFor {
                target,
                iter,
                body,
                orelse,
            } => {
                one(&mut edges, "target", target);
                one(&mut edges, "iter", iter);
                many(&mut edges, "body", body);
                many(&mut edges, "orelse", orelse);
            }
            Syntax::While { test, body, orelse } | Syntax::If { test, body, orelse } => {
                one(&mut edges, "test", test);
                many(&mut edges, "body", body);
                many(&mut edges, "orelse", orelse);
            }
            Syntax::With { items, body } => {
                many(&mut edges, "items", items);
                many(&mut edges, "body", body);
            }
            Syntax::TryExcept { body, handlers } => {
                many(&mut edges, "body", body);
                many(&mut edges, "handlers", handlers);
            }
            Syntax::TryFinally { body, finalbody } => {
                many(&mut edges, "body", body);
                many(&mut edges, "finalbody", finalbody);
            }
            Syntax::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                many(&mut edges, "body", body);
                many(&mut edges, "handlers", handlers);
                many(&mut edges, "orelse", orelse);
                many(&mut edges, "finalbody", finalbody);
            }
            Syntax::Assert { test, msg } => {
                one(&mut edges, "test", test);
                opt(&mut edges, "msg", msg);
            }
            Syntax::Import { names } | Syntax::ImportFrom { names, .. } => {
                many(&mut edges, "names", names)
            }
            Syntax::Expr { value } => one(&mut edges, "value", value),
            Syntax::Raise { exc, cause } => {
                opt(&mut edges, "exc", exc);
                opt(&mut edges, "cause", cause);
            }
            Syntax::BoolOp { values, .. } => many(&mut edges, "values", values),
            Syntax::BinOp { left, right, .. } => {
                one(&mut edges, "left", left);
                one(&mut edges, "right", right);
            }
            Syntax::UnaryOp { operand, .. } => one(&mut edges, "operand", operand),
            Syntax::Lambda { args, body } => {
                signature(&mut edges, args);
                one(&mut edges, "body", body);
            }
            Syntax::IfExp { test, body, orelse } => {
                one(&mut edges, "test", test);
                one(&mut edges, "body", body);
                one(&mut edges, "orelse", orelse);
            }
            Syntax::Dict { keys, values } => {
                for (index, key) in keys.iter().enumerate() {
                    if let Some(key) = key {
                        edges.push(ChildEdge {
                            field: "keys",
                            index: Some(index),
                            node: key,
                        });
                    }
                }
                many(&mut edges, "values", values);
            }
            Syntax::Set { elts } | Syntax::List { elts } | Syntax::Tuple { elts } => {
                many(&mut edges, "elts", elts)
            }
            Syntax::ListComp { elt, generators }
            | Syntax::SetComp { elt, generators }
            | Syntax::GeneratorExp { elt, generators } => {
                one(&mut edges, "elt", elt);
                many(&mut edges, "generators", generators);
            }
            Syntax::DictComp {
                key,
                value,
                generators,
            } => {
                one(&mut edges, "key", key);
                one(&mut edges, "value", value);
                many(&mut edges, "generators", generators);
            }
            Syntax::YieldFrom { value } => one(&mut edges, "value", value),
            Syntax::Compare {
                left, comparators, ..
            } => {
                one(&mut edges, "left", left);
                many(&mut edges, "comparators", comparators);
            }
            Syntax::Call {
                func,
                args,
                keywords,
                starargs,
                kwargs,
            } => {
                one(&mut edges, "func", func);
                many(&mut edges, "args", args);
                many(&mut edges, "keywords", keywords);
                opt(&mut edges, "starargs", starargs);
                opt(&mut edges, "kwargs", kwargs);
            }
            Syntax::Repr { value }
            | Syntax::Attribute { value, .. }
            | Syntax::Starred { value }
            | Syntax::Index { value } => one(&mut edges, "value", value),
            Syntax::Subscript { value, slice } => {
                one(&mut edges, "value", value);
                one(&mut edges, "slice", slice);
            }
            Syntax::Slice { lower, upper, step } => {
                opt(&mut edges, "lower", lower);
                opt(&mut edges, "upper", upper);
                opt(&mut edges, "step", step);
            }
            Syntax::ExtSlice { dims } => many(&mut edges, "dims", dims),
            Syntax::JoinedStr { values } => many(&mut edges, "values", values),
            Syntax::FormattedValue { value } => opt(&mut edges, "value", value),
            Syntax::Param { annotation, .. } => opt(&mut edges, "annotation", annotation),
            Syntax::Keyword { value, .. } => one(&mut edges, "value", value),
            Syntax::Comprehension { target, iter, ifs } => {
                one(&mut edges, "target", target);
                one(&mut edges, "iter", iter);
                many(&mut edges, "ifs", ifs);
            }
            Syntax::ExceptHandler { typ, name, body } => {
                opt(&mut edges, "typ", typ);
                opt(&mut edges, "name", name);
                many(&mut edges, "body", body);
            }
            Syntax::WithItem {
                context_expr,
                optional_vars,
            } => {
                one(&mut edges, "context_expr", context_expr);
                opt(&mut edges, "optional_vars", optional_vars);
            }
            Syntax::Global { .. }
            | Syntax::Nonlocal { .. }
            | Syntax::Pass
            | Syntax::Break
            | Syntax::Continue
            | Syntax::Num { .. }
            | Syntax::Str { .. }
            | Syntax::Bytes { .. }
            | Syntax::NameConstant { .. }
            | Syntax::Ellipsis
            | Syntax::Name { .. }
            | Syntax::Alias { .. } => {}
        }
        edges
    }
}

/// One row of the annotation table produced by [`annotate`]: a node, the
/// table position of its parent (absent for the root), and the parent field
/// and list index it is attached under.
#[derive(Debug, Clone, Copy)]
pub struct NodeAnnotation<'a> {
    pub node: &'a Node,
    pub parent: Option<usize>,
    pub parent_field: Option<&'static str>,
    pub parent_index: Option<usize>,
}

/// Walks the tree in preorder and returns one annotation row per node, root
/// first. Row positions are stable identifiers for the duration of the
/// borrow, so edges can be expressed as table indices.
pub fn annotate(root: &Node) -> Vec<NodeAnnotation<'_>> {
    let mut table = vec![NodeAnnotation {
        node: root,
        parent: None,
        parent_field: None,
        parent_index: None,
    }];
    walk(root, 0, &mut table);
    table
}

fn walk<'a>(node: &'a Node, position: usize, table: &mut Vec<NodeAnnotation<'a>>) {
    for edge in node.children() {
        let child_position = table.len();
        table.push(NodeAnnotation {
            node: edge.node,
            parent: Some(position),
            parent_field: Some(edge.field),
            parent_index: edge.index,
        });
        walk(edge.node, child_position, table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, Number};
    use pretty_assertions::assert_eq;

    fn name(id: &str) -> Node {
        Node::new(Syntax::Name { id: id.into() })
    }

    #[test]
    fn annotates_parent_field_and_index() {
        let tree = Node::new(Syntax::Assign {
            targets: vec![name("a"), name("b")],
            value: Box::new(Node::new(Syntax::Num {
                value: Number::Int(1),
            })),
        });
        let table = annotate(&tree);

        assert_eq!(table.len(), 4);
        assert_eq!(table[0].parent, None);
        assert_eq!(table[0].node.kind(), NodeKind::Assign);

        assert_eq!(table[1].parent, Some(0));
        assert_eq!(table[1].parent_field, Some("targets"));
        assert_eq!(table[1].parent_index, Some(0));

        assert_eq!(table[2].parent_field, Some("targets"));
        assert_eq!(table[2].parent_index, Some(1));

        assert_eq!(table[3].parent_field, Some("value"));
        assert_eq!(table[3].parent_index, None);
        assert_eq!(table[3].node.kind(), NodeKind::Num);
    }

    #[test]
    fn list_positions_follow_preorder() {
        let tree = Node::new(Syntax::If {
            test: Box::new(name("cond")),
            body: vec![Node::new(Syntax::Pass)],
            orelse: vec![Node::new(Syntax::Expr {
                value: Box::new(name("x")),
            })],
        });
        let table = annotate(&tree);

        let fields: Vec<_> = table.iter().skip(1).map(|a| a.parent_field).collect();
        assert_eq!(
            fields,
            vec![Some("test"), Some("body"), Some("orelse"), Some("value")]
        );
        // The nested expression hangs off the orelse statement, not the root.
        assert_eq!(table[4].parent, Some(3));
    }

    #[test]
    fn signature_children_are_labelled_args_and_defaults() {
        let tree = Node::new(Syntax::Lambda {
            args: Signature {
                params: vec![Node::new(Syntax::Param {
                    name: "x".into(),
                    annotation: None,
                })],
                defaults: vec![Node::new(Syntax::Num {
                    value: Number::Int(0),
                })],
                vararg: None,
                kwarg: None,
            },
            body: Box::new(name("x")),
        });
        let edges = tree.children();
        let labels: Vec<_> = edges.iter().map(|e| (e.field, e.index)).collect();
        assert_eq!(
            labels,
            vec![("args", Some(0)), ("defaults", Some(0)), ("body", None)]
        );
    }
}
