//! Predicate syntax tree.
//!
//! A [`Predicate`] is an arena of [`Node`]s. Children are always pushed before
//! the nodes that reference them, so a `NodeId` only ever points backwards and
//! the tree cannot contain cycles. A node may be referenced by several parents
//! (a lambda parameter used twice is one node).

use crate::types::{Scalar, SourceType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A boolean-valued lambda: its parameters and its body.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    nodes: Vec<Node>,
    parameters: Vec<NodeId>,
    body: NodeId,
}

impl Predicate {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn parameters(&self) -> &[NodeId] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first reference that breaks the arena ordering: a child id that is
    /// not below its parent's, or a body or parameter id past the end.
    pub fn first_dangling_reference(&self) -> Option<NodeId> {
        let len = self.nodes.len();
        let outside = |id: &NodeId| id.0 >= len;
        if outside(&self.body) {
            return Some(self.body);
        }
        if let Some(id) = self.parameters.iter().find(|id| outside(*id)) {
            return Some(*id);
        }
        self.nodes.iter().enumerate().find_map(|(index, node)| {
            node.children().into_iter().find(|child| child.0 >= index)
        })
    }

    /// The first entity- or interface-typed parameter, i.e. the row being filtered.
    pub fn row_parameter(&self) -> Option<(&str, &SourceType)> {
        self.parameters.iter().find_map(|id| match self.node(*id) {
            Node::Parameter { name, ty } if ty.is_row_type() => Some((name.as_str(), ty)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
        /// Result type; the target type for a conversion.
        ty: SourceType,
    },
    Conditional {
        test: NodeId,
        if_true: NodeId,
        if_false: NodeId,
    },
    Constant(Constant),
    /// `target.member`. `via_nullable` marks the `Value` accessor of a
    /// nullable wrapper, whose field is the one named by `target`.
    Member {
        target: NodeId,
        member: String,
        via_nullable: bool,
    },
    Parameter {
        name: String,
        ty: SourceType,
    },
    /// `receiver.method(arguments)`, or a static call when `receiver` is `None`.
    MethodCall {
        method: String,
        receiver: Option<NodeId>,
        arguments: Vec<NodeId>,
    },
    /// `new List<T> { a, b, c }`
    ListInit {
        element_type: SourceType,
        elements: Vec<NodeId>,
    },
}

impl Node {
    /// Ids this node references, in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Binary { left, right, .. } => vec![*left, *right],
            Node::Unary { operand, .. } => vec![*operand],
            Node::Conditional {
                test,
                if_true,
                if_false,
            } => vec![*test, *if_true, *if_false],
            Node::Constant(_) | Node::Parameter { .. } => Vec::new(),
            Node::Member { target, .. } => vec![*target],
            Node::MethodCall {
                receiver,
                arguments,
                ..
            } => receiver.iter().chain(arguments).copied().collect(),
            Node::ListInit { elements, .. } => elements.clone(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Binary { .. } => "binary",
            Node::Unary { .. } => "unary",
            Node::Conditional { .. } => "conditional",
            Node::Constant(_) => "constant",
            Node::Member { .. } => "member access",
            Node::Parameter { .. } => "parameter",
            Node::MethodCall { .. } => "method call",
            Node::ListInit { .. } => "list initializer",
        }
    }
}

/// A literal with its declared type. `value` is `None` for a null literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub ty: SourceType,
    pub value: Option<Scalar>,
}

impl Constant {
    /// A bare `null` whose type comes from the operand it is compared with.
    pub fn is_untyped_null(&self) -> bool {
        self.ty == SourceType::Object && self.value.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    AndAlso,
    OrElse,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Convert,
    Negate,
}

/// Appends nodes to a predicate arena.
#[derive(Debug, Default)]
pub struct PredicateBuilder {
    nodes: Vec<Node>,
    parameters: Vec<NodeId>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Declares a lambda parameter.
    pub fn parameter(&mut self, name: impl Into<String>, ty: SourceType) -> NodeId {
        let id = self.push(Node::Parameter {
            name: name.into(),
            ty,
        });
        self.parameters.push(id);
        id
    }

    /// A parameter reference that is not part of the lambda signature,
    /// e.g. a captured variable.
    pub fn captured(&mut self, name: impl Into<String>, ty: SourceType) -> NodeId {
        self.push(Node::Parameter {
            name: name.into(),
            ty,
        })
    }

    pub fn constant(&mut self, value: Scalar) -> NodeId {
        let ty = SourceType::Scalar(value.kind());
        self.push(Node::Constant(Constant {
            ty,
            value: Some(value),
        }))
    }

    pub fn typed_constant(&mut self, ty: SourceType, value: Option<Scalar>) -> NodeId {
        self.push(Node::Constant(Constant { ty, value }))
    }

    pub fn member(&mut self, target: NodeId, member: impl Into<String>) -> NodeId {
        self.push(Node::Member {
            target,
            member: member.into(),
            via_nullable: false,
        })
    }

    /// `target.Value` where `target` is a nullable member access.
    pub fn nullable_value(&mut self, target: NodeId) -> NodeId {
        self.push(Node::Member {
            target,
            member: "Value".to_string(),
            via_nullable: true,
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::Binary { op, left, right })
    }

    pub fn and(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::AndAlso, left, right)
    }

    pub fn or(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::OrElse, left, right)
    }

    pub fn equal(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::Equal, left, right)
    }

    pub fn not(&mut self, operand: NodeId) -> NodeId {
        self.push(Node::Unary {
            op: UnaryOp::Not,
            operand,
            ty: SourceType::Scalar(crate::types::ScalarKind::Boolean),
        })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId, ty: SourceType) -> NodeId {
        self.push(Node::Unary { op, operand, ty })
    }

    pub fn convert(&mut self, operand: NodeId, ty: SourceType) -> NodeId {
        self.unary(UnaryOp::Convert, operand, ty)
    }

    pub fn conditional(&mut self, test: NodeId, if_true: NodeId, if_false: NodeId) -> NodeId {
        self.push(Node::Conditional {
            test,
            if_true,
            if_false,
        })
    }

    pub fn call(
        &mut self,
        method: impl Into<String>,
        receiver: Option<NodeId>,
        arguments: Vec<NodeId>,
    ) -> NodeId {
        self.push(Node::MethodCall {
            method: method.into(),
            receiver,
            arguments,
        })
    }

    /// `receiver.Contains(item)`
    pub fn contains(&mut self, receiver: NodeId, item: NodeId) -> NodeId {
        self.call("Contains", Some(receiver), vec![item])
    }

    pub fn list(&mut self, element_type: SourceType, elements: Vec<NodeId>) -> NodeId {
        self.push(Node::ListInit {
            element_type,
            elements,
        })
    }

    pub fn finish(self, body: NodeId) -> Predicate {
        Predicate {
            nodes: self.nodes,
            parameters: self.parameters,
            body,
        }
    }
}
