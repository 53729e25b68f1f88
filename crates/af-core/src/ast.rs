//! Method-body syntax tree.
//!
//! Bodies are small statement trees built by the synthesizer and executed by
//! `af-runtime`. Every expression carries an optional `generated_by` marker:
//! `Some(pos)` means the node was produced by a synthesis pass triggered at
//! `pos`. Downstream passes use the marker to tell engine output from user code.

use serde::{Deserialize, Serialize};

use crate::types::{SourcePos, TypeRef};

/// Literal constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Char(char),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    /// Reference identity for objects, value equality for primitives.
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<SourcePos>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Literal(Literal),
    /// Read of a local variable.
    Local(String),
    This,
    /// A type used as a qualifier, as in `Owner.field`.
    TypeName(String),
    FieldAccess {
        target: Box<Expr>,
        name: String,
    },
    /// Method call. `receiver: None` calls a method of the enclosing instance.
    Call {
        #[serde(default)]
        receiver: Option<Box<Expr>>,
        method: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    /// Assignment to a local variable; evaluates to the assigned value.
    Assign {
        target: String,
        value: Box<Expr>,
    },
    New {
        ty: TypeRef,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Parens(Box<Expr>),
}

impl Expr {
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            generated_by: None,
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self::new(ExprKind::Literal(Literal::Null))
    }

    #[must_use]
    pub fn literal(literal: Literal) -> Self {
        Self::new(ExprKind::Literal(literal))
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Local(name.into()))
    }

    /// `this.<name>`, always a direct field read.
    pub fn this_field(name: impl Into<String>) -> Self {
        Self::new(ExprKind::FieldAccess {
            target: Box::new(Self::new(ExprKind::This)),
            name: name.into(),
        })
    }

    /// `<owner>.<name>`, a direct read of a static field.
    pub fn static_field(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ExprKind::FieldAccess {
            target: Box::new(Self::new(ExprKind::TypeName(owner.into()))),
            name: name.into(),
        })
    }

    /// Direct read of `field` in the accessor of a static or instance field.
    pub fn field_read(owner: &str, field: &str, is_static: bool) -> Self {
        if is_static {
            Self::static_field(owner, field)
        } else {
            Self::this_field(field)
        }
    }

    pub fn call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            receiver: Some(Box::new(receiver)),
            method: method.into(),
            args,
        })
    }

    /// Unqualified call on the enclosing instance, e.g. `compute()`.
    pub fn invoke(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            receiver: None,
            method: method.into(),
            args,
        })
    }

    #[must_use]
    pub fn equals(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op: BinOp::Eq,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    #[must_use]
    pub fn conditional(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::new(ExprKind::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    #[must_use]
    pub fn cast(ty: TypeRef, expr: Expr) -> Self {
        Self::new(ExprKind::Cast {
            ty,
            expr: Box::new(expr),
        })
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Self::new(ExprKind::Assign {
            target: target.into(),
            value: Box::new(value),
        })
    }

    #[must_use]
    pub fn new_instance(ty: TypeRef, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::New { ty, args })
    }

    #[must_use]
    pub fn parens(inner: Expr) -> Self {
        Self::new(ExprKind::Parens(Box::new(inner)))
    }

    /// Set (or clear, with `None`) the provenance marker on this node and every descendant.
    pub fn mark_generated(&mut self, source: Option<SourcePos>) {
        self.generated_by = source;
        self.for_each_child_mut(|child| child.mark_generated(source));
    }

    /// True if this node or any descendant carries a provenance marker.
    #[must_use]
    pub fn any_marked(&self) -> bool {
        if self.generated_by.is_some() {
            return true;
        }
        let mut found = false;
        self.for_each_child(|child| found = found || child.any_marked());
        found
    }

    /// True if every node in this subtree carries a provenance marker.
    #[must_use]
    pub fn all_marked(&self) -> bool {
        if self.generated_by.is_none() {
            return false;
        }
        let mut all = true;
        self.for_each_child(|child| all = all && child.all_marked());
        all
    }

    /// Name of the field if this is `this.<name>` or `<Type>.<name>`.
    #[must_use]
    pub fn as_field_read(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::FieldAccess { target, name }
                if matches!(target.kind, ExprKind::This | ExprKind::TypeName(_)) =>
            {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    fn for_each_child(&self, mut f: impl FnMut(&Expr)) {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Local(_) | ExprKind::This | ExprKind::TypeName(_) => {}
            ExprKind::FieldAccess { target, .. } => f(&**target),
            ExprKind::Call { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    f(&**receiver);
                }
                args.iter().for_each(f);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                f(&**lhs);
                f(&**rhs);
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                f(&**cond);
                f(&**then);
                f(&**otherwise);
            }
            ExprKind::Cast { expr, .. } | ExprKind::Parens(expr) => f(&**expr),
            ExprKind::Assign { value, .. } => f(&**value),
            ExprKind::New { args, .. } => args.iter().for_each(f),
        }
    }

    fn for_each_child_mut(&mut self, mut f: impl FnMut(&mut Expr)) {
        match &mut self.kind {
            ExprKind::Literal(_) | ExprKind::Local(_) | ExprKind::This | ExprKind::TypeName(_) => {}
            ExprKind::FieldAccess { target, .. } => f(&mut **target),
            ExprKind::Call { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    f(&mut **receiver);
                }
                args.iter_mut().for_each(f);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                f(&mut **lhs);
                f(&mut **rhs);
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                f(&mut **cond);
                f(&mut **then);
                f(&mut **otherwise);
            }
            ExprKind::Cast { expr, .. } | ExprKind::Parens(expr) => f(&mut **expr),
            ExprKind::Assign { value, .. } => f(&mut **value),
            ExprKind::New { args, .. } => args.iter_mut().for_each(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Local {
        name: String,
        ty: TypeRef,
        #[serde(default)]
        is_final: bool,
        #[serde(default)]
        init: Option<Expr>,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then: Block,
        #[serde(default)]
        otherwise: Option<Block>,
    },
    /// Runs `body` while holding the monitor of the object `lock` evaluates to.
    Synchronized {
        lock: Expr,
        body: Block,
    },
    Return(Option<Expr>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    #[must_use]
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    /// Set or clear the provenance marker on every expression in the block.
    pub fn mark_generated(&mut self, source: Option<SourcePos>) {
        self.for_each_expr_mut(&mut |expr| expr.mark_generated(source));
    }

    /// Visit every top-level expression of every statement, depth first.
    pub fn for_each_expr(&self, f: &mut impl FnMut(&Expr)) {
        for stmt in &self.stmts {
            match stmt {
                Stmt::Local { init, .. } => {
                    if let Some(init) = init {
                        f(init);
                    }
                }
                Stmt::Expr(expr) => f(expr),
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    f(cond);
                    then.for_each_expr(f);
                    if let Some(otherwise) = otherwise {
                        otherwise.for_each_expr(f);
                    }
                }
                Stmt::Synchronized { lock, body } => {
                    f(lock);
                    body.for_each_expr(f);
                }
                Stmt::Return(expr) => {
                    if let Some(expr) = expr {
                        f(expr);
                    }
                }
            }
        }
    }

    fn for_each_expr_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        for stmt in &mut self.stmts {
            match stmt {
                Stmt::Local { init, .. } => {
                    if let Some(init) = init {
                        f(init);
                    }
                }
                Stmt::Expr(expr) => f(expr),
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    f(cond);
                    then.for_each_expr_mut(f);
                    if let Some(otherwise) = otherwise {
                        otherwise.for_each_expr_mut(f);
                    }
                }
                Stmt::Synchronized { lock, body } => {
                    f(lock);
                    body.for_each_expr_mut(f);
                }
                Stmt::Return(expr) => {
                    if let Some(expr) = expr {
                        f(expr);
                    }
                }
            }
        }
    }

    /// Field guarded by the first `synchronized` block on a field, if any.
    #[must_use]
    pub fn synchronized_field(&self) -> Option<&str> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Synchronized { lock, .. } => lock.as_field_read(),
            Stmt::If {
                then, otherwise, ..
            } => then
                .synchronized_field()
                .or_else(|| otherwise.as_ref().and_then(Block::synchronized_field)),
            _ => None,
        })
    }

    /// Initializer of the first local named `name`, searching nested blocks.
    #[must_use]
    pub fn local_init(&self, name: &str) -> Option<&Expr> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Local {
                name: local,
                init: Some(init),
                ..
            } if local == name => Some(init),
            Stmt::If {
                then, otherwise, ..
            } => then
                .local_init(name)
                .or_else(|| otherwise.as_ref().and_then(|b| b.local_init(name))),
            Stmt::Synchronized { body, .. } => body.local_init(name),
            _ => None,
        })
    }

    /// Mutable access to the initializer of the first local named `name`.
    pub fn local_init_mut(&mut self, name: &str) -> Option<&mut Expr> {
        self.stmts.iter_mut().find_map(|stmt| match stmt {
            Stmt::Local {
                name: local,
                init: Some(init),
                ..
            } if local == name => Some(init),
            Stmt::If {
                then, otherwise, ..
            } => match then.local_init_mut(name) {
                Some(init) => Some(init),
                None => otherwise.as_mut().and_then(|b| b.local_init_mut(name)),
            },
            Stmt::Synchronized { body, .. } => body.local_init_mut(name),
            _ => None,
        })
    }

    /// Name of the first direct field read in the block.
    #[must_use]
    pub fn first_field_read(&self) -> Option<String> {
        let mut found = None;
        self.for_each_expr(&mut |expr| {
            if found.is_none() {
                found = first_field_in(expr);
            }
        });
        found
    }
}

fn first_field_in(expr: &Expr) -> Option<String> {
    if let Some(name) = expr.as_field_read() {
        return Some(name.to_string());
    }
    let mut found = None;
    expr.for_each_child(|child| {
        if found.is_none() {
            found = first_field_in(child);
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_generated_recursive() {
        let mut expr = Expr::conditional(
            Expr::equals(Expr::local("a"), Expr::null()),
            Expr::this_field("f"),
            Expr::local("a"),
        );
        assert!(!expr.any_marked());

        expr.mark_generated(Some(SourcePos::new(3, 1)));
        assert!(expr.all_marked());

        expr.mark_generated(None);
        assert!(!expr.any_marked());
    }

    #[test]
    fn test_block_queries() {
        let block = Block::new(vec![
            Stmt::Local {
                name: "value".to_string(),
                ty: TypeRef::object(),
                is_final: false,
                init: Some(Expr::call(Expr::this_field("cache"), "get", vec![])),
            },
            Stmt::If {
                cond: Expr::equals(Expr::local("value"), Expr::null()),
                then: Block::new(vec![Stmt::Synchronized {
                    lock: Expr::this_field("cache"),
                    body: Block::new(vec![Stmt::Local {
                        name: "actualValue".to_string(),
                        ty: TypeRef::named("String"),
                        is_final: true,
                        init: Some(Expr::invoke("load", vec![])),
                    }]),
                }]),
                otherwise: None,
            },
        ]);

        assert_eq!(block.synchronized_field(), Some("cache"));
        assert_eq!(block.first_field_read().as_deref(), Some("cache"));
        assert_eq!(
            block.local_init("actualValue"),
            Some(&Expr::invoke("load", vec![]))
        );
        assert!(block.local_init("missing").is_none());
    }

    #[test]
    fn test_static_field_reads() {
        let read = Expr::field_read("Counter", "total", true);
        assert_eq!(read, Expr::static_field("Counter", "total"));
        assert_eq!(read.as_field_read(), Some("total"));
        assert_eq!(Expr::field_read("Counter", "total", false), Expr::this_field("total"));

        let block = Block::new(vec![Stmt::Synchronized {
            lock: Expr::static_field("Counter", "total"),
            body: Block::default(),
        }]);
        assert_eq!(block.synchronized_field(), Some("total"));
        assert_eq!(block.first_field_read().as_deref(), Some("total"));

        let call = Expr::call(Expr::local("x"), "total", vec![]);
        assert_eq!(call.as_field_read(), None);
    }

    #[test]
    fn test_expr_serde_shape() {
        let expr: Expr = serde_json::from_str(
            r#"{"kind": {"call": {"method": "compute", "args": []}}}"#,
        )
        .unwrap();
        assert_eq!(expr, Expr::invoke("compute", vec![]));
    }
}
