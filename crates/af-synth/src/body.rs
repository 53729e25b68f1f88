//! Accessor bodies.
//!
//! A simple accessor reads the field directly. A lazy accessor evaluates the
//! field's original initializer at most once, caching the result in an atomic
//! holder that replaces the field's storage:
//!
//! ```text
//! java.lang.Object value = this.f.get();
//! if (value == null) {
//!     synchronized (this.f) {
//!         value = this.f.get();
//!         if (value == null) {
//!             final T actualValue = <initializer>;
//!             value = actualValue == null ? this.f : actualValue;
//!             this.f.set(value);
//!         }
//!     }
//! }
//! return (T) (value == this.f ? null : value);
//! ```
//!
//! Static fields are read as `Owner.f` instead of `this.f`.
//!
//! A reference-typed initializer that yields `null` is cached as the holder
//! itself, so `null` in the slot always means "not computed yet". Primitive
//! values are boxed on the way in and unboxed by the cast on the way out.

use af_core::markers::{LAZY_ACTUAL_LOCAL, LAZY_VALUE_LOCAL};
use af_core::{Block, Expr, FieldDecl, Modifiers, Stmt, TypeRef};

use crate::error::SynthError;

/// How the accessor body is built. Chosen once, after lazy preconditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorMode {
    Simple,
    Lazy,
}

/// Validate the lazy preconditions and pick the body mode.
///
/// Runs before any tree mutation, so a rejected field is left exactly as declared.
pub fn select_mode(field: &FieldDecl, lazy: bool) -> Result<AccessorMode, SynthError> {
    if !lazy {
        return Ok(AccessorMode::Simple);
    }
    if !field.modifiers.contains(Modifiers::PRIVATE) || !field.modifiers.contains(Modifiers::FINAL) {
        return Err(SynthError::LazyRequiresPrivateFinal);
    }
    if field.init.is_none() {
        return Err(SynthError::LazyRequiresInitializer);
    }
    Ok(AccessorMode::Lazy)
}

/// The field an accessor reads and the structure declaring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub is_static: bool,
}

impl<'a> FieldRef<'a> {
    #[must_use]
    pub fn new(owner: &'a str, field: &'a FieldDecl) -> Self {
        Self {
            owner,
            name: &field.name,
            is_static: field.modifiers.is_static(),
        }
    }

    /// `this.<name>`, or `<owner>.<name>` for a static field.
    #[must_use]
    pub fn read(&self) -> Expr {
        Expr::field_read(self.owner, self.name, self.is_static)
    }
}

/// `return this.<field>;`
#[must_use]
pub fn simple_body(field: FieldRef<'_>) -> Block {
    Block::new(vec![Stmt::Return(Some(field.read()))])
}

/// Double-checked-locking body for a lazy accessor of `field` declared as `raw_type`.
///
/// `initializer` is moved into the body as the value of the `actualValue` local.
#[must_use]
pub fn lazy_body(field: FieldRef<'_>, raw_type: &TypeRef, initializer: Expr) -> Block {
    let holder = || field.read();
    let value = || Expr::local(LAZY_VALUE_LOCAL);
    let actual = || Expr::local(LAZY_ACTUAL_LOCAL);
    let load = || Expr::call(holder(), "get", vec![]);
    let is_empty = || Expr::equals(value(), Expr::null());

    let primitive = raw_type.as_primitive().is_some();

    let encode = if primitive {
        actual()
    } else {
        Expr::conditional(Expr::equals(actual(), Expr::null()), holder(), actual())
    };

    let compute = Block::new(vec![
        Stmt::Local {
            name: LAZY_ACTUAL_LOCAL.to_string(),
            ty: raw_type.clone(),
            is_final: true,
            init: Some(initializer),
        },
        Stmt::Expr(Expr::assign(LAZY_VALUE_LOCAL, encode)),
        Stmt::Expr(Expr::call(holder(), "set", vec![value()])),
    ]);

    let locked = Block::new(vec![
        Stmt::Expr(Expr::assign(LAZY_VALUE_LOCAL, load())),
        Stmt::If {
            cond: is_empty(),
            then: compute,
            otherwise: None,
        },
    ]);

    let decode = if primitive {
        Expr::cast(raw_type.boxed(), value())
    } else {
        Expr::cast(
            raw_type.clone(),
            Expr::parens(Expr::conditional(Expr::equals(value(), holder()), Expr::null(), value())),
        )
    };

    Block::new(vec![
        Stmt::Local {
            name: LAZY_VALUE_LOCAL.to_string(),
            ty: TypeRef::object(),
            is_final: false,
            init: Some(load()),
        },
        Stmt::If {
            cond: is_empty(),
            then: Block::new(vec![Stmt::Synchronized {
                lock: holder(),
                body: locked,
            }]),
            otherwise: None,
        },
        Stmt::Return(Some(decode)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::{ExprKind, PrimitiveKind};

    fn lazy_field(modifiers: Modifiers, init: Option<Expr>) -> FieldDecl {
        let mut field = FieldDecl::new("x", TypeRef::Primitive(PrimitiveKind::Int), modifiers);
        field.init = init;
        field
    }

    #[test]
    fn test_select_mode() {
        let compute = Some(Expr::invoke("compute", vec![]));
        let private_final = Modifiers::PRIVATE | Modifiers::FINAL;

        assert_eq!(
            select_mode(&lazy_field(Modifiers::PRIVATE, None), false).unwrap(),
            AccessorMode::Simple
        );
        assert_eq!(
            select_mode(&lazy_field(private_final, compute.clone()), true).unwrap(),
            AccessorMode::Lazy
        );
        assert_eq!(
            select_mode(&lazy_field(Modifiers::PRIVATE, compute.clone()), true).unwrap_err(),
            SynthError::LazyRequiresPrivateFinal
        );
        assert_eq!(
            select_mode(&lazy_field(Modifiers::PUBLIC | Modifiers::FINAL, compute), true).unwrap_err(),
            SynthError::LazyRequiresPrivateFinal
        );
        assert_eq!(
            select_mode(&lazy_field(private_final, None), true).unwrap_err(),
            SynthError::LazyRequiresInitializer
        );
    }

    fn instance(name: &'static str) -> FieldRef<'static> {
        FieldRef {
            owner: "Sample",
            name,
            is_static: false,
        }
    }

    #[test]
    fn test_simple_body_reads_through_this() {
        let body = simple_body(instance("count"));
        assert_eq!(body.stmts, vec![Stmt::Return(Some(Expr::this_field("count")))]);
        assert_eq!(body.first_field_read().as_deref(), Some("count"));
    }

    #[test]
    fn test_static_bodies_read_through_owner() {
        let field = FieldRef {
            owner: "Registry",
            name: "count",
            is_static: true,
        };
        let body = simple_body(field);
        assert_eq!(
            body.stmts,
            vec![Stmt::Return(Some(Expr::static_field("Registry", "count")))]
        );

        let body = lazy_body(field, &TypeRef::named("String"), Expr::invoke("load", vec![]));
        assert_eq!(body.synchronized_field(), Some("count"));
        let Some(Stmt::Synchronized { lock, .. }) = (match &body.stmts[1] {
            Stmt::If { then, .. } => then.stmts.first(),
            _ => None,
        }) else {
            panic!("lazy body must lock the holder");
        };
        assert_eq!(*lock, Expr::static_field("Registry", "count"));
    }

    #[test]
    fn test_lazy_primitive_shape() {
        let init = Expr::invoke("compute", vec![]);
        let body = lazy_body(instance("x"), &TypeRef::Primitive(PrimitiveKind::Int), init.clone());

        assert_eq!(body.synchronized_field(), Some("x"));
        assert_eq!(body.local_init(LAZY_ACTUAL_LOCAL), Some(&init));

        let Some(Stmt::Return(Some(ret))) = body.stmts.last() else {
            panic!("lazy body must end in a return");
        };
        assert_eq!(
            *ret,
            Expr::cast(TypeRef::named("java.lang.Integer"), Expr::local(LAZY_VALUE_LOCAL))
        );
    }

    #[test]
    fn test_lazy_reference_uses_sentinel() {
        let body = lazy_body(instance("name"), &TypeRef::named("String"), Expr::null());

        let Some(Stmt::Return(Some(ret))) = body.stmts.last() else {
            panic!("lazy body must end in a return");
        };
        let ExprKind::Cast { ty, expr } = &ret.kind else {
            panic!("return must cast");
        };
        assert_eq!(*ty, TypeRef::named("String"));
        let ExprKind::Parens(inner) = &expr.kind else {
            panic!("cast operand must be parenthesized");
        };
        assert_eq!(
            **inner,
            Expr::conditional(
                Expr::equals(Expr::local(LAZY_VALUE_LOCAL), Expr::this_field("name")),
                Expr::null(),
                Expr::local(LAZY_VALUE_LOCAL),
            )
        );
    }
}
