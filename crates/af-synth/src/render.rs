//! Java-like source rendering of declarations.
//!
//! Output is for people and golden tests; it is never parsed back.

use std::fmt::Write;

use af_core::{
    Annotation, BinOp, Block, Expr, ExprKind, FieldDecl, Literal, Member, MethodDecl, Modifiers, ModelError,
    Stmt, StructureId, StructureKind, Tree, TypeRef,
};

const INDENT: &str = "    ";

/// Render a whole structure with its fields and methods in member order.
pub fn render_structure(tree: &Tree, id: StructureId) -> Result<String, ModelError> {
    let structure = tree.structure(id)?;
    let keyword = match structure.kind {
        StructureKind::Class => "class",
        StructureKind::Enum => "enum",
        StructureKind::Interface => "interface",
        StructureKind::Annotation => "@interface",
    };

    let mut out = String::new();
    for annotation in &structure.annotations {
        out.push_str(&render_annotation(annotation));
        out.push('\n');
    }
    let _ = writeln!(out, "{} {} {{", keyword, structure.name);

    let mut first = true;
    for member in &structure.members {
        let text = match member {
            Member::Field(field) => render_field(tree.field(*field)?),
            Member::Method(method) => render_method(tree.method(*method)?),
            Member::Other(description) => format!("// {}", description),
        };
        if !first && text.contains('\n') {
            out.push('\n');
        }
        first = false;
        for line in text.lines() {
            if line.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "{}{}", INDENT, line);
            }
        }
    }

    out.push_str("}\n");
    Ok(out)
}

/// `private final int x = compute();`
#[must_use]
pub fn render_field(field: &FieldDecl) -> String {
    let mut out = String::new();
    for annotation in &field.annotations {
        out.push_str(&render_annotation(annotation));
        out.push(' ');
    }
    out.push_str(&modifier_prefix(field.modifiers));
    let _ = write!(out, "{} {}", field.ty, field.name);
    if let Some(init) = &field.init {
        let _ = write!(out, " = {}", render_expr(init));
    }
    out.push(';');
    out
}

/// Render a method with annotations on their own lines and a four-space indented body.
#[must_use]
pub fn render_method(method: &MethodDecl) -> String {
    let mut out = String::new();
    for annotation in &method.annotations {
        out.push_str(&render_annotation(annotation));
        out.push('\n');
    }
    out.push_str(&modifier_prefix(method.modifiers));

    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| {
            if p.varargs {
                let element = match &p.ty {
                    TypeRef::Array(inner) => inner.to_string(),
                    other => other.to_string(),
                };
                format!("{}... {}", element, p.name)
            } else {
                format!("{} {}", p.ty, p.name)
            }
        })
        .collect();
    let _ = write!(out, "{} {}({})", method.return_type, method.name, params.join(", "));

    match &method.body {
        Some(body) => {
            out.push_str(" {\n");
            render_block(&mut out, body, 1);
            out.push('}');
        }
        None => out.push(';'),
    }
    out
}

#[must_use]
pub fn render_annotation(annotation: &Annotation) -> String {
    if annotation.args.is_empty() {
        return format!("@{}", annotation.type_name);
    }
    let args: Vec<String> = annotation
        .args
        .iter()
        .map(|arg| format!("{} = {}", arg.name, render_expr(&arg.value)))
        .collect();
    format!("@{}({})", annotation.type_name, args.join(", "))
}

fn modifier_prefix(modifiers: Modifiers) -> String {
    modifiers.keywords().iter().map(|kw| format!("{} ", kw)).collect()
}

fn render_block(out: &mut String, block: &Block, depth: usize) {
    for stmt in &block.stmts {
        render_stmt(out, stmt, depth);
    }
}

fn render_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    let pad = INDENT.repeat(depth);
    match stmt {
        Stmt::Local {
            name,
            ty,
            is_final,
            init,
        } => {
            let _ = write!(out, "{}{}{} {}", pad, if *is_final { "final " } else { "" }, ty, name);
            if let Some(init) = init {
                let _ = write!(out, " = {}", render_expr(init));
            }
            out.push_str(";\n");
        }
        Stmt::Expr(expr) => {
            let _ = writeln!(out, "{}{};", pad, render_expr(expr));
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            let _ = writeln!(out, "{}if ({}) {{", pad, render_expr(cond));
            render_block(out, then, depth + 1);
            if let Some(otherwise) = otherwise {
                let _ = writeln!(out, "{}}} else {{", pad);
                render_block(out, otherwise, depth + 1);
            }
            let _ = writeln!(out, "{}}}", pad);
        }
        Stmt::Synchronized { lock, body } => {
            let _ = writeln!(out, "{}synchronized ({}) {{", pad, render_expr(lock));
            render_block(out, body, depth + 1);
            let _ = writeln!(out, "{}}}", pad);
        }
        Stmt::Return(None) => {
            let _ = writeln!(out, "{}return;", pad);
        }
        Stmt::Return(Some(expr)) => {
            let _ = writeln!(out, "{}return {};", pad, render_expr(expr));
        }
    }
}

#[must_use]
pub fn render_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(literal) => render_literal(literal),
        ExprKind::Local(name) => name.clone(),
        ExprKind::This => "this".to_string(),
        ExprKind::TypeName(name) => name.clone(),
        ExprKind::FieldAccess { target, name } => format!("{}.{}", render_expr(target), name),
        ExprKind::Call {
            receiver,
            method,
            args,
        } => {
            let args: Vec<String> = args.iter().map(render_expr).collect();
            match receiver {
                Some(receiver) => format!("{}.{}({})", render_expr(receiver), method, args.join(", ")),
                None => format!("{}({})", method, args.join(", ")),
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let op = match op {
                BinOp::Eq => "==",
                BinOp::Ne => "!=",
            };
            format!("{} {} {}", render_expr(lhs), op, render_expr(rhs))
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => format!(
            "{} ? {} : {}",
            render_expr(cond),
            render_expr(then),
            render_expr(otherwise)
        ),
        ExprKind::Cast { ty, expr } => format!("({}) {}", ty, render_expr(expr)),
        ExprKind::Assign { target, value } => format!("{} = {}", target, render_expr(value)),
        ExprKind::New { ty, args } => {
            let args: Vec<String> = args.iter().map(render_expr).collect();
            format!("new {}({})", ty, args.join(", "))
        }
        ExprKind::Parens(inner) => format!("({})", render_expr(inner)),
    }
}

fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Long(l) => format!("{}L", l),
        Literal::Double(d) => format!("{:?}", d),
        Literal::Char(c) => format!("'{}'", c.escape_default()),
        Literal::Str(s) => format!("\"{}\"", s.escape_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble, AccessorSpec};
    use crate::body::AccessorMode;
    use af_core::{AccessLevel, PrimitiveKind, SourcePos};

    #[test]
    fn test_render_simple_getter() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Point", StructureKind::Class);
        let f = tree
            .add_field(s, FieldDecl::new("x", TypeRef::Primitive(PrimitiveKind::Int), Modifiers::PRIVATE))
            .unwrap();
        let spec = AccessorSpec::new(f, AccessLevel::Public, SourcePos::new(1, 1));
        let method = assemble(&mut tree, &spec, AccessorMode::Simple, "getX").unwrap();

        assert_eq!(render_method(&method), "public int getX() {\n    return this.x;\n}");
    }

    #[test]
    fn test_render_static_getter() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Registry", StructureKind::Class);
        let f = tree
            .add_field(
                s,
                FieldDecl::new(
                    "count",
                    TypeRef::Primitive(PrimitiveKind::Int),
                    Modifiers::PRIVATE | Modifiers::STATIC,
                ),
            )
            .unwrap();
        let spec = AccessorSpec::new(f, AccessLevel::Public, SourcePos::new(1, 1));
        let method = assemble(&mut tree, &spec, AccessorMode::Simple, "getCount").unwrap();

        assert_eq!(
            render_method(&method),
            "public static int getCount() {\n    return Registry.count;\n}"
        );
    }

    #[test]
    fn test_render_lazy_int_getter() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Cache", StructureKind::Class);
        let f = tree
            .add_field(
                s,
                FieldDecl::new(
                    "x",
                    TypeRef::Primitive(PrimitiveKind::Int),
                    Modifiers::PRIVATE | Modifiers::FINAL,
                )
                .with_init(Expr::invoke("compute", vec![])),
            )
            .unwrap();
        let spec = AccessorSpec::new(f, AccessLevel::Public, SourcePos::new(1, 1)).lazy();
        let method = assemble(&mut tree, &spec, AccessorMode::Lazy, "getX").unwrap();

        let expected = "\
public int getX() {
    java.lang.Object value = this.x.get();
    if (value == null) {
        synchronized (this.x) {
            value = this.x.get();
            if (value == null) {
                final int actualValue = compute();
                value = actualValue;
                this.x.set(value);
            }
        }
    }
    return (java.lang.Integer) value;
}";
        assert_eq!(render_method(&method), expected);
        assert_eq!(
            render_field(tree.field(f).unwrap()),
            "private final java.util.concurrent.atomic.AtomicReference<java.lang.Object> x = \
             new java.util.concurrent.atomic.AtomicReference<java.lang.Object>();"
        );
    }

    #[test]
    fn test_render_lazy_reference_return() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Cache", StructureKind::Class);
        let f = tree
            .add_field(
                s,
                FieldDecl::new("name", TypeRef::named("String"), Modifiers::PRIVATE | Modifiers::FINAL)
                    .with_init(Expr::invoke("load", vec![])),
            )
            .unwrap();
        let spec = AccessorSpec::new(f, AccessLevel::Public, SourcePos::new(1, 1)).lazy();
        let method = assemble(&mut tree, &spec, AccessorMode::Lazy, "getName").unwrap();

        let rendered = render_method(&method);
        assert!(rendered.contains("value = actualValue == null ? this.name : actualValue;"));
        assert!(rendered.contains("return (String) (value == this.name ? null : value);"));
    }

    #[test]
    fn test_render_structure() {
        let mut tree = Tree::new();
        let s = tree.add_structure("Point", StructureKind::Class);
        tree.add_field(s, FieldDecl::new("x", TypeRef::Primitive(PrimitiveKind::Int), Modifiers::PRIVATE))
            .unwrap();
        let rendered = render_structure(&tree, s).unwrap();
        assert_eq!(rendered, "class Point {\n    private int x;\n}\n");
    }

    #[test]
    fn test_render_literals() {
        assert_eq!(render_expr(&Expr::literal(Literal::Long(5))), "5L");
        assert_eq!(render_expr(&Expr::literal(Literal::Str("a\"b".into()))), "\"a\\\"b\"");
        assert_eq!(render_expr(&Expr::literal(Literal::Double(1.0))), "1.0");
    }
}
