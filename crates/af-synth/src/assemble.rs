//! Accessor declaration assembly.

use af_core::markers::{self, DEPRECATED, LAZY_ACTUAL_LOCAL};
use af_core::{AccessLevel, Annotation, Expr, FieldId, MethodDecl, Modifiers, SourcePos, Tree};

use crate::body::{lazy_body, simple_body, AccessorMode, FieldRef};
use crate::error::SynthError;

/// Everything needed to synthesize one accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorSpec {
    pub field: FieldId,
    pub level: AccessLevel,
    /// Requested body mode. `Lazy` is only honored once its preconditions are validated.
    pub mode: AccessorMode,
    /// Extra annotations placed on the generated method.
    pub on_method: Vec<Annotation>,
    /// Warn when a user-written method already has the accessor's name.
    pub whine_if_exists: bool,
    /// Position of the request; diagnostics and provenance markers point here.
    pub source: SourcePos,
}

impl AccessorSpec {
    #[must_use]
    pub fn new(field: FieldId, level: AccessLevel, source: SourcePos) -> Self {
        Self {
            field,
            level,
            mode: AccessorMode::Simple,
            on_method: Vec::new(),
            whine_if_exists: false,
            source,
        }
    }

    #[must_use]
    pub fn lazy(mut self) -> Self {
        self.mode = AccessorMode::Lazy;
        self
    }

    #[must_use]
    pub fn on_method(mut self, annotations: Vec<Annotation>) -> Self {
        self.on_method = annotations;
        self
    }

    #[must_use]
    pub fn whine_if_exists(mut self, whine: bool) -> Self {
        self.whine_if_exists = whine;
        self
    }
}

/// Build the accessor method named `name`.
///
/// `mode` must already be validated against the field. In lazy mode the field's
/// storage is rewritten to a holder and its initializer moves into the body;
/// delegate markers move from the field to the method in both modes.
pub fn assemble(
    tree: &mut Tree,
    spec: &AccessorSpec,
    mode: AccessorMode,
    name: &str,
) -> Result<MethodDecl, SynthError> {
    let source = Some(spec.source);
    let field = tree.field(spec.field)?.clone();
    let owner = tree.structure(tree.owner_of(spec.field)?)?.name.clone();
    let target = FieldRef::new(&owner, &field);
    // Captured before any rewrite so a lazy accessor keeps the declared type.
    let return_type = field.ty.clone();

    let mut body = match mode {
        AccessorMode::Simple => simple_body(target),
        AccessorMode::Lazy => {
            if field.init.is_none() {
                return Err(SynthError::LazyRequiresInitializer);
            }
            let holder_type = markers::lazy_holder_type();
            let mut holder_init = Expr::new_instance(holder_type.clone(), Vec::new());
            holder_init.mark_generated(source);

            let initializer = tree
                .replace_field_storage(spec.field, holder_type, Some(holder_init))?
                .ok_or(SynthError::LazyRequiresInitializer)?;
            lazy_body(target, &return_type, initializer)
        }
    };

    body.mark_generated(source);
    // The relocated initializer is user code and must stay recognizable as such.
    if let Some(initializer) = body.local_init_mut(LAZY_ACTUAL_LOCAL) {
        initializer.mark_generated(None);
    }

    let mut annotations = Vec::new();
    if field.is_deprecated() {
        annotations.push(Annotation::new(DEPRECATED));
    }
    annotations.extend(spec.on_method.iter().cloned());
    annotations.extend(copy_by_simple_name(&field.annotations, markers::NON_NULL_SIMPLE));
    annotations.extend(copy_by_simple_name(&field.annotations, markers::NULLABLE_SIMPLE));
    for annotation in &mut annotations {
        for arg in &mut annotation.args {
            arg.value.mark_generated(source);
        }
    }
    // Delegate markers are moved, not copied, so they keep their original provenance.
    annotations.extend(
        tree.remove_field_annotations(spec.field, |a| markers::DELEGATES.iter().any(|d| a.is(d)))?,
    );

    Ok(MethodDecl {
        name: name.to_string(),
        return_type,
        modifiers: spec.level.to_modifiers() | field.modifiers.intersection(Modifiers::STATIC),
        annotations,
        params: Vec::new(),
        body: Some(body),
        generated_by: source,
        pos: source,
    })
}

fn copy_by_simple_name<'a>(
    annotations: &'a [Annotation],
    simple: &'a str,
) -> impl Iterator<Item = Annotation> + 'a {
    annotations
        .iter()
        .filter(move |a| a.simple_name().eq_ignore_ascii_case(simple))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::{AnnotationArg, FieldDecl, Literal, PrimitiveKind, StructureKind, TypeRef};

    const SOURCE: SourcePos = SourcePos::new(7, 3);

    fn setup(field: FieldDecl) -> (Tree, FieldId) {
        let mut tree = Tree::new();
        let s = tree.add_structure("Sample", StructureKind::Class);
        let id = tree.add_field(s, field).unwrap();
        (tree, id)
    }

    #[test]
    fn test_simple_accessor() {
        let (mut tree, id) = setup(FieldDecl::new(
            "count",
            TypeRef::Primitive(PrimitiveKind::Int),
            Modifiers::PRIVATE,
        ));
        let spec = AccessorSpec::new(id, AccessLevel::Protected, SOURCE);

        let method = assemble(&mut tree, &spec, AccessorMode::Simple, "getCount").unwrap();
        assert_eq!(method.name, "getCount");
        assert_eq!(method.modifiers, Modifiers::PROTECTED);
        assert_eq!(method.return_type, TypeRef::Primitive(PrimitiveKind::Int));
        assert!(method.params.is_empty());
        assert_eq!(method.generated_by, Some(SOURCE));
        assert!(method.body.as_ref().unwrap().stmts.iter().all(|stmt| match stmt {
            af_core::Stmt::Return(Some(expr)) => expr.all_marked(),
            _ => false,
        }));
    }

    #[test]
    fn test_static_field_gives_static_accessor() {
        let (mut tree, id) = setup(FieldDecl::new(
            "INSTANCES",
            TypeRef::Primitive(PrimitiveKind::Long),
            Modifiers::PRIVATE | Modifiers::STATIC | Modifiers::FINAL,
        ));
        let spec = AccessorSpec::new(id, AccessLevel::Public, SOURCE);
        let method = assemble(&mut tree, &spec, AccessorMode::Simple, "getINSTANCES").unwrap();
        assert_eq!(method.modifiers, Modifiers::PUBLIC | Modifiers::STATIC);
        assert_eq!(
            method.body.unwrap().stmts,
            vec![af_core::Stmt::Return(Some({
                let mut read = Expr::static_field("Sample", "INSTANCES");
                read.mark_generated(Some(SOURCE));
                read
            }))]
        );
    }

    #[test]
    fn test_annotation_order_and_delegate_move() {
        let field = FieldDecl::new("inner", TypeRef::named("Runnable"), Modifiers::PRIVATE)
            .with_annotation(Annotation::new("lombok.experimental.Delegate"))
            .with_annotation(Annotation::new("javax.annotation.Nullable"))
            .with_annotation(Annotation::new("Deprecated"))
            .with_annotation(Annotation::new("NonNull"))
            .with_annotation(Annotation::new("Transient"));
        let (mut tree, id) = setup(field);
        let on_method = Annotation {
            type_name: "Marker".to_string(),
            args: vec![AnnotationArg {
                name: "value".to_string(),
                value: Expr::literal(Literal::Int(1)),
            }],
        };
        let spec = AccessorSpec::new(id, AccessLevel::Public, SOURCE).on_method(vec![on_method]);

        let method = assemble(&mut tree, &spec, AccessorMode::Simple, "getInner").unwrap();
        let names: Vec<&str> = method.annotations.iter().map(|a| a.type_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "java.lang.Deprecated",
                "Marker",
                "NonNull",
                "javax.annotation.Nullable",
                "lombok.experimental.Delegate",
            ]
        );
        assert!(method.annotations[1].args[0].value.all_marked());

        let field = tree.field(id).unwrap();
        let remaining: Vec<&str> = field.annotations.iter().map(|a| a.type_name.as_str()).collect();
        assert_eq!(
            remaining,
            vec!["javax.annotation.Nullable", "Deprecated", "NonNull", "Transient"]
        );
    }

    #[test]
    fn test_lazy_rewrites_field_storage() {
        let init = Expr::invoke("compute", vec![]);
        let field = FieldDecl::new(
            "x",
            TypeRef::Primitive(PrimitiveKind::Int),
            Modifiers::PRIVATE | Modifiers::FINAL,
        )
        .with_init(init.clone());
        let (mut tree, id) = setup(field);
        let spec = AccessorSpec::new(id, AccessLevel::Public, SOURCE).lazy();

        let method = assemble(&mut tree, &spec, AccessorMode::Lazy, "getX").unwrap();
        assert_eq!(method.return_type, TypeRef::Primitive(PrimitiveKind::Int));

        let body = method.body.as_ref().unwrap();
        let relocated = body.local_init(LAZY_ACTUAL_LOCAL).unwrap();
        assert_eq!(*relocated, init);
        assert!(!relocated.any_marked());

        let field = tree.field(id).unwrap();
        assert_eq!(field.ty, markers::lazy_holder_type());
        let holder_init = field.init.as_ref().unwrap();
        assert!(holder_init.all_marked());
        assert_eq!(holder_init.generated_by, Some(SOURCE));
    }

    #[test]
    fn test_lazy_strips_markers_from_marked_initializer() {
        let mut init = Expr::invoke("compute", vec![Expr::literal(Literal::Int(2))]);
        init.mark_generated(Some(SourcePos::new(1, 1)));
        let field = FieldDecl::new("x", TypeRef::named("String"), Modifiers::PRIVATE | Modifiers::FINAL)
            .with_init(init);
        let (mut tree, id) = setup(field);
        let spec = AccessorSpec::new(id, AccessLevel::Public, SOURCE).lazy();

        let method = assemble(&mut tree, &spec, AccessorMode::Lazy, "getX").unwrap();
        let relocated = method.body.as_ref().unwrap().local_init(LAZY_ACTUAL_LOCAL).unwrap();
        assert!(!relocated.any_marked());
    }
}
