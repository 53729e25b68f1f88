//! Post-synthesis invariants for a structure.
//!
//! | Property | Description |
//! |----------|-------------|
//! | SingleAccessorPerName | No synthesized zero-arg method shares its name (ignoring case) with another |
//! | LazyFieldsRewritten | Every lazy accessor's field is stored in a holder created by its initializer |
//! | RelocatedInitializerUnmarked | The moved initializer carries no provenance markers |
//! | LazyReturnTypePreserved | A lazy accessor never returns the holder type |
//! | DelegateMarkersRelocated | No field with a synthesized accessor still carries a delegate marker |

use std::collections::BTreeMap;

use crate::ast::ExprKind;
use crate::markers;
use crate::property::{PropertyChecker, PropertyResult};
use crate::tree::{MethodDecl, StructureId, Tree};

/// Property checker for one structure of a synthesized tree.
pub struct AccessorInvariants<'a> {
    tree: &'a Tree,
    structure: StructureId,
}

impl<'a> AccessorInvariants<'a> {
    #[must_use]
    pub fn new(tree: &'a Tree, structure: StructureId) -> Self {
        Self { tree, structure }
    }

    fn methods(&self) -> Vec<&'a MethodDecl> {
        self.tree
            .methods_of(self.structure)
            .map(|methods| methods.into_iter().map(|(_, m)| m).collect())
            .unwrap_or_default()
    }

    /// Generated methods whose body synchronizes on a field, paired with that field's name.
    fn lazy_accessors(&self) -> Vec<(&'a MethodDecl, &'a str)> {
        self.methods()
            .into_iter()
            .filter(|m| m.is_generated())
            .filter_map(|m| {
                let field = m.body.as_ref()?.synchronized_field()?;
                Some((m, field))
            })
            .collect()
    }

    fn check_single_accessor_per_name(&self) -> PropertyResult {
        let mut by_name: BTreeMap<String, Vec<&MethodDecl>> = BTreeMap::new();
        for method in self.methods().into_iter().filter(|m| m.accepts_arity(0)) {
            by_name
                .entry(method.name.to_lowercase())
                .or_default()
                .push(method);
        }

        for (name, methods) in by_name {
            if methods.len() > 1 && methods.iter().any(|m| m.is_generated()) {
                return PropertyResult::fail(
                    "SingleAccessorPerName",
                    name,
                    format!("{} zero-arg methods share this name", methods.len()),
                );
            }
        }

        PropertyResult::pass("SingleAccessorPerName")
    }

    fn check_lazy_fields_rewritten(&self) -> PropertyResult {
        let holder = markers::lazy_holder_type();

        for (method, field_name) in self.lazy_accessors() {
            let field = match self.tree.find_field(self.structure, field_name) {
                Ok(Some(id)) => self.tree.field(id).ok(),
                _ => None,
            };
            let Some(field) = field else {
                return PropertyResult::fail(
                    "LazyFieldsRewritten",
                    method.name.clone(),
                    format!("accessor synchronizes on missing field '{}'", field_name),
                );
            };

            if field.ty != holder {
                return PropertyResult::fail(
                    "LazyFieldsRewritten",
                    field_name,
                    format!("field type is {}, expected {}", field.ty, holder),
                );
            }

            let init_ok = field.init.as_ref().is_some_and(|init| {
                init.all_marked()
                    && matches!(&init.kind, ExprKind::New { ty, args } if *ty == holder && args.is_empty())
            });
            if !init_ok {
                return PropertyResult::fail(
                    "LazyFieldsRewritten",
                    field_name,
                    "field initializer is not a freshly constructed holder".to_string(),
                );
            }
        }

        PropertyResult::pass("LazyFieldsRewritten")
    }

    fn check_relocated_initializer_unmarked(&self) -> PropertyResult {
        for (method, _) in self.lazy_accessors() {
            let relocated = method
                .body
                .as_ref()
                .and_then(|b| b.local_init(markers::LAZY_ACTUAL_LOCAL));
            match relocated {
                Some(init) if !init.any_marked() => {}
                Some(_) => {
                    return PropertyResult::fail(
                        "RelocatedInitializerUnmarked",
                        method.name.clone(),
                        "relocated initializer still carries provenance markers".to_string(),
                    )
                }
                None => {
                    return PropertyResult::fail(
                        "RelocatedInitializerUnmarked",
                        method.name.clone(),
                        "lazy accessor has no relocated initializer".to_string(),
                    )
                }
            }
        }

        PropertyResult::pass("RelocatedInitializerUnmarked")
    }

    fn check_lazy_return_type(&self) -> PropertyResult {
        let holder = markers::lazy_holder_type();
        for (method, _) in self.lazy_accessors() {
            if method.return_type == holder {
                return PropertyResult::fail(
                    "LazyReturnTypePreserved",
                    method.name.clone(),
                    "accessor returns the holder type instead of the declared type".to_string(),
                );
            }
        }
        PropertyResult::pass("LazyReturnTypePreserved")
    }

    fn check_delegate_markers_relocated(&self) -> PropertyResult {
        for method in self.methods().into_iter().filter(|m| m.is_generated()) {
            let Some(field_name) = method.body.as_ref().and_then(|b| b.first_field_read()) else {
                continue;
            };
            let Ok(Some(id)) = self.tree.find_field(self.structure, &field_name) else {
                continue;
            };
            let Ok(field) = self.tree.field(id) else {
                continue;
            };
            if markers::DELEGATES.iter().any(|d| field.has_annotation(d)) {
                return PropertyResult::fail(
                    "DelegateMarkersRelocated",
                    field_name,
                    format!("field keeps a delegate marker after {}() was generated", method.name),
                );
            }
        }

        PropertyResult::pass("DelegateMarkersRelocated")
    }
}

impl PropertyChecker for AccessorInvariants<'_> {
    fn check_all(&self) -> Vec<PropertyResult> {
        vec![
            self.check_single_accessor_per_name(),
            self.check_lazy_fields_rewritten(),
            self.check_relocated_initializer_unmarked(),
            self.check_lazy_return_type(),
            self.check_delegate_markers_relocated(),
        ]
    }
}
