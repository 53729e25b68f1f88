//! Tree-walking interpreter for method bodies.
//!
//! Executes against a shared [`Heap`]: several threads may invoke methods on
//! the same instance at once, and `synchronized` blocks take the monitor of
//! the holder they name. Primitives are boxed when they flow into reference
//! typed locals and unboxed when they flow back into primitive types.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use af_core::markers;
use af_core::{
    BinOp, Block, Expr, ExprKind, Literal, MethodDecl, PrimitiveKind, Stmt, StructureId, Tree, TypeRef,
};
use tracing::{debug, trace};

use crate::error::ExecError;
use crate::heap::{AtomicHolder, Heap, HeapObject, Instance};
use crate::sync::{Arc, RwLock};
use crate::value::{ObjId, Value};

/// Provider of methods the tree itself does not define, such as `compute()` in
/// `private final int x = compute();`.
pub trait Host: Send + Sync {
    fn call(&self, heap: &Heap, method: &str, args: &[Value]) -> Result<Value, ExecError>;
}

impl<F> Host for F
where
    F: Fn(&Heap, &str, &[Value]) -> Result<Value, ExecError> + Send + Sync,
{
    fn call(&self, heap: &Heap, method: &str, args: &[Value]) -> Result<Value, ExecError> {
        self(heap, method, args)
    }
}

/// Host with no methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl Host for NoHost {
    fn call(&self, _heap: &Heap, method: &str, args: &[Value]) -> Result<Value, ExecError> {
        Err(ExecError::UnknownMethod {
            name: method.to_string(),
            arity: args.len(),
        })
    }
}

/// A tree plus the heap its instances live on.
///
/// Static fields of a structure live in one heap object created on first use.
/// When threads race on that first use, each may run the static initializers
/// but only one resulting object is kept.
pub struct Runtime {
    tree: Tree,
    heap: Heap,
    statics: RwLock<BTreeMap<StructureId, ObjId>>,
}

impl Runtime {
    #[must_use]
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            heap: Heap::new(),
            statics: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Allocate an instance of `structure` and run its field initializers in declaration order.
    pub fn instantiate(&self, structure: StructureId, host: &dyn Host) -> Result<ObjId, ExecError> {
        let decl = self.tree.structure(structure)?;
        if !decl.kind.is_class_like() {
            return Err(ExecError::NotInstantiable(decl.name.clone()));
        }

        let id = self.heap.alloc(HeapObject::Instance(Instance::new(structure)))?;
        self.init_fields(id, structure, false, host)?;

        debug!(structure = %decl.name, object = %id, "instantiated");
        Ok(id)
    }

    /// The object holding the static fields of `structure`, initializing it on first use.
    pub fn statics(&self, structure: StructureId, host: &dyn Host) -> Result<ObjId, ExecError> {
        if let Some(id) = self.statics.read().map_err(|_| ExecError::Poisoned)?.get(&structure) {
            return Ok(*id);
        }

        let decl = self.tree.structure(structure)?;
        let fresh = self.heap.alloc(HeapObject::Instance(Instance::new(structure)))?;
        self.init_fields(fresh, structure, true, host)?;

        let mut statics = self.statics.write().map_err(|_| ExecError::Poisoned)?;
        let id = *statics.entry(structure).or_insert(fresh);
        debug!(structure = %decl.name, object = %id, "static storage initialized");
        Ok(id)
    }

    /// Read a static field of `structure`.
    pub fn static_field(&self, structure: StructureId, name: &str, host: &dyn Host) -> Result<Value, ExecError> {
        let id = self.statics(structure, host)?;
        self.field(id, name)
    }

    /// Invoke `method` without an instance; only static state is reachable.
    pub fn invoke_static(
        &self,
        structure: StructureId,
        method: &str,
        args: &[Value],
        host: &dyn Host,
    ) -> Result<Value, ExecError> {
        let this = self.statics(structure, host)?;
        self.invoke(this, method, args, host)
    }

    fn structure_named(&self, name: &str) -> Result<StructureId, ExecError> {
        self.tree
            .structure_ids()
            .find(|id| self.tree.structure(*id).is_ok_and(|s| s.name == name))
            .ok_or_else(|| ExecError::UnknownType(name.to_string()))
    }

    /// Run the initializers of the static or the instance fields of `structure` on `id`.
    ///
    /// Every field gets its zero value first, so initializers reading a later
    /// field see the default.
    fn init_fields(
        &self,
        id: ObjId,
        structure: StructureId,
        statics: bool,
        host: &dyn Host,
    ) -> Result<(), ExecError> {
        let mut fields = Vec::new();
        for field_id in self.tree.fields_of(structure)? {
            let field = self.tree.field(field_id)?;
            if field.modifiers.is_static() == statics {
                fields.push(field);
            }
        }

        for field in &fields {
            let value = Value::default_of(field.ty.as_primitive());
            self.with_instance(id, |instance| instance.init_field(&field.name, value))?;
        }
        for field in fields {
            let Some(init) = &field.init else {
                continue;
            };
            let mut frame = Frame::new(self, host, id, structure);
            frame.static_init = statics;
            let value = frame.eval(init)?;
            let value = frame.coerce(value, &field.ty)?;
            self.with_instance(id, |instance| instance.init_field(&field.name, value))?;
        }
        Ok(())
    }

    /// Invoke `method` on the instance `this`.
    pub fn invoke(&self, this: ObjId, method: &str, args: &[Value], host: &dyn Host) -> Result<Value, ExecError> {
        let structure = self.with_instance(this, |instance| Ok(instance.structure))?;
        let decl = self
            .tree
            .find_method(structure, method, args.len())?
            .ok_or_else(|| ExecError::UnknownMethod {
                name: method.to_string(),
                arity: args.len(),
            })?;
        self.call_method(this, structure, decl, args, host)
    }

    /// Read a field of an instance.
    pub fn field(&self, this: ObjId, name: &str) -> Result<Value, ExecError> {
        self.with_instance(this, |instance| instance.field(name))
    }

    /// Current slot of the holder stored in field `name`, `None` while empty.
    pub fn holder_slot(&self, this: ObjId, name: &str) -> Result<Option<ObjId>, ExecError> {
        let value = self.field(this, name)?;
        let id = value
            .as_obj()
            .ok_or_else(|| ExecError::NotAnObject(value.to_string()))?;
        match &*self.heap.get(id)? {
            HeapObject::Holder(holder) => Ok(holder.get()),
            other => Err(ExecError::ClassCast {
                expected: markers::ATOMIC_REFERENCE.to_string(),
                found: other.type_name(),
            }),
        }
    }

    fn with_instance<T>(
        &self,
        id: ObjId,
        f: impl FnOnce(&Instance) -> Result<T, ExecError>,
    ) -> Result<T, ExecError> {
        let object = self.heap.get(id)?;
        match &*object {
            HeapObject::Instance(instance) => f(instance),
            other => Err(ExecError::ClassCast {
                expected: "instance".to_string(),
                found: other.type_name(),
            }),
        }
    }

    fn call_method(
        &self,
        this: ObjId,
        structure: StructureId,
        method: &MethodDecl,
        args: &[Value],
        host: &dyn Host,
    ) -> Result<Value, ExecError> {
        let body = method
            .body
            .as_ref()
            .ok_or_else(|| ExecError::NoBody(method.name.clone()))?;

        let mut frame = Frame::new(self, host, this, structure);
        for (param, arg) in method.params.iter().zip(args) {
            let value = frame.coerce(*arg, &param.ty)?;
            frame.declare(&param.name, param.ty.clone(), value);
        }

        match frame.exec_block(body)? {
            Flow::Return(value) => frame.coerce(value, &method.return_type),
            Flow::Next => Ok(Value::Null),
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("tree", &self.tree)
            .field("heap", &self.heap)
            .finish_non_exhaustive()
    }
}

enum Flow {
    Next,
    Return(Value),
}

struct Local {
    ty: TypeRef,
    value: Value,
}

/// One method activation.
struct Frame<'r> {
    runtime: &'r Runtime,
    host: &'r dyn Host,
    this: ObjId,
    structure: StructureId,
    /// Running a static initializer of `structure`; `this` is its static storage.
    static_init: bool,
    locals: HashMap<String, Local>,
}

impl<'r> Frame<'r> {
    fn new(runtime: &'r Runtime, host: &'r dyn Host, this: ObjId, structure: StructureId) -> Self {
        Self {
            runtime,
            host,
            this,
            structure,
            static_init: false,
            locals: HashMap::new(),
        }
    }

    fn heap(&self) -> &'r Heap {
        &self.runtime.heap
    }

    fn declare(&mut self, name: &str, ty: TypeRef, value: Value) {
        self.locals.insert(name.to_string(), Local { ty, value });
    }

    fn exec_block(&mut self, block: &Block) -> Result<Flow, ExecError> {
        for stmt in &block.stmts {
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, ExecError> {
        match stmt {
            Stmt::Local { name, ty, init, .. } => {
                let value = match init {
                    Some(init) => {
                        let value = self.eval(init)?;
                        self.coerce(value, ty)?
                    }
                    None => Value::default_of(ty.as_primitive()),
                };
                self.declare(name, ty.clone(), value);
                Ok(Flow::Next)
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Next)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_bool(cond)? {
                    self.exec_block(then)
                } else if let Some(otherwise) = otherwise {
                    self.exec_block(otherwise)
                } else {
                    Ok(Flow::Next)
                }
            }
            Stmt::Synchronized { lock, body } => {
                let target = self.eval(lock)?;
                let id = target
                    .as_obj()
                    .ok_or_else(|| ExecError::NullPointer("synchronized on null".to_string()))?;
                let object = self.heap().get(id)?;
                let HeapObject::Holder(holder) = &*object else {
                    return Err(ExecError::ClassCast {
                        expected: markers::ATOMIC_REFERENCE.to_string(),
                        found: object.type_name(),
                    });
                };
                let _guard = holder.monitor().lock().map_err(|_| ExecError::Poisoned)?;
                self.exec_block(body)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn eval_bool(&mut self, expr: &Expr) -> Result<bool, ExecError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            _ => Err(ExecError::NotABoolean),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ExecError> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Local(name) => self
                .locals
                .get(name)
                .map(|local| local.value)
                .ok_or_else(|| ExecError::UnknownLocal(name.clone())),
            ExprKind::This => Ok(Value::Ref(self.this)),
            ExprKind::TypeName(name) => {
                let structure = self.runtime.structure_named(name)?;
                if self.static_init && structure == self.structure {
                    return Ok(Value::Ref(self.this));
                }
                Ok(Value::Ref(self.runtime.statics(structure, self.host)?))
            }
            ExprKind::FieldAccess { target, name } => {
                let target = self.eval(target)?;
                let id = target
                    .as_obj()
                    .ok_or_else(|| ExecError::NullPointer(format!("read of field '{}'", name)))?;
                self.runtime.field(id, name)
            }
            ExprKind::Call {
                receiver,
                method,
                args,
            } => {
                let receiver = receiver.as_ref().map(|r| self.eval(r)).transpose()?;
                let args = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>, _>>()?;
                match receiver {
                    Some(receiver) => self.call_on(receiver, method, &args),
                    None => self.call_unqualified(method, &args),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Ok(Value::Bool(match op {
                    BinOp::Eq => lhs == rhs,
                    BinOp::Ne => lhs != rhs,
                }))
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_bool(cond)? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            ExprKind::Cast { ty, expr } => {
                let value = self.eval(expr)?;
                self.cast(value, ty)
            }
            ExprKind::Assign { target, value } => {
                let value = self.eval(value)?;
                let ty = self
                    .locals
                    .get(target)
                    .map(|local| local.ty.clone())
                    .ok_or_else(|| ExecError::UnknownLocal(target.clone()))?;
                let value = self.coerce(value, &ty)?;
                self.declare(target, ty, value);
                Ok(value)
            }
            ExprKind::New { ty, args } => {
                let args = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>, _>>()?;
                self.new_instance(ty, &args)
            }
            ExprKind::Parens(inner) => self.eval(inner),
        }
    }

    fn literal(&self, literal: &Literal) -> Result<Value, ExecError> {
        Ok(match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Long(l) => Value::Long(*l),
            Literal::Double(d) => Value::Double(*d),
            Literal::Char(c) => Value::Char(*c),
            Literal::Str(s) => self.heap().alloc_str(s.clone())?,
        })
    }

    fn call_on(&mut self, receiver: Value, method: &str, args: &[Value]) -> Result<Value, ExecError> {
        let id = receiver
            .as_obj()
            .ok_or_else(|| ExecError::NullPointer(format!("call of {}() on null", method)))?;
        let object = self.heap().get(id)?;
        match (&*object, method, args) {
            (HeapObject::Holder(holder), "get", []) => Ok(holder.get().map_or(Value::Null, Value::Ref)),
            (HeapObject::Holder(holder), "set", [value]) => {
                let boxed = self.heap().box_value(*value)?;
                holder.set(boxed.as_obj());
                trace!(holder = %id, value = %boxed, "holder set");
                Ok(Value::Null)
            }
            (HeapObject::Instance(_), _, _) => self.runtime.invoke(id, method, args, self.host),
            (other, _, _) => Err(ExecError::UnknownMethod {
                name: format!("{}.{}", other.type_name(), method),
                arity: args.len(),
            }),
        }
    }

    fn call_unqualified(&mut self, method: &str, args: &[Value]) -> Result<Value, ExecError> {
        let own = self
            .runtime
            .tree
            .find_method(self.structure, method, args.len())?
            .filter(|decl| decl.body.is_some());
        match own {
            Some(decl) => self
                .runtime
                .call_method(self.this, self.structure, decl, args, self.host),
            None => self.host.call(self.heap(), method, args),
        }
    }

    fn new_instance(&mut self, ty: &TypeRef, args: &[Value]) -> Result<Value, ExecError> {
        let TypeRef::Named { name, .. } = ty else {
            return Err(ExecError::NotInstantiable(ty.to_string()));
        };

        if markers::type_matches(markers::ATOMIC_REFERENCE, name) {
            let holder = AtomicHolder::new();
            if let [initial] = args {
                holder.set(self.heap().box_value(*initial)?.as_obj());
            }
            return Ok(Value::Ref(self.heap().alloc(HeapObject::Holder(holder))?));
        }

        let structure = self
            .runtime
            .structure_named(name)
            .map_err(|_| ExecError::NotInstantiable(name.clone()))?;
        Ok(Value::Ref(self.runtime.instantiate(structure, self.host)?))
    }

    /// Assignment conversion into a slot of type `ty`.
    fn coerce(&self, value: Value, ty: &TypeRef) -> Result<Value, ExecError> {
        match ty.as_primitive() {
            Some(kind) => self.unbox(value, kind),
            None => self.heap().box_value(value),
        }
    }

    fn cast(&self, value: Value, ty: &TypeRef) -> Result<Value, ExecError> {
        if let Some(kind) = ty.as_primitive() {
            return self.unbox(value, kind);
        }
        let TypeRef::Named { name, .. } = ty else {
            return self.heap().box_value(value);
        };

        let value = self.heap().box_value(value)?;
        let Some(id) = value.as_obj() else {
            return Ok(value);
        };
        let object = self.heap().get(id)?;

        let expected_box = PrimitiveKind::from_boxed_name(name);
        let ok = match (&*object, expected_box) {
            (HeapObject::Boxed(inner), Some(kind)) => inner.primitive_kind() == Some(kind),
            (_, Some(_)) => false,
            (HeapObject::Str(_), None) => true,
            (_, None) if markers::type_matches("java.lang.String", name) => false,
            (_, None) => true,
        };
        if ok {
            Ok(value)
        } else {
            Err(ExecError::ClassCast {
                expected: name.clone(),
                found: object.type_name(),
            })
        }
    }

    fn unbox(&self, value: Value, kind: PrimitiveKind) -> Result<Value, ExecError> {
        match value {
            Value::Null => Err(ExecError::NullPointer(format!("unboxing null to {}", kind.keyword()))),
            Value::Ref(id) => {
                let object: Arc<HeapObject> = self.heap().get(id)?;
                match &*object {
                    HeapObject::Boxed(inner) if inner.primitive_kind() == Some(kind) => Ok(*inner),
                    other => Err(ExecError::ClassCast {
                        expected: kind.keyword().to_string(),
                        found: other.type_name(),
                    }),
                }
            }
            primitive if primitive.primitive_kind() == Some(kind) => Ok(primitive),
            primitive => Err(ExecError::ClassCast {
                expected: kind.keyword().to_string(),
                found: primitive
                    .primitive_kind()
                    .map_or("?", PrimitiveKind::keyword)
                    .to_string(),
            }),
        }
    }
}
