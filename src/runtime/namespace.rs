use crate::runtime::error::RuntimeError;
use crate::runtime::types::{Signature, Type};
use crate::runtime::value::{new_cell, CellRef, FuncValue, HostFn, Raw, Stored};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Binding {
    pub cell: CellRef,
    pub is_const: bool,
}

/// A lexical scope: its own bindings plus a link to the parent. Lookup
/// walks outward; the chain bottoms out at the read-only package
/// namespace.
#[derive(Clone)]
pub struct NameSpace {
    inner: Rc<ScopeData>,
}

struct ScopeData {
    bindings: RefCell<HashMap<String, Binding>>,
    parent: Option<NameSpace>,
    root: Rc<PackageNameSpace>,
}

impl NameSpace {
    /// The interpreter's global scope, a child of the package namespace.
    pub fn global(root: Rc<PackageNameSpace>) -> Self {
        Self {
            inner: Rc::new(ScopeData {
                bindings: RefCell::new(HashMap::new()),
                parent: None,
                root,
            }),
        }
    }

    pub fn new_block(&self) -> NameSpace {
        Self {
            inner: Rc::new(ScopeData {
                bindings: RefCell::new(HashMap::new()),
                parent: Some(self.clone()),
                root: self.inner.root.clone(),
            }),
        }
    }

    pub fn find(&self, name: &str) -> Option<Binding> {
        let mut scope = Some(self.clone());
        while let Some(ns) = scope {
            if let Some(binding) = ns.inner.bindings.borrow().get(name) {
                return Some(binding.clone());
            }
            scope = ns.inner.parent.clone();
        }
        None
    }

    pub fn find_local(&self, name: &str) -> Option<Binding> {
        self.inner.bindings.borrow().get(name).cloned()
    }

    pub fn add_local(&self, name: &str, binding: Binding) -> Result<(), RuntimeError> {
        let mut bindings = self.inner.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(RuntimeError::Redeclared { name: name.into() });
        }
        bindings.insert(name.to_string(), binding);
        Ok(())
    }

    pub fn find_package(&self, name: &str) -> Option<Rc<Package>> {
        self.inner.root.package(name)
    }
}

impl fmt::Debug for NameSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.inner.bindings.borrow().keys().cloned().collect();
        write!(f, "NameSpace{names:?}")
    }
}

/// An exported entry of a pre-bound host package.
#[derive(Debug)]
pub enum PkgEntry {
    Var(CellRef),
    Func(FuncValue),
    Type(Type),
    Const(Stored),
}

#[derive(Debug)]
pub struct Package {
    pub name: String,
    entries: HashMap<String, PkgEntry>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&PkgEntry> {
        self.entries.get(name)
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn type_entry(&self, name: &str) -> Option<Type> {
        match self.entries.get(name) {
            Some(PkgEntry::Type(ty)) => Some(ty.clone()),
            _ => None,
        }
    }

    pub fn add_func(
        &mut self,
        name: &str,
        params: Vec<Type>,
        variadic: Option<Type>,
        results: Vec<Type>,
        func: impl Fn(Vec<Raw>) -> Result<Vec<Raw>, RuntimeError> + 'static,
    ) {
        let qualified = format!("{}.{}", self.name, name);
        self.entries.insert(
            name.to_string(),
            PkgEntry::Func(FuncValue::Host(Rc::new(HostFn {
                name: qualified,
                sig: Signature {
                    params,
                    variadic,
                    results,
                },
                func: Box::new(func),
            }))),
        );
    }

    pub fn add_var(&mut self, name: &str, value: Raw) {
        self.entries
            .insert(name.to_string(), PkgEntry::Var(new_cell(Stored::Typed(value))));
    }

    pub fn add_const(&mut self, name: &str, value: Stored) {
        self.entries.insert(name.to_string(), PkgEntry::Const(value));
    }

    pub fn add_type(&mut self, name: &str, ty: Type) {
        self.entries.insert(name.to_string(), PkgEntry::Type(ty));
    }
}

/// The immutable root of every scope chain: `package name → exported
/// name → entry`.
#[derive(Debug, Default)]
pub struct PackageNameSpace {
    packages: HashMap<String, Rc<Package>>,
}

impl PackageNameSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: Package) {
        self.packages
            .insert(package.name.clone(), Rc::new(package));
    }

    pub fn package(&self, name: &str) -> Option<Rc<Package>> {
        self.packages.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::types::IntKind;

    fn local(v: i64) -> Binding {
        Binding {
            cell: new_cell(Stored::Typed(Raw::Int(IntKind::Int, v))),
            is_const: false,
        }
    }

    #[test]
    fn lookup_walks_outward() {
        let global = NameSpace::global(Rc::new(PackageNameSpace::new()));
        global.add_local("x", local(1)).unwrap();
        let block = global.new_block();
        block.add_local("y", local(2)).unwrap();

        assert!(block.find("x").is_some());
        assert!(block.find("y").is_some());
        assert!(block.find_local("x").is_none());
        assert!(global.find("y").is_none());
    }

    #[test]
    fn redeclaring_a_local_fails() {
        let global = NameSpace::global(Rc::new(PackageNameSpace::new()));
        global.add_local("x", local(1)).unwrap();
        assert!(matches!(
            global.add_local("x", local(2)),
            Err(RuntimeError::Redeclared { .. })
        ));
        // Shadowing in a child block is fine.
        let block = global.new_block();
        block.add_local("x", local(3)).unwrap();
    }

    #[test]
    fn inner_bindings_do_not_leak_out() {
        let global = NameSpace::global(Rc::new(PackageNameSpace::new()));
        {
            let block = global.new_block();
            block.add_local("tmp", local(1)).unwrap();
        }
        assert!(global.find("tmp").is_none());
    }
}
