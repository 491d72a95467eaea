//! Scope tree and symbol table.
//!
//! Scopes live in one index-addressed table. Each scope knows its parent
//! and children by index, so lookups walk upward without shared ownership
//! and the whole tree can be inspected once analysis is done.

use std::{collections::VecDeque, fmt::Display};

use crate::ast::types::{Number, Type};

pub type ScopeId = usize;

/// The root scope, created together with the tree.
pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub declared_type: Type,
    pub is_function: bool,
    pub param_count: u32,
    /// 0 for scalars, 1 for arrays.
    pub array_dims: u8,
    pub size_1d: Option<Number>,
    /// Reserved for two-dimensional arrays; never populated.
    pub size_2d: Option<Number>,
    pub used: bool,
    pub initialized: bool,
    pub line: u32,
}

impl Symbol {
    pub fn variable(name: &str, declared_type: Type, line: u32) -> Self {
        Symbol {
            name: name.to_string(),
            declared_type,
            is_function: false,
            param_count: 0,
            array_dims: 0,
            size_1d: None,
            size_2d: None,
            used: false,
            initialized: false,
            line,
        }
    }

    pub fn function(name: &str, return_type: Type, param_count: u32, line: u32) -> Self {
        Symbol {
            is_function: true,
            param_count,
            ..Symbol::variable(name, return_type, line)
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_function {
            write!(
                f,
                "{}({}): {} função",
                self.name, self.param_count, self.declared_type
            )?;
        } else {
            write!(f, "{}: {}", self.name, self.declared_type)?;
            match (self.array_dims, &self.size_1d) {
                (0, _) => {}
                (_, Some(size)) => write!(f, "[{}]", size)?,
                (_, None) => write!(f, "[]")?,
            }
            write!(f, " variável")?;
        }

        let mut flags = vec![];
        if self.initialized {
            flags.push("inicializada");
        }
        if self.used {
            flags.push("utilizada");
        }
        write!(f, " [{}] linha {}", flags.join(", "), self.line)
    }
}

/// Address of a symbol inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolId {
    pub scope: ScopeId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub name: String,
    symbols: Vec<Symbol>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
}

impl Scope {
    fn new(name: &str, parent: Option<ScopeId>) -> Self {
        Scope {
            name: name.to_string(),
            symbols: vec![],
            parent,
            children: vec![],
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.symbols.iter().position(|symbol| symbol.name == name)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.position(name).map(|index| &self.symbols[index])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        ScopeTree::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope::new("global", None)],
        }
    }

    pub fn add_scope(&mut self, name: &str, parent: ScopeId) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(name, Some(parent)));
        self.scopes[parent].children.push(id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Adds `symbol` to `scope`. Returns `None` when the scope already holds
    /// a symbol with that name.
    pub fn insert(&mut self, scope: ScopeId, symbol: Symbol) -> Option<SymbolId> {
        let target = &mut self.scopes[scope];
        if target.position(&symbol.name).is_some() {
            return None;
        }
        target.symbols.push(symbol);
        Some(SymbolId {
            scope,
            index: target.symbols.len() - 1,
        })
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope]
            .position(name)
            .map(|index| SymbolId { scope, index })
    }

    /// Finds the nearest symbol called `name`, starting at `scope` and
    /// walking up through the parents to the global scope.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = self.lookup_local(id, name) {
                return Some(found);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    /// Breadth-first search for `name` in `root` and all of its descendants.
    pub fn find_in_subtree(&self, root: ScopeId, name: &str) -> Option<SymbolId> {
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if let Some(found) = self.lookup_local(id, name) {
                return Some(found);
            }
            queue.extend(self.scopes[id].children.iter().copied());
        }
        None
    }

    /// The scope opened for function `name`, if any.
    pub fn function_scope(&self, name: &str) -> Option<ScopeId> {
        self.scopes[GLOBAL_SCOPE]
            .children
            .iter()
            .copied()
            .find(|&id| self.scopes[id].name == name)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.scopes[id.scope].symbols[id.index]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.scopes[id.scope].symbols[id.index]
    }

    /// Marks the symbol used and returns whether it already was.
    pub fn mark_used(&mut self, id: SymbolId) -> bool {
        let symbol = self.get_mut(id);
        std::mem::replace(&mut symbol.used, true)
    }

    pub fn mark_initialized(&mut self, id: SymbolId) {
        self.get_mut(id).initialized = true;
    }

    pub fn retype(&mut self, id: SymbolId, declared_type: Type) {
        self.get_mut(id).declared_type = declared_type;
    }

    /// Scope ids in depth-first pre-order starting at the global scope.
    pub fn preorder(&self) -> Vec<ScopeId> {
        let mut order = vec![];
        let mut stack = vec![GLOBAL_SCOPE];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.scopes[id].children.iter().rev().copied());
        }
        order
    }

    fn depth(&self, mut id: ScopeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.scopes[id].parent {
            depth += 1;
            id = parent;
        }
        depth
    }
}

impl Display for ScopeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for id in self.preorder() {
            let indent = "  ".repeat(self.depth(id));
            writeln!(f, "{}escopo {}", indent, self.scopes[id].name)?;
            for symbol in &self.scopes[id].symbols {
                writeln!(f, "{}  {}", indent, symbol)?;
            }
        }
        Ok(())
    }
}
