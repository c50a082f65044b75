//! Permission matrix entries.
//!
//! A [`Permission`] grants a set of operations, in a set of cluster states, at a
//! set of targeting levels. A setting carries several of them; an operation is
//! legal when at least one grants it.
//!
//! ```
//! use dynconf_core::{ClusterState, Operation, Permission, Scope};
//!
//! let permission = Permission::when(&[ClusterState::Configuring, ClusterState::Activated])
//!     .allow(&[Operation::Get, Operation::Set])
//!     .at_any_levels()
//!     .unwrap();
//!
//! assert!(permission.allows_in_state_at(ClusterState::Activated, Operation::Set, Scope::Stripe));
//! assert!(!permission.allows_operation(Operation::Unset));
//! ```

use crate::error::{DynConfigError, DynConfigResult};
use crate::policy::{ClusterState, Operation, Scope};

/// One entry of a setting's permission matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    states: Vec<ClusterState>,
    operations: Vec<Operation>,
    levels: Vec<Scope>,
}

impl Permission {
    /// Starts building a permission for the given cluster states.
    #[must_use]
    pub fn when(states: &[ClusterState]) -> PermissionBuilder {
        PermissionBuilder {
            states: dedup(states),
            operations: Vec::new(),
        }
    }

    /// Returns the states this permission applies to.
    pub fn states(&self) -> &[ClusterState] {
        &self.states
    }

    /// Returns the granted operations.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the levels the operations may be issued at.
    pub fn levels(&self) -> &[Scope] {
        &self.levels
    }

    /// Returns `true` if the operation is granted in some state at some level.
    pub fn allows_operation(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Returns `true` if the operation is granted in the given state.
    pub fn allows_in_state(&self, state: ClusterState, operation: Operation) -> bool {
        self.states.contains(&state) && self.allows_operation(operation)
    }

    /// Returns `true` if the operation is granted at the given level.
    pub fn allows_operation_at(&self, operation: Operation, level: Scope) -> bool {
        self.allows_operation(operation) && self.levels.contains(&level)
    }

    /// Returns `true` if anything is granted at the given level.
    pub fn allows_level(&self, level: Scope) -> bool {
        self.levels.contains(&level)
    }

    /// Returns `true` if the operation is granted in the state at the level.
    pub fn allows_in_state_at(&self, state: ClusterState, operation: Operation, level: Scope) -> bool {
        self.allows_in_state(state, operation) && self.levels.contains(&level)
    }
}

/// Builder returned by [`Permission::when`].
#[derive(Debug, Clone)]
#[must_use]
pub struct PermissionBuilder {
    states: Vec<ClusterState>,
    operations: Vec<Operation>,
}

impl PermissionBuilder {
    /// Grants the given operations.
    pub fn allow(mut self, operations: &[Operation]) -> Self {
        for op in operations {
            if !self.operations.contains(op) {
                self.operations.push(*op);
            }
        }
        self
    }

    /// Grants every operation all the selected states support.
    ///
    /// `config` is never granted explicitly; it follows from `import`.
    pub fn allow_any_operations(self) -> Self {
        let supported: Vec<Operation> = Operation::ALL
            .into_iter()
            .filter(|op| *op != Operation::Config)
            .filter(|op| self.states.iter().all(|s| s.supports(*op)))
            .collect();
        self.allow(&supported)
    }

    /// Finishes the permission at a single level.
    pub fn at_level(self, level: Scope) -> DynConfigResult<Permission> {
        self.at_levels(&[level])
    }

    /// Finishes the permission at every level.
    pub fn at_any_levels(self) -> DynConfigResult<Permission> {
        self.at_levels(&Scope::ALL)
    }

    /// Finishes the permission at the given levels.
    ///
    /// Fails when an operation is not supported by one of the states, or when
    /// `import` is combined with several levels or with the stripe level.
    pub fn at_levels(self, levels: &[Scope]) -> DynConfigResult<Permission> {
        if self.states.is_empty() {
            return Err(DynConfigError::invalid_permission("no cluster state given"));
        }
        if self.operations.is_empty() {
            return Err(DynConfigError::invalid_permission("no operation given"));
        }
        let levels = dedup(levels);
        if levels.is_empty() {
            return Err(DynConfigError::invalid_permission("no level given"));
        }
        for state in &self.states {
            if let Some(op) = self.operations.iter().find(|op| !state.supports(**op)) {
                return Err(DynConfigError::invalid_permission(format!(
                    "operation {op} is not supported when cluster is {state}"
                )));
            }
        }
        if self.operations.contains(&Operation::Import) {
            if levels.len() > 1 {
                return Err(DynConfigError::invalid_permission(
                    "operation import can only be granted at a single level",
                ));
            }
            if levels.contains(&Scope::Stripe) {
                return Err(DynConfigError::invalid_permission(
                    "operation import cannot be granted at stripe level",
                ));
            }
        }
        Ok(Permission {
            states: self.states,
            operations: self.operations,
            levels,
        })
    }
}

fn dedup<T: Copy + PartialEq>(items: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(*item);
        }
    }
    out
}
