//! Registro de nós do controle

use std::collections::BTreeMap;

use fso_core::NodeName;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Papel de um nó registrado
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Endpoint com índice na topologia
    Endpoint { index: usize },
    /// Switch com índice na topologia
    Switch { index: usize },
}

/// Endpoint resolvido
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointRef {
    pub name: NodeName,
    pub index: usize,
}

/// Registro nome → papel
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<NodeName, Role>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra nó; duplicata sobrescreve a entrada anterior
    pub fn register(&mut self, name: NodeName, role: Role) -> Option<Role> {
        let previous = self.nodes.insert(name.clone(), role);
        if let Some(old) = previous {
            warn!(node = %name, ?old, new = ?role, "duplicate registration, last write wins");
        }
        previous
    }

    pub fn role(&self, name: &NodeName) -> Option<Role> {
        self.nodes.get(name).copied()
    }

    /// Resolve endpoint registrado
    pub fn endpoint(&self, name: &NodeName) -> Option<EndpointRef> {
        match self.role(name)? {
            Role::Endpoint { index } => Some(EndpointRef {
                name: name.clone(),
                index,
            }),
            Role::Switch { .. } => None,
        }
    }

    pub fn endpoints(&self) -> impl Iterator<Item = EndpointRef> + '_ {
        self.nodes.iter().filter_map(|(name, role)| match role {
            Role::Endpoint { index } => Some(EndpointRef {
                name: name.clone(),
                index: *index,
            }),
            Role::Switch { .. } => None,
        })
    }

    pub fn switch_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|role| matches!(role, Role::Switch { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
