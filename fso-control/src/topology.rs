//! Estratégias de topologia: par de endpoints → comandos de switch
//!
//! ```text
//! Ring (4 switches, 2 endpoints cada, links na porta 2, sentido crescente)
//!
//!   q0 q1     q2 q3     q4 q5     q6 q7
//!    \ /       \ /       \ /       \ /
//!   sw0 ────▶ sw1 ────▶ sw2 ────▶ sw3 ──┐
//!    ▲                                  │
//!    └──────────────────────────────────┘
//!
//! Tree (branches ≤ 3, branch_size ≤ 2)
//!
//!          super (switch_<branches>)
//!          /        |        \
//!       sw0       sw1       sw2
//!       / \       / \       / \
//!     q0   q1   q2   q3   q4   q5
//! ```

use std::fmt;

use fso_core::NodeName;
use fso_switch::{PORT_COUNT, SwitchFabric, SwitchResult};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::registry::EndpointRef;

/// Endpoints atendidos por switch de anel
pub const RING_ENDPOINTS_PER_SWITCH: usize = 2;

/// Tamanho padrão de ramo da árvore
pub const DEFAULT_BRANCH_SIZE: usize = 2;

/// Comando de reconfiguração para um switch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchCommand {
    /// `a` e `b` nas portas do detector
    Herald {
        switch: NodeName,
        a: NodeName,
        b: NodeName,
    },
    /// Link de switch atravessado para o próximo switch
    Relay {
        switch: NodeName,
        from: NodeName,
        to: NodeName,
    },
    /// Endpoint encaminhado para o link de saída
    Uplink {
        switch: NodeName,
        endpoint: NodeName,
        toward: NodeName,
    },
}

impl SwitchCommand {
    pub fn switch(&self) -> &NodeName {
        match self {
            Self::Herald { switch, .. } | Self::Relay { switch, .. } | Self::Uplink { switch, .. } => switch,
        }
    }

    pub fn is_herald(&self) -> bool {
        matches!(self, Self::Herald { .. })
    }

    pub fn is_relay(&self) -> bool {
        matches!(self, Self::Relay { .. })
    }

    /// Aplica o comando ao switch de destino
    pub fn apply<F: SwitchFabric + ?Sized>(&self, fabric: &mut F) -> SwitchResult<()> {
        let switch = fabric.require_switch(self.switch())?;
        match self {
            Self::Herald { a, b, .. } => switch.herald_switch(a, b),
            Self::Relay { from, to, .. } => switch.relay_switch(from, to),
            Self::Uplink {
                endpoint, toward, ..
            } => switch.relay_switch(endpoint, toward),
        }
    }
}

impl fmt::Display for SwitchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Herald { switch, a, b } => write!(f, "{switch}: herald({a}, {b})"),
            Self::Relay { switch, from, to } => write!(f, "{switch}: relay({from} -> {to})"),
            Self::Uplink {
                switch,
                endpoint,
                toward,
            } => write!(f, "{switch}: uplink({endpoint} -> {toward})"),
        }
    }
}

fn default_branch_size() -> usize {
    DEFAULT_BRANCH_SIZE
}

/// Topologia ativa da rede
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// Um único switch (`switch_0`)
    Simple,
    /// Anel de switches com dois endpoints cada
    Ring { switches: usize },
    /// Ramos alimentando um super switch
    Tree {
        branches: usize,
        #[serde(default = "default_branch_size")]
        branch_size: usize,
    },
}

impl Topology {
    /// Confere limites impostos por switches de três portas
    pub fn validate(&self) -> ControlResult<()> {
        match *self {
            Self::Simple => Ok(()),
            Self::Ring { switches } if switches == 0 => Err(ControlError::InvalidTopology(
                "ring needs at least one switch".into(),
            )),
            Self::Ring { .. } => Ok(()),
            Self::Tree {
                branches,
                branch_size,
            } => {
                if branches == 0 || branches > PORT_COUNT {
                    return Err(ControlError::InvalidTopology(format!(
                        "tree needs 1..={PORT_COUNT} branches, got {branches}"
                    )));
                }
                if branch_size == 0 || branch_size >= PORT_COUNT {
                    return Err(ControlError::InvalidTopology(format!(
                        "branch size must be 1..={}, got {branch_size}",
                        PORT_COUNT - 1
                    )));
                }
                Ok(())
            }
        }
    }

    /// Número de switches
    pub fn switch_count(&self) -> usize {
        match *self {
            Self::Simple => 1,
            Self::Ring { switches } => switches,
            Self::Tree { branches, .. } => branches + 1,
        }
    }

    /// Número de endpoints
    pub fn endpoint_count(&self) -> usize {
        match *self {
            Self::Simple => 2,
            Self::Ring { switches } => switches * RING_ENDPOINTS_PER_SWITCH,
            Self::Tree {
                branches,
                branch_size,
            } => branches * branch_size,
        }
    }

    /// Switch de acesso e porta local de um endpoint
    pub fn attachment(&self, endpoint: usize) -> Option<(usize, usize)> {
        if endpoint >= self.endpoint_count() {
            return None;
        }
        let per_switch = match *self {
            Self::Simple => 2,
            Self::Ring { .. } => RING_ENDPOINTS_PER_SWITCH,
            Self::Tree { branch_size, .. } => branch_size,
        };
        Some((endpoint / per_switch, endpoint % per_switch))
    }

    /// Índice do super switch (somente árvore)
    pub fn super_switch(&self) -> Option<usize> {
        match *self {
            Self::Tree { branches, .. } => Some(branches),
            _ => None,
        }
    }

    /// Calcula comandos para conectar dois endpoints
    pub fn commands(&self, a: &EndpointRef, b: &EndpointRef) -> ControlResult<Vec<SwitchCommand>> {
        match *self {
            Self::Simple => Ok(vec![SwitchCommand::Herald {
                switch: NodeName::switch(0),
                a: a.name.clone(),
                b: b.name.clone(),
            }]),
            Self::Ring { switches } => {
                let (low, high) = self.ordered(a, b)?;
                Ok(ring_commands(switches, low, high))
            }
            Self::Tree { branch_size, .. } => {
                let (low, high) = self.ordered(a, b)?;
                let super_index = self.super_switch().unwrap_or_default();
                Ok(tree_commands(branch_size, super_index, low, high))
            }
        }
    }

    fn ordered<'a>(
        &self,
        a: &'a EndpointRef,
        b: &'a EndpointRef,
    ) -> ControlResult<(&'a EndpointRef, &'a EndpointRef)> {
        for endpoint in [a, b] {
            if self.attachment(endpoint.index).is_none() {
                return Err(ControlError::RouteUnavailable(format!(
                    "{} (index {}) is outside the {self:?} topology",
                    endpoint.name, endpoint.index
                )));
            }
        }
        Ok(if a.index <= b.index { (a, b) } else { (b, a) })
    }
}

fn ring_commands(switches: usize, low: &EndpointRef, high: &EndpointRef) -> Vec<SwitchCommand> {
    let sw_low = low.index / RING_ENDPOINTS_PER_SWITCH;
    let sw_high = high.index / RING_ENDPOINTS_PER_SWITCH;

    if sw_low == sw_high {
        return vec![SwitchCommand::Herald {
            switch: NodeName::switch(sw_low),
            a: low.name.clone(),
            b: high.name.clone(),
        }];
    }

    let mut commands = Vec::with_capacity(sw_high - sw_low + 1);
    commands.push(SwitchCommand::Uplink {
        switch: NodeName::switch(sw_low),
        endpoint: low.name.clone(),
        toward: NodeName::switch((sw_low + 1) % switches),
    });
    for index in (sw_low + 1)..sw_high {
        commands.push(SwitchCommand::Relay {
            switch: NodeName::switch(index),
            from: NodeName::switch((index + switches - 1) % switches),
            to: NodeName::switch((index + 1) % switches),
        });
    }
    commands.push(SwitchCommand::Herald {
        switch: NodeName::switch(sw_high),
        a: high.name.clone(),
        b: NodeName::switch(sw_high - 1),
    });
    commands
}

fn tree_commands(
    branch_size: usize,
    super_index: usize,
    low: &EndpointRef,
    high: &EndpointRef,
) -> Vec<SwitchCommand> {
    let sw_low = low.index / branch_size;
    let sw_high = high.index / branch_size;

    if sw_low == sw_high {
        return vec![SwitchCommand::Herald {
            switch: NodeName::switch(sw_low),
            a: low.name.clone(),
            b: high.name.clone(),
        }];
    }

    let super_switch = NodeName::switch(super_index);
    vec![
        SwitchCommand::Uplink {
            switch: NodeName::switch(sw_low),
            endpoint: low.name.clone(),
            toward: super_switch.clone(),
        },
        SwitchCommand::Uplink {
            switch: NodeName::switch(sw_high),
            endpoint: high.name.clone(),
            toward: super_switch.clone(),
        },
        SwitchCommand::Herald {
            switch: super_switch,
            a: NodeName::switch(sw_low),
            b: NodeName::switch(sw_high),
        },
    ]
}
