//! Condições de espera das tarefas

use std::collections::BTreeSet;
use std::fmt;

use fso_core::NodeName;

/// Identificador de timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub(crate) u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Identificador de tarefa
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Evento elementar que pode acordar uma tarefa
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Trigger {
    /// Timer expirou
    Timer(TimerId),
    /// Mensagem chegou na caixa de entrada do nó
    Inbox(NodeName),
    /// Programa local do nó terminou
    Program(NodeName),
    /// Tarefa terminou (persistente)
    Finished(TaskId),
}

/// Expressão AND/OR sobre triggers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    On(Trigger),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn on(trigger: Trigger) -> Self {
        Self::On(trigger)
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    pub fn timer(id: TimerId) -> Self {
        Self::On(Trigger::Timer(id))
    }

    pub fn inbox(node: NodeName) -> Self {
        Self::On(Trigger::Inbox(node))
    }

    pub fn program(node: NodeName) -> Self {
        Self::On(Trigger::Program(node))
    }

    pub fn finished(task: TaskId) -> Self {
        Self::On(Trigger::Finished(task))
    }

    /// Conjunção
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::All(mut items) => {
                items.push(other);
                Self::All(items)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Disjunção
    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Any(mut items) => {
                items.push(other);
                Self::Any(items)
            }
            first => Self::Any(vec![first, other]),
        }
    }

    /// Triggers referenciados pela condição
    pub fn triggers(&self) -> BTreeSet<Trigger> {
        let mut out = BTreeSet::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut BTreeSet<Trigger>) {
        match self {
            Self::On(t) => {
                out.insert(t.clone());
            }
            Self::All(items) | Self::Any(items) => items.iter().for_each(|c| c.collect(out)),
        }
    }

    /// Avalia a condição sobre o conjunto de triggers disparados
    ///
    /// `All([])` é verdadeira e `Any([])` é falsa.
    pub fn is_satisfied(&self, fired: &BTreeSet<Trigger>) -> bool {
        match self {
            Self::On(t) => fired.contains(t),
            Self::All(items) => items.iter().all(|c| c.is_satisfied(fired)),
            Self::Any(items) => items.iter().any(|c| c.is_satisfied(fired)),
        }
    }
}

/// Contexto de retomada: triggers que dispararam enquanto a tarefa esperava
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wake {
    fired: BTreeSet<Trigger>,
}

impl Wake {
    pub(crate) fn new(fired: BTreeSet<Trigger>) -> Self {
        Self { fired }
    }

    /// Primeira retomada (nenhuma espera anterior)
    pub fn is_start(&self) -> bool {
        self.fired.is_empty()
    }

    pub fn has(&self, trigger: &Trigger) -> bool {
        self.fired.contains(trigger)
    }

    pub fn timer_fired(&self, id: TimerId) -> bool {
        self.has(&Trigger::Timer(id))
    }

    pub fn fired(&self) -> &BTreeSet<Trigger> {
        &self.fired
    }
}
