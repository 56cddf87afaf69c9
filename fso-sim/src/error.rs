//! Erros do kernel de simulação

use fso_core::SimTime;
use thiserror::Error;

use crate::condition::TaskId;

pub type SimResult<T> = Result<T, SimError>;

/// Erros do kernel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Fila vazia antes de a tarefa terminar
    #[error("Simulation stalled at {now}: task {task} still waiting")]
    Stalled { task: TaskId, now: SimTime },

    /// Orçamento de eventos esgotado
    #[error("Event budget of {limit} events exhausted")]
    EventBudgetExhausted { limit: u64 },

    /// Tarefa desconhecida
    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),

    /// Saída da tarefa com tipo diferente do solicitado
    #[error("Output of task {0} has an unexpected type")]
    OutputType(TaskId),

    /// Tarefa retomada recursivamente
    #[error("Task {0} resumed while already running")]
    Reentrant(TaskId),
}
