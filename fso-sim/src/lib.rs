//! # ⏱️ fso-sim — Kernel de Eventos Discretos
//!
//! Escalonador cooperativo de thread único: as máquinas de estados do
//! protocolo são tarefas que suspendem apenas em pontos bem definidos
//! (timer, mensagem, programa local, término de outra tarefa, ou AND/OR
//! destes) e são retomadas de forma síncrona quando a condição é satisfeita.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Kernel<W>                   │
//! │  ┌────────────┐   ┌───────────────────────┐  │
//! │  │ EventQueue │──▶│ Timer │ World │ Resume │  │
//! │  └────────────┘   └───────────────────────┘  │
//! │         │                    │                │
//! │         ▼                    ▼                │
//! │  ┌────────────┐   ┌───────────────────────┐  │
//! │  │  Triggers  │──▶│ Tasks (Wait/Done)     │  │
//! │  └────────────┘   └───────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use fso_sim::*;
//!
//! let mut kernel = Kernel::new(my_world);
//! let id = kernel.spawn(MyTask::default());
//! let output: u32 = kernel.run_task(id)?;
//! ```

pub mod condition;
pub mod error;
pub mod kernel;
pub mod queue;

pub use condition::{Condition, TaskId, TimerId, Trigger, Wake};
pub use error::{SimError, SimResult};
pub use kernel::{DEFAULT_EVENT_BUDGET, Kernel, KernelEvent, Step, Task, TaskContext, World, WorldContext};
pub use queue::EventQueue;
