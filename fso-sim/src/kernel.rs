//! Kernel de eventos discretos e tabela de tarefas
//!
//! Um único thread, sem preempção: uma tarefa só é suspensa quando devolve
//! [`Step::Wait`] e só é retomada quando sua [`Condition`] é satisfeita.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};

use fso_core::{SimDuration, SimTime};
use tracing::trace;

use crate::condition::{Condition, TaskId, TimerId, Trigger, Wake};
use crate::error::SimError;
use crate::queue::EventQueue;

/// Orçamento padrão de eventos por execução
pub const DEFAULT_EVENT_BUDGET: u64 = 1_000_000;

/// Evento interno do kernel
pub enum KernelEvent<E> {
    Timer(TimerId),
    World(E),
    Resume(TaskId),
}

/// Estado compartilhado simulado (rede, nós, canais)
pub trait World {
    type Event;
    type Error: From<SimError>;

    /// Processa um evento agendado
    fn handle(
        &mut self,
        event: Self::Event,
        cx: &mut WorldContext<'_, Self::Event>,
    ) -> Result<(), Self::Error>;
}

/// Acesso do mundo ao relógio, à fila e aos triggers
pub struct WorldContext<'a, E> {
    now: SimTime,
    queue: &'a mut EventQueue<KernelEvent<E>>,
    fired: &'a mut Vec<Trigger>,
}

impl<E> WorldContext<'_, E> {
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Agenda evento do mundo após `delay`
    pub fn schedule(&mut self, delay: SimDuration, event: E) {
        self.queue.push(self.now + delay, KernelEvent::World(event));
    }

    /// Dispara trigger (processado ao fim do handler)
    pub fn fire(&mut self, trigger: Trigger) {
        self.fired.push(trigger);
    }
}

/// Resultado de uma retomada
#[derive(Debug)]
pub enum Step<O> {
    Wait(Condition),
    Done(O),
}

/// Máquina de estados cooperativa
pub trait Task<W: World> {
    type Output: 'static;

    fn resume(
        &mut self,
        cx: &mut TaskContext<'_, W>,
        wake: &Wake,
    ) -> Result<Step<Self::Output>, W::Error>;

    fn label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

trait ErasedTask<W: World> {
    fn resume_erased(
        &mut self,
        cx: &mut TaskContext<'_, W>,
        wake: &Wake,
    ) -> Result<Step<Box<dyn Any>>, W::Error>;

    fn label(&self) -> &'static str;
}

impl<W: World, T: Task<W>> ErasedTask<W> for T {
    fn resume_erased(
        &mut self,
        cx: &mut TaskContext<'_, W>,
        wake: &Wake,
    ) -> Result<Step<Box<dyn Any>>, W::Error> {
        Ok(match self.resume(cx, wake)? {
            Step::Wait(condition) => Step::Wait(condition),
            Step::Done(output) => Step::Done(Box::new(output)),
        })
    }

    fn label(&self) -> &'static str {
        Task::label(self)
    }
}

enum SlotState {
    Scheduled,
    Running,
    Waiting {
        condition: Condition,
        fired: BTreeSet<Trigger>,
    },
}

struct Slot<W: World> {
    task: Option<Box<dyn ErasedTask<W>>>,
    state: SlotState,
    wake: BTreeSet<Trigger>,
}

struct Core<W: World> {
    now: SimTime,
    queue: EventQueue<KernelEvent<W::Event>>,
    slots: BTreeMap<TaskId, Slot<W>>,
    waiting: BTreeMap<Trigger, BTreeSet<TaskId>>,
    finished: BTreeSet<TaskId>,
    outputs: BTreeMap<TaskId, Box<dyn Any>>,
    fired: Vec<Trigger>,
    next_task: u64,
    next_timer: u64,
}

impl<W: World> Core<W> {
    fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            queue: EventQueue::new(),
            slots: BTreeMap::new(),
            waiting: BTreeMap::new(),
            finished: BTreeSet::new(),
            outputs: BTreeMap::new(),
            fired: Vec::new(),
            next_task: 0,
            next_timer: 0,
        }
    }

    fn spawn(&mut self, task: Box<dyn ErasedTask<W>>) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        trace!(task = %id, label = task.label(), "spawned");
        self.slots.insert(
            id,
            Slot {
                task: Some(task),
                state: SlotState::Scheduled,
                wake: BTreeSet::new(),
            },
        );
        self.queue.push(self.now, KernelEvent::Resume(id));
        id
    }

    fn start_timer(&mut self, delay: SimDuration) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.queue.push(self.now + delay, KernelEvent::Timer(id));
        id
    }

    fn take_output<O: 'static>(&mut self, id: TaskId) -> Result<O, SimError> {
        let output = self.outputs.remove(&id).ok_or(SimError::UnknownTask(id))?;
        output
            .downcast::<O>()
            .map(|boxed| *boxed)
            .map_err(|_| SimError::OutputType(id))
    }

    /// Entrega trigger às tarefas que o aguardam agora
    fn fire(&mut self, trigger: Trigger) {
        let Some(ids) = self.waiting.get(&trigger).cloned() else {
            return;
        };
        for id in ids {
            let satisfied = match self.slots.get_mut(&id).map(|slot| &mut slot.state) {
                Some(SlotState::Waiting { condition, fired }) => {
                    fired.insert(trigger.clone());
                    condition.is_satisfied(fired)
                }
                _ => false,
            };
            if satisfied {
                self.wake(id);
            }
        }
    }

    fn flush_fired(&mut self) {
        while !self.fired.is_empty() {
            for trigger in std::mem::take(&mut self.fired) {
                self.fire(trigger);
            }
        }
    }

    fn wake(&mut self, id: TaskId) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if !matches!(slot.state, SlotState::Waiting { .. }) {
            return;
        }
        let SlotState::Waiting { condition, fired } =
            std::mem::replace(&mut slot.state, SlotState::Scheduled)
        else {
            return;
        };
        slot.wake = fired;
        for trigger in condition.triggers() {
            if let Some(set) = self.waiting.get_mut(&trigger) {
                set.remove(&id);
                if set.is_empty() {
                    self.waiting.remove(&trigger);
                }
            }
        }
        self.queue.push(self.now, KernelEvent::Resume(id));
    }

    fn park(&mut self, id: TaskId, condition: Condition) {
        let triggers = condition.triggers();
        // Finished é persistente: tarefa já concluída conta como disparada
        let fired: BTreeSet<Trigger> = triggers
            .iter()
            .filter(|t| matches!(t, Trigger::Finished(task) if self.finished.contains(task)))
            .cloned()
            .collect();

        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if condition.is_satisfied(&fired) {
            slot.wake = fired;
            slot.state = SlotState::Scheduled;
            self.queue.push(self.now, KernelEvent::Resume(id));
            return;
        }
        slot.state = SlotState::Waiting { condition, fired };
        for trigger in triggers {
            self.waiting.entry(trigger).or_default().insert(id);
        }
    }
}

/// Acesso de uma tarefa em execução ao kernel e ao mundo
pub struct TaskContext<'a, W: World> {
    world: &'a mut W,
    core: &'a mut Core<W>,
    current: TaskId,
}

impl<W: World> TaskContext<'_, W> {
    pub fn now(&self) -> SimTime {
        self.core.now
    }

    /// Tarefa em execução
    pub fn current(&self) -> TaskId {
        self.current
    }

    pub fn world(&self) -> &W {
        &*self.world
    }

    /// Cria tarefa filha (primeira retomada no instante atual)
    pub fn spawn<T>(&mut self, task: T) -> TaskId
    where
        T: Task<W> + 'static,
    {
        self.core.spawn(Box::new(task))
    }

    pub fn start_timer(&mut self, delay: SimDuration) -> TimerId {
        self.core.start_timer(delay)
    }

    pub fn is_finished(&self, task: TaskId) -> bool {
        self.core.finished.contains(&task)
    }

    /// Recolhe a saída de uma tarefa concluída
    pub fn take_output<O: 'static>(&mut self, task: TaskId) -> Result<O, SimError> {
        self.core.take_output(task)
    }

    /// Executa ação síncrona sobre o mundo
    ///
    /// Triggers disparados pela ação são entregues antes do retorno.
    pub fn act<R>(&mut self, f: impl FnOnce(&mut W, &mut WorldContext<'_, W::Event>) -> R) -> R {
        let mut cx = WorldContext {
            now: self.core.now,
            queue: &mut self.core.queue,
            fired: &mut self.core.fired,
        };
        let result = f(&mut *self.world, &mut cx);
        self.core.flush_fired();
        result
    }
}

/// Kernel de simulação
pub struct Kernel<W: World> {
    world: W,
    core: Core<W>,
    max_events: u64,
}

impl<W: World> Kernel<W> {
    pub fn new(world: W) -> Self {
        Self {
            world,
            core: Core::new(),
            max_events: DEFAULT_EVENT_BUDGET,
        }
    }

    /// Define orçamento de eventos por execução
    pub fn with_event_budget(mut self, max_events: u64) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn now(&self) -> SimTime {
        self.core.now
    }

    pub fn pending_events(&self) -> usize {
        self.core.queue.len()
    }

    pub fn spawn<T>(&mut self, task: T) -> TaskId
    where
        T: Task<W> + 'static,
    {
        self.core.spawn(Box::new(task))
    }

    /// Injeta evento do mundo após `delay`
    pub fn schedule(&mut self, delay: SimDuration, event: W::Event) {
        self.core
            .queue
            .push(self.core.now + delay, KernelEvent::World(event));
    }

    pub fn is_finished(&self, task: TaskId) -> bool {
        self.core.finished.contains(&task)
    }

    pub fn take_output<O: 'static>(&mut self, task: TaskId) -> Result<O, SimError> {
        self.core.take_output(task)
    }

    /// Processa um evento; `false` quando a fila está vazia
    pub fn step(&mut self) -> Result<bool, W::Error> {
        let Some((at, event)) = self.core.queue.pop() else {
            return Ok(false);
        };
        self.core.now = self.core.now.max(at);
        match event {
            KernelEvent::Timer(id) => {
                trace!(timer = %id, now = %self.core.now, "timer expired");
                self.core.fire(Trigger::Timer(id));
            }
            KernelEvent::World(event) => {
                let mut cx = WorldContext {
                    now: self.core.now,
                    queue: &mut self.core.queue,
                    fired: &mut self.core.fired,
                };
                self.world.handle(event, &mut cx)?;
                self.core.flush_fired();
            }
            KernelEvent::Resume(id) => self.resume(id)?,
        }
        Ok(true)
    }

    fn resume(&mut self, id: TaskId) -> Result<(), W::Error> {
        let (mut task, wake) = {
            let slot = self
                .core
                .slots
                .get_mut(&id)
                .ok_or(SimError::UnknownTask(id))?;
            if !matches!(slot.state, SlotState::Scheduled) {
                return Ok(());
            }
            let task = slot.task.take().ok_or(SimError::Reentrant(id))?;
            slot.state = SlotState::Running;
            (task, Wake::new(std::mem::take(&mut slot.wake)))
        };

        let step = {
            let mut cx = TaskContext {
                world: &mut self.world,
                core: &mut self.core,
                current: id,
            };
            task.resume_erased(&mut cx, &wake)?
        };

        match step {
            Step::Wait(condition) => {
                if let Some(slot) = self.core.slots.get_mut(&id) {
                    slot.task = Some(task);
                }
                self.core.park(id, condition);
            }
            Step::Done(output) => {
                trace!(task = %id, label = task.label(), now = %self.core.now, "finished");
                self.core.slots.remove(&id);
                self.core.finished.insert(id);
                self.core.outputs.insert(id, output);
                self.core.fire(Trigger::Finished(id));
            }
        }
        Ok(())
    }

    /// Executa até a tarefa terminar e devolve sua saída
    pub fn run_task<O: 'static>(&mut self, id: TaskId) -> Result<O, W::Error> {
        let mut processed = 0u64;
        loop {
            if self.core.outputs.contains_key(&id) {
                return Ok(self.core.take_output(id)?);
            }
            if !self.core.slots.contains_key(&id) {
                return Err(SimError::UnknownTask(id).into());
            }
            if processed >= self.max_events {
                return Err(SimError::EventBudgetExhausted {
                    limit: self.max_events,
                }
                .into());
            }
            if !self.step()? {
                return Err(SimError::Stalled {
                    task: id,
                    now: self.core.now,
                }
                .into());
            }
            processed += 1;
        }
    }

    /// Cria a tarefa e executa até sua conclusão
    pub fn run<T>(&mut self, task: T) -> Result<T::Output, W::Error>
    where
        T: Task<W> + 'static,
    {
        let id = self.spawn(task);
        self.run_task(id)
    }

    /// Esvazia a fila de eventos
    pub fn run_until_idle(&mut self) -> Result<u64, W::Error> {
        let mut processed = 0u64;
        while processed < self.max_events {
            if !self.step()? {
                return Ok(processed);
            }
            processed += 1;
        }
        Err(SimError::EventBudgetExhausted {
            limit: self.max_events,
        }
        .into())
    }
}
