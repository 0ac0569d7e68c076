//! High-level production intents and the queue that orders them

use std::collections::VecDeque;
use std::fmt;

use crate::core::types::{ResourceTypeId, UnitClass, UnitTypeId, UpgradeTypeId, Vec2i};

/// What a produce task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProduceTarget {
    /// Any producible unit of this class
    Class(UnitClass),
    Unit(UnitTypeId),
    /// A unit that gathers or generates this resource
    Resource(ResourceTypeId),
}

/// What a build task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Unit(UnitTypeId),
    /// A building that generates this resource
    Resource(ResourceTypeId),
}

/// A pending production, construction or research intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Produce(ProduceTarget),
    Build {
        target: BuildTarget,
        /// Site chosen up front (expansions); searched for when absent
        forced_pos: Option<Vec2i>,
    },
    Upgrade(UpgradeTypeId),
}

impl Task {
    pub fn produce_class(class: UnitClass) -> Self {
        Task::Produce(ProduceTarget::Class(class))
    }

    pub fn produce_unit(unit_type: UnitTypeId) -> Self {
        Task::Produce(ProduceTarget::Unit(unit_type))
    }

    pub fn produce_resource(resource: ResourceTypeId) -> Self {
        Task::Produce(ProduceTarget::Resource(resource))
    }

    pub fn build_unit(unit_type: UnitTypeId) -> Self {
        Task::Build {
            target: BuildTarget::Unit(unit_type),
            forced_pos: None,
        }
    }

    pub fn build_unit_at(unit_type: UnitTypeId, pos: Vec2i) -> Self {
        Task::Build {
            target: BuildTarget::Unit(unit_type),
            forced_pos: Some(pos),
        }
    }

    pub fn build_resource(resource: ResourceTypeId) -> Self {
        Task::Build {
            target: BuildTarget::Resource(resource),
            forced_pos: None,
        }
    }

    pub fn upgrade(upgrade: UpgradeTypeId) -> Self {
        Task::Upgrade(upgrade)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Produce(ProduceTarget::Class(class)) => write!(f, "Produce {:?}", class),
            Task::Produce(ProduceTarget::Unit(ut)) => write!(f, "Produce unit type {}", ut.0),
            Task::Produce(ProduceTarget::Resource(rt)) => {
                write!(f, "Produce for resource {}", rt.0)
            }
            Task::Build { target, forced_pos } => {
                match target {
                    BuildTarget::Unit(ut) => write!(f, "Build unit type {}", ut.0)?,
                    BuildTarget::Resource(rt) => write!(f, "Build for resource {}", rt.0)?,
                }
                if let Some(pos) = forced_pos {
                    write!(f, " at {}", pos)?;
                }
                Ok(())
            }
            Task::Upgrade(up) => write!(f, "Upgrade {}", up.0),
        }
    }
}

/// Handle identifying one queued task
///
/// Two equal tasks queued twice get distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct QueuedTask {
    id: TaskId,
    task: Task,
}

/// Ordered task list; the front is the highest priority
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    queued: VecDeque<QueuedTask>,
    next_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append at the lowest priority
    pub fn add_task(&mut self, task: Task) -> TaskId {
        let id = self.allocate();
        self.queued.push_back(QueuedTask { id, task });
        id
    }

    /// Drop every pending task and install this one alone
    pub fn add_priority_task(&mut self, task: Task) -> TaskId {
        self.queued.clear();
        self.add_task(task)
    }

    /// Front task without removing it
    pub fn get_task(&self) -> Option<(TaskId, Task)> {
        self.queued.front().map(|q| (q.id, q.task))
    }

    /// Remove a completed task; returns it when it was still queued
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.queued.iter().position(|q| q.id == id)?;
        self.queued.remove(idx).map(|q| q.task)
    }

    /// Move a task behind every other task, keeping its handle
    pub fn retry_task(&mut self, id: TaskId) -> bool {
        match self.queued.iter().position(|q| q.id == id) {
            Some(idx) => {
                if let Some(entry) = self.queued.remove(idx) {
                    self.queued.push_back(entry);
                }
                true
            }
            None => false,
        }
    }

    /// An equal task is already pending
    pub fn contains(&self, task: &Task) -> bool {
        self.queued.iter().any(|q| q.task == *task)
    }

    pub fn any_task(&self) -> bool {
        !self.queued.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Handles in priority order
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.queued.iter().map(|q| q.id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.queued.iter().map(|q| &q.task)
    }
}
