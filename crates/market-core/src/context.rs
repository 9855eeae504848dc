//! Agent Context
//!
//! Holds the locally visible agents of one partition in an ECS world.
//! Agents are registered once with a unique `(id, type, rank)` identity and
//! iterate in registration order.

use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::components::{AgentType, AgentUid, Consumer, LocalOrder, Producer};

/// Errors raised while registering or looking up agents
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentUid),
    #[error("agent {uid} cannot be registered as a {expected:?}")]
    TypeMismatch { uid: AgentUid, expected: AgentType },
}

/// Registry of the agents visible to this partition
pub struct AgentContext {
    world: World,
    index: HashMap<AgentUid, Entity>,
    next_order: u64,
}

impl Default for AgentContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentContext {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            index: HashMap::new(),
            next_order: 0,
        }
    }

    /// Registers a producer under `uid`
    pub fn add_producer(&mut self, uid: AgentUid, producer: Producer) -> Result<Entity, ContextError> {
        self.check_uid(uid, AgentType::Producer)?;
        let order = self.take_order();
        let entity = self.world.spawn((uid, order, producer)).id();
        self.index.insert(uid, entity);
        Ok(entity)
    }

    /// Registers a consumer under `uid`
    pub fn add_consumer(&mut self, uid: AgentUid, consumer: Consumer) -> Result<Entity, ContextError> {
        self.check_uid(uid, AgentType::Consumer)?;
        let order = self.take_order();
        let entity = self.world.spawn((uid, order, consumer)).id();
        self.index.insert(uid, entity);
        Ok(entity)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, uid: &AgentUid) -> bool {
        self.index.contains_key(uid)
    }

    /// Identities of registered agents in registration order, optionally
    /// restricted to one agent type.
    pub fn agents(&mut self, filter: Option<AgentType>) -> Vec<AgentUid> {
        let mut query = self.world.query::<(&AgentUid, &LocalOrder)>();
        let mut found: Vec<(LocalOrder, AgentUid)> = query
            .iter(&self.world)
            .filter(|(uid, _)| filter.map_or(true, |kind| uid.agent_type == kind))
            .map(|(uid, order)| (*order, *uid))
            .collect();
        found.sort_by_key(|(order, _)| *order);
        found.into_iter().map(|(_, uid)| uid).collect()
    }

    pub fn producer(&self, uid: &AgentUid) -> Option<&Producer> {
        self.index
            .get(uid)
            .and_then(|entity| self.world.get::<Producer>(*entity))
    }

    pub fn consumer(&self, uid: &AgentUid) -> Option<&Consumer> {
        self.index
            .get(uid)
            .and_then(|entity| self.world.get::<Consumer>(*entity))
    }

    /// Producers in registration order
    pub fn producers(&mut self) -> Vec<(AgentUid, &Producer)> {
        let mut query = self.world.query::<(&AgentUid, &LocalOrder, &Producer)>();
        let mut found: Vec<_> = query.iter(&self.world).collect();
        found.sort_by_key(|(_, order, _)| **order);
        found
            .into_iter()
            .map(|(uid, _, producer)| (*uid, producer))
            .collect()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    fn check_uid(&self, uid: AgentUid, expected: AgentType) -> Result<(), ContextError> {
        if uid.agent_type != expected {
            return Err(ContextError::TypeMismatch { uid, expected });
        }
        if self.index.contains_key(&uid) {
            return Err(ContextError::DuplicateAgent(uid));
        }
        Ok(())
    }

    fn take_order(&mut self) -> LocalOrder {
        let order = LocalOrder(self.next_order);
        self.next_order += 1;
        order
    }
}
