//! Agent Components
//!
//! Identity shared by every registered agent.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of agent, used to filter context iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Consumer,
    Producer,
}

/// Stable identity of an agent: `(id, type, rank)`
///
/// `rank` names the partition the agent was registered on. The core never
/// interprets it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentUid {
    pub id: u64,
    pub agent_type: AgentType,
    pub rank: u32,
}

impl AgentUid {
    pub fn consumer(id: u64, rank: u32) -> Self {
        Self {
            id,
            agent_type: AgentType::Consumer,
            rank,
        }
    }

    pub fn producer(id: u64, rank: u32) -> Self {
        Self {
            id,
            agent_type: AgentType::Producer,
            rank,
        }
    }
}

impl std::fmt::Display for AgentUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.agent_type {
            AgentType::Consumer => "consumer",
            AgentType::Producer => "producer",
        };
        write!(f, "{}:{}@{}", kind, self.id, self.rank)
    }
}

/// Position in the local registration sequence
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalOrder(pub u64);
