//! Agent directory: identities and published cards, keyed by agent name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::a2a::card_check::check_card;
use crate::a2a::{AgentCard, AgentLocator, GatewayError};
use crate::agents::{AgentIdentity, AgentName};

#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub identity: Arc<AgentIdentity>,
    pub card: AgentCard,
}

impl DirectoryEntry {
    pub fn locator(&self) -> AgentLocator {
        AgentLocator {
            agent: self.identity.name,
            engine_id: self.identity.engine_id.clone(),
        }
    }
}

/// Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    entries: BTreeMap<AgentName, DirectoryEntry>,
}

impl AgentDirectory {
    /// Build the directory, rejecting duplicate agents, duplicate skill
    /// names and cards that fail the card check. Card warnings are logged.
    pub fn new<I>(identities: I) -> Result<Self, GatewayError>
    where
        I: IntoIterator<Item = Arc<AgentIdentity>>,
    {
        let mut entries = BTreeMap::new();
        for identity in identities {
            let name = identity.name;
            if let Some(skill) = identity.duplicate_skill() {
                return Err(GatewayError::Configuration(format!(
                    "agent {} declares skill '{}' more than once",
                    name, skill
                )));
            }

            let card = AgentCard::from(identity.as_ref());
            let document = serde_json::to_value(&card)
                .map_err(|e| GatewayError::Configuration(e.to_string()))?;
            let report = check_card(name.as_str(), &document);
            for warning in &report.warnings {
                log::warn!("{}", warning);
            }
            if !report.is_ok() {
                return Err(GatewayError::Configuration(report.errors.join("; ")));
            }

            if entries
                .insert(name, DirectoryEntry { identity, card })
                .is_some()
            {
                return Err(GatewayError::Configuration(format!(
                    "agent {} registered twice",
                    name
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Registered agents in listing order.
    pub fn names(&self) -> impl Iterator<Item = AgentName> + '_ {
        self.entries.keys().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.values()
    }

    pub fn get(&self, agent: AgentName) -> Option<&DirectoryEntry> {
        self.entries.get(&agent)
    }

    /// Resolve a routing name; unknown or unregistered names are NotFound.
    pub fn resolve(&self, name: &str) -> Result<&DirectoryEntry, GatewayError> {
        let agent: AgentName = name.parse()?;
        self.get(agent)
            .ok_or_else(|| GatewayError::NotFound(format!("Agent not found: {}", name)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
