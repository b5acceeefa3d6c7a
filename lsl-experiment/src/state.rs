//! Names participants give to the latent states they discover, per context.
//!
//! Each context has a fixed table of candidate names; the first `assigned` of them have
//! been handed out. The allocation is an ordinary value passed to whoever needs it, so
//! concurrent sessions never share counters.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExpResult, ExperimentError, invalid};
use crate::shuffle::{Shuffled, shuffle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStates {
    pub names: Vec<String>,
    #[serde(default)]
    pub assigned: usize,
}

impl ContextStates {
    pub fn new(names: Vec<String>) -> Self {
        Self { names, assigned: 0 }
    }

    pub fn assigned_names(&self) -> &[String] {
        &self.names[..self.assigned.min(self.names.len())]
    }
}

/// Buttons shown for one state-estimation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChoices {
    pub context: usize,
    pub shuffled: Shuffled<String>,
    /// Trailing button that allocates a fresh name.
    pub new_option: Option<String>,
}

impl StateChoices {
    /// Button labels in display order.
    pub fn labels(&self) -> Vec<String> {
        self.shuffled
            .display_order
            .iter()
            .cloned()
            .chain(self.new_option.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shuffled.len() + usize::from(self.new_option.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display index of the button naming `state`, if listed.
    pub fn position_of(&self, state: &str) -> Option<usize> {
        self.shuffled.display_order.iter().position(|s| s == state)
    }

    pub fn new_option_index(&self) -> Option<usize> {
        self.new_option.as_ref().map(|_| self.shuffled.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEstimate {
    pub estimated_state: String,
    pub new_state: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateAllocation {
    contexts: Vec<ContextStates>,
}

impl StateAllocation {
    pub fn new(tables: Vec<Vec<String>>) -> Self {
        Self {
            contexts: tables.into_iter().map(ContextStates::new).collect(),
        }
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    pub fn context(&self, context: usize) -> ExpResult<&ContextStates> {
        match self.contexts.get(context) {
            Some(c) => Ok(c),
            None => invalid(format!("unknown state context {context}")),
        }
    }

    fn context_mut(&mut self, context: usize) -> ExpResult<&mut ContextStates> {
        match self.contexts.get_mut(context) {
            Some(c) => Ok(c),
            None => invalid(format!("unknown state context {context}")),
        }
    }

    pub fn assigned(&self, context: usize) -> ExpResult<&[String]> {
        Ok(self.context(context)?.assigned_names())
    }

    /// Hands out the next unused name of `context`.
    pub fn allocate(&mut self, context: usize) -> ExpResult<String> {
        let states = self.context_mut(context)?;
        let Some(name) = states.names.get(states.assigned).cloned() else {
            return Err(ExperimentError::StatesExhausted { context });
        };
        states.assigned += 1;
        debug!(context, name = %name, assigned = states.assigned, "allocated state name");
        Ok(name)
    }

    /// Assigned names of `context` in random order, plus `new_label` when given.
    pub fn present_choices<R: Rng + ?Sized>(
        &self,
        context: usize,
        new_label: Option<&str>,
        rng: &mut R,
    ) -> ExpResult<StateChoices> {
        let shuffled = shuffle(self.assigned(context)?, rng);
        Ok(StateChoices {
            context,
            shuffled,
            new_option: new_label.map(str::to_owned),
        })
    }

    /// Turns the button pressed (display index) into a state estimate, allocating a new
    /// name when the participant asked for one.
    pub fn resolve(&mut self, choices: &StateChoices, response: usize) -> ExpResult<StateEstimate> {
        if let Some(original) = choices.shuffled.original_index(response) {
            let states = self.context(choices.context)?;
            return match states.assigned_names().get(original) {
                Some(name) => Ok(StateEstimate {
                    estimated_state: name.clone(),
                    new_state: false,
                }),
                None => invalid(format!(
                    "choice {original} is not an assigned state of context {}",
                    choices.context
                )),
            };
        }
        if choices.new_option_index() == Some(response) {
            let name = self.allocate(choices.context)?;
            return Ok(StateEstimate {
                estimated_state: name,
                new_state: true,
            });
        }
        invalid(format!(
            "response {response} out of range for {} choices",
            choices.len()
        ))
    }

    /// Makes `target` hold every name assigned in `sources`, in order, all assigned.
    pub fn combine(&mut self, target: usize, sources: &[usize]) -> ExpResult<()> {
        let mut names = Vec::new();
        for &source in sources {
            names.extend_from_slice(self.assigned(source)?);
        }
        let states = self.context_mut(target)?;
        states.assigned = names.len();
        states.names = names;
        debug!(target, assigned = states.assigned, "combined state tables");
        Ok(())
    }
}
