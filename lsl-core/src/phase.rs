use serde::{Deserialize, Serialize};

/// Defines session phases and what each one asks of the participant
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn next(&self) -> Option<Self>;

    /// Index into the state-name tables, `None` for phases without sorting trials.
    fn context(&self) -> Option<usize>;

    fn gives_feedback(&self) -> bool {
        false
    }

    /// Whether state estimation lists an "assign new name" option.
    fn offers_new_state(&self) -> bool {
        false
    }

    fn is_recall(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Tutorial,
    ContextOne,
    ContextTwo,
    Recall,
    Debrief,
}

impl Phase for SessionPhase {
    fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Tutorial => ContextOne,
            ContextOne => ContextTwo,
            ContextTwo => Recall,
            Recall => Debrief,
            Debrief => return None,
        })
    }

    fn context(&self) -> Option<usize> {
        use SessionPhase::*;
        match self {
            Tutorial => Some(0),
            ContextOne => Some(1),
            ContextTwo => Some(2),
            Recall => Some(3),
            Debrief => None,
        }
    }

    fn gives_feedback(&self) -> bool {
        !matches!(self, Self::Recall | Self::Debrief)
    }

    fn offers_new_state(&self) -> bool {
        matches!(self, Self::Tutorial | Self::ContextOne | Self::ContextTwo)
    }

    fn is_recall(&self) -> bool {
        matches!(self, Self::Recall)
    }
}
