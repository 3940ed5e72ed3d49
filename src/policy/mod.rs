//! Compiled policy objects and the behavior model metadata.

pub mod fsm;
pub mod types;

pub use fsm::{BehaviorPolicyType, FiniteStateMachine, FsmTransition, state_machine};
pub use types::*;
