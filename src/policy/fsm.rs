//! Static finite-state-machine metadata for behavior policy models.
//!
//! Each model exposes the transitions the gateway accepts. A `TRANSITION`
//! node is only valid if its `(event, from, to)` triple appears here.

use serde::{Deserialize, Serialize};

use events::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorPolicyType {
    #[serde(rename = "Mqtt.events")]
    MqttEvent,
    #[serde(rename = "Publish.duplicate")]
    PublishDuplicate,
    #[serde(rename = "Publish.quota")]
    PublishQuota,
}

impl BehaviorPolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorPolicyType::MqttEvent => "Mqtt.events",
            BehaviorPolicyType::PublishDuplicate => "Publish.duplicate",
            BehaviorPolicyType::PublishQuota => "Publish.quota",
        }
    }
}

impl std::fmt::Display for BehaviorPolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod events {
    pub const ON_INBOUND_CONNECT: &str = "Mqtt.OnInboundConnect";
    pub const ON_INBOUND_PUBLISH: &str = "Mqtt.OnInboundPublish";
    pub const ON_INBOUND_SUBSCRIBE: &str = "Mqtt.OnInboundSubscribe";
    pub const ON_INBOUND_DISCONNECT: &str = "Mqtt.OnInboundDisconnect";
    pub const ON_DISCONNECT: &str = "Connection.OnDisconnect";
    pub const ON_ANY: &str = "Event.OnAny";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateKind {
    Initial,
    Intermediate,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FsmState {
    pub name: &'static str,
    pub kind: StateKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FsmTransition {
    pub event: &'static str,
    pub from_state: &'static str,
    pub to_state: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FiniteStateMachine {
    pub model: BehaviorPolicyType,
    pub states: &'static [FsmState],
    pub transitions: &'static [FsmTransition],
}

impl FiniteStateMachine {
    pub fn find(&self, event: &str, from: &str, to: &str) -> Option<&'static FsmTransition> {
        self.transitions
            .iter()
            .find(|t| t.event == event && t.from_state == from && t.to_state == to)
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.transitions.iter().any(|t| t.event == event)
    }
}

const fn state(name: &'static str, kind: StateKind) -> FsmState {
    FsmState { name, kind }
}

const fn transition(
    event: &'static str,
    from_state: &'static str,
    to_state: &'static str,
) -> FsmTransition {
    FsmTransition {
        event,
        from_state,
        to_state,
    }
}

static MQTT_EVENT: FiniteStateMachine = FiniteStateMachine {
    model: BehaviorPolicyType::MqttEvent,
    states: &[
        state("Initial", StateKind::Initial),
        state("Connected", StateKind::Intermediate),
        state("Disconnected", StateKind::Success),
    ],
    transitions: &[
        transition(ON_INBOUND_CONNECT, "Initial", "Connected"),
        transition(ON_INBOUND_PUBLISH, "Connected", "Connected"),
        transition(ON_INBOUND_SUBSCRIBE, "Connected", "Connected"),
        transition(ON_INBOUND_DISCONNECT, "Connected", "Disconnected"),
        transition(ON_DISCONNECT, "Connected", "Disconnected"),
        transition(ON_ANY, "Any.*", "Any.*"),
    ],
};

static PUBLISH_DUPLICATE: FiniteStateMachine = FiniteStateMachine {
    model: BehaviorPolicyType::PublishDuplicate,
    states: &[
        state("Initial", StateKind::Initial),
        state("Connected", StateKind::Intermediate),
        state("NotDuplicated", StateKind::Intermediate),
        state("Duplicated", StateKind::Intermediate),
        state("Violated", StateKind::Failed),
        state("Disconnected", StateKind::Success),
    ],
    transitions: &[
        transition(ON_INBOUND_CONNECT, "Initial", "Connected"),
        transition(ON_INBOUND_PUBLISH, "Connected", "NotDuplicated"),
        transition(ON_INBOUND_PUBLISH, "NotDuplicated", "NotDuplicated"),
        transition(ON_INBOUND_PUBLISH, "NotDuplicated", "Duplicated"),
        transition(ON_INBOUND_PUBLISH, "Duplicated", "NotDuplicated"),
        transition(ON_INBOUND_PUBLISH, "Duplicated", "Duplicated"),
        transition(ON_INBOUND_DISCONNECT, "Connected", "Disconnected"),
        transition(ON_INBOUND_DISCONNECT, "NotDuplicated", "Disconnected"),
        transition(ON_INBOUND_DISCONNECT, "Duplicated", "Disconnected"),
        transition(ON_DISCONNECT, "Connected", "Violated"),
        transition(ON_DISCONNECT, "NotDuplicated", "Violated"),
        transition(ON_DISCONNECT, "Duplicated", "Violated"),
        transition(ON_ANY, "Any.*", "Any.*"),
    ],
};

static PUBLISH_QUOTA: FiniteStateMachine = FiniteStateMachine {
    model: BehaviorPolicyType::PublishQuota,
    states: &[
        state("Initial", StateKind::Initial),
        state("Connected", StateKind::Intermediate),
        state("Publishing", StateKind::Intermediate),
        state("Violated", StateKind::Failed),
        state("Disconnected", StateKind::Success),
    ],
    transitions: &[
        transition(ON_INBOUND_CONNECT, "Initial", "Connected"),
        transition(ON_INBOUND_PUBLISH, "Connected", "Publishing"),
        transition(ON_INBOUND_PUBLISH, "Publishing", "Publishing"),
        transition(ON_INBOUND_PUBLISH, "Publishing", "Violated"),
        transition(ON_INBOUND_DISCONNECT, "Connected", "Disconnected"),
        transition(ON_INBOUND_DISCONNECT, "Publishing", "Disconnected"),
        transition(ON_DISCONNECT, "Connected", "Violated"),
        transition(ON_DISCONNECT, "Publishing", "Violated"),
        transition(ON_ANY, "Any.*", "Any.*"),
    ],
};

/// Transition table for `model`.
pub fn state_machine(model: BehaviorPolicyType) -> &'static FiniteStateMachine {
    match model {
        BehaviorPolicyType::MqttEvent => &MQTT_EVENT,
        BehaviorPolicyType::PublishDuplicate => &PUBLISH_DUPLICATE,
        BehaviorPolicyType::PublishQuota => &PUBLISH_QUOTA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_starts_from_initial() {
        for model in [
            BehaviorPolicyType::MqttEvent,
            BehaviorPolicyType::PublishDuplicate,
            BehaviorPolicyType::PublishQuota,
        ] {
            let fsm = state_machine(model);
            assert_eq!(fsm.model, model);
            assert!(
                fsm.find(ON_INBOUND_CONNECT, "Initial", "Connected").is_some(),
                "{} has no connect transition",
                model
            );
        }
    }

    #[test]
    fn transitions_only_reference_declared_states() {
        for fsm in [&MQTT_EVENT, &PUBLISH_DUPLICATE, &PUBLISH_QUOTA] {
            for t in fsm.transitions.iter().filter(|t| t.event != ON_ANY) {
                for name in [t.from_state, t.to_state] {
                    assert!(
                        fsm.states.iter().any(|s| s.name == name),
                        "{}: unknown state {}",
                        fsm.model,
                        name
                    );
                }
            }
        }
    }

    #[test]
    fn duplicate_model_rejects_quota_states() {
        let fsm = state_machine(BehaviorPolicyType::PublishDuplicate);
        assert!(fsm.find(ON_INBOUND_PUBLISH, "Connected", "Publishing").is_none());
        assert!(fsm.has_event(ON_DISCONNECT));
    }
}
