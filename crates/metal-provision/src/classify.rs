use crate::types::ServerState;

/// Map a raw provider state onto [`ServerState`].
///
/// Unknown states count as still in progress; the provider adds transient
/// substates over time and none of them should abort a provision.
pub fn classify(raw: &str) -> ServerState {
    match raw {
        "failed" | "deprovisioning" | "deleted" => ServerState::Failed,
        "active" => ServerState::Active,
        _ => ServerState::Pending,
    }
}
