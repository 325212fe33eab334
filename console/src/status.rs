use crate::types::HealthState;

/// Health verdict for one refresh cycle: Online iff the account fetch in
/// this cycle succeeded. Memoryless on purpose — a transient failure shows
/// as Disconnected for exactly one cycle and the next good fetch clears it.
/// No debounce window.
pub fn evaluate(account_fetch_ok: bool) -> HealthState {
    if account_fetch_ok {
        HealthState::Online
    } else {
        HealthState::Disconnected
    }
}
