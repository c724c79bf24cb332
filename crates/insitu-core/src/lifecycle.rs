//! Process lifecycle flags.

/// Monotonic lifecycle flags for one in-situ session.
///
/// Each flag has exactly one writer and is never cleared within a run:
///
/// - `runtime_initialized`: set once the embedded runtime is up and the
///   analysis script is loaded.
/// - `parameters_set`: set by the first parameter-setting phase; requires
///   `runtime_initialized`.
/// - `particle_pointer_released`: set when the species list has been
///   handed to the simulation; requires `parameters_set`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifecycleState {
    runtime_initialized: bool,
    parameters_set: bool,
    particle_pointer_released: bool,
}

impl LifecycleState {
    /// Whether the embedded runtime has been initialized.
    pub fn runtime_initialized(&self) -> bool {
        self.runtime_initialized
    }

    /// Whether the parameter-setting phase has completed at least once.
    pub fn parameters_set(&self) -> bool {
        self.parameters_set
    }

    /// Whether the particle species list has been handed out.
    pub fn particle_pointer_released(&self) -> bool {
        self.particle_pointer_released
    }

    pub(crate) fn mark_runtime_initialized(&mut self) {
        self.runtime_initialized = true;
    }

    pub(crate) fn mark_parameters_set(&mut self) {
        debug_assert!(self.runtime_initialized);
        self.parameters_set = true;
    }

    pub(crate) fn mark_particle_pointer_released(&mut self) {
        debug_assert!(self.parameters_set);
        self.particle_pointer_released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_all_flags_clear() {
        let s = LifecycleState::default();
        assert!(!s.runtime_initialized());
        assert!(!s.parameters_set());
        assert!(!s.particle_pointer_released());
    }

    #[test]
    fn flags_stay_set() {
        let mut s = LifecycleState::default();
        s.mark_runtime_initialized();
        s.mark_parameters_set();
        s.mark_particle_pointer_released();
        s.mark_runtime_initialized();
        assert!(s.runtime_initialized());
        assert!(s.parameters_set());
        assert!(s.particle_pointer_released());
    }
}
