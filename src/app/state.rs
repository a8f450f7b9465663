use super::{ComponentState, GalleryApp};
use std::collections::HashMap;
use tracing::debug;

impl GalleryApp {
    /// Record a component's lifecycle state, returning the previous one
    pub async fn set_component_state(
        &self,
        component: &str,
        state: ComponentState,
    ) -> Option<ComponentState> {
        let mut states = self.component_states.lock().await;
        let previous = states.insert(component.to_string(), state.clone());
        if previous.as_ref() != Some(&state) {
            debug!(
                "Component '{}' state: {:?} -> {:?}",
                component, previous, state
            );
        }
        previous
    }

    pub async fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        self.component_states.lock().await.get(component).cloned()
    }

    pub async fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        self.component_states.lock().await.clone()
    }

    /// Names of the components currently in `state`, sorted
    pub async fn components_in(&self, state: ComponentState) -> Vec<String> {
        let states = self.component_states.lock().await;
        let mut names: Vec<String> = states
            .iter()
            .filter(|(_, current)| **current == state)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
