//! Extension points of the [`Workflow`](crate::graph::Workflow) orchestrator.
//!
//! A plugin implements only the hooks it cares about; every hook has a no-op
//! default. Plugins never see each other. They talk to the host through the
//! workflow's event hub, using the [`PluginHooks`] handles they are given at
//! construction time.

use crate::events::GraphEvent;
use crate::graph::WeakWorkflow;
use crate::graph::workflow::WorkflowCore;
use serde_json::Value;
use std::rc::Weak;
use tracing::warn;

/// Lifecycle hooks a workflow invokes on its plugins, in plugin order.
pub trait Plugin {
    /// Called once, before the first draw.
    fn register_workflow(&mut self, _workflow: WeakWorkflow) {}

    /// Receives the emitter for `beforeChange`.
    fn register_on_before_change(&mut self, _hooks: PluginHooks) {}

    /// Receives the emitter for `afterChange`.
    fn register_on_after_change(&mut self, _hooks: PluginHooks) {}

    /// Receives the emitter for `afterRender`.
    fn register_on_after_render(&mut self, _hooks: PluginHooks) {}

    /// The workflow was bound to a different model.
    fn after_model_change(&mut self) {}

    /// A full draw finished, or another plugin announced a render.
    fn after_render(&mut self) {}

    fn on_editable_state_change(&mut self, _enabled: bool) {}

    fn destroy(&mut self) {}
}

/// Emits one lifecycle event on the owning workflow's hub.
///
/// Emitting `afterRender` also runs every plugin's [`Plugin::after_render`]
/// hook. The plugin currently emitting is skipped, since it is already busy.
#[derive(Clone)]
pub struct PluginHooks {
    core: Weak<WorkflowCore>,
    event: GraphEvent,
}

impl PluginHooks {
    pub(crate) fn new(core: Weak<WorkflowCore>, event: GraphEvent) -> Self {
        Self { core, event }
    }

    pub fn event(&self) -> GraphEvent {
        self.event
    }

    /// Publishes `payload`. Does nothing once the workflow is gone or destroyed.
    pub fn emit(&self, payload: &Value) {
        let Some(core) = self.core.upgrade() else {
            return;
        };
        if core.is_destroyed() {
            return;
        }
        if let Err(e) = core.hub().emit(self.event, payload) {
            warn!(event = %self.event, error = %e, "plugin emitted an event the hub refused");
        }
        if self.event == GraphEvent::AfterRender {
            core.invoke_plugins("after_render", |plugin| plugin.after_render());
        }
    }
}
