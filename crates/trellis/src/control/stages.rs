//! Ordered property-change stages.
//!
//! A control's response to a property change is a fixed list of stages run
//! in order. The first stage is always [`base_property_stage`], so shared
//! behavior is settled before a concrete control layers its own on top.
//! Each stage is a plain function and can be called on its own.
//!
//! ```ignore
//! static STAGES: LazyLock<PropertyStages<MyControl>> =
//!     LazyLock::new(|| PropertyStages::new().then("my-control", my_stage));
//! ```

use trellis_core::logging::targets;
use trellis_core::Result;

use super::{OptionControl, ENABLE};

/// A stage body.
pub type StageFn<C> = fn(&mut C, &str) -> Result<()>;

/// A named stage.
pub struct PropertyStage<C> {
    label: &'static str,
    run: StageFn<C>,
}

impl<C> PropertyStage<C> {
    /// Create a stage.
    pub fn new(label: &'static str, run: StageFn<C>) -> Self {
        Self { label, run }
    }

    /// The stage label.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Run this stage alone.
    pub fn run(&self, control: &mut C, name: &str) -> Result<()> {
        (self.run)(control, name)
    }
}

impl<C> Clone for PropertyStage<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for PropertyStage<C> {}

impl<C> std::fmt::Debug for PropertyStage<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PropertyStage").field(&self.label).finish()
    }
}

/// The stage list of one control type.
pub struct PropertyStages<C> {
    stages: Vec<PropertyStage<C>>,
}

impl<C: OptionControl> PropertyStages<C> {
    /// A list holding only the base stage.
    pub fn new() -> Self {
        Self {
            stages: vec![PropertyStage::new("base", base_property_stage::<C>)],
        }
    }

    /// Append a stage.
    pub fn then(mut self, label: &'static str, run: StageFn<C>) -> Self {
        self.stages.push(PropertyStage::new(label, run));
        self
    }
}

impl<C: OptionControl> Default for PropertyStages<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> PropertyStages<C> {
    /// Stage labels in run order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.stages.iter().map(PropertyStage::label).collect()
    }

    /// The stages in run order.
    pub fn stages(&self) -> &[PropertyStage<C>] {
        &self.stages
    }

    /// Run every stage in order, stopping at the first error.
    pub fn dispatch(&self, control: &mut C, name: &str) -> Result<()> {
        for stage in &self.stages {
            tracing::trace!(target: targets::CONTROL, stage = stage.label, property = name, "running property stage");
            stage.run(control, name)?;
        }
        Ok(())
    }
}

impl<C> std::fmt::Debug for PropertyStages<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.stages).finish()
    }
}

/// Shared first stage.
///
/// Fails with [`UnregisteredProperty`](trellis_core::TrellisError::UnregisteredProperty)
/// for a name the control never registered, and refreshes the cached
/// enabled state when `enable` changes.
pub fn base_property_stage<C: OptionControl>(control: &mut C, name: &str) -> Result<()> {
    let base = control.base_mut();
    base.property(name)?;
    if name == ENABLE {
        base.refresh_enabled()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlContext, OptionControlBase, RenderResult};
    use crate::grid::GridLayout;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use trellis_core::{PropertyStore, TrellisError};

    struct Probe {
        base: OptionControlBase,
        seen: Vec<(String, bool)>,
    }

    impl OptionControl for Probe {
        fn base(&self) -> &OptionControlBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut OptionControlBase {
            &mut self.base
        }

        fn on_render_to_grid(
            &mut self,
            _grid: &mut dyn GridLayout,
            _row: usize,
            _column: usize,
        ) -> Result<RenderResult> {
            Ok(RenderResult {
                height: 1,
                width: 1,
            })
        }

        fn on_option_value_changed(&mut self, _key: &[String], _data: &Value) -> Result<()> {
            Ok(())
        }

        fn on_property_changed(&mut self, name: &str) -> Result<()> {
            probe_stages().dispatch(self, name)
        }

        fn is_rendered(&self) -> bool {
            false
        }

        fn detach(&mut self) {}
    }

    fn record(probe: &mut Probe, name: &str) -> Result<()> {
        // The base stage has already refreshed the enabled flag.
        let enabled = probe.base.is_enabled();
        probe.seen.push((name.to_string(), enabled));
        Ok(())
    }

    fn probe_stages() -> PropertyStages<Probe> {
        PropertyStages::new().then("probe", record)
    }

    fn probe() -> (Probe, Arc<PropertyStore>) {
        let store = Arc::new(PropertyStore::new(
            OptionControlBase::schema().unwrap(),
            "colour",
        ));
        let base = OptionControlBase::new(store.clone(), ControlContext::default()).unwrap();
        (
            Probe {
                base,
                seen: Vec::new(),
            },
            store,
        )
    }

    #[test]
    fn test_base_stage_runs_first() {
        assert_eq!(probe_stages().labels(), vec!["base", "probe"]);

        let (mut probe, store) = probe();
        store.set(ENABLE, json!(false)).unwrap();
        probe.on_property_changed(ENABLE).unwrap();

        assert_eq!(probe.seen, vec![(ENABLE.to_string(), false)]);
    }

    #[test]
    fn test_unregistered_name_stops_dispatch() {
        let (mut probe, _store) = probe();
        let err = probe.on_property_changed("colour").unwrap_err();

        assert_eq!(err, TrellisError::unregistered("colour"));
        assert!(probe.seen.is_empty());
    }

    #[test]
    fn test_stage_runs_in_isolation() {
        let (mut probe, _store) = probe();
        let stages = probe_stages();
        stages.stages()[1].run(&mut probe, "label").unwrap();

        assert_eq!(probe.seen, vec![("label".to_string(), true)]);
    }
}
