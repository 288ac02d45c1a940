//! Combobox control: a label plus a single-choice select.
//!
//! The select lists the control's `options`; choosing an item stores that
//! option's `name` as the logical value, and a new logical value moves the
//! selection to the matching item. A value that matches no option leaves
//! the selection where it was.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis::control::{ComboboxControl, ControlContext, OptionControl};
//! use trellis::grid::Grid;
//! use trellis::params::ControlParams;
//!
//! let params = ControlParams::new("colour")
//!     .with("label", json!("Colour"))
//!     .with("options", json!(["red", "green", "blue"]))
//!     .with_value(json!("green"));
//! let mut combo = ComboboxControl::from_params(params, ControlContext::default())?;
//!
//! let mut grid = Grid::new();
//! let size = combo.on_render_to_grid(&mut grid, 0, 0)?;
//! assert_eq!(size.width, 2);
//! assert_eq!(combo.input_handle().unwrap().selected_index(), Some(1));
//! # Ok::<(), trellis::TrellisError>(())
//! ```

use std::sync::{Arc, LazyLock, Weak};

use serde_json::Value;
use trellis_core::logging::{span_names, targets};
use trellis_core::{PropertyDescriptor, PropertySchema, PropertyStore, Result, TrellisError};

use super::options::{OptionEntry, OptionsListNormalizer, OPTIONS};
use super::stages::PropertyStages;
use super::{
    ControlContext, ControlHandles, OptionControl, OptionControlBase, RenderResult, ValueSetter,
    CELL, ENABLE, FORMAT, LABEL, MARGIN,
};
use crate::grid::{CellOptions, GridLayout, HorizontalAlign, Spans, VerticalAlign};
use crate::handle::{Handle, LabelHandle, SelectHandle, DISABLED_TEXT_CLASS};
use crate::params::ControlParams;

const CONTROL_NAME: &str = "combobox";

static STAGES: LazyLock<PropertyStages<ComboboxControl>> =
    LazyLock::new(|| PropertyStages::new().then(CONTROL_NAME, combobox_property_stage));

/// A combobox bound to one option.
#[derive(Debug)]
pub struct ComboboxControl {
    base: OptionControlBase,
    normalizer: OptionsListNormalizer,
    handles: ControlHandles<SelectHandle>,
}

impl ComboboxControl {
    /// Base properties plus `options` and `format`.
    pub fn schema() -> Result<PropertySchema> {
        OptionControlBase::schema()?
            .with(PropertyDescriptor::option_list(OPTIONS))?
            .with(OptionControlBase::format_descriptor())
    }

    /// Wrap `store`, which must declare every property in [`schema`](Self::schema).
    pub fn new(store: Arc<PropertyStore>, context: ControlContext) -> Result<Self> {
        store
            .schema()
            .require(CONTROL_NAME, &[LABEL, MARGIN, ENABLE, CELL, OPTIONS, FORMAT])?;
        let normalizer = OptionsListNormalizer::new(Arc::clone(&store), Arc::clone(context.translator()));
        Ok(Self {
            base: OptionControlBase::new(store, context)?,
            normalizer,
            handles: ControlHandles::default(),
        })
    }

    /// Build schema, store and control from declarative parameters.
    pub fn from_params(params: ControlParams, context: ControlContext) -> Result<Self> {
        let store = params.into_store(Self::schema()?)?;
        Self::new(Arc::new(store), context)
    }

    /// The canonical option list.
    pub fn options_property(&self) -> Result<Vec<OptionEntry>> {
        self.normalizer.options_property()
    }

    /// The label handle of the latest render, if it had one.
    pub fn label_handle(&self) -> Option<Arc<LabelHandle>> {
        self.handles.label()
    }

    /// The select handle of the latest render.
    pub fn input_handle(&self) -> Option<Arc<SelectHandle>> {
        self.handles.input()
    }

    /// Move the selection to the option matching the logical value.
    ///
    /// No match leaves the selection untouched. No-op before render.
    pub fn update_display_value(&self) -> Result<()> {
        let Some(input) = self.handles.input() else {
            return Ok(());
        };
        let options = self.options_property()?;
        sync_selection(&input, &options, &self.base.source_value());
        Ok(())
    }

    /// Rebuild the select's items from `options`, then re-sync the selection.
    ///
    /// No-op before render.
    pub fn update_options_list(&self) -> Result<()> {
        let Some(input) = self.handles.input() else {
            return Ok(());
        };
        let options = self.options_property()?;
        input.set_items(self.item_texts(&options));
        tracing::debug!(target: targets::CONTROL, count = options.len(), "rebuilt option list");
        self.update_display_value()
    }

    fn item_texts(&self, options: &[OptionEntry]) -> Vec<String> {
        options
            .iter()
            .map(|entry| self.base.translate(&entry.title))
            .collect()
    }

    fn apply_enabled(&self) {
        let enabled = self.base.is_enabled();
        if let Some(input) = self.handles.input() {
            input.set_disabled(!enabled);
        }
        if let Some(label) = self.handles.label() {
            if enabled {
                label.remove_class(DISABLED_TEXT_CLASS);
            } else {
                label.add_class(DISABLED_TEXT_CLASS);
            }
        }
    }
}

fn sync_selection(input: &SelectHandle, options: &[OptionEntry], value: &Value) -> bool {
    let Some(value) = value.as_str() else {
        return false;
    };
    match options.iter().position(|entry| entry.name == value) {
        Some(index) => {
            input.set_selected_index(Some(index));
            true
        }
        None => {
            tracing::trace!(target: targets::CONTROL, value, "value matches no option, keeping selection");
            false
        }
    }
}

/// Writes user choices to the store. A choice the store rejects is undone:
/// the selection goes back to the stored value, or is cleared when that
/// value matches no option.
fn selection_listener(
    input: Weak<SelectHandle>,
    normalizer: OptionsListNormalizer,
    setter: ValueSetter,
) -> impl Fn(&usize) + Send + Sync + 'static {
    move |&index| {
        let options = match normalizer.options_property() {
            Ok(options) => options,
            Err(err) => {
                tracing::error!(target: targets::CONTROL, %err, "failed to resolve options for selection");
                revert_selection(&input, &[], &setter.value());
                return;
            }
        };
        let stored = match options.get(index) {
            Some(entry) => setter.set(Value::String(entry.name.clone())),
            None => Err(TrellisError::invalid_value(
                OPTIONS,
                format!("selected index {index} has no option"),
            )),
        };
        if let Err(err) = stored {
            tracing::error!(target: targets::CONTROL, %err, "failed to store selection");
            revert_selection(&input, &options, &setter.value());
        }
    }
}

fn revert_selection(input: &Weak<SelectHandle>, options: &[OptionEntry], value: &Value) {
    let Some(input) = input.upgrade() else {
        return;
    };
    if !sync_selection(&input, options, value) {
        input.set_selected_index(None);
    }
}

fn combobox_property_stage(control: &mut ComboboxControl, name: &str) -> Result<()> {
    match name {
        OPTIONS => control.update_options_list(),
        ENABLE => {
            control.apply_enabled();
            Ok(())
        }
        _ => Ok(()),
    }
}

impl OptionControl for ComboboxControl {
    fn base(&self) -> &OptionControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptionControlBase {
        &mut self.base
    }

    fn on_render_to_grid(
        &mut self,
        grid: &mut dyn GridLayout,
        row: usize,
        column: usize,
    ) -> Result<RenderResult> {
        let _span = tracing::debug_span!(
            target: targets::CONTROL,
            span_names::RENDER,
            option = %self.base.store().option_name(),
            row,
            column
        )
        .entered();
        self.handles.detach();

        let label = self.base.label_text()?;
        let id = self.base.next_id("ctrl");
        let margin_class = format!("control-margin-{}", self.base.margin()?);

        let mut columns_used = 0;
        let mut label_handle = None;
        if !label.is_empty() {
            let handle = Arc::new(
                LabelHandle::new(label, &id)
                    .with_class("option-combo-label")
                    .with_class(&margin_class),
            );
            grid.add_cell(column, row, Handle::from(Arc::clone(&handle)), CellOptions::default())
                .set_alignment(HorizontalAlign::Left, VerticalAlign::Center);
            columns_used += 1;
            label_handle = Some(handle);
        }

        let options = self.options_property()?;
        let input = Arc::new(
            SelectHandle::new(&id, self.item_texts(&options))
                .with_class("option-input")
                .with_class("option-combo-input")
                .with_class(margin_class),
        );
        sync_selection(&input, &options, &self.base.source_value());

        let listener = input.activated().connect_scoped(selection_listener(
            Arc::downgrade(&input),
            self.normalizer.clone(),
            self.base.value_setter(),
        ));

        let cell_options = if columns_used == 0 && self.base.is_property_defined(CELL)? {
            CellOptions::new(Spans::new(1, 2), VerticalAlign::Center)
        } else {
            CellOptions::new(Spans::new(1, 1), VerticalAlign::Top)
        };
        grid.add_cell(column + columns_used, row, Handle::from(Arc::clone(&input)), cell_options)
            .set_alignment(HorizontalAlign::Left, VerticalAlign::Center);
        columns_used += cell_options.spans.columns;

        self.handles.replace(label_handle.as_ref(), &input, listener);
        self.base.refresh_enabled()?;
        self.apply_enabled();

        Ok(RenderResult {
            height: 1,
            width: columns_used,
        })
    }

    fn on_option_value_changed(&mut self, _key: &[String], _data: &Value) -> Result<()> {
        if !self.is_rendered() {
            return Ok(());
        }
        self.update_display_value()
    }

    fn on_property_changed(&mut self, name: &str) -> Result<()> {
        STAGES.dispatch(self, name)
    }

    fn is_rendered(&self) -> bool {
        self.handles.input().is_some()
    }

    fn detach(&mut self) {
        self.handles.detach();
    }
}

static_assertions::assert_impl_all!(ComboboxControl: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellAlignment, Grid};
    use crate::i18n::Catalog;
    use crate::accessibility::SequentialIds;
    use serde_json::json;

    fn combo(params: ControlParams) -> ComboboxControl {
        ComboboxControl::from_params(params, ControlContext::default()).unwrap()
    }

    fn colours() -> ControlParams {
        ControlParams::new("colour").with(OPTIONS, json!(["red", "green", "blue"]))
    }

    #[test]
    fn test_requires_combobox_properties() {
        let store = Arc::new(PropertyStore::new(OptionControlBase::schema().unwrap(), "colour"));
        let err = ComboboxControl::new(store, ControlContext::default()).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_render_with_label_uses_two_columns() {
        let mut combo = combo(colours().with(LABEL, json!("Colour")));
        let mut grid = Grid::new();

        let size = combo.on_render_to_grid(&mut grid, 3, 1).unwrap();
        assert_eq!(size, RenderResult { height: 1, width: 2 });

        let label = grid.cell_at(1, 3).unwrap();
        assert!(label.handle().as_label().is_some());
        assert_eq!(label.alignment(), CellAlignment::left_center());

        let input = grid.cell_at(2, 3).unwrap();
        assert_eq!(input.spans(), Spans::new(1, 1));
        assert_eq!(input.v_align(), VerticalAlign::Top);
        assert_eq!(input.alignment(), CellAlignment::left_center());
    }

    #[test]
    fn test_render_without_label_uses_one_column() {
        let mut combo = combo(colours());
        let mut grid = Grid::new();

        let size = combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        assert_eq!(size.width, 1);
        assert!(combo.label_handle().is_none());
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.cells()[0].v_align(), VerticalAlign::Top);
    }

    #[test]
    fn test_render_in_designated_cell_spans_two_columns() {
        let mut combo = combo(colours().with(CELL, json!({"row": 0, "column": 0})));
        let mut grid = Grid::new();

        let size = combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        assert_eq!(size.width, 2);

        let input = &grid.cells()[0];
        assert_eq!(input.spans(), Spans::new(1, 2));
        assert_eq!(input.v_align(), VerticalAlign::Center);
    }

    #[test]
    fn test_labelled_control_in_designated_cell_keeps_narrow_input() {
        let mut combo = combo(
            colours()
                .with(LABEL, json!("Colour"))
                .with(CELL, json!({"row": 0, "column": 0})),
        );
        let mut grid = Grid::new();

        assert_eq!(combo.on_render_to_grid(&mut grid, 0, 0).unwrap().width, 2);
        assert_eq!(grid.cells()[1].spans(), Spans::new(1, 1));
    }

    #[test]
    fn test_label_and_input_share_id() {
        let mut combo = combo(colours().with(LABEL, json!("Colour")).with(MARGIN, json!("large")));
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();

        let label = combo.label_handle().unwrap();
        let input = combo.input_handle().unwrap();
        assert_eq!(label.for_id(), input.id());
        assert!(label.has_class("control-margin-large"));
        assert!(input.classes().iter().any(|c| c == "control-margin-large"));
    }

    #[test]
    fn test_item_texts_translated_at_render() {
        let catalog = Arc::new(Catalog::new("en"));
        catalog.extend("fr", [("red", "rouge")]);
        let context = ControlContext::new(catalog.clone(), Arc::new(SequentialIds::new()));
        let mut combo = ComboboxControl::from_params(colours(), context).unwrap();
        let mut grid = Grid::new();

        // Normalized under "en": titles are the raw labels.
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        assert_eq!(combo.input_handle().unwrap().items()[0], "red");

        // The locale changes after normalization; titles are translated again.
        catalog.set_locale("fr");
        combo.on_render_to_grid(&mut grid, 1, 0).unwrap();
        assert_eq!(combo.input_handle().unwrap().items()[0], "rouge");
    }

    #[test]
    fn test_render_selects_current_value() {
        let mut combo = combo(colours().with_value(json!("green")));
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();

        assert_eq!(combo.input_handle().unwrap().selected_index(), Some(1));
    }

    #[test]
    fn test_user_choice_writes_name() {
        let mut combo = combo(ControlParams::new("colour").with(
            OPTIONS,
            json!([{"title": "Red", "name": "r"}, {"title": "Green", "name": "g"}]),
        ));
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();

        assert!(combo.input_handle().unwrap().choose(1));
        assert_eq!(combo.base().source_value(), json!("g"));
    }

    #[test]
    fn test_rejected_choice_clears_unmatched_selection() {
        let mut combo = combo(
            ControlParams::new("count")
                .with(OPTIONS, json!(["1", "2"]))
                .with(FORMAT, json!("integer")),
        );
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        let input = combo.input_handle().unwrap();

        // "2" is a string name; an integer-format store refuses it.
        assert!(input.choose(1));
        assert_eq!(combo.base().source_value(), Value::Null);
        assert_eq!(input.selected_index(), None);
    }

    #[test]
    fn test_rejected_choice_restores_stored_selection() {
        let mut combo = combo(colours().with_value(json!("green")));
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        let input = combo.input_handle().unwrap();

        combo.base().store().set(FORMAT, json!("integer")).unwrap();
        assert!(input.choose(2));
        assert_eq!(combo.base().source_value(), json!("green"));
        assert_eq!(input.selected_index(), Some(1));
    }

    #[test]
    fn test_update_display_value_keeps_selection_on_no_match() {
        let mut combo = combo(colours().with_value(json!("blue")));
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();

        combo.base().store().set_value(json!("purple"));
        combo.update_display_value().unwrap();
        assert_eq!(combo.input_handle().unwrap().selected_index(), Some(2));

        combo.base().store().set_value(json!("red"));
        combo.update_display_value().unwrap();
        assert_eq!(combo.input_handle().unwrap().selected_index(), Some(0));
    }

    #[test]
    fn test_hooks_are_noops_before_render() {
        let mut combo = combo(colours());
        combo.base().store().set_value(json!("red"));

        combo.on_option_value_changed(&[], &json!("red")).unwrap();
        combo.on_property_changed(OPTIONS).unwrap();
        combo.on_property_changed(ENABLE).unwrap();
        assert!(!combo.is_rendered());
    }

    #[test]
    fn test_enable_toggles_input_and_label() {
        let mut combo = combo(colours().with(LABEL, json!("Colour")));
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        let store = Arc::clone(combo.base().store());

        store.set(ENABLE, json!(false)).unwrap();
        combo.on_property_changed(ENABLE).unwrap();
        assert!(combo.input_handle().unwrap().is_disabled());
        assert!(combo.label_handle().unwrap().is_disabled());

        // Idempotent.
        combo.on_property_changed(ENABLE).unwrap();
        assert!(combo.label_handle().unwrap().is_disabled());

        store.set(ENABLE, json!(true)).unwrap();
        combo.on_property_changed(ENABLE).unwrap();
        assert!(!combo.input_handle().unwrap().is_disabled());
        assert!(!combo.label_handle().unwrap().is_disabled());

        store.set(ENABLE, json!(false)).unwrap();
        combo.on_property_changed(ENABLE).unwrap();
        store.set(ENABLE, Value::Null).unwrap();
        combo.on_property_changed(ENABLE).unwrap();
        assert!(!combo.input_handle().unwrap().is_disabled());
        assert!(!combo.label_handle().unwrap().is_disabled());
    }

    #[test]
    fn test_render_reflects_disabled_state() {
        let mut combo = combo(colours().with(ENABLE, json!(false)));
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();

        assert!(combo.input_handle().unwrap().is_disabled());
    }

    #[test]
    fn test_rerender_replaces_handles() {
        let mut combo = combo(colours());
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        let first = combo.input_handle().unwrap();

        combo.on_render_to_grid(&mut grid, 1, 0).unwrap();
        let second = combo.input_handle().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.activated().connection_count(), 0);
        assert_eq!(second.activated().connection_count(), 1);

        // The stale handle no longer writes to the store.
        first.choose(2);
        assert_eq!(combo.base().source_value(), Value::Null);
    }

    #[test]
    fn test_detach_disconnects_listener() {
        let mut combo = combo(colours());
        let mut grid = Grid::new();
        combo.on_render_to_grid(&mut grid, 0, 0).unwrap();
        let input = combo.input_handle().unwrap();

        combo.detach();
        assert!(!combo.is_rendered());
        assert_eq!(input.activated().connection_count(), 0);
    }

    #[test]
    fn test_property_stage_order() {
        assert_eq!(STAGES.labels(), vec!["base", CONTROL_NAME]);
    }
}
