//! Option controls.
//!
//! An option control renders one logical value into a [`GridLayout`] and
//! keeps what it rendered in step with its [`PropertyStore`]:
//!
//! - [`OptionControl::on_render_to_grid`] places fresh handles and reports
//!   how much of the grid was used.
//! - [`OptionControl::on_option_value_changed`] mirrors a new logical value
//!   onto existing handles.
//! - [`OptionControl::on_property_changed`] runs the control's
//!   [`PropertyStages`]: the shared base stage first, then the control's own.
//!
//! Hooks never create handles; before the first render they do nothing.
//! [`ControlBinding`] connects the hooks to a store's change signal.

mod binding;
mod combobox;
pub mod options;
mod stages;

use std::sync::{Arc, Weak};

use serde_json::Value;
use trellis_core::logging::targets;
use trellis_core::{
    ConnectionGuard, PropertyDescriptor, PropertySchema, PropertyStore, Result, TrellisError,
    ValueFormat,
};

use crate::accessibility::{AriaIdAllocator, SequentialIds};
use crate::grid::GridLayout;
use crate::handle::LabelHandle;
use crate::i18n::{Identity, Translate};

pub use binding::{BoundControl, ControlBinding, ControlGuard};
pub use combobox::ComboboxControl;
pub use options::{OptionEntry, OptionsListNormalizer};
pub use stages::{base_property_stage, PropertyStage, PropertyStages, StageFn};

/// Label text; `null` renders no label.
pub const LABEL: &str = "label";
/// Spacing variant, reflected in a `control-margin-*` class.
pub const MARGIN: &str = "margin";
/// Enabled flag; only an explicit `false` disables.
pub const ENABLE: &str = "enable";
/// Designated grid cell, `{row, column}`.
pub const CELL: &str = "cell";
/// Format of the logical value.
pub const FORMAT: &str = "format";

/// Grid space consumed by a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderResult {
    /// Rows used, at least 1.
    pub height: usize,
    /// Columns used, at least 1.
    pub width: usize,
}

/// The contract every concrete control implements.
pub trait OptionControl: Send {
    /// Shared control state.
    fn base(&self) -> &OptionControlBase;

    /// Shared control state, mutably.
    fn base_mut(&mut self) -> &mut OptionControlBase;

    /// Render fresh handles at `(column, row)`, replacing any earlier ones.
    fn on_render_to_grid(
        &mut self,
        grid: &mut dyn GridLayout,
        row: usize,
        column: usize,
    ) -> Result<RenderResult>;

    /// React to a change of the logical value.
    fn on_option_value_changed(&mut self, key: &[String], data: &Value) -> Result<()>;

    /// React to a change of the property `name`.
    fn on_property_changed(&mut self, name: &str) -> Result<()>;

    /// Whether handles from a render are still alive.
    fn is_rendered(&self) -> bool;

    /// Disconnect listeners and drop handle references.
    fn detach(&mut self);
}

/// Collaborators shared by the controls of one document.
#[derive(Clone)]
pub struct ControlContext {
    translator: Arc<dyn Translate>,
    ids: Arc<dyn AriaIdAllocator>,
}

impl ControlContext {
    /// Create a context from a translator and an id allocator.
    pub fn new(translator: Arc<dyn Translate>, ids: Arc<dyn AriaIdAllocator>) -> Self {
        Self { translator, ids }
    }

    /// The translator.
    pub fn translator(&self) -> &Arc<dyn Translate> {
        &self.translator
    }

    /// The id allocator.
    pub fn ids(&self) -> &Arc<dyn AriaIdAllocator> {
        &self.ids
    }
}

impl Default for ControlContext {
    fn default() -> Self {
        Self::new(Arc::new(Identity), Arc::new(SequentialIds::new()))
    }
}

impl std::fmt::Debug for ControlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlContext").finish_non_exhaustive()
    }
}

fn known_format(value: &Value) -> std::result::Result<(), String> {
    match value.as_str() {
        Some(name) if ValueFormat::parse(name).is_none() => Err(format!("unknown format '{name}'")),
        _ => Ok(()),
    }
}

/// Check a logical value against the store's `format` property, if any.
pub(crate) fn check_value_format(store: &PropertyStore, value: &Value) -> Result<()> {
    if !store.schema().contains(FORMAT) {
        return Ok(());
    }
    let format = store
        .get(FORMAT)?
        .as_str()
        .and_then(ValueFormat::parse)
        .unwrap_or_default();
    if format.accepts(value) {
        Ok(())
    } else {
        Err(TrellisError::invalid_value(
            store.option_name(),
            format!("expected a {format} value, got {value}"),
        ))
    }
}

/// Writes the logical value of one control.
///
/// This is the only path by which user interaction mutates a store.
#[derive(Debug, Clone)]
pub struct ValueSetter {
    store: Arc<PropertyStore>,
}

impl ValueSetter {
    /// Validate `value` against the control's format and store it.
    pub fn set(&self, value: Value) -> Result<bool> {
        check_value_format(&self.store, &value)?;
        Ok(self.store.set_value(value))
    }

    /// The logical value currently held by the store.
    pub fn value(&self) -> Value {
        self.store.value()
    }
}

/// State and behavior shared by every option control.
#[derive(Debug)]
pub struct OptionControlBase {
    store: Arc<PropertyStore>,
    context: ControlContext,
    enabled: bool,
}

impl OptionControlBase {
    /// Properties every option control registers.
    pub fn schema() -> Result<PropertySchema> {
        PropertySchema::new()
            .with(PropertyDescriptor::simple(LABEL, ValueFormat::String))?
            .with(PropertyDescriptor::simple(MARGIN, ValueFormat::String).with_default("normal"))?
            .with(PropertyDescriptor::flag(ENABLE))?
            .with(PropertyDescriptor::cell(CELL))
    }

    /// Descriptor of the `format` property, defaulting to `string`.
    pub fn format_descriptor() -> PropertyDescriptor {
        PropertyDescriptor::simple(FORMAT, ValueFormat::String)
            .with_default(ValueFormat::String.name())
            .with_validator(known_format)
    }

    /// Wrap `store`, which must declare the base properties.
    pub fn new(store: Arc<PropertyStore>, context: ControlContext) -> Result<Self> {
        store
            .schema()
            .require("option control", &[LABEL, MARGIN, ENABLE, CELL])?;
        let mut base = Self {
            store,
            context,
            enabled: true,
        };
        base.refresh_enabled()?;
        Ok(base)
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<PropertyStore> {
        &self.store
    }

    /// The shared collaborators.
    pub fn context(&self) -> &ControlContext {
        &self.context
    }

    /// Value of a registered property.
    pub fn property(&self, name: &str) -> Result<Value> {
        self.store.get(name)
    }

    /// Whether a registered property has been given a value.
    pub fn is_property_defined(&self, name: &str) -> Result<bool> {
        self.store.is_defined(name)
    }

    /// Translate display text.
    pub fn translate(&self, text: &str) -> String {
        self.context.translator.translate(text)
    }

    /// Allocate an accessibility id.
    pub fn next_id(&self, prefix: &str) -> String {
        self.context.ids.next_id(prefix)
    }

    /// The translated label, empty when unset.
    pub fn label_text(&self) -> Result<String> {
        match self.property(LABEL)? {
            Value::String(label) => Ok(self.translate(&label)),
            _ => Ok(String::new()),
        }
    }

    /// The margin variant.
    pub fn margin(&self) -> Result<String> {
        Ok(match self.property(MARGIN)? {
            Value::String(margin) => margin,
            _ => "normal".to_string(),
        })
    }

    /// Enabled state as of the last refresh.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Re-read `enable`. Anything but an explicit `false` counts as enabled.
    pub fn refresh_enabled(&mut self) -> Result<bool> {
        self.enabled = self.property(ENABLE)? != Value::Bool(false);
        Ok(self.enabled)
    }

    /// The current logical value.
    pub fn source_value(&self) -> Value {
        self.store.value()
    }

    /// A setter for the logical value.
    pub fn value_setter(&self) -> ValueSetter {
        ValueSetter {
            store: Arc::clone(&self.store),
        }
    }

    /// Set the logical value.
    pub fn set_value(&self, value: Value) -> Result<bool> {
        self.value_setter().set(value)
    }
}

/// Weak references to the handles of the latest render.
///
/// Installing a new set detaches the previous one first; detaching drops
/// the input listener, disconnecting it.
pub struct ControlHandles<I: 'static> {
    label: Option<Weak<LabelHandle>>,
    input: Option<Weak<I>>,
    listener: Option<ConnectionGuard<usize>>,
}

impl<I: 'static> Default for ControlHandles<I> {
    fn default() -> Self {
        Self {
            label: None,
            input: None,
            listener: None,
        }
    }
}

impl<I: 'static> ControlHandles<I> {
    /// Install handles from a fresh render.
    pub fn replace(
        &mut self,
        label: Option<&Arc<LabelHandle>>,
        input: &Arc<I>,
        listener: ConnectionGuard<usize>,
    ) {
        self.detach();
        self.label = label.map(Arc::downgrade);
        self.input = Some(Arc::downgrade(input));
        self.listener = Some(listener);
    }

    /// The label, if rendered and still alive.
    pub fn label(&self) -> Option<Arc<LabelHandle>> {
        self.label.as_ref().and_then(Weak::upgrade)
    }

    /// The input, if rendered and still alive.
    pub fn input(&self) -> Option<Arc<I>> {
        self.input.as_ref().and_then(Weak::upgrade)
    }

    /// Whether the input listener is connected.
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(ConnectionGuard::is_connected)
    }

    /// Drop the listener and both references.
    pub fn detach(&mut self) {
        if self.listener.take().is_some() {
            tracing::trace!(target: targets::CONTROL, "detaching control handles");
        }
        self.label = None;
        self.input = None;
    }
}

impl<I: 'static> std::fmt::Debug for ControlHandles<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlHandles")
            .field("label", &self.label().is_some())
            .field("input", &self.input().is_some())
            .field("listening", &self.is_listening())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::SelectHandle;
    use serde_json::json;
    use trellis_core::Signal;

    fn base_store() -> Arc<PropertyStore> {
        let schema = OptionControlBase::schema()
            .and_then(|s| s.with(OptionControlBase::format_descriptor()))
            .unwrap();
        Arc::new(PropertyStore::new(schema, "colour"))
    }

    #[test]
    fn test_base_requires_base_properties() {
        let store = Arc::new(PropertyStore::new(PropertySchema::new(), "colour"));
        let err = OptionControlBase::new(store, ControlContext::default()).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_label_text_translated_and_null_is_empty() {
        let store = base_store();
        let context = ControlContext::new(
            Arc::new(|text: &str| format!("<{text}>")),
            Arc::new(SequentialIds::new()),
        );
        let base = OptionControlBase::new(store.clone(), context).unwrap();

        assert_eq!(base.label_text().unwrap(), "");
        store.set(LABEL, json!("Colour")).unwrap();
        assert_eq!(base.label_text().unwrap(), "<Colour>");
    }

    #[test]
    fn test_enabled_only_false_disables() {
        let store = base_store();
        let mut base = OptionControlBase::new(store.clone(), ControlContext::default()).unwrap();
        assert!(base.is_enabled());

        store.set(ENABLE, json!(false)).unwrap();
        assert!(!base.refresh_enabled().unwrap());

        store.set(ENABLE, json!(true)).unwrap();
        assert!(base.refresh_enabled().unwrap());

        store.set(ENABLE, Value::Null).unwrap();
        assert!(base.refresh_enabled().unwrap());
    }

    #[test]
    fn test_set_value_checks_format() {
        let store = base_store();
        let base = OptionControlBase::new(store.clone(), ControlContext::default()).unwrap();

        assert!(base.set_value(json!("green")).unwrap());
        assert!(base.set_value(json!(3)).is_err());

        store.set(FORMAT, json!("integer")).unwrap();
        assert!(base.set_value(json!(3)).unwrap());
        assert_eq!(base.source_value(), json!(3));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let store = base_store();
        assert!(store.set(FORMAT, json!("colour")).is_err());
    }

    #[test]
    fn test_handles_replace_detaches_previous_listener() {
        let mut handles = ControlHandles::<SelectHandle>::default();
        assert!(handles.input().is_none());

        let first = Arc::new(SelectHandle::new("ctrl-1", vec!["a".into()]));
        let guard = first.activated().connect_scoped(|_| {});
        handles.replace(None, &first, guard);
        assert!(handles.is_listening());
        assert_eq!(first.activated().connection_count(), 1);

        let second = Arc::new(SelectHandle::new("ctrl-2", vec!["b".into()]));
        let guard = second.activated().connect_scoped(|_| {});
        handles.replace(None, &second, guard);
        assert_eq!(first.activated().connection_count(), 0);
        assert!(Arc::ptr_eq(&handles.input().unwrap(), &second));

        handles.detach();
        assert_eq!(second.activated().connection_count(), 0);
        assert!(handles.input().is_none());
    }

    #[test]
    fn test_handles_are_weak() {
        let mut handles = ControlHandles::<SelectHandle>::default();
        let input = Arc::new(SelectHandle::new("ctrl-1", Vec::new()));
        let signal = Arc::new(Signal::<usize>::new());
        handles.replace(None, &input, signal.connect_scoped(|_| {}));

        drop(input);
        assert!(handles.input().is_none());
    }
}
