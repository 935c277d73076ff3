//! The block: one tool instance, its tunes and the DOM subtree they render.
//!
//! A block composes its holder once, at construction. While it is the
//! selected block (between [`Block::will_select`] and [`Block::will_unselect`])
//! the platform layer feeds it DOM mutation records and native input events;
//! the block debounces them into a single [`BlockMutated`] notification.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use web_time::Instant;

use crate::api::EditorApi;
use crate::error::BlockError;
use crate::events::EditorEvent;
use crate::notifier::{ChangeNotifier, DEFAULT_DEBOUNCE};
use crate::platform::{Dom, MutationRecord, PlatformError};
use crate::sanitize::SanitizeConfig;
use crate::selection::SelectionUtils;
use crate::tool::{BlockTool, ToolContext, ToolDefinition, ToolHook, ToolboxConfigEntry};
use crate::tune::{TuneContext, TuneDefinition, TuneInstance};
use crate::tunes;

pub const BLOCK_CLASS: &str = "ce-block";
pub const CONTENT_CLASS: &str = "ce-block__content";
pub const FOCUSED_CLASS: &str = "ce-block--focused";
pub const SELECTED_CLASS: &str = "ce-block--selected";
pub const STRETCHED_CLASS: &str = "ce-block--stretched";
pub const DROP_TARGET_CLASS: &str = "ce-block--drop-target";

const ID_LENGTH: usize = 10;

/// Tags that count as media content.
const MEDIA_TAGS: &[&str] = &[
    "IMG", "IFRAME", "VIDEO", "AUDIO", "SOURCE", "INPUT", "TEXTAREA",
];

/// Everything needed to construct a [`Block`].
pub struct BlockOptions<D: Dom> {
    /// Stable id. Generated when `None`.
    pub id: Option<SmolStr>,
    pub data: Value,
    pub tool: Rc<ToolDefinition<D>>,
    pub read_only: bool,
    /// Persisted tune data keyed by tune name.
    pub tunes_data: BTreeMap<SmolStr, Value>,
    /// Internal tunes attached after the tool's own tunes.
    pub default_tunes: Vec<Rc<TuneDefinition<D>>>,
    pub debounce: Duration,
}

impl<D: Dom> BlockOptions<D> {
    /// Options with the built-in tunes and the default debounce.
    pub fn new(tool: Rc<ToolDefinition<D>>, data: Value) -> Self {
        Self {
            id: None,
            data,
            tool,
            read_only: false,
            tunes_data: BTreeMap::new(),
            default_tunes: tunes::default_tunes(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_id(mut self, id: impl Into<SmolStr>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tunes_data(mut self, tunes_data: BTreeMap<SmolStr, Value>) -> Self {
        self.tunes_data = tunes_data;
        self
    }

    pub fn with_default_tunes(mut self, tunes: Vec<Rc<TuneDefinition<D>>>) -> Self {
        self.default_tunes = tunes;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Serialized block, as produced by [`Block::save`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBlock {
    pub id: SmolStr,
    pub tool: SmolStr,
    pub data: Value,
    #[serde(default)]
    pub tunes: BTreeMap<SmolStr, Value>,
    /// Extraction time in milliseconds.
    pub time: f64,
}

/// Emitted once per quiet period after the block's content changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMutated {
    pub id: SmolStr,
}

type MutationListener = Box<dyn FnMut(&BlockMutated)>;

pub struct Block<D: Dom> {
    id: SmolStr,
    dom: D,
    api: EditorApi<D>,
    definition: Rc<ToolDefinition<D>>,
    tool: Box<dyn BlockTool<D>>,
    read_only: bool,
    holder: D::Node,
    /// The node the tool rendered, before any tune wrapped it.
    tool_content: D::Node,
    tunes: Vec<TuneInstance<D>>,
    unavailable_tunes_data: BTreeMap<SmolStr, Value>,
    inputs: RefCell<Option<Vec<D::Node>>>,
    input_index: Cell<usize>,
    notifier: ChangeNotifier,
    observing: bool,
    listeners: Vec<MutationListener>,
}

fn generate_id() -> SmolStr {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect::<String>()
        .into()
}

impl<D: Dom> Block<D> {
    /// Instantiate the tool and tunes and compose the holder.
    pub fn new(options: BlockOptions<D>, dom: D, api: EditorApi<D>) -> Result<Self, BlockError> {
        let BlockOptions {
            id,
            data,
            tool: definition,
            read_only,
            tunes_data,
            default_tunes,
            debounce,
        } = options;
        let id = id.unwrap_or_else(generate_id);

        let tool = definition.create(ToolContext {
            dom: dom.clone(),
            block_id: id.clone(),
            data,
            config: definition.config.clone(),
            read_only,
        });

        let mut tunes: Vec<TuneInstance<D>> = Vec::new();
        for tune in definition.tunes.iter().chain(default_tunes.iter()) {
            if tunes.iter().any(|t| t.name == tune.name) {
                tracing::warn!(
                    target: "weaver::tune",
                    block_id = %id,
                    tune = %tune.name,
                    "duplicate tune, keeping the first"
                );
                continue;
            }
            let instance = tune.create(TuneContext {
                dom: dom.clone(),
                api: api.clone(),
                block_id: id.clone(),
                config: tune.config.clone(),
                data: tunes_data.get(&tune.name).cloned(),
            });
            tunes.push(TuneInstance {
                name: tune.name.clone(),
                internal: tune.internal,
                tune: instance,
            });
        }
        // User tunes wrap first, internal tunes after them.
        tunes.sort_by_key(|t| t.internal);

        let unavailable_tunes_data: BTreeMap<SmolStr, Value> = tunes_data
            .into_iter()
            .filter(|(name, _)| !tunes.iter().any(|t| &t.name == name))
            .collect();

        let holder = dom.create_element("div")?;
        let mut block = Self {
            id,
            dom: dom.clone(),
            api,
            tool_content: holder.clone(),
            holder,
            definition,
            tool,
            read_only,
            tunes,
            unavailable_tunes_data,
            inputs: RefCell::new(None),
            input_index: Cell::new(0),
            notifier: ChangeNotifier::new(debounce),
            observing: false,
            listeners: Vec::new(),
        };
        block.compose()?;
        Ok(block)
    }

    fn compose(&mut self) -> Result<(), BlockError> {
        self.dom.add_class(&self.holder, BLOCK_CLASS);
        self.dom.set_attribute(&self.holder, "data-id", &self.id)?;

        let content = self.dom.create_element("div")?;
        self.dom.add_class(&content, CONTENT_CLASS);

        self.tool_content = self.tool.render().map_err(|source| BlockError::Render {
            tool: self.definition.name.clone(),
            source,
        })?;

        let mut wrapped = self.tool_content.clone();
        for tune in &mut self.tunes {
            match tune.tune.wrap(&wrapped) {
                Ok(node) => wrapped = node,
                Err(e) => tracing::warn!(
                    target: "weaver::tune",
                    block_id = %self.id,
                    tune = %tune.name,
                    error = %e,
                    "tune wrap failed, skipping"
                ),
            }
        }

        self.dom.append_child(&content, &wrapped)?;
        self.dom.append_child(&self.holder, &content)?;
        Ok(())
    }

    pub fn id(&self) -> &SmolStr {
        &self.id
    }

    /// Name of the block's tool.
    pub fn name(&self) -> &SmolStr {
        &self.definition.name
    }

    pub fn holder(&self) -> &D::Node {
        &self.holder
    }

    /// The node the tool rendered.
    pub fn content(&self) -> &D::Node {
        &self.tool_content
    }

    pub fn config(&self) -> &Value {
        &self.definition.config
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn sanitize(&self) -> &SanitizeConfig {
        &self.definition.sanitize
    }

    pub fn mergeable(&self) -> bool {
        self.tool.is_mergeable()
    }

    pub fn tune_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.tunes.iter().map(|t| &t.name)
    }

    // -- inputs --

    /// Editable elements inside the holder, in document order.
    ///
    /// Native inputs and the outermost contenteditable elements count; nested
    /// contenteditables belong to their editable ancestor.
    pub fn inputs(&self) -> Vec<D::Node> {
        if let Some(cached) = self.inputs.borrow().as_ref() {
            return cached.clone();
        }
        let mut found: Vec<D::Node> = Vec::new();
        for node in self.dom.descendants(&self.holder) {
            if !self.dom.is_native_input(&node) && !self.dom.is_content_editable(&node) {
                continue;
            }
            if found.iter().any(|input| self.dom.contains(input, &node)) {
                continue;
            }
            found.push(node);
        }
        let max = found.len().saturating_sub(1);
        if self.input_index.get() > max {
            self.input_index.set(max);
        }
        *self.inputs.borrow_mut() = Some(found.clone());
        found
    }

    pub fn input_index(&self) -> usize {
        self.inputs();
        self.input_index.get()
    }

    pub fn current_input(&self) -> Option<D::Node> {
        let inputs = self.inputs();
        inputs.get(self.input_index.get()).cloned()
    }

    /// Point the current input at whichever input is, or contains, `node`.
    /// Nodes outside every input are ignored.
    pub fn set_current_input(&self, node: &D::Node) {
        let inputs = self.inputs();
        if let Some(index) = inputs
            .iter()
            .position(|input| input == node || self.dom.contains(input, node))
        {
            self.input_index.set(index);
        }
    }

    pub fn first_input(&self) -> Option<D::Node> {
        self.inputs().first().cloned()
    }

    pub fn last_input(&self) -> Option<D::Node> {
        self.inputs().last().cloned()
    }

    pub fn next_input(&self) -> Option<D::Node> {
        let inputs = self.inputs();
        inputs.get(self.input_index.get() + 1).cloned()
    }

    pub fn previous_input(&self) -> Option<D::Node> {
        let index = self.input_index();
        let previous = index.checked_sub(1)?;
        self.inputs().get(previous).cloned()
    }

    fn drop_inputs_cache(&self) {
        self.inputs.borrow_mut().take();
    }

    fn update_current_input(&self) {
        let active = self.dom.active_element();
        let anchor = SelectionUtils::anchor_node(&self.dom);
        let active_is_native = active
            .as_ref()
            .is_some_and(|node| self.dom.is_native_input(node));
        let target = if active_is_native || anchor.is_none() {
            active
        } else {
            anchor
        };
        if let Some(node) = target {
            self.set_current_input(&node);
        }
    }

    // -- persistence --

    /// Extract tool and tune data.
    ///
    /// A failing tune is logged and left out. A failing tool fails the save.
    pub async fn save(&self) -> Result<SavedBlock, BlockError> {
        let started = Instant::now();

        let mut tunes = self.unavailable_tunes_data.clone();
        for tune in &self.tunes {
            match tune.tune.save() {
                Ok(Some(data)) => {
                    tunes.insert(tune.name.clone(), data);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    target: "weaver::tune",
                    block_id = %self.id,
                    tune = %tune.name,
                    error = %e,
                    "tune save failed, skipping"
                ),
            }
        }

        let data = self
            .tool
            .save(&self.tool_content)
            .await
            .map_err(|source| BlockError::Save {
                id: self.id.clone(),
                tool: self.definition.name.clone(),
                source,
            })?;

        let time = started.elapsed().as_secs_f64() * 1000.0;
        tracing::trace!(target: "weaver::block", block_id = %self.id, time, "saved");

        Ok(SavedBlock {
            id: self.id.clone(),
            tool: self.definition.name.clone(),
            data,
            tunes,
            time,
        })
    }

    /// Tool data only.
    pub async fn data(&self) -> Result<Value, BlockError> {
        Ok(self.save().await?.data)
    }

    /// Tools without a validator accept everything.
    pub fn validate(&self, data: &Value) -> bool {
        self.tool.validate(data).unwrap_or(true)
    }

    pub fn merge_with(&mut self, data: &Value) -> Result<(), BlockError> {
        if !self.tool.is_mergeable() {
            return Err(BlockError::NotMergeable(self.definition.name.clone()));
        }
        self.tool.merge(data).map_err(BlockError::Merge)
    }

    /// Forward a lifecycle hook to the tool. Failures are logged, not returned.
    pub fn call(&mut self, hook: &ToolHook) {
        if let Err(e) = self.tool.call(hook) {
            tracing::error!(
                target: "weaver::block",
                block_id = %self.id,
                tool = %self.definition.name,
                hook = hook.name(),
                error = %e,
                "tool hook failed"
            );
        }
    }

    /// Toolbox entry matching the block's current data.
    ///
    /// A tool with one entry always matches it. Otherwise the first entry whose
    /// preset data keys all equal the block's values wins.
    pub async fn active_toolbox_entry(&self) -> Result<Option<ToolboxConfigEntry>, BlockError> {
        let entries = &self.definition.toolbox;
        if entries.len() == 1 {
            return Ok(entries.first().cloned());
        }
        if entries.is_empty() {
            return Ok(None);
        }
        let data = self.data().await?;
        Ok(entries
            .iter()
            .find(|entry| entry_matches(entry, &data))
            .cloned())
    }

    // -- settings --

    /// Settings panel content: (user tunes, internal tunes).
    ///
    /// The tool's own settings element leads the user fragment.
    pub fn render_tunes(&mut self) -> Result<(D::Node, D::Node), BlockError> {
        let user = self.dom.create_fragment();
        let internal = self.dom.create_fragment();

        if let Some(settings) = self.tool.render_settings() {
            self.dom.append_child(&user, &settings)?;
        }

        for tune in &mut self.tunes {
            match tune.tune.render() {
                Ok(Some(node)) => {
                    let target = if tune.internal { &internal } else { &user };
                    self.dom.append_child(target, &node)?;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    target: "weaver::tune",
                    block_id = %self.id,
                    tune = %tune.name,
                    error = %e,
                    "tune render failed"
                ),
            }
        }
        Ok((user, internal))
    }

    pub fn render_settings(&mut self) -> Option<D::Node> {
        self.tool.render_settings()
    }

    /// A settings button was activated. Tune failures are logged.
    pub fn activate_tune(&mut self, name: &str) -> Result<(), BlockError> {
        let tune = self
            .tunes
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| BlockError::UnknownTune(name.into()))?;
        if let Err(e) = tune.tune.activate() {
            tracing::warn!(
                target: "weaver::tune",
                block_id = %self.id,
                tune = %tune.name,
                error = %e,
                "tune activation failed"
            );
        }
        Ok(())
    }

    // -- content state --

    pub fn is_empty(&self) -> bool {
        let no_text = self.dom.text_content(&self.tool_content).trim().is_empty();
        let no_values = self
            .dom
            .descendants(&self.tool_content)
            .iter()
            .filter_map(|n| self.dom.input_value(n))
            .all(|v| v.trim().is_empty());
        no_text && no_values && !self.has_media()
    }

    pub fn has_media(&self) -> bool {
        std::iter::once(self.tool_content.clone())
            .chain(self.dom.descendants(&self.tool_content))
            .any(|n| {
                self.dom
                    .tag_name(&n)
                    .is_some_and(|tag| MEDIA_TAGS.contains(&tag.as_str()))
            })
    }

    pub fn focused(&self) -> bool {
        self.dom.has_class(&self.holder, FOCUSED_CLASS)
    }

    pub fn set_focused(&self, state: bool) {
        self.dom.toggle_class(&self.holder, FOCUSED_CLASS, state);
    }

    pub fn selected(&self) -> bool {
        self.dom.has_class(&self.holder, SELECTED_CLASS)
    }

    /// Mark the block as part of a cross-block selection.
    ///
    /// Selecting drops a fake caret where the live selection sits inside the
    /// block; unselecting removes it.
    pub fn set_selected(&self, state: bool) -> Result<(), PlatformError> {
        self.dom.toggle_class(&self.holder, SELECTED_CLASS, state);

        let adding = state && SelectionUtils::is_range_inside_container(&self.dom, &self.holder);
        let removing =
            !state && SelectionUtils::is_fake_cursor_inside_container(&self.dom, &self.holder);
        if !adding && !removing {
            return Ok(());
        }

        self.api
            .events
            .emit(EditorEvent::FakeCursorAboutToBeToggled { state });
        if adding {
            SelectionUtils::add_fake_cursor(&self.dom)?;
        } else {
            SelectionUtils::remove_fake_cursor(&self.dom, &self.holder);
        }
        self.api.events.emit(EditorEvent::FakeCursorHaveBeenSet { state });
        Ok(())
    }

    pub fn stretched(&self) -> bool {
        self.dom.has_class(&self.holder, STRETCHED_CLASS)
    }

    pub fn set_stretched(&self, state: bool) {
        self.dom.toggle_class(&self.holder, STRETCHED_CLASS, state);
    }

    pub fn set_drop_target(&self, state: bool) {
        self.dom.toggle_class(&self.holder, DROP_TARGET_CLASS, state);
    }

    // -- change tracking --

    pub fn on_mutated(&mut self, listener: impl FnMut(&BlockMutated) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Start accepting mutation and input events.
    pub fn will_select(&mut self) {
        self.observing = true;
        tracing::trace!(target: "weaver::block", block_id = %self.id, "observing");
    }

    /// Stop accepting events and drop any pending notification.
    pub fn will_unselect(&mut self) {
        self.observing = false;
        if self.notifier.cancel() {
            tracing::trace!(target: "weaver::block", block_id = %self.id, "pending change dropped");
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Deadline of the pending notification, for the scheduler driving [`tick`](Block::tick).
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.notifier.deadline()
    }

    pub fn debounce(&self) -> Duration {
        self.notifier.delay()
    }

    /// Feed a batch of observed mutations. Returns whether the debounce was armed.
    ///
    /// A batch is ignored when every changed node sits inside mutation-free
    /// decoration (fake cursor, fake background).
    pub fn handle_mutations(&mut self, records: &[MutationRecord<D::Node>], now: Instant) -> bool {
        if !self.observing || records.is_empty() {
            return false;
        }
        if records.iter().all(|record| self.is_mutation_free(record)) {
            tracing::trace!(
                target: "weaver::block",
                block_id = %self.id,
                records = records.len(),
                "mutation-free batch ignored"
            );
            return false;
        }
        self.arm(now);
        true
    }

    /// A native `<input>`/`<textarea>` inside the block fired `input`.
    pub fn handle_native_input(&mut self, now: Instant) -> bool {
        if !self.observing {
            return false;
        }
        self.arm(now);
        true
    }

    /// Focus moved to `target`.
    pub fn handle_focus_in(&self, target: &D::Node) {
        if self.observing {
            self.set_current_input(target);
        }
    }

    /// Deliver the notification if the quiet period has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.notifier.poll(now) {
            return false;
        }
        self.did_mutated();
        true
    }

    /// Report a change right away, for tool state the DOM does not reflect.
    pub fn dispatch_change(&mut self) {
        self.notifier.cancel();
        self.did_mutated();
    }

    fn is_mutation_free(&self, record: &MutationRecord<D::Node>) -> bool {
        if record.added.is_empty() && record.removed.is_empty() {
            // State classes on the holder are not content.
            return record.target == self.holder || self.dom.is_mutation_free(&record.target);
        }
        record
            .added
            .iter()
            .chain(record.removed.iter())
            .all(|node| self.dom.is_mutation_free(node))
    }

    fn arm(&mut self, now: Instant) {
        self.notifier.arm(now);
        tracing::trace!(target: "weaver::block", block_id = %self.id, "change pending");
    }

    fn did_mutated(&mut self) {
        self.drop_inputs_cache();
        self.update_current_input();
        self.call(&ToolHook::Updated);

        let event = BlockMutated {
            id: self.id.clone(),
        };
        tracing::debug!(target: "weaver::block", block_id = %self.id, "block mutated");
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn destroy(&mut self) {
        self.will_unselect();
        self.listeners.clear();
        for tune in &mut self.tunes {
            tune.tune.destroy();
        }
        self.tool.destroy();
    }
}

fn entry_matches(entry: &ToolboxConfigEntry, data: &Value) -> bool {
    let Some(Value::Object(preset)) = &entry.data else {
        return false;
    };
    preset.iter().all(|(key, value)| data.get(key) == Some(value))
}
