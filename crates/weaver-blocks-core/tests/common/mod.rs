//! Shared fixtures: recording orchestrator mocks and a few content tools.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Value, json};
use weaver_blocks_core::{
    Block, BlockOptions, BlockTool, BlockTune, BlocksApi, Dom, EditorApi, EventBus,
    InlineToolbarApi, ManualTimers, MemoryDom, NodeId, NoopI18n, SanitizeConfig, SmolStr,
    ToolContext, ToolDefinition, ToolError, ToolFuture, ToolHook, ToolbarApi, ToolboxConfigEntry,
    TooltipApi, TooltipPlacement, TuneContext, TuneDefinition, TuneError,
};

#[derive(Default)]
pub struct MockBlocks {
    pub current: Cell<Option<usize>>,
    pub count: Cell<usize>,
    pub moves: RefCell<Vec<(usize, Option<usize>)>>,
    pub deleted: RefCell<Vec<Option<usize>>>,
}

impl BlocksApi for MockBlocks {
    fn current_block_index(&self) -> Option<usize> {
        self.current.get()
    }

    fn blocks_count(&self) -> usize {
        self.count.get()
    }

    fn move_block(&self, to: usize, from: Option<usize>) {
        self.moves.borrow_mut().push((to, from));
    }

    fn delete_block(&self, index: Option<usize>) {
        self.deleted.borrow_mut().push(index);
    }
}

#[derive(Default)]
pub struct MockToolbar {
    pub closed: Cell<usize>,
    pub settings: RefCell<Vec<bool>>,
}

impl ToolbarApi for MockToolbar {
    fn close(&self) {
        self.closed.set(self.closed.get() + 1);
    }

    fn toggle_block_settings(&self, open: bool) {
        self.settings.borrow_mut().push(open);
    }
}

#[derive(Default)]
pub struct MockInlineToolbar {
    pub closed: Cell<usize>,
}

impl InlineToolbarApi for MockInlineToolbar {
    fn close(&self) {
        self.closed.set(self.closed.get() + 1);
    }
}

#[derive(Default)]
pub struct MockTooltip {
    pub shown: RefCell<Vec<String>>,
    pub visible: Cell<bool>,
}

impl TooltipApi<NodeId> for MockTooltip {
    fn show(&self, _anchor: &NodeId, content: &str, _placement: TooltipPlacement) {
        self.shown.borrow_mut().push(content.to_string());
        self.visible.set(true);
    }

    fn hide(&self) {
        self.visible.set(false);
    }
}

pub struct Harness {
    pub dom: MemoryDom,
    pub api: EditorApi<MemoryDom>,
    pub blocks: Rc<MockBlocks>,
    pub toolbar: Rc<MockToolbar>,
    pub inline_toolbar: Rc<MockInlineToolbar>,
    pub tooltip: Rc<MockTooltip>,
    pub timers: ManualTimers,
}

pub fn harness() -> Harness {
    let dom = MemoryDom::new();
    let blocks = Rc::new(MockBlocks::default());
    let toolbar = Rc::new(MockToolbar::default());
    let inline_toolbar = Rc::new(MockInlineToolbar::default());
    let tooltip = Rc::new(MockTooltip::default());
    let timers = ManualTimers::new();
    let api = EditorApi {
        blocks: blocks.clone(),
        toolbar: toolbar.clone(),
        inline_toolbar: inline_toolbar.clone(),
        tooltip: tooltip.clone(),
        i18n: Rc::new(NoopI18n),
        timers: Rc::new(timers.clone()),
        events: EventBus::new(),
    };
    Harness {
        dom,
        api,
        blocks,
        toolbar,
        inline_toolbar,
        tooltip,
        timers,
    }
}

impl Harness {
    /// Build a block and mount its holder in the body.
    pub fn block(&self, options: BlockOptions<MemoryDom>) -> Block<MemoryDom> {
        let block = Block::new(options, self.dom.clone(), self.api.clone()).unwrap();
        self.dom.append_child(&self.dom.body(), block.holder()).unwrap();
        self.dom.take_mutations();
        block
    }

    /// A `<p contenteditable>` in the body holding `text`.
    pub fn paragraph(&self, text: &str) -> (NodeId, NodeId) {
        let t = self.dom.create_text(text);
        let p = self
            .dom
            .build("p", &[("contenteditable", "true")], &[t])
            .unwrap();
        self.dom.append_child(&self.dom.body(), &p).unwrap();
        (p, t)
    }
}

/// Hook names a tool has seen, shared with the test.
pub type HookLog = Rc<RefCell<Vec<String>>>;

/// One contenteditable div holding `data.text`.
pub struct Paragraph {
    dom: MemoryDom,
    text: String,
    hooks: HookLog,
    element: Option<NodeId>,
}

impl BlockTool<MemoryDom> for Paragraph {
    fn render(&mut self) -> Result<NodeId, ToolError> {
        let text = self.dom.create_text(&self.text);
        let element = self.dom.build(
            "div",
            &[("class", "ce-paragraph"), ("contenteditable", "true")],
            &[text],
        )?;
        self.element = Some(element);
        Ok(element)
    }

    fn save<'a>(&'a self, content: &'a NodeId) -> ToolFuture<'a, Value> {
        Box::pin(async move { Ok(json!({ "text": self.dom.inner_html(*content) })) })
    }

    fn validate(&self, data: &Value) -> Option<bool> {
        Some(data["text"].as_str().is_some_and(|t| !t.trim().is_empty()))
    }

    fn is_mergeable(&self) -> bool {
        true
    }

    fn merge(&mut self, data: &Value) -> Result<(), ToolError> {
        let element = self
            .element
            .ok_or_else(|| ToolError::Merge("not rendered".into()))?;
        let extra = data["text"].as_str().unwrap_or_default();
        let text = self.dom.create_text(extra);
        self.dom.append_child(&element, &text)?;
        Ok(())
    }

    fn call(&mut self, hook: &ToolHook) -> Result<(), ToolError> {
        self.hooks.borrow_mut().push(hook.name().to_string());
        if hook.name() == "explode" {
            return Err(ToolError::Hook {
                hook: hook.name().into(),
                reason: "boom".into(),
            });
        }
        Ok(())
    }
}

pub fn paragraph_tool(hooks: HookLog) -> ToolDefinition<MemoryDom> {
    ToolDefinition::new("paragraph", move |ctx: ToolContext<MemoryDom>| {
        Box::new(Paragraph {
            dom: ctx.dom,
            text: ctx.data["text"].as_str().unwrap_or_default().to_string(),
            hooks: hooks.clone(),
            element: None,
        }) as Box<dyn BlockTool<MemoryDom>>
    })
    .with_toolbox(vec![ToolboxConfigEntry::titled("Text")])
    .with_sanitize(SanitizeConfig::new().allow_tag("br"))
}

/// A heading with one toolbox entry per level and a settings element.
pub struct Heading {
    dom: MemoryDom,
    text: String,
    level: u64,
}

impl BlockTool<MemoryDom> for Heading {
    fn render(&mut self) -> Result<NodeId, ToolError> {
        let text = self.dom.create_text(&self.text);
        let tag = format!("h{}", self.level);
        Ok(self
            .dom
            .build(&tag, &[("contenteditable", "true")], &[text])?)
    }

    fn save<'a>(&'a self, content: &'a NodeId) -> ToolFuture<'a, Value> {
        Box::pin(async move {
            Ok(json!({
                "text": self.dom.text_content(content),
                "level": self.level,
            }))
        })
    }

    fn render_settings(&mut self) -> Option<NodeId> {
        self.dom
            .build("div", &[("class", "heading-levels")], &[])
            .ok()
    }
}

pub fn heading_tool() -> ToolDefinition<MemoryDom> {
    ToolDefinition::new("header", |ctx: ToolContext<MemoryDom>| {
        Box::new(Heading {
            dom: ctx.dom,
            text: ctx.data["text"].as_str().unwrap_or_default().to_string(),
            level: ctx.data["level"].as_u64().unwrap_or(2),
        }) as Box<dyn BlockTool<MemoryDom>>
    })
    .with_toolbox(vec![
        ToolboxConfigEntry::titled("Heading 1").with_data(json!({ "level": 1 })),
        ToolboxConfigEntry::titled("Heading 2").with_data(json!({ "level": 2 })),
        ToolboxConfigEntry::titled("Heading 3").with_data(json!({ "level": 3 })),
    ])
}

/// A tool whose save always fails.
pub struct Broken {
    dom: MemoryDom,
}

impl BlockTool<MemoryDom> for Broken {
    fn render(&mut self) -> Result<NodeId, ToolError> {
        Ok(self.dom.create_element("div")?)
    }

    fn save<'a>(&'a self, _content: &'a NodeId) -> ToolFuture<'a, Value> {
        Box::pin(async { Err(ToolError::Save("storage offline".into())) })
    }
}

pub fn broken_tool() -> ToolDefinition<MemoryDom> {
    ToolDefinition::new("broken", |ctx: ToolContext<MemoryDom>| {
        Box::new(Broken { dom: ctx.dom }) as Box<dyn BlockTool<MemoryDom>>
    })
}

/// Renders one contenteditable per entry of `data.items`.
pub struct List {
    dom: MemoryDom,
    items: Vec<String>,
}

impl BlockTool<MemoryDom> for List {
    fn render(&mut self) -> Result<NodeId, ToolError> {
        let list = self.dom.create_element("ul")?;
        for item in &self.items {
            let text = self.dom.create_text(item);
            let li = self
                .dom
                .build("li", &[("contenteditable", "true")], &[text])?;
            self.dom.append_child(&list, &li)?;
        }
        Ok(list)
    }

    fn save<'a>(&'a self, content: &'a NodeId) -> ToolFuture<'a, Value> {
        Box::pin(async move {
            let items: Vec<String> = self
                .dom
                .children(content)
                .iter()
                .map(|li| self.dom.text_content(li))
                .collect();
            Ok(json!({ "items": items }))
        })
    }
}

pub fn list_tool() -> ToolDefinition<MemoryDom> {
    ToolDefinition::new("list", |ctx: ToolContext<MemoryDom>| {
        let items = ctx.data["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Box::new(List {
            dom: ctx.dom,
            items,
        }) as Box<dyn BlockTool<MemoryDom>>
    })
}

/// User tune that stores a string and renders a button.
pub struct AnchorTune {
    dom: MemoryDom,
    value: Option<Value>,
}

impl BlockTune<MemoryDom> for AnchorTune {
    fn render(&mut self) -> Result<Option<NodeId>, TuneError> {
        Ok(Some(
            self.dom
                .build("div", &[("class", "anchor-tune")], &[])?,
        ))
    }

    fn save(&self) -> Result<Option<Value>, TuneError> {
        Ok(self.value.clone())
    }
}

pub fn anchor_tune() -> Rc<TuneDefinition<MemoryDom>> {
    Rc::new(TuneDefinition::new("anchor", |ctx: TuneContext<MemoryDom>| {
        Box::new(AnchorTune {
            dom: ctx.dom,
            value: ctx.data,
        }) as Box<dyn BlockTune<MemoryDom>>
    }))
}

/// User tune whose save always fails.
pub struct FailingTune;

impl BlockTune<MemoryDom> for FailingTune {
    fn render(&mut self) -> Result<Option<NodeId>, TuneError> {
        Ok(None)
    }

    fn save(&self) -> Result<Option<Value>, TuneError> {
        Err(TuneError::Save("cannot serialize".into()))
    }
}

pub fn failing_tune() -> Rc<TuneDefinition<MemoryDom>> {
    Rc::new(TuneDefinition::new("failing", |_ctx: TuneContext<MemoryDom>| {
        Box::new(FailingTune) as Box<dyn BlockTune<MemoryDom>>
    }))
}

/// User tune wrapping the content in a `<div class="{class}">`, or failing
/// to when `class` is empty.
pub struct WrapTune {
    dom: MemoryDom,
    class: &'static str,
}

impl BlockTune<MemoryDom> for WrapTune {
    fn render(&mut self) -> Result<Option<NodeId>, TuneError> {
        Ok(None)
    }

    fn wrap(&mut self, content: &NodeId) -> Result<NodeId, TuneError> {
        if self.class.is_empty() {
            return Err(TuneError::Wrap("no wrapper class".into()));
        }
        Ok(self.dom.build("div", &[("class", self.class)], &[*content])?)
    }
}

pub fn wrap_tune(name: &'static str, class: &'static str) -> Rc<TuneDefinition<MemoryDom>> {
    Rc::new(TuneDefinition::new(name, move |ctx: TuneContext<MemoryDom>| {
        Box::new(WrapTune {
            dom: ctx.dom,
            class,
        }) as Box<dyn BlockTune<MemoryDom>>
    }))
}

pub fn tunes_data(entries: &[(&str, Value)]) -> BTreeMap<SmolStr, Value> {
    entries
        .iter()
        .map(|(name, value)| (SmolStr::new(name), value.clone()))
        .collect()
}

pub fn hook_log() -> HookLog {
    Rc::new(RefCell::new(Vec::new()))
}
