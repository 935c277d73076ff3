//! WASM browser tests for weaver-blocks-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::future::TimeoutFuture;
use serde_json::{Value, json};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use weaver_blocks_browser::{
    Block, BlockOptions, BlockTool, BlockWatcher, BlocksApi, BrowserDom, Dom, DomRange,
    EditorApi, EventBus, ExecCommandFormatter, GlooTimers, InlineToolbarApi, NoopI18n,
    SelectionUtils, StructuralFormatter, TextFormatter, TextStyle, ToolContext, ToolDefinition,
    ToolError, ToolFuture, ToolbarApi, TooltipApi, TooltipPlacement,
};

fn dom() -> BrowserDom {
    BrowserDom::new().unwrap()
}

/// A `<p contenteditable>` attached to the body.
fn paragraph(dom: &BrowserDom, text: &str) -> (web_sys::Node, web_sys::Node) {
    let t = dom.create_text(text);
    let p = dom.create_element("p").unwrap();
    dom.set_attribute(&p, "contenteditable", "true").unwrap();
    dom.append_child(&p, &t).unwrap();
    dom.append_child(&dom.body().unwrap(), &p).unwrap();
    (p, t)
}

fn inner_html(node: &web_sys::Node) -> String {
    use wasm_bindgen::JsCast;
    node.dyn_ref::<web_sys::Element>().unwrap().inner_html()
}

// === Dom ===

#[wasm_bindgen_test]
fn test_tree_edits_and_attributes() {
    let dom = dom();
    let (p, t) = paragraph(&dom, "hello world");
    assert_eq!(dom.tag_name(&p).as_deref(), Some("P"));
    assert!(dom.is_text(&t));
    assert!(dom.is_content_editable(&p));

    let tail = dom.split_text(&t, 5).unwrap();
    assert_eq!(dom.text_content(&tail), " world");
    assert_eq!(dom.children(&p).len(), 2);

    let span = dom.create_element("span").unwrap();
    dom.wrap(&tail, &span).unwrap();
    dom.add_class(&span, "mark");
    assert!(dom.has_class(&span, "mark"));
    assert_eq!(inner_html(&p), r#"hello<span class="mark"> world</span>"#);

    dom.unwrap(&span).unwrap();
    assert_eq!(inner_html(&p), "hello world");
    dom.remove(&p);
    assert!(dom.parent(&p).is_none());
}

#[wasm_bindgen_test]
fn test_text_length_counts_utf16_units() {
    let dom = dom();
    let t = dom.create_text("né😀");
    assert_eq!(dom.text_length(&t), 4);
}

#[wasm_bindgen_test]
fn test_selection_round_trip() {
    let dom = dom();
    let (p, t) = paragraph(&dom, "select me");
    let range = DomRange::new(t.clone(), 2, t.clone(), 6);
    dom.set_selection(Some(&range)).unwrap();
    assert_eq!(dom.selection(), Some(range));

    dom.set_selection(None).unwrap();
    assert_eq!(dom.selection(), None);
    dom.remove(&p);
}

#[wasm_bindgen_test]
fn test_compare_boundaries_matches_document_order() {
    use std::cmp::Ordering;
    use weaver_blocks_browser::Boundary;

    let dom = dom();
    let (p1, t1) = paragraph(&dom, "first");
    let (p2, t2) = paragraph(&dom, "second");
    let a = Boundary::new(t1.clone(), 3);
    let b = Boundary::new(t2.clone(), 0);
    assert_eq!(dom.compare_boundaries(&a, &b), Ordering::Less);
    assert_eq!(dom.compare_boundaries(&b, &a), Ordering::Greater);
    assert_eq!(dom.compare_boundaries(&a, &a), Ordering::Equal);
    dom.remove(&p1);
    dom.remove(&p2);
}

#[wasm_bindgen_test]
fn test_native_input_value() {
    let dom = dom();
    let input = dom.create_element("input").unwrap();
    assert!(dom.is_native_input(&input));
    dom.set_input_value(&input, "https://example.com");
    assert_eq!(dom.input_value(&input).as_deref(), Some("https://example.com"));
    assert_eq!(dom.input_value(&dom.create_element("div").unwrap()), None);
}

// === Selection and formatting ===

#[wasm_bindgen_test]
fn test_fake_background_in_live_document() {
    let dom = dom();
    let (p, t) = paragraph(&dom, "keep this marked");
    dom.set_selection(Some(&DomRange::new(t.clone(), 5, t, 9)))
        .unwrap();

    let mut utils = SelectionUtils::new(dom.clone());
    utils.set_fake_background().unwrap();
    assert!(utils.is_fake_background_enabled());
    assert_eq!(
        inner_html(&p),
        r#"keep <span class="codex-editor__fake-background" data-fake-background="true" data-mutation-free="true">this</span> marked"#
    );

    utils.remove_fake_background().unwrap();
    assert_eq!(inner_html(&p), "keep this marked");
    let selected = dom.selection().unwrap();
    assert_eq!(dom.text_content(&selected.start.node), "this");
    dom.remove(&p);
}

#[wasm_bindgen_test]
fn test_structural_formatter_on_browser_dom() {
    let dom = dom();
    let (p, t) = paragraph(&dom, "strike here");
    let formatter = StructuralFormatter::new(dom.clone());
    formatter
        .apply(&DomRange::new(t.clone(), 0, t, 6), &TextStyle::Strikethrough)
        .unwrap();
    assert_eq!(inner_html(&p), "<s>strike</s> here");
    dom.remove(&p);
}

#[wasm_bindgen_test]
fn test_exec_command_underline_toggles() {
    let dom = dom();
    let (p, t) = paragraph(&dom, "underline me");
    dom.focus(&p);
    let formatter = ExecCommandFormatter::new(dom.clone());
    let range = DomRange::new(t.clone(), 0, t, 9);

    formatter.apply(&range, &TextStyle::Underline).unwrap();
    assert!(inner_html(&p).contains("<u>underline</u>"));
    let selection = dom.selection();
    assert!(formatter.is_active(selection.as_ref(), &TextStyle::Underline));

    let selection = dom.selection().unwrap();
    formatter.remove(&selection, &TextStyle::Underline).unwrap();
    assert!(!inner_html(&p).contains("<u>"));
    dom.remove(&p);
}

#[wasm_bindgen_test]
fn test_exec_command_unlink_without_link_is_noop() {
    let dom = dom();
    let (p, t) = paragraph(&dom, "plain text");
    dom.focus(&p);
    let formatter = ExecCommandFormatter::new(dom.clone());
    let caret = DomRange::new(t.clone(), 3, t, 3);
    let link = TextStyle::Link {
        href: String::new(),
    };
    formatter.remove(&caret, &link).unwrap();
    assert_eq!(inner_html(&p), "plain text");
    dom.remove(&p);
}

// === Block watching ===

struct Text {
    dom: BrowserDom,
}

impl BlockTool<BrowserDom> for Text {
    fn render(&mut self) -> Result<web_sys::Node, ToolError> {
        let element = self.dom.create_element("div")?;
        self.dom.set_attribute(&element, "contenteditable", "true")?;
        Ok(element)
    }

    fn save<'a>(&'a self, content: &'a web_sys::Node) -> ToolFuture<'a, Value> {
        Box::pin(async move { Ok(json!({ "text": self.dom.text_content(content) })) })
    }
}

struct Noop;

impl BlocksApi for Noop {
    fn current_block_index(&self) -> Option<usize> {
        Some(0)
    }
    fn blocks_count(&self) -> usize {
        1
    }
    fn move_block(&self, _to: usize, _from: Option<usize>) {}
    fn delete_block(&self, _index: Option<usize>) {}
}

impl ToolbarApi for Noop {
    fn close(&self) {}
    fn toggle_block_settings(&self, _open: bool) {}
}

impl InlineToolbarApi for Noop {
    fn close(&self) {}
}

impl TooltipApi<web_sys::Node> for Noop {
    fn show(&self, _anchor: &web_sys::Node, _content: &str, _placement: TooltipPlacement) {}
    fn hide(&self) {}
}

fn api() -> EditorApi<BrowserDom> {
    let noop = Rc::new(Noop);
    EditorApi {
        blocks: noop.clone(),
        toolbar: noop.clone(),
        inline_toolbar: noop.clone(),
        tooltip: noop,
        i18n: Rc::new(NoopI18n),
        timers: Rc::new(GlooTimers),
        events: EventBus::new(),
    }
}

fn mounted_block(dom: &BrowserDom) -> Block<BrowserDom> {
    let tool = ToolDefinition::new("text", |ctx: ToolContext<BrowserDom>| {
        Box::new(Text { dom: ctx.dom }) as Box<dyn BlockTool<BrowserDom>>
    });
    let options = BlockOptions::new(Rc::new(tool), json!({}))
        .with_debounce(Duration::from_millis(50));
    let block = Block::new(options, dom.clone(), api()).unwrap();
    dom.append_child(&dom.body().unwrap(), block.holder())
        .unwrap();
    block
}

#[wasm_bindgen_test]
async fn test_watcher_reports_debounced_change() {
    let dom = dom();
    let mut block = mounted_block(&dom);
    let fired = Rc::new(Cell::new(0));
    {
        let fired = fired.clone();
        block.on_mutated(move |_| fired.set(fired.get() + 1));
    }
    let content = block.content().clone();
    let holder = block.holder().clone();
    let block = Rc::new(std::cell::RefCell::new(block));

    let watcher = BlockWatcher::watch(block.clone()).unwrap();
    assert!(block.borrow().is_observing());

    for text in ["a", "ab", "abc"] {
        dom.set_text_content(&content, text);
    }
    TimeoutFuture::new(150).await;
    assert_eq!(fired.get(), 1);

    drop(watcher);
    assert!(!block.borrow().is_observing());
    dom.set_text_content(&content, "ignored");
    TimeoutFuture::new(150).await;
    assert_eq!(fired.get(), 1);
    dom.remove(&holder);
}

#[wasm_bindgen_test]
async fn test_watcher_ignores_mutation_free_changes() {
    let dom = dom();
    let mut block = mounted_block(&dom);
    let fired = Rc::new(Cell::new(0));
    {
        let fired = fired.clone();
        block.on_mutated(move |_| fired.set(fired.get() + 1));
    }
    let content = block.content().clone();
    let holder = block.holder().clone();
    let block = Rc::new(std::cell::RefCell::new(block));
    let _watcher = BlockWatcher::watch(block).unwrap();

    let marker = dom.create_element("span").unwrap();
    dom.set_attribute(&marker, "data-mutation-free", "true")
        .unwrap();
    dom.append_child(&content, &marker).unwrap();
    TimeoutFuture::new(150).await;
    assert_eq!(fired.get(), 0);
    dom.remove(&holder);
}

#[wasm_bindgen_test]
async fn test_watcher_ignores_holder_state_classes() {
    let dom = dom();
    let mut block = mounted_block(&dom);
    let fired = Rc::new(Cell::new(0));
    {
        let fired = fired.clone();
        block.on_mutated(move |_| fired.set(fired.get() + 1));
    }
    let holder = block.holder().clone();
    let block = Rc::new(std::cell::RefCell::new(block));
    let _watcher = BlockWatcher::watch(block.clone()).unwrap();

    block.borrow().set_focused(true);
    block.borrow().set_stretched(true);
    TimeoutFuture::new(150).await;
    assert_eq!(fired.get(), 0);
    dom.remove(&holder);
}
