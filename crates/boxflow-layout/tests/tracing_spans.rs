#![forbid(unsafe_code)]

//! Span and event structure of engine operations.
//!
//! Every operation opens one root span named `boxflow.<operation>` carrying
//! the boxes it acts on; the journal and completion events are emitted inside
//! it.
//!
//! Run:
//!   cargo test -p boxflow-layout --test tracing_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use boxflow_core::Rect;
use boxflow_layout::{BoxId, BoxNode, BoxTree, Engine, TextStyle};
use boxflow_style::Rgb;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

/// A tracing Layer that records spans, events and their parents.
struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl SpanCapture {
    fn new() -> (Self, CaptureHandle) {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let handle = CaptureHandle {
            spans: spans.clone(),
            events: events.clone(),
        };
        (Self { spans, events }, handle)
    }
}

struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn span(&self, name: &str) -> CapturedSpan {
        self.spans()
            .into_iter()
            .find(|span| span.name == name)
            .unwrap_or_else(|| panic!("{name} span should exist"))
    }

    fn events_in(&self, span: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.parent_span_name.as_deref() == Some(span))
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|pid| ctx.span(pid))
            .map(|span_ref| span_ref.name().to_string());

        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            parent_span_name,
        });
    }
}

fn with_captured_spans<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let (layer, handle) = SpanCapture::new();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

struct Fixture {
    tree: BoxTree,
    page: BoxId,
    card: BoxId,
    footer: BoxId,
}

fn fixture() -> Fixture {
    let mut tree = BoxTree::new();
    let page = tree.add_root(BoxNode::container(Rect::from_size(800.0, 600.0)).named("Page"));
    let card = tree
        .push_child(
            page,
            BoxNode::container(Rect::new(0.0, 0.0, 400.0, 100.0)).named("Card"),
        )
        .expect("card");
    tree.push_child(
        card,
        BoxNode::text(
            Rect::new(10.0, 10.0, 200.0, 20.0),
            TextStyle::new(14.0, Rgb::new(200, 200, 200)),
        ),
    )
    .expect("caption");
    let footer = tree
        .push_child(
            page,
            BoxNode::container(Rect::new(0.0, 120.0, 400.0, 80.0)).named("Footer"),
        )
        .expect("footer");
    Fixture {
        tree,
        page,
        card,
        footer,
    }
}

#[test]
fn resize_opens_root_span_with_box_fields() {
    let Fixture {
        mut tree, card, ..
    } = fixture();
    let handle = with_captured_spans(|| {
        Engine::default()
            .resize(&mut tree, card, Some(480.0), None)
            .expect("resize");
    });

    let span = handle.span("boxflow.resize");
    assert!(span.parent_name.is_none(), "resize must be a root span");
    assert_eq!(span.fields.get("box_id"), Some(&card.to_string()));
    assert_eq!(span.fields.get("width").map(String::as_str), Some("Some(480.0)"));
    assert_eq!(span.fields.get("height").map(String::as_str), Some("None"));

    let events = handle.events_in("boxflow.resize");
    let done = events
        .iter()
        .find(|event| event.message == "resize complete")
        .expect("completion event");
    assert_eq!(done.level, tracing::Level::DEBUG);
    assert!(done.fields.contains_key("scaled"));
    assert!(
        events
            .iter()
            .any(|event| event.message == "resized Card from 400×100 to 480×100")
    );
}

#[test]
fn journal_events_carry_box_ids() {
    let Fixture {
        mut tree,
        card,
        footer,
        ..
    } = fixture();
    let handle = with_captured_spans(|| {
        Engine::default()
            .resize(&mut tree, card, None, Some(160.0))
            .expect("resize");
    });

    let shifted = handle
        .events_in("boxflow.resize")
        .into_iter()
        .find(|event| event.message == "shifted sibling Footer by 60px")
        .expect("footer shift is journaled");
    assert_eq!(shifted.fields.get("box_id"), Some(&footer.to_string()));
}

#[test]
fn rejected_resize_emits_no_completion() {
    let Fixture { mut tree, card, .. } = fixture();
    let handle = with_captured_spans(|| {
        let result = Engine::default().resize(&mut tree, card, None, None);
        assert!(result.is_err());
    });

    assert_eq!(handle.span("boxflow.resize").parent_name, None);
    assert!(
        handle
            .events()
            .iter()
            .all(|event| event.message != "resize complete")
    );
}

#[test]
fn clone_and_delete_spans_name_their_boxes() {
    let Fixture {
        mut tree,
        page,
        card,
        ..
    } = fixture();
    let handle = with_captured_spans(|| {
        let mut engine = Engine::default();
        let copy = engine
            .clone_box(&mut tree, card, page, Some(1))
            .expect("clone");
        engine.delete(&mut tree, copy).expect("delete");
    });

    let clone = handle.span("boxflow.clone");
    assert!(clone.parent_name.is_none());
    assert_eq!(clone.fields.get("source"), Some(&card.to_string()));
    assert_eq!(clone.fields.get("parent"), Some(&page.to_string()));
    assert_eq!(clone.fields.get("index").map(String::as_str), Some("Some(1)"));

    let delete = handle.span("boxflow.delete");
    assert!(delete.parent_name.is_none());
    assert!(delete.fields.contains_key("box_id"));
    assert!(
        handle
            .events_in("boxflow.delete")
            .iter()
            .any(|event| event.message.starts_with("deleted "))
    );
}

#[test]
fn contrast_pass_reports_recolor_count() {
    let Fixture { mut tree, page, .. } = fixture();
    let handle = with_captured_spans(|| {
        let fixed = Engine::default()
            .remediate_contrast(&mut tree, page)
            .expect("remediate");
        assert_eq!(fixed, 1);
    });

    let span = handle.span("boxflow.contrast");
    assert_eq!(span.fields.get("root"), Some(&page.to_string()));
    let done = handle
        .events_in("boxflow.contrast")
        .into_iter()
        .find(|event| event.message == "contrast remediation complete")
        .expect("completion event");
    assert_eq!(done.fields.get("recolored").map(String::as_str), Some("1"));
}
