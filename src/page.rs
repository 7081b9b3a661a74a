use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::behaviors::{self, Behavior, HIDDEN_CLASS};
use crate::dom::{
    Dom, NodeId, is_checkbox_input, is_form_control, is_submit_control, truncate_chars,
};
use crate::error::{Error, Result};
use crate::html::parse_html;

#[derive(Debug, Clone, Default)]
struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Behavior>>>,
}

impl ListenerStore {
    fn add(&mut self, node_id: NodeId, event: String, behavior: Behavior) {
        let behaviors = self.map.entry(node_id).or_default().entry(event).or_default();
        // Re-registering identical wiring is a no-op, so install functions
        // can be called again after markup changes.
        if behaviors.iter().any(|existing| *existing == behavior) {
            return;
        }
        behaviors.push(behavior);
    }

    fn get(&self, node_id: NodeId, event: &str) -> Vec<Behavior> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    event_type: String,
    target: NodeId,
    default_prevented: bool,
}

impl EventState {
    fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            default_prevented: false,
        }
    }

    pub(crate) fn target(&self) -> NodeId {
        self.target
    }

    pub(crate) fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// One native (non-intercepted) form submission, as the server would see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub action: String,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

impl Submission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn query_string(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    encode_form_urlencoded_component(name),
                    encode_form_urlencoded_component(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    listeners: ListenerStore,
    submissions: Vec<Submission>,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            submissions: Vec::new(),
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: false,
        })
    }

    /// `from_html` plus `behaviors::install`: the page as a visitor gets it.
    pub fn open(html: &str) -> Result<Self> {
        let mut page = Self::from_html(html)?;
        behaviors::install(&mut page)?;
        Ok(page)
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Dom("set_trace_log_limit requires at least 1 entry".into()));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }

    pub(crate) fn add_behavior(&mut self, node_id: NodeId, event: &str, behavior: Behavior) {
        self.listeners.add(node_id, event.to_string(), behavior);
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        // Typed text is NFC-normalized the way composed keyboard input lands.
        let text: String = text.nfc().collect();
        self.dom.set_value(target, &text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        if !is_checkbox_input(&self.dom, target) {
            let actual = self
                .dom
                .tag_name(target)
                .map(|tag| tag.to_ascii_lowercase())
                .unwrap_or_else(|| "non-element".into());
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input[type=checkbox]".into(),
                actual,
            });
        }

        let current = self.dom.checked(target)?;
        if current != checked {
            self.dom.set_checked(target, checked)?;
            self.dispatch_event(target, "input")?;
            self.dispatch_event(target, "change")?;
        }

        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let click_outcome = self.dispatch_event(target, "click")?;
        if click_outcome.default_prevented {
            return Ok(());
        }

        if is_checkbox_input(&self.dom, target) {
            let current = self.dom.checked(target)?;
            self.dom.set_checked(target, !current)?;
            self.dispatch_event(target, "input")?;
            self.dispatch_event(target, "change")?;
        }

        if is_submit_control(&self.dom, target) {
            if let Some(form) = self.resolve_form_for_submit(target) {
                self.submit_form(form)?;
            }
        }

        Ok(())
    }

    /// The intercepted submission path: dispatches `submit` and only falls
    /// through to the native submission when no listener prevented it.
    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;

        let form = if self
            .dom
            .tag_name(target)
            .map(|t| t.eq_ignore_ascii_case("form"))
            .unwrap_or(false)
        {
            Some(target)
        } else {
            self.resolve_form_for_submit(target)
        };

        if let Some(form) = form {
            self.submit_form(form)?;
        }

        Ok(())
    }

    fn submit_form(&mut self, form: NodeId) -> Result<()> {
        let outcome = self.dispatch_event(form, "submit")?;
        if !outcome.default_prevented {
            self.submit_form_native(form)?;
        }
        Ok(())
    }

    /// The raw submission path: no listeners are consulted.
    pub fn submit_native(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if !self
            .dom
            .tag_name(target)
            .map(|t| t.eq_ignore_ascii_case("form"))
            .unwrap_or(false)
        {
            let actual = self
                .dom
                .tag_name(target)
                .map(|tag| tag.to_ascii_lowercase())
                .unwrap_or_else(|| "non-element".into());
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "form".into(),
                actual,
            });
        }
        self.submit_form_native(target)
    }

    pub(crate) fn submit_form_native(&mut self, form: NodeId) -> Result<()> {
        let submission = Submission {
            action: self.dom.attr(form, "action").unwrap_or_default(),
            method: self
                .dom
                .attr(form, "method")
                .unwrap_or_else(|| "get".into())
                .to_ascii_lowercase(),
            fields: self.collect_form_fields(form),
        };
        self.trace_line(format!(
            "[submit] native action={} method={} fields={}",
            submission.action,
            submission.method,
            submission.fields.len()
        ));
        self.submissions.push(submission);
        Ok(())
    }

    fn collect_form_fields(&self, form: NodeId) -> Vec<(String, String)> {
        let mut controls = Vec::new();
        for child in &self.dom.nodes[form.0].children {
            self.dom.collect_elements_dfs(*child, &mut controls);
        }

        let mut fields = Vec::new();
        for control in controls {
            if !is_form_control(&self.dom, control) || self.dom.disabled(control) {
                continue;
            }
            let Some(name) = self.dom.attr(control, "name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let tag = self.dom.tag_name(control).unwrap_or_default();
            if tag.eq_ignore_ascii_case("button") || is_submit_control(&self.dom, control) {
                continue;
            }
            let kind = self
                .dom
                .attr(control, "type")
                .unwrap_or_default()
                .to_ascii_lowercase();
            if kind == "checkbox" || kind == "radio" {
                let Ok(true) = self.dom.checked(control) else {
                    continue;
                };
                let value = self
                    .dom
                    .attr(control, "value")
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| "on".into());
                fields.push((name, value));
                continue;
            }
            let value = self.dom.value(control).unwrap_or_default();
            fields.push((name, value));
        }
        fields
    }

    /// Parses a fragment and appends its nodes under the target, as a server
    /// round-trip or templated insert would. Freshly added toggles need
    /// another `install_room_toggles` pass to pick up behaviors.
    pub fn append_html(&mut self, selector: &str, html: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let fragment = parse_html(html)?;
        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            self.dom.clone_subtree_from_dom(&fragment, child, Some(target))?;
        }
        self.dom.rebuild_id_index();
        Ok(())
    }

    /// Text content of every element matching the selector, in document order.
    pub fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let matches = self.dom.query_selector_all(selector)?;
        Ok(matches
            .into_iter()
            .map(|node| self.dom.text_content(node))
            .collect())
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    pub(crate) fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        stacker::grow(32 * 1024 * 1024, || {
            let mut event = EventState::new(event_type, target);
            self.trace_line(format!(
                "[event] {} target={}",
                event.event_type,
                self.node_label(target)
            ));
            for behavior in self.listeners.get(target, event_type) {
                behaviors::run(self, &behavior, &mut event)?;
            }
            Ok(event)
        })
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn checked(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.dom.checked(target)
    }

    /// Visibility convention of the host pages: the `hidden` class.
    pub fn is_hidden(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.dom.class_contains(target, HIDDEN_CLASS)
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.dom.query_selector(selector)?.is_some())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_checked(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.checked(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_hidden(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.class_contains(target, HIDDEN_CLASS)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("hidden={expected}"),
                actual: format!("hidden={actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn take_submissions(&mut self) -> Vec<Submission> {
        std::mem::take(&mut self.submissions)
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn node_label(&self, node_id: NodeId) -> String {
        let tag = self.dom.tag_name(node_id).unwrap_or("#text");
        match self.dom.attr(node_id, "id") {
            Some(id) => format!("{tag}#{id}"),
            None => tag.to_string(),
        }
    }

    fn resolve_form_for_submit(&self, target: NodeId) -> Option<NodeId> {
        if self
            .dom
            .tag_name(target)
            .map(|t| t.eq_ignore_ascii_case("form"))
            .unwrap_or(false)
        {
            return Some(target);
        }
        self.dom.find_ancestor_by_tag(target, "form")
    }
}

fn encode_form_urlencoded_component(src: &str) -> String {
    let mut out = String::new();
    for b in src.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'_') {
            out.push(*b as char);
        } else if *b == b' ' {
            out.push('+');
        } else {
            out.push('%');
            out.push(to_hex_upper((*b >> 4) & 0x0F));
            out.push(to_hex_upper(*b & 0x0F));
        }
    }
    out
}

fn to_hex_upper(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 => (b'A' + (nibble - 10)) as char,
        _ => '?',
    }
}
