//! In-memory automation session for tests
//!
//! Models an application as a list of windows, each holding elements keyed
//! by their exact selector string. Changes can be scheduled on the tokio
//! clock and attached to clicks, which makes asynchronous UI transitions
//! reproducible under a paused runtime.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::common::{Error, Result};

use super::types::{ElementRef, WindowHandle};
use super::AutomationSession;

/// Bytes returned for every screenshot
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

type ClickHandler = Arc<dyn Fn(&mut FakeApp) + Send + Sync>;

/// A command the fake received, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click { window: WindowHandle, selector: String },
    SetValue { window: WindowHandle, selector: String, text: String },
    Switch(WindowHandle),
    Close(WindowHandle),
    Screenshot(WindowHandle),
    Quit,
}

struct FakeElement {
    id: u64,
    selector: String,
    text: String,
    value: String,
    displayed: bool,
}

struct FakeWindow {
    handle: WindowHandle,
    elements: Vec<FakeElement>,
}

struct Scheduled {
    at: Instant,
    change: Box<dyn FnOnce(&mut FakeApp) + Send>,
}

/// State of the simulated application
pub struct FakeApp {
    windows: Vec<FakeWindow>,
    current: WindowHandle,
    next_element: u64,
    scheduled: Vec<Scheduled>,
    on_click: HashMap<String, ClickHandler>,
    actions: Vec<Action>,
    disconnected: Option<String>,
    invalid_selectors: HashSet<String>,
    stale_reads: HashMap<String, usize>,
}

impl FakeApp {
    fn new(main: &str) -> Self {
        let handle = WindowHandle::new(main);
        Self {
            windows: vec![FakeWindow {
                handle: handle.clone(),
                elements: Vec::new(),
            }],
            current: handle,
            next_element: 1,
            scheduled: Vec::new(),
            on_click: HashMap::new(),
            actions: Vec::new(),
            disconnected: None,
            invalid_selectors: HashSet::new(),
            stale_reads: HashMap::new(),
        }
    }

    /// Open a window; the session keeps targeting its current window
    pub fn open_window(&mut self, handle: &str) {
        self.windows.push(FakeWindow {
            handle: WindowHandle::new(handle),
            elements: Vec::new(),
        });
    }

    /// Close a window from the application side
    pub fn remove_window(&mut self, handle: &str) {
        self.windows.retain(|w| w.handle.as_str() != handle);
    }

    /// Set the text of the first element matching `selector`, creating it if needed
    pub fn set_element(&mut self, window: &str, selector: &str, text: &str) {
        let id = self.next_element;
        let Some(win) = self.window_mut(window) else {
            return;
        };
        if let Some(el) = win.elements.iter_mut().find(|e| e.selector == selector) {
            el.text = text.to_string();
            return;
        }
        win.elements.push(FakeElement {
            id,
            selector: selector.to_string(),
            text: text.to_string(),
            value: String::new(),
            displayed: true,
        });
        self.next_element += 1;
    }

    /// Append another element matching `selector` after the existing ones
    pub fn add_element(&mut self, window: &str, selector: &str, text: &str) {
        let id = self.next_element;
        if let Some(win) = self.window_mut(window) {
            win.elements.push(FakeElement {
                id,
                selector: selector.to_string(),
                text: text.to_string(),
                value: String::new(),
                displayed: true,
            });
            self.next_element += 1;
        }
    }

    pub fn set_displayed(&mut self, window: &str, selector: &str, displayed: bool) {
        if let Some(win) = self.window_mut(window) {
            for el in win.elements.iter_mut().filter(|e| e.selector == selector) {
                el.displayed = displayed;
            }
        }
    }

    /// Remove every element matching `selector`; outstanding references go stale
    pub fn remove_elements(&mut self, window: &str, selector: &str) {
        if let Some(win) = self.window_mut(window) {
            win.elements.retain(|e| e.selector != selector);
        }
    }

    /// Apply `change` once the tokio clock has advanced by `delay`
    pub fn after(&mut self, delay: Duration, change: impl FnOnce(&mut FakeApp) + Send + 'static) {
        self.scheduled.push(Scheduled {
            at: Instant::now() + delay,
            change: Box::new(change),
        });
    }

    /// Run `handler` every time an element matching `selector` is clicked
    pub fn on_click(
        &mut self,
        selector: &str,
        handler: impl Fn(&mut FakeApp) + Send + Sync + 'static,
    ) {
        self.on_click.insert(selector.to_string(), Arc::new(handler));
    }

    /// Make every later command fail as if the driver went away
    pub fn disconnect(&mut self, reason: &str) {
        self.disconnected = Some(reason.to_string());
    }

    /// Make lookups of `selector` fail as a malformed selector
    pub fn reject_selector(&mut self, selector: &str) {
        self.invalid_selectors.insert(selector.to_string());
    }

    /// Make the next `count` text reads of `selector` report a stale element
    pub fn stale_reads(&mut self, selector: &str, count: usize) {
        self.stale_reads.insert(selector.to_string(), count);
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Current editable value of the first element matching `selector`
    pub fn value_of(&self, window: &str, selector: &str) -> Option<String> {
        self.windows
            .iter()
            .find(|w| w.handle.as_str() == window)?
            .elements
            .iter()
            .find(|e| e.selector == selector)
            .map(|e| e.value.clone())
    }

    fn window_mut(&mut self, handle: &str) -> Option<&mut FakeWindow> {
        self.windows.iter_mut().find(|w| w.handle.as_str() == handle)
    }

    fn is_open(&self, handle: &WindowHandle) -> bool {
        self.windows.iter().any(|w| &w.handle == handle)
    }

    fn handles(&self) -> Vec<WindowHandle> {
        self.windows.iter().map(|w| w.handle.clone()).collect()
    }

    /// Apply every scheduled change that is due, including ones scheduled by them
    fn advance(&mut self) {
        loop {
            let now = Instant::now();
            let Some(pos) = self
                .scheduled
                .iter()
                .enumerate()
                .filter(|(_, s)| s.at <= now)
                .min_by_key(|(_, s)| s.at)
                .map(|(i, _)| i)
            else {
                return;
            };
            let due = self.scheduled.remove(pos);
            (due.change)(self);
        }
    }

    /// Common preamble for every command
    fn enter(&mut self) -> Result<()> {
        self.advance();
        match &self.disconnected {
            Some(reason) => Err(Error::SessionFailure(reason.clone())),
            None => Ok(()),
        }
    }

    fn current_window(&self) -> Result<&FakeWindow> {
        self.windows
            .iter()
            .find(|w| w.handle == self.current)
            .ok_or_else(|| Error::StaleHandle(self.current.clone()))
    }

    fn element(&mut self, element: &ElementRef) -> Result<&mut FakeElement> {
        let current = self.current.clone();
        let win = self
            .windows
            .iter_mut()
            .find(|w| w.handle == current)
            .ok_or(Error::StaleHandle(current))?;
        win.elements
            .iter_mut()
            .find(|e| e.id.to_string() == element.as_str())
            .ok_or_else(|| Error::StaleElement(format!("element {element} is detached")))
    }
}

/// Handle to a shared [`FakeApp`]; clones observe the same application
#[derive(Clone)]
pub struct FakeSession {
    app: Arc<Mutex<FakeApp>>,
}

impl FakeSession {
    /// Application with a single window named `main`
    pub fn new(main: &str) -> Self {
        Self {
            app: Arc::new(Mutex::new(FakeApp::new(main))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeApp> {
        self.app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inspect or change the application
    pub fn with<R>(&self, f: impl FnOnce(&mut FakeApp) -> R) -> R {
        f(&mut *self.lock())
    }

    /// Every command received so far
    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    /// Selectors clicked so far, in order
    pub fn clicks(&self) -> Vec<String> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Click { selector, .. } => Some(selector.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AutomationSession for FakeSession {
    async fn current_window(&mut self) -> Result<WindowHandle> {
        let mut app = self.lock();
        app.enter()?;
        Ok(app.current_window()?.handle.clone())
    }

    async fn window_handles(&mut self) -> Result<Vec<WindowHandle>> {
        let mut app = self.lock();
        app.enter()?;
        Ok(app.handles())
    }

    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<()> {
        let mut app = self.lock();
        app.enter()?;
        if !app.is_open(handle) {
            return Err(Error::StaleHandle(handle.clone()));
        }
        app.current = handle.clone();
        app.actions.push(Action::Switch(handle.clone()));
        Ok(())
    }

    async fn close_window(&mut self) -> Result<Vec<WindowHandle>> {
        let mut app = self.lock();
        app.enter()?;
        let closing = app.current_window()?.handle.clone();
        app.windows.retain(|w| w.handle != closing);
        app.actions.push(Action::Close(closing));
        Ok(app.handles())
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementRef>> {
        let mut app = self.lock();
        app.enter()?;
        if app.invalid_selectors.contains(selector) {
            return Err(Error::InvalidSelector {
                selector: selector.to_string(),
                message: "rejected by fake".to_string(),
            });
        }
        Ok(app
            .current_window()?
            .elements
            .iter()
            .filter(|e| e.selector == selector)
            .map(|e| ElementRef::new(e.id.to_string()))
            .collect())
    }

    async fn click(&mut self, element: &ElementRef) -> Result<()> {
        let mut app = self.lock();
        app.enter()?;
        let selector = app.element(element)?.selector.clone();
        let window = app.current.clone();
        app.actions.push(Action::Click {
            window,
            selector: selector.clone(),
        });
        if let Some(handler) = app.on_click.get(&selector).cloned() {
            handler(&mut *app);
        }
        Ok(())
    }

    async fn clear(&mut self, element: &ElementRef) -> Result<()> {
        let mut app = self.lock();
        app.enter()?;
        app.element(element)?.value.clear();
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<()> {
        let mut app = self.lock();
        app.enter()?;
        let el = app.element(element)?;
        el.value.push_str(text);
        let selector = el.selector.clone();
        let window = app.current.clone();
        app.actions.push(Action::SetValue {
            window,
            selector,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn text(&mut self, element: &ElementRef) -> Result<String> {
        let mut app = self.lock();
        app.enter()?;
        let selector = app.element(element)?.selector.clone();
        if let Some(remaining) = app.stale_reads.get_mut(&selector) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::StaleElement(format!("{selector} re-rendered")));
            }
        }
        Ok(app.element(element)?.text.clone())
    }

    async fn is_displayed(&mut self, element: &ElementRef) -> Result<bool> {
        let mut app = self.lock();
        app.enter()?;
        Ok(app.element(element)?.displayed)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        let mut app = self.lock();
        app.enter()?;
        let window = app.current_window()?.handle.clone();
        app.actions.push(Action::Screenshot(window));
        Ok(FAKE_PNG.to_vec())
    }

    async fn quit(&mut self) -> Result<()> {
        let mut app = self.lock();
        app.actions.push(Action::Quit);
        app.disconnected = Some("session quit".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_changes_apply_on_next_command() {
        let mut fake = FakeSession::new("main");
        fake.with(|app| {
            app.after(Duration::from_secs(1), |app| app.open_window("downloads"));
        });

        assert_eq!(fake.window_handles().await.unwrap().len(), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fake.window_handles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_removed_element_goes_stale() {
        let mut fake = FakeSession::new("main");
        fake.with(|app| app.set_element("main", "#go", "Go"));

        let found = fake.find_elements("#go").await.unwrap();
        fake.with(|app| app.remove_elements("main", "#go"));

        let err = fake.click(&found[0]).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_click_handler_runs() {
        let mut fake = FakeSession::new("main");
        fake.with(|app| {
            app.set_element("main", "#open", "Open");
            app.on_click("#open", |app| app.open_window("second"));
        });

        let found = fake.find_elements("#open").await.unwrap();
        fake.click(&found[0]).await.unwrap();
        assert_eq!(fake.with(|app| app.window_count()), 2);
        assert_eq!(fake.clicks(), vec!["#open".to_string()]);
    }
}
