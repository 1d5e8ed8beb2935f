//! Automation session backends
//!
//! The runner talks to the application under test only through
//! [`AutomationSession`]. Two backends ship with the crate: a W3C WebDriver
//! client for real runs and an in-memory fake for tests.

pub mod fake;
pub mod protocol;
pub mod types;
pub mod webdriver;

use async_trait::async_trait;

use crate::common::Result;

pub use fake::FakeSession;
pub use types::{ElementRef, WindowHandle};
pub use webdriver::WebDriverSession;

/// Commands an automation layer must support for the runner
///
/// Element lookups and element commands apply to the window the session is
/// currently switched to. Lookups return matches in document order.
#[async_trait]
pub trait AutomationSession: Send {
    /// Window the session currently targets
    async fn current_window(&mut self) -> Result<WindowHandle>;

    /// All open windows
    async fn window_handles(&mut self) -> Result<Vec<WindowHandle>>;

    /// Target another open window
    async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<()>;

    /// Close the targeted window, returning the windows left open
    async fn close_window(&mut self) -> Result<Vec<WindowHandle>>;

    /// Elements matching a CSS selector; empty when nothing matches
    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementRef>>;

    async fn click(&mut self, element: &ElementRef) -> Result<()>;

    async fn clear(&mut self, element: &ElementRef) -> Result<()>;

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<()>;

    /// Rendered text content of an element
    async fn text(&mut self, element: &ElementRef) -> Result<String>;

    async fn is_displayed(&mut self, element: &ElementRef) -> Result<bool>;

    /// PNG screenshot of the targeted window
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    /// End the session
    async fn quit(&mut self) -> Result<()>;
}
