//! Window bookkeeping
//!
//! The application opens and closes auxiliary windows asynchronously, so
//! flows first wait for the expected window count and only then address the
//! new window. Every operation that succeeds leaves the active handle naming
//! an open window.

use std::time::Duration;

use crate::common::{Error, Result};
use crate::driver::WindowHandle;

use super::poll::{poll, PollOptions, Probe};
use super::Runner;

impl Runner {
    /// All windows currently open
    pub async fn window_handles(&mut self) -> Result<Vec<WindowHandle>> {
        self.session.window_handles().await
    }

    /// Handle of the only open window
    ///
    /// Used to remember the main window before an action that may spawn
    /// another one.
    pub async fn get_single_window_handle(&mut self) -> Result<WindowHandle> {
        self.begin(
            "get_single_window_handle",
            None,
            Some("exactly one window".to_string()),
        )?;
        let handles = self.session.window_handles().await?;
        match handles.as_slice() {
            [only] => {
                self.active = only.clone();
                self.finish();
                Ok(only.clone())
            }
            _ => Err(Error::ambiguous_window("exactly one window", handles.len())),
        }
    }

    /// Wait until exactly `count` windows are open
    pub async fn wait_for_window_quantity(&mut self, count: usize) -> Result<()> {
        let timeout = self.options.default_timeout;
        self.wait_for_window_quantity_with_timeout(count, timeout)
            .await
    }

    pub async fn wait_for_window_quantity_with_timeout(
        &mut self,
        count: usize,
        timeout: Duration,
    ) -> Result<()> {
        self.begin(
            "wait_for_window_quantity",
            None,
            Some(format!("{count} open window(s)")),
        )?;
        let opts = PollOptions::new(
            self.options.poll_interval,
            timeout,
            format!("{count} open window(s)"),
        );

        let handles = poll(self.session.as_mut(), &opts, move |session| {
            Box::pin(async move {
                let handles = session.window_handles().await?;
                if handles.len() == count {
                    Ok(Probe::Ready(handles))
                } else {
                    Ok(Probe::Pending(format!("{} window(s)", handles.len())))
                }
            })
        })
        .await?;

        if !handles.contains(&self.active) {
            return Err(Error::StaleHandle(self.active.clone()));
        }
        tracing::debug!(count, "Window count reached");
        self.finish();
        Ok(())
    }

    /// Make the one window other than `excluding` active and return it
    ///
    /// Only valid once the window count has been pinned down, typically to
    /// two with [`Runner::wait_for_window_quantity`].
    pub async fn switch_to_other_window(
        &mut self,
        excluding: &WindowHandle,
    ) -> Result<WindowHandle> {
        self.begin(
            "switch_to_other_window",
            None,
            Some(format!("exactly one window other than {excluding}")),
        )?;
        let handles = self.session.window_handles().await?;
        let others: Vec<&WindowHandle> = handles.iter().filter(|h| *h != excluding).collect();

        match others.as_slice() {
            [other] => {
                let other = (*other).clone();
                self.focus(&other).await?;
                self.finish();
                Ok(other)
            }
            _ => Err(Error::ambiguous_window(
                &format!("exactly one window other than {excluding}"),
                handles.len(),
            )),
        }
    }

    /// Make `handle` the active window
    pub async fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<()> {
        self.begin("switch_to_window", None, Some(format!("window {handle} open")))?;
        let handles = self.session.window_handles().await?;
        if !handles.contains(handle) {
            return Err(Error::StaleHandle(handle.clone()));
        }
        self.focus(handle).await?;
        self.finish();
        Ok(())
    }

    /// Close the active window, then make `handle` active
    pub async fn close_current_window_and_switch_to(
        &mut self,
        handle: &WindowHandle,
    ) -> Result<()> {
        self.begin(
            "close_current_window_and_switch_to",
            None,
            Some(format!("window {handle} open after closing {}", self.active)),
        )?;
        if *handle == self.active {
            return Err(Error::WindowConflict(format!(
                "cannot close window {handle} and switch to it"
            )));
        }

        self.target_active().await?;
        let closed = self.active.clone();
        let remaining = self.session.close_window().await?;
        self.focused = None;
        tracing::debug!(window = %closed, "Window closed");

        if !remaining.contains(handle) {
            return Err(Error::StaleHandle(handle.clone()));
        }
        self.focus(handle).await?;
        self.finish();
        Ok(())
    }

    /// Close every window but the active one; a no-op when it is alone
    pub async fn close_all_other_windows(&mut self) -> Result<()> {
        self.begin("close_all_other_windows", None, None)?;
        let handles = self.session.window_handles().await?;
        if !handles.contains(&self.active) {
            return Err(Error::StaleHandle(self.active.clone()));
        }

        let others: Vec<WindowHandle> =
            handles.into_iter().filter(|h| *h != self.active).collect();
        if others.is_empty() {
            self.finish();
            return Ok(());
        }

        for other in &others {
            self.session.switch_to_window(other).await?;
            self.focused = Some(other.clone());
            self.session.close_window().await?;
            self.focused = None;
            tracing::debug!(window = %other, "Window closed");
        }

        let active = self.active.clone();
        self.focus(&active).await?;
        self.finish();
        Ok(())
    }

    /// Switch the session and the active handle to an open window
    async fn focus(&mut self, handle: &WindowHandle) -> Result<()> {
        self.session.switch_to_window(handle).await?;
        self.active = handle.clone();
        self.focused = Some(handle.clone());
        tracing::debug!(window = %handle, "Active window changed");
        Ok(())
    }
}
