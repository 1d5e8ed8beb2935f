//! One-shot UI actions
//!
//! Actions look their element up once. When nothing matches they fail with
//! [`Error::NotFound`] instead of waiting; flows that need the element to
//! appear first precede the action with an assertion.

use crate::common::{Error, Result};
use crate::driver::ElementRef;

use super::Runner;

impl Runner {
    /// Click the first element matching `selector` in the active window
    pub async fn click(&mut self, selector: &str) -> Result<()> {
        self.begin("click", Some(selector), None)?;
        let element = self.first_match(selector).await?;
        self.session.click(&element).await?;
        tracing::debug!(selector, "Clicked");
        self.finish();
        Ok(())
    }

    /// Replace the editable value of the first element matching `selector`
    pub async fn set_value(&mut self, selector: &str, text: &str) -> Result<()> {
        self.begin("set_value", Some(selector), Some(format!("value {text:?}")))?;
        let element = self.first_match(selector).await?;
        self.session.clear(&element).await?;
        self.session.send_keys(&element, text).await?;
        tracing::debug!(selector, text, "Value set");
        self.finish();
        Ok(())
    }

    async fn first_match(&mut self, selector: &str) -> Result<ElementRef> {
        self.target_active().await?;
        self.session
            .find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(selector))
    }
}
