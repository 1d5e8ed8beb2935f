//! Install flow
//!
//! Finds a known game, installs and launches it, force-closes it, checks the
//! downloads window, re-installs it, browses its install location from the
//! preferences window, then uninstalls it.

use async_trait::async_trait;
use std::time::Duration;

use crate::common::Result;
use crate::runner::{Flow, Runner};

/// Bound for the install to finish in the background
const INSTALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Game used by the flow; small and stable on the store
#[derive(Debug, Clone)]
pub struct InstallFlow {
    pub game_name: String,
    pub game_id: u64,
}

impl Default for InstallFlow {
    fn default() -> Self {
        Self {
            game_name: "111 first".to_string(),
            game_id: 149766,
        }
    }
}

impl InstallFlow {
    pub fn search_result_selector(&self) -> String {
        format!(
            ".results-container .game-search-result[data-game-id='{}']",
            self.game_id
        )
    }

    pub fn main_action_selector(&self) -> String {
        format!(".meat-tab.visible .main-action[data-game-id='{}']", self.game_id)
    }

    pub fn download_row_selector(&self) -> String {
        format!(
            ".meat-tab.visible .download-row-item.finished[data-game-id='{}'] .control--title",
            self.game_id
        )
    }

    pub fn location_row_selector(&self) -> String {
        format!(
            ".meat-tab.visible .gameseries--box[data-game-id='{}']",
            self.game_id
        )
    }
}

#[async_trait]
impl Flow for InstallFlow {
    fn name(&self) -> &str {
        "install"
    }

    fn description(&self) -> &str {
        "install, launch, force-close, re-install and uninstall a known game"
    }

    async fn run(&self, r: &mut Runner) -> Result<()> {
        let main_action = self.main_action_selector();

        r.log("searching for known game");
        r.click("#search").await?;
        r.set_value("#search", &self.game_name).await?;

        r.log("opening it");
        r.click(&self.search_result_selector()).await?;

        let main_window = r.get_single_window_handle().await?;

        r.log("installing it");
        r.wait_until_text_exists(&main_action, "Install").await?;
        r.click(&main_action).await?;

        r.log("launching it");
        r.wait_until_text_exists_with_timeout(&main_action, "Launch", INSTALL_TIMEOUT)
            .await?;
        r.click(&main_action).await?;

        r.log("force-closing it");
        r.wait_until_text_exists(&main_action, "Running").await?;
        r.click(&main_action).await?;
        r.click("#modal-force-close").await?;

        r.log("making sure it's closed");
        r.wait_until_text_exists(&main_action, "Launch").await?;

        r.log("switching to downloads window");
        r.click("#sidebar a[href='itch://downloads']").await?;
        r.wait_for_window_quantity(2).await?;
        r.switch_to_other_window(&main_window).await?;

        r.log("making sure our download shows up as finished");
        r.wait_until_text_exists(&self.download_row_selector(), &self.game_name)
            .await?;
        r.take_screenshot("finished download").await;

        r.log("clearing downloads");
        r.click(".meat-tab.visible .downloads-clear-all").await?;

        r.log("making sure downloads list is empty now");
        r.wait_for_visible(".meat-tab.visible .no-active-downloads")
            .await?;

        r.log("closing downloads window");
        r.close_current_window_and_switch_to(&main_window).await?;
        r.take_screenshot("installed game tab").await;

        r.log("re-installing it");
        r.click(".meat-tab.visible .manage-game").await?;
        r.click(".manage-cave").await?;
        r.click(".manage-reinstall").await?;
        r.wait_until_text_exists(&main_action, "Launch").await?;

        r.log("closing downloads window");
        r.close_all_other_windows().await?;

        r.log("opening preferences");
        r.click("#sidebar a[href='itch://preferences']").await?;
        r.wait_for_window_quantity(2).await?;
        r.switch_to_other_window(&main_window).await?;

        r.log("opening default install location in tab");
        r.click(".meat-tab.visible .install-location-row.default .navigate-button")
            .await?;

        r.switch_to_window(&main_window).await?;
        r.close_all_other_windows().await?;

        r.log("making sure our installed game shows up");
        let row = self.location_row_selector();
        r.wait_until_text_exists(&format!("{row} .gamedesc--title"), &self.game_name)
            .await?;
        r.take_screenshot("install location tab").await;

        r.log("open it again");
        r.click(&format!("{row} .gamedesc--titlelink")).await?;
        r.wait_until_text_exists(".title-bar-text", &self.game_name)
            .await?;

        r.log("uninstalling it");
        r.wait_until_text_exists(&main_action, "Launch").await?;
        r.click(".meat-tab.visible .manage-game").await?;
        r.take_screenshot("managing uploads").await;
        r.click(".manage-cave").await?;
        r.click(".manage-uninstall").await?;
        r.wait_until_text_exists(&main_action, "Install").await?;

        r.close_all_other_windows().await
    }
}
