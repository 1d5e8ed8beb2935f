//! End-to-end tests for the built-in install flow
//!
//! These tests script an in-memory application that reacts to clicks the way
//! the real desktop app does (windows opening late, buttons changing label
//! while a background install runs) and run the flow against it on a paused
//! tokio clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uiflow::driver::fake::Action;
use uiflow::driver::{FakeSession, WindowHandle};
use uiflow::flows::InstallFlow;
use uiflow::runner::Artifacts;
use uiflow::{Error, Runner, RunnerOptions};

const SEARCH: &str = "#search";
const DOWNLOADS_LINK: &str = "#sidebar a[href='itch://downloads']";
const PREFERENCES_LINK: &str = "#sidebar a[href='itch://preferences']";
const CLEAR_ALL: &str = ".meat-tab.visible .downloads-clear-all";
const NO_DOWNLOADS: &str = ".meat-tab.visible .no-active-downloads";
const NAVIGATE: &str = ".meat-tab.visible .install-location-row.default .navigate-button";
const MANAGE_GAME: &str = ".meat-tab.visible .manage-game";
const FORCE_CLOSE: &str = "#modal-force-close";

/// Which parts of the scripted app misbehave
#[derive(Default, Clone, Copy)]
struct Quirks {
    /// Uninstalling never brings the "Install" label back
    uninstall_hangs: bool,
}

/// Build an app that walks through the install flow
fn scripted_app(flow: &InstallFlow, quirks: Quirks) -> FakeSession {
    let fake = FakeSession::new("main");
    let name = flow.game_name.clone();
    let main_action = flow.main_action_selector();
    let download_row = flow.download_row_selector();
    let row = flow.location_row_selector();

    fake.with(|app| {
        app.set_element("main", SEARCH, "");
        app.set_element("main", DOWNLOADS_LINK, "Downloads");
        app.set_element("main", PREFERENCES_LINK, "Preferences");
        app.set_element("main", MANAGE_GAME, "Manage");
        app.set_element("main", ".manage-cave", "111 first.zip");
        app.set_element("main", ".manage-reinstall", "Reinstall");
        app.set_element("main", ".manage-uninstall", "Uninstall");

        // Search results show up after typing
        let result = flow.search_result_selector();
        app.set_element("main", &result, &name);
        {
            let main_action = main_action.clone();
            app.on_click(&result, move |app| {
                app.set_element("main", &main_action, "Install");
            });
        }

        // Install -> Launch -> Running -> force-close modal
        let presses = Arc::new(AtomicUsize::new(0));
        {
            let main_action = main_action.clone();
            app.on_click(&main_action.clone(), move |app| {
                match presses.fetch_add(1, Ordering::SeqCst) {
                    0 => {
                        app.set_element("main", &main_action, "Installing (12%)");
                        let main_action = main_action.clone();
                        app.after(Duration::from_secs(12), move |app| {
                            app.set_element("main", &main_action, "Launch");
                        });
                    }
                    1 => {
                        let main_action = main_action.clone();
                        app.after(Duration::from_millis(800), move |app| {
                            app.set_element("main", &main_action, "Running...");
                        });
                    }
                    _ => app.set_element("main", FORCE_CLOSE, "Force close"),
                }
            });
        }
        {
            let main_action = main_action.clone();
            app.on_click(FORCE_CLOSE, move |app| {
                app.remove_elements("main", FORCE_CLOSE);
                let main_action = main_action.clone();
                app.after(Duration::from_millis(300), move |app| {
                    app.set_element("main", &main_action, "Launch");
                });
            });
        }

        // Downloads window opens asynchronously
        {
            let name = name.clone();
            app.on_click(DOWNLOADS_LINK, move |app| {
                let name = name.clone();
                let download_row = download_row.clone();
                app.after(Duration::from_millis(700), move |app| {
                    app.open_window("downloads");
                    app.set_element("downloads", &download_row, &name);
                    app.set_element("downloads", CLEAR_ALL, "Clear all");
                    app.on_click(CLEAR_ALL, move |app| {
                        app.remove_elements("downloads", &download_row);
                        app.after(Duration::from_millis(200), |app| {
                            app.set_element("downloads", NO_DOWNLOADS, "No downloads");
                        });
                    });
                });
            });
        }

        // Re-installing pops the downloads window again
        {
            let main_action = main_action.clone();
            app.on_click(".manage-reinstall", move |app| {
                app.set_element("main", &main_action, "Installing");
                app.open_window("downloads-again");
                let main_action = main_action.clone();
                app.after(Duration::from_secs(2), move |app| {
                    app.set_element("main", &main_action, "Launch");
                });
            });
        }

        // Preferences window with a link to the install location
        {
            let name = name.clone();
            let row = row.clone();
            app.on_click(PREFERENCES_LINK, move |app| {
                app.after(Duration::from_millis(400), |app| {
                    app.open_window("preferences");
                    app.set_element("preferences", NAVIGATE, "Navigate");
                });
                let name = name.clone();
                let row = row.clone();
                app.on_click(NAVIGATE, move |app| {
                    app.set_element("main", &format!("{row} .gamedesc--title"), &name);
                    app.set_element("main", &format!("{row} .gamedesc--titlelink"), &name);
                    let name = name.clone();
                    app.on_click(&format!("{row} .gamedesc--titlelink"), move |app| {
                        app.set_element("main", ".title-bar-text", &format!("{name} - itch"));
                    });
                });
            });
        }

        if !quirks.uninstall_hangs {
            app.on_click(".manage-uninstall", move |app| {
                let main_action = main_action.clone();
                app.after(Duration::from_secs(1), move |app| {
                    app.set_element("main", &main_action, "Install");
                });
            });
        }
    });

    fake
}

#[tokio::test(start_paused = true)]
async fn test_install_flow_passes() {
    let flow = InstallFlow::default();
    let fake = scripted_app(&flow, Quirks::default());
    let tmp = tempfile::tempdir().unwrap();

    let mut runner = Runner::new(Box::new(fake.clone()), RunnerOptions::default())
        .await
        .unwrap()
        .with_artifacts(Artifacts::create(tmp.path()).unwrap());

    let report = runner.run_flow(&flow).await.unwrap();

    assert_eq!(report.flow, "install");
    assert_eq!(report.steps, 39);
    let names: Vec<String> = report
        .screenshots
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "01-finished-download.png",
            "02-installed-game-tab.png",
            "03-install-location-tab.png",
            "04-managing-uploads.png",
        ]
    );

    // Only the main window survives, and it is where the flow ended
    assert_eq!(fake.with(|app| app.window_count()), 1);
    assert_eq!(runner.active_window(), &WindowHandle::new("main"));
    assert_eq!(
        fake.with(|app| app.value_of("main", SEARCH)),
        Some("111 first".to_string())
    );

    // The downloads list was cleared from the downloads window
    assert!(fake.actions().contains(&Action::Click {
        window: WindowHandle::new("downloads"),
        selector: CLEAR_ALL.to_string(),
    }));
    assert!(fake.actions().contains(&Action::Close(WindowHandle::new("downloads-again"))));
    assert!(fake.actions().contains(&Action::Close(WindowHandle::new("preferences"))));
}

#[tokio::test(start_paused = true)]
async fn test_install_flow_stops_at_first_failure() {
    let flow = InstallFlow::default();
    let fake = scripted_app(
        &flow,
        Quirks {
            uninstall_hangs: true,
        },
    );
    let tmp = tempfile::tempdir().unwrap();

    let mut runner = Runner::new(Box::new(fake.clone()), RunnerOptions::default())
        .await
        .unwrap()
        .with_artifacts(Artifacts::create(tmp.path()).unwrap());

    let err = runner.run_flow(&flow).await.unwrap_err();

    let Error::Aborted(failure) = &err else {
        panic!("expected an aborted run, got {err:?}");
    };
    assert_eq!(failure.operation, "wait_for");
    assert_eq!(failure.selector.as_deref(), Some(flow.main_action_selector().as_str()));
    assert!(matches!(failure.cause, Error::Timeout { .. }));
    assert!(failure.elapsed >= Duration::from_secs(10));
    assert!(failure
        .screenshot
        .as_ref()
        .unwrap()
        .ends_with("05-failure-wait-for.png"));

    // Nothing runs once the flow has been aborted
    let clicks = fake.clicks().len();
    assert!(matches!(runner.click(MANAGE_GAME).await, Err(Error::RunAborted)));
    assert_eq!(fake.clicks().len(), clicks);
    assert!(err.to_string().contains("Install"));
}
