use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use gtk4::prelude::*;
use gtk4::Application;
use tracing::{error, info};

use crate::config::BoardConfig;
use crate::gallery::GalleryEngine;
use crate::layout::table_file;
use crate::models::Catalog;
use crate::ui::MainWindow;

const APP_ID: &str = "com.corkboard.ActivityBoard";

/// Process status when the board could not be built.
const STARTUP_FAILURE: i32 = 1;

/// Catalog and layout tables for `asset_dir`, checked against each other.
pub fn build_engine(config: &BoardConfig, asset_dir: &Path) -> Result<GalleryEngine> {
    let catalog = Catalog::builtin().with_asset_root(asset_dir);
    let tables = table_file::resolve(config.layout_path.as_deref(), &catalog)?;
    tables
        .validate(&catalog)
        .context("Layout tables do not cover the photo catalog")?;
    info!(
        photos = catalog.len(),
        assets = ?asset_dir,
        "Loaded photo catalog"
    );
    Ok(GalleryEngine::new(catalog, tables))
}

/// Status for `run`: the main loop's own code unless startup failed.
fn exit_status(loop_status: i32, startup_failed: bool) -> i32 {
    if startup_failed && loop_status == 0 {
        STARTUP_FAILURE
    } else {
        loop_status
    }
}

pub struct CorkboardApp {
    app: Application,
    startup_failed: Rc<Cell<bool>>,
}

impl CorkboardApp {
    pub fn new() -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::HANDLES_OPEN)
            .build();

        let startup_failed = Rc::new(Cell::new(false));

        let failed = startup_failed.clone();
        app.connect_activate(move |app| {
            if !Self::start(app, None) {
                failed.set(true);
            }
        });
        let failed = startup_failed.clone();
        app.connect_open(move |app, files, _hint| {
            let path = files.first().and_then(|f| f.path());
            if !Self::start(app, path.as_deref()) {
                failed.set(true);
            }
        });

        Self {
            app,
            startup_failed,
        }
    }

    pub fn run(&self) -> i32 {
        let status: i32 = self.app.run().into();
        exit_status(status, self.startup_failed.get())
    }

    /// Builds and shows the main window. Returns false when the board could not
    /// be built and the application is quitting.
    fn start(app: &Application, asset_dir: Option<&Path>) -> bool {
        let config = BoardConfig::from_env();
        let asset_dir = asset_dir.unwrap_or(&config.asset_dir).to_path_buf();

        let window = build_engine(&config, &asset_dir)
            .and_then(|engine| MainWindow::new(app, config, engine));
        match window {
            Ok(window) => {
                window.present();
                // Keep the window alive by storing it on the Application.
                unsafe {
                    app.set_data("main-window", window);
                }
                true
            }
            Err(err) => {
                error!(error = ?err, "Failed to start the board");
                app.quit();
                false
            }
        }
    }
}

impl Default for CorkboardApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::LayoutError;
    use crate::layout::ViewportMode;
    use tempfile::tempdir;

    #[test]
    fn engine_resolves_sources_under_asset_dir() {
        let dir = tempdir().unwrap();
        let engine = build_engine(&BoardConfig::default(), dir.path()).unwrap();
        assert!(engine
            .catalog()
            .entries()
            .iter()
            .all(|entry| entry.src.starts_with(dir.path())));
        assert!(engine.photos().is_empty());
    }

    #[test]
    fn broken_layout_override_refuses_to_start() {
        let dir = tempdir().unwrap();
        let layout = dir.path().join("layout.toml");
        std::fs::write(&layout, "desktop = 3").unwrap();
        let config = BoardConfig {
            layout_path: Some(layout),
            ..BoardConfig::default()
        };

        assert!(build_engine(&config, dir.path()).is_err());
    }

    #[test]
    fn layout_override_missing_a_photo_refuses_to_start() {
        let dir = tempdir().unwrap();
        let layout = dir.path().join("layout.toml");
        std::fs::write(
            &layout,
            "[[desktop]]\nid = 1\nx = 10\ny = 10\nwidth = 200\nheight = 150\n",
        )
        .unwrap();
        let config = BoardConfig {
            layout_path: Some(layout),
            ..BoardConfig::default()
        };

        let err = build_engine(&config, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LayoutError>(),
            Some(LayoutError::MissingEntry { .. })
        ));
    }

    #[test]
    fn absent_layout_override_uses_builtin() {
        let dir = tempdir().unwrap();
        let config = BoardConfig {
            layout_path: Some(dir.path().join("layout.toml")),
            ..BoardConfig::default()
        };

        let mut engine = build_engine(&config, dir.path()).unwrap();
        assert_eq!(engine.set_viewport_mode(ViewportMode::Desktop), Ok(true));
        assert_eq!(engine.photos().len(), 8);
    }

    #[test]
    fn failed_startup_exits_nonzero() {
        assert_eq!(exit_status(0, true), STARTUP_FAILURE);
        assert_eq!(exit_status(2, true), 2);
        assert_eq!(exit_status(0, false), 0);
    }
}
