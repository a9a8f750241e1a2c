use crossbeam_channel::{Receiver, TryRecvError};
use plycloud::PointCloud;
use std::{
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

#[derive(Debug)]
pub enum LoadEvent {
    Loaded(PointCloud),
    Failed { path: PathBuf, error: String },
}

/// Reads one PLY file on a background thread.
pub struct AssetLoader {
    rx: Option<Receiver<LoadEvent>>,
}

impl AssetLoader {
    pub fn spawn(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = crossbeam_channel::bounded(1);

        let spawned = thread::Builder::new()
            .name("ply-loader".into())
            .spawn(move || {
                let event = load(path);
                // Receiver gone means the viewer already shut down.
                let _ = tx.send(event);
            });

        match spawned {
            Ok(_) => Self { rx: Some(rx) },
            Err(e) => {
                log::error!("Failed to start loader thread: {e}");
                Self { rx: None }
            }
        }
    }

    /// Non-blocking check for the load result. Yields at most one event over
    /// the loader's lifetime.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(event) => {
                self.rx = None;
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::error!("Loader thread ended without a result");
                self.rx = None;
                None
            }
        }
    }
}

fn load(path: PathBuf) -> LoadEvent {
    let start = Instant::now();
    log::info!("Loading point cloud from '{}'", path.display());

    match plycloud::read_ply(&path) {
        Ok(cloud) if cloud.is_empty() => LoadEvent::Failed {
            path,
            error: "file contains no vertices".to_string(),
        },
        Ok(cloud) => {
            log::info!(
                "Read {} points ({}) in {:.2?}",
                cloud.len(),
                if cloud.colors().is_some() { "colored" } else { "uncolored" },
                start.elapsed()
            );
            LoadEvent::Loaded(cloud)
        }
        Err(e) => LoadEvent::Failed {
            path,
            error: e.to_string(),
        },
    }
}
