// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use digipop_source::Loader;
use digipop_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;

/// Runs the single dataset load on a background thread so the form is
/// usable while the request is in flight.
pub struct LoaderRuntime {
    loader: Option<Loader>,
    source: String,
}

impl LoaderRuntime {
    pub fn new(loader: Loader) -> Self {
        Self {
            source: loader.describe(),
            loader: Some(loader),
        }
    }
}

impl digipop_tui::AppRuntime for LoaderRuntime {
    fn dataset_source(&self) -> String {
        self.source.clone()
    }

    fn spawn_dataset_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let Some(loader) = self.loader.take() else {
            return Ok(());
        };
        thread::Builder::new()
            .name("dataset-load".to_owned())
            .spawn(move || {
                let dataset = loader.load_or_empty();
                let _ = tx.send(InternalEvent::DatasetLoaded(dataset));
            })
            .context("spawn dataset load thread")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LoaderRuntime;
    use anyhow::Result;
    use digipop_app::Dataset;
    use digipop_source::Loader;
    use digipop_testkit::{RecordFaker, records_json, temp_json_path};
    use digipop_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::time::Duration;

    fn next_dataset(rx: &mpsc::Receiver<InternalEvent>) -> Result<Dataset> {
        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::DatasetLoaded(dataset) => Ok(dataset),
            other => anyhow::bail!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn spawned_load_delivers_file_dataset() -> Result<()> {
        let dataset = RecordFaker::new(11).dataset(8);
        let (_dir, path) = temp_json_path(&records_json(&dataset))?;
        let mut runtime = LoaderRuntime::new(Loader::file(&path));
        assert_eq!(runtime.dataset_source(), path.display().to_string());

        let (tx, rx) = mpsc::channel();
        runtime.spawn_dataset_load(tx)?;
        assert_eq!(next_dataset(&rx)?, dataset);
        Ok(())
    }

    #[test]
    fn failed_load_delivers_empty_dataset() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut runtime = LoaderRuntime::new(Loader::file(temp.path().join("absent.json")));

        let (tx, rx) = mpsc::channel();
        runtime.spawn_dataset_load(tx)?;
        assert!(next_dataset(&rx)?.is_empty());
        Ok(())
    }

    #[test]
    fn dataset_is_loaded_only_once() -> Result<()> {
        let mut runtime = LoaderRuntime::new(Loader::demo());
        let (tx, rx) = mpsc::channel();
        runtime.spawn_dataset_load(tx.clone())?;
        runtime.spawn_dataset_load(tx)?;

        assert!(!next_dataset(&rx)?.is_empty());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        Ok(())
    }
}
