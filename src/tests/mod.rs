mod gga;

mod averager;
mod survey;

pub use doubles::*;
pub use gga::*;

use log::LevelFilter;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();

static SCRATCH: AtomicUsize = AtomicUsize::new(0);

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Unique scratch directory, per test
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "autobase-{}-{}-{}",
        name,
        std::process::id(),
        SCRATCH.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&path);
    std::fs::create_dir_all(&path).unwrap();
    path
}
