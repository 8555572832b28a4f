use std::{
    fs,
    io::{self, BufRead, BufReader},
    path::Path,
    process::{Child, Command as StdCommand, Stdio},
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

use super::types::{CameraConfig, CameraFeed};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running ffmpeg conversion. The slot is emptied when the process exits
/// or is killed.
pub struct FeedProcess {
    child: Arc<Mutex<Option<Child>>>,
}

impl FeedProcess {
    pub fn is_running(&self) -> bool {
        self.child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Kill the process if it is still running. Returns whether it was.
    pub fn kill(&self) -> bool {
        let taken = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match taken {
            Some(mut child) => {
                if let Err(e) = child.kill() {
                    log::warn!("Failed to kill ffmpeg (PID {}): {}", child.id(), e);
                }
                let _ = child.wait();
                true
            }
            None => false,
        }
    }
}

pub fn ffmpeg_args(config: &CameraConfig, feed: &CameraFeed) -> Vec<String> {
    vec![
        "-rtsp_transport".into(),
        "tcp".into(),
        "-i".into(),
        feed.rtsp_url.clone(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "veryfast".into(),
        "-tune".into(),
        "zerolatency".into(),
        "-c:a".into(),
        "aac".into(),
        "-f".into(),
        "hls".into(),
        "-hls_time".into(),
        config.segment_seconds.to_string(),
        "-hls_list_size".into(),
        config.playlist_size.to_string(),
        "-hls_flags".into(),
        "delete_segments".into(),
        config.playlist_path().to_string_lossy().to_string(),
    ]
}

/// Delete playlists and segments left by a previous feed.
pub fn clean_hls_output(folder: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let is_hls = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("m3u8") | Some("ts") | Some("tmp")
        );
        if is_hls && path.is_file() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
    Ok(removed)
}

pub fn spawn(config: &CameraConfig, feed: &CameraFeed) -> io::Result<FeedProcess> {
    let mut child = StdCommand::new(&config.ffmpeg)
        .args(ffmpeg_args(config, feed))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    log::info!(
        "Camera feed {} ({}) started (PID: {})",
        feed.id,
        feed.name,
        child.id()
    );

    if let Some(stderr) = child.stderr.take() {
        let url = feed.rtsp_url.clone();
        let feed_id = feed.id;
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                log::debug!("[ffmpeg {}] {}", feed_id, redact(&line, &url));
            }
        });
    }

    let child_arc = Arc::new(Mutex::new(Some(child)));
    let child_arc_clone = child_arc.clone();
    let feed_id = feed.id;

    thread::spawn(move || {
        monitor(child_arc_clone, feed_id);
    });

    Ok(FeedProcess { child: child_arc })
}

fn monitor(child_arc: Arc<Mutex<Option<Child>>>, feed_id: u32) {
    loop {
        let result = {
            let mut child_guard = child_arc.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *child_guard {
                Some(child) => child.try_wait(),
                // killed by the supervisor
                None => return,
            }
        };

        match result {
            Ok(Some(status)) => {
                log::info!(
                    "Camera feed {} ffmpeg exited with code {}",
                    feed_id,
                    status.code().unwrap_or(-1)
                );
                child_arc
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                return;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                log::error!("Camera feed {} wait error: {}", feed_id, e);
                return;
            }
        }
    }
}

fn redact(line: &str, url: &str) -> String {
    if url.is_empty() {
        line.to_string()
    } else {
        line.replace(url, "<rtsp source>")
    }
}
