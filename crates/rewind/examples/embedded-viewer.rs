//! Embeds the decoder in a render loop: the listener runs on its own thread
//! and hands frames over a channel.
//!
//! Run with:
//!   cargo run --example embedded-viewer
//!
//! In another terminal:
//!   cargo run --features cli -- demo 127.0.0.1:9111 --frames 20

use std::sync::mpsc;

use rewind::frame::SceneEvent;
use rewind::listener::NetListener;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::var("REWIND_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:9111".into());
    let listener = NetListener::bind(addr.as_str())?;
    eprintln!("Listening on {}", listener.local_addr());

    let (tx, rx) = mpsc::channel();
    let session = listener.spawn(tx)?;

    // The sender is dropped when the session ends, which ends this loop.
    for event in rx {
        match event {
            SceneEvent::Frame(frame) => {
                eprintln!(
                    "frame: {} primitives, message={:?}",
                    frame.primitive_count(),
                    frame.message
                );
            }
            SceneEvent::Area(area) => {
                eprintln!("area ({}, {}) {:?}", area.x, area.y, area.area_type);
            }
        }
    }

    match session.join() {
        Ok(summary) => eprintln!("Session finished: {} frames", summary.frames),
        Err(e) => eprintln!("Producer disconnected: {e}"),
    }
    Ok(())
}
