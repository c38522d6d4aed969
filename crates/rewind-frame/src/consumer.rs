use std::sync::mpsc::Sender;

use tracing::debug;

use crate::model::{AreaDesc, Frame};

/// Receives decoded output.
///
/// `submit_frame` is called once per `end` record and takes ownership of the
/// frame. `submit_area` is called as soon as an `area` record is decoded,
/// independent of frame boundaries.
pub trait SceneConsumer {
    fn submit_frame(&mut self, frame: Frame);
    fn submit_area(&mut self, area: AreaDesc);
}

impl<C: SceneConsumer + ?Sized> SceneConsumer for &mut C {
    fn submit_frame(&mut self, frame: Frame) {
        (**self).submit_frame(frame);
    }

    fn submit_area(&mut self, area: AreaDesc) {
        (**self).submit_area(area);
    }
}

impl<C: SceneConsumer + ?Sized> SceneConsumer for Box<C> {
    fn submit_frame(&mut self, frame: Frame) {
        (**self).submit_frame(frame);
    }

    fn submit_area(&mut self, area: AreaDesc) {
        (**self).submit_area(area);
    }
}

/// Decoder output in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Frame(Frame),
    Area(AreaDesc),
}

impl SceneConsumer for Vec<SceneEvent> {
    fn submit_frame(&mut self, frame: Frame) {
        self.push(SceneEvent::Frame(frame));
    }

    fn submit_area(&mut self, area: AreaDesc) {
        self.push(SceneEvent::Area(area));
    }
}

/// Forwards events to another thread. Events sent after the receiver
/// hung up are dropped.
impl SceneConsumer for Sender<SceneEvent> {
    fn submit_frame(&mut self, frame: Frame) {
        if self.send(SceneEvent::Frame(frame)).is_err() {
            debug!("scene receiver dropped; discarding frame");
        }
    }

    fn submit_area(&mut self, area: AreaDesc) {
        if self.send(SceneEvent::Area(area)).is_err() {
            debug!("scene receiver dropped; discarding area");
        }
    }
}
