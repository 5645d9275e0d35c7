// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! egui implementations of the viewer's host seams.
//!
//! [`EguiHost`] turns animation frame requests into egui repaints and
//! [`ClockMedia`] stands in for a video element, advancing time with the
//! frame clock instead of decoding frames.

use std::cell::RefCell;
use std::rc::Rc;

use annoview::{FrameToken, Host, ListenerId, ListenerKind, MediaCommand, MediaElement, MediaEvent, Size};

/// Duration used when the overlay document gives none.
const DEFAULT_DURATION: f64 = 10.0;

#[derive(Debug, Default)]
struct HostState {
    size: Size,
    next_frame: u64,
    requested: Option<FrameToken>,
    next_listener: u64,
    listeners: Vec<(ListenerId, ListenerKind)>,
}

/// Host backed by an egui context. Clones share state, so the app keeps
/// one while the viewer owns another.
#[derive(Clone)]
pub struct EguiHost {
    state: Rc<RefCell<HostState>>,
    ctx: egui::Context,
}

impl EguiHost {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            state: Rc::default(),
            ctx,
        }
    }

    /// Record the canvas size. Returns true if it changed.
    pub fn set_size(&self, size: Size) -> bool {
        let mut state = self.state.borrow_mut();
        let changed = state.size != size;
        state.size = size;
        changed
    }

    /// Take the outstanding frame request, if any.
    pub fn take_frame(&self) -> Option<FrameToken> {
        self.state.borrow_mut().requested.take()
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.state.borrow().listeners.iter().any(|(_, k)| *k == kind)
    }
}

impl Host for EguiHost {
    fn container_size(&self) -> Size {
        self.state.borrow().size
    }

    fn request_animation_frame(&mut self) -> FrameToken {
        let token = {
            let mut state = self.state.borrow_mut();
            state.next_frame += 1;
            let token = FrameToken(state.next_frame);
            state.requested = Some(token);
            token
        };
        self.ctx.request_repaint();
        token
    }

    fn cancel_animation_frame(&mut self, token: FrameToken) {
        let mut state = self.state.borrow_mut();
        if state.requested == Some(token) {
            state.requested = None;
        }
    }

    fn listen(&mut self, kind: ListenerKind) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push((id, kind));
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|(l, _)| *l != id);
    }
}

#[derive(Debug, Default)]
struct ClockState {
    duration: f64,
    time: f64,
    loaded: bool,
    playing: bool,
    queue: Vec<MediaEvent>,
}

/// A media element that plays by advancing a clock.
///
/// Events are queued when commands arrive and delivered on the next
/// [`ClockMedia::tick`], the way a real element answers asynchronously.
#[derive(Clone, Default)]
pub struct ClockMedia {
    state: Rc<RefCell<ClockState>>,
}

impl ClockMedia {
    pub fn new(duration: Option<f64>) -> Self {
        let duration = duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(DEFAULT_DURATION);
        let media = Self::default();
        media.state.borrow_mut().duration = duration;
        media
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    /// Advance by `dt` seconds and return the events produced since the
    /// last tick.
    pub fn tick(&self, dt: f64) -> Vec<MediaEvent> {
        let mut state = self.state.borrow_mut();
        if state.loaded && state.playing && dt > 0.0 {
            state.time += dt;
            if state.time >= state.duration {
                state.time = state.duration;
                state.playing = false;
                let time = state.time;
                state.queue.push(MediaEvent::TimeUpdate { time });
                state.queue.push(MediaEvent::Ended);
            } else {
                let time = state.time;
                state.queue.push(MediaEvent::TimeUpdate { time });
            }
        }
        std::mem::take(&mut state.queue)
    }
}

impl MediaElement for ClockMedia {
    fn execute(&mut self, command: MediaCommand) {
        let mut state = self.state.borrow_mut();
        log::trace!("Clock media: {:?}", command);
        match command {
            MediaCommand::Load { source } => {
                log::debug!("Playing {} on the frame clock ({:.1}s)", source, state.duration);
                state.loaded = true;
                state.playing = false;
                state.time = 0.0;
                let duration = state.duration;
                state.queue.push(MediaEvent::MetadataLoaded { duration });
                state.queue.push(MediaEvent::Buffered {
                    ranges: vec![(0.0, duration)],
                });
            }
            MediaCommand::Play => {
                if state.loaded {
                    state.playing = true;
                }
            }
            MediaCommand::Pause => state.playing = false,
            MediaCommand::Seek { id, time } => {
                if state.loaded {
                    state.playing = false;
                    state.time = time.clamp(0.0, state.duration);
                    state.queue.push(MediaEvent::Seeked { id });
                }
            }
            MediaCommand::Release => {
                state.loaded = false;
                state.playing = false;
                state.queue.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_requests_replace_and_cancel() {
        let host_ctx = egui::Context::default();
        let mut host = EguiHost::new(host_ctx);
        let first = host.request_animation_frame();
        let second = host.request_animation_frame();
        assert_ne!(first, second);
        host.cancel_animation_frame(first);
        assert_eq!(host.take_frame(), Some(second));
        assert_eq!(host.take_frame(), None);

        let id = host.listen(ListenerKind::Wheel);
        assert!(host.is_listening(ListenerKind::Wheel));
        host.unlisten(id);
        assert!(!host.is_listening(ListenerKind::Wheel));
    }

    #[test]
    fn clock_answers_load_and_plays_to_the_end() {
        let mut media = ClockMedia::new(Some(1.0));
        media.execute(MediaCommand::Load { source: "clip.mp4".into() });
        let events = media.tick(0.0);
        assert_eq!(events[0], MediaEvent::MetadataLoaded { duration: 1.0 });

        media.execute(MediaCommand::Play);
        assert_eq!(media.tick(0.5), vec![MediaEvent::TimeUpdate { time: 0.5 }]);
        assert_eq!(
            media.tick(0.75),
            vec![MediaEvent::TimeUpdate { time: 1.0 }, MediaEvent::Ended]
        );
        assert!(!media.is_playing());
    }

    #[test]
    fn seek_is_acknowledged_on_next_tick() {
        let mut media = ClockMedia::new(None);
        media.execute(MediaCommand::Load { source: "clip.mp4".into() });
        media.tick(0.0);
        media.execute(MediaCommand::Seek { id: 7, time: 99.0 });
        assert_eq!(media.tick(0.0), vec![MediaEvent::Seeked { id: 7 }]);

        media.execute(MediaCommand::Release);
        media.execute(MediaCommand::Play);
        assert!(!media.is_playing());
    }
}
