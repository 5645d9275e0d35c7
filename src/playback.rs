// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback state machine for time-based media.
//!
//! The controller never touches the media element directly. Requests
//! (`play`, `seek`, ...) and element events (`on_event`) both return a
//! [`PlaybackEffect`] listing the commands the owner must forward to the
//! element. Seeks carry a generation id so only the most recent one is
//! honoured when its `Seeked` event arrives.

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// Playback lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Seeking,
    Ended,
    Errored,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

/// Commands for the host's media element.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    Load { source: String },
    Play,
    Pause,
    Seek { id: u64, time: f64 },
    /// Drop the element and any decoder resources.
    Release,
}

/// Notifications from the host's media element.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    MetadataLoaded { duration: f64 },
    TimeUpdate { time: f64 },
    Seeked { id: u64 },
    Ended,
    Error { message: String },
    Buffered { ranges: Vec<(f64, f64)> },
}

/// Sorted, non-overlapping `[start, end)` intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferedRanges {
    ranges: Vec<(f64, f64)>,
}

impl BufferedRanges {
    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.ranges
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Add an interval, merging with any it touches. Empty or invalid
    /// intervals are ignored.
    pub fn insert(&mut self, start: f64, end: f64) {
        if !(start.is_finite() && end.is_finite()) || end <= start {
            return;
        }
        let (mut start, mut end) = (start, end);
        self.ranges.retain(|&(s, e)| {
            if s <= end && start <= e {
                start = start.min(s);
                end = end.max(e);
                false
            } else {
                true
            }
        });
        let at = self.ranges.partition_point(|&(s, _)| s < start);
        self.ranges.insert(at, (start, end));
    }

    pub fn set(&mut self, ranges: &[(f64, f64)]) {
        self.ranges.clear();
        for &(s, e) in ranges {
            self.insert(s, e);
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.ranges.iter().any(|&(s, e)| s <= t && t < e)
    }
}

/// What the owner has to do after a playback call.
#[derive(Debug, Default, PartialEq)]
pub struct PlaybackEffect {
    pub commands: Vec<MediaCommand>,
    pub state_changed: bool,
    /// Current time or buffered ranges moved; a redraw is needed.
    pub time_changed: bool,
    /// Playback reached the end on the way to the current state, which
    /// is reported after `Ended`.
    pub ended: bool,
    pub error: Option<ViewerError>,
}

impl PlaybackEffect {
    fn none() -> Self {
        Self::default()
    }

    fn state(commands: Vec<MediaCommand>) -> Self {
        Self {
            commands,
            state_changed: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingSeek {
    id: u64,
    target: f64,
    resume: bool,
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    state: PlaybackState,
    source: Option<String>,
    current_time: f64,
    duration: Option<f64>,
    buffered: BufferedRanges,
    seek: Option<PendingSeek>,
    next_seek_id: u64,
    loop_playback: bool,
    autoplay: bool,
    frame_rate: f64,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self {
            state: PlaybackState::Unloaded,
            source: None,
            current_time: 0.0,
            duration: None,
            buffered: BufferedRanges::default(),
            seek: None,
            next_seek_id: 0,
            loop_playback: false,
            autoplay: false,
            frame_rate: 30.0,
        }
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Last stable time. During a seek this is the time before the seek.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn buffered(&self) -> &BufferedRanges {
        &self.buffered
    }

    /// Where playback will land once the pending seek resolves.
    pub fn seek_target(&self) -> Option<f64> {
        self.seek.map(|s| s.target)
    }

    /// Will playback be running once any pending seek resolves?
    pub fn is_playing_or_will_resume(&self) -> bool {
        match self.state {
            PlaybackState::Playing => true,
            PlaybackState::Seeking => self.seek.is_some_and(|s| s.resume),
            _ => false,
        }
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Zero-based frame number at the current time.
    pub fn frame_number(&self) -> u64 {
        (self.current_time * self.frame_rate + 1e-6).floor().max(0.0) as u64
    }

    pub fn configure(&mut self, loop_playback: bool, autoplay: bool, frame_rate: f64) {
        self.loop_playback = loop_playback;
        self.autoplay = autoplay;
        if frame_rate.is_finite() && frame_rate > 0.0 {
            self.frame_rate = frame_rate;
        }
    }

    fn transition(&mut self, to: PlaybackState) -> bool {
        if self.state == to {
            return false;
        }
        log::debug!("Playback {:?} -> {:?}", self.state, to);
        self.state = to;
        true
    }

    fn clamp_time(&self, t: f64) -> f64 {
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        match self.duration {
            Some(d) => t.min(d),
            None => t,
        }
    }

    /// Assign a source. Valid from any state, including `Errored`.
    pub fn load(&mut self, source: &str, duration_hint: Option<f64>) -> PlaybackEffect {
        let mut commands = Vec::new();
        if self.source.is_some() {
            commands.push(MediaCommand::Release);
        }
        self.source = Some(source.to_string());
        self.current_time = 0.0;
        self.duration = duration_hint.filter(|d| d.is_finite() && *d >= 0.0);
        self.buffered.clear();
        self.seek = None;
        commands.push(MediaCommand::Load {
            source: source.to_string(),
        });
        log::info!("Loading media {}", source);
        self.transition(PlaybackState::Loading);
        let mut effect = PlaybackEffect::state(commands);
        effect.time_changed = true;
        effect
    }

    /// Drop the current source.
    pub fn unload(&mut self) -> PlaybackEffect {
        if self.source.is_none() && self.state == PlaybackState::Unloaded {
            return PlaybackEffect::none();
        }
        let commands = if self.source.take().is_some() {
            vec![MediaCommand::Release]
        } else {
            Vec::new()
        };
        self.current_time = 0.0;
        self.duration = None;
        self.buffered.clear();
        self.seek = None;
        let changed = self.transition(PlaybackState::Unloaded);
        PlaybackEffect {
            commands,
            state_changed: changed,
            ..PlaybackEffect::default()
        }
    }

    pub fn play(&mut self) -> PlaybackEffect {
        match self.state {
            PlaybackState::Ready | PlaybackState::Paused => {
                self.transition(PlaybackState::Playing);
                PlaybackEffect::state(vec![MediaCommand::Play])
            }
            PlaybackState::Ended => self.start_seek(0.0, true),
            PlaybackState::Seeking => {
                if let Some(seek) = &mut self.seek {
                    seek.resume = true;
                }
                PlaybackEffect::none()
            }
            PlaybackState::Errored => {
                log::debug!("Ignoring play while errored");
                PlaybackEffect::none()
            }
            PlaybackState::Unloaded | PlaybackState::Loading | PlaybackState::Playing => PlaybackEffect::none(),
        }
    }

    pub fn pause(&mut self) -> PlaybackEffect {
        match self.state {
            PlaybackState::Playing => {
                self.transition(PlaybackState::Paused);
                PlaybackEffect::state(vec![MediaCommand::Pause])
            }
            PlaybackState::Seeking => {
                if let Some(seek) = &mut self.seek {
                    seek.resume = false;
                }
                PlaybackEffect {
                    commands: vec![MediaCommand::Pause],
                    ..PlaybackEffect::default()
                }
            }
            _ => PlaybackEffect::none(),
        }
    }

    pub fn toggle(&mut self) -> PlaybackEffect {
        if self.is_playing_or_will_resume() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seek to `time` seconds. A newer seek supersedes any pending one.
    pub fn seek(&mut self, time: f64) -> PlaybackEffect {
        let resume = match self.state {
            PlaybackState::Playing => true,
            PlaybackState::Seeking => self.seek.is_some_and(|s| s.resume),
            PlaybackState::Ready | PlaybackState::Paused | PlaybackState::Ended => false,
            PlaybackState::Unloaded | PlaybackState::Loading | PlaybackState::Errored => {
                return PlaybackEffect::none();
            }
        };
        self.start_seek(time, resume)
    }

    /// Seek relative to where playback is (or is about to be).
    pub fn seek_by(&mut self, delta: f64) -> PlaybackEffect {
        let from = self.seek_target().unwrap_or(self.current_time);
        self.seek(from + delta)
    }

    /// Step whole frames. Only while playback is paused.
    pub fn step(&mut self, frames: i64) -> PlaybackEffect {
        let paused = match self.state {
            PlaybackState::Paused | PlaybackState::Ready | PlaybackState::Ended => true,
            PlaybackState::Seeking => !self.is_playing_or_will_resume(),
            _ => false,
        };
        if !paused {
            return PlaybackEffect::none();
        }
        let from = self.seek_target().unwrap_or(self.current_time);
        let frame = (from * self.frame_rate + 1e-6).floor() + frames as f64;
        self.seek(frame.max(0.0) / self.frame_rate)
    }

    fn start_seek(&mut self, time: f64, resume: bool) -> PlaybackEffect {
        let target = self.clamp_time(time);
        self.next_seek_id += 1;
        let id = self.next_seek_id;
        if let Some(old) = self.seek.replace(PendingSeek { id, target, resume }) {
            log::debug!("Seek {} superseded by {}", old.id, id);
        }
        let changed = self.transition(PlaybackState::Seeking);
        PlaybackEffect {
            commands: vec![MediaCommand::Seek { id, time: target }],
            state_changed: changed,
            ..PlaybackEffect::default()
        }
    }

    /// Apply an event from the media element.
    pub fn on_event(&mut self, event: MediaEvent) -> PlaybackEffect {
        match event {
            MediaEvent::MetadataLoaded { duration } => {
                if self.state != PlaybackState::Loading {
                    return PlaybackEffect::none();
                }
                if duration.is_finite() && duration >= 0.0 {
                    self.duration = Some(duration);
                }
                self.transition(PlaybackState::Ready);
                let mut effect = PlaybackEffect::state(Vec::new());
                effect.time_changed = true;
                if self.autoplay {
                    let play = self.play();
                    effect.commands.extend(play.commands);
                }
                effect
            }
            MediaEvent::TimeUpdate { time } => {
                if self.state != PlaybackState::Playing {
                    return PlaybackEffect::none();
                }
                let t = self.clamp_time(time);
                if t <= self.current_time {
                    return PlaybackEffect::none();
                }
                self.current_time = t;
                PlaybackEffect {
                    time_changed: true,
                    ..PlaybackEffect::default()
                }
            }
            MediaEvent::Seeked { id } => {
                let Some(seek) = self.seek.filter(|s| s.id == id) else {
                    log::debug!("Ignoring stale seek {}", id);
                    return PlaybackEffect::none();
                };
                self.seek = None;
                self.current_time = seek.target;
                let (to, commands) = if seek.resume {
                    (PlaybackState::Playing, vec![MediaCommand::Play])
                } else {
                    (PlaybackState::Paused, Vec::new())
                };
                self.transition(to);
                PlaybackEffect {
                    commands,
                    state_changed: true,
                    time_changed: true,
                    ..PlaybackEffect::default()
                }
            }
            MediaEvent::Ended => {
                if self.state != PlaybackState::Playing {
                    return PlaybackEffect::none();
                }
                if let Some(d) = self.duration {
                    self.current_time = d;
                }
                if self.loop_playback {
                    self.transition(PlaybackState::Ended);
                    let mut effect = self.start_seek(0.0, true);
                    effect.state_changed = true;
                    effect.ended = true;
                    effect
                } else {
                    self.transition(PlaybackState::Ended);
                    let mut effect = PlaybackEffect::state(Vec::new());
                    effect.time_changed = true;
                    effect
                }
            }
            MediaEvent::Error { message } => {
                if self.state == PlaybackState::Unloaded {
                    return PlaybackEffect::none();
                }
                let error = ViewerError::MediaLoad {
                    source_ref: self.source.clone().unwrap_or_default(),
                    message,
                };
                log::error!("{}", error);
                self.seek = None;
                self.transition(PlaybackState::Errored);
                PlaybackEffect {
                    state_changed: true,
                    error: Some(error),
                    ..PlaybackEffect::default()
                }
            }
            MediaEvent::Buffered { ranges } => {
                let before = self.buffered.clone();
                self.buffered.set(&ranges);
                PlaybackEffect {
                    time_changed: before != self.buffered,
                    ..PlaybackEffect::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    fn ready(duration: f64) -> PlaybackController {
        let mut p = PlaybackController::new();
        p.load("clip.mp4", None);
        p.on_event(MediaEvent::MetadataLoaded { duration });
        assert_eq!(p.state(), PlaybackState::Ready);
        p
    }

    fn last_seek_id(effect: &PlaybackEffect) -> u64 {
        effect
            .commands
            .iter()
            .find_map(|c| match c {
                MediaCommand::Seek { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn load_then_metadata_reaches_ready() {
        let mut p = PlaybackController::new();
        let effect = p.load("clip.mp4", None);
        assert_eq!(p.state(), PlaybackState::Loading);
        assert_eq!(
            effect.commands,
            vec![MediaCommand::Load {
                source: "clip.mp4".into()
            }]
        );
        p.on_event(MediaEvent::MetadataLoaded { duration: 12.5 });
        assert_eq!(p.state(), PlaybackState::Ready);
        assert_eq!(p.duration(), Some(12.5));
    }

    #[test]
    fn autoplay_starts_playing_on_metadata() {
        let mut p = PlaybackController::new();
        p.configure(false, true, 30.0);
        p.load("clip.mp4", None);
        let effect = p.on_event(MediaEvent::MetadataLoaded { duration: 3.0 });
        assert_eq!(p.state(), PlaybackState::Playing);
        assert_eq!(effect.commands, vec![MediaCommand::Play]);
    }

    #[test]
    fn play_while_errored_is_noop_until_reload() {
        let mut p = PlaybackController::new();
        p.load("missing.mp4", None);
        let effect = p.on_event(MediaEvent::Error {
            message: "404".into(),
        });
        assert_eq!(p.state(), PlaybackState::Errored);
        assert!(matches!(effect.error, Some(ViewerError::MediaLoad { .. })));
        assert!(p.play().is_empty());
        assert!(p.seek(1.0).is_empty());
        assert_eq!(p.state(), PlaybackState::Errored);

        p.load("found.mp4", None);
        assert_eq!(p.state(), PlaybackState::Loading);
    }

    #[test]
    fn seek_while_playing_resumes_playing() {
        let mut p = ready(10.0);
        p.play();
        let effect = p.seek(4.0);
        assert_eq!(p.state(), PlaybackState::Seeking);
        let id = last_seek_id(&effect);
        p.on_event(MediaEvent::Seeked { id });
        assert_eq!(p.state(), PlaybackState::Playing);
        assert_abs_diff_eq!(p.current_time(), 4.0);
    }

    #[test]
    fn seek_while_paused_stays_paused() {
        let mut p = ready(10.0);
        p.play();
        p.pause();
        let id = last_seek_id(&p.seek(2.0));
        p.on_event(MediaEvent::Seeked { id });
        assert_eq!(p.state(), PlaybackState::Paused);
    }

    #[test]
    fn last_seek_wins() {
        let mut p = ready(10.0);
        p.play();
        let first = last_seek_id(&p.seek(2.0));
        let second = last_seek_id(&p.seek(7.0));
        assert!(p.on_event(MediaEvent::Seeked { id: first }).is_empty());
        assert_eq!(p.state(), PlaybackState::Seeking);
        p.on_event(MediaEvent::Seeked { id: second });
        assert_abs_diff_eq!(p.current_time(), 7.0);
        assert_eq!(p.state(), PlaybackState::Playing);
    }

    #[test]
    fn time_is_stable_during_seek_and_monotonic_while_playing() {
        let mut p = ready(10.0);
        p.play();
        p.on_event(MediaEvent::TimeUpdate { time: 3.0 });
        assert!(p.on_event(MediaEvent::TimeUpdate { time: 2.5 }).is_empty());
        assert_abs_diff_eq!(p.current_time(), 3.0);

        let id = last_seek_id(&p.seek(1.0));
        p.on_event(MediaEvent::TimeUpdate { time: 0.4 });
        assert_abs_diff_eq!(p.current_time(), 3.0);
        p.on_event(MediaEvent::Seeked { id });
        assert_abs_diff_eq!(p.current_time(), 1.0);
        p.on_event(MediaEvent::TimeUpdate { time: 99.0 });
        assert_abs_diff_eq!(p.current_time(), 10.0);
    }

    #[test]
    fn end_without_loop_stops() {
        let mut p = ready(5.0);
        p.play();
        let effect = p.on_event(MediaEvent::Ended);
        assert!(effect.state_changed && !effect.ended);
        assert_eq!(p.state(), PlaybackState::Ended);
        assert_abs_diff_eq!(p.current_time(), 5.0);

        // play from the end restarts at zero
        let id = last_seek_id(&p.play());
        p.on_event(MediaEvent::Seeked { id });
        assert_eq!(p.state(), PlaybackState::Playing);
        assert_abs_diff_eq!(p.current_time(), 0.0);
    }

    #[test]
    fn end_with_loop_seeks_to_zero_and_plays() {
        let mut p = ready(5.0);
        p.configure(true, false, 30.0);
        p.play();
        let effect = p.on_event(MediaEvent::Ended);
        assert_eq!(p.state(), PlaybackState::Seeking);
        assert!(effect.ended);
        assert!(effect.commands.contains(&MediaCommand::Seek { id: 1, time: 0.0 }));
        let effect = p.on_event(MediaEvent::Seeked { id: 1 });
        assert_eq!(effect.commands, vec![MediaCommand::Play]);
        assert_eq!(p.state(), PlaybackState::Playing);
    }

    #[test]
    fn stepping_only_while_paused() {
        let mut p = ready(10.0);
        p.configure(false, false, 25.0);
        p.play();
        assert!(p.step(1).is_empty());
        p.pause();
        let effect = p.step(1);
        assert_eq!(effect.commands, vec![MediaCommand::Seek { id: 1, time: 0.04 }]);
        p.step(1);
        assert_abs_diff_eq!(p.seek_target().unwrap(), 0.08, epsilon = 1e-9);
        p.on_event(MediaEvent::Seeked { id: 2 });
        assert_eq!(p.frame_number(), 2);
        p.step(-5);
        assert_abs_diff_eq!(p.seek_target().unwrap(), 0.0);
    }

    #[test]
    fn pause_during_seek_cancels_resume() {
        let mut p = ready(10.0);
        p.play();
        let id = last_seek_id(&p.seek(3.0));
        p.pause();
        assert!(!p.is_playing_or_will_resume());
        p.on_event(MediaEvent::Seeked { id });
        assert_eq!(p.state(), PlaybackState::Paused);
    }

    #[test]
    fn buffered_ranges_merge() {
        let mut b = BufferedRanges::default();
        b.insert(5.0, 7.0);
        b.insert(0.0, 2.0);
        b.insert(1.5, 3.0);
        b.insert(3.0, 4.0);
        b.insert(9.0, 9.0);
        assert_eq!(b.ranges(), &[(0.0, 4.0), (5.0, 7.0)]);
        assert!(b.contains(3.5));
        assert!(!b.contains(4.0));
    }

    #[test]
    fn reload_releases_previous_source() {
        let mut p = ready(10.0);
        let effect = p.load("next.mp4", Some(4.0));
        assert_eq!(effect.commands[0], MediaCommand::Release);
        assert_eq!(p.duration(), Some(4.0));
        assert_eq!(p.unload().commands, vec![MediaCommand::Release]);
        assert_eq!(p.state(), PlaybackState::Unloaded);
    }
}
