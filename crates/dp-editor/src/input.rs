//! Input sampler.
//!
//! Normalizes pointer, mouse and touch events into one stroke stream of
//! canvas-local [`Sample`]s. Browsers fire all three families for a single
//! gesture, so exactly one source is honoured at a time:
//!
//! - once any `Pointer` event has been seen, mouse and touch are ignored
//!   for the rest of the session;
//! - before that, the source that began a stroke owns it until it ends.

use dp_core::model::Sample;

/// Which DOM event family an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Pointer,
    Mouse,
    Touch,
}

impl PointerSource {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pointer" => Some(PointerSource::Pointer),
            "mouse" => Some(PointerSource::Mouse),
            "touch" => Some(PointerSource::Touch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

impl PointerKind {
    /// Accepts DOM suffixes: `down`/`start`, `move`, `up`/`end`, `cancel`, `leave`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "down" | "start" => Some(PointerKind::Down),
            "move" => Some(PointerKind::Move),
            "up" | "end" => Some(PointerKind::Up),
            "cancel" => Some(PointerKind::Cancel),
            "leave" => Some(PointerKind::Leave),
            _ => None,
        }
    }

    fn ends_stroke(self) -> bool {
        matches!(self, PointerKind::Up | PointerKind::Cancel | PointerKind::Leave)
    }
}

/// A DOM-style pointer event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPointerEvent {
    pub source: PointerSource,
    pub kind: PointerKind,
    pub client_x: f32,
    pub client_y: f32,
    /// `None` for devices that do not report pressure.
    pub pressure: Option<f32>,
    pub time_stamp: f64,
}

/// A `getBoundingClientRect()` result.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Where the canvas sits on screen. The container and the canvas may be
/// offset from each other (borders, padding, toolbars).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceGeometry {
    pub container: ClientRect,
    pub canvas: ClientRect,
}

impl SurfaceGeometry {
    /// Canvas and container coincide at `(left, top)`.
    pub fn at(left: f32, top: f32, width: f32, height: f32) -> Self {
        let rect = ClientRect { left, top, width, height };
        Self { container: rect, canvas: rect }
    }

    /// Client → canvas-local CSS pixels.
    pub fn to_local(&self, client_x: f32, client_y: f32) -> (f32, f32) {
        let container_x = client_x - self.container.left;
        let container_y = client_y - self.container.top;
        let canvas_offset_x = self.canvas.left - self.container.left;
        let canvas_offset_y = self.canvas.top - self.container.top;
        (container_x - canvas_offset_x, container_y - canvas_offset_y)
    }
}

/// Semantic stroke events consumed by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeEvent {
    Start(Sample),
    Continue(Sample),
    End,
}

/// Stroke lifecycle: `Idle → Drawing → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing { source: PointerSource },
}

#[derive(Debug, Default)]
pub struct InputSampler {
    geometry: SurfaceGeometry,
    state: StrokeState,
    pointer_seen: bool,
}

impl InputSampler {
    pub fn new(geometry: SurfaceGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    fn accepts(&self, source: PointerSource) -> bool {
        if self.pointer_seen && source != PointerSource::Pointer {
            return false;
        }
        match self.state {
            StrokeState::Drawing { source: owner } => owner == source,
            StrokeState::Idle => true,
        }
    }

    /// Translate one raw event. Returns `None` when the event does not
    /// change the stroke stream (wrong source, move while idle, bad data).
    pub fn handle(&mut self, event: &RawPointerEvent) -> Option<StrokeEvent> {
        if event.source == PointerSource::Pointer && !self.pointer_seen {
            self.pointer_seen = true;
            // A mouse or touch stroke in flight is handed over, not leaked.
            if let StrokeState::Drawing { source } = self.state
                && source != PointerSource::Pointer
            {
                self.state = StrokeState::Drawing {
                    source: PointerSource::Pointer,
                };
            }
        }
        if !self.accepts(event.source) {
            log::trace!("ignored {:?} {:?}", event.source, event.kind);
            return None;
        }

        if event.kind.ends_stroke() {
            return self.end();
        }

        let (x, y) = self.geometry.to_local(event.client_x, event.client_y);
        if !(x.is_finite() && y.is_finite()) {
            log::trace!("dropped non-finite sample ({x}, {y})");
            return None;
        }
        let sample = Sample::new(x, y, event.pressure, event.time_stamp);

        match (event.kind, self.state) {
            (PointerKind::Down, StrokeState::Idle) => {
                self.state = StrokeState::Drawing {
                    source: event.source,
                };
                Some(StrokeEvent::Start(sample))
            }
            (PointerKind::Move, StrokeState::Drawing { .. }) => Some(StrokeEvent::Continue(sample)),
            _ => None,
        }
    }

    /// End any active stroke regardless of source (window-level pointer-up,
    /// focus loss).
    pub fn end(&mut self) -> Option<StrokeEvent> {
        match self.state {
            StrokeState::Drawing { .. } => {
                self.state = StrokeState::Idle;
                Some(StrokeEvent::End)
            }
            StrokeState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dp_core::model::DEFAULT_PRESSURE;
    use pretty_assertions::assert_eq;

    fn ev(source: PointerSource, kind: PointerKind, x: f32, y: f32) -> RawPointerEvent {
        RawPointerEvent {
            source,
            kind,
            client_x: x,
            client_y: y,
            pressure: None,
            time_stamp: 0.0,
        }
    }

    use PointerKind::*;
    use PointerSource::*;

    #[test]
    fn coordinates_are_canvas_local() {
        let geometry = SurfaceGeometry {
            container: ClientRect { left: 100.0, top: 50.0, width: 400.0, height: 300.0 },
            canvas: ClientRect { left: 110.0, top: 70.0, width: 380.0, height: 260.0 },
        };
        assert_eq!(geometry.to_local(130.0, 90.0), (20.0, 20.0));
    }

    #[test]
    fn down_move_up_lifecycle() {
        let mut s = InputSampler::new(SurfaceGeometry::at(10.0, 10.0, 100.0, 100.0));
        assert_eq!(s.handle(&ev(Pointer, Move, 20.0, 20.0)), None);

        let start = s.handle(&ev(Pointer, Down, 20.0, 30.0));
        assert_eq!(
            start,
            Some(StrokeEvent::Start(Sample {
                x: 10.0,
                y: 20.0,
                pressure: DEFAULT_PRESSURE,
                timestamp_ms: 0.0
            }))
        );
        assert!(s.is_drawing());
        assert!(matches!(s.handle(&ev(Pointer, Move, 25.0, 30.0)), Some(StrokeEvent::Continue(_))));
        assert_eq!(s.handle(&ev(Pointer, Up, 25.0, 30.0)), Some(StrokeEvent::End));
        assert_eq!(s.state(), StrokeState::Idle);
        assert_eq!(s.handle(&ev(Pointer, Up, 25.0, 30.0)), None);
    }

    #[test]
    fn cancel_and_leave_end_the_stroke() {
        for kind in [Cancel, Leave] {
            let mut s = InputSampler::default();
            s.handle(&ev(Pointer, Down, 1.0, 1.0));
            assert_eq!(s.handle(&ev(Pointer, kind, 1.0, 1.0)), Some(StrokeEvent::End));
            assert!(!s.is_drawing());
        }
    }

    #[test]
    fn pointer_events_silence_mouse_and_touch() {
        let mut s = InputSampler::default();
        s.handle(&ev(Pointer, Down, 1.0, 1.0));
        assert_eq!(s.handle(&ev(Mouse, Down, 1.0, 1.0)), None);
        assert_eq!(s.handle(&ev(Touch, Move, 2.0, 2.0)), None);
        assert_eq!(s.handle(&ev(Mouse, Up, 2.0, 2.0)), None);
        assert!(s.is_drawing());
        s.handle(&ev(Pointer, Up, 2.0, 2.0));

        // Still silenced after the stroke.
        assert_eq!(s.handle(&ev(Mouse, Down, 1.0, 1.0)), None);
    }

    #[test]
    fn without_pointer_events_stroke_owner_wins() {
        let mut s = InputSampler::default();
        assert!(matches!(s.handle(&ev(Touch, Down, 1.0, 1.0)), Some(StrokeEvent::Start(_))));
        assert_eq!(s.handle(&ev(Mouse, Down, 1.0, 1.0)), None);
        assert_eq!(s.handle(&ev(Mouse, Move, 3.0, 1.0)), None);
        assert!(matches!(s.handle(&ev(Touch, Move, 3.0, 1.0)), Some(StrokeEvent::Continue(_))));
        assert_eq!(s.handle(&ev(Touch, Up, 3.0, 1.0)), Some(StrokeEvent::End));

        assert!(matches!(s.handle(&ev(Mouse, Down, 1.0, 1.0)), Some(StrokeEvent::Start(_))));
    }

    #[test]
    fn first_pointer_event_adopts_running_stroke() {
        let mut s = InputSampler::default();
        s.handle(&ev(Mouse, Down, 1.0, 1.0));
        assert!(matches!(s.handle(&ev(Pointer, Move, 2.0, 1.0)), Some(StrokeEvent::Continue(_))));
        assert_eq!(s.handle(&ev(Pointer, Up, 2.0, 1.0)), Some(StrokeEvent::End));
    }

    #[test]
    fn pressure_is_normalized() {
        let mut s = InputSampler::default();
        let mut e = ev(Pointer, Down, 0.0, 0.0);
        e.pressure = Some(0.0);
        let Some(StrokeEvent::Start(sample)) = s.handle(&e) else {
            panic!("expected start");
        };
        assert_eq!(sample.pressure, DEFAULT_PRESSURE);

        let mut e = ev(Pointer, Move, 1.0, 0.0);
        e.pressure = Some(3.0);
        let Some(StrokeEvent::Continue(sample)) = s.handle(&e) else {
            panic!("expected continue");
        };
        assert_eq!(sample.pressure, 1.0);
    }

    #[test]
    fn non_finite_coordinates_are_dropped() {
        let mut s = InputSampler::default();
        assert_eq!(s.handle(&ev(Pointer, Down, f32::NAN, 1.0)), None);
        assert!(!s.is_drawing());
    }

    #[test]
    fn window_level_end() {
        let mut s = InputSampler::default();
        s.handle(&ev(Mouse, Down, 0.0, 0.0));
        assert_eq!(s.end(), Some(StrokeEvent::End));
        assert_eq!(s.end(), None);
    }

    #[test]
    fn names_parse() {
        assert_eq!(PointerKind::from_name("start"), Some(Down));
        assert_eq!(PointerKind::from_name("end"), Some(Up));
        assert_eq!(PointerSource::from_name("touch"), Some(Touch));
        assert_eq!(PointerSource::from_name("pen"), None);
    }
}
