//! Core display operations
//!
//! [`Display`] runs the AC073TC1 command protocol over a [`DisplayInterface`]:
//! the power-on reset, the fixed initialization sequence and the paint
//! sequence with its settle delays.
//!
//! ## Lifecycle
//!
//! ```text
//! Unpowered --reset--> Resetting --initialize--> Initialized --paint--> Painting --> Settled
//! ```
//!
//! A display paints one frame per run. Any bus or line failure aborts the run
//! and returns the display to [`State::Unpowered`]; a fresh reset is the only
//! way forward because the panel state after a partial command is unknown.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::command::{CommandStep, INIT_SEQUENCE, PAINT_SEQUENCE, Payload};
use crate::config::Dimensions;
use crate::error::Error;
use crate::interface::DisplayInterface;
use crate::prepare::PackedFrame;

type DisplayResult<I> = core::result::Result<(), Error<I>>;

/// Protocol state of the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Nothing sent yet, or a previous run failed
    Unpowered,
    /// Reset pulse completed, registers not yet configured
    Resetting,
    /// Initialization sequence sent
    Initialized,
    /// Paint sequence in progress
    Painting,
    /// Frame painted and panel powered off
    Settled,
}

/// Protocol phase, used to annotate step failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Reset line pulse
    Reset,
    /// Initialization sequence
    Initialize,
    /// Paint sequence
    Paint,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => f.write_str("Reset"),
            Self::Initialize => f.write_str("Initialize"),
            Self::Paint => f.write_str("Paint"),
        }
    }
}

/// Command protocol driver for the AC073TC1
///
/// Owns the interface for the duration of a run. Use [`release`](Self::release)
/// to get it back.
pub struct Display<I>
where
    I: DisplayInterface,
{
    /// Hardware interface
    interface: I,
    /// Current protocol state
    state: State,
}

impl<I> Display<I>
where
    I: DisplayInterface,
{
    /// Create a new Display in the [`State::Unpowered`] state
    pub fn new(interface: I) -> Self {
        Self {
            interface,
            state: State::Unpowered,
        }
    }

    /// Current protocol state
    pub fn state(&self) -> State {
        self.state
    }

    /// Borrow the interface
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Release the interface
    pub fn release(self) -> I {
        self.interface
    }

    /// Pulse the reset line
    ///
    /// Leaves the display in [`State::Resetting`].
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.expect_state(State::Unpowered)?;
        info!("resetting panel");

        if let Err((step, source)) = self.interface.reset(delay) {
            return Err(self.abort(Phase::Reset, step, source));
        }

        self.state = State::Resetting;
        Ok(())
    }

    /// Send the initialization sequence
    ///
    /// Leaves the display in [`State::Initialized`].
    pub fn initialize<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.expect_state(State::Resetting)?;
        info!("initialising panel");

        self.run_sequence(Phase::Initialize, &INIT_SEQUENCE, &[], delay)?;

        self.state = State::Initialized;
        Ok(())
    }

    /// Upload a packed frame and refresh the panel
    ///
    /// `frame` must be exactly one packed 800x480 frame. Blocks for the full
    /// settle time of the panel, roughly 38 seconds. Leaves the display in
    /// [`State::Settled`].
    pub fn paint<D: DelayNs>(&mut self, frame: &[u8], delay: &mut D) -> DisplayResult<I> {
        self.expect_state(State::Initialized)?;
        check_frame_size::<I>(frame)?;
        info!("painting {} byte frame", frame.len());

        self.state = State::Painting;
        self.run_sequence(Phase::Paint, &PAINT_SEQUENCE, frame, delay)?;

        self.state = State::Settled;
        info!("panel settled");
        Ok(())
    }

    /// Reset, initialize and paint in one call
    ///
    /// The frame size is checked before anything is sent.
    pub fn render<D: DelayNs>(&mut self, frame: &PackedFrame, delay: &mut D) -> DisplayResult<I> {
        self.expect_state(State::Unpowered)?;
        check_frame_size::<I>(frame.as_bytes())?;

        self.reset(delay)?;
        self.initialize(delay)?;
        self.paint(frame.as_bytes(), delay)
    }

    fn run_sequence<D: DelayNs>(
        &mut self,
        phase: Phase,
        steps: &[CommandStep],
        frame: &[u8],
        delay: &mut D,
    ) -> DisplayResult<I> {
        for (index, step) in steps.iter().enumerate() {
            let data = match step.payload {
                Payload::None => None,
                Payload::Bytes(bytes) => Some(bytes),
                Payload::Frame => Some(frame),
            };
            debug!(
                "{phase} step {index}: command {:#04x}, {} data bytes",
                step.command,
                data.map_or(0, <[u8]>::len)
            );

            if let Err(source) = self.interface.send_command(step.command, data) {
                return Err(self.abort(phase, index, source));
            }

            if step.settle_ms > 0 {
                debug!("settling for {}ms", step.settle_ms);
                delay.delay_ms(step.settle_ms);
            }
        }
        Ok(())
    }

    fn expect_state(&self, expected: State) -> DisplayResult<I> {
        if self.state != expected {
            return Err(Error::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn abort(&mut self, phase: Phase, step: usize, source: I::Error) -> Error<I> {
        warn!("{phase} step {step} failed: {source:?}");
        self.state = State::Unpowered;
        Error::StepFailed {
            phase,
            step,
            source,
        }
    }
}

fn check_frame_size<I: DisplayInterface>(frame: &[u8]) -> DisplayResult<I> {
    let expected = Dimensions::PANEL.packed_size();
    if frame.len() != expected {
        return Err(Error::FrameSize {
            expected,
            provided: frame.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{DATA_START_TRANSMISSION, DISPLAY_REFRESH, POWER_OFF, POWER_ON};
    use alloc::vec;
    use alloc::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct StepError;

    #[derive(Debug, Default)]
    struct MockInterface {
        resets: usize,
        sent: Vec<(u8, Option<Vec<u8>>)>,
        calls: usize,
        fail_at: Option<usize>,
        fail_reset_at: Option<usize>,
    }

    impl MockInterface {
        fn failing_at(call: usize) -> Self {
            Self {
                fail_at: Some(call),
                ..Self::default()
            }
        }
    }

    impl DisplayInterface for MockInterface {
        type Error = StepError;

        fn send_command(&mut self, command: u8, data: Option<&[u8]>) -> Result<(), Self::Error> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_at == Some(call) {
                return Err(StepError);
            }
            self.sent.push((command, data.map(<[u8]>::to_vec)));
            Ok(())
        }

        fn reset<D: DelayNs>(&mut self, _delay: &mut D) -> Result<(), (usize, Self::Error)> {
            if let Some(step) = self.fail_reset_at.take() {
                return Err((step, StepError));
            }
            self.resets += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        ms: Vec<u32>,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            self.ms.push(ms);
        }
    }

    fn white_frame() -> Vec<u8> {
        vec![0x11; Dimensions::PANEL.packed_size()]
    }

    fn initialized(interface: MockInterface) -> Display<MockInterface> {
        let mut display = Display::new(interface);
        let mut delay = RecordingDelay::default();
        display.reset(&mut delay).unwrap();
        display.initialize(&mut delay).unwrap();
        display
    }

    #[test]
    fn test_new_display_is_unpowered() {
        let display = Display::new(MockInterface::default());
        assert_eq!(display.state(), State::Unpowered);
    }

    #[test]
    fn test_initialize_sends_sequence_in_order() {
        let display = initialized(MockInterface::default());
        assert_eq!(display.state(), State::Initialized);

        let sent = &display.interface().sent;
        assert_eq!(sent.len(), 19);
        for (step, (command, data)) in INIT_SEQUENCE.iter().zip(sent) {
            assert_eq!(*command, step.command);
            let Payload::Bytes(expected) = step.payload else {
                panic!("init step without bytes");
            };
            assert_eq!(data.as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_initialize_requires_reset() {
        let mut display = Display::new(MockInterface::default());
        let result = display.initialize(&mut RecordingDelay::default());
        assert!(matches!(
            result,
            Err(Error::InvalidState {
                expected: State::Resetting,
                actual: State::Unpowered
            })
        ));
        assert!(display.interface().sent.is_empty());
    }

    #[test]
    fn test_paint_sends_frame_and_settles() {
        let mut display = initialized(MockInterface::default());
        let mut delay = RecordingDelay::default();
        let frame = white_frame();

        display.paint(&frame, &mut delay).unwrap();
        assert_eq!(display.state(), State::Settled);

        let paint = &display.interface().sent[19..];
        assert_eq!(paint.len(), 4);
        assert_eq!(paint[0].0, DATA_START_TRANSMISSION);
        assert_eq!(paint[0].1.as_deref(), Some(frame.as_slice()));
        assert_eq!(paint[1], (POWER_ON, None));
        assert_eq!(paint[2], (DISPLAY_REFRESH, Some(vec![0x00])));
        assert_eq!(paint[3], (POWER_OFF, Some(vec![0x00])));

        assert_eq!(delay.ms, [1_000, 1_000, 35_000, 1_000]);
    }

    #[test]
    fn test_paint_rejects_wrong_frame_size() {
        let mut display = initialized(MockInterface::default());
        let result = display.paint(&[0x11; 16], &mut RecordingDelay::default());
        assert!(matches!(
            result,
            Err(Error::FrameSize {
                expected: 192_000,
                provided: 16
            })
        ));
        assert_eq!(display.state(), State::Initialized);
        assert_eq!(display.interface().sent.len(), 19);
    }

    #[test]
    fn test_init_failure_reports_step_and_stops() {
        let mut display = Display::new(MockInterface::failing_at(5));
        let mut delay = RecordingDelay::default();
        display.reset(&mut delay).unwrap();

        let result = display.initialize(&mut delay);
        assert!(matches!(
            result,
            Err(Error::StepFailed {
                phase: Phase::Initialize,
                step: 5,
                source: StepError
            })
        ));
        assert_eq!(display.interface().sent.len(), 5);
        assert_eq!(display.interface().calls, 6);
        assert_eq!(display.state(), State::Unpowered);
    }

    #[test]
    fn test_refresh_failure_skips_power_off() {
        // Call 19 + 2 is the refresh command.
        let mut display = initialized(MockInterface::failing_at(21));
        let mut delay = RecordingDelay::default();

        let result = display.paint(&white_frame(), &mut delay);
        assert!(matches!(
            result,
            Err(Error::StepFailed {
                phase: Phase::Paint,
                step: 2,
                ..
            })
        ));
        assert_eq!(delay.ms, [1_000, 1_000]);
        assert_eq!(display.interface().calls, 22);
        assert_eq!(display.state(), State::Unpowered);
    }

    #[test]
    fn test_reset_failure_reports_line_step() {
        let mut display = Display::new(MockInterface {
            fail_reset_at: Some(2),
            ..MockInterface::default()
        });
        let mut delay = RecordingDelay::default();

        let result = display.reset(&mut delay);
        assert!(matches!(
            result,
            Err(Error::StepFailed {
                phase: Phase::Reset,
                step: 2,
                ..
            })
        ));
        assert_eq!(display.state(), State::Unpowered);

        // A fresh reset is allowed after a failure.
        display.reset(&mut delay).unwrap();
        assert_eq!(display.state(), State::Resetting);
        assert_eq!(display.interface().resets, 1);
    }

    #[test]
    fn test_render_runs_full_conversation() {
        let mut display = Display::new(MockInterface::default());
        let mut delay = RecordingDelay::default();
        let frame = PackedFrame::from_bytes(Dimensions::PANEL, white_frame()).unwrap();

        display.render(&frame, &mut delay).unwrap();

        assert_eq!(display.state(), State::Settled);
        assert_eq!(display.interface().resets, 1);
        assert_eq!(display.interface().sent.len(), 23);
        assert_eq!(delay.ms, [1_000, 1_000, 35_000, 1_000]);
    }

    #[test]
    fn test_render_checks_frame_before_reset() {
        let small = Dimensions::new(2, 2).unwrap();
        let frame = PackedFrame::from_bytes(small, vec![0x11, 0x11]).unwrap();
        let mut display = Display::new(MockInterface::default());

        let result = display.render(&frame, &mut RecordingDelay::default());
        assert!(matches!(result, Err(Error::FrameSize { provided: 2, .. })));
        assert_eq!(display.interface().resets, 0);
    }

    #[test]
    fn test_second_render_is_rejected() {
        let mut display = Display::new(MockInterface::default());
        let mut delay = RecordingDelay::default();
        let frame = PackedFrame::from_bytes(Dimensions::PANEL, white_frame()).unwrap();
        display.render(&frame, &mut delay).unwrap();

        let result = display.render(&frame, &mut delay);
        assert!(matches!(
            result,
            Err(Error::InvalidState {
                actual: State::Settled,
                ..
            })
        ));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(alloc::format!("{}", Phase::Paint), "Paint");
    }
}
