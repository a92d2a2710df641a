//! Fixed-rate execution of the motion core.
//!
//! The runner plays the role of the hardware clock: each period it samples the
//! link, advances the controller one tick, hands back the reply word and
//! presents every axis and the auxiliary byte on their outputs, then waits out
//! the tick period.
//! Tick timing comes from an embedded-hal 1.0 `DelayNs`, so the period is a
//! lower bound; work done inside the tick is not subtracted.

use embedded_hal::delay::DelayNs;

use crate::buffer::TransactionalBuffer;
use crate::controller::Controller;
use crate::error::{MotorError, Result};
use crate::motor::{AuxOutput, AxisOutput};
use crate::protocol::LinkInput;

/// Link endpoint feeding the core one tick at a time.
pub trait LinkSource {
    /// Signals for the coming tick.
    fn poll(&mut self) -> LinkInput;

    /// Reply word after the tick.
    fn respond(&mut self, _word: u32) {}
}

/// Runs a [`Controller`] at the configured tick rate.
pub struct FixedRateRunner<B, DELAY>
where
    B: TransactionalBuffer,
    DELAY: DelayNs,
{
    controller: Controller<B>,
    delay: DELAY,
    period_ns: u32,
}

impl<B, DELAY> FixedRateRunner<B, DELAY>
where
    B: TransactionalBuffer,
    DELAY: DelayNs,
{
    /// Create a runner ticking at the controller's `tick_hz`.
    pub fn new(controller: Controller<B>, delay: DELAY) -> Self {
        let period_ns = controller.config().tick_period_ns();
        Self {
            controller,
            delay,
            period_ns,
        }
    }

    /// Tick period in nanoseconds.
    #[inline]
    pub fn period_ns(&self) -> u32 {
        self.period_ns
    }

    /// Run one tick.
    ///
    /// Pass `&mut ()` as `aux` when no auxiliary outputs are wired.
    ///
    /// # Errors
    ///
    /// Returns [`MotorError::MissingPins`] if `outputs` does not match the
    /// motor count, or a pin error from an output.
    pub fn tick<L, O, A>(&mut self, link: &mut L, outputs: &mut [O], aux: &mut A) -> Result<()>
    where
        L: LinkSource,
        O: AxisOutput,
        A: AuxOutput,
    {
        self.check_outputs(outputs.len())?;
        self.step(link, outputs, aux)
    }

    /// Run `ticks` ticks.
    ///
    /// # Errors
    ///
    /// Stops at the first output error.
    pub fn run<L, O, A>(
        &mut self,
        link: &mut L,
        outputs: &mut [O],
        aux: &mut A,
        ticks: u32,
    ) -> Result<()>
    where
        L: LinkSource,
        O: AxisOutput,
        A: AuxOutput,
    {
        self.check_outputs(outputs.len())?;
        for _ in 0..ticks {
            self.step(link, outputs, aux)?;
        }
        Ok(())
    }

    fn step<L, O, A>(&mut self, link: &mut L, outputs: &mut [O], aux: &mut A) -> Result<()>
    where
        L: LinkSource,
        O: AxisOutput,
        A: AuxOutput,
    {
        let input = link.poll();
        self.controller.tick(&input);
        link.respond(self.controller.word_to_send());

        for (output, axis) in outputs.iter_mut().zip(self.controller.axes()) {
            output.apply(axis)?;
        }
        aux.set_aux(self.controller.aux())?;

        self.delay.delay_ns(self.period_ns);
        Ok(())
    }

    fn check_outputs(&self, supplied: usize) -> Result<()> {
        let motors = self.controller.config().motor_count();
        if supplied != motors {
            return Err(MotorError::MissingPins { supplied, motors }.into());
        }
        Ok(())
    }

    /// The controller.
    #[inline]
    pub fn controller(&self) -> &Controller<B> {
        &self.controller
    }

    /// The controller, for out-of-band reset.
    #[inline]
    pub fn controller_mut(&mut self) -> &mut Controller<B> {
        &mut self.controller
    }

    /// Release the controller and delay.
    pub fn into_inner(self) -> (Controller<B>, DELAY) {
        (self.controller, self.delay)
    }
}
