//! The motion core.
//!
//! [`Controller`] owns the protocol handler, the instruction buffer, the
//! dispatcher and the integrator, and advances each of them exactly once per
//! [`Controller::tick`]. Every signal crossing between components is
//! registered: a component sees the value its peer produced on the previous
//! tick, so the order in which components are advanced does not matter.

use crate::buffer::TransactionalBuffer;
use crate::config::{validate_config, PlatformConfig};
use crate::dispatch::{DispatchInputs, DispatchState, Dispatcher};
use crate::error::{ConfigError, Result};
use crate::instruction::StatusWord;
use crate::motion::{AxisState, CoefficientVector, Integrator, IntegratorState};
use crate::protocol::{status_word, HandlerState, LinkInput, ProtocolHandler};

/// Cross-component signals latched at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Registers {
    /// Execution enable (handler to dispatcher).
    pub execute: bool,
    /// Sticky fault (dispatcher to handler).
    pub dispatch_error: bool,
    /// No committed instruction (buffer to dispatcher).
    pub buffer_empty: bool,
    /// Start pulse (dispatcher to integrator).
    pub start: bool,
    /// Move running (integrator to dispatcher).
    pub busy: bool,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            execute: false,
            dispatch_error: false,
            buffer_empty: true,
            start: false,
            busy: false,
        }
    }
}

/// Multi-axis motion core driven by a single tick.
pub struct Controller<B: TransactionalBuffer> {
    config: PlatformConfig,
    handler: ProtocolHandler,
    buffer: B,
    dispatcher: Dispatcher,
    integrator: Integrator,
    registers: Registers,
    ticks: u64,
}

impl<B: TransactionalBuffer> Controller<B> {
    /// Create a controller around an instruction buffer.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid or the buffer depth
    /// differs from `buffer_depth_words`.
    pub fn new(config: PlatformConfig, mut buffer: B) -> Result<Self> {
        validate_config(&config)?;
        if buffer.depth() != config.buffer_depth_words {
            return Err(ConfigError::BufferMismatch {
                configured: config.buffer_depth_words,
                actual: buffer.depth(),
            }
            .into());
        }
        buffer.clear();

        info!(
            "controller: {=usize} motors, {=usize} bytes/move, {=usize} buffer words",
            config.motor_count(),
            config.bytes_per_move,
            config.buffer_depth_words
        );

        Ok(Self {
            handler: ProtocolHandler::new(config.bytes_per_move),
            dispatcher: Dispatcher::new(&config),
            integrator: Integrator::new(config.motor_count(), config.bit_shift, config.max_time),
            buffer,
            config,
            registers: Registers::default(),
            ticks: 0,
        })
    }

    /// Advance every component by one tick.
    pub fn tick(&mut self, input: &LinkInput) {
        let r = self.registers;

        self.integrator.tick(r.start, self.dispatcher.coefficients());
        self.dispatcher.tick(
            &mut self.buffer,
            DispatchInputs {
                execute: r.execute,
                buffer_empty: r.buffer_empty,
                integrator_busy: r.busy,
            },
        );
        self.handler.tick(input, &mut self.buffer, r.dispatch_error);

        self.registers = Registers {
            execute: self.handler.execute(),
            dispatch_error: self.dispatcher.dispatch_error(),
            buffer_empty: self.buffer.is_empty(),
            start: self.dispatcher.start(),
            busy: self.integrator.is_busy(),
        };
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Out-of-band reset of the whole core.
    ///
    /// Every state machine returns to its reset state, the dispatch fault is
    /// cleared, the buffer is emptied and all outputs drop.
    pub fn reset(&mut self) {
        self.handler.reset();
        self.dispatcher.reset();
        self.integrator.reset();
        self.buffer.clear();
        self.registers = Registers::default();
        self.ticks = 0;
        info!("controller: reset");
    }

    /// Status word as a `STATUS` command issued now would report it.
    pub fn status(&self) -> StatusWord {
        status_word(
            self.buffer.free_space(),
            self.config.bytes_per_move,
            self.registers.dispatch_error,
        )
    }

    /// Reply word of the current transaction.
    #[inline]
    pub fn word_to_send(&self) -> u32 {
        self.handler.word_to_send()
    }

    /// Execution enable flag.
    #[inline]
    pub fn execute(&self) -> bool {
        self.handler.execute()
    }

    /// Sticky dispatch fault.
    #[inline]
    pub fn dispatch_error(&self) -> bool {
        self.dispatcher.dispatch_error()
    }

    /// Auxiliary output byte.
    #[inline]
    pub fn aux(&self) -> u8 {
        self.dispatcher.aux()
    }

    /// Coefficients of the most recently dispatched move.
    #[inline]
    pub fn coefficients(&self) -> &CoefficientVector {
        self.dispatcher.coefficients()
    }

    /// Per-motor step, direction and position.
    #[inline]
    pub fn axes(&self) -> &[AxisState] {
        self.integrator.axes()
    }

    /// A move is running.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.integrator.is_busy()
    }

    /// High for one tick when a move completes.
    #[inline]
    pub fn finished(&self) -> bool {
        self.integrator.finished()
    }

    /// Nothing is running, pending, or waiting in the buffer.
    pub fn is_idle(&self) -> bool {
        !self.integrator.is_busy()
            && !self.dispatcher.start()
            && self.buffer.is_empty()
            && matches!(
                self.dispatcher.state(),
                DispatchState::WaitInstruction | DispatchState::Reset
            )
    }

    /// Registered signals as of the end of the last tick.
    #[inline]
    pub fn registers(&self) -> Registers {
        self.registers
    }

    /// Handler state.
    #[inline]
    pub fn handler_state(&self) -> HandlerState {
        self.handler.state()
    }

    /// Dispatcher state.
    #[inline]
    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    /// Integrator state.
    #[inline]
    pub fn integrator_state(&self) -> IntegratorState {
        self.integrator.state()
    }

    /// Instructions dispatched since reset.
    #[inline]
    pub fn dispatched(&self) -> u32 {
        self.dispatcher.dispatched()
    }

    /// Moves completed since reset.
    #[inline]
    pub fn moves_completed(&self) -> u32 {
        self.integrator.moves_completed()
    }

    /// Ticks since reset.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Platform configuration.
    #[inline]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Instruction buffer.
    #[inline]
    pub fn buffer(&self) -> &B {
        &self.buffer
    }
}
