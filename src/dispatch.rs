//! Instruction dispatcher.
//!
//! Sole reader of the instruction buffer. One committed instruction is consumed
//! at a time while execution is enabled:
//!
//! ```text
//! Reset -> WaitInstruction -> ParseHead -> MovePolynomial -> WaitInstruction
//!                                  |
//!                                  +-> Fault (unknown opcode, until reset)
//! ```
//!
//! Coefficients are streamed into a staging vector. The whole instruction is
//! read-committed and the staged vector published to the integrator in the
//! same tick, and only once the integrator is idle with no start pulse in
//! flight, so a running move never sees its coefficients change.

use crate::buffer::TransactionalBuffer;
use crate::config::PlatformConfig;
use crate::instruction::{Header, Opcode};
use crate::motion::CoefficientVector;

/// Dispatcher state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    /// Power-on.
    #[default]
    Reset,
    /// Idle until execution is enabled and an instruction is committed.
    WaitInstruction,
    /// Reading and decoding the header word.
    ParseHead,
    /// Streaming coefficient and padding words.
    MovePolynomial,
    /// Unknown opcode seen; nothing is consumed until reset.
    Fault,
}

/// Signals the dispatcher samples each tick, registered on the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchInputs {
    /// Execution enable from the protocol handler.
    pub execute: bool,
    /// The buffer held no committed instruction.
    pub buffer_empty: bool,
    /// The integrator was running a move.
    pub integrator_busy: bool,
}

impl Default for DispatchInputs {
    fn default() -> Self {
        Self {
            execute: false,
            buffer_empty: true,
            integrator_busy: false,
        }
    }
}

/// Consumes instructions and feeds the integrator.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: DispatchState,
    words_per_move: usize,
    coefficient_words: usize,
    /// Words read after the header in the current instruction.
    index: usize,
    staging: CoefficientVector,
    published: CoefficientVector,
    start: bool,
    aux: u8,
    dispatch_error: bool,
    dispatched: u32,
}

impl Dispatcher {
    /// Create a dispatcher for the platform layout.
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            state: DispatchState::Reset,
            words_per_move: config.words_per_move(),
            coefficient_words: config.coefficient_words(),
            index: 0,
            staging: CoefficientVector::zeroed(config.motor_count()),
            published: CoefficientVector::zeroed(config.motor_count()),
            start: false,
            aux: 0,
            dispatch_error: false,
            dispatched: 0,
        }
    }

    /// Advance one tick.
    pub fn tick<B: TransactionalBuffer>(&mut self, buffer: &mut B, inputs: DispatchInputs) {
        // start is a single-tick pulse
        let start_in_flight = self.start;
        self.start = false;

        match self.state {
            DispatchState::Reset => {
                self.index = 0;
                self.state = DispatchState::WaitInstruction;
            }
            DispatchState::WaitInstruction => {
                if inputs.execute && !inputs.buffer_empty {
                    self.state = DispatchState::ParseHead;
                }
            }
            DispatchState::ParseHead => {
                let Some(word) = buffer.read() else {
                    return;
                };
                let header = Header::from_word(word);
                match header.instruction() {
                    Some(Opcode::Move) => {
                        self.aux = header.aux;
                        self.index = 0;
                        self.staging.clear();
                        self.state = DispatchState::MovePolynomial;
                    }
                    None => {
                        buffer.read_rollback();
                        self.dispatch_error = true;
                        self.state = DispatchState::Fault;
                        error!("dispatch: unknown opcode {=u8}, halted", header.opcode);
                    }
                }
            }
            DispatchState::MovePolynomial => {
                if self.index + 1 < self.words_per_move {
                    if let Some(word) = buffer.read() {
                        if self.index < self.coefficient_words {
                            self.staging.set_word(self.index, word);
                        }
                        self.index += 1;
                    }
                } else if !inputs.integrator_busy && !start_in_flight {
                    buffer.read_commit();
                    self.published.clone_from(&self.staging);
                    self.start = true;
                    self.dispatched = self.dispatched.wrapping_add(1);
                    self.state = DispatchState::WaitInstruction;
                    debug!("dispatch: move {} published, aux {=u8}", self.dispatched, self.aux);
                }
            }
            DispatchState::Fault => {}
        }
    }

    /// Return to power-on state and clear the sticky fault.
    pub fn reset(&mut self) {
        self.state = DispatchState::Reset;
        self.index = 0;
        self.staging.clear();
        self.published.clear();
        self.start = false;
        self.aux = 0;
        self.dispatch_error = false;
        self.dispatched = 0;
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Sticky unknown-opcode fault.
    #[inline]
    pub fn dispatch_error(&self) -> bool {
        self.dispatch_error
    }

    /// Start pulse for the integrator.
    #[inline]
    pub fn start(&self) -> bool {
        self.start
    }

    /// Coefficients of the most recently published move.
    #[inline]
    pub fn coefficients(&self) -> &CoefficientVector {
        &self.published
    }

    /// Auxiliary output byte, latched from the last `MOVE` header.
    #[inline]
    pub fn aux(&self) -> u8 {
        self.aux
    }

    /// Instructions consumed since reset.
    #[inline]
    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TransactionalFifo;
    use crate::instruction::Instruction;
    use crate::motion::Coefficients;

    fn config() -> PlatformConfig {
        // 2 motors, header + 6 coefficients + 1 padding word
        PlatformConfig::with_motor_count(2)
            .unwrap()
            .bytes_per_move(32)
            .buffer_depth_words(32)
    }

    fn push(fifo: &mut TransactionalFifo<32>, instr: &Instruction, config: &PlatformConfig) {
        for word in instr.encode(config).unwrap() {
            fifo.write(word).unwrap();
        }
        fifo.write_commit();
    }

    fn inputs(fifo: &TransactionalFifo<32>) -> DispatchInputs {
        DispatchInputs {
            execute: true,
            buffer_empty: fifo.is_empty(),
            integrator_busy: false,
        }
    }

    fn run(dispatcher: &mut Dispatcher, fifo: &mut TransactionalFifo<32>, ticks: usize) {
        for _ in 0..ticks {
            let i = inputs(fifo);
            dispatcher.tick(fifo, i);
        }
    }

    #[test]
    fn test_move_round_trip() {
        let config = config();
        let axes = [Coefficients::new(5, -6, 7), Coefficients::new(-1, 2, i32::MIN)];
        let mut fifo = TransactionalFifo::<32>::new();
        push(&mut fifo, &Instruction::new_move(0xa5, &axes), &config);

        let mut dispatcher = Dispatcher::new(&config);
        let mut started = 0;
        for _ in 0..20 {
            let i = inputs(&fifo);
            dispatcher.tick(&mut fifo, i);
            if dispatcher.start() {
                started += 1;
            }
        }

        assert_eq!(started, 1);
        assert_eq!(dispatcher.aux(), 0xa5);
        assert_eq!(dispatcher.coefficients().as_slice(), &axes);
        assert_eq!(dispatcher.dispatched(), 1);
        assert!(fifo.is_empty());
        assert_eq!(fifo.free_space(), 31);
        assert_eq!(dispatcher.state(), DispatchState::WaitInstruction);
    }

    #[test]
    fn test_idle_without_execute() {
        let config = config();
        let mut fifo = TransactionalFifo::<32>::new();
        push(&mut fifo, &Instruction::new_move(1, &[Coefficients::ZERO; 2]), &config);

        let mut dispatcher = Dispatcher::new(&config);
        for _ in 0..20 {
            let i = DispatchInputs {
                execute: false,
                ..inputs(&fifo)
            };
            dispatcher.tick(&mut fifo, i);
        }
        assert_eq!(dispatcher.state(), DispatchState::WaitInstruction);
        assert_eq!(fifo.readable(), 8);
    }

    #[test]
    fn test_stalls_while_integrator_busy() {
        let config = config();
        let axes = [Coefficients::linear(3), Coefficients::linear(4)];
        let mut fifo = TransactionalFifo::<32>::new();
        push(&mut fifo, &Instruction::new_move(0, &axes), &config);

        let mut dispatcher = Dispatcher::new(&config);
        for _ in 0..30 {
            let i = DispatchInputs {
                integrator_busy: true,
                ..inputs(&fifo)
            };
            dispatcher.tick(&mut fifo, i);
        }
        assert_eq!(dispatcher.state(), DispatchState::MovePolynomial);
        assert_eq!(dispatcher.coefficients(), &CoefficientVector::zeroed(2));
        assert!(!fifo.is_empty());

        run(&mut dispatcher, &mut fifo, 1);
        assert!(dispatcher.start());
        assert_eq!(dispatcher.coefficients().as_slice(), &axes);
    }

    #[test]
    fn test_back_to_back_waits_for_start() {
        let config = config();
        let mut fifo = TransactionalFifo::<32>::new();
        push(&mut fifo, &Instruction::new_move(1, &[Coefficients::linear(1); 2]), &config);
        push(&mut fifo, &Instruction::new_move(2, &[Coefficients::linear(2); 2]), &config);

        let mut dispatcher = Dispatcher::new(&config);
        let mut pulses = 0;
        let mut last = None;
        for tick in 0..40 {
            let i = inputs(&fifo);
            dispatcher.tick(&mut fifo, i);
            if dispatcher.start() {
                pulses += 1;
                if let Some(previous) = last {
                    assert!(tick - previous > 1);
                }
                last = Some(tick);
            }
        }
        assert_eq!(pulses, 2);
        assert_eq!(dispatcher.aux(), 2);
    }

    #[test]
    fn test_unknown_opcode_latches() {
        let config = config();
        let mut fifo = TransactionalFifo::<32>::new();
        push(&mut fifo, &Instruction::raw(0x7e, 9, &[Coefficients::ZERO; 2]), &config);
        push(&mut fifo, &Instruction::new_move(1, &[Coefficients::ZERO; 2]), &config);

        let mut dispatcher = Dispatcher::new(&config);
        run(&mut dispatcher, &mut fifo, 10_000);

        assert!(dispatcher.dispatch_error());
        assert_eq!(dispatcher.state(), DispatchState::Fault);
        assert_eq!(dispatcher.dispatched(), 0);
        assert_eq!(dispatcher.aux(), 0);
        assert_eq!(fifo.free_space(), 15);

        dispatcher.reset();
        assert!(!dispatcher.dispatch_error());
        assert_eq!(dispatcher.state(), DispatchState::Reset);
    }
}
