//! Debugger service
//!
//! [`Debugger`] owns the transport and turns log calls into text lines. Every
//! line is composed in a fixed buffer and handed to the transport in a single
//! write, then flushed. Nothing is reported back to the caller: an unready
//! transport makes every log call a no-op, and write errors are dropped.

use core::fmt::{self, Write};

use heapless::String;
use probeline_hal::Transport;
use probeline_protocol::{BREAKPOINT_KEYWORD, LOG_PREFIX, MAX_LINE_LEN, VARIABLE_KEYWORD};

use crate::config::DebuggerConfig;
use crate::format::{write_array, write_register, write_value};
use crate::gate::{BreakpointGate, CancelToken, GateOutcome, GateState, Label};
use crate::value::{Register, Value, ValueArray};

/// Serial debugger bound to one transport
pub struct Debugger<T> {
    transport: T,
    config: DebuggerConfig,
    gate: BreakpointGate,
}

impl<T: Transport> Debugger<T> {
    /// Create a debugger with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DebuggerConfig::default())
    }

    pub fn with_config(transport: T, config: DebuggerConfig) -> Self {
        Self {
            transport,
            config,
            gate: BreakpointGate::with_idle_polls(config.ack_idle_polls),
        }
    }

    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Breakpoint gate state
    ///
    /// Breakpoints block the calling thread until they return, so from
    /// outside a breakpoint call this is always [`GateState::Running`].
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Write `log <text>`
    pub fn log(&mut self, text: &str) {
        self.emit(|line, _| line.write_str(text));
    }

    /// Write `log <formatted text>`
    pub fn log_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.emit(|line, _| line.write_fmt(args));
    }

    /// Write `log variable <name> <value>`
    pub fn log_variable(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        self.emit(|line, decimals| {
            write!(line, "{} {} ", VARIABLE_KEYWORD, name)?;
            write_value(line, &value, decimals)
        });
    }

    /// Write `log variable <name> [v0,v1,...]`
    pub fn log_array<'a>(&mut self, name: &str, values: impl Into<ValueArray<'a>>) {
        let values = values.into();
        self.emit(|line, decimals| {
            write!(line, "{} {} ", VARIABLE_KEYWORD, name)?;
            write_array(line, &values, decimals)
        });
    }

    /// Write a register as `log variable <name> [b0,b1,...]`, one element per bit
    pub fn log_register<R: Register>(&mut self, name: &str, register: R) {
        self.log_register_bytes(name, register.register_bytes().as_ref());
    }

    /// Like [`log_register`](Self::log_register) for raw little-endian bytes
    ///
    /// At most 8 bytes are expanded.
    pub fn log_register_bytes(&mut self, name: &str, bytes: &[u8]) {
        self.emit(|line, _| {
            write!(line, "{} {} ", VARIABLE_KEYWORD, name)?;
            write_register(line, bytes)
        });
    }

    /// Halt until the host acknowledges; reported with label `-1`
    pub fn breakpoint(&mut self) {
        self.breakpoint_at(Label::Anonymous);
    }

    /// Halt until the host acknowledges; reported with a numeric id
    pub fn breakpoint_id(&mut self, id: i32) {
        self.breakpoint_at(Label::Id(id));
    }

    /// Halt until the host acknowledges; reported with a name
    pub fn breakpoint_named(&mut self, name: &str) {
        self.breakpoint_at(Label::Name(name));
    }

    /// Halt until the host acknowledges
    ///
    /// Writes `log breakpoint <label>` and then polls the transport with no
    /// timeout. The wait happens even when the transport is not ready and the
    /// line was therefore not written.
    pub fn breakpoint_at(&mut self, label: Label<'_>) {
        let _ = self.halt(label, None);
    }

    /// Halt until the host acknowledges or `cancel` is set
    pub fn breakpoint_until(&mut self, label: Label<'_>, cancel: &CancelToken) -> GateOutcome {
        self.halt(label, Some(cancel))
    }

    fn halt(&mut self, label: Label<'_>, cancel: Option<&CancelToken>) -> GateOutcome {
        #[cfg(feature = "defmt")]
        defmt::info!("Breakpoint {}", label);

        self.emit(|line, _| write!(line, "{} {}", BREAKPOINT_KEYWORD, label));
        self.gate.wait(&mut self.transport, cancel)
    }

    /// Compose one line and write it if the transport is ready
    fn emit<F>(&mut self, body: F)
    where
        F: FnOnce(&mut LineBuffer, u8) -> fmt::Result,
    {
        if !self.transport.is_ready() {
            return;
        }

        let mut line = LineBuffer::new(self.config.line_ending.as_str());
        // LineBuffer never fails; overflow only sets the truncated flag
        let _ = write!(line, "{} ", LOG_PREFIX);
        let _ = body(&mut line, self.config.effective_float_decimals());

        #[cfg(feature = "defmt")]
        if line.truncated {
            defmt::warn!("Debug line truncated to {} bytes", MAX_LINE_LEN);
        }

        let bytes = line.finish();
        if self.transport.write_blocking(bytes).is_err() || self.transport.flush().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Debug line write failed");
        }
    }
}

/// Fixed-size line under construction
///
/// Text beyond the capacity is cut at a character boundary, leaving room for
/// the terminator.
struct LineBuffer {
    text: String<MAX_LINE_LEN>,
    terminator: &'static str,
    truncated: bool,
}

impl LineBuffer {
    fn new(terminator: &'static str) -> Self {
        Self {
            text: String::new(),
            terminator,
            truncated: false,
        }
    }

    /// Append the terminator and return the line bytes
    fn finish(&mut self) -> &[u8] {
        // Space for the terminator is reserved by write_str
        let _ = self.text.push_str(self.terminator);
        self.text.as_bytes()
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let limit = MAX_LINE_LEN - self.terminator.len();
        for c in s.chars() {
            if self.truncated || self.text.len() + c.len_utf8() > limit {
                self.truncated = true;
                break;
            }
            let _ = self.text.push(c);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineEnding;
    use crate::mock::MockTransport;
    use proptest::prelude::*;
    use std::string::ToString;

    fn debugger() -> Debugger<MockTransport> {
        Debugger::new(MockTransport::new())
    }

    #[test]
    fn test_log_writes_one_line() {
        let mut dbg = debugger();
        dbg.log("hello world");
        let transport = dbg.into_inner();
        assert_eq!(transport.output(), "log hello world\r\n");
        assert_eq!(transport.writes(), 1);
        assert_eq!(transport.flushes(), 1);
    }

    #[test]
    fn test_log_empty_text() {
        let mut dbg = debugger();
        dbg.log("");
        assert_eq!(dbg.transport().output(), "log \r\n");
    }

    #[test]
    fn test_log_fmt() {
        let mut dbg = debugger();
        dbg.log_fmt(format_args!("boot took {} ms", 42));
        assert_eq!(dbg.transport().lines(), ["log boot took 42 ms"]);
    }

    #[test]
    fn test_unready_transport_is_silent() {
        let mut dbg = Debugger::new(MockTransport::new().not_ready());
        dbg.log("ignored");
        dbg.log_variable("x", 1i32);
        dbg.log_array("a", &[1u32, 2]);
        dbg.log_register("r", 0xFFu8);
        let transport = dbg.into_inner();
        assert_eq!(transport.writes(), 0);
        assert_eq!(transport.output(), "");
    }

    proptest! {
        #[test]
        fn prop_unready_transport_writes_nothing(text in ".*", name in "[a-z_]{0,12}", value: i64) {
            let mut dbg = Debugger::new(MockTransport::new().not_ready());
            dbg.log(&text);
            dbg.log_fmt(format_args!("{}", text));
            dbg.log_variable(&name, value);
            dbg.log_variable(&text, 1.5f32);
            dbg.log_array(&name, &[value]);
            dbg.log_register(&text, value as u32);
            let transport = dbg.into_inner();
            prop_assert_eq!(transport.writes(), 0);
            prop_assert_eq!(transport.flushes(), 0);
            prop_assert_eq!(transport.output(), "");
        }
    }

    #[test]
    fn test_log_scalar_variables() {
        let mut dbg = debugger();
        dbg.log_variable("count", -42i32);
        dbg.log_variable("ticks", 4_000_000_000u32);
        dbg.log_variable("wide", -5_000_000_000i64);
        dbg.log_variable("uwide", u64::MAX);
        dbg.log_variable("temp", 21.5f32);
        dbg.log_variable("key", 'q');
        dbg.log_variable("raw", 200u8);
        assert_eq!(
            dbg.transport().lines(),
            [
                "log variable count -42",
                "log variable ticks 4000000000",
                "log variable wide -5000000000",
                "log variable uwide 18446744073709551615",
                "log variable temp 21.50000",
                "log variable key q",
                "log variable raw 200",
            ]
        );
        assert_eq!(dbg.transport().writes(), 7);
    }

    #[test]
    fn test_log_arrays() {
        let mut dbg = debugger();
        dbg.log_array("empty", &[] as &[i32]);
        dbg.log_array("one", &[42i32]);
        dbg.log_array("three", &[1i32, 2, 3]);
        dbg.log_array("floats", &[1.0f32, -0.0001]);
        dbg.log_array("word", &['h', 'i']);
        assert_eq!(
            dbg.transport().lines(),
            [
                "log variable empty []",
                "log variable one [42]",
                "log variable three [1,2,3]",
                "log variable floats [1.00000,-0.00010]",
                "log variable word [h,i]",
            ]
        );
    }

    #[test]
    fn test_log_registers() {
        let mut dbg = debugger();
        dbg.log_register("status", 5u8);
        dbg.log_register("ctrl", 0x8001u16);
        dbg.log_register_bytes("none", &[]);
        let lines = dbg.transport().lines();
        assert_eq!(lines[0], "log variable status [1,0,1,0,0,0,0,0]");
        assert_eq!(
            lines[1],
            "log variable ctrl [1,0,0,0,0,0,0,0,0,0,0,0,0,0,0,1]"
        );
        assert_eq!(lines[2], "log variable none []");
    }

    #[test]
    fn test_wide_register_has_64_bits() {
        let mut dbg = debugger();
        dbg.log_register("wide", u64::MAX);
        let lines = dbg.transport().lines();
        let bits = lines[0].strip_prefix("log variable wide ").unwrap();
        assert_eq!(bits.matches('1').count(), 64);
        assert_eq!(bits.matches(',').count(), 63);
    }

    #[test]
    fn test_custom_config() {
        let config = DebuggerConfig {
            float_decimals: 2,
            line_ending: LineEnding::Lf,
            ..Default::default()
        };
        let mut dbg = Debugger::with_config(MockTransport::new(), config);
        dbg.log_variable("v", 0.125f32);
        assert_eq!(dbg.transport().output(), "log variable v 0.13\n");
        assert_eq!(dbg.config().float_decimals, 2);
    }

    #[test]
    fn test_long_line_is_truncated() {
        let text = "x".repeat(400);
        let mut dbg = debugger();
        dbg.log(&text);
        let output = dbg.transport().output().to_string();
        assert_eq!(output.len(), MAX_LINE_LEN);
        assert!(output.starts_with("log xxx"));
        assert!(output.ends_with("x\r\n"));
        assert_eq!(dbg.transport().writes(), 1);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(200);
        let mut dbg = debugger();
        dbg.log(&text);
        let output = dbg.transport().output();
        assert!(output.len() <= MAX_LINE_LEN);
        assert!(output.ends_with("é\r\n"));
    }

    #[test]
    fn test_write_errors_are_swallowed() {
        let mut dbg = Debugger::new(MockTransport::new().failing_writes());
        dbg.log("lost");
        dbg.log_variable("x", 1i32);
        assert_eq!(dbg.transport().writes(), 0);
    }

    #[test]
    fn test_anonymous_breakpoint_resumes_on_ok() {
        let mut dbg = Debugger::new(MockTransport::new().with_input(b"OK"));
        dbg.breakpoint();
        assert_eq!(dbg.transport().lines(), ["log breakpoint -1"]);
        assert_eq!(dbg.gate_state(), GateState::Running);
    }

    #[test]
    fn test_breakpoint_id_ignores_other_input() {
        let mut dbg = Debugger::new(
            MockTransport::new()
                .with_input(b"no")
                .with_input(b"continue")
                .with_input(b"ok"),
        );
        dbg.breakpoint_id(7);
        assert_eq!(dbg.transport().lines(), ["log breakpoint 7"]);
        assert_eq!(dbg.transport().remaining_input(), 0);
    }

    #[test]
    fn test_breakpoint_resumes_on_split_ok() {
        let config = DebuggerConfig {
            ack_idle_polls: 100,
            ..Default::default()
        };
        let transport = MockTransport::new()
            .with_input(b"o")
            .with_input_after(10, b"K");
        let mut dbg = Debugger::with_config(transport, config);
        dbg.breakpoint_id(4);
        assert_eq!(dbg.transport().lines(), ["log breakpoint 4"]);
        assert_eq!(dbg.transport().remaining_input(), 0);
        assert_eq!(dbg.gate_state(), GateState::Running);
    }

    #[test]
    fn test_named_breakpoint() {
        let mut dbg = Debugger::new(MockTransport::new().with_input(b"Ok"));
        dbg.breakpoint_named("after init");
        assert_eq!(dbg.transport().lines(), ["log breakpoint after init"]);
    }

    #[test]
    fn test_breakpoint_with_empty_name() {
        let mut dbg = Debugger::new(MockTransport::new().with_input(b"ok"));
        dbg.breakpoint_named("");
        assert_eq!(dbg.transport().output(), "log breakpoint \r\n");
    }

    #[test]
    fn test_anonymous_and_minus_one_look_the_same() {
        let mut dbg = Debugger::new(MockTransport::new().with_input(b"ok").with_input(b"ok"));
        dbg.breakpoint();
        dbg.breakpoint_id(-1);
        let lines = dbg.transport().lines();
        assert_eq!(lines[0], lines[1]);
    }

    #[test]
    fn test_unready_breakpoint_still_waits() {
        let mut dbg = Debugger::new(MockTransport::new().not_ready().with_input(b"ok"));
        dbg.breakpoint_id(3);
        let transport = dbg.into_inner();
        assert_eq!(transport.output(), "");
        assert_eq!(transport.remaining_input(), 0);
    }

    #[test]
    fn test_cancellable_breakpoint() {
        static CANCEL: CancelToken = CancelToken::new();
        let mut dbg = Debugger::new(MockTransport::new().cancel_after_polls(3, &CANCEL));
        let outcome = dbg.breakpoint_until(Label::Name("session"), &CANCEL);
        assert_eq!(outcome, GateOutcome::Cancelled);
        assert_eq!(dbg.transport().lines(), ["log breakpoint session"]);
        assert_eq!(dbg.gate_state(), GateState::Running);
    }

    #[test]
    fn test_cancelled_token_exits_immediately_after_line() {
        let token = CancelToken::new();
        token.cancel();
        let mut dbg = Debugger::new(MockTransport::new());
        assert_eq!(
            dbg.breakpoint_until(Label::Id(1), &token),
            GateOutcome::Cancelled
        );
        assert_eq!(dbg.transport().lines(), ["log breakpoint 1"]);
        assert_eq!(dbg.transport().polls(), 0);
    }

    #[test]
    fn test_cancellable_breakpoint_resumes_on_ok() {
        let token = CancelToken::new();
        let mut dbg = Debugger::new(MockTransport::new().with_input(b"ok"));
        assert_eq!(
            dbg.breakpoint_until(Label::Anonymous, &token),
            GateOutcome::Resumed
        );
    }

    #[test]
    fn test_output_parses_with_protocol_records() {
        use probeline_protocol::{Record, Scalar, VariableValue};

        let mut dbg = debugger();
        dbg.log_variable("t", -3i32);
        dbg.log_array("a", &[1u8, 2]);
        let lines = dbg.transport().lines();

        assert_eq!(
            Record::parse(&lines[0]),
            Ok(Record::Variable {
                name: "t",
                value: VariableValue::Scalar(Scalar::Int(-3)),
            })
        );
        let Ok(Record::Variable { value: VariableValue::List(list), .. }) = Record::parse(&lines[1])
        else {
            panic!("expected list record");
        };
        assert_eq!(list.len(), 2);
    }
}
