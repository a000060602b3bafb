//! Probeline - Serial Debugger Demo Firmware
//!
//! Demo binary for RP2040 boards. Logs a few variables over UART0
//! (GPIO0 = TX, GPIO1 = RX, 115200 baud) every half second and halts at a
//! breakpoint every tenth iteration until the host sends `ok`.
//!
//! Diagnostics about the debugger itself go out over RTT via defmt; the UART
//! carries only the text protocol.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use probeline_core::Debugger;
use probeline_hal::IoTransport;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Loop iterations between breakpoints
const BREAKPOINT_EVERY: u32 = 10;

/// Delay between iterations
const LOOP_PERIOD_MS: u64 = 500;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Probeline demo firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Setup UART for the debug link
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    let mut dbg = Debugger::new(IoTransport::new(uart));
    info!("UART initialized for debug link");

    dbg.log("probeline demo ready");
    dbg.breakpoint_named("startup");

    let mut counter: u32 = 0;
    let mut history = [0i32; 8];

    loop {
        counter = counter.wrapping_add(1);
        let slot = counter as usize % history.len();
        history[slot] = (counter as i32).wrapping_mul(3).wrapping_sub(7);

        dbg.log_variable("counter", counter);
        dbg.log_variable("angle", (counter % 360) as f32 * 0.017_453_292);
        dbg.log_array("history", &history);
        dbg.log_register("low_byte", counter as u8);

        if counter % BREAKPOINT_EVERY == 0 {
            debug!("Halting at breakpoint {}", counter);
            // Blocks the executor until the host answers
            dbg.breakpoint_id(counter as i32);
        }

        Timer::after(Duration::from_millis(LOOP_PERIOD_MS)).await;
    }
}
