#![no_std]
#![no_main]

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c_slave::I2cSlave;
use embassy_rp::peripherals::{I2C0, USB};
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use gbaspi_core::GAMEPAD_DEVICE;
use gbaspi_firmware::{
    configure_usb_hid, target_config, AttentionLine, ButtonPins, ControllerEncoder, I2cTarget,
    ReportSink, SharedPacket, UsbHidOutput,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => embassy_rp::i2c::InterruptHandler<I2C0>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Button sampling period.
const SAMPLE_PERIOD: Duration = Duration::from_millis(5);

/// Latest controller state for the USB task ("latest value wins").
static STATE_SIGNAL: StaticCell<Signal<CriticalSectionRawMutex, ControllerEncoder>> =
    StaticCell::new();

/// Latest bus packet for the I2C target.
static PACKET: SharedPacket = SharedPacket::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("GBASPi controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let signal = STATE_SIGNAL.init(Signal::new());

    // --- Host bus ---
    // Keep the rail up while the host boots; it takes over with indicator commands.
    let power_hold = Output::new(p.PIN_3, Level::High);
    let attention = AttentionLine::new(Output::new(p.PIN_2, Level::High));
    let device = I2cSlave::new(p.I2C0, p.PIN_1, p.PIN_0, Irqs, target_config());
    let target = I2cTarget::new(device, power_hold);

    // --- Buttons ---
    let pins = ButtonPins {
        up: Input::new(p.PIN_4, Pull::Up),
        down: Input::new(p.PIN_5, Pull::Up),
        left: Input::new(p.PIN_6, Pull::Up),
        right: Input::new(p.PIN_7, Pull::Up),
        a: Input::new(p.PIN_8, Pull::Up),
        b: Input::new(p.PIN_9, Pull::Up),
        select: Input::new(p.PIN_10, Pull::Up),
        start: Input::new(p.PIN_11, Pull::Up),
        l: Input::new(p.PIN_12, Pull::Up),
        r: Input::new(p.PIN_13, Pull::Up),
        power: Input::new(p.PIN_14, Pull::Up),
    };

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(GAMEPAD_DEVICE.vendor, GAMEPAD_DEVICE.product);
    usb_config.manufacturer = Some("GBASPi");
    usb_config.product = Some(GAMEPAD_DEVICE.name);
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    let hid_state = HID_STATE.init(State::new());
    let hid_writer = configure_usb_hid(&mut builder, hid_state);
    let usb_device = builder.build();
    let usb_output = UsbHidOutput::new(hid_writer);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(input_task(pins, signal).unwrap());
    spawner.spawn(i2c_task(target).unwrap());
    spawner.spawn(attention_task(attention).unwrap());
    spawner.spawn(output_task(usb_output, signal).unwrap());

    info!("GBASPi controller initialized");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Input task - samples the buttons and publishes every change.
#[embassy_executor::task]
async fn input_task(
    mut pins: ButtonPins<Input<'static>>,
    signal: &'static Signal<CriticalSectionRawMutex, ControllerEncoder>,
) {
    let mut encoder = ControllerEncoder::new();
    let mut ticker = Ticker::every(SAMPLE_PERIOD);
    loop {
        if pins.sample(&mut encoder) {
            PACKET.publish(encoder.packet());
            signal.signal(encoder);
        }
        ticker.next().await;
    }
}

/// I2C task - serves packets and indicator commands to the host.
#[embassy_executor::task]
async fn i2c_task(mut target: I2cTarget<'static>) {
    target.serve(&PACKET).await
}

/// Attention task - tells the host when a new packet is waiting.
#[embassy_executor::task]
async fn attention_task(mut attention: AttentionLine<'static>) {
    attention.run(&PACKET).await
}

/// Output task - sends the latest controller state as HID reports.
#[embassy_executor::task]
async fn output_task(
    mut output: UsbHidOutput<'static>,
    signal: &'static Signal<CriticalSectionRawMutex, ControllerEncoder>,
) {
    output.wait_ready().await;
    info!("USB HID ready, sending controller state...");

    if let Err(e) = ControllerEncoder::new().begin(&mut output).await {
        error!("Initial report failed: {:?}", e);
    }

    loop {
        let encoder = signal.wait().await;
        if !output.is_ready() {
            output.wait_ready().await;
        }
        if let Err(e) = encoder.send_state(&mut output).await {
            error!("Output error: {:?}", e);
        }
    }
}
