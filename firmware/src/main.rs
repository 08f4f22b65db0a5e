#![no_main]
#![no_std]

use core::cell::RefCell;
use core::convert::Infallible;

use cortex_m::interrupt::Mutex;
use cortex_m_rt::entry;
use panic_halt as _;
use stm32f1::stm32f103::{self as pac, interrupt, Interrupt, Peripherals, NVIC};
use stm32f1xx_hal::delay::Delay;
use stm32f1xx_hal::gpio::{Input, OpenDrain, Output, PullDown, Pxx};
use stm32f1xx_hal::prelude::*;
use stm32f1xx_hal::timer::{CountDownTimer, Event, Timer};

use ps2_kbd::{Column, Config, Keyboard, Matrix, Port, TickCounter};

type Row = Pxx<Input<PullDown>>;
type Line = Pxx<Output<OpenDrain>>;

/// CNF/MODE nibble for a 2 MHz push-pull output.
const PUSH_PULL_2MHZ: u32 = 0b0010;
/// CNF/MODE nibble for a floating input.
const FLOATING_INPUT: u32 = 0b0100;

/// A matrix column switched between driving high and floating by rewriting
/// its configuration nibble.
struct Col {
    port: *const pac::gpioa::RegisterBlock,
    pin: u8,
}

impl Col {
    fn a(pin: u8) -> Self {
        Col { port: pac::GPIOA::ptr(), pin }
    }

    fn b(pin: u8) -> Self {
        Col { port: pac::GPIOB::ptr(), pin }
    }

    fn configure(&mut self, nibble: u32) {
        let shift = u32::from(self.pin % 8) * 4;
        let mask = 0xF << shift;
        // Safety: each column owns its nibble, and the read-modify-write runs
        // with interrupts masked.
        let port = unsafe { &*self.port };
        cortex_m::interrupt::free(|_| {
            if self.pin < 8 {
                port.crl
                    .modify(|r, w| unsafe { w.bits(r.bits() & !mask | nibble << shift) });
            } else {
                port.crh
                    .modify(|r, w| unsafe { w.bits(r.bits() & !mask | nibble << shift) });
            }
        });
    }
}

impl Column for Col {
    type Error = Infallible;

    fn strobe(&mut self) -> Result<(), Infallible> {
        // Set the output latch before the driver comes on.
        let port = unsafe { &*self.port };
        port.bsrr.write(|w| unsafe { w.bits(1 << self.pin) });
        self.configure(PUSH_PULL_2MHZ);
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        self.configure(FLOATING_INPUT);
        Ok(())
    }
}

/// 10 ms ticks, advanced by TIM2.
static TICKS: TickCounter = TickCounter::new();

static TICK_TIMER: Mutex<RefCell<Option<CountDownTimer<pac::TIM2>>>> = Mutex::new(RefCell::new(None));

#[interrupt]
fn TIM2() {
    cortex_m::interrupt::free(|cs| {
        if let Some(timer) = TICK_TIMER.borrow(cs).borrow_mut().as_mut() {
            // `wait` clears the update flag once it has fired.
            if timer.wait().is_ok() {
                TICKS.advance();
            }
        }
    });
}

#[entry]
fn main() -> ! {
    let device = unsafe { Peripherals::steal() };
    let core = unsafe { cortex_m::Peripherals::steal() };

    let mut flash = device.FLASH.constrain();
    let mut rcc = device.RCC.constrain();

    let clocks = rcc
        .cfgr
        .use_hse(8_u32.mhz())
        .sysclk(72_u32.mhz())
        .pclk1(36_u32.mhz())
        .freeze(&mut flash.acr);

    let mut gpioa = device.GPIOA.split(&mut rcc.apb2);
    let mut gpiob = device.GPIOB.split(&mut rcc.apb2);
    let mut afio = device.AFIO.constrain(&mut rcc.apb2);
    let (pa15, pb3, pb4) = afio.mapr.disable_jtag(gpioa.pa15, gpiob.pb3, gpiob.pb4);

    // Open drain, so both lines read back what the bus really shows.
    let data: Line = gpiob.pb6.into_open_drain_output(&mut gpiob.crl).downgrade();
    let clock: Line = gpiob.pb7.into_open_drain_output(&mut gpiob.crl).downgrade();
    let caps_lock = gpiob.pb8.into_push_pull_output(&mut gpiob.crh);

    // NOTE: columns start out floating through the HAL; from then on `Col`
    // reconfigures them directly and the HAL pins are dropped.
    gpioa.pa0.into_floating_input(&mut gpioa.crl);
    gpioa.pa1.into_floating_input(&mut gpioa.crl);
    gpioa.pa2.into_floating_input(&mut gpioa.crl);
    gpioa.pa3.into_floating_input(&mut gpioa.crl);
    gpioa.pa4.into_floating_input(&mut gpioa.crl);
    gpioa.pa5.into_floating_input(&mut gpioa.crl);
    gpioa.pa6.into_floating_input(&mut gpioa.crl);
    gpiob.pb0.into_floating_input(&mut gpiob.crl);
    gpiob.pb1.into_floating_input(&mut gpiob.crl);
    gpiob.pb10.into_floating_input(&mut gpiob.crh);
    gpiob.pb11.into_floating_input(&mut gpiob.crh);
    gpiob.pb12.into_floating_input(&mut gpiob.crh);
    gpiob.pb13.into_floating_input(&mut gpiob.crh);
    gpiob.pb14.into_floating_input(&mut gpiob.crh);
    #[rustfmt::skip]
    let cols: [Col; 14] = [
        Col::a(0), Col::a(1), Col::a(2), Col::a(3), Col::a(4), Col::a(5), Col::a(6),
        Col::b(0), Col::b(1),
        Col::b(10), Col::b(11), Col::b(12), Col::b(13), Col::b(14),
    ];
    #[rustfmt::skip]
    let rows: [Row; 6] = [
        gpioa.pa8.into_pull_down_input(&mut gpioa.crh).downgrade(),
        gpioa.pa9.into_pull_down_input(&mut gpioa.crh).downgrade(),
        gpioa.pa10.into_pull_down_input(&mut gpioa.crh).downgrade(),
              pa15.into_pull_down_input(&mut gpioa.crh).downgrade(),
              pb3.into_pull_down_input(&mut gpiob.crl).downgrade(),
              pb4.into_pull_down_input(&mut gpiob.crl).downgrade(),
    ];

    let mut timer = Timer::tim2(device.TIM2, &clocks, &mut rcc.apb1).start_count_down(100.hz());
    timer.listen(Event::Update);
    cortex_m::interrupt::free(|cs| TICK_TIMER.borrow(cs).replace(Some(timer)));
    unsafe { NVIC::unmask(Interrupt::TIM2) };

    // SysTick keeps counting with interrupts masked, so transfers stay timed
    // while the tick is held off.
    let delay = Delay::new(core.SYST, clocks);

    let mut keyboard = Keyboard::new(
        Port::new(data, clock),
        delay,
        Matrix::new(cols, rows),
        caps_lock,
        &TICKS,
        Config::default(),
    );
    // The pins are infallible; if the bus still can't be driven we can't be
    // a keyboard.
    match keyboard.power_on() {
        Ok(_) => (),
        Err(_) => panic!(),
    };
    keyboard.run()
}
