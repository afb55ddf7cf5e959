use taxi_capture::board::{CONTROL_PINS, TAXI_CLASS, TRIGGER, U4_OE, U5_OE};
use taxi_capture::hal::Direction;
use taxi_capture::pins::{ClassId, GpioPin, ScuPin};
use taxi_capture::{acquire, Error};
use taxi_mock::{Event, SimBench};

const OTHER_CLASS: ClassId = ClassId(0x105);

fn scu(pin: GpioPin) -> ScuPin {
    pin.mapping().unwrap().scu
}

fn released(bench: &SimBench) -> Vec<ScuPin> {
    bench
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Release(pin) => Some(pin),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

#[test]
fn control_pins_map_to_scu_pins() {
    assert_eq!(scu(U4_OE), ScuPin::new(5, 2));
    assert_eq!(scu(U5_OE), ScuPin::new(6, 4));
    assert_eq!(scu(TRIGGER), ScuPin::new(1, 0));
}

#[test]
fn unbonded_lines_have_no_mapping() {
    assert_eq!(GpioPin::new(7, 0).mapping(), None);
    assert_eq!(GpioPin::new(0, 16).mapping(), None);
}

// ---------------------------------------------------------------------------
// Acquire
// ---------------------------------------------------------------------------

#[test]
fn acquire_reserves_and_drives_every_pin() {
    let bench = SimBench::new();
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let set = acquire(&mut registry, &mut gpio, &CONTROL_PINS, TAXI_CLASS)
        .unwrap();

    assert_eq!(set.len(), 3);
    assert_eq!(set.owner(), TAXI_CLASS);
    let b = bench.borrow();
    assert_eq!(b.reserved_by(TAXI_CLASS), 3);
    for pin in CONTROL_PINS {
        assert!(set.contains(pin));
        assert!(b.muxed.contains(&scu(pin)));
        assert_eq!(b.direction(pin), Some(Direction::Output));
        assert!(b.driven_high.contains(&pin));
    }
    drop(b);

    set.release(&mut registry, &mut gpio).unwrap();
}

#[test]
fn invalid_pin_releases_earlier_pins() {
    let bench = SimBench::new();
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let pins = [U4_OE, U5_OE, GpioPin::new(7, 1)];
    let result = acquire(&mut registry, &mut gpio, &pins, TAXI_CLASS);

    assert_eq!(result, Err(Error::InvalidPin));
    let b = bench.borrow();
    assert_eq!(b.reserved_by(TAXI_CLASS), 0);
    assert!(b.muxed.is_empty());
    assert!(b.driven_high.is_empty());
}

#[test]
fn busy_pin_rolls_back_and_leaves_owner_alone() {
    let bench = SimBench::new();
    bench.borrow_mut().reservations.insert(scu(U5_OE), OTHER_CLASS);
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let result =
        acquire(&mut registry, &mut gpio, &CONTROL_PINS, TAXI_CLASS);

    assert_eq!(result, Err(Error::PinBusy));
    assert_eq!(released(&bench), vec![scu(U4_OE)]);
    let b = bench.borrow();
    assert_eq!(b.reserved_by(TAXI_CLASS), 0);
    assert_eq!(b.owner_of(scu(U5_OE)), Some(OTHER_CLASS));
    assert_eq!(b.direction(U5_OE), None);
    assert!(!b.muxed.contains(&scu(U5_OE)));
    // The trigger line is never touched.
    assert_eq!(b.owner_of(scu(TRIGGER)), None);
    assert_eq!(b.direction(TRIGGER), None);
}

#[test]
fn pinmux_failure_unwinds_in_reverse_order() {
    let bench = SimBench::new();
    bench.borrow_mut().fail_pinmux = Some((TRIGGER, -5));
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let result =
        acquire(&mut registry, &mut gpio, &CONTROL_PINS, TAXI_CLASS);

    assert_eq!(result, Err(Error::DriverConfigFailure(-5)));
    assert_eq!(
        released(&bench),
        vec![scu(TRIGGER), scu(U5_OE), scu(U4_OE)]
    );
    let b = bench.borrow();
    assert_eq!(b.reserved_by(TAXI_CLASS), 0);
    assert!(b.muxed.is_empty());
    assert!(b.driven_high.is_empty());
}

#[test]
fn second_owner_cannot_take_held_pins() {
    let bench = SimBench::new();
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let set = acquire(&mut registry, &mut gpio, &CONTROL_PINS, TAXI_CLASS)
        .unwrap();
    bench.clear_events();

    let result =
        acquire(&mut registry, &mut gpio, &CONTROL_PINS, OTHER_CLASS);

    assert_eq!(result, Err(Error::PinBusy));
    assert!(bench.events().is_empty());
    {
        let b = bench.borrow();
        assert_eq!(b.reserved_by(TAXI_CLASS), 3);
        assert_eq!(b.reserved_by(OTHER_CLASS), 0);
        for pin in CONTROL_PINS {
            assert!(b.muxed.contains(&scu(pin)));
            assert_eq!(b.direction(pin), Some(Direction::Output));
            assert!(b.driven_high.contains(&pin));
        }
    }

    set.release(&mut registry, &mut gpio).unwrap();
}

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

#[test]
fn release_returns_lines_to_high_impedance() {
    let bench = SimBench::new();
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let set = acquire(&mut registry, &mut gpio, &CONTROL_PINS, TAXI_CLASS)
        .unwrap();
    set.release(&mut registry, &mut gpio).unwrap();

    let b = bench.borrow();
    assert!(b.reservations.is_empty());
    assert!(b.muxed.is_empty());
    assert!(b.driven_high.is_empty());
    for pin in CONTROL_PINS {
        assert_eq!(b.direction(pin), Some(Direction::Input));
    }
}

#[test]
fn release_keeps_going_after_a_failure() {
    let bench = SimBench::new();
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let set = acquire(&mut registry, &mut gpio, &CONTROL_PINS, TAXI_CLASS)
        .unwrap();
    bench.borrow_mut().fail_release = Some((scu(U4_OE), -3));

    let result = set.release(&mut registry, &mut gpio);

    assert_eq!(result, Err(Error::DriverConfigFailure(-3)));
    let b = bench.borrow();
    assert_eq!(b.owner_of(scu(U4_OE)), Some(TAXI_CLASS));
    assert_eq!(b.owner_of(scu(U5_OE)), None);
    assert_eq!(b.owner_of(scu(TRIGGER)), None);
    for pin in CONTROL_PINS {
        assert_eq!(b.direction(pin), Some(Direction::Input));
    }
}

#[test]
fn release_reports_first_of_several_failures() {
    let bench = SimBench::new();
    let (mut registry, mut gpio) = (bench.registry(), bench.gpio());

    let set = acquire(&mut registry, &mut gpio, &CONTROL_PINS, TAXI_CLASS)
        .unwrap();
    // Someone else's bookkeeping swapped the trigger owner underneath us.
    bench.borrow_mut().reservations.insert(scu(TRIGGER), OTHER_CLASS);
    bench.borrow_mut().fail_release = Some((scu(U5_OE), -9));

    let result = set.release(&mut registry, &mut gpio);

    assert_eq!(result, Err(Error::DriverConfigFailure(-9)));
    assert_eq!(bench.borrow().owner_of(scu(U4_OE)), None);
}
