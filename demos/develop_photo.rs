use std::rc::Rc;

use lomo::{Bus, Darkroom, Look, Notice, STATE_CHANGED, Surface};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut photo = Surface::new(96, 64);
    for y in 0..64 {
        for x in 0..96 {
            photo.set_pixel(x, y, [(x * 2 + 40) as u8, (y * 3) as u8, 90, 255]);
        }
    }

    let bus = Rc::new(Bus::new());
    bus.subscribe_fn(STATE_CHANGED, |notice: &Notice| {
        if let Notice::StateChanged(change) = notice {
            println!(
                "{} -> {} ({})",
                change.previous, change.current, change.action
            );
        }
    });

    let mut darkroom = Darkroom::new(Rc::clone(&bus));
    darkroom.boot(true)?;
    darkroom.load_photo(photo)?;
    darkroom.apply_look(Look::BlackWhite)?;
    let frame = darkroom.save()?;

    let center = frame
        .pixel(frame.width() / 2, frame.height() / 2)
        .unwrap_or_default();
    println!(
        "developed {}x{}, center pixel {:?}",
        frame.width(),
        frame.height(),
        center
    );

    Ok(())
}
