use std::cell::RefCell;
use std::rc::Rc;

use caretsync_core::Vec2;
use caretsync_core::input::{PointerEvent, PointerEventKind};
use caretsync_platform::{
    BridgeOptions, ContentValidation, EndEditReason, FieldConfig, FieldListener, KeyboardKind, NativeSyncBridge,
    SimulatorKeyboard,
};
use caretsync_ui::{EditActions, FieldId, MonospaceLayout};
use web_time::{Duration, Instant};

const FRAME: Duration = Duration::from_millis(16);
const NAME: FieldId = FieldId(1);
const EMAIL: FieldId = FieldId(2);

struct Printer;

impl FieldListener for Printer {
    fn on_text_changed(&mut self, field: FieldId, text: &str) {
        log::info!("{field:?} text = {text:?}");
    }

    fn on_selection_changed(&mut self, field: FieldId, start: usize, end: usize) {
        log::info!("{field:?} selection = {start}..{end}");
    }

    fn on_edit_ended(&mut self, field: FieldId, reason: EndEditReason) {
        log::info!("{field:?} finished editing ({reason:?})");
    }
}

fn run_frames(bridge: &mut NativeSyncBridge, keyboard: &SimulatorKeyboard, frames: usize) -> anyhow::Result<()> {
    for _ in 0..frames {
        keyboard.advance(FRAME);
        bridge.tick(FRAME)?;
    }
    Ok(())
}

fn tap(bridge: &mut NativeSyncBridge, at: Vec2, when: Instant) -> anyhow::Result<()> {
    bridge.pointer_event(&PointerEvent::touch(PointerEventKind::Down, at, when))?;
    bridge.pointer_event(&PointerEvent::touch(
        PointerEventKind::Up,
        at,
        when + Duration::from_millis(40),
    ))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let keyboard = Rc::new(SimulatorKeyboard::new());
    let mut bridge = NativeSyncBridge::new(
        keyboard.clone(),
        Box::new(MonospaceLayout::new(10.0, 20.0)),
        BridgeOptions::default(),
    );
    bridge.set_listener(Rc::new(RefCell::new(Printer)));

    bridge.register_field(
        NAME,
        FieldConfig {
            next_field: Some(EMAIL),
            character_limit: 32,
            ..FieldConfig::default()
        },
        "",
    );
    bridge.register_field(
        EMAIL,
        FieldConfig {
            keyboard: KeyboardKind::EmailAddress,
            validation: ContentValidation::EmailAddress,
            autocorrect: false,
            ..FieldConfig::default()
        },
        "",
    );

    bridge.begin_edit(NAME)?;
    run_frames(&mut bridge, &keyboard, 40)?;
    log::info!("keyboard visible: {}", keyboard.is_visible());

    keyboard.type_text("Lovelace Ada ");
    run_frames(&mut bridge, &keyboard, 2)?;

    // Double-tap the surname, cut it, and paste it after the given name.
    let start = Instant::now();
    tap(&mut bridge, Vec2::new(32.0, 10.0), start)?;
    tap(&mut bridge, Vec2::new(32.0, 10.0), start + Duration::from_millis(120))?;
    log::info!("menu offers {:?}", bridge.menu().actions());
    bridge.perform_action(EditActions::CUT)?;
    bridge.set_caret(usize::MAX)?;
    bridge.perform_action(EditActions::PASTE)?;
    run_frames(&mut bridge, &keyboard, 2)?;

    keyboard.move_selection(0, 1);
    run_frames(&mut bridge, &keyboard, 1)?;
    keyboard.backspace();
    run_frames(&mut bridge, &keyboard, 1)?;

    // "Next" hands the keyboard to the email field, which reloads it.
    keyboard.press_return();
    run_frames(&mut bridge, &keyboard, 40)?;
    log::info!("focused after next: {:?}", bridge.focused());

    keyboard.type_text("ada@example.com");
    keyboard.press_return();
    run_frames(&mut bridge, &keyboard, 40)?;

    println!("name  = {:?}", bridge.text(NAME).unwrap_or_default());
    println!("email = {:?}", bridge.text(EMAIL).unwrap_or_default());
    println!("keyboard visible = {}", keyboard.is_visible());
    Ok(())
}
